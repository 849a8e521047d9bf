//! Debounced autosave
//!
//! Every change pushes the deadline out to `now + window`; the save fires
//! only once the window passes with no further change.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Autosave {
    window: Duration,
    deadline: Option<Instant>,
}

impl Autosave {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Restart the quiet window from `now`
    pub fn on_change(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Consume the deadline if it has passed
    pub fn take_due(&mut self, now: Instant) -> bool {
        if self.due(now) {
            self.deadline = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(2000);

    #[test]
    fn test_fires_after_quiet_window() {
        let start = Instant::now();
        let mut autosave = Autosave::new(WINDOW);
        autosave.on_change(start);

        assert!(!autosave.due(start + Duration::from_millis(1999)));
        assert!(autosave.take_due(start + WINDOW));
        assert!(!autosave.is_pending());
        assert!(!autosave.take_due(start + WINDOW * 2));
    }

    #[test]
    fn test_change_restarts_window() {
        let start = Instant::now();
        let mut autosave = Autosave::new(WINDOW);
        autosave.on_change(start);
        autosave.on_change(start + Duration::from_millis(1500));

        assert!(!autosave.due(start + WINDOW));
        assert_eq!(
            autosave.deadline(),
            Some(start + Duration::from_millis(3500))
        );
    }

    #[test]
    fn test_cancel() {
        let start = Instant::now();
        let mut autosave = Autosave::new(WINDOW);
        autosave.on_change(start);
        autosave.cancel();
        assert!(!autosave.due(start + WINDOW * 10));
    }
}
