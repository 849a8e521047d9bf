//! Transient editor session
//!
//! Nothing here is persisted except through a save of `content`.

use serde::Serialize;

use crate::models::{Screen, ViewMode};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub screen: Screen,
    /// Open note; `None` while editing a note that was never saved
    pub current_filename: Option<String>,
    pub content: String,
    /// Byte offset of the last known cursor position
    pub cursor: Option<usize>,
    pub view_mode: ViewMode,
    /// Drawing surface active; text input is read-only meanwhile
    pub drawing: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            screen: Screen::List,
            current_filename: None,
            content: String::new(),
            cursor: None,
            view_mode: ViewMode::default(),
            drawing: false,
        }
    }
}

impl Session {
    pub fn is_editing(&self) -> bool {
        self.screen == Screen::Editor
    }

    /// Enter the editor on `content`, keeping the view mode
    pub fn open(&mut self, filename: Option<String>, content: String) {
        self.screen = Screen::Editor;
        self.current_filename = filename;
        self.content = content;
        self.cursor = None;
        self.drawing = false;
    }

    /// Back to the list with an empty buffer
    pub fn close(&mut self) {
        *self = Self {
            view_mode: self.view_mode,
            ..Self::default()
        };
    }

    /// Insert at the cursor, or append when the cursor is unknown or stale
    pub fn insert_at_cursor(&mut self, text: &str) {
        match self.cursor {
            Some(at) if at <= self.content.len() && self.content.is_char_boundary(at) => {
                self.content.insert_str(at, text);
                self.cursor = Some(at + text.len());
            }
            _ => {
                self.content.push_str(text);
                self.cursor = Some(self.content.len());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_at_cursor() {
        let mut session = Session::default();
        session.open(Some("A.md".to_string()), "ab".to_string());
        session.cursor = Some(1);

        session.insert_at_cursor("X");
        assert_eq!(session.content, "aXb");
        assert_eq!(session.cursor, Some(2));
    }

    #[test]
    fn test_insert_appends_without_valid_cursor() {
        let mut session = Session::default();
        session.open(None, "é".to_string());

        session.insert_at_cursor("1");
        assert_eq!(session.content, "é1");

        // Inside a multi-byte character
        session.cursor = Some(1);
        session.insert_at_cursor("2");
        assert_eq!(session.content, "é12");
    }

    #[test]
    fn test_close_keeps_view_mode() {
        let mut session = Session::default();
        session.view_mode = ViewMode::Preview;
        session.open(Some("A.md".to_string()), "x".to_string());

        session.close();
        assert_eq!(session.screen, Screen::List);
        assert_eq!(session.current_filename, None);
        assert_eq!(session.view_mode, ViewMode::Preview);
    }
}
