//! Application Controller
//!
//! Owns the editor session and drives every transition between the note
//! list and the editor: loading and saving through the [`NoteStore`],
//! drawing-mode gating, the autosave debouncer, and applying host results
//! that arrive on the event queue.
//!
//! ## Turns
//!
//! Nothing a host posts is applied while a controller method is running.
//! Results wait on the queue until [`AppController::pump_events`] (or the
//! [`AppController::run`] loop) picks them up on a later turn.
//!
//! ```ignore
//! let (sender, receiver) = bridge::bind();
//! let shell = LocalShell::new(sender);
//! let mut app = AppController::new(store, images, shell, receiver, window);
//! app.select_note("Plan.md")?;
//! app.edit("# Plan\n- more", None, Instant::now());
//! app.back()?;
//! ```

mod autosave;
mod error;
mod state;

pub use autosave::Autosave;
pub use error::{ControllerError, ControllerResult};
pub use state::Session;

use std::future::Future;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::bridge::{
    EventReceiver, HostEvent, HostShell, InboundEvent, PendingRequests, RequestKind,
    RequestToken, Resolution,
};
use crate::images::{markdown_for, ImageStore};
use crate::models::{ImageRef, NoteId, NoteSummary, Screen, ViewMode};
use crate::naming::{self, LinkTarget};
use crate::storage::NoteBackend;
use crate::store::NoteStore;

/// Content a freshly created note starts with
pub const NEW_NOTE_TEMPLATE: &str = "# New Note\n\n";

pub struct AppController<B: NoteBackend, S: HostShell> {
    store: NoteStore<B>,
    images: ImageStore,
    shell: S,
    events: EventReceiver,
    pending: PendingRequests,
    autosave: Autosave,
    session: Session,
    /// Identity of the open note, assigned before its first save
    open_id: Option<NoteId>,
    notes: Vec<NoteSummary>,
}

impl<B: NoteBackend, S: HostShell> AppController<B, S> {
    pub fn new(
        store: NoteStore<B>,
        images: ImageStore,
        shell: S,
        events: EventReceiver,
        autosave_window: Duration,
    ) -> Self {
        let mut controller = Self {
            store,
            images,
            shell,
            events,
            pending: PendingRequests::new(),
            autosave: Autosave::new(autosave_window),
            session: Session::default(),
            open_id: None,
            notes: Vec::new(),
        };
        if let Err(e) = controller.refresh_list() {
            warn!("Initial note listing failed: {}", e);
        }
        controller
    }

    // ==================== Accessors ====================

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn screen(&self) -> Screen {
        self.session.screen
    }

    pub fn content(&self) -> &str {
        &self.session.content
    }

    pub fn current_filename(&self) -> Option<&str> {
        self.session.current_filename.as_deref()
    }

    pub fn view_mode(&self) -> ViewMode {
        self.session.view_mode
    }

    pub fn is_drawing(&self) -> bool {
        self.session.drawing
    }

    /// Notes as of the last list reload
    pub fn notes(&self) -> &[NoteSummary] {
        &self.notes
    }

    pub fn store(&self) -> &NoteStore<B> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut NoteStore<B> {
        &mut self.store
    }

    pub fn shell(&self) -> &S {
        &self.shell
    }

    pub fn shell_mut(&mut self) -> &mut S {
        &mut self.shell
    }

    pub fn is_pending(&self, kind: RequestKind) -> bool {
        self.pending.is_pending(kind)
    }

    /// When the pending autosave fires, if one is pending
    pub fn next_deadline(&self) -> Option<Instant> {
        self.autosave.deadline()
    }

    // ==================== List ====================

    pub fn refresh_list(&mut self) -> ControllerResult<&[NoteSummary]> {
        self.notes = self.store.list_notes()?;
        Ok(&self.notes)
    }

    /// Persist a manual ordering of the list
    pub fn reorder(&mut self, filenames: &[String]) -> ControllerResult<()> {
        self.store.save_note_order(filenames)?;
        self.refresh_list()?;
        Ok(())
    }

    /// Delete a note the user has already confirmed removing
    pub fn delete_note(&mut self, filename: &str) -> ControllerResult<bool> {
        let deleted = self.store.delete_note(filename)?;
        if !deleted {
            self.shell
                .show_toast(&format!("Note not found: {}", naming::title_from_filename(filename)));
            return Ok(false);
        }

        if self.current_filename() == Some(filename) {
            self.autosave.cancel();
            self.session.close();
            self.open_id = None;
        }

        self.refresh_list()?;
        self.shell
            .show_toast(&format!("Deleted {}", naming::title_from_filename(filename)));
        Ok(true)
    }

    // ==================== Navigation ====================

    /// Open the editor on an unsaved note seeded from the template
    pub fn create_note(&mut self) -> ControllerResult<()> {
        self.persist_open_note()?;
        self.session.open(None, NEW_NOTE_TEMPLATE.to_string());
        self.open_id = Some(NoteId::new());
        info!("Editing new note");
        Ok(())
    }

    /// Open an existing note; `false` if it does not exist
    pub fn select_note(&mut self, filename: &str) -> ControllerResult<bool> {
        let Some(content) = self.store.read_note(filename)? else {
            self.shell
                .show_toast(&format!("Note not found: {}", naming::title_from_filename(filename)));
            return Ok(false);
        };

        self.persist_open_note()?;
        self.open(filename, content)?;
        Ok(true)
    }

    /// Leave the editor, saving the open note first
    ///
    /// If the save fails the editor stays open so nothing is lost.
    pub fn back(&mut self) -> ControllerResult<()> {
        if !self.session.is_editing() {
            return Ok(());
        }
        self.session.drawing = false;

        if let Err(e) = self.persist_open_note() {
            self.shell.show_toast(&format!("Save failed: {}", e));
            return Err(e);
        }

        self.session.close();
        self.open_id = None;
        debug!("Back to note list");
        self.refresh_list()?;
        Ok(())
    }

    /// Follow a link target to another note
    ///
    /// Resolved by exact filename, then with `.md` appended. An unresolved
    /// target leaves everything as it was and shows a notification.
    pub fn navigate(&mut self, target: &str) -> ControllerResult<bool> {
        let name = match LinkTarget::parse(target) {
            LinkTarget::Note(name) => name,
            _ => target.to_string(),
        };

        self.refresh_list()?;
        let resolved =
            naming::resolve_link(&name, self.notes.iter().map(|n| n.filename.as_str()));

        let Some(filename) = resolved else {
            self.shell.show_toast(&format!("Note not found: {}", name));
            return Ok(false);
        };

        if self.current_filename() == Some(filename.as_str()) {
            return Ok(true);
        }

        let content = self.store.read_note(&filename)?.unwrap_or_default();
        self.persist_open_note()?;
        self.open(&filename, content)?;
        Ok(true)
    }

    /// A link clicked in the preview
    pub fn click_link(&mut self, href: &str) -> ControllerResult<bool> {
        match LinkTarget::parse(href) {
            LinkTarget::External(url) => {
                debug!("Opening external link {}", url);
                self.shell.open_external_link(&url);
                Ok(false)
            }
            LinkTarget::Anchor => Ok(false),
            LinkTarget::Note(name) => self.navigate(&name),
        }
    }

    fn open(&mut self, filename: &str, content: String) -> ControllerResult<()> {
        self.autosave.cancel();
        self.open_id = self.store.note_id(filename)?;
        self.session.open(Some(filename.to_string()), content);
        info!("Opened {}", filename);
        Ok(())
    }

    // ==================== Editing ====================

    /// Replace the buffer after a user edit
    ///
    /// Ignored while drawing. Restarts the autosave window when the note has
    /// a filename.
    pub fn edit(&mut self, content: impl Into<String>, cursor: Option<usize>, now: Instant) -> bool {
        if !self.session.is_editing() || self.session.drawing {
            debug!("Ignoring edit outside the text editor");
            return false;
        }

        self.session.content = content.into();
        self.session.cursor = cursor;
        self.content_changed(now);
        true
    }

    pub fn set_cursor(&mut self, cursor: Option<usize>) {
        self.session.cursor = cursor;
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.session.view_mode = mode;
    }

    pub fn cycle_view_mode(&mut self) -> ViewMode {
        self.session.view_mode = self.session.view_mode.cycle();
        self.session.view_mode
    }

    /// Explicit save, naming the note from its first heading
    ///
    /// A heading change renames the note: the new file is written, the old
    /// one removed, and identity and list position carry over. A name owned
    /// by a different note gets a numbered variant instead of overwriting it.
    pub fn save(&mut self) -> ControllerResult<String> {
        if !self.session.is_editing() {
            return Err(ControllerError::InvalidState("save"));
        }

        match self.save_as_derived() {
            Ok(filename) => {
                self.shell
                    .show_toast(&format!("Saved {}", naming::title_from_filename(&filename)));
                Ok(filename)
            }
            Err(e) => {
                self.shell.show_toast(&format!("Save failed: {}", e));
                Err(e)
            }
        }
    }

    fn save_as_derived(&mut self) -> ControllerResult<String> {
        let current = self.session.current_filename.clone();
        let candidate =
            naming::derive_filename(&self.session.content, current.as_deref(), Utc::now());

        let filename = if current.as_deref() == Some(candidate.as_str())
            || !self.owned_by_other(&candidate)?
        {
            candidate
        } else {
            let store = &self.store;
            naming::unique_filename(&candidate, |name| {
                current.as_deref() != Some(name) && store.exists(name)
            })
        };

        match current.as_deref() {
            Some(old) if old != filename => {
                self.store
                    .rename_note(old, &filename, &self.session.content)?;
            }
            _ => {
                self.store
                    .save_note_with_id(&filename, &self.session.content, self.open_id)?;
            }
        }

        self.autosave.cancel();
        self.open_id = self.store.note_id(&filename)?;
        self.session.current_filename = Some(filename.clone());
        if let Err(e) = self.refresh_list() {
            warn!("List reload after save failed: {}", e);
        }
        Ok(filename)
    }

    fn owned_by_other(&self, filename: &str) -> ControllerResult<bool> {
        if !self.store.exists(filename) {
            return Ok(false);
        }
        let owner = self.store.note_id(filename)?;
        Ok(owner.is_none() || owner != self.open_id)
    }

    fn content_changed(&mut self, now: Instant) {
        if self.session.current_filename.is_some() {
            self.autosave.on_change(now);
        }
    }

    /// Save the open note under its current name, if it has one
    fn persist_open_note(&mut self) -> ControllerResult<()> {
        let Some(filename) = self.session.current_filename.as_deref() else {
            return Ok(());
        };
        self.store
            .save_note_with_id(filename, &self.session.content, self.open_id)?;
        self.autosave.cancel();
        debug!("Flushed {}", filename);
        Ok(())
    }

    // ==================== Drawing ====================

    /// Switch to the drawing surface; text input becomes read-only
    pub fn start_drawing(&mut self) -> bool {
        if !self.session.is_editing() || self.session.drawing {
            return false;
        }
        self.session.drawing = true;
        debug!("Drawing mode on");
        true
    }

    /// Store the drawing and insert it at the cursor
    ///
    /// On failure drawing mode stays on so the user can retry or cancel.
    pub fn save_drawing(&mut self, raster: &str) -> ControllerResult<ImageRef> {
        if !self.session.drawing {
            return Err(ControllerError::InvalidState("save a drawing"));
        }

        let image = match self.images.save_image(self.store.backend_mut(), raster) {
            Ok(image) => image,
            Err(e) => {
                self.shell.show_toast(&format!("Could not save drawing: {}", e));
                return Err(e.into());
            }
        };

        self.insert_image("drawing", &image.url);
        self.session.drawing = false;
        Ok(image)
    }

    pub fn cancel_drawing(&mut self) {
        if self.session.drawing {
            self.session.drawing = false;
            debug!("Drawing discarded");
        }
    }

    fn insert_image(&mut self, alt: &str, url: &str) {
        let snippet = format!("\n{}\n", markdown_for(alt, url));
        self.session.insert_at_cursor(&snippet);
        self.content_changed(Instant::now());
    }

    // ==================== Host requests ====================

    /// Ask the host for a markdown file to import as a new note
    pub fn import_markdown(&mut self) -> ControllerResult<RequestToken> {
        let token = self.pending.begin(RequestKind::ImportMarkdown);
        self.shell.trigger_import_markdown(token);
        Ok(token)
    }

    /// Hand the open note to the host for export
    pub fn export_current(&mut self) -> ControllerResult<RequestToken> {
        if !self.session.is_editing() {
            return Err(ControllerError::InvalidState("export"));
        }

        let filename = self.current_filename().map(str::to_string).unwrap_or_else(|| {
            naming::derive_filename(&self.session.content, None, Utc::now())
        });
        let token = self.pending.begin(RequestKind::ExportMarkdown);
        self.shell
            .trigger_export_markdown(token, &filename, &self.session.content);
        Ok(token)
    }

    /// Ask the host for an image to insert at the cursor
    pub fn pick_image(&mut self) -> ControllerResult<RequestToken> {
        if !self.session.is_editing() {
            return Err(ControllerError::InvalidState("insert an image"));
        }
        let token = self.pending.begin(RequestKind::PickImage);
        self.shell.trigger_pick_image(token);
        Ok(token)
    }

    /// Stop waiting for the outstanding request of `kind`
    ///
    /// A reply that still arrives for it is dropped as stale.
    pub fn cancel_request(&mut self, kind: RequestKind) -> bool {
        match self.pending.cancel(kind) {
            Some(token) => {
                debug!("Cancelled {} request {}", kind, token);
                true
            }
            None => false,
        }
    }

    // ==================== Host events ====================

    /// Apply one host event
    pub fn handle_event(&mut self, inbound: InboundEvent) -> ControllerResult<()> {
        let kind = inbound.event.kind();
        match self.pending.resolve(inbound.token, kind) {
            Resolution::Stale => {
                warn!("Dropping {} with no matching request", kind);
                // Results cannot be attributed, but the user still hears of errors
                if let HostEvent::Error { message } = &inbound.event {
                    self.shell.show_toast(&format!("Error: {}", message));
                }
                return Ok(());
            }
            Resolution::Matched(request) => debug!("{} answered by {}", request, kind),
            Resolution::Unsolicited => debug!("Host-initiated {}", kind),
            Resolution::Cleared(0) => {}
            Resolution::Cleared(n) => warn!("Host error abandoned {} pending requests", n),
        }

        match inbound.event {
            HostEvent::ImportMdResult { content, filename } => {
                self.apply_import(content, filename)
            }
            HostEvent::PickImageResult { filename } => self.apply_picked_image(&filename),
            HostEvent::ExportSuccess { message } => {
                self.shell.show_toast(&format!("Exported: {}", message));
                Ok(())
            }
            HostEvent::Error { message } => {
                self.shell.show_toast(&format!("Error: {}", message));
                Ok(())
            }
        }
    }

    /// Apply everything queued so far, returning how many events were handled
    pub fn pump_events(&mut self) -> usize {
        let mut handled = 0;
        while let Some(inbound) = self.events.try_next() {
            if let Err(e) = self.handle_event(inbound) {
                warn!("Host event failed: {}", e);
            }
            handled += 1;
        }
        handled
    }

    fn apply_import(&mut self, content: String, filename: Option<String>) -> ControllerResult<()> {
        let candidate = filename
            .map(|name| naming::sanitize_title(&name))
            .filter(|name| !naming::title_from_filename(name).trim().is_empty())
            .map(|name| naming::ensure_md_extension(&name))
            .unwrap_or_else(|| naming::derive_filename(&content, None, Utc::now()));

        let note = match self.store.create_note_named(&candidate, &content) {
            Ok(note) => note,
            Err(e) => {
                self.shell.show_toast(&format!("Import failed: {}", e));
                return Err(e.into());
            }
        };

        self.refresh_list()?;
        self.shell.show_toast(&format!("Imported {}", note.title));
        Ok(())
    }

    fn apply_picked_image(&mut self, filename: &str) -> ControllerResult<()> {
        if !self.session.is_editing() {
            self.shell.show_toast("Open a note to insert an image");
            return Ok(());
        }

        // The local fallback has no managed directory and sends the image inline
        let url = if filename.starts_with("data:") {
            self.images.save_image(self.store.backend_mut(), filename)?.url
        } else {
            self.images.url_for(filename)
        };

        self.insert_image("image", &url);
        Ok(())
    }

    // ==================== Time ====================

    /// Fire the autosave if its window has passed; `true` if a save happened
    ///
    /// Failures are logged and never surfaced.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.autosave.take_due(now) {
            return false;
        }
        let Some(filename) = self.session.current_filename.as_deref() else {
            return false;
        };

        match self
            .store
            .save_note_with_id(filename, &self.session.content, self.open_id)
        {
            Ok(_) => {
                debug!("Autosaved {}", filename);
                true
            }
            Err(e) => {
                warn!("Autosave of {} failed: {}", filename, e);
                false
            }
        }
    }

    /// Serve host events and autosave deadlines until `shutdown` resolves or
    /// the bridge is unbound
    ///
    /// The loop holds the controller for its whole lifetime, so it suits
    /// hosts that only post events (a headless sync or import pass). An
    /// interactive UI that also edits should drive [`pump_events`] and
    /// [`tick`] from its own loop instead, using [`next_deadline`] to sleep.
    ///
    /// [`pump_events`]: AppController::pump_events
    /// [`tick`]: AppController::tick
    /// [`next_deadline`]: AppController::next_deadline
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let deadline = self.autosave.deadline();
            let wake = tokio::time::Instant::from_std(
                deadline.unwrap_or_else(|| Instant::now() + self.autosave.window()),
            );

            tokio::select! {
                _ = &mut shutdown => break,
                inbound = self.events.next() => match inbound {
                    Some(inbound) => {
                        if let Err(e) = self.handle_event(inbound) {
                            warn!("Host event failed: {}", e);
                        }
                    }
                    None => break,
                },
                _ = tokio::time::sleep_until(wake), if deadline.is_some() => {
                    self.tick(Instant::now());
                }
            }
        }
        debug!("Controller loop stopped");
    }

    /// Flush the open note and unbind the host bridge
    ///
    /// Events still queued are discarded, as are pending requests.
    pub fn teardown(&mut self) {
        if let Err(e) = self.persist_open_note() {
            warn!("Final save failed: {}", e);
        }
        self.autosave.cancel();
        self.events.unbind();

        let mut dropped = 0;
        while self.events.try_next().is_some() {
            dropped += 1;
        }
        if dropped > 0 {
            debug!("Discarded {} queued host events", dropped);
        }
        self.pending = PendingRequests::new();
        info!("Controller torn down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{bind, BridgeError, EventSender, LocalFile, LocalShell};
    use crate::storage::MemoryBackend;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;

    const WINDOW: Duration = Duration::from_millis(2000);
    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    type TestController = AppController<MemoryBackend, LocalShell>;

    fn controller_with(files: &[(&str, &str)]) -> (TestController, EventSender) {
        let (sender, receiver) = bind();
        let store = NoteStore::new(MemoryBackend::with_files(files.iter().copied()));
        let controller = AppController::new(
            store,
            ImageStore::new("https://appassets.local/user-images"),
            LocalShell::new(sender.clone()),
            receiver,
            WINDOW,
        );
        (controller, sender)
    }

    fn last_toast(controller: &TestController) -> &str {
        controller
            .shell()
            .toasts()
            .last()
            .map(String::as_str)
            .unwrap_or_default()
    }

    #[test]
    fn test_create_note_seeds_template() {
        let (mut app, _) = controller_with(&[]);
        app.create_note().unwrap();

        assert_eq!(app.screen(), Screen::Editor);
        assert_eq!(app.content(), NEW_NOTE_TEMPLATE);
        assert_eq!(app.current_filename(), None);
        // Nothing is persisted until the first save
        assert!(app.refresh_list().unwrap().is_empty());
    }

    #[test]
    fn test_first_save_names_from_heading() {
        let (mut app, _) = controller_with(&[]);
        app.create_note().unwrap();
        app.edit("# My Note\nbody", None, Instant::now());

        assert_eq!(app.save().unwrap(), "My Note.md");
        assert_eq!(app.current_filename(), Some("My Note.md"));
        assert_eq!(app.store().load_note("My Note.md"), "# My Note\nbody");
        assert_eq!(app.notes().len(), 1);
    }

    #[test]
    fn test_save_without_heading_is_untitled() {
        let (mut app, _) = controller_with(&[]);
        app.create_note().unwrap();
        app.edit("no heading", None, Instant::now());

        let name = app.save().unwrap();
        assert!(name.starts_with("Untitled_") && name.ends_with(".md"));
    }

    #[test]
    fn test_heading_change_renames_and_keeps_identity() {
        let (mut app, _) = controller_with(&[("Old.md", "# Old")]);
        let id = app.notes()[0].id;
        app.select_note("Old.md").unwrap();
        app.edit("# New", None, Instant::now());

        assert_eq!(app.save().unwrap(), "New.md");
        assert!(!app.store().exists("Old.md"));
        assert_eq!(app.store().note_id("New.md").unwrap(), Some(id));
    }

    #[test]
    fn test_save_does_not_clobber_another_note() {
        let (mut app, _) = controller_with(&[("Plan.md", "theirs")]);
        app.create_note().unwrap();
        app.edit("# Plan\nmine", None, Instant::now());

        assert_eq!(app.save().unwrap(), "Plan (2).md");
        assert_eq!(app.store().load_note("Plan.md"), "theirs");
    }

    #[test]
    fn test_back_persists_and_reloads() {
        let (mut app, _) = controller_with(&[("A.md", "a")]);
        app.select_note("A.md").unwrap();
        app.edit("changed", None, Instant::now());

        app.back().unwrap();
        assert_eq!(app.screen(), Screen::List);
        assert_eq!(app.store().load_note("A.md"), "changed");
        assert!(app.next_deadline().is_none());
    }

    #[test]
    fn test_back_failure_stays_in_editor() {
        let (mut app, _) = controller_with(&[("A.md", "a")]);
        app.select_note("A.md").unwrap();
        app.edit("changed", None, Instant::now());
        app.store_mut().backend_mut().set_read_only(true);

        assert!(app.back().is_err());
        assert_eq!(app.screen(), Screen::Editor);
        assert!(last_toast(&app).starts_with("Save failed"));
    }

    #[test]
    fn test_select_missing_note() {
        let (mut app, _) = controller_with(&[]);
        assert!(!app.select_note("Ghost.md").unwrap());
        assert_eq!(app.screen(), Screen::List);
        assert_eq!(last_toast(&app), "Note not found: Ghost");
    }

    #[test]
    fn test_navigate_relative_link() {
        let (mut app, _) = controller_with(&[("Start.md", "see [o](./Other)"), ("Other.md", "# Other")]);
        app.select_note("Start.md").unwrap();
        app.edit("edited start", None, Instant::now());

        assert!(app.navigate("./Other").unwrap());
        assert_eq!(app.current_filename(), Some("Other.md"));
        assert_eq!(app.content(), "# Other");
        // The note being left is saved first
        assert_eq!(app.store().load_note("Start.md"), "edited start");
    }

    #[test]
    fn test_navigate_missing_target_changes_nothing() {
        let (mut app, _) = controller_with(&[("Start.md", "x")]);
        app.select_note("Start.md").unwrap();
        let before = app.session().clone();

        assert!(!app.navigate("Nowhere").unwrap());
        assert_eq!(app.session(), &before);
        assert_eq!(last_toast(&app), "Note not found: Nowhere");
    }

    #[test]
    fn test_click_external_link() {
        let (mut app, _) = controller_with(&[("A.md", "")]);
        app.select_note("A.md").unwrap();

        assert!(!app.click_link("https://example.com").unwrap());
        assert!(!app.click_link("#section").unwrap());
        assert_eq!(app.shell().opened_links(), ["https://example.com".to_string()]);
        assert_eq!(app.current_filename(), Some("A.md"));
    }

    #[test]
    fn test_click_percent_encoded_link() {
        let (mut app, _) = controller_with(&[("A.md", ""), ("My Note.md", "mine")]);
        app.select_note("A.md").unwrap();

        assert!(app.click_link("My%20Note").unwrap());
        assert_eq!(app.content(), "mine");
    }

    #[test]
    fn test_delete_missing_note() {
        let (mut app, _) = controller_with(&[("A.md", "")]);
        let before = app.notes().to_vec();

        assert!(!app.delete_note("Nope.md").unwrap());
        assert_eq!(app.refresh_list().unwrap(), before.as_slice());
    }

    #[test]
    fn test_delete_open_note_closes_editor() {
        let (mut app, _) = controller_with(&[("A.md", "a")]);
        app.select_note("A.md").unwrap();

        assert!(app.delete_note("A.md").unwrap());
        assert_eq!(app.screen(), Screen::List);
        assert!(app.notes().is_empty());
    }

    #[test]
    fn test_reorder() {
        let (mut app, _) = controller_with(&[("a.md", ""), ("b.md", "")]);
        app.reorder(&["b.md".to_string(), "a.md".to_string()]).unwrap();

        let names: Vec<&str> = app.notes().iter().map(|n| n.filename.as_str()).collect();
        assert_eq!(names, vec!["b.md", "a.md"]);
    }

    #[test]
    fn test_autosave_single_save_after_quiet_window() {
        let (mut app, _) = controller_with(&[("A.md", "")]);
        app.select_note("A.md").unwrap();
        let start = Instant::now();

        app.edit("first", None, start);
        assert!(!app.tick(start + Duration::from_millis(1999)));
        assert!(app.tick(start + WINDOW));
        assert_eq!(app.store().load_note("A.md"), "first");

        // Exactly one save
        assert!(!app.tick(start + WINDOW * 3));
    }

    #[test]
    fn test_autosave_keeps_only_last_edit() {
        let (mut app, _) = controller_with(&[("A.md", "")]);
        app.select_note("A.md").unwrap();
        let start = Instant::now();

        app.edit("one", None, start);
        app.edit("two", None, start + Duration::from_millis(500));

        assert!(!app.tick(start + WINDOW));
        assert_eq!(app.store().load_note("A.md"), "");
        assert!(app.tick(start + Duration::from_millis(2500)));
        assert_eq!(app.store().load_note("A.md"), "two");
        assert!(!app.tick(start + WINDOW * 5));
    }

    #[test]
    fn test_no_autosave_for_unsaved_note() {
        let (mut app, _) = controller_with(&[]);
        app.create_note().unwrap();
        app.edit("# Draft", None, Instant::now());
        assert!(app.next_deadline().is_none());
    }

    #[test]
    fn test_autosave_failure_is_swallowed() {
        let (mut app, _) = controller_with(&[("A.md", "")]);
        app.select_note("A.md").unwrap();
        let start = Instant::now();
        app.edit("x", None, start);
        app.store_mut().backend_mut().set_read_only(true);

        assert!(!app.tick(start + WINDOW));
        assert!(app.shell().toasts().is_empty());
    }

    #[test]
    fn test_drawing_gates_text_edits() {
        let (mut app, _) = controller_with(&[("A.md", "text")]);
        app.select_note("A.md").unwrap();

        assert!(app.start_drawing());
        assert!(!app.start_drawing());
        assert!(!app.edit("typed while drawing", None, Instant::now()));
        assert_eq!(app.content(), "text");

        app.cancel_drawing();
        assert!(!app.is_drawing());
        assert_eq!(app.content(), "text");
    }

    #[test]
    fn test_save_drawing_inserts_at_cursor() {
        let (mut app, _) = controller_with(&[("A.md", "ab")]);
        app.select_note("A.md").unwrap();
        app.set_cursor(Some(1));
        app.start_drawing();

        let raster = format!("data:image/png;base64,{}", STANDARD.encode(PNG));
        let image = app.save_drawing(&raster).unwrap();

        assert!(!app.is_drawing());
        assert_eq!(
            app.content(),
            format!("a\n![drawing]({})\nb", image.url)
        );
        assert!(image.url.starts_with("https://appassets.local/user-images/img_"));
        assert!(app.next_deadline().is_some());
    }

    #[test]
    fn test_save_drawing_without_cursor_appends() {
        let (mut app, _) = controller_with(&[("A.md", "ab")]);
        app.select_note("A.md").unwrap();
        app.start_drawing();

        let image = app.save_drawing(&STANDARD.encode(PNG)).unwrap();
        assert!(app.content().starts_with("ab\n![drawing]("));
        assert!(app.content().ends_with(&format!("{})\n", image.url)));
    }

    #[test]
    fn test_save_drawing_requires_drawing_mode() {
        let (mut app, _) = controller_with(&[("A.md", "")]);
        app.select_note("A.md").unwrap();
        assert!(matches!(
            app.save_drawing("AAAA"),
            Err(ControllerError::InvalidState(_))
        ));
    }

    #[test]
    fn test_import_result_arrives_on_later_turn() {
        let (mut app, _) = controller_with(&[]);
        app.shell_mut().queue_pick(LocalFile::new("Trip.md", "# Trip\nday one"));

        app.import_markdown().unwrap();
        // Queued, not yet applied
        assert!(!app.store().exists("Trip.md"));
        assert!(app.is_pending(RequestKind::ImportMarkdown));

        assert_eq!(app.pump_events(), 1);
        assert_eq!(app.store().load_note("Trip.md"), "# Trip\nday one");
        assert!(!app.is_pending(RequestKind::ImportMarkdown));
        assert_eq!(last_toast(&app), "Imported Trip");
    }

    #[test]
    fn test_import_name_collision_is_numbered() {
        let (mut app, _) = controller_with(&[("Trip.md", "old")]);
        app.shell_mut().queue_pick(LocalFile::new("Trip.md", "new"));

        app.import_markdown().unwrap();
        app.pump_events();
        assert_eq!(app.store().load_note("Trip.md"), "old");
        assert_eq!(app.store().load_note("Trip (2).md"), "new");
    }

    #[test]
    fn test_import_without_filename_auto_names() {
        let (mut app, sender) = controller_with(&[]);
        sender
            .handle_event("IMPORT_MD_RESULT", "# From Host\n", None)
            .unwrap();

        app.pump_events();
        assert!(app.store().exists("From Host.md"));
    }

    /// Host that never answers a trigger
    #[derive(Default)]
    struct SilentShell {
        toasts: Vec<String>,
    }

    impl HostShell for SilentShell {
        fn show_toast(&mut self, message: &str) {
            self.toasts.push(message.to_string());
        }

        fn open_external_link(&mut self, _url: &str) {}

        fn trigger_import_markdown(&mut self, _token: RequestToken) {}

        fn trigger_export_markdown(&mut self, _token: RequestToken, _filename: &str, _content: &str) {}

        fn trigger_pick_image(&mut self, _token: RequestToken) {}
    }

    fn silent_controller(
        files: &[(&str, &str)],
    ) -> (AppController<MemoryBackend, SilentShell>, EventSender) {
        let (sender, receiver) = bind();
        let store = NoteStore::new(MemoryBackend::with_files(files.iter().copied()));
        let controller = AppController::new(
            store,
            ImageStore::new("https://appassets.local/user-images"),
            SilentShell::default(),
            receiver,
            WINDOW,
        );
        (controller, sender)
    }

    #[test]
    fn test_empty_pick_result_closes_request() {
        let (mut app, sender) = silent_controller(&[("A.md", "")]);
        app.select_note("A.md").unwrap();

        app.pick_image().unwrap();
        assert!(sender.handle_event("PICK_IMAGE_RESULT", "", None).is_err());
        app.pump_events();

        assert!(!app.is_pending(RequestKind::PickImage));
        assert!(app.pick_image().is_ok());
        assert_eq!(app.content(), "");
    }

    #[test]
    fn test_unanswered_request_is_superseded() {
        let (mut app, sender) = silent_controller(&[]);
        let first = app.import_markdown().unwrap();
        let second = app.import_markdown().unwrap();
        assert!(app.is_pending(RequestKind::ImportMarkdown));

        // Late reply to the abandoned request is dropped
        sender
            .post(
                Some(first),
                HostEvent::ImportMdResult {
                    content: "# Late".to_string(),
                    filename: None,
                },
            )
            .unwrap();
        sender
            .post(
                Some(second),
                HostEvent::ImportMdResult {
                    content: "# Current".to_string(),
                    filename: None,
                },
            )
            .unwrap();
        app.pump_events();

        assert!(!app.store().exists("Late.md"));
        assert!(app.store().exists("Current.md"));
        assert!(!app.is_pending(RequestKind::ImportMarkdown));
        assert_eq!(app.shell().toasts, vec!["Imported Current".to_string()]);
    }

    #[test]
    fn test_cancel_request_drops_late_reply() {
        let (mut app, sender) = silent_controller(&[("A.md", "")]);
        app.select_note("A.md").unwrap();
        let token = app.pick_image().unwrap();

        assert!(app.cancel_request(RequestKind::PickImage));
        assert!(!app.cancel_request(RequestKind::PickImage));

        sender
            .post(
                Some(token),
                HostEvent::PickImageResult {
                    filename: "img_1.png".to_string(),
                },
            )
            .unwrap();
        app.pump_events();
        assert_eq!(app.content(), "");
    }

    #[test]
    fn test_stale_error_still_shown() {
        let (mut app, sender) = silent_controller(&[]);
        sender
            .post(
                Some(RequestToken::new()),
                HostEvent::Error {
                    message: "disk full".to_string(),
                },
            )
            .unwrap();
        app.pump_events();

        assert_eq!(app.shell().toasts, vec!["Error: disk full".to_string()]);
        assert_eq!(app.screen(), Screen::List);
    }

    #[test]
    fn test_picked_image_inserted_with_virtual_url() {
        let (mut app, sender) = controller_with(&[("A.md", "")]);
        app.select_note("A.md").unwrap();

        sender
            .handle_event("PICK_IMAGE_RESULT", "img_1.png", None)
            .unwrap();
        app.pump_events();

        assert_eq!(
            app.content(),
            "\n![image](https://appassets.local/user-images/img_1.png)\n"
        );
    }

    #[test]
    fn test_local_pick_stores_inline_image() {
        let (mut app, _) = controller_with(&[("A.md", "")]);
        app.select_note("A.md").unwrap();
        app.shell_mut().queue_pick(LocalFile::new("dot.png", PNG));

        app.pick_image().unwrap();
        app.pump_events();

        assert!(app.content().contains("](https://appassets.local/user-images/img_"));
        assert_eq!(app.store().backend().blob_count(), 1);
    }

    #[test]
    fn test_picked_image_outside_editor_ignored() {
        let (mut app, sender) = controller_with(&[]);
        sender
            .handle_event("PICK_IMAGE_RESULT", "img_1.png", None)
            .unwrap();
        app.pump_events();

        assert_eq!(app.screen(), Screen::List);
        assert_eq!(last_toast(&app), "Open a note to insert an image");
    }

    #[test]
    fn test_stale_token_dropped() {
        let (mut app, sender) = controller_with(&[("A.md", "")]);
        app.select_note("A.md").unwrap();

        sender
            .post(
                Some(RequestToken::new()),
                HostEvent::PickImageResult {
                    filename: "img_9.png".to_string(),
                },
            )
            .unwrap();
        app.pump_events();
        assert_eq!(app.content(), "");
    }

    #[test]
    fn test_export_and_error_only_notify() {
        let (mut app, sender) = controller_with(&[("A.md", "body")]);
        app.select_note("A.md").unwrap();

        app.export_current().unwrap();
        app.pump_events();
        assert_eq!(app.shell().downloads()[0].filename, "A.md");
        assert_eq!(last_toast(&app), "Exported: Downloaded A.md");

        sender.handle_event("ERROR", "disk full", None).unwrap();
        let before = app.session().clone();
        app.pump_events();
        assert_eq!(app.session(), &before);
        assert_eq!(last_toast(&app), "Error: disk full");
    }

    #[test]
    fn test_cancelled_pick_clears_request() {
        let (mut app, _) = controller_with(&[("A.md", "")]);
        app.select_note("A.md").unwrap();

        app.pick_image().unwrap();
        app.pump_events();
        assert!(!app.is_pending(RequestKind::PickImage));
        assert!(app.pick_image().is_ok());
    }

    #[test]
    fn test_teardown_flushes_and_unbinds() {
        let (mut app, sender) = controller_with(&[("A.md", "")]);
        app.select_note("A.md").unwrap();
        app.edit("unsaved", None, Instant::now());

        app.teardown();
        assert_eq!(app.store().load_note("A.md"), "unsaved");
        assert!(!sender.is_bound());
        assert!(matches!(
            sender.handle_event("ERROR", "late", None),
            Err(BridgeError::Unbound)
        ));
    }

    #[test]
    fn test_view_mode_cycle() {
        let (mut app, _) = controller_with(&[]);
        assert_eq!(app.view_mode(), ViewMode::Split);
        assert_eq!(app.cycle_view_mode(), ViewMode::Preview);
        app.set_view_mode(ViewMode::Edit);
        assert_eq!(app.view_mode(), ViewMode::Edit);
    }

    #[test]
    fn test_edits_interleave_with_host_events() {
        let (mut app, sender) = controller_with(&[("A.md", "")]);
        app.select_note("A.md").unwrap();

        let start = Instant::now();
        app.edit("typed", Some(5), start);
        sender
            .handle_event("PICK_IMAGE_RESULT", "img_1.png", None)
            .unwrap();
        assert_eq!(app.pump_events(), 1);

        let deadline = app.next_deadline().unwrap();
        assert!(app.tick(deadline));
        assert_eq!(
            app.store().load_note("A.md"),
            "typed\n![image](https://appassets.local/user-images/img_1.png)\n"
        );
    }

    #[tokio::test]
    async fn test_run_applies_events_until_shutdown() {
        let (mut app, sender) = controller_with(&[]);
        sender
            .handle_event("IMPORT_MD_RESULT", "# Async\n", Some("Async.md".to_string()))
            .unwrap();

        let shutdown = tokio::time::sleep(Duration::from_millis(50));
        app.run(shutdown).await;
        assert!(app.store().exists("Async.md"));
    }

    #[tokio::test]
    async fn test_run_fires_autosave() {
        let (sender, receiver) = bind();
        let mut app = AppController::new(
            NoteStore::new(MemoryBackend::with_files([("A.md", "")])),
            ImageStore::new("https://appassets.local/user-images"),
            LocalShell::new(sender),
            receiver,
            Duration::from_millis(10),
        );
        app.select_note("A.md").unwrap();
        app.edit("saved by timer", None, Instant::now());

        app.run(tokio::time::sleep(Duration::from_millis(200))).await;
        assert_eq!(app.store().load_note("A.md"), "saved by timer");
        assert!(app.next_deadline().is_none());
    }
}
