//! The seam between the Note Store and whatever persists notes
//!
//! A backend is either the host shell's filesystem or a local fallback with
//! no filesystem access at all. Both expose the same call-style surface, so
//! everything above this trait is unaware of which one is active.

use chrono::{DateTime, Utc};

use super::StoreResult;

/// A persisted note file as reported by storage
#[derive(Debug, Clone, PartialEq)]
pub struct NoteFile {
    pub filename: String,
    pub updated_at: DateTime<Utc>,
}

/// Persistence operations for notes, small state items and image blobs
pub trait NoteBackend {
    /// All note files, in the order storage reports them
    fn list_files(&self) -> StoreResult<Vec<NoteFile>>;

    /// Read a note's content; `NotFound` if absent
    fn read_file(&self, filename: &str) -> StoreResult<String>;

    /// Create or overwrite a note, returning its new modification time
    fn write_file(&mut self, filename: &str, content: &str) -> StoreResult<DateTime<Utc>>;

    /// Remove a note; `Ok(false)` if there was nothing to remove
    fn remove_file(&mut self, filename: &str) -> StoreResult<bool>;

    /// Read a state item (order list, identity map)
    fn get_item(&self, key: &str) -> StoreResult<Option<String>>;

    /// Replace a state item wholesale
    fn set_item(&mut self, key: &str, value: &str) -> StoreResult<()>;

    /// Store an image blob under the managed image directory
    fn write_blob(&mut self, filename: &str, bytes: &[u8]) -> StoreResult<()>;

    fn has_blob(&self, filename: &str) -> bool;
}
