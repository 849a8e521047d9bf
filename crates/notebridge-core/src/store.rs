//! Note Store
//!
//! Presents a synchronous API over a [`NoteBackend`], whether that is the host
//! shell's filesystem or the local fallback.
//!
//! ## State items
//!
//! Two small items live beside the note files, each replaced wholesale:
//!
//! - `note_order`: the user's manual ordering, a JSON array of filenames.
//!   Saved independently of note content and never validated against it.
//! - `note_ids`: filename → [`NoteId`], so a note keeps its identity when a
//!   heading edit renames it.
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = NoteStore::new(MemoryBackend::new());
//! store.save_note("Plan.md", "# Plan\n")?;
//! let notes = store.list_notes()?;
//! ```

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::models::{Note, NoteId, NoteSummary};
use crate::naming;
use crate::storage::{NoteBackend, StoreError, StoreResult};

const ORDER_KEY: &str = "note_order";
const IDS_KEY: &str = "note_ids";

/// Note persistence with ordering and stable identity
pub struct NoteStore<B: NoteBackend> {
    backend: B,
}

impl<B: NoteBackend> NoteStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    // ==================== Listing ====================

    /// All notes in display order
    ///
    /// Notes named in the order list come first, in that order. Files the
    /// order list does not mention follow in storage-reported order. Order
    /// entries whose file is gone are skipped.
    pub fn list_notes(&mut self) -> StoreResult<Vec<NoteSummary>> {
        let files = self.backend.list_files()?;
        let order = self.note_order().unwrap_or_else(|e| {
            warn!("Ignoring unreadable note order: {}", e);
            Vec::new()
        });
        let mut ids = self.load_ids()?;
        let mut adopted = false;

        let by_name: HashMap<&str, DateTime<Utc>> = files
            .iter()
            .map(|f| (f.filename.as_str(), f.updated_at))
            .collect();

        let mut seen: HashSet<&str> = HashSet::new();
        let ordered = order
            .iter()
            .map(String::as_str)
            .chain(files.iter().map(|f| f.filename.as_str()));

        let mut notes = Vec::with_capacity(files.len());
        for filename in ordered {
            let Some(updated_at) = by_name.get(filename) else {
                continue;
            };
            if !seen.insert(filename) {
                continue;
            }

            let id = *ids.entry(filename.to_string()).or_insert_with(|| {
                adopted = true;
                NoteId::new()
            });

            notes.push(NoteSummary {
                id,
                filename: filename.to_string(),
                title: naming::title_from_filename(filename),
                updated_at: *updated_at,
            });
        }

        // Files written outside the store get an identity on first sight
        if adopted {
            if let Err(e) = self.save_ids(&ids) {
                warn!("Could not persist identities for new files: {}", e);
            }
        }

        Ok(notes)
    }

    /// Persisted order list, possibly naming notes that no longer exist
    pub fn note_order(&self) -> StoreResult<Vec<String>> {
        match self.backend.get_item(ORDER_KEY)? {
            Some(json) => serde_json::from_str(&json).map_err(|source| StoreError::Serialization {
                key: ORDER_KEY.to_string(),
                source,
            }),
            None => Ok(Vec::new()),
        }
    }

    /// Replace the order list wholesale
    pub fn save_note_order(&mut self, filenames: &[String]) -> StoreResult<()> {
        let json = serde_json::to_string(filenames).map_err(|source| StoreError::Serialization {
            key: ORDER_KEY.to_string(),
            source,
        })?;
        self.backend.set_item(ORDER_KEY, &json)?;
        debug!("Saved note order ({} entries)", filenames.len());
        Ok(())
    }

    // ==================== Reading ====================

    /// Content of a note, or `""` when it does not exist
    ///
    /// Kept for callers written against the host's string-returning call,
    /// which cannot tell an empty note from a missing one. Use
    /// [`NoteStore::read_note`] to distinguish.
    pub fn load_note(&self, filename: &str) -> String {
        match self.read_note(filename) {
            Ok(content) => content.unwrap_or_default(),
            Err(e) => {
                warn!("Failed to load {}: {}", filename, e);
                String::new()
            }
        }
    }

    /// Content of a note, `None` when absent
    pub fn read_note(&self, filename: &str) -> StoreResult<Option<String>> {
        match self.backend.read_file(filename) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Full note record, `None` when absent
    pub fn get_note(&mut self, filename: &str) -> StoreResult<Option<Note>> {
        let Some(content) = self.read_note(filename)? else {
            return Ok(None);
        };

        let updated_at = self
            .backend
            .list_files()?
            .into_iter()
            .find(|f| f.filename == filename)
            .map(|f| f.updated_at)
            .unwrap_or_else(Utc::now);

        let id = self.ensure_id(filename, None)?;

        Ok(Some(Note {
            id,
            filename: filename.to_string(),
            title: naming::title_from_filename(filename),
            content,
            updated_at,
        }))
    }

    pub fn exists(&self, filename: &str) -> bool {
        matches!(self.read_note(filename), Ok(Some(_)))
    }

    /// Identity of a stored note, if it has one
    pub fn note_id(&self, filename: &str) -> StoreResult<Option<NoteId>> {
        Ok(self.load_ids()?.get(filename).copied())
    }

    /// Current filename of the note with this identity
    pub fn filename_for(&self, id: NoteId) -> StoreResult<Option<String>> {
        Ok(self
            .load_ids()?
            .into_iter()
            .find(|(_, v)| *v == id)
            .map(|(k, _)| k))
    }

    // ==================== Writing ====================

    /// Create or overwrite a note
    ///
    /// The order list is left untouched.
    pub fn save_note(&mut self, filename: &str, content: &str) -> StoreResult<DateTime<Utc>> {
        self.save_note_with_id(filename, content, None)
    }

    /// Save, attaching `id` if the filename has no identity yet
    pub fn save_note_with_id(
        &mut self,
        filename: &str,
        content: &str,
        id: Option<NoteId>,
    ) -> StoreResult<DateTime<Utc>> {
        naming::validate_filename(filename)?;
        let updated_at = self.backend.write_file(filename, content)?;
        self.ensure_id(filename, id)?;
        debug!("Saved {} ({} bytes)", filename, content.len());
        Ok(updated_at)
    }

    /// Create a note immediately, named from its content
    ///
    /// Unlike [`NoteStore::save_note`], the new note is appended to the order
    /// list so list state is consistent from the moment it exists.
    pub fn create_note(&mut self, content: &str) -> StoreResult<Note> {
        let candidate = naming::derive_filename(content, None, Utc::now());
        self.create_note_named(&candidate, content)
    }

    /// Create a note under `candidate`, or a numbered variant if taken
    pub fn create_note_named(&mut self, candidate: &str, content: &str) -> StoreResult<Note> {
        let mut order: Vec<String> = self
            .list_notes()?
            .into_iter()
            .map(|n| n.filename)
            .collect();

        let filename = naming::unique_filename(candidate, |name| order.iter().any(|n| n == name));
        let id = NoteId::new();
        let updated_at = self.save_note_with_id(&filename, content, Some(id))?;

        order.push(filename.clone());
        self.save_note_order(&order)?;
        info!("Created note {}", filename);

        Ok(Note {
            id,
            title: naming::title_from_filename(&filename),
            filename,
            content: content.to_string(),
            updated_at,
        })
    }

    /// Move a note to a new filename, writing `content` there
    ///
    /// The new file is written before the old one is removed. Identity and
    /// position in the order list move with it.
    pub fn rename_note(
        &mut self,
        old: &str,
        new: &str,
        content: &str,
    ) -> StoreResult<DateTime<Utc>> {
        if old == new {
            return self.save_note(new, content);
        }
        naming::validate_filename(new)?;

        let mut ids = self.load_ids()?;
        let id = ids.remove(old).unwrap_or_default();

        let updated_at = self.backend.write_file(new, content)?;
        ids.insert(new.to_string(), id);
        self.save_ids(&ids)?;

        let order = self.note_order().unwrap_or_default();
        if order.iter().any(|n| n == old) {
            let order: Vec<String> = order
                .into_iter()
                .filter(|n| n != new)
                .map(|n| if n == old { new.to_string() } else { n })
                .collect();
            self.save_note_order(&order)?;
        }

        self.backend.remove_file(old)?;
        info!("Renamed {} -> {}", old, new);
        Ok(updated_at)
    }

    /// Remove a note, returning false if it did not exist
    ///
    /// Its entries in the order list and identity map go with it.
    pub fn delete_note(&mut self, filename: &str) -> StoreResult<bool> {
        if !self.backend.remove_file(filename)? {
            debug!("Delete of missing note {}", filename);
            return Ok(false);
        }

        let order = self.note_order().unwrap_or_default();
        if order.iter().any(|n| n == filename) {
            let order: Vec<String> = order.into_iter().filter(|n| n != filename).collect();
            self.save_note_order(&order)?;
        }

        let mut ids = self.load_ids()?;
        if ids.remove(filename).is_some() {
            self.save_ids(&ids)?;
        }

        info!("Deleted note {}", filename);
        Ok(true)
    }

    // ==================== Identity ====================

    fn load_ids(&self) -> StoreResult<HashMap<String, NoteId>> {
        match self.backend.get_item(IDS_KEY)? {
            Some(json) => serde_json::from_str(&json).map_err(|source| StoreError::Serialization {
                key: IDS_KEY.to_string(),
                source,
            }),
            None => Ok(HashMap::new()),
        }
    }

    fn save_ids(&mut self, ids: &HashMap<String, NoteId>) -> StoreResult<()> {
        let json = serde_json::to_string(ids).map_err(|source| StoreError::Serialization {
            key: IDS_KEY.to_string(),
            source,
        })?;
        self.backend.set_item(IDS_KEY, &json)
    }

    fn ensure_id(&mut self, filename: &str, preferred: Option<NoteId>) -> StoreResult<NoteId> {
        let mut ids = self.load_ids()?;
        if let Some(id) = ids.get(filename) {
            return Ok(*id);
        }
        let id = preferred.unwrap_or_default();
        ids.insert(filename.to_string(), id);
        self.save_ids(&ids)?;
        Ok(id)
    }
}
