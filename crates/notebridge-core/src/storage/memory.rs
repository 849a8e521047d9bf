//! In-memory backend
//!
//! The local fallback used when no host shell is present: the web layer can
//! still keep notes in its own key/value storage, it just cannot reach the
//! filesystem. Also the backend every controller test runs against.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use super::{NoteBackend, NoteFile, StoreError, StoreResult};
use crate::naming::{self, NOTE_EXTENSION};

#[derive(Debug, Clone)]
struct MemoryFile {
    filename: String,
    content: String,
    updated_at: DateTime<Utc>,
}

/// Notes, items and blobs held in process memory
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    /// Insertion order doubles as storage-reported order
    files: Vec<MemoryFile>,
    items: HashMap<String, String>,
    blobs: HashMap<String, Vec<u8>>,
    read_only: bool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed notes without going through a store
    pub fn with_files<'a>(files: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut backend = Self::new();
        for (filename, content) in files {
            backend.files.push(MemoryFile {
                filename: filename.to_string(),
                content: content.to_string(),
                updated_at: Utc::now(),
            });
        }
        backend
    }

    /// Make every write fail as a full disk would
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn blob(&self, filename: &str) -> Option<&[u8]> {
        self.blobs.get(filename).map(Vec::as_slice)
    }

    pub fn blob_count(&self) -> usize {
        self.blobs.len()
    }

    fn check_writable(&self, name: &str) -> StoreResult<()> {
        if self.read_only {
            return Err(StoreError::DiskFull {
                path: PathBuf::from(name),
                source: io::Error::new(io::ErrorKind::Other, "quota exceeded"),
            });
        }
        Ok(())
    }
}

impl NoteBackend for MemoryBackend {
    fn list_files(&self) -> StoreResult<Vec<NoteFile>> {
        Ok(self
            .files
            .iter()
            .filter(|f| f.filename.ends_with(NOTE_EXTENSION))
            .map(|f| NoteFile {
                filename: f.filename.clone(),
                updated_at: f.updated_at,
            })
            .collect())
    }

    fn read_file(&self, filename: &str) -> StoreResult<String> {
        self.files
            .iter()
            .find(|f| f.filename == filename)
            .map(|f| f.content.clone())
            .ok_or_else(|| StoreError::not_found(filename))
    }

    fn write_file(&mut self, filename: &str, content: &str) -> StoreResult<DateTime<Utc>> {
        naming::validate_filename(filename)?;
        self.check_writable(filename)?;

        let now = Utc::now();
        match self.files.iter_mut().find(|f| f.filename == filename) {
            Some(file) => {
                file.content = content.to_string();
                file.updated_at = now;
            }
            None => self.files.push(MemoryFile {
                filename: filename.to_string(),
                content: content.to_string(),
                updated_at: now,
            }),
        }
        Ok(now)
    }

    fn remove_file(&mut self, filename: &str) -> StoreResult<bool> {
        self.check_writable(filename)?;
        let before = self.files.len();
        self.files.retain(|f| f.filename != filename);
        Ok(self.files.len() != before)
    }

    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.check_writable(key)?;
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn write_blob(&mut self, filename: &str, bytes: &[u8]) -> StoreResult<()> {
        naming::validate_filename(filename)?;
        self.check_writable(filename)?;
        self.blobs.insert(filename.to_string(), bytes.to_vec());
        Ok(())
    }

    fn has_blob(&self, filename: &str) -> bool {
        self.blobs.contains_key(filename)
    }
}
