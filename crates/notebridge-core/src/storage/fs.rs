//! Filesystem backend used by the native host shell
//!
//! Uses atomic writes (write to temp file, then rename) so a crash mid-save
//! never leaves a note half-written.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;

use super::{NoteBackend, NoteFile, StoreError, StoreResult};
use crate::config::Config;
use crate::naming::{self, NOTE_EXTENSION};

/// Directory (relative to the data dir) holding user images
pub const IMAGES_DIR: &str = "user-images";

const NOTES_DIR: &str = "notes";
const STATE_DIR: &str = "state";

/// Notes, state items and blobs stored as plain files
#[derive(Debug, Clone)]
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    /// Create a backend rooted at `root`; directories are created lazily
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.data_dir.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn notes_dir(&self) -> PathBuf {
        self.root.join(NOTES_DIR)
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join(IMAGES_DIR)
    }

    fn state_dir(&self) -> PathBuf {
        self.root.join(STATE_DIR)
    }

    fn note_path(&self, filename: &str) -> StoreResult<PathBuf> {
        naming::validate_filename(filename)?;
        Ok(self.notes_dir().join(filename))
    }

    fn item_path(&self, key: &str) -> StoreResult<PathBuf> {
        naming::validate_filename(key)?;
        Ok(self.state_dir().join(format!("{}.json", key)))
    }

    fn blob_path(&self, filename: &str) -> StoreResult<PathBuf> {
        naming::validate_filename(filename)?;
        Ok(self.images_dir().join(filename))
    }
}

impl NoteBackend for FsBackend {
    fn list_files(&self) -> StoreResult<Vec<NoteFile>> {
        let dir = self.notes_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&dir).map_err(|e| StoreError::from_read(e, dir.clone()))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::from_read(e, dir.clone()))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !filename.ends_with(NOTE_EXTENSION) {
                continue;
            }

            let updated_at = entry
                .metadata()
                .and_then(|m| m.modified())
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());

            files.push(NoteFile {
                filename: filename.to_string(),
                updated_at,
            });
        }

        // read_dir order is unspecified; report a stable one
        files.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(files)
    }

    fn read_file(&self, filename: &str) -> StoreResult<String> {
        let path = self.note_path(filename)?;
        fs::read_to_string(&path).map_err(|e| StoreError::from_read(e, path))
    }

    fn write_file(&mut self, filename: &str, content: &str) -> StoreResult<DateTime<Utc>> {
        let path = self.note_path(filename)?;
        atomic_write(&path, content.as_bytes())?;
        debug!("Wrote note {:?} ({} bytes)", path, content.len());
        Ok(Utc::now())
    }

    fn remove_file(&mut self, filename: &str) -> StoreResult<bool> {
        let path = self.note_path(filename)?;
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).map_err(|e| StoreError::from_io(e, path.clone()))?;
        debug!("Removed note {:?}", path);
        Ok(true)
    }

    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.item_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| StoreError::from_read(e, path))
    }

    fn set_item(&mut self, key: &str, value: &str) -> StoreResult<()> {
        let path = self.item_path(key)?;
        atomic_write(&path, value.as_bytes())
    }

    fn write_blob(&mut self, filename: &str, bytes: &[u8]) -> StoreResult<()> {
        let path = self.blob_path(filename)?;
        atomic_write(&path, bytes)?;
        debug!("Wrote image {:?} ({} bytes)", path, bytes.len());
        Ok(())
    }

    fn has_blob(&self, filename: &str) -> bool {
        self.blob_path(filename)
            .map(|p| p.exists())
            .unwrap_or(false)
    }
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
pub fn atomic_write(path: &Path, data: &[u8]) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StoreError::from_io(e, parent.to_path_buf()))?;
    }

    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    let mut file =
        File::create(&temp_path).map_err(|e| StoreError::from_io(e, temp_path.clone()))?;

    file.write_all(data)
        .map_err(|e| StoreError::from_io(e, temp_path.clone()))?;

    file.sync_all()
        .map_err(|e| StoreError::from_io(e, temp_path.clone()))?;

    fs::rename(&temp_path, path).map_err(|e| StoreError::from_io(e, path.to_path_buf()))?;

    Ok(())
}
