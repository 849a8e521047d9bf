//! Data models for notebridge
//!
//! Notes are addressed by filename on disk, but each one also carries an
//! immutable [`NoteId`] assigned at creation so renames keep identity.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::naming;

/// Stable internal identifier of a note, independent of its filename
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(pub Uuid);

impl NoteId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named markdown document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    /// Storage key, unique within the store
    pub filename: String,
    /// Display name (filename without extension)
    pub title: String,
    pub content: String,
    /// Last-modified time as reported by storage
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        let filename = filename.into();
        Self {
            id: NoteId::new(),
            title: naming::title_from_filename(&filename),
            filename,
            content: content.into(),
            updated_at: Utc::now(),
        }
    }

    pub fn summary(&self) -> NoteSummary {
        NoteSummary {
            id: self.id,
            filename: self.filename.clone(),
            title: self.title.clone(),
            updated_at: self.updated_at,
        }
    }
}

/// List entry for a note, without its content
///
/// Serializes to the `{filename, title, updatedAt}` shape hosts exchange.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NoteSummary {
    #[serde(default)]
    pub id: NoteId,
    pub filename: String,
    pub title: String,
    pub updated_at: DateTime<Utc>,
}

/// A stored image, addressable from rendered markdown
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageRef {
    /// Virtual URL the preview renderer dereferences
    pub url: String,
    pub filename: String,
}

/// Top-level screen of the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Screen {
    List,
    Editor,
}

/// Editor layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Text input only
    Edit,
    /// Text input beside rendered preview
    #[default]
    Split,
    /// Rendered preview only
    Preview,
}

impl ViewMode {
    /// Next mode in the toolbar toggle order
    pub fn cycle(self) -> Self {
        match self {
            ViewMode::Edit => ViewMode::Split,
            ViewMode::Split => ViewMode::Preview,
            ViewMode::Preview => ViewMode::Edit,
        }
    }
}
