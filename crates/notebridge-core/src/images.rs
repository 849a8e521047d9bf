//! Image Store
//!
//! Persists raster images (canvas exports and picked files) and hands back a
//! virtual URL the preview can dereference without filesystem access. The
//! store never touches note content; inserting the reference is up to the
//! caller.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Utc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::models::ImageRef;
use crate::storage::{NoteBackend, StoreError};

/// Errors from decoding or storing an image
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Image data is empty")]
    EmptyPayload,

    #[error("Image data is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Names, stores and addresses user images
#[derive(Debug, Clone)]
pub struct ImageStore {
    url_base: String,
}

impl ImageStore {
    /// `url_base` is everything before `/<filename>`,
    /// e.g. `https://appassets.local/user-images`
    pub fn new(url_base: impl Into<String>) -> Self {
        let url_base: String = url_base.into();
        Self {
            url_base: url_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.image_url_base())
    }

    /// Virtual URL for a stored image
    pub fn url_for(&self, filename: &str) -> String {
        format!("{}/{}", self.url_base, filename)
    }

    /// Decode base64 raster data and store it
    ///
    /// Accepts bare base64 or a `data:<mime>;base64,` URL as produced by a
    /// canvas export.
    pub fn save_image<B: NoteBackend>(
        &self,
        backend: &mut B,
        raw: &str,
    ) -> Result<ImageRef, ImageError> {
        let (mime, payload) = split_data_url(raw.trim());
        let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        if payload.is_empty() {
            return Err(ImageError::EmptyPayload);
        }

        let bytes = STANDARD.decode(payload.as_bytes())?;
        if bytes.is_empty() {
            return Err(ImageError::EmptyPayload);
        }

        let ext = mime
            .and_then(extension_for_mime)
            .unwrap_or_else(|| sniff_extension(&bytes));
        self.store(backend, &bytes, ext)
    }

    /// Store the bytes of a file the user picked
    pub fn import_image<B: NoteBackend>(
        &self,
        backend: &mut B,
        bytes: &[u8],
        original_name: &str,
    ) -> Result<ImageRef, ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::EmptyPayload);
        }

        let from_name = original_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| {
                !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric())
            });

        match from_name {
            Some(ext) => self.store(backend, bytes, &ext),
            None => self.store(backend, bytes, sniff_extension(bytes)),
        }
    }

    fn store<B: NoteBackend>(
        &self,
        backend: &mut B,
        bytes: &[u8],
        ext: &str,
    ) -> Result<ImageRef, ImageError> {
        let mut filename = generate_filename(ext);
        while backend.has_blob(&filename) {
            filename = generate_filename(ext);
        }

        backend.write_blob(&filename, bytes)?;
        info!("Stored image {} ({} bytes)", filename, bytes.len());

        Ok(ImageRef {
            url: self.url_for(&filename),
            filename,
        })
    }
}

/// Markdown image reference
pub fn markdown_for(alt: &str, url: &str) -> String {
    format!("![{}]({})", alt, url)
}

/// Timestamp plus random suffix; nothing ever confirms an overwrite
fn generate_filename(ext: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "img_{}_{}.{}",
        Utc::now().timestamp_millis(),
        &suffix[..8],
        ext
    )
}

/// Split `data:image/png;base64,AAAA` into its mime type and payload
fn split_data_url(raw: &str) -> (Option<&str>, &str) {
    let Some(rest) = raw.strip_prefix("data:") else {
        return (None, raw);
    };
    match rest.split_once(',') {
        Some((header, payload)) => {
            let mime = header.split(';').next().filter(|m| !m.is_empty());
            (mime, payload)
        }
        None => (None, ""),
    }
}

fn extension_for_mime(mime: &str) -> Option<&'static str> {
    match mime.to_ascii_lowercase().as_str() {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

fn sniff_extension(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        "png"
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "jpg"
    } else if bytes.starts_with(b"GIF8") {
        "gif"
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "webp"
    } else {
        "png"
    }
}
