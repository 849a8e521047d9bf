//! Filesystem-backed host shell
//!
//! The native side of the bridge: it owns real file pickers, writes exports
//! and copies picked images into the managed image directory, then reports
//! back through the event queue.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::channel::EventSender;
use super::event::HostEvent;
use super::pending::RequestToken;
use super::shell::HostShell;
use crate::config::Config;
use crate::images::ImageStore;
use crate::naming;
use crate::storage::{atomic_write, FsBackend};

/// What the user is being asked to pick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickPurpose {
    Markdown,
    Image,
}

/// Source of user-chosen paths; `None` means the user cancelled
pub trait FilePicker {
    fn pick(&mut self, purpose: PickPurpose) -> Option<PathBuf>;
}

impl<F> FilePicker for F
where
    F: FnMut(PickPurpose) -> Option<PathBuf>,
{
    fn pick(&mut self, purpose: PickPurpose) -> Option<PathBuf> {
        self(purpose)
    }
}

/// Host shell over the local filesystem
pub struct NativeShell<P: FilePicker> {
    events: EventSender,
    picker: P,
    backend: FsBackend,
    images: ImageStore,
    export_dir: PathBuf,
    toasts: Vec<String>,
}

impl<P: FilePicker> NativeShell<P> {
    pub fn new(config: &Config, events: EventSender, picker: P) -> Self {
        Self {
            events,
            picker,
            backend: FsBackend::from_config(config),
            images: ImageStore::from_config(config),
            export_dir: config.exports_dir(),
            toasts: Vec::new(),
        }
    }

    /// Notifications shown since the last call
    pub fn take_toasts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.toasts)
    }

    fn reply(&self, token: RequestToken, event: HostEvent) {
        if let Err(e) = self.events.post(Some(token), event) {
            warn!("Dropping host reply for {}: {}", token, e);
        }
    }

    fn fail(&self, token: RequestToken, message: String) {
        warn!("{}", message);
        self.reply(token, HostEvent::Error { message });
    }
}

impl<P: FilePicker> HostShell for NativeShell<P> {
    fn show_toast(&mut self, message: &str) {
        info!("Toast: {}", message);
        self.toasts.push(message.to_string());
    }

    fn open_external_link(&mut self, url: &str) {
        if let Err(e) = open::that(url) {
            warn!("Failed to open {}: {}", url, e);
            self.show_toast(&format!("Could not open {}", url));
        }
    }

    fn trigger_import_markdown(&mut self, token: RequestToken) {
        let Some(path) = self.picker.pick(PickPurpose::Markdown) else {
            self.fail(token, "Import cancelled".to_string());
            return;
        };

        match fs::read_to_string(&path) {
            Ok(content) => {
                info!("Imported {:?}", path);
                self.reply(
                    token,
                    HostEvent::ImportMdResult {
                        content,
                        filename: file_name(&path),
                    },
                );
            }
            Err(e) => self.fail(token, format!("Failed to read {}: {}", path.display(), e)),
        }
    }

    fn trigger_export_markdown(&mut self, token: RequestToken, filename: &str, content: &str) {
        if let Err(e) = naming::validate_filename(filename) {
            self.fail(token, e.to_string());
            return;
        }

        let path = self.export_dir.join(filename);
        match atomic_write(&path, content.as_bytes()) {
            Ok(()) => {
                info!("Exported {:?}", path);
                self.reply(
                    token,
                    HostEvent::ExportSuccess {
                        message: path.display().to_string(),
                    },
                );
            }
            Err(e) => self.fail(token, format!("Export failed: {}", e)),
        }
    }

    fn trigger_pick_image(&mut self, token: RequestToken) {
        let Some(path) = self.picker.pick(PickPurpose::Image) else {
            self.fail(token, "Image selection cancelled".to_string());
            return;
        };

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.fail(token, format!("Failed to read {}: {}", path.display(), e));
                return;
            }
        };

        let original = file_name(&path).unwrap_or_default();
        match self.images.import_image(&mut self.backend, &bytes, &original) {
            Ok(image) => self.reply(
                token,
                HostEvent::PickImageResult {
                    filename: image.filename,
                },
            ),
            Err(e) => self.fail(token, format!("Failed to copy image: {}", e)),
        }
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}
