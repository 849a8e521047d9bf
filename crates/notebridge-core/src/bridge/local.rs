//! Fallback shell for running without a native host
//!
//! Picks come from an in-memory queue (what a browser file input would hand
//! over), exports become downloads, and images travel as `data:` URLs since
//! there is no managed directory to copy them into. Results still go through
//! the event queue so the controller handles both shells the same way.

use std::collections::VecDeque;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::{debug, warn};

use super::channel::EventSender;
use super::event::HostEvent;
use super::pending::RequestToken;
use super::shell::HostShell;

/// A file the user chose through a local file input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl LocalFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// An exported note handed to the user as a download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub filename: String,
    pub content: String,
}

/// In-process stand-in for the host shell
#[derive(Debug)]
pub struct LocalShell {
    events: EventSender,
    picks: VecDeque<LocalFile>,
    downloads: Vec<Download>,
    toasts: Vec<String>,
    opened_links: Vec<String>,
}

impl LocalShell {
    pub fn new(events: EventSender) -> Self {
        Self {
            events,
            picks: VecDeque::new(),
            downloads: Vec::new(),
            toasts: Vec::new(),
            opened_links: Vec::new(),
        }
    }

    /// Queue the file the next picker will return
    pub fn queue_pick(&mut self, file: LocalFile) {
        self.picks.push_back(file);
    }

    pub fn downloads(&self) -> &[Download] {
        &self.downloads
    }

    pub fn toasts(&self) -> &[String] {
        &self.toasts
    }

    pub fn take_toasts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.toasts)
    }

    pub fn opened_links(&self) -> &[String] {
        &self.opened_links
    }

    fn reply(&self, token: RequestToken, event: HostEvent) {
        if let Err(e) = self.events.post(Some(token), event) {
            warn!("Dropping local reply for {}: {}", token, e);
        }
    }
}

impl HostShell for LocalShell {
    fn show_toast(&mut self, message: &str) {
        debug!("Toast: {}", message);
        self.toasts.push(message.to_string());
    }

    fn open_external_link(&mut self, url: &str) {
        self.opened_links.push(url.to_string());
    }

    fn trigger_import_markdown(&mut self, token: RequestToken) {
        match self.picks.pop_front() {
            Some(file) => self.reply(
                token,
                HostEvent::ImportMdResult {
                    content: String::from_utf8_lossy(&file.bytes).into_owned(),
                    filename: Some(file.name),
                },
            ),
            None => self.reply(
                token,
                HostEvent::Error {
                    message: "Import cancelled".to_string(),
                },
            ),
        }
    }

    fn trigger_export_markdown(&mut self, token: RequestToken, filename: &str, content: &str) {
        self.downloads.push(Download {
            filename: filename.to_string(),
            content: content.to_string(),
        });
        self.reply(
            token,
            HostEvent::ExportSuccess {
                message: format!("Downloaded {}", filename),
            },
        );
    }

    fn trigger_pick_image(&mut self, token: RequestToken) {
        match self.picks.pop_front() {
            Some(file) => {
                let data_url = format!(
                    "data:{};base64,{}",
                    mime_for_name(&file.name),
                    STANDARD.encode(&file.bytes)
                );
                self.reply(token, HostEvent::PickImageResult { filename: data_url });
            }
            None => self.reply(
                token,
                HostEvent::Error {
                    message: "Image selection cancelled".to_string(),
                },
            ),
        }
    }
}

fn mime_for_name(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "image/png",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::bind;

    #[test]
    fn test_import_uses_queued_pick() {
        let (sender, mut receiver) = bind();
        let mut shell = LocalShell::new(sender);
        shell.queue_pick(LocalFile::new("a.md", "# A"));

        let token = RequestToken::new();
        shell.trigger_import_markdown(token);

        let inbound = receiver.try_next().unwrap();
        assert_eq!(inbound.token, Some(token));
        assert_eq!(
            inbound.event,
            HostEvent::ImportMdResult {
                content: "# A".to_string(),
                filename: Some("a.md".to_string())
            }
        );
    }

    #[test]
    fn test_export_becomes_download() {
        let (sender, mut receiver) = bind();
        let mut shell = LocalShell::new(sender);

        shell.trigger_export_markdown(RequestToken::new(), "A.md", "body");
        assert_eq!(shell.downloads().len(), 1);
        assert!(matches!(
            receiver.try_next().unwrap().event,
            HostEvent::ExportSuccess { .. }
        ));
    }

    #[test]
    fn test_pick_image_sends_data_url() {
        let (sender, mut receiver) = bind();
        let mut shell = LocalShell::new(sender);
        shell.queue_pick(LocalFile::new("cat.JPG", vec![0xFF, 0xD8, 0xFF]));

        shell.trigger_pick_image(RequestToken::new());
        let HostEvent::PickImageResult { filename } = receiver.try_next().unwrap().event else {
            panic!("Expected PickImageResult");
        };
        assert!(filename.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_empty_queue_cancels() {
        let (sender, mut receiver) = bind();
        let mut shell = LocalShell::new(sender);

        shell.trigger_import_markdown(RequestToken::new());
        assert!(matches!(
            receiver.try_next().unwrap().event,
            HostEvent::Error { .. }
        ));
    }
}
