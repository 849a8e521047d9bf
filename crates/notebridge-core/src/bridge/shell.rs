//! Outbound capability surface of the host shell
//!
//! Trigger calls are fire-and-forget. The shell answers later by posting to
//! the [`EventSender`](super::EventSender) it was built with, echoing the
//! request token, and never returns a result from the call itself.

use super::pending::RequestToken;

pub trait HostShell {
    /// Show a transient notification
    fn show_toast(&mut self, message: &str);

    /// Open a URL outside the app
    fn open_external_link(&mut self, url: &str);

    /// Let the user pick a markdown file; answered by `IMPORT_MD_RESULT`
    fn trigger_import_markdown(&mut self, token: RequestToken);

    /// Save `content` somewhere the user chooses; answered by `EXPORT_SUCCESS`
    fn trigger_export_markdown(&mut self, token: RequestToken, filename: &str, content: &str);

    /// Let the user pick an image; answered by `PICK_IMAGE_RESULT`
    fn trigger_pick_image(&mut self, token: RequestToken);
}
