//! Host bridge
//!
//! The asynchronous, tagged channel between the client and the native shell.
//!
//! ## Protocol
//!
//! 1. The controller opens a request in [`PendingRequests`], getting a token
//! 2. It calls a [`HostShell`] trigger with that token and carries on
//! 3. The host posts a [`HostEvent`] (with the token) to the [`EventSender`]
//! 4. On a later turn the controller drains the [`EventReceiver`], resolves
//!    the token and applies the result
//!
//! Hosts that predate tokens call `handle_event(type, data, extra)` and are
//! matched by event kind alone.

mod channel;
mod error;
mod event;
mod local;
mod native;
mod pending;
mod shell;

pub use channel::{bind, EventReceiver, EventSender};
pub use error::BridgeError;
pub use event::{Envelope, EventKind, HostEvent, InboundEvent};
pub use local::{Download, LocalFile, LocalShell};
pub use native::{FilePicker, NativeShell, PickPurpose};
pub use pending::{PendingRequests, RequestKind, RequestToken, Resolution};
pub use shell::HostShell;
