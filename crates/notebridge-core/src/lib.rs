//! notebridge core library
//!
//! The synchronization core of a markdown notebook whose UI runs without
//! filesystem access: a host shell owns storage and native pickers, and
//! answers requests asynchronously through a tagged event channel.
//!
//! # Architecture
//!
//! - **Note Store**: notes, their manual ordering and stable identities over
//!   a pluggable backend (host filesystem or in-memory fallback)
//! - **Image Store**: drawings and picked images, addressed by virtual URL
//! - **Host bridge**: the inbound event queue, request correlation and the
//!   outbound shell surface
//! - **Controller**: list/editor state machine with debounced autosave
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let (sender, receiver) = bridge::bind();
//! let shell = NativeShell::new(&config, sender, picker);
//! let store = NoteStore::new(FsBackend::from_config(&config));
//! let mut app = AppController::new(
//!     store,
//!     ImageStore::from_config(&config),
//!     shell,
//!     receiver,
//!     config.autosave_window(),
//! );
//!
//! app.create_note()?;
//! app.edit("# Groceries\n- milk", None, Instant::now());
//! app.save()?;
//! ```
//!
//! # Modules
//!
//! - `store`: Note Store (main storage entry point)
//! - `storage`: backends and storage errors
//! - `images`: Image Store
//! - `bridge`: host events, channel, correlation and shells
//! - `controller`: Application Controller
//! - `naming`: filename derivation and link resolution
//! - `models`: data structures
//! - `config`: application configuration

pub mod bridge;
pub mod config;
pub mod controller;
pub mod images;
pub mod models;
pub mod naming;
pub mod storage;
pub mod store;

pub use bridge::{
    bind, BridgeError, EventReceiver, EventSender, HostEvent, HostShell, LocalShell,
    NativeShell,
};
pub use config::Config;
pub use controller::{AppController, ControllerError, ControllerResult};
pub use images::{ImageError, ImageStore};
pub use models::{ImageRef, Note, NoteId, NoteSummary, Screen, ViewMode};
pub use storage::{FsBackend, MemoryBackend, NoteBackend, StoreError, StoreResult};
pub use store::NoteStore;
