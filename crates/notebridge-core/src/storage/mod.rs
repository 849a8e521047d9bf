//! Storage layer
//!
//! Backends persisting note files, state items and image blobs.
//!
//! ## Layout
//!
//! For [`FsBackend`], rooted at the configured data directory:
//! ```text
//! data_dir/
//! ├── notes/*.md          # one file per note, filename is the key
//! ├── state/<key>.json    # order list, identity map
//! └── user-images/*       # images served through the virtual URL
//! ```
//!
//! [`MemoryBackend`] keeps the same three namespaces in memory. It stands in
//! for browser storage when no host shell is present, and for tests.

mod backend;
mod error;
mod fs;
mod memory;

pub use backend::{NoteBackend, NoteFile};
pub use error::{StoreError, StoreResult};
pub use fs::{atomic_write, FsBackend, IMAGES_DIR};
pub use memory::MemoryBackend;
