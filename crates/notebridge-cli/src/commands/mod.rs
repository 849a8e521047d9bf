//! Command handlers
//!
//! Each command opens a controller over the filesystem host shell, drives
//! it through the same transitions the editor UI would, then tears it down
//! and prints whatever notifications the shell collected.

pub mod config;
pub mod host;
pub mod note;

use std::path::PathBuf;

use anyhow::Result;
use tracing::debug;

use notebridge_core::bridge::{bind, NativeShell, PickPurpose};
use notebridge_core::naming;
use notebridge_core::{AppController, Config, FsBackend, ImageStore, NoteStore};

use crate::output::Output;

/// Answers file pickers with paths named on the command line
pub type Picker = Box<dyn FnMut(PickPurpose) -> Option<PathBuf>>;

pub type App = AppController<FsBackend, NativeShell<Picker>>;

/// Build a controller whose pickers return `picks` in order
pub fn open_app(config: &Config, picks: Vec<PathBuf>) -> App {
    let (sender, receiver) = bind();

    let mut picks = picks.into_iter();
    let picker: Picker = Box::new(move |purpose| {
        let picked = picks.next();
        debug!("Picker for {:?} answered {:?}", purpose, picked);
        picked
    });

    AppController::new(
        NoteStore::new(FsBackend::from_config(config)),
        ImageStore::from_config(config),
        NativeShell::new(config, sender, picker),
        receiver,
        config.autosave_window(),
    )
}

/// Run `f` against a fresh controller, then flush, unbind and report
pub fn with_app<T>(
    config: &Config,
    picks: Vec<PathBuf>,
    output: &Output,
    f: impl FnOnce(&mut App) -> Result<T>,
) -> Result<T> {
    let mut app = open_app(config, picks);
    let result = f(&mut app);
    app.teardown();
    output.toasts(&app.shell_mut().take_toasts());
    result
}

/// Accept note names with or without the extension
pub fn note_filename(name: &str) -> String {
    naming::ensure_md_extension(name.trim())
}
