//! Commands that round-trip through the host shell
//!
//! Each one opens a request, lets the shell answer on the event queue, then
//! drains the queue the way the client would on its next turn.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use notebridge_core::Config;

use super::{note_filename, with_app};
use crate::output::Output;

/// Import a markdown file as a new note
pub fn import(config: &Config, path: PathBuf, output: &Output) -> Result<()> {
    if !path.is_file() {
        bail!("No such file: {:?}", path);
    }

    with_app(config, vec![path], output, |app| {
        app.import_markdown()?;
        app.pump_events();
        if let Ok(notes) = app.refresh_list() {
            output.print_notes(notes);
        }
        Ok(())
    })
}

/// Export a note to the export directory
pub fn export(config: &Config, name: String, output: &Output) -> Result<()> {
    let filename = note_filename(&name);
    with_app(config, Vec::new(), output, |app| {
        if !app.select_note(&filename)? {
            bail!("Note not found: {}", name);
        }
        app.export_current()?;
        app.pump_events();
        Ok(())
    })
}

/// Copy an image into the store and append a reference to the note
pub fn attach(config: &Config, note: String, image: PathBuf, output: &Output) -> Result<()> {
    if !image.is_file() {
        bail!("No such file: {:?}", image);
    }

    let filename = note_filename(&note);
    with_app(config, vec![image], output, |app| {
        if !app.select_note(&filename)? {
            bail!("Note not found: {}", note);
        }
        app.pick_image()?;
        app.pump_events();
        app.back()?;
        output.success(&format!("Attached image to {}", filename));
        Ok(())
    })
}

/// Insert a PNG drawing into the note
pub fn sketch(config: &Config, note: String, png: PathBuf, output: &Output) -> Result<()> {
    let bytes = fs::read(&png).with_context(|| format!("Failed to read {:?}", png))?;
    let raster = format!("data:image/png;base64,{}", STANDARD.encode(bytes));

    let filename = note_filename(&note);
    with_app(config, Vec::new(), output, |app| {
        if !app.select_note(&filename)? {
            bail!("Note not found: {}", note);
        }
        app.start_drawing();
        let image = app.save_drawing(&raster)?;
        app.back()?;
        output.success(&format!("Inserted drawing {}", image.filename));
        Ok(())
    })
}
