//! Note command handlers

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};

use notebridge_core::controller::NEW_NOTE_TEMPLATE;
use notebridge_core::Config;

use super::{note_filename, with_app};
use crate::editor::{confirm_delete, edit_note};
use crate::output::Output;

/// List all notes in display order
pub fn list(config: &Config, output: &Output) -> Result<()> {
    with_app(config, Vec::new(), output, |app| {
        output.print_notes(app.refresh_list()?);
        Ok(())
    })
}

/// Print a note
pub fn show(config: &Config, name: String, output: &Output) -> Result<()> {
    let filename = note_filename(&name);
    with_app(config, Vec::new(), output, |app| {
        let note = app
            .store_mut()
            .get_note(&filename)?
            .ok_or_else(|| anyhow::anyhow!("Note not found: {}", name))?;
        output.print_note(&note);
        Ok(())
    })
}

/// Create a note from `body` or from the editor
pub fn create(config: &Config, body: Option<String>, output: &Output) -> Result<()> {
    let content = match body {
        Some(b) => b,
        None => edit_note("New Note.md", NEW_NOTE_TEMPLATE)?
            .context("New note left as the empty template, nothing created")?,
    };

    if content.trim().is_empty() {
        bail!("Note content cannot be empty");
    }

    with_app(config, Vec::new(), output, |app| {
        app.create_note()?;
        app.edit(content, None, Instant::now());
        app.save()?;
        app.back()?;
        Ok(())
    })
}

/// Edit a note in $EDITOR; a changed heading renames it
pub fn edit(config: &Config, name: String, output: &Output) -> Result<()> {
    let filename = note_filename(&name);
    with_app(config, Vec::new(), output, |app| {
        if !app.select_note(&filename)? {
            bail!("Note not found: {}", name);
        }

        let Some(edited) = edit_note(&filename, app.content())? else {
            output.message("No changes made.");
            return Ok(());
        };

        app.edit(edited, None, Instant::now());
        app.save()?;
        app.back()?;
        Ok(())
    })
}

/// Replace a note's content from a file or stdin, creating it if needed
pub fn save(config: &Config, name: String, file: Option<PathBuf>, output: &Output) -> Result<()> {
    let content = match file {
        Some(path) => fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {:?}", path))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    let filename = note_filename(&name);
    with_app(config, Vec::new(), output, |app| {
        if !app.store().exists(&filename) {
            app.store_mut().create_note_named(&filename, "")?;
        }
        app.select_note(&filename)?;
        app.edit(content, None, Instant::now());
        app.save()?;
        app.back()?;
        Ok(())
    })
}

/// Delete a note after confirmation
pub fn delete(config: &Config, name: String, yes: bool, output: &Output) -> Result<()> {
    let filename = note_filename(&name);

    with_app(config, Vec::new(), output, |app| {
        if !app.store().exists(&filename) {
            bail!("Note not found: {}", name);
        }

        if !yes && output.should_prompt() {
            if !confirm_delete(&filename)? {
                println!("Cancelled.");
                return Ok(());
            }
        }

        if !app.delete_note(&filename)? {
            bail!("Note not found: {}", name);
        }
        Ok(())
    })
}

/// Persist a manual ordering; notes left out keep their relative order after it
pub fn order(config: &Config, names: Vec<String>, output: &Output) -> Result<()> {
    let filenames: Vec<String> = names.iter().map(|n| note_filename(n)).collect();

    with_app(config, Vec::new(), output, |app| {
        for filename in &filenames {
            if !app.store().exists(filename) {
                bail!("Note not found: {}", filename);
            }
        }
        app.reorder(&filenames)?;
        output.success("Order saved");
        output.print_notes(app.notes());
        Ok(())
    })
}

/// Follow a link written in a note
pub fn follow(config: &Config, note: String, link: String, output: &Output) -> Result<()> {
    let filename = note_filename(&note);
    with_app(config, Vec::new(), output, |app| {
        if !app.select_note(&filename)? {
            bail!("Note not found: {}", note);
        }

        if !app.click_link(&link)? {
            return Ok(());
        }

        let Some(target) = app.current_filename().map(str::to_string) else {
            return Ok(());
        };
        if let Some(note) = app.store_mut().get_note(&target)? {
            output.print_note(&note);
        }
        Ok(())
    })
}
