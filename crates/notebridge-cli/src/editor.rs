//! Terminal editing of note bodies
//!
//! A note is written to a scratch file named after it, handed to the user's
//! editor, and read back once the editor exits.

use anyhow::{bail, Context, Result};
use std::env;
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Editors tried, in order, when neither $VISUAL nor $EDITOR is set
const FALLBACK_EDITORS: &[&str] = &["nano", "vim", "vi", "notepad"];

/// Edit a note body in the user's editor
///
/// Returns `None` when the body comes back unchanged.
pub fn edit_note(filename: &str, body: &str) -> Result<Option<String>> {
    let (program, args) = editor_command()?;
    let scratch = scratch_path(filename);
    if let Some(dir) = scratch.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create scratch directory {:?}", dir))?;
    }
    fs::write(&scratch, body)
        .with_context(|| format!("Failed to stage {} for editing", filename))?;

    let edited = run_editor(&program, &args, &scratch, filename).and_then(|()| {
        fs::read_to_string(&scratch)
            .with_context(|| format!("Failed to read back {} after editing", filename))
    });
    let _ = fs::remove_file(&scratch);

    let edited = edited?;
    Ok((edited != body).then_some(edited))
}

fn run_editor(program: &str, args: &[String], scratch: &Path, filename: &str) -> Result<()> {
    let status = Command::new(program)
        .args(args)
        .arg(scratch)
        .status()
        .with_context(|| format!("Failed to start editor '{}'", program))?;

    if !status.success() {
        bail!(
            "Editor '{}' exited with {}; {} was left unchanged",
            program,
            status,
            filename
        );
    }
    Ok(())
}

/// Scratch file carrying the note's own name, so the editor shows it
fn scratch_path(filename: &str) -> PathBuf {
    env::temp_dir()
        .join(format!("notebridge-{}", std::process::id()))
        .join(filename)
}

/// Program and leading arguments of the user's editor
fn editor_command() -> Result<(String, Vec<String>)> {
    let configured = ["VISUAL", "EDITOR"]
        .iter()
        .filter_map(|var| env::var(var).ok())
        .find_map(|value| split_command(&value));
    if let Some(command) = configured {
        return Ok(command);
    }

    FALLBACK_EDITORS
        .iter()
        .find(|editor| on_path(editor))
        .map(|editor| (editor.to_string(), Vec::new()))
        .context("No editor found to edit notes with. Set $EDITOR, e.g. export EDITOR=nano")
}

/// Split `code --wait` into its program and arguments
fn split_command(value: &str) -> Option<(String, Vec<String>)> {
    let mut parts = value.split_whitespace().map(str::to_string);
    let program = parts.next()?;
    Some((program, parts.collect()))
}

fn on_path(program: &str) -> bool {
    env::var_os("PATH")
        .map(|paths| env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
        .unwrap_or(false)
}

/// Ask before deleting a note
///
/// Never deletes without a terminal to ask on.
pub fn confirm_delete(filename: &str) -> Result<bool> {
    if !io::stdin().is_terminal() {
        return Ok(false);
    }

    print!("Delete note '{}'? [y/N] ", filename);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
