//! notebridge CLI
//!
//! A terminal host shell for notebridge: notes live on the local filesystem,
//! and every mutation goes through the same controller a web client drives.

use std::fs::OpenOptions;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use notebridge_core::Config;

mod commands;
mod editor;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "notebridge")]
#[command(about = "notebridge - markdown notes with a native host bridge")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List notes in display order
    #[command(alias = "ls")]
    List,
    /// Print a note
    Show {
        /// Note name, with or without .md
        name: String,
    },
    /// Create a note, named from its first heading
    New {
        /// Note body (opens editor if not provided)
        #[arg(short, long)]
        body: Option<String>,
    },
    /// Edit a note in $EDITOR
    Edit {
        /// Note name, with or without .md
        name: String,
    },
    /// Replace a note's content from a file or stdin
    Save {
        /// Note name, with or without .md
        name: String,
        /// Read content from this file instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Delete a note
    #[command(alias = "rm")]
    Delete {
        /// Note name, with or without .md
        name: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Set the manual list order
    Order {
        /// Note names, first to last
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Import a markdown file as a new note
    Import {
        /// Markdown file to import
        path: PathBuf,
    },
    /// Export a note to the export directory
    Export {
        /// Note name, with or without .md
        name: String,
    },
    /// Copy an image into the store and reference it at the end of a note
    Attach {
        /// Note name, with or without .md
        note: String,
        /// Image file
        image: PathBuf,
    },
    /// Insert a drawing (PNG) into a note
    Sketch {
        /// Note name, with or without .md
        note: String,
        /// PNG file holding the drawing
        png: PathBuf,
    },
    /// Follow a link from a note and print where it leads
    Follow {
        /// Note name, with or without .md
        note: String,
        /// Link target as written in the note, e.g. ./Other
        link: String,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, virtual_host, url_scheme, autosave_ms, export_dir, log_level, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    if let Commands::Config { command } = &cli.command {
        return match command.clone() {
            Some(ConfigCommands::Show) | None => commands::config::show(&output),
            Some(ConfigCommands::Set { key, value }) => commands::config::set(key, value, &output),
        };
    }

    let config = Config::load().context("Failed to load configuration")?;
    init_logging(&config);

    match cli.command {
        Commands::List => commands::note::list(&config, &output),
        Commands::Show { name } => commands::note::show(&config, name, &output),
        Commands::New { body } => commands::note::create(&config, body, &output),
        Commands::Edit { name } => commands::note::edit(&config, name, &output),
        Commands::Save { name, file } => commands::note::save(&config, name, file, &output),
        Commands::Delete { name, yes } => commands::note::delete(&config, name, yes, &output),
        Commands::Order { names } => commands::note::order(&config, names, &output),
        Commands::Follow { note, link } => commands::note::follow(&config, note, link, &output),
        Commands::Import { path } => commands::host::import(&config, path, &output),
        Commands::Export { name } => commands::host::export(&config, name, &output),
        Commands::Attach { note, image } => commands::host::attach(&config, note, image, &output),
        Commands::Sketch { note, png } => commands::host::sketch(&config, note, png, &output),
        Commands::Config { .. } => unreachable!(), // Handled above
    }
}

/// Install the tracing subscriber
///
/// Logs to `log_file` when configured, otherwise stderr.
fn init_logging(config: &Config) {
    let level = &config.log_level;
    let env_filter = EnvFilter::new(format!(
        "notebridge_core={},notebridge_cli={}",
        level, level
    ));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false);

    match &config.log_file {
        Some(path) => {
            let file = match OpenOptions::new().create(true).append(true).open(path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("Warning: Could not open log file {:?}: {}", path, e);
                    return;
                }
            };
            let _ = builder.with_ansi(false).with_writer(file).try_init();
        }
        None => {
            let _ = builder.with_writer(std::io::stderr).try_init();
        }
    }
}
