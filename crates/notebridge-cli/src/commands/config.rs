//! Config command handlers

use anyhow::{Context, Result};

use notebridge_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(output: &Output) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "virtual_host": config.virtual_host,
                    "url_scheme": config.url_scheme,
                    "autosave_ms": config.autosave_ms,
                    "export_dir": config.exports_dir(),
                    "log_level": config.log_level,
                    "log_file": config.log_file
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            println!("Configuration:");
            println!("  data_dir:     {}", config.data_dir.display());
            println!("  virtual_host: {}", config.virtual_host);
            println!("  url_scheme:   {}", config.url_scheme);
            println!("  autosave_ms:  {}", config.autosave_ms);
            println!("  export_dir:   {}", config.exports_dir().display());
            println!("  log_level:    {}", config.log_level);
            println!(
                "  log_file:     {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!();
            println!("Image URLs:  {}/<file>", config.image_url_base());
            println!("Config file: {}", Config::config_file_path().display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(key: String, value: String, output: &Output) -> Result<()> {
    let mut config = Config::load().context("Failed to load configuration")?;
    config.set_value(&key, &value)?;
    config.save().context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));
    Ok(())
}
