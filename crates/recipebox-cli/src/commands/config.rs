//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use recipebox_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "storage_key": config.storage_key,
                    "reject_duplicate_titles": config.reject_duplicate_titles,
                    "log_file": config.log_file,
                    "collection_path": config.collection_path()
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.collection_path().display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:                {}", config.data_dir.display());
            println!("  storage_key:             {}", config.storage_key);
            println!(
                "  reject_duplicate_titles: {}",
                config.reject_duplicate_titles
            );
            println!(
                "  log_file:                {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!();
            println!("Config file: {}", effective_path.display());
            println!("Recipes:     {}", config.collection_path().display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    apply_setting(&mut config, &key, &value)?;

    // Save to the CLI-specified path or default
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

fn apply_setting(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "data_dir" => {
            if value.is_empty() {
                bail!("data_dir cannot be empty");
            }
            config.data_dir = value.into();
        }
        "storage_key" => {
            Config::validate_storage_key(value).context("Invalid value for storage_key")?;
            config.storage_key = value.to_string();
        }
        "reject_duplicate_titles" => {
            config.reject_duplicate_titles = value
                .parse()
                .context("Invalid value for reject_duplicate_titles. Use 'true' or 'false'.")?;
        }
        "log_file" => {
            config.log_file = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.into())
            };
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: data_dir, storage_key, reject_duplicate_titles, log_file",
                key
            );
        }
    }

    Ok(())
}
