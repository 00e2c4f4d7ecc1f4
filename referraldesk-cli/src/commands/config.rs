use std::fs;

use anyhow::{Context, Result};
use shared::config::{ClientConfig, ConfigError};

/// Writes a default configuration file into the working directory.
///
/// # Errors
/// Returns an error if the format is unsupported or if writing the file fails.
pub fn generate_config(format: &str) -> Result<()> {
    let config = ClientConfig::with_defaults();
    let (file_name, serialized) = match format {
        "yaml" => ("config.yaml", serde_yml::to_string(&config)?),
        "json" => ("config.json", serde_json::to_string_pretty(&config)?),
        "toml" => ("config.toml", toml::to_string_pretty(&config)?),
        _ => return Err(ConfigError::UnsupportedFormat.into()),
    };

    fs::write(file_name, serialized).with_context(|| format!("failed to write {file_name}"))?;

    println!("Configuration file '{file_name}' generated successfully.");
    Ok(())
}
