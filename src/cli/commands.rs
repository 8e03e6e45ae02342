//! CLI command implementations
//!
//! Each command returns the text to print so it can be tested without a
//! terminal.

use crate::cli::ShowFormat;
use crate::config::Config;
use crate::error::GitoliteError;
use crate::keys::KeyStore;
use crate::system::System;
use anyhow::{Context as _, Result};
use core::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

/// Parse a config and summarize it
///
/// # Errors
///
/// Returns an error if the file is missing, malformed, or its groups cannot
/// be ordered
pub fn check(system: &dyn System, path: &Path) -> Result<String> {
    let config = load_existing(system, path)?;
    let order = config.group_order()?;

    let mut out = String::new();
    writeln!(
        out,
        "{}: {} repos, {} groups",
        path.display(),
        config.repos().count(),
        order.len()
    )?;
    if !order.is_empty() {
        let names: Vec<&str> = order.iter().map(|group| group.name()).collect();
        writeln!(out, "group order: {}", names.join(" "))?;
    }
    Ok(out)
}

/// Rewrite a config in canonical form, returning the written path
///
/// # Errors
///
/// Returns an error if the file cannot be parsed, rendered or written
pub fn format(
    system: &dyn System,
    path: &Path,
    output_dir: Option<&Path>,
    filename: Option<&str>,
) -> Result<PathBuf> {
    let mut config = load_existing(system, path)?;
    if let Some(name) = filename {
        config.set_filename(name);
    }

    let dir = output_dir.map_or_else(
        || {
            path.parent()
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
        },
        Path::to_path_buf,
    );

    let written = config
        .to_file(system, &dir)
        .with_context(|| format!("Failed to format {}", path.display()))?;
    info!("Formatted {} -> {}", path.display(), written.display());
    Ok(written)
}

/// Dump the parsed model of a config
///
/// # Errors
///
/// Returns an error if the file cannot be parsed or serialized
pub fn show(system: &dyn System, path: &Path, format: ShowFormat) -> Result<String> {
    let config = load_existing(system, path)?;
    let text = match format {
        ShowFormat::Json => {
            let mut json = serde_json::to_string_pretty(&config)
                .context("Failed to serialize config as JSON")?;
            json.push('\n');
            json
        }
        ShowFormat::Yaml => {
            serde_yaml::to_string(&config).context("Failed to serialize config as YAML")?
        }
    };
    Ok(text)
}

/// List the keys of a key directory, one `owner location type email` line
/// per key; an empty location prints as `-`
///
/// # Errors
///
/// Returns an error if the directory is missing or a key file is malformed
pub fn keys(system: &dyn System, keydir: &Path) -> Result<String> {
    if !system.is_dir(keydir)? {
        return Err(GitoliteError::configuration(format!(
            "Key directory not found: {}",
            keydir.display()
        ))
        .into());
    }

    let store = KeyStore::load(system, keydir)
        .with_context(|| format!("Failed to load keys from {}", keydir.display()))?;

    let mut out = String::new();
    for key in store.iter() {
        let location = if key.location().is_empty() {
            "-"
        } else {
            key.location()
        };
        writeln!(
            out,
            "{} {location} {} {}",
            key.owner(),
            key.key_type(),
            key.email()
        )?;
    }
    Ok(out)
}

fn load_existing(system: &dyn System, path: &Path) -> Result<Config> {
    if !system.is_file(path)? {
        return Err(GitoliteError::configuration(format!(
            "Config file not found: {}",
            path.display()
        ))
        .into());
    }
    Config::load_from_file(system, path).map_err(anyhow::Error::from)
}
