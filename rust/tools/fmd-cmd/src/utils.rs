//! Common utilities for fmd-cmd

use anyhow::{Context, Result};
use fmd_format::Schema;
use std::path::Path;

/// Installs the process logger. `RUST_LOG` takes precedence over `verbose`.
pub fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

/// Checks if a file exists and is readable
pub fn validate_file_exists(path: &str) -> Result<()> {
    let file_path = Path::new(path);
    if !file_path.exists() {
        anyhow::bail!("File does not exist: {}", path);
    }
    if !file_path.is_file() {
        anyhow::bail!("Path is not a file: {}", path);
    }
    Ok(())
}

/// Loads a JSON array schema from `path`.
pub fn load_schema(path: &str) -> Result<Schema> {
    validate_file_exists(path)?;
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema file: {path}"))?;
    Schema::from_json(&json).with_context(|| format!("Failed to parse schema file: {path}"))
}

/// Formats file size in human-readable format
pub fn format_size(size: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = size as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", size as u64, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}
