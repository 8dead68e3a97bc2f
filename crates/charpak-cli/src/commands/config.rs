//! Config command implementation
//!
//! Shows where settings are read from and what they resolve to, or writes
//! the commented default file.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::settings::{Settings, DEFAULT_TEMPLATE};

/// Run the config command.
pub fn run(path: &Path, init: bool) -> Result<ExitCode> {
    if init {
        if write_default(path)? {
            println!("{} Wrote {}", "ok".green(), path.display());
            Ok(ExitCode::SUCCESS)
        } else {
            println!(
                "{} {} already exists; not overwriting",
                "!!".yellow(),
                path.display()
            );
            Ok(ExitCode::from(1))
        }
    } else {
        let settings = Settings::load(path, false)?;
        let state = if path.is_file() { "" } else { " (not found, using defaults)" };
        println!("{} {}{}", "Settings:".bold(), path.display(), state);
        println!("{} {}", "Work dir:".bold(), settings.work_dir().display());
        println!("{} {}", "Log file:".bold(), settings.log_file().display());
        println!();
        print!("{}", settings.to_toml()?);
        Ok(ExitCode::SUCCESS)
    }
}

/// Writes [`DEFAULT_TEMPLATE`] to `path` unless a file is already there.
///
/// Returns whether the file was written.
pub fn write_default(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, DEFAULT_TEMPLATE)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(true)
}
