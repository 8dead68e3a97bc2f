//! List command implementation
//!
//! Scans the game archives for character meshes so a user can pick the
//! asset path to pass to `run`.

use std::collections::BTreeMap;
use std::process::ExitCode;

use anyhow::{bail, Result};
use charpak_pipeline::Pipeline;
use charpak_spec::CharacterManifest;
use colored::Colorize;

use crate::settings::Settings;

/// Run the list command.
pub fn run(settings: &Settings, character: Option<&str>, json: bool) -> Result<ExitCode> {
    let config = settings.to_pipeline_config()?;

    let manifests = match Pipeline::new(config).scan_characters() {
        Ok(manifests) => manifests,
        Err(e) => {
            eprintln!("{} [{}] {}", "FAILED".red().bold(), e.code(), e);
            return Ok(ExitCode::from(1));
        }
    };
    let selected = select(manifests, character)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&selected)?);
        return Ok(ExitCode::SUCCESS);
    }

    if selected.is_empty() {
        println!("{} No character meshes found", "!!".yellow());
    }
    for manifest in &selected {
        print_manifest(manifest);
    }
    Ok(ExitCode::SUCCESS)
}

/// Keeps every manifest, or only the one for `character` (case-insensitive).
pub fn select(
    manifests: BTreeMap<String, CharacterManifest>,
    character: Option<&str>,
) -> Result<Vec<CharacterManifest>> {
    let Some(wanted) = character else {
        return Ok(manifests.into_values().collect());
    };

    match manifests
        .into_values()
        .find(|m| m.name.eq_ignore_ascii_case(wanted))
    {
        Some(manifest) => Ok(vec![manifest]),
        None => bail!("no meshes found for character '{}'", wanted),
    }
}

fn print_manifest(manifest: &CharacterManifest) {
    println!(
        "{} {}",
        manifest.name.cyan().bold(),
        format!(
            "({} weapon, {} other)",
            manifest.weapons.len(),
            manifest.others.len()
        )
        .dimmed()
    );
    for (role, mesh) in manifest.meshes() {
        println!("  {:<10} {}", role.label(), mesh);
    }
}
