//! Dump command implementation
//!
//! Extracts the canonical slot list of one game asset without running the
//! rest of the pipeline.

use std::process::ExitCode;

use anyhow::{Context, Result};
use charpak_pipeline::{Pipeline, WorkLayout};
use charpak_spec::{AssetPath, SlotInfo, OUTLINE_UNSET};
use colored::Colorize;

use crate::settings::Settings;

/// Run the dump command.
pub fn run(settings: &Settings, asset: &str, json: bool) -> Result<ExitCode> {
    let asset = AssetPath::parse(asset).context("invalid asset path")?;
    let config = settings.to_pipeline_config()?;
    let details = WorkLayout::new(&config.work_dir).details_file(&asset);

    let slot_info = match Pipeline::new(config).dump_info(&asset) {
        Ok(info) => info,
        Err(e) => {
            eprintln!("{} [{}] {}", "FAILED".red().bold(), e.code(), e);
            return Ok(ExitCode::from(1));
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&slot_info)?);
    } else {
        print_slots(&asset, &slot_info);
        println!("  {}", format!("Written to {}", details.display()).dimmed());
    }
    Ok(ExitCode::SUCCESS)
}

fn print_slots(asset: &AssetPath, slot_info: &SlotInfo) {
    println!("{} {}", "Material slots of".cyan().bold(), asset);
    for (index, slot) in slot_info.slots().iter().enumerate() {
        let outline = if slot.outline_type == OUTLINE_UNSET {
            "unset".dimmed().to_string()
        } else {
            slot.outline_type.to_string()
        };
        println!("  {:>2}  {:<32} outline {}", index, slot.name, outline);
    }
}
