//! Run command implementation
//!
//! Runs the full conversion pipeline on a worker thread and prints progress
//! as each stage starts.

use std::process::ExitCode;

use anyhow::{Context, Result};
use charpak_pipeline::{
    spawn_run, Pipeline, RunReport, RunTarget, Stage, StageFailure, StageTiming,
};
use colored::Colorize;
use serde::Serialize;

use crate::settings::Settings;

/// Machine-readable run result for `--json`.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutput {
    Installed {
        installed: String,
        total_ms: u64,
        timings: Vec<StageTiming>,
    },
    Failed {
        stage: Stage,
        code: String,
        message: String,
    },
}

impl RunOutput {
    pub fn from_result(result: &Result<RunReport, StageFailure>) -> Self {
        match result {
            Ok(report) => RunOutput::Installed {
                installed: report.installed.display().to_string(),
                total_ms: report.total_ms(),
                timings: report.timings.clone(),
            },
            Err(failure) => RunOutput::Failed {
                stage: failure.stage,
                code: failure.error.code().to_string(),
                message: failure.to_string(),
            },
        }
    }
}

/// Run the pipeline for one target.
///
/// # Returns
/// Exit code: 0 if the archive was installed, 1 if any stage failed
pub fn run(
    settings: &Settings,
    project: &str,
    asset: &str,
    mod_name: &str,
    json: bool,
) -> Result<ExitCode> {
    let config = settings.to_pipeline_config()?;
    let target = RunTarget::new(project, asset, mod_name).context("invalid run target")?;

    if !json {
        println!(
            "{} {} -> {} ({})",
            "Converting".cyan().bold(),
            target.project.display(),
            target.asset,
            target.mod_name
        );
    }

    let total = Stage::ALL.len();
    let handle = spawn_run(Pipeline::new(config), target);
    let result = handle.wait(|index, label| {
        if !json {
            println!("  {} {}", format!("[{}/{}]", index + 1, total).dimmed(), label);
        }
    });

    if json {
        let output = RunOutput::from_result(&result);
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(if result.is_ok() {
            ExitCode::SUCCESS
        } else {
            ExitCode::from(1)
        });
    }

    match result {
        Ok(report) => {
            println!();
            for timing in &report.timings {
                println!(
                    "  {:<14} {}",
                    timing.stage.to_string(),
                    format!("{} ms", timing.duration_ms).dimmed()
                );
            }
            println!(
                "{} Installed {} in {:.1}s",
                "SUCCESS".green().bold(),
                report.installed.display(),
                report.total_ms() as f64 / 1000.0
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => {
            println!();
            println!(
                "{} [{}] {}",
                "FAILED".red().bold(),
                failure.error.code(),
                failure
            );
            println!(
                "  {}",
                format!("See {} for tool output.", settings.log_file().display()).dimmed()
            );
            Ok(ExitCode::from(1))
        }
    }
}
