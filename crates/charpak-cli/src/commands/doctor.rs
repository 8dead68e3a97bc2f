//! Doctor command implementation
//!
//! Checks that every external tool, hook script and directory the pipeline
//! needs can be found. Only `blender --version` is actually run.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use charpak_pipeline::config::validate_aes_key;
use charpak_pipeline::stages::{check_blender_version, BLENDER_VERSION};
use charpak_pipeline::{GameLayout, ProcessRunner, SystemRunner, Tool};
use colored::Colorize;

use crate::settings::{Settings, BLENDER_HOOK_ENV, UNREAL_HOOK_ENV};

/// Run the doctor command
///
/// # Returns
/// Exit code: 0 if all checks pass, 1 if any fail
pub fn run(settings: &Settings, config_path: &Path) -> Result<ExitCode> {
    println!("{}", "charpak Doctor".cyan().bold());
    println!("{}", "==============".cyan());
    println!();

    let mut all_ok = true;

    println!("{}", "Versions:".bold());
    println!("  {} charpak v{}", "->".green(), env!("CARGO_PKG_VERSION"));
    let config_note = if config_path.is_file() { "" } else { " (not found, using defaults)" };
    println!("  {} config {}{}", "->".green(), config_path.display(), config_note);
    println!();

    println!("{}", "Tools:".bold());
    for tool in Tool::ALL {
        match settings.tool_path(tool) {
            Some(path) if path.is_file() => {
                println!("  {} {} ({})", "ok".green(), tool.display_name(), path.display());
            }
            Some(path) => {
                println!(
                    "  {} {} not found at {}",
                    "!!".red(),
                    tool.display_name(),
                    path.display()
                );
                all_ok = false;
            }
            None => {
                println!("  {} {} not found", "!!".red(), tool.display_name());
                println!(
                    "     {}",
                    format!("Set it under [tools], set {} or add it to PATH.", tool.env_var())
                        .dimmed()
                );
                all_ok = false;
            }
        }
    }

    if let Some(blender) = settings.tool_path(Tool::Blender).filter(|p| p.is_file()) {
        all_ok &= report_blender_version(&SystemRunner, &blender);
    }
    println!();

    println!("{}", "Hooks:".bold());
    all_ok &= report_hook("Blender hook", settings.blender_hook(), BLENDER_HOOK_ENV);
    all_ok &= report_hook("Unreal hook", settings.unreal_hook(), UNREAL_HOOK_ENV);
    println!();

    println!("{}", "Game:".bold());
    match settings.game.dir.as_deref() {
        Some(dir) => {
            let paks = GameLayout::new(dir).paks_dir();
            if paks.is_dir() {
                println!("  {} Archive directory ({})", "ok".green(), paks.display());
            } else {
                println!("  {} Archive directory not found at {}", "!!".red(), paks.display());
                all_ok = false;
            }
        }
        None => {
            println!("  {} Game directory is not set", "!!".red());
            println!("     {}", "Set dir under [game].".dimmed());
            all_ok = false;
        }
    }
    match settings.game.aes_key.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
        Some(key) => match validate_aes_key(key) {
            Ok(()) => println!("  {} AES key", "ok".green()),
            Err(e) => {
                println!("  {} {}", "!!".red(), e);
                all_ok = false;
            }
        },
        None => println!("  {} No AES key (archives are read unencrypted)", "!!".yellow()),
    }
    println!();

    println!("{}", "Permissions:".bold());
    let work_dir = settings.work_dir();
    match check_writable(&work_dir) {
        Ok(()) => println!(
            "  {} Work directory is writable ({})",
            "ok".green(),
            work_dir.display()
        ),
        Err(e) => {
            println!(
                "  {} Cannot write to work directory {}: {}",
                "!!".red(),
                work_dir.display(),
                e
            );
            all_ok = false;
        }
    }
    println!();

    if all_ok {
        println!("{} All checks passed!", "SUCCESS".green().bold());
        Ok(ExitCode::SUCCESS)
    } else {
        println!(
            "{} Some checks failed. See above for details.",
            "WARNING".yellow().bold()
        );
        Ok(ExitCode::from(1))
    }
}

/// Runs `blender --version` and compares it with the release the hook
/// targets.
fn report_blender_version(runner: &dyn ProcessRunner, blender: &Path) -> bool {
    match check_blender_version(runner, blender) {
        Ok(()) => {
            println!("  {} {}", "ok".green(), BLENDER_VERSION);
            true
        }
        Err(e) => {
            println!("  {} Blender version: {}", "!!".red(), e);
            false
        }
    }
}

fn report_hook(label: &str, path: Option<PathBuf>, env_var: &str) -> bool {
    match path {
        Some(path) if path.is_file() => {
            println!("  {} {} ({})", "ok".green(), label, path.display());
            true
        }
        Some(path) => {
            println!("  {} {} not found at {}", "!!".red(), label, path.display());
            false
        }
        None => {
            println!("  {} {} is not set", "!!".red(), label);
            println!(
                "     {}",
                format!("Set it under [tools] or {}.", env_var).dimmed()
            );
            false
        }
    }
}

/// Creates `dir` if needed and checks a file can be written inside it.
fn check_writable(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let probe = dir.join(".charpak_write_test");
    std::fs::write(&probe, "test")?;
    let _ = std::fs::remove_file(&probe);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use charpak_pipeline::{CommandLine, ProcessError};
    use std::time::Duration;

    struct VersionBanner(&'static str);

    impl ProcessRunner for VersionBanner {
        fn run(
            &self,
            _command: &CommandLine,
            _capture_output: bool,
            _timeout: Option<Duration>,
        ) -> Result<String, ProcessError> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_report_blender_version() {
        let blender = Path::new("blender");
        assert!(report_blender_version(&VersionBanner("Blender 3.0.0\n"), blender));
        assert!(!report_blender_version(&VersionBanner("Blender 2.93.0\n"), blender));
    }

    #[test]
    fn test_check_writable_creates_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("work").join("nested");
        check_writable(&dir).unwrap();
        assert!(dir.is_dir());
        assert!(!dir.join(".charpak_write_test").exists());
    }

    #[test]
    fn test_check_writable_fails_under_file() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("file");
        std::fs::write(&file, "x").unwrap();
        assert!(check_writable(&file.join("work")).is_err());
    }

    #[test]
    fn test_report_hook_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(!report_hook("Blender hook", Some(tmp.path().join("nope.py")), BLENDER_HOOK_ENV));
        assert!(!report_hook("Blender hook", None, BLENDER_HOOK_ENV));

        let hook = tmp.path().join("hook.py");
        std::fs::write(&hook, "").unwrap();
        assert!(report_hook("Blender hook", Some(hook), BLENDER_HOOK_ENV));
    }
}
