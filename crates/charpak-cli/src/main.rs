//! charpak CLI - converts an edited character mesh into an installed mod archive
//!
//! This binary parses arguments, loads settings and logging, then hands off
//! to the command implementations in the library crate.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use charpak_cli::settings::{self, Settings};
use charpak_cli::{commands, logging};
use charpak_spec::BONE_LIMIT;

/// charpak - character mesh to pak conversion pipeline
#[derive(Parser)]
#[command(name = "charpak")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Settings file (default: <config dir>/charpak/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a project and install it as a mod archive
    Run {
        /// Modeling-tool project file (.blend)
        #[arg(short, long)]
        project: String,

        /// Game asset to replace, e.g. Chara/RAM/Costume01/Mesh/ram_body
        #[arg(short, long)]
        asset: String,

        /// Mod name, used for the archive and its folder
        #[arg(short, long = "mod")]
        mod_name: String,

        /// Output machine-readable JSON (no progress lines)
        #[arg(long)]
        json: bool,
    },

    /// Extract and print the canonical material slots of a game asset
    Dump {
        /// Game asset path
        #[arg(short, long)]
        asset: String,

        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// List every character's meshes found in the game archives
    List {
        /// Only show this character, e.g. RAM
        #[arg(short, long)]
        character: Option<String>,

        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Canonicalize a mesh description and print its CHUNKING line
    Chunks {
        /// Mesh description JSON
        #[arg(long)]
        mesh: String,

        /// Slot-info file written by the dump stage
        #[arg(long)]
        info: String,

        /// Maximum bone groups per chunk
        #[arg(long, default_value_t = BONE_LIMIT)]
        bone_limit: usize,

        /// Write the canonicalized mesh here
        #[arg(long)]
        write: Option<String>,
    },

    /// Print the per-chunk outline sequence
    Outlines {
        /// Slot-info file written by the dump stage
        #[arg(long)]
        info: String,

        /// Comma-separated chunk counts, one per slot
        #[arg(long)]
        chunks: String,
    },

    /// Check tools, hooks and directories
    Doctor,

    /// Show the effective settings or write the default file
    Config {
        /// Write a commented default settings file
        #[arg(long)]
        init: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}

fn execute(cli: Cli) -> Result<ExitCode> {
    let config_path = settings::resolve_path(cli.config.as_deref())?;

    if let Commands::Config { init } = cli.command {
        return commands::config::run(&config_path, init);
    }

    let settings = Settings::load(&config_path, cli.config.is_some())?;
    let log_file = match cli.command {
        Commands::Run { .. } | Commands::Dump { .. } | Commands::List { .. } => {
            Some(settings.log_file())
        }
        _ => None,
    };
    logging::init(&settings.logging, log_file.as_deref())?;

    match cli.command {
        Commands::Run {
            project,
            asset,
            mod_name,
            json,
        } => commands::run::run(&settings, &project, &asset, &mod_name, json),
        Commands::Dump { asset, json } => commands::dump::run(&settings, &asset, json),
        Commands::List { character, json } => {
            commands::list::run(&settings, character.as_deref(), json)
        }
        Commands::Chunks {
            mesh,
            info,
            bone_limit,
            write,
        } => commands::chunks::run(&mesh, &info, bone_limit, write.as_deref()),
        Commands::Outlines { info, chunks } => commands::outlines::run(&info, &chunks),
        Commands::Doctor => commands::doctor::run(&settings, &config_path),
        Commands::Config { init } => commands::config::run(&config_path, init),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::try_parse_from([
            "charpak",
            "run",
            "--project",
            "ram.blend",
            "--asset",
            "Chara/RAM/Costume01/Mesh/ram_body",
            "--mod",
            "swim",
        ])
        .unwrap();
        match cli.command {
            Commands::Run {
                project,
                asset,
                mod_name,
                json,
            } => {
                assert_eq!(project, "ram.blend");
                assert_eq!(asset, "Chara/RAM/Costume01/Mesh/ram_body");
                assert_eq!(mod_name, "swim");
                assert!(!json);
            }
            _ => panic!("expected run command"),
        }
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_parses_list_filter() {
        let cli = Cli::try_parse_from(["charpak", "list", "-c", "RAM", "--json"]).unwrap();
        match cli.command {
            Commands::List { character, json } => {
                assert_eq!(character.as_deref(), Some("RAM"));
                assert!(json);
            }
            _ => panic!("expected list command"),
        }
    }

    #[test]
    fn test_cli_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["charpak", "doctor", "--config", "my.toml"]).unwrap();
        assert!(matches!(cli.command, Commands::Doctor));
        assert_eq!(cli.config, Some(PathBuf::from("my.toml")));
    }

    #[test]
    fn test_cli_chunks_default_limit() {
        let cli = Cli::try_parse_from([
            "charpak", "chunks", "--mesh", "m.json", "--info", "d.txt",
        ])
        .unwrap();
        match cli.command {
            Commands::Chunks {
                bone_limit, write, ..
            } => {
                assert_eq!(bone_limit, BONE_LIMIT);
                assert!(write.is_none());
            }
            _ => panic!("expected chunks command"),
        }
    }

    #[test]
    fn test_cli_run_requires_mod() {
        let result = Cli::try_parse_from([
            "charpak", "run", "--project", "a.blend", "--asset", "Chara/X",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_config_init() {
        let cli = Cli::try_parse_from(["charpak", "config", "--init"]).unwrap();
        assert!(matches!(cli.command, Commands::Config { init: true }));
    }
}
