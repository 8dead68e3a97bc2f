//! User settings (`<config dir>/charpak/config.toml`).
//!
//! Every field is optional in the file and falls back to a default, so a
//! partial file is always valid. Settings are turned into an immutable
//! [`PipelineConfig`] once per run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use charpak_pipeline::config::{
    DEFAULT_COOK_TIMEOUT_SECS, DEFAULT_EXPORT_TIMEOUT_SECS, DEFAULT_EXTRACT_TIMEOUT_SECS,
    DEFAULT_IMPORT_TIMEOUT_SECS, DEFAULT_PACK_TIMEOUT_SECS,
};
use charpak_pipeline::layout::LOG_FILE;
use charpak_pipeline::{PipelineConfig, Timeouts, Tool, ToolPaths};
use serde::{Deserialize, Serialize};

/// Config file name inside the config directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Environment override for the modeling-tool hook script.
pub const BLENDER_HOOK_ENV: &str = "CHARPAK_BLENDER_HOOK";

/// Environment override for the engine hook script.
pub const UNREAL_HOOK_ENV: &str = "CHARPAK_UNREAL_HOOK";

/// Commented default config written by `charpak config --init`.
pub const DEFAULT_TEMPLATE: &str = r#"# charpak settings
#
# Tools left unset are looked up from CHARPAK_EXTRACTOR, CHARPAK_BLENDER,
# CHARPAK_UNREAL_EDITOR and CHARPAK_UNREAL_PAK, then from PATH.

[tools]
# extractor = "C:/Tools/umodel/umodel.exe"
# blender = "C:/Program Files/Blender Foundation/Blender 2.93/blender.exe"
# blender_hook = "C:/charpak/hooks/blender_hook.py"
# unreal_editor = "C:/Program Files/Epic Games/UE_4.25/Engine/Binaries/Win64/UE4Editor-Cmd.exe"
# unreal_hook = "C:/charpak/hooks/unreal_hook.py"
# unreal_pak = "C:/Program Files/Epic Games/UE_4.25/Engine/Binaries/Win64/UnrealPak.exe"

[game]
# Game install directory, the one containing RED/
# dir = "C:/Program Files (x86)/Steam/steamapps/common/GUILTY GEAR STRIVE"
# aes_key = "0x..."

[paths]
# Scratch directory for intermediate files
# work_dir = "C:/charpak/work"

[timeouts]
extract_secs = 120
export_secs = 600
import_secs = 1200
cook_secs = 1800
pack_secs = 300

[logging]
# Console level, overridden by RUST_LOG
level = "info"
# Diagnostic log, defaults to <work_dir>/charpak.log
# file = "C:/charpak/charpak.log"
file_level = "debug"
"#;

/// charpak settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub tools: ToolSettings,
    #[serde(default)]
    pub game: GameSettings,
    #[serde(default)]
    pub paths: PathSettings,
    #[serde(default)]
    pub timeouts: TimeoutSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Tool and hook script locations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ToolSettings {
    pub extractor: Option<PathBuf>,
    pub blender: Option<PathBuf>,
    pub blender_hook: Option<PathBuf>,
    pub unreal_editor: Option<PathBuf>,
    pub unreal_hook: Option<PathBuf>,
    pub unreal_pak: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GameSettings {
    /// Game install directory
    pub dir: Option<PathBuf>,
    /// Archive key, `0x`-prefixed hex
    pub aes_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PathSettings {
    /// Scratch directory (default: `<data dir>/charpak/work`)
    pub work_dir: Option<PathBuf>,
}

/// Per-tool timeouts in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeoutSettings {
    #[serde(default = "default_extract_secs")]
    pub extract_secs: u64,
    #[serde(default = "default_export_secs")]
    pub export_secs: u64,
    #[serde(default = "default_import_secs")]
    pub import_secs: u64,
    #[serde(default = "default_cook_secs")]
    pub cook_secs: u64,
    #[serde(default = "default_pack_secs")]
    pub pack_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Console filter (default: info)
    #[serde(default = "default_level")]
    pub level: String,
    /// Diagnostic log file (default: `<work_dir>/charpak.log`)
    #[serde(default)]
    pub file: Option<PathBuf>,
    /// Diagnostic log filter (default: debug)
    #[serde(default = "default_file_level")]
    pub file_level: String,
}

fn default_extract_secs() -> u64 {
    DEFAULT_EXTRACT_TIMEOUT_SECS
}
fn default_export_secs() -> u64 {
    DEFAULT_EXPORT_TIMEOUT_SECS
}
fn default_import_secs() -> u64 {
    DEFAULT_IMPORT_TIMEOUT_SECS
}
fn default_cook_secs() -> u64 {
    DEFAULT_COOK_TIMEOUT_SECS
}
fn default_pack_secs() -> u64 {
    DEFAULT_PACK_TIMEOUT_SECS
}

fn default_level() -> String {
    "info".to_string()
}
fn default_file_level() -> String {
    "debug".to_string()
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            extract_secs: default_extract_secs(),
            export_secs: default_export_secs(),
            import_secs: default_import_secs(),
            cook_secs: default_cook_secs(),
            pack_secs: default_pack_secs(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            file: None,
            file_level: default_file_level(),
        }
    }
}

impl From<&TimeoutSettings> for Timeouts {
    fn from(t: &TimeoutSettings) -> Self {
        Self {
            extract: Duration::from_secs(t.extract_secs),
            export: Duration::from_secs(t.export_secs),
            import: Duration::from_secs(t.import_secs),
            cook: Duration::from_secs(t.cook_secs),
            pack: Duration::from_secs(t.pack_secs),
        }
    }
}

/// Default settings path: `<config dir>/charpak/config.toml`.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("charpak").join(CONFIG_FILE))
}

/// Resolves `--config`, falling back to [`default_path`].
pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(default_path)
        .ok_or_else(|| anyhow!("cannot determine the config directory; pass --config"))
}

impl Settings {
    /// Parses settings from TOML.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid settings file")
    }

    /// Loads settings from `path`.
    ///
    /// A missing file yields defaults unless the path was given explicitly.
    pub fn load(path: &Path, explicit: bool) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text)
                .with_context(|| format!("failed to load {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !explicit => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
        }
    }

    /// Serializes to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize settings")
    }

    /// Scratch directory, defaulting to `<data dir>/charpak/work`.
    pub fn work_dir(&self) -> PathBuf {
        self.paths.work_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .map(|dir| dir.join("charpak").join("work"))
                .unwrap_or_else(|| PathBuf::from("charpak-work"))
        })
    }

    /// Diagnostic log path, defaulting to `<work_dir>/charpak.log`.
    pub fn log_file(&self) -> PathBuf {
        self.logging
            .file
            .clone()
            .unwrap_or_else(|| self.work_dir().join(LOG_FILE))
    }

    /// Resolves a tool from settings, environment, then `PATH`.
    pub fn tool_path(&self, tool: Tool) -> Option<PathBuf> {
        let configured = match tool {
            Tool::Extractor => &self.tools.extractor,
            Tool::Blender => &self.tools.blender,
            Tool::UnrealEditor => &self.tools.unreal_editor,
            Tool::UnrealPak => &self.tools.unreal_pak,
        };
        tool.resolve(configured.as_deref())
    }

    pub fn blender_hook(&self) -> Option<PathBuf> {
        hook_path(&self.tools.blender_hook, BLENDER_HOOK_ENV)
    }

    pub fn unreal_hook(&self) -> Option<PathBuf> {
        hook_path(&self.tools.unreal_hook, UNREAL_HOOK_ENV)
    }

    /// Builds the immutable run configuration.
    pub fn to_pipeline_config(&self) -> Result<PipelineConfig> {
        let tool = |tool: Tool| {
            self.tool_path(tool).ok_or_else(|| {
                anyhow!(
                    "{} not found; set it under [tools], set {} or add it to PATH",
                    tool.display_name(),
                    tool.env_var()
                )
            })
        };

        let tools = ToolPaths {
            extractor: tool(Tool::Extractor)?,
            blender: tool(Tool::Blender)?,
            blender_hook: self.blender_hook().ok_or_else(|| {
                anyhow!("blender_hook is not set under [tools] or {}", BLENDER_HOOK_ENV)
            })?,
            unreal_editor: tool(Tool::UnrealEditor)?,
            unreal_hook: self.unreal_hook().ok_or_else(|| {
                anyhow!("unreal_hook is not set under [tools] or {}", UNREAL_HOOK_ENV)
            })?,
            unreal_pak: tool(Tool::UnrealPak)?,
        };

        let Some(game_dir) = self.game.dir.clone() else {
            bail!("game directory is not set; set dir under [game]");
        };

        let mut config = PipelineConfig::new(tools, game_dir, self.work_dir())
            .timeouts(Timeouts::from(&self.timeouts));
        if let Some(key) = self.game.aes_key.as_deref().filter(|k| !k.trim().is_empty()) {
            config = config.aes_key(key.trim());
        }
        Ok(config)
    }
}

fn hook_path(configured: &Option<PathBuf>, env_var: &str) -> Option<PathBuf> {
    configured.clone().or_else(|| {
        std::env::var(env_var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
    })
}
