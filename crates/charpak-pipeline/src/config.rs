//! Pipeline configuration.
//!
//! [`PipelineConfig`] is built once per run and threaded through every stage
//! unchanged. Tool lookup follows the usual order: explicit path, then the
//! tool's environment variable, then `PATH`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use charpak_spec::AssetPath;

use crate::error::{PipelineError, PipelineResult};

/// Default timeout for the asset extractor (2 minutes).
pub const DEFAULT_EXTRACT_TIMEOUT_SECS: u64 = 120;

/// Default timeout for the modeling-tool export (10 minutes).
pub const DEFAULT_EXPORT_TIMEOUT_SECS: u64 = 600;

/// Default timeout for the engine import (20 minutes).
pub const DEFAULT_IMPORT_TIMEOUT_SECS: u64 = 1200;

/// Default timeout for the engine cook (30 minutes).
pub const DEFAULT_COOK_TIMEOUT_SECS: u64 = 1800;

/// Default timeout for the archiver (5 minutes).
pub const DEFAULT_PACK_TIMEOUT_SECS: u64 = 300;

/// Prefix every AES key must carry.
pub const AES_KEY_PREFIX: &str = "0x";

/// External tools the pipeline drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    /// Asset extractor that dumps package metadata to JSON.
    Extractor,
    /// Modeling tool (Blender).
    Blender,
    /// Engine editor (UE4Editor-Cmd).
    UnrealEditor,
    /// Engine archiver (UnrealPak).
    UnrealPak,
}

impl Tool {
    pub const ALL: [Tool; 4] = [
        Tool::Extractor,
        Tool::Blender,
        Tool::UnrealEditor,
        Tool::UnrealPak,
    ];

    /// Name used in logs and error messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Tool::Extractor => "Extractor",
            Tool::Blender => "Blender",
            Tool::UnrealEditor => "Unreal Editor",
            Tool::UnrealPak => "UnrealPak",
        }
    }

    /// Environment variable holding an override path.
    pub fn env_var(&self) -> &'static str {
        match self {
            Tool::Extractor => "CHARPAK_EXTRACTOR",
            Tool::Blender => "CHARPAK_BLENDER",
            Tool::UnrealEditor => "CHARPAK_UNREAL_EDITOR",
            Tool::UnrealPak => "CHARPAK_UNREAL_PAK",
        }
    }

    /// Executable names searched for on `PATH`.
    pub fn binary_names(&self) -> &'static [&'static str] {
        match self {
            Tool::Extractor => &["umodel", "umodel.exe"],
            Tool::Blender => &["blender", "blender.exe"],
            Tool::UnrealEditor => &["UE4Editor-Cmd", "UE4Editor-Cmd.exe", "UE4Editor"],
            Tool::UnrealPak => &["UnrealPak", "UnrealPak.exe"],
        }
    }

    /// Resolves the executable: configured path, environment, then `PATH`.
    ///
    /// A configured path is returned even if it does not exist so validation
    /// can name it.
    pub fn resolve(&self, configured: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = configured {
            return Some(path.to_path_buf());
        }

        if let Ok(path) = std::env::var(self.env_var()) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        self.binary_names()
            .iter()
            .find_map(|name| which::which(name).ok())
    }
}

/// Locations of every external tool and host-side script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub extractor: PathBuf,
    pub blender: PathBuf,
    /// Python hook run inside the modeling tool.
    pub blender_hook: PathBuf,
    pub unreal_editor: PathBuf,
    /// Python hook run inside the engine editor.
    pub unreal_hook: PathBuf,
    pub unreal_pak: PathBuf,
}

impl ToolPaths {
    /// Executable path of `tool`.
    pub fn get(&self, tool: Tool) -> &Path {
        match tool {
            Tool::Extractor => &self.extractor,
            Tool::Blender => &self.blender,
            Tool::UnrealEditor => &self.unreal_editor,
            Tool::UnrealPak => &self.unreal_pak,
        }
    }
}

/// Per-tool timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub extract: Duration,
    pub export: Duration,
    pub import: Duration,
    pub cook: Duration,
    pub pack: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            extract: Duration::from_secs(DEFAULT_EXTRACT_TIMEOUT_SECS),
            export: Duration::from_secs(DEFAULT_EXPORT_TIMEOUT_SECS),
            import: Duration::from_secs(DEFAULT_IMPORT_TIMEOUT_SECS),
            cook: Duration::from_secs(DEFAULT_COOK_TIMEOUT_SECS),
            pack: Duration::from_secs(DEFAULT_PACK_TIMEOUT_SECS),
        }
    }
}

/// Immutable configuration for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub tools: ToolPaths,
    /// Game install directory (the one containing `RED/`).
    pub game_dir: PathBuf,
    /// Key for encrypted game archives, `0x`-prefixed hex.
    pub aes_key: Option<String>,
    /// Scratch directory all intermediate artifacts live in.
    pub work_dir: PathBuf,
    pub timeouts: Timeouts,
}

impl PipelineConfig {
    /// Creates a config with default timeouts and no AES key.
    pub fn new(tools: ToolPaths, game_dir: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            tools,
            game_dir: game_dir.into(),
            aes_key: None,
            work_dir: work_dir.into(),
            timeouts: Timeouts::default(),
        }
    }

    /// Sets the AES key.
    pub fn aes_key(mut self, key: impl Into<String>) -> Self {
        self.aes_key = Some(key.into());
        self
    }

    /// Sets the per-tool timeouts.
    pub fn timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Checks every tool, hook script and directory exists and the AES key is
    /// well formed. Does not touch the working directory.
    pub fn validate(&self) -> PipelineResult<()> {
        for tool in Tool::ALL {
            let path = self.tools.get(tool);
            if !path.is_file() {
                return Err(PipelineError::config(format!(
                    "{} not found at {}",
                    tool.display_name(),
                    path.display()
                )));
            }
        }

        for (what, path) in [
            ("Blender hook script", &self.tools.blender_hook),
            ("Unreal hook script", &self.tools.unreal_hook),
        ] {
            if !path.is_file() {
                return Err(PipelineError::config(format!(
                    "{} not found at {}",
                    what,
                    path.display()
                )));
            }
        }

        if !self.game_dir.is_dir() {
            return Err(PipelineError::config(format!(
                "game directory not found at {}",
                self.game_dir.display()
            )));
        }

        if let Some(key) = &self.aes_key {
            validate_aes_key(key)?;
        }

        Ok(())
    }
}

/// Accepts `0x` followed by at least one hex digit.
pub fn validate_aes_key(key: &str) -> PipelineResult<()> {
    let digits = key
        .strip_prefix(AES_KEY_PREFIX)
        .ok_or_else(|| PipelineError::config(format!("AES key must start with {}", AES_KEY_PREFIX)))?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(PipelineError::config("AES key must be hexadecimal"));
    }
    Ok(())
}

/// What one run converts and where it installs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTarget {
    /// Modeling-tool project holding the artist's mesh.
    pub project: PathBuf,
    pub asset: AssetPath,
    /// Name of the mod folder and archive.
    pub mod_name: String,
}

impl RunTarget {
    /// Parses the asset path; the project file and mod name are checked by
    /// [`RunTarget::validate`].
    pub fn new(
        project: impl Into<PathBuf>,
        asset: &str,
        mod_name: impl Into<String>,
    ) -> PipelineResult<Self> {
        Ok(Self {
            project: project.into(),
            asset: AssetPath::parse(asset)?,
            mod_name: mod_name.into(),
        })
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if !self.project.is_file() {
            return Err(PipelineError::target(format!(
                "project file not found at {}",
                self.project.display()
            )));
        }
        if self.project.extension().and_then(|e| e.to_str()) != Some("blend") {
            return Err(PipelineError::target(format!(
                "project file must be a .blend file: {}",
                self.project.display()
            )));
        }
        validate_mod_name(&self.mod_name)
    }
}

/// Mod names become a folder and a file name, so only `[A-Za-z0-9_-]` is allowed.
pub fn validate_mod_name(name: &str) -> PipelineResult<()> {
    if name.is_empty() {
        return Err(PipelineError::target("mod name is empty"));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(PipelineError::target(format!(
            "mod name '{}' contains '{}'",
            name, bad
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aes_key_validation() {
        assert!(validate_aes_key("0x1F2e").is_ok());
        assert!(matches!(
            validate_aes_key("1F2E"),
            Err(PipelineError::ConfigInvalid(_))
        ));
        assert!(validate_aes_key("0x").is_err());
        assert!(validate_aes_key("0xZZ").is_err());
    }

    #[test]
    fn test_mod_name_validation() {
        assert!(validate_mod_name("ram_swimsuit-2").is_ok());
        assert!(validate_mod_name("").is_err());
        assert!(validate_mod_name("my mod").is_err());
        assert!(validate_mod_name("../x").is_err());
    }

    #[test]
    fn test_configured_tool_path_wins() {
        let path = Path::new("/opt/tools/blender");
        assert_eq!(Tool::Blender.resolve(Some(path)), Some(path.to_path_buf()));
    }

    #[test]
    fn test_run_target_rejects_bad_asset() {
        assert!(matches!(
            RunTarget::new("a.blend", "Weapon/sword", "m"),
            Err(PipelineError::TargetInvalid(_))
        ));
    }

    #[test]
    fn test_run_target_validate() {
        let dir = tempfile::tempdir().unwrap();
        let fbx = dir.path().join("mesh.fbx");
        std::fs::write(&fbx, b"").unwrap();
        let blend = dir.path().join("mesh.blend");
        std::fs::write(&blend, b"").unwrap();

        let target = RunTarget::new(&fbx, "Chara/RAM/ram_body", "mod").unwrap();
        assert!(matches!(target.validate(), Err(PipelineError::TargetInvalid(_))));

        let target = RunTarget::new(&blend, "Chara/RAM/ram_body", "mod").unwrap();
        assert!(target.validate().is_ok());

        let missing = RunTarget::new(dir.path().join("x.blend"), "Chara/RAM/ram_body", "mod").unwrap();
        assert!(missing.validate().is_err());
    }

    #[test]
    fn test_config_validate_reports_missing_tool() {
        let dir = tempfile::tempdir().unwrap();
        let tools = ToolPaths {
            extractor: dir.path().join("umodel"),
            blender: dir.path().join("blender"),
            blender_hook: dir.path().join("hook.py"),
            unreal_editor: dir.path().join("editor"),
            unreal_hook: dir.path().join("ue_hook.py"),
            unreal_pak: dir.path().join("pak"),
        };
        let config = PipelineConfig::new(tools, dir.path(), dir.path().join("work"));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Extractor not found"));
    }
}
