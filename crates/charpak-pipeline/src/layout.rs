//! Filesystem layout shared with the external tools and their hooks.
//!
//! Hooks locate their inputs by convention, so every path here is part of
//! the contract and must not move.

use std::path::{Path, PathBuf};

use charpak_spec::AssetPath;

/// Subdirectory for extractor dumps and derived slot files.
pub const DUMP_DIR: &str = "dump";

/// Suffix of the slot-info file.
pub const DETAILS_SUFFIX: &str = "_details.txt";

/// Suffix of the per-chunk outline file.
pub const OUTLINES_SUFFIX: &str = "_outlines.txt";

/// Modeling-tool export directory.
pub const BLENDER_BUILD_DIR: &str = "Blender_Fast_Build";

/// Engine project directory and project name.
pub const UNREAL_PROJECT_NAME: &str = "Unreal_Fast_Build";

/// Cook platform.
pub const COOK_PLATFORM: &str = "WindowsNoEditor";

/// Archive staging directory.
pub const PAK_BUILD_DIR: &str = "Pak_Build";

/// Archive file list name.
pub const FILELIST_NAME: &str = "filelist.txt";

/// Game archive directory relative to the game install.
pub const GAME_PAKS_DIR: &str = "RED/Content/Paks";

/// Folder mods are installed under inside the archive directory.
pub const MODS_DIR: &str = "~mods";

/// Run lock file name.
pub const LOCK_FILE: &str = ".charpak.lock";

/// Default diagnostic log name.
pub const LOG_FILE: &str = "charpak.log";

/// Paths inside the working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkLayout {
    root: PathBuf,
}

impl WorkLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dump_dir(&self) -> PathBuf {
        self.root.join(DUMP_DIR)
    }

    /// JSON written by the extractor, mirroring the asset path.
    pub fn dump_json(&self, asset: &AssetPath) -> PathBuf {
        join_slashed(&self.dump_dir(), &format!("{}.json", asset.as_str()))
    }

    /// Two-line slot-info file. The modeling-tool hook derives this path from
    /// the work dir and asset path alone.
    pub fn details_file(&self, asset: &AssetPath) -> PathBuf {
        join_slashed(
            &self.dump_dir(),
            &format!("{}{}", asset.as_str(), DETAILS_SUFFIX),
        )
    }

    pub fn outlines_file(&self, asset: &AssetPath) -> PathBuf {
        join_slashed(
            &self.dump_dir(),
            &format!("{}{}", asset.as_str(), OUTLINES_SUFFIX),
        )
    }

    /// FBX exported by the modeling-tool hook.
    pub fn fbx(&self, asset: &AssetPath) -> PathBuf {
        self.root
            .join(BLENDER_BUILD_DIR)
            .join(format!("{}.fbx", asset.name()))
    }

    pub fn project_dir(&self) -> PathBuf {
        self.root.join(UNREAL_PROJECT_NAME)
    }

    pub fn uproject(&self) -> PathBuf {
        self.project_dir()
            .join(format!("{}.uproject", UNREAL_PROJECT_NAME))
    }

    pub fn content_dir(&self) -> PathBuf {
        self.project_dir().join("Content")
    }

    /// Package written by the engine import.
    pub fn imported_uasset(&self, asset: &AssetPath) -> PathBuf {
        join_slashed(&self.content_dir(), &format!("{}.uasset", asset.as_str()))
    }

    pub fn cooked_content_dir(&self) -> PathBuf {
        self.project_dir()
            .join("Saved")
            .join("Cooked")
            .join(COOK_PLATFORM)
            .join(UNREAL_PROJECT_NAME)
            .join("Content")
    }

    /// Cooked `.uasset` and `.uexp` pair.
    pub fn cooked_files(&self, asset: &AssetPath) -> [PathBuf; 2] {
        let dir = self.cooked_content_dir();
        [
            join_slashed(&dir, &format!("{}.uasset", asset.as_str())),
            join_slashed(&dir, &format!("{}.uexp", asset.as_str())),
        ]
    }

    pub fn pak_build_dir(&self) -> PathBuf {
        self.root.join(PAK_BUILD_DIR)
    }

    /// Root of the staged archive content for `mod_name`.
    pub fn staging_dir(&self, mod_name: &str) -> PathBuf {
        self.pak_build_dir().join(mod_name)
    }

    /// Directory the cooked files are staged into.
    pub fn staging_asset_dir(&self, mod_name: &str, asset: &AssetPath) -> PathBuf {
        join_slashed(
            &self.staging_dir(mod_name).join("RED").join("Content"),
            asset.stub(),
        )
    }

    pub fn filelist(&self) -> PathBuf {
        self.pak_build_dir().join(FILELIST_NAME)
    }

    pub fn pak(&self, mod_name: &str) -> PathBuf {
        self.pak_build_dir().join(format!("{}.pak", mod_name))
    }

    pub fn lock_file(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }

    pub fn log_file(&self) -> PathBuf {
        self.root.join(LOG_FILE)
    }
}

/// Paths inside the game install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameLayout {
    game_dir: PathBuf,
}

impl GameLayout {
    pub fn new(game_dir: impl Into<PathBuf>) -> Self {
        Self {
            game_dir: game_dir.into(),
        }
    }

    /// Directory holding the game's archives; the extractor reads from here.
    pub fn paks_dir(&self) -> PathBuf {
        join_slashed(&self.game_dir, GAME_PAKS_DIR)
    }

    pub fn mod_dir(&self, mod_name: &str) -> PathBuf {
        self.paks_dir().join(MODS_DIR).join(mod_name)
    }

    pub fn installed_pak(&self, mod_name: &str) -> PathBuf {
        self.mod_dir(mod_name).join(format!("{}.pak", mod_name))
    }
}

/// Joins a forward-slash relative path component by component.
fn join_slashed(base: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|s| !s.is_empty())
        .fold(base.to_path_buf(), |acc, segment| acc.join(segment))
}
