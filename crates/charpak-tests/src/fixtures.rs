//! Test fixture utilities for a synthetic game install.

use std::fs;
use std::path::{Path, PathBuf};

use charpak_pipeline::layout::GAME_PAKS_DIR;
use charpak_pipeline::{GameLayout, PipelineConfig, RunTarget, ToolPaths, WorkLayout};
use tempfile::TempDir;

/// Asset every fixture targets.
pub const ASSET: &str = "Chara/RAM/Costume01/Mesh/ram_body";

/// Mod name every fixture installs under.
pub const MOD_NAME: &str = "swim";

/// Extractor dump for [`ASSET`]: two slots, only the first has an outline.
pub const DUMP_JSON: &str = r#"{
  "SkeletalMaterials": [
    {"MaterialSlotName": "ram_body"},
    {"MaterialSlotName": "ram_face"}
  ],
  "LODModels": [
    {"Sections": [{"MaterialIndex": 0}], "OutlineMaterialIndices": [1]}
  ]
}"#;

/// Slot-info file the dump above must produce.
pub const DETAILS_WIRE: &str = "ram_body,ram_face\nram_body:1,ram_face:-1\n";

/// Extractor `-list` output: a banner, two characters' meshes and one
/// package that holds no skeletal mesh.
pub const PACKAGE_LISTING: &str = "\
UModel viewer v2.0

/RED/Content/Chara/RAM/Costume01/Mesh/ram_body.uasset
  0   1A4F   2C00  SkeletalMesh   ram_body
  1   4850    120  Skeleton       ram_body_Skeleton

/RED/Content/Chara/RAM/Costume01/Mesh/ram_head_low.uasset
  0    C00   1800  SkeletalMesh   ram_head_low

/RED/Content/Chara/RAM/Costume01/Mesh/ram_weapon01.uasset
  0    C00   1800  SkeletalMesh   ram_weapon01

/RED/Content/Chara/RAM/Costume01/Mesh/ram_body_PhysicsAsset.uasset
  0    900    3F0  PhysicsAsset   ram_body_PhysicsAsset

/RED/Content/Chara/SOL/Costume01/Mesh/sol_body.uasset
  0    A00   1000  SkeletalMesh   sol_body
";

/// A temp directory holding a game install, a project file and a work dir.
pub struct TestInstall {
    pub root: TempDir,
    pub game_dir: PathBuf,
    pub work_dir: PathBuf,
    pub project: PathBuf,
}

impl TestInstall {
    /// Creates the game archive directory and the project file. The work
    /// directory is left for the pipeline to create.
    pub fn new() -> Self {
        let root = TempDir::new().expect("Failed to create temp dir");
        let game_dir = root.path().join("game");
        fs::create_dir_all(game_dir.join(GAME_PAKS_DIR)).expect("Failed to create paks dir");

        let project = root.path().join("ram_body.blend");
        fs::write(&project, b"BLENDER").expect("Failed to write project file");

        let work_dir = root.path().join("work");
        Self {
            root,
            game_dir,
            work_dir,
            project,
        }
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Empty files standing in for every tool and hook script.
    pub fn placeholder_tools(&self) -> ToolPaths {
        let dir = self.path().join("tools");
        fs::create_dir_all(&dir).expect("Failed to create tools dir");
        let touch = |name: &str| {
            let path = dir.join(name);
            fs::write(&path, b"").expect("Failed to write placeholder tool");
            path
        };

        ToolPaths {
            extractor: touch("umodel"),
            blender: touch("blender"),
            blender_hook: touch("blender_hook.py"),
            unreal_editor: touch("UE4Editor-Cmd"),
            unreal_hook: touch("unreal_hook.py"),
            unreal_pak: touch("UnrealPak"),
        }
    }

    pub fn config(&self, tools: ToolPaths) -> PipelineConfig {
        PipelineConfig::new(tools, &self.game_dir, &self.work_dir).aes_key("0x0123ABCD")
    }

    pub fn target(&self) -> RunTarget {
        RunTarget::new(&self.project, ASSET, MOD_NAME).expect("fixture target is valid")
    }

    pub fn work(&self) -> WorkLayout {
        WorkLayout::new(&self.work_dir)
    }

    pub fn game(&self) -> GameLayout {
        GameLayout::new(&self.game_dir)
    }
}

impl Default for TestInstall {
    fn default() -> Self {
        Self::new()
    }
}
