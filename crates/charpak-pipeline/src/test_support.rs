//! Scripted runner and on-disk fixture shared by the stage tests.

use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use tempfile::TempDir;

use crate::config::{PipelineConfig, RunTarget, ToolPaths};
use crate::error::ProcessError;
use crate::layout::GAME_PAKS_DIR;
use crate::process::{CommandLine, ProcessRunner};

type Handler = dyn Fn(&CommandLine) -> Result<String, ProcessError> + Send + Sync;

/// Answers every command with a closure and records what it was asked to run.
pub struct FakeRunner {
    handler: Box<Handler>,
    calls: Mutex<Vec<CommandLine>>,
}

impl FakeRunner {
    pub fn new(
        handler: impl Fn(&CommandLine) -> Result<String, ProcessError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<CommandLine> {
        self.calls.lock().unwrap().clone()
    }
}

impl ProcessRunner for FakeRunner {
    fn run(
        &self,
        command: &CommandLine,
        capture_output: bool,
        _timeout: Option<Duration>,
    ) -> Result<String, ProcessError> {
        self.calls.lock().unwrap().push(command.clone());
        let out = (self.handler)(command)?;
        Ok(if capture_output { out } else { String::new() })
    }
}

/// A temp directory with placeholder tools, a game install and a project file.
pub struct Fixture {
    pub dir: TempDir,
    pub config: PipelineConfig,
    pub target: RunTarget,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        let touch = |name: &str| -> PathBuf {
            let path = root.join("tools").join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, b"").unwrap();
            path
        };

        let tools = ToolPaths {
            extractor: touch("umodel"),
            blender: touch("blender"),
            blender_hook: touch("blender_hook.py"),
            unreal_editor: touch("UE4Editor-Cmd"),
            unreal_hook: touch("unreal_hook.py"),
            unreal_pak: touch("UnrealPak"),
        };

        let game_dir = root.join("game");
        std::fs::create_dir_all(game_dir.join(GAME_PAKS_DIR)).unwrap();

        let project = root.join("ram_body.blend");
        std::fs::write(&project, b"BLENDER").unwrap();

        let config = PipelineConfig::new(tools, game_dir, root.join("work")).aes_key("0xABCD");
        let target =
            RunTarget::new(project, "Chara/RAM/Costume01/Mesh/ram_body", "swim").unwrap();

        Self {
            dir,
            config,
            target,
        }
    }
}
