//! Per-tool stage drivers.
//!
//! Each driver pre-cleans only its own outputs, invokes one tool through the
//! [`ProcessRunner`], and verifies the tool actually produced what it was
//! asked for. Exit code 0 alone is never trusted.

pub mod blender;
pub mod pak;
pub mod unreal;
pub mod validate;

use std::path::Path;
use std::time::Duration;

use crate::config::{PipelineConfig, Tool};
use crate::error::{PipelineError, PipelineResult};
use crate::layout::{GameLayout, WorkLayout};
use crate::process::{CommandLine, ProcessRunner};

pub use blender::{check_blender_version, export_mesh, MeshExport, BLENDER_VERSION};
pub use pak::{install, pack};
pub use unreal::{cook, import_mesh, setup_project, CookedAsset};
pub use validate::validate;

/// Everything a stage driver needs besides the run target.
pub struct StageContext<'a> {
    pub config: &'a PipelineConfig,
    pub work: WorkLayout,
    pub game: GameLayout,
    pub runner: &'a dyn ProcessRunner,
}

impl<'a> StageContext<'a> {
    pub fn new(config: &'a PipelineConfig, runner: &'a dyn ProcessRunner) -> Self {
        Self {
            config,
            work: WorkLayout::new(&config.work_dir),
            game: GameLayout::new(&config.game_dir),
            runner,
        }
    }

    /// Starts a command for `tool`.
    pub(crate) fn command(&self, tool: Tool) -> CommandLine {
        CommandLine::new(self.config.tools.get(tool))
    }

    /// Runs `command`, attributing any process failure to `tool`.
    pub(crate) fn run_tool(
        &self,
        tool: Tool,
        command: &CommandLine,
        capture_output: bool,
        timeout: Duration,
    ) -> PipelineResult<String> {
        self.runner
            .run(command, capture_output, Some(timeout))
            .map_err(|source| PipelineError::ToolFailed {
                tool: tool.display_name(),
                source,
            })
    }
}

pub(crate) fn remove_file_if_exists(path: &Path) -> PipelineResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(PipelineError::io(path, e)),
    }
}

pub(crate) fn remove_dir_if_exists(path: &Path) -> PipelineResult<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(PipelineError::io(path, e)),
    }
}

pub(crate) fn create_dir_all(path: &Path) -> PipelineResult<()> {
    std::fs::create_dir_all(path).map_err(|e| PipelineError::io(path, e))
}

/// Creates the parent directory of `path`.
pub(crate) fn create_parent(path: &Path) -> PipelineResult<()> {
    match path.parent() {
        Some(parent) => create_dir_all(parent),
        None => Ok(()),
    }
}

pub(crate) fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> PipelineResult<()> {
    create_parent(path)?;
    std::fs::write(path, contents).map_err(|e| PipelineError::io(path, e))
}

pub(crate) fn read_file(path: &Path) -> PipelineResult<String> {
    std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))
}

pub(crate) fn copy_file(from: &Path, to: &Path) -> PipelineResult<()> {
    create_parent(to)?;
    std::fs::copy(from, to)
        .map(|_| ())
        .map_err(|e| PipelineError::io(from, e))
}
