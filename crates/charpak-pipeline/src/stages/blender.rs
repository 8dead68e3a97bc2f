//! ExportMesh: run the modeling-tool hook to canonicalize, partition and
//! export the artist mesh.

use std::path::{Path, PathBuf};
use std::time::Duration;

use charpak_spec::{ChunkCounts, SlotInfo};
use tracing::info;

use crate::config::{RunTarget, Tool};
use crate::error::{expect_output, PipelineError, PipelineResult};
use crate::process::{CommandLine, ProcessRunner};
use crate::stages::{create_parent, remove_file_if_exists, StageContext};

/// Prefix of failure lines printed by the hook.
pub const FAIL_PREFIX: &str = "FAIL:";

/// First line of `blender --version` for the release the hook targets.
pub const BLENDER_VERSION: &str = "Blender 3.0.0";

const VERSION_TIMEOUT: Duration = Duration::from_secs(60);

/// Runs `blender --version` and returns the first line of its output.
pub fn blender_version(runner: &dyn ProcessRunner, blender: &Path) -> PipelineResult<String> {
    let command = CommandLine::new(blender).arg("--version");
    let stdout = runner
        .run(&command, true, Some(VERSION_TIMEOUT))
        .map_err(|source| PipelineError::ToolFailed {
            tool: Tool::Blender.display_name(),
            source,
        })?;
    Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
}

/// Checks the installed Blender is [`BLENDER_VERSION`].
pub fn check_blender_version(runner: &dyn ProcessRunner, blender: &Path) -> PipelineResult<()> {
    let found = blender_version(runner, blender)?;
    if found == BLENDER_VERSION {
        Ok(())
    } else {
        Err(PipelineError::config(format!(
            "expected {}, found '{}' at {}",
            BLENDER_VERSION,
            found,
            blender.display()
        )))
    }
}

/// What the export produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshExport {
    pub fbx: PathBuf,
    /// One count per canonical slot.
    pub chunk_counts: ChunkCounts,
}

/// Messages of every `FAIL:` line, in order.
pub fn collect_failures(stdout: &str) -> Vec<&str> {
    stdout
        .lines()
        .filter_map(|line| line.trim_start().strip_prefix(FAIL_PREFIX))
        .map(str::trim)
        .collect()
}

/// Exports the project's mesh to FBX and reads back the chunk counts.
pub fn export_mesh(
    ctx: &StageContext<'_>,
    target: &RunTarget,
    slot_info: &SlotInfo,
) -> PipelineResult<MeshExport> {
    let fbx = ctx.work.fbx(&target.asset);
    remove_file_if_exists(&fbx)?;
    create_parent(&fbx)?;

    let command = ctx
        .command(Tool::Blender)
        .args(["--background", "--factory-startup"])
        .arg(&target.project)
        .arg("--python")
        .arg(&ctx.config.tools.blender_hook)
        .arg("--")
        .arg(ctx.work.root())
        .arg(target.asset.as_str());

    let stdout = ctx.run_tool(Tool::Blender, &command, true, ctx.config.timeouts.export)?;

    let failures = collect_failures(&stdout);
    if !failures.is_empty() {
        return Err(PipelineError::ToolReportedFailure {
            tool: Tool::Blender.display_name(),
            message: failures.join("\n"),
        });
    }

    expect_output(&fbx)?;

    let chunk_counts = ChunkCounts::from_tool_output(&stdout)
        .and_then(|counts| counts.expect_len(slot_info.len()))
        .map_err(|e| PipelineError::parse("chunk counts", e))?;

    info!("Exported {} with chunk counts {}", fbx.display(), chunk_counts);
    Ok(MeshExport { fbx, chunk_counts })
}
