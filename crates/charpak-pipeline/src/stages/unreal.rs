//! Engine stages: project setup, FBX import and cook.

use std::path::PathBuf;

use charpak_spec::outline;
use charpak_spec::SlotInfo;
use serde_json::json;
use tracing::{debug, info};

use crate::config::{RunTarget, Tool};
use crate::error::{expect_output, PipelineError, PipelineResult};
use crate::layout::COOK_PLATFORM;
use crate::process::CommandLine;
use crate::stages::blender::MeshExport;
use crate::stages::{create_dir_all, remove_file_if_exists, write_file, StageContext};

/// Line the engine hook prints once the imported package is saved.
pub const IMPORT_SUCCESS_MARKER: &str = "Successfully exported";

/// Engine version the scratch project is associated with.
pub const ENGINE_ASSOCIATION: &str = "4.25";

/// Flags shared by every headless editor invocation.
const HEADLESS_FLAGS: [&str; 3] = ["-unattended", "-nosplash", "-nullrhi"];

/// Cooked package pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookedAsset {
    pub uasset: PathBuf,
    pub uexp: PathBuf,
}

/// Creates the scratch engine project if it does not exist yet.
///
/// An existing project is left alone so earlier imports stay cached by the
/// editor.
pub fn setup_project(ctx: &StageContext<'_>) -> PipelineResult<PathBuf> {
    let uproject = ctx.work.uproject();
    create_dir_all(&ctx.work.content_dir())?;

    if uproject.is_file() {
        debug!("Reusing engine project {}", uproject.display());
    } else {
        let descriptor = json!({
            "FileVersion": 3,
            "EngineAssociation": ENGINE_ASSOCIATION,
            "Category": "",
            "Description": "",
            "Plugins": [
                { "Name": "PythonScriptPlugin", "Enabled": true },
                { "Name": "EditorScriptingUtilities", "Enabled": true }
            ]
        });
        let text = serde_json::to_string_pretty(&descriptor)
            .map_err(|e| PipelineError::parse("project descriptor", e))?;
        write_file(&uproject, text)?;
        info!("Created engine project {}", uproject.display());
    }

    expect_output(&uproject)?;
    Ok(uproject)
}

/// Imports the exported FBX through the engine hook.
///
/// Also writes the per-chunk outline sequence next to the slot-info file.
pub fn import_mesh(
    ctx: &StageContext<'_>,
    target: &RunTarget,
    slot_info: &SlotInfo,
    export: &MeshExport,
) -> PipelineResult<PathBuf> {
    let asset = &target.asset;
    let uasset = ctx.work.imported_uasset(asset);
    let outlines_file = ctx.work.outlines_file(asset);
    remove_file_if_exists(&uasset)?;
    remove_file_if_exists(&outlines_file)?;

    let outlines = outline::expand(&slot_info.outline_types(), export.chunk_counts.as_slice())?;
    write_file(&outlines_file, format!("{}\n", outline::format_sequence(&outlines)))?;

    // The editor takes the hook and its arguments as one quoted token.
    let raw_args = format!(
        "\"{}\" -stdout {} -ExecutePythonScript=\"{} {} {} {} {}\"",
        ctx.work.uproject().display(),
        HEADLESS_FLAGS.join(" "),
        ctx.config.tools.unreal_hook.display(),
        export.fbx.display(),
        asset.stub(),
        ctx.work.details_file(asset).display(),
        export.chunk_counts.to_csv(),
    );
    let command = CommandLine::raw(ctx.config.tools.get(Tool::UnrealEditor), raw_args);

    let stdout = ctx.run_tool(Tool::UnrealEditor, &command, true, ctx.config.timeouts.import)?;

    expect_output(&uasset)?;
    if !stdout.contains(IMPORT_SUCCESS_MARKER) {
        return Err(PipelineError::ToolReportedFailure {
            tool: Tool::UnrealEditor.display_name(),
            message: format!("import finished without '{}'", IMPORT_SUCCESS_MARKER),
        });
    }

    info!("Imported {}", uasset.display());
    Ok(uasset)
}

/// Cooks the scratch project for the game's platform.
pub fn cook(ctx: &StageContext<'_>, target: &RunTarget) -> PipelineResult<CookedAsset> {
    let [uasset, uexp] = ctx.work.cooked_files(&target.asset);
    remove_file_if_exists(&uasset)?;
    remove_file_if_exists(&uexp)?;

    let command = ctx
        .command(Tool::UnrealEditor)
        .arg(ctx.work.uproject())
        .arg("-run=cook")
        .arg(format!("-targetplatform={}", COOK_PLATFORM))
        .args(HEADLESS_FLAGS);

    ctx.run_tool(Tool::UnrealEditor, &command, false, ctx.config.timeouts.cook)?;

    expect_output(&uasset)?;
    expect_output(&uexp)?;

    info!("Cooked {}", uasset.display());
    Ok(CookedAsset { uasset, uexp })
}
