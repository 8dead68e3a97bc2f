//! Pack and Install: stage the cooked files, build the mod archive and copy
//! it into the game's mod folder.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::{RunTarget, Tool};
use crate::error::{expect_output, PipelineError, PipelineResult};
use crate::stages::unreal::CookedAsset;
use crate::stages::{
    copy_file, create_dir_all, remove_dir_if_exists, remove_file_if_exists, write_file,
    StageContext,
};

/// Mount point of the staged files, relative to the game's content root.
pub const MOUNT_POINT: &str = r"..\..\..\*.*";

/// The archiver's file list: everything under the staging root, mounted at
/// the game root.
pub fn filelist_line(staging_root: &Path) -> String {
    format!("\"{}\\*.*\" \"{}\"\n", staging_root.display(), MOUNT_POINT)
}

/// Copies the cooked files into a fresh staging tree and archives it.
///
/// The cooked files are copied, not moved, so a failed pack can be retried
/// without cooking again.
pub fn pack(
    ctx: &StageContext<'_>,
    target: &RunTarget,
    cooked: &CookedAsset,
) -> PipelineResult<PathBuf> {
    let staging_root = ctx.work.staging_dir(&target.mod_name);
    let pak = ctx.work.pak(&target.mod_name);
    let filelist = ctx.work.filelist();
    remove_dir_if_exists(&staging_root)?;
    remove_file_if_exists(&pak)?;

    let asset_dir = ctx.work.staging_asset_dir(&target.mod_name, &target.asset);
    create_dir_all(&asset_dir)?;
    for file in [&cooked.uasset, &cooked.uexp] {
        let name = file.file_name().ok_or_else(|| {
            PipelineError::io(
                file,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "no file name"),
            )
        })?;
        copy_file(file, &asset_dir.join(name))?;
    }

    write_file(&filelist, filelist_line(&staging_root))?;

    let command = ctx
        .command(Tool::UnrealPak)
        .arg(&pak)
        .arg(format!("-create={}", filelist.display()))
        .arg("-compress");
    ctx.run_tool(Tool::UnrealPak, &command, false, ctx.config.timeouts.pack)?;

    expect_output(&pak)?;
    info!("Packed {}", pak.display());
    Ok(pak)
}

/// Copies the archive into `<paks>/~mods/<mod>/`, replacing an earlier install.
pub fn install(ctx: &StageContext<'_>, target: &RunTarget, pak: &Path) -> PipelineResult<PathBuf> {
    let installed = ctx.game.installed_pak(&target.mod_name);
    remove_file_if_exists(&installed)?;
    copy_file(pak, &installed)?;

    expect_output(&installed)?;
    info!("Installed {}", installed.display());
    Ok(installed)
}
