//! Validate: configuration, target and working directory.

use tracing::info;

use crate::config::RunTarget;
use crate::error::{PipelineError, PipelineResult};
use crate::lock::RunLock;
use crate::stages::{create_dir_all, StageContext};

/// Checks the config and target, prepares the working directory and takes
/// the run lock. The returned lock must be held until the run ends.
pub fn validate(ctx: &StageContext<'_>, target: &RunTarget) -> PipelineResult<RunLock> {
    ctx.config.validate()?;
    target.validate()?;

    let paks = ctx.game.paks_dir();
    if !paks.is_dir() {
        return Err(PipelineError::config(format!(
            "game archive directory not found at {}",
            paks.display()
        )));
    }

    create_dir_all(ctx.work.root())?;
    let lock = RunLock::acquire(&ctx.work.lock_file(), ctx.work.root())?;

    info!(
        "Converting {} into {} for mod '{}'",
        target.project.display(),
        target.asset,
        target.mod_name
    );
    Ok(lock)
}
