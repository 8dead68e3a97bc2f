//! charpak conversion pipeline
//!
//! Drives the external tools that turn an artist's modeling-tool project into
//! an installed game mod archive:
//!
//! ```text
//! Validate -> DumpInfo -> ExportMesh -> SetupProject -> ImportMesh -> Cook -> Pack -> Install
//! ```
//!
//! Every tool goes through the [`process`] adapter. Stage drivers live in
//! [`stages`] and [`extract`]; [`orchestrator`] sequences them, reports
//! progress and turns the first failure into a [`StageFailure`].
//!
//! # Example
//!
//! ```no_run
//! use charpak_pipeline::{NoProgress, Pipeline, PipelineConfig, RunTarget, ToolPaths};
//!
//! let tools = ToolPaths {
//!     extractor: "tools/umodel".into(),
//!     blender: "tools/blender".into(),
//!     blender_hook: "hooks/blender_hook.py".into(),
//!     unreal_editor: "tools/UE4Editor-Cmd".into(),
//!     unreal_hook: "hooks/unreal_hook.py".into(),
//!     unreal_pak: "tools/UnrealPak".into(),
//! };
//! let config = PipelineConfig::new(tools, "C:/Games/GUILTY GEAR STRIVE", "C:/charpak/work");
//! let target = RunTarget::new("ram_body.blend", "Chara/RAM/Costume01/Mesh/ram_body", "swim")?;
//!
//! let report = Pipeline::new(config).run(&target, &NoProgress)?;
//! println!("installed {}", report.installed.display());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod layout;
pub mod lock;
pub mod orchestrator;
pub mod process;
pub mod stages;

#[cfg(test)]
mod test_support;

pub use config::{PipelineConfig, RunTarget, Timeouts, Tool, ToolPaths};
pub use error::{PipelineError, PipelineResult, ProcessError};
pub use layout::{GameLayout, WorkLayout};
pub use orchestrator::{
    spawn_run, CancelToken, NoProgress, Pipeline, ProgressListener, RunEvent, RunHandle,
    RunReport, Stage, StageFailure, StageTiming,
};
pub use process::{CommandLine, ProcessRunner, SystemRunner};
