//! Pipeline orchestrator.
//!
//! Runs the stages strictly in order, reports progress before each one and
//! stops at the first failure. Nothing is retried and nothing is rolled back:
//! every stage overwrites its own outputs, so a failed run can simply be
//! started again.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use charpak_spec::{AssetPath, CharacterManifest, SlotInfo};
use crossbeam_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::config::{PipelineConfig, RunTarget};
use crate::error::{PipelineError, PipelineResult};
use crate::extract;
use crate::process::{ProcessRunner, SystemRunner};
use crate::stages::{self, StageContext};

/// Pipeline stages in run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Validate,
    DumpInfo,
    ExportMesh,
    SetupProject,
    ImportMesh,
    Cook,
    Pack,
    Install,
}

impl Stage {
    pub const ALL: [Stage; 8] = [
        Stage::Validate,
        Stage::DumpInfo,
        Stage::ExportMesh,
        Stage::SetupProject,
        Stage::ImportMesh,
        Stage::Cook,
        Stage::Pack,
        Stage::Install,
    ];

    /// Zero-based position in the run.
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Human-readable progress label.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Validate => "Validating configuration and target",
            Stage::DumpInfo => "Dumping asset info",
            Stage::ExportMesh => "Exporting modeling-tool project to FBX",
            Stage::SetupProject => "Preparing engine project",
            Stage::ImportMesh => "Importing FBX into the engine",
            Stage::Cook => "Cooking engine project",
            Stage::Pack => "Packing mod archive",
            Stage::Install => "Installing mod archive",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Validate => "Validate",
            Stage::DumpInfo => "DumpInfo",
            Stage::ExportMesh => "ExportMesh",
            Stage::SetupProject => "SetupProject",
            Stage::ImportMesh => "ImportMesh",
            Stage::Cook => "Cook",
            Stage::Pack => "Pack",
            Stage::Install => "Install",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Receives a notification before each stage starts.
pub trait ProgressListener {
    fn on_stage(&self, stage: Stage);
}

/// Ignores progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressListener for NoProgress {
    fn on_stage(&self, _stage: Stage) {}
}

impl ProgressListener for Sender<RunEvent> {
    fn on_stage(&self, stage: Stage) {
        // A dropped observer must not stop the run.
        self.send(RunEvent::Stage {
            index: stage.index(),
            label: stage.label(),
        })
        .ok();
    }
}

/// Cooperative cancellation, checked between stages only.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Timing information for a single stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTiming {
    pub stage: Stage,
    pub duration_ms: u64,
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Installed archive path.
    pub installed: PathBuf,
    pub timings: Vec<StageTiming>,
}

impl RunReport {
    /// Total time across all stages.
    pub fn total_ms(&self) -> u64 {
        self.timings.iter().map(|t| t.duration_ms).sum()
    }
}

/// A run stopped at `stage`.
///
/// Displays as `<StageName>: <cause>`.
#[derive(Debug, Error)]
#[error("{stage}: {error}")]
pub struct StageFailure {
    pub stage: Stage,
    #[source]
    pub error: PipelineError,
}

/// Messages from a run on a worker thread.
#[derive(Debug)]
pub enum RunEvent {
    /// A stage is about to start.
    Stage { index: usize, label: &'static str },
    /// The run ended; always the last event.
    Finished(Result<RunReport, StageFailure>),
}

/// The conversion pipeline.
pub struct Pipeline {
    config: PipelineConfig,
    runner: Arc<dyn ProcessRunner>,
    cancel: CancelToken,
}

impl Pipeline {
    /// Creates a pipeline that runs real processes.
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_runner(config, Arc::new(SystemRunner))
    }

    /// Creates a pipeline with the given process runner.
    pub fn with_runner(config: PipelineConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            config,
            runner,
            cancel: CancelToken::new(),
        }
    }

    /// Uses `cancel` instead of a fresh token, so one token can stop
    /// several pipelines or be created before the pipeline is.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Token that cancels this pipeline's runs before their next stage.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Runs every stage for `target` on the calling thread.
    pub fn run(
        &self,
        target: &RunTarget,
        listener: &dyn ProgressListener,
    ) -> Result<RunReport, StageFailure> {
        let ctx = StageContext::new(&self.config, self.runner.as_ref());
        let mut run = PipelineRun {
            listener,
            cancel: &self.cancel,
            timings: Vec::with_capacity(Stage::ALL.len()),
        };

        let result = run_stages(&mut run, &ctx, target);
        match &result {
            Ok(installed) => info!("Pipeline finished: {}", installed.display()),
            Err(failure) => error!("Pipeline failed: {}", failure),
        }

        result.map(|installed| RunReport {
            installed,
            timings: run.timings,
        })
    }

    /// Runs only the asset info extraction, without validation or locking.
    pub fn dump_info(&self, asset: &AssetPath) -> PipelineResult<SlotInfo> {
        let ctx = StageContext::new(&self.config, self.runner.as_ref());
        extract::extract(&ctx, asset)
    }

    /// Lists every character's meshes in the game archives.
    pub fn scan_characters(&self) -> PipelineResult<BTreeMap<String, CharacterManifest>> {
        let ctx = StageContext::new(&self.config, self.runner.as_ref());
        extract::scan_characters(&ctx)
    }
}

fn run_stages(
    run: &mut PipelineRun<'_>,
    ctx: &StageContext<'_>,
    target: &RunTarget,
) -> Result<PathBuf, StageFailure> {
    let _lock = run.stage(Stage::Validate, || stages::validate(ctx, target))?;
    let slot_info = run.stage(Stage::DumpInfo, || extract::extract(ctx, &target.asset))?;
    let export = run.stage(Stage::ExportMesh, || {
        stages::export_mesh(ctx, target, &slot_info)
    })?;
    run.stage(Stage::SetupProject, || stages::setup_project(ctx))?;
    run.stage(Stage::ImportMesh, || {
        stages::import_mesh(ctx, target, &slot_info, &export)
    })?;
    let cooked = run.stage(Stage::Cook, || stages::cook(ctx, target))?;
    let pak = run.stage(Stage::Pack, || stages::pack(ctx, target, &cooked))?;
    run.stage(Stage::Install, || stages::install(ctx, target, &pak))
}

/// State of one in-flight run.
struct PipelineRun<'a> {
    listener: &'a dyn ProgressListener,
    cancel: &'a CancelToken,
    timings: Vec<StageTiming>,
}

impl PipelineRun<'_> {
    fn stage<T>(
        &mut self,
        stage: Stage,
        body: impl FnOnce() -> PipelineResult<T>,
    ) -> Result<T, StageFailure> {
        if self.cancel.is_cancelled() {
            return Err(StageFailure {
                stage,
                error: PipelineError::Cancelled,
            });
        }

        self.listener.on_stage(stage);
        info!("[{}/{}] {}", stage.index() + 1, Stage::ALL.len(), stage.label());

        let start = Instant::now();
        let result = body();
        self.timings.push(StageTiming {
            stage,
            duration_ms: start.elapsed().as_millis() as u64,
        });

        result.map_err(|error| StageFailure { stage, error })
    }
}

/// A run executing on a worker thread.
pub struct RunHandle {
    events: Receiver<RunEvent>,
    cancel: CancelToken,
    thread: JoinHandle<()>,
}

impl RunHandle {
    /// Progress events followed by exactly one [`RunEvent::Finished`].
    pub fn events(&self) -> &Receiver<RunEvent> {
        &self.events
    }

    /// Requests cancellation before the next stage.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Blocks until the run ends, forwarding stage events to `on_stage`.
    ///
    /// A panic on the worker thread is re-raised here.
    pub fn wait(
        self,
        mut on_stage: impl FnMut(usize, &'static str),
    ) -> Result<RunReport, StageFailure> {
        let mut outcome = None;
        for event in self.events.iter() {
            match event {
                RunEvent::Stage { index, label } => on_stage(index, label),
                RunEvent::Finished(result) => {
                    outcome = Some(result);
                    break;
                }
            }
        }
        if let Err(panic) = self.thread.join() {
            std::panic::resume_unwind(panic);
        }

        outcome.unwrap_or_else(|| {
            Err(StageFailure {
                stage: Stage::Validate,
                error: PipelineError::Cancelled,
            })
        })
    }
}

/// Starts `target` on a dedicated worker thread.
pub fn spawn_run(pipeline: Pipeline, target: RunTarget) -> RunHandle {
    let (sender, events) = crossbeam_channel::unbounded();
    let cancel = pipeline.cancel_token();

    let thread = std::thread::spawn(move || {
        let result = pipeline.run(&target, &sender);
        sender.send(RunEvent::Finished(result)).ok();
    });

    RunHandle {
        events,
        cancel,
        thread,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessError;
    use crate::process::CommandLine;
    use crate::test_support::{FakeRunner, Fixture};
    use std::path::Path;
    use std::sync::Mutex;

    const DUMP: &str = r#"{
        "SkeletalMaterials": [{"MaterialSlotName": "ram_body"}, {"MaterialSlotName": "ram_face"}],
        "LODModels": [{"Sections": [{"MaterialIndex": 0}], "OutlineMaterialIndices": [1]}]
    }"#;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"x").unwrap();
    }

    /// Plays every tool correctly, except that the engine import can be told
    /// to skip writing its package.
    fn scripted_tools(work: PathBuf, import_writes_output: bool) -> FakeRunner {
        FakeRunner::new(move |command: &CommandLine| {
            let program = command.program().file_name().unwrap().to_string_lossy().into_owned();
            let argv = command.argv();
            match program.as_str() {
                "umodel" => touch_with(
                    &work.join("dump/Chara/RAM/Costume01/Mesh/ram_body.json"),
                    DUMP,
                ),
                "blender" => {
                    touch(&work.join("Blender_Fast_Build/ram_body.fbx"));
                    return Ok("CHUNKING:1,2\n".to_string());
                }
                "UE4Editor-Cmd" if argv.iter().any(|a| a == "-run=cook") => {
                    let cooked = work.join(
                        "Unreal_Fast_Build/Saved/Cooked/WindowsNoEditor/Unreal_Fast_Build/Content/Chara/RAM/Costume01/Mesh",
                    );
                    touch(&cooked.join("ram_body.uasset"));
                    touch(&cooked.join("ram_body.uexp"));
                }
                "UE4Editor-Cmd" => {
                    if import_writes_output {
                        touch(&work.join(
                            "Unreal_Fast_Build/Content/Chara/RAM/Costume01/Mesh/ram_body.uasset",
                        ));
                    }
                    return Ok("Successfully exported\n".to_string());
                }
                "UnrealPak" => touch(Path::new(&argv[0])),
                other => {
                    return Err(ProcessError::NonZeroExit {
                        program: other.to_string(),
                        exit_code: 127,
                    })
                }
            }
            Ok(String::new())
        })
    }

    fn touch_with(path: &Path, contents: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Stage>>);

    impl ProgressListener for Recorder {
        fn on_stage(&self, stage: Stage) {
            self.0.lock().unwrap().push(stage);
        }
    }

    #[test]
    fn test_stage_table() {
        for (i, stage) in Stage::ALL.iter().enumerate() {
            assert_eq!(stage.index(), i);
        }
        assert_eq!(Stage::ImportMesh.to_string(), "ImportMesh");
        assert_eq!(Stage::DumpInfo.label(), "Dumping asset info");
    }

    #[test]
    fn test_run_succeeds_and_installs() {
        let fixture = Fixture::new();
        let runner = Arc::new(scripted_tools(fixture.config.work_dir.clone(), true));
        let pipeline = Pipeline::with_runner(fixture.config.clone(), runner.clone());
        let recorder = Recorder::default();

        let report = pipeline.run(&fixture.target, &recorder).unwrap();
        assert!(report
            .installed
            .ends_with("RED/Content/Paks/~mods/swim/swim.pak"));
        assert!(report.installed.is_file());
        assert_eq!(report.timings.len(), 8);
        assert_eq!(*recorder.0.lock().unwrap(), Stage::ALL.to_vec());

        let outlines = std::fs::read_to_string(
            fixture
                .config
                .work_dir
                .join("dump/Chara/RAM/Costume01/Mesh/ram_body_outlines.txt"),
        )
        .unwrap();
        assert_eq!(outlines, "1,-1,-1\n");
    }

    #[test]
    fn test_import_without_output_stops_the_run() {
        let fixture = Fixture::new();
        let runner = Arc::new(scripted_tools(fixture.config.work_dir.clone(), false));
        let pipeline = Pipeline::with_runner(fixture.config.clone(), runner.clone());
        let recorder = Recorder::default();

        let failure = pipeline.run(&fixture.target, &recorder).unwrap_err();
        assert_eq!(failure.stage, Stage::ImportMesh);
        let message = failure.to_string();
        assert!(message.starts_with("ImportMesh: "));
        assert!(message.contains("expected output not found"));

        assert_eq!(recorder.0.lock().unwrap().last(), Some(&Stage::ImportMesh));
        let cooks = runner
            .calls()
            .iter()
            .filter(|c| c.argv().iter().any(|a| a == "-run=cook"))
            .count();
        assert_eq!(cooks, 0);
        assert!(!fixture
            .config
            .game_dir
            .join("RED/Content/Paks/~mods/swim/swim.pak")
            .exists());
    }

    #[test]
    fn test_cancelled_before_first_stage() {
        let fixture = Fixture::new();
        let runner = Arc::new(scripted_tools(fixture.config.work_dir.clone(), true));
        let pipeline = Pipeline::with_runner(fixture.config.clone(), runner.clone());
        pipeline.cancel_token().cancel();

        let failure = pipeline.run(&fixture.target, &NoProgress).unwrap_err();
        assert_eq!(failure.stage, Stage::Validate);
        assert!(matches!(failure.error, PipelineError::Cancelled));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_spawn_run_delivers_events_then_result() {
        let fixture = Fixture::new();
        let runner = Arc::new(scripted_tools(fixture.config.work_dir.clone(), true));
        let pipeline = Pipeline::with_runner(fixture.config.clone(), runner);

        let handle = spawn_run(pipeline, fixture.target.clone());
        let mut seen = Vec::new();
        let report = handle.wait(|index, _label| seen.push(index)).unwrap();

        assert_eq!(seen, (0..8).collect::<Vec<_>>());
        assert!(report.installed.is_file());
    }

    #[test]
    #[should_panic(expected = "extractor blew up")]
    fn test_wait_reraises_worker_panic() {
        let fixture = Fixture::new();
        let runner = Arc::new(FakeRunner::new(|_| panic!("extractor blew up")));
        let pipeline = Pipeline::with_runner(fixture.config.clone(), runner);

        let handle = spawn_run(pipeline, fixture.target.clone());
        let _ = handle.wait(|_, _| {});
    }
}
