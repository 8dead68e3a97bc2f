//! End-to-end pipeline runs against scripted tools.
//!
//! Every stage runs for real against the filesystem; only the external
//! processes are played by [`ScriptedTools`].

use std::fs;
use std::sync::Arc;

use charpak_pipeline::lock::RunLock;
use charpak_pipeline::stages::pak::filelist_line;
use charpak_pipeline::{
    spawn_run, CancelToken, NoProgress, Pipeline, PipelineError, RunEvent, RunReport, Stage,
    StageFailure,
};
use charpak_spec::{AssetPath, Slot, SlotInfo};
use charpak_tests::{ScriptedTools, TestInstall, ASSET, DETAILS_WIRE, MOD_NAME};
use pretty_assertions::assert_eq;

fn scripted(install: &TestInstall) -> ScriptedTools {
    ScriptedTools::new(install.work(), &install.target().asset)
}

fn pipeline(install: &TestInstall, tools: Arc<ScriptedTools>) -> Pipeline {
    Pipeline::with_runner(install.config(install.placeholder_tools()), tools)
}

fn run_with(
    install: &TestInstall,
    tools: ScriptedTools,
) -> (Result<RunReport, StageFailure>, Arc<ScriptedTools>) {
    let tools = Arc::new(tools);
    let result = pipeline(install, tools.clone()).run(&install.target(), &NoProgress);
    (result, tools)
}

#[test]
fn full_run_installs_archive() {
    let install = TestInstall::new();
    let (result, tools) = run_with(&install, scripted(&install));
    let report = result.unwrap();

    let installed = install.game().installed_pak(MOD_NAME);
    assert_eq!(report.installed, installed);
    assert_eq!(fs::read(&installed).unwrap(), b"PAK");

    let stages: Vec<Stage> = report.timings.iter().map(|t| t.stage).collect();
    assert_eq!(stages, Stage::ALL.to_vec());

    assert_eq!(
        tools.programs(),
        vec!["umodel", "blender", "UE4Editor-Cmd", "UE4Editor-Cmd", "UnrealPak"]
    );
}

#[test]
fn full_run_writes_intermediate_files() {
    let install = TestInstall::new();
    let (result, _) = run_with(&install, scripted(&install));
    result.unwrap();

    let asset = AssetPath::parse(ASSET).unwrap();
    let work = install.work();

    assert_eq!(fs::read_to_string(work.details_file(&asset)).unwrap(), DETAILS_WIRE);
    assert_eq!(
        fs::read_to_string(work.outlines_file(&asset)).unwrap(),
        "1,-1,-1\n"
    );
    assert!(work.uproject().is_file());

    let staging = work.staging_dir(MOD_NAME);
    assert_eq!(
        fs::read_to_string(work.filelist()).unwrap(),
        filelist_line(&staging)
    );

    let staged = work.staging_asset_dir(MOD_NAME, &asset);
    assert_eq!(
        fs::read(staged.join("ram_body.uasset")).unwrap(),
        b"cooked uasset"
    );
    assert_eq!(fs::read(staged.join("ram_body.uexp")).unwrap(), b"cooked uexp");

    // Pack copies rather than moves.
    for cooked in work.cooked_files(&asset) {
        assert!(cooked.is_file(), "{} was moved", cooked.display());
    }
}

#[test]
fn extractor_arguments_carry_key_and_package() {
    let install = TestInstall::new();
    let (result, tools) = run_with(&install, scripted(&install));
    result.unwrap();

    let argv = tools.calls()[0].argv();
    assert_eq!(argv[0], "-dump");
    assert!(argv.contains(&"-aes=0x0123ABCD".to_string()));
    assert!(argv
        .iter()
        .any(|a| a.starts_with("-path=") && a.ends_with("Paks")));
    assert_eq!(
        argv.last().map(String::as_str),
        Some("/RED/Content/Chara/RAM/Costume01/Mesh/ram_body")
    );
}

#[test]
fn second_run_replaces_install() {
    let install = TestInstall::new();
    let (first, _) = run_with(&install, scripted(&install));
    first.unwrap();

    let mut tools = scripted(&install);
    tools.chunk_line = "CHUNKING:2,1".to_string();
    let (second, _) = run_with(&install, tools);
    second.unwrap();

    let asset = AssetPath::parse(ASSET).unwrap();
    assert_eq!(
        fs::read_to_string(install.work().outlines_file(&asset)).unwrap(),
        "1,1,-1\n"
    );
    assert!(install.game().installed_pak(MOD_NAME).is_file());
}

#[test]
fn unknown_asset_fails_at_dump() {
    let install = TestInstall::new();
    let mut tools = scripted(&install);
    tools.dump = None;
    let (result, tools) = run_with(&install, tools);

    let failure = result.unwrap_err();
    assert_eq!(failure.stage, Stage::DumpInfo);
    assert_eq!(failure.error.code(), "CHARPAK_002");
    assert!(failure
        .to_string()
        .contains("target asset not found or undumpable"));
    assert_eq!(tools.programs(), vec!["umodel"]);
}

#[test]
fn modeling_tool_failure_line_stops_the_run() {
    let install = TestInstall::new();
    let mut tools = scripted(&install);
    tools.export_log =
        vec!["FAIL: unknown material name 'hair', valid names are: ram_body ram_face".to_string()];
    let (result, tools) = run_with(&install, tools);

    let failure = result.unwrap_err();
    assert_eq!(failure.stage, Stage::ExportMesh);
    assert!(matches!(
        failure.error,
        PipelineError::ToolReportedFailure { .. }
    ));
    assert!(failure.to_string().contains("unknown material name 'hair'"));
    assert_eq!(tools.programs(), vec!["umodel", "blender"]);
}

#[test]
fn chunk_line_must_cover_every_slot() {
    let install = TestInstall::new();
    let mut tools = scripted(&install);
    tools.chunk_line = "CHUNKING:1".to_string();
    let (result, _) = run_with(&install, tools);

    let failure = result.unwrap_err();
    assert_eq!(failure.stage, Stage::ExportMesh);
    assert_eq!(failure.error.code(), "CHARPAK_006");
}

#[test]
fn import_without_package_stops_before_cook() {
    let install = TestInstall::new();
    let mut tools = scripted(&install);
    tools.import_writes_package = false;
    let (result, tools) = run_with(&install, tools);

    let failure = result.unwrap_err();
    assert_eq!(failure.stage, Stage::ImportMesh);
    assert!(matches!(failure.error, PipelineError::OutputNotFound { .. }));
    assert_eq!(tools.calls().len(), 3);
    assert!(!install.game().installed_pak(MOD_NAME).exists());
}

#[test]
fn import_without_success_marker_fails() {
    let install = TestInstall::new();
    let mut tools = scripted(&install);
    tools.import_reports_success = false;
    let (result, _) = run_with(&install, tools);

    let failure = result.unwrap_err();
    assert_eq!(failure.stage, Stage::ImportMesh);
    assert_eq!(failure.error.code(), "CHARPAK_004");
}

#[test]
fn cook_exit_status_is_reported() {
    let install = TestInstall::new();
    let mut tools = scripted(&install);
    tools.cook_exit = Some(3);
    let (result, tools) = run_with(&install, tools);

    let failure = result.unwrap_err();
    assert_eq!(failure.stage, Stage::Cook);
    assert!(matches!(failure.error, PipelineError::ToolFailed { .. }));
    assert!(failure.to_string().contains("exited with status 3"));
    assert!(!tools.programs().contains(&"UnrealPak".to_string()));
}

#[test]
fn held_lock_rejects_run() {
    let install = TestInstall::new();
    fs::create_dir_all(&install.work_dir).unwrap();
    let _held = RunLock::acquire(&install.work().lock_file(), &install.work_dir).unwrap();

    let (result, tools) = run_with(&install, scripted(&install));
    let failure = result.unwrap_err();
    assert_eq!(failure.stage, Stage::Validate);
    assert!(matches!(failure.error, PipelineError::RunInProgress(_)));
    assert!(tools.calls().is_empty());
}

#[test]
fn missing_tool_is_a_config_error() {
    let install = TestInstall::new();
    let mut paths = install.placeholder_tools();
    paths.unreal_pak = install.path().join("tools").join("missing");
    let tools = Arc::new(scripted(&install));
    let pipeline = Pipeline::with_runner(install.config(paths), tools.clone());

    let failure = pipeline.run(&install.target(), &NoProgress).unwrap_err();
    assert_eq!(failure.stage, Stage::Validate);
    assert_eq!(failure.error.code(), "CHARPAK_001");
    assert!(tools.calls().is_empty());
}

#[test]
fn cancel_takes_effect_at_next_stage() {
    let install = TestInstall::new();
    let cancel = CancelToken::new();
    let mut tools = scripted(&install);
    tools.cancel_after_export = Some(cancel.clone());
    let tools = Arc::new(tools);
    let pipeline = pipeline(&install, tools.clone()).with_cancel_token(cancel);

    let failure = pipeline.run(&install.target(), &NoProgress).unwrap_err();
    assert_eq!(failure.stage, Stage::SetupProject);
    assert!(matches!(failure.error, PipelineError::Cancelled));
    assert_eq!(tools.programs(), vec!["umodel", "blender"]);
}

#[test]
fn spawned_run_reports_progress_then_result() {
    let install = TestInstall::new();
    let tools = Arc::new(scripted(&install));
    let handle = spawn_run(pipeline(&install, tools), install.target());

    let mut seen = Vec::new();
    let result = handle.wait(|index, label| seen.push((index, label)));
    result.unwrap();

    let expected: Vec<(usize, &str)> = Stage::ALL.iter().map(|s| (s.index(), s.label())).collect();
    assert_eq!(seen, expected);
}

#[test]
fn run_events_serialize_stage_order() {
    let install = TestInstall::new();
    let tools = Arc::new(scripted(&install));
    let handle = spawn_run(pipeline(&install, tools), install.target());

    let mut stages = Vec::new();
    for event in handle.events().iter() {
        match event {
            RunEvent::Stage { index, .. } => stages.push(index),
            RunEvent::Finished(result) => {
                assert!(result.is_ok());
                break;
            }
        }
    }
    assert_eq!(stages, (0..Stage::ALL.len()).collect::<Vec<_>>());
}

#[test]
fn dump_info_alone_writes_details() {
    let install = TestInstall::new();
    let tools = Arc::new(scripted(&install));
    let pipeline = pipeline(&install, tools.clone());
    let asset = AssetPath::parse(ASSET).unwrap();

    let info = pipeline.dump_info(&asset).unwrap();
    let expected =
        SlotInfo::new(vec![Slot::new("ram_body", 1), Slot::new("ram_face", -1)]).unwrap();
    assert_eq!(info, expected);
    assert_eq!(
        fs::read_to_string(install.work().details_file(&asset)).unwrap(),
        DETAILS_WIRE
    );
    assert_eq!(tools.programs(), vec!["umodel"]);
}
