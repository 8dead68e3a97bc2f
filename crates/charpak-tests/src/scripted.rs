//! In-process stand-ins for the external tools.
//!
//! [`ScriptedTools`] recognises each tool by its file name and writes the
//! files the real tool would, so a whole pipeline run can be exercised
//! without spawning anything. Every knob defaults to a well-behaved tool.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use charpak_pipeline::{CancelToken, CommandLine, ProcessError, ProcessRunner, WorkLayout};
use charpak_spec::AssetPath;

use crate::fixtures::{DUMP_JSON, PACKAGE_LISTING};

/// Scripted behaviour of every tool for one run.
pub struct ScriptedTools {
    work: WorkLayout,
    asset: AssetPath,
    /// Extractor output; `None` writes nothing, as for an unknown asset.
    pub dump: Option<String>,
    /// What the extractor prints for `-list`.
    pub listing: String,
    /// Lines the modeling tool prints before its chunk line.
    pub export_log: Vec<String>,
    /// The modeling tool's marker line.
    pub chunk_line: String,
    pub import_writes_package: bool,
    pub import_reports_success: bool,
    /// Exit status of the cook, `None` for success.
    pub cook_exit: Option<i32>,
    /// Cancelled as soon as the export finishes.
    pub cancel_after_export: Option<CancelToken>,
    calls: Mutex<Vec<CommandLine>>,
}

impl ScriptedTools {
    pub fn new(work: WorkLayout, asset: &AssetPath) -> Self {
        Self {
            work,
            asset: asset.clone(),
            dump: Some(DUMP_JSON.to_string()),
            listing: PACKAGE_LISTING.to_string(),
            export_log: Vec::new(),
            chunk_line: "CHUNKING:1,2".to_string(),
            import_writes_package: true,
            import_reports_success: true,
            cook_exit: None,
            cancel_after_export: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every command run so far, in order.
    pub fn calls(&self) -> Vec<CommandLine> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }

    /// File names of the programs run so far, in order.
    pub fn programs(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|c| program_name(c.program()))
            .collect()
    }

    fn extractor(&self, argv: &[String]) -> Result<String, ProcessError> {
        if argv.first().map(String::as_str) == Some("-list") {
            return Ok(self.listing.clone());
        }
        if let Some(dump) = &self.dump {
            write(&self.work.dump_json(&self.asset), dump.as_bytes())?;
        }
        Ok(String::new())
    }

    fn blender(&self) -> Result<String, ProcessError> {
        write(&self.work.fbx(&self.asset), b"FBX")?;
        if let Some(token) = &self.cancel_after_export {
            token.cancel();
        }

        let mut stdout = String::from("Blender 3.0.0\n");
        for line in &self.export_log {
            stdout.push_str(line);
            stdout.push('\n');
        }
        stdout.push_str(&self.chunk_line);
        stdout.push('\n');
        Ok(stdout)
    }

    fn import(&self) -> Result<String, ProcessError> {
        if self.import_writes_package {
            write(&self.work.imported_uasset(&self.asset), b"imported")?;
        }
        Ok(if self.import_reports_success {
            format!("LogPython: Successfully exported {}\n", self.asset.name())
        } else {
            "LogPython: Error: import failed\n".to_string()
        })
    }

    fn cook(&self, program: &str) -> Result<String, ProcessError> {
        if let Some(exit_code) = self.cook_exit {
            return Err(ProcessError::NonZeroExit {
                program: program.to_string(),
                exit_code,
            });
        }
        let [uasset, uexp] = self.work.cooked_files(&self.asset);
        write(&uasset, b"cooked uasset")?;
        write(&uexp, b"cooked uexp")?;
        Ok(String::new())
    }

    fn pak(&self, argv: &[String]) -> Result<String, ProcessError> {
        let pak = argv.first().ok_or_else(|| ProcessError::NonZeroExit {
            program: "UnrealPak".to_string(),
            exit_code: 1,
        })?;
        write(Path::new(pak), b"PAK")?;
        Ok(String::new())
    }
}

impl ProcessRunner for ScriptedTools {
    fn run(
        &self,
        command: &CommandLine,
        capture_output: bool,
        _timeout: Option<Duration>,
    ) -> Result<String, ProcessError> {
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .push(command.clone());

        let program = program_name(command.program());
        let stdout = match (program.as_str(), command) {
            ("umodel", _) => self.extractor(&command.argv()),
            ("blender", _) => self.blender(),
            ("UE4Editor-Cmd", CommandLine::Raw { .. }) => self.import(),
            ("UE4Editor-Cmd", CommandLine::Args { .. }) => self.cook(&program),
            ("UnrealPak", _) => self.pak(&command.argv()),
            _ => Err(ProcessError::SpawnFailed {
                program: program.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such tool"),
            }),
        }?;

        Ok(if capture_output { stdout } else { String::new() })
    }
}

fn program_name(program: &Path) -> String {
    program
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn write(path: &Path, contents: &[u8]) -> Result<(), ProcessError> {
    let result = path
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|()| fs::write(path, contents));
    result.map_err(|source| ProcessError::SpawnFailed {
        program: path.display().to_string(),
        source,
    })
}
