//! External process adapter.
//!
//! Every tool the pipeline drives goes through [`ProcessRunner::run`]. The
//! adapter logs the full command line of every invocation, logs captured
//! stdout/stderr on failure, and reports failures as a [`ProcessError`]
//! instead of panicking across the pipeline.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::error::ProcessError;

/// Poll interval while waiting on a child with a timeout.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A command to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandLine {
    /// Program plus an argument vector, passed through unmodified.
    Args { program: PathBuf, args: Vec<OsString> },
    /// Program plus one raw argument string whose quoting must reach the
    /// program untouched (the engine parses `-Flag="a b c"` as one token).
    Raw { program: PathBuf, raw_args: String },
}

impl CommandLine {
    /// Starts an argument-vector command.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self::Args {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Creates a raw command line.
    pub fn raw(program: impl Into<PathBuf>, raw_args: impl Into<String>) -> Self {
        Self::Raw {
            program: program.into(),
            raw_args: raw_args.into(),
        }
    }

    /// Appends an argument. Has no effect on raw command lines.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        if let Self::Args { args, .. } = &mut self {
            args.push(arg.as_ref().to_os_string());
        }
        self
    }

    /// Appends several arguments. Has no effect on raw command lines.
    pub fn args<I, S>(mut self, new_args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        if let Self::Args { args, .. } = &mut self {
            args.extend(new_args.into_iter().map(|a| a.as_ref().to_os_string()));
        }
        self
    }

    pub fn program(&self) -> &Path {
        match self {
            Self::Args { program, .. } | Self::Raw { program, .. } => program,
        }
    }

    /// Argument vector as strings (raw command lines yield one element).
    pub fn argv(&self) -> Vec<String> {
        match self {
            Self::Args { args, .. } => args
                .iter()
                .map(|a| a.to_string_lossy().into_owned())
                .collect(),
            Self::Raw { raw_args, .. } => vec![raw_args.clone()],
        }
    }

    fn to_command(&self) -> Command {
        match self {
            Self::Args { program, args } => {
                let mut cmd = Command::new(program);
                cmd.args(args);
                cmd
            }
            Self::Raw { program, raw_args } => raw_command(program, raw_args),
        }
    }
}

#[cfg(windows)]
fn raw_command(program: &Path, raw_args: &str) -> Command {
    use std::os::windows::process::CommandExt;

    let mut cmd = Command::new(program);
    cmd.raw_arg(raw_args);
    cmd
}

#[cfg(not(windows))]
fn raw_command(program: &Path, raw_args: &str) -> Command {
    let program = program.to_string_lossy().replace('\'', r"'\''");
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(format!("'{}' {}", program, raw_args));
    cmd
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}", self.program().to_string_lossy())?;
        for arg in self.argv() {
            write!(f, ", {:?}", arg)?;
        }
        f.write_str("]")
    }
}

/// Runs external commands.
///
/// [`SystemRunner`] is the real implementation; stage tests substitute
/// scripted runners.
pub trait ProcessRunner: Send + Sync {
    /// Runs `command` to completion.
    ///
    /// Returns stdout (with `\r\n` collapsed to `\n`) if `capture_output` is
    /// set, otherwise an empty string.
    fn run(
        &self,
        command: &CommandLine,
        capture_output: bool,
        timeout: Option<Duration>,
    ) -> Result<String, ProcessError>;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(
        &self,
        command: &CommandLine,
        capture_output: bool,
        timeout: Option<Duration>,
    ) -> Result<String, ProcessError> {
        let program = command.program().display().to_string();
        info!("runProcess: {}", command);

        let mut cmd = command.to_command();
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let child = cmd.spawn().map_err(|source| {
            error!("Process failed to start: {}: {}", program, source);
            ProcessError::SpawnFailed {
                program: program.clone(),
                source,
            }
        })?;

        let finished = wait_with_timeout(child, timeout);
        let stdout = normalize_output(&finished.stdout);
        let stderr = normalize_output(&finished.stderr);

        let status = match finished.exit {
            Exit::Status(status) => status,
            Exit::TimedOut(limit) => {
                error!(
                    "{}",
                    process_log(
                        &format!(
                            "Process timed out after {:.1} seconds: {}",
                            limit.as_secs_f64(),
                            command
                        ),
                        &stdout,
                        &stderr
                    )
                );
                return Err(ProcessError::Timeout {
                    program,
                    timeout: limit,
                });
            }
            Exit::Lost(source) => {
                error!(
                    "{}",
                    process_log(
                        &format!("Failed to wait on process: {}: {}", command, source),
                        &stdout,
                        &stderr
                    )
                );
                return Err(ProcessError::WaitFailed { program, source });
            }
        };

        if !status.success() {
            let exit_code = status.code().unwrap_or(-1);
            error!(
                "{}",
                process_log(
                    &format!("Process returned with non zero exit code {}", exit_code),
                    &stdout,
                    &stderr
                )
            );
            return Err(ProcessError::NonZeroExit { program, exit_code });
        }

        debug!(
            "{}",
            process_log("Process returned successfully", &stdout, &stderr)
        );

        Ok(if capture_output { stdout } else { String::new() })
    }
}

/// Decodes tool output and collapses `\r\n` to `\n`.
pub fn normalize_output(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).replace("\r\n", "\n")
}

/// Formats a diagnostic log entry for a finished process.
fn process_log(header: &str, stdout: &str, stderr: &str) -> String {
    [
        header,
        "__________ STDOUT: __________",
        stdout,
        "__________ STDERR: __________",
        stderr,
    ]
    .join("\n")
}

/// How long reader threads may keep draining after a kill. A tool that
/// handed its pipes to a surviving grandchild would otherwise block forever.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

enum Exit {
    Status(ExitStatus),
    /// Killed after running past the configured limit.
    TimedOut(Duration),
    /// Polling failed and the child was killed.
    Lost(std::io::Error),
}

struct Finished {
    exit: Exit,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

/// Waits for `child`, draining both pipes on reader threads so a chatty tool
/// cannot block on a full pipe. Output captured before a kill is kept.
fn wait_with_timeout(mut child: Child, timeout: Option<Duration>) -> Finished {
    let stdout_reader = drain(child.stdout.take());
    let stderr_reader = drain(child.stderr.take());
    let start = Instant::now();

    let exit = loop {
        match child.try_wait() {
            Ok(Some(status)) => break Exit::Status(status),
            Ok(None) => {
                if let Some(limit) = timeout {
                    if start.elapsed() > limit {
                        let _ = child.kill();
                        let _ = child.wait();
                        break Exit::TimedOut(limit);
                    }
                }
                std::thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                error!("Failed to poll child process: {}", e);
                let _ = child.kill();
                match child.wait() {
                    Ok(status) => break Exit::Status(status),
                    Err(_) => break Exit::Lost(e),
                }
            }
        }
    };

    let (stdout, stderr) = match exit {
        Exit::Status(_) => (join(stdout_reader), join(stderr_reader)),
        _ => {
            let deadline = Instant::now() + DRAIN_GRACE;
            (
                join_by(stdout_reader, deadline),
                join_by(stderr_reader, deadline),
            )
        }
    };

    Finished {
        exit,
        stdout,
        stderr,
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    })
}

fn join(reader: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

/// Like [`join`], but gives up on a reader still blocked at `deadline`.
fn join_by(reader: Option<JoinHandle<Vec<u8>>>, deadline: Instant) -> Vec<u8> {
    let Some(handle) = reader else {
        return Vec::new();
    };
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            return Vec::new();
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    handle.join().unwrap_or_default()
}
