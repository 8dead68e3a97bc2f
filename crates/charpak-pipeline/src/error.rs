//! Error types for the conversion pipeline.

use std::path::{Path, PathBuf};
use std::time::Duration;

use charpak_spec::{AssetPathError, CanonicalizeError, OutlineError, ParseError, PartitionError};
use thiserror::Error;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Ways an external process invocation can fail.
///
/// Full stdout/stderr is written to the log by the process adapter; these only
/// carry the short cause.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The process ran past its timeout and was killed.
    #[error("{program} timed out after {:.1} seconds", .timeout.as_secs_f64())]
    Timeout { program: String, timeout: Duration },

    /// The process could not be started (missing binary, permissions).
    #[error("failed to start {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process could not be waited on; it has been killed.
    #[error("lost track of {program}: {source}")]
    WaitFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process exited with a non-zero status.
    #[error("{program} exited with status {exit_code}")]
    NonZeroExit { program: String, exit_code: i32 },
}

/// Errors that can occur while running the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Install paths, hook scripts or key material are unusable.
    #[error("bad config: {0}")]
    ConfigInvalid(String),

    /// The target asset, project file or mod name is unusable.
    #[error("bad target: {0}")]
    TargetInvalid(String),

    /// An external tool could not be run to a zero exit.
    #[error("{tool} failed, check the log for details: {source}")]
    ToolFailed {
        tool: &'static str,
        #[source]
        source: ProcessError,
    },

    /// An external tool exited cleanly but reported a problem on stdout.
    #[error("{tool} reported a failure:\n{message}")]
    ToolReportedFailure { tool: &'static str, message: String },

    /// An external tool exited cleanly but did not produce its output.
    #[error("expected output not found: {}", .path.display())]
    OutputNotFound { path: PathBuf },

    /// A text or JSON contract from a tool could not be parsed.
    #[error("failed to parse {what}: {message}")]
    ParseFailure { what: String, message: String },

    /// The artist mesh has a material slot the original asset does not.
    #[error(transparent)]
    Canonicalize(#[from] CanonicalizeError),

    /// Chunk partitioning failed.
    #[error(transparent)]
    Partition(#[from] PartitionError),

    /// Another run holds the working directory lock.
    #[error("another run is already using working directory {}", .0.display())]
    RunInProgress(PathBuf),

    /// The run was cancelled between stages.
    #[error("run cancelled")]
    Cancelled,

    /// Filesystem error while preparing or collecting stage files.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Creates a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigInvalid(message.into())
    }

    /// Creates a target error.
    pub fn target(message: impl Into<String>) -> Self {
        Self::TargetInvalid(message.into())
    }

    /// Creates a parse failure.
    pub fn parse(what: impl Into<String>, message: impl ToString) -> Self {
        Self::ParseFailure {
            what: what.into(),
            message: message.to_string(),
        }
    }

    /// Creates an I/O error bound to a path.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::ConfigInvalid(_) => "CHARPAK_001",
            PipelineError::TargetInvalid(_) => "CHARPAK_002",
            PipelineError::ToolFailed { .. } => "CHARPAK_003",
            PipelineError::ToolReportedFailure { .. } => "CHARPAK_004",
            PipelineError::OutputNotFound { .. } => "CHARPAK_005",
            PipelineError::ParseFailure { .. } => "CHARPAK_006",
            PipelineError::Canonicalize(_) | PipelineError::Partition(_) => "CHARPAK_007",
            PipelineError::RunInProgress(_) => "CHARPAK_008",
            PipelineError::Cancelled => "CHARPAK_009",
            PipelineError::Io { .. } => "CHARPAK_010",
        }
    }
}

impl From<AssetPathError> for PipelineError {
    fn from(err: AssetPathError) -> Self {
        Self::TargetInvalid(err.to_string())
    }
}

impl From<OutlineError> for PipelineError {
    fn from(err: OutlineError) -> Self {
        Self::parse("chunk counts", err)
    }
}

impl From<ParseError> for PipelineError {
    fn from(err: ParseError) -> Self {
        Self::parse("tool output", err)
    }
}

/// Fails with [`PipelineError::OutputNotFound`] if `path` does not exist.
pub(crate) fn expect_output(path: &Path) -> PipelineResult<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(PipelineError::OutputNotFound {
            path: path.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_not_found_display() {
        let err = PipelineError::OutputNotFound {
            path: PathBuf::from("work/Unreal_Fast_Build/Content/x.uasset"),
        };
        assert!(err.to_string().starts_with("expected output not found"));
        assert_eq!(err.code(), "CHARPAK_005");
    }

    #[test]
    fn test_tool_failed_display() {
        let err = PipelineError::ToolFailed {
            tool: "Blender",
            source: ProcessError::Timeout {
                program: "blender".to_string(),
                timeout: Duration::from_secs(30),
            },
        };
        assert!(err.to_string().contains("Blender failed"));
        assert!(err.to_string().contains("30.0 seconds"));
    }

    #[test]
    fn test_sub_second_timeout_display() {
        let err = ProcessError::Timeout {
            program: "umodel".to_string(),
            timeout: Duration::from_millis(500),
        };
        assert_eq!(err.to_string(), "umodel timed out after 0.5 seconds");
    }

    #[test]
    fn test_asset_path_error_is_target_invalid() {
        let err: PipelineError = AssetPathError::Empty.into();
        assert!(matches!(err, PipelineError::TargetInvalid(_)));
    }

    #[test]
    fn test_expect_output() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.fbx");
        assert!(matches!(
            expect_output(&missing),
            Err(PipelineError::OutputNotFound { .. })
        ));
        std::fs::write(&missing, b"fbx").unwrap();
        assert!(expect_output(&missing).is_ok());
    }
}
