//! charpak end-to-end test infrastructure
//!
//! - [`fixtures`]: a temporary game install, project file and work directory
//! - [`scripted`]: an in-process [`ProcessRunner`](charpak_pipeline::ProcessRunner)
//!   that plays every external tool and records what it was asked to run
//! - [`fake_tools`]: shell-script stand-ins for the tools, for tests that go
//!   through the real process adapter (unix only)
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p charpak-tests
//! ```

#[cfg(unix)]
pub mod fake_tools;
pub mod fixtures;
pub mod scripted;

pub use fixtures::{TestInstall, ASSET, DETAILS_WIRE, DUMP_JSON, MOD_NAME, PACKAGE_LISTING};
pub use scripted::ScriptedTools;
