//! charpak command-line front end.
//!
//! The binary in `main.rs` only parses arguments; settings, logging setup and
//! the command implementations live here so they can be tested.

pub mod commands;
pub mod logging;
pub mod settings;
