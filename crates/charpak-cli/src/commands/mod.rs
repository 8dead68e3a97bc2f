//! CLI command implementations

pub mod chunks;
pub mod config;
pub mod doctor;
pub mod dump;
pub mod list;
pub mod outlines;
pub mod run;
