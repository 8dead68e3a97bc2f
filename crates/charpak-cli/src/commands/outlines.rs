//! Outlines command implementation
//!
//! Prints the per-chunk outline sequence the engine hook applies after
//! import.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use charpak_pipeline::extract::load_slot_info;
use charpak_spec::outline::{expand, format_sequence};
use charpak_spec::{ChunkCounts, SlotInfo};

/// Run the outlines command.
pub fn run(info_path: &str, chunks_csv: &str) -> Result<ExitCode> {
    let slot_info = load_slot_info(Path::new(info_path))?;
    println!("{}", sequence(&slot_info, chunks_csv)?);
    Ok(ExitCode::SUCCESS)
}

/// Expands the slot outline types over a comma-separated chunk count list.
pub fn sequence(slot_info: &SlotInfo, chunks_csv: &str) -> Result<String> {
    let counts = ChunkCounts::parse_csv(chunks_csv).context("invalid chunk counts")?;
    let flat = expand(&slot_info.outline_types(), counts.as_slice())?;
    Ok(format_sequence(&flat))
}

#[cfg(test)]
mod tests {
    use super::*;
    use charpak_spec::Slot;

    fn info() -> SlotInfo {
        SlotInfo::new(vec![Slot::new("body", 1), Slot::new("face", -1)]).unwrap()
    }

    #[test]
    fn test_sequence_expands_per_chunk() {
        assert_eq!(sequence(&info(), "2,1").unwrap(), "1,1,-1");
    }

    #[test]
    fn test_sequence_length_mismatch() {
        let err = sequence(&info(), "2").unwrap_err();
        assert_eq!(err.to_string(), "2 outline types but 1 chunk counts");
    }

    #[test]
    fn test_sequence_rejects_garbage() {
        assert!(sequence(&info(), "a,b").is_err());
    }
}
