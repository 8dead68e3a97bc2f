//! Chunks command implementation
//!
//! Canonicalizes a mesh description against a slot-info file and prints the
//! `CHUNKING:` line. The modeling-tool hook can delegate to this command, so
//! failures are printed as `FAIL:` lines on stdout, the same as the hook's own.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use charpak_pipeline::extract::load_slot_info;
use charpak_spec::canonicalize::canonicalize_mesh;
use charpak_spec::partition::mesh_chunk_counts;
use charpak_spec::{ChunkCounts, MeshModel};
use tracing::info;

/// Run the chunks command.
///
/// # Arguments
///
/// * `mesh_path` - Mesh description JSON exported by the hook
/// * `info_path` - Slot-info file written by the dump stage
/// * `bone_limit` - Maximum bone groups per chunk
/// * `write` - Where to write the canonicalized mesh, if anywhere
pub fn run(
    mesh_path: &str,
    info_path: &str,
    bone_limit: usize,
    write: Option<&str>,
) -> Result<ExitCode> {
    let text = std::fs::read_to_string(mesh_path)
        .with_context(|| format!("failed to read {}", mesh_path))?;
    let mut mesh = MeshModel::from_json(&text).with_context(|| format!("invalid mesh {}", mesh_path))?;
    let slot_info = load_slot_info(Path::new(info_path))?;

    match compute(&mut mesh, &slot_info.names(), bone_limit) {
        Ok(counts) => {
            if let Some(out) = write {
                std::fs::write(out, mesh.to_json_pretty()?)
                    .with_context(|| format!("failed to write {}", out))?;
            }
            println!("{}", counts.marker_line());
            Ok(ExitCode::SUCCESS)
        }
        Err(message) => {
            println!("FAIL: {}", message);
            Ok(ExitCode::from(1))
        }
    }
}

/// Canonicalizes `mesh` in place and computes its chunk counts.
pub fn compute(mesh: &mut MeshModel, canonical: &[&str], bone_limit: usize) -> Result<ChunkCounts, String> {
    let outcome = canonicalize_mesh(mesh, canonical).map_err(|e| e.to_string())?;
    if outcome.reordered() {
        info!("Reordered material slots to {}", canonical.join(", "));
    }

    let counts = mesh_chunk_counts(mesh, bone_limit).map_err(|e| e.to_string())?;
    ChunkCounts::new(counts).map_err(|e| e.to_string())
}
