//! charpak core data model and slot algorithms
//!
//! This crate holds everything in the conversion pipeline that does not talk
//! to an external tool:
//!
//! - [`asset_path`]: normalized `Chara/...` asset paths
//! - [`slot_info`]: the canonical slot list and its two-line text contract
//! - [`mesh`]: the mesh description exported by the modeling-tool hook
//! - [`canonicalize`]: matching and reordering artist material slots
//! - [`partition`]: greedy bone-chunk partitioning per slot
//! - [`outline`]: per-chunk outline type expansion
//! - [`chunking`]: the `CHUNKING:` line carrying chunk counts between tools
//! - [`listing`]: the extractor's package listing and per-character manifests
//!
//! # Example
//!
//! ```
//! use charpak_spec::canonicalize::canonicalize_mesh;
//! use charpak_spec::mesh::{Face, MeshModel};
//! use charpak_spec::partition::{mesh_chunk_counts, BONE_LIMIT};
//! use charpak_spec::ChunkCounts;
//!
//! let mut mesh = MeshModel {
//!     materials: vec!["face".into(), "body".into()],
//!     faces: vec![Face::new(0, []), Face::new(1, [])],
//!     ..Default::default()
//! };
//! canonicalize_mesh(&mut mesh, &["body", "face"]).unwrap();
//! assert_eq!(mesh.materials, vec!["body", "face"]);
//!
//! let counts = ChunkCounts::new(mesh_chunk_counts(&mesh, BONE_LIMIT).unwrap()).unwrap();
//! assert_eq!(counts.marker_line(), "CHUNKING:1,1");
//! ```

pub mod asset_path;
pub mod canonicalize;
pub mod chunking;
pub mod error;
pub mod listing;
pub mod mesh;
pub mod outline;
pub mod partition;
pub mod slot_info;

pub use asset_path::AssetPath;
pub use canonicalize::{canonicalize_mesh, CanonicalizationPlan, CanonicalizeOutcome};
pub use chunking::{ChunkCounts, CHUNKING_MARKER};
pub use error::{
    AssetPathError, CanonicalizeError, MeshError, OutlineError, ParseError, PartitionError,
};
pub use listing::{CharacterManifest, MeshRole};
pub use mesh::{MeshModel, BONE_GROUP_PREFIX};
pub use partition::{partition, FaceGroup, BONE_LIMIT};
pub use slot_info::{Slot, SlotInfo, OUTLINE_UNSET};
