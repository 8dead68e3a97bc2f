//! Error types for asset paths, wire formats and the slot algorithms.

use thiserror::Error;

/// Errors produced while normalizing a target asset path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetPathError {
    /// The path is empty after trimming.
    #[error("target asset path cannot be empty")]
    Empty,

    /// The path uses Windows separators.
    #[error("target asset contains a '\\', please use posix styled '/' paths instead: '{0}'")]
    Backslash(String),

    /// The path is not rooted under the character folder.
    #[error("target asset must be relative to pak content, e.g. Chara/RAM/Costume01/Mesh/ram_body: '{0}'")]
    MissingCharaRoot(String),

    /// The path contains a prohibited symbol or a traversal segment.
    #[error("target asset contains a prohibited '{symbol}': '{path}'")]
    ProhibitedSymbol { symbol: &'static str, path: String },

    /// The path has an empty directory or leaf segment.
    #[error("target asset has an empty path segment: '{0}'")]
    EmptySegment(String),
}

/// Errors produced while reading one of the text contracts exchanged with the
/// external tools (slot-info file, chunk-count line).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The slot-info text does not have its two lines.
    #[error("slot info must have 2 lines, found {found}")]
    MissingLines { found: usize },

    /// The slot-info text lists no slots.
    #[error("slot info lists no material slots")]
    NoSlots,

    /// A slot name is empty or contains a delimiter.
    #[error("invalid slot name '{0}'")]
    InvalidSlotName(String),

    /// A slot name appears more than once.
    #[error("duplicate slot name '{0}'")]
    DuplicateSlot(String),

    /// A `name:type` pair is malformed.
    #[error("malformed slot entry '{0}', expected name:type")]
    MalformedEntry(String),

    /// The two slot-info lines disagree on names or order.
    #[error("slot info line 2 does not match line 1 at position {index}: expected '{expected}', found '{found}'")]
    LineMismatch {
        index: usize,
        expected: String,
        found: String,
    },

    /// No chunk-count marker line was present.
    #[error("chunk counts marker '{marker}' not found in tool output")]
    MarkerNotFound { marker: &'static str },

    /// A chunk count is not a positive integer.
    #[error("invalid chunk count '{0}', expected an integer >= 1")]
    InvalidChunkCount(String),

    /// Wrong number of chunk counts for the canonical slot list.
    #[error("expected {expected} chunk counts, found {found}")]
    ChunkCountLength { expected: usize, found: usize },

    /// An object row of the extractor's package listing is malformed.
    #[error("malformed package listing row '{0}', expected index offset size class name")]
    MalformedListingRow(String),

    /// The mesh description is not valid JSON for [`crate::mesh::MeshModel`].
    #[error("failed to parse mesh description: {0}")]
    MeshJson(String),
}

/// Errors raised by the mesh model consistency check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeshError {
    /// A face references a material slot that does not exist.
    #[error("face {face} references material {material}, mesh has {slots} slots")]
    MaterialOutOfRange {
        face: usize,
        material: usize,
        slots: usize,
    },

    /// A face references a vertex that does not exist.
    #[error("face {face} references vertex {vertex}, mesh has {vertices} vertices")]
    VertexOutOfRange {
        face: usize,
        vertex: usize,
        vertices: usize,
    },

    /// A vertex references a vertex group that does not exist.
    #[error("vertex {vertex} references group {group}, mesh has {groups} groups")]
    GroupOutOfRange {
        vertex: usize,
        group: usize,
        groups: usize,
    },
}

/// Errors raised while canonicalizing artist material slots.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CanonicalizeError {
    /// An artist slot matched none of the canonical names.
    #[error("unknown material name '{name}', valid names are: {}", .valid.join(" "))]
    UnknownSlot { name: String, valid: Vec<String> },

    /// The mesh handed in for reordering is inconsistent.
    #[error(transparent)]
    InvalidMesh(#[from] MeshError),

    /// The reordered slots do not equal the canonical list.
    #[error("material slots after reorder are [{}], expected [{}]", .actual.join(", "), .expected.join(", "))]
    PostconditionFailed {
        expected: Vec<String>,
        actual: Vec<String>,
    },
}

/// Errors raised by the bone-chunk partitioner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartitionError {
    /// A single face references more bone groups than a chunk may hold.
    #[error("face {face} references {bones} bone groups, more than the per-chunk limit of {limit}")]
    FaceExceedsLimit {
        face: usize,
        bones: usize,
        limit: usize,
    },

    /// The mesh handed in for partitioning is inconsistent.
    #[error(transparent)]
    InvalidMesh(#[from] MeshError),
}

/// Errors raised by the outline index expander.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutlineError {
    #[error("{outline_types} outline types but {chunk_counts} chunk counts")]
    LengthMismatch {
        outline_types: usize,
        chunk_counts: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_slot_lists_valid_names() {
        let err = CanonicalizeError::UnknownSlot {
            name: "Hair".to_string(),
            valid: vec!["body".to_string(), "face".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("'Hair'"));
        assert!(msg.contains("body face"));
    }

    #[test]
    fn test_face_exceeds_limit_display() {
        let err = PartitionError::FaceExceedsLimit {
            face: 7,
            bones: 300,
            limit: 256,
        };
        assert!(err.to_string().contains("face 7"));
        assert!(err.to_string().contains("256"));
    }
}
