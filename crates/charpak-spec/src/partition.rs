//! Bone-chunk partitioning.
//!
//! The engine cannot skin one draw call against more than [`BONE_LIMIT`]
//! bones, so its importer splits every material slot into chunks. The engine
//! hook needs to know how many chunks each slot will become, which is
//! estimated here with the same greedy packing the importer is matched
//! against. The chunk *count* is load-bearing, so the tie-break rules below
//! must not change.

use std::collections::BTreeSet;

use crate::error::PartitionError;
use crate::mesh::MeshModel;

/// Maximum distinct bone groups per chunk.
pub const BONE_LIMIT: usize = 256;

/// Set of bone-group identifiers.
pub type BoneSet = BTreeSet<usize>;

/// The faces of one canonical slot and the bone groups they reference.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FaceGroup {
    /// Bone-group set of every face, in native face order.
    pub faces: Vec<BoneSet>,
    /// Distinct bone groups referenced by the slot.
    pub bones: BoneSet,
}

impl FaceGroup {
    /// Builds a group from per-face bone sets; the slot's bone set is their union.
    pub fn new(faces: Vec<BoneSet>) -> Self {
        let bones = faces.iter().flatten().copied().collect();
        Self { faces, bones }
    }

    /// Collects the face group of material slot `slot`.
    ///
    /// The slot's vertices are the vertices of every face assigned to it. Its
    /// faces are all faces (in native order) whose vertices lie entirely in
    /// that vertex set. Only vertex groups named as bone groups count.
    pub fn from_mesh_slot(mesh: &MeshModel, slot: usize) -> Self {
        let verts: BTreeSet<usize> = mesh
            .faces
            .iter()
            .filter(|f| f.material == slot)
            .flat_map(|f| f.vertices.iter().copied())
            .collect();

        let bones_of = |vertex: usize| -> Vec<usize> {
            mesh.vertices
                .get(vertex)
                .map(|v| {
                    v.groups
                        .iter()
                        .copied()
                        .filter(|&g| mesh.is_bone_group(g))
                        .collect()
                })
                .unwrap_or_default()
        };

        let bones = verts.iter().flat_map(|&v| bones_of(v)).collect();

        let faces = mesh
            .faces
            .iter()
            .filter(|f| !f.vertices.is_empty() && f.vertices.iter().all(|v| verts.contains(v)))
            .map(|f| f.vertices.iter().flat_map(|&v| bones_of(v)).collect())
            .collect();

        Self { faces, bones }
    }

    /// Number of distinct bone groups referenced by the slot.
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }
}

/// A set of faces packed together under the bone limit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Chunk {
    /// Indices into [`FaceGroup::faces`].
    pub faces: Vec<usize>,
    pub bones: BoneSet,
}

/// Packs the faces of a group into chunks, greedily.
///
/// Each face joins the existing chunk that needs the fewest new bone groups to
/// take it while staying within `limit`; ties go to the earliest chunk and a
/// chunk needing no new bone groups is taken immediately. A face no chunk can
/// take starts a new chunk.
pub fn partition_chunks(group: &FaceGroup, limit: usize) -> Result<Vec<Chunk>, PartitionError> {
    let mut chunks: Vec<Chunk> = Vec::new();

    for (face_idx, face_bones) in group.faces.iter().enumerate() {
        if face_bones.len() > limit {
            return Err(PartitionError::FaceExceedsLimit {
                face: face_idx,
                bones: face_bones.len(),
                limit,
            });
        }

        let mut target: Option<usize> = None;
        let mut added_count = usize::MAX;

        for (chunk_idx, chunk) in chunks.iter().enumerate() {
            let would_add = face_bones.difference(&chunk.bones).count();
            if would_add < added_count && chunk.bones.len() + would_add <= limit {
                added_count = would_add;
                target = Some(chunk_idx);
                if added_count == 0 {
                    break;
                }
            }
        }

        match target {
            Some(chunk_idx) => {
                let chunk = &mut chunks[chunk_idx];
                chunk.faces.push(face_idx);
                chunk.bones.extend(face_bones.iter().copied());
            }
            None => chunks.push(Chunk {
                faces: vec![face_idx],
                bones: face_bones.clone(),
            }),
        }
    }

    Ok(chunks)
}

/// Number of chunks the slot must be split into.
///
/// Slots referencing fewer than `limit` bone groups are never split; the
/// engine side assumes exactly that.
pub fn partition(group: &FaceGroup, limit: usize) -> Result<usize, PartitionError> {
    if group.bone_count() < limit {
        return Ok(1);
    }
    let chunks = partition_chunks(group, limit)?;
    Ok(chunks.len().max(1))
}

/// Chunk count of every material slot of a canonicalized mesh, in slot order.
pub fn mesh_chunk_counts(mesh: &MeshModel, limit: usize) -> Result<Vec<usize>, PartitionError> {
    mesh.validate()?;
    (0..mesh.materials.len())
        .map(|slot| partition(&FaceGroup::from_mesh_slot(mesh, slot), limit))
        .collect()
}
