//! Material slot canonicalization.
//!
//! Artists author slots in any order and may pre-split one original material
//! into several chunk slots (`body.001`, `body_2`, ...). The engine import
//! expects exactly the original slots in the original order, so every artist
//! slot is matched to a canonical slot and the mesh is reordered to match.

use crate::error::CanonicalizeError;
use crate::mesh::MeshModel;

/// Separators accepted between a canonical name and a chunk suffix.
pub const CHUNK_SEPARATORS: [char; 2] = ['.', '_'];

/// Suffix given to the slots created while reordering, before the final rename.
const TEMP_SUFFIX: &str = "_temp";

/// Returns true if an artist slot name belongs to a canonical slot.
///
/// Matching is case-insensitive. A name matches either exactly, or as the
/// canonical name followed by one separator and a non-empty suffix.
///
/// ```
/// use charpak_spec::canonicalize::matches_canonical;
///
/// assert!(matches_canonical("Body", "body"));
/// assert!(matches_canonical("body.001", "body"));
/// assert!(matches_canonical("BODY_2", "body"));
/// assert!(!matches_canonical("body.", "body"));
/// assert!(!matches_canonical("bodysuit", "body"));
/// ```
pub fn matches_canonical(artist: &str, canonical: &str) -> bool {
    let artist = artist.to_lowercase();
    let canonical = canonical.to_lowercase();
    if artist == canonical {
        return true;
    }

    let Some(rest) = artist.strip_prefix(canonical.as_str()) else {
        return false;
    };
    let mut chars = rest.chars();
    match chars.next() {
        Some(sep) if CHUNK_SEPARATORS.contains(&sep) => !chars.as_str().is_empty(),
        _ => false,
    }
}

/// Returns true if the artist slots already line up with the canonical list,
/// position by position.
pub fn is_canonical_order<A: AsRef<str>, C: AsRef<str>>(artist: &[A], canonical: &[C]) -> bool {
    artist.len() == canonical.len()
        && artist
            .iter()
            .zip(canonical)
            .all(|(a, c)| matches_canonical(a.as_ref(), c.as_ref()))
}

/// Assignment of artist slots to canonical slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalizationPlan {
    /// For each canonical slot, the artist slot indices assigned to it.
    buckets: Vec<Vec<usize>>,
    /// For each artist slot, the canonical slot it was assigned to.
    assignment: Vec<usize>,
}

impl CanonicalizationPlan {
    pub fn buckets(&self) -> &[Vec<usize>] {
        &self.buckets
    }

    /// Artist slot indices assigned to the canonical slot at `canonical`.
    pub fn bucket(&self, canonical: usize) -> &[usize] {
        self.buckets
            .get(canonical)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Canonical slot index the artist slot at `artist` was assigned to.
    pub fn canonical_of(&self, artist: usize) -> Option<usize> {
        self.assignment.get(artist).copied()
    }

    pub fn artist_slot_count(&self) -> usize {
        self.assignment.len()
    }
}

/// Assigns every artist slot to the first canonical slot it matches.
///
/// Fails on the first artist slot that matches nothing, naming it and listing
/// every canonical name. No partial plan is returned.
pub fn plan<A: AsRef<str>, C: AsRef<str>>(
    artist: &[A],
    canonical: &[C],
) -> Result<CanonicalizationPlan, CanonicalizeError> {
    let mut buckets = vec![Vec::new(); canonical.len()];
    let mut assignment = Vec::with_capacity(artist.len());

    for (artist_idx, artist_name) in artist.iter().enumerate() {
        let artist_name = artist_name.as_ref();
        let real_idx = canonical
            .iter()
            .position(|c| matches_canonical(artist_name, c.as_ref()))
            .ok_or_else(|| CanonicalizeError::UnknownSlot {
                name: artist_name.to_string(),
                valid: canonical.iter().map(|c| c.as_ref().to_string()).collect(),
            })?;
        buckets[real_idx].push(artist_idx);
        assignment.push(real_idx);
    }

    Ok(CanonicalizationPlan {
        buckets,
        assignment,
    })
}

/// What [`canonicalize_mesh`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalizeOutcome {
    /// The plan that was applied, `None` when the slots were already in
    /// canonical order and only renamed.
    pub plan: Option<CanonicalizationPlan>,
}

impl CanonicalizeOutcome {
    pub fn reordered(&self) -> bool {
        self.plan.is_some()
    }
}

/// Reorders and renames the mesh's material slots to the canonical list.
///
/// The plan is computed before anything is touched, so an unknown slot leaves
/// the mesh unchanged. When the slots already line up the reorder is skipped.
pub fn canonicalize_mesh<C: AsRef<str>>(
    mesh: &mut MeshModel,
    canonical: &[C],
) -> Result<CanonicalizeOutcome, CanonicalizeError> {
    mesh.validate()?;

    let plan = if is_canonical_order(&mesh.materials, canonical) {
        None
    } else {
        let plan = plan(&mesh.materials, canonical)?;
        apply_plan(mesh, &plan, canonical);
        Some(plan)
    };

    for (slot, name) in mesh.materials.iter_mut().zip(canonical) {
        *slot = name.as_ref().to_string();
    }

    if mesh.materials.len() != canonical.len()
        || mesh
            .materials
            .iter()
            .zip(canonical)
            .any(|(slot, name)| slot != name.as_ref())
    {
        return Err(CanonicalizeError::PostconditionFailed {
            expected: canonical.iter().map(|c| c.as_ref().to_string()).collect(),
            actual: mesh.materials.clone(),
        });
    }

    Ok(CanonicalizeOutcome { plan })
}

/// Moves faces bucket by bucket into new slots appended in canonical order,
/// then drops the old slots.
fn apply_plan<C: AsRef<str>>(mesh: &mut MeshModel, plan: &CanonicalizationPlan, canonical: &[C]) {
    let old_len = mesh.materials.len();

    for name in canonical {
        mesh.materials.push(format!("{}{}", name.as_ref(), TEMP_SUFFIX));
    }

    for (real_idx, bucket) in plan.buckets().iter().enumerate() {
        let added_idx = old_len + real_idx;
        for face in mesh.faces.iter_mut().filter(|f| bucket.contains(&f.material)) {
            face.material = added_idx;
        }
    }

    mesh.materials.drain(..old_len);
    for face in &mut mesh.faces {
        face.material -= old_len;
    }
}
