//! Serializable description of an artist's skinned mesh.
//!
//! This is the minimum the slot algorithms need from the modeling tool:
//! material slot names, vertex group names, vertex group membership per
//! vertex, and the material and vertices of every face in native order.

use serde::{Deserialize, Serialize};

use crate::error::{MeshError, ParseError};

/// Vertex groups whose name starts with this prefix are bone groups.
pub const BONE_GROUP_PREFIX: &str = "G_";

/// A mesh as exported by the modeling-tool hook.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MeshModel {
    /// Material slot names in slot order.
    pub materials: Vec<String>,
    /// Vertex group names, indexed by [`Vertex::groups`].
    #[serde(default)]
    pub vertex_groups: Vec<String>,
    #[serde(default)]
    pub vertices: Vec<Vertex>,
    /// Faces in the mesh's native order.
    #[serde(default)]
    pub faces: Vec<Face>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Vertex {
    /// Indices into [`MeshModel::vertex_groups`] weighting this vertex.
    #[serde(default)]
    pub groups: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Face {
    /// Material slot index.
    pub material: usize,
    /// Indices into [`MeshModel::vertices`].
    pub vertices: Vec<usize>,
}

impl Vertex {
    pub fn new(groups: impl Into<Vec<usize>>) -> Self {
        Self {
            groups: groups.into(),
        }
    }
}

impl Face {
    pub fn new(material: usize, vertices: impl Into<Vec<usize>>) -> Self {
        Self {
            material,
            vertices: vertices.into(),
        }
    }
}

impl MeshModel {
    /// Parses a mesh description from JSON.
    pub fn from_json(json: &str) -> Result<Self, ParseError> {
        serde_json::from_str(json).map_err(|e| ParseError::MeshJson(e.to_string()))
    }

    /// Serializes the mesh description to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Returns true if the vertex group at `group` is a bone group.
    pub fn is_bone_group(&self, group: usize) -> bool {
        self.vertex_groups
            .get(group)
            .is_some_and(|name| name.starts_with(BONE_GROUP_PREFIX))
    }

    /// Checks every index in the mesh is in range.
    pub fn validate(&self) -> Result<(), MeshError> {
        for (vertex, v) in self.vertices.iter().enumerate() {
            if let Some(&group) = v.groups.iter().find(|&&g| g >= self.vertex_groups.len()) {
                return Err(MeshError::GroupOutOfRange {
                    vertex,
                    group,
                    groups: self.vertex_groups.len(),
                });
            }
        }

        for (face, f) in self.faces.iter().enumerate() {
            if f.material >= self.materials.len() {
                return Err(MeshError::MaterialOutOfRange {
                    face,
                    material: f.material,
                    slots: self.materials.len(),
                });
            }
            if let Some(&vertex) = f.vertices.iter().find(|&&v| v >= self.vertices.len()) {
                return Err(MeshError::VertexOutOfRange {
                    face,
                    vertex,
                    vertices: self.vertices.len(),
                });
            }
        }

        Ok(())
    }
}
