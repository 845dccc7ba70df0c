//! Serializable overview of a parsed model
//!
//! Used by tools that report what a file contains without walking the vertex
//! data themselves.

use serde::Serialize;

use super::obj_loader::{LoadStats, ObjModel};
use super::vertex_set::{VertexBuffer, VertexSet};

/// Counts and layout of a loaded model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    /// Directory used for relative references
    pub base_path: String,
    /// Material names in sorted order
    pub materials: Vec<String>,
    /// Objects in name order
    pub objects: Vec<ObjectSummary>,
    /// Line counters of the load
    pub stats: LoadStats,
}

/// One object of a model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectSummary {
    /// Object name, empty for faces before any `o` line
    pub name: String,
    /// Vertex buffers in creation order
    pub buffers: Vec<BufferSummary>,
    /// Face ranges by group and material
    pub ranges: Vec<RangeSummary>,
}

/// One vertex buffer of an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BufferSummary {
    /// Unique vertices
    pub vertices: usize,
    /// Draw-order indices
    pub indices: usize,
    /// Whether texture coordinates are present
    pub has_texture: bool,
    /// Whether normals are present
    pub has_normal: bool,
}

/// One face range of an object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeSummary {
    /// Group name
    pub group: String,
    /// Material name
    pub material: String,
    /// Buffer the range indexes into
    pub buffer_index: usize,
    /// First index entry
    pub start_index: usize,
    /// Number of index entries
    pub length: usize,
}

impl From<&VertexBuffer> for BufferSummary {
    fn from(buffer: &VertexBuffer) -> Self {
        Self {
            vertices: buffer.len(),
            indices: buffer.indices.len(),
            has_texture: buffer.has_texture(),
            has_normal: buffer.has_normal(),
        }
    }
}

impl ObjectSummary {
    fn new(name: &str, set: &VertexSet) -> Self {
        Self {
            name: name.to_string(),
            buffers: set.buffers.iter().map(BufferSummary::from).collect(),
            ranges: set
                .iter_ranges()
                .map(|(group, material, range)| RangeSummary {
                    group: group.to_string(),
                    material: material.to_string(),
                    buffer_index: range.buffer_index,
                    start_index: range.start_index,
                    length: range.length,
                })
                .collect(),
        }
    }
}

impl ObjModel {
    /// Summarize the loaded objects and materials
    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            base_path: self.base_path.display().to_string(),
            materials: self.materials.names().map(str::to_string).collect(),
            objects: self
                .objects
                .iter()
                .map(|(name, set)| ObjectSummary::new(name, set))
                .collect(),
            stats: self.stats,
        }
    }
}
