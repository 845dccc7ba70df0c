//! Asset loading system
//!
//! Wavefront OBJ models and the MTL material libraries they reference.

pub mod obj_loader;
pub mod vertex_set;
pub mod materials;
pub mod numeric;
pub mod summary;

pub use obj_loader::{AttributeKind, LoadStats, ObjError, ObjLoader, ObjModel};
pub use vertex_set::{Capabilities, IndexRange, VertexAttributes, VertexBuffer, VertexSet};
pub use materials::{Material, MaterialLibrary, MaterialLoader, MaterialTexturePaths};
pub use summary::{BufferSummary, ModelSummary, ObjectSummary, RangeSummary};

#[cfg(test)]
mod tests;
