//! Renderer-facing mesh data
//!
//! Parsed models keep polygons as written. This module turns face ranges into
//! triangle lists with an interleaved vertex layout ready for upload.

pub mod mesh;

pub use mesh::{Mesh, Vertex, FLOATS_PER_VERTEX};
