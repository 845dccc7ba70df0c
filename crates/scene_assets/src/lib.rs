//! # Scene Assets
//!
//! Wavefront OBJ/MTL loading for small demo scenes.
//!
//! ## Features
//!
//! - **OBJ Parsing**: Objects, groups, materials, polygons and relative indices
//! - **Vertex Deduplication**: Unique position/texture/normal tuples per buffer
//! - **Capability Buffers**: Faces routed to buffers by the attributes they carry
//! - **MTL Libraries**: Raw material properties with typed queries
//! - **Mesh Export**: Interleaved vertex data ready for GPU upload
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_assets::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let model = ObjModel::from_file("data/cubescene.obj")?;
//!
//!     for (name, set) in &model.objects {
//!         for (group, material, range) in set.iter_ranges() {
//!             let buffer = &set.buffers[range.buffer_index];
//!             log::info!("{name}/{group}/{material}: {} indices", buffer.range_indices(range).len());
//!         }
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core modules
pub mod core;

pub mod foundation;
pub mod config;
pub mod assets;
pub mod render;

/// Common imports for library users
pub mod prelude {
    pub use crate::{
        assets::{
            Capabilities, IndexRange, Material, MaterialLibrary, MaterialLoader, ObjError,
            ObjLoader, ObjModel, VertexAttributes, VertexBuffer, VertexSet,
        },
        config::{Config, ConfigError},
        core::config::{DedupStrategy, ObjLoaderConfig},
        foundation::math::{Vec2, Vec3, Vec4},
        render::{Mesh, Vertex},
    };
}
