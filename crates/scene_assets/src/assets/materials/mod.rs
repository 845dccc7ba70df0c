//! Material parsing and loading subsystem
//!
//! MTL files are stored as raw property tokens and interpreted on query.

pub mod mtl_parser;
pub mod material_loader;

pub use mtl_parser::{Material, MaterialLibrary};
pub use material_loader::{MaterialLoader, MaterialTexturePaths, TEXTURE_KEYS};
