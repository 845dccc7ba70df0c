//! # Loader Configuration
//!
//! Settings that change how OBJ files are turned into vertex buffers.
//! They serialize to TOML or RON through the [`Config`] trait, so tools can
//! keep them next to the models they load.
//!
//! ## Example
//!
//! ```toml
//! deduplicate_vertices = true
//! dedup_strategy = "Hashed"
//! log_unknown_directives = false
//! load_materials = true
//! ```

use serde::{Serialize, Deserialize};

// Re-export from the config module for convenience
pub use crate::config::{Config, ConfigError};

/// How a vertex buffer finds an existing copy of a vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DedupStrategy {
    /// Compare against every stored vertex with exact float equality.
    /// Quadratic, fine for hand-authored meshes.
    #[default]
    LinearScan,
    /// Hash lookup keyed on the exact bit pattern of the vertex.
    ///
    /// Differs from float equality only for `0.0`/`-0.0` (kept apart) and
    /// NaN payloads (merged when bit-identical).
    Hashed,
}

/// # OBJ Loader Configuration
///
/// Controls vertex deduplication and diagnostics for [`crate::assets::ObjModel`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjLoaderConfig {
    /// Reuse an existing index when an identical vertex is added again
    pub deduplicate_vertices: bool,
    /// Lookup used when deduplicating
    pub dedup_strategy: DedupStrategy,
    /// Emit a warning for directives the loader does not understand
    pub log_unknown_directives: bool,
    /// Follow `mtllib` references
    pub load_materials: bool,
}

impl Default for ObjLoaderConfig {
    fn default() -> Self {
        Self {
            deduplicate_vertices: true,
            dedup_strategy: DedupStrategy::LinearScan,
            log_unknown_directives: true,
            load_materials: true,
        }
    }
}

impl Config for ObjLoaderConfig {}

impl ObjLoaderConfig {
    /// Configuration tuned for large meshes
    pub fn hashed() -> Self {
        Self {
            dedup_strategy: DedupStrategy::Hashed,
            ..Default::default()
        }
    }

    /// Check that the settings make sense together
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.deduplicate_vertices && self.dedup_strategy != DedupStrategy::LinearScan {
            return Err(ConfigError::Invalid(format!(
                "dedup_strategy {:?} requires deduplicate_vertices",
                self.dedup_strategy
            )));
        }
        Ok(())
    }
}
