//! Core crate systems
//!
//! Holds the configuration types that drive model loading.

pub mod config;

pub use config::{DedupStrategy, ObjLoaderConfig};
