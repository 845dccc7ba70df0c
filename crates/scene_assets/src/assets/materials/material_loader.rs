//! Material loader with MTL file support
//!
//! Reads MTL files named by `mtllib` relative to the model directory and
//! resolves the texture files materials point at.

use std::fs;
use std::path::{Path, PathBuf};

use super::mtl_parser::{Material, MaterialLibrary};

/// Texture keys probed by [`MaterialLoader::texture_paths`]
pub const TEXTURE_KEYS: [&str; 6] = ["map_Kd", "map_Ks", "map_Ka", "map_Bump", "bump", "map_d"];

/// Texture paths for a material, resolved against the model directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialTexturePaths {
    /// Diffuse texture (`map_Kd`)
    pub diffuse: Option<PathBuf>,
    /// Specular texture (`map_Ks`)
    pub specular: Option<PathBuf>,
    /// Ambient texture (`map_Ka`)
    pub ambient: Option<PathBuf>,
    /// Bump or normal map (`map_Bump`, falling back to `bump`)
    pub bump: Option<PathBuf>,
    /// Alpha texture (`map_d`)
    pub alpha: Option<PathBuf>,
}

impl MaterialTexturePaths {
    /// Whether no texture is referenced
    pub const fn is_empty(&self) -> bool {
        self.diffuse.is_none()
            && self.specular.is_none()
            && self.ambient.is_none()
            && self.bump.is_none()
            && self.alpha.is_none()
    }
}

/// Material loader for filling a [`MaterialLibrary`] from MTL files
pub struct MaterialLoader;

impl MaterialLoader {
    /// Load an MTL file into `library`
    ///
    /// # Arguments
    /// * `base_path` - Directory of the OBJ file
    /// * `file_name` - Library name as written after `mtllib`
    /// * `library` - Library receiving the materials
    ///
    /// # Returns
    /// `false` if the file could not be read. The library is left unchanged
    /// and the failure is logged; callers keep loading the model.
    pub fn load_library(base_path: &Path, file_name: &str, library: &mut MaterialLibrary) -> bool {
        let mtl_path = base_path.join(file_name);

        let bytes = match fs::read(&mtl_path) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Unable to open material library {:?} for reading: {}", mtl_path, e);
                return false;
            }
        };

        // Invalid UTF-8 is replaced, not rejected
        let contents = String::from_utf8_lossy(&bytes);

        let before = library.len();
        library.parse_into(&contents);
        log::debug!(
            "Loaded material library {:?} ({} new material(s))",
            mtl_path,
            library.len() - before
        );

        true
    }

    /// Resolve one texture reference of `material`
    ///
    /// Uses the last token of the statement so texture options are skipped.
    pub fn texture_path(material: &Material, key: &str, base_path: &Path) -> Option<PathBuf> {
        material.get_string(key).map(|file| base_path.join(file))
    }

    /// Resolve every texture reference of `material`
    pub fn texture_paths(material: &Material, base_path: &Path) -> MaterialTexturePaths {
        let resolve = |key: &str| Self::texture_path(material, key, base_path);

        MaterialTexturePaths {
            diffuse: resolve("map_Kd"),
            specular: resolve("map_Ks"),
            ambient: resolve("map_Ka"),
            bump: resolve("map_Bump").or_else(|| resolve("bump")),
            alpha: resolve("map_d"),
        }
    }
}
