//! MTL (Material Template Library) file parser
//!
//! Parses Wavefront .mtl files into raw key/value data. Values are kept as the
//! tokens written in the file and only interpreted when queried, so
//! extensions and texture options survive untouched.

use std::collections::btree_map::{self, BTreeMap};

use super::super::numeric;
use crate::foundation::math::Vec3;

/// Wavefront material as raw property tokens
///
/// `info["Kd"] == ["1.0", "0.5", "0.0"]` for a line `Kd 1.0 0.5 0.0`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Material {
    info: BTreeMap<String, Vec<String>>,
}

impl Material {
    /// Create an empty material
    pub fn new() -> Self {
        Self::default()
    }

    /// Store one property line
    ///
    /// The first token is the key, the rest its value. A key seen again
    /// replaces the earlier value. Blank lines are ignored.
    pub fn parse_line(&mut self, line: &str) {
        let mut tokens = line.split_whitespace();
        let Some(key) = tokens.next() else {
            return;
        };

        self.info
            .insert(key.to_string(), tokens.map(str::to_string).collect());
    }

    /// Value tokens stored for `key`
    pub fn get_strings(&self, key: &str) -> Option<&[String]> {
        self.info.get(key).map(Vec::as_slice)
    }

    /// Last value token for `key`
    ///
    /// Texture statements put options before the file name
    /// (`map_Kd -s 2 2 1 wood.png`), so the last token is the useful one.
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.info.get(key)?.last().map(String::as_str)
    }

    /// Last value token for `key` as a float
    ///
    /// `None` when the key is missing, has no value or the token is not a
    /// number.
    pub fn get_float(&self, key: &str) -> Option<f32> {
        self.get_string(key)?.parse().ok()
    }

    /// Value for `key` as a 3-vector, e.g. `Kd` colors
    ///
    /// Requires exactly three tokens. Unparsable components read as 0.0.
    pub fn get_vec3(&self, key: &str) -> Option<Vec3> {
        match self.info.get(key)?.as_slice() {
            [x, y, z] => Some(Vec3::new(
                numeric::parse_or(x, 0.0),
                numeric::parse_or(y, 0.0),
                numeric::parse_or(z, 0.0),
            )),
            _ => None,
        }
    }

    /// Defined property keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.info.keys().map(String::as_str)
    }

    /// Number of defined properties
    pub fn len(&self) -> usize {
        self.info.len()
    }

    /// Whether no property has been defined
    pub fn is_empty(&self) -> bool {
        self.info.is_empty()
    }
}

/// Materials by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialLibrary {
    materials: BTreeMap<String, Material>,
}

impl MaterialLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse MTL text into a new library
    pub fn parse_str(contents: &str) -> Self {
        let mut library = Self::new();
        library.parse_into(contents);
        library
    }

    /// Parse MTL text, adding to the materials already present
    ///
    /// Lines before the first `newmtl` have no material to attach to and are
    /// dropped. Redefining a known material updates its properties in place.
    pub fn parse_into(&mut self, contents: &str) {
        let mut current: Option<String> = None;

        for line in contents.lines() {
            let line = strip_comment(line);

            let mut tokens = line.split_whitespace();
            let Some(first) = tokens.next() else {
                continue;
            };

            if first == "newmtl" {
                // A bare `newmtl` keeps filling the previous material
                if let Some(name) = tokens.next() {
                    log::trace!("MTL: new material '{}'", name);
                    current = Some(name.to_string());
                }
                continue;
            }

            if let Some(name) = &current {
                self.materials.entry(name.clone()).or_default().parse_line(line);
            }
        }
    }

    /// Material called `name`
    pub fn get(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    /// Materials in name order
    pub fn iter(&self) -> btree_map::Iter<'_, String, Material> {
        self.materials.iter()
    }

    /// Material names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.materials.keys().map(String::as_str)
    }

    /// Number of materials
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Whether the library is empty
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Remove every material
    pub fn clear(&mut self) {
        self.materials.clear();
    }
}

impl<'a> IntoIterator for &'a MaterialLibrary {
    type Item = (&'a String, &'a Material);
    type IntoIter = btree_map::Iter<'a, String, Material>;

    fn into_iter(self) -> Self::IntoIter {
        self.materials.iter()
    }
}

/// Text before the first `#`
pub(crate) fn strip_comment(line: &str) -> &str {
    line.split_once('#').map_or(line, |(content, _)| content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_material() {
        let mtl_content = r#"
# Simple material
newmtl TestMaterial
Ka 1.0 1.0 1.0
Kd 0.8 0.2 0.2
Ks 0.5 0.5 0.5
Ns 250.0
d 1.0
illum 2
"#;

        let library = MaterialLibrary::parse_str(mtl_content);
        assert_eq!(library.len(), 1);

        let mat = library.get("TestMaterial").unwrap();
        assert_eq!(mat.get_vec3("Kd"), Some(Vec3::new(0.8, 0.2, 0.2)));
        assert_eq!(mat.get_float("Ns"), Some(250.0));
        assert_eq!(mat.get_float("d"), Some(1.0));
        assert_eq!(mat.get_string("illum"), Some("2"));
        assert_eq!(mat.len(), 6);
    }

    #[test]
    fn test_parse_material_with_textures() {
        let mtl_content = r#"
newmtl TexturedMaterial
Kd 1.0 1.0 1.0
map_Kd -s 2 2 1 textures/diffuse.png
map_Bump textures/normal.png
"#;

        let library = MaterialLibrary::parse_str(mtl_content);
        let mat = library.get("TexturedMaterial").unwrap();

        assert_eq!(mat.get_string("map_Kd"), Some("textures/diffuse.png"));
        assert_eq!(mat.get_strings("map_Kd").unwrap().len(), 5);
        assert_eq!(mat.get_string("map_Bump"), Some("textures/normal.png"));
    }

    #[test]
    fn test_parse_multiple_materials() {
        let mtl_content = r#"
newmtl Material1
Kd 1.0 0.0 0.0

newmtl Material2
Kd 0.0 1.0 0.0
"#;

        let library = MaterialLibrary::parse_str(mtl_content);
        assert_eq!(library.len(), 2);

        assert_eq!(library.get("Material1").unwrap().get_vec3("Kd"), Some(Vec3::new(1.0, 0.0, 0.0)));
        assert_eq!(library.get("Material2").unwrap().get_vec3("Kd"), Some(Vec3::new(0.0, 1.0, 0.0)));
        assert_eq!(library.names().collect::<Vec<_>>(), vec!["Material1", "Material2"]);
    }

    #[test]
    fn test_lines_before_newmtl_are_dropped() {
        let library = MaterialLibrary::parse_str("Kd 1 1 1\nNs 10\n");
        assert!(library.is_empty());
    }

    #[test]
    fn test_comments_are_stripped() {
        let library = MaterialLibrary::parse_str("newmtl red # main color\nKd 1 0 0 # pure red\n");
        let mat = library.get("red").unwrap();
        assert_eq!(mat.get_strings("Kd").unwrap(), ["1", "0", "0"]);
    }

    #[test]
    fn test_redefined_key_overwrites() {
        let library = MaterialLibrary::parse_str("newmtl m\nKd 1 0 0\nKd 0 0 1\n");
        assert_eq!(library.get("m").unwrap().get_vec3("Kd"), Some(Vec3::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn test_parse_into_accumulates() {
        let mut library = MaterialLibrary::parse_str("newmtl a\nNs 5\n");
        library.parse_into("newmtl b\nNs 6\nnewmtl a\nd 0.5\n");

        assert_eq!(library.len(), 2);
        let a = library.get("a").unwrap();
        assert_eq!(a.get_float("Ns"), Some(5.0));
        assert_eq!(a.get_float("d"), Some(0.5));
    }

    #[test]
    fn test_missing_key_queries() {
        let mat = Material::new();
        assert_eq!(mat.get_strings("Kd"), None);
        assert_eq!(mat.get_string("Kd"), None);
        assert_eq!(mat.get_float("Kd"), None);
        assert_eq!(mat.get_vec3("Kd"), None);
    }

    #[test]
    fn test_vec3_requires_three_tokens() {
        let mut mat = Material::new();
        mat.parse_line("Kd 1.0 0.5");
        assert_eq!(mat.get_vec3("Kd"), None);

        mat.parse_line("Ka 0.1 oops 0.3");
        assert_eq!(mat.get_vec3("Ka"), Some(Vec3::new(0.1, 0.0, 0.3)));
    }

    #[test]
    fn test_float_uses_last_token() {
        let mut mat = Material::new();
        mat.parse_line("Ns -opt 3 42.5");
        assert_eq!(mat.get_float("Ns"), Some(42.5));

        mat.parse_line("d opaque");
        assert_eq!(mat.get_float("d"), None);

        mat.parse_line("Tr");
        assert_eq!(mat.get_strings("Tr"), Some(&[][..]));
        assert_eq!(mat.get_string("Tr"), None);
    }

    #[test]
    fn test_bare_newmtl_keeps_current_material() {
        let library = MaterialLibrary::parse_str("newmtl red\nKd 1 0 0\nnewmtl\nNs 10\n");

        assert_eq!(library.len(), 1);
        let red = library.get("red").unwrap();
        assert_eq!(red.get_float("Ns"), Some(10.0));
        assert_eq!(red.get_vec3("Kd"), Some(Vec3::new(1.0, 0.0, 0.0)));
    }
}
