//! OBJ file loader for 3D models
//!
//! Parses Wavefront .obj files (and the .mtl libraries they reference) into an
//! [`ObjModel`]: one [`VertexSet`] per object, with faces filed by group and
//! material as ranges of deduplicated vertex indices.
//!
//! Parsing is best-effort for malformed numbers and unknown directives, which
//! are defaulted or logged. Face references outside the vertex lists and
//! faces mixing attribute layouts abort the load.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::mem;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use super::materials::mtl_parser::strip_comment;
use super::materials::{Material, MaterialLibrary, MaterialLoader};
use super::numeric;
use super::vertex_set::{Capabilities, IndexRange, VertexAttributes, VertexSet};
use crate::core::config::{DedupStrategy, ObjLoaderConfig};
use crate::foundation::math::{Vec2, Vec3, Vec4};

/// Vertex attribute list a face index points into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    /// `v` positions
    Position,
    /// `vt` texture coordinates
    Texture,
    /// `vn` normals
    Normal,
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Position => write!(f, "position"),
            Self::Texture => write!(f, "texture"),
            Self::Normal => write!(f, "normal"),
        }
    }
}

/// Errors raised while loading a model
#[derive(Error, Debug)]
pub enum ObjError {
    /// The OBJ file could not be opened
    #[error("Unable to open OBJ file {0:?}")]
    NotFound(PathBuf),
    /// Reading the file failed part way through
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A face references an element that was never defined
    #[error("Line {line}: {kind} index {index} out of range ({len} defined)")]
    IndexOutOfRange {
        /// List the index points into
        kind: AttributeKind,
        /// Index after resolving negative values
        index: i64,
        /// Elements defined so far
        len: usize,
        /// 1-based line number
        line: usize,
    },
    /// A vertex does not fit the layout of the buffer its range writes to
    #[error("{}capability mismatch: buffer holds {expected:?}, vertex carries {found:?}", line_prefix(.line))]
    CapabilityMismatch {
        /// Layout of the buffer
        expected: Capabilities,
        /// Layout of the vertex
        found: Capabilities,
        /// 1-based line number, when known
        line: Option<usize>,
    },
}

fn line_prefix(line: &Option<usize>) -> String {
    line.map(|l| format!("Line {l}: ")).unwrap_or_default()
}

impl ObjError {
    /// Whether the error comes from inconsistent model data rather than I/O
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::IndexOutOfRange { .. } | Self::CapabilityMismatch { .. })
    }

    fn at_line(self, at: usize) -> Self {
        match self {
            Self::CapabilityMismatch { expected, found, .. } => Self::CapabilityMismatch {
                expected,
                found,
                line: Some(at),
            },
            other => other,
        }
    }
}

/// Counters for the most recent load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    /// `v` lines read
    pub positions: usize,
    /// `vt` lines read
    pub texture_coords: usize,
    /// `vn` lines read
    pub normals: usize,
    /// `f` lines read
    pub faces: usize,
    /// Lines with an unrecognized directive
    pub unknown_directives: usize,
}

/// Parsed model: materials plus per-object vertex sets
#[derive(Debug, Clone, Default)]
pub struct ObjModel {
    /// Directory of the OBJ file, used to resolve `mtllib` and texture names
    pub base_path: PathBuf,
    /// Materials from every referenced library
    pub materials: MaterialLibrary,
    /// `objects[object name]`; faces before any `o` line belong to `""`
    pub objects: BTreeMap<String, VertexSet>,
    /// Counters for the most recent load
    pub stats: LoadStats,
    config: ObjLoaderConfig,
}

impl ObjModel {
    /// Create an empty model with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty model using `config` for later loads
    pub fn with_config(config: ObjLoaderConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Load a model from file with default settings
    ///
    /// Unlike [`ObjModel::load`], a file that cannot be opened is reported as
    /// [`ObjError::NotFound`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ObjError> {
        Self::from_file_with_config(path, ObjLoaderConfig::default())
    }

    /// Load a model from file with `config`
    pub fn from_file_with_config(path: impl AsRef<Path>, config: ObjLoaderConfig) -> Result<Self, ObjError> {
        let path = path.as_ref();
        let mut model = Self::with_config(config);
        if !model.load(path)? {
            return Err(ObjError::NotFound(path.to_path_buf()));
        }
        Ok(model)
    }

    /// Settings used by [`ObjModel::load`]
    pub const fn config(&self) -> &ObjLoaderConfig {
        &self.config
    }

    /// Load an OBJ file into this model
    ///
    /// The material library is replaced and `base_path` set to the file's
    /// directory. Objects are added to the ones already loaded; an object
    /// name seen again replaces the earlier object.
    ///
    /// On `Err` the model is left exactly as it was before the call.
    ///
    /// # Returns
    /// `Ok(false)` if the file could not be opened, `Ok(true)` once the whole
    /// file has been parsed.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<bool, ObjError> {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                log::warn!("Unable to open OBJ file {:?}: {}", path, e);
                return Ok(false);
            }
        };

        let source_name = path.display().to_string();
        self.load_reader(BufReader::new(file), &source_name, base_path_of(path))?;
        Ok(true)
    }

    /// Load OBJ text held in memory
    ///
    /// `source_name` only appears in diagnostics; `base_path` resolves
    /// `mtllib` references. Same replacement rules as [`ObjModel::load`].
    pub fn load_str(&mut self, contents: &str, source_name: &str, base_path: impl Into<PathBuf>) -> Result<(), ObjError> {
        self.load_reader(contents.as_bytes(), source_name, base_path.into())
    }

    /// Parse into a fresh model and merge it into `self` only on success
    fn load_reader<R: BufRead>(&mut self, reader: R, source_name: &str, base_path: PathBuf) -> Result<(), ObjError> {
        let mut staged = Self {
            base_path,
            config: self.config.clone(),
            ..Self::default()
        };
        let stats = ObjLoader::new(&mut staged, source_name).parse(reader)?;

        self.objects.append(&mut staged.objects);
        self.materials = staged.materials;
        self.base_path = staged.base_path;
        self.stats = stats;
        Ok(())
    }

    /// Vertex set of the object called `name`
    pub fn object(&self, name: &str) -> Option<&VertexSet> {
        self.objects.get(name)
    }

    /// Material called `name`
    pub fn material(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    /// Texture file of `material` for `key` (e.g. `map_Kd`), under `base_path`
    pub fn texture_path(&self, material: &str, key: &str) -> Option<PathBuf> {
        MaterialLoader::texture_path(self.material(material)?, key, &self.base_path)
    }
}

/// Directory holding `path`, or `.` for a bare file name
fn base_path_of(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Line-by-line OBJ parser feeding an [`ObjModel`]
///
/// Vertex lists are global to the file and never reset. The object, group and
/// material names plus the open index range describe where the next face goes.
pub struct ObjLoader<'a> {
    model: &'a mut ObjModel,
    source_name: &'a str,
    line: usize,
    stats: LoadStats,
    dedup: Option<DedupStrategy>,

    positions: Vec<Vec4>,
    textures: Vec<Vec2>,
    normals: Vec<Vec3>,

    object_name: String,
    group_name: String,
    material_name: String,
    current_set: VertexSet,
    // Buffer of the open range; `None` until a face starts one
    current_buffer: Option<usize>,
    current_range: IndexRange,
}

impl<'a> ObjLoader<'a> {
    /// Create a loader filling `model`; `source_name` labels diagnostics
    pub fn new(model: &'a mut ObjModel, source_name: &'a str) -> Self {
        let dedup = model
            .config
            .deduplicate_vertices
            .then_some(model.config.dedup_strategy);

        Self {
            model,
            source_name,
            line: 0,
            stats: LoadStats::default(),
            dedup,
            positions: Vec::new(),
            textures: Vec::new(),
            normals: Vec::new(),
            object_name: String::new(),
            group_name: String::new(),
            material_name: String::new(),
            current_set: VertexSet::with_dedup(dedup),
            current_buffer: None,
            current_range: IndexRange::default(),
        }
    }

    /// Parse every line of `reader`, then file the last object
    pub fn parse<R: BufRead>(mut self, mut reader: R) -> Result<LoadStats, ObjError> {
        let mut bytes = Vec::new();
        loop {
            bytes.clear();
            if reader.read_until(b'\n', &mut bytes)? == 0 {
                break;
            }
            self.line += 1;

            let text = String::from_utf8_lossy(&bytes);
            self.parse_line(text.trim_end_matches(['\n', '\r']))?;
        }

        self.close_range();
        self.finish_object();

        log::info!(
            "Loaded {}: {} object(s), {} material(s), {} position(s), {} face(s)",
            self.source_name,
            self.model.objects.len(),
            self.model.materials.len(),
            self.stats.positions,
            self.stats.faces
        );

        Ok(self.stats)
    }

    fn parse_line(&mut self, raw: &str) -> Result<(), ObjError> {
        let line = strip_comment(raw);
        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            return Ok(());
        };

        match keyword {
            "mtllib" => {
                if self.model.config.load_materials {
                    for file_name in tokens {
                        let model = &mut *self.model;
                        MaterialLoader::load_library(&model.base_path, file_name, &mut model.materials);
                    }
                } else {
                    log::debug!("{}:{}: Skipping mtllib, material loading disabled", self.source_name, self.line);
                }
            }
            "usemtl" => {
                self.close_range();
                if let Some(name) = tokens.next() {
                    self.material_name = name.to_string();
                }
                log::trace!("Selected material '{}'", self.material_name);
            }
            "o" => {
                self.close_range();
                self.finish_object();
                if let Some(name) = tokens.next() {
                    self.object_name = name.to_string();
                }
                self.group_name.clear();
                log::debug!("Starting object '{}'", self.object_name);
            }
            "g" => {
                self.close_range();
                if let Some(name) = tokens.next() {
                    self.group_name = name.to_string();
                }
                log::trace!("Starting group '{}'", self.group_name);
            }
            "v" => {
                let [x, y, z, w] = numeric::parse_floats(tokens, [0.0, 0.0, 0.0, 1.0]);
                self.positions.push(Vec4::new(x, y, z, w));
                self.stats.positions += 1;
            }
            "vt" => {
                let [u, v] = numeric::parse_floats(tokens, [0.0, 0.0]);
                self.textures.push(Vec2::new(u, v));
                self.stats.texture_coords += 1;
            }
            "vn" => {
                let [x, y, z] = numeric::parse_floats(tokens, [0.0, 0.0, 0.0]);
                self.normals.push(Vec3::new(x, y, z));
                self.stats.normals += 1;
            }
            "f" => {
                self.parse_face(tokens)?;
                self.stats.faces += 1;
            }
            // Smoothing groups are not supported; normals are used as given
            "s" => {}
            other => {
                self.stats.unknown_directives += 1;
                if self.model.config.log_unknown_directives {
                    log::warn!(
                        "{}:{}: Ignoring unknown token \"{}\"",
                        self.source_name,
                        self.line,
                        other
                    );
                }
            }
        }

        Ok(())
    }

    fn parse_face<'t>(&mut self, references: impl Iterator<Item = &'t str>) -> Result<(), ObjError> {
        let mut face = Vec::new();

        for reference in references {
            let [position, texture, normal] = self.resolve_reference(reference);
            let has_texture = texture > 0;
            let has_normal = normal > 0;

            // The first reference of a range picks the buffer for the whole range
            let buffer = match self.current_buffer {
                Some(buffer) => buffer,
                None => {
                    let buffer = self
                        .current_set
                        .buffer_index(Capabilities::from_attributes(has_texture, has_normal));
                    self.current_buffer = Some(buffer);
                    self.current_range = IndexRange::new(buffer);
                    buffer
                }
            };

            let vertex = VertexAttributes {
                position: fetch(&self.positions, position, AttributeKind::Position, self.line)?,
                texture: has_texture
                    .then(|| fetch(&self.textures, texture, AttributeKind::Texture, self.line))
                    .transpose()?,
                normal: has_normal
                    .then(|| fetch(&self.normals, normal, AttributeKind::Normal, self.line))
                    .transpose()?,
            };

            let index = self
                .current_set
                .add_vertex(buffer, &vertex)
                .map_err(|e| e.at_line(self.line))?;
            face.push(index);
        }

        let Some(buffer) = self.current_buffer.filter(|_| !face.is_empty()) else {
            log::warn!("{}:{}: Ignoring face without vertices", self.source_name, self.line);
            return Ok(());
        };

        for (i, &index) in face.iter().enumerate() {
            let position = self.current_set.add_vertex_index(buffer, index);
            if i == 0 && self.current_range.length == 0 {
                self.current_range.start_index = position;
            }
        }
        self.current_range.length += face.len();

        Ok(())
    }

    /// Split `v/vt/vn` into 1-based indices, 0 meaning absent
    ///
    /// Negative indices count back from the end of their own list, so `-1`
    /// is the most recently defined element.
    fn resolve_reference(&self, reference: &str) -> [i64; 3] {
        let mut indices = [0_i64; 3];
        for (slot, part) in indices.iter_mut().zip(reference.split('/')) {
            *slot = numeric::parse_index(part);
        }

        let lens = [self.positions.len(), self.textures.len(), self.normals.len()];
        for (index, len) in indices.iter_mut().zip(lens) {
            if *index < 0 {
                *index += len as i64 + 1;
            }
        }

        indices
    }

    /// File the open range under the current group and material
    fn close_range(&mut self) {
        if self.current_buffer.take().is_some() {
            self.current_set
                .add_range(&self.group_name, &self.material_name, self.current_range);
        }
    }

    /// Move the finished object into the model
    fn finish_object(&mut self) {
        if self.current_set.is_empty() {
            return;
        }

        let finished = mem::replace(&mut self.current_set, VertexSet::with_dedup(self.dedup));
        log::debug!(
            "Finished object '{}' with {} buffer(s)",
            self.object_name,
            finished.buffers.len()
        );
        self.model.objects.insert(self.object_name.clone(), finished);
    }
}

/// Element `index` (1-based) of `list`
fn fetch<T: Copy>(list: &[T], index: i64, kind: AttributeKind, line: usize) -> Result<T, ObjError> {
    usize::try_from(index - 1)
        .ok()
        .and_then(|i| list.get(i))
        .copied()
        .ok_or(ObjError::IndexOutOfRange {
            kind,
            index,
            len: list.len(),
            line,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(contents: &str) -> Result<ObjModel, ObjError> {
        let mut model = ObjModel::new();
        model.load_str(contents, "test.obj", ".")?;
        Ok(model)
    }

    #[test]
    fn test_base_path_of() {
        assert_eq!(base_path_of(Path::new("data/cube.obj")), PathBuf::from("data"));
        assert_eq!(base_path_of(Path::new("cube.obj")), PathBuf::from("."));
    }

    #[test]
    fn test_vertex_lists_count_lines() {
        let model = parse("v 0 0 0\nv 1 0 0\nvt 0 0\nvn 0 0 1\nvn 0 1 0\nvn 1 0 0\n").unwrap();
        assert_eq!(model.stats.positions, 2);
        assert_eq!(model.stats.texture_coords, 1);
        assert_eq!(model.stats.normals, 3);
        assert!(model.objects.is_empty());
    }

    #[test]
    fn test_position_w_defaults_to_one() {
        let model = parse("v 1 2 3\nv 4 5 6 0.5\nf 1 2 1\n").unwrap();
        let buffer = &model.object("").unwrap().buffers[0];
        assert_eq!(buffer.positions[0], Vec4::new(1.0, 2.0, 3.0, 1.0));
        assert_eq!(buffer.positions[1], Vec4::new(4.0, 5.0, 6.0, 0.5));
    }

    #[test]
    fn test_malformed_numbers_are_defaulted() {
        let model = parse("v 1 abc 3\nf 1 1 1\n").unwrap();
        let buffer = &model.object("").unwrap().buffers[0];
        assert_eq!(buffer.positions[0], Vec4::new(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_polygon_kept_as_written() {
        let model = parse("v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n").unwrap();
        let set = model.object("").unwrap();
        let range = set.face_ranges("", "").unwrap()[0];
        assert_eq!(range.length, 4);
        assert_eq!(set.buffers[0].range_indices(&range), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_unknown_directive_is_counted_not_fatal() {
        let model = parse("v 0 0 0\ncurv 0 1\nf 1 1 1\n").unwrap();
        assert_eq!(model.stats.unknown_directives, 1);
        assert_eq!(model.objects.len(), 1);
    }

    #[test]
    fn test_smoothing_and_comments_are_ignored() {
        let model = parse("# header\ns 1\nv 0 0 0 # origin\n\ns off\n").unwrap();
        assert_eq!(model.stats.unknown_directives, 0);
        assert_eq!(model.stats.positions, 1);
    }

    #[test]
    fn test_position_index_out_of_range() {
        let err = parse("v 0 0 0\nf 1 2 3\n").unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(
            err,
            ObjError::IndexOutOfRange { kind: AttributeKind::Position, index: 2, len: 1, line: 2 }
        ));
    }

    #[test]
    fn test_zero_position_index_is_out_of_range() {
        let err = parse("v 0 0 0\nf /1/1\n").unwrap_err();
        assert!(matches!(err, ObjError::IndexOutOfRange { index: 0, .. }));
    }

    #[test]
    fn test_texture_index_out_of_range() {
        let err = parse("v 0 0 0\nvt 0 0\nf 1/2 1/2 1/2\n").unwrap_err();
        assert!(matches!(
            err,
            ObjError::IndexOutOfRange { kind: AttributeKind::Texture, index: 2, len: 1, .. }
        ));
    }

    #[test]
    fn test_mixed_face_in_one_range_is_fatal() {
        let err = parse("v 0 0 0\nvt 0 0\nf 1 1 1\nf 1/1 1/1 1/1\n").unwrap_err();
        assert!(matches!(
            err,
            ObjError::CapabilityMismatch { expected, found, line: Some(4) }
                if expected == Capabilities::empty() && found == Capabilities::TEXTURE
        ));
    }

    #[test]
    fn test_empty_face_is_skipped() {
        let model = parse("v 0 0 0\nf\nf 1 1 1\n").unwrap();
        let set = model.object("").unwrap();
        let range = set.face_ranges("", "").unwrap()[0];
        assert_eq!((range.start_index, range.length), (0, 3));
    }

    #[test]
    fn test_invalid_utf8_is_tolerated() {
        let mut bytes = b"v 0 0 0\ng caf".to_vec();
        bytes.extend_from_slice(&[0xE9, b'\n']);
        bytes.extend_from_slice(b"f 1 1 1\r\n");

        let mut model = ObjModel::new();
        let stats = ObjLoader::new(&mut model, "latin1.obj").parse(bytes.as_slice()).unwrap();
        assert_eq!(stats.faces, 1);
        assert_eq!(model.object("").unwrap().group_material_faces.len(), 1);
    }

    #[test]
    fn test_failed_load_leaves_model_untouched() {
        let mut model = parse("v 0 0 0\no kept\nf 1 1 1\n").unwrap();
        model.materials = MaterialLibrary::parse_str("newmtl red\nKd 1 0 0\n");
        let stats = model.stats;

        let err = model
            .load_str("v 0 0 0\no first\nf 1 1 1\no second\nf 1 9 1\n", "broken.obj", "elsewhere")
            .unwrap_err();
        assert!(err.is_fatal());

        assert_eq!(model.objects.keys().collect::<Vec<_>>(), ["kept"]);
        assert!(model.material("red").is_some());
        assert_eq!(model.base_path, PathBuf::from("."));
        assert_eq!(model.stats, stats);
    }

    #[test]
    fn test_successful_load_merges_objects() {
        let mut model = parse("v 0 0 0\no kept\nf 1 1 1\no shared\nf 1 1 1\n").unwrap();
        model
            .load_str("v 1 1 1\no shared\nf 1 1 1\n", "second.obj", "second")
            .unwrap();

        assert_eq!(model.objects.len(), 2);
        assert_eq!(model.object("shared").unwrap().buffers[0].positions[0], Vec4::new(1.0, 1.0, 1.0, 1.0));
        assert_eq!(model.base_path, PathBuf::from("second"));
    }

    #[test]
    fn test_directive_without_name_keeps_previous_name() {
        let model = parse("v 0 0 0\no obj\ng grp\nusemtl mat\nf 1 1 1\nusemtl\nf 1 1 1\ng\nf 1 1 1\n").unwrap();
        let set = model.object("obj").unwrap();

        let ranges = set.face_ranges("grp", "mat").unwrap();
        assert_eq!(ranges.len(), 3);
        assert_eq!(set.group_material_faces.len(), 1);
    }

    #[test]
    fn test_object_without_name_keeps_name_and_resets_group() {
        let model = parse("v 0 0 0\no obj\ng grp\nf 1 1 1\no\nf 1 1 1\n").unwrap();
        let set = model.object("obj").unwrap();

        assert_eq!(model.objects.len(), 1);
        assert!(set.face_ranges("", "").is_some());
        assert!(set.face_ranges("grp", "").is_none());
    }

    #[test]
    fn test_error_messages_name_the_line() {
        let err = parse("v 0 0 0\nvt 0 0\nf 1 1 1\nf 1/1 1/1 1/1\n").unwrap_err();
        assert!(err.to_string().starts_with("Line 4: capability mismatch"));

        let err = parse("f 1 1 1\n").unwrap_err();
        assert_eq!(err.to_string(), "Line 1: position index 1 out of range (0 defined)");
    }
}
