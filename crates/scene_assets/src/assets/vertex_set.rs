//! Deduplicated vertex buffers and face ranges
//!
//! OBJ files index positions, texture coordinates and normals separately.
//! GPUs want one index per unique combination, so every referenced
//! combination is stored once in a [`VertexBuffer`] and faces become runs of
//! indices into it.
//!
//! Faces only share a buffer when they carry the same attributes. A model with
//! textured and untextured parts ends up with two buffers, which can still be
//! drawn without changing vertex layouts between the parts of each buffer.

use std::collections::{BTreeMap, HashMap};
use std::ops::Range;

use bitflags::bitflags;

use super::obj_loader::ObjError;
use crate::core::config::DedupStrategy;
use crate::foundation::math::{Vec2, Vec3, Vec4};

bitflags! {
    /// Optional attributes carried by every vertex of a buffer
    ///
    /// Positions are always present and have no flag.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u8 {
        /// Texture (uv) coordinates
        const TEXTURE = 0b01;
        /// Normal vectors
        const NORMAL = 0b10;
    }
}

impl Capabilities {
    /// Build the capability signature from the two attribute flags
    pub fn from_attributes(has_texture: bool, has_normal: bool) -> Self {
        let mut caps = Self::empty();
        caps.set(Self::TEXTURE, has_texture);
        caps.set(Self::NORMAL, has_normal);
        caps
    }

    /// Whether texture coordinates are carried
    pub const fn has_texture(self) -> bool {
        self.contains(Self::TEXTURE)
    }

    /// Whether normals are carried
    pub const fn has_normal(self) -> bool {
        self.contains(Self::NORMAL)
    }
}

/// One unique vertex: a position plus optional texture coordinate and normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexAttributes {
    /// Homogeneous position, `w` is 1.0 unless the file says otherwise
    pub position: Vec4,
    /// Texture coordinate
    pub texture: Option<Vec2>,
    /// Normal vector, not necessarily unit length
    pub normal: Option<Vec3>,
}

impl VertexAttributes {
    /// Vertex with a position only
    pub const fn new(position: Vec4) -> Self {
        Self {
            position,
            texture: None,
            normal: None,
        }
    }

    /// Attach a texture coordinate
    pub const fn with_texture(mut self, texture: Vec2) -> Self {
        self.texture = Some(texture);
        self
    }

    /// Attach a normal
    pub const fn with_normal(mut self, normal: Vec3) -> Self {
        self.normal = Some(normal);
        self
    }

    /// Attributes present on this vertex
    pub fn capabilities(&self) -> Capabilities {
        Capabilities::from_attributes(self.texture.is_some(), self.normal.is_some())
    }

    fn bit_key(&self) -> VertexKey {
        VertexKey {
            position: self.position.map(f32::to_bits).into(),
            texture: self.texture.map(|t| t.map(f32::to_bits).into()),
            normal: self.normal.map(|n| n.map(f32::to_bits).into()),
        }
    }
}

/// Exact bit pattern of a vertex, used by [`DedupStrategy::Hashed`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct VertexKey {
    position: [u32; 4],
    texture: Option<[u32; 2]>,
    normal: Option<[u32; 3]>,
}

/// Contiguous run of indices in one [`VertexBuffer`]
///
/// All faces of one group/material combination parsed without interruption
/// end up in a single range. Polygons are kept as written, so the consumer
/// decides how to triangulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexRange {
    /// Buffer in [`VertexSet::buffers`]
    pub buffer_index: usize,
    /// First entry in [`VertexBuffer::indices`]
    pub start_index: usize,
    /// Number of index entries
    pub length: usize,
}

impl IndexRange {
    /// Empty range starting nowhere in `buffer_index`
    pub const fn new(buffer_index: usize) -> Self {
        Self {
            buffer_index,
            start_index: 0,
            length: 0,
        }
    }

    /// One past the last index entry
    pub const fn end(&self) -> usize {
        self.start_index + self.length
    }

    /// The range as a slice range into [`VertexBuffer::indices`]
    pub const fn as_range(&self) -> Range<usize> {
        self.start_index..self.end()
    }
}

/// Unique vertices sharing one capability signature, plus draw-order indices
///
/// `positions`, `textures` and `normals` are parallel arrays. Arrays for
/// attributes the buffer does not carry stay empty.
#[derive(Debug, Clone)]
pub struct VertexBuffer {
    /// Vertex positions (always available)
    pub positions: Vec<Vec4>,
    /// Texture coordinates, empty without [`Capabilities::TEXTURE`]
    pub textures: Vec<Vec2>,
    /// Normals, empty without [`Capabilities::NORMAL`]
    pub normals: Vec<Vec3>,
    /// Draw-order indices into the vertex arrays
    pub indices: Vec<u32>,
    capabilities: Capabilities,
    dedup: Option<DedupStrategy>,
    lookup: HashMap<VertexKey, u32>,
}

impl VertexBuffer {
    /// Create an empty buffer with linear-scan deduplication
    pub fn new(capabilities: Capabilities) -> Self {
        Self::with_dedup(capabilities, Some(DedupStrategy::LinearScan))
    }

    /// Create an empty buffer; `None` disables deduplication
    pub fn with_dedup(capabilities: Capabilities, dedup: Option<DedupStrategy>) -> Self {
        Self {
            positions: Vec::new(),
            textures: Vec::new(),
            normals: Vec::new(),
            indices: Vec::new(),
            capabilities,
            dedup,
            lookup: HashMap::new(),
        }
    }

    /// Capability signature fixed at creation
    pub const fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Whether vertices carry texture coordinates
    pub const fn has_texture(&self) -> bool {
        self.capabilities.has_texture()
    }

    /// Whether vertices carry normals
    pub const fn has_normal(&self) -> bool {
        self.capabilities.has_normal()
    }

    /// Number of unique vertices
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether no vertex has been stored yet
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Stored vertex at `index`
    pub fn vertex(&self, index: usize) -> Option<VertexAttributes> {
        let position = *self.positions.get(index)?;
        Some(VertexAttributes {
            position,
            texture: self.textures.get(index).copied(),
            normal: self.normals.get(index).copied(),
        })
    }

    /// Store a vertex and return its index in this buffer
    ///
    /// An identical vertex already in the buffer is reused. The vertex must
    /// carry exactly the attributes of the buffer.
    pub fn add_vertex(&mut self, vertex: &VertexAttributes) -> Result<u32, ObjError> {
        let found = vertex.capabilities();
        if found != self.capabilities {
            return Err(ObjError::CapabilityMismatch {
                expected: self.capabilities,
                found,
                line: None,
            });
        }

        match self.dedup {
            Some(DedupStrategy::LinearScan) => {
                if let Some(index) = self.find_linear(vertex) {
                    return Ok(index);
                }
            }
            Some(DedupStrategy::Hashed) => {
                if let Some(&index) = self.lookup.get(&vertex.bit_key()) {
                    return Ok(index);
                }
            }
            None => {}
        }

        let index = self.positions.len() as u32;
        self.positions.push(vertex.position);
        if let Some(texture) = vertex.texture {
            self.textures.push(texture);
        }
        if let Some(normal) = vertex.normal {
            self.normals.push(normal);
        }
        if self.dedup == Some(DedupStrategy::Hashed) {
            self.lookup.insert(vertex.bit_key(), index);
        }

        Ok(index)
    }

    fn find_linear(&self, vertex: &VertexAttributes) -> Option<u32> {
        (0..self.positions.len())
            .find(|&i| {
                self.positions[i] == vertex.position
                    && vertex.texture.map_or(true, |t| self.textures[i] == t)
                    && vertex.normal.map_or(true, |n| self.normals[i] == n)
            })
            .map(|i| i as u32)
    }

    /// Append a draw-order index, returning its position in `indices`
    pub fn add_index(&mut self, vertex_index: u32) -> usize {
        self.indices.push(vertex_index);
        self.indices.len() - 1
    }

    /// Index entries covered by `range`, empty if it lies outside this buffer
    pub fn range_indices(&self, range: &IndexRange) -> &[u32] {
        self.indices.get(range.as_range()).unwrap_or(&[])
    }
}

/// Faces of one range as `(group, material, range)`
pub type RangeEntry<'a> = (&'a str, &'a str, &'a IndexRange);

/// Material name -> face ranges
pub type MaterialFaces = BTreeMap<String, Vec<IndexRange>>;

/// Vertex data of a single OBJ object
///
/// Faces are divided by group and then by material; each bucket keeps its
/// ranges in the order they were parsed.
#[derive(Debug, Clone)]
pub struct VertexSet {
    /// At most one buffer per capability signature
    pub buffers: Vec<VertexBuffer>,
    /// `group_material_faces[group][material]` lists the ranges to draw
    pub group_material_faces: BTreeMap<String, MaterialFaces>,
    dedup: Option<DedupStrategy>,
}

impl Default for VertexSet {
    fn default() -> Self {
        Self::with_dedup(Some(DedupStrategy::LinearScan))
    }
}

impl VertexSet {
    /// Create an empty set with linear-scan deduplication
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty set whose buffers use `dedup`
    pub const fn with_dedup(dedup: Option<DedupStrategy>) -> Self {
        Self {
            buffers: Vec::new(),
            group_material_faces: BTreeMap::new(),
            dedup,
        }
    }

    /// Index of the buffer matching `capabilities`, created if missing
    pub fn buffer_index(&mut self, capabilities: Capabilities) -> usize {
        if let Some(index) = self
            .buffers
            .iter()
            .position(|buffer| buffer.capabilities() == capabilities)
        {
            return index;
        }

        self.buffers.push(VertexBuffer::with_dedup(capabilities, self.dedup));
        self.buffers.len() - 1
    }

    /// Store a vertex in buffer `buffer_index`, returning its vertex index
    ///
    /// # Panics
    /// If `buffer_index` does not name an existing buffer.
    pub fn add_vertex(&mut self, buffer_index: usize, vertex: &VertexAttributes) -> Result<u32, ObjError> {
        self.buffers[buffer_index].add_vertex(vertex)
    }

    /// Append a draw-order index to buffer `buffer_index`
    ///
    /// # Panics
    /// If `buffer_index` does not name an existing buffer.
    pub fn add_vertex_index(&mut self, buffer_index: usize, vertex_index: u32) -> usize {
        self.buffers[buffer_index].add_index(vertex_index)
    }

    /// File a finished range under its group and material
    pub fn add_range(&mut self, group: &str, material: &str, range: IndexRange) {
        self.group_material_faces
            .entry(group.to_string())
            .or_default()
            .entry(material.to_string())
            .or_default()
            .push(range);
    }

    /// Ranges filed under `group` and `material`
    pub fn face_ranges(&self, group: &str, material: &str) -> Option<&[IndexRange]> {
        self.group_material_faces
            .get(group)?
            .get(material)
            .map(Vec::as_slice)
    }

    /// Every range with its group and material, in map order
    pub fn iter_ranges(&self) -> impl Iterator<Item = RangeEntry<'_>> {
        self.group_material_faces.iter().flat_map(|(group, materials)| {
            materials.iter().flat_map(move |(material, ranges)| {
                ranges
                    .iter()
                    .map(move |range| (group.as_str(), material.as_str(), range))
            })
        })
    }

    /// Buffer referenced by `range`
    pub fn buffer_for(&self, range: &IndexRange) -> Option<&VertexBuffer> {
        self.buffers.get(range.buffer_index)
    }

    /// Whether no face range has been filed
    pub fn is_empty(&self) -> bool {
        self.group_material_faces.is_empty()
    }

    /// Drop all buffers and ranges, releasing their memory
    pub fn clear(&mut self) {
        self.buffers = Vec::new();
        self.group_material_faces.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_vertex(x: f32) -> VertexAttributes {
        VertexAttributes::new(Vec4::new(x, 0.0, 0.0, 1.0))
            .with_texture(Vec2::new(x, 1.0))
            .with_normal(Vec3::new(0.0, 0.0, 1.0))
    }

    #[test]
    fn test_capabilities_from_attributes() {
        assert_eq!(Capabilities::from_attributes(false, false), Capabilities::empty());
        assert_eq!(Capabilities::from_attributes(true, false), Capabilities::TEXTURE);
        assert_eq!(Capabilities::from_attributes(true, true), Capabilities::all());
        assert!(Capabilities::NORMAL.has_normal());
        assert!(!Capabilities::NORMAL.has_texture());
    }

    #[test]
    fn test_duplicate_vertex_reuses_index() {
        let mut buffer = VertexBuffer::new(Capabilities::all());
        let a = buffer.add_vertex(&full_vertex(1.0)).unwrap();
        let b = buffer.add_vertex(&full_vertex(2.0)).unwrap();
        let c = buffer.add_vertex(&full_vertex(1.0)).unwrap();

        assert_eq!(a, 0);
        assert_eq!(b, 1);
        assert_eq!(c, a);
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.textures.len(), 2);
        assert_eq!(buffer.normals.len(), 2);
    }

    #[test]
    fn test_hashed_dedup_matches_linear() {
        let mut buffer = VertexBuffer::with_dedup(Capabilities::all(), Some(DedupStrategy::Hashed));
        let a = buffer.add_vertex(&full_vertex(3.0)).unwrap();
        let b = buffer.add_vertex(&full_vertex(3.0)).unwrap();
        assert_eq!(a, b);
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_disabled_dedup_appends_every_vertex() {
        let mut buffer = VertexBuffer::with_dedup(Capabilities::empty(), None);
        let v = VertexAttributes::new(Vec4::new(1.0, 2.0, 3.0, 1.0));
        assert_eq!(buffer.add_vertex(&v).unwrap(), 0);
        assert_eq!(buffer.add_vertex(&v).unwrap(), 1);
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_texture_into_plain_buffer_is_rejected() {
        let mut buffer = VertexBuffer::new(Capabilities::NORMAL);
        let result = buffer.add_vertex(&full_vertex(1.0));
        assert!(matches!(
            result,
            Err(ObjError::CapabilityMismatch { expected, found, .. })
                if expected == Capabilities::NORMAL && found == Capabilities::all()
        ));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_missing_attribute_is_rejected() {
        let mut buffer = VertexBuffer::new(Capabilities::all());
        let plain = VertexAttributes::new(Vec4::new(0.0, 0.0, 0.0, 1.0));
        assert!(buffer.add_vertex(&plain).is_err());
    }

    #[test]
    fn test_vertex_lookup() {
        let mut buffer = VertexBuffer::new(Capabilities::all());
        buffer.add_vertex(&full_vertex(5.0)).unwrap();
        assert_eq!(buffer.vertex(0), Some(full_vertex(5.0)));
        assert_eq!(buffer.vertex(1), None);
    }

    #[test]
    fn test_buffer_index_routes_by_capabilities() {
        let mut set = VertexSet::new();
        let textured = set.buffer_index(Capabilities::all());
        let plain = set.buffer_index(Capabilities::empty());
        assert_ne!(textured, plain);
        assert_eq!(set.buffer_index(Capabilities::all()), textured);
        assert_eq!(set.buffer_index(Capabilities::empty()), plain);
        assert_eq!(set.buffers.len(), 2);
    }

    #[test]
    fn test_ranges_keep_insertion_order() {
        let mut set = VertexSet::new();
        let buffer = set.buffer_index(Capabilities::empty());
        let first = IndexRange { buffer_index: buffer, start_index: 0, length: 3 };
        let second = IndexRange { buffer_index: buffer, start_index: 3, length: 6 };
        set.add_range("hull", "steel", first);
        set.add_range("hull", "steel", second);
        set.add_range("", "", first);

        assert_eq!(set.face_ranges("hull", "steel"), Some(&[first, second][..]));
        assert_eq!(set.face_ranges("hull", "glass"), None);

        let entries: Vec<_> = set.iter_ranges().collect();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], ("", "", &first));
        assert_eq!(entries[2], ("hull", "steel", &second));
    }

    #[test]
    fn test_range_indices_slice() {
        let mut buffer = VertexBuffer::new(Capabilities::empty());
        for i in [0, 1, 2, 2, 1, 3] {
            buffer.add_index(i);
        }
        let range = IndexRange { buffer_index: 0, start_index: 3, length: 3 };
        assert_eq!(buffer.range_indices(&range), &[2, 1, 3]);

        let outside = IndexRange { buffer_index: 0, start_index: 5, length: 4 };
        assert!(buffer.range_indices(&outside).is_empty());
    }

    #[test]
    fn test_clear_releases_everything() {
        let mut set = VertexSet::new();
        let buffer = set.buffer_index(Capabilities::empty());
        set.add_range("", "", IndexRange::new(buffer));
        assert!(!set.is_empty());

        set.clear();
        assert!(set.is_empty());
        assert!(set.buffers.is_empty());
    }
}
