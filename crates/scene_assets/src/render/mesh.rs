//! Mesh representation for 3D models
//!
//! Converts [`VertexBuffer`] contents into interleaved vertices and triangle
//! indices. Polygons are fan-triangulated, which is correct for the convex
//! faces exporters write.
//!
//! # Memory Layout
//! Each vertex is eight floats: position (3), normal (3), texture
//! coordinate (2). Missing normals and texture coordinates are zero.

use crate::assets::{IndexRange, VertexBuffer};
use crate::foundation::math::dehomogenize;

/// Floats per interleaved vertex
pub const FLOATS_PER_VERTEX: usize = 8;

/// 3D vertex data structure for rendering
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vertex {
    /// Position in 3D space
    pub position: [f32; 3],

    /// Normal vector
    pub normal: [f32; 3],

    /// Texture coordinates
    pub tex_coord: [f32; 2],
}

impl Vertex {
    /// Create a new vertex
    pub const fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coord,
        }
    }

    /// Vertex as eight interleaved floats
    pub const fn to_array(&self) -> [f32; FLOATS_PER_VERTEX] {
        let [px, py, pz] = self.position;
        let [nx, ny, nz] = self.normal;
        let [u, v] = self.tex_coord;
        [px, py, pz, nx, ny, nz, u, v]
    }
}

/// Triangle mesh ready for GPU upload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Unique vertices
    pub vertices: Vec<Vertex>,

    /// Triangle list indices into `vertices`
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create a mesh from raw parts
    pub const fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Vertices of `buffer` in the interleaved layout
    pub fn vertices_of(buffer: &VertexBuffer) -> Vec<Vertex> {
        (0..buffer.len())
            .filter_map(|i| buffer.vertex(i))
            .map(|v| {
                Vertex::new(
                    dehomogenize(&v.position).into(),
                    v.normal.map_or([0.0; 3], Into::into),
                    v.texture.map_or([0.0; 2], Into::into),
                )
            })
            .collect()
    }

    /// Build a triangle mesh from one face range
    ///
    /// `face_size` is the number of vertices per face in the range; ranges do
    /// not record it, the caller knows how the file was exported.
    ///
    /// # Returns
    /// `None` if `face_size` is below 3, the range does not split into whole
    /// faces, or it lies outside `buffer`.
    pub fn from_range(buffer: &VertexBuffer, range: &IndexRange, face_size: usize) -> Option<Self> {
        if face_size < 3 || range.length % face_size != 0 || range.end() > buffer.indices.len() {
            return None;
        }

        let indices = buffer
            .range_indices(range)
            .chunks_exact(face_size)
            .flat_map(|face| {
                (1..face.len() - 1).flat_map(move |i| [face[0], face[i], face[i + 1]])
            })
            .collect();

        Some(Self::new(Self::vertices_of(buffer), indices))
    }

    /// Build a triangle mesh from every index of `buffer`
    ///
    /// Only meaningful when all faces in the buffer have `face_size` vertices.
    pub fn from_buffer(buffer: &VertexBuffer, face_size: usize) -> Option<Self> {
        let all = IndexRange {
            buffer_index: 0,
            start_index: 0,
            length: buffer.indices.len(),
        };
        Self::from_range(buffer, &all, face_size)
    }

    /// Build a triangle mesh from a range of triangles
    pub fn triangles(buffer: &VertexBuffer, range: &IndexRange) -> Option<Self> {
        Self::from_range(buffer, range, 3)
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertex data as interleaved floats
    pub fn interleaved(&self) -> Vec<f32> {
        self.vertices.iter().flat_map(Vertex::to_array).collect()
    }

    /// Vertex data as bytes for a vertex buffer upload
    pub fn vertex_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice::<f32, u8>(&self.interleaved()).to_vec()
    }

    /// Index data as bytes for an index buffer upload
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice::<u32, u8>(self.indices.as_slice())
    }
}
