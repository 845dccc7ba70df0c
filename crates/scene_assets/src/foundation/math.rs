//! Math utilities and types
//!
//! Vector aliases used by parsed models. Positions are homogeneous
//! (`w` defaults to 1.0), texture coordinates are 2D, normals 3D.

pub use nalgebra::{Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// Project a homogeneous position to 3D
///
/// Divides by `w` unless it is zero, in which case the xyz part is returned
/// unchanged.
pub fn dehomogenize(position: &Vec4) -> Vec3 {
    if position.w == 0.0 {
        position.xyz()
    } else {
        position.xyz() / position.w
    }
}
