//! Matrix factories for model, view and projection transforms.
//!
//! All matrices are [`glam::Mat4`] values: column-major and right-handed. A
//! product `a * b` applies `b` first in object space, so a chain like
//!
//! ```
//! use umbra::transform::{translation, TransformExt};
//!
//! let model = translation(0.0, 1.0, 0.0)
//!     .rotated_by(0.5, 0.0, 1.0, 0.0)
//!     .scaled_by(2.0, 2.0, 2.0);
//! ```
//!
//! scales the object, then rotates it, then moves it up one unit.
//!
//! # Depth convention
//!
//! [`perspective`] maps view-space depth `-near` to 0 and `-far` to 1. That is
//! the depth range wgpu rasterizes into, and it pairs with the `Less` depth
//! compare used by both render passes.

use glam::{Mat3, Mat4, Vec3, Vec4};

use crate::error::TransformError;

/// Translation by `(x, y, z)`. `translation(0.0, 0.0, 0.0)` is the identity.
pub fn translation(x: f32, y: f32, z: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(x, y, z))
}

/// Non-uniform scale along each axis.
pub fn scale(x: f32, y: f32, z: f32) -> Mat4 {
    Mat4::from_scale(Vec3::new(x, y, z))
}

/// Rotation of `angle` radians around the axis `(x, y, z)` (Rodrigues' formula).
///
/// The axis is used as given. Passing a unit-length axis is the caller's job:
/// a non-unit axis produces an affine transform that is not a rotation.
pub fn rotation(angle: f32, x: f32, y: f32, z: f32) -> Mat4 {
    let (s, c) = angle.sin_cos();
    let t = 1.0 - c;

    Mat4::from_cols(
        Vec4::new(t * x * x + c, t * x * y + s * z, t * x * z - s * y, 0.0),
        Vec4::new(t * x * y - s * z, t * y * y + c, t * y * z + s * x, 0.0),
        Vec4::new(t * x * z + s * y, t * y * z - s * x, t * z * z + c, 0.0),
        Vec4::W,
    )
}

/// Right-handed perspective projection into wgpu clip space.
///
/// Fails when `near <= 0`, `far <= near`, `aspect <= 0`, or `fov_y` is
/// outside `(0, π)`.
pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Result<Mat4, TransformError> {
    let invalid = |reason| TransformError::InvalidPerspective {
        fov_y,
        aspect,
        near,
        far,
        reason,
    };

    // Negated comparisons so NaN is rejected as well.
    if !(near > 0.0) {
        return Err(invalid("near must be positive"));
    }
    if !(far > near) {
        return Err(invalid("far must be greater than near"));
    }
    if !(aspect > 0.0) {
        return Err(invalid("aspect must be positive"));
    }
    if !(fov_y > 0.0 && fov_y < std::f32::consts::PI) {
        return Err(invalid("fov_y must lie in (0, pi)"));
    }

    Ok(Mat4::perspective_rh(fov_y, aspect, near, far))
}

/// Matrix product `a * b`. Not commutative: `b` is applied first.
pub fn multiply(a: Mat4, b: Mat4) -> Mat4 {
    a * b
}

/// The upper-left 3x3 block (rotation and scale, no translation).
pub fn upper_left_3x3(m: Mat4) -> Mat3 {
    Mat3::from_mat4(m)
}

pub fn degrees_to_radians(degrees: f32) -> f32 {
    degrees * (std::f32::consts::PI / 180.0)
}

pub fn radians_to_degrees(radians: f32) -> f32 {
    radians * (180.0 / std::f32::consts::PI)
}

/// Chained transform composition.
///
/// Each method returns `multiply(self, new_transform)`, so the transform added
/// last is the one applied first to the object's vertices.
pub trait TransformExt: Sized {
    fn translated_by(self, x: f32, y: f32, z: f32) -> Self;
    fn scaled_by(self, x: f32, y: f32, z: f32) -> Self;
    fn rotated_by(self, angle: f32, x: f32, y: f32, z: f32) -> Self;
}

impl TransformExt for Mat4 {
    fn translated_by(self, x: f32, y: f32, z: f32) -> Self {
        multiply(self, translation(x, y, z))
    }

    fn scaled_by(self, x: f32, y: f32, z: f32) -> Self {
        multiply(self, scale(x, y, z))
    }

    fn rotated_by(self, angle: f32, x: f32, y: f32, z: f32) -> Self {
        multiply(self, rotation(angle, x, y, z))
    }
}
