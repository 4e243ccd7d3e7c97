use glam::{Mat4, Vec3};

use crate::error::TransformError;
use crate::transform::{degrees_to_radians, perspective};

/// A point of view in the scene: where it sits, what it looks at, and how wide
/// it sees.
///
/// Used for both the viewer's camera and the light, since the shadow pass
/// renders the scene exactly as a camera placed at the light would.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y: f32, // radians
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: degrees_to_radians(75.0),
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, x: f32, y: f32, z: f32) -> Self {
        self.position = Vec3::new(x, y, z);
        self
    }

    pub fn looking_at(mut self, x: f32, y: f32, z: f32) -> Self {
        self.target = Vec3::new(x, y, z);
        self
    }

    pub fn with_fov(mut self, fov_degrees: f32) -> Self {
        self.fov_y = degrees_to_radians(fov_degrees);
        self
    }

    pub fn with_clip(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    /// World-to-view transform.
    ///
    /// Fails when the position equals the target or the view direction is
    /// parallel to `up`, where the view basis is undefined.
    pub fn view_matrix(&self) -> Result<Mat4, TransformError> {
        let invalid = |reason| TransformError::InvalidView {
            position: self.position,
            target: self.target,
            up: self.up,
            reason,
        };

        let forward = self.forward();
        if forward == Vec3::ZERO {
            return Err(invalid("position and target coincide"));
        }
        if forward.cross(self.up.normalize_or_zero()).length_squared() < 1e-12 {
            return Err(invalid("view direction is parallel to up"));
        }

        Ok(Mat4::look_at_rh(self.position, self.target, self.up))
    }

    /// View-to-clip transform for a viewport of the given aspect ratio.
    pub fn projection_matrix(&self, aspect: f32) -> Result<Mat4, TransformError> {
        perspective(self.fov_y, aspect, self.near, self.far)
    }

    /// Unit vector from the position toward the target.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_matrix_puts_target_on_negative_z() {
        let camera = Camera::new().at(3.0, 4.0, 0.0).looking_at(0.0, 0.0, 0.0);
        let target_in_view = camera.view_matrix().unwrap().transform_point3(Vec3::ZERO);
        assert!(target_in_view.abs_diff_eq(Vec3::new(0.0, 0.0, -5.0), 1e-5));
    }

    #[test]
    fn invalid_clip_planes_fail_projection() {
        let camera = Camera::new().with_clip(10.0, 1.0);
        assert!(camera.projection_matrix(1.0).is_err());
    }

    #[test]
    fn straight_down_view_is_rejected() {
        let camera = Camera::new().at(0.0, 5.0, 0.0).looking_at(0.0, 0.0, 0.0);
        assert!(matches!(
            camera.view_matrix(),
            Err(TransformError::InvalidView { .. })
        ));

        // The same viewpoint works with an up axis that is not vertical.
        let tilted = Camera { up: Vec3::Z, ..camera };
        let view = tilted.view_matrix().unwrap();
        assert!(view.is_finite());
    }

    #[test]
    fn coincident_position_and_target_is_rejected() {
        let camera = Camera::new().at(1.0, 2.0, 3.0).looking_at(1.0, 2.0, 3.0);
        assert!(matches!(
            camera.view_matrix(),
            Err(TransformError::InvalidView { .. })
        ));
    }

    #[test]
    fn forward_is_normalized() {
        let camera = Camera::new().at(0.0, 10.0, 0.0).looking_at(0.0, 0.0, 0.0);
        assert!(camera.forward().abs_diff_eq(-Vec3::Y, 1e-6));
    }
}
