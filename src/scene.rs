//! Scene state and the per-frame transform updates.
//!
//! The scene is fixed: a ground plane, a cube spinning above it, and a small
//! cube marking the light. [`SceneState`] owns the camera, the light, their
//! projections and one [`MeshConstants`] per object. The renderer drives it
//! through two updates per frame:
//!
//! 1. [`SceneState::update_light_pass`]: shadow casters get their
//!    light-relative transform, written to both matrices
//! 2. [`SceneState::update_camera_pass`]: every object gets its
//!    camera-relative transform; the light-relative matrix stays
//!
//! Nothing here touches the GPU, so the whole frame update is testable.

use glam::{Mat4, Vec3};

use crate::camera::Camera;
use crate::error::TransformError;
use crate::transform::{TransformExt, translation};

/// The drawable objects of the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SceneObject {
    Plane,
    Cube,
    LightIndicator,
}

impl SceneObject {
    pub const ALL: [SceneObject; 3] = [
        SceneObject::Plane,
        SceneObject::Cube,
        SceneObject::LightIndicator,
    ];

    /// Objects drawn into the shadow map. The light marker sits at the light
    /// itself and would cover the whole map.
    pub const SHADOW_CASTERS: [SceneObject; 2] = [SceneObject::Plane, SceneObject::Cube];

    pub fn casts_shadow(self) -> bool {
        !matches!(self, SceneObject::LightIndicator)
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            SceneObject::Plane => "Plane",
            SceneObject::Cube => "Cube",
            SceneObject::LightIndicator => "Light Indicator",
        }
    }
}

/// Per-object transform bundle uploaded as a uniform block.
///
/// Matches `MeshConstants` in the WGSL shaders (128 bytes).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshConstants {
    /// Object space to the clip space of whichever viewpoint is rendering.
    pub model_view_projection: [[f32; 4]; 4],
    /// Object space to the light's clip space, for shadow-map lookups.
    pub shadow_view_projection: [[f32; 4]; 4],
}

impl Default for MeshConstants {
    fn default() -> Self {
        Self {
            model_view_projection: Mat4::IDENTITY.to_cols_array_2d(),
            shadow_view_projection: Mat4::IDENTITY.to_cols_array_2d(),
        }
    }
}

impl MeshConstants {
    pub fn model_view_projection(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.model_view_projection)
    }

    pub fn shadow_view_projection(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.shadow_view_projection)
    }
}

/// Placement and animation parameters of the scene.
#[derive(Clone, Copy, Debug)]
pub struct SceneConfig {
    pub camera: Camera,
    /// Viewpoint of the shadow pass. Its projection is always square.
    pub light: Camera,
    /// Side length of the square ground plane.
    pub plane_size: f32,
    /// Height of the ground plane.
    pub plane_height: f32,
    /// Edge length of the spinning cube.
    pub cube_size: f32,
    /// Cube spin around the world Y axis, radians per second.
    pub rotation_speed: f32,
    /// Edge length of the light marker.
    pub indicator_size: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            camera: Camera::new()
                .at(0.0, 2.5, 6.0)
                .looking_at(0.0, -0.5, 0.0)
                .with_fov(75.0)
                .with_clip(0.1, 100.0),
            light: Camera::new()
                .at(2.0, 5.0, 2.0)
                .looking_at(0.0, 0.0, 0.0)
                .with_fov(75.0)
                .with_clip(1.0, 20.0),
            plane_size: 5.0,
            plane_height: -1.0,
            cube_size: 1.0,
            rotation_speed: 0.8,
            indicator_size: 0.15,
        }
    }
}

impl SceneConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn camera(mut self, camera: Camera) -> Self {
        self.camera = camera;
        self
    }

    pub fn light(mut self, light: Camera) -> Self {
        self.light = light;
        self
    }

    pub fn rotation_speed(mut self, radians_per_second: f32) -> Self {
        self.rotation_speed = radians_per_second;
        self
    }
}

/// Everything the frame update reads and writes.
#[derive(Clone, Debug)]
pub struct SceneState {
    config: SceneConfig,
    camera_view: Mat4,
    camera_projection: Mat4,
    light_view: Mat4,
    light_projection: Mat4,
    cube_angle: f32,
    constants: [MeshConstants; 3],
}

impl SceneState {
    /// Builds the scene for a surface of the given size.
    ///
    /// Fails if either viewpoint has an invalid projection.
    pub fn new(config: SceneConfig, width: u32, height: u32) -> Result<Self, TransformError> {
        let light_projection = config.light.projection_matrix(1.0)?;
        let camera_projection = config
            .camera
            .projection_matrix(aspect_ratio(width, height))?;

        Ok(Self {
            camera_view: config.camera.view_matrix()?,
            camera_projection,
            light_view: config.light.view_matrix()?,
            light_projection,
            cube_angle: 0.0,
            constants: [MeshConstants::default(); 3],
            config,
        })
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Recomputes the camera projection for a new surface size.
    ///
    /// Zero-sized surfaces (a minimized window) are ignored. The light
    /// projection is untouched: the shadow map does not change size.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), TransformError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.camera_projection = self
            .config
            .camera
            .projection_matrix(aspect_ratio(width, height))?;
        Ok(())
    }

    /// Advances the cube's spin by one frame of `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        let angle = self.cube_angle + self.config.rotation_speed * dt;
        self.cube_angle = angle % std::f32::consts::TAU;
    }

    pub fn cube_angle(&self) -> f32 {
        self.cube_angle
    }

    pub fn camera_projection(&self) -> Mat4 {
        self.camera_projection
    }

    pub fn light_projection(&self) -> Mat4 {
        self.light_projection
    }

    /// Light view and projection combined.
    pub fn light_view_projection(&self) -> Mat4 {
        self.light_projection * self.light_view
    }

    /// Camera view and projection combined.
    pub fn camera_view_projection(&self) -> Mat4 {
        self.camera_projection * self.camera_view
    }

    /// Object-to-world transform for the current frame.
    pub fn model_matrix(&self, object: SceneObject) -> Mat4 {
        let config = &self.config;
        match object {
            SceneObject::Plane => translation(0.0, config.plane_height, 0.0).scaled_by(
                config.plane_size,
                1.0,
                config.plane_size,
            ),
            SceneObject::Cube => Mat4::IDENTITY
                .rotated_by(self.cube_angle, 0.0, 1.0, 0.0)
                .scaled_by(config.cube_size, config.cube_size, config.cube_size),
            SceneObject::LightIndicator => {
                let Vec3 { x, y, z } = config.light.position;
                let s = config.indicator_size;
                translation(x, y, z).scaled_by(s, s, s)
            }
        }
    }

    /// Computes the light-relative transform of every shadow caster and
    /// stores it in both `model_view_projection` (for the shadow pass) and
    /// `shadow_view_projection` (for the main pass's lookup).
    pub fn update_light_pass(&mut self) {
        let light_view_projection = self.light_view_projection();
        for object in SceneObject::SHADOW_CASTERS {
            let mvp = (light_view_projection * self.model_matrix(object)).to_cols_array_2d();
            let constants = &mut self.constants[object.index()];
            constants.model_view_projection = mvp;
            constants.shadow_view_projection = mvp;
        }
    }

    /// Computes the camera-relative transform of every object, leaving each
    /// `shadow_view_projection` as the light pass wrote it.
    pub fn update_camera_pass(&mut self) {
        let camera_view_projection = self.camera_view_projection();
        for object in SceneObject::ALL {
            self.constants[object.index()].model_view_projection =
                (camera_view_projection * self.model_matrix(object)).to_cols_array_2d();
        }
    }

    pub fn constants(&self, object: SceneObject) -> &MeshConstants {
        &self.constants[object.index()]
    }
}

fn aspect_ratio(width: u32, height: u32) -> f32 {
    if width == 0 || height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> SceneState {
        SceneState::new(SceneConfig::default(), 800, 600).unwrap()
    }

    #[test]
    fn mesh_constants_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<MeshConstants>(), 128);
    }

    #[test]
    fn light_pass_writes_both_matrices() {
        let mut scene = scene();
        scene.update_light_pass();

        for object in SceneObject::SHADOW_CASTERS {
            let constants = scene.constants(object);
            let expected = scene.light_view_projection() * scene.model_matrix(object);
            assert_eq!(constants.model_view_projection(), expected);
            assert_eq!(constants.shadow_view_projection(), expected);
        }
    }

    #[test]
    fn light_pass_skips_the_indicator() {
        let mut scene = scene();
        scene.update_light_pass();
        assert_eq!(
            *scene.constants(SceneObject::LightIndicator),
            MeshConstants::default()
        );
    }

    #[test]
    fn camera_pass_keeps_shadow_matrix() {
        let mut scene = scene();
        scene.update_light_pass();
        let from_light = scene.constants(SceneObject::Cube).shadow_view_projection;

        scene.update_camera_pass();

        let cube = scene.constants(SceneObject::Cube);
        assert_eq!(cube.shadow_view_projection, from_light);
        assert_eq!(
            cube.model_view_projection(),
            scene.camera_view_projection() * scene.model_matrix(SceneObject::Cube)
        );
        assert_ne!(cube.model_view_projection, cube.shadow_view_projection);
    }

    #[test]
    fn resize_scales_x_by_inverse_aspect_only() {
        let mut scene = scene();
        let before = scene.camera_projection();

        scene.resize(1600, 400).unwrap();
        let after = scene.camera_projection();

        // 800x600 -> 1600x400: aspect goes from 4/3 to 4.
        let ratio = (4.0 / 3.0) / 4.0;
        assert!((after.x_axis.x - before.x_axis.x * ratio).abs() < 1e-5);
        assert_eq!(after.y_axis.y, before.y_axis.y);
    }

    #[test]
    fn resize_is_idempotent_and_ignores_zero() {
        let mut scene = scene();
        scene.resize(1024, 768).unwrap();
        let once = scene.camera_projection();
        scene.resize(1024, 768).unwrap();
        assert_eq!(scene.camera_projection(), once);

        scene.resize(0, 768).unwrap();
        assert_eq!(scene.camera_projection(), once);
    }

    #[test]
    fn resize_leaves_light_projection() {
        let mut scene = scene();
        let light = scene.light_projection();
        scene.resize(300, 900).unwrap();
        assert_eq!(scene.light_projection(), light);
    }

    #[test]
    fn advance_spins_the_cube() {
        let mut scene = scene();
        let still = scene.model_matrix(SceneObject::Cube);
        scene.advance(0.5);
        assert!((scene.cube_angle() - 0.4).abs() < 1e-6);
        assert_ne!(scene.model_matrix(SceneObject::Cube), still);
        // Plane is static.
        let plane = scene.model_matrix(SceneObject::Plane);
        scene.advance(0.5);
        assert_eq!(scene.model_matrix(SceneObject::Plane), plane);
    }

    #[test]
    fn indicator_sits_at_the_light() {
        let scene = scene();
        let center = scene
            .model_matrix(SceneObject::LightIndicator)
            .transform_point3(Vec3::ZERO);
        assert_eq!(center, scene.config().light.position);
    }

    #[test]
    fn invalid_camera_fails_construction() {
        let config = SceneConfig::default().camera(Camera::new().with_clip(0.0, 10.0));
        assert!(SceneState::new(config, 800, 600).is_err());
    }

    #[test]
    fn only_the_indicator_casts_no_shadow() {
        let casters: Vec<_> = SceneObject::ALL
            .into_iter()
            .filter(|o| o.casts_shadow())
            .collect();
        assert_eq!(casters, SceneObject::SHADOW_CASTERS);
    }
}
