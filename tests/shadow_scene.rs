//! The shadow test on the default scene, run through the CPU rasterizer.

use umbra::{DepthRaster, Geometry, SceneConfig, SceneObject, SceneState, ShadowCoord, Vec3};

const BIAS: f32 = 0.001;

/// Renders the shadow casters from the light, as the shadow pass does.
fn shadow_map(scene: &mut SceneState, size: u32) -> DepthRaster {
    scene.update_light_pass();

    let mut raster = DepthRaster::new(size);
    for object in SceneObject::SHADOW_CASTERS {
        let geometry = match object {
            SceneObject::Plane => Geometry::plane(),
            _ => Geometry::cube(),
        };
        let mvp = scene.constants(object).model_view_projection();
        raster.draw(mvp, geometry.triangles());
    }
    raster
}

fn light_at(scene: &SceneState, raster: &DepthRaster, point: Vec3) -> f32 {
    raster.compare(ShadowCoord::from_world(
        scene.light_view_projection(),
        point,
        BIAS,
    ))
}

#[test]
fn ground_beneath_the_cube_is_shadowed() {
    let mut scene = SceneState::new(SceneConfig::default(), 1280, 720).unwrap();
    let raster = shadow_map(&mut scene, 1024);

    assert_eq!(light_at(&scene, &raster, Vec3::new(0.0, -1.0, 0.0)), 0.0);
}

#[test]
fn far_ground_is_lit() {
    let mut scene = SceneState::new(SceneConfig::default(), 1280, 720).unwrap();
    let raster = shadow_map(&mut scene, 1024);

    assert_eq!(light_at(&scene, &raster, Vec3::new(-2.0, -1.0, 2.0)), 1.0);
    assert_eq!(light_at(&scene, &raster, Vec3::new(2.0, -1.0, -2.0)), 1.0);
}

#[test]
fn shadow_follows_the_spinning_cube() {
    let mut scene = SceneState::new(SceneConfig::default(), 800, 600).unwrap();

    for _ in 0..8 {
        scene.advance(0.37);
        let raster = shadow_map(&mut scene, 512);
        assert_eq!(light_at(&scene, &raster, Vec3::new(0.0, -1.0, 0.0)), 0.0);
        assert_eq!(light_at(&scene, &raster, Vec3::new(-2.0, -1.0, 2.0)), 1.0);
    }
}

#[test]
fn camera_pass_keeps_the_light_transform() {
    let mut scene = SceneState::new(SceneConfig::default(), 1280, 720).unwrap();
    scene.update_light_pass();
    let light = scene.constants(SceneObject::Cube).shadow_view_projection();

    scene.update_camera_pass();
    let constants = scene.constants(SceneObject::Cube);
    assert_eq!(constants.shadow_view_projection(), light);
    assert_ne!(constants.model_view_projection(), light);
}
