//! The shadow test, on the CPU.
//!
//! The fragment shader in `scene.wgsl` decides whether a point is lit; this
//! module performs the same arithmetic so the algorithm can be checked and
//! debugged without a GPU:
//!
//! - [`ShadowCoord::from_clip`]: light-space clip position to shadow-map
//!   texture coordinates and a biased reference depth
//! - [`DepthRaster`]: a depth-only rasterizer standing in for the shadow pass,
//!   with a comparison lookup that filters like a linear comparison sampler
//!   (`Less`, clamp-to-edge)
//!
//! Keep this file and `scene.wgsl` in step.

use glam::{Mat4, Vec2, Vec3, Vec4, Vec4Swizzles};

/// Where a fragment lands in the shadow map.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowCoord {
    /// Texture coordinates, `[0, 1]` inside the light frustum, `v` pointing down.
    pub uv: Vec2,
    /// Fragment depth as seen from the light, minus the bias.
    pub reference: f32,
}

impl ShadowCoord {
    /// Perspective-divides a light-space clip position, remaps x/y from
    /// `[-1, 1]` to texture space (flipping y to match texture rows) and
    /// subtracts `bias` from the depth.
    pub fn from_clip(clip: Vec4, bias: f32) -> Self {
        let ndc = clip.xyz() / clip.w;
        Self {
            uv: Vec2::new(ndc.x * 0.5 + 0.5, 1.0 - (ndc.y * 0.5 + 0.5)),
            reference: ndc.z - bias,
        }
    }

    /// Projects a world-space point through a light view-projection matrix.
    pub fn from_world(light_view_projection: Mat4, point: Vec3, bias: f32) -> Self {
        Self::from_clip(light_view_projection * point.extend(1.0), bias)
    }
}

/// A square depth buffer filled on the CPU.
#[derive(Clone, Debug)]
pub struct DepthRaster {
    size: u32,
    depth: Vec<f32>,
}

impl DepthRaster {
    /// Largest supported edge length, the default wgpu limit for 2D textures.
    pub const MAX_SIZE: u32 = 8192;

    /// Creates a `size`x`size` buffer cleared to the far plane (1.0).
    ///
    /// `size` is clamped to `1..=MAX_SIZE`.
    pub fn new(size: u32) -> Self {
        let size = Self::clamped(size);
        Self {
            size,
            depth: vec![1.0; texel_count(size)],
        }
    }

    pub fn clear(&mut self) {
        self.depth.fill(1.0);
    }

    /// Stored depth of one texel. Coordinates are clamped to the edge.
    pub fn texel(&self, x: i64, y: i64) -> f32 {
        let max = i64::from(self.size) - 1;
        let (x, y) = (x.clamp(0, max) as usize, y.clamp(0, max) as usize);
        self.depth[self.offset(x, y)]
    }

    /// Rasterizes every triangle of a mesh given the model-to-light-clip matrix.
    pub fn draw<I>(&mut self, model_view_projection: Mat4, triangles: I)
    where
        I: IntoIterator<Item = [[f32; 3]; 3]>,
    {
        for tri in triangles {
            let clip = tri.map(|p| model_view_projection * Vec3::from(p).extend(1.0));
            self.rasterize(clip);
        }
    }

    /// Writes one clip-space triangle with a `Less` depth test.
    ///
    /// Both windings are drawn. Triangles crossing the light's `w = 0` plane
    /// are dropped rather than clipped; the demo scene never produces one.
    pub fn rasterize(&mut self, clip: [Vec4; 3]) {
        if clip.iter().any(|c| c.w <= f32::EPSILON) {
            return;
        }

        let size = self.size as f32;
        let screen = clip.map(|c| {
            let ndc = c.xyz() / c.w;
            Vec3::new(
                (ndc.x * 0.5 + 0.5) * size,
                (1.0 - (ndc.y * 0.5 + 0.5)) * size,
                ndc.z,
            )
        });
        let [a, b, c] = screen;

        let area = edge(a, b, c);
        if area.abs() <= f32::EPSILON {
            return;
        }

        let min_x = a.x.min(b.x).min(c.x).floor().max(0.0) as u32;
        let min_y = a.y.min(b.y).min(c.y).floor().max(0.0) as u32;
        let max_x = (a.x.max(b.x).max(c.x).ceil().min(size) as u32).min(self.size);
        let max_y = (a.y.max(b.y).max(c.y).ceil().min(size) as u32).min(self.size);

        for y in min_y..max_y {
            for x in min_x..max_x {
                let p = Vec3::new(x as f32 + 0.5, y as f32 + 0.5, 0.0);
                let w0 = edge(b, c, p) / area;
                let w1 = edge(c, a, p) / area;
                let w2 = edge(a, b, p) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                // NDC depth is affine in screen space, so no perspective correction.
                let z = w0 * a.z + w1 * b.z + w2 * c.z;
                if !(0.0..=1.0).contains(&z) {
                    continue;
                }

                let offset = self.offset(x as usize, y as usize);
                let slot = &mut self.depth[offset];
                if z < *slot {
                    *slot = z;
                }
            }
        }
    }

    /// Fraction of the 2x2 texel footprint around `coord.uv` whose stored depth
    /// is greater than the reference, blended bilinearly. 1.0 is fully lit,
    /// 0.0 fully shadowed.
    pub fn compare(&self, coord: ShadowCoord) -> f32 {
        let p = coord.uv * self.size as f32 - Vec2::splat(0.5);
        let base = p.floor();
        let f = p - base;
        let (x, y) = (base.x as i64, base.y as i64);

        let lit = |tx, ty| {
            if coord.reference < self.texel(tx, ty) {
                1.0
            } else {
                0.0
            }
        };

        let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;
        let top = lerp(lit(x, y), lit(x + 1, y), f.x);
        let bottom = lerp(lit(x, y + 1), lit(x + 1, y + 1), f.x);
        lerp(top, bottom, f.y)
    }

    fn clamped(size: u32) -> u32 {
        size.clamp(1, Self::MAX_SIZE)
    }

    fn offset(&self, x: usize, y: usize) -> usize {
        y * self.size as usize + x
    }

    /// Stored depth of the texel containing `uv` (no filtering).
    pub fn sample(&self, uv: Vec2) -> f32 {
        let p = uv * self.size as f32;
        self.texel(p.x.floor() as i64, p.y.floor() as i64)
    }
}

fn texel_count(size: u32) -> usize {
    size as usize * size as usize
}

/// Twice the signed area of the triangle `(a, b, p)` in the XY plane.
fn edge(a: Vec3, b: Vec3, p: Vec3) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_center_maps_to_texture_center() {
        let coord = ShadowCoord::from_clip(Vec4::new(0.0, 0.0, 1.0, 2.0), 0.001);
        assert_eq!(coord.uv, Vec2::splat(0.5));
        assert!((coord.reference - 0.499).abs() < 1e-6);
    }

    #[test]
    fn y_is_flipped_for_texture_rows() {
        // Top of NDC (y = +1) is row 0.
        let top = ShadowCoord::from_clip(Vec4::new(-1.0, 1.0, 0.5, 1.0), 0.0);
        assert_eq!(top.uv, Vec2::new(0.0, 0.0));
        let bottom = ShadowCoord::from_clip(Vec4::new(1.0, -1.0, 0.5, 1.0), 0.0);
        assert_eq!(bottom.uv, Vec2::new(1.0, 1.0));
    }

    #[test]
    fn cleared_raster_lights_everything() {
        let raster = DepthRaster::new(16);
        let coord = ShadowCoord {
            uv: Vec2::splat(0.3),
            reference: 0.999,
        };
        assert_eq!(raster.compare(coord), 1.0);
    }

    #[test]
    fn full_screen_triangle_fills_raster() {
        let mut raster = DepthRaster::new(8);
        raster.rasterize([
            Vec4::new(-1.0, -1.0, 0.25, 1.0),
            Vec4::new(3.0, -1.0, 0.25, 1.0),
            Vec4::new(-1.0, 3.0, 0.25, 1.0),
        ]);
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(raster.texel(x, y), 0.25);
            }
        }
    }

    #[test]
    fn nearer_depth_wins() {
        let mut raster = DepthRaster::new(4);
        let quad = |z| {
            [
                Vec4::new(-1.0, -1.0, z, 1.0),
                Vec4::new(3.0, -1.0, z, 1.0),
                Vec4::new(-1.0, 3.0, z, 1.0),
            ]
        };
        raster.rasterize(quad(0.6));
        raster.rasterize(quad(0.3));
        raster.rasterize(quad(0.9));
        assert_eq!(raster.sample(Vec2::splat(0.5)), 0.3);

        raster.clear();
        assert_eq!(raster.sample(Vec2::splat(0.5)), 1.0);
    }

    #[test]
    fn comparison_respects_bias() {
        let mut raster = DepthRaster::new(4);
        raster.rasterize([
            Vec4::new(-1.0, -1.0, 0.5, 1.0),
            Vec4::new(3.0, -1.0, 0.5, 1.0),
            Vec4::new(-1.0, 3.0, 0.5, 1.0),
        ]);

        // A surface exactly at the stored depth is lit only thanks to the bias.
        let on_surface = |bias| ShadowCoord::from_clip(Vec4::new(0.0, 0.0, 0.5, 1.0), bias);
        assert_eq!(raster.compare(on_surface(0.001)), 1.0);
        assert_eq!(raster.compare(on_surface(0.0)), 0.0);

        let behind = ShadowCoord::from_clip(Vec4::new(0.0, 0.0, 0.7, 1.0), 0.001);
        assert_eq!(raster.compare(behind), 0.0);
    }

    #[test]
    fn texel_count_does_not_overflow_u32() {
        assert_eq!(texel_count(65_536), 1 << 32);
        assert_eq!(texel_count(70_000), 4_900_000_000);
    }

    #[test]
    fn oversized_raster_is_clamped() {
        let raster = DepthRaster::new(0);
        assert_eq!(raster.size, 1);
        assert_eq!(raster.texel(5, -5), 1.0);

        assert_eq!(DepthRaster::clamped(70_000), DepthRaster::MAX_SIZE);
        assert_eq!(DepthRaster::clamped(u32::MAX), DepthRaster::MAX_SIZE);
    }

    #[test]
    fn triangles_behind_the_light_are_dropped() {
        let mut raster = DepthRaster::new(4);
        raster.rasterize([
            Vec4::new(-1.0, -1.0, 0.5, -1.0),
            Vec4::new(3.0, -1.0, 0.5, 1.0),
            Vec4::new(-1.0, 3.0, 0.5, 1.0),
        ]);
        assert_eq!(raster.sample(Vec2::splat(0.5)), 1.0);
    }
}
