//! The shadow renderer: resources, per-frame update and submission.
//!
//! # Frame
//!
//! [`ShadowRenderer::render`] runs one frame in a fixed order:
//!
//! 1. acquire the swapchain image (or skip the frame)
//! 2. advance the cube's spin
//! 3. light-pass update: shadow casters get their light-relative transform
//! 4. camera-pass update: every object gets its camera-relative transform,
//!    keeping the light-relative one for the shadow lookup
//! 5. encode the render graph (shadow pass, then scene pass) into one encoder
//! 6. submit and present
//!
//! The shadow pass and the scene pass read different uniform buffers. All
//! `queue.write_buffer` calls land before the submit that follows them, so a
//! buffer shared by both passes would only ever hold the camera transform.
//!
//! # Bind groups
//!
//! | Pipeline | Group 0                              | Group 1                   |
//! |----------|--------------------------------------|---------------------------|
//! | shadow   | `MeshConstants` (light)              |                           |
//! | shaded   | `MeshConstants` + `SurfaceUniforms`  | shadow map + cmp. sampler |
//! | flat     | `MeshConstants` + `SurfaceUniforms`  |                           |

use crate::error::InitError;
use crate::gpu::GpuContext;
use crate::mesh::{Geometry, Mesh};
use crate::render_graph::{RenderContext, RenderGraph};
use crate::scene::{MeshConstants, SceneConfig, SceneObject, SceneState};
use crate::scene_pass::ScenePass;
use crate::shadow_map::{ShadowMap, ShadowSettings};
use crate::shadow_pass::ShadowPass;

/// Surface appearance of one object, uploaded once at start-up.
///
/// Matches `SurfaceUniforms` in `scene.wgsl` and `flat.wgsl` (32 bytes).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SurfaceUniforms {
    /// Base color, linear RGBA.
    pub color: [f32; 4],
    /// Brightness of fully shadowed surfaces relative to lit ones.
    pub ambient: f32,
    /// Depth bias applied before the shadow comparison.
    pub shadow_bias: f32,
    /// Nonzero: paint the raw shadow test (magenta lit, magenta scaled by the
    /// stored depth when shadowed) instead of the shaded color.
    pub visualize: u32,
    pub _pad: u32,
}

/// Appearance and shadow parameters of the renderer.
#[derive(Clone, Copy, Debug)]
pub struct RendererConfig {
    pub scene: SceneConfig,
    pub shadow: ShadowSettings,
    pub clear_color: wgpu::Color,
    pub ambient: f32,
    pub visualize_shadow_test: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            scene: SceneConfig::default(),
            shadow: ShadowSettings::default(),
            clear_color: wgpu::Color {
                r: 0.05,
                g: 0.06,
                b: 0.09,
                a: 1.0,
            },
            ambient: 0.35,
            visualize_shadow_test: false,
        }
    }
}

impl RendererConfig {
    /// Surface uniforms for one object under this configuration.
    pub fn surface_uniforms(&self, object: SceneObject) -> SurfaceUniforms {
        SurfaceUniforms {
            color: base_color(object),
            ambient: self.ambient,
            shadow_bias: self.shadow.bias,
            visualize: u32::from(self.visualize_shadow_test),
            _pad: 0,
        }
    }
}

fn base_color(object: SceneObject) -> [f32; 4] {
    match object {
        SceneObject::Plane => [0.72, 0.72, 0.68, 1.0],
        SceneObject::Cube => [0.86, 0.42, 0.18, 1.0],
        SceneObject::LightIndicator => [1.0, 0.92, 0.35, 1.0],
    }
}

/// What happened to a frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FrameStatus {
    /// Rendered and queued for presentation.
    Presented,
    /// No drawable this time (surface outdated, lost, or timed out). The next
    /// frame may succeed.
    Skipped,
    /// The surface cannot be recovered (out of memory, or it can no longer
    /// be configured).
    Fatal,
}

/// Response to a failed swapchain acquisition.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum SurfaceErrorAction {
    Reconfigure,
    Skip,
    Fatal,
}

impl SurfaceErrorAction {
    fn for_error(error: &wgpu::SurfaceError) -> Self {
        match error {
            wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost => Self::Reconfigure,
            wgpu::SurfaceError::OutOfMemory => Self::Fatal,
            wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other => Self::Skip,
        }
    }
}

/// Handles a frame whose swapchain image could not be acquired. The scene
/// is not touched, so the animation does not advance.
fn skip_frame(gpu: &GpuContext, error: wgpu::SurfaceError) -> FrameStatus {
    match SurfaceErrorAction::for_error(&error) {
        SurfaceErrorAction::Reconfigure => {
            log::debug!("surface {error}; reconfiguring");
            match gpu.reconfigure() {
                Ok(()) => FrameStatus::Skipped,
                Err(e) => {
                    log::error!("{e}");
                    FrameStatus::Fatal
                }
            }
        }
        SurfaceErrorAction::Skip => {
            log::warn!("skipping frame: {error}");
            FrameStatus::Skipped
        }
        SurfaceErrorAction::Fatal => {
            log::error!("out of memory acquiring the surface texture");
            FrameStatus::Fatal
        }
    }
}

/// Uniform buffer and bind group of one shadow caster in the shadow pass.
pub(crate) struct ShadowBinding {
    constants: wgpu::Buffer,
    pub(crate) bind_group: wgpu::BindGroup,
}

/// Uniform buffers and bind group of one object in the scene pass.
pub(crate) struct ObjectBinding {
    constants: wgpu::Buffer,
    pub(crate) bind_group: wgpu::BindGroup,
}

/// GPU resources shared by the render nodes.
pub struct SceneResources {
    plane: Mesh,
    cube: Mesh,
    pub(crate) shadow_map: ShadowMap,
    /// Group 0 layout of the shadow pipeline.
    pub(crate) shadow_layout: wgpu::BindGroupLayout,
    /// Group 0 layout of the shaded and flat pipelines.
    pub(crate) object_layout: wgpu::BindGroupLayout,
    shadow_bindings: [ShadowBinding; 2],
    object_bindings: [ObjectBinding; 3],
}

impl SceneResources {
    fn new(gpu: &GpuContext, config: &RendererConfig) -> Result<Self, InitError> {
        let shadow_map = ShadowMap::new(gpu, config.shadow)?;
        let plane = Mesh::new(gpu, &Geometry::plane(), "Plane")?;
        let cube = Mesh::new(gpu, &Geometry::cube(), "Cube")?;

        let (shadow_layout, object_layout, shadow_bindings, object_bindings) =
            gpu.validated("scene bind groups", |device| create_bindings(device, config))?;

        Ok(Self {
            plane,
            cube,
            shadow_map,
            shadow_layout,
            object_layout,
            shadow_bindings,
            object_bindings,
        })
    }

    /// Mesh drawn for an object. The light indicator reuses the cube.
    pub fn mesh(&self, object: SceneObject) -> &Mesh {
        match object {
            SceneObject::Plane => &self.plane,
            SceneObject::Cube | SceneObject::LightIndicator => &self.cube,
        }
    }

    /// Shadow-pass bind group, or `None` for objects that cast no shadow.
    pub(crate) fn shadow_binding(&self, object: SceneObject) -> Option<&ShadowBinding> {
        SceneObject::SHADOW_CASTERS
            .iter()
            .position(|&caster| caster == object)
            .map(|slot| &self.shadow_bindings[slot])
    }

    pub(crate) fn object_binding(&self, object: SceneObject) -> &ObjectBinding {
        &self.object_bindings[object.index()]
    }

    fn write_shadow_constants(&self, gpu: &GpuContext, scene: &SceneState) {
        for object in SceneObject::SHADOW_CASTERS {
            if let Some(binding) = self.shadow_binding(object) {
                gpu.queue.write_buffer(
                    &binding.constants,
                    0,
                    bytemuck::cast_slice(&[*scene.constants(object)]),
                );
            }
        }
    }

    fn write_object_constants(&self, gpu: &GpuContext, scene: &SceneState) {
        for object in SceneObject::ALL {
            gpu.queue.write_buffer(
                &self.object_binding(object).constants,
                0,
                bytemuck::cast_slice(&[*scene.constants(object)]),
            );
        }
    }
}

type Bindings = (
    wgpu::BindGroupLayout,
    wgpu::BindGroupLayout,
    [ShadowBinding; 2],
    [ObjectBinding; 3],
);

/// Bind group layouts, per-object uniform buffers and their bind groups.
fn create_bindings(device: &wgpu::Device, config: &RendererConfig) -> Bindings {
    use wgpu::util::DeviceExt;

    let shadow_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Shadow Constants Bind Group Layout"),
        entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX)],
    });

    let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Object Bind Group Layout"),
        entries: &[
            uniform_entry(0, wgpu::ShaderStages::VERTEX),
            uniform_entry(1, wgpu::ShaderStages::FRAGMENT),
        ],
    });

    let constants_buffer = |label: String| {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&label),
            size: std::mem::size_of::<MeshConstants>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    };

    let shadow_bindings = SceneObject::SHADOW_CASTERS.map(|object| {
        let constants = constants_buffer(format!("{} Shadow Constants", object.label()));
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shadow Constants Bind Group"),
            layout: &shadow_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: constants.as_entire_binding(),
            }],
        });
        ShadowBinding {
            constants,
            bind_group,
        }
    });

    let object_bindings = SceneObject::ALL.map(|object| {
        let constants = constants_buffer(format!("{} Constants", object.label()));
        let surface = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Surface Uniforms", object.label())),
            contents: bytemuck::cast_slice(&[config.surface_uniforms(object)]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Object Bind Group"),
            layout: &object_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: constants.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: surface.as_entire_binding(),
                },
            ],
        });
        // The bind group keeps `surface` alive; it is never written again.
        ObjectBinding {
            constants,
            bind_group,
        }
    });

    (shadow_layout, object_layout, shadow_bindings, object_bindings)
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Two-pass shadow mapping renderer.
///
/// # Example
///
/// ```no_run
/// # fn demo(gpu: &umbra::GpuContext) -> Result<(), umbra::InitError> {
/// use umbra::{FrameStatus, RendererConfig, ShadowRenderer};
///
/// let mut renderer = ShadowRenderer::new(gpu, RendererConfig::default())?;
///
/// // Once per display refresh:
/// if renderer.render(gpu, 1.0 / 60.0) == FrameStatus::Fatal {
///     // tear down
/// }
/// # Ok(())
/// # }
/// ```
pub struct ShadowRenderer {
    scene: SceneState,
    resources: SceneResources,
    graph: RenderGraph,
}

impl ShadowRenderer {
    /// Creates every GPU resource and pipeline the two passes need.
    pub fn new(gpu: &GpuContext, config: RendererConfig) -> Result<Self, InitError> {
        let scene = SceneState::new(config.scene, gpu.width(), gpu.height())?;
        let resources = SceneResources::new(gpu, &config)?;

        let graph = RenderGraph::builder()
            .node(ShadowPass::new(gpu, &resources)?)
            .node(ScenePass::new(gpu, &resources, config.clear_color)?)
            .build()?;

        log::debug!("render graph order: {:?}", graph.order());

        Ok(Self {
            scene,
            resources,
            graph,
        })
    }

    /// Adapts to a new output size. Call after [`GpuContext::resize`].
    pub fn resize(&mut self, gpu: &GpuContext, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if let Err(e) = self.scene.resize(width, height) {
            log::warn!("keeping previous projection: {e}");
        }
        self.graph.resize(gpu);
        log::debug!("resized to {width}x{height}");
    }

    /// Renders and presents one frame, advancing the animation by `dt` seconds.
    ///
    /// Skipped frames leave the animation where it was.
    pub fn render(&mut self, gpu: &GpuContext, dt: f32) -> FrameStatus {
        let output = match gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(e) => return skip_frame(gpu, e),
        };
        let surface_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.scene.advance(dt);

        self.scene.update_light_pass();
        self.resources.write_shadow_constants(gpu, &self.scene);

        self.scene.update_camera_pass();
        self.resources.write_object_constants(gpu, &self.scene);

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut ctx = RenderContext {
                gpu,
                encoder: &mut encoder,
                surface: &surface_view,
                scene: &self.resources,
            };
            self.graph.execute(&mut ctx);
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        FrameStatus::Presented
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_uniforms_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<SurfaceUniforms>(), 32);
    }

    #[test]
    fn surface_uniforms_carry_shadow_settings() {
        let config = RendererConfig {
            shadow: ShadowSettings::default().bias(0.005),
            visualize_shadow_test: true,
            ..Default::default()
        };
        let uniforms = config.surface_uniforms(SceneObject::Cube);
        assert_eq!(uniforms.shadow_bias, 0.005);
        assert_eq!(uniforms.visualize, 1);
        assert_eq!(uniforms.ambient, config.ambient);
    }

    #[test]
    fn surface_errors_map_to_actions() {
        use wgpu::SurfaceError;
        let action = SurfaceErrorAction::for_error;
        assert_eq!(action(&SurfaceError::Outdated), SurfaceErrorAction::Reconfigure);
        assert_eq!(action(&SurfaceError::Lost), SurfaceErrorAction::Reconfigure);
        assert_eq!(action(&SurfaceError::Timeout), SurfaceErrorAction::Skip);
        assert_eq!(action(&SurfaceError::Other), SurfaceErrorAction::Skip);
        assert_eq!(action(&SurfaceError::OutOfMemory), SurfaceErrorAction::Fatal);
    }

    #[test]
    fn default_bias_and_resolution() {
        let config = RendererConfig::default();
        assert_eq!(config.shadow.resolution, 1024);
        assert_eq!(config.shadow.bias, 0.001);
        assert_eq!(config.surface_uniforms(SceneObject::Plane).visualize, 0);
    }
}
