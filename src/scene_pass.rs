//! Camera-view render pass with shadow-map sampling.
//!
//! Draws the plane and the cube with the shaded pipeline, which compares each
//! fragment's light-space depth against the shadow map, then draws the light
//! indicator with an unshaded flat-color pipeline.
//!
//! The pass owns the camera depth buffer and recreates it when the surface
//! is resized.

use crate::error::InitError;
use crate::gpu::GpuContext;
use crate::mesh::Vertex;
use crate::render_graph::{GraphResource, RenderContext, RenderNode};
use crate::renderer::SceneResources;
use crate::scene::SceneObject;
use crate::shadow_map::{DEPTH_FORMAT, ShadowMap};

/// Objects drawn with the shadow-sampling pipeline.
const SHADED: [SceneObject; 2] = [SceneObject::Plane, SceneObject::Cube];

/// Render node reading [`GraphResource::ShadowMap`] and writing the camera
/// depth buffer and the surface.
///
/// # Pipeline Configuration
///
/// - Back-face culling (counter-clockwise front faces)
/// - Depth write with `Less` comparison against a `Depth32Float` buffer
/// - Shaded pipeline: `scene.wgsl`, shadow map bound at group 1
/// - Flat pipeline: `flat.wgsl`, no shadow map
pub struct ScenePass {
    shaded_pipeline: wgpu::RenderPipeline,
    flat_pipeline: wgpu::RenderPipeline,
    shadow_bind_group: wgpu::BindGroup,
    depth_view: wgpu::TextureView,
    depth_size: (u32, u32),
    clear_color: wgpu::Color,
}

impl ScenePass {
    pub fn new(
        gpu: &GpuContext,
        resources: &SceneResources,
        clear_color: wgpu::Color,
    ) -> Result<Self, InitError> {
        let device = &gpu.device;

        let sample_layout = ShadowMap::sample_layout(device);
        let shadow_bind_group = resources
            .shadow_map
            .sample_bind_group(device, &sample_layout);

        let shaded_pipeline = gpu.validated("shaded scene pipeline", |device| {
            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Scene Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("shaders/scene.wgsl").into()),
            });
            let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Scene Pipeline Layout"),
                bind_group_layouts: &[&resources.object_layout, &sample_layout],
                push_constant_ranges: &[],
            });
            create_color_pipeline(
                device,
                gpu.config.format,
                "Scene Pipeline",
                &shader,
                &layout,
            )
        })?;

        let flat_pipeline = gpu.validated("flat color pipeline", |device| {
            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Flat Color Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("shaders/flat.wgsl").into()),
            });
            let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Flat Pipeline Layout"),
                bind_group_layouts: &[&resources.object_layout],
                push_constant_ranges: &[],
            });
            create_color_pipeline(
                device,
                gpu.config.format,
                "Flat Pipeline",
                &shader,
                &layout,
            )
        })?;

        Ok(Self {
            shaded_pipeline,
            flat_pipeline,
            shadow_bind_group,
            depth_view: create_depth_view(gpu)?,
            depth_size: (gpu.width(), gpu.height()),
            clear_color,
        })
    }
}

fn create_color_pipeline(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    label: &str,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::LAYOUT],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: Some(wgpu::Face::Back),
            front_face: wgpu::FrontFace::Ccw,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn create_depth_view(gpu: &GpuContext) -> Result<wgpu::TextureView, InitError> {
    gpu.validated("scene depth buffer", |device| {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Scene Depth Texture"),
            size: wgpu::Extent3d {
                width: gpu.width(),
                height: gpu.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    })
}

impl RenderNode for ScenePass {
    fn name(&self) -> &'static str {
        "Scene Pass"
    }

    fn reads(&self) -> &[GraphResource] {
        &[GraphResource::ShadowMap]
    }

    fn writes(&self) -> &[GraphResource] {
        &[GraphResource::SceneDepth, GraphResource::Surface]
    }

    /// Recreates the depth buffer if the surface size changed. On failure the
    /// previous buffer is kept.
    fn resize(&mut self, gpu: &GpuContext) {
        let size = (gpu.width(), gpu.height());
        if self.depth_size == size {
            return;
        }
        match create_depth_view(gpu) {
            Ok(view) => {
                self.depth_view = view;
                self.depth_size = size;
            }
            Err(e) => log::error!("{e}"),
        }
    }

    fn execute(&self, ctx: &mut RenderContext<'_>) {
        let scene = ctx.scene;
        let surface = ctx.surface;

        let mut pass = ctx.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: surface,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.shaded_pipeline);
        pass.set_bind_group(1, &self.shadow_bind_group, &[]);
        for object in SHADED {
            pass.set_bind_group(0, &scene.object_binding(object).bind_group, &[]);
            scene.mesh(object).draw(&mut pass);
        }

        // The light marker is neither lit nor shadowed.
        pass.set_pipeline(&self.flat_pipeline);
        let indicator = SceneObject::LightIndicator;
        pass.set_bind_group(0, &scene.object_binding(indicator).bind_group, &[]);
        scene.mesh(indicator).draw(&mut pass);
    }
}
