//! Depth-only render pass from the light's point of view.
//!
//! Fills the shadow map with the nearest depth of every shadow caster. There
//! is no fragment stage: the pipeline only rasterizes positions and writes
//! depth.

use crate::error::InitError;
use crate::gpu::GpuContext;
use crate::mesh::Vertex;
use crate::render_graph::{GraphResource, RenderContext, RenderNode};
use crate::renderer::SceneResources;
use crate::scene::SceneObject;
use crate::shadow_map::DEPTH_FORMAT;

/// Render node writing [`GraphResource::ShadowMap`].
///
/// # Pipeline Configuration
///
/// - Position-only vertex input, `vs_main` from `shadow_depth.wgsl`
/// - No color targets
/// - No culling, so thin or open casters still occlude
/// - Depth write with `Less` comparison, cleared to 1.0 every frame
pub struct ShadowPass {
    pipeline: wgpu::RenderPipeline,
}

impl ShadowPass {
    pub fn new(gpu: &GpuContext, resources: &SceneResources) -> Result<Self, InitError> {
        let pipeline = gpu.validated("shadow depth pipeline", |device| {
            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Shadow Depth Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("shaders/shadow_depth.wgsl").into()),
            });

            let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Shadow Pipeline Layout"),
                bind_group_layouts: &[&resources.shadow_layout],
                push_constant_ranges: &[],
            });

            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Shadow Depth Pipeline"),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[Vertex::LAYOUT],
                    compilation_options: Default::default(),
                },
                fragment: None,
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
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
        })?;

        Ok(Self { pipeline })
    }
}

impl RenderNode for ShadowPass {
    fn name(&self) -> &'static str {
        "Shadow Pass"
    }

    fn writes(&self) -> &[GraphResource] {
        &[GraphResource::ShadowMap]
    }

    fn execute(&self, ctx: &mut RenderContext<'_>) {
        let scene = ctx.scene;

        let mut pass = ctx.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Shadow Pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &scene.shadow_map.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.pipeline);
        for object in SceneObject::SHADOW_CASTERS {
            let Some(binding) = scene.shadow_binding(object) else {
                continue;
            };
            pass.set_bind_group(0, &binding.bind_group, &[]);
            scene.mesh(object).draw(&mut pass);
        }
    }
}
