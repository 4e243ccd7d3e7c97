//! Per-frame execution context handed to every render node.

use crate::gpu::GpuContext;
use crate::renderer::SceneResources;

/// Everything a node needs to encode its pass for the current frame.
pub struct RenderContext<'a> {
    /// GPU context.
    pub gpu: &'a GpuContext,
    /// The frame's command encoder; all nodes record into it in graph order.
    pub encoder: &'a mut wgpu::CommandEncoder,
    /// View of the swapchain image acquired for this frame.
    pub surface: &'a wgpu::TextureView,
    /// Meshes, per-object bind groups and the shadow map.
    pub scene: &'a SceneResources,
}
