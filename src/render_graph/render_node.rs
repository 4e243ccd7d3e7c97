//! The core render node trait for the render graph.

use crate::gpu::GpuContext;
use crate::render_graph::RenderContext;

/// A GPU resource passed between render nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GraphResource {
    /// Depth texture rendered from the light.
    ShadowMap,
    /// Depth buffer of the camera view.
    SceneDepth,
    /// The swapchain image being presented this frame.
    Surface,
}

/// A render pass that can be scheduled by the render graph.
///
/// `reads` and `writes` are the node's contract with the graph: a node is
/// only run after every other node writing something it reads. They must not
/// change after the node is added.
///
/// # Implementing Custom Nodes
///
/// ```ignore
/// struct OverlayNode {
///     pipeline: wgpu::RenderPipeline,
/// }
///
/// impl RenderNode for OverlayNode {
///     fn name(&self) -> &'static str {
///         "Overlay"
///     }
///
///     fn reads(&self) -> &[GraphResource] {
///         &[GraphResource::Surface]
///     }
///
///     fn writes(&self) -> &[GraphResource] {
///         &[GraphResource::Surface]
///     }
///
///     fn execute(&self, ctx: &mut RenderContext) {
///         let mut pass = ctx.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
///             // ... load the surface, draw on top
///         });
///         pass.set_pipeline(&self.pipeline);
///         pass.draw(0..3, 0..1);
///     }
/// }
/// ```
pub trait RenderNode {
    /// Label used in logs, errors and GPU debuggers.
    fn name(&self) -> &'static str;

    /// Resources this node samples or loads.
    fn reads(&self) -> &[GraphResource] {
        &[]
    }

    /// Resources this node renders into.
    fn writes(&self) -> &[GraphResource];

    /// Encodes this node's render pass(es).
    fn execute(&self, ctx: &mut RenderContext<'_>);

    /// Called when the output surface changes size. The default does nothing.
    fn resize(&mut self, _gpu: &GpuContext) {}
}
