//! Render graph with explicit resource dependencies.
//!
//! Each node declares the GPU resources it reads and writes. The builder turns
//! those declarations into edges (writer before reader) and fixes the
//! execution order once, at build time. Ordering is therefore a property of
//! the declared data flow, not of the order nodes were added in:
//!
//! ```text
//! ┌──────────────┐  ShadowMap   ┌──────────────┐
//! │  ShadowPass  │─────────────▶│  ScenePass   │───▶ Surface
//! │ (light view) │              │ (camera view)│
//! └──────────────┘              └──────────────┘
//! ```
//!
//! Execution is a single command encoder per frame; wgpu inserts the barrier
//! between the depth-attachment write and the texture read.
//!
//! # Example
//!
//! ```ignore
//! let graph = RenderGraph::builder()
//!     .node(ScenePass::new(gpu, &resources)?)   // reads ShadowMap
//!     .node(ShadowPass::new(gpu, &resources)?)  // writes ShadowMap
//!     .build()?;
//!
//! assert_eq!(graph.order(), ["Shadow Pass", "Scene Pass"]);
//! ```

mod context;
mod graph;
mod render_node;

pub use context::RenderContext;
pub use graph::{GraphError, RenderGraph, RenderGraphBuilder};
pub use render_node::{GraphResource, RenderNode};
