//! # Umbra
//!
//! **Two-pass shadow mapping on wgpu.**
//!
//! A cube spins above a ground plane under a single spot light. Each frame
//! renders the scene twice: once from the light into a depth texture (the
//! shadow map), then from the camera, where every fragment is projected into
//! light space and compared against that texture to decide whether it is lit.
//!
//! ## Quick Start
//!
//! ```no_run
//! use umbra::{AppConfig, LoggingConfig, init_logging, run};
//!
//! fn main() -> Result<(), umbra::RunError> {
//!     init_logging(LoggingConfig::default());
//!     run(AppConfig::new().title("Shadows").target_fps(60.0))
//! }
//! ```
//!
//! ## Layout
//!
//! - [`transform`]: 4x4 matrix factories (translation, scale, axis-angle
//!   rotation, perspective) with a fluent [`TransformExt`] chain
//! - [`SceneState`]: camera, light and per-object transforms, GPU-free
//! - [`ShadowRenderer`]: shadow map, pipelines and the [`RenderGraph`] that
//!   orders the two passes by their declared reads and writes
//! - [`DepthRaster`] and [`ShadowCoord`]: the shadow test on the CPU, for
//!   tests and debugging

mod app;
mod camera;
mod error;
mod gpu;
mod logging;
mod mesh;
mod occlusion;
mod render_graph;
mod renderer;
mod scene;
mod scene_pass;
mod shadow_map;
mod shadow_pass;
pub mod transform;

pub use app::{AppConfig, run};
pub use camera::Camera;
pub use error::{InitError, RunError, TransformError};
pub use gpu::GpuContext;
pub use logging::{LoggingConfig, init_logging};
pub use mesh::{Geometry, Mesh, Vertex};
pub use occlusion::{DepthRaster, ShadowCoord};
pub use render_graph::{
    GraphError, GraphResource, RenderContext, RenderGraph, RenderGraphBuilder, RenderNode,
};
pub use renderer::{FrameStatus, RendererConfig, SceneResources, ShadowRenderer, SurfaceUniforms};
pub use scene::{MeshConstants, SceneConfig, SceneObject, SceneState};
pub use scene_pass::ScenePass;
pub use shadow_map::{DEPTH_FORMAT, ShadowMap, ShadowSettings};
pub use shadow_pass::ShadowPass;
pub use transform::TransformExt;

// Re-export glam math types for convenience
pub use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
