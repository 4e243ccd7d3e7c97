//! Error types for renderer construction, matrix math and the app loop.
//!
//! Initialization failures are reported as [`InitError`] so the caller decides
//! whether to abort or retry with a different configuration. Per-frame
//! problems never surface here; they are reported through
//! [`FrameStatus`](crate::FrameStatus) instead.

use glam::Vec3;

use crate::render_graph::GraphError;

/// Invalid parameters passed to a transform factory.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransformError {
    /// The perspective parameters do not describe a valid view frustum.
    #[error(
        "invalid perspective projection (fov_y={fov_y}, aspect={aspect}, near={near}, far={far}): {reason}"
    )]
    InvalidPerspective {
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
        reason: &'static str,
    },

    /// The viewpoint has no well-defined view basis.
    #[error("invalid view (position={position}, target={target}, up={up}): {reason}")]
    InvalidView {
        position: Vec3,
        target: Vec3,
        up: Vec3,
        reason: &'static str,
    },
}

/// Failure while creating the GPU context or the renderer's resources.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("failed to create a surface for the window")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter found")]
    RequestAdapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create the logical device")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported formats for this adapter")]
    UnsupportedSurface,

    #[error("shadow map resolution {requested} is outside 1..={max} for this device")]
    InvalidShadowMapSize { requested: u32, max: u32 },

    /// A GPU object (pipeline, texture, buffer or surface configuration)
    /// failed wgpu validation.
    #[error("failed to create {label}: {message}")]
    Validation {
        label: &'static str,
        message: String,
    },

    #[error(transparent)]
    Projection(#[from] TransformError),

    #[error(transparent)]
    RenderGraph(#[from] GraphError),
}

/// Reason the application loop stopped with an error.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("event loop failed")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create the window")]
    CreateWindow(#[from] winit::error::OsError),

    #[error("renderer initialization failed")]
    Init(#[from] InitError),

    #[error("failed to resize the surface")]
    Resize(#[source] InitError),

    /// The surface failed mid-run and could not be recovered.
    #[error("surface cannot be recovered")]
    SurfaceUnrecoverable,
}
