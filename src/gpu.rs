//! Core GPU context and device management.
//!
//! [`GpuContext`] holds the wgpu objects every other part of the renderer
//! needs: the surface, the device, the queue and the surface configuration.
//! The application creates it once and passes it by reference to the
//! renderer, which never reaches for a global device.
//!
//! # Example
//!
//! ```no_run
//! # fn demo(window: std::sync::Arc<winit::window::Window>) -> Result<(), umbra::InitError> {
//! use umbra::GpuContext;
//!
//! let mut gpu = GpuContext::new(window)?;
//!
//! let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
//!     label: Some("My Buffer"),
//!     size: 1024,
//!     usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
//!     mapped_at_creation: false,
//! });
//! gpu.queue.write_buffer(&buffer, 0, &[0u8; 1024]);
//!
//! gpu.resize(1280, 720)?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use winit::window::Window;

use crate::error::InitError;

/// Core GPU context holding wgpu resources.
///
/// All fields are public to allow direct access to wgpu APIs when needed.
pub struct GpuContext {
    /// The surface for presenting rendered frames to the window.
    pub surface: wgpu::Surface<'static>,
    /// The logical GPU device for creating resources and pipelines.
    pub device: wgpu::Device,
    /// The command queue for submitting work to the GPU.
    pub queue: wgpu::Queue,
    /// Current surface configuration (format, size, present mode).
    pub config: wgpu::SurfaceConfiguration,
}

impl GpuContext {
    /// Create a new GPU context from a winit window.
    ///
    /// This performs all wgpu initialization:
    /// 1. Creates a wgpu instance with primary backends (Vulkan, Metal, DX12)
    /// 2. Creates a surface for the window
    /// 3. Requests a suitable GPU adapter
    /// 4. Creates the logical device and command queue
    /// 5. Configures the surface with an sRGB format and Fifo present mode,
    ///    clamped to the device's 2D texture limit
    ///
    /// Each step's failure is returned as an [`InitError`].
    pub fn new(window: Arc<Window>) -> Result<Self, InitError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let options = wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        };
        let adapter = pollster::block_on(instance.request_adapter(&options))?;

        let info = adapter.get_info();
        log::info!("using adapter {} ({:?})", info.name, info.backend);

        let descriptor = wgpu::DeviceDescriptor {
            label: Some("Umbra Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
            trace: Default::default(),
            experimental_features: Default::default(),
        };
        let (device, queue) = pollster::block_on(adapter.request_device(&descriptor))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(InitError::UnsupportedSurface)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        // A window can report 0x0 before it is first shown.
        let max = device.limits().max_texture_dimension_2d;
        let (width, height) = surface_extent(size.width, size.height, max);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        validate(&device, "surface configuration", |device| {
            surface.configure(device, &config)
        })?;

        log::info!(
            "surface configured: {}x{} {:?}",
            config.width,
            config.height,
            config.format
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
        })
    }

    /// Resize the surface to new dimensions.
    ///
    /// Zero-sized dimensions (a minimized window) are ignored. Sizes beyond
    /// the device's 2D texture limit are clamped to it.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), InitError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        let max = self.device.limits().max_texture_dimension_2d;
        let (width, height) = surface_extent(width, height, max);
        self.config.width = width;
        self.config.height = height;
        self.reconfigure()
    }

    /// Reapplies the current configuration after the surface was lost or
    /// became outdated.
    pub fn reconfigure(&self) -> Result<(), InitError> {
        self.validated("surface configuration", |device| {
            self.surface.configure(device, &self.config)
        })
    }

    /// Runs `create` inside a validation error scope, turning any wgpu
    /// validation error it raises into [`InitError::Validation`].
    ///
    /// Without the scope wgpu would hand the error to its uncaptured-error
    /// handler, which panics.
    pub fn validated<T>(
        &self,
        label: &'static str,
        create: impl FnOnce(&wgpu::Device) -> T,
    ) -> Result<T, InitError> {
        validate(&self.device, label, create)
    }

    /// Returns the current surface width in pixels.
    pub fn width(&self) -> u32 {
        self.config.width
    }

    /// Returns the current surface height in pixels.
    pub fn height(&self) -> u32 {
        self.config.height
    }
}

/// Surface size for a window of `width`x`height`, kept within `1..=max` on
/// both axes.
fn surface_extent(width: u32, height: u32, max: u32) -> (u32, u32) {
    (width.clamp(1, max), height.clamp(1, max))
}

fn validate<T>(
    device: &wgpu::Device,
    label: &'static str,
    create: impl FnOnce(&wgpu::Device) -> T,
) -> Result<T, InitError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = create(device);
    match pollster::block_on(device.pop_error_scope()) {
        None => Ok(value),
        Some(error) => Err(InitError::Validation {
            label,
            message: error.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_window_is_clamped_to_device_limit() {
        assert_eq!(surface_extent(9000, 5000, 8192), (8192, 5000));
        assert_eq!(surface_extent(5000, 20_000, 8192), (5000, 8192));
    }

    #[test]
    fn zero_sized_window_gets_one_pixel() {
        assert_eq!(surface_extent(0, 0, 8192), (1, 1));
        assert_eq!(surface_extent(1280, 720, 8192), (1280, 720));
    }
}
