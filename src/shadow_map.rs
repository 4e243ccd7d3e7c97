//! The shadow map: a square depth texture rendered from the light and the
//! comparison sampler used to read it back.

use crate::error::InitError;
use crate::gpu::GpuContext;

/// Depth format of the shadow map and of the camera depth buffer.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Shadow map parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowSettings {
    /// Width and height of the shadow map in texels.
    pub resolution: u32,
    /// Subtracted from a fragment's light-space depth before the comparison,
    /// to keep surfaces from shadowing themselves.
    pub bias: f32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            resolution: 1024,
            bias: 0.001,
        }
    }
}

impl ShadowSettings {
    pub fn resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn bias(mut self, bias: f32) -> Self {
        self.bias = bias;
        self
    }
}

/// GPU resources of the shadow map.
///
/// The texture is written by the shadow pass (as a depth attachment) and read
/// by the main pass (as a sampled depth texture), once each per frame. The
/// view keeps the texture alive.
pub struct ShadowMap {
    pub view: wgpu::TextureView,
    /// Linear, clamp-to-edge, `Less` comparison.
    pub sampler: wgpu::Sampler,
}

impl ShadowMap {
    pub fn new(gpu: &GpuContext, settings: ShadowSettings) -> Result<Self, InitError> {
        check_resolution(
            settings.resolution,
            gpu.device.limits().max_texture_dimension_2d,
        )?;

        let (view, sampler) = gpu.validated("shadow map", |device| {
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some("Shadow Map"),
                size: wgpu::Extent3d {
                    width: settings.resolution,
                    height: settings.resolution,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: DEPTH_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

            let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("Shadow Comparison Sampler"),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: wgpu::FilterMode::Linear,
                min_filter: wgpu::FilterMode::Linear,
                mipmap_filter: wgpu::FilterMode::Nearest,
                compare: Some(wgpu::CompareFunction::Less),
                ..Default::default()
            });

            (view, sampler)
        })?;

        log::info!(
            "shadow map: {0}x{0} {1:?}, bias {2}",
            settings.resolution,
            DEPTH_FORMAT,
            settings.bias
        );

        Ok(Self { view, sampler })
    }

    /// Layout for sampling the shadow map in the main pass: the depth texture
    /// at binding 0 and its comparison sampler at binding 1.
    pub fn sample_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Shadow Sample Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        })
    }

    pub fn sample_bind_group(
        &self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shadow Sample Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&self.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }
}

fn check_resolution(requested: u32, max: u32) -> Result<(), InitError> {
    if requested == 0 || requested > max {
        return Err(InitError::InvalidShadowMapSize { requested, max });
    }
    Ok(())
}
