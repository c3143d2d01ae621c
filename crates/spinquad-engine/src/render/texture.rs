//! Texture loading: PNG decode, vertical flip, mip chain and GPU upload.

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::RgbaImage;

#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("failed to decode image {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("image is {width}x{height}; this device supports at most {max}x{max}")]
    TooLarge { width: u32, height: u32, max: u32 },
}

/// Number of mip levels for a `width` x `height` image (down to 1x1).
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Decoded RGBA8 pixels plus their mip chain, owned on the CPU until upload.
#[derive(Debug, Clone)]
pub struct TextureData {
    /// Channel count of the source file before RGBA conversion.
    pub source_channels: u8,
    /// Level 0 first; each level halves both dimensions (minimum 1).
    pub levels: Vec<RgbaImage>,
}

impl TextureData {
    /// Decodes `path`, flips it vertically and builds the full mip chain.
    ///
    /// Rows are flipped so that the first row in memory is the bottom of the
    /// image, which puts UV (0, 0) at the bottom-left corner.
    pub fn load(path: &Path) -> Result<Self, TextureError> {
        let img = image::open(path).map_err(|source| TextureError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

        let source_channels = img.color().channel_count();
        let mut base = img.into_rgba8();
        image::imageops::flip_vertical_in_place(&mut base);

        let data = Self::from_rgba(base, source_channels);
        log::info!(
            "loaded texture {} ({}x{}, {} channels, {} mips)",
            path.display(),
            data.width(),
            data.height(),
            source_channels,
            data.levels.len()
        );
        Ok(data)
    }

    /// Builds the mip chain for an already decoded image.
    pub fn from_rgba(base: RgbaImage, source_channels: u8) -> Self {
        let count = mip_level_count(base.width(), base.height());
        let mut levels = Vec::with_capacity(count as usize);
        levels.push(base);

        for _ in 1..count {
            let Some(prev) = levels.last() else { break };
            let w = (prev.width() / 2).max(1);
            let h = (prev.height() / 2).max(1);
            let next = image::imageops::resize(prev, w, h, FilterType::Triangle);
            levels.push(next);
        }

        Self {
            source_channels,
            levels,
        }
    }

    pub fn width(&self) -> u32 {
        self.levels.first().map_or(0, |l| l.width())
    }

    pub fn height(&self) -> u32 {
        self.levels.first().map_or(0, |l| l.height())
    }

    pub fn mip_level_count(&self) -> u32 {
        self.levels.len() as u32
    }
}

/// A sampled 2D texture on the GPU.
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl GpuTexture {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    /// Uploads every mip level of `data`; the caller drops `data` afterwards.
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &TextureData,
    ) -> Result<Self, TextureError> {
        let (width, height) = (data.width(), data.height());
        let max = device.limits().max_texture_dimension_2d;
        if width > max || height > max {
            return Err(TextureError::TooLarge { width, height, max });
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("spinquad texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: data.mip_level_count(),
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (mip_level, level) in data.levels.iter().enumerate() {
            let (w, h) = level.dimensions();
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: mip_level as u32,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                level.as_raw(),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * w),
                    rows_per_image: Some(h),
                },
                wgpu::Extent3d {
                    width: w,
                    height: h,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("spinquad sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Ok(Self {
            texture,
            view,
            sampler,
        })
    }
}
