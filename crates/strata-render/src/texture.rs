//! Single-channel `R32Float` textures with one texel per grid cell.

use strata_terrain::Grid;

/// The format every terrain data texture uses.
pub const FLOAT_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Float;

/// Errors that can occur during texture creation.
#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    /// Texel data length doesn't match the expected size for the given dimensions.
    #[error("texture data size ({actual}) does not match expected ({expected}) for {width}x{height}")]
    DataSizeMismatch {
        actual: usize,
        expected: usize,
        width: u32,
        height: u32,
    },

    /// Width or height is zero.
    #[error("texture dimensions must be non-zero, got {width}x{height}")]
    ZeroDimensions { width: u32, height: u32 },
}

/// A GPU float texture and its default view.
#[derive(Debug)]
pub struct FloatTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    /// Width and height in texels.
    pub dimensions: (u32, u32),
}

impl FloatTexture {
    /// Create a `resolution × resolution` texture holding `grid`'s cells.
    pub fn from_grid(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        grid: &Grid,
    ) -> Result<Self, TextureError> {
        let size = grid.resolution();
        Self::from_bytes(device, queue, label, grid.texture_bytes(), size, size)
    }

    /// Create a texture from tightly packed little-endian `f32` texels.
    pub fn from_bytes(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        data: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Self, TextureError> {
        validate_dimensions(width, height)?;
        validate_data_size(data, width, height)?;

        let extent = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FLOAT_TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row(width)),
                rows_per_image: None,
            },
            extent,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        log::debug!("Created float texture '{label}' ({width}x{height})");

        Ok(Self {
            texture,
            view,
            dimensions: (width, height),
        })
    }

    /// Size in bytes on the GPU.
    pub fn byte_size(&self) -> u64 {
        expected_byte_size(self.dimensions.0, self.dimensions.1) as u64
    }

    /// Release the GPU allocation now rather than when the last handle drops.
    pub fn destroy(&self) {
        self.texture.destroy();
    }
}

fn texel_size() -> u32 {
    FLOAT_TEXTURE_FORMAT.block_copy_size(None).unwrap_or(4)
}

fn expected_byte_size(width: u32, height: u32) -> usize {
    width as usize * height as usize * texel_size() as usize
}

fn bytes_per_row(width: u32) -> u32 {
    width * texel_size()
}

fn validate_dimensions(width: u32, height: u32) -> Result<(), TextureError> {
    if width == 0 || height == 0 {
        return Err(TextureError::ZeroDimensions { width, height });
    }
    Ok(())
}

fn validate_data_size(data: &[u8], width: u32, height: u32) -> Result<(), TextureError> {
    let expected = expected_byte_size(width, height);
    if data.len() != expected {
        return Err(TextureError::DataSizeMismatch {
            actual: data.len(),
            expected,
            width,
            height,
        });
    }
    Ok(())
}

/// Create a test GPU context. Returns `None` if no GPU is available.
#[cfg(test)]
pub(crate) fn create_test_context() -> Option<crate::GpuContext> {
    crate::GpuContext::new_headless_blocking(wgpu::PowerPreference::default()).ok()
}
