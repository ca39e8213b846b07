//! GPU-resident terrain: mesh buffers plus the heightmap and erosion textures.

use strata_mesh::TerrainMesh;
use strata_terrain::{ErosionMap, Heightmap};
use wgpu::util::DeviceExt;

use crate::gpu::GpuContext;
use crate::texture::{FloatTexture, TextureError};

/// Everything one generation puts on the GPU.
#[derive(Debug)]
pub struct TerrainGpuResources {
    /// Interleaved [`strata_mesh::TerrainVertex`] data.
    pub vertex_buffer: wgpu::Buffer,
    /// `u32` triangle-list indices.
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    pub vertex_count: u32,
    pub heightmap_texture: FloatTexture,
    pub erosion_texture: FloatTexture,
}

impl TerrainGpuResources {
    /// Upload a generation's mesh and grids.
    pub fn upload(
        ctx: &GpuContext,
        mesh: &TerrainMesh,
        heightmap: &Heightmap,
        erosion: &ErosionMap,
    ) -> Result<Self, TextureError> {
        let heightmap_texture =
            FloatTexture::from_grid(&ctx.device, &ctx.queue, "terrain_heightmap", heightmap)?;
        let erosion_texture =
            FloatTexture::from_grid(&ctx.device, &ctx.queue, "terrain_erosion", erosion)?;

        let vertices = mesh.interleaved();
        let vertex_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("terrain_vertex_buffer"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });
        let index_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("terrain_index_buffer"),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            });

        log::info!(
            "Uploaded terrain: {} vertices, {} indices, {}x{} textures",
            vertices.len(),
            mesh.indices.len(),
            heightmap.resolution(),
            heightmap.resolution()
        );

        Ok(Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
            vertex_count: vertices.len() as u32,
            heightmap_texture,
            erosion_texture,
        })
    }

    /// Bytes held on the GPU across buffers and textures.
    pub fn memory_bytes(&self) -> u64 {
        self.vertex_buffer.size()
            + self.index_buffer.size()
            + self.heightmap_texture.byte_size()
            + self.erosion_texture.byte_size()
    }

    /// Bind vertex and index buffers to a render pass.
    pub fn bind<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
    }

    /// Release every GPU allocation immediately.
    pub fn destroy(self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
        self.heightmap_texture.destroy();
        self.erosion_texture.destroy();
    }
}

/// Holds the live generation's resources. Installing a replacement destroys
/// the previous set right away, so at most one generation stays resident.
#[derive(Debug, Default)]
pub struct TerrainGpuSlot {
    current: Option<TerrainGpuResources>,
    installs: u64,
}

impl TerrainGpuSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in `resources` and destroy whatever was there.
    pub fn install(&mut self, resources: TerrainGpuResources) {
        if let Some(old) = self.current.replace(resources) {
            log::debug!("Releasing previous terrain generation ({} bytes)", old.memory_bytes());
            old.destroy();
        }
        self.installs += 1;
    }

    /// Destroy the live resources, if any.
    pub fn clear(&mut self) {
        if let Some(old) = self.current.take() {
            old.destroy();
        }
    }

    pub fn current(&self) -> Option<&TerrainGpuResources> {
        self.current.as_ref()
    }

    /// Number of generations installed over the slot's lifetime.
    pub fn install_count(&self) -> u64 {
        self.installs
    }
}

impl Drop for TerrainGpuSlot {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::create_test_context;

    fn sample_terrain(resolution: u32) -> (TerrainMesh, Heightmap, ErosionMap) {
        let mut heightmap = Heightmap::new(resolution);
        for (i, h) in heightmap.cells_mut().iter_mut().enumerate() {
            *h = (i % 7) as f32;
        }
        let erosion = ErosionMap::new(resolution);
        let mesh = TerrainMesh::extract(&heightmap, &erosion, 16.0);
        (mesh, heightmap, erosion)
    }

    #[test]
    fn test_empty_slot() {
        let mut slot = TerrainGpuSlot::new();
        assert!(slot.current().is_none());
        slot.clear();
        assert_eq!(slot.install_count(), 0);
    }

    #[test]
    fn test_upload_sizes() {
        let Some(ctx) = create_test_context() else {
            return;
        };
        let (mesh, heightmap, erosion) = sample_terrain(8);
        let gpu = TerrainGpuResources::upload(&ctx, &mesh, &heightmap, &erosion)
            .expect("upload should succeed");
        assert_eq!(gpu.vertex_count, 64);
        assert_eq!(gpu.index_count, 7 * 7 * 6);
        assert_eq!(gpu.vertex_buffer.size(), 64 * 40);
        assert_eq!(gpu.heightmap_texture.dimensions, (8, 8));
        assert_eq!(gpu.erosion_texture.dimensions, (8, 8));
        gpu.destroy();
    }

    #[test]
    fn test_install_replaces_previous_generation() {
        let Some(ctx) = create_test_context() else {
            return;
        };
        let mut slot = TerrainGpuSlot::new();
        let (mesh, heightmap, erosion) = sample_terrain(4);
        let first = TerrainGpuResources::upload(&ctx, &mesh, &heightmap, &erosion).unwrap();
        slot.install(first);
        let (mesh, heightmap, erosion) = sample_terrain(6);
        let second = TerrainGpuResources::upload(&ctx, &mesh, &heightmap, &erosion).unwrap();
        slot.install(second);
        assert_eq!(slot.install_count(), 2);
        assert_eq!(slot.current().map(|g| g.vertex_count), Some(36));
    }
}
