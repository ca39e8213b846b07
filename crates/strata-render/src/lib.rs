//! Optional GPU side of the terrain engine: a headless wgpu device and the
//! upload/release of generated mesh buffers and float textures.

pub mod gpu;
pub mod terrain_gpu;
pub mod texture;

pub use gpu::{GpuContext, GpuContextError, parse_power_preference};
pub use terrain_gpu::{TerrainGpuResources, TerrainGpuSlot};
pub use texture::{FloatTexture, TextureError};
