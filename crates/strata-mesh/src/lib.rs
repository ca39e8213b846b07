//! Terrain mesh extraction: positions, normals, material attributes, and indices
//! derived from a heightmap and its erosion map.

pub mod terrain_mesh;
pub mod vertex_format;

pub use terrain_mesh::TerrainMesh;
pub use vertex_format::{
    TERRAIN_VERTEX_ATTRIBUTES, TERRAIN_VERTEX_LAYOUT, TerrainVertex, terrain_vertex_buffer_layout,
};
