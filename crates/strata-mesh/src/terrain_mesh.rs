//! Heightmap → triangle mesh conversion.
//!
//! The grid spans `[-world_size/2, world_size/2]` on X and Z, centred on the
//! origin. Grid column `x` maps to +X and grid row `y` maps to +Z.

use glam::Vec3;
use strata_terrain::{ErosionMap, Heightmap};

use crate::vertex_format::TerrainVertex;

/// Read-only mesh snapshot derived from one generation.
///
/// Stored as parallel attribute arrays; [`TerrainMesh::interleaved`] packs
/// them into [`TerrainVertex`] records for upload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TerrainMesh {
    /// World-space vertex positions, one per heightmap cell.
    pub positions: Vec<[f32; 3]>,
    /// Unit surface normals.
    pub normals: Vec<[f32; 3]>,
    /// Texture coordinates in `[0, 1]` across the whole terrain.
    pub uvs: Vec<[f32; 2]>,
    /// `1 - normal.y`: `0` on flat ground, approaching `1` on cliffs.
    pub slopes: Vec<f32>,
    /// Erosion-map value of the vertex's cell, unmodified.
    pub erosion: Vec<f32>,
    /// Triangle list, two triangles per grid quad.
    pub indices: Vec<u32>,
}

impl TerrainMesh {
    /// Build the mesh for `heightmap`, pulling per-vertex erosion from `erosion`.
    ///
    /// # Panics
    ///
    /// Panics if the grids differ in resolution or `world_size` is not a
    /// positive finite length.
    pub fn extract(heightmap: &Heightmap, erosion: &ErosionMap, world_size: f32) -> Self {
        assert_eq!(
            heightmap.resolution(),
            erosion.resolution(),
            "heightmap and erosion map must share a resolution"
        );
        assert!(
            world_size.is_finite() && world_size > 0.0,
            "world size must be positive, got {world_size}"
        );

        let res = heightmap.resolution();
        let span = res.saturating_sub(1).max(1) as f32;
        let spacing = world_size / span;
        let vertex_count = res as usize * res as usize;

        let mut mesh = Self {
            positions: Vec::with_capacity(vertex_count),
            normals: Vec::with_capacity(vertex_count),
            uvs: Vec::with_capacity(vertex_count),
            slopes: Vec::with_capacity(vertex_count),
            erosion: Vec::with_capacity(vertex_count),
            indices: Vec::with_capacity(Self::expected_index_count(res)),
        };

        for y in 0..res {
            for x in 0..res {
                let u = x as f32 / span;
                let v = y as f32 / span;
                let normal = surface_normal(heightmap, x, y, spacing);

                mesh.positions.push([
                    (u - 0.5) * world_size,
                    heightmap.get(x, y),
                    (v - 0.5) * world_size,
                ]);
                mesh.normals.push(normal.to_array());
                mesh.uvs.push([u, v]);
                mesh.slopes.push(1.0 - normal.y);
                mesh.erosion.push(erosion.get(x, y));
            }
        }

        for y in 0..res.saturating_sub(1) {
            for x in 0..res - 1 {
                let tl = y * res + x;
                let tr = tl + 1;
                let bl = (y + 1) * res + x;
                let br = bl + 1;
                mesh.indices.extend_from_slice(&[tl, bl, tr, tr, bl, br]);
            }
        }

        mesh
    }

    /// `(resolution - 1)² × 6`.
    pub fn expected_index_count(resolution: u32) -> usize {
        let quads = resolution.saturating_sub(1) as usize;
        quads * quads * 6
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of indices (three per triangle).
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Pack vertex `i` into its GPU representation.
    pub fn vertex(&self, i: usize) -> TerrainVertex {
        TerrainVertex {
            position: self.positions[i],
            normal: self.normals[i],
            uv: self.uvs[i],
            slope: self.slopes[i],
            erosion: self.erosion[i],
        }
    }

    /// All vertices packed for a single vertex buffer.
    pub fn interleaved(&self) -> Vec<TerrainVertex> {
        (0..self.vertex_count()).map(|i| self.vertex(i)).collect()
    }
}

/// Normal from the height gradient: central differences in the interior,
/// one-sided differences on the border.
fn surface_normal(heightmap: &Heightmap, x: u32, y: u32, spacing: f32) -> Vec3 {
    let max = heightmap.resolution() - 1;
    let (x0, x1) = (x.saturating_sub(1), (x + 1).min(max));
    let (y0, y1) = (y.saturating_sub(1), (y + 1).min(max));

    let dhdx = gradient(heightmap.get(x0, y), heightmap.get(x1, y), x1 - x0, spacing);
    let dhdz = gradient(heightmap.get(x, y0), heightmap.get(x, y1), y1 - y0, spacing);

    let n = Vec3::new(-dhdx, 1.0, -dhdz).normalize();
    if n.is_finite() { n } else { Vec3::Y }
}

#[inline]
fn gradient(lo: f32, hi: f32, steps: u32, spacing: f32) -> f32 {
    if steps == 0 {
        0.0
    } else {
        (hi - lo) / (steps as f32 * spacing)
    }
}
