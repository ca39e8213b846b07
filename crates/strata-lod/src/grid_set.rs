//! Flat `y = 0` grids at a fixed ascending set of resolutions.
//!
//! The grids carry no elevation. A vertex shader displaces them by sampling
//! the `R32Float` heightmap texture at each vertex's UV, so the same grids
//! serve every generation until the world size changes.

use std::collections::BTreeMap;

use tracing::debug;

/// Default tier resolutions, coarsest first.
pub const DEFAULT_TIER_RESOLUTIONS: [u32; 4] = [32, 64, 128, 256];

/// One flat grid mesh covering the whole terrain square.
#[derive(Clone, Debug, PartialEq)]
pub struct LodGrid {
    resolution: u32,
    positions: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    indices: Vec<u32>,
}

impl LodGrid {
    /// Build a `resolution × resolution` vertex grid spanning `world_size`,
    /// centred on the origin, with the same triangle winding as the terrain mesh.
    ///
    /// # Panics
    ///
    /// Panics if `resolution < 2`.
    pub fn build(resolution: u32, world_size: f32) -> Self {
        assert!(resolution >= 2, "LOD grid needs at least 2 vertices per side");
        let span = (resolution - 1) as f32;
        let n = resolution as usize * resolution as usize;
        let mut positions = Vec::with_capacity(n);
        let mut uvs = Vec::with_capacity(n);

        for y in 0..resolution {
            for x in 0..resolution {
                let u = x as f32 / span;
                let v = y as f32 / span;
                positions.push([(u - 0.5) * world_size, 0.0, (v - 0.5) * world_size]);
                uvs.push([u, v]);
            }
        }

        let quads = (resolution - 1) as usize;
        let mut indices = Vec::with_capacity(quads * quads * 6);
        for y in 0..resolution - 1 {
            for x in 0..resolution - 1 {
                let tl = y * resolution + x;
                let tr = tl + 1;
                let bl = (y + 1) * resolution + x;
                let br = bl + 1;
                indices.extend_from_slice(&[tl, bl, tr, tr, bl, br]);
            }
        }

        Self {
            resolution,
            positions,
            uvs,
            indices,
        }
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    /// Heightmap texture coordinates, `[0, 1]` on both axes.
    pub fn uvs(&self) -> &[[f32; 2]] {
        &self.uvs
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Raw position data for a vertex buffer.
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Raw index data for an index buffer.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// Resolution tier → flat grid, rebuilt only when the world size changes.
#[derive(Clone, Debug)]
pub struct LodGridSet {
    resolutions: Vec<u32>,
    world_size: Option<f32>,
    grids: BTreeMap<u32, LodGrid>,
    builds: u32,
}

impl Default for LodGridSet {
    fn default() -> Self {
        Self::new(DEFAULT_TIER_RESOLUTIONS.to_vec())
    }
}

impl LodGridSet {
    /// An empty set for the given tier resolutions. Nothing is built until
    /// [`Self::ensure_world_size`] is called.
    ///
    /// # Panics
    ///
    /// Panics if `resolutions` is empty, not strictly ascending, or contains
    /// a value below 2.
    pub fn new(resolutions: Vec<u32>) -> Self {
        assert!(!resolutions.is_empty(), "must have at least one LOD tier");
        assert!(
            resolutions.windows(2).all(|w| w[0] < w[1]),
            "tier resolutions must be strictly ascending: {resolutions:?}"
        );
        assert!(resolutions[0] >= 2, "tier resolutions must be at least 2");
        Self {
            resolutions,
            world_size: None,
            grids: BTreeMap::new(),
            builds: 0,
        }
    }

    /// Rebuild every tier if `world_size` differs from the size the grids
    /// were built for. Returns `true` when a rebuild happened.
    pub fn ensure_world_size(&mut self, world_size: f32) -> bool {
        if self.world_size == Some(world_size) {
            return false;
        }
        self.grids = self
            .resolutions
            .iter()
            .map(|&r| (r, LodGrid::build(r, world_size)))
            .collect();
        self.world_size = Some(world_size);
        self.builds += 1;
        debug!(world_size, tiers = self.resolutions.len(), "rebuilt LOD grids");
        true
    }

    /// Tier resolutions, coarsest first.
    pub fn resolutions(&self) -> &[u32] {
        &self.resolutions
    }

    /// World size the current grids were built for.
    pub fn world_size(&self) -> Option<f32> {
        self.world_size
    }

    /// Grid for a resolution, if built.
    pub fn grid(&self, resolution: u32) -> Option<&LodGrid> {
        self.grids.get(&resolution)
    }

    /// Grid for a tier index (0 = coarsest).
    pub fn tier(&self, tier: usize) -> Option<&LodGrid> {
        self.resolutions.get(tier).and_then(|r| self.grids.get(r))
    }

    /// How many times the set has been (re)built.
    pub fn build_count(&self) -> u32 {
        self.builds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_is_flat_and_centred() {
        let grid = LodGrid::build(5, 100.0);
        assert_eq!(grid.positions().len(), 25);
        assert!(grid.positions().iter().all(|p| p[1] == 0.0));
        assert_eq!(grid.positions()[0], [-50.0, 0.0, -50.0]);
        assert_eq!(grid.positions()[24], [50.0, 0.0, 50.0]);
        assert_eq!(grid.uvs()[24], [1.0, 1.0]);
    }

    #[test]
    fn test_grid_indices_valid() {
        let grid = LodGrid::build(9, 10.0);
        assert_eq!(grid.indices().len(), 8 * 8 * 6);
        assert!(grid.indices().iter().all(|&i| i < 81));
        assert_eq!(&grid.indices()[..6], &[0, 9, 1, 1, 9, 10]);
        assert_eq!(grid.index_bytes().len(), grid.indices().len() * 4);
        assert_eq!(grid.position_bytes().len(), 81 * 12);
    }

    #[test]
    fn test_set_builds_every_tier() {
        let mut set = LodGridSet::default();
        assert!(set.tier(0).is_none());
        assert!(set.ensure_world_size(512.0));
        for (i, &r) in DEFAULT_TIER_RESOLUTIONS.iter().enumerate() {
            assert_eq!(set.tier(i).map(LodGrid::resolution), Some(r));
            assert!(set.grid(r).is_some());
        }
    }

    #[test]
    fn test_rebuild_only_on_world_size_change() {
        let mut set = LodGridSet::new(vec![4, 8]);
        assert!(set.ensure_world_size(10.0));
        assert!(!set.ensure_world_size(10.0));
        assert_eq!(set.build_count(), 1);
        assert!(set.ensure_world_size(20.0));
        assert_eq!(set.build_count(), 2);
        assert_eq!(set.world_size(), Some(20.0));
        assert_eq!(set.grid(4).map(|g| g.positions()[0]), Some([-10.0, 0.0, -10.0]));
    }

    #[test]
    #[should_panic(expected = "strictly ascending")]
    fn test_unsorted_resolutions_panic() {
        LodGridSet::new(vec![64, 32]);
    }
}
