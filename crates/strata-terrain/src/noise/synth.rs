//! Heightmap synthesis: domain-warped blend of fBm and ridged multifractal noise.

use std::ops::Range;

use super::fractal::{OctaveSettings, fbm, fbm_signed, ridged};
use super::simplex::PermutationTable;
use crate::grid::Heightmap;
use crate::params::NoiseParams;
use crate::seed::warp_seed;

/// Offsets decorrelating the warp field's two axes.
const WARP_AXIS_OFFSET: [f64; 2] = [5.2, 1.3];

/// Evaluates terrain elevation from a [`NoiseParams`] snapshot.
///
/// Holds two permutation tables: the primary one for the terrain field and
/// an auxiliary one (seeded by `seed + WARP_SEED_OFFSET`) for the warp field.
pub struct NoiseSynthesizer {
    params: NoiseParams,
    table: PermutationTable,
    warp_table: PermutationTable,
    octaves: OctaveSettings,
    warp_octaves: OctaveSettings,
}

impl NoiseSynthesizer {
    /// Build the permutation tables for `params.seed`.
    pub fn new(params: NoiseParams) -> Self {
        let octaves = OctaveSettings {
            octaves: params.octaves,
            lacunarity: params.lacunarity,
            persistence: params.persistence,
            rotation: params.octave_rotation,
        };
        let warp_octaves = OctaveSettings {
            octaves: params.warp_octaves,
            ..octaves
        };
        Self {
            table: PermutationTable::new(params.seed),
            warp_table: PermutationTable::new(warp_seed(params.seed)),
            params,
            octaves,
            warp_octaves,
        }
    }

    /// Perturb a sample coordinate by the warp field.
    ///
    /// Returns the input unchanged when `warp_strength == 0`.
    pub fn warp(&self, x: f64, y: f64) -> (f64, f64) {
        let strength = self.params.warp_strength;
        if strength == 0.0 {
            return (x, y);
        }
        let wx = x * self.params.warp_frequency;
        let wy = y * self.params.warp_frequency;
        let qx = fbm_signed(&self.warp_table, wx, wy, &self.warp_octaves);
        let qy = fbm_signed(
            &self.warp_table,
            wx + WARP_AXIS_OFFSET[0],
            wy + WARP_AXIS_OFFSET[1],
            &self.warp_octaves,
        );
        (x + qx * strength, y + qy * strength)
    }

    /// fBm in `[0, 1]` at an already-warped coordinate.
    pub fn fbm(&self, x: f64, y: f64) -> f64 {
        fbm(&self.table, x, y, &self.octaves)
    }

    /// Ridged multifractal in `[0, 1]` at an already-warped coordinate.
    pub fn ridged(&self, x: f64, y: f64) -> f64 {
        ridged(&self.table, x, y, &self.octaves, self.params.ridge_gain)
    }

    /// Blended value in `[0, 1]` before `height_scale` is applied.
    pub fn sample_normalized(&self, x: f64, y: f64) -> f64 {
        let (x, y) = self.warp(x, y);
        let f = self.fbm(x, y);
        let r = self.ridged(x, y);
        f + (r - f) * self.params.ridge_weight
    }

    /// Elevation in world units at noise-space coordinate `(x, y)`.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        self.sample_normalized(x, y) * self.params.height_scale
    }

    /// Noise-space coordinate of grid cell `(cx, cy)`.
    ///
    /// The grid spans `[0, frequency]` on both axes (plus `offset`), so the
    /// field does not depend on the grid resolution.
    pub fn cell_coordinate(&self, cx: u32, cy: u32, resolution: u32) -> (f64, f64) {
        let denom = resolution.saturating_sub(1).max(1) as f64;
        (
            cx as f64 / denom * self.params.frequency + self.params.offset[0],
            cy as f64 / denom * self.params.frequency + self.params.offset[1],
        )
    }

    /// Fill a band of rows of `heightmap`, overwriting previous values.
    ///
    /// Row ranges let the caller interleave progress reports between bands.
    pub fn fill_rows(&self, heightmap: &mut Heightmap, rows: Range<u32>) {
        let resolution = heightmap.resolution();
        for cy in rows.start..rows.end.min(resolution) {
            for cx in 0..resolution {
                let (x, y) = self.cell_coordinate(cx, cy, resolution);
                heightmap.set(cx, cy, self.sample(x, y) as f32);
            }
        }
    }

    /// Fill the whole heightmap.
    pub fn fill(&self, heightmap: &mut Heightmap) {
        let resolution = heightmap.resolution();
        self.fill_rows(heightmap, 0..resolution);
    }

    /// The parameters this synthesizer was built from.
    pub fn params(&self) -> &NoiseParams {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::hash_grid;

    fn params() -> NoiseParams {
        NoiseParams {
            seed: 42,
            ..Default::default()
        }
    }

    #[test]
    fn test_determinism_same_seed_same_grid() {
        let a = NoiseSynthesizer::new(params());
        let b = NoiseSynthesizer::new(params());
        let mut grid_a = Heightmap::new(33);
        let mut grid_b = Heightmap::new(33);
        a.fill(&mut grid_a);
        b.fill(&mut grid_b);
        assert_eq!(hash_grid(&grid_a), hash_grid(&grid_b));
    }

    #[test]
    fn test_different_seeds_produce_different_heights() {
        let a = NoiseSynthesizer::new(NoiseParams {
            seed: 1,
            ..Default::default()
        });
        let b = NoiseSynthesizer::new(NoiseParams {
            seed: 999,
            ..Default::default()
        });
        let mut grid_a = Heightmap::new(16);
        let mut grid_b = Heightmap::new(16);
        a.fill(&mut grid_a);
        b.fill(&mut grid_b);
        assert_ne!(hash_grid(&grid_a), hash_grid(&grid_b));
    }

    #[test]
    fn test_zero_warp_is_exact_passthrough() {
        let synth = NoiseSynthesizer::new(NoiseParams {
            warp_strength: 0.0,
            ..params()
        });
        for &(x, y) in &[(0.0, 0.0), (0.123_456_789, -7.5), (1e9, -1e-9)] {
            assert_eq!(synth.warp(x, y), (x, y));
        }
    }

    #[test]
    fn test_warp_moves_coordinates() {
        let synth = NoiseSynthesizer::new(NoiseParams {
            warp_strength: 0.5,
            ..params()
        });
        let moved = (0..20).any(|i| {
            let p = (i as f64 * 0.137 + 0.01, 0.29);
            synth.warp(p.0, p.1) != p
        });
        assert!(moved, "non-zero warp strength must displace coordinates");
    }

    #[test]
    fn test_heights_within_scale() {
        let synth = NoiseSynthesizer::new(NoiseParams {
            warp_strength: 0.3,
            ..params()
        });
        let mut grid = Heightmap::new(40);
        synth.fill(&mut grid);
        let (lo, hi) = grid.min_max();
        let scale = synth.params().height_scale as f32;
        assert!(lo >= 0.0 && hi <= scale, "heights [{lo}, {hi}] outside [0, {scale}]");
    }

    #[test]
    fn test_ridge_weight_endpoints() {
        let fbm_only = NoiseSynthesizer::new(NoiseParams {
            ridge_weight: 0.0,
            ..params()
        });
        let ridged_only = NoiseSynthesizer::new(NoiseParams {
            ridge_weight: 1.0,
            ..params()
        });
        let (x, y) = (0.31, 0.77);
        assert_eq!(fbm_only.sample_normalized(x, y), fbm_only.fbm(x, y));
        assert_eq!(ridged_only.sample_normalized(x, y), ridged_only.ridged(x, y));
    }

    #[test]
    fn test_field_independent_of_resolution() {
        let synth = NoiseSynthesizer::new(params());
        let mut coarse = Heightmap::new(5);
        let mut fine = Heightmap::new(9);
        synth.fill(&mut coarse);
        synth.fill(&mut fine);
        for y in 0..5 {
            for x in 0..5 {
                assert_eq!(
                    coarse.get(x, y),
                    fine.get(x * 2, y * 2),
                    "shared lattice point ({x}, {y}) must match across resolutions"
                );
            }
        }
    }

    #[test]
    fn test_fill_rows_matches_fill() {
        let synth = NoiseSynthesizer::new(params());
        let mut whole = Heightmap::new(12);
        let mut banded = Heightmap::new(12);
        synth.fill(&mut whole);
        synth.fill_rows(&mut banded, 0..5);
        synth.fill_rows(&mut banded, 5..12);
        assert_eq!(whole, banded);
    }
}
