//! Multi-octave fractal sums over simplex noise: fBm and ridged multifractal.
//!
//! Each octave's sample coordinates are rotated by `rotation × octave_index`
//! so the lattice axes of successive octaves never line up.

use super::simplex::{PermutationTable, simplex2};
use crate::seed::{det_cos, det_sin};

/// Octave stack shared by both fractal variants.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OctaveSettings {
    /// Number of octaves summed.
    pub octaves: u32,
    /// Frequency multiplier between octaves.
    pub lacunarity: f64,
    /// Amplitude multiplier between octaves.
    pub persistence: f64,
    /// Rotation in radians per octave index.
    pub rotation: f64,
}

#[inline]
fn rotate(x: f64, y: f64, angle: f64) -> (f64, f64) {
    if angle == 0.0 {
        return (x, y);
    }
    let (s, c) = (det_sin(angle), det_cos(angle));
    (x * c - y * s, x * s + y * c)
}

/// Signed fBm normalised by the total amplitude: roughly `[-1, 1]`.
///
/// Returns `0.0` when there is nothing to sum (zero octaves or zero amplitude).
pub fn fbm_signed(table: &PermutationTable, x: f64, y: f64, settings: &OctaveSettings) -> f64 {
    let mut sum = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut max_amplitude = 0.0;

    for octave in 0..settings.octaves {
        let (sx, sy) = rotate(
            x * frequency,
            y * frequency,
            settings.rotation * octave as f64,
        );
        sum += simplex2(table, sx, sy) * amplitude;
        max_amplitude += amplitude;
        amplitude *= settings.persistence;
        frequency *= settings.lacunarity;
    }

    if max_amplitude > 0.0 {
        sum / max_amplitude
    } else {
        0.0
    }
}

/// fBm remapped to `[0, 1]`.
///
/// With zero octaves the signed sum is `0.0`, which maps to the midpoint `0.5`.
pub fn fbm(table: &PermutationTable, x: f64, y: f64, settings: &OctaveSettings) -> f64 {
    ((fbm_signed(table, x, y, settings) + 1.0) * 0.5).clamp(0.0, 1.0)
}

/// Ridged multifractal in `[0, 1]`.
///
/// Each octave contributes `(1 - |n|)²` scaled by a weight derived from the
/// previous octave's signal (`signal × gain`, clamped to `[0, 1]`), so ridges
/// sharpen where coarser octaves already formed a crest.
pub fn ridged(
    table: &PermutationTable,
    x: f64,
    y: f64,
    settings: &OctaveSettings,
    gain: f64,
) -> f64 {
    let mut sum = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut max_amplitude = 0.0;
    let mut weight = 1.0;

    for octave in 0..settings.octaves {
        let (sx, sy) = rotate(
            x * frequency,
            y * frequency,
            settings.rotation * octave as f64,
        );
        let mut signal = 1.0 - simplex2(table, sx, sy).abs();
        signal *= signal;
        signal *= weight;
        weight = (signal * gain).clamp(0.0, 1.0);

        sum += signal * amplitude;
        max_amplitude += amplitude;
        amplitude *= settings.persistence;
        frequency *= settings.lacunarity;
    }

    if max_amplitude > 0.0 {
        (sum / max_amplitude).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(octaves: u32) -> OctaveSettings {
        OctaveSettings {
            octaves,
            lacunarity: 2.0,
            persistence: 0.5,
            rotation: 0.5,
        }
    }

    #[test]
    fn test_fbm_within_unit_interval() {
        let table = PermutationTable::new(12345);
        for octaves in [1, 3, 8] {
            let s = settings(octaves);
            for i in 0..120 {
                for j in 0..120 {
                    let v = fbm(&table, i as f64 * 0.037 - 2.0, j as f64 * 0.041 - 2.0, &s);
                    assert!(
                        (0.0..=1.0).contains(&v),
                        "fBm {v} outside [0, 1] with {octaves} octaves"
                    );
                }
            }
        }
    }

    #[test]
    fn test_zero_octaves_guarded() {
        let table = PermutationTable::new(1);
        let s = settings(0);
        assert_eq!(fbm(&table, 0.3, 0.7, &s), 0.5);
        assert_eq!(fbm_signed(&table, 0.3, 0.7, &s), 0.0);
        assert_eq!(ridged(&table, 0.3, 0.7, &s, 2.0), 0.0);
    }

    #[test]
    fn test_ridged_within_unit_interval() {
        let table = PermutationTable::new(77);
        let s = settings(6);
        for i in 0..100 {
            let v = ridged(&table, i as f64 * 0.113, 1.5, &s, 2.0);
            assert!((0.0..=1.0).contains(&v), "ridged {v} outside [0, 1]");
        }
    }

    #[test]
    fn test_single_octave_ignores_rotation() {
        let table = PermutationTable::new(4);
        let a = OctaveSettings {
            rotation: 0.0,
            ..settings(1)
        };
        let b = OctaveSettings {
            rotation: 1.3,
            ..settings(1)
        };
        assert_eq!(fbm(&table, 0.42, 0.17, &a), fbm(&table, 0.42, 0.17, &b));
    }

    #[test]
    fn test_rotation_changes_higher_octaves() {
        let table = PermutationTable::new(4);
        let a = OctaveSettings {
            rotation: 0.0,
            ..settings(4)
        };
        let b = OctaveSettings {
            rotation: 1.3,
            ..settings(4)
        };
        let differs = (0..50).any(|i| {
            let x = i as f64 * 0.21 + 0.05;
            fbm(&table, x, 0.33, &a) != fbm(&table, x, 0.33, &b)
        });
        assert!(differs, "per-octave rotation must affect octaves beyond the first");
    }

    #[test]
    fn test_more_octaves_adds_detail() {
        let table = PermutationTable::new(7);
        let step = 0.01;
        let roughness = |s: &OctaveSettings| -> f64 {
            (0..1000)
                .map(|i| {
                    let x = i as f64 * step;
                    (fbm(&table, x + step, 0.0, s) - fbm(&table, x, 0.0, s)).abs()
                })
                .sum::<f64>()
        };
        assert!(roughness(&settings(8)) > roughness(&settings(1)));
    }
}
