//! Distance-based LOD tier selection.

use glam::Vec3;

/// Picks a tier by scanning a descending distance-threshold table.
///
/// Tier `i` is active when the camera distance meets or exceeds
/// `thresholds[i]`; the scan returns the first match, so table order breaks
/// ties. With the default table, far cameras get tier 0 (coarsest) and close
/// cameras get the last tier (finest).
#[derive(Clone, Debug)]
pub struct LodTierSelector {
    thresholds: Vec<f32>,
}

impl Default for LodTierSelector {
    /// Thresholds `[150, 75, 30, 0]`, one per default tier.
    fn default() -> Self {
        Self {
            thresholds: vec![150.0, 75.0, 30.0, 0.0],
        }
    }
}

impl LodTierSelector {
    /// Create a selector from custom thresholds.
    ///
    /// # Panics
    ///
    /// Panics if `thresholds` is empty or increases anywhere.
    pub fn custom(thresholds: Vec<f32>) -> Self {
        assert!(!thresholds.is_empty(), "must have at least one threshold");
        assert!(
            thresholds.windows(2).all(|w| w[0] >= w[1]),
            "thresholds must be descending: {thresholds:?}"
        );
        Self { thresholds }
    }

    /// Tier for a camera at `distance`.
    ///
    /// Distances below every threshold (including negative or NaN input)
    /// select the last tier.
    pub fn select_tier(&self, distance: f32) -> usize {
        self.thresholds
            .iter()
            .position(|&t| distance >= t)
            .unwrap_or(self.thresholds.len() - 1)
    }

    /// Number of tiers.
    pub fn tier_count(&self) -> usize {
        self.thresholds.len()
    }

    pub fn thresholds(&self) -> &[f32] {
        &self.thresholds
    }
}

/// Distance from the camera to a point on the terrain.
pub fn camera_distance(camera: Vec3, point: Vec3) -> f32 {
    camera.distance(point)
}
