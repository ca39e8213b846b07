//! Level-of-detail support: flat multi-resolution grids and distance-based tier selection.

pub mod grid_set;
pub mod selector;

pub use grid_set::{DEFAULT_TIER_RESOLUTIONS, LodGrid, LodGridSet};
pub use selector::{LodTierSelector, camera_distance};
