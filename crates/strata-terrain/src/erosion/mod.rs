//! Erosion passes that mutate a heightmap in place.

mod hydraulic;
mod thermal;

pub use hydraulic::{ErosionStats, HydraulicErosion};
pub use thermal::{ThermalErosion, ThermalSweep};
