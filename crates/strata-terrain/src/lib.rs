//! Procedural terrain synthesis: seeded noise heightmaps, hydraulic and
//! thermal erosion, and bilinear height queries over the resulting grid.

mod grid;
mod params;

pub mod erosion;
pub mod noise;
pub mod seed;

pub use erosion::{ErosionStats, HydraulicErosion, ThermalErosion, ThermalSweep};
pub use grid::{ErosionMap, Grid, Heightmap};
pub use noise::NoiseSynthesizer;
pub use params::{
    ErosionParams, GenerationParams, HydraulicParams, MaterialParams, NoiseParams, ParamsError,
    ThermalParams,
};
