//! Generation parameter snapshot: grid dimensions plus noise, erosion, and material settings.
//!
//! Every struct carries `#[serde(default)]` so partially specified RON files
//! fill the gaps with the defaults below.

use serde::{Deserialize, Serialize};

/// Errors raised by [`GenerationParams::validate`] before any buffer is touched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamsError {
    /// The grid must contain at least one cell per side.
    #[error("resolution must be greater than zero")]
    ZeroResolution,

    /// The world extent must be a finite positive length.
    #[error("world size must be finite and greater than zero, got {0}")]
    InvalidWorldSize(f32),
}

/// Immutable snapshot of everything one generation pass needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    /// Cells per side of the square heightmap.
    pub resolution: u32,
    /// Edge length of the terrain square in world units.
    pub world_size: f32,
    /// Noise synthesis settings.
    pub noise: NoiseParams,
    /// Hydraulic and thermal erosion settings.
    pub erosion: ErosionParams,
    /// Material blending thresholds consumed downstream.
    pub material: MaterialParams,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            resolution: 256,
            world_size: 256.0,
            noise: NoiseParams::default(),
            erosion: ErosionParams::default(),
            material: MaterialParams::default(),
        }
    }
}

impl GenerationParams {
    /// Check the structural invariants (`resolution > 0`, `world_size > 0`).
    ///
    /// Erosion coefficients are not range-checked; out-of-range
    /// values are the caller's responsibility.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.resolution == 0 {
            return Err(ParamsError::ZeroResolution);
        }
        if !(self.world_size.is_finite() && self.world_size > 0.0) {
            return Err(ParamsError::InvalidWorldSize(self.world_size));
        }
        Ok(())
    }

    /// World-space distance between two adjacent grid cells.
    pub fn cell_spacing(&self) -> f32 {
        self.world_size / self.resolution.saturating_sub(1).max(1) as f32
    }
}

/// Settings for fBm, ridged multifractal, rotation, and domain warping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseParams {
    /// Seed for the permutation tables and droplet spawning.
    pub seed: u32,
    /// Number of octaves summed by both fractal variants.
    pub octaves: u32,
    /// Base frequency, in noise cycles across the whole terrain.
    pub frequency: f64,
    /// Frequency multiplier between successive octaves.
    pub lacunarity: f64,
    /// Amplitude multiplier between successive octaves.
    pub persistence: f64,
    /// Blend factor between fBm (0.0) and ridged multifractal (1.0).
    pub ridge_weight: f64,
    /// Gain applied to each ridged octave's signal to form the next octave's weight.
    pub ridge_gain: f64,
    /// Rotation in radians applied per octave index.
    pub octave_rotation: f64,
    /// Displacement of sample coordinates by the warp field. `0.0` disables warping.
    pub warp_strength: f64,
    /// Base frequency of the warp field, relative to `frequency`.
    pub warp_frequency: f64,
    /// Octaves summed by the warp field.
    pub warp_octaves: u32,
    /// Multiplier applied to the blended `[0, 1]` value to get world-unit elevation.
    pub height_scale: f64,
    /// Offset added to sample coordinates before any other transform.
    pub offset: [f64; 2],
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            seed: 12345,
            octaves: 6,
            frequency: 1.0,
            lacunarity: 2.0,
            persistence: 0.5,
            ridge_weight: 0.35,
            ridge_gain: 2.0,
            octave_rotation: 0.5,
            warp_strength: 0.0,
            warp_frequency: 1.0,
            warp_octaves: 3,
            height_scale: 40.0,
            offset: [0.0, 0.0],
        }
    }
}

/// Erosion settings for both simulation passes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErosionParams {
    /// Droplet-based hydraulic erosion.
    pub hydraulic: HydraulicParams,
    /// Slope-relaxation thermal erosion.
    pub thermal: ThermalParams,
}

/// Droplet simulation coefficients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HydraulicParams {
    /// Run the pass at all. Disabled passes are skipped, not run at zero strength.
    pub enabled: bool,
    /// Total number of droplets simulated.
    pub droplets: u32,
    /// Droplets simulated between two cooperative yield points.
    pub batch_size: u32,
    /// Maximum steps a single droplet may take.
    pub max_lifetime: u32,
    /// How strongly a droplet keeps its previous direction, in `[0, 1]`.
    pub inertia: f32,
    /// Multiplier on the sediment a droplet can carry.
    pub sediment_capacity: f32,
    /// Lower bound on the slope used in the capacity formula.
    pub min_slope: f32,
    /// Fraction of free capacity eroded per step.
    pub erode_speed: f32,
    /// Fraction of excess sediment deposited per step.
    pub deposit_speed: f32,
    /// Fraction of water lost per step.
    pub evaporate_speed: f32,
    /// Acceleration applied by height differences.
    pub gravity: f32,
    /// Radius in cells of the circular erosion brush.
    pub brush_radius: u32,
    /// Water volume a droplet starts with.
    pub initial_water: f32,
    /// Speed a droplet starts with.
    pub initial_speed: f32,
}

impl Default for HydraulicParams {
    fn default() -> Self {
        Self {
            enabled: true,
            droplets: 50_000,
            batch_size: 5_000,
            max_lifetime: 30,
            inertia: 0.05,
            sediment_capacity: 4.0,
            min_slope: 0.01,
            erode_speed: 0.3,
            deposit_speed: 0.3,
            evaporate_speed: 0.01,
            gravity: 4.0,
            brush_radius: 3,
            initial_water: 1.0,
            initial_speed: 1.0,
        }
    }
}

/// Thermal relaxation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermalParams {
    /// Run the pass at all.
    pub enabled: bool,
    /// Full-grid sweeps.
    pub iterations: u32,
    /// Height difference between 4-neighbours above which material slides.
    pub talus_angle: f32,
}

impl Default for ThermalParams {
    fn default() -> Self {
        Self {
            enabled: true,
            iterations: 10,
            talus_angle: 0.6,
        }
    }
}

/// Thresholds and colours for slope/erosion/height material blending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialParams {
    /// `1 - normal.y` above which rock replaces grass.
    pub rock_slope: f32,
    /// Fraction of `height_scale` above which snow appears.
    pub snow_height: f32,
    /// Net deposition (negative erosion) beyond which sediment shows.
    pub sediment_threshold: f32,
    /// Base colour of flat, low terrain.
    pub grass_color: [u8; 3],
    /// Colour of steep slopes.
    pub rock_color: [u8; 3],
    /// Colour of high terrain.
    pub snow_color: [u8; 3],
    /// Colour of deposited sediment.
    pub sediment_color: [u8; 3],
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            rock_slope: 0.35,
            snow_height: 0.8,
            sediment_threshold: 0.02,
            grass_color: [86, 125, 70],
            rock_color: [120, 110, 100],
            snow_color: [240, 240, 245],
            sediment_color: [194, 170, 120],
        }
    }
}
