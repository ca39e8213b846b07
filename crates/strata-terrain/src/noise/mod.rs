//! Seeded gradient noise, fractal sums, and the heightmap synthesizer.

mod fractal;
mod simplex;
mod synth;

pub use fractal::{OctaveSettings, fbm, fbm_signed, ridged};
pub use simplex::{PermutationTable, simplex2};
pub use synth::NoiseSynthesizer;
