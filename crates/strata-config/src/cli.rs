//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Strata command-line arguments.
///
/// CLI values override settings loaded from the config file.
#[derive(Parser, Debug, Default)]
#[command(name = "strata", about = "Procedural terrain synthesis and erosion")]
pub struct CliArgs {
    /// Noise seed.
    #[arg(long)]
    pub seed: Option<u32>,

    /// Heightmap cells per side.
    #[arg(long)]
    pub resolution: Option<u32>,

    /// Terrain edge length in world units.
    #[arg(long)]
    pub world_size: Option<f32>,

    /// Number of noise octaves.
    #[arg(long)]
    pub octaves: Option<u32>,

    /// Skip hydraulic erosion.
    #[arg(long)]
    pub no_hydraulic: bool,

    /// Skip thermal erosion.
    #[arg(long)]
    pub no_thermal: bool,

    /// Number of hydraulic erosion droplets.
    #[arg(long)]
    pub droplets: Option<u32>,

    /// Output directory for preview images.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Upload results to a headless GPU when one is available.
    #[arg(long)]
    pub gpu: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(seed) = args.seed {
            self.terrain.noise.seed = seed;
        }
        if let Some(r) = args.resolution {
            self.terrain.resolution = r;
        }
        if let Some(ws) = args.world_size {
            self.terrain.world_size = ws;
        }
        if let Some(o) = args.octaves {
            self.terrain.noise.octaves = o;
        }
        if args.no_hydraulic {
            self.terrain.erosion.hydraulic.enabled = false;
        }
        if args.no_thermal {
            self.terrain.erosion.thermal.enabled = false;
        }
        if let Some(d) = args.droplets {
            self.terrain.erosion.hydraulic.droplets = d;
        }
        if let Some(ref dir) = args.output {
            self.output.directory = dir.clone();
        }
        if args.gpu {
            self.gpu.enabled = true;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            seed: Some(99),
            resolution: Some(65),
            no_thermal: true,
            droplets: Some(10),
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.terrain.noise.seed, 99);
        assert_eq!(config.terrain.resolution, 65);
        assert!(!config.terrain.erosion.thermal.enabled);
        assert_eq!(config.terrain.erosion.hydraulic.droplets, 10);
        // Non-overridden fields retain defaults
        assert!(config.terrain.erosion.hydraulic.enabled);
        assert_eq!(config.terrain.world_size, 256.0);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = CliArgs::parse_from([
            "strata",
            "--seed",
            "7",
            "--world-size",
            "512",
            "--no-hydraulic",
            "--gpu",
        ]);
        assert_eq!(args.seed, Some(7));
        assert_eq!(args.world_size, Some(512.0));
        assert!(args.no_hydraulic);
        assert!(args.gpu);
        assert!(!args.no_thermal);
    }
}
