//! `strata`: generate one terrain and write preview images.

use std::process::ExitCode;

use clap::Parser;
use strata_config::{CliArgs, Config, LodConfig};
use strata_engine::{GenerationError, PlatformDirs, TerrainEngine, write_previews};
use strata_lod::{LodGridSet, LodTierSelector};
use strata_render::{GpuContext, parse_power_preference};
use tracing::{error, info, warn};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let dirs = PlatformDirs::resolve().ok();
    let config_dir = args
        .config
        .clone()
        .or_else(|| dirs.as_ref().map(|d| d.config_dir.clone()))
        .unwrap_or_else(Config::default_dir);

    let (mut config, config_error) = match Config::load_or_create(&config_dir) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    config.apply_cli_overrides(&args);

    strata_log::init_logging(
        dirs.as_ref().map(|d| d.log_dir.as_path()),
        cfg!(debug_assertions),
        Some(&config),
    );
    if let Some(e) = config_error {
        warn!(error = %e, dir = %config_dir.display(), "config unusable, using defaults");
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "generation failed");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> Result<(), GenerationError> {
    let gpu = if config.gpu.enabled {
        let ctx = GpuContext::try_headless(parse_power_preference(&config.gpu.power_preference));
        if ctx.is_none() {
            warn!("no GPU adapter available, continuing without upload");
        }
        ctx
    } else {
        None
    };

    let mut engine = TerrainEngine::new(gpu);
    if let Some((grids, selector)) = lod_from_config(&config.lod) {
        engine = engine.with_lod(grids, selector);
    } else {
        warn!(lod = ?config.lod, "invalid LOD tiers, using defaults");
    }

    let report = engine.regenerate(config.terrain.clone(), |p| {
        info!(stage = %p.stage, progress = p.progress, "{}", p.message);
    })?;
    if let Some(stats) = &report.hydraulic {
        info!(
            droplets = stats.droplets,
            steps = stats.steps,
            eroded = stats.eroded,
            deposited = stats.deposited,
            "hydraulic summary"
        );
    }
    info!(elapsed_ms = report.elapsed.as_millis() as u64, "terrain generated");

    if let (Some(heightmap), Some(erosion), Some(mesh)) =
        (engine.heightmap(), engine.erosion_map(), engine.mesh())
    {
        write_previews(
            &config.output,
            heightmap,
            erosion,
            mesh,
            &config.terrain.material,
            config.terrain.noise.height_scale as f32,
        )?;
    }
    Ok(())
}

/// Tier table from config, or `None` if it would be rejected.
fn lod_from_config(lod: &LodConfig) -> Option<(LodGridSet, LodTierSelector)> {
    let resolutions = &lod.tier_resolutions;
    let thresholds = &lod.distance_thresholds;
    let valid = !resolutions.is_empty()
        && resolutions.len() == thresholds.len()
        && resolutions[0] >= 2
        && resolutions.windows(2).all(|w| w[0] < w[1])
        && thresholds.windows(2).all(|w| w[0] >= w[1]);
    valid.then(|| {
        (
            LodGridSet::new(resolutions.clone()),
            LodTierSelector::custom(thresholds.clone()),
        )
    })
}
