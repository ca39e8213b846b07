//! End-to-end generation through the public engine API.

use std::cell::RefCell;

use glam::Vec3;
use strata_engine::{
    CancelToken, EngineStatus, GenerationError, GenerationJob, JobPoll, Progress, Stage,
    TerrainEngine,
};
use strata_mesh::TerrainMesh;
use strata_terrain::seed::hash_grid;
use strata_terrain::{GenerationParams, ParamsError};

fn params(seed: u32, resolution: u32) -> GenerationParams {
    let mut params = GenerationParams {
        resolution,
        world_size: 64.0,
        ..Default::default()
    };
    params.noise.seed = seed;
    params.erosion.hydraulic.droplets = 500;
    params.erosion.hydraulic.batch_size = 125;
    params.erosion.thermal.iterations = 4;
    params
}

fn generate(params: GenerationParams) -> (TerrainEngine, Vec<Progress>) {
    let mut engine = TerrainEngine::default();
    let mut reports = Vec::new();
    engine
        .regenerate(params, |p| reports.push(p.clone()))
        .expect("generation should succeed");
    (engine, reports)
}

#[test]
fn test_same_seed_is_bit_identical() {
    let (a, _) = generate(params(7, 32));
    let (b, _) = generate(params(7, 32));
    let (c, _) = generate(params(8, 32));

    let ha = hash_grid(a.heightmap().unwrap());
    assert_eq!(ha, hash_grid(b.heightmap().unwrap()));
    assert_eq!(
        hash_grid(a.erosion_map().unwrap()),
        hash_grid(b.erosion_map().unwrap())
    );
    assert_ne!(ha, hash_grid(c.heightmap().unwrap()));
}

#[test]
fn test_golden_heightmap_single_octave_no_erosion() {
    let mut params = GenerationParams {
        resolution: 4,
        world_size: 4.0,
        ..Default::default()
    };
    params.noise.seed = 12345;
    params.noise.octaves = 1;
    params.noise.warp_strength = 0.0;
    params.erosion.hydraulic.enabled = false;
    params.erosion.thermal.enabled = false;

    let (engine, _) = generate(params);
    let expected: [f32; 16] = [
        27.0, 23.02438, 9.288852, 10.132793, 23.444115, 23.913122, 23.73867, 25.01643, 1.3248808,
        1.8414257, 26.99984, 23.31624, 24.031301, 16.79393, 26.913109, 23.078978,
    ];
    assert_eq!(engine.heightmap().unwrap().cells(), &expected[..]);
}

#[test]
fn test_world_sampling_matches_lattice() {
    for (resolution, world_size) in [(5, 8.0), (7, 10.0), (33, 100.0), (100, 37.3)] {
        let mut p = params(3, resolution);
        p.world_size = world_size;
        p.erosion.hydraulic.droplets = 100;
        let (engine, _) = generate(p);
        let heightmap = engine.heightmap().unwrap();
        let span = (resolution - 1) as f32;
        for y in 0..resolution {
            for x in 0..resolution {
                let wx = (x as f32 / span - 0.5) * world_size;
                let wz = (y as f32 / span - 0.5) * world_size;
                assert_eq!(
                    engine.sample_height_at_world(wx, wz),
                    Some(heightmap.get(x, y)),
                    "res={resolution} ws={world_size} cell ({x}, {y})"
                );
            }
        }
    }
}

#[test]
fn test_mesh_matches_grid() {
    for resolution in [2, 9, 33] {
        let (engine, _) = generate(params(1, resolution));
        let mesh = engine.mesh().unwrap();
        let n = resolution as usize;
        assert_eq!(mesh.vertex_count(), n * n);
        assert_eq!(mesh.index_count(), (n - 1) * (n - 1) * 6);
        assert_eq!(mesh.index_count(), TerrainMesh::expected_index_count(resolution));
        assert!(mesh.indices.iter().all(|&i| (i as usize) < n * n));
        assert!(mesh.normals.iter().all(|v| v[1] > 0.0));
    }
}

#[test]
fn test_progress_covers_enabled_stages_in_order() {
    let (_, reports) = generate(params(2, 24));
    let mut seen: Vec<Stage> = reports.iter().map(|p| p.stage).collect();
    seen.dedup();
    assert_eq!(seen, Stage::ALL.to_vec());
    assert!(reports.iter().all(|p| (0.0..=1.0).contains(&p.progress)));
}

#[test]
fn test_disabled_erosion_reports_nothing_for_those_stages() {
    let mut p = params(2, 24);
    p.erosion.hydraulic.enabled = false;
    p.erosion.thermal.enabled = false;
    let (engine, reports) = generate(p);

    assert!(!reports.iter().any(|r| r.stage == Stage::Hydraulic || r.stage == Stage::Thermal));
    let report = engine.last_report().unwrap();
    assert_eq!(
        report.stages_run,
        vec![Stage::Noise, Stage::Mesh, Stage::Upload, Stage::Complete]
    );
    assert!(engine.erosion_map().unwrap().cells().iter().all(|&v| v == 0.0));
}

#[test]
fn test_erosion_changes_terrain() {
    let mut plain = params(5, 32);
    plain.erosion.hydraulic.enabled = false;
    plain.erosion.thermal.enabled = false;
    let (base, _) = generate(plain);
    let (eroded, _) = generate(params(5, 32));

    let diff = base
        .heightmap()
        .unwrap()
        .total_abs_difference(eroded.heightmap().unwrap());
    assert!(diff > 0.0);
    let stats = eroded.last_report().unwrap().hydraulic.clone().unwrap();
    assert_eq!(stats.droplets, 500);
    assert!(stats.eroded > 0.0);
}

#[test]
fn test_cancel_discards_results() {
    let mut engine = TerrainEngine::default();
    engine.regenerate(params(1, 16), |_| {}).unwrap();

    let token = engine.begin(params(2, 16)).unwrap();
    let stages = RefCell::new(Vec::new());
    let mut on_progress = |p: &Progress| stages.borrow_mut().push(p.stage);
    while engine.poll(&mut on_progress).unwrap() == JobPoll::Pending {
        if stages.borrow().contains(&Stage::Thermal) {
            token.cancel();
            break;
        }
    }
    let err = engine.poll(&mut on_progress).unwrap_err();
    assert!(matches!(err, GenerationError::Cancelled { stage: Stage::Thermal }));
    assert_eq!(engine.status(), EngineStatus::Invalid);
    assert!(engine.mesh().is_none());
    assert!(engine.heightmap_texture().is_none());
}

#[test]
fn test_second_begin_is_rejected() {
    let mut engine = TerrainEngine::default();
    engine.begin(params(1, 16)).unwrap();
    assert!(matches!(engine.begin(params(1, 16)), Err(GenerationError::Busy)));
}

#[test]
fn test_invalid_params_rejected_up_front() {
    let mut engine = TerrainEngine::default();
    let mut calls = 0;
    let result = engine.regenerate(
        GenerationParams {
            resolution: 0,
            ..Default::default()
        },
        |_| calls += 1,
    );
    assert!(matches!(
        result,
        Err(GenerationError::InvalidParams(ParamsError::ZeroResolution))
    ));
    assert_eq!(calls, 0);
    assert_eq!(engine.status(), EngineStatus::Empty);
}

#[test]
fn test_lod_grids_follow_world_size() {
    let mut engine = TerrainEngine::default();
    engine.regenerate(params(1, 16), |_| {}).unwrap();
    assert_eq!(engine.lod_grids().world_size(), Some(64.0));
    assert_eq!(engine.lod_grids().build_count(), 1);

    engine.regenerate(params(2, 16), |_| {}).unwrap();
    assert_eq!(engine.lod_grids().build_count(), 1);

    engine
        .regenerate(
            GenerationParams {
                world_size: 128.0,
                ..params(2, 16)
            },
            |_| {},
        )
        .unwrap();
    assert_eq!(engine.lod_grids().build_count(), 2);

    let far = engine.select_lod_tier(Vec3::new(0.0, 10_000.0, 0.0));
    assert_eq!(far, 0);
}

#[test]
fn test_job_runs_without_engine() {
    let job = GenerationJob::new(params(4, 16), CancelToken::new()).unwrap();
    let output = job.run(None, &mut |_: &Progress| {}).unwrap();
    assert_eq!(output.heightmap.resolution(), 16);
    assert!(output.gpu.is_none());
    assert!(!output.report.uploaded);
    assert_eq!(output.report.thermal.len(), 4);
}
