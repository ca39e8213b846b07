//! The engine facade: owns the live generation, runs jobs, installs results.

use glam::Vec3;
use strata_lod::{LodGrid, LodGridSet, LodTierSelector, camera_distance};
use strata_mesh::TerrainMesh;
use strata_render::{GpuContext, TerrainGpuResources, TerrainGpuSlot};
use strata_terrain::{ErosionMap, GenerationParams, Heightmap};
use tracing::{debug, info, warn};

use crate::job::{
    CancelToken, GenerationError, GenerationJob, GenerationOutput, GenerationReport, JobPoll,
};
use crate::progress::Progress;

/// Where the engine is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineStatus {
    /// Nothing generated yet.
    Empty,
    /// A job is in flight.
    Generating,
    /// The installed terrain is complete and consistent.
    Ready,
    /// The last run failed or was cancelled; no terrain is installed.
    Invalid,
}

/// CPU-side results of the installed generation.
#[derive(Debug)]
struct InstalledTerrain {
    params: GenerationParams,
    heightmap: Heightmap,
    erosion: ErosionMap,
    mesh: TerrainMesh,
    report: GenerationReport,
}

/// Runs generation jobs one at a time and exposes the latest complete terrain.
///
/// Results become visible only when a job finishes; until then queries keep
/// answering from the previous generation. A failed or cancelled run
/// discards everything, including the previous generation.
pub struct TerrainEngine {
    gpu: Option<GpuContext>,
    job: Option<GenerationJob>,
    terrain: Option<InstalledTerrain>,
    gpu_slot: TerrainGpuSlot,
    lod_grids: LodGridSet,
    lod_selector: LodTierSelector,
    status: EngineStatus,
    generations: u64,
}

impl Default for TerrainEngine {
    fn default() -> Self {
        Self::new(None)
    }
}

impl TerrainEngine {
    /// Engine with the default LOD tiers; `gpu` enables the upload stage.
    pub fn new(gpu: Option<GpuContext>) -> Self {
        Self {
            gpu,
            job: None,
            terrain: None,
            gpu_slot: TerrainGpuSlot::new(),
            lod_grids: LodGridSet::default(),
            lod_selector: LodTierSelector::default(),
            status: EngineStatus::Empty,
            generations: 0,
        }
    }

    /// Replace the LOD tier table.
    ///
    /// # Panics
    ///
    /// Panics if `grids` and `selector` disagree on the number of tiers.
    pub fn with_lod(mut self, grids: LodGridSet, selector: LodTierSelector) -> Self {
        assert_eq!(
            grids.resolutions().len(),
            selector.tier_count(),
            "every LOD tier needs a distance threshold"
        );
        self.lod_grids = grids;
        self.lod_selector = selector;
        self
    }

    /// Start a generation.
    ///
    /// Parameters are validated before anything is touched. The returned
    /// token cancels the job at its next poll.
    pub fn begin(&mut self, params: GenerationParams) -> Result<CancelToken, GenerationError> {
        if self.job.is_some() {
            return Err(GenerationError::Busy);
        }
        let token = CancelToken::new();
        let job = GenerationJob::new(params, token.clone())?;
        debug!(resolution = job.params().resolution, "generation queued");
        self.job = Some(job);
        self.status = EngineStatus::Generating;
        Ok(token)
    }

    /// Advance the in-flight job by one chunk.
    ///
    /// On [`JobPoll::Ready`] the results are installed. On error the job and
    /// every installed output are discarded and the status becomes
    /// [`EngineStatus::Invalid`].
    pub fn poll<F>(&mut self, on_progress: &mut F) -> Result<JobPoll, GenerationError>
    where
        F: FnMut(&Progress),
    {
        let Some(job) = self.job.as_mut() else {
            return Err(GenerationError::NotRunning);
        };
        match job.poll(self.gpu.as_ref(), on_progress) {
            Ok(JobPoll::Pending) => Ok(JobPoll::Pending),
            Ok(JobPoll::Ready) => {
                if let Some(output) = self.job.take().and_then(GenerationJob::into_output) {
                    self.install(output);
                }
                Ok(JobPoll::Ready)
            }
            Err(e) => {
                self.job = None;
                self.invalidate();
                Err(e)
            }
        }
    }

    /// Request cancellation of the in-flight job, if any.
    pub fn cancel(&self) {
        if let Some(job) = &self.job {
            job.cancel_token().cancel();
        }
    }

    /// Run a whole generation to completion on the calling thread.
    pub fn regenerate<F>(
        &mut self,
        params: GenerationParams,
        mut on_progress: F,
    ) -> Result<&GenerationReport, GenerationError>
    where
        F: FnMut(&Progress),
    {
        self.begin(params)?;
        while self.poll(&mut on_progress)? == JobPoll::Pending {}
        self.last_report().ok_or(GenerationError::NotRunning)
    }

    fn install(&mut self, output: GenerationOutput) {
        let GenerationOutput {
            params,
            heightmap,
            erosion,
            mesh,
            gpu,
            report,
        } = output;

        match gpu {
            Some(resources) => self.gpu_slot.install(resources),
            None => self.gpu_slot.clear(),
        }
        self.lod_grids.ensure_world_size(params.world_size);
        self.generations += 1;
        info!(
            generation = self.generations,
            vertices = mesh.vertex_count(),
            uploaded = report.uploaded,
            "terrain installed"
        );
        self.terrain = Some(InstalledTerrain {
            params,
            heightmap,
            erosion,
            mesh,
            report,
        });
        self.status = EngineStatus::Ready;
    }

    fn invalidate(&mut self) {
        if self.terrain.take().is_some() {
            warn!("discarding installed terrain after failed generation");
        }
        self.gpu_slot.clear();
        self.status = EngineStatus::Invalid;
    }

    pub fn status(&self) -> EngineStatus {
        self.status
    }

    pub fn is_generating(&self) -> bool {
        self.job.is_some()
    }

    /// Completed generations since the engine was created.
    pub fn generation_count(&self) -> u64 {
        self.generations
    }

    pub fn gpu(&self) -> Option<&GpuContext> {
        self.gpu.as_ref()
    }

    /// Parameters of the installed terrain.
    pub fn params(&self) -> Option<&GenerationParams> {
        self.terrain.as_ref().map(|t| &t.params)
    }

    pub fn heightmap(&self) -> Option<&Heightmap> {
        self.terrain.as_ref().map(|t| &t.heightmap)
    }

    pub fn erosion_map(&self) -> Option<&ErosionMap> {
        self.terrain.as_ref().map(|t| &t.erosion)
    }

    pub fn mesh(&self) -> Option<&TerrainMesh> {
        self.terrain.as_ref().map(|t| &t.mesh)
    }

    pub fn last_report(&self) -> Option<&GenerationReport> {
        self.terrain.as_ref().map(|t| &t.report)
    }

    /// GPU resources of the installed terrain, if it was uploaded.
    pub fn gpu_resources(&self) -> Option<&TerrainGpuResources> {
        self.gpu_slot.current()
    }

    /// Heightmap as `R32Float` texel bytes.
    pub fn heightmap_texture(&self) -> Option<&[u8]> {
        self.heightmap().map(Heightmap::texture_bytes)
    }

    /// Erosion map as `R32Float` texel bytes.
    pub fn erosion_texture(&self) -> Option<&[u8]> {
        self.erosion_map().map(ErosionMap::texture_bytes)
    }

    /// Bilinear terrain height at world-space `(x, z)`, clamped to the terrain.
    pub fn sample_height_at_world(&self, x: f32, z: f32) -> Option<f32> {
        self.terrain
            .as_ref()
            .map(|t| t.heightmap.sample_world(x, z, t.params.world_size))
    }

    pub fn lod_grids(&self) -> &LodGridSet {
        &self.lod_grids
    }

    pub fn lod_selector(&self) -> &LodTierSelector {
        &self.lod_selector
    }

    /// Tier index for a camera position.
    ///
    /// The distance is measured to the terrain point below the camera,
    /// clamped to the terrain square. Without terrain, the distance to the
    /// origin is used.
    pub fn select_lod_tier(&self, camera: Vec3) -> usize {
        let target = match &self.terrain {
            Some(t) => {
                let half = t.params.world_size * 0.5;
                let x = camera.x.clamp(-half, half);
                let z = camera.z.clamp(-half, half);
                Vec3::new(x, t.heightmap.sample_world(x, z, t.params.world_size), z)
            }
            None => Vec3::ZERO,
        };
        self.lod_selector.select_tier(camera_distance(camera, target))
    }

    /// Flat LOD grid for a camera position, once a terrain is installed.
    pub fn lod_grid_for_camera(&self, camera: Vec3) -> Option<&LodGrid> {
        self.lod_grids.tier(self.select_lod_tier(camera))
    }
}
