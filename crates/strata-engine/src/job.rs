//! One generation pass as an explicit, pollable state machine.
//!
//! `init → noise → hydraulic? → thermal? → mesh → upload → complete`
//!
//! Every call to [`GenerationJob::poll`] performs one bounded chunk of work
//! (a band of noise rows, one droplet batch, one thermal sweep, ...) and
//! reports progress before returning, so a caller can interleave generation
//! with other work on the same thread. The job owns freshly allocated grids;
//! nothing it produces is visible outside until it completes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use strata_mesh::TerrainMesh;
use strata_render::{GpuContext, TerrainGpuResources, TextureError};
use strata_terrain::{
    ErosionMap, ErosionStats, GenerationParams, Heightmap, HydraulicErosion, NoiseSynthesizer,
    ParamsError, ThermalErosion, ThermalSweep,
};
use tracing::{debug, info, warn};

use crate::preview::ExportError;
use crate::progress::{Progress, Stage};

/// Upper bound on noise cells evaluated per poll.
const NOISE_CELLS_PER_POLL: u32 = 16_384;

/// Errors that abort a generation.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Parameters failed validation; nothing was allocated or mutated.
    #[error("invalid generation parameters: {0}")]
    InvalidParams(#[from] ParamsError),

    /// A generation is already in flight on this engine.
    #[error("a generation is already in progress")]
    Busy,

    /// Polled with no generation in flight.
    #[error("no generation is in progress")]
    NotRunning,

    /// The cancel token fired; the partial result was discarded.
    #[error("generation cancelled during {stage} stage")]
    Cancelled { stage: Stage },

    /// A stage left NaN or infinite values in the heightmap.
    #[error("{stage} stage produced {count} non-finite heights")]
    NonFiniteHeights { stage: Stage, count: usize },

    /// Creating GPU resources failed.
    #[error("GPU upload failed: {0}")]
    Upload(#[from] TextureError),

    /// Writing preview images failed.
    #[error("preview export failed: {0}")]
    Export(#[from] ExportError),
}

/// Shared flag checked at every yield point of a job.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; takes effect at the job's next poll.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Result of one [`GenerationJob::poll`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobPoll {
    /// More work remains.
    Pending,
    /// Every stage finished.
    Ready,
}

/// What ran during a generation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenerationReport {
    /// Stages that actually executed, in order.
    pub stages_run: Vec<Stage>,
    /// Hydraulic totals, if that stage ran.
    pub hydraulic: Option<ErosionStats>,
    /// One entry per thermal sweep.
    pub thermal: Vec<ThermalSweep>,
    /// Whether mesh and textures were uploaded to a GPU.
    pub uploaded: bool,
    /// Wall-clock time from first poll to completion.
    pub elapsed: Duration,
}

/// Everything a completed job produced.
#[derive(Debug)]
pub struct GenerationOutput {
    pub params: GenerationParams,
    pub heightmap: Heightmap,
    pub erosion: ErosionMap,
    pub mesh: TerrainMesh,
    pub gpu: Option<TerrainGpuResources>,
    pub report: GenerationReport,
}

enum JobState {
    Init,
    Noise { next_row: u32 },
    Hydraulic(Box<HydraulicErosion>),
    Thermal { done: u32 },
    Mesh,
    Upload(Box<TerrainMesh>),
    Complete(Box<TerrainMesh>),
    Failed,
}

/// A single generation pass, advanced by repeated [`Self::poll`] calls.
pub struct GenerationJob {
    params: GenerationParams,
    synth: NoiseSynthesizer,
    thermal: ThermalErosion,
    heightmap: Heightmap,
    erosion: ErosionMap,
    gpu: Option<TerrainGpuResources>,
    state: JobState,
    cancel: CancelToken,
    report: GenerationReport,
    started: Option<Instant>,
}

impl GenerationJob {
    /// Validate `params` and allocate fresh grids.
    ///
    /// # Errors
    ///
    /// [`GenerationError::InvalidParams`] if `resolution == 0` or the world
    /// size is not a positive finite length.
    pub fn new(params: GenerationParams, cancel: CancelToken) -> Result<Self, GenerationError> {
        params.validate()?;
        Ok(Self {
            synth: NoiseSynthesizer::new(params.noise.clone()),
            thermal: ThermalErosion::new(params.erosion.thermal.clone()),
            heightmap: Heightmap::new(params.resolution),
            erosion: ErosionMap::new(params.resolution),
            gpu: None,
            state: JobState::Init,
            cancel,
            report: GenerationReport::default(),
            started: None,
            params,
        })
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// The stage the next poll works on.
    pub fn stage(&self) -> Stage {
        match self.state {
            JobState::Init | JobState::Noise { .. } => Stage::Noise,
            JobState::Hydraulic(_) => Stage::Hydraulic,
            JobState::Thermal { .. } => Stage::Thermal,
            JobState::Mesh => Stage::Mesh,
            JobState::Upload(_) => Stage::Upload,
            JobState::Complete(_) | JobState::Failed => Stage::Complete,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.state, JobState::Complete(_))
    }

    /// Perform one bounded chunk of work.
    ///
    /// `gpu` is only used by the upload stage; with `None` the stage reports
    /// and completes without work. On error the job is dead: later polls
    /// return [`GenerationError::NotRunning`].
    pub fn poll<F>(
        &mut self,
        gpu: Option<&GpuContext>,
        on_progress: &mut F,
    ) -> Result<JobPoll, GenerationError>
    where
        F: FnMut(&Progress),
    {
        let stage = self.stage();
        let result = self.step(gpu, on_progress);
        if let Err(e) = &result {
            warn!(stage = %stage, error = %e, "generation aborted");
            self.abort();
        }
        result
    }

    /// Poll until complete and return the output.
    pub fn run<F>(
        mut self,
        gpu: Option<&GpuContext>,
        on_progress: &mut F,
    ) -> Result<GenerationOutput, GenerationError>
    where
        F: FnMut(&Progress),
    {
        while self.poll(gpu, on_progress)? == JobPoll::Pending {}
        self.into_output().ok_or(GenerationError::NotRunning)
    }

    /// The output, if every stage has finished.
    pub fn into_output(self) -> Option<GenerationOutput> {
        let JobState::Complete(mesh) = self.state else {
            return None;
        };
        Some(GenerationOutput {
            params: self.params,
            heightmap: self.heightmap,
            erosion: self.erosion,
            mesh: *mesh,
            gpu: self.gpu,
            report: self.report,
        })
    }

    fn abort(&mut self) {
        self.state = JobState::Failed;
        if let Some(gpu) = self.gpu.take() {
            gpu.destroy();
        }
    }

    /// Advance the state machine by one chunk. The current state is taken
    /// out for the duration of the step; an early `?` leaves it `Failed`.
    fn step<F>(
        &mut self,
        gpu: Option<&GpuContext>,
        on_progress: &mut F,
    ) -> Result<JobPoll, GenerationError>
    where
        F: FnMut(&Progress),
    {
        let stage = self.stage();
        let resolution = self.params.resolution;
        match std::mem::replace(&mut self.state, JobState::Failed) {
            state @ JobState::Complete(_) => {
                self.state = state;
                return Ok(JobPoll::Ready);
            }
            JobState::Failed => return Err(GenerationError::NotRunning),
            _ if self.cancel.is_cancelled() => {
                return Err(GenerationError::Cancelled { stage });
            }
            JobState::Init => {
                self.started = Some(Instant::now());
                info!(
                    resolution,
                    world_size = self.params.world_size,
                    seed = self.params.noise.seed,
                    "generation started"
                );
                self.enter(Stage::Noise, "synthesizing heightmap", on_progress);
                self.state = JobState::Noise { next_row: 0 };
            }
            JobState::Noise { next_row } => {
                let rows = (NOISE_CELLS_PER_POLL / resolution).max(1);
                let end = (next_row + rows).min(resolution);
                self.synth.fill_rows(&mut self.heightmap, next_row..end);
                on_progress(&Progress::new(
                    Stage::Noise,
                    end as f32 / resolution as f32,
                    format!("noise rows {end}/{resolution}"),
                ));
                if end == resolution {
                    self.check_finite(Stage::Noise)?;
                    self.enter_hydraulic(on_progress);
                } else {
                    self.state = JobState::Noise { next_row: end };
                }
            }
            JobState::Hydraulic(mut sim) => {
                let batch = self.params.erosion.hydraulic.batch_size.max(1);
                sim.run_batch(&mut self.heightmap, &mut self.erosion, batch);
                on_progress(&Progress::new(
                    Stage::Hydraulic,
                    sim.progress(),
                    format!("droplets {}/{}", sim.completed(), sim.total_droplets()),
                ));
                if !sim.is_finished() {
                    self.state = JobState::Hydraulic(sim);
                    return Ok(JobPoll::Pending);
                }
                let stats = sim.stats().clone();
                if stats.rejected_writes > 0 {
                    warn!(
                        rejected = stats.rejected_writes,
                        "hydraulic erosion dropped non-finite writes"
                    );
                }
                info!(
                    droplets = stats.droplets,
                    eroded = stats.eroded,
                    deposited = stats.deposited,
                    "hydraulic erosion finished"
                );
                self.report.hydraulic = Some(stats);
                self.check_finite(Stage::Hydraulic)?;
                self.enter_thermal(on_progress);
            }
            JobState::Thermal { mut done } => {
                let iterations = self.thermal.iterations();
                if done < iterations {
                    let sweep = self.thermal.sweep(&mut self.heightmap);
                    done += 1;
                    self.report.thermal.push(sweep);
                    on_progress(&Progress::new(
                        Stage::Thermal,
                        done as f32 / iterations as f32,
                        format!("thermal sweep {done}/{iterations}, moved {:.4}", sweep.moved),
                    ));
                }
                if done < iterations {
                    self.state = JobState::Thermal { done };
                    return Ok(JobPoll::Pending);
                }
                let rejected: u32 = self.report.thermal.iter().map(|s| s.rejected_writes).sum();
                if rejected > 0 {
                    warn!(rejected, "thermal erosion dropped non-finite writes");
                }
                self.check_finite(Stage::Thermal)?;
                self.enter_mesh(on_progress);
            }
            JobState::Mesh => {
                let mesh =
                    TerrainMesh::extract(&self.heightmap, &self.erosion, self.params.world_size);
                debug!(
                    vertices = mesh.vertex_count(),
                    indices = mesh.index_count(),
                    "mesh extracted"
                );
                on_progress(&Progress::new(
                    Stage::Mesh,
                    1.0,
                    format!("{} vertices", mesh.vertex_count()),
                ));
                self.enter(Stage::Upload, "uploading to GPU", on_progress);
                self.state = JobState::Upload(Box::new(mesh));
            }
            JobState::Upload(mesh) => {
                let message = match gpu {
                    Some(ctx) => {
                        self.gpu = Some(TerrainGpuResources::upload(
                            ctx,
                            &mesh,
                            &self.heightmap,
                            &self.erosion,
                        )?);
                        self.report.uploaded = true;
                        "uploaded mesh and textures"
                    }
                    None => "no GPU context, upload skipped",
                };
                on_progress(&Progress::new(Stage::Upload, 1.0, message));

                self.report.elapsed = self.started.map(|t| t.elapsed()).unwrap_or_default();
                self.report.stages_run.push(Stage::Complete);
                on_progress(&Progress::new(Stage::Complete, 1.0, "terrain ready"));
                info!(
                    elapsed_ms = self.report.elapsed.as_millis() as u64,
                    "generation complete"
                );
                self.state = JobState::Complete(mesh);
                return Ok(JobPoll::Ready);
            }
        }
        Ok(JobPoll::Pending)
    }

    fn enter<F: FnMut(&Progress)>(&mut self, stage: Stage, message: &str, on_progress: &mut F) {
        info!(stage = %stage, "{message}");
        self.report.stages_run.push(stage);
        on_progress(&Progress::new(stage, 0.0, message));
    }

    fn enter_hydraulic<F: FnMut(&Progress)>(&mut self, on_progress: &mut F) {
        let hydraulic = &self.params.erosion.hydraulic;
        if !hydraulic.enabled {
            debug!("hydraulic erosion disabled, skipping");
            self.enter_thermal(on_progress);
            return;
        }
        let sim = HydraulicErosion::new(hydraulic.clone(), self.params.noise.seed);
        self.enter(Stage::Hydraulic, "simulating droplets", on_progress);
        self.state = JobState::Hydraulic(Box::new(sim));
    }

    fn enter_thermal<F: FnMut(&Progress)>(&mut self, on_progress: &mut F) {
        if !self.params.erosion.thermal.enabled {
            debug!("thermal erosion disabled, skipping");
            self.enter_mesh(on_progress);
            return;
        }
        self.enter(Stage::Thermal, "relaxing slopes", on_progress);
        self.state = JobState::Thermal { done: 0 };
    }

    fn enter_mesh<F: FnMut(&Progress)>(&mut self, on_progress: &mut F) {
        self.enter(Stage::Mesh, "extracting mesh", on_progress);
        self.state = JobState::Mesh;
    }

    fn check_finite(&self, stage: Stage) -> Result<(), GenerationError> {
        match self.heightmap.count_non_finite() {
            0 => Ok(()),
            count => Err(GenerationError::NonFiniteHeights { stage, count }),
        }
    }
}
