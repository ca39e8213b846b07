//! Terrain generation orchestration.
//!
//! [`TerrainEngine`] sequences noise synthesis, hydraulic and thermal erosion,
//! mesh extraction, and the optional GPU upload as a cooperative
//! [`GenerationJob`], reporting [`Progress`] after every chunk of work.

pub mod engine;
pub mod job;
pub mod platform;
pub mod preview;
pub mod progress;

pub use engine::{EngineStatus, TerrainEngine};
pub use job::{
    CancelToken, GenerationError, GenerationJob, GenerationOutput, GenerationReport, JobPoll,
};
pub use platform::{PlatformDirs, PlatformError};
pub use preview::{ExportError, PreviewImage, render_heightmap, render_materials, write_previews};
pub use progress::{Progress, Stage};
