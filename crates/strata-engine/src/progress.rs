//! Stage identifiers and progress reports delivered to the caller.

use std::fmt;

/// The externally visible generation stages, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Noise,
    Hydraulic,
    Thermal,
    Mesh,
    Upload,
    Complete,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Stage; 6] = [
        Stage::Noise,
        Stage::Hydraulic,
        Stage::Thermal,
        Stage::Mesh,
        Stage::Upload,
        Stage::Complete,
    ];

    /// Lower-case stage name used in reports and logs.
    pub fn name(self) -> &'static str {
        match self {
            Stage::Noise => "noise",
            Stage::Hydraulic => "hydraulic",
            Stage::Thermal => "thermal",
            Stage::Mesh => "mesh",
            Stage::Upload => "upload",
            Stage::Complete => "complete",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One progress report.
#[derive(Clone, Debug, PartialEq)]
pub struct Progress {
    pub stage: Stage,
    /// Fraction of the current stage done, in `[0, 1]`.
    pub progress: f32,
    pub message: String,
}

impl Progress {
    pub(crate) fn new(stage: Stage, progress: f32, message: impl Into<String>) -> Self {
        Self {
            stage,
            progress: progress.clamp(0.0, 1.0),
            message: message.into(),
        }
    }
}
