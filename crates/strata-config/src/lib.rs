//! Configuration for the strata terrain generator.
//!
//! Settings persist to disk as RON and can be overridden from the command
//! line. Every section is `#[serde(default)]`, so old files keep loading as
//! fields are added and unknown fields are ignored.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{CONFIG_FILE_NAME, Config, DebugConfig, GpuConfig, LodConfig, OutputConfig};
pub use error::ConfigError;
