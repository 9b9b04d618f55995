//! Configuration for the culling engine and its demo.
//!
//! Settings persist to disk as RON files. Supports CLI overrides via clap,
//! hot-reload detection, and forward/backward compatible serialization.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{CameraConfig, Config, CullingConfig, DebugConfig, DemoConfig};
pub use error::ConfigError;
