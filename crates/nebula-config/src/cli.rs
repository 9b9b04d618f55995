//! Command-line argument parsing for the culling demo.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Culling demo command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "nebula-culling", about = "Frustum culling and LOD tracking demo")]
pub struct CliArgs {
    /// Number of volumes to spawn.
    #[arg(long)]
    pub instances: Option<usize>,

    /// Culling group capacity.
    #[arg(long)]
    pub capacity: Option<usize>,

    /// Frames to simulate.
    #[arg(long)]
    pub frames: Option<u32>,

    /// Use the parallel culling pass.
    #[arg(long)]
    pub parallel: Option<bool>,

    /// Worker threads for the parallel pass (0 = one per CPU).
    #[arg(long)]
    pub workers: Option<usize>,

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
        if let Some(n) = args.instances {
            self.demo.instance_count = n;
        }
        if let Some(capacity) = args.capacity {
            self.culling.capacity = capacity;
        }
        if let Some(frames) = args.frames {
            self.demo.frames = frames;
        }
        if let Some(parallel) = args.parallel {
            self.culling.parallel = parallel;
        }
        if let Some(workers) = args.workers {
            self.culling.worker_count = workers;
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
            instances: Some(10_000),
            parallel: Some(false),
            log_level: Some("debug".to_string()),
            ..CliArgs::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.demo.instance_count, 10_000);
        assert!(!config.culling.parallel);
        assert_eq!(config.debug.log_level, "debug");
        // Non-overridden fields retain defaults
        assert_eq!(config.culling.capacity, 4096);
        assert_eq!(config.demo.frames, 600);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_parse_flags() {
        let args = CliArgs::parse_from([
            "nebula-culling",
            "--capacity",
            "20000",
            "--workers",
            "2",
            "--parallel",
            "true",
        ]);
        assert_eq!(args.capacity, Some(20_000));
        assert_eq!(args.workers, Some(2));
        assert_eq!(args.parallel, Some(true));
        assert!(args.frames.is_none());
    }
}
