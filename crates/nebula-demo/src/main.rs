//! Headless culling demo: a grid of instanced column rows watched by an
//! orbiting camera, with renderer state driven entirely by culling events.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p nebula-demo -- --instances 10000 --workers 4`.

mod instance_renderer;
mod orbit;
mod scene;
mod spawner;

use std::path::Path;
use std::time::{Duration, Instant};

use clap::Parser;
use nebula_config::{CliArgs, Config, CullingConfig};
use nebula_culling::{CullingError, CullingGroup, ExecutionStrategy, VolumeKeeper, WorkerPool};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use tracing::{debug, error, info, warn};

use crate::orbit::OrbitCamera;
use crate::scene::Scene;

/// Frames between replacing a random row, which moves the last slot into the
/// freed one.
const CHURN_INTERVAL: u32 = 30;

fn main() {
    let args = CliArgs::parse();

    let config_dir = args.config.clone().unwrap_or_else(Config::default_dir);

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    nebula_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    if let Err(err) = run(&config, &config_dir) {
        error!(%err, "culling demo aborted");
        std::process::exit(1);
    }
}

fn execution_strategy(culling: &CullingConfig) -> Result<ExecutionStrategy, CullingError> {
    if !culling.parallel {
        return Ok(ExecutionStrategy::Sequential);
    }
    let pool = match culling.worker_count {
        0 => WorkerPool::new(num_cpus::get(), culling.chunk_size)?,
        n => WorkerPool::new(n, culling.chunk_size)?,
    };
    Ok(ExecutionStrategy::Parallel(pool))
}

fn run(config: &Config, config_dir: &Path) -> Result<(), CullingError> {
    let mut group = CullingGroup::with_capacity(config.culling.capacity);
    group.set_lod_thresholds(Some(config.culling.lod_thresholds.as_slice()))?;
    group.set_execution(execution_strategy(&config.culling)?);
    let mut keeper = VolumeKeeper::with_group(group);

    let mut rng = Xoshiro256StarStar::seed_from_u64(config.demo.seed);
    let rows = spawner::spawn_grid(&config.demo, &mut rng);
    let pivot = spawner::grid_center(&rows);

    let mut scene = Scene::default();
    for row in rows {
        match scene.spawn(&mut keeper, row) {
            Ok(_) => {}
            Err(CullingError::OutOfCapacity { capacity }) => {
                warn!(capacity, requested = config.demo.instance_count, "culling group full, spawning stopped");
                break;
            }
            Err(err) => return Err(err),
        }
    }
    info!(
        volumes = keeper.len(),
        capacity = keeper.capacity(),
        parallel = keeper.group().execution().is_parallel(),
        "scene spawned"
    );

    let mut orbit = OrbitCamera::new(&config.camera, pivot);
    keeper.set_reference_camera(Some(orbit.reference_camera()));

    let mut live_config = config.clone();
    let mut pass_time = Duration::ZERO;
    let mut total_events = 0usize;
    let report_interval = config.debug.report_interval;

    for frame in 1..=config.demo.frames {
        orbit.advance(config.demo.frame_dt);
        if let Some(camera) = keeper.reference_camera_mut() {
            *camera = orbit.reference_camera();
        }

        let started = Instant::now();
        let events = keeper.update();
        pass_time += started.elapsed();
        total_events += events.len();
        scene.apply(events);

        if frame % CHURN_INTERVAL == 0 {
            churn(&mut scene, &mut keeper, &mut rng)?;
        }

        if report_interval > 0 && frame % report_interval == 0 {
            let levels = keeper.group().lod_thresholds().bucket_count();
            let stats = scene.stats(levels);
            info!(
                frame,
                drawn = stats.drawn,
                total = stats.total,
                coarse = stats.coarse,
                lod = ?stats.lod_histogram,
                rebuilds = stats.rebuilds,
                events = total_events,
                avg_pass_us = (pass_time.as_micros() / u128::from(report_interval)) as u64,
                "culling stats"
            );
            pass_time = Duration::ZERO;
            total_events = 0;
            reload_thresholds(&mut live_config, config_dir, &mut keeper);
        }
    }

    info!(frames = config.demo.frames, "culling demo finished");
    Ok(())
}

/// Replace a random row with a fresh one at the same spot.
fn churn(scene: &mut Scene, keeper: &mut VolumeKeeper, rng: &mut Xoshiro256StarStar) -> Result<(), CullingError> {
    let Some(handle) = scene.random_handle(rng) else {
        return Ok(());
    };
    let removed = scene.despawn(keeper, handle)?;
    let replacement = spawner::random_row(removed.row.position, rng);
    let fresh = scene.spawn(keeper, replacement)?;
    debug!(?handle, ?fresh, "row replaced");
    Ok(())
}

/// Pick up LOD threshold edits from `config.ron` while running. Renderers are
/// corrected by the `LodChanged` events the keeper queues for the next frame.
fn reload_thresholds(live: &mut Config, config_dir: &Path, keeper: &mut VolumeKeeper) {
    let new_config = match live.reload(config_dir) {
        Ok(Some(new_config)) => new_config,
        Ok(None) => return,
        Err(err) => {
            debug!(%err, "config reload skipped");
            return;
        }
    };
    if new_config.culling.lod_thresholds != live.culling.lod_thresholds {
        match keeper.set_lod_thresholds(Some(new_config.culling.lod_thresholds.as_slice())) {
            Ok(()) => info!(thresholds = ?new_config.culling.lod_thresholds, "LOD thresholds reloaded"),
            Err(err) => warn!(%err, "reloaded LOD thresholds rejected"),
        }
    }
    *live = new_config;
}
