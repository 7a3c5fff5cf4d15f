//! Headless simulation runner.
//!
//! Loads (or creates) a config and a save, then drives the fixed-timestep
//! core for a scripted session: the player walks a slow circle while mine
//! orders keep every drone busy. Autosaves on the configured cadence and
//! writes a final save on exit.
//!
//! Run with `cargo run -p regolith-run -- --ticks 1200 --seed 42`.

use std::error::Error;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;

use regolith_config::{CliArgs, Config};
use regolith_persist::{FileStore, autosave, load_sim, save_sim};
use regolith_sim::{
    Activity, InitialStateParams, InputState, OrderStatus, SimState, TickContext,
    build_initial_state, issue_mine_order, run_sim_tick,
};
use regolith_terrain::ensure_chunks_for_position;

fn main() -> Result<(), Box<dyn Error>> {
    let args = CliArgs::parse();

    let config_dir = args.config.clone().unwrap_or_else(|| ".".into());
    let mut config = Config::load_or_create(&config_dir)?;
    config.apply_cli_overrides(&args);

    env_logger::Builder::new()
        .parse_filters(&config.log_filter)
        .init();

    let mut store = FileStore::new(Path::new(&config.storage.save_dir));
    let save_key = config.storage.save_key.clone();

    let loaded = if args.fresh {
        None
    } else {
        load_sim(&store, &save_key)?
    };
    let mut state = loaded.unwrap_or_else(|| {
        log::info!("starting fresh world with seed {}", config.sim.seed);
        build_initial_state(&InitialStateParams {
            seed: config.sim.seed,
            drone_count: config.sim.drone_count,
            chunk_radius: config.sim.chunk_radius,
        })
    });

    log::info!(
        "resuming at tick {} ({} chunks, {} drones, {} orders)",
        state.tick,
        state.world.chunks.len(),
        state.drones.len(),
        state.orders.len()
    );

    let dt = 1.0 / config.sim.tick_rate.max(1) as f32;
    for step in 0..args.ticks {
        state = drive_one_tick(state, dt, step, &config);
        autosave(
            &mut store,
            &save_key,
            &state,
            config.storage.autosave_interval_ticks,
        );
        if state.tick % u64::from(config.sim.tick_rate.max(1)) == 0 {
            log_progress(&state);
        }
    }

    let label = wall_clock_label();
    save_sim(&mut store, &save_key, &state, Some(label.as_str()))?;
    log::info!("saved and exiting at tick {}", state.tick);
    Ok(())
}

/// One driver step: keep drones fed with orders, keep the chunk window
/// current around the player, then advance the core by one tick.
fn drive_one_tick(mut state: SimState, dt: f32, step: u64, config: &Config) -> SimState {
    let idle_drones = state.drones.iter().filter(|d| d.task.is_none()).count();
    let open_orders = state
        .orders
        .iter()
        .filter(|o| o.status != OrderStatus::Completed)
        .count();
    if idle_drones > open_orders {
        let origin = state.player.position;
        state = issue_mine_order(state, origin);
    }

    let update = ensure_chunks_for_position(
        state.world,
        state.seed,
        state.player.position,
        config.sim.chunk_radius,
    );
    state.world = update.world;

    // Scripted stroll: quarter turn every ten seconds.
    let heading =
        std::f32::consts::FRAC_PI_2 * (step / (10 * u64::from(config.sim.tick_rate.max(1)))) as f32;
    let ctx = TickContext {
        input: InputState {
            forward: true,
            ..Default::default()
        },
        heading,
        camera_phi: 1.9, // gaze angled down at the terrain ahead
        dt,
        actions: Vec::new(),
    };
    run_sim_tick(state, &ctx)
}

fn log_progress(state: &SimState) {
    let mined: u32 = state.drones.iter().map(|d| d.carrying).sum();
    let busy = state
        .drones
        .iter()
        .filter(|d| d.activity != Activity::Idle)
        .count();
    let position = state.player.position;
    log::info!(
        "tick {}: player at {position}, {busy}/{} drones busy, {mined} ore mined, {} orders",
        state.tick,
        state.drones.len(),
        state.orders.len()
    );
}

fn wall_clock_label() -> String {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => format!("unix:{}", elapsed.as_secs()),
        Err(_) => "unix:0".to_string(),
    }
}
