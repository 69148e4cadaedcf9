//! Process-wide lifecycle gates and the wall-clock tick driver. The live
//! world and the running engine are each an exclusive, at-most-one slot:
//! initializing either twice is an error, and tearing one down frees the
//! slot for a reconfigured restart. All simulation state mutation funnels
//! through the scheduler tick inside the driver task, so HTTP readers only
//! ever see between-tick snapshots.

use crate::config::ServerConfig;
use anyhow::Context;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tellus::{
    CalendarTime, Scheduler, SimError, SimResult, WaterRouter, World,
    WorldConfig,
};
use tokio::sync::watch;

/// The at-most-one live world for this process.
static WORLD: Lazy<Mutex<Option<Arc<Mutex<World>>>>> =
    Lazy::new(|| Mutex::new(None));

/// The at-most-one running engine (scheduler + driver task).
static ENGINE: Lazy<Mutex<Option<EngineHandle>>> =
    Lazy::new(|| Mutex::new(None));

struct EngineHandle {
    scheduler: Arc<Mutex<Scheduler>>,
    stop_tx: watch::Sender<bool>,
}

/// Read-only snapshot of the scheduler clock, for the HTTP surface.
#[derive(Copy, Clone, Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSnapshot {
    pub step_number: u64,
    pub total_minutes: u64,
    pub calendar: CalendarTime,
}

/// Generate the world and claim the world slot. Fails with
/// `AlreadyInitialized` if a world is live.
pub fn init_world(config: WorldConfig) -> SimResult<Arc<Mutex<World>>> {
    let mut slot = WORLD.lock();
    if slot.is_some() {
        return Err(SimError::AlreadyInitialized("world"));
    }
    let world = Arc::new(Mutex::new(World::generate(config)?));
    *slot = Some(Arc::clone(&world));
    info!("World slot claimed");
    Ok(world)
}

/// The live world, if any.
pub fn world() -> SimResult<Arc<Mutex<World>>> {
    WORLD
        .lock()
        .as_ref()
        .map(Arc::clone)
        .ok_or(SimError::NotInitialized("world"))
}

/// Drop the live world. The engine must be stopped first.
pub fn teardown_world() -> SimResult<()> {
    if ENGINE.lock().is_some() {
        return Err(SimError::InvalidArgument(
            "stop the engine before tearing down the world".into(),
        ));
    }
    WORLD
        .lock()
        .take()
        .map(|_| info!("World slot cleared"))
        .ok_or(SimError::NotInitialized("world"))
}

/// Build the scheduler, register the hydrology system, and spawn the tick
/// driver. Requires a live world; fails with `AlreadyInitialized` if an
/// engine is already running.
pub fn start_engine(config: &ServerConfig) -> SimResult<()> {
    let mut slot = ENGINE.lock();
    if slot.is_some() {
        return Err(SimError::AlreadyInitialized("engine"));
    }
    let world = world()?;

    let mut scheduler = Scheduler::new();
    register_hydrology_system(
        &mut scheduler,
        Arc::clone(&world),
        config.hydrology_cadence_seconds,
    )?;

    let scheduler = Arc::new(Mutex::new(scheduler));
    let (stop_tx, stop_rx) = watch::channel(false);
    let tick_interval = Duration::from_secs_f64(config.tick_interval_seconds);
    tokio::spawn(drive(Arc::clone(&scheduler), tick_interval, stop_rx));

    *slot = Some(EngineHandle { scheduler, stop_tx });
    info!(
        "Engine started: tick every {:?}, hydrology every {} game seconds",
        tick_interval, config.hydrology_cadence_seconds
    );
    Ok(())
}

/// Signal the driver to stop and clear the engine slot. A tick already in
/// flight completes; only future ticks are suppressed.
pub fn stop_engine() -> SimResult<()> {
    let handle = ENGINE
        .lock()
        .take()
        .ok_or(SimError::NotInitialized("engine"))?;
    let _ = handle.stop_tx.send(true);
    info!("Engine stopped");
    Ok(())
}

/// Scheduler clock snapshot for the HTTP surface.
pub fn time_snapshot() -> SimResult<TimeSnapshot> {
    let slot = ENGINE.lock();
    let handle = slot.as_ref().ok_or(SimError::NotInitialized("engine"))?;
    let scheduler = handle.scheduler.lock();
    let game_time = scheduler.game_time();
    Ok(TimeSnapshot {
        step_number: scheduler.step_number(),
        total_minutes: game_time.total_minutes(),
        calendar: game_time.calendar(),
    })
}

/// Test hook: force both slots clear regardless of state.
pub fn force_reset() {
    let _ = stop_engine();
    *WORLD.lock() = None;
}

fn register_hydrology_system(
    scheduler: &mut Scheduler,
    world: Arc<Mutex<World>>,
    cadence_seconds: f64,
) -> SimResult<()> {
    scheduler.register_system(
        "hydrology",
        cadence_seconds,
        Box::new(move |ctx| {
            let mut world = world.lock();
            let router = WaterRouter::new(world.config().hydrology)
                .context("hydrology config became invalid")?;
            let stats = world.route_surface_water(&router);
            debug!(
                "Hydrology pass at step {}: {} active cells, {:.3} moved, \
                {:.3} crossed tile boundaries",
                ctx.step_number,
                stats.active_cells,
                stats.total_flow_volume,
                stats.boundary_outflow_volume
            );
            Ok(())
        }),
    )
}

/// The fixed-step driver: sleep, tick, and subtract the tick's own duration
/// from the next sleep so a slow tick doesn't push the schedule back. A tick
/// that overruns the interval collapses the next delay to zero.
async fn drive(
    scheduler: Arc<Mutex<Scheduler>>,
    tick_interval: Duration,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut delay = tick_interval;
    loop {
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = stop_rx.changed() => {
                if *stop_rx.borrow() {
                    break;
                }
            }
        }

        let started = Instant::now();
        scheduler.lock().tick();
        let tick_duration = started.elapsed();
        if tick_duration > tick_interval {
            warn!(
                "Tick took {:?}, longer than the {:?} interval",
                tick_duration, tick_interval
            );
        }
        delay = tick_interval.saturating_sub(tick_duration);
    }
    debug!("Tick driver exited");
}
