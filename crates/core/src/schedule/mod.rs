//! The fixed-step scheduler. Each tick advances game time by exactly one
//! minute and runs two ordered handler sets: per-tick handlers first, then
//! cadenced systems whose accumulators have filled. The scheduler itself is
//! synchronous and knows nothing about wall clocks — the process driver
//! calls [Scheduler::tick] on whatever real-time cadence it maintains, and
//! serialization captures everything needed to resume after a restart.

pub mod clock;

pub use clock::{CalendarTime, GameTime};

use crate::error::{SimError, SimResult};
use indexmap::IndexMap;
use log::{debug, error};
use serde::{Deserialize, Serialize};

/// Game seconds that pass per tick. Fixed: one tick is one game minute.
pub const GAME_SECONDS_PER_TICK: f64 = 60.0;

/// Immutable view of the current tick, handed to every handler and system.
#[derive(Copy, Clone, Debug)]
pub struct StepContext {
    pub game_time: GameTime,
    pub step_number: u64,
    pub dt_game_seconds: f64,
}

/// A per-tick or cadenced callback. Failures are isolated: the scheduler
/// logs them and keeps going, so one broken subsystem can't stall the world.
pub type Handler = Box<dyn FnMut(&StepContext) -> anyhow::Result<()> + Send>;

struct CadencedSystem {
    accumulated: f64,
    cadence_seconds: f64,
    /// Empty after a restore until the owner re-registers the system
    handler: Option<Handler>,
}

/// Serialized scheduler counters: game time, step number, and each cadenced
/// system's accumulator. Handler bindings are code, not state, so they are
/// deliberately absent — restoring yields a paused scheduler whose systems
/// must be re-registered by name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerState {
    pub game_time: GameTime,
    pub step_number: u64,
    pub accumulators: IndexMap<String, AccumulatorState>,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccumulatorState {
    pub accumulated: f64,
    pub cadence_seconds: f64,
}

/// The scheduler. See the module docs for the tick model.
#[derive(Default)]
pub struct Scheduler {
    game_time: GameTime,
    step_number: u64,
    handlers: IndexMap<String, Handler>,
    systems: IndexMap<String, CadencedSystem>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconstruct a scheduler from serialized counters. The accumulator
    /// table comes back fully populated but with empty handler slots;
    /// subsequent [Self::register_system] calls rebind by name.
    pub fn restore(state: &SchedulerState) -> Self {
        let systems = state
            .accumulators
            .iter()
            .map(|(name, acc)| {
                (
                    name.clone(),
                    CadencedSystem {
                        accumulated: acc.accumulated,
                        cadence_seconds: acc.cadence_seconds,
                        handler: None,
                    },
                )
            })
            .collect();
        Self {
            game_time: state.game_time,
            step_number: state.step_number,
            handlers: IndexMap::new(),
            systems,
        }
    }

    pub fn game_time(&self) -> GameTime {
        self.game_time
    }

    pub fn step_number(&self) -> u64 {
        self.step_number
    }

    /// Register a per-tick handler. Names are unique; handlers run in
    /// registration order within each tick.
    pub fn register_handler(
        &mut self,
        name: &str,
        handler: Handler,
    ) -> SimResult<()> {
        if self.handlers.contains_key(name) {
            return Err(SimError::DuplicateName(name.to_owned()));
        }
        self.handlers.insert(name.to_owned(), handler);
        Ok(())
    }

    /// Remove a per-tick handler. Returns whether it existed.
    pub fn unregister_handler(&mut self, name: &str) -> bool {
        self.handlers.shift_remove(name).is_some()
    }

    /// Register a cadenced system that fires once every `cadence_seconds`
    /// of game time (at most once per tick). If the name already has an
    /// accumulator — the restore path — the handler binds to it and the
    /// **restored cadence wins** over the argument, so a code change can't
    /// silently drift a half-filled accumulator.
    pub fn register_system(
        &mut self,
        name: &str,
        cadence_seconds: f64,
        handler: Handler,
    ) -> SimResult<()> {
        if !(cadence_seconds > 0.0 && cadence_seconds.is_finite()) {
            return Err(SimError::InvalidArgument(format!(
                "cadence {} must be positive and finite",
                cadence_seconds
            )));
        }
        match self.systems.get_mut(name) {
            Some(system) => {
                if system.handler.is_some() {
                    return Err(SimError::DuplicateName(name.to_owned()));
                }
                if (system.cadence_seconds - cadence_seconds).abs() > f64::EPSILON {
                    debug!(
                        "System {:?} rebinding with cadence {}, \
                        keeping restored cadence {}",
                        name, cadence_seconds, system.cadence_seconds
                    );
                }
                system.handler = Some(handler);
            }
            None => {
                self.systems.insert(
                    name.to_owned(),
                    CadencedSystem {
                        accumulated: 0.0,
                        cadence_seconds,
                        handler: Some(handler),
                    },
                );
            }
        }
        Ok(())
    }

    /// Remove a cadenced system entirely, accumulator included. Returns
    /// whether it existed.
    pub fn unregister_system(&mut self, name: &str) -> bool {
        self.systems.shift_remove(name).is_some()
    }

    /// Run one tick: advance game time one minute, bump the step number,
    /// then run every per-tick handler followed by every due cadenced
    /// system, each set in registration order. Handler failures are logged
    /// and swallowed.
    pub fn tick(&mut self) {
        self.game_time.advance_minutes(1);
        self.step_number += 1;

        let context = StepContext {
            game_time: self.game_time,
            step_number: self.step_number,
            dt_game_seconds: GAME_SECONDS_PER_TICK,
        };

        for (name, handler) in &mut self.handlers {
            if let Err(err) = handler(&context) {
                error!(
                    "Handler {:?} failed at step {}: {:#}",
                    name, context.step_number, err
                );
            }
        }

        for (name, system) in &mut self.systems {
            system.accumulated += GAME_SECONDS_PER_TICK;
            if system.accumulated >= system.cadence_seconds {
                // Reduce by exactly one cadence per firing. A system can
                // fire at most once per tick; if the accumulator is several
                // cadences deep it drains one tick at a time
                system.accumulated -= system.cadence_seconds;
                if let Some(handler) = &mut system.handler {
                    if let Err(err) = handler(&context) {
                        error!(
                            "System {:?} failed at step {}: {:#}",
                            name, context.step_number, err
                        );
                    }
                }
            }
        }
    }

    /// Snapshot the counters for serialization.
    pub fn state(&self) -> SchedulerState {
        SchedulerState {
            game_time: self.game_time,
            step_number: self.step_number,
            accumulators: self
                .systems
                .iter()
                .map(|(name, system)| {
                    (
                        name.clone(),
                        AccumulatorState {
                            accumulated: system.accumulated,
                            cadence_seconds: system.cadence_seconds,
                        },
                    )
                })
                .collect(),
        }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("game_time", &self.game_time)
            .field("step_number", &self.step_number)
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .field("systems", &self.systems.keys().collect::<Vec<_>>())
            .finish()
    }
}
