//! Tellus is a deterministic, tick-driven planetary simulation engine. This
//! crate contains the whole simulation substrate: the seeded RNG streams,
//! the seamless toroidal terrain pipeline, the lazy tile cache, the D8
//! surface-water router, and the fixed-step scheduler. Process concerns
//! (config files, the HTTP surface, the wall-clock driver) live in the
//! server crate.
//!
//! ```
//! use tellus::{World, WorldConfig};
//!
//! let mut config = WorldConfig::default();
//! config.terrain.coarse_sample_res = 32; // keep the doctest quick
//! let mut world = World::generate(config).unwrap();
//! let tile = world.tile(0, 0);
//! println!("{} cells", tile.cell_count());
//! ```
//!
//! Everything is a pure function of the seed: the same [WorldConfig]
//! produces bitwise-identical terrain, placement, and RNG sequences on
//! every run and platform.

mod config;
mod error;
mod noise;
mod rng;
mod schedule;
mod util;
mod world;

pub use crate::{
    config::{
        BeltConfig, HydrologyConfig, Seed, TerrainConfig, WorldConfig,
    },
    error::{SimError, SimResult},
    noise::{torus::TorusNoise, Simplex4d},
    rng::{
        combine_seed, hash_string, Mulberry32, PrngState, Rng, RngState,
        RngStream, RngStreamState,
    },
    schedule::{
        AccumulatorState, CalendarTime, GameTime, Handler, Scheduler,
        SchedulerState, StepContext, GAME_SECONDS_PER_TICK,
    },
    util::{NumRange, RangeValue},
    world::{
        border::GhostBorder,
        cache::{CacheStats, TileCache, TileGenerator},
        generate::{ContinentCenter, MountainBelt, TerrainGenerator},
        hydrology::{
            add_precipitation, add_water_at, count_wet_cells,
            total_water_volume, FlowDirection, RouteStats, WaterRouter,
        },
        metadata::WorldMetadata,
        tile::Tile,
        World,
    },
};
pub use anyhow;
pub use validator;
