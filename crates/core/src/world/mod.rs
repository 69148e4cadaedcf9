pub mod border;
pub mod cache;
pub mod generate;
pub mod hydrology;
pub mod metadata;
pub mod tile;

use crate::{
    config::WorldConfig,
    error::{SimError, SimResult},
    rng::Rng,
    timed,
    world::{
        border::GhostBorder,
        cache::{CacheStats, TileCache},
        generate::TerrainGenerator,
        hydrology::{RouteStats, WaterRouter},
        metadata::WorldMetadata,
        tile::Tile,
    },
};
use log::{info, warn};
use std::sync::Arc;
use validator::Validate;

/// A live world: the immutable generation products (config, metadata,
/// terrain function) plus the mutable tile cache and the RNG manager that
/// future subsystems draw from.
///
/// Everything observable about a world is a deterministic function of its
/// config; generating the same config twice gives bitwise-identical terrain.
pub struct World {
    config: WorldConfig,
    metadata: Arc<WorldMetadata>,
    generator: Arc<TerrainGenerator>,
    cache: TileCache,
    rng: Rng,
}

impl World {
    /// Validate the config, build the terrain pipeline, calibrate sea level,
    /// and set up the lazy tile cache. No tiles are generated here; they
    /// materialize on first access.
    pub fn generate(config: WorldConfig) -> SimResult<Self> {
        config
            .validate()
            .map_err(|e| SimError::InvalidConfig(e.to_string()))?;
        info!(
            "Generating world: {}x{} m, {} tiles of {} cells, seed {}",
            config.width_m,
            config.height_m,
            config.world_tiles_x() * config.world_tiles_y(),
            config.chunk_cells,
            config.seed
        );

        let mut rng = Rng::new(config.seed.to_u32());
        let generator = Arc::new(timed!(
            "Terrain pipeline construction",
            log::Level::Info,
            TerrainGenerator::new(&config, &mut rng)
        ));
        let metadata = Arc::new(timed!(
            "World metadata",
            log::Level::Info,
            generator.build_metadata()
        ));

        let actual = metadata.ocean_fraction();
        let target = config.terrain.ocean_fraction;
        if (actual - target).abs() > config.terrain.ocean_fraction_tolerance {
            // Calibration pins the quantile, so this only trips if the
            // heightfield has large flat plateaus straddling sea level
            warn!(
                "Ocean fraction {:.3} missed target {:.3} ± {:.3}",
                actual, target, config.terrain.ocean_fraction_tolerance
            );
        }

        let mut cache = TileCache::new(
            config.world_tiles_x(),
            config.world_tiles_y(),
            config.chunk_cells,
            config.max_resident_chunks as usize,
        )?;
        cache.set_generator(Box::new({
            let generator = Arc::clone(&generator);
            let metadata = Arc::clone(&metadata);
            move |tile| generator.fill_tile(tile, &metadata)
        }));

        Ok(Self {
            config,
            metadata,
            generator,
            cache,
            rng,
        })
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn metadata(&self) -> &WorldMetadata {
        &self.metadata
    }

    pub fn generator(&self) -> &TerrainGenerator {
        &self.generator
    }

    pub fn rng_mut(&mut self) -> &mut Rng {
        &mut self.rng
    }

    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut TileCache {
        &mut self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Get (or lazily create) the tile at wrapped coordinates.
    pub fn tile(&mut self, cx: i64, cy: i64) -> &mut Tile {
        self.cache.get_tile(cx, cy)
    }

    /// Build the read-only halo around a tile.
    pub fn ghost_border(&mut self, cx: i64, cy: i64) -> GhostBorder {
        GhostBorder::build(&mut self.cache, cx, cy)
    }

    /// Run one hydrology pass: route surface water over every tile that was
    /// resident when the pass started, each with a fresh halo. Returns the
    /// aggregated routing stats.
    ///
    /// Halo construction can itself pull neighbor tiles into the cache (and
    /// evict others), so we iterate a snapshot of the resident set and skip
    /// any tile that got evicted before its turn.
    pub fn route_surface_water(&mut self, router: &WaterRouter) -> RouteStats {
        let mut total = RouteStats::default();
        for (cx, cy) in self.cache.resident_keys() {
            let (cx, cy) = (i64::from(cx), i64::from(cy));
            if !self.cache.has_tile(cx, cy) {
                continue;
            }
            let border = GhostBorder::build(&mut self.cache, cx, cy);
            let tile = self.cache.get_tile(cx, cy);
            let stats = router.route_tile(tile, Some(&border));

            total.total_flow_volume += stats.total_flow_volume;
            total.boundary_outflow_volume += stats.boundary_outflow_volume;
            total.active_cells += stats.active_cells;
            total.sub_steps = stats.sub_steps;
        }
        total
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("config", &self.config)
            .field("resident_tiles", &self.cache.stats().resident_count)
            .finish_non_exhaustive()
    }
}
