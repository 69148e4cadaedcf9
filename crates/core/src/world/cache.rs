//! Lazy tile cache with LRU eviction. Tiles are created on first access by
//! running the registered generator, and the least recently used tile is
//! dropped once the cache is full. Terrain is deterministic and regenerable,
//! so eviction only loses dynamic state (water, runoff) — an accepted cost,
//! bounded by sizing the capacity to the working set.

use crate::{
    error::{SimError, SimResult},
    util::wrap_mod,
    world::tile::Tile,
};
use fnv::FnvHashMap;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Closure that populates a freshly allocated tile (terrain plus initial
/// ocean water). Stored by the cache and invoked on every miss.
pub type TileGenerator = Box<dyn Fn(&mut Tile) + Send + Sync>;

/// Counters describing cache behavior since the last reset.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub resident_count: usize,
    pub total_accesses: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub evictions: u64,
}

/// The tile cache. All tile coordinates passed in are wrapped toroidally, so
/// `(cx + k * world_tiles_x, cy)` names the same tile for any integer `k`.
pub struct TileCache {
    world_tiles_x: u32,
    world_tiles_y: u32,
    chunk_cells: u32,
    capacity: usize,
    tiles: FnvHashMap<(u32, u32), Tile>,
    /// LRU order: front is most recently used, back is the eviction victim
    order: VecDeque<(u32, u32)>,
    generator: Option<TileGenerator>,
    stats: CacheStats,
}

impl TileCache {
    pub fn new(
        world_tiles_x: u32,
        world_tiles_y: u32,
        chunk_cells: u32,
        capacity: usize,
    ) -> SimResult<Self> {
        if world_tiles_x == 0 || world_tiles_y == 0 {
            return Err(SimError::InvalidConfig(format!(
                "world tile grid {}x{} must be positive on both axes",
                world_tiles_x, world_tiles_y
            )));
        }
        if chunk_cells == 0 {
            return Err(SimError::InvalidConfig(
                "chunk_cells must be positive".into(),
            ));
        }
        if capacity == 0 {
            return Err(SimError::InvalidConfig(
                "tile cache capacity must be positive".into(),
            ));
        }
        Ok(Self {
            world_tiles_x,
            world_tiles_y,
            chunk_cells,
            capacity,
            tiles: FnvHashMap::default(),
            order: VecDeque::new(),
            generator: None,
            stats: CacheStats::default(),
        })
    }

    /// Register the closure that fills freshly created tiles. Without one,
    /// tiles come up zeroed (useful for router unit tests).
    pub fn set_generator(&mut self, generator: TileGenerator) {
        self.generator = Some(generator);
    }

    /// Side length of the tiles this cache creates, in cells.
    pub fn chunk_cells(&self) -> u32 {
        self.chunk_cells
    }

    /// Wrap arbitrary tile coordinates into the canonical grid.
    pub fn wrap(&self, cx: i64, cy: i64) -> (u32, u32) {
        (
            wrap_mod(cx, i64::from(self.world_tiles_x)) as u32,
            wrap_mod(cy, i64::from(self.world_tiles_y)) as u32,
        )
    }

    /// Get the tile at `(cx, cy)`, creating and populating it if absent.
    /// The returned reference is valid until the next call that can evict.
    pub fn get_tile(&mut self, cx: i64, cy: i64) -> &mut Tile {
        let key = self.wrap(cx, cy);
        self.stats.total_accesses += 1;

        if self.tiles.contains_key(&key) {
            self.stats.cache_hits += 1;
            self.touch(key);
        } else {
            self.stats.cache_misses += 1;
            if self.tiles.len() >= self.capacity {
                self.evict_lru();
            }

            let mut tile = Tile::new(key.0, key.1, self.chunk_cells);
            if let Some(generator) = &self.generator {
                generator(&mut tile);
            }
            trace!("Created tile ({}, {})", key.0, key.1);
            self.tiles.insert(key, tile);
            self.order.push_front(key);
        }

        self.tiles.get_mut(&key).expect("tile resident after insert")
    }

    /// Check residency without disturbing the LRU order.
    pub fn has_tile(&self, cx: i64, cy: i64) -> bool {
        self.tiles.contains_key(&self.wrap(cx, cy))
    }

    /// Visit every resident tile, in unspecified order. Does not touch the
    /// LRU order.
    pub fn for_each_resident(&self, mut f: impl FnMut(&Tile)) {
        for tile in self.tiles.values() {
            f(tile);
        }
    }

    /// Snapshot of the resident tile keys. Callers iterating tiles while
    /// mutating the cache (e.g. the hydrology pass, whose halo reads can
    /// trigger generation) iterate this snapshot rather than the live map.
    pub fn resident_keys(&self) -> Vec<(u32, u32)> {
        self.order.iter().copied().collect()
    }

    /// Evict everything.
    pub fn clear(&mut self) {
        self.stats.evictions += self.tiles.len() as u64;
        self.tiles.clear();
        self.order.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            resident_count: self.tiles.len(),
            ..self.stats
        }
    }

    pub fn reset_stats(&mut self) {
        self.stats = CacheStats::default();
    }

    /// Move a resident key to the front of the LRU order.
    fn touch(&mut self, key: (u32, u32)) {
        if let Some(pos) = self.order.iter().position(|&k| k == key) {
            self.order.remove(pos);
        }
        self.order.push_front(key);
    }

    fn evict_lru(&mut self) {
        if let Some(victim) = self.order.pop_back() {
            self.tiles.remove(&victim);
            self.stats.evictions += 1;
            debug!(
                "Evicted tile ({}, {}); its dynamic state is gone",
                victim.0, victim.1
            );
        }
    }
}

impl std::fmt::Debug for TileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileCache")
            .field("world_tiles_x", &self.world_tiles_x)
            .field("world_tiles_y", &self.world_tiles_y)
            .field("chunk_cells", &self.chunk_cells)
            .field("capacity", &self.capacity)
            .field("resident", &self.tiles.len())
            .finish_non_exhaustive()
    }
}
