//! Ghost borders: a `(T+2)²` padded snapshot of one tile plus the boundary
//! cells of its eight neighbors. The water router reads neighbor surfaces
//! through this halo so flow crosses tile seams; because every cell is
//! *copied* out of the cache, LRU eviction mid-routing can never invalidate
//! what the router is looking at.

use crate::world::cache::TileCache;

/// Padded read-only view of a tile and its neighborhood. Interior cell
/// `(x, y)` of the center tile lives at padded `(x + 1, y + 1)`; the outer
/// ring comes from the cardinal neighbors (edge strips) and the diagonal
/// neighbors (single corner cells). Neighbor lookups wrap toroidally and may
/// generate tiles on the way.
#[derive(Clone, Debug)]
pub struct GhostBorder {
    chunk_cells: u32,
    pub terrain_height_m: Vec<f32>,
    pub water_depth_m: Vec<f32>,
}

impl GhostBorder {
    /// Build the halo for the tile at `(cx, cy)`. Touches up to nine tiles
    /// through the cache; with a capacity under nine the center itself can be
    /// evicted while its neighbors generate, so callers re-fetch the center
    /// after building.
    pub fn build(cache: &mut TileCache, cx: i64, cy: i64) -> Self {
        let t = cache.chunk_cells() as usize;
        let padded = t + 2;
        let mut border = Self {
            chunk_cells: t as u32,
            terrain_height_m: vec![0.0; padded * padded],
            water_depth_m: vec![0.0; padded * padded],
        };

        // Center tile: interior block
        {
            let tile = cache.get_tile(cx, cy);
            for y in 0..t {
                let src = y * t..(y + 1) * t;
                let dst = (y + 1) * padded + 1;
                border.terrain_height_m[dst..dst + t]
                    .copy_from_slice(&tile.terrain_height_m[src.clone()]);
                border.water_depth_m[dst..dst + t]
                    .copy_from_slice(&tile.water_depth_m[src]);
            }
        }

        // North neighbor's bottom row -> padded row 0
        {
            let tile = cache.get_tile(cx, cy - 1);
            let src = (t - 1) * t..t * t;
            border.terrain_height_m[1..1 + t]
                .copy_from_slice(&tile.terrain_height_m[src.clone()]);
            border.water_depth_m[1..1 + t]
                .copy_from_slice(&tile.water_depth_m[src]);
        }

        // South neighbor's top row -> padded row t+1
        {
            let tile = cache.get_tile(cx, cy + 1);
            let dst = (t + 1) * padded + 1;
            border.terrain_height_m[dst..dst + t]
                .copy_from_slice(&tile.terrain_height_m[0..t]);
            border.water_depth_m[dst..dst + t]
                .copy_from_slice(&tile.water_depth_m[0..t]);
        }

        // West neighbor's right column -> padded column 0
        {
            let tile = cache.get_tile(cx - 1, cy);
            for y in 0..t {
                let src = y * t + (t - 1);
                let dst = (y + 1) * padded;
                border.terrain_height_m[dst] = tile.terrain_height_m[src];
                border.water_depth_m[dst] = tile.water_depth_m[src];
            }
        }

        // East neighbor's left column -> padded column t+1
        {
            let tile = cache.get_tile(cx + 1, cy);
            for y in 0..t {
                let src = y * t;
                let dst = (y + 1) * padded + (t + 1);
                border.terrain_height_m[dst] = tile.terrain_height_m[src];
                border.water_depth_m[dst] = tile.water_depth_m[src];
            }
        }

        // Corners come from the diagonal tiles' single corner cells, not an
        // average of the cardinals; D8 flow across tile corners depends on it
        let corners = [
            (cx - 1, cy - 1, (t - 1, t - 1), (0, 0)),
            (cx + 1, cy - 1, (0, t - 1), (t + 1, 0)),
            (cx - 1, cy + 1, (t - 1, 0), (0, t + 1)),
            (cx + 1, cy + 1, (0, 0), (t + 1, t + 1)),
        ];
        for (ncx, ncy, (sx, sy), (dx, dy)) in corners {
            let tile = cache.get_tile(ncx, ncy);
            let src = sy * t + sx;
            let dst = dy * padded + dx;
            border.terrain_height_m[dst] = tile.terrain_height_m[src];
            border.water_depth_m[dst] = tile.water_depth_m[src];
        }

        border
    }

    /// Side length of the padded arrays (`T + 2`).
    pub fn padded_size(&self) -> u32 {
        self.chunk_cells + 2
    }

    pub fn chunk_cells(&self) -> u32 {
        self.chunk_cells
    }

    /// Index into the padded arrays by padded coordinates.
    #[inline]
    pub fn index(&self, px: usize, py: usize) -> usize {
        py * (self.chunk_cells as usize + 2) + px
    }

    /// Water surface level (terrain + water) at padded coordinates.
    #[inline]
    pub fn surface_at(&self, px: usize, py: usize) -> f64 {
        let idx = self.index(px, py);
        f64::from(self.terrain_height_m[idx])
            + f64::from(self.water_depth_m[idx])
    }
}
