//! D8 surface-water routing. Each sub-step scans a tile's cells in row-major
//! order, finds every wet cell's steepest-descent neighbor among the eight
//! compass directions, and moves a damped fraction of the surface difference
//! toward it. Moves are staged in a delta buffer and applied after the scan,
//! so the result is independent of scan order; neighbor surfaces are always
//! the pre-step values.
//!
//! With a [GhostBorder] the outermost cells can drain into neighboring
//! tiles: that water simply leaves this tile's budget and re-enters the
//! neighbor when *its* routing pass reads the now-lowered halo. Cross-tile
//! consistency is eventual, settling as neighboring tiles take their turns.

use crate::{
    config::HydrologyConfig,
    error::{SimError, SimResult},
    world::{border::GhostBorder, tile::Tile},
};
use serde::Serialize;
use std::f64::consts::FRAC_1_SQRT_2;
use strum::{EnumIter, IntoEnumIterator};

/// The eight D8 flow directions. Enumeration order is the tie-break order
/// for equal-surface neighbors, so it is part of the determinism contract.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter)]
pub enum FlowDirection {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl FlowDirection {
    /// Cell offset of this direction. North is negative y (row 0 is the top
    /// of the tile).
    pub fn offset(self) -> (i64, i64) {
        match self {
            Self::North => (0, -1),
            Self::NorthEast => (1, -1),
            Self::East => (1, 0),
            Self::SouthEast => (1, 1),
            Self::South => (0, 1),
            Self::SouthWest => (-1, 1),
            Self::West => (-1, 0),
            Self::NorthWest => (-1, -1),
        }
    }

    /// Flow weight: cardinal neighbors 1, diagonals 1/√2 (they're farther
    /// away, so the same surface drop is a gentler gradient).
    pub fn weight(self) -> f64 {
        match self {
            Self::North | Self::East | Self::South | Self::West => 1.0,
            _ => FRAC_1_SQRT_2,
        }
    }
}

/// What one routing call did, summed over its sub-steps.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStats {
    /// Sum of all moved flow magnitudes
    pub total_flow_volume: f64,
    /// Portion of the flow that left the tile through the halo
    pub boundary_outflow_volume: f64,
    /// Number of distinct cells that sourced any flow
    pub active_cells: usize,
    /// Sub-steps executed
    pub sub_steps: u32,
}

/// The surface-water router. Stateless between calls; everything it mutates
/// lives on the tile it is handed.
#[derive(Clone, Debug)]
pub struct WaterRouter {
    config: HydrologyConfig,
}

/// Where a cell's steepest descent points.
#[derive(Copy, Clone)]
enum Winner {
    Interior(usize),
    Halo,
}

impl WaterRouter {
    pub fn new(config: HydrologyConfig) -> SimResult<Self> {
        if !(config.flow_fraction > 0.0 && config.flow_fraction <= 1.0) {
            return Err(SimError::InvalidConfig(format!(
                "flow_fraction {} must be in (0, 1]",
                config.flow_fraction
            )));
        }
        if config.sub_steps_per_tick == 0 {
            return Err(SimError::InvalidConfig(
                "sub_steps_per_tick must be positive".into(),
            ));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &HydrologyConfig {
        &self.config
    }

    /// Run the configured number of sub-steps over one tile. Without a halo
    /// the tile edge is a wall and water piles up against it.
    pub fn route_tile(
        &self,
        tile: &mut Tile,
        halo: Option<&GhostBorder>,
    ) -> RouteStats {
        let t = tile.chunk_cells as usize;
        let cell_count = t * t;
        let mut delta = vec![0.0f64; cell_count];
        let mut sourced = vec![false; cell_count];
        let mut stats = RouteStats::default();

        for _ in 0..self.config.sub_steps_per_tick {
            delta.fill(0.0);
            self.sub_step(tile, halo, &mut delta, &mut sourced, &mut stats);

            // Apply the staged moves; clamp tiny float undershoot to zero
            for (water, d) in tile.water_depth_m.iter_mut().zip(&delta) {
                *water = (f64::from(*water) + d).max(0.0) as f32;
            }
            stats.sub_steps += 1;
        }

        stats.active_cells = sourced.iter().filter(|&&s| s).count();
        stats
    }

    fn sub_step(
        &self,
        tile: &mut Tile,
        halo: Option<&GhostBorder>,
        delta: &mut [f64],
        sourced: &mut [bool],
        stats: &mut RouteStats,
    ) {
        let t = tile.chunk_cells as i64;
        let min_depth = self.config.min_water_depth_m;

        for y in 0..t {
            for x in 0..t {
                let idx = (y * t + x) as usize;
                let water = f64::from(tile.water_depth_m[idx]);
                if water < min_depth {
                    continue;
                }
                let surface =
                    f64::from(tile.terrain_height_m[idx]) + water;

                // Steepest descent among the 8 neighbors; ties keep the
                // first direction in enumeration order
                let mut best: Option<(Winner, f64, f64)> = None;
                for dir in FlowDirection::iter() {
                    let (dx, dy) = dir.offset();
                    let (nx, ny) = (x + dx, y + dy);
                    let inside =
                        nx >= 0 && nx < t && ny >= 0 && ny < t;
                    let (winner, neighbor_surface) = if inside {
                        let n = (ny * t + nx) as usize;
                        let s = f64::from(tile.terrain_height_m[n])
                            + f64::from(tile.water_depth_m[n]);
                        (Winner::Interior(n), s)
                    } else if let Some(halo) = halo {
                        let s = halo.surface_at(
                            (nx + 1) as usize,
                            (ny + 1) as usize,
                        );
                        (Winner::Halo, s)
                    } else {
                        // No halo: the tile edge is a wall
                        continue;
                    };

                    let better = match best {
                        None => true,
                        Some((_, s, _)) => neighbor_surface < s,
                    };
                    if better {
                        best =
                            Some((winner, neighbor_surface, dir.weight()));
                    }
                }

                let (winner, neighbor_surface, weight) = match best {
                    Some(b) => b,
                    None => continue,
                };
                if neighbor_surface >= surface {
                    continue;
                }

                // Half the surface difference would equalize the pair; the
                // flow fraction damps it further to keep sub-steps stable
                let flow = water.min((surface - neighbor_surface) * 0.5)
                    * self.config.flow_fraction
                    * weight;
                if flow < min_depth {
                    continue;
                }

                delta[idx] -= flow;
                match winner {
                    Winner::Interior(n) => {
                        delta[n] += flow;
                        if self.config.track_runoff_flux {
                            tile.runoff_flux[n] += flow as f32;
                        }
                    }
                    Winner::Halo => {
                        stats.boundary_outflow_volume += flow;
                    }
                }
                stats.total_flow_volume += flow;
                sourced[idx] = true;
            }
        }
    }
}

/// Add `amount_m` of water to every land cell (terrain at or above sea
/// level). Returns the number of cells that received water.
pub fn add_precipitation(tile: &mut Tile, amount_m: f64) -> usize {
    let mut count = 0;
    for idx in 0..tile.cell_count() {
        if tile.terrain_height_m[idx] >= 0.0 {
            tile.water_depth_m[idx] += amount_m as f32;
            count += 1;
        }
    }
    count
}

/// Point water source at local cell `(x, y)`.
pub fn add_water_at(
    tile: &mut Tile,
    x: u32,
    y: u32,
    amount_m: f64,
) -> SimResult<()> {
    if x >= tile.chunk_cells || y >= tile.chunk_cells {
        return Err(SimError::InvalidArgument(format!(
            "cell ({}, {}) is outside a {}-cell tile",
            x, y, tile.chunk_cells
        )));
    }
    let idx = tile.index(x, y);
    tile.water_depth_m[idx] += amount_m as f32;
    Ok(())
}

/// Total water volume on the tile, in cell-meters.
pub fn total_water_volume(tile: &Tile) -> f64 {
    tile.water_depth_m.iter().map(|&w| f64::from(w)).sum()
}

/// Number of cells holding at least `threshold_m` of water.
pub fn count_wet_cells(tile: &Tile, threshold_m: f64) -> usize {
    tile.water_depth_m
        .iter()
        .filter(|&&w| f64::from(w) >= threshold_m)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::cache::TileCache;

    fn router() -> WaterRouter {
        WaterRouter::new(HydrologyConfig::default()).unwrap()
    }

    fn router_with(config: HydrologyConfig) -> WaterRouter {
        WaterRouter::new(config).unwrap()
    }

    #[test]
    fn test_rejects_bad_config() {
        let bad = HydrologyConfig {
            flow_fraction: 0.0,
            ..Default::default()
        };
        assert!(WaterRouter::new(bad).is_err());
        let bad = HydrologyConfig {
            sub_steps_per_tick: 0,
            ..Default::default()
        };
        assert!(WaterRouter::new(bad).is_err());
    }

    #[test]
    fn test_flat_terrain_is_static() {
        let mut tile = Tile::new(0, 0, 8);
        tile.terrain_height_m.fill(50.0);
        tile.water_depth_m.fill(0.25);

        let stats = router().route_tile(&mut tile, None);
        assert_eq!(stats.total_flow_volume, 0.0);
        assert_eq!(stats.active_cells, 0);
        assert!(tile.water_depth_m.iter().all(|&w| w == 0.25));
    }

    /// Water on a linear west-to-east slope flows downhill and is conserved
    /// when there is no halo to leak through.
    #[test]
    fn test_slope_conserves_and_spreads() {
        let mut tile = Tile::new(0, 0, 8);
        for y in 0..8u32 {
            for x in 0..8u32 {
                let idx = tile.index(x, y);
                tile.terrain_height_m[idx] =
                    200.0 - (x as f32) * (200.0 / 7.0);
            }
        }
        // One unit of water down the left column
        for y in 0..8 {
            add_water_at(&mut tile, 0, y, 1.0).unwrap();
        }
        let before = total_water_volume(&tile);

        let config = HydrologyConfig {
            sub_steps_per_tick: 20,
            ..Default::default()
        };
        let stats = router_with(config).route_tile(&mut tile, None);

        let after = total_water_volume(&tile);
        assert!(
            (before - after).abs() < 1e-4,
            "water not conserved: {} -> {}",
            before,
            after
        );
        assert!(stats.total_flow_volume > 0.0);
        assert_eq!(stats.boundary_outflow_volume, 0.0);
        assert_eq!(stats.sub_steps, 20);

        // The pulse has marched into the middle columns by now
        let mid_water: f64 = (0..8)
            .flat_map(|y| (3..5).map(move |x| (x, y)))
            .map(|(x, y)| f64::from(tile.water_depth_m[tile.index(x, y)]))
            .sum();
        assert!(mid_water > 0.0, "no water reached the middle columns");
    }

    #[test]
    fn test_no_negative_water() {
        let mut tile = Tile::new(0, 0, 8);
        for y in 0..8u32 {
            for x in 0..8u32 {
                let idx = tile.index(x, y);
                // Jagged terrain to shake out clamp errors
                tile.terrain_height_m[idx] =
                    ((x * 13 + y * 7) % 11) as f32 * 30.0;
            }
        }
        add_water_at(&mut tile, 3, 3, 5.0).unwrap();
        add_water_at(&mut tile, 6, 1, 0.001).unwrap();

        let config = HydrologyConfig {
            sub_steps_per_tick: 50,
            ..Default::default()
        };
        router_with(config).route_tile(&mut tile, None);
        assert!(tile.water_depth_m.iter().all(|&w| w >= 0.0));
    }

    /// On a V-shaped valley, runoff flux concentrates in the central column.
    #[test]
    fn test_valley_concentrates_runoff() {
        let mut tile = Tile::new(0, 0, 9);
        for y in 0..9u32 {
            for x in 0..9u32 {
                let idx = tile.index(x, y);
                tile.terrain_height_m[idx] =
                    (x as f32 - 4.0).abs() * 40.0;
            }
        }
        add_precipitation(&mut tile, 0.5);

        let config = HydrologyConfig {
            sub_steps_per_tick: 30,
            ..Default::default()
        };
        router_with(config).route_tile(&mut tile, None);

        let column_flux = |x: u32| -> f64 {
            (0..9)
                .map(|y| f64::from(tile.runoff_flux[tile.index(x, y)]))
                .sum()
        };
        assert!(column_flux(4) > column_flux(0));
        assert!(column_flux(4) > column_flux(8));
    }

    #[test]
    fn test_runoff_tracking_can_be_disabled() {
        let mut tile = Tile::new(0, 0, 8);
        for x in 0..8u32 {
            for y in 0..8u32 {
                let idx = tile.index(x, y);
                tile.terrain_height_m[idx] = (7 - x) as f32 * 10.0;
            }
        }
        add_precipitation(&mut tile, 1.0);

        let config = HydrologyConfig {
            track_runoff_flux: false,
            ..Default::default()
        };
        let stats = router_with(config).route_tile(&mut tile, None);
        assert!(stats.total_flow_volume > 0.0);
        assert!(tile.runoff_flux.iter().all(|&f| f == 0.0));
    }

    /// With a halo lower than the tile, boundary cells drain out and the
    /// tile's loss matches the recorded boundary outflow.
    #[test]
    fn test_halo_outflow_accounting() {
        let mut cache = TileCache::new(4, 4, 4, 16).unwrap();
        // Plateau world: center tile raised, neighbors at zero
        let border = GhostBorder::build(&mut cache, 1, 1);

        let mut tile = Tile::new(1, 1, 4);
        tile.terrain_height_m.fill(100.0);
        tile.water_depth_m.fill(1.0);
        let before = total_water_volume(&tile);

        let stats = router().route_tile(&mut tile, Some(&border));
        let after = total_water_volume(&tile);

        assert!(after < before, "plateau tile failed to drain");
        assert!(
            ((before - after) - stats.boundary_outflow_volume).abs() < 1e-4,
            "loss {} != recorded outflow {}",
            before - after,
            stats.boundary_outflow_volume
        );
    }

    /// Without inflow, a tile's volume never increases, halo or not.
    #[test]
    fn test_volume_never_increases_with_halo() {
        let mut cache = TileCache::new(4, 4, 4, 16).unwrap();
        let border = GhostBorder::build(&mut cache, 0, 0);

        let mut tile = Tile::new(0, 0, 4);
        for y in 0..4u32 {
            for x in 0..4u32 {
                let idx = tile.index(x, y);
                tile.terrain_height_m[idx] = (x + y) as f32 * 5.0;
            }
        }
        tile.water_depth_m.fill(0.5);

        let mut previous = total_water_volume(&tile);
        let config = HydrologyConfig {
            sub_steps_per_tick: 1,
            ..Default::default()
        };
        let router = router_with(config);
        for _ in 0..20 {
            router.route_tile(&mut tile, Some(&border));
            let current = total_water_volume(&tile);
            assert!(current <= previous + 1e-6);
            previous = current;
        }
    }

    #[test]
    fn test_deterministic_given_same_state() {
        let make_tile = || {
            let mut tile = Tile::new(0, 0, 8);
            for y in 0..8u32 {
                for x in 0..8u32 {
                    let idx = tile.index(x, y);
                    tile.terrain_height_m[idx] =
                        ((x * 31 + y * 17) % 13) as f32 * 12.0;
                    tile.water_depth_m[idx] = (x % 3) as f32 * 0.4;
                }
            }
            tile
        };
        let mut a = make_tile();
        let mut b = make_tile();
        let stats_a = router().route_tile(&mut a, None);
        let stats_b = router().route_tile(&mut b, None);

        assert_eq!(a.water_depth_m, b.water_depth_m);
        assert_eq!(a.runoff_flux, b.runoff_flux);
        assert_eq!(stats_a, stats_b);
    }

    #[test]
    fn test_add_precipitation_lands_on_land_only() {
        let mut tile = Tile::new(0, 0, 4);
        for idx in 0..8 {
            tile.terrain_height_m[idx] = -10.0; // ocean half
        }
        for idx in 8..16 {
            tile.terrain_height_m[idx] = 10.0; // land half
        }
        let count = add_precipitation(&mut tile, 0.1);
        assert_eq!(count, 8);
        assert_eq!(tile.water_depth_m[0], 0.0);
        assert!((f64::from(tile.water_depth_m[12]) - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_add_water_bounds_check() {
        let mut tile = Tile::new(0, 0, 4);
        assert!(add_water_at(&mut tile, 4, 0, 1.0).is_err());
        assert!(add_water_at(&mut tile, 0, 4, 1.0).is_err());
        assert!(add_water_at(&mut tile, 3, 3, 1.0).is_ok());
    }

    #[test]
    fn test_observers() {
        let mut tile = Tile::new(0, 0, 4);
        add_water_at(&mut tile, 0, 0, 2.0).unwrap();
        add_water_at(&mut tile, 1, 0, 0.5).unwrap();
        assert!((total_water_volume(&tile) - 2.5).abs() < 1e-9);
        assert_eq!(count_wet_cells(&tile, 0.4), 2);
        assert_eq!(count_wet_cells(&tile, 1.0), 1);
    }
}
