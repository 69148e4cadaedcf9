//! The coarse world grid: an `R x R` downsample of the raw heightfield used
//! for three world-init products — the sea-level bias that pins the ocean
//! fraction, the coast-distance field that shapes bathymetry, and the
//! ocean-connectivity mask that tells inland depressions apart from actual
//! ocean. All three are deterministic functions of the raw samples; the BFS
//! queue orders below are fixed and load-bearing.

use crate::util::cmp_unwrap;
use std::collections::VecDeque;

/// 4-connected neighbor offsets, fixed order. Both BFS passes use this.
const NEIGHBORS_4: [(i64, i64); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

/// Compute the sea-level bias: the vertical offset that puts exactly the
/// target fraction of coarse samples below zero. This is the quantile of the
/// sorted samples, negated.
pub fn calibrate_sea_level(samples: &[f64], ocean_fraction: f64) -> f64 {
    let mut sorted = samples.to_vec();
    sorted.sort_by(cmp_unwrap);
    let index = ((ocean_fraction * sorted.len() as f64).floor() as usize)
        .min(sorted.len() - 1);
    -sorted[index]
}

/// Build the coarse land mask: 1 where the biased height is at or above sea
/// level.
pub fn land_mask(samples: &[f64], bias_m: f64) -> Vec<u8> {
    samples
        .iter()
        .map(|&h| u8::from(h + bias_m >= 0.0))
        .collect()
}

/// BFS distance (in coarse cells) from every ocean cell to the nearest
/// coast, toroidal, 4-connected, relaxing over ocean cells only. Land cells
/// and unreachable ocean pockets stay at infinity.
pub fn coast_distance_map(land: &[u8], res: usize) -> Vec<f32> {
    let mut dist = vec![f32::INFINITY; land.len()];
    let mut queue = VecDeque::new();

    // Seed: every ocean cell touching land is distance 0. Row-major seed
    // order keeps the queue contents deterministic
    for sy in 0..res {
        for sx in 0..res {
            let idx = sy * res + sx;
            if land[idx] != 0 {
                continue;
            }
            let touches_land = NEIGHBORS_4.iter().any(|&(dx, dy)| {
                let nx = (sx as i64 + dx).rem_euclid(res as i64) as usize;
                let ny = (sy as i64 + dy).rem_euclid(res as i64) as usize;
                land[ny * res + nx] != 0
            });
            if touches_land {
                dist[idx] = 0.0;
                queue.push_back((sx, sy));
            }
        }
    }

    while let Some((sx, sy)) = queue.pop_front() {
        let next = dist[sy * res + sx] + 1.0;
        for &(dx, dy) in &NEIGHBORS_4 {
            let nx = (sx as i64 + dx).rem_euclid(res as i64) as usize;
            let ny = (sy as i64 + dy).rem_euclid(res as i64) as usize;
            let nidx = ny * res + nx;
            if land[nidx] == 0 && dist[nidx].is_infinite() {
                dist[nidx] = next;
                queue.push_back((nx, ny));
            }
        }
    }

    dist
}

/// Flood the connected ocean: start from the globally deepest coarse cell
/// and BFS over every cell below sea level. Depressions below sea level that
/// don't connect to the deep ocean stay unmasked — they're salt flats or
/// future lakes, not ocean. Returns all zeros for a world with no point
/// below sea level.
pub fn ocean_connectivity_mask(
    samples: &[f64],
    bias_m: f64,
    res: usize,
) -> Vec<u8> {
    let mut mask = vec![0u8; samples.len()];

    // Global minimum of the biased field; first occurrence wins ties
    let mut min_idx = 0;
    let mut min_value = f64::INFINITY;
    for (idx, &h) in samples.iter().enumerate() {
        let biased = h + bias_m;
        if biased < min_value {
            min_value = biased;
            min_idx = idx;
        }
    }
    if min_value >= 0.0 {
        return mask;
    }

    let mut queue = VecDeque::new();
    mask[min_idx] = 1;
    queue.push_back((min_idx % res, min_idx / res));

    while let Some((sx, sy)) = queue.pop_front() {
        for &(dx, dy) in &NEIGHBORS_4 {
            let nx = (sx as i64 + dx).rem_euclid(res as i64) as usize;
            let ny = (sy as i64 + dy).rem_euclid(res as i64) as usize;
            let nidx = ny * res + nx;
            if mask[nidx] == 0 && samples[nidx] + bias_m < 0.0 {
                mask[nidx] = 1;
                queue.push_back((nx, ny));
            }
        }
    }

    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calibration_hits_fraction() {
        // 100 samples 0..100: a 0.3 fraction puts the bias at -sorted[30]
        let samples: Vec<f64> = (0..100).map(f64::from).collect();
        let bias = calibrate_sea_level(&samples, 0.3);
        assert_eq!(bias, -30.0);

        let below = samples.iter().filter(|&&h| h + bias < 0.0).count();
        assert_eq!(below, 30);
    }

    #[test]
    fn test_land_mask() {
        let samples = vec![-5.0, -1.0, 0.0, 3.0];
        assert_eq!(land_mask(&samples, 0.0), vec![0, 0, 1, 1]);
        assert_eq!(land_mask(&samples, 2.0), vec![0, 1, 1, 1]);
    }

    /// A single land column in an ocean world: distance grows away from it
    /// and wraps around the torus.
    #[test]
    fn test_coast_distance_wraps() {
        let res = 8;
        let mut land = vec![0u8; res * res];
        for sy in 0..res {
            land[sy * res + 2] = 1;
        }
        let dist = coast_distance_map(&land, res);

        for sy in 0..res {
            assert!(dist[sy * res + 2].is_infinite(), "land stays infinite");
            assert_eq!(dist[sy * res + 1], 0.0);
            assert_eq!(dist[sy * res + 3], 0.0);
            assert_eq!(dist[sy * res + 4], 1.0);
            // Going the long way: x=6 is 3 cells east of the coast at x=3,
            // but only 3 west of x=1 via the wrap... check the far point
            assert_eq!(dist[sy * res + 6], 3.0);
            // x=7 wraps to x=0 then x=1 (coast): distance 2
            assert_eq!(dist[sy * res + 7], 2.0);
        }
    }

    #[test]
    fn test_landlocked_ocean_stays_infinite() {
        // All-ocean world: no coast anywhere, all distances stay infinite
        let res = 4;
        let land = vec![0u8; res * res];
        let dist = coast_distance_map(&land, res);
        assert!(dist.iter().all(|d| d.is_infinite()));
    }

    /// An inland depression below sea level must not join the ocean mask.
    #[test]
    fn test_connectivity_excludes_inland_depression() {
        let res = 8;
        // Left half deep ocean, right half high land with one sunken cell
        let mut samples = vec![0.0f64; res * res];
        for sy in 0..res {
            for sx in 0..res {
                samples[sy * res + sx] =
                    if sx < 4 { -100.0 } else { 500.0 };
            }
        }
        samples[3 * res + 6] = -50.0; // depression surrounded by land

        let mask = ocean_connectivity_mask(&samples, 0.0, res);
        for sy in 0..res {
            for sx in 0..4 {
                assert_eq!(mask[sy * res + sx], 1);
            }
        }
        assert_eq!(mask[3 * res + 6], 0, "inland depression marked ocean");
    }

    #[test]
    fn test_connectivity_all_land() {
        let samples = vec![10.0f64; 16];
        let mask = ocean_connectivity_mask(&samples, 0.0, 4);
        assert!(mask.iter().all(|&m| m == 0));
    }

    /// Ocean mask is a subset of the water side of the land mask.
    #[test]
    fn test_ocean_mask_subset_of_water() {
        let res = 16;
        let samples: Vec<f64> = (0..res * res)
            .map(|i| ((i * 37 + 11) % 101) as f64 - 50.0)
            .collect();
        let bias = calibrate_sea_level(&samples, 0.5);
        let land = land_mask(&samples, bias);
        let ocean = ocean_connectivity_mask(&samples, bias, res);
        for i in 0..res * res {
            if ocean[i] == 1 {
                assert_eq!(land[i], 0);
            }
        }
    }
}
