use serde::{Deserialize, Serialize};

/// World-wide derived data, computed once at init from the coarse sampling
/// of the raw heightfield. Immutable afterwards; tile fills and the HTTP
/// surface only ever read it.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldMetadata {
    /// Vertical offset added to every raw height so that the target ocean
    /// fraction of the world sits below zero.
    pub sea_level_bias_m: f64,
    /// Side length of the coarse grid.
    pub coarse_res: u32,
    /// 1 where the biased coarse sample is at or above sea level. Row-major
    /// `coarse_res²` entries.
    pub coarse_land_mask: Vec<u8>,
    /// BFS distance from the coast in coarse cells; infinite on land and in
    /// ocean pockets no coast can reach.
    pub coast_distance_map: Vec<f32>,
    /// 1 where a below-sea-level cell connects to the global ocean body.
    pub ocean_mask: Vec<u8>,
}

impl WorldMetadata {
    /// The coarse cell containing world point `(x_m, y_m)`, wrapped.
    pub fn coarse_cell(
        &self,
        x_m: f64,
        y_m: f64,
        width_m: f64,
        height_m: f64,
    ) -> (usize, usize) {
        let res = self.coarse_res as i64;
        let sx = ((x_m / width_m * res as f64).floor() as i64).rem_euclid(res);
        let sy = ((y_m / height_m * res as f64).floor() as i64).rem_euclid(res);
        (sx as usize, sy as usize)
    }

    /// Fraction of the coarse grid below sea level.
    pub fn ocean_fraction(&self) -> f64 {
        let water = self
            .coarse_land_mask
            .iter()
            .filter(|&&land| land == 0)
            .count();
        water as f64 / self.coarse_land_mask.len() as f64
    }
}
