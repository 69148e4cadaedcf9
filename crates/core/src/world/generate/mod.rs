//! The terrain pipeline. A [TerrainGenerator] is built once per world from
//! the master seed: it derives one noise layer per terrain role, places
//! continents and mountain belts from named forks of the placement stream,
//! and from then on is a pure function from world coordinates to height.
//! World init samples it on the coarse grid to calibrate sea level and build
//! the coast/ocean masks; the tile cache invokes it per tile to fill terrain
//! and initial ocean water.

mod coarse;
mod placement;

pub use placement::{ContinentCenter, MountainBelt};

use crate::{
    config::WorldConfig,
    noise::torus::TorusNoise,
    rng::Rng,
    timed,
    util::{lerp, NumRange},
    world::{metadata::WorldMetadata, tile::Tile},
};
use log::{debug, info};

/// Quintic smoothstep falloff: 1 at the center, easing to 0 at radius `r`.
fn smooth_falloff(distance: f64, radius: f64) -> f64 {
    if distance >= radius {
        return 0.0;
    }
    let u = 1.0 - distance / radius;
    u * u * u * (u * (u * 6.0 - 15.0) + 10.0)
}

/// A fully constructed terrain function plus the per-tile fillers. Immutable
/// after construction; `raw_height` is pure.
#[derive(Debug)]
pub struct TerrainGenerator {
    config: WorldConfig,

    // One independent noise layer per terrain role
    continent_noise: TorusNoise,
    warp_x_noise: TorusNoise,
    warp_y_noise: TorusNoise,
    coastline_noise: TorusNoise,
    ridge_noise: TorusNoise,
    hills_noise: TorusNoise,

    continents: Vec<ContinentCenter>,
    belts: Vec<MountainBelt>,
}

impl TerrainGenerator {
    /// Strength of a major continent center in the continentalness sum.
    const MAJOR_STRENGTH: f64 = 1.0;
    /// Strength of a minor center; minors shape coastlines more than they
    /// anchor landmasses.
    const MINOR_STRENGTH: f64 = 0.6;
    /// Majors must sit at least this many radii apart.
    const MAJOR_SPACING_FACTOR: f64 = 1.5;
    const MINOR_SPACING_FACTOR: f64 = 1.0;

    pub fn new(config: &WorldConfig, rng: &mut Rng) -> Self {
        let (width, height) = (config.width_m, config.height_m);
        let terrain = &config.terrain;

        // Carve the noise layers off a base layer seeded by the master seed
        let base = TorusNoise::new(rng.master_seed(), width, height);
        let continent_noise = base.derive("continent");
        let warp_x_noise = base.derive("warpX");
        let warp_y_noise = base.derive("warpY");
        let coastline_noise = base.derive("coastline");
        let ridge_noise = base.derive("ridge");
        let hills_noise = base.derive("hills");

        // All placement randomness comes from named forks of one stream, so
        // each family is stable against changes in the others
        let placement = rng.stream("placement");

        let mut major_stream = placement.fork("major");
        let majors = placement::place_centers(
            &mut major_stream,
            terrain.major_continents,
            terrain.major_radius_km * 1000.0,
            Self::MAJOR_SPACING_FACTOR,
            Self::MAJOR_STRENGTH,
            width,
            height,
            &[],
        );

        let mut minor_count_stream = placement.fork("minor-count");
        let minor_count = minor_count_stream
            .next_in_range(
                i64::from(terrain.minor_continents_min),
                i64::from(terrain.minor_continents_max) + 1,
            )
            .unwrap_or(i64::from(terrain.minor_continents_min))
            as u32;

        let mut minor_stream = placement.fork("minor");
        let minors = placement::place_centers(
            &mut minor_stream,
            minor_count,
            terrain.minor_radius_km * 1000.0,
            Self::MINOR_SPACING_FACTOR,
            Self::MINOR_STRENGTH,
            width,
            height,
            &majors,
        );

        let mut main_belt_stream = placement.fork("main-belts");
        let mut belts = placement::place_belts(
            &mut main_belt_stream,
            &terrain.main_belts,
            &majors,
            width,
            height,
        );
        let mut secondary_belt_stream = placement.fork("secondary-belts");
        belts.extend(placement::place_belts(
            &mut secondary_belt_stream,
            &terrain.secondary_belts,
            &majors,
            width,
            height,
        ));

        info!(
            "Terrain layout: {} major + {} minor continents, {} belts",
            majors.len(),
            minors.len(),
            belts.len()
        );

        let mut continents = majors;
        continents.extend(minors);

        Self {
            config: config.clone(),
            continent_noise,
            warp_x_noise,
            warp_y_noise,
            coastline_noise,
            ridge_noise,
            hills_noise,
            continents,
            belts,
        }
    }

    pub fn continents(&self) -> &[ContinentCenter] {
        &self.continents
    }

    pub fn belts(&self) -> &[MountainBelt] {
        &self.belts
    }

    /// Continentalness at a point: how "deep inside a landmass" it is.
    /// Roughly [0, 1]-ish near coasts, higher in continent cores.
    fn continentalness(&self, x_m: f64, y_m: f64) -> f64 {
        let (width, height) = (self.config.width_m, self.config.height_m);
        let mut c = 0.0;
        for center in &self.continents {
            let d = crate::util::toroidal_distance(
                x_m, y_m, center.x_m, center.y_m, width, height,
            );
            c += center.strength * smooth_falloff(d, center.radius_m);
        }
        c + 0.3
            * self
                .continent_noise
                .fbm(x_m, y_m, 1.0 / (0.3 * width), 3)
    }

    /// The raw (pre-bias) terrain height at world meters `(x, y)`. Pure and
    /// deterministic; this is what the coarse grid samples and what every
    /// tile fill evaluates per cell.
    pub fn raw_height(&self, x_m: f64, y_m: f64) -> f64 {
        let (width, height) = (self.config.width_m, self.config.height_m);
        let terrain = &self.config.terrain;

        // Domain-warped continentalness: sample the plain field, then
        // resample it at a noise-displaced point and blend toward the
        // warped value. The warp is what breaks the radial falloffs into
        // convincing coastlines
        let c0 = self.continentalness(x_m, y_m);
        let warp_amplitude = 0.4 * terrain.domain_warp_amplitude_km * 1000.0;
        let warp_frequency = 1.0 / (0.15 * width);
        let dx = warp_amplitude
            * self.warp_x_noise.fbm(x_m, y_m, warp_frequency, 3);
        let dy = warp_amplitude
            * self.warp_y_noise.fbm(x_m, y_m, warp_frequency, 3);
        let c1 = self.continentalness(x_m + dx, y_m + dy);
        let mut c = 0.3 * c0 + 0.7 * c1;

        // High-frequency coastline detail
        c += 0.15
            * self.coastline_noise.fbm(
                x_m,
                y_m,
                1.0 / (terrain.coastline_detail_scale_km * 1000.0),
                4,
            );

        let mut h = (c - 0.5) * 4000.0;

        // Mountain belts: ridged noise inside each belt's elliptical mask
        for belt in &self.belts {
            let mask = belt.mask(x_m, y_m, width, height);
            if mask > 0.0 {
                h += mask
                    * belt.peak_m
                    * self.ridge_noise.ridged(x_m, y_m, 1.0 / 50_000.0, 4);
            }
        }

        // Rolling hills everywhere
        h + 200.0
            * self
                .hills_noise
                .fbm_with(x_m, y_m, 1.0 / 20_000.0, 4, 2.2, 0.45)
    }

    /// Sample the coarse grid and derive the world metadata: sea-level bias,
    /// land mask, coast distances, and the connected-ocean mask.
    pub fn build_metadata(&self) -> WorldMetadata {
        let res = self.config.terrain.coarse_sample_res as usize;
        let (width, height) = (self.config.width_m, self.config.height_m);

        let samples = timed!("Coarse heightfield sampling", {
            let mut samples = vec![0.0f64; res * res];
            for sy in 0..res {
                for sx in 0..res {
                    let x = (sx as f64 + 0.5) * width / res as f64;
                    let y = (sy as f64 + 0.5) * height / res as f64;
                    samples[sy * res + sx] = self.raw_height(x, y);
                }
            }
            samples
        });

        let bias = coarse::calibrate_sea_level(
            &samples,
            self.config.terrain.ocean_fraction,
        );
        debug!("Sea level bias {:.1} m", bias);

        let land = coarse::land_mask(&samples, bias);
        let coast = timed!(
            "Coast distance BFS",
            coarse::coast_distance_map(&land, res)
        );
        let ocean = timed!(
            "Ocean connectivity BFS",
            coarse::ocean_connectivity_mask(&samples, bias, res)
        );

        let metadata = WorldMetadata {
            sea_level_bias_m: bias,
            coarse_res: res as u32,
            coarse_land_mask: land,
            coast_distance_map: coast,
            ocean_mask: ocean,
        };
        info!(
            "World metadata ready: ocean fraction {:.3} (target {:.3})",
            metadata.ocean_fraction(),
            self.config.terrain.ocean_fraction
        );
        metadata
    }

    /// Fill a tile's terrain heights and initial ocean water. This is the
    /// closure the tile cache runs on every miss.
    pub fn fill_tile(&self, tile: &mut Tile, metadata: &WorldMetadata) {
        let t = self.config.chunk_cells;
        let cell = self.config.cell_size_m;
        let terrain = &self.config.terrain;
        let res = metadata.coarse_res as usize;

        for ly in 0..t {
            for lx in 0..t {
                let world_cell_x = u64::from(tile.cx) * u64::from(t) + u64::from(lx);
                let world_cell_y = u64::from(tile.cy) * u64::from(t) + u64::from(ly);
                let x_m = (world_cell_x as f64 + 0.5) * cell;
                let y_m = (world_cell_y as f64 + 0.5) * cell;

                let mut h =
                    self.raw_height(x_m, y_m) + metadata.sea_level_bias_m;
                if h >= 0.0 {
                    h = self.hypsometric_remap(h);
                } else {
                    h = self.bathymetry(h, x_m, y_m, metadata);
                }
                h = h.clamp(terrain.min_height_m, terrain.max_height_m);

                let idx = tile.index(lx, ly);
                tile.terrain_height_m[idx] = h as f32;

                // Connected-ocean cells below sea level start brim-full, so
                // the water surface sits at zero
                let (sx, sy) = metadata.coarse_cell(
                    x_m,
                    y_m,
                    self.config.width_m,
                    self.config.height_m,
                );
                if metadata.ocean_mask[sy * res + sx] == 1 && h < 0.0 {
                    tile.water_depth_m[idx] = (-h) as f32;
                }
            }
        }
    }

    /// Compress land heights toward a concave hypsometric profile: lots of
    /// lowland, steeply rarer highland.
    fn hypsometric_remap(&self, h: f64) -> f64 {
        let max = self.config.terrain.max_height_m;
        NumRange::new(0.0, 2.0 * max)
            .value(h)
            .normalize()
            .clamp()
            .apply(|v| v.powf(0.4))
            .map_to(NumRange::new(0.0, max))
            .inner()
    }

    /// Replace a raw below-sea height with a shelf/slope/basin depth profile
    /// keyed on distance to the coast, keeping 10% of the raw height as
    /// local texture.
    fn bathymetry(
        &self,
        h: f64,
        x_m: f64,
        y_m: f64,
        metadata: &WorldMetadata,
    ) -> f64 {
        let terrain = &self.config.terrain;
        let res = metadata.coarse_res as usize;
        let (sx, sy) = metadata.coarse_cell(
            x_m,
            y_m,
            self.config.width_m,
            self.config.height_m,
        );
        let coast_cells = f64::from(metadata.coast_distance_map[sy * res + sx]);
        let cell_km = (self.config.width_m / res as f64) / 1000.0;
        let d_km = coast_cells * cell_km;

        let depth = if !d_km.is_finite() || d_km >= 500.0 {
            terrain.basin_depth_m
        } else if d_km < 50.0 {
            (d_km / 50.0) * terrain.shelf_depth_m
        } else if d_km < 200.0 {
            lerp(
                terrain.shelf_depth_m,
                terrain.slope_depth_m,
                (d_km - 50.0) / 150.0,
            )
        } else {
            lerp(
                terrain.slope_depth_m,
                terrain.basin_depth_m,
                (d_km - 200.0) / 300.0,
            )
        };

        (depth + 0.1 * (h - depth)).min(-1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Seed, TerrainConfig};

    fn test_config() -> WorldConfig {
        WorldConfig {
            seed: Seed::from(42u32),
            width_m: 2_048_000.0,
            height_m: 1_024_000.0,
            cell_size_m: 1000.0,
            chunk_cells: 16,
            max_resident_chunks: 16,
            terrain: TerrainConfig {
                major_continents: 2,
                major_radius_km: 400.0,
                minor_continents_min: 2,
                minor_continents_max: 3,
                minor_radius_km: 120.0,
                coarse_sample_res: 64,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn generator() -> TerrainGenerator {
        let config = test_config();
        let mut rng = Rng::new(config.seed.to_u32());
        TerrainGenerator::new(&config, &mut rng)
    }

    #[test]
    fn test_raw_height_is_pure() {
        let generator = generator();
        let a = generator.raw_height(123_456.0, 654_321.0);
        let b = generator.raw_height(123_456.0, 654_321.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_same_seed_same_layout() {
        let a = generator();
        let b = generator();
        assert_eq!(a.continents(), b.continents());
        assert_eq!(a.belts(), b.belts());
        for i in 0..50 {
            let x = i as f64 * 37_000.0;
            let y = i as f64 * 13_000.0;
            assert_eq!(a.raw_height(x, y), b.raw_height(x, y));
        }
    }

    #[test]
    fn test_different_seed_different_terrain() {
        let config = test_config();
        let mut rng_a = Rng::new(1);
        let mut rng_b = Rng::new(2);
        let a = TerrainGenerator::new(&config, &mut rng_a);
        let b = TerrainGenerator::new(&config, &mut rng_b);
        let differs = (0..20).any(|i| {
            let x = i as f64 * 97_000.0;
            a.raw_height(x, x * 0.4) != b.raw_height(x, x * 0.4)
        });
        assert!(differs);
    }

    #[test]
    fn test_raw_height_wraps_seamlessly() {
        let generator = generator();
        let config = test_config();
        for i in 0..20 {
            let y = i as f64 * 50_000.0 + 500.0;
            let west = generator.raw_height(0.0, y);
            let east = generator.raw_height(config.width_m, y);
            assert!(
                (west - east).abs() < 1e-6,
                "seam mismatch at y={}: {} vs {}",
                y,
                west,
                east
            );
        }
    }

    #[test]
    fn test_metadata_ocean_fraction_on_target() {
        let generator = generator();
        let metadata = generator.build_metadata();
        let target = test_config().terrain.ocean_fraction;
        let tolerance = test_config().terrain.ocean_fraction_tolerance;
        let actual = metadata.ocean_fraction();
        assert!(
            (actual - target).abs() <= tolerance,
            "ocean fraction {} missed target {} ± {}",
            actual,
            target,
            tolerance
        );
    }

    #[test]
    fn test_ocean_mask_is_subset_of_water() {
        let generator = generator();
        let metadata = generator.build_metadata();
        let res = metadata.coarse_res as usize;
        for i in 0..res * res {
            if metadata.ocean_mask[i] == 1 {
                assert_eq!(metadata.coarse_land_mask[i], 0);
            }
        }
    }

    #[test]
    fn test_fill_tile_bounds_and_water() {
        let config = test_config();
        let generator = generator();
        let metadata = generator.build_metadata();

        let mut tile = Tile::new(0, 0, config.chunk_cells);
        generator.fill_tile(&mut tile, &metadata);

        for idx in 0..tile.cell_count() {
            let h = f64::from(tile.terrain_height_m[idx]);
            assert!(h >= config.terrain.min_height_m);
            assert!(h <= config.terrain.max_height_m);
            let w = f64::from(tile.water_depth_m[idx]);
            assert!(w >= 0.0);
            if w > 0.0 {
                // Ocean water fills exactly to the zero surface
                assert!((h + w).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn test_fill_tile_deterministic() {
        let config = test_config();
        let generator = generator();
        let metadata = generator.build_metadata();

        let mut a = Tile::new(1, 1, config.chunk_cells);
        let mut b = Tile::new(1, 1, config.chunk_cells);
        generator.fill_tile(&mut a, &metadata);
        generator.fill_tile(&mut b, &metadata);
        assert_eq!(a.terrain_height_m, b.terrain_height_m);
        assert_eq!(a.water_depth_m, b.water_depth_m);
    }
}
