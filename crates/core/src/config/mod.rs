mod seed;

pub use seed::Seed;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Configuration that defines a world. Two worlds generated with the same
/// config (and therefore the same seed) are always identical, tile for tile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_world_grid"))]
pub struct WorldConfig {
    /// RNG seed for all randomized processes during generation. See the
    /// [Seed] type for the input forms supported here.
    pub seed: Seed,

    /// World extent along the x axis, in meters. The world wraps toroidally
    /// at both edges.
    #[validate(range(min = 1000.0))]
    pub width_m: f64,

    /// World extent along the y axis, in meters.
    #[validate(range(min = 1000.0))]
    pub height_m: f64,

    /// Edge length of a single land cell, in meters.
    #[validate(range(min = 1.0))]
    pub cell_size_m: f64,

    /// Side length of a tile, in cells. Production worlds use 256; tests use
    /// much smaller tiles.
    #[validate(range(min = 1, max = 4096))]
    pub chunk_cells: u32,

    /// How many tiles may be resident in the cache at once before the least
    /// recently used one is evicted.
    #[validate(range(min = 1))]
    pub max_resident_chunks: u32,

    /// Config for terrain shape: continents, mountain belts, ocean depth.
    #[validate]
    pub terrain: TerrainConfig,

    /// Config for the surface-water router.
    #[validate]
    pub hydrology: HydrologyConfig,
}

impl WorldConfig {
    /// Side length of one tile in meters.
    pub fn tile_size_m(&self) -> f64 {
        f64::from(self.chunk_cells) * self.cell_size_m
    }

    /// Number of tiles along the x axis.
    pub fn world_tiles_x(&self) -> u32 {
        (self.width_m / self.tile_size_m()).round() as u32
    }

    /// Number of tiles along the y axis.
    pub fn world_tiles_y(&self) -> u32 {
        (self.height_m / self.tile_size_m()).round() as u32
    }
}

/// The world extent must hold a whole number of tiles on each axis, or the
/// toroidal wrap would tear at the seam.
fn validate_world_grid(config: &WorldConfig) -> Result<(), ValidationError> {
    let tile_size = config.tile_size_m();
    for (extent, axis) in [(config.width_m, "width_m"), (config.height_m, "height_m")] {
        let tiles = extent / tile_size;
        if tiles < 1.0 || (tiles - tiles.round()).abs() > 1e-9 {
            let mut err = ValidationError::new("tile_grid");
            err.message = Some(
                format!(
                    "{} ({} m) must be a whole positive multiple \
                    of the tile size ({} m)",
                    axis, extent, tile_size
                )
                .into(),
            );
            return Err(err);
        }
    }
    Ok(())
}

impl Default for WorldConfig {
    fn default() -> Self {
        // This is the source of truth for a "nice world": an earth-ish
        // 40960x20480 km torus of 256-cell tiles at 1 km per cell
        Self {
            seed: Seed::default(),
            width_m: 40_960_000.0,
            height_m: 20_480_000.0,
            cell_size_m: 1000.0,
            chunk_cells: 256,
            max_resident_chunks: 64,
            terrain: TerrainConfig::default(),
            hydrology: HydrologyConfig::default(),
        }
    }
}

/// Configuration for the terrain pipeline: where continents and mountain
/// belts go, how much of the world ends up under water, and how the sea
/// floor falls away from the coast.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct TerrainConfig {
    /// Lowest representable terrain height, in meters. Must be negative.
    #[validate(range(max = -1.0))]
    pub min_height_m: f64,

    /// Highest representable terrain height, in meters. Must be positive.
    #[validate(range(min = 1.0))]
    pub max_height_m: f64,

    /// Target fraction of the world below sea level. Calibration drives the
    /// actual fraction to this value by shifting the whole heightfield.
    #[validate(range(min = 0.05, max = 0.95))]
    pub ocean_fraction: f64,

    /// Accepted deviation from the target ocean fraction.
    #[validate(range(min = 0.001, max = 0.2))]
    pub ocean_fraction_tolerance: f64,

    /// Number of major continental masses.
    #[validate(range(min = 1, max = 16))]
    pub major_continents: u32,

    /// Radius of a major continental mass, in kilometers.
    #[validate(range(min = 100.0))]
    pub major_radius_km: f64,

    /// Bounds on the number of minor landmasses; the actual count is drawn
    /// uniformly from this range (inclusive).
    pub minor_continents_min: u32,
    #[validate(range(max = 64))]
    pub minor_continents_max: u32,

    /// Radius of a minor landmass, in kilometers.
    #[validate(range(min = 50.0))]
    pub minor_radius_km: f64,

    /// Amplitude of the domain warp applied to continental outlines, in
    /// kilometers. Bigger values smear coastlines into stranger shapes.
    #[validate(range(min = 0.0))]
    pub domain_warp_amplitude_km: f64,

    /// Wavelength of the high-frequency coastline detail, in kilometers.
    #[validate(range(min = 1.0))]
    pub coastline_detail_scale_km: f64,

    /// Primary mountain belts, anchored to major continents.
    #[validate]
    pub main_belts: BeltConfig,

    /// Smaller secondary belts.
    #[validate]
    pub secondary_belts: BeltConfig,

    /// Depth of the continental shelf, in meters (negative).
    #[validate(range(max = 0.0))]
    pub shelf_depth_m: f64,

    /// Depth of the continental slope, in meters (negative).
    #[validate(range(max = 0.0))]
    pub slope_depth_m: f64,

    /// Depth of the abyssal basin, in meters (negative).
    #[validate(range(max = 0.0))]
    pub basin_depth_m: f64,

    /// Resolution of the coarse world-wide grid used for ocean-fraction
    /// calibration, coast distance, and ocean connectivity. The default of
    /// 1024 samples the raw heightfield about a million times at world init,
    /// so tests drop this way down.
    #[validate(range(min = 16, max = 4096))]
    pub coarse_sample_res: u32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            min_height_m: -3000.0,
            max_height_m: 4500.0,
            ocean_fraction: 0.65,
            ocean_fraction_tolerance: 0.02,
            major_continents: 3,
            major_radius_km: 2500.0,
            minor_continents_min: 5,
            minor_continents_max: 8,
            minor_radius_km: 900.0,
            domain_warp_amplitude_km: 400.0,
            coastline_detail_scale_km: 100.0,
            main_belts: BeltConfig {
                count: 3,
                length_km_min: 3000.0,
                length_km_max: 6000.0,
                width_km_min: 300.0,
                width_km_max: 600.0,
                peak_m_min: 1500.0,
                peak_m_max: 2500.0,
            },
            secondary_belts: BeltConfig {
                count: 2,
                length_km_min: 1500.0,
                length_km_max: 3500.0,
                width_km_min: 150.0,
                width_km_max: 400.0,
                peak_m_min: 800.0,
                peak_m_max: 1500.0,
            },
            shelf_depth_m: -200.0,
            slope_depth_m: -1500.0,
            basin_depth_m: -3000.0,
            coarse_sample_res: 1024,
        }
    }
}

/// Parameters for one family of mountain belts. Each belt draws its length,
/// width, and peak height uniformly from the ranges here.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct BeltConfig {
    #[validate(range(max = 32))]
    pub count: u32,
    #[validate(range(min = 1.0))]
    pub length_km_min: f64,
    pub length_km_max: f64,
    #[validate(range(min = 1.0))]
    pub width_km_min: f64,
    pub width_km_max: f64,
    #[validate(range(min = 0.0))]
    pub peak_m_min: f64,
    pub peak_m_max: f64,
}

impl Default for BeltConfig {
    fn default() -> Self {
        Self {
            count: 0,
            length_km_min: 1000.0,
            length_km_max: 2000.0,
            width_km_min: 100.0,
            width_km_max: 200.0,
            peak_m_min: 500.0,
            peak_m_max: 1000.0,
        }
    }
}

/// Configuration for the D8 surface-water router.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct HydrologyConfig {
    /// Fraction of the computable flow that actually moves per sub-step, in
    /// (0, 1]. Lower values damp oscillation between neighboring cells.
    #[validate(range(min = 0.000001, max = 1.0))]
    pub flow_fraction: f64,

    /// Routing sub-steps per invocation of the router.
    #[validate(range(min = 1, max = 1024))]
    pub sub_steps_per_tick: u32,

    /// Water shallower than this is treated as a dry cell, in meters.
    #[validate(range(min = 0.0))]
    pub min_water_depth_m: f64,

    /// Whether to accumulate per-cell runoff flux while routing. Turning
    /// this off saves a write per moved packet if nothing reads the flux.
    pub track_runoff_flux: bool,
}

impl Default for HydrologyConfig {
    fn default() -> Self {
        Self {
            flow_fraction: 0.4,
            sub_steps_per_tick: 8,
            min_water_depth_m: 1e-6,
            track_runoff_flux: true,
        }
    }
}
