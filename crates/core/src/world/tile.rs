use serde::{Deserialize, Serialize};

/// One tile of the world: a `chunk_cells x chunk_cells` block of land cells,
/// stored as a struct of parallel arrays (one contiguous buffer per field,
/// row-major, `index = y * chunk_cells + x`). Keeping the storage SoA
/// matters: the hydrology router streams over single fields, and mixing them
/// into an array-of-structs would wreck its cache behavior.
///
/// Tiles carry no behavior of their own; the terrain generator fills them
/// and the water router mutates them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tile {
    /// Tile x coordinate, in `[0, world_tiles_x)`
    pub cx: u32,
    /// Tile y coordinate, in `[0, world_tiles_y)`
    pub cy: u32,
    /// Side length in cells
    pub chunk_cells: u32,

    /// Static terrain height per cell, in meters relative to sea level
    pub terrain_height_m: Vec<f32>,
    /// Surface water depth per cell, in meters; never negative
    pub water_depth_m: Vec<f32>,
    /// Accumulated routed-water flux per cell; monotonically non-decreasing
    pub runoff_flux: Vec<f32>,
    /// River identity per cell; -1 means no river
    pub river_id: Vec<i32>,

    // Reserved for future subsystems; allocated but inert
    pub soil_moisture: Vec<f32>,
    pub field_capacity: Vec<f32>,
    pub grass_cover: Vec<f32>,
}

impl Tile {
    pub fn new(cx: u32, cy: u32, chunk_cells: u32) -> Self {
        let cell_count = (chunk_cells as usize).pow(2);
        Self {
            cx,
            cy,
            chunk_cells,
            terrain_height_m: vec![0.0; cell_count],
            water_depth_m: vec![0.0; cell_count],
            runoff_flux: vec![0.0; cell_count],
            river_id: vec![-1; cell_count],
            soil_moisture: vec![0.0; cell_count],
            field_capacity: vec![0.0; cell_count],
            grass_cover: vec![0.0; cell_count],
        }
    }

    /// Total number of cells in this tile.
    pub fn cell_count(&self) -> usize {
        (self.chunk_cells as usize).pow(2)
    }

    /// Row-major index of local cell `(x, y)`.
    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.chunk_cells as usize) + (x as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tile_layout() {
        let tile = Tile::new(3, 7, 8);
        assert_eq!(tile.cell_count(), 64);
        assert_eq!(tile.terrain_height_m.len(), 64);
        assert_eq!(tile.water_depth_m.len(), 64);
        assert_eq!(tile.runoff_flux.len(), 64);
        assert!(tile.river_id.iter().all(|&id| id == -1));
    }

    #[test]
    fn test_row_major_index() {
        let tile = Tile::new(0, 0, 8);
        assert_eq!(tile.index(0, 0), 0);
        assert_eq!(tile.index(7, 0), 7);
        assert_eq!(tile.index(0, 1), 8);
        assert_eq!(tile.index(3, 2), 19);
    }
}
