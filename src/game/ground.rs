//! Infinite ground faked with a fixed lattice of tiles.
//!
//! Tiles falling more than half a lattice width behind the vehicle are
//! teleported a full lattice width ahead, so a (2r+1)² grid always
//! surrounds the vehicle.

use serde::Serialize;

use super::constants::ground::MAX_GRID_RADIUS;
use crate::config::GroundConfig;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroundTile {
    /// Slot in the initial lattice, each coordinate in -r..=r
    pub grid: (i32, i32),
    pub position: [f32; 3],
}

#[derive(Debug, Clone)]
pub struct GroundTiler {
    tile_size: f32,
    width: u32,
    tiles: Vec<GroundTile>,
}

impl GroundTiler {
    /// The radius is capped at `MAX_GRID_RADIUS`, the same bound config validation enforces.
    pub fn new(config: &GroundConfig) -> Self {
        let radius = config.grid_radius.min(MAX_GRID_RADIUS);
        let width = 2 * radius + 1;
        let r = radius as i32;
        let tile_size = config.tile_size;
        let mut tiles = Vec::with_capacity(width as usize * width as usize);
        for i in -r..=r {
            for j in -r..=r {
                tiles.push(GroundTile {
                    grid: (i, j),
                    position: [i as f32 * tile_size, config.tile_height, j as f32 * tile_size],
                });
            }
        }
        Self {
            tile_size,
            width,
            tiles,
        }
    }

    pub fn tiles(&self) -> &[GroundTile] {
        &self.tiles
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// Offset beyond which a tile is recycled (1.5 tiles for a 3-wide lattice)
    pub fn threshold(&self) -> f32 {
        self.width as f32 * self.tile_size / 2.0
    }

    /// Distance a recycled tile jumps: one full lattice width
    pub fn shift(&self) -> f32 {
        self.width as f32 * self.tile_size
    }

    /// Moves every tile that strayed past the threshold to the far side of the vehicle.
    /// Returns how many single-axis shifts were made.
    pub fn recenter(&mut self, vehicle_position: [f32; 3]) -> usize {
        let threshold = self.threshold();
        let shift = self.shift();
        let mut shifts = 0;

        for tile in &mut self.tiles {
            for axis in [0, 2] {
                let mut offset = vehicle_position[axis] - tile.position[axis];
                // Loops only when the vehicle teleported more than one lattice width.
                while offset.abs() > threshold {
                    let step = offset.signum() * shift;
                    tile.position[axis] += step;
                    offset -= step;
                    shifts += 1;
                }
            }
        }

        shifts
    }
}
