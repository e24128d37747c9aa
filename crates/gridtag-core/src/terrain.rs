use rand::Rng;
use serde::{Deserialize, Serialize};

/// Walkable tile.
pub const TILE_OPEN: u8 = 0;
/// Maze wall, blocks everyone.
pub const TILE_WALL: u8 = 1;
/// Blue safe-zone wall, blocks red players.
pub const TILE_BLUE_BASE: u8 = 2;
/// Red safe-zone wall, blocks blue players.
pub const TILE_RED_BASE: u8 = 3;

/// Default battlefield dimensions.
pub const MAP_WIDTH: usize = 30;
pub const MAP_HEIGHT: usize = 20;

/// Side length of each team's corner safe zone.
const SAFE_ZONE_SIZE: usize = 2;
/// Number of random rectangular wall blocks.
const WALL_BLOCKS: usize = 5;
/// Number of scattered single-tile obstacles.
const OBSTACLES: usize = 20;

/// Immutable tile grid stored with each room, indexed `tiles[y][x]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Terrain {
    pub tiles: Vec<Vec<u8>>,
}

impl Terrain {
    pub fn width(&self) -> usize {
        self.tiles.first().map_or(0, Vec::len)
    }

    pub fn height(&self) -> usize {
        self.tiles.len()
    }

    pub fn tile(&self, x: usize, y: usize) -> u8 {
        self.tiles
            .get(y)
            .and_then(|row| row.get(x))
            .copied()
            .unwrap_or(TILE_OPEN)
    }

    /// Generate a fresh battlefield at the default 30×20 size.
    pub fn generate() -> Terrain {
        Terrain::generate_sized(MAP_WIDTH, MAP_HEIGHT, &mut rand::rng())
    }

    /// Generate a battlefield of the given size with the supplied RNG.
    ///
    /// Two fixed 2×2 corner rectangles are reserved as team safe zones
    /// (red top-left, blue bottom-right); random wall blocks and single
    /// obstacles never land inside them. Always returns a full grid.
    pub fn generate_sized(width: usize, height: usize, rng: &mut impl Rng) -> Terrain {
        let mut tiles = vec![vec![TILE_OPEN; width]; height];

        let in_safe_zone = |x: usize, y: usize| {
            (x < SAFE_ZONE_SIZE && y < SAFE_ZONE_SIZE)
                || (x >= width - SAFE_ZONE_SIZE && y >= height - SAFE_ZONE_SIZE)
        };

        // Medium wall blocks, 1-2 tiles per side.
        for _ in 0..WALL_BLOCKS {
            let block_w = rng.random_range(1..=2);
            let block_h = rng.random_range(1..=2);
            let start_x = rng.random_range(0..width - block_w);
            let start_y = rng.random_range(0..height - block_h);
            for x in start_x..start_x + block_w {
                for y in start_y..start_y + block_h {
                    if !in_safe_zone(x, y) {
                        tiles[y][x] = TILE_WALL;
                    }
                }
            }
        }

        // Scattered single-tile obstacles on open ground.
        for _ in 0..OBSTACLES {
            let x = rng.random_range(0..width);
            let y = rng.random_range(0..height);
            if !in_safe_zone(x, y) && tiles[y][x] == TILE_OPEN {
                tiles[y][x] = TILE_WALL;
            }
        }

        // Safe-zone markers go last so nothing overwrites them.
        for y in 0..height {
            for x in 0..width {
                if x < SAFE_ZONE_SIZE && y < SAFE_ZONE_SIZE {
                    tiles[y][x] = TILE_RED_BASE;
                } else if x >= width - SAFE_ZONE_SIZE && y >= height - SAFE_ZONE_SIZE {
                    tiles[y][x] = TILE_BLUE_BASE;
                }
            }
        }

        Terrain { tiles }
    }
}
