use serde::{Deserialize, Serialize};

use crate::team::Team;
use crate::terrain::{TILE_WALL, Terrain};

/// Displacement applied per active directional flag, in grid units.
pub const STEP: f64 = 0.1;

/// Directional input flags as sent by clients. Multiple flags may be
/// active at once, combining into diagonal motion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionFlags {
    #[serde(rename = "ArrowUp", default)]
    pub up: bool,
    #[serde(rename = "ArrowDown", default)]
    pub down: bool,
    #[serde(rename = "ArrowLeft", default)]
    pub left: bool,
    #[serde(rename = "ArrowRight", default)]
    pub right: bool,
}

/// Result of resolving one movement intent against terrain and bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveOutcome {
    /// Invalid move (clamped on both axes); position must not change.
    Rejected,
    /// Position to commit. May equal the starting position when every
    /// active axis was blocked by terrain.
    Moved { x: f64, y: f64 },
}

/// Round to 2 decimal places to keep repeated ±0.1 steps free of float drift.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Resolve a single movement intent for a player of `team` at (`from_x`,
/// `from_y`).
///
/// Axis deltas apply independently, each axis clamps into
/// `[0, dimension-1]`, and a move that needed clamping on both axes is
/// rejected outright. Terrain blocking is evaluated per axis against the
/// four tiles surrounding the destination: a maze wall or the *other*
/// team's base wall cancels that axis's displacement, but only when the
/// destination straddles a tile boundary on that axis.
pub fn resolve_move(
    terrain: &Terrain,
    team: Team,
    from_x: f64,
    from_y: f64,
    dir: DirectionFlags,
) -> MoveOutcome {
    let width = terrain.width() as f64;
    let height = terrain.height() as f64;

    let mut new_x = from_x;
    let mut new_y = from_y;
    if dir.up {
        new_y = round2(new_y - STEP);
    }
    if dir.down {
        new_y = round2(new_y + STEP);
    }
    if dir.left {
        new_x = round2(new_x - STEP);
    }
    if dir.right {
        new_x = round2(new_x + STEP);
    }

    let mut x_clamped = false;
    let mut y_clamped = false;
    if !(0.0..=width - 1.0).contains(&new_x) {
        new_x = new_x.clamp(0.0, width - 1.0);
        x_clamped = true;
    }
    if !(0.0..=height - 1.0).contains(&new_y) {
        new_y = new_y.clamp(0.0, height - 1.0);
        y_clamped = true;
    }
    // Diagonal-into-corner: both axes out of bounds invalidates the move.
    if x_clamped && y_clamped {
        return MoveOutcome::Rejected;
    }

    // The four tiles surrounding the destination point. For integral
    // coordinates floor and ceil coincide, collapsing to a single column/row.
    let fx = new_x.floor() as usize;
    let cx = new_x.ceil() as usize;
    let fy = new_y.floor() as usize;
    let cy = new_y.ceil() as usize;

    let tile_tl = terrain.tile(fx, fy);
    let tile_tr = terrain.tile(cx, fy);
    let tile_bl = terrain.tile(fx, cy);
    let tile_br = terrain.tile(cx, cy);

    let enemy_base = team.opponent().base_tile();
    let blocked = |tile: u8| tile == TILE_WALL || tile == enemy_base;

    // Only check the axis that actually moved and still straddles a boundary.
    if new_x != from_x && fx != cx {
        if new_x < from_x {
            if blocked(tile_tl) || blocked(tile_bl) {
                new_x = from_x;
            }
        } else if blocked(tile_tr) || blocked(tile_br) {
            new_x = from_x;
        }
    }
    if new_y != from_y && fy != cy {
        if new_y > from_y {
            if blocked(tile_bl) || blocked(tile_br) {
                new_y = from_y;
            }
        } else if blocked(tile_tl) || blocked(tile_tr) {
            new_y = from_y;
        }
    }

    MoveOutcome::Moved { x: new_x, y: new_y }
}
