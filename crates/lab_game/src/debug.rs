//! Text debug overlay: collision grid dump and a one-line status.

use glam::Vec2;
use lab_map::{CollisionIndex, MapModel};

use crate::movement::PlayerPose;

/// Cell rectangle to dump, in tile coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridRegion {
    pub col: i32,
    pub row: i32,
    pub cols: u32,
    pub rows: u32,
}

impl GridRegion {
    pub fn whole(index: &CollisionIndex) -> Self {
        Self {
            col: 0,
            row: 0,
            cols: index.width(),
            rows: index.height(),
        }
    }

    /// `radius` cells around `center`, clipped to the map.
    pub fn around(index: &CollisionIndex, center: (i32, i32), radius: u32) -> Self {
        let r = radius as i32;
        let col0 = (center.0 - r).max(0);
        let row0 = (center.1 - r).max(0);
        let col1 = (center.0 + r + 1).min(index.width() as i32);
        let row1 = (center.1 + r + 1).min(index.height() as i32);
        Self {
            col: col0,
            row: row0,
            cols: (col1 - col0).max(0) as u32,
            rows: (row1 - row0).max(0) as u32,
        }
    }
}

/// `X` blocked by a tile, `o` covered only by a shape's bounds, `.` free,
/// `@` the player's cell.
pub fn render_collision_ascii(
    index: &CollisionIndex,
    region: GridRegion,
    player_cell: Option<(i32, i32)>,
) -> String {
    let mut out = String::with_capacity((region.cols as usize + 1) * region.rows as usize);
    for row in region.row..region.row + region.rows as i32 {
        for col in region.col..region.col + region.cols as i32 {
            let ch = if player_cell == Some((col, row)) {
                '@'
            } else if index.is_tile_cell_blocked(col, row) {
                'X'
            } else if index.is_cell_occupied(col, row) {
                'o'
            } else {
                '.'
            };
            out.push(ch);
        }
        out.push('\n');
    }
    out
}

/// Tile cell under the centre of the player sprite.
pub fn player_cell(pose: &PlayerPose, size: Vec2, index: &CollisionIndex) -> (i32, i32) {
    let (tile_w, tile_h) = index.tile_size();
    let centre = Vec2::new(pose.x, pose.y) + size / 2.0;
    ((centre.x / tile_w).floor() as i32, (centre.y / tile_h).floor() as i32)
}

pub fn status_line(
    pose: &PlayerPose,
    size: Vec2,
    camera: Vec2,
    map: &MapModel,
    index: &CollisionIndex,
) -> String {
    let (col, row) = player_cell(pose, size, index);
    let gid = (0..map.layers.len())
        .rev()
        .map(|layer| map.tile_identifier_at(layer, col, row))
        .find(|gid| *gid != 0)
        .unwrap_or(0);
    let collidable = if index.is_tile_collidable(gid) { "Yes" } else { "No" };
    format!(
        "Player: ({}, {}) Camera: ({}, {}) Tile: GID {gid} at ({col}, {row}) Collidable: {collidable}",
        pose.x as i32, pose.y as i32, camera.x as i32, camera.y as i32
    )
}
