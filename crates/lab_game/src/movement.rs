//! Player movement against the collision index.
//!
//! Each tick the intended displacement is split into short sub-steps so a
//! fast player cannot skip over a one-tile wall. Within a sub-step X is tried
//! first, then Y from the X-corrected position; a blocked axis is reverted on
//! its own, which is what lets the player slide along walls.

use lab_core::config::GameConfig;
use lab_core::direction::Direction;
use lab_map::CollisionIndex;
use std::f32::consts::FRAC_1_SQRT_2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerPose {
    /// Top-left of the sprite, map pixels.
    pub x: f32,
    pub y: f32,
    pub direction: Direction,
    pub moving: bool,
}

impl PlayerPose {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            direction: Direction::Down,
            moving: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementConfig {
    /// Pixels per tick along one axis.
    pub speed: f32,
    pub sprite_width: f32,
    pub sprite_height: f32,
    pub margin_x: f32,
    pub margin_y: f32,
    /// Longest sub-step as a fraction of the smaller tile edge.
    pub max_step_tile_fraction: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            speed: 2.0,
            sprite_width: 16.0,
            sprite_height: 16.0,
            margin_x: 4.0,
            margin_y: 4.0,
            max_step_tile_fraction: 0.0625,
        }
    }
}

impl MovementConfig {
    pub fn from_config(config: &GameConfig, sprite_width: f32, sprite_height: f32) -> Self {
        Self {
            speed: config.player_speed_per_tick(),
            sprite_width,
            sprite_height,
            margin_x: config.collision_margin_x,
            margin_y: config.collision_margin_y,
            max_step_tile_fraction: config.substep_max_tile_fraction,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MovementSolver {
    pub config: MovementConfig,
}

impl MovementSolver {
    pub fn new(config: MovementConfig) -> Self {
        Self { config }
    }

    /// Advance `pose` by one tick of `input`.
    ///
    /// Distance is `speed` per call regardless of `dt`; the game runs on a
    /// fixed tick and `dt` only drives animation timing.
    pub fn resolve(
        &self,
        pose: PlayerPose,
        input: (f32, f32),
        _dt: f32,
        index: &CollisionIndex,
    ) -> PlayerPose {
        let (mut dir_x, mut dir_y) = (axis_sign(input.0), axis_sign(input.1));
        if dir_x != 0.0 && dir_y != 0.0 {
            dir_x *= FRAC_1_SQRT_2;
            dir_y *= FRAC_1_SQRT_2;
        }
        let total_dx = dir_x * self.config.speed;
        let total_dy = dir_y * self.config.speed;

        let (mut x, mut y) = (pose.x, pose.y);
        let steps = self.step_count(total_dx, total_dy, index);
        let (step_dx, step_dy) = (total_dx / steps as f32, total_dy / steps as f32);

        for _ in 0..steps {
            let mut blocked_x = step_dx == 0.0;
            if !blocked_x {
                if self.collides(x + step_dx, y, index) {
                    blocked_x = true;
                } else {
                    x += step_dx;
                }
            }

            let mut blocked_y = step_dy == 0.0;
            if !blocked_y {
                if self.collides(x, y + step_dy, index) {
                    blocked_y = true;
                } else {
                    y += step_dy;
                }
            }

            if blocked_x && blocked_y {
                break;
            }
        }

        if let Some((map_w, map_h)) = index.map_pixel_size() {
            x = x.clamp(0.0, (map_w - self.config.sprite_width).max(0.0));
            y = y.clamp(0.0, (map_h - self.config.sprite_height).max(0.0));
        }

        PlayerPose {
            x,
            y,
            direction: Direction::from_displacement(total_dx, total_dy).unwrap_or(pose.direction),
            moving: x != pose.x || y != pose.y,
        }
    }

    /// True when any sample point of the collision box at (`x`, `y`) is blocked.
    pub fn collides(&self, x: f32, y: f32, index: &CollisionIndex) -> bool {
        self.collision_points(x, y)
            .iter()
            .any(|&(px, py)| index.is_blocked(px, py))
    }

    /// Corners and edge midpoints of the inset collision box, pixel-inclusive.
    pub fn collision_points(&self, x: f32, y: f32) -> [(f32, f32); 8] {
        let left = x + self.config.margin_x;
        let top = y + self.config.margin_y;
        let width = (self.config.sprite_width - 2.0 * self.config.margin_x).max(1.0);
        let height = (self.config.sprite_height - 2.0 * self.config.margin_y).max(1.0);
        let right = left + width - 1.0;
        let bottom = top + height - 1.0;
        let mid_x = left + width / 2.0;
        let mid_y = top + height / 2.0;
        [
            (left, top),
            (right, top),
            (left, bottom),
            (right, bottom),
            (mid_x, top),
            (right, mid_y),
            (mid_x, bottom),
            (left, mid_y),
        ]
    }

    fn step_count(&self, dx: f32, dy: f32, index: &CollisionIndex) -> u32 {
        let (tile_w, tile_h) = index.tile_size();
        let max_step = (tile_w.min(tile_h) * self.config.max_step_tile_fraction).max(0.01);
        let distance = dx.abs().max(dy.abs());
        ((distance / max_step).ceil() as u32).max(1)
    }
}

fn axis_sign(value: f32) -> f32 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}
