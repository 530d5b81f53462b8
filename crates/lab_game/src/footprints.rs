//! Fading footprints left behind a walking player.
//!
//! A print is dropped on the first step and then each time the feet have
//! travelled `step_distance` pixels from the previous print. Prints alternate
//! feet, sit a little to either side of the path and fade out linearly over
//! their lifetime.

use std::cmp::Ordering::{Greater, Less};
use std::path::PathBuf;

use glam::Vec2;
use lab_core::config::GameConfig;
use lab_core::direction::Direction;
use lab_map::TileVisual;

use crate::render_queue::{DrawStyle, Rect, RenderLayer, RenderQueue};

#[derive(Debug, Clone, PartialEq)]
pub struct FootprintConfig {
    pub step_distance: f32,
    /// Seconds a print stays visible.
    pub lifetime: f32,
    pub size: f32,
    pub source_size: [u32; 2],
    pub left_image: PathBuf,
    pub right_image: PathBuf,
}

impl Default for FootprintConfig {
    fn default() -> Self {
        Self::from_config(&GameConfig::default())
    }
}

impl FootprintConfig {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            step_distance: config.footprint_step_distance,
            lifetime: config.footprint_lifetime,
            size: config.footprint_size,
            source_size: config.footprint_source_size,
            left_image: PathBuf::from(&config.footprint_left_image),
            right_image: PathBuf::from(&config.footprint_right_image),
        }
    }
}

/// Walking heading, including diagonals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepHeading {
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

impl StepHeading {
    /// Diagonal when both input axes are non-zero, otherwise the facing.
    pub fn from_motion(facing: Direction, input: (f32, f32)) -> Self {
        let (dx, dy) = input;
        match (dx.partial_cmp(&0.0), dy.partial_cmp(&0.0)) {
            (Some(Less), Some(Less)) => Self::UpLeft,
            (Some(Greater), Some(Less)) => Self::UpRight,
            (Some(Less), Some(Greater)) => Self::DownLeft,
            (Some(Greater), Some(Greater)) => Self::DownRight,
            _ => match facing {
                Direction::Up => Self::Up,
                Direction::Down => Self::Down,
                Direction::Left => Self::Left,
                Direction::Right => Self::Right,
            },
        }
    }

    pub fn is_cardinal(self) -> bool {
        matches!(self, Self::Up | Self::Down | Self::Left | Self::Right)
    }

    /// Sprite rotation; prints are authored pointing down.
    pub fn rotation_degrees(self) -> f32 {
        match self {
            Self::Down => 0.0,
            Self::DownRight => 45.0,
            Self::Left => 90.0,
            Self::UpRight => 135.0,
            Self::Up => 180.0,
            Self::UpLeft => 225.0,
            Self::Right => 270.0,
            Self::DownLeft => 315.0,
        }
    }

    /// Sideways shift of a right footprint; a left one is mirrored.
    fn foot_offset(self) -> Vec2 {
        match self {
            Self::Up | Self::Down => Vec2::new(3.0, 0.0),
            Self::Left | Self::Right => Vec2::new(0.0, 3.0),
            Self::UpLeft => Vec2::new(-2.0, 2.0),
            Self::UpRight | Self::DownLeft => Vec2::new(2.0, 2.0),
            Self::DownRight => Vec2::new(2.0, -2.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    /// Centre of the print, map pixels.
    pub pos: Vec2,
    pub heading: StepHeading,
    pub left: bool,
    pub remaining: f32,
    pub lifetime: f32,
}

impl Footprint {
    fn new(at: Vec2, heading: StepHeading, left: bool, lifetime: f32) -> Self {
        let offset = heading.foot_offset();
        Self {
            pos: if left { at - offset } else { at + offset },
            heading,
            left,
            remaining: lifetime,
            lifetime,
        }
    }

    pub fn alpha(&self) -> u8 {
        if self.lifetime <= 0.0 {
            return 0;
        }
        (255.0 * (self.remaining / self.lifetime)).clamp(0.0, 255.0) as u8
    }
}

#[derive(Debug)]
pub struct FootprintTrail {
    config: FootprintConfig,
    prints: Vec<Footprint>,
    last_print: Option<Vec2>,
    last_heading: Option<StepHeading>,
    left_foot: bool,
}

impl FootprintTrail {
    pub fn new(config: FootprintConfig) -> Self {
        Self {
            config,
            prints: Vec::new(),
            last_print: None,
            last_heading: None,
            left_foot: true,
        }
    }

    /// Offer a step at `feet`. Returns true when a print was dropped.
    pub fn step(&mut self, feet: Vec2, heading: StepHeading) -> bool {
        if let Some(last) = self.last_heading {
            // Turning between straight headings starts again on the left foot.
            if last != heading && last.is_cardinal() && heading.is_cardinal() {
                self.left_foot = true;
            }
        }
        self.last_heading = Some(heading);

        let due = self
            .last_print
            .map_or(true, |last| last.distance(feet) >= self.config.step_distance);
        if !due {
            return false;
        }
        self.prints
            .push(Footprint::new(feet, heading, self.left_foot, self.config.lifetime));
        self.last_print = Some(feet);
        self.left_foot = !self.left_foot;
        true
    }

    /// Age every print by `dt` seconds and drop the expired ones.
    pub fn update(&mut self, dt: f32) {
        for print in &mut self.prints {
            print.remaining -= dt;
        }
        self.prints.retain(|print| print.remaining > 0.0);
    }

    pub fn queue(&self, queue: &mut RenderQueue) {
        let size = self.config.size;
        let [src_w, src_h] = self.config.source_size;
        for print in &self.prints {
            let image = if print.left {
                &self.config.left_image
            } else {
                &self.config.right_image
            };
            let sprite = TileVisual::Atlas {
                image: image.clone(),
                src_rect: [0, 0, src_w, src_h],
            };
            let rect = Rect::new(print.pos.x - size / 2.0, print.pos.y - size / 2.0, size, size);
            let style = DrawStyle {
                alpha: print.alpha(),
                rotation_degrees: print.heading.rotation_degrees(),
            };
            queue.draw_styled(RenderLayer::Below, print.pos.y, sprite, rect, style);
        }
    }

    pub fn len(&self) -> usize {
        self.prints.len()
    }
}
