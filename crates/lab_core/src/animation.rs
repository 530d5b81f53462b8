//! Tile animation clips and deterministic playback.
//!
//! A clip is an ordered list of tile ids, each shown for a fixed duration.
//! Tileset documents store durations in milliseconds; on load they become
//! integer microseconds so playback under a fixed tick never drifts. Seconds
//! are available through accessors for callers that think in wall time.
//!
//! Tiled animations always loop, so there is no play-once mode.

/// One frame of a tile animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationFrame {
    /// Tile id local to the owning tileset.
    pub tile_id: u32,
    pub duration_us: u64,
}

impl AnimationFrame {
    pub fn from_millis(tile_id: u32, duration_ms: u64) -> Self {
        Self {
            tile_id,
            duration_us: duration_ms.saturating_mul(1000),
        }
    }

    pub fn duration_secs(&self) -> f32 {
        self.duration_us as f32 / 1_000_000.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnimationClip {
    pub frames: Vec<AnimationFrame>,
}

impl AnimationClip {
    pub fn new(frames: Vec<AnimationFrame>) -> Self {
        Self { frames }
    }

    /// Total duration of one cycle in microseconds, saturating at `u64::MAX`.
    pub fn total_duration_us(&self) -> u64 {
        self.frames.iter().fold(0u64, |total, f| total.saturating_add(f.duration_us))
    }

    /// Total duration of one cycle in seconds.
    pub fn total_duration_secs(&self) -> f32 {
        self.total_duration_us() as f32 / 1_000_000.0
    }

    pub fn durations_secs(&self) -> Vec<f32> {
        self.frames.iter().map(AnimationFrame::duration_secs).collect()
    }

    pub fn tile_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.frames.iter().map(|f| f.tile_id)
    }
}

/// Playback cursor over a clip. The clip itself is borrowed at tick time so
/// one clip can drive any number of players.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnimationPlayer {
    pub frame_index: usize,
    pub elapsed_us: u64,
}

impl AnimationPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.frame_index = 0;
        self.elapsed_us = 0;
    }

    /// Advance by `dt_us` and return the tile id now showing, or `None` for an
    /// empty clip.
    pub fn tick(&mut self, dt_us: u64, clip: &AnimationClip) -> Option<u32> {
        if clip.frames.is_empty() {
            return None;
        }
        // A clip swapped for a shorter one must not index past its end.
        if self.frame_index >= clip.frames.len() {
            self.reset();
        }

        // Zero-length cycles would spin forever.
        let total = clip.total_duration_us();
        if total == 0 {
            return Some(clip.frames[self.frame_index].tile_id);
        }

        self.elapsed_us = self.elapsed_us.saturating_add(dt_us);
        // Whole cycles land back on the same frame.
        if total < u64::MAX && self.elapsed_us >= total {
            self.elapsed_us %= total;
        }
        loop {
            let frame = &clip.frames[self.frame_index];
            if self.elapsed_us < frame.duration_us {
                break;
            }
            self.elapsed_us -= frame.duration_us;
            self.frame_index = (self.frame_index + 1) % clip.frames.len();
        }

        Some(clip.frames[self.frame_index].tile_id)
    }

    pub fn current_tile(&self, clip: &AnimationClip) -> Option<u32> {
        clip.frames.get(self.frame_index).map(|f| f.tile_id)
    }
}

/// Convert a tick length in seconds to whole microseconds.
pub fn secs_to_us(dt: f32) -> u64 {
    (dt.max(0.0) as f64 * 1_000_000.0).round() as u64
}
