//! Per-tick animation state for map tiles and the player sprite.
//!
//! Clips live in the tileset catalog; this module only keeps playback
//! cursors and resolves which tile is showing right now.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use lab_core::animation::AnimationPlayer;
use lab_core::direction::{Direction, MotionState};
use lab_map::{MapModel, TileVisual, TilesetCatalog};

use crate::movement::PlayerPose;

/// One playback cursor per animated gid on the map.
#[derive(Debug, Default)]
pub struct TileAnimator {
    players: BTreeMap<u32, AnimationPlayer>,
    /// Gid currently displayed in place of each animated gid.
    showing: BTreeMap<u32, u32>,
}

impl TileAnimator {
    pub fn new(map: &MapModel) -> Self {
        let players = map
            .animated_tiles()
            .map(|tile| (tile.gid, AnimationPlayer::new()))
            .collect();
        Self {
            players,
            showing: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn advance(&mut self, dt_us: u64, map: &MapModel, catalog: &TilesetCatalog) {
        for tile in map.animated_tiles() {
            let Some(player) = self.players.get_mut(&tile.gid) else {
                continue;
            };
            let clip_name = format!("tile_{}", tile.local_id);
            let Some(clip) = catalog
                .get(&tile.tileset)
                .and_then(|entry| entry.animation(Some(clip_name.as_str())))
            else {
                continue;
            };
            let first_gid = tile.gid - tile.local_id;
            if let Some(shown) = player.tick(dt_us, clip).and_then(|local| first_gid.checked_add(local)) {
                self.showing.insert(tile.gid, shown);
            }
        }
    }

    /// Gid to draw for a placed gid; non-animated gids map to themselves.
    pub fn displayed_gid(&self, gid: u32) -> u32 {
        self.showing.get(&gid).copied().unwrap_or(gid)
    }
}

/// Directional sprite driven by the player pose.
#[derive(Debug)]
pub struct PlayerSprite {
    tileset: PathBuf,
    facing: Direction,
    state: MotionState,
    player: AnimationPlayer,
    tile: Option<u32>,
}

impl PlayerSprite {
    pub fn new(tileset: &Path) -> Self {
        Self {
            tileset: tileset.to_path_buf(),
            facing: Direction::Down,
            state: MotionState::Idle,
            player: AnimationPlayer::new(),
            tile: None,
        }
    }

    pub fn facing(&self) -> Direction {
        self.facing
    }

    pub fn state(&self) -> MotionState {
        self.state
    }

    /// Pick the clip for the pose and advance it. Playback restarts only when
    /// facing or motion state changes.
    pub fn update(&mut self, pose: &PlayerPose, dt_us: u64, catalog: &TilesetCatalog) {
        let state = MotionState::from_moving(pose.moving);
        if pose.direction != self.facing || state != self.state {
            self.facing = pose.direction;
            self.state = state;
            self.player.reset();
        }

        let Some(entry) = catalog.get(&self.tileset) else {
            self.tile = None;
            return;
        };
        self.tile = match entry.directional_clip(self.facing, self.state) {
            Some(clip) => self.player.tick(dt_us, clip),
            None => entry.animation(None).and_then(|clip| self.player.tick(dt_us, clip)),
        };
    }

    /// Local tile id showing, if any clip resolved.
    pub fn current_tile(&self) -> Option<u32> {
        self.tile
    }

    pub fn visual(&self, catalog: &TilesetCatalog, size: [u32; 2]) -> TileVisual {
        match (catalog.get(&self.tileset), self.tile) {
            (Some(entry), Some(local)) => TileVisual::Atlas {
                image: entry.image.clone(),
                src_rect: entry.source_rect(local),
            },
            _ => TileVisual::Placeholder {
                color: lab_map::map::PLACEHOLDER_COLOR,
                size,
            },
        }
    }
}
