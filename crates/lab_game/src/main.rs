//! Labyrinth runtime: headless game loop.
//!
//! Startup loads the config, the map and its tilesets, then builds the
//! collision index once. Each fixed tick:
//!
//!   1. resolve player movement against the published `CollisionIndex`
//!   2. advance the player sprite, footprints and animated map tiles
//!   3. follow the player with the camera
//!   4. fill the render queue and drain it into the frame target
//!
//! Input comes from a replay script (`lab_game replay.json`) or, without one,
//! a fixed run of idle ticks. A map reload builds a fresh index and swaps the
//! `Arc`, so anything still holding the old one keeps a complete index.

mod animation;
mod camera;
mod debug;
mod footprints;
mod movement;
mod render_queue;
mod replay;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use glam::Vec2;
use lab_core::animation::secs_to_us;
use lab_core::config::{GameConfig, DEFAULT_CONFIG_PATH};
use lab_map::{CatalogOptions, CollisionIndex, CollisionRules, MapModel, TileVisual, TilesetCatalog};

use animation::{PlayerSprite, TileAnimator};
use camera::Camera2D;
use debug::GridRegion;
use footprints::{FootprintConfig, FootprintTrail, StepHeading};
use movement::{MovementConfig, MovementSolver, PlayerPose};
use render_queue::{DrawStyle, Rect, RenderLayer, RenderQueue, RenderTarget};
use replay::{load_replay_from_path, ReplaySequence};

const IDLE_TICKS: u32 = 120;
const DEBUG_REGION_RADIUS: u32 = 8;
const DEBUG_SHAPE_COLOR: [u8; 4] = [255, 64, 64, 255];
/// Feet sit this far above the sprite's bottom edge.
const FEET_INSET: f32 = 2.0;

/// Counts what a frame would have drawn.
#[derive(Debug, Default, Clone, Copy)]
struct FrameStats {
    blits: usize,
    placeholders: usize,
    faded: usize,
    rotated: usize,
}

impl RenderTarget for FrameStats {
    fn blit(&mut self, sprite: &TileVisual, _dest: Rect) {
        self.blits += 1;
        if matches!(sprite, TileVisual::Placeholder { .. }) {
            self.placeholders += 1;
        }
    }

    fn blit_styled(&mut self, sprite: &TileVisual, dest: Rect, style: DrawStyle) {
        if style.alpha == 0 {
            return;
        }
        self.blit(sprite, dest);
        if style.alpha < u8::MAX {
            self.faded += 1;
        }
        if style.rotation_degrees != 0.0 {
            self.rotated += 1;
        }
    }
}

struct GameState {
    config: GameConfig,
    catalog: TilesetCatalog,
    map: MapModel,
    collision: Arc<CollisionIndex>,
    rules: CollisionRules,
    solver: MovementSolver,
    pose: PlayerPose,
    player_size: Vec2,
    sprite: PlayerSprite,
    footprints: FootprintTrail,
    tiles: TileAnimator,
    camera: Camera2D,
    queue: RenderQueue,
    last_frame: FrameStats,
    tick_count: u64,
}

impl GameState {
    fn new(config: GameConfig) -> Self {
        let mut catalog = TilesetCatalog::new(CatalogOptions::from_config(&config));
        let rules = CollisionRules::from_config(&config);

        let player_tileset = PathBuf::from(&config.player_tileset);
        let player_size = match catalog.load(&player_tileset) {
            Some(entry) => Vec2::new(entry.tile_width as f32, entry.tile_height as f32),
            None => {
                log::warn!("Player tileset unavailable; using a 16x16 placeholder");
                Vec2::splat(16.0)
            }
        };

        let (view_w, view_h) = config.render_size();
        let spawn = Vec2::new(view_w as f32, view_h as f32) / 2.0;

        let mut state = Self {
            solver: MovementSolver::new(MovementConfig::from_config(
                &config,
                player_size.x,
                player_size.y,
            )),
            collision: Arc::new(CollisionIndex::empty(rules.clone())),
            map: MapModel::default(),
            tiles: TileAnimator::default(),
            pose: PlayerPose::at(spawn.x, spawn.y),
            sprite: PlayerSprite::new(&player_tileset),
            footprints: FootprintTrail::new(FootprintConfig::from_config(&config)),
            camera: Camera2D::new(view_w, view_h),
            queue: RenderQueue::new(),
            last_frame: FrameStats::default(),
            tick_count: 0,
            player_size,
            catalog,
            rules,
            config,
        };
        let map_path = PathBuf::from(&state.config.map_path);
        state.load_map(&map_path);
        state
    }

    /// Load a map and publish a freshly built collision index for it.
    fn load_map(&mut self, path: &Path) {
        let map = MapModel::load(path, &mut self.catalog);
        if map.is_empty() {
            log::warn!("No map loaded; movement is unbounded and nothing collides");
        }
        let index = CollisionIndex::build(&map, &self.catalog, &self.rules);
        self.tiles = TileAnimator::new(&map);
        log::info!("Animating {} map tiles", self.tiles.len());
        self.map = map;
        self.collision = Arc::new(index);
    }

    fn reload_map(&mut self, reason: &str) {
        let path = self.map.path.clone();
        log::info!("Reloading map {} ({reason})", path.display());
        self.load_map(&path);
    }

    fn collision(&self) -> Arc<CollisionIndex> {
        Arc::clone(&self.collision)
    }

    fn map_size(&self) -> Option<Vec2> {
        self.collision
            .map_pixel_size()
            .map(|(w, h)| Vec2::new(w, h))
    }

    fn tick(&mut self, input: (f32, f32), dt: f32) {
        let dt_us = secs_to_us(dt);
        self.pose = self.solver.resolve(self.pose, input, dt, &self.collision);
        self.sprite.update(&self.pose, dt_us, &self.catalog);
        if self.pose.moving {
            let feet = Vec2::new(
                self.pose.x + self.player_size.x / 2.0,
                self.pose.y + self.player_size.y - FEET_INSET,
            );
            self.footprints
                .step(feet, StepHeading::from_motion(self.pose.direction, input));
        }
        self.footprints.update(dt);
        self.tiles.advance(dt_us, &self.map, &self.catalog);
        let map_size = self.map_size();
        self.camera
            .follow(Vec2::new(self.pose.x, self.pose.y), self.player_size, map_size);

        self.queue_frame();
        let mut stats = FrameStats::default();
        self.queue
            .process(&mut stats, self.camera.position, self.camera.viewport);
        self.last_frame = stats;
        self.tick_count += 1;
    }

    fn queue_frame(&mut self) {
        let (tile_w, tile_h) = (self.map.tile_width as f32, self.map.tile_height as f32);
        for (layer_idx, layer) in self.map.layers.iter().enumerate() {
            if !layer.visible || layer.tile_data().is_none() {
                continue;
            }
            let render_layer = layer_for_name(&layer.name);
            for row in 0..self.map.height as i32 {
                for col in 0..self.map.width as i32 {
                    let gid = self.map.tile_identifier_at(layer_idx, col, row);
                    let shown = self.tiles.displayed_gid(gid);
                    let Some(visual) = self.map.tile_visual(shown, &self.catalog) else {
                        continue;
                    };
                    let rect = Rect::new(col as f32 * tile_w, row as f32 * tile_h, tile_w, tile_h);
                    self.queue.draw(render_layer, layer_idx as f32, visual, rect);
                }
            }
        }

        self.footprints.queue(&mut self.queue);

        let size = [self.player_size.x as u32, self.player_size.y as u32];
        let player_rect = Rect::new(self.pose.x, self.pose.y, self.player_size.x, self.player_size.y);
        // Entities sort by their feet so lower sprites draw on top.
        self.queue.draw(
            RenderLayer::Entities,
            self.pose.y + self.player_size.y,
            self.sprite.visual(&self.catalog, size),
            player_rect,
        );

        if self.config.debug {
            let (tile_w, tile_h) = self.collision.tile_size();
            let outlines: Vec<Rect> = self
                .collision
                .shapes()
                .iter()
                .map(|shape| {
                    let b = shape.bounds().scaled(tile_w, tile_h);
                    Rect::new(b.min_x, b.min_y, b.max_x - b.min_x, b.max_y - b.min_y)
                })
                .collect();
            self.queue
                .defer(RenderLayer::Effects, f32::INFINITY, move |target, offset| {
                    for rect in outlines {
                        let visual = TileVisual::Placeholder {
                            color: DEBUG_SHAPE_COLOR,
                            size: [rect.size.x as u32, rect.size.y as u32],
                        };
                        target.blit(&visual, rect.translated(offset));
                    }
                });
        }
    }

    fn status(&self) -> String {
        debug::status_line(
            &self.pose,
            self.player_size,
            self.camera.position,
            &self.map,
            &self.collision,
        )
    }

    fn log_collision_overlay(&self) {
        let index = self.collision();
        if index.width() == 0 {
            return;
        }
        let cell = debug::player_cell(&self.pose, self.player_size, &index);
        let span = DEBUG_REGION_RADIUS * 2 + 1;
        let region = if index.width() <= span && index.height() <= span {
            GridRegion::whole(&index)
        } else {
            GridRegion::around(&index, cell, DEBUG_REGION_RADIUS)
        };
        log::info!(
            "Collision around player:\n{}",
            debug::render_collision_ascii(&index, region, Some(cell))
        );
    }
}

/// Tiled layer names pick the draw layer; unknown names are terrain.
fn layer_for_name(name: &str) -> RenderLayer {
    let name = name.to_lowercase();
    if name.contains("background") {
        RenderLayer::Background
    } else if name.contains("below") {
        RenderLayer::Below
    } else if name.contains("above") || name.contains("roof") {
        RenderLayer::Above
    } else if name.contains("effect") {
        RenderLayer::Effects
    } else {
        RenderLayer::Terrain
    }
}

fn load_inputs(args: &[String], config: &GameConfig) -> (Vec<(f32, f32)>, f32) {
    let replay = match args.get(1) {
        Some(path) => match load_replay_from_path(Path::new(path)) {
            Ok(replay) => {
                log::info!("Loaded replay {} ({} frames)", path, replay.frames.len());
                replay
            }
            Err(err) => {
                log::error!("{err}; running {IDLE_TICKS} idle ticks instead");
                ReplaySequence::idle(IDLE_TICKS)
            }
        },
        None => ReplaySequence::idle(IDLE_TICKS),
    };
    (replay.expanded_inputs(&config.key_bindings), replay.fixed_dt)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let config = GameConfig::load_or_default(Path::new(DEFAULT_CONFIG_PATH));
    let (inputs, fixed_dt) = load_inputs(&args, &config);

    let mut state = GameState::new(config);
    if state.config.debug {
        state.log_collision_overlay();
    }

    for input in &inputs {
        state.tick(*input, fixed_dt);
    }

    log::info!(
        "Ran {} ticks; last frame drew {} sprites ({} placeholders, {} faded, {} rotated)",
        state.tick_count,
        state.last_frame.blits,
        state.last_frame.placeholders,
        state.last_frame.faded,
        state.last_frame.rotated
    );
    log::info!("{}", state.status());
    log::debug!("Camera view-projection: {:?}", state.camera.build_uniform().view_proj);
    log::debug!(
        "Player sprite: {} {} tile {:?}, {} footprints",
        state.sprite.state().label(),
        state.sprite.facing(),
        state.sprite.current_tile(),
        state.footprints.len()
    );
    if state.config.debug {
        state.log_collision_overlay();
        let previous = state.collision();
        state.reload_map("debug rebuild check");
        if *previous != *state.collision() {
            log::warn!("Collision index differs after rebuilding an unchanged map");
        }
    }
}
