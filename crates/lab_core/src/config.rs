//! Game configuration loaded from `data/config.json`.
//!
//! Keys use the upper-snake names the content pipeline already writes
//! (`SCREEN_WIDTH`, `PLAYER_SPEED`, ...). Every key is optional; a missing or
//! unreadable file falls back to `GameConfig::default()`.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::input::KeyBindings;

pub const DEFAULT_CONFIG_PATH: &str = "data/config.json";

/// `PLAYER_SPEED` is authored per 300 ticks.
const SPEED_DIVISOR: f32 = 300.0;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct GameConfig {
    #[serde(default = "default_screen_width")]
    pub screen_width: u32,
    #[serde(default = "default_screen_height")]
    pub screen_height: u32,
    #[serde(default = "default_scale_factor")]
    pub scale_factor: u32,
    #[serde(default = "default_player_speed")]
    pub player_speed: f32,
    #[serde(default = "default_collision_margin")]
    pub collision_margin_x: f32,
    #[serde(default = "default_collision_margin")]
    pub collision_margin_y: f32,
    #[serde(default = "default_substep_fraction")]
    pub substep_max_tile_fraction: f32,
    #[serde(default = "default_broadphase_cell_size")]
    pub broadphase_cell_size: f32,
    #[serde(default = "default_fully_collidable_tilesets")]
    pub fully_collidable_tilesets: Vec<String>,
    #[serde(default = "default_collision_layer_keyword")]
    pub collision_layer_keyword: String,
    #[serde(default = "default_project_root")]
    pub project_root: String,
    #[serde(default = "default_asset_root")]
    pub asset_root: String,
    #[serde(default = "default_map_path")]
    pub map_path: String,
    #[serde(default = "default_player_tileset")]
    pub player_tileset: String,
    #[serde(default = "default_footprint_step_distance")]
    pub footprint_step_distance: f32,
    #[serde(default = "default_footprint_lifetime")]
    pub footprint_lifetime: f32,
    /// Drawn edge length of one footprint, in pixels.
    #[serde(default = "default_footprint_size")]
    pub footprint_size: f32,
    /// Pixel size of the footprint images.
    #[serde(default = "default_footprint_source_size")]
    pub footprint_source_size: [u32; 2],
    #[serde(default = "default_footprint_left_image")]
    pub footprint_left_image: String,
    #[serde(default = "default_footprint_right_image")]
    pub footprint_right_image: String,
    #[serde(default)]
    pub key_bindings: KeyBindings,
    #[serde(default)]
    pub debug: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            screen_width: default_screen_width(),
            screen_height: default_screen_height(),
            scale_factor: default_scale_factor(),
            player_speed: default_player_speed(),
            collision_margin_x: default_collision_margin(),
            collision_margin_y: default_collision_margin(),
            substep_max_tile_fraction: default_substep_fraction(),
            broadphase_cell_size: default_broadphase_cell_size(),
            fully_collidable_tilesets: default_fully_collidable_tilesets(),
            collision_layer_keyword: default_collision_layer_keyword(),
            project_root: default_project_root(),
            asset_root: default_asset_root(),
            map_path: default_map_path(),
            player_tileset: default_player_tileset(),
            footprint_step_distance: default_footprint_step_distance(),
            footprint_lifetime: default_footprint_lifetime(),
            footprint_size: default_footprint_size(),
            footprint_source_size: default_footprint_source_size(),
            footprint_left_image: default_footprint_left_image(),
            footprint_right_image: default_footprint_right_image(),
            key_bindings: KeyBindings::default(),
            debug: false,
        }
    }
}

impl GameConfig {
    /// Load from `path`, logging and falling back to defaults on any failure.
    pub fn load_or_default(path: &Path) -> Self {
        match load_config(path) {
            Ok(config) => {
                log::info!("Loaded configuration from {}", path.display());
                config
            }
            Err(err) => {
                log::warn!("{err}. Using default configuration");
                Self::default()
            }
        }
    }

    /// Player displacement per simulation tick, in pixels.
    pub fn player_speed_per_tick(&self) -> f32 {
        self.player_speed / SPEED_DIVISOR
    }

    /// Size of the low-resolution render surface the camera looks through.
    pub fn render_size(&self) -> (u32, u32) {
        let scale = self.scale_factor.max(1);
        (self.screen_width / scale, self.screen_height / scale)
    }
}

pub fn load_config(path: &Path) -> Result<GameConfig, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let config: GameConfig = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &GameConfig) -> Result<(), String> {
    if config.broadphase_cell_size <= 0.0 {
        return Err("Config validation failed: BROADPHASE_CELL_SIZE must be > 0".to_string());
    }
    if config.substep_max_tile_fraction <= 0.0 || config.substep_max_tile_fraction > 1.0 {
        return Err(
            "Config validation failed: SUBSTEP_MAX_TILE_FRACTION must be in (0, 1]".to_string(),
        );
    }
    if config.collision_margin_x < 0.0 || config.collision_margin_y < 0.0 {
        return Err("Config validation failed: collision margins must be >= 0".to_string());
    }
    if config.footprint_lifetime <= 0.0 {
        return Err("Config validation failed: FOOTPRINT_LIFETIME must be > 0".to_string());
    }
    if config.footprint_step_distance < 0.0 {
        return Err("Config validation failed: FOOTPRINT_STEP_DISTANCE must be >= 0".to_string());
    }
    Ok(())
}

const fn default_screen_width() -> u32 {
    1920
}

const fn default_screen_height() -> u32 {
    1080
}

const fn default_scale_factor() -> u32 {
    5
}

const fn default_player_speed() -> f32 {
    600.0
}

const fn default_collision_margin() -> f32 {
    4.0
}

const fn default_substep_fraction() -> f32 {
    0.0625
}

const fn default_broadphase_cell_size() -> f32 {
    64.0
}

fn default_fully_collidable_tilesets() -> Vec<String> {
    vec!["Water".to_string()]
}

fn default_collision_layer_keyword() -> String {
    "collision".to_string()
}

fn default_project_root() -> String {
    ".".to_string()
}

fn default_asset_root() -> String {
    "data/assets".to_string()
}

fn default_map_path() -> String {
    "data/assets/maps/test_map.tmj".to_string()
}

fn default_player_tileset() -> String {
    "data/assets/tilesets/animated/Main_Character/Basic Charakter Spritesheet.tsj".to_string()
}

const fn default_footprint_step_distance() -> f32 {
    12.0
}

const fn default_footprint_lifetime() -> f32 {
    1.5
}

const fn default_footprint_size() -> f32 {
    4.0
}

const fn default_footprint_source_size() -> [u32; 2] {
    [128, 128]
}

fn default_footprint_left_image() -> String {
    "data/assets/tilesets/static/Effects/left_footprint.png".to_string()
}

fn default_footprint_right_image() -> String {
    "data/assets/tilesets/static/Effects/right_footprint.png".to_string()
}
