//! Keyboard state and the mapping from held keys to a movement vector.
//!
//! `InputState` keeps level-triggered (`is_held`) and edge-triggered
//! (`is_just_pressed`) views of the keyboard. Edge sets are cleared by
//! `end_frame()` after the simulation tick has consumed them.
//!
//! Movement intent is derived from `KeyBindings`: each axis direction may be
//! bound to several keys (arrows and WASD by default), and the resulting vector
//! has components in {-1, 0, 1}. Diagonal scaling happens in the movement
//! solver, not here.

use serde::Deserialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    W,
    A,
    S,
    D,
    F1,
    F2,
    Escape,
}

impl Key {
    /// Parse a key name as written in the config file (`"K_UP"`, `"K_w"`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        let key = match name {
            "K_UP" => Self::Up,
            "K_DOWN" => Self::Down,
            "K_LEFT" => Self::Left,
            "K_RIGHT" => Self::Right,
            "K_w" | "K_W" => Self::W,
            "K_a" | "K_A" => Self::A,
            "K_s" | "K_S" => Self::S,
            "K_d" | "K_D" => Self::D,
            "K_F1" => Self::F1,
            "K_F2" => Self::F2,
            "K_ESCAPE" => Self::Escape,
            _ => return None,
        };
        Some(key)
    }
}

/// Key names bound to each movement direction.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct KeyBindings {
    #[serde(default = "default_up")]
    pub up: Vec<String>,
    #[serde(default = "default_down")]
    pub down: Vec<String>,
    #[serde(default = "default_left")]
    pub left: Vec<String>,
    #[serde(default = "default_right")]
    pub right: Vec<String>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            up: default_up(),
            down: default_down(),
            left: default_left(),
            right: default_right(),
        }
    }
}

impl KeyBindings {
    fn resolve(names: &[String]) -> Vec<Key> {
        names
            .iter()
            .filter_map(|name| {
                let key = Key::from_name(name);
                if key.is_none() {
                    log::warn!("Unknown key name '{}' in key bindings, ignoring", name);
                }
                key
            })
            .collect()
    }
}

pub struct InputState {
    held: HashSet<Key>,
    just_pressed: HashSet<Key>,
    just_released: HashSet<Key>,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            held: HashSet::new(),
            just_pressed: HashSet::new(),
            just_released: HashSet::new(),
        }
    }

    pub fn key_down(&mut self, key: Key) {
        if self.held.insert(key) {
            self.just_pressed.insert(key);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        if self.held.remove(&key) {
            self.just_released.insert(key);
        }
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn is_just_pressed(&self, key: Key) -> bool {
        self.just_pressed.contains(&key)
    }

    pub fn is_just_released(&self, key: Key) -> bool {
        self.just_released.contains(&key)
    }

    fn any_held(&self, keys: &[Key]) -> bool {
        keys.iter().any(|key| self.held.contains(key))
    }

    /// Movement intent for the current held keys. Opposite directions cancel.
    pub fn movement_vector(&self, bindings: &KeyBindings) -> (f32, f32) {
        let mut dx = 0.0;
        let mut dy = 0.0;
        if self.any_held(&KeyBindings::resolve(&bindings.left)) {
            dx -= 1.0;
        }
        if self.any_held(&KeyBindings::resolve(&bindings.right)) {
            dx += 1.0;
        }
        if self.any_held(&KeyBindings::resolve(&bindings.up)) {
            dy -= 1.0;
        }
        if self.any_held(&KeyBindings::resolve(&bindings.down)) {
            dy += 1.0;
        }
        (dx, dy)
    }

    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

fn default_up() -> Vec<String> {
    vec!["K_UP".to_string(), "K_w".to_string()]
}

fn default_down() -> Vec<String> {
    vec!["K_DOWN".to_string(), "K_s".to_string()]
}

fn default_left() -> Vec<String> {
    vec!["K_LEFT".to_string(), "K_a".to_string()]
}

fn default_right() -> Vec<String> {
    vec!["K_RIGHT".to_string(), "K_d".to_string()]
}
