use lab_core::input::{InputState, Key, KeyBindings};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySequence {
    #[serde(default = "default_dt")]
    pub fixed_dt: f32,
    pub frames: Vec<ReplayFrame>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplayFrame {
    #[serde(default)]
    pub dx: f32,
    #[serde(default)]
    pub dy: f32,
    /// Held key names (`"K_RIGHT"`, `"K_w"`, ...). When present they replace
    /// `dx`/`dy` and go through the configured key bindings.
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

impl ReplaySequence {
    /// One movement vector per tick, each axis clamped to [-1, 1].
    pub fn expanded_inputs(&self, bindings: &KeyBindings) -> Vec<(f32, f32)> {
        let mut out = Vec::new();
        for frame in &self.frames {
            let vector = if frame.keys.is_empty() {
                (frame.dx.clamp(-1.0, 1.0), frame.dy.clamp(-1.0, 1.0))
            } else {
                let mut input = InputState::new();
                for name in &frame.keys {
                    match Key::from_name(name) {
                        Some(key) => input.key_down(key),
                        None => log::warn!("Replay names unknown key '{name}', ignoring"),
                    }
                }
                input.movement_vector(bindings)
            };
            for _ in 0..frame.repeat.max(1) {
                out.push(vector);
            }
        }
        out
    }

    /// Ticks without input, used when no replay file is given.
    pub fn idle(ticks: u32) -> Self {
        Self {
            fixed_dt: default_dt(),
            frames: vec![ReplayFrame {
                dx: 0.0,
                dy: 0.0,
                keys: Vec::new(),
                repeat: ticks,
            }],
        }
    }
}

pub fn load_replay_from_path(path: &Path) -> Result<ReplaySequence, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let replay: ReplaySequence = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse replay JSON {}: {e}", path.display()))?;
    validate_replay(&replay)?;
    Ok(replay)
}

fn validate_replay(replay: &ReplaySequence) -> Result<(), String> {
    if !replay.fixed_dt.is_finite() || replay.fixed_dt <= 0.0 {
        return Err("Replay validation failed: fixed_dt must be > 0".to_string());
    }
    if replay.frames.is_empty() {
        return Err("Replay validation failed: frames list is empty".to_string());
    }
    Ok(())
}

const fn default_dt() -> f32 {
    1.0 / 60.0
}

const fn default_repeat() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::{MovementConfig, MovementSolver, PlayerPose};
    use lab_map::{CollisionIndex, CollisionRules, MapModel, TilesetCatalog};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "lab_replay_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn ring_index() -> CollisionIndex {
        let mut data = vec![0u32; 64];
        for i in 0..8 {
            data[i] = 1;
            data[56 + i] = 1;
            data[i * 8] = 1;
            data[i * 8 + 7] = 1;
        }
        let data = data.iter().map(u32::to_string).collect::<Vec<_>>().join(",");
        let text = format!(
            r#"{{"width":8,"height":8,
                "tilesets":[{{"firstgid":1,"name":"Water","columns":1,"tilecount":1}}],
                "layers":[{{"type":"tilelayer","name":"ring","data":[{data}]}}]}}"#
        );
        let mut catalog = TilesetCatalog::default();
        let map = MapModel::parse(&text, Path::new("test/ring.tmj"), &mut catalog).expect("map parses");
        CollisionIndex::build(&map, &catalog, &CollisionRules::default())
    }

    #[test]
    fn replay_file_parses_and_expands() {
        let path = temp_file_path("parse");
        fs::write(
            &path,
            r#"{
              "fixed_dt": 0.016666667,
              "frames": [
                { "dx": 1.0, "repeat": 3 },
                { "dx": -4.0, "dy": 1.0 }
              ]
            }"#,
        )
        .expect("write replay file");

        let replay = load_replay_from_path(&path).expect("replay should load");
        let expanded = replay.expanded_inputs(&KeyBindings::default());
        assert_eq!(expanded.len(), 4);
        assert_eq!(expanded[0], (1.0, 0.0));
        assert_eq!(expanded[3], (-1.0, 1.0));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn replay_rejects_empty_frames() {
        let path = temp_file_path("empty");
        fs::write(&path, r#"{ "frames": [] }"#).expect("write replay file");
        let err = load_replay_from_path(&path).expect_err("empty replay should fail");
        assert!(err.contains("frames list is empty"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn replay_run_is_deterministic_and_stays_inside_walls() {
        let path = temp_file_path("deterministic");
        fs::write(
            &path,
            r#"{
              "frames": [
                { "dx": 1.0, "repeat": 60 },
                { "dx": 1.0, "dy": 1.0, "repeat": 40 },
                { "dy": -1.0, "repeat": 90 },
                { "dx": -1.0, "dy": -1.0, "repeat": 45 }
              ]
            }"#,
        )
        .expect("write replay file");

        let replay = load_replay_from_path(&path).expect("replay should load");
        let inputs = replay.expanded_inputs(&KeyBindings::default());
        let index = ring_index();
        let solver = MovementSolver::new(MovementConfig::default());

        let mut run_a = PlayerPose::at(40.0, 40.0);
        let mut run_b = run_a;
        for input in &inputs {
            run_a = solver.resolve(run_a, *input, replay.fixed_dt, &index);
        }
        for input in &inputs {
            run_b = solver.resolve(run_b, *input, replay.fixed_dt, &index);
        }

        assert!((run_a.x - run_b.x).abs() < 0.0001);
        assert!((run_a.y - run_b.y).abs() < 0.0001);
        assert_eq!(run_a.direction, run_b.direction);
        // The collision box never enters the one-tile border.
        assert!(run_a.x + 4.0 >= 16.0 && run_a.x + 11.0 < 112.0);
        assert!(run_a.y + 4.0 >= 16.0 && run_a.y + 11.0 < 112.0);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn key_frames_go_through_bindings() {
        let replay: ReplaySequence = serde_json::from_str(
            r#"{ "frames": [
                { "keys": ["K_d", "K_UP"], "repeat": 2 },
                { "keys": ["K_LEFT", "K_RIGHT", "K_BOGUS"] }
            ] }"#,
        )
        .expect("replay parses");
        let inputs = replay.expanded_inputs(&KeyBindings::default());
        assert_eq!(inputs, vec![(1.0, -1.0), (1.0, -1.0), (0.0, 0.0)]);

        let arrows_only = KeyBindings {
            right: vec!["K_RIGHT".to_string()],
            ..KeyBindings::default()
        };
        assert_eq!(replay.expanded_inputs(&arrows_only)[0], (0.0, -1.0));
    }

    #[test]
    fn idle_sequence_has_zero_inputs() {
        let inputs = ReplaySequence::idle(5).expanded_inputs(&KeyBindings::default());
        assert_eq!(inputs, vec![(0.0, 0.0); 5]);
    }
}
