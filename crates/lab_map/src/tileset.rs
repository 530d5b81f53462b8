//! Tileset documents (`.tsj`/`.json`) and the parsed `TilesetEntry`.
//!
//! A tileset is one image cut into a regular grid of `columns` × rows tiles.
//! The optional `tiles` array annotates individual tiles with custom
//! properties and/or an animation. Animations become clips named
//! `tile_<local_id>`, kept in document order so "the first clip" is stable.
//! Tiles that also carry `direction` and `state` properties are character
//! clips, looked up by facing and motion instead of by name.

use lab_core::animation::{AnimationClip, AnimationFrame};
use lab_core::direction::{Direction, MotionState};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::MapError;
use crate::properties::{JsonProperty, Properties};

const DOCUMENT_EXTENSIONS: &[&str] = &["json", "tmj", "tsj"];

#[derive(Debug, Clone, Deserialize, Default)]
pub(crate) struct TilesetDocument {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_count")]
    pub columns: u32,
    #[serde(default = "default_count")]
    pub tilecount: u32,
    #[serde(default = "default_tile_size")]
    pub tilewidth: u32,
    #[serde(default = "default_tile_size")]
    pub tileheight: u32,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub properties: Vec<JsonProperty>,
    #[serde(default)]
    pub tiles: Vec<JsonTile>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct JsonTile {
    #[serde(default)]
    id: u32,
    #[serde(default)]
    properties: Vec<JsonProperty>,
    #[serde(default)]
    animation: Option<Vec<JsonFrame>>,
}

#[derive(Debug, Clone, Deserialize)]
struct JsonFrame {
    #[serde(default)]
    tileid: u32,
    #[serde(default = "default_frame_ms")]
    duration: u64,
}

/// Per-tile annotations from the tileset's `tiles` array.
#[derive(Debug, Clone, PartialEq)]
pub struct TileMetadata {
    pub id: u32,
    pub properties: Properties,
    pub animation: Option<AnimationClip>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalClip {
    pub direction: Direction,
    pub state: MotionState,
    pub clip: AnimationClip,
}

/// A loaded tileset. Immutable once the catalog has stored it.
#[derive(Debug, Clone, PartialEq)]
pub struct TilesetEntry {
    /// Logical name, from the document's `name` or else the file stem.
    pub name: String,
    /// Catalog key this entry was loaded under.
    pub source: PathBuf,
    pub columns: u32,
    pub tile_count: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    /// Image path after asset-root rewriting, relative to the project root.
    pub image: PathBuf,
    pub properties: Properties,
    tiles: BTreeMap<u32, TileMetadata>,
    animations: Vec<(String, AnimationClip)>,
    directional: Vec<DirectionalClip>,
}

impl TilesetEntry {
    pub(crate) fn from_document(doc: TilesetDocument, source: PathBuf, image: PathBuf) -> Self {
        let name = doc.name.filter(|n| !n.is_empty()).unwrap_or_else(|| {
            source
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

        let mut tiles = BTreeMap::new();
        let mut animations = Vec::new();
        let mut directional = Vec::new();

        for tile in doc.tiles {
            let properties = Properties::from_json(tile.properties);
            let animation = tile.animation.map(|frames| {
                AnimationClip::new(
                    frames
                        .into_iter()
                        .map(|f| AnimationFrame::from_millis(f.tileid, f.duration))
                        .collect(),
                )
            });

            if let Some(clip) = &animation {
                animations.push((format!("tile_{}", tile.id), clip.clone()));

                let direction = properties.get_str("direction").and_then(Direction::parse);
                let state = properties.get_str("state").and_then(MotionState::parse);
                if let (Some(direction), Some(state)) = (direction, state) {
                    directional.push(DirectionalClip {
                        direction,
                        state,
                        clip: clip.clone(),
                    });
                }
            }

            tiles.insert(
                tile.id,
                TileMetadata {
                    id: tile.id,
                    properties,
                    animation,
                },
            );
        }

        Self {
            name,
            source,
            columns: doc.columns.max(1),
            tile_count: doc.tilecount,
            tile_width: doc.tilewidth,
            tile_height: doc.tileheight,
            image,
            properties: Properties::from_json(doc.properties),
            tiles,
            animations,
            directional,
        }
    }

    pub fn tile(&self, local_id: u32) -> Option<&TileMetadata> {
        self.tiles.get(&local_id)
    }

    pub fn tiles(&self) -> impl Iterator<Item = &TileMetadata> {
        self.tiles.values()
    }

    /// Clips in the order their tiles appear in the document.
    pub fn animations(&self) -> impl Iterator<Item = (&str, &AnimationClip)> {
        self.animations.iter().map(|(name, clip)| (name.as_str(), clip))
    }

    /// Named clip, or the first clip when `name` is `None`.
    pub fn animation(&self, name: Option<&str>) -> Option<&AnimationClip> {
        match name {
            Some(name) => self
                .animations
                .iter()
                .find(|(clip_name, _)| clip_name == name)
                .map(|(_, clip)| clip),
            None => self.animations.first().map(|(_, clip)| clip),
        }
    }

    pub fn directional_clip(&self, direction: Direction, state: MotionState) -> Option<&AnimationClip> {
        self.directional
            .iter()
            .find(|d| d.direction == direction && d.state == state)
            .map(|d| &d.clip)
    }

    /// Pixel rectangle `[x, y, w, h]` of a local tile inside the tileset image.
    pub fn source_rect(&self, local_id: u32) -> [u32; 4] {
        let col = local_id % self.columns;
        let row = local_id / self.columns;
        [
            col.saturating_mul(self.tile_width),
            row.saturating_mul(self.tile_height),
            self.tile_width,
            self.tile_height,
        ]
    }
}

/// Read a JSON-family document from disk.
pub(crate) fn read_document(path: &Path) -> Result<String, MapError> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    if !DOCUMENT_EXTENSIONS.contains(&ext) {
        return Err(MapError::UnsupportedFormat(path.display().to_string()));
    }
    fs::read_to_string(path).map_err(|source| MapError::MissingAsset {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn parse_tileset_str(text: &str, path: &Path) -> Result<TilesetDocument, MapError> {
    serde_json::from_str(text).map_err(|source| MapError::MalformedDocument {
        path: path.to_path_buf(),
        source,
    })
}

const fn default_count() -> u32 {
    1
}

const fn default_tile_size() -> u32 {
    16
}

const fn default_frame_ms() -> u64 {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHARACTER_TILESET: &str = r#"{
      "name": "Hero",
      "columns": 4,
      "tilecount": 16,
      "tilewidth": 16,
      "tileheight": 16,
      "image": "hero.png",
      "tiles": [
        {
          "id": 5,
          "properties": [
            {"name":"direction","value":"down"},
            {"name":"state","value":"movement"}
          ],
          "animation": [{"tileid":4,"duration":150},{"tileid":5,"duration":150}]
        },
        {
          "id": 2,
          "properties": [{"name":"collidable","type":"string","value":"true"}],
          "animation": [{"tileid":2}]
        },
        { "id": 9, "properties": [{"name":"collidable","value":"false"}] }
      ]
    }"#;

    fn parse_entry(text: &str, source: &str) -> TilesetEntry {
        let path = PathBuf::from(source);
        let doc = parse_tileset_str(text, &path).expect("valid tileset");
        TilesetEntry::from_document(doc, path, PathBuf::from("hero.png"))
    }

    #[test]
    fn parses_dimensions_and_properties() {
        let entry = parse_entry(CHARACTER_TILESET, "sets/hero.tsj");
        assert_eq!(entry.name, "Hero");
        assert_eq!(entry.columns, 4);
        assert_eq!(entry.tile_count, 16);
        assert!(entry.tile(2).expect("tile 2").properties.flag("collidable"));
        assert!(!entry.tile(9).expect("tile 9").properties.flag("collidable"));
        assert!(entry.tile(3).is_none());
    }

    #[test]
    fn animations_keep_document_order_and_convert_durations() {
        let entry = parse_entry(CHARACTER_TILESET, "sets/hero.tsj");
        let names: Vec<&str> = entry.animations().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["tile_5", "tile_2"]);

        let first = entry.animation(None).expect("first clip");
        assert_eq!(first.tile_ids().collect::<Vec<_>>(), vec![4, 5]);
        assert!((first.total_duration_secs() - 0.3).abs() < 0.0001);

        let defaulted = entry.animation(Some("tile_2")).expect("tile_2 clip");
        assert_eq!(defaulted.frames[0].duration_us, 100_000);
        assert!(entry.animation(Some("tile_7")).is_none());
    }

    #[test]
    fn directional_clips_require_direction_and_state() {
        let entry = parse_entry(CHARACTER_TILESET, "sets/hero.tsj");
        assert!(entry
            .directional_clip(Direction::Down, MotionState::Movement)
            .is_some());
        assert!(entry
            .directional_clip(Direction::Up, MotionState::Movement)
            .is_none());
    }

    #[test]
    fn name_falls_back_to_file_stem() {
        let entry = parse_entry(r#"{"columns":2,"tilecount":4}"#, "sets/Grass.tsj");
        assert_eq!(entry.name, "Grass");
        assert_eq!(entry.tile_width, 16);
    }

    #[test]
    fn source_rect_walks_the_grid() {
        let entry = parse_entry(CHARACTER_TILESET, "sets/hero.tsj");
        assert_eq!(entry.source_rect(0), [0, 0, 16, 16]);
        assert_eq!(entry.source_rect(6), [32, 16, 16, 16]);

        let wide = parse_entry(
            r#"{"columns":1,"tilecount":2,"tilewidth":4294967295,"tileheight":4294967295}"#,
            "sets/wide.tsj",
        );
        assert_eq!(wide.source_rect(3), [0, u32::MAX, u32::MAX, u32::MAX]);
    }

    #[test]
    fn huge_frame_durations_saturate() {
        let entry = parse_entry(
            r#"{"columns":1,"tilecount":1,
                "tiles":[{"id":0,"animation":[{"tileid":0,"duration":18446744073709551615}]}]}"#,
            "sets/slow.tsj",
        );
        let clip = entry.animation(None).expect("clip");
        assert_eq!(clip.frames[0].duration_us, u64::MAX);
    }

    #[test]
    fn malformed_document_is_typed() {
        let err = parse_tileset_str("{ nope", Path::new("x.tsj")).expect_err("malformed");
        assert!(matches!(err, MapError::MalformedDocument { .. }));
    }

    #[test]
    fn non_json_extension_is_rejected() {
        let err = read_document(Path::new("legacy/map.tmx")).expect_err("tmx not supported");
        assert!(matches!(err, MapError::UnsupportedFormat(_)));
    }
}
