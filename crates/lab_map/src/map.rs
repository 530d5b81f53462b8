//! Map documents (`.tmj`/`.json`) and the loaded `MapModel`.
//!
//! Tile layers are row-major gid arrays; object layers carry free-form
//! rectangles, ellipses and polygons in pixels. Tilesets are resolved through
//! the catalog and remembered only by their catalog key.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use crate::catalog::{normalize_path, TilesetCatalog};
use crate::error::MapError;
use crate::properties::{JsonProperty, Properties};
use crate::tileset::{read_document, TilesetDocument, TilesetEntry};

/// Tiled stores flip/rotation flags in the top bits of each gid.
const GID_FLAG_MASK: u32 = 0xF000_0000;

/// Fill colour for tiles whose tileset could not be resolved.
pub const PLACEHOLDER_COLOR: [u8; 4] = [255, 0, 255, 255];

/// Largest map accepted, in cells (4096 x 4096).
pub const MAX_MAP_CELLS: u64 = 1 << 24;

#[derive(Debug, Deserialize)]
struct MapDocument {
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    #[serde(default = "default_tile_size")]
    tilewidth: u32,
    #[serde(default = "default_tile_size")]
    tileheight: u32,
    #[serde(default)]
    properties: Vec<JsonProperty>,
    #[serde(default)]
    tilesets: Vec<JsonTilesetRef>,
    #[serde(default)]
    layers: Vec<JsonLayer>,
}

#[derive(Debug, Deserialize)]
struct JsonTilesetRef {
    firstgid: u32,
    #[serde(default)]
    source: Option<String>,
    #[serde(flatten)]
    inline: TilesetDocument,
}

#[derive(Debug, Deserialize)]
struct JsonLayer {
    #[serde(default)]
    name: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default = "default_visible")]
    visible: bool,
    #[serde(default)]
    data: Vec<u32>,
    #[serde(default)]
    objects: Vec<JsonObject>,
    #[serde(default)]
    properties: Vec<JsonProperty>,
}

#[derive(Debug, Deserialize)]
struct JsonObject {
    #[serde(default)]
    id: u32,
    #[serde(default)]
    name: String,
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
    #[serde(default)]
    width: f32,
    #[serde(default)]
    height: f32,
    #[serde(default)]
    ellipse: bool,
    #[serde(default)]
    polygon: Option<Vec<ObjectPoint>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ObjectPoint {
    pub x: f32,
    pub y: f32,
}

/// Free-form object from an object layer, in map pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct MapObject {
    pub id: u32,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub ellipse: bool,
    /// Points relative to (`x`, `y`).
    pub polygon: Option<Vec<ObjectPoint>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayerKind {
    Tiles { data: Vec<u32> },
    Objects { objects: Vec<MapObject> },
    /// Image and group layers; kept so layer indices match the document.
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapLayer {
    pub name: String,
    pub visible: bool,
    pub properties: Properties,
    pub kind: LayerKind,
}

impl MapLayer {
    pub fn tile_data(&self) -> Option<&[u32]> {
        match &self.kind {
            LayerKind::Tiles { data } => Some(data.as_slice()),
            _ => None,
        }
    }

    pub fn objects(&self) -> Option<&[MapObject]> {
        match &self.kind {
            LayerKind::Objects { objects } => Some(objects.as_slice()),
            _ => None,
        }
    }
}

/// A gid whose tile carries an animation, for the tile animator.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimatedTile {
    pub gid: u32,
    pub local_id: u32,
    pub tileset: PathBuf,
}

/// How to draw one gid.
#[derive(Debug, Clone, PartialEq)]
pub enum TileVisual {
    Atlas { image: PathBuf, src_rect: [u32; 4] },
    Placeholder { color: [u8; 4], size: [u32; 2] },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapModel {
    pub path: PathBuf,
    /// Map size in tiles.
    pub width: u32,
    pub height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub properties: Properties,
    pub layers: Vec<MapLayer>,
    tilesets: BTreeMap<u32, PathBuf>,
    animated_tiles: BTreeMap<u32, AnimatedTile>,
}

impl MapModel {
    /// Load a map and its tilesets. Any failure is logged and yields an
    /// empty model, which callers treat as "no map loaded".
    pub fn load(path: &Path, catalog: &mut TilesetCatalog) -> Self {
        match Self::try_load(path, catalog) {
            Ok(map) => {
                log::info!(
                    "Loaded map {} ({}x{} tiles, {} layers, {} tilesets)",
                    path.display(),
                    map.width,
                    map.height,
                    map.layers.len(),
                    map.tilesets.len()
                );
                map
            }
            Err(err) => {
                log::error!("Error loading map {}: {err}", path.display());
                Self::empty(path)
            }
        }
    }

    pub fn try_load(path: &Path, catalog: &mut TilesetCatalog) -> Result<Self, MapError> {
        let full = catalog.asset_path(path);
        let text = read_document(&full)?;
        Self::parse(&text, path, catalog)
    }

    /// Parse map text. `path` is the project-relative location used to
    /// resolve tileset sources and to key inline tilesets.
    pub fn parse(text: &str, path: &Path, catalog: &mut TilesetCatalog) -> Result<Self, MapError> {
        let doc: MapDocument =
            serde_json::from_str(text).map_err(|source| MapError::MalformedDocument {
                path: path.to_path_buf(),
                source,
            })?;
        validate_dimensions(&doc, path)?;

        let map_dir = path.parent().unwrap_or_else(|| Path::new("")).to_path_buf();
        let mut map = Self {
            path: path.to_path_buf(),
            width: doc.width,
            height: doc.height,
            tile_width: doc.tilewidth,
            tile_height: doc.tileheight,
            properties: Properties::from_json(doc.properties),
            layers: doc.layers.into_iter().map(convert_layer).collect(),
            tilesets: BTreeMap::new(),
            animated_tiles: BTreeMap::new(),
        };

        for tileset_ref in doc.tilesets {
            let first_gid = tileset_ref.firstgid;
            let (key, entry) = match tileset_ref.source {
                Some(source) => {
                    let key = resolve_tileset_path(&source, &map_dir, catalog);
                    let entry = catalog.load(&key);
                    (key, entry)
                }
                None => {
                    let key = PathBuf::from(format!("{}#{first_gid}", path.display()));
                    let entry = catalog.register_inline(key.clone(), tileset_ref.inline, &map_dir);
                    (key, Some(entry))
                }
            };

            // Keep the key even when loading failed so gids in its range
            // resolve to a placeholder instead of the previous tileset.
            if let Some(entry) = entry {
                register_animated_tiles(&mut map.animated_tiles, first_gid, &key, entry);
            }
            map.tilesets.insert(first_gid, key);
        }

        Ok(map)
    }

    pub fn empty(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            ..Self::default()
        }
    }

    /// True for the fallback model produced by a failed load.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty() && self.width == 0 && self.height == 0
    }

    pub fn pixel_width(&self) -> u32 {
        self.width.saturating_mul(self.tile_width)
    }

    pub fn pixel_height(&self) -> u32 {
        self.height.saturating_mul(self.tile_height)
    }

    pub fn cell_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Gid at a cell with flip flags stripped. Out-of-range cells, non-tile
    /// layers and short data arrays all read as 0.
    pub fn tile_identifier_at(&self, layer: usize, x: i32, y: i32) -> u32 {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return 0;
        }
        let Some(data) = self.layers.get(layer).and_then(MapLayer::tile_data) else {
            return 0;
        };
        let idx = y as usize * self.width as usize + x as usize;
        data.get(idx).map_or(0, |gid| gid & !GID_FLAG_MASK)
    }

    /// `(first_gid, catalog key)` pairs in ascending gid order.
    pub fn tilesets(&self) -> impl Iterator<Item = (u32, &Path)> {
        self.tilesets.iter().map(|(gid, key)| (*gid, key.as_path()))
    }

    /// Tileset owning `gid`: the one with the largest first gid not above it.
    pub fn tileset_for_gid(&self, gid: u32) -> Option<(u32, &Path)> {
        let gid = gid & !GID_FLAG_MASK;
        if gid == 0 {
            return None;
        }
        self.tilesets
            .range(..=gid)
            .next_back()
            .map(|(first, key)| (*first, key.as_path()))
    }

    /// Resolve a gid to its tileset entry and local tile id.
    pub fn resolve_gid<'a>(&self, gid: u32, catalog: &'a TilesetCatalog) -> Option<(&'a TilesetEntry, u32)> {
        let gid = gid & !GID_FLAG_MASK;
        let (first_gid, key) = self.tileset_for_gid(gid)?;
        let entry = catalog.get(key)?;
        Some((entry, gid - first_gid))
    }

    /// `None` for empty cells; a placeholder when the tileset is missing.
    pub fn tile_visual(&self, gid: u32, catalog: &TilesetCatalog) -> Option<TileVisual> {
        if gid & !GID_FLAG_MASK == 0 {
            return None;
        }
        Some(match self.resolve_gid(gid, catalog) {
            Some((entry, local_id)) => TileVisual::Atlas {
                image: entry.image.clone(),
                src_rect: entry.source_rect(local_id),
            },
            None => TileVisual::Placeholder {
                color: PLACEHOLDER_COLOR,
                size: [self.tile_width, self.tile_height],
            },
        })
    }

    pub fn animated_tiles(&self) -> impl Iterator<Item = &AnimatedTile> {
        self.animated_tiles.values()
    }

    pub fn animated_tile(&self, gid: u32) -> Option<&AnimatedTile> {
        self.animated_tiles.get(&(gid & !GID_FLAG_MASK))
    }

    /// Every placement of `gid` as `(layer name, col, row)`.
    pub fn find_tile(&self, gid: u32) -> Vec<(String, u32, u32)> {
        let mut hits = Vec::new();
        if self.width == 0 {
            return hits;
        }
        for layer in &self.layers {
            let Some(data) = layer.tile_data() else {
                continue;
            };
            for (idx, raw) in data.iter().enumerate() {
                if raw & !GID_FLAG_MASK == gid {
                    let col = idx as u32 % self.width;
                    let row = idx as u32 / self.width;
                    hits.push((layer.name.clone(), col, row));
                }
            }
        }
        hits
    }
}

/// Resolve a tileset `source` from a map to a project-relative key.
///
/// Absolute and `data/` paths are used as given. Otherwise the map-relative
/// path wins when it exists; failing that, a path through a `tilesets`
/// folder is rebased onto `<asset root>/tilesets`, and anything else is
/// looked up by file name in that folder.
pub fn resolve_tileset_path(source: &str, map_dir: &Path, catalog: &TilesetCatalog) -> PathBuf {
    let source = source.replace('\\', "/");
    let path = Path::new(&source);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    if source.starts_with("data/") {
        return normalize_path(path);
    }

    let relative = normalize_path(&map_dir.join(path));
    if catalog.contains(&relative) || catalog.asset_path(&relative).is_file() {
        return relative;
    }

    let tilesets_root = catalog.options().asset_root.join("tilesets");
    let components: Vec<Component> = path.components().collect();
    if let Some(pos) = components.iter().rposition(|c| c.as_os_str() == "tilesets") {
        let rest: PathBuf = components[pos + 1..].iter().collect();
        return normalize_path(&tilesets_root.join(rest));
    }
    match path.file_name() {
        Some(name) => normalize_path(&tilesets_root.join(name)),
        None => relative,
    }
}

fn register_animated_tiles(
    animated: &mut BTreeMap<u32, AnimatedTile>,
    first_gid: u32,
    key: &Path,
    entry: &TilesetEntry,
) {
    for (name, _) in entry.animations() {
        let Some(local_id) = name.strip_prefix("tile_").and_then(|id| id.parse::<u32>().ok()) else {
            continue;
        };
        let Some(gid) = first_gid.checked_add(local_id) else {
            log::warn!(
                "Animated tile {local_id} of {} overflows gid space from first gid {first_gid}, skipping",
                key.display()
            );
            continue;
        };
        animated.insert(
            gid,
            AnimatedTile {
                gid,
                local_id,
                tileset: key.to_path_buf(),
            },
        );
    }
}

fn validate_dimensions(doc: &MapDocument, path: &Path) -> Result<(), MapError> {
    let invalid = |detail: String| MapError::InvalidLayerSize {
        path: path.to_path_buf(),
        detail,
    };
    if doc.width == 0 || doc.height == 0 || doc.tilewidth == 0 || doc.tileheight == 0 {
        return Err(invalid(format!(
            "{}x{} tiles of {}x{} px",
            doc.width, doc.height, doc.tilewidth, doc.tileheight
        )));
    }
    let cells = u64::from(doc.width) * u64::from(doc.height);
    if cells > MAX_MAP_CELLS {
        return Err(invalid(format!(
            "{}x{} tiles exceeds the {MAX_MAP_CELLS} cell limit",
            doc.width, doc.height
        )));
    }
    for layer in &doc.layers {
        if layer.kind == "tilelayer" && layer.data.len() as u64 > cells {
            return Err(invalid(format!(
                "layer '{}' holds {} cells for a {}x{} map",
                layer.name,
                layer.data.len(),
                doc.width,
                doc.height
            )));
        }
    }
    Ok(())
}

fn convert_layer(layer: JsonLayer) -> MapLayer {
    let kind = match layer.kind.as_str() {
        "tilelayer" => LayerKind::Tiles { data: layer.data },
        "objectgroup" => LayerKind::Objects {
            objects: layer
                .objects
                .into_iter()
                .map(|o| MapObject {
                    id: o.id,
                    name: o.name,
                    x: o.x,
                    y: o.y,
                    width: o.width,
                    height: o.height,
                    ellipse: o.ellipse,
                    polygon: o.polygon,
                })
                .collect(),
        },
        other => {
            log::debug!("Keeping layer '{}' of type '{other}' as inert", layer.name);
            LayerKind::Other
        }
    };
    MapLayer {
        name: layer.name,
        visible: layer.visible,
        properties: Properties::from_json(layer.properties),
        kind,
    }
}

const fn default_tile_size() -> u32 {
    16
}

const fn default_visible() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogOptions;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    const INLINE_MAP: &str = r#"{
      "width": 3, "height": 2, "tilewidth": 16, "tileheight": 16,
      "tilesets": [
        {"firstgid": 1, "name": "Grass", "columns": 2, "tilecount": 4,
         "tilewidth": 16, "tileheight": 16, "image": "grass.png",
         "tiles": [{"id": 2, "animation": [{"tileid": 2, "duration": 250}, {"tileid": 3, "duration": 250}]}]},
        {"firstgid": 5, "name": "Rocks", "columns": 1, "tilecount": 2,
         "tilewidth": 16, "tileheight": 16, "image": "static/rocks.png"}
      ],
      "layers": [
        {"type": "tilelayer", "name": "ground", "data": [1, 2, 3, 5, 2147483654, 0]},
        {"type": "objectgroup", "name": "Collision",
         "objects": [{"id": 7, "x": 4, "y": 4, "width": 8, "height": 8, "ellipse": true}]},
        {"type": "imagelayer", "name": "sky"}
      ]
    }"#;

    fn parse_inline() -> (MapModel, TilesetCatalog) {
        let mut catalog = TilesetCatalog::default();
        let map = MapModel::parse(INLINE_MAP, Path::new("data/assets/maps/inline.tmj"), &mut catalog)
            .expect("inline map parses");
        (map, catalog)
    }

    fn temp_dir_path(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after epoch")
            .as_nanos();
        std::env::temp_dir().join(format!("lab_map_{name_hint}_{}_{}", std::process::id(), nanos))
    }

    #[test]
    fn parses_layers_and_dimensions() {
        let (map, _) = parse_inline();
        assert_eq!((map.width, map.height), (3, 2));
        assert_eq!((map.pixel_width(), map.pixel_height()), (48, 32));
        assert_eq!(map.layers.len(), 3);
        assert_eq!(map.layers[2].kind, LayerKind::Other);
        let objects = map.layers[1].objects().expect("object layer");
        assert!(objects[0].ellipse);
        assert!(!map.is_empty());
    }

    #[test]
    fn tile_identifier_is_bounds_checked_and_unflipped() {
        let (map, _) = parse_inline();
        assert_eq!(map.tile_identifier_at(0, 0, 0), 1);
        assert_eq!(map.tile_identifier_at(0, 0, 1), 5);
        assert_eq!(map.tile_identifier_at(0, 1, 1), 6);
        assert_eq!(map.tile_identifier_at(0, 3, 0), 0);
        assert_eq!(map.tile_identifier_at(0, -1, 0), 0);
        assert_eq!(map.tile_identifier_at(1, 0, 0), 0);
        assert_eq!(map.tile_identifier_at(9, 0, 0), 0);
    }

    #[test]
    fn gids_resolve_to_largest_first_gid_not_above() {
        let (map, catalog) = parse_inline();
        assert_eq!(map.tileset_for_gid(0), None);
        assert_eq!(map.tileset_for_gid(4).map(|(first, _)| first), Some(1));
        assert_eq!(map.tileset_for_gid(6).map(|(first, _)| first), Some(5));

        let (entry, local) = map.resolve_gid(6, &catalog).expect("gid 6 resolves");
        assert_eq!(entry.name, "Rocks");
        assert_eq!(local, 1);
        assert_eq!(entry.image, PathBuf::from("data/assets/tilesets/static/rocks.png"));
    }

    #[test]
    fn inline_tilesets_are_keyed_by_map_and_first_gid() {
        let (map, catalog) = parse_inline();
        let keys: Vec<_> = map.tilesets().map(|(_, key)| key.to_path_buf()).collect();
        assert_eq!(keys[0], PathBuf::from("data/assets/maps/inline.tmj#1"));
        assert!(catalog.get(&keys[1]).is_some());
    }

    #[test]
    fn animated_tiles_are_registered_at_global_ids() {
        let (map, _) = parse_inline();
        let animated: Vec<u32> = map.animated_tiles().map(|t| t.gid).collect();
        assert_eq!(animated, vec![3]);
        assert_eq!(map.animated_tile(3).map(|t| t.local_id), Some(2));
    }

    #[test]
    fn tile_visual_uses_atlas_or_placeholder() {
        let (map, catalog) = parse_inline();
        assert_eq!(map.tile_visual(0, &catalog), None);
        assert_eq!(
            map.tile_visual(4, &catalog),
            Some(TileVisual::Atlas {
                image: PathBuf::from("data/assets/maps/grass.png"),
                src_rect: [16, 16, 16, 16],
            })
        );

        let mut empty_catalog = TilesetCatalog::default();
        let mut broken = map.clone();
        broken.tilesets.insert(1, PathBuf::from("missing.tsj"));
        assert!(empty_catalog.load(Path::new("missing.tsj")).is_none());
        assert_eq!(
            broken.tile_visual(1, &empty_catalog),
            Some(TileVisual::Placeholder {
                color: PLACEHOLDER_COLOR,
                size: [16, 16],
            })
        );
    }

    #[test]
    fn find_tile_lists_every_placement() {
        let (map, _) = parse_inline();
        assert_eq!(map.find_tile(2), vec![("ground".to_string(), 1, 0)]);
        assert!(map.find_tile(4).is_empty());
    }

    #[test]
    fn missing_or_corrupt_map_loads_empty() {
        let root = temp_dir_path("map_corrupt");
        fs::create_dir_all(&root).expect("create temp dir");
        fs::write(root.join("bad.tmj"), "{ not json").expect("write map");

        let mut catalog = TilesetCatalog::new(CatalogOptions {
            project_root: root.clone(),
            ..CatalogOptions::default()
        });
        assert!(MapModel::load(Path::new("bad.tmj"), &mut catalog).is_empty());
        assert!(MapModel::load(Path::new("gone.tmj"), &mut catalog).is_empty());
        assert!(matches!(
            MapModel::try_load(Path::new("bad.tmj"), &mut catalog),
            Err(MapError::MalformedDocument { .. })
        ));

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn impossible_dimensions_are_rejected() {
        let mut catalog = TilesetCatalog::default();
        let path = Path::new("data/assets/maps/huge.tmj");
        for text in [
            r#"{"width":4000000000,"height":4000000000,"layers":[]}"#,
            r#"{"width":0,"height":5,"layers":[]}"#,
            r#"{"width":2,"height":2,"tilewidth":0,"layers":[]}"#,
            r#"{"width":2,"height":1,"layers":[{"type":"tilelayer","name":"g","data":[1,1,1]}]}"#,
        ] {
            let err = MapModel::parse(text, path, &mut catalog).expect_err("dimensions should be rejected");
            assert!(matches!(err, MapError::InvalidLayerSize { .. }), "unexpected error {err}");
        }
    }

    #[test]
    fn oversized_map_file_loads_empty() {
        let root = temp_dir_path("map_oversized");
        fs::create_dir_all(&root).expect("create temp dir");
        fs::write(
            root.join("huge.tmj"),
            r#"{"width":4000000000,"height":4000000000,"tilewidth":16,"tileheight":16,"layers":[]}"#,
        )
        .expect("write map");

        let mut catalog = TilesetCatalog::new(CatalogOptions {
            project_root: root.clone(),
            ..CatalogOptions::default()
        });
        let map = MapModel::load(Path::new("huge.tmj"), &mut catalog);
        assert!(map.is_empty());
        assert_eq!(map.cell_count(), 0);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn animated_tiles_past_gid_space_are_skipped() {
        let text = r#"{
          "width": 1, "height": 1,
          "tilesets": [{"firstgid": 4294967295, "name": "Edge", "columns": 4, "tilecount": 4,
            "tiles": [{"id": 2, "animation": [{"tileid": 2}, {"tileid": 3}]}]}],
          "layers": [{"type": "tilelayer", "name": "g", "data": [0]}]
        }"#;
        let mut catalog = TilesetCatalog::default();
        let map = MapModel::parse(text, Path::new("edge.tmj"), &mut catalog).expect("map parses");
        assert_eq!(map.animated_tiles().count(), 0);
        assert_eq!(map.tilesets().count(), 1);
    }

    #[test]
    fn pixel_size_saturates() {
        let map = MapModel {
            width: 4096,
            height: 2,
            tile_width: u32::MAX,
            tile_height: 16,
            ..MapModel::default()
        };
        assert_eq!(map.pixel_width(), u32::MAX);
        assert_eq!(map.pixel_height(), 32);
    }

    #[test]
    fn tileset_sources_fall_back_to_asset_tilesets_folder() {
        let catalog = TilesetCatalog::default();
        let map_dir = Path::new("data/assets/maps");
        assert_eq!(
            resolve_tileset_path("../../old/tilesets/static/Grass.tsj", map_dir, &catalog),
            PathBuf::from("data/assets/tilesets/static/Grass.tsj")
        );
        assert_eq!(
            resolve_tileset_path("C:\\art\\Fence.tsj", map_dir, &catalog),
            PathBuf::from("data/assets/tilesets/Fence.tsj")
        );
        assert_eq!(
            resolve_tileset_path("data/shared/Trees.tsj", map_dir, &catalog),
            PathBuf::from("data/shared/Trees.tsj")
        );
    }

    #[test]
    fn external_tileset_resolves_through_parent_segments() {
        let root = temp_dir_path("map_external");
        fs::create_dir_all(root.join("data/assets/maps")).expect("create maps dir");
        fs::create_dir_all(root.join("data/assets/tilesets")).expect("create tilesets dir");
        fs::write(
            root.join("data/assets/tilesets/Water.tsj"),
            r#"{"name":"Water","columns":1,"tilecount":2,"image":"static/water.png"}"#,
        )
        .expect("write tileset");
        fs::write(
            root.join("data/assets/maps/lake.tmj"),
            r#"{"width":1,"height":1,"tilesets":[{"firstgid":1,"source":"../tilesets/Water.tsj"},
                {"firstgid":3,"source":"Elsewhere/Water.tsj"}],
               "layers":[{"type":"tilelayer","name":"water","data":[1]}]}"#,
        )
        .expect("write map");

        let mut catalog = TilesetCatalog::new(CatalogOptions {
            project_root: root.clone(),
            ..CatalogOptions::default()
        });
        let map = MapModel::load(Path::new("data/assets/maps/lake.tmj"), &mut catalog);
        let keys: Vec<_> = map.tilesets().map(|(_, key)| key.to_path_buf()).collect();
        let expected = PathBuf::from("data/assets/tilesets/Water.tsj");
        assert_eq!(keys, vec![expected.clone(), expected.clone()]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(&expected).map(|e| e.name.as_str()), Some("Water"));

        let _ = fs::remove_dir_all(&root);
    }
}
