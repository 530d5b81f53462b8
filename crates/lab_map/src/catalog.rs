//! Shared tileset cache.
//!
//! The catalog owns every `TilesetEntry`; maps only remember which key their
//! tilesets were loaded under. Loads are idempotent: a second `load` of the
//! same path returns the cached entry without touching disk. Failed loads
//! are logged and not cached, so a fixed file is picked up on the next try.

use lab_core::animation::AnimationClip;
use lab_core::config::GameConfig;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use crate::error::MapError;
use crate::tileset::{parse_tileset_str, read_document, TilesetDocument, TilesetEntry};

/// Rewrites tileset image paths that start with `prefix` to live under
/// `<asset root>/<replacement>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePrefixRule {
    pub prefix: String,
    pub replacement: String,
}

impl ImagePrefixRule {
    pub fn new(prefix: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            replacement: replacement.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogOptions {
    /// Directory every relative asset path is resolved against.
    pub project_root: PathBuf,
    /// Asset root, relative to the project root.
    pub asset_root: PathBuf,
    pub image_prefix_rules: Vec<ImagePrefixRule>,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            asset_root: PathBuf::from("data/assets"),
            image_prefix_rules: default_prefix_rules(),
        }
    }
}

impl CatalogOptions {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            project_root: PathBuf::from(&config.project_root),
            asset_root: PathBuf::from(&config.asset_root),
            image_prefix_rules: default_prefix_rules(),
        }
    }

    /// Map a project-relative path onto the filesystem.
    pub fn asset_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            normalize_path(path)
        } else {
            normalize_path(&self.project_root.join(path))
        }
    }

    /// Resolve a tileset image reference. Prefix rules move known folders
    /// under the asset root; absolute and `data/` paths are kept; anything
    /// else is relative to the tileset's own directory.
    pub fn resolve_image_path(&self, image: &str, tileset_dir: &Path) -> PathBuf {
        let normalized = image.replace('\\', "/");
        for rule in &self.image_prefix_rules {
            if let Some(rest) = normalized.strip_prefix(rule.prefix.as_str()) {
                let relocated = self.asset_root.join(&rule.replacement).join(rest);
                return normalize_path(&relocated);
            }
        }

        let path = Path::new(&normalized);
        if path.is_absolute() || normalized.starts_with("data/") {
            return path.to_path_buf();
        }
        normalize_path(&tileset_dir.join(path))
    }

    fn read_tileset(&self, key: &Path) -> Result<TilesetEntry, MapError> {
        let full = self.asset_path(key);
        let text = read_document(&full)?;
        let doc = parse_tileset_str(&text, &full)?;
        let base_dir = key.parent().unwrap_or_else(|| Path::new(""));
        let image = self.resolve_image_path(&doc.image, base_dir);
        Ok(TilesetEntry::from_document(doc, key.to_path_buf(), image))
    }
}

fn default_prefix_rules() -> Vec<ImagePrefixRule> {
    vec![
        ImagePrefixRule::new("static/", "tilesets/static/"),
        ImagePrefixRule::new("animated/", "tilesets/animated/"),
    ]
}

#[derive(Debug, Default)]
pub struct TilesetCatalog {
    options: CatalogOptions,
    tilesets: HashMap<PathBuf, TilesetEntry>,
}

impl TilesetCatalog {
    pub fn new(options: CatalogOptions) -> Self {
        Self {
            options,
            tilesets: HashMap::new(),
        }
    }

    pub fn options(&self) -> &CatalogOptions {
        &self.options
    }

    /// Load (or fetch from cache) the tileset at a project-relative path.
    /// Returns `None` after logging when the file is missing or malformed.
    pub fn load(&mut self, path: &Path) -> Option<&TilesetEntry> {
        let cached = self.contains(&normalize_path(path));
        match self.try_load(path) {
            Ok(entry) => {
                if !cached {
                    log::info!(
                        "Loaded tileset '{}' ({} tiles) from {}",
                        entry.name,
                        entry.tile_count,
                        entry.source.display()
                    );
                }
                Some(entry)
            }
            Err(err) => {
                log::error!("Error loading tileset {}: {err}", path.display());
                None
            }
        }
    }

    /// Load without the fail-soft wrapper.
    pub fn try_load(&mut self, path: &Path) -> Result<&TilesetEntry, MapError> {
        match self.tilesets.entry(normalize_path(path)) {
            Entry::Occupied(cached) => Ok(cached.into_mut()),
            Entry::Vacant(slot) => {
                let entry = self.options.read_tileset(slot.key())?;
                Ok(slot.insert(entry))
            }
        }
    }

    pub fn get(&self, key: &Path) -> Option<&TilesetEntry> {
        self.tilesets.get(key)
    }

    pub fn contains(&self, key: &Path) -> bool {
        self.tilesets.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.tilesets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tilesets.is_empty()
    }

    /// Clip from a tileset, loading the tileset if needed. `None` picks the
    /// first clip in document order.
    pub fn get_animation(&mut self, path: &Path, clip_name: Option<&str>) -> Option<&AnimationClip> {
        let entry = self.load(path)?;
        let clip = entry.animation(clip_name);
        if clip.is_none() {
            log::warn!(
                "Tileset {} has no animation {}",
                path.display(),
                clip_name.unwrap_or("(any)")
            );
        }
        clip
    }

    /// Register a tileset embedded in a map document under a synthetic key.
    pub(crate) fn register_inline(&mut self, key: PathBuf, doc: TilesetDocument, base_dir: &Path) -> &TilesetEntry {
        let image = self.resolve_image_path(&doc.image, base_dir);
        let entry = TilesetEntry::from_document(doc, key.clone(), image);
        self.tilesets.entry(key).or_insert(entry)
    }

    pub fn asset_path(&self, path: &Path) -> PathBuf {
        self.options.asset_path(path)
    }

    pub fn resolve_image_path(&self, image: &str, tileset_dir: &Path) -> PathBuf {
        self.options.resolve_image_path(image, tileset_dir)
    }
}

/// Lexically collapse `.` and `..` components.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let last_is_normal =
                    matches!(out.components().next_back(), Some(Component::Normal(_)));
                if last_is_normal {
                    out.pop();
                } else {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
