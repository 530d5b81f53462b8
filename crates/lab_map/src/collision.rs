//! Collision index: gameplay truth derived from a loaded map.
//!
//! Two tiers answer "is this pixel blocked":
//!  1. **Dense tile grid**: one bool per map cell, set where a visible tile
//!     layer places a collidable gid. O(1) lookup, hit on almost every query.
//!  2. **Shape broad phase**: rectangles, ellipses and polygons from
//!     object layers named like `collision`, bucketed in a uniform pixel grid.
//!     Only shapes registered in the query point's own cell get an exact test.
//!
//! The index is immutable once built. A map change builds a fresh index and
//! swaps it in whole, so readers never see a half-built state.

use lab_core::config::GameConfig;
use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use crate::catalog::TilesetCatalog;
use crate::map::{MapLayer, MapModel, MAX_MAP_CELLS};
use crate::shape::CollisionShape;
use crate::spatial::SpatialGrid;

#[derive(Debug, Clone, PartialEq)]
pub struct CollisionRules {
    /// Tilesets whose every tile blocks, whatever their per-tile flags say.
    /// Content quirk: some sets tag only one representative tile.
    pub fully_collidable_tilesets: Vec<String>,
    /// Object layers whose name contains this (case-insensitive) hold shapes.
    pub collision_layer_keyword: String,
    /// Broad-phase cell edge in pixels.
    pub broadphase_cell_size: f32,
}

impl Default for CollisionRules {
    fn default() -> Self {
        Self {
            fully_collidable_tilesets: vec!["Water".to_string()],
            collision_layer_keyword: "collision".to_string(),
            broadphase_cell_size: 64.0,
        }
    }
}

impl CollisionRules {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            fully_collidable_tilesets: config.fully_collidable_tilesets.clone(),
            collision_layer_keyword: config.collision_layer_keyword.clone(),
            broadphase_cell_size: config.broadphase_cell_size,
        }
    }

    fn is_collision_layer(&self, layer: &MapLayer) -> bool {
        layer
            .name
            .to_lowercase()
            .contains(&self.collision_layer_keyword.to_lowercase())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollisionIndex {
    rules: CollisionRules,
    width: u32,
    height: u32,
    tile_width: f32,
    tile_height: f32,
    /// Gids flagged collidable one tile at a time.
    collidable: BTreeSet<u32>,
    /// Gid ranges of tilesets that block as a whole.
    collidable_ranges: Vec<RangeInclusive<u32>>,
    /// Tile-only occupancy, row-major.
    tile_cells: Vec<bool>,
    /// Cells touched by a shape's bounding box, row-major.
    shape_cells: Vec<bool>,
    shapes: Vec<CollisionShape>,
    broadphase: SpatialGrid,
}

impl CollisionIndex {
    /// An index with no map: nothing is blocked and no bounds are known.
    pub fn empty(rules: CollisionRules) -> Self {
        Self {
            broadphase: SpatialGrid::new(rules.broadphase_cell_size),
            rules,
            width: 0,
            height: 0,
            tile_width: 16.0,
            tile_height: 16.0,
            collidable: BTreeSet::new(),
            collidable_ranges: Vec::new(),
            tile_cells: Vec::new(),
            shape_cells: Vec::new(),
            shapes: Vec::new(),
        }
    }

    pub fn build(map: &MapModel, catalog: &TilesetCatalog, rules: &CollisionRules) -> Self {
        let mut index = Self::empty(rules.clone());
        if map.is_empty() {
            log::warn!("Building collision index for empty map {}", map.path.display());
            return index;
        }
        if map.cell_count() > MAX_MAP_CELLS {
            log::error!(
                "Map {} is {}x{} tiles, over the {MAX_MAP_CELLS} cell limit; building no collision",
                map.path.display(),
                map.width,
                map.height
            );
            return index;
        }

        index.width = map.width;
        index.height = map.height;
        index.tile_width = map.tile_width.max(1) as f32;
        index.tile_height = map.tile_height.max(1) as f32;

        index.collect_collidable_gids(map, catalog);
        index.extract_shapes(map);
        index.fill_tile_cells(map);
        index.register_shapes();

        log::info!(
            "Collision index for {}: {} collidable gids, {} blocked cells, {} shapes in {} broad-phase cells",
            map.path.display(),
            index.collidable_gid_count(),
            index.tile_cells.iter().filter(|c| **c).count(),
            index.shapes.len(),
            index.broadphase.cell_count()
        );
        index
    }

    /// Full recomputation under the same rules.
    pub fn rebuild(&mut self, map: &MapModel, catalog: &TilesetCatalog) {
        *self = Self::build(map, catalog, &self.rules);
    }

    fn collect_collidable_gids(&mut self, map: &MapModel, catalog: &TilesetCatalog) {
        for (first_gid, key) in map.tilesets() {
            let Some(tileset) = catalog.get(key) else {
                log::warn!("Tileset {} not loaded; its tiles will not collide", key.display());
                continue;
            };

            let whole_set = tileset.properties.flag("collidable")
                || self
                    .rules
                    .fully_collidable_tilesets
                    .iter()
                    .any(|name| *name == tileset.name);
            if whole_set && tileset.tile_count > 0 {
                let last = first_gid.saturating_add(tileset.tile_count - 1);
                self.collidable_ranges.push(first_gid..=last);
            }

            for tile in tileset.tiles() {
                if !tile.properties.flag("collidable") {
                    continue;
                }
                match first_gid.checked_add(tile.id) {
                    Some(gid) => {
                        self.collidable.insert(gid);
                    }
                    None => log::warn!(
                        "Tile {} of {} overflows gid space from first gid {first_gid}, skipping",
                        tile.id,
                        key.display()
                    ),
                }
            }
        }
    }

    fn extract_shapes(&mut self, map: &MapModel) {
        for layer in &map.layers {
            let Some(objects) = layer.objects() else {
                continue;
            };
            if !self.rules.is_collision_layer(layer) {
                continue;
            }
            self.shapes.extend(
                objects
                    .iter()
                    .filter_map(|o| CollisionShape::from_object(o, self.tile_width, self.tile_height)),
            );
        }
    }

    fn fill_tile_cells(&mut self, map: &MapModel) {
        let cell_count = self.width as usize * self.height as usize;
        self.tile_cells = vec![false; cell_count];
        for (layer_idx, layer) in map.layers.iter().enumerate() {
            if !layer.visible || layer.tile_data().is_none() {
                continue;
            }
            for row in 0..self.height as i32 {
                for col in 0..self.width as i32 {
                    let gid = map.tile_identifier_at(layer_idx, col, row);
                    if gid != 0 && self.is_tile_collidable(gid) {
                        self.tile_cells[row as usize * self.width as usize + col as usize] = true;
                    }
                }
            }
        }
    }

    fn register_shapes(&mut self) {
        let cell_count = self.width as usize * self.height as usize;
        self.shape_cells = vec![false; cell_count];
        for (idx, shape) in self.shapes.iter().enumerate() {
            let bounds = shape.bounds();
            self.broadphase
                .insert(idx, bounds.scaled(self.tile_width, self.tile_height));

            let col0 = bounds.min_x.floor().max(0.0) as u32;
            let row0 = bounds.min_y.floor().max(0.0) as u32;
            let col1 = (bounds.max_x.ceil().max(0.0) as u32).min(self.width);
            let row1 = (bounds.max_y.ceil().max(0.0) as u32).min(self.height);
            for row in row0..row1 {
                for col in col0..col1 {
                    self.shape_cells[(row * self.width + col) as usize] = true;
                }
            }
        }
    }

    /// Point query in map pixels.
    pub fn is_blocked(&self, x: f32, y: f32) -> bool {
        if let Some(idx) = self.cell_index_at(x, y) {
            if self.tile_cells[idx] {
                return true;
            }
        }

        let (tx, ty) = (x / self.tile_width, y / self.tile_height);
        self.broadphase
            .candidates(x, y)
            .any(|i| self.shapes.get(i).is_some_and(|s| s.contains(tx, ty)))
    }

    pub fn is_tile_collidable(&self, gid: u32) -> bool {
        self.collidable.contains(&gid) || self.collidable_ranges.iter().any(|r| r.contains(&gid))
    }

    /// A cell is occupied by a collidable tile or by any shape's bounding box.
    pub fn is_cell_occupied(&self, col: i32, row: i32) -> bool {
        self.cell_index(col, row)
            .is_some_and(|idx| self.tile_cells[idx] || self.shape_cells[idx])
    }

    /// Occupied by a collidable tile only.
    pub fn is_tile_cell_blocked(&self, col: i32, row: i32) -> bool {
        self.cell_index(col, row).is_some_and(|idx| self.tile_cells[idx])
    }

    /// Combined occupancy, row-major, `width * height` entries.
    pub fn occupancy(&self) -> Vec<bool> {
        self.tile_cells
            .iter()
            .zip(&self.shape_cells)
            .map(|(tile, shape)| *tile || *shape)
            .collect()
    }

    pub fn shapes(&self) -> &[CollisionShape] {
        &self.shapes
    }

    pub fn broadphase(&self) -> &SpatialGrid {
        &self.broadphase
    }

    /// Number of distinct collidable gids.
    pub fn collidable_gid_count(&self) -> u64 {
        let mut ranges: Vec<(u64, u64)> = self
            .collidable_ranges
            .iter()
            .map(|r| (u64::from(*r.start()), u64::from(*r.end())))
            .collect();
        ranges.sort_unstable();
        let mut count = 0;
        let mut covered_to: Option<u64> = None;
        for (start, end) in ranges {
            let start = covered_to.map_or(start, |c| start.max(c + 1));
            if start <= end {
                count += end - start + 1;
            }
            covered_to = Some(covered_to.map_or(end, |c| c.max(end)));
        }
        let singles = self
            .collidable
            .iter()
            .filter(|gid| !self.collidable_ranges.iter().any(|r| r.contains(gid)))
            .count() as u64;
        count + singles
    }

    pub fn rules(&self) -> &CollisionRules {
        &self.rules
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_size(&self) -> (f32, f32) {
        (self.tile_width, self.tile_height)
    }

    /// Map extent in pixels, or `None` when no map is loaded.
    pub fn map_pixel_size(&self) -> Option<(f32, f32)> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        Some((
            self.width as f32 * self.tile_width,
            self.height as f32 * self.tile_height,
        ))
    }

    fn cell_index_at(&self, x: f32, y: f32) -> Option<usize> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let col = (x / self.tile_width).floor();
        let row = (y / self.tile_height).floor();
        if col < 0.0 || row < 0.0 || col >= self.width as f32 || row >= self.height as f32 {
            return None;
        }
        Some(row as usize * self.width as usize + col as usize)
    }

    fn cell_index(&self, col: i32, row: i32) -> Option<usize> {
        if col < 0 || row < 0 || col as u32 >= self.width || row as u32 >= self.height {
            return None;
        }
        Some(row as usize * self.width as usize + col as usize)
    }
}
