//! Uniform-grid broad phase for collision shapes.
//!
//! Cells are square and measured in pixels, independent of tile size. A
//! shape index is stored in every cell its bounding box touches, so a point
//! query only has to look at the single cell containing the point. Shapes
//! whose box would span more than [`MAX_CELLS_PER_SHAPE`] cells go on a
//! shared list that every query also checks.

use std::collections::HashMap;

use crate::shape::Bounds;

pub const MAX_CELLS_PER_SHAPE: u64 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<CellKey, Vec<usize>>,
    oversized: Vec<usize>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            log::warn!("Invalid broad-phase cell size {cell_size}, using 64");
            64.0
        };
        Self {
            cell_size,
            cells: HashMap::new(),
            oversized: Vec::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn cell_of(&self, x: f32, y: f32) -> CellKey {
        CellKey {
            x: (x / self.cell_size).floor() as i32,
            y: (y / self.cell_size).floor() as i32,
        }
    }

    /// Register `index` in every cell overlapped by `bounds` (pixels).
    pub fn insert(&mut self, index: usize, bounds: Bounds) {
        let min = self.cell_of(bounds.min_x, bounds.min_y);
        let max = self.cell_of(bounds.max_x, bounds.max_y);
        let span_x = (i64::from(max.x) - i64::from(min.x) + 1).max(0) as u64;
        let span_y = (i64::from(max.y) - i64::from(min.y) + 1).max(0) as u64;
        if span_x.saturating_mul(span_y) > MAX_CELLS_PER_SHAPE {
            log::debug!("Shape {index} spans {span_x}x{span_y} broad-phase cells, listing it as oversized");
            self.oversized.push(index);
            return;
        }
        for cy in min.y..=max.y {
            for cx in min.x..=max.x {
                self.cells
                    .entry(CellKey { x: cx, y: cy })
                    .or_default()
                    .push(index);
            }
        }
    }

    /// Shape indices registered in the cell containing (`x`, `y`), followed
    /// by every oversized shape.
    pub fn candidates(&self, x: f32, y: f32) -> impl Iterator<Item = usize> + '_ {
        self.cells
            .get(&self.cell_of(x, y))
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .chain(&self.oversized)
            .copied()
    }

    pub fn oversized(&self) -> &[usize] {
        &self.oversized
    }

    pub fn occupied_cells(&self) -> impl Iterator<Item = (CellKey, &[usize])> {
        self.cells.iter().map(|(key, indices)| (*key, indices.as_slice()))
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty() && self.oversized.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Bounds {
        Bounds { min_x, min_y, max_x, max_y }
    }

    #[test]
    fn shape_lands_in_every_overlapped_cell() {
        let mut grid = SpatialGrid::new(64.0);
        grid.insert(0, bounds(60.0, 10.0, 130.0, 70.0));
        assert_eq!(grid.cell_count(), 6);
        for (x, y) in [(10.0, 10.0), (100.0, 10.0), (129.0, 69.0), (70.0, 65.0)] {
            assert_eq!(grid.candidates(x, y).collect::<Vec<_>>(), vec![0], "missing at ({x}, {y})");
        }
        assert_eq!(grid.candidates(200.0, 10.0).count(), 0);
    }

    #[test]
    fn negative_coordinates_floor_into_their_own_cell() {
        let grid = SpatialGrid::new(32.0);
        assert_eq!(grid.cell_of(-0.5, -33.0), CellKey { x: -1, y: -2 });
        assert_eq!(grid.cell_of(31.9, 32.0), CellKey { x: 0, y: 1 });
    }

    #[test]
    fn shared_cells_list_all_shapes() {
        let mut grid = SpatialGrid::new(16.0);
        grid.insert(0, bounds(0.0, 0.0, 8.0, 8.0));
        grid.insert(3, bounds(4.0, 4.0, 12.0, 12.0));
        assert_eq!(grid.candidates(5.0, 5.0).collect::<Vec<_>>(), vec![0, 3]);
    }

    #[test]
    fn huge_shapes_skip_the_cell_map() {
        let mut grid = SpatialGrid::new(64.0);
        grid.insert(0, bounds(10.0, 10.0, 20.0, 20.0));
        grid.insert(1, bounds(-1.0e9, -1.0e9, 1.0e9, 1.0e9));
        grid.insert(2, bounds(0.0, 0.0, 3_200_000.0, 16.0));

        assert_eq!(grid.cell_count(), 1);
        assert_eq!(grid.oversized(), &[1, 2]);
        assert_eq!(grid.candidates(12.0, 12.0).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(grid.candidates(-5.0e8, 7.0).collect::<Vec<_>>(), vec![1, 2]);
        assert!(!grid.is_empty());
    }

    #[test]
    fn invalid_cell_size_falls_back() {
        assert_eq!(SpatialGrid::new(0.0).cell_size(), 64.0);
        assert_eq!(SpatialGrid::new(f32::NAN).cell_size(), 64.0);
    }
}
