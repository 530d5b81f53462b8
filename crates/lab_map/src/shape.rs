//! Free-form collision shapes in tile-fractional coordinates.

use crate::map::MapObject;

/// Axis-aligned box, `min` inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn scaled(self, sx: f32, sy: f32) -> Self {
        Self {
            min_x: self.min_x * sx,
            min_y: self.min_y * sy,
            max_x: self.max_x * sx,
            max_y: self.max_y * sy,
        }
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }
}

/// 1.0 unit = one tile on each axis.
#[derive(Debug, Clone, PartialEq)]
pub enum CollisionShape {
    Rectangle { x: f32, y: f32, w: f32, h: f32 },
    Ellipse { x: f32, y: f32, w: f32, h: f32 },
    Polygon { points: Vec<(f32, f32)> },
}

impl CollisionShape {
    /// Convert a pixel-space map object. Polygons win over the box fields;
    /// zero-area boxes are markers and produce no shape.
    pub fn from_object(object: &MapObject, tile_width: f32, tile_height: f32) -> Option<Self> {
        if let Some(points) = object.polygon.as_ref().filter(|p| !p.is_empty()) {
            return Some(CollisionShape::Polygon {
                points: points
                    .iter()
                    .map(|p| ((object.x + p.x) / tile_width, (object.y + p.y) / tile_height))
                    .collect(),
            });
        }

        if object.width == 0.0 || object.height == 0.0 {
            return None;
        }

        let (x, y) = (object.x / tile_width, object.y / tile_height);
        let (w, h) = (object.width / tile_width, object.height / tile_height);
        Some(if object.ellipse {
            CollisionShape::Ellipse { x, y, w, h }
        } else {
            CollisionShape::Rectangle { x, y, w, h }
        })
    }

    pub fn bounds(&self) -> Bounds {
        match self {
            CollisionShape::Rectangle { x, y, w, h } | CollisionShape::Ellipse { x, y, w, h } => Bounds {
                min_x: *x,
                min_y: *y,
                max_x: x + w,
                max_y: y + h,
            },
            CollisionShape::Polygon { points } => {
                let mut bounds = Bounds {
                    min_x: f32::INFINITY,
                    min_y: f32::INFINITY,
                    max_x: f32::NEG_INFINITY,
                    max_y: f32::NEG_INFINITY,
                };
                for &(px, py) in points {
                    bounds.min_x = bounds.min_x.min(px);
                    bounds.min_y = bounds.min_y.min(py);
                    bounds.max_x = bounds.max_x.max(px);
                    bounds.max_y = bounds.max_y.max(py);
                }
                bounds
            }
        }
    }

    /// Exact containment for a point in tile-fractional coordinates.
    pub fn contains(&self, px: f32, py: f32) -> bool {
        match self {
            CollisionShape::Rectangle { x, y, w, h } => {
                px >= *x && px < x + w && py >= *y && py < y + h
            }
            CollisionShape::Ellipse { x, y, w, h } => {
                if *w <= 0.0 || *h <= 0.0 {
                    return false;
                }
                let (rx, ry) = (w / 2.0, h / 2.0);
                let dx = (px - (x + rx)) / rx;
                let dy = (py - (y + ry)) / ry;
                dx * dx + dy * dy <= 1.0
            }
            CollisionShape::Polygon { points } => point_in_polygon(points, px, py),
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            CollisionShape::Rectangle { .. } => "rectangle",
            CollisionShape::Ellipse { .. } => "ellipse",
            CollisionShape::Polygon { .. } => "polygon",
        }
    }
}

/// Even-odd ray cast towards +x.
fn point_in_polygon(points: &[(f32, f32)], px: f32, py: f32) -> bool {
    if points.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (xi, yi) = points[i];
        let (xj, yj) = points[j];
        if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}
