//! Tiled JSON map and tileset loading plus the collision index built from them.

pub mod catalog;
pub mod collision;
pub mod error;
pub mod map;
pub mod properties;
pub mod shape;
pub mod spatial;
pub mod tileset;

pub use catalog::{CatalogOptions, ImagePrefixRule, TilesetCatalog};
pub use collision::{CollisionIndex, CollisionRules};
pub use error::{ErrorKind, MapError};
pub use map::{AnimatedTile, LayerKind, MapLayer, MapModel, MapObject, ObjectPoint, TileVisual};
pub use properties::{Properties, PropertyValue};
pub use shape::{Bounds, CollisionShape};
pub use spatial::{CellKey, SpatialGrid};
pub use tileset::{DirectionalClip, TileMetadata, TilesetEntry};
