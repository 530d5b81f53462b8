use std::fmt;
use std::io;
use std::path::PathBuf;

/// Failure taxonomy for map and tileset documents.
///
/// Out-of-range queries are not errors: tile lookups answer 0 and collision
/// queries answer "not blocked", so `OutOfBoundsQuery` is never produced by
/// this crate. It is listed so callers can classify their own range checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingAsset,
    MalformedDocument,
    OutOfBoundsQuery,
}

#[derive(Debug)]
pub enum MapError {
    /// The file could not be read.
    MissingAsset { path: PathBuf, source: io::Error },
    /// The file was read but is not a valid document.
    MalformedDocument {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// Map dimensions are zero or too large, or a layer holds more cells
    /// than the map declares.
    InvalidLayerSize { path: PathBuf, detail: String },
    /// Only JSON documents (`.json`, `.tmj`, `.tsj`) are understood.
    UnsupportedFormat(String),
}

impl MapError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MapError::MissingAsset { .. } => ErrorKind::MissingAsset,
            MapError::MalformedDocument { .. }
            | MapError::InvalidLayerSize { .. }
            | MapError::UnsupportedFormat(_) => ErrorKind::MalformedDocument,
        }
    }
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::MissingAsset { path, source } => {
                write!(f, "Failed to read {}: {}", path.display(), source)
            }
            MapError::MalformedDocument { path, source } => {
                write!(f, "Failed to parse {}: {}", path.display(), source)
            }
            MapError::InvalidLayerSize { path, detail } => {
                write!(f, "Invalid layer size in {}: {}", path.display(), detail)
            }
            MapError::UnsupportedFormat(path) => {
                write!(f, "Unsupported document format: {}", path)
            }
        }
    }
}

impl std::error::Error for MapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MapError::MissingAsset { source, .. } => Some(source),
            MapError::MalformedDocument { source, .. } => Some(source),
            MapError::InvalidLayerSize { .. } | MapError::UnsupportedFormat(_) => None,
        }
    }
}
