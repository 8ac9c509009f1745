//! Error types for navigation data construction

use mimic_math::Vec3;
use thiserror::Error;

/// Navigation errors
#[derive(Debug, Error)]
pub enum NavError {
    /// Map text contained no rows
    #[error("Navigation map is empty")]
    EmptyMap,

    /// Map glyph not understood by the grid builder
    #[error("Unknown map glyph '{glyph}' at row {row}, column {column}")]
    UnknownGlyph { glyph: char, row: usize, column: usize },

    /// Grid cell size must be positive
    #[error("Invalid cell size: {0}")]
    InvalidCellSize(f32),

    /// Link endpoint does not land on a traversable cell
    #[error("Link endpoint {0:?} is not on the navigation grid")]
    LinkEndpointOffMesh(Vec3),
}

/// Result type for navigation operations
pub type Result<T> = std::result::Result<T, NavError>;
