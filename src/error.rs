//! Error types for the statemap application.
//!
//! This module defines a single error enum covering every failure a render
//! can hit. There is no recovery path: every variant aborts the run.

use thiserror::Error;

use crate::projection::Crs;
use crate::tiles::TileId;

/// The main error type for statemap operations.
#[derive(Error, Debug)]
pub enum StatemapError {
    /// Requested state is absent from a reference table
    #[error("Unknown state: '{state}' not found in {source_name}")]
    UnknownState { state: String, source_name: String },

    /// Malformed or out-of-range latitude/longitude values
    #[error("Invalid coordinates: {message}")]
    InvalidCoordinates { message: String },

    /// Geometry handed to an operation in the wrong coordinate reference system
    #[error("CRS mismatch: expected {expected}, found {found}")]
    CrsMismatch { expected: Crs, found: Crs },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Shapefile / dBase reading errors
    #[error("Shapefile error: {0}")]
    Shapefile(#[from] shapefile::Error),

    /// Tile provider errors (unreachable, bad status, undecodable body)
    #[error("Tile fetch error for {tile}: {message}")]
    TileFetch { tile: TileId, message: String },

    /// Image generation errors
    #[error("Image generation error: {message}")]
    ImageGeneration { message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Invalid parameter errors
    #[error("Invalid parameter: {param} - {message}")]
    InvalidParameter { param: String, message: String },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StatemapError {
    /// Shorthand for a lookup miss in the named reference table
    pub fn unknown_state(state: &str, source_name: impl Into<String>) -> Self {
        StatemapError::UnknownState {
            state: state.to_string(),
            source_name: source_name.into(),
        }
    }
}

/// Convenience type alias for Results with StatemapError
pub type Result<T> = std::result::Result<T, StatemapError>;
