//! # Error Types
//!
//! Every failure in the conversion pipeline is fatal for the run, so a single
//! error enum covers all stages. The per-cell fallback in the sanitizer is not
//! an error path and never produces one of these.

use crate::region::BoundingBox;
use thiserror::Error;

/// Result type for conversion operations
pub type Nc2JsonResult<T> = Result<T, Nc2JsonError>;

/// Errors that can occur while converting a raster to JSON
#[derive(Error, Debug)]
pub enum Nc2JsonError {
    #[error("Failed to open raster source '{path}': {source}")]
    SourceOpen {
        path: String,
        #[source]
        source: netcdf::Error,
    },

    #[error("Field '{name}' not found (available: {})", .available.join(", "))]
    FieldNotFound { name: String, available: Vec<String> },

    #[error("Dataset contains no data fields")]
    EmptyDataset,

    #[error("Coordinate axis '{0}' not found")]
    AxisNotFound(String),

    #[error("Field '{field}' has unsupported shape: {details}")]
    InvalidShape { field: String, details: String },

    #[error("Coordinate axis '{0}' is not monotonic")]
    NonMonotonicAxis(String),

    #[error(
        "Cropped region is empty: requested lon [{}, {}], lat [{}, {}] but data spans lon [{}, {}], lat [{}, {}]",
        .bbox.lon_min, .bbox.lon_max, .bbox.lat_min, .bbox.lat_max,
        .lon_extent.0, .lon_extent.1, .lat_extent.0, .lat_extent.1
    )]
    EmptyRegion {
        bbox: BoundingBox,
        lon_extent: (f64, f64),
        lat_extent: (f64, f64),
    },

    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Output file already exists: {0}")]
    OutputExists(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),
}
