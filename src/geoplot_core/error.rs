use std::path::PathBuf;
use thiserror::Error;

/// Failures scoped to a single media file.
///
/// None of these abort a batch: the aggregator turns each one into a skip
/// notice for the offending file and moves on.
#[derive(Error, Debug)]
pub enum ExtractionError {
    // Container errors
    #[error("Unreadable container {path}: {reason}")]
    UnreadableContainer { path: PathBuf, reason: String },

    #[error("No metadata block in {0}")]
    NoMetadataBlock(PathBuf),

    #[error("Malformed document {path}: {reason}")]
    MalformedDocument { path: PathBuf, reason: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Value errors
    #[error("Invalid angle: {0}")]
    InvalidAngle(String),

    #[error("Invalid hemisphere reference: {0}")]
    InvalidHemisphere(String),

    #[error("Coordinate {value} outside [-{limit}, {limit}]")]
    CoordinateOutOfRange { value: f64, limit: f64 },

    #[error("Invalid altitude: {0}")]
    InvalidAltitude(String),
}

impl ExtractionError {
    /// Short stable label used in skip summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractionError::UnreadableContainer { .. } => "unreadable-container",
            ExtractionError::NoMetadataBlock(_) => "no-metadata-block",
            ExtractionError::MalformedDocument { .. } => "malformed-document",
            ExtractionError::Io { .. } => "io",
            ExtractionError::InvalidAngle(_) => "invalid-angle",
            ExtractionError::InvalidHemisphere(_) => "invalid-hemisphere",
            ExtractionError::CoordinateOutOfRange { .. } => "coordinate-out-of-range",
            ExtractionError::InvalidAltitude(_) => "invalid-altitude",
        }
    }

    pub(crate) fn unreadable(path: &std::path::Path, reason: impl Into<String>) -> Self {
        ExtractionError::UnreadableContainer {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        ExtractionError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Error, Debug)]
pub enum GeoplotError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("No extractor registered for {0}")]
    UnsupportedFile(PathBuf),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    // Output errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for geoplot operations.
pub type Result<T> = std::result::Result<T, GeoplotError>;
