use std::path::PathBuf;
use thiserror::Error;

use crate::collab::CollaboratorError;
use crate::model::ImageId;

/// The main error type for codescan operations.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to read image {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Collaborator failed on {image}: {source}")]
    Collaborator {
        image: ImageId,
        #[source]
        source: CollaboratorError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to write JSON report {path}: {source}")]
    ReportJsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write CSV report {path}: {source}")]
    ReportCsvWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to write visualization {path}: {source}")]
    VisualizationWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to discover images under {path}: {message}")]
    Discovery { path: PathBuf, message: String },

    #[error("Scan failed for {image}: {detail}")]
    ScanFailed { image: ImageId, detail: String },

    #[error("Failed to start worker pool: {0}")]
    ThreadPool(String),
}

impl ScanError {
    /// True for failures that belong to a single image and become an ERROR
    /// outcome instead of ending the run.
    pub fn is_per_image(&self) -> bool {
        matches!(self, ScanError::Read { .. } | ScanError::Collaborator { .. })
    }
}
