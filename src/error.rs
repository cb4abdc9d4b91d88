//! Error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors raised while loading, solving, or reporting a timetable.
#[derive(Debug, Error)]
pub enum TimetableError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid workbook: {0}")]
    Workbook(#[from] serde_json::Error),

    #[error("invalid policy: {0}")]
    Policy(#[from] toml::de::Error),

    #[error("failed to render policy: {0}")]
    PolicyRender(#[from] toml::ser::Error),

    #[error("failed to export schedule: {0}")]
    Export(#[source] serde_json::Error),

    #[error("invalid period code '{0}'")]
    InvalidPeriod(String),

    #[error("invalid slot '{0}'")]
    InvalidSlot(String),

    #[error("input validation failed with {} error(s)", .0.len())]
    Validation(Vec<ValidationError>),

    #[error("section {section} has no admissible placement")]
    NoAdmissiblePlacement { section: String },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TimetableError>;
