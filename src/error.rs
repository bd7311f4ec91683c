use crate::beer::Beer;
use crate::cellar::Rejection;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CellarError {
    #[error("Line is misspecified: {0}")]
    MalformedRecord(String),

    #[error("Invalid drink date '{date}' in line: {line}")]
    InvalidDate { line: String, date: String },

    #[error("{size} is not a valid beer size")]
    InvalidSize { line: String, size: String },

    #[error("Cellar box rejected beer: {0}")]
    BinRejected(Rejection),

    #[error("No cellar box can take {0}")]
    NoBinAvailable(Beer),

    #[error("Cannot open {}: {source}", .path.display())]
    PersistenceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No metadata file at {}", .0.display())]
    MissingMetadata(PathBuf),

    #[error("Metadata file {} is malformed: {reason}", .path.display())]
    MalformedMetadata { path: PathBuf, reason: String },

    #[error("{detail}")]
    Untappd { code: u16, detail: String },

    #[error("Reading check-ins needs an Untappd user name or access token")]
    MissingUntappdUser,

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Error: {0}")]
    Other(#[from] anyhow::Error),
}

impl CellarError {
    pub(crate) fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CellarError::PersistenceUnavailable {
            path: path.into(),
            source,
        }
    }

    /// True for the record-level parse failures that bulk loads skip over
    pub fn is_record_error(&self) -> bool {
        matches!(
            self,
            CellarError::MalformedRecord(_)
                | CellarError::InvalidDate { .. }
                | CellarError::InvalidSize { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CellarError>;
