//! Error types for Profilebot.
#![allow(dead_code)]

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Slack error: {0}")]
    Slack(String),

    #[error("Unknown user: {0}")]
    UnknownUser(String),

    #[error("Face detection error: {0}")]
    FaceDetection(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for the guard clauses on required string fields.
    pub fn invalid_argument(name: &str) -> Self {
        Error::InvalidArgument(name.to_string())
    }
}
