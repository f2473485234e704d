//! Profilebot library root.

pub mod cli;
pub mod config;
pub mod bot;
pub mod error;
pub mod face;
pub mod heartbeat;
pub mod logging;
pub mod profile;
pub mod slack;
pub mod storage;

pub use cli::Commands;
pub use config::{load_settings, Settings};
pub use bot::Profilebot;
pub use error::{Error, Result};
pub use face::{FaceDetectionClient, FaceWhitelist, HttpFaceDetector, StoredWhitelist};
pub use heartbeat::Heartbeat;
pub use profile::{ProfileValidator, SlackProfileValidator, ValidationReport, ValidationResult};
pub use slack::{MessageEvent, SlackIntegration, SlackWebIntegration, User};
pub use storage::{BlobStore, FsBlobStore};
