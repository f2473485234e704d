//! Face detection: external detector client, retrying checker, whitelist.

pub mod checker;
pub mod client;
pub mod whitelist;

pub use checker::{FaceCheckResult, FaceDetectionClient, ImageChecker, MAX_DETECTION_ATTEMPTS};
pub use client::{Face, FaceApiError, FaceDetector, HttpFaceDetector};
pub use whitelist::{FaceWhitelist, StoredWhitelist};
