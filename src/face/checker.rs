//! Profile image validation with whitelist short-circuit and retry.
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::client::{FaceApiError, FaceDetector};
use super::whitelist::FaceWhitelist;
use crate::error::{Error, Result};
use crate::slack::User;

/// Attempts against the detector before giving up on a throttled image.
pub const MAX_DETECTION_ATTEMPTS: u32 = 9;

const NO_FACE_DETECTED: &str =
    "No face was detected in your profile image. Please upload a clear image of your face";
const MULTIPLE_FACES_DETECTED: &str =
    "Multiple faces were detected in your profile image. Please upload an image of you alone";

/// Outcome of a profile image check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaceCheckResult {
    pub valid: bool,
    pub errors: String,
}

impl FaceCheckResult {
    pub fn valid() -> Self {
        Self {
            valid: true,
            errors: String::new(),
        }
    }

    pub fn invalid(errors: impl Into<String>) -> Self {
        Self {
            valid: false,
            errors: errors.into(),
        }
    }
}

/// Seam between the validator and the face detection machinery.
#[async_trait]
pub trait ImageChecker: Send + Sync {
    /// Checks that the user's profile image shows exactly one face. Errors
    /// only on input-contract violations; detector trouble fails open.
    async fn check_image(&self, user: &User) -> Result<FaceCheckResult>;
}

/// The production image checker: whitelist first, then the external
/// detector with a bounded linear-backoff retry loop.
pub struct FaceDetectionClient {
    detector: Arc<dyn FaceDetector>,
    whitelist: Arc<dyn FaceWhitelist>,
    base_delay: Duration,
}

impl FaceDetectionClient {
    pub fn new(
        detector: Arc<dyn FaceDetector>,
        whitelist: Arc<dyn FaceWhitelist>,
        base_delay: Duration,
    ) -> Self {
        Self {
            detector,
            whitelist,
            base_delay,
        }
    }

    async fn check_with_detector(&self, user: &User, image: &str) -> Result<FaceCheckResult> {
        if self.whitelist.is_whitelisted(user).await? {
            return Ok(FaceCheckResult::valid());
        }

        for attempt in 0..MAX_DETECTION_ATTEMPTS {
            match self.detector.detect(image).await {
                Ok(faces) => {
                    let result = match faces.len() {
                        0 => FaceCheckResult::invalid(NO_FACE_DETECTED),
                        1 => FaceCheckResult::valid(),
                        _ => FaceCheckResult::invalid(MULTIPLE_FACES_DETECTED),
                    };
                    return Ok(result);
                }
                Err(FaceApiError::Throttled) => {
                    tracing::debug!(user = %user.id, attempt, "Face API throttled, backing off");
                    // First retry waits zero: the delay scales with the
                    // attempt index, which starts at 0.
                    tokio::time::sleep(self.base_delay * attempt).await;
                }
                Err(e) => return Err(Error::FaceDetection(e.to_string())),
            }
        }

        tracing::error!(user = %user.name, "Did not complete image validation");
        Ok(FaceCheckResult::valid())
    }
}

#[async_trait]
impl ImageChecker for FaceDetectionClient {
    async fn check_image(&self, user: &User) -> Result<FaceCheckResult> {
        user.guard()?;
        let image = user
            .image
            .as_deref()
            .ok_or_else(|| Error::invalid_argument("user.image"))?;

        match self.check_with_detector(user, image).await {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::error!(error = %e, user = %user.id, "Face detection failed, treating image as valid");
                Ok(FaceCheckResult::valid())
            }
        }
    }
}
