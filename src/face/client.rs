//! HTTP client for the face detection service.
#![allow(dead_code)]

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FaceApiError {
    /// The service rate-limited the call. Retried by the checker.
    #[error("Face API throttled the request")]
    Throttled,

    #[error("Face API error: HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, FaceApiError>;

/// One detected face, as returned by the detect endpoint.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Face {
    #[serde(rename = "faceId", default)]
    pub face_id: String,

    #[serde(rename = "faceRectangle", default)]
    pub rectangle: FaceRectangle,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct FaceRectangle {
    #[serde(default)]
    pub top: u32,
    #[serde(default)]
    pub left: u32,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

/// Detects faces in an image. Throttling surfaces as its own error variant
/// so the caller can tell transient pressure from real failures.
#[async_trait]
pub trait FaceDetector: Send + Sync {
    async fn detect(&self, image_url: &str) -> Result<Vec<Face>>;
}

/// Azure-style Face API client: POST `{base}/face/v1.0/detect` with the
/// image URL, key in the `Ocp-Apim-Subscription-Key` header.
pub struct HttpFaceDetector {
    http: Client,
    key: String,
    base_url: String,
}

impl HttpFaceDetector {
    pub fn new(key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            key: key.into(),
            base_url: base_url.into(),
        }
    }

    fn detect_url(&self) -> String {
        format!("{}/face/v1.0/detect", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl FaceDetector for HttpFaceDetector {
    async fn detect(&self, image_url: &str) -> Result<Vec<Face>> {
        let response = self
            .http
            .post(self.detect_url())
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .json(&serde_json::json!({ "url": image_url }))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FaceApiError::Throttled);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(FaceApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_url_normalizes_trailing_slash() {
        let detector = HttpFaceDetector::new("key", "https://face.example.com/");
        assert_eq!(detector.detect_url(), "https://face.example.com/face/v1.0/detect");
    }

    #[test]
    fn test_face_response_parses() {
        let faces: Vec<Face> = serde_json::from_str(
            r#"[{"faceId":"c5c24a82-6845-4031-9d5d-978df9175426","faceRectangle":{"top":131,"left":177,"width":162,"height":162}}]"#,
        )
        .unwrap();

        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].rectangle.width, 162);
    }

    #[test]
    fn test_empty_response_means_no_faces() {
        let faces: Vec<Face> = serde_json::from_str("[]").unwrap();
        assert!(faces.is_empty());
    }
}
