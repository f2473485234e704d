//! Slack Events API webhook for inbound direct messages.
#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Router,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use super::types::{ChatHub, HubKind, MessageEvent, User};

type HmacSha256 = Hmac<Sha256>;

const MAX_EVENT_BODY_BYTES: usize = 1024 * 1024;

/// Where the webhook hands events off. The sender is installed by
/// `SlackIntegration::subscribe`; until then events are dropped, which is
/// what keeps the dispatcher from seeing traffic before it has subscribed.
#[derive(Clone, Default)]
pub struct EventSink {
    tx: Arc<Mutex<Option<mpsc::Sender<MessageEvent>>>>,
}

impl EventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn install(&self, tx: mpsc::Sender<MessageEvent>) {
        *self.tx.lock().await = Some(tx);
    }

    pub async fn clear(&self) {
        *self.tx.lock().await = None;
    }

    pub async fn forward(&self, event: MessageEvent) {
        let guard = self.tx.lock().await;
        match guard.as_ref() {
            Some(tx) => {
                if let Err(e) = tx.send(event).await {
                    tracing::warn!(error = %e, "Dropped inbound message, receiver gone");
                }
            }
            None => {
                tracing::debug!("Dropped inbound message, no subscriber yet");
            }
        }
    }
}

#[derive(Clone)]
pub struct WebhookState {
    pub signing_secret: Option<String>,
    pub sink: EventSink,
}

/// The webhook router. Slack must be configured to POST events to
/// `/slack/events` on the bound port.
pub fn build_router(state: WebhookState) -> Router {
    Router::new()
        .route("/slack/events", post(handle_events))
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(MAX_EVENT_BODY_BYTES))
        .with_state(state)
}

async fn handle_events(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    // Verify the Slack request signature when a signing secret is configured.
    if let Some(ref secret) = state.signing_secret {
        if !signature_is_valid(secret, &headers, &body) {
            tracing::warn!("Rejected events request: invalid Slack signature");
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }

    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!(error = %e, "Failed to parse events body as JSON");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    // URL verification challenge (required when first configuring the endpoint).
    if payload["type"] == "url_verification" {
        let challenge = payload["challenge"].as_str().unwrap_or("").to_string();
        return axum::Json(serde_json::json!({ "challenge": challenge })).into_response();
    }

    if payload["type"] == "event_callback" {
        if let Some(event) = parse_message_event(&payload["event"]) {
            state.sink.forward(event).await;
        }
    }

    StatusCode::OK.into_response()
}

fn signature_is_valid(secret: &str, headers: &HeaderMap, body: &Bytes) -> bool {
    let timestamp = headers
        .get("X-Slack-Request-Timestamp")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let sig_header = headers
        .get("X-Slack-Signature")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let sig_base = format!(
        "v0:{}:{}",
        timestamp,
        std::str::from_utf8(body).unwrap_or("")
    );
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(sig_base.as_bytes());
    let expected = format!("v0={}", hex::encode(mac.finalize().into_bytes()));

    expected == sig_header
}

/// Maps a raw `message` event to a `MessageEvent`. Subtyped events (edits,
/// joins, bot chatter) are transport noise and return None; shape defects in
/// what remains are left for the dispatcher's own verification.
fn parse_message_event(event: &serde_json::Value) -> Option<MessageEvent> {
    if event["type"] != "message" {
        return None;
    }
    if event.get("subtype").is_some() || event.get("bot_id").is_some() {
        return None;
    }

    let sender = event["user"].as_str().map(User::with_id);
    let text = event["text"].as_str().unwrap_or_default().to_string();
    let hub = event["channel"].as_str().map(|id| ChatHub {
        id: id.to_string(),
        kind: HubKind::from_channel_type(event["channel_type"].as_str().unwrap_or_default()),
    });

    Some(MessageEvent { sender, text, hub })
}
