//! Slack Web API client and the production `SlackIntegration`.
#![allow(dead_code)]

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use super::events::{build_router, EventSink, WebhookState};
use super::integration::{SlackIntegration, EVENT_CHANNEL_CAPACITY};
use super::types::{MessageEvent, User};
use crate::error::{Error, Result};

const DEFAULT_API_URL: &str = "https://slack.com/api";

/// Thin client for the handful of Web API methods the bot needs. Keeps an
/// id-to-user cache filled by directory fetches and a cache of opened DM
/// channels.
pub struct SlackWebClient {
    http: Client,
    token: String,
    base_url: String,
    directory: Mutex<HashMap<String, User>>,
    dm_channels: Mutex<HashMap<String, String>>,
}

#[derive(Deserialize)]
struct AuthTestResponse {
    ok: bool,
    error: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
}

#[derive(Deserialize)]
struct UsersListResponse {
    ok: bool,
    error: Option<String>,
    #[serde(default)]
    members: Vec<Member>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: String,
}

#[derive(Deserialize)]
struct UserInfoResponse {
    ok: bool,
    error: Option<String>,
    user: Option<Member>,
}

#[derive(Deserialize)]
struct ConversationsOpenResponse {
    ok: bool,
    error: Option<String>,
    channel: Option<ChannelRef>,
}

#[derive(Deserialize)]
struct ChannelRef {
    id: String,
}

#[derive(Deserialize)]
struct PostMessageResponse {
    ok: bool,
    error: Option<String>,
}

#[derive(Deserialize)]
struct Member {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    deleted: bool,
    #[serde(default)]
    is_bot: bool,
    #[serde(default)]
    profile: MemberProfile,
}

#[derive(Deserialize, Default)]
struct MemberProfile {
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    image_512: Option<String>,
}

impl Member {
    fn into_user(self) -> User {
        User {
            id: self.id,
            name: self.name,
            first_name: self.profile.first_name,
            last_name: self.profile.last_name,
            email: self.profile.email,
            what_i_do: self.profile.title,
            image: self.profile.image_512.filter(|url| !url.is_empty()),
            is_bot: self.is_bot,
            deleted: self.deleted,
        }
    }
}

impl SlackWebClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, DEFAULT_API_URL)
    }

    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            token: token.into(),
            base_url: base_url.into(),
            directory: Mutex::new(HashMap::new()),
            dm_channels: Mutex::new(HashMap::new()),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    fn ensure_ok(method: &str, ok: bool, error: Option<String>) -> Result<()> {
        if ok {
            return Ok(());
        }
        Err(Error::Slack(format!(
            "{method} failed: {}",
            error.unwrap_or_else(|| "unknown error".to_string())
        )))
    }

    /// Verifies the token against auth.test and returns the bot's own user id.
    pub async fn auth_test(&self) -> Result<String> {
        let response = self
            .http
            .post(self.method_url("auth.test"))
            .bearer_auth(&self.token)
            .send()
            .await?;

        let auth: AuthTestResponse = response.json().await?;
        Self::ensure_ok("auth.test", auth.ok, auth.error)?;

        Ok(auth.user_id.unwrap_or_default())
    }

    /// The full team directory, in Slack's order. Refreshes the user cache.
    pub async fn users_list(&self) -> Result<Vec<User>> {
        let mut users = Vec::new();
        let mut cursor = String::new();

        loop {
            let mut request = self
                .http
                .get(self.method_url("users.list"))
                .bearer_auth(&self.token);
            if !cursor.is_empty() {
                request = request.query(&[("cursor", cursor.as_str())]);
            }

            let response = request.send().await?;
            let page: UsersListResponse = response.json().await?;
            Self::ensure_ok("users.list", page.ok, page.error)?;

            users.extend(page.members.into_iter().map(Member::into_user));

            cursor = page
                .response_metadata
                .map(|m| m.next_cursor)
                .unwrap_or_default();
            if cursor.is_empty() {
                break;
            }
        }

        let mut directory = self.directory.lock().await;
        directory.clear();
        for user in &users {
            directory.insert(user.id.clone(), user.clone());
        }

        Ok(users)
    }

    /// Cache lookup first, then users.info. Unknown ids are errors.
    pub async fn get_user(&self, user_id: &str) -> Result<User> {
        if user_id.is_empty() {
            return Err(Error::invalid_argument("user_id"));
        }

        if let Some(user) = self.directory.lock().await.get(user_id) {
            return Ok(user.clone());
        }

        let response = self
            .http
            .get(self.method_url("users.info"))
            .query(&[("user", user_id)])
            .bearer_auth(&self.token)
            .send()
            .await?;

        let info: UserInfoResponse = response.json().await?;
        if info.error.as_deref() == Some("user_not_found") {
            return Err(Error::UnknownUser(user_id.to_string()));
        }
        Self::ensure_ok("users.info", info.ok, info.error)?;

        let user = info
            .user
            .map(Member::into_user)
            .ok_or_else(|| Error::UnknownUser(user_id.to_string()))?;

        self.directory
            .lock()
            .await
            .insert(user.id.clone(), user.clone());

        Ok(user)
    }

    /// Opens (or reuses) the DM channel with a user.
    async fn open_dm_channel(&self, user_id: &str) -> Result<String> {
        if let Some(channel) = self.dm_channels.lock().await.get(user_id) {
            return Ok(channel.clone());
        }

        let response = self
            .http
            .post(self.method_url("conversations.open"))
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "users": user_id }))
            .send()
            .await?;

        let opened: ConversationsOpenResponse = response.json().await?;
        Self::ensure_ok("conversations.open", opened.ok, opened.error)?;

        let channel = opened
            .channel
            .map(|c| c.id)
            .ok_or_else(|| Error::Slack("conversations.open returned no channel".to_string()))?;

        self.dm_channels
            .lock()
            .await
            .insert(user_id.to_string(), channel.clone());

        Ok(channel)
    }

    pub async fn post_message(&self, channel: &str, text: &str) -> Result<()> {
        let response = self
            .http
            .post(self.method_url("chat.postMessage"))
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "channel": channel, "text": text }))
            .send()
            .await?;

        let posted: PostMessageResponse = response.json().await?;
        Self::ensure_ok("chat.postMessage", posted.ok, posted.error)
    }
}

/// The production integration: Web API outbound, Events API webhook inbound.
pub struct SlackWebIntegration {
    client: SlackWebClient,
    sink: EventSink,
    signing_secret: Option<String>,
    events_port: u16,
    server: Mutex<Option<JoinHandle<()>>>,
}

impl SlackWebIntegration {
    pub fn new(
        token: impl Into<String>,
        signing_secret: Option<String>,
        events_port: u16,
    ) -> Self {
        Self {
            client: SlackWebClient::new(token),
            sink: EventSink::new(),
            signing_secret,
            events_port,
            server: Mutex::new(None),
        }
    }
}

#[async_trait]
impl SlackIntegration for SlackWebIntegration {
    async fn connect(&self) -> Result<()> {
        let bot_user = self.client.auth_test().await?;
        tracing::info!(bot_user = %bot_user, "Authenticated against Slack");

        let state = WebhookState {
            signing_secret: self.signing_secret.clone(),
            sink: self.sink.clone(),
        };
        let app = build_router(state);

        let addr = format!("0.0.0.0:{}", self.events_port);
        let listener = TcpListener::bind(&addr).await?;
        tracing::info!(addr = %addr, "Slack Events webhook listening");

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Events webhook server exited with error");
            }
        });
        *self.server.lock().await = Some(handle);

        Ok(())
    }

    async fn subscribe(&self) -> mpsc::Receiver<MessageEvent> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        self.sink.install(tx).await;
        rx
    }

    async fn get_all_users(&self) -> Result<Vec<User>> {
        self.client.users_list().await
    }

    async fn get_user(&self, user_id: &str) -> Result<User> {
        self.client.get_user(user_id).await
    }

    async fn send_direct_message(&self, user: &User, text: &str) -> Result<()> {
        user.guard()?;
        if text.is_empty() {
            return Err(Error::invalid_argument("text"));
        }

        let channel = self.client.open_dm_channel(&user.id).await?;
        self.client.post_message(&channel, text).await
    }

    async fn indicate_typing(&self, user: &User) -> Result<()> {
        user.guard()?;
        // Typing is an RTM-session feature; the Events transport has no
        // equivalent call.
        tracing::debug!(user = %user.id, "typing indicator");
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.sink.clear().await;
        if let Some(handle) = self.server.lock().await.take() {
            handle.abort();
        }
        tracing::info!("Disconnected from Slack");
        Ok(())
    }
}
