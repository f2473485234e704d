//! The Slack surface Profilebot depends on.
#![allow(dead_code)]

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::types::{MessageEvent, User};
use crate::error::Result;

/// Capacity of the inbound message channel handed out by `subscribe`.
pub const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Wraps the Slack APIs needed for Profilebot. The dispatcher talks to this
/// trait only, so tests can drive it with an in-memory double.
#[async_trait]
pub trait SlackIntegration: Send + Sync {
    /// Connects the bot to Slack.
    async fn connect(&self) -> Result<()>;

    /// Returns the channel inbound direct messages are delivered on.
    /// Events arriving before the first call are dropped.
    async fn subscribe(&self) -> mpsc::Receiver<MessageEvent>;

    /// All users in the Slack team, in directory order.
    async fn get_all_users(&self) -> Result<Vec<User>>;

    /// The user with the given id, or an error if the directory has no
    /// such member.
    async fn get_user(&self, user_id: &str) -> Result<User>;

    /// Sends a DM to the given user.
    async fn send_direct_message(&self, user: &User, text: &str) -> Result<()>;

    /// Shows the bot as typing in the DM channel of the given user.
    async fn indicate_typing(&self, user: &User) -> Result<()>;

    /// Closes the session.
    async fn disconnect(&self) -> Result<()>;
}
