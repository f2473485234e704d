//! Slack data types used across the bot.
#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A member of the Slack team directory. Profilebot only ever reads these;
/// the directory itself is owned by Slack.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct User {
    pub id: String,

    /// The username / handle, without the leading `@`.
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub first_name: String,

    #[serde(default)]
    pub last_name: String,

    #[serde(default)]
    pub email: String,

    /// The free-text "What I do" profile field.
    #[serde(default)]
    pub what_i_do: String,

    /// Profile image URL, when one is set.
    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    pub is_bot: bool,

    #[serde(default)]
    pub deleted: bool,
}

impl User {
    /// A user reference carrying only the id. Command payloads and whitelist
    /// entries have no other resolved fields.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Required before any operation that addresses the user.
    pub fn guard(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(Error::invalid_argument("user.id"));
        }
        Ok(())
    }

    /// The `<@ID>` form used in outbound messages.
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}

/// A strict `<@ID>` mention. Parsing rejects anything that is not the exact
/// syntax; formatting reproduces it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mention {
    pub id: String,
}

impl Mention {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// The mentioned user as a directory reference with only the id set.
    pub fn to_user(&self) -> User {
        User::with_id(&self.id)
    }
}

impl FromStr for Mention {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let inner = s
            .strip_prefix("<@")
            .and_then(|rest| rest.strip_suffix('>'))
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::Slack(format!("Not a valid user mention: {s}")))?;

        Ok(Self {
            id: inner.to_string(),
        })
    }
}

impl fmt::Display for Mention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<@{}>", self.id)
    }
}

/// Where a message was posted.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum HubKind {
    DirectMessage,
    Channel,
    Group,
}

impl HubKind {
    /// Maps Slack's `channel_type` event field.
    pub fn from_channel_type(channel_type: &str) -> Self {
        match channel_type {
            "im" => HubKind::DirectMessage,
            "group" | "mpim" => HubKind::Group,
            _ => HubKind::Channel,
        }
    }
}

/// The conversation a message arrived in.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ChatHub {
    pub id: String,
    pub kind: HubKind,
}

/// An inbound message as delivered by the transport. Slack events omit
/// fields on several subtypes, so sender and hub stay optional until the
/// dispatcher has verified the shape.
#[derive(Clone, Debug, Default)]
pub struct MessageEvent {
    pub sender: Option<User>,
    pub text: String,
    pub hub: Option<ChatHub>,
}

impl MessageEvent {
    pub fn new(sender: User, text: impl Into<String>, hub: ChatHub) -> Self {
        Self {
            sender: Some(sender),
            text: text.into(),
            hub: Some(hub),
        }
    }

    /// A direct message from the given user, as the tests and the regular
    /// flows see them.
    pub fn direct(sender_id: &str, text: impl Into<String>) -> Self {
        Self {
            sender: Some(User::with_id(sender_id)),
            text: text.into(),
            hub: Some(ChatHub {
                id: format!("D-{sender_id}"),
                kind: HubKind::DirectMessage,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mention_parses_strict_syntax() {
        let mention: Mention = "<@U1TBU8337>".parse().unwrap();
        assert_eq!(mention.id, "U1TBU8337");
        assert_eq!(mention.to_string(), "<@U1TBU8337>");
    }

    #[test]
    fn test_mention_rejects_malformed_input() {
        for bad in ["", "U1TBU8337", "<@>", "<@U1", "@U1>", "<U1>"] {
            assert!(bad.parse::<Mention>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_mention_to_user_carries_only_id() {
        let user = Mention::new("U1").to_user();
        assert_eq!(user.id, "U1");
        assert!(user.name.is_empty());
        assert!(user.image.is_none());
    }

    #[test]
    fn test_hub_kind_from_channel_type() {
        assert_eq!(HubKind::from_channel_type("im"), HubKind::DirectMessage);
        assert_eq!(HubKind::from_channel_type("mpim"), HubKind::Group);
        assert_eq!(HubKind::from_channel_type("group"), HubKind::Group);
        assert_eq!(HubKind::from_channel_type("channel"), HubKind::Channel);
        assert_eq!(HubKind::from_channel_type(""), HubKind::Channel);
    }

    #[test]
    fn test_user_guard_requires_id() {
        assert!(User::with_id("U1").guard().is_ok());
        assert!(User::default().guard().is_err());
    }

    #[test]
    fn test_user_mention_format() {
        assert_eq!(User::with_id("U1").mention(), "<@U1>");
    }
}
