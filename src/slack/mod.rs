//! Slack integration: types, Web API client, Events API webhook.

pub mod client;
pub mod events;
pub mod integration;
pub mod types;

pub use client::{SlackWebClient, SlackWebIntegration};
pub use integration::SlackIntegration;
pub use types::{ChatHub, HubKind, MessageEvent, Mention, User};
