//! The bot core. Profilebot takes its commands from direct messages,
//! routes them through the parser and answers to the best of its
//! abilities. If it doesn't understand, it lists its available commands.
#![allow(dead_code)]

pub mod commands;
pub mod parser;

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

use crate::error::{Error, Result};
use crate::face::FaceWhitelist;
use crate::profile::{ProfileValidator, ValidationReport};
use crate::slack::{ChatHub, HubKind, MessageEvent, SlackIntegration, User};

use commands::{Command, HELP_TEXT};
use parser::parse_command;

/// A Slack bot which verifies user profiles. Collaborators come in as
/// trait objects so tests can run the whole dispatch path in memory.
pub struct Profilebot {
    slack: Arc<dyn SlackIntegration>,
    validator: Arc<dyn ProfileValidator>,
    whitelist: Arc<dyn FaceWhitelist>,
    admin: User,
    events: Mutex<Option<mpsc::Receiver<MessageEvent>>>,
}

impl Profilebot {
    /// Creates the bot. Only the admin's id is kept; the rest of the
    /// admin profile plays no role in dispatching.
    pub fn new(
        slack: Arc<dyn SlackIntegration>,
        validator: Arc<dyn ProfileValidator>,
        whitelist: Arc<dyn FaceWhitelist>,
        admin: &User,
    ) -> Result<Self> {
        admin.guard()?;

        Ok(Self {
            slack,
            validator,
            whitelist,
            admin: User::with_id(&admin.id),
            events: Mutex::new(None),
        })
    }

    /// Connects the bot to Slack and subscribes to inbound messages.
    /// No message is processed before the subscription is in place.
    pub async fn connect(&self) -> Result<()> {
        self.slack.connect().await?;
        let events = self.slack.subscribe().await;
        *self.events.lock().await = Some(events);
        Ok(())
    }

    /// Reads inbound messages until the transport closes the channel.
    /// Each message is handled on its own task, so a slow profile sweep
    /// never blocks the next command.
    pub async fn run(self: Arc<Self>) -> Result<()> {
        let mut events = self
            .events
            .lock()
            .await
            .take()
            .ok_or_else(|| Error::Other("Not connected to Slack".to_string()))?;

        let mut handlers: JoinSet<()> = JoinSet::new();
        loop {
            tokio::select! {
                maybe_event = events.recv() => {
                    match maybe_event {
                        Some(event) => {
                            let bot = Arc::clone(&self);
                            handlers.spawn(async move { bot.handle_message(event).await });
                        }
                        None => break,
                    }
                }
                Some(_) = handlers.join_next(), if !handlers.is_empty() => {}
            }
        }

        // The transport is gone; let the in-flight handlers finish.
        while handlers.join_next().await.is_some() {}
        tracing::info!("Message stream closed");
        Ok(())
    }

    /// Disconnects the bot from Slack.
    pub async fn dispose(&self) -> Result<()> {
        self.events.lock().await.take();
        self.slack.disconnect().await
    }

    /// The isolation boundary: whatever goes wrong while handling one
    /// message is reported to the admin and stops there.
    async fn handle_message(&self, event: MessageEvent) {
        let Err(e) = self.dispatch(&event).await else {
            return;
        };

        tracing::error!(error = %e, "Failed to handle an inbound message");
        let crash_report = format!("I crashed:\n{e}");
        if let Err(send_error) = self
            .slack
            .send_direct_message(&self.admin, &crash_report)
            .await
        {
            tracing::error!(error = %send_error, "Could not report the crash to the admin");
        }
    }

    async fn dispatch(&self, event: &MessageEvent) -> Result<()> {
        let (sender, hub) = verify_message_is_complete(event)?;
        if hub.kind != HubKind::DirectMessage {
            tracing::debug!(sender = %sender.id, hub = ?hub.kind, "Ignoring message outside a DM");
            return Ok(());
        }

        tracing::debug!(sender = %sender.id, "Handling direct message");
        match parse_command(&sender.id, &event.text, &self.admin.id) {
            Command::AnswerRegularUser => self.answer_regular_user(sender).await,
            Command::ValidateAllProfiles => self.validate_all_profiles(false).await,
            Command::NotifyAllProfiles => self.validate_all_profiles(true).await,
            Command::ValidateSingleProfile(target) => {
                self.validate_single_profile(sender, &target.to_user(), false)
                    .await
            }
            Command::NotifySingleProfile(target) => {
                self.validate_single_profile(sender, &target.to_user(), true)
                    .await
            }
            Command::WhitelistSingleProfile(target) => {
                self.whitelist_profile(&target.to_user()).await
            }
            Command::ShowWhitelistedUsers => self.send_whitelisted_users().await,
            Command::ShowVersion => self.send_version_number().await,
            Command::Unknown => self.slack.send_direct_message(sender, HELP_TEXT).await,
        }
    }

    /// Checks the sender's own profile. The inbound event only carries
    /// the sender's id, so the full profile is fetched first.
    async fn answer_regular_user(&self, sender: &User) -> Result<()> {
        self.slack
            .send_direct_message(sender, "Checking your profile")
            .await?;

        let user = self.slack.get_user(&sender.id).await?;
        let result = self.validator.validate_profile(&user).await?;
        if result.valid {
            let well_done = format!("Well done <@{}>, your profile is complete", sender.id);
            self.slack.send_direct_message(sender, &well_done).await
        } else {
            self.slack.send_direct_message(sender, &result.errors).await
        }
    }

    /// Sweeps the whole directory sequentially. Invalid profiles are
    /// collected into a report which is uploaded and summarized for the
    /// admin; when notifying, each user also hears about their own errors.
    async fn validate_all_profiles(&self, notify: bool) -> Result<()> {
        let preamble = if notify {
            "Notifying all users"
        } else {
            "Validating all users"
        };
        self.slack.send_direct_message(&self.admin, preamble).await?;

        let mut incomplete = Vec::new();
        for user in self.slack.get_all_users().await? {
            self.slack.indicate_typing(&self.admin).await?;
            let result = self.validator.validate_profile(&user).await?;
            if result.valid {
                continue;
            }

            if notify {
                self.slack
                    .send_direct_message(&result.subject, &result.errors)
                    .await?;
                self.slack
                    .send_direct_message(&self.admin, &result.errors)
                    .await?;
            }
            incomplete.push(result);
        }

        let report = ValidationReport::new(incomplete);
        self.whitelist.upload_report(&report).await?;
        self.slack
            .send_direct_message(&self.admin, &report.to_string())
            .await
    }

    async fn validate_single_profile(
        &self,
        sender: &User,
        subject: &User,
        notify: bool,
    ) -> Result<()> {
        let verb = if notify { "Notifying" } else { "Validating" };
        self.slack
            .send_direct_message(sender, &format!("{verb} {}", subject.mention()))
            .await?;

        let user = self.slack.get_user(&subject.id).await?;
        let result = self.validator.validate_profile(&user).await?;
        if result.valid {
            let message = format!("{} has a complete profile", subject.mention());
            return self.slack.send_direct_message(sender, &message).await;
        }

        self.slack.send_direct_message(sender, &result.errors).await?;
        if notify {
            self.slack
                .send_direct_message(&result.subject, &result.errors)
                .await?;
        }
        Ok(())
    }

    async fn whitelist_profile(&self, subject: &User) -> Result<()> {
        self.slack.indicate_typing(&self.admin).await?;
        self.whitelist.whitelist_user(subject).await?;
        self.slack
            .send_direct_message(&self.admin, &format!("Whitelisted {}", subject.mention()))
            .await
    }

    async fn send_version_number(&self) -> Result<()> {
        self.slack.indicate_typing(&self.admin).await?;
        self.slack
            .send_direct_message(&self.admin, env!("CARGO_PKG_VERSION"))
            .await
    }

    async fn send_whitelisted_users(&self) -> Result<()> {
        self.slack.indicate_typing(&self.admin).await?;

        let users = self.whitelist.whitelisted_users().await?;
        let mentions: Vec<String> = users.iter().map(User::mention).collect();
        let message = format!("Whitelist: {}", mentions.join(", "));
        self.slack.send_direct_message(&self.admin, &message).await
    }
}

/// Slack events omit fields on several subtypes. Everything downstream
/// assumes a sender with an id, a text and a hub, so the shape is checked
/// once, up front.
fn verify_message_is_complete(event: &MessageEvent) -> Result<(&User, &ChatHub)> {
    let sender = event
        .sender
        .as_ref()
        .ok_or_else(|| Error::invalid_argument("message.sender"))?;
    sender.guard()?;

    if event.text.is_empty() {
        return Err(Error::invalid_argument("message.text"));
    }

    let hub = event
        .hub
        .as_ref()
        .ok_or_else(|| Error::invalid_argument("message.hub"))?;

    Ok((sender, hub))
}
