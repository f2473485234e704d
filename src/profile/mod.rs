//! Profile validation against the team's rules.
#![allow(dead_code)]

pub mod report;

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::face::ImageChecker;
use crate::slack::User;

pub use report::ValidationReport;

/// The platform's own bot account, always exempt.
const SYSTEM_BOT_NAME: &str = "slackbot";

/// Outcome of validating one profile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub subject: User,
    /// User-addressed message; empty exactly when the profile is valid.
    pub errors: String,
    /// Set only when the image check flagged the profile image.
    pub suspect_image: Option<String>,
}

impl ValidationResult {
    pub fn valid(subject: User) -> Self {
        Self {
            valid: true,
            subject,
            errors: String::new(),
            suspect_image: None,
        }
    }

    pub fn invalid(subject: User, errors: String, suspect_image: Option<String>) -> Self {
        Self {
            valid: false,
            subject,
            errors,
            suspect_image,
        }
    }
}

/// Validates that a user profile is complete.
#[async_trait]
pub trait ProfileValidator: Send + Sync {
    async fn validate_profile(&self, user: &User) -> Result<ValidationResult>;
}

/// The team's rule set: email shape, names, the "what I do" field, and a
/// face-checked profile image. Bot and deleted accounts are never reported.
pub struct SlackProfileValidator {
    admin: User,
    email_domain: String,
    image_checker: Arc<dyn ImageChecker>,
}

impl SlackProfileValidator {
    pub fn new(
        admin: User,
        email_domain: impl Into<String>,
        image_checker: Arc<dyn ImageChecker>,
    ) -> Self {
        Self {
            admin,
            email_domain: email_domain.into(),
            image_checker,
        }
    }

    fn validate_email(&self, user: &User, errors: &mut Vec<String>) {
        if user.email.is_empty() {
            errors.push("Email is missing".to_string());
            return;
        }

        if !user.email.ends_with(&self.email_domain) {
            errors.push(format!("Email must end with {}", self.email_domain));
        }
        if !user.email.starts_with(&user.name) {
            errors.push(format!("Email must start with your username {}", user.name));
        }
    }

    async fn validate_image(
        &self,
        user: &User,
        errors: &mut Vec<String>,
    ) -> Result<Option<String>> {
        let Some(image) = user.image.as_deref() else {
            errors.push("Please upload a profile image of yourself".to_string());
            return Ok(None);
        };

        let face_check = self.image_checker.check_image(user).await?;
        if face_check.valid {
            Ok(None)
        } else {
            errors.push(face_check.errors);
            Ok(Some(image.to_string()))
        }
    }
}

#[async_trait]
impl ProfileValidator for SlackProfileValidator {
    async fn validate_profile(&self, user: &User) -> Result<ValidationResult> {
        user.guard()?;
        if user.name.is_empty() {
            return Err(Error::invalid_argument("user.name"));
        }

        let mut errors = Vec::new();
        self.validate_email(user, &mut errors);
        if user.first_name.is_empty() {
            errors.push("First name is missing".to_string());
        }
        if user.last_name.is_empty() {
            errors.push("Last name is missing".to_string());
        }
        if user.what_i_do.is_empty() {
            errors.push("What I do is missing".to_string());
        }
        let suspect_image = self.validate_image(user, &mut errors).await?;

        if errors.is_empty() || user.is_bot || user.deleted || user.name == SYSTEM_BOT_NAME {
            return Ok(ValidationResult::valid(user.clone()));
        }

        let message = format!(
            "Hello <@{}>!\nYour profile is incomplete:\n{}\nPlease update your profile. Contact <@{}> if you need help.",
            user.id,
            errors.join("\n"),
            self.admin.id
        );

        Ok(ValidationResult::invalid(
            user.clone(),
            message,
            suspect_image,
        ))
    }
}
