//! The closed set of Profilebot commands.
#![allow(dead_code)]

use crate::slack::Mention;

/// Everything an admin DM can mean, plus the two fallbacks. Commands with a
/// target carry only the mentioned id; the dispatcher resolves the full user
/// when it needs one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Any DM from a non-admin: check the sender's own profile.
    AnswerRegularUser,
    ValidateAllProfiles,
    NotifyAllProfiles,
    ValidateSingleProfile(Mention),
    NotifySingleProfile(Mention),
    WhitelistSingleProfile(Mention),
    ShowWhitelistedUsers,
    ShowVersion,
    Unknown,
}

/// Sent whenever the admin's message parses to `Unknown`.
pub const HELP_TEXT: &str = "Available commands are:
- validate all users
- notify all users
- validate @user
- notify @user
- whitelist
- whitelist @user
- version";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_with_same_payload_are_equal() {
        assert_eq!(Command::ValidateAllProfiles, Command::ValidateAllProfiles);
        assert_eq!(
            Command::ValidateSingleProfile(Mention::new("U1")),
            Command::ValidateSingleProfile(Mention::new("U1"))
        );
    }

    #[test]
    fn test_commands_with_different_payloads_differ() {
        assert_ne!(
            Command::ValidateSingleProfile(Mention::new("U1")),
            Command::ValidateSingleProfile(Mention::new("U2"))
        );
        assert_ne!(
            Command::ValidateSingleProfile(Mention::new("U1")),
            Command::NotifySingleProfile(Mention::new("U1"))
        );
        assert_ne!(Command::ValidateAllProfiles, Command::NotifyAllProfiles);
    }

    #[test]
    fn test_help_text_lists_every_phrase() {
        for phrase in [
            "validate all users",
            "notify all users",
            "validate @user",
            "notify @user",
            "whitelist",
            "whitelist @user",
            "version",
        ] {
            assert!(HELP_TEXT.contains(phrase), "missing {phrase}");
        }
    }
}
