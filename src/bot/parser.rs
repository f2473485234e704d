//! Turns raw DM text into a `Command`.
#![allow(dead_code)]

use super::commands::Command;
use crate::slack::Mention;

/// Parses a direct message. Only the admin gets the command vocabulary;
/// everyone else always maps to a self-check. Pure, no I/O.
pub fn parse_command(sender_id: &str, text: &str, admin_id: &str) -> Command {
    if sender_id != admin_id {
        return Command::AnswerRegularUser;
    }

    let normalized = text.trim().to_lowercase();
    match normalized.as_str() {
        "validate all users" => Command::ValidateAllProfiles,
        "notify all users" => Command::NotifyAllProfiles,
        "version" => Command::ShowVersion,
        "whitelist" => Command::ShowWhitelistedUsers,
        _ => parse_targeted_command(&normalized),
    }
}

/// The `verb <@id>` form: exactly two tokens, the second a well-formed
/// mention. Extracted ids are upper-cased.
fn parse_targeted_command(text: &str) -> Command {
    let tokens: Vec<&str> = text.split(' ').collect();
    if tokens.len() != 2 {
        return Command::Unknown;
    }

    let mention = match tokens[1].parse::<Mention>() {
        Ok(mention) => Mention::new(mention.id.to_uppercase()),
        Err(_) => return Command::Unknown,
    };

    match tokens[0] {
        "validate" => Command::ValidateSingleProfile(mention),
        "notify" => Command::NotifySingleProfile(mention),
        "whitelist" => Command::WhitelistSingleProfile(mention),
        _ => Command::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADMIN: &str = "U0ADMIN";

    #[test]
    fn test_non_admin_always_gets_self_check() {
        for text in ["hi", "validate all users", "whitelist <@U1>", "version", ""] {
            assert_eq!(
                parse_command("U1REGULAR", text, ADMIN),
                Command::AnswerRegularUser,
                "text {text:?}"
            );
        }
    }

    #[test]
    fn test_admin_exact_phrases() {
        assert_eq!(
            parse_command(ADMIN, "validate all users", ADMIN),
            Command::ValidateAllProfiles
        );
        assert_eq!(
            parse_command(ADMIN, "notify all users", ADMIN),
            Command::NotifyAllProfiles
        );
        assert_eq!(parse_command(ADMIN, "version", ADMIN), Command::ShowVersion);
        assert_eq!(
            parse_command(ADMIN, "whitelist", ADMIN),
            Command::ShowWhitelistedUsers
        );
    }

    #[test]
    fn test_admin_phrases_are_trimmed_and_case_insensitive() {
        assert_eq!(
            parse_command(ADMIN, "  Validate All Users  ", ADMIN),
            Command::ValidateAllProfiles
        );
        assert_eq!(parse_command(ADMIN, " VERSION", ADMIN), Command::ShowVersion);
    }

    #[test]
    fn test_admin_targeted_commands() {
        assert_eq!(
            parse_command(ADMIN, "validate <@U1TBU8337>", ADMIN),
            Command::ValidateSingleProfile(Mention::new("U1TBU8337"))
        );
        assert_eq!(
            parse_command(ADMIN, "notify <@U1TBU8337>", ADMIN),
            Command::NotifySingleProfile(Mention::new("U1TBU8337"))
        );
        assert_eq!(
            parse_command(ADMIN, "whitelist <@U1TBU8337>", ADMIN),
            Command::WhitelistSingleProfile(Mention::new("U1TBU8337"))
        );
    }

    #[test]
    fn test_mention_ids_are_upper_cased() {
        assert_eq!(
            parse_command(ADMIN, "validate <@u1tbu8337>", ADMIN),
            Command::ValidateSingleProfile(Mention::new("U1TBU8337"))
        );
    }

    #[test]
    fn test_admin_gibberish_is_unknown() {
        for text in [
            "jadda",
            "validate all",
            "validate U1TBU8337",
            "validate <@>",
            "validate <@U1",
            "validate @U1>",
            "punish <@U1TBU8337>",
            "whitelist <@U1> now",
            "validate  <@U1>",
            "",
        ] {
            assert_eq!(
                parse_command(ADMIN, text, ADMIN),
                Command::Unknown,
                "text {text:?}"
            );
        }
    }
}
