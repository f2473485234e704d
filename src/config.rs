//! Configuration loading for Profilebot.
#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Get the Profilebot home directory (~/.profilebot).
pub fn get_home_dir() -> Result<PathBuf> {
    let home = directories::UserDirs::new()
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

    Ok(home.home_dir().join(".profilebot"))
}

/// Get the config file path.
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_home_dir()?.join("config.json"))
}

/// Load settings from ~/.profilebot/config.json
pub fn load_settings() -> Result<Settings> {
    let path = get_config_path()?;

    if !path.exists() {
        return Err(Error::Config(format!(
            "Config file not found at {}. Run 'profilebot setup' first, or set the PROFILEBOT_* environment variables.",
            path.display()
        )));
    }

    load_settings_from(&path)
}

/// Load settings from an explicit config file path.
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Err(Error::Config(format!(
            "Config file not found at {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)?;
    let mut settings: Settings = serde_json::from_str(&content)?;

    apply_env_overrides(&mut settings);
    validate_settings(&settings)?;

    tracing::debug!("Loaded settings from {}", path.display());
    Ok(settings)
}

/// Load settings from the environment only, for installs without a config file.
pub fn load_settings_from_env() -> Result<Settings> {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    validate_settings(&settings)?;
    Ok(settings)
}

/// Environment variables fill in values the file left empty, so an install
/// can run without any config.json at all.
fn apply_env_overrides(settings: &mut Settings) {
    let overrides = [
        ("PROFILEBOT_API_TOKEN", &mut settings.slack.api_token),
        ("PROFILEBOT_ADMIN_USER_ID", &mut settings.slack.admin_user_id),
        ("PROFILEBOT_EMAIL_DOMAIN", &mut settings.slack.email_domain),
        ("PROFILEBOT_FACE_API_KEY", &mut settings.face_detection.key),
        ("PROFILEBOT_FACE_API_URL", &mut settings.face_detection.url),
    ];

    for (key, value) in overrides {
        if value.is_empty() {
            if let Ok(from_env) = std::env::var(key) {
                *value = from_env;
            }
        }
    }
}

fn validate_settings(settings: &Settings) -> Result<()> {
    if settings.slack.api_token.is_empty() {
        return Err(Error::Config("slack.api_token is required".to_string()));
    }
    if settings.slack.admin_user_id.is_empty() {
        return Err(Error::Config("slack.admin_user_id is required".to_string()));
    }
    if settings.slack.email_domain.is_empty() {
        return Err(Error::Config("slack.email_domain is required".to_string()));
    }
    if settings.face_detection.key.is_empty() {
        return Err(Error::Config("face_detection.key is required".to_string()));
    }
    if settings.face_detection.url.is_empty() {
        return Err(Error::Config("face_detection.url is required".to_string()));
    }
    Ok(())
}

/// Slack workspace configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SlackConfig {
    /// Bot token used for the Web API.
    #[serde(default)]
    pub api_token: String,

    /// The single user whose direct messages are treated as commands.
    #[serde(default)]
    pub admin_user_id: String,

    /// Mail domain suffix every member address must carry, e.g. "@example.com".
    #[serde(default)]
    pub email_domain: String,

    /// Signing secret for verifying Events API requests. Verification is
    /// skipped when unset.
    #[serde(default)]
    pub signing_secret: Option<String>,

    /// Port the Events API webhook listens on.
    #[serde(default = "default_events_port")]
    pub events_port: u16,
}

fn default_events_port() -> u16 {
    3380
}

// A missing config section and the no-file path both go through Default,
// so these impls must agree with the serde field defaults.
impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            admin_user_id: String::new(),
            email_domain: String::new(),
            signing_secret: None,
            events_port: default_events_port(),
        }
    }
}

/// Face detection service configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct FaceDetectionConfig {
    /// Access key for the face detection API.
    #[serde(default)]
    pub key: String,

    /// Base URL of the face detection API.
    #[serde(default)]
    pub url: String,

    /// Base wait between throttled detection attempts, in milliseconds.
    #[serde(default = "default_face_delay_ms")]
    pub delay_ms: u64,
}

fn default_face_delay_ms() -> u64 {
    600
}

impl Default for FaceDetectionConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            url: String::new(),
            delay_ms: default_face_delay_ms(),
        }
    }
}

impl FaceDetectionConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Durable storage configuration.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct StorageConfig {
    /// Root directory for whitelist entries and reports. Defaults to
    /// ~/.profilebot/storage.
    pub root: Option<PathBuf>,
}

impl StorageConfig {
    pub fn resolve_root(&self) -> Result<PathBuf> {
        match &self.root {
            Some(root) => Ok(root.clone()),
            None => Ok(get_home_dir()?.join("storage")),
        }
    }
}

/// Profilebot settings.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Settings {
    #[serde(default)]
    pub slack: SlackConfig,

    #[serde(default)]
    pub face_detection: FaceDetectionConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    /// Log a periodic liveness line while running.
    #[serde(default)]
    pub heart_beat: bool,
}

impl Settings {
    /// A config.json skeleton with every key present, for `profilebot setup`.
    pub fn template() -> Self {
        Self {
            slack: SlackConfig {
                api_token: String::new(),
                admin_user_id: String::new(),
                email_domain: "@example.com".to_string(),
                signing_secret: None,
                events_port: default_events_port(),
            },
            face_detection: FaceDetectionConfig {
                key: String::new(),
                url: String::new(),
                delay_ms: default_face_delay_ms(),
            },
            storage: StorageConfig::default(),
            heart_beat: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();

        assert_eq!(settings.slack.events_port, 3380);
        assert_eq!(settings.face_detection.delay_ms, 600);
        assert!(!settings.heart_beat);
        assert!(settings.storage.root.is_none());
    }

    #[test]
    fn test_validate_rejects_missing_token() {
        let mut settings = Settings::template();
        settings.slack.admin_user_id = "U1".to_string();
        settings.face_detection.key = "key".to_string();
        settings.face_detection.url = "https://face.example.com".to_string();

        let err = validate_settings(&settings).unwrap_err();
        assert!(err.to_string().contains("api_token"));
    }

    #[test]
    fn test_validate_accepts_complete_settings() {
        let mut settings = Settings::template();
        settings.slack.api_token = "xoxb-1".to_string();
        settings.slack.admin_user_id = "U1".to_string();
        settings.face_detection.key = "key".to_string();
        settings.face_detection.url = "https://face.example.com".to_string();

        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_face_delay_is_milliseconds() {
        let config = FaceDetectionConfig {
            key: String::new(),
            url: String::new(),
            delay_ms: 600,
        };

        assert_eq!(config.delay(), Duration::from_millis(600));
    }

    #[test]
    fn test_load_settings_from_reads_an_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut settings = Settings::template();
        settings.slack.api_token = "xoxb-1".to_string();
        settings.slack.admin_user_id = "U1".to_string();
        settings.face_detection.key = "key".to_string();
        settings.face_detection.url = "https://face.example.com".to_string();
        std::fs::write(&path, serde_json::to_string(&settings).unwrap()).unwrap();

        let loaded = load_settings_from(&path).unwrap();
        assert_eq!(loaded.slack.api_token, "xoxb-1");
        assert_eq!(loaded.slack.events_port, 3380);
    }

    #[test]
    fn test_load_settings_from_missing_file_errors() {
        let err = load_settings_from(Path::new("/nonexistent/profilebot.json")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_default_settings_match_the_file_defaults() {
        let defaults = Settings::default();

        assert_eq!(defaults.slack.events_port, 3380);
        assert_eq!(defaults.face_detection.delay_ms, 600);
    }

    #[test]
    fn test_load_settings_from_env_alone() {
        let vars = [
            ("PROFILEBOT_API_TOKEN", "xoxb-env"),
            ("PROFILEBOT_ADMIN_USER_ID", "U1ENV"),
            ("PROFILEBOT_EMAIL_DOMAIN", "@example.com"),
            ("PROFILEBOT_FACE_API_KEY", "env-key"),
            ("PROFILEBOT_FACE_API_URL", "https://face.example.com"),
        ];
        for (key, value) in vars {
            std::env::set_var(key, value);
        }

        let loaded = load_settings_from_env();

        for (key, _) in vars {
            std::env::remove_var(key);
        }

        let settings = loaded.unwrap();
        assert_eq!(settings.slack.api_token, "xoxb-env");
        assert_eq!(settings.slack.admin_user_id, "U1ENV");
        assert_eq!(settings.slack.email_domain, "@example.com");
        assert_eq!(settings.slack.events_port, 3380);
        assert_eq!(settings.face_detection.delay_ms, 600);
    }
}
