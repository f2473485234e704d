//! CLI commands for Profilebot using clap.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::bot::Profilebot;
use crate::config::{self, Settings};
use crate::face::{FaceDetectionClient, FaceWhitelist, HttpFaceDetector, StoredWhitelist};
use crate::heartbeat::Heartbeat;
use crate::profile::SlackProfileValidator;
use crate::slack::{SlackWebIntegration, User};
use crate::storage::FsBlobStore;

#[derive(Parser)]
#[command(name = "profilebot")]
#[command(version)]
#[command(about = "Validates the profiles of Slack users according to your team's rules", long_about = None)]
pub struct Commands {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Connect to Slack and answer direct messages until interrupted
    Run {
        /// Path to an alternative config.json
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Write a config.json template to ~/.profilebot
    Setup,
}

impl Commands {
    /// Run the command.
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            Command::Run { config } => cmd_run(config.as_deref()).await,
            Command::Setup => cmd_setup().await,
        }
    }
}

// Command implementations

async fn cmd_run(config_path: Option<&Path>) -> Result<()> {
    tracing::info!("Starting Profilebot.");

    let settings = resolve_settings(config_path)?;
    let bot = build_bot(&settings)?;

    bot.connect().await.context("Failed to connect to Slack")?;
    println!("Connected to Slack. Press Ctrl-C to stop.");

    let heartbeat = settings.heart_beat.then(Heartbeat::start);

    tokio::select! {
        result = Arc::clone(&bot).run() => result?,
        _ = tokio::signal::ctrl_c() => {
            println!("\nDisconnecting...");
        }
    }

    if let Some(heartbeat) = &heartbeat {
        heartbeat.stop();
    }
    bot.dispose()
        .await
        .context("Failed to disconnect from Slack")?;

    tracing::info!("Stopping Profilebot.");
    Ok(())
}

async fn cmd_setup() -> Result<()> {
    let home = config::get_home_dir()?;
    std::fs::create_dir_all(&home)?;
    std::fs::create_dir_all(home.join("logs"))?;
    std::fs::create_dir_all(home.join("storage"))?;
    println!("✓ Created directory structure at {}", home.display());

    let path = config::get_config_path()?;
    if path.exists() {
        println!(
            "Config already exists at {}, leaving it untouched.",
            path.display()
        );
        return Ok(());
    }

    let template = serde_json::to_string_pretty(&Settings::template())?;
    std::fs::write(&path, template)?;
    println!("✓ Wrote config template to {}", path.display());
    println!();
    println!("Fill in slack.api_token, slack.admin_user_id, face_detection.key");
    println!("and face_detection.url, or set the PROFILEBOT_* environment");
    println!("variables instead.");
    Ok(())
}

/// An explicit --config path wins. Otherwise the default file is used when
/// present, and a pure-environment setup when not.
fn resolve_settings(config_path: Option<&Path>) -> Result<Settings> {
    let settings = match config_path {
        Some(path) => config::load_settings_from(path)?,
        None => {
            if config::get_config_path()?.exists() {
                config::load_settings()?
            } else {
                config::load_settings_from_env()?
            }
        }
    };
    Ok(settings)
}

/// Wires the collaborators together: store, whitelist, face detection,
/// validator, Slack integration, bot.
fn build_bot(settings: &Settings) -> Result<Arc<Profilebot>> {
    let store = Arc::new(FsBlobStore::new(settings.storage.resolve_root()?));
    let whitelist: Arc<dyn FaceWhitelist> = Arc::new(StoredWhitelist::new(store));

    let detector = Arc::new(HttpFaceDetector::new(
        &settings.face_detection.key,
        &settings.face_detection.url,
    ));
    let image_checker = Arc::new(FaceDetectionClient::new(
        detector,
        Arc::clone(&whitelist),
        settings.face_detection.delay(),
    ));

    let admin = User::with_id(&settings.slack.admin_user_id);
    let validator = Arc::new(SlackProfileValidator::new(
        admin.clone(),
        &settings.slack.email_domain,
        image_checker,
    ));

    let slack = Arc::new(SlackWebIntegration::new(
        &settings.slack.api_token,
        settings.slack.signing_secret.clone(),
        settings.slack.events_port,
    ));

    let bot = Profilebot::new(slack, validator, whitelist, &admin)?;
    Ok(Arc::new(bot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Commands::command().debug_assert();
    }

    #[test]
    fn run_accepts_a_config_override() {
        let commands =
            Commands::try_parse_from(["profilebot", "run", "--config", "/tmp/profilebot.json"])
                .unwrap();

        match &commands.command {
            Command::Run { config } => {
                assert_eq!(config.as_deref(), Some(Path::new("/tmp/profilebot.json")));
            }
            _ => panic!("expected the run command"),
        }
    }

    #[test]
    fn run_config_defaults_to_none() {
        let commands = Commands::try_parse_from(["profilebot", "run"]).unwrap();

        match &commands.command {
            Command::Run { config } => assert!(config.is_none()),
            _ => panic!("expected the run command"),
        }
    }

    #[test]
    fn build_bot_wires_the_collaborators() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::template();
        settings.slack.api_token = "xoxb-1".to_string();
        settings.slack.admin_user_id = "U1".to_string();
        settings.face_detection.key = "key".to_string();
        settings.face_detection.url = "https://face.example.com".to_string();
        settings.storage.root = Some(dir.path().to_path_buf());

        assert!(build_bot(&settings).is_ok());
    }
}
