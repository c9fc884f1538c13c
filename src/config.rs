use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;

use crate::scoring::MatchConfig;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Overs each side gets
    pub overs_per_innings: u32,

    /// SQLite database path
    pub database_url: String,

    /// Scope of the persisted values in the session store
    pub session_id: String,

    /// Optional roster JSON file
    pub roster_path: PathBuf,

    /// Team names used when the roster file is missing
    pub team1_name: String,
    pub team2_name: String,

    /// Delay between recording a delivery and settling it
    pub settle_delay: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            overs_per_innings: env::var("OVERS_PER_INNINGS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .context("OVERS_PER_INNINGS must be a valid number")?,

            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:data/scoreboard.db".to_string()),

            session_id: env::var("SESSION_ID")
                .unwrap_or_else(|_| format!("match-{}", Utc::now().format("%Y%m%d-%H%M%S"))),

            roster_path: env::var("ROSTER_PATH")
                .unwrap_or_else(|_| "data/roster.json".to_string())
                .into(),

            team1_name: env::var("TEAM1_NAME").unwrap_or_else(|_| "Team 1".to_string()),
            team2_name: env::var("TEAM2_NAME").unwrap_or_else(|_| "Team 2".to_string()),

            settle_delay: Duration::from_millis(
                env::var("SETTLE_DELAY_MS")
                    .unwrap_or_else(|_| "500".to_string())
                    .parse()
                    .context("SETTLE_DELAY_MS must be a valid number")?,
            ),
        })
    }

    /// Validated match length
    pub fn match_config(&self) -> Result<MatchConfig> {
        MatchConfig::new(self.overs_per_innings).context("OVERS_PER_INNINGS must be positive")
    }
}
