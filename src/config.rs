//! Configuration management for the alliance bot
//!
//! Loads settings from environment variables (.env file)

use std::env;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Discord bot token
    pub discord_token: String,
    /// Optional guild ID for development (faster command sync)
    pub guild_id: Option<u64>,
    /// SQLite file holding player records
    pub database_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let discord_token = env::var("DISCORD_TOKEN")
            .map_err(|_| ConfigError::MissingEnvVar("DISCORD_TOKEN".to_string()))?;

        let guild_id = parse_guild_id(env::var("GUILD_ID").ok())?;

        let database_path = env::var("DATABASE_PATH")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "alliance.db".to_string())
            .into();

        Ok(Self {
            discord_token,
            guild_id,
            database_path,
        })
    }
}

fn parse_guild_id(value: Option<String>) -> Result<Option<u64>, ConfigError> {
    value
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue("GUILD_ID".to_string(), s))
        })
        .transpose()
}
