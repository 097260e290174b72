//! Runtime configuration loaded from the environment
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Placeholder owner used when no user scope is configured
pub const DEFAULT_USER_SCOPE: &str = "00000000-0000-0000-0000-000000000001";

/// Seconds between monitor ticks when nothing else is configured
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 60;

/// Default socket path for the control surface
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/chime.sock";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub log_level: String,
    pub user_scope: String,
    pub check_interval_secs: u64,
    /// Start the monitor as soon as the daemon boots
    pub autostart: bool,
    pub socket_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_path: "chime.db".to_string(),
            log_level: "info".to_string(),
            user_scope: DEFAULT_USER_SCOPE.to_string(),
            check_interval_secs: DEFAULT_CHECK_INTERVAL_SECS,
            autostart: false,
            socket_path: DEFAULT_SOCKET_PATH.to_string(),
        }
    }
}

impl Config {
    /// Build the config from environment variables, falling back to defaults.
    ///
    /// Call `dotenvy::dotenv()` first if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let check_interval_secs = match env::var("CHIME_CHECK_INTERVAL_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("CHIME_CHECK_INTERVAL_SECS is not a number: {raw}"))?,
            Err(_) => defaults.check_interval_secs,
        };

        let autostart = match env::var("CHIME_AUTOSTART") {
            Ok(raw) => parse_flag(&raw)
                .with_context(|| format!("CHIME_AUTOSTART is not a boolean: {raw}"))?,
            Err(_) => defaults.autostart,
        };

        Ok(Config {
            database_path: env::var("DATABASE_PATH").unwrap_or(defaults.database_path),
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            user_scope: env::var("CHIME_USER_SCOPE").unwrap_or(defaults.user_scope),
            check_interval_secs,
            autostart,
            socket_path: env::var("CHIME_IPC_SOCKET").unwrap_or(defaults.socket_path),
        })
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(anyhow::anyhow!("expected true/false")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.user_scope, DEFAULT_USER_SCOPE);
        assert_eq!(config.check_interval(), Duration::from_secs(60));
        assert!(!config.autostart);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true").unwrap());
        assert!(parse_flag(" ON ").unwrap());
        assert!(!parse_flag("0").unwrap());
        assert!(parse_flag("maybe").is_err());
    }
}
