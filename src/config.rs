//! Bot configuration read from the environment

use std::env;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_PREFIX: &str = "!";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_LOG_DIR: &str = "logs";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// Runtime settings of the bot
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: String,
    /// Prefix for text commands
    pub prefix: String,
    /// Directory holding raffle files and the guild blocklist
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl BotConfig {
    /// Read `DISCORD_TOKEN`, `COMMAND_PREFIX`, `DATA_DIR` and `LOG_DIR`
    ///
    /// # Errors
    /// Returns an error if the token is missing or any set value is empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup
    ///
    /// # Errors
    /// Returns an error if the token is missing or any set value is empty.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &'static str, default: Option<&str>| -> Result<String, ConfigError> {
            match lookup(key) {
                Some(value) if value.trim().is_empty() => Err(ConfigError::Empty(key)),
                Some(value) => Ok(value.trim().to_string()),
                None => default
                    .map(ToString::to_string)
                    .ok_or(ConfigError::Missing(key)),
            }
        };

        Ok(Self {
            token: read("DISCORD_TOKEN", None)?,
            prefix: read("COMMAND_PREFIX", Some(DEFAULT_PREFIX))?,
            data_dir: read("DATA_DIR", Some(DEFAULT_DATA_DIR))?.into(),
            log_dir: read("LOG_DIR", Some(DEFAULT_LOG_DIR))?.into(),
        })
    }

    /// Directory of the per-guild raffle files
    #[must_use]
    pub fn raffle_dir(&self) -> PathBuf {
        self.data_dir.join("raffles")
    }

    #[must_use]
    pub fn blocklist_file(&self) -> PathBuf {
        self.data_dir.join("guild_blocklist.yaml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = BotConfig::from_lookup(lookup(&[("DISCORD_TOKEN", "abc")])).unwrap();
        assert_eq!(config.token, "abc");
        assert_eq!(config.prefix, "!");
        assert_eq!(config.raffle_dir(), PathBuf::from("data").join("raffles"));
        assert_eq!(
            config.blocklist_file(),
            PathBuf::from("data").join("guild_blocklist.yaml")
        );
        assert_eq!(config.log_dir, PathBuf::from("logs"));
    }

    #[test]
    fn test_missing_token() {
        let err = BotConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err.to_string(), "DISCORD_TOKEN must be set");
    }

    #[test]
    fn test_overrides_and_empty_values() {
        let config = BotConfig::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "abc"),
            ("COMMAND_PREFIX", "?"),
            ("DATA_DIR", "/var/lib/raffles"),
        ]))
        .unwrap();
        assert_eq!(config.prefix, "?");
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/raffles"));

        let err =
            BotConfig::from_lookup(lookup(&[("DISCORD_TOKEN", "abc"), ("COMMAND_PREFIX", " ")]))
                .unwrap_err();
        assert!(matches!(err, ConfigError::Empty("COMMAND_PREFIX")));
    }
}
