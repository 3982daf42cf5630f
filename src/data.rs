use std::{ops::Deref, sync::Arc};

use crate::blocklist::GuildBlocklist;
use crate::config::BotConfig;
use crate::raffle::{MemoryStore, RaffleEngine, YamlFileStore};
use crate::{CONSOLE_TARGET, Error};
use poise::serenity_prelude::prelude::TypeMapKey;
use tracing::info;

/// Centralized data structure for the bot
#[derive(Clone)]
pub struct Data(pub Arc<DataInner>);

// Implement TypeMapKey for Data to allow storing it in Serenity's data map
impl TypeMapKey for Data {
    type Value = Data;
}

impl Default for Data {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Data {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Data")
            .field("raffles", &self.raffles)
            .field("blocklist", &self.blocklist)
            .finish()
    }
}

impl Deref for Data {
    type Target = DataInner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Data {
    /// Data kept entirely in memory
    #[must_use]
    pub fn new() -> Self {
        Self(DataInner::new().into())
    }

    /// Open the on-disk raffle store and blocklist named by the config
    ///
    /// # Errors
    /// Returns an error if the blocklist file exists but cannot be read.
    pub async fn load(config: &BotConfig) -> Result<Self, Error> {
        let raffle_dir = config.raffle_dir();
        let blocklist = GuildBlocklist::load(config.blocklist_file()).await?;
        info!(
            target: CONSOLE_TARGET,
            raffle_dir = %raffle_dir.display(),
            blocked_guilds = blocklist.list().await.len(),
            "Bot data loaded"
        );

        Ok(Self(Arc::new(DataInner {
            raffles: RaffleEngine::new(Arc::new(YamlFileStore::new(raffle_dir))),
            blocklist,
        })))
    }
}

/// Shared state handed to every command and event
#[derive(Debug)]
pub struct DataInner {
    pub raffles: RaffleEngine,
    pub blocklist: GuildBlocklist,
}

impl Default for DataInner {
    fn default() -> Self {
        Self::new()
    }
}

impl DataInner {
    #[must_use]
    pub fn new() -> Self {
        Self {
            raffles: RaffleEngine::new(Arc::new(MemoryStore::new())),
            blocklist: GuildBlocklist::in_memory(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raffle::RaffleDefinition;

    #[tokio::test]
    async fn test_data_new() {
        let data = Data::new();
        assert!(data.raffles.list(1).await.unwrap().is_empty());
        assert!(data.blocklist.list().await.is_empty());
    }

    #[test]
    fn test_data_debug_impl() {
        let data = Data::new();
        let debug_output = format!("{data:?}");
        assert!(debug_output.contains("Data"));
        assert!(debug_output.contains("raffles"));
        assert!(debug_output.contains("blocklist"));
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let data = Data::new();
        let clone = data.clone();
        data.raffles
            .create(5, RaffleDefinition::new("shared", 1))
            .await
            .unwrap();
        data.blocklist.add(9).await.unwrap();

        assert_eq!(clone.raffles.list(5).await.unwrap().len(), 1);
        assert!(clone.blocklist.contains(9).await);
    }

    #[tokio::test]
    async fn test_load_from_config() {
        let dir = std::env::temp_dir().join(format!("raffle-cogs-data-{}", std::process::id()));
        let config = BotConfig {
            token: "token".to_string(),
            prefix: "!".to_string(),
            data_dir: dir.clone(),
            log_dir: dir.join("logs"),
        };

        let data = Data::load(&config).await.unwrap();
        data.raffles
            .create(3, RaffleDefinition::new("persisted", 1))
            .await
            .unwrap();
        assert!(config.raffle_dir().join("3.yaml").exists());

        let reloaded = Data::load(&config).await.unwrap();
        assert_eq!(reloaded.raffles.get(3, "persisted").await.unwrap().owner, 1);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
