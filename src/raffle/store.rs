//! Raffle persistence
//!
//! The engine treats the store as the only source of truth: every
//! transaction loads the guild's raffles, mutates them and saves them back.

use crate::raffle::{RaffleMap, StoreError};
use async_trait::async_trait;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Guild-scoped storage of raffle maps
#[async_trait]
pub trait RaffleStore: Send + Sync {
    /// Load the raffles of a guild; a guild with no data yields an empty map
    async fn load(&self, guild_id: u64) -> Result<RaffleMap, StoreError>;

    /// Replace the stored raffles of a guild
    async fn save(&self, guild_id: u64, raffles: &RaffleMap) -> Result<(), StoreError>;
}

/// Store that keeps everything in memory
#[derive(Clone, Default)]
pub struct MemoryStore {
    guilds: Arc<DashMap<u64, RaffleMap>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RaffleStore for MemoryStore {
    async fn load(&self, guild_id: u64) -> Result<RaffleMap, StoreError> {
        Ok(self
            .guilds
            .get(&guild_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }

    async fn save(&self, guild_id: u64, raffles: &RaffleMap) -> Result<(), StoreError> {
        if raffles.is_empty() {
            self.guilds.remove(&guild_id);
        } else {
            self.guilds.insert(guild_id, raffles.clone());
        }
        Ok(())
    }
}

/// Store writing one YAML file per guild
#[derive(Debug, Clone)]
pub struct YamlFileStore {
    dir: PathBuf,
}

impl YamlFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn guild_file(&self, guild_id: u64) -> PathBuf {
        self.dir.join(format!("{guild_id}.yaml"))
    }
}

#[async_trait]
impl RaffleStore for YamlFileStore {
    async fn load(&self, guild_id: u64) -> Result<RaffleMap, StoreError> {
        let path = self.guild_file(guild_id);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(serde_yaml::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(RaffleMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, guild_id: u64, raffles: &RaffleMap) -> Result<(), StoreError> {
        let path = self.guild_file(guild_id);

        if raffles.is_empty() {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            debug!(guild_id, "Removed empty raffle file");
            return Ok(());
        }

        if !self.dir.exists() {
            tokio::fs::create_dir_all(&self.dir).await?;
        }

        // Write then rename so a crash never leaves a half-written file
        let yaml = serde_yaml::to_string(raffles)?;
        let tmp = path.with_extension("yaml.tmp");
        tokio::fs::write(&tmp, yaml).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(guild_id, raffles = raffles.len(), "Saved raffle file");
        Ok(())
    }
}
