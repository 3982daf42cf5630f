//! Guild blocklist
//!
//! Bot owners keep a list of guilds the bot refuses to stay in. The list is
//! global and persisted as YAML; the event handler checks it whenever the
//! bot is added to a guild.

use crate::EVENT_TARGET;
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

/// Errors from blocklist operations
#[derive(Debug, Error)]
pub enum BlocklistError {
    #[error("This guild is already on the blocklist.")]
    AlreadyBlocked,

    #[error("This guild is not on the blocklist.")]
    NotBlocked,

    #[error("Blocklist storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Blocklist format error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type BlocklistResult<T> = Result<T, BlocklistError>;

/// Ordered set of blocked guild ids
#[derive(Debug, Default)]
pub struct GuildBlocklist {
    /// Where the list is persisted; `None` keeps it in memory only
    path: Option<PathBuf>,
    guilds: RwLock<Vec<u64>>,
}

impl GuildBlocklist {
    /// A blocklist that is never written to disk
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the blocklist from a YAML file; a missing file is an empty list
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(path: impl Into<PathBuf>) -> BlocklistResult<Self> {
        let path = path.into();
        let guilds = match tokio::fs::read_to_string(&path).await {
            Ok(content) => serde_yaml::from_str::<Vec<u64>>(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path: Some(path),
            guilds: RwLock::new(guilds),
        })
    }

    async fn persist(&self, guilds: &[u64]) -> BlocklistResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                tokio::fs::create_dir_all(dir).await?;
            }
        }
        // Write then rename so a failed write leaves the old file intact
        let tmp = path.with_extension("yaml.tmp");
        tokio::fs::write(&tmp, serde_yaml::to_string(guilds)?).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Apply `edit` to a copy of the list and keep it only once it is on disk
    async fn update<F>(&self, edit: F) -> BlocklistResult<()>
    where
        F: FnOnce(&mut Vec<u64>) -> BlocklistResult<()>,
    {
        let mut guilds = self.guilds.write().await;
        let mut updated = guilds.clone();
        edit(&mut updated)?;
        self.persist(&updated).await?;
        *guilds = updated;
        Ok(())
    }

    /// # Errors
    /// Returns [`BlocklistError::AlreadyBlocked`] if the guild is listed.
    pub async fn add(&self, guild_id: u64) -> BlocklistResult<()> {
        self.update(|guilds| {
            if guilds.contains(&guild_id) {
                return Err(BlocklistError::AlreadyBlocked);
            }
            guilds.push(guild_id);
            Ok(())
        })
        .await?;
        info!(target: EVENT_TARGET, guild_id, event = "blocklist_add", "Guild added to blocklist");
        Ok(())
    }

    /// # Errors
    /// Returns [`BlocklistError::NotBlocked`] if the guild is not listed.
    pub async fn remove(&self, guild_id: u64) -> BlocklistResult<()> {
        self.update(|guilds| {
            let Some(position) = guilds.iter().position(|id| *id == guild_id) else {
                return Err(BlocklistError::NotBlocked);
            };
            guilds.remove(position);
            Ok(())
        })
        .await?;
        info!(target: EVENT_TARGET, guild_id, event = "blocklist_remove", "Guild removed from blocklist");
        Ok(())
    }

    /// # Errors
    /// Returns an error if the emptied list cannot be written.
    pub async fn clear(&self) -> BlocklistResult<()> {
        self.update(|guilds| {
            guilds.clear();
            Ok(())
        })
        .await?;
        info!(target: EVENT_TARGET, event = "blocklist_clear", "Guild blocklist cleared");
        Ok(())
    }

    /// Blocked guilds in the order they were added
    pub async fn list(&self) -> Vec<u64> {
        self.guilds.read().await.clone()
    }

    pub async fn contains(&self, guild_id: u64) -> bool {
        self.guilds.read().await.contains(&guild_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_remove_clear() {
        let blocklist = GuildBlocklist::in_memory();
        blocklist.add(1).await.unwrap();
        blocklist.add(2).await.unwrap();
        assert!(matches!(
            blocklist.add(1).await,
            Err(BlocklistError::AlreadyBlocked)
        ));
        assert_eq!(blocklist.list().await, vec![1, 2]);
        assert!(blocklist.contains(2).await);

        blocklist.remove(1).await.unwrap();
        assert!(matches!(
            blocklist.remove(1).await,
            Err(BlocklistError::NotBlocked)
        ));
        assert_eq!(blocklist.list().await, vec![2]);

        blocklist.clear().await.unwrap();
        assert!(blocklist.list().await.is_empty());
        assert!(!blocklist.contains(2).await);
    }

    #[tokio::test]
    async fn test_persists_between_loads() {
        let dir = std::env::temp_dir().join(format!("raffle-cogs-blocklist-{}", std::process::id()));
        let path = dir.join("guild_blocklist.yaml");

        let blocklist = GuildBlocklist::load(&path).await.unwrap();
        assert!(blocklist.list().await.is_empty());
        blocklist.add(42).await.unwrap();
        blocklist.add(7).await.unwrap();

        let reloaded = GuildBlocklist::load(&path).await.unwrap();
        assert_eq!(reloaded.list().await, vec![42, 7]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_list_unchanged() {
        let dir =
            std::env::temp_dir().join(format!("raffle-cogs-blocklist-fail-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("sub").join("guild_blocklist.yaml");

        let blocklist = GuildBlocklist::load(&path).await.unwrap();
        blocklist.add(7).await.unwrap();

        // A file where the directory should be makes every write fail
        std::fs::remove_dir_all(dir.join("sub")).unwrap();
        std::fs::write(dir.join("sub"), "not a directory").unwrap();

        assert!(blocklist.add(42).await.is_err());
        assert!(!blocklist.contains(42).await);
        assert!(blocklist.remove(7).await.is_err());
        assert!(blocklist.contains(7).await);
        assert!(blocklist.clear().await.is_err());
        assert_eq!(blocklist.list().await, vec![7]);

        // Once writes work again, the retry succeeds instead of reporting a duplicate
        std::fs::remove_file(dir.join("sub")).unwrap();
        blocklist.add(42).await.unwrap();
        assert_eq!(blocklist.list().await, vec![7, 42]);
        let reloaded = GuildBlocklist::load(&path).await.unwrap();
        assert_eq!(reloaded.list().await, vec![7, 42]);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
