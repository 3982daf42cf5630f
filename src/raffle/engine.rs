//! Raffle lifecycle engine
//!
//! Owns the raffles of every guild through a [`RaffleStore`]. Each mutation
//! is one transaction: take the guild's lock, load, apply, save, release.
//! A transition that fails leaves the store untouched.

use crate::RAFFLE_TARGET;
use crate::raffle::{
    ConditionChange, ConditionValue, EntityResolver, LifecycleError, Participant, RaffleDefinition,
    RaffleMap, RaffleResult, RaffleStore, parser,
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rand::seq::IndexedRandom;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Raffle state machine over a guild-scoped store
#[derive(Clone)]
pub struct RaffleEngine {
    store: Arc<dyn RaffleStore>,
    /// One lock per guild, created on first use
    locks: Arc<DashMap<u64, Arc<Mutex<()>>>>,
}

impl std::fmt::Debug for RaffleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RaffleEngine")
            .field("locked_guilds", &self.locks.len())
            .finish_non_exhaustive()
    }
}

fn find<'a>(raffles: &'a RaffleMap, name: &str) -> Result<&'a RaffleDefinition, LifecycleError> {
    raffles
        .get(&name.to_lowercase())
        .ok_or_else(|| LifecycleError::NotFound(name.to_string()))
}

fn find_mut<'a>(
    raffles: &'a mut RaffleMap,
    name: &str,
) -> Result<&'a mut RaffleDefinition, LifecycleError> {
    raffles
        .get_mut(&name.to_lowercase())
        .ok_or_else(|| LifecycleError::NotFound(name.to_string()))
}

fn remove(raffles: &mut RaffleMap, name: &str) -> Result<RaffleDefinition, LifecycleError> {
    raffles
        .remove(&name.to_lowercase())
        .ok_or_else(|| LifecycleError::NotFound(name.to_string()))
}

/// Apply a condition edit to an optional field
fn apply_condition<T>(
    field: &mut Option<T>,
    value: ConditionValue<T>,
) -> Result<ConditionChange, LifecycleError> {
    match value {
        ConditionValue::Enable => Err(LifecycleError::BooleanNotAllowed),
        ConditionValue::Disable => {
            *field = None;
            Ok(ConditionChange::Removed)
        }
        ConditionValue::Set(value) => {
            *field = Some(value);
            Ok(ConditionChange::Updated)
        }
    }
}

impl RaffleEngine {
    pub fn new(store: Arc<dyn RaffleStore>) -> Self {
        Self {
            store,
            locks: Arc::new(DashMap::new()),
        }
    }

    fn scope_lock(&self, guild_id: u64) -> Arc<Mutex<()>> {
        Arc::clone(self.locks.entry(guild_id).or_default().value())
    }

    /// Run `apply` on the guild's raffles under the guild lock.
    ///
    /// The map is saved only when `apply` returns `Ok`. The lock is released
    /// on every exit path when the guard drops.
    ///
    /// # Errors
    /// Returns the error of `apply`, or a store error from loading or saving.
    pub async fn with_scope_lock<T, F>(&self, guild_id: u64, apply: F) -> RaffleResult<T>
    where
        F: FnOnce(&mut RaffleMap) -> RaffleResult<T>,
    {
        let lock = self.scope_lock(guild_id);
        let _guard = lock.lock().await;

        let mut raffles = self.store.load(guild_id).await?;
        let value = apply(&mut raffles)?;
        self.store.save(guild_id, &raffles).await?;
        Ok(value)
    }

    /// Read the guild's raffles under the guild lock without saving
    async fn read<T, F>(&self, guild_id: u64, view: F) -> RaffleResult<T>
    where
        F: FnOnce(&RaffleMap) -> RaffleResult<T>,
    {
        let lock = self.scope_lock(guild_id);
        let _guard = lock.lock().await;

        let raffles = self.store.load(guild_id).await?;
        view(&raffles)
    }

    /// Store a freshly parsed raffle
    ///
    /// # Errors
    /// Returns [`LifecycleError::DuplicateName`] if the name is taken, ignoring case.
    pub async fn create(&self, guild_id: u64, raffle: RaffleDefinition) -> RaffleResult<String> {
        let key = raffle.key();
        let owner = raffle.owner;
        self.with_scope_lock(guild_id, |raffles| {
            if raffles.contains_key(&key) {
                return Err(LifecycleError::DuplicateName(raffle.name).into());
            }
            raffles.insert(key.clone(), raffle);
            Ok(())
        })
        .await?;

        info!(
            target: RAFFLE_TARGET,
            guild_id,
            raffle = %key,
            owner,
            event = "create",
            "Raffle created"
        );
        Ok(key)
    }

    /// Enter a participant, checking eligibility in the same transaction
    ///
    /// # Errors
    /// Returns [`LifecycleError::NotFound`] or the first failing join check.
    pub async fn join(
        &self,
        guild_id: u64,
        name: &str,
        participant: &Participant,
        now: DateTime<Utc>,
    ) -> RaffleResult<()> {
        self.with_scope_lock(guild_id, |raffles| {
            find_mut(raffles, name)?.enter(participant, now)?;
            Ok(())
        })
        .await?;

        info!(
            target: RAFFLE_TARGET,
            guild_id,
            raffle = %name,
            user_id = participant.user_id,
            event = "join",
            "Participant joined raffle"
        );
        Ok(())
    }

    /// # Errors
    /// Returns [`LifecycleError::NotFound`] or [`LifecycleError::NotEntered`].
    pub async fn leave(&self, guild_id: u64, name: &str, user_id: u64) -> RaffleResult<()> {
        self.with_scope_lock(guild_id, |raffles| {
            find_mut(raffles, name)?.withdraw(user_id)?;
            Ok(())
        })
        .await?;

        info!(target: RAFFLE_TARGET, guild_id, raffle = %name, user_id, event = "leave", "Participant left raffle");
        Ok(())
    }

    /// Owner removes an entrant
    ///
    /// # Errors
    /// Returns [`LifecycleError::NotFound`], [`LifecycleError::NotOwner`] or
    /// [`LifecycleError::NotEntered`].
    pub async fn kick(
        &self,
        guild_id: u64,
        name: &str,
        actor: u64,
        user_id: u64,
    ) -> RaffleResult<()> {
        self.with_scope_lock(guild_id, |raffles| {
            let raffle = find_mut(raffles, name)?;
            raffle.ensure_owner(actor)?;
            raffle.withdraw(user_id)?;
            Ok(())
        })
        .await?;

        info!(target: RAFFLE_TARGET, guild_id, raffle = %name, user_id, actor, event = "kick", "Participant kicked from raffle");
        Ok(())
    }

    /// # Errors
    /// Returns [`LifecycleError::NotFound`] or [`LifecycleError::NotOwner`].
    pub async fn check_owner(&self, guild_id: u64, name: &str, actor: u64) -> RaffleResult<()> {
        self.read(guild_id, |raffles| {
            find(raffles, name)?.ensure_owner(actor)?;
            Ok(())
        })
        .await
    }

    /// Set or remove the account age requirement
    ///
    /// # Errors
    /// Returns [`LifecycleError::NotFound`], [`LifecycleError::BooleanNotAllowed`]
    /// or an out-of-range [`crate::raffle::ParseError`].
    pub async fn edit_account_age(
        &self,
        guild_id: u64,
        name: &str,
        value: ConditionValue<u64>,
        now: DateTime<Utc>,
    ) -> RaffleResult<ConditionChange> {
        let change = self
            .with_scope_lock(guild_id, |raffles| {
                let raffle = find_mut(raffles, name)?;
                if let ConditionValue::Set(days) = value {
                    parser::validate_account_age(days, now)?;
                }
                Ok(apply_condition(&mut raffle.account_age_days, value)?)
            })
            .await?;

        info!(target: RAFFLE_TARGET, guild_id, raffle = %name, change = ?change, event = "edit_account_age", "Raffle condition edited");
        Ok(change)
    }

    /// Set or remove the guild join age requirement
    ///
    /// # Errors
    /// Returns [`LifecycleError::NotFound`], [`LifecycleError::BooleanNotAllowed`]
    /// or an out-of-range [`crate::raffle::ParseError`].
    pub async fn edit_join_age(
        &self,
        guild_id: u64,
        name: &str,
        value: ConditionValue<u64>,
        guild_created_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> RaffleResult<ConditionChange> {
        let change = self
            .with_scope_lock(guild_id, |raffles| {
                let raffle = find_mut(raffles, name)?;
                if let ConditionValue::Set(days) = value {
                    parser::validate_join_age(days, guild_created_at, now)?;
                }
                Ok(apply_condition(&mut raffle.join_age_days, value)?)
            })
            .await?;

        info!(target: RAFFLE_TARGET, guild_id, raffle = %name, change = ?change, event = "edit_join_age", "Raffle condition edited");
        Ok(change)
    }

    /// # Errors
    /// Returns [`LifecycleError::NotFound`] or [`LifecycleError::BooleanNotAllowed`].
    pub async fn edit_description(
        &self,
        guild_id: u64,
        name: &str,
        value: ConditionValue<String>,
    ) -> RaffleResult<ConditionChange> {
        self.with_scope_lock(guild_id, |raffles| {
            let raffle = find_mut(raffles, name)?;
            Ok(apply_condition(&mut raffle.description, value)?)
        })
        .await
    }

    /// # Errors
    /// Returns [`LifecycleError::NotFound`] or [`LifecycleError::BooleanNotAllowed`].
    pub async fn edit_maximum_entries(
        &self,
        guild_id: u64,
        name: &str,
        value: ConditionValue<u64>,
    ) -> RaffleResult<ConditionChange> {
        let change = self
            .with_scope_lock(guild_id, |raffles| {
                let raffle = find_mut(raffles, name)?;
                Ok(apply_condition(&mut raffle.maximum_entries, value)?)
            })
            .await?;

        info!(target: RAFFLE_TARGET, guild_id, raffle = %name, change = ?change, event = "edit_maximum_entries", "Raffle condition edited");
        Ok(change)
    }

    /// Edit one raffle with a definition method that returns a lifecycle result
    async fn edit_with<F>(&self, guild_id: u64, name: &str, edit: F) -> RaffleResult<()>
    where
        F: FnOnce(&mut RaffleDefinition) -> Result<(), LifecycleError>,
    {
        self.with_scope_lock(guild_id, |raffles| {
            edit(find_mut(raffles, name)?)?;
            Ok(())
        })
        .await
    }

    /// # Errors
    /// Returns [`LifecycleError::NotFound`] or [`LifecycleError::AlreadyPrevented`].
    pub async fn add_prevented(&self, guild_id: u64, name: &str, user_id: u64) -> RaffleResult<()> {
        self.edit_with(guild_id, name, |raffle| raffle.prevent(user_id))
            .await?;
        info!(target: RAFFLE_TARGET, guild_id, raffle = %name, user_id, event = "prevent", "User prevented from raffle");
        Ok(())
    }

    /// # Errors
    /// Returns [`LifecycleError::NotFound`] or [`LifecycleError::NotPrevented`].
    pub async fn remove_prevented(
        &self,
        guild_id: u64,
        name: &str,
        user_id: u64,
    ) -> RaffleResult<()> {
        self.edit_with(guild_id, name, |raffle| raffle.unprevent(user_id))
            .await
    }

    /// # Errors
    /// Returns [`LifecycleError::NotFound`] or [`LifecycleError::NoPreventedUsers`].
    pub async fn clear_prevented(&self, guild_id: u64, name: &str) -> RaffleResult<()> {
        self.edit_with(guild_id, name, RaffleDefinition::clear_prevented)
            .await
    }

    /// # Errors
    /// Returns [`LifecycleError::NotFound`] or [`LifecycleError::RoleAlreadyRequired`].
    pub async fn add_required_role(
        &self,
        guild_id: u64,
        name: &str,
        role_id: u64,
    ) -> RaffleResult<()> {
        self.edit_with(guild_id, name, |raffle| raffle.require_role(role_id))
            .await
    }

    /// # Errors
    /// Returns [`LifecycleError::NotFound`] or [`LifecycleError::RoleNotRequired`].
    pub async fn remove_required_role(
        &self,
        guild_id: u64,
        name: &str,
        role_id: u64,
    ) -> RaffleResult<()> {
        self.edit_with(guild_id, name, |raffle| raffle.unrequire_role(role_id))
            .await
    }

    /// # Errors
    /// Returns [`LifecycleError::NotFound`] or [`LifecycleError::NoRequiredRoles`].
    pub async fn clear_required_roles(&self, guild_id: u64, name: &str) -> RaffleResult<()> {
        self.edit_with(guild_id, name, RaffleDefinition::clear_required_roles)
            .await
    }

    /// Pick a uniformly random winner and close the raffle
    ///
    /// # Errors
    /// Returns [`LifecycleError::NotFound`] or [`LifecycleError::NoEntries`];
    /// the raffle is kept in both cases.
    pub async fn draw(&self, guild_id: u64, name: &str) -> RaffleResult<u64> {
        let winner = self
            .with_scope_lock(guild_id, |raffles| {
                let raffle = find(raffles, name)?;
                let winner = *raffle
                    .entries
                    .choose(&mut rand::rng())
                    .ok_or(LifecycleError::NoEntries)?;
                remove(raffles, name)?;
                Ok(winner)
            })
            .await?;

        info!(target: RAFFLE_TARGET, guild_id, raffle = %name, winner, event = "draw", "Raffle drawn");
        Ok(winner)
    }

    /// Owner closes the raffle without a winner
    ///
    /// # Errors
    /// Returns [`LifecycleError::NotFound`] or [`LifecycleError::NotOwner`].
    pub async fn end(&self, guild_id: u64, name: &str, actor: u64) -> RaffleResult<()> {
        self.with_scope_lock(guild_id, |raffles| {
            find(raffles, name)?.ensure_owner(actor)?;
            remove(raffles, name)?;
            Ok(())
        })
        .await?;

        info!(target: RAFFLE_TARGET, guild_id, raffle = %name, actor, event = "end", "Raffle ended");
        Ok(())
    }

    /// Remove every raffle in the guild, returning how many there were
    ///
    /// # Errors
    /// Returns a store error if the guild's raffles cannot be loaded or saved.
    pub async fn teardown(&self, guild_id: u64) -> RaffleResult<usize> {
        let removed = self
            .with_scope_lock(guild_id, |raffles| {
                let count = raffles.len();
                raffles.clear();
                Ok(count)
            })
            .await?;

        info!(target: RAFFLE_TARGET, guild_id, removed, event = "teardown", "All raffles torn down");
        Ok(removed)
    }

    /// # Errors
    /// Returns [`LifecycleError::NotFound`] if there is no such raffle.
    pub async fn get(&self, guild_id: u64, name: &str) -> RaffleResult<RaffleDefinition> {
        self.read(guild_id, |raffles| Ok(find(raffles, name)?.clone()))
            .await
    }

    /// All raffles of the guild, sorted by key
    ///
    /// # Errors
    /// Returns a store error if the guild's raffles cannot be loaded.
    pub async fn list(&self, guild_id: u64) -> RaffleResult<Vec<RaffleDefinition>> {
        self.read(guild_id, |raffles| Ok(raffles.values().cloned().collect()))
            .await
    }

    /// Entrants the owner may mention
    ///
    /// # Errors
    /// Returns [`LifecycleError::NotFound`], [`LifecycleError::NotOwner`] or
    /// [`LifecycleError::NoEntries`].
    pub async fn mention_targets(
        &self,
        guild_id: u64,
        name: &str,
        actor: u64,
    ) -> RaffleResult<Vec<u64>> {
        self.read(guild_id, |raffles| {
            let raffle = find(raffles, name)?;
            raffle.ensure_owner(actor)?;
            if raffle.entries.is_empty() {
                return Err(LifecycleError::NoEntries.into());
            }
            Ok(raffle.entries.clone())
        })
        .await
    }

    /// Drop references to users and roles that no longer resolve.
    /// Users are only pruned once the guild's member list is complete.
    /// Returns the number of references removed; saves only if there were any.
    ///
    /// # Errors
    /// Returns a store error if the guild's raffles cannot be loaded or saved.
    pub async fn reconcile(
        &self,
        guild_id: u64,
        resolver: &dyn EntityResolver,
    ) -> RaffleResult<usize> {
        let lock = self.scope_lock(guild_id);
        let _guard = lock.lock().await;

        let prune_users = resolver.users_complete(guild_id);
        let mut raffles = self.store.load(guild_id).await?;
        let pruned: usize = raffles
            .values_mut()
            .map(|raffle| {
                raffle.retain_resolvable(
                    |user| !prune_users || resolver.resolve_user(user).is_some(),
                    |role| resolver.resolve_role(guild_id, role).is_some(),
                )
            })
            .sum();

        if pruned > 0 {
            self.store.save(guild_id, &raffles).await?;
            info!(target: RAFFLE_TARGET, guild_id, pruned, event = "reconcile", "Pruned stale raffle references");
        } else {
            debug!(target: RAFFLE_TARGET, guild_id, event = "reconcile", "No stale raffle references");
        }
        Ok(pruned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raffle::{MemoryStore, MockEntityResolver, ParseError, RaffleError};
    use chrono::Duration;

    const GUILD: u64 = 67890;
    const OWNER: u64 = 1;

    fn engine() -> RaffleEngine {
        RaffleEngine::new(Arc::new(MemoryStore::new()))
    }

    fn participant(user_id: u64) -> Participant {
        let now = Utc::now();
        Participant {
            user_id,
            roles: Vec::new(),
            account_created_at: now - Duration::days(400),
            joined_guild_at: Some(now - Duration::days(40)),
        }
    }

    async fn create(engine: &RaffleEngine, name: &str, maximum_entries: Option<u64>) {
        let mut raffle = RaffleDefinition::new(name, OWNER);
        raffle.maximum_entries = maximum_entries;
        engine.create(GUILD, raffle).await.unwrap();
    }

    fn lifecycle(result: RaffleResult<impl std::fmt::Debug>) -> LifecycleError {
        match result {
            Err(RaffleError::Lifecycle(error)) => error,
            other => panic!("Expected lifecycle error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_rejects_case_insensitive_duplicates() {
        let engine = engine();
        create(&engine, "Giveaway", None).await;

        let duplicate = RaffleDefinition::new("GIVEAWAY", 2);
        assert_eq!(
            lifecycle(engine.create(GUILD, duplicate).await),
            LifecycleError::DuplicateName("GIVEAWAY".to_string())
        );

        // Other guilds are separate scopes
        engine
            .create(GUILD + 1, RaffleDefinition::new("giveaway", 2))
            .await
            .unwrap();
        assert_eq!(engine.list(GUILD).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_lookup_ignores_case() {
        let engine = engine();
        create(&engine, "Giveaway", None).await;
        engine
            .join(GUILD, "gIvEaWaY", &participant(2), Utc::now())
            .await
            .unwrap();
        assert_eq!(engine.get(GUILD, "giveaway").await.unwrap().entries, vec![2]);
    }

    #[tokio::test]
    async fn test_join_is_not_reentrant() {
        let engine = engine();
        create(&engine, "giveaway", None).await;

        engine
            .join(GUILD, "giveaway", &participant(2), Utc::now())
            .await
            .unwrap();
        assert_eq!(
            lifecycle(engine.join(GUILD, "giveaway", &participant(2), Utc::now()).await),
            LifecycleError::AlreadyEntered
        );
        assert_eq!(engine.get(GUILD, "giveaway").await.unwrap().entries, vec![2]);
    }

    #[tokio::test]
    async fn test_join_missing_raffle() {
        let engine = engine();
        assert_eq!(
            lifecycle(engine.join(GUILD, "nope", &participant(2), Utc::now()).await),
            LifecycleError::NotFound("nope".to_string())
        );
    }

    #[tokio::test]
    async fn test_prevented_wins_over_account_age() {
        let engine = engine();
        let mut raffle = RaffleDefinition::new("giveaway", OWNER);
        raffle.prevented_users = Some(vec![2]);
        raffle.account_age_days = Some(1000);
        engine.create(GUILD, raffle).await.unwrap();

        assert_eq!(
            lifecycle(engine.join(GUILD, "giveaway", &participant(2), Utc::now()).await),
            LifecycleError::Prevented
        );
        assert_eq!(
            lifecycle(engine.join(GUILD, "giveaway", &participant(3), Utc::now()).await),
            LifecycleError::TooYoung(1000)
        );
    }

    #[tokio::test]
    async fn test_maximum_entries_example() {
        let engine = engine();
        create(&engine, "giveaway", Some(1)).await;

        engine
            .join(GUILD, "giveaway", &participant(2), Utc::now())
            .await
            .unwrap();
        assert_eq!(
            engine.get(GUILD, "giveaway").await.unwrap().maximum_entries,
            Some(0)
        );
        assert_eq!(
            lifecycle(engine.join(GUILD, "giveaway", &participant(3), Utc::now()).await),
            LifecycleError::Full
        );
        assert_eq!(
            engine.get(GUILD, "giveaway").await.unwrap().maximum_entries,
            Some(0)
        );
    }

    #[tokio::test]
    async fn test_leave_then_join_keeps_slot_consumed() {
        let engine = engine();
        create(&engine, "giveaway", Some(5)).await;

        engine
            .join(GUILD, "giveaway", &participant(2), Utc::now())
            .await
            .unwrap();
        engine.leave(GUILD, "giveaway", 2).await.unwrap();
        assert_eq!(
            lifecycle(engine.leave(GUILD, "giveaway", 2).await),
            LifecycleError::NotEntered
        );
        engine
            .join(GUILD, "giveaway", &participant(2), Utc::now())
            .await
            .unwrap();

        let raffle = engine.get(GUILD, "giveaway").await.unwrap();
        assert_eq!(raffle.entries, vec![2]);
        assert_eq!(raffle.maximum_entries, Some(3));
    }

    #[tokio::test]
    async fn test_kick_is_owner_only() {
        let engine = engine();
        create(&engine, "giveaway", None).await;
        engine
            .join(GUILD, "giveaway", &participant(2), Utc::now())
            .await
            .unwrap();

        assert_eq!(
            lifecycle(engine.kick(GUILD, "giveaway", 3, 2).await),
            LifecycleError::NotOwner
        );
        assert_eq!(
            lifecycle(engine.kick(GUILD, "giveaway", OWNER, 4).await),
            LifecycleError::NotEntered
        );
        engine.kick(GUILD, "giveaway", OWNER, 2).await.unwrap();
        assert!(engine.get(GUILD, "giveaway").await.unwrap().entries.is_empty());
    }

    #[tokio::test]
    async fn test_draw_single_entry() {
        let engine = engine();
        create(&engine, "giveaway", None).await;
        engine
            .join(GUILD, "giveaway", &participant(2), Utc::now())
            .await
            .unwrap();

        assert_eq!(engine.draw(GUILD, "giveaway").await.unwrap(), 2);
        assert_eq!(
            lifecycle(engine.get(GUILD, "giveaway").await),
            LifecycleError::NotFound("giveaway".to_string())
        );
    }

    #[tokio::test]
    async fn test_draw_without_entries_keeps_raffle() {
        let engine = engine();
        create(&engine, "giveaway", None).await;

        assert_eq!(
            lifecycle(engine.draw(GUILD, "giveaway").await),
            LifecycleError::NoEntries
        );
        assert!(engine.get(GUILD, "giveaway").await.is_ok());
    }

    #[tokio::test]
    async fn test_draw_picks_an_entrant() {
        let engine = engine();
        create(&engine, "giveaway", None).await;
        for user in 2..=6 {
            engine
                .join(GUILD, "giveaway", &participant(user), Utc::now())
                .await
                .unwrap();
        }
        let winner = engine.draw(GUILD, "giveaway").await.unwrap();
        assert!((2..=6).contains(&winner));
    }

    #[tokio::test]
    async fn test_end_and_teardown() {
        let engine = engine();
        create(&engine, "first", None).await;
        create(&engine, "second", None).await;
        create(&engine, "third", None).await;

        assert_eq!(
            lifecycle(engine.end(GUILD, "first", 2).await),
            LifecycleError::NotOwner
        );
        engine.end(GUILD, "first", OWNER).await.unwrap();
        assert_eq!(engine.list(GUILD).await.unwrap().len(), 2);

        assert_eq!(engine.teardown(GUILD).await.unwrap(), 2);
        assert!(engine.list(GUILD).await.unwrap().is_empty());
        assert_eq!(engine.teardown(GUILD).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_edit_conditions() {
        let engine = engine();
        create(&engine, "giveaway", None).await;
        let now = Utc::now();

        assert_eq!(
            engine
                .edit_account_age(GUILD, "giveaway", ConditionValue::Set(30), now)
                .await
                .unwrap(),
            ConditionChange::Updated
        );
        assert!(matches!(
            engine
                .edit_account_age(GUILD, "giveaway", ConditionValue::Set(100_000), now)
                .await,
            Err(RaffleError::Parse(ParseError::InvalidRange { .. }))
        ));
        assert_eq!(
            lifecycle(
                engine
                    .edit_account_age(GUILD, "giveaway", ConditionValue::Enable, now)
                    .await
            ),
            LifecycleError::BooleanNotAllowed
        );
        assert_eq!(
            engine.get(GUILD, "giveaway").await.unwrap().account_age_days,
            Some(30)
        );

        let guild_created_at = now - Duration::days(10);
        assert!(
            engine
                .edit_join_age(GUILD, "giveaway", ConditionValue::Set(10), guild_created_at, now)
                .await
                .is_err()
        );
        engine
            .edit_join_age(GUILD, "giveaway", ConditionValue::Set(9), guild_created_at, now)
            .await
            .unwrap();

        engine
            .edit_description(GUILD, "giveaway", ConditionValue::Set("Prize".to_string()))
            .await
            .unwrap();
        engine
            .edit_maximum_entries(GUILD, "giveaway", ConditionValue::Set(4))
            .await
            .unwrap();

        let raffle = engine.get(GUILD, "giveaway").await.unwrap();
        assert_eq!(raffle.join_age_days, Some(9));
        assert_eq!(raffle.description.as_deref(), Some("Prize"));
        assert_eq!(raffle.maximum_entries, Some(4));

        assert_eq!(
            engine
                .edit_account_age(GUILD, "giveaway", ConditionValue::Disable, now)
                .await
                .unwrap(),
            ConditionChange::Removed
        );
        engine
            .edit_maximum_entries(GUILD, "giveaway", ConditionValue::Disable)
            .await
            .unwrap();
        let raffle = engine.get(GUILD, "giveaway").await.unwrap();
        assert!(raffle.account_age_days.is_none());
        assert!(raffle.maximum_entries.is_none());
    }

    #[tokio::test]
    async fn test_prevented_and_role_lists() {
        let engine = engine();
        create(&engine, "giveaway", None).await;

        engine.add_prevented(GUILD, "giveaway", 2).await.unwrap();
        assert_eq!(
            lifecycle(engine.add_prevented(GUILD, "giveaway", 2).await),
            LifecycleError::AlreadyPrevented
        );
        engine.remove_prevented(GUILD, "giveaway", 2).await.unwrap();
        assert_eq!(
            lifecycle(engine.clear_prevented(GUILD, "giveaway").await),
            LifecycleError::NoPreventedUsers
        );

        engine.add_required_role(GUILD, "giveaway", 10).await.unwrap();
        engine.add_required_role(GUILD, "giveaway", 11).await.unwrap();
        assert_eq!(
            lifecycle(engine.remove_required_role(GUILD, "giveaway", 12).await),
            LifecycleError::RoleNotRequired
        );
        engine.clear_required_roles(GUILD, "giveaway").await.unwrap();
        assert!(engine.get(GUILD, "giveaway").await.unwrap().roles_needed.is_none());
    }

    #[tokio::test]
    async fn test_mention_targets() {
        let engine = engine();
        create(&engine, "giveaway", None).await;
        assert_eq!(
            lifecycle(engine.mention_targets(GUILD, "giveaway", OWNER).await),
            LifecycleError::NoEntries
        );
        engine
            .join(GUILD, "giveaway", &participant(2), Utc::now())
            .await
            .unwrap();
        assert_eq!(
            lifecycle(engine.mention_targets(GUILD, "giveaway", 2).await),
            LifecycleError::NotOwner
        );
        assert_eq!(
            engine.mention_targets(GUILD, "giveaway", OWNER).await.unwrap(),
            vec![2]
        );
    }

    #[tokio::test]
    async fn test_reconcile_prunes_departed_users_and_roles() {
        let engine = engine();
        let mut raffle = RaffleDefinition::new("giveaway", OWNER);
        raffle.entries = vec![2, 3];
        raffle.prevented_users = Some(vec![4]);
        raffle.roles_needed = Some(vec![10, 11]);
        engine.create(GUILD, raffle).await.unwrap();

        let mut resolver = MockEntityResolver::new();
        resolver
            .expect_resolve_user()
            .returning(|id| (id != 3).then(|| format!("user{id}")));
        resolver
            .expect_resolve_role()
            .returning(|_, id| (id == 10).then(|| "role".to_string()));
        resolver.expect_users_complete().return_const(true);

        assert_eq!(engine.reconcile(GUILD, &resolver).await.unwrap(), 2);
        let raffle = engine.get(GUILD, "giveaway").await.unwrap();
        assert_eq!(raffle.entries, vec![2]);
        assert_eq!(raffle.prevented_users, Some(vec![4]));
        assert_eq!(raffle.roles_needed, Some(vec![10]));

        assert_eq!(engine.reconcile(GUILD, &resolver).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_fresh_entrant_survives_reconcile_with_partial_member_list() {
        let engine = engine();
        let mut raffle = RaffleDefinition::new("giveaway", OWNER);
        raffle.roles_needed = Some(vec![10, 11]);
        engine.create(GUILD, raffle).await.unwrap();
        let mut entrant = participant(2);
        entrant.roles = vec![10, 11];
        engine
            .join(GUILD, "giveaway", &entrant, Utc::now())
            .await
            .unwrap();

        // Nobody is cached yet, and the guild is too large to have arrived whole
        let mut resolver = MockEntityResolver::new();
        resolver.expect_resolve_user().returning(|_| None);
        resolver
            .expect_resolve_role()
            .returning(|_, id| (id == 10).then(|| "role".to_string()));
        resolver.expect_users_complete().return_const(false);

        assert_eq!(engine.reconcile(GUILD, &resolver).await.unwrap(), 1);
        let raffle = engine.get(GUILD, "giveaway").await.unwrap();
        assert_eq!(raffle.entries, vec![2]);
        assert_eq!(raffle.roles_needed, Some(vec![10]));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_joins_respect_capacity() {
        let engine = engine();
        create(&engine, "giveaway", Some(5)).await;

        let mut handles = Vec::new();
        for user in 100..120 {
            let engine = engine.clone();
            handles.push(tokio::spawn(async move {
                engine
                    .join(GUILD, "giveaway", &participant(user), Utc::now())
                    .await
            }));
        }

        let mut joined = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                joined += 1;
            }
        }

        let raffle = engine.get(GUILD, "giveaway").await.unwrap();
        assert_eq!(joined, 5);
        assert_eq!(raffle.entries.len(), 5);
        assert_eq!(raffle.maximum_entries, Some(0));
    }
}
