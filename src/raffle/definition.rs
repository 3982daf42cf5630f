//! Raffle definitions and join eligibility
//!
//! A [`RaffleDefinition`] is the stored state of one raffle. Join eligibility
//! is an ordered list of named checks; the first one that fails decides the
//! error the user sees, so the order is part of the contract.

use crate::raffle::LifecycleError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// All raffles of one guild, keyed by lowercased name
pub type RaffleMap = BTreeMap<String, RaffleDefinition>;

/// Stored state of a single raffle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaffleDefinition {
    /// Display name, as the owner wrote it
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// User who created the raffle
    pub owner: u64,
    /// Entered users in join order
    #[serde(default)]
    pub entries: Vec<u64>,
    #[serde(
        default,
        rename = "account_age",
        skip_serializing_if = "Option::is_none"
    )]
    pub account_age_days: Option<u64>,
    #[serde(default, rename = "join_age", skip_serializing_if = "Option::is_none")]
    pub join_age_days: Option<u64>,
    #[serde(
        default,
        rename = "roles_needed_to_enter",
        skip_serializing_if = "Option::is_none"
    )]
    pub roles_needed: Option<Vec<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prevented_users: Option<Vec<u64>>,
    /// Remaining slots; zero closes the raffle to new entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_entries: Option<u64>,
}

/// What the join checks need to know about the user trying to join
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub user_id: u64,
    /// Role ids the member holds in the guild
    pub roles: Vec<u64>,
    pub account_created_at: DateTime<Utc>,
    /// When the member joined the guild, if known
    pub joined_guild_at: Option<DateTime<Utc>>,
}

type JoinCheck = fn(&RaffleDefinition, &Participant, DateTime<Utc>) -> Result<(), LifecycleError>;

/// Join checks in the order they are evaluated
const JOIN_CHECKS: &[(&str, JoinCheck)] = &[
    ("already_entered", check_not_entered),
    ("prevented", check_not_prevented),
    ("owner", check_not_owner),
    ("capacity", check_capacity),
    ("roles", check_roles),
    ("account_age", check_account_age),
    ("join_age", check_join_age),
];

fn check_not_entered(
    raffle: &RaffleDefinition,
    participant: &Participant,
    _now: DateTime<Utc>,
) -> Result<(), LifecycleError> {
    if raffle.entries.contains(&participant.user_id) {
        return Err(LifecycleError::AlreadyEntered);
    }
    Ok(())
}

fn check_not_prevented(
    raffle: &RaffleDefinition,
    participant: &Participant,
    _now: DateTime<Utc>,
) -> Result<(), LifecycleError> {
    if raffle.is_prevented(participant.user_id) {
        return Err(LifecycleError::Prevented);
    }
    Ok(())
}

fn check_not_owner(
    raffle: &RaffleDefinition,
    participant: &Participant,
    _now: DateTime<Utc>,
) -> Result<(), LifecycleError> {
    if raffle.owner == participant.user_id {
        return Err(LifecycleError::OwnerCannotJoin);
    }
    Ok(())
}

fn check_capacity(
    raffle: &RaffleDefinition,
    _participant: &Participant,
    _now: DateTime<Utc>,
) -> Result<(), LifecycleError> {
    if raffle.maximum_entries == Some(0) {
        return Err(LifecycleError::Full);
    }
    Ok(())
}

fn check_roles(
    raffle: &RaffleDefinition,
    participant: &Participant,
    _now: DateTime<Utc>,
) -> Result<(), LifecycleError> {
    let Some(roles) = &raffle.roles_needed else {
        return Ok(());
    };
    match roles.iter().find(|role| !participant.roles.contains(role)) {
        Some(missing) => Err(LifecycleError::MissingRole(*missing)),
        None => Ok(()),
    }
}

fn check_account_age(
    raffle: &RaffleDefinition,
    participant: &Participant,
    now: DateTime<Utc>,
) -> Result<(), LifecycleError> {
    let Some(required) = raffle.account_age_days else {
        return Ok(());
    };
    if age_in_days(participant.account_created_at, now) < required {
        return Err(LifecycleError::TooYoung(required));
    }
    Ok(())
}

fn check_join_age(
    raffle: &RaffleDefinition,
    participant: &Participant,
    now: DateTime<Utc>,
) -> Result<(), LifecycleError> {
    let Some(required) = raffle.join_age_days else {
        return Ok(());
    };
    let joined_long_enough = participant
        .joined_guild_at
        .is_some_and(|joined| age_in_days(joined, now) >= required);
    if !joined_long_enough {
        return Err(LifecycleError::JoinedTooRecently(required));
    }
    Ok(())
}

/// Whole days between `since` and `now`; zero if `since` is in the future
#[must_use]
pub fn age_in_days(since: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    u64::try_from((now - since).num_days()).unwrap_or_default()
}

/// Remove `value` from an optional list, dropping the list once it is empty.
/// Returns whether the value was present.
fn remove_from_optional(list: &mut Option<Vec<u64>>, value: u64) -> bool {
    let Some(items) = list else {
        return false;
    };
    let before = items.len();
    items.retain(|item| *item != value);
    let removed = items.len() != before;
    if items.is_empty() {
        *list = None;
    }
    removed
}

impl RaffleDefinition {
    /// Create a raffle with no entries and no conditions
    pub fn new(name: impl Into<String>, owner: u64) -> Self {
        Self {
            name: name.into(),
            description: None,
            owner,
            entries: Vec::new(),
            account_age_days: None,
            join_age_days: None,
            roles_needed: None,
            prevented_users: None,
            maximum_entries: None,
        }
    }

    /// Key this raffle is stored under
    #[must_use]
    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }

    #[must_use]
    pub fn is_prevented(&self, user_id: u64) -> bool {
        self.prevented_users
            .as_ref()
            .is_some_and(|users| users.contains(&user_id))
    }

    /// Whether any entry condition is set
    #[must_use]
    pub fn has_conditions(&self) -> bool {
        self.roles_needed.is_some()
            || self.account_age_days.is_some()
            || self.join_age_days.is_some()
            || self.prevented_users.is_some()
    }

    /// Whether the raffle still takes new entries
    #[must_use]
    pub fn is_accepting_entries(&self) -> bool {
        self.maximum_entries != Some(0)
    }

    /// Run every join check in order and return the first failure
    ///
    /// # Errors
    /// Returns the [`LifecycleError`] of the first check that fails.
    pub fn check_eligibility(
        &self,
        participant: &Participant,
        now: DateTime<Utc>,
    ) -> Result<(), LifecycleError> {
        for (_, check) in JOIN_CHECKS {
            check(self, participant, now)?;
        }
        Ok(())
    }

    /// Check eligibility, then enter the participant and consume a slot
    ///
    /// # Errors
    /// Returns the first failing eligibility check; nothing is changed then.
    pub fn enter(
        &mut self,
        participant: &Participant,
        now: DateTime<Utc>,
    ) -> Result<(), LifecycleError> {
        self.check_eligibility(participant, now)?;
        self.entries.push(participant.user_id);
        if let Some(remaining) = self.maximum_entries.as_mut() {
            *remaining = remaining.saturating_sub(1);
        }
        Ok(())
    }

    /// Remove a user from the entries. Slots are not given back.
    ///
    /// # Errors
    /// Returns [`LifecycleError::NotEntered`] if the user is not entered.
    pub fn withdraw(&mut self, user_id: u64) -> Result<(), LifecycleError> {
        let Some(position) = self.entries.iter().position(|entry| *entry == user_id) else {
            return Err(LifecycleError::NotEntered);
        };
        self.entries.remove(position);
        Ok(())
    }

    /// # Errors
    /// Returns [`LifecycleError::NotOwner`] unless `user_id` owns the raffle.
    pub fn ensure_owner(&self, user_id: u64) -> Result<(), LifecycleError> {
        if self.owner != user_id {
            return Err(LifecycleError::NotOwner);
        }
        Ok(())
    }

    /// Add a user to the prevented list, removing them from the entries
    ///
    /// # Errors
    /// Returns [`LifecycleError::AlreadyPrevented`] if they already are.
    pub fn prevent(&mut self, user_id: u64) -> Result<(), LifecycleError> {
        if self.is_prevented(user_id) {
            return Err(LifecycleError::AlreadyPrevented);
        }
        self.prevented_users.get_or_insert_with(Vec::new).push(user_id);
        self.entries.retain(|entry| *entry != user_id);
        Ok(())
    }

    /// # Errors
    /// Returns [`LifecycleError::NotPrevented`] if the user is not on the list.
    pub fn unprevent(&mut self, user_id: u64) -> Result<(), LifecycleError> {
        if !remove_from_optional(&mut self.prevented_users, user_id) {
            return Err(LifecycleError::NotPrevented);
        }
        Ok(())
    }

    /// # Errors
    /// Returns [`LifecycleError::NoPreventedUsers`] if there is no list.
    pub fn clear_prevented(&mut self) -> Result<(), LifecycleError> {
        self.prevented_users
            .take()
            .map(|_| ())
            .ok_or(LifecycleError::NoPreventedUsers)
    }

    /// # Errors
    /// Returns [`LifecycleError::RoleAlreadyRequired`] if the role is listed.
    pub fn require_role(&mut self, role_id: u64) -> Result<(), LifecycleError> {
        let roles = self.roles_needed.get_or_insert_with(Vec::new);
        if roles.contains(&role_id) {
            return Err(LifecycleError::RoleAlreadyRequired);
        }
        roles.push(role_id);
        Ok(())
    }

    /// # Errors
    /// Returns [`LifecycleError::RoleNotRequired`] if the role is not listed.
    pub fn unrequire_role(&mut self, role_id: u64) -> Result<(), LifecycleError> {
        if !remove_from_optional(&mut self.roles_needed, role_id) {
            return Err(LifecycleError::RoleNotRequired);
        }
        Ok(())
    }

    /// # Errors
    /// Returns [`LifecycleError::NoRequiredRoles`] if there is no list.
    pub fn clear_required_roles(&mut self) -> Result<(), LifecycleError> {
        self.roles_needed
            .take()
            .map(|_| ())
            .ok_or(LifecycleError::NoRequiredRoles)
    }

    /// Drop every stored id the predicates no longer resolve.
    /// Returns how many references were removed.
    pub fn retain_resolvable(
        &mut self,
        user_exists: impl Fn(u64) -> bool,
        role_exists: impl Fn(u64) -> bool,
    ) -> usize {
        let before = self.reference_count();

        self.entries.retain(|user| user_exists(*user));
        if let Some(users) = self.prevented_users.as_mut() {
            users.retain(|user| user_exists(*user));
            if users.is_empty() {
                self.prevented_users = None;
            }
        }
        if let Some(roles) = self.roles_needed.as_mut() {
            roles.retain(|role| role_exists(*role));
            if roles.is_empty() {
                self.roles_needed = None;
            }
        }

        before - self.reference_count()
    }

    fn reference_count(&self) -> usize {
        self.entries.len()
            + self.prevented_users.as_ref().map_or(0, Vec::len)
            + self.roles_needed.as_ref().map_or(0, Vec::len)
    }

    /// Serialize the definition in the same YAML shape `create` accepts
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// Keys a raffle definition understands, with their type and meaning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Name,
    Description,
    AccountAge,
    JoinAge,
    RolesNeededToEnter,
    PreventedUsers,
    MaximumEntries,
}

impl Component {
    pub const ALL: [Self; 7] = [
        Self::Name,
        Self::Description,
        Self::AccountAge,
        Self::JoinAge,
        Self::RolesNeededToEnter,
        Self::PreventedUsers,
        Self::MaximumEntries,
    ];

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::AccountAge => "account_age",
            Self::JoinAge => "join_age",
            Self::RolesNeededToEnter => "roles_needed_to_enter",
            Self::PreventedUsers => "prevented_users",
            Self::MaximumEntries => "maximum_entries",
        }
    }

    #[must_use]
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Name | Self::Description => "str",
            Self::AccountAge | Self::JoinAge | Self::MaximumEntries => "int",
            Self::RolesNeededToEnter | Self::PreventedUsers => "list",
        }
    }

    #[must_use]
    pub fn help(self) -> &'static str {
        match self {
            Self::Name => "The name of the raffle. This is the only REQUIRED field.",
            Self::Description => {
                "The description for the raffle. This information appears in the raffle info command."
            }
            Self::AccountAge => {
                "The account age requirement for the user who joins the raffle. This must be specified in days."
            }
            Self::JoinAge => {
                "The number of days the user needs to be in the server for in order to join the raffle."
            }
            Self::RolesNeededToEnter => {
                "A list of discord roles which the user must have in order to join the raffle. These MUST be specified using IDs."
            }
            Self::PreventedUsers => {
                "A list of discord users who are not allowed to join the raffle. These MUST be specified using IDs."
            }
            Self::MaximumEntries => "The maximum number of entries allowed for a raffle.",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}\n\t{}", self.key(), self.type_name(), self.help())
    }
}
