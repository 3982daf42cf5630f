//! Error types for the raffle system
//!
//! Parse errors come out of the definition parser, lifecycle errors out of the
//! engine's transitions. Both are user-facing: the command layer turns them
//! into a reply. Store errors are the only ones that mean something broke.

use std::fmt;
use thiserror::Error;

/// Kind of entity an id failed to resolve as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Role,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Role => write!(f, "role"),
        }
    }
}

/// Errors raised while turning definition text into a raffle
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Text was not YAML, or not a YAML mapping
    #[error("Please provide valid YAML")]
    InvalidSyntax,

    /// A required key was absent or falsy
    #[error("The \"{0}\" key is required")]
    MissingField(&'static str),

    /// A key held a value of the wrong type
    #[error("{field} must be {expected}, not {actual}")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
        actual: &'static str,
    },

    /// A value was well typed but out of bounds
    #[error("{field} {message}")]
    InvalidRange { field: &'static str, message: String },

    /// An id did not resolve to a live user or role
    #[error("\"{id}\" was not a valid {kind}")]
    UnknownEntity { id: u64, kind: EntityKind },
}

impl ParseError {
    /// Short name of the error variant, used as the heading of the error reply
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidSyntax => "InvalidSyntax",
            Self::MissingField(_) => "MissingField",
            Self::TypeMismatch { .. } => "TypeMismatch",
            Self::InvalidRange { .. } => "InvalidRange",
            Self::UnknownEntity { .. } => "UnknownEntity",
        }
    }
}

/// Errors raised by raffle state transitions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("There is not an ongoing raffle with the name `{0}`.")]
    NotFound(String),

    #[error("A raffle with the name `{0}` already exists.")]
    DuplicateName(String),

    #[error("You are already in this raffle.")]
    AlreadyEntered,

    #[error("This user has not entered this raffle.")]
    NotEntered,

    #[error("You are not allowed to join this particular raffle.")]
    Prevented,

    #[error("You cannot join your own raffle.")]
    OwnerCannotJoin,

    #[error("Sorry, the maximum number of users have entered this raffle.")]
    Full,

    #[error("You are missing a required role: <@&{0}>")]
    MissingRole(u64),

    #[error("Your account must be at least {0} days old to join.")]
    TooYoung(u64),

    #[error("You must have been in this server for at least {0} days to join.")]
    JoinedTooRecently(u64),

    #[error("You are not the owner of this raffle.")]
    NotOwner,

    #[error("There are no entries yet for this raffle.")]
    NoEntries,

    #[error("This user is already prevented in this raffle.")]
    AlreadyPrevented,

    #[error("This user was not already prevented in this raffle.")]
    NotPrevented,

    #[error("There are no prevented users.")]
    NoPreventedUsers,

    #[error("This role is already a requirement in this raffle.")]
    RoleAlreadyRequired,

    #[error("This role is not already a requirement in this raffle.")]
    RoleNotRequired,

    #[error("There are no required roles.")]
    NoRequiredRoles,

    /// An explicit `true` was given where a value or `false` was expected
    #[error("Please provide a value, or \"false\" to disable this condition.")]
    BooleanNotAllowed,

    #[error("\"{0}\" is not a number, or \"false\" to disable this condition.")]
    InvalidValue(String),
}

/// Errors from the persistence layer
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage format error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Any error a raffle operation can produce
#[derive(Debug, Error)]
pub enum RaffleError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for raffle operations
pub type RaffleResult<T> = Result<T, RaffleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ParseError::MissingField("name");
        assert_eq!(error.to_string(), "The \"name\" key is required");
        assert_eq!(error.kind(), "MissingField");

        let error = ParseError::TypeMismatch {
            field: "account_age",
            expected: "int",
            actual: "str",
        };
        assert_eq!(error.to_string(), "account_age must be int, not str");

        let error = ParseError::UnknownEntity {
            id: 42,
            kind: EntityKind::Role,
        };
        assert_eq!(error.to_string(), "\"42\" was not a valid role");

        let error = LifecycleError::NotFound("giveaway".to_string());
        assert_eq!(
            error.to_string(),
            "There is not an ongoing raffle with the name `giveaway`."
        );
    }

    #[test]
    fn test_raffle_error_is_transparent() {
        let error = RaffleError::from(LifecycleError::Full);
        assert_eq!(
            error.to_string(),
            "Sorry, the maximum number of users have entered this raffle."
        );

        let error = RaffleError::from(ParseError::InvalidSyntax);
        assert!(matches!(error, RaffleError::Parse(ParseError::InvalidSyntax)));
    }
}
