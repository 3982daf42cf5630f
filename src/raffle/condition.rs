//! Values accepted by the `raffle edit` commands
//!
//! A condition edit is either a new value, a request to disable the
//! condition (`false`, `0`), or a bare `true`, which is a usage error.

use crate::raffle::LifecycleError;

/// Parsed argument of a condition edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionValue<T> {
    /// Remove the condition
    Disable,
    /// A bare boolean `true`; there is nothing to enable it with
    Enable,
    Set(T),
}

/// Boolean spellings the command converters understand
fn parse_bool(input: &str) -> Option<bool> {
    match input.to_lowercase().as_str() {
        "yes" | "y" | "true" | "t" | "1" | "enable" | "on" => Some(true),
        "no" | "n" | "false" | "f" | "0" | "disable" | "off" => Some(false),
        _ => None,
    }
}

impl ConditionValue<u64> {
    /// Numbers win over booleans, so `1` is one day and `0` disables.
    ///
    /// # Errors
    /// Returns [`LifecycleError::InvalidValue`] for anything that is neither.
    pub fn parse_number(input: &str) -> Result<Self, LifecycleError> {
        let input = input.trim();
        if let Ok(number) = input.parse::<u64>() {
            return Ok(if number == 0 {
                Self::Disable
            } else {
                Self::Set(number)
            });
        }
        match parse_bool(input) {
            Some(true) => Ok(Self::Enable),
            Some(false) => Ok(Self::Disable),
            None => Err(LifecycleError::InvalidValue(input.to_string())),
        }
    }
}

impl ConditionValue<String> {
    /// Booleans win over text, so `false` or `0` removes the description.
    #[must_use]
    pub fn parse_text(input: &str) -> Self {
        let input = input.trim();
        match parse_bool(input) {
            Some(true) => Self::Enable,
            Some(false) => Self::Disable,
            None if input.is_empty() => Self::Disable,
            None => Self::Set(input.to_string()),
        }
    }
}

/// What a condition edit did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionChange {
    Updated,
    Removed,
}
