//! Raffle definition parser
//!
//! Turns the YAML a user pastes into `raffle create` into a validated
//! [`RaffleDefinition`]. Validation stops at the first violated constraint.
//! Optional keys only count when their value is truthy; `0`, `""`, `[]`,
//! `false` and `null` behave as if the key were absent.

use crate::raffle::{EntityKind, EntityResolver, ParseError, RaffleDefinition};
use chrono::{DateTime, NaiveDate, Utc};
use serde_yaml::{Mapping, Value};

/// Longest raffle name accepted
pub const MAX_NAME_LENGTH: usize = 15;

/// Launch date of the platform; no account can be older than this
pub const PLATFORM_EPOCH: (i32, u32, u32) = (2015, 5, 13);

/// Everything the parser needs besides the text itself
pub struct ParseContext<'a> {
    pub guild_id: u64,
    pub guild_created_at: DateTime<Utc>,
    /// User creating the raffle
    pub owner: u64,
    pub now: DateTime<Utc>,
    pub resolver: &'a dyn EntityResolver,
}

/// Parse and validate a raffle definition
///
/// # Errors
/// Returns the first [`ParseError`] the definition violates.
pub fn parse(raw: &str, ctx: &ParseContext<'_>) -> Result<RaffleDefinition, ParseError> {
    let mapping = decode(raw)?;

    let name = parse_name(&mapping)?;
    let description = optional(&mapping, &["description"])
        .map(|value| expect_str("description", value))
        .transpose()?;
    let account_age = optional(&mapping, &["account_age"])
        .map(|value| expect_count("account_age", value))
        .transpose()?;
    let join_age = optional(&mapping, &["join_age"])
        .map(|value| expect_count("join_age", value))
        .transpose()?;
    let maximum_entries = optional(&mapping, &["maximum_entries"])
        .map(|value| expect_count("maximum_entries", value))
        .transpose()?;
    let roles = optional(&mapping, &["roles_needed_to_enter", "role_needed_to_enter"])
        .map(|value| expect_ids("roles_needed_to_enter", value))
        .transpose()?;
    let prevented = optional(&mapping, &["prevented_users", "prevented_user"])
        .map(|value| expect_ids("prevented_users", value))
        .transpose()?;

    if let Some(days) = account_age {
        validate_account_age(days, ctx.now)?;
    }
    if let Some(days) = join_age {
        validate_join_age(days, ctx.guild_created_at, ctx.now)?;
    }

    if let Some(roles) = &roles {
        if let Some(unknown) = roles
            .iter()
            .find(|role| ctx.resolver.resolve_role(ctx.guild_id, **role).is_none())
        {
            return Err(ParseError::UnknownEntity {
                id: *unknown,
                kind: EntityKind::Role,
            });
        }
    }
    // An uncached user may still be a member while the member list is loading
    if let Some(users) = prevented
        .as_ref()
        .filter(|_| ctx.resolver.users_complete(ctx.guild_id))
    {
        if let Some(unknown) = users
            .iter()
            .find(|user| ctx.resolver.resolve_user(**user).is_none())
        {
            return Err(ParseError::UnknownEntity {
                id: *unknown,
                kind: EntityKind::User,
            });
        }
    }

    let mut definition = RaffleDefinition::new(name, ctx.owner);
    definition.description = description;
    definition.account_age_days = account_age;
    definition.join_age_days = join_age;
    definition.maximum_entries = maximum_entries;
    definition.roles_needed = roles;
    definition.prevented_users = prevented;
    Ok(definition)
}

/// Strip a surrounding Markdown code fence, as pasted from a chat message
#[must_use]
pub fn cleanup_code(content: &str) -> &str {
    let trimmed = content.trim();
    if trimmed.starts_with("```") && trimmed.ends_with("```") && trimmed.len() >= 6 {
        let inner = &trimmed[3..trimmed.len() - 3];
        // Drop the language tag line, e.g. ```yaml
        return match inner.split_once('\n') {
            Some((_, body)) => body.trim_end(),
            None => inner,
        };
    }
    content.trim_matches(|c: char| c == '`' || c == ' ' || c == '\n')
}

/// Reject account age requirements no account could ever meet
///
/// # Errors
/// Returns [`ParseError::InvalidRange`] if `days` is not below the platform's age.
pub fn validate_account_age(days: u64, now: DateTime<Utc>) -> Result<(), ParseError> {
    let (year, month, day) = PLATFORM_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.and_utc())
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    let platform_age = crate::raffle::age_in_days(epoch, now);
    if days >= platform_age {
        return Err(ParseError::InvalidRange {
            field: "account_age",
            message: format!("must be less than Discord's age ({platform_age} days)"),
        });
    }
    Ok(())
}

/// Reject join age requirements older than the guild itself
///
/// # Errors
/// Returns [`ParseError::InvalidRange`] if `days` is not below the guild's age.
pub fn validate_join_age(
    days: u64,
    guild_created_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), ParseError> {
    let guild_age = crate::raffle::age_in_days(guild_created_at, now);
    if days >= guild_age {
        return Err(ParseError::InvalidRange {
            field: "join_age",
            message: format!("must be less than this guild's age ({guild_age} days)"),
        });
    }
    Ok(())
}

fn decode(raw: &str) -> Result<Mapping, ParseError> {
    match serde_yaml::from_str::<Value>(cleanup_code(raw)) {
        Ok(Value::Mapping(mapping)) => Ok(mapping),
        _ => Err(ParseError::InvalidSyntax),
    }
}

fn parse_name(mapping: &Mapping) -> Result<String, ParseError> {
    let value = optional(mapping, &["name"]).ok_or(ParseError::MissingField("name"))?;
    let name = expect_str("name", value)?;
    let length = name.chars().count();
    if length > MAX_NAME_LENGTH {
        return Err(ParseError::InvalidRange {
            field: "name",
            message: format!(
                "must be at most {MAX_NAME_LENGTH} characters, your raffle name had {length}"
            ),
        });
    }
    Ok(name)
}

/// First truthy value among `keys`, in order
fn optional<'a>(mapping: &'a Mapping, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| mapping.get(*key))
        .find(|value| is_truthy(value))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Sequence(items) => !items.is_empty(),
        Value::Mapping(map) => !map.is_empty(),
        Value::Tagged(tagged) => is_truthy(&tagged.value),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(number) if number.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Sequence(_) => "list",
        Value::Mapping(_) => "dict",
        Value::Tagged(_) => "tagged value",
    }
}

fn expect_str(field: &'static str, value: &Value) -> Result<String, ParseError> {
    value
        .as_str()
        .map(ToString::to_string)
        .ok_or_else(|| ParseError::TypeMismatch {
            field,
            expected: "str",
            actual: type_name(value),
        })
}

/// A non-negative integer such as a day count or an entry limit
fn expect_count(field: &'static str, value: &Value) -> Result<u64, ParseError> {
    let Value::Number(number) = value else {
        return Err(ParseError::TypeMismatch {
            field,
            expected: "int",
            actual: type_name(value),
        });
    };
    if let Some(count) = number.as_u64() {
        return Ok(count);
    }
    if number.is_i64() {
        return Err(ParseError::InvalidRange {
            field,
            message: "must not be negative".to_string(),
        });
    }
    Err(ParseError::TypeMismatch {
        field,
        expected: "int",
        actual: type_name(value),
    })
}

/// A single id or a list of ids
fn expect_ids(field: &'static str, value: &Value) -> Result<Vec<u64>, ParseError> {
    let mismatch = |actual: &Value| ParseError::TypeMismatch {
        field,
        expected: "int or list of ints",
        actual: type_name(actual),
    };
    let as_id = |item: &Value| match item {
        Value::Number(number) => number.as_u64().filter(|id| *id > 0).ok_or_else(|| {
            ParseError::InvalidRange {
                field,
                message: format!("contains {number}, which is not a valid id"),
            }
        }),
        other => Err(mismatch(other)),
    };

    match value {
        Value::Sequence(items) => {
            let mut ids: Vec<u64> = Vec::with_capacity(items.len());
            for item in items {
                let id = as_id(item)?;
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
            Ok(ids)
        }
        Value::Number(_) => Ok(vec![as_id(value)?]),
        other => Err(mismatch(other)),
    }
}
