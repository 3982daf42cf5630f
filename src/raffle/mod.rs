//! Raffle system
//!
//! Definitions are parsed from YAML, stored per guild and moved through
//! their lifecycle by the [`RaffleEngine`]. Nothing here talks to Discord
//! directly; users and roles are ids, checked through an [`EntityResolver`].

mod condition;
mod definition;
mod engine;
mod error;
pub mod parser;
mod resolver;
mod store;

pub use condition::{ConditionChange, ConditionValue};
pub use definition::{Component, Participant, RaffleDefinition, RaffleMap, age_in_days};
pub use engine::RaffleEngine;
pub use error::{EntityKind, LifecycleError, ParseError, RaffleError, RaffleResult, StoreError};
pub use parser::{ParseContext, parse};
#[cfg(test)]
pub use resolver::MockEntityResolver;
pub use resolver::{CacheResolver, EntityResolver, member_cache_complete};
pub use store::{MemoryStore, RaffleStore, YamlFileStore};
