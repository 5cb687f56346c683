//! Domain logic for transient player-interaction coordination.
//!
//! `waystone-core` defines the identity and position types, the per-action
//! [`CooldownRegistry`], the configuration, the recoverable error taxonomy,
//! and the collaborator traits through which the hosting server supplies
//! entity lookup, policy, relationships, safety search, and notifications.
//! The tokio-driven scheduling and negotiation state machines live in
//! `waystone-runtime` and build exclusively on the types re-exported here.
pub mod clock;
pub mod config;
pub mod cooldown;
pub mod env;
pub mod error;
pub mod types;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::CoreConfig;
pub use cooldown::CooldownRegistry;
pub use env::{
    EntityDirectory, EntityPolicy, Message, Notifier, PolicyOracle, RelationshipOracle,
    SafetyOracle,
};
pub use error::RequestError;
pub use types::{ActionKey, EntityId, Position, RelocationCause, RequestDirection};
