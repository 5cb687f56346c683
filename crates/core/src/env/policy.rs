//! Per-entity behavioral policy.

use crate::types::EntityId;

/// Settings and capabilities governing how an entity participates in
/// negotiation and scheduling.
///
/// The host derives these from persisted settings and its permission system;
/// the core only reads the resolved flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntityPolicy {
    /// Whether incoming teleport requests are accepted at all.
    pub requests_enabled: bool,
    /// Resolve every incoming request without asking.
    pub auto_accept: bool,
    /// Resolve incoming requests from related entities without asking.
    pub relationship_auto_accept: bool,
    /// Skip the send cooldown check.
    pub bypass_cooldown: bool,
    /// Skip the teleport countdown.
    pub bypass_delay: bool,
    /// Excluded from mass summons.
    pub summon_exempt: bool,
}

impl Default for EntityPolicy {
    fn default() -> Self {
        Self {
            requests_enabled: true,
            auto_accept: false,
            relationship_auto_accept: false,
            bypass_cooldown: false,
            bypass_delay: false,
            summon_exempt: false,
        }
    }
}

/// Resolves the effective policy for an entity.
pub trait PolicyOracle: Send + Sync {
    /// Effective policy for the entity. Unknown entities get the default.
    fn policy(&self, entity: EntityId) -> EntityPolicy;
}
