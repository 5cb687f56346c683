//! Relationship queries for scoped auto-accept.

use crate::types::EntityId;

/// Answers whether two entities stand in the relationship that
/// relationship-scoped auto-accept requires (friendship, party membership —
/// host-defined).
pub trait RelationshipOracle: Send + Sync {
    fn are_related(&self, a: EntityId, b: EntityId) -> bool;
}
