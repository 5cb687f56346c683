//! Lookup and manipulation of live entities.

use crate::types::{EntityId, Position};

/// Access to the set of currently connected entities.
///
/// Implementations are expected to be cheap to query; the worker calls these
/// on every timer tick. `relocate` and `restore_vitals` mutate world state
/// through interior mechanisms of the host and must tolerate ids that went
/// offline between lookup and call.
pub trait EntityDirectory: Send + Sync {
    /// Resolves a display name to an entity id, if one is connected.
    fn find(&self, name: &str) -> Option<EntityId>;

    /// Whether the entity is currently connected and addressable.
    fn is_reachable(&self, entity: EntityId) -> bool;

    /// Current position, or `None` when the entity is unreachable.
    fn position(&self, entity: EntityId) -> Option<Position>;

    /// Moves the entity to the destination. Assumed to always succeed for
    /// reachable entities; a no-op otherwise.
    fn relocate(&self, entity: EntityId, destination: Position);

    /// Snapshot of every connected entity id.
    fn online(&self) -> Vec<EntityId>;

    /// Restores the entity's vitals (health, breath, hunger — host-defined).
    fn restore_vitals(&self, entity: EntityId);
}
