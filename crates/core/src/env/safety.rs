//! World-safety search for random relocation.

use crate::types::{EntityId, Position};

/// Finds a position an entity can safely be relocated to.
///
/// Implementations may search terrain on a separate worker internally, but
/// the call itself is synchronous from the core's point of view: the result
/// must already be marshalled back by the time it returns.
pub trait SafetyOracle: Send + Sync {
    /// A safe destination in the vicinity of the entity's world, or `None`
    /// when the search gave up.
    fn find_safe_destination(&self, near: EntityId) -> Option<Position>;
}
