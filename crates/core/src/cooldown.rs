//! Per-entity, per-action rate limiting.
//!
//! The registry stores one absolute expiry per (entity, action key) pair and
//! treats any entry whose expiry has passed as absent. Expired entries are
//! evicted lazily on read; [`CooldownRegistry::sweep`] exists purely to bound
//! memory in long-lived processes and is never required for correctness.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::{Clock, MonotonicClock};
use crate::types::{ActionKey, EntityId};

/// Tracks which entities are still restricted from which actions.
///
/// All operations are total functions over possibly-absent keys; there are no
/// error conditions. Side effects are confined to the registry's own storage.
pub struct CooldownRegistry {
    entries: HashMap<EntityId, HashMap<ActionKey, Duration>>,
    clock: Arc<dyn Clock>,
}

impl CooldownRegistry {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(MonotonicClock::new()))
    }

    /// Builds a registry over an explicit time source (tests use
    /// [`ManualClock`](crate::clock::ManualClock)).
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            clock,
        }
    }

    /// Records `now + duration` as the expiry for (entity, action),
    /// overwriting any existing entry. A zero duration is a no-op.
    pub fn set(&mut self, entity: EntityId, action: ActionKey, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        let expiry = self.clock.now() + duration;
        self.entries.entry(entity).or_default().insert(action, expiry);
    }

    /// Returns true iff an entry exists whose expiry is strictly in the
    /// future. A discovered-expired entry is evicted on the way out.
    pub fn is_active(&mut self, entity: EntityId, action: ActionKey) -> bool {
        let now = self.clock.now();
        let Some(per_entity) = self.entries.get_mut(&entity) else {
            return false;
        };
        match per_entity.get(&action) {
            Some(expiry) if *expiry > now => true,
            Some(_) => {
                per_entity.remove(&action);
                if per_entity.is_empty() {
                    self.entries.remove(&entity);
                }
                false
            }
            None => false,
        }
    }

    /// Non-negative time until the entry expires; zero when inactive.
    pub fn remaining(&self, entity: EntityId, action: ActionKey) -> Duration {
        let now = self.clock.now();
        self.entries
            .get(&entity)
            .and_then(|per_entity| per_entity.get(&action))
            .map(|expiry| expiry.saturating_sub(now))
            .unwrap_or(Duration::ZERO)
    }

    /// Removes a single (entity, action) entry if present.
    pub fn clear(&mut self, entity: EntityId, action: ActionKey) {
        if let Some(per_entity) = self.entries.get_mut(&entity) {
            per_entity.remove(&action);
            if per_entity.is_empty() {
                self.entries.remove(&entity);
            }
        }
    }

    /// Evicts every action entry for the entity. Used on disconnect.
    pub fn clear_all(&mut self, entity: EntityId) {
        self.entries.remove(&entity);
    }

    /// Snapshot of the entity's live cooldowns with remaining time.
    pub fn active(&self, entity: EntityId) -> Vec<(ActionKey, Duration)> {
        let now = self.clock.now();
        self.entries
            .get(&entity)
            .map(|per_entity| {
                per_entity
                    .iter()
                    .filter(|(_, expiry)| **expiry > now)
                    .map(|(action, expiry)| (*action, *expiry - now))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Removes all expired entries across all entities.
    ///
    /// Optional maintenance pass; lazy expiry already keeps reads correct.
    pub fn sweep(&mut self) {
        let now = self.clock.now();
        let before: usize = self.entries.values().map(HashMap::len).sum();
        self.entries.retain(|_, per_entity| {
            per_entity.retain(|_, expiry| *expiry > now);
            !per_entity.is_empty()
        });
        let after: usize = self.entries.values().map(HashMap::len).sum();
        if before != after {
            tracing::debug!(
                target: "core::cooldown",
                evicted = before - after,
                live = after,
                "Swept expired cooldown entries"
            );
        }
    }
}

impl Default for CooldownRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const ALICE: EntityId = EntityId(1);
    const BOB: EntityId = EntityId(2);

    fn registry() -> (CooldownRegistry, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (CooldownRegistry::with_clock(clock.clone()), clock)
    }

    #[test]
    fn set_then_active_until_expiry() {
        let (mut registry, clock) = registry();
        registry.set(ALICE, ActionKey::Request, Duration::from_secs(30));

        assert!(registry.is_active(ALICE, ActionKey::Request));
        assert_eq!(
            registry.remaining(ALICE, ActionKey::Request),
            Duration::from_secs(30)
        );

        clock.advance(Duration::from_secs(29));
        assert!(registry.is_active(ALICE, ActionKey::Request));

        clock.advance(Duration::from_secs(1));
        assert!(!registry.is_active(ALICE, ActionKey::Request));
        assert_eq!(
            registry.remaining(ALICE, ActionKey::Request),
            Duration::ZERO
        );
    }

    #[test]
    fn zero_duration_is_noop() {
        let (mut registry, _clock) = registry();
        registry.set(ALICE, ActionKey::Request, Duration::ZERO);
        assert!(!registry.is_active(ALICE, ActionKey::Request));
    }

    #[test]
    fn set_overwrites_existing_entry() {
        let (mut registry, clock) = registry();
        registry.set(ALICE, ActionKey::Request, Duration::from_secs(10));
        registry.set(ALICE, ActionKey::Request, Duration::from_secs(60));

        clock.advance(Duration::from_secs(20));
        assert!(registry.is_active(ALICE, ActionKey::Request));
        assert_eq!(
            registry.remaining(ALICE, ActionKey::Request),
            Duration::from_secs(40)
        );
    }

    #[test]
    fn action_keys_are_independent() {
        let (mut registry, _clock) = registry();
        registry.set(ALICE, ActionKey::Request, Duration::from_secs(30));

        assert!(!registry.is_active(ALICE, ActionKey::RandomRelocate));
        assert!(!registry.is_active(BOB, ActionKey::Request));
    }

    #[test]
    fn read_evicts_expired_entry() {
        let (mut registry, clock) = registry();
        registry.set(ALICE, ActionKey::Request, Duration::from_secs(5));
        clock.advance(Duration::from_secs(5));

        assert!(!registry.is_active(ALICE, ActionKey::Request));
        // Entry is gone, not merely inactive.
        assert!(registry.active(ALICE).is_empty());
    }

    #[test]
    fn clear_removes_exactly_one_key() {
        let (mut registry, _clock) = registry();
        registry.set(ALICE, ActionKey::Request, Duration::from_secs(30));
        registry.set(ALICE, ActionKey::RestoreVitals, Duration::from_secs(30));

        registry.clear(ALICE, ActionKey::Request);
        assert!(!registry.is_active(ALICE, ActionKey::Request));
        assert!(registry.is_active(ALICE, ActionKey::RestoreVitals));
    }

    #[test]
    fn clear_all_evicts_every_action() {
        let (mut registry, _clock) = registry();
        registry.set(ALICE, ActionKey::Request, Duration::from_secs(30));
        registry.set(ALICE, ActionKey::Summon, Duration::from_secs(30));
        registry.set(BOB, ActionKey::Request, Duration::from_secs(30));

        registry.clear_all(ALICE);
        assert!(!registry.is_active(ALICE, ActionKey::Request));
        assert!(!registry.is_active(ALICE, ActionKey::Summon));
        assert!(registry.is_active(BOB, ActionKey::Request));
    }

    #[test]
    fn sweep_drops_expired_across_entities() {
        let (mut registry, clock) = registry();
        registry.set(ALICE, ActionKey::Request, Duration::from_secs(10));
        registry.set(BOB, ActionKey::Summon, Duration::from_secs(60));

        clock.advance(Duration::from_secs(30));
        registry.sweep();

        assert!(registry.active(ALICE).is_empty());
        assert_eq!(registry.active(BOB).len(), 1);
    }
}
