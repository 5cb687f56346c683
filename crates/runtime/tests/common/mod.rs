#![allow(dead_code)]

//! Shared in-memory world fixture for runtime integration tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use waystone_core::env::{
    EntityDirectory, EntityPolicy, Message, Notifier, PolicyOracle, RelationshipOracle,
    SafetyOracle,
};
use waystone_core::{EntityId, Position};
use waystone_runtime::CollaboratorSet;

#[derive(Default)]
struct WorldState {
    names: HashMap<String, EntityId>,
    positions: HashMap<EntityId, Position>,
    policies: HashMap<EntityId, EntityPolicy>,
    relations: HashSet<(EntityId, EntityId)>,
    safe_destination: Option<Position>,
    messages: Vec<(EntityId, Message)>,
    relocations: Vec<(EntityId, Position)>,
    vitals_restored: Vec<EntityId>,
}

/// Fake server world implementing every collaborator trait over one shared
/// mutex, recording relocations and notifications for assertions.
#[derive(Clone, Default)]
pub struct FakeWorld {
    state: Arc<Mutex<WorldState>>,
}

impl FakeWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collaborator_set(&self) -> CollaboratorSet {
        CollaboratorSet::new(
            Arc::new(self.clone()),
            Arc::new(self.clone()),
            Arc::new(self.clone()),
            Arc::new(self.clone()),
            Arc::new(self.clone()),
        )
    }

    /// Connects an entity at the given position, addressable as `e<id>`.
    pub fn join(&self, entity: EntityId, position: Position) {
        let mut state = self.state.lock().unwrap();
        state.names.insert(format!("e{}", entity.0), entity);
        state.positions.insert(entity, position);
    }

    pub fn leave(&self, entity: EntityId) {
        let mut state = self.state.lock().unwrap();
        state.names.retain(|_, id| *id != entity);
        state.positions.remove(&entity);
    }

    pub fn set_policy(&self, entity: EntityId, policy: EntityPolicy) {
        self.state.lock().unwrap().policies.insert(entity, policy);
    }

    pub fn relate(&self, a: EntityId, b: EntityId) {
        let mut state = self.state.lock().unwrap();
        state.relations.insert((a, b));
        state.relations.insert((b, a));
    }

    pub fn set_safe_destination(&self, destination: Option<Position>) {
        self.state.lock().unwrap().safe_destination = destination;
    }

    /// Moves the entity without going through the scheduler, as a player
    /// walking would.
    pub fn move_to(&self, entity: EntityId, position: Position) {
        self.state.lock().unwrap().positions.insert(entity, position);
    }

    pub fn position_of(&self, entity: EntityId) -> Option<Position> {
        self.state.lock().unwrap().positions.get(&entity).copied()
    }

    pub fn messages_for(&self, entity: EntityId) -> Vec<Message> {
        self.state
            .lock()
            .unwrap()
            .messages
            .iter()
            .filter(|(id, _)| *id == entity)
            .map(|(_, message)| *message)
            .collect()
    }

    pub fn relocations(&self) -> Vec<(EntityId, Position)> {
        self.state.lock().unwrap().relocations.clone()
    }

    pub fn vitals_restored(&self) -> Vec<EntityId> {
        self.state.lock().unwrap().vitals_restored.clone()
    }
}

impl EntityDirectory for FakeWorld {
    fn find(&self, name: &str) -> Option<EntityId> {
        self.state.lock().unwrap().names.get(name).copied()
    }

    fn is_reachable(&self, entity: EntityId) -> bool {
        self.state.lock().unwrap().positions.contains_key(&entity)
    }

    fn position(&self, entity: EntityId) -> Option<Position> {
        self.state.lock().unwrap().positions.get(&entity).copied()
    }

    fn relocate(&self, entity: EntityId, destination: Position) {
        let mut state = self.state.lock().unwrap();
        if state.positions.contains_key(&entity) {
            state.positions.insert(entity, destination);
            state.relocations.push((entity, destination));
        }
    }

    fn online(&self) -> Vec<EntityId> {
        let mut online: Vec<_> = self.state.lock().unwrap().positions.keys().copied().collect();
        online.sort();
        online
    }

    fn restore_vitals(&self, entity: EntityId) {
        self.state.lock().unwrap().vitals_restored.push(entity);
    }
}

impl PolicyOracle for FakeWorld {
    fn policy(&self, entity: EntityId) -> EntityPolicy {
        self.state
            .lock()
            .unwrap()
            .policies
            .get(&entity)
            .copied()
            .unwrap_or_default()
    }
}

impl RelationshipOracle for FakeWorld {
    fn are_related(&self, a: EntityId, b: EntityId) -> bool {
        self.state.lock().unwrap().relations.contains(&(a, b))
    }
}

impl SafetyOracle for FakeWorld {
    fn find_safe_destination(&self, _near: EntityId) -> Option<Position> {
        self.state.lock().unwrap().safe_destination
    }
}

impl Notifier for FakeWorld {
    fn tell(&self, entity: EntityId, message: Message) {
        let mut state = self.state.lock().unwrap();
        if state.positions.contains_key(&entity) {
            state.messages.push((entity, message));
        }
    }
}
