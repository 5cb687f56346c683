//! Bundle of host-supplied collaborator implementations.
//!
//! Mirrors the trait seams in [`waystone_core::env`]: the hosting server
//! builds one [`CollaboratorSet`] at startup and the worker threads it
//! through the scheduler, negotiator, and ops layer.

use std::sync::Arc;

use waystone_core::env::{EntityDirectory, Notifier, PolicyOracle, RelationshipOracle, SafetyOracle};

/// Aggregates the external collaborators required by the coordination core.
#[derive(Clone)]
pub struct CollaboratorSet {
    pub(crate) directory: Arc<dyn EntityDirectory>,
    pub(crate) policies: Arc<dyn PolicyOracle>,
    pub(crate) relationships: Arc<dyn RelationshipOracle>,
    pub(crate) safety: Arc<dyn SafetyOracle>,
    pub(crate) notifier: Arc<dyn Notifier>,
}

impl CollaboratorSet {
    pub fn new(
        directory: Arc<dyn EntityDirectory>,
        policies: Arc<dyn PolicyOracle>,
        relationships: Arc<dyn RelationshipOracle>,
        safety: Arc<dyn SafetyOracle>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            directory,
            policies,
            relationships,
            safety,
            notifier,
        }
    }

    /// Access to the entity directory for command-layer name resolution.
    pub fn directory(&self) -> &dyn EntityDirectory {
        self.directory.as_ref()
    }
}
