//! Traits describing the world the coordination core runs inside.
//!
//! The core never talks to a server implementation directly; the hosting
//! layer supplies these collaborators and the runtime bundles them. All
//! user-facing text, permission evaluation, persistence, and world geometry
//! live on the far side of these seams.
mod directory;
mod notify;
mod policy;
mod relations;
mod safety;

pub use directory::EntityDirectory;
pub use notify::{Message, Notifier};
pub use policy::{EntityPolicy, PolicyOracle};
pub use relations::RelationshipOracle;
pub use safety::SafetyOracle;
