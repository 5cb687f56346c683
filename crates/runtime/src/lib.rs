//! Async runtime for the waystone coordination core.
//!
//! A single background worker task owns the cooldown registry, the teleport
//! scheduler, and the request negotiator. The host talks to it through a
//! cloneable [`RuntimeHandle`]; countdown and expiry timers are spawned tasks
//! that marshal their firings back onto the same worker channel, so all
//! state mutation is serialized without locks.
//!
//! Typical wiring:
//!
//! ```ignore
//! let runtime = Runtime::builder()
//!     .core_config(config)
//!     .collaborators(CollaboratorSet::new(directory, policies, relations, safety, notifier))
//!     .build()?;
//! let handle = runtime.handle();
//! ```

pub mod collaborators;
pub mod error;
pub mod handle;
pub mod negotiator;
pub mod runtime;
pub mod scheduler;
pub mod timer;
pub mod worker;

pub use collaborators::CollaboratorSet;
pub use error::{Result, RuntimeError};
pub use handle::RuntimeHandle;
pub use negotiator::{RequestNegotiator, RequestOutcome};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
pub use scheduler::{Continuation, TeleportScheduler};
pub use timer::TimerHandle;
pub use worker::{Command, CoordinationWorker};
