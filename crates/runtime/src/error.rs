//! Transport-level faults surfaced by the runtime API.
//!
//! Domain outcomes (self-target, cooldown, no pending request) travel inside
//! replies as [`waystone_core::RequestError`]; the variants here only cover
//! worker coordination itself.

use thiserror::Error;
use tokio::sync::oneshot;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("coordination worker command channel closed")]
    CommandChannelClosed,

    #[error("coordination worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("coordination worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("runtime requires collaborators to be configured before building")]
    MissingCollaborators,
}
