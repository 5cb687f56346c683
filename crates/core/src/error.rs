//! Recoverable outcomes surfaced to the command layer.
//!
//! Nothing here is fatal: every variant is an expected negotiation or
//! scheduling outcome returned as a value. Failures that happen after a
//! request or session was admitted are absorbed internally and reported
//! through the [`Notifier`](crate::env::Notifier) instead, because resolution
//! may run long after the original call returned.

use std::time::Duration;

use thiserror::Error;

use crate::types::EntityId;

/// Why a request or operation was rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("cannot send a request to yourself")]
    SelfTarget,

    #[error("recipient is not accepting requests")]
    RequestsDisabled,

    #[error("a request is already pending")]
    AlreadyPending,

    #[error("on cooldown for another {} seconds", remaining.as_secs())]
    OnCooldown { remaining: Duration },

    #[error("target {target} is unreachable")]
    TargetUnreachable { target: EntityId },

    #[error("no pending request addressed to you")]
    NoPendingRequest,

    #[error("participant is no longer online")]
    NotOnline,

    #[error("no safe destination could be found")]
    NoSafeDestination,
}
