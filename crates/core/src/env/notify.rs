//! Outbound notification surface.
//!
//! The core never produces user-facing text. It selects a [`Message`] — a
//! key plus typed parameters — and hands it to the host's [`Notifier`],
//! which owns localization, formatting, and delivery.

use crate::types::{EntityId, RequestDirection};

/// Message key with parameters, rendered externally.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Message {
    /// A delayed relocation started counting down.
    TeleportStarting,
    /// Countdown progress, once per second.
    TeleportCountdown { seconds_left: u32 },
    /// The relocation completed.
    TeleportComplete,
    /// The countdown was cancelled by movement or damage.
    TeleportCancelled,
    /// The sender's request was delivered.
    RequestSent { target: EntityId },
    /// A request arrived and awaits accept/deny.
    RequestReceived {
        sender: EntityId,
        direction: RequestDirection,
    },
    /// The request was accepted; sent to both participants.
    RequestAccepted { other: EntityId },
    /// The request was denied; sent to both participants.
    RequestDenied { other: EntityId },
    /// The sender's request expired unanswered.
    RequestExpired { target: EntityId },
    /// The counterpart went offline before resolution.
    ParticipantUnavailable,
    /// The entity was pulled in by a mass summon.
    SummonedBy { sender: EntityId },
    /// Vitals were restored.
    VitalsRestored,
}

/// Delivers messages to entities. Unreachable recipients are dropped
/// silently by the implementation.
pub trait Notifier: Send + Sync {
    fn tell(&self, entity: EntityId, message: Message);
}
