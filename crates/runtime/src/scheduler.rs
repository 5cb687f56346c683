//! Delayed, interruptible relocation of entities.
//!
//! The scheduler owns at most one [`TeleportSession`] per entity: a 1 Hz
//! countdown, the anchor position captured when the countdown started, and an
//! optional completion continuation. Scheduling again for the same entity
//! silently supersedes the previous session. Movement past the tolerance,
//! damage, and relocations from other sources all cancel in-flight sessions
//! through the `notify_*` entry points fed by the host's event-listener
//! layer.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use waystone_core::{CoreConfig, EntityId, Message, Position, RelocationCause};

use crate::collaborators::CollaboratorSet;
use crate::timer::{self, TimerHandle};
use crate::worker::Command;

/// Completion callback invoked at most once, when (and only when) the
/// relocation actually happens. Cancellation in any form drops it unrun.
pub type Continuation = Box<dyn FnOnce() + Send>;

/// One in-flight delayed relocation.
///
/// The session exclusively owns its timer handle; removing the session stops
/// the countdown. The epoch guards against ticks that were already queued
/// when the session was cancelled or replaced.
struct TeleportSession {
    destination: Position,
    anchor: Position,
    remaining: u32,
    epoch: u64,
    timer: TimerHandle,
    on_complete: Option<Continuation>,
}

/// Owns every pending delayed relocation.
pub struct TeleportScheduler {
    sessions: HashMap<EntityId, TeleportSession>,
    next_epoch: u64,
    config: CoreConfig,
    collaborators: CollaboratorSet,
    tx: mpsc::Sender<Command>,
}

impl TeleportScheduler {
    pub fn new(config: CoreConfig, collaborators: CollaboratorSet, tx: mpsc::Sender<Command>) -> Self {
        Self {
            sessions: HashMap::new(),
            next_epoch: 0,
            config,
            collaborators,
            tx,
        }
    }

    /// Starts a delayed relocation for the entity.
    ///
    /// A zero effective delay, or a `bypass_delay` policy, relocates
    /// immediately without creating a session. Otherwise any existing
    /// session for the entity is superseded, the current position becomes
    /// the disturbance anchor, and a per-second countdown begins.
    pub fn schedule(
        &mut self,
        entity: EntityId,
        destination: Position,
        on_complete: Option<Continuation>,
        delay_override: Option<u32>,
    ) {
        self.cancel(entity);

        let delay = delay_override.unwrap_or(self.config.teleport_delay_secs);
        let policy = self.collaborators.policies.policy(entity);
        if delay == 0 || policy.bypass_delay {
            self.relocate_now(entity, destination, on_complete);
            return;
        }

        let Some(anchor) = self.collaborators.directory.position(entity) else {
            debug!(
                target: "runtime::scheduler",
                %entity,
                "Entity unreachable at schedule time, dropping relocation"
            );
            return;
        };

        let epoch = self.next_epoch;
        self.next_epoch += 1;

        let timer = timer::spawn_repeating(
            Duration::from_secs(1),
            self.tx.clone(),
            move || Command::TeleportTick { entity, epoch },
        );

        self.collaborators.notifier.tell(entity, Message::TeleportStarting);
        debug!(
            target: "runtime::scheduler",
            %entity,
            %destination,
            delay,
            "Scheduled delayed relocation"
        );

        self.sessions.insert(
            entity,
            TeleportSession {
                destination,
                anchor,
                remaining: delay,
                epoch,
                timer,
                on_complete,
            },
        );
    }

    /// Stops and removes any active session for the entity. Idempotent.
    /// Returns whether a session existed.
    pub fn cancel(&mut self, entity: EntityId) -> bool {
        if let Some(session) = self.sessions.remove(&entity) {
            session.timer.cancel();
            true
        } else {
            false
        }
    }

    pub fn has_pending(&self, entity: EntityId) -> bool {
        self.sessions.contains_key(&entity)
    }

    /// Relocates the entity right away, superseding any pending session.
    pub fn relocate_instant(&mut self, entity: EntityId, destination: Position) {
        self.cancel(entity);
        self.relocate_now(entity, destination, None);
    }

    /// Countdown tick delivered by the session timer.
    ///
    /// Stale epochs belong to a cancelled or superseded session and are
    /// dropped. An entity that went offline mid-countdown is cancelled
    /// silently: there is no caller left to receive anything, so the
    /// continuation is dropped unrun.
    pub fn handle_tick(&mut self, entity: EntityId, epoch: u64) {
        match self.sessions.get(&entity) {
            Some(session) if session.epoch == epoch => {}
            _ => return,
        }

        if !self.collaborators.directory.is_reachable(entity) {
            debug!(
                target: "runtime::scheduler",
                %entity,
                "Entity went offline mid-countdown, cancelling session"
            );
            self.cancel(entity);
            return;
        }

        let seconds_left = match self.sessions.get_mut(&entity) {
            Some(session) => {
                session.remaining -= 1;
                session.remaining
            }
            None => return,
        };

        if seconds_left > 0 {
            self.collaborators
                .notifier
                .tell(entity, Message::TeleportCountdown { seconds_left });
            return;
        }

        if let Some(session) = self.sessions.remove(&entity) {
            session.timer.cancel();
            self.relocate_now(entity, session.destination, session.on_complete);
        }
    }

    /// Movement disturbance from the listener layer.
    ///
    /// Pure rotation arrives with an unchanged position and never cancels;
    /// translation past the squared-distance tolerance does.
    pub fn notify_moved(&mut self, entity: EntityId) {
        if !self.config.cancel_on_move {
            return;
        }
        let Some(session) = self.sessions.get(&entity) else {
            return;
        };
        let Some(position) = self.collaborators.directory.position(entity) else {
            return;
        };
        if position.distance_squared(&session.anchor) > self.config.movement_tolerance_sq {
            self.cancel(entity);
            self.collaborators.notifier.tell(entity, Message::TeleportCancelled);
            debug!(target: "runtime::scheduler", %entity, "Session cancelled by movement");
        }
    }

    /// Damage disturbance from the listener layer. Unconditional cancel
    /// while `cancel_on_damage` is set.
    pub fn notify_damaged(&mut self, entity: EntityId) {
        if !self.config.cancel_on_damage {
            return;
        }
        if self.cancel(entity) {
            self.collaborators.notifier.tell(entity, Message::TeleportCancelled);
            debug!(target: "runtime::scheduler", %entity, "Session cancelled by damage");
        }
    }

    /// The entity was relocated by something else while counting down.
    ///
    /// The scheduler's own completions arrive with
    /// [`RelocationCause::Scheduled`] and are ignored; every other cause
    /// invalidates the session so a stale countdown cannot fire after the
    /// entity already moved.
    pub fn notify_external_relocation(&mut self, entity: EntityId, cause: RelocationCause) {
        if cause == RelocationCause::Scheduled {
            return;
        }
        if self.cancel(entity) {
            debug!(
                target: "runtime::scheduler",
                %entity,
                %cause,
                "Session cancelled by external relocation"
            );
        }
    }

    /// Shutdown hook: abandons every live session and stops its timer.
    pub fn discard_all(&mut self) {
        let abandoned = self.sessions.len();
        for session in self.sessions.values() {
            session.timer.cancel();
        }
        self.sessions.clear();
        if abandoned > 0 {
            debug!(target: "runtime::scheduler", abandoned, "Discarded live sessions on shutdown");
        }
    }

    fn relocate_now(&self, entity: EntityId, destination: Position, on_complete: Option<Continuation>) {
        self.collaborators.directory.relocate(entity, destination);
        self.collaborators.notifier.tell(entity, Message::TeleportComplete);
        if let Some(callback) = on_complete {
            callback();
        }
    }
}
