//! Single-threaded coordination worker.
//!
//! The worker exclusively owns the cooldown registry, the teleport
//! scheduler, and the request negotiator. Every external call, listener
//! notification, and timer firing arrives as a [`Command`] on one mpsc
//! channel and is processed to completion before the next, so none of the
//! underlying maps need locks and a cancellation issued while handling a
//! command reliably stops anything the cancelled timer had queued.

use std::ops::ControlFlow;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use waystone_core::{
    ActionKey, CooldownRegistry, CoreConfig, EntityId, Message, Position, RelocationCause,
    RequestDirection, RequestError,
};

use crate::collaborators::CollaboratorSet;
use crate::negotiator::{RequestNegotiator, RequestOutcome};
use crate::scheduler::{Continuation, TeleportScheduler};

/// Commands processed by the coordination worker.
pub enum Command {
    // ----- negotiation -----
    SendRequest {
        sender: EntityId,
        target: EntityId,
        direction: RequestDirection,
        reply: oneshot::Sender<Result<RequestOutcome, RequestError>>,
    },
    Accept {
        target: EntityId,
        reply: oneshot::Sender<Result<(), RequestError>>,
    },
    Deny {
        target: EntityId,
        reply: oneshot::Sender<Result<(), RequestError>>,
    },
    CancelRequests {
        entity: EntityId,
        reply: oneshot::Sender<()>,
    },

    // ----- scheduling -----
    Schedule {
        entity: EntityId,
        destination: Position,
        on_complete: Option<Continuation>,
        delay_override: Option<u32>,
        reply: oneshot::Sender<()>,
    },
    CancelTeleport {
        entity: EntityId,
        reply: oneshot::Sender<()>,
    },
    HasPendingTeleport {
        entity: EntityId,
        reply: oneshot::Sender<bool>,
    },
    NotifyMoved {
        entity: EntityId,
        reply: oneshot::Sender<()>,
    },
    NotifyDamaged {
        entity: EntityId,
        reply: oneshot::Sender<()>,
    },
    NotifyRelocated {
        entity: EntityId,
        cause: RelocationCause,
        reply: oneshot::Sender<()>,
    },

    // ----- ops -----
    SummonAll {
        sender: EntityId,
        reply: oneshot::Sender<Result<usize, RequestError>>,
    },
    RandomRelocate {
        entity: EntityId,
        reply: oneshot::Sender<Result<(), RequestError>>,
    },
    RestoreVitals {
        entity: EntityId,
        reply: oneshot::Sender<Result<(), RequestError>>,
    },
    Disconnect {
        entity: EntityId,
        reply: oneshot::Sender<()>,
    },

    // ----- cooldowns -----
    IsOnCooldown {
        entity: EntityId,
        action: ActionKey,
        reply: oneshot::Sender<bool>,
    },
    CooldownRemaining {
        entity: EntityId,
        action: ActionKey,
        reply: oneshot::Sender<Duration>,
    },
    SetCooldown {
        entity: EntityId,
        action: ActionKey,
        duration: Duration,
        reply: oneshot::Sender<()>,
    },
    ClearCooldowns {
        entity: EntityId,
        reply: oneshot::Sender<()>,
    },
    SweepCooldowns {
        reply: oneshot::Sender<()>,
    },

    // ----- internal timer firings -----
    TeleportTick {
        entity: EntityId,
        epoch: u64,
    },
    RequestExpired {
        sender: EntityId,
        epoch: u64,
    },

    /// Stop the loop and discard all live sessions and requests.
    Shutdown,
}

/// Background task owning all coordination state.
pub struct CoordinationWorker {
    config: CoreConfig,
    collaborators: CollaboratorSet,
    cooldowns: CooldownRegistry,
    scheduler: TeleportScheduler,
    negotiator: RequestNegotiator,
    command_rx: mpsc::Receiver<Command>,
}

impl CoordinationWorker {
    /// Builds the worker. `self_tx` is the sending side of `command_rx`;
    /// timers clone it to marshal their firings back onto this loop.
    pub fn new(
        config: CoreConfig,
        collaborators: CollaboratorSet,
        cooldowns: CooldownRegistry,
        command_rx: mpsc::Receiver<Command>,
        self_tx: mpsc::Sender<Command>,
    ) -> Self {
        let scheduler =
            TeleportScheduler::new(config.clone(), collaborators.clone(), self_tx.clone());
        let negotiator = RequestNegotiator::new(config.clone(), collaborators.clone(), self_tx);
        Self {
            config,
            collaborators,
            cooldowns,
            scheduler,
            negotiator,
            command_rx,
        }
    }

    /// Main worker loop. Exits on [`Command::Shutdown`] or when every sender
    /// is gone; either way all live sessions and requests are abandoned.
    pub async fn run(mut self) {
        info!(target: "runtime::worker", "Coordination worker started");
        while let Some(command) = self.command_rx.recv().await {
            if self.handle_command(command).is_break() {
                break;
            }
        }
        self.negotiator.discard_all();
        self.scheduler.discard_all();
        info!(target: "runtime::worker", "Coordination worker stopped");
    }

    fn handle_command(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::SendRequest {
                sender,
                target,
                direction,
                reply,
            } => {
                let result = self.negotiator.send_request(
                    sender,
                    target,
                    direction,
                    &mut self.cooldowns,
                    &mut self.scheduler,
                );
                reply_or_log(reply, result, "SendRequest");
            }
            Command::Accept { target, reply } => {
                let result = self.negotiator.accept(target, &mut self.scheduler);
                reply_or_log(reply, result, "Accept");
            }
            Command::Deny { target, reply } => {
                let result = self.negotiator.deny(target);
                reply_or_log(reply, result, "Deny");
            }
            Command::CancelRequests { entity, reply } => {
                self.negotiator.cancel_all(entity);
                reply_or_log(reply, (), "CancelRequests");
            }
            Command::Schedule {
                entity,
                destination,
                on_complete,
                delay_override,
                reply,
            } => {
                self.scheduler
                    .schedule(entity, destination, on_complete, delay_override);
                reply_or_log(reply, (), "Schedule");
            }
            Command::CancelTeleport { entity, reply } => {
                self.scheduler.cancel(entity);
                reply_or_log(reply, (), "CancelTeleport");
            }
            Command::HasPendingTeleport { entity, reply } => {
                reply_or_log(reply, self.scheduler.has_pending(entity), "HasPendingTeleport");
            }
            Command::NotifyMoved { entity, reply } => {
                self.scheduler.notify_moved(entity);
                reply_or_log(reply, (), "NotifyMoved");
            }
            Command::NotifyDamaged { entity, reply } => {
                self.scheduler.notify_damaged(entity);
                reply_or_log(reply, (), "NotifyDamaged");
            }
            Command::NotifyRelocated {
                entity,
                cause,
                reply,
            } => {
                self.scheduler.notify_external_relocation(entity, cause);
                reply_or_log(reply, (), "NotifyRelocated");
            }
            Command::SummonAll { sender, reply } => {
                let result = self.summon_all(sender);
                reply_or_log(reply, result, "SummonAll");
            }
            Command::RandomRelocate { entity, reply } => {
                let result = self.random_relocate(entity);
                reply_or_log(reply, result, "RandomRelocate");
            }
            Command::RestoreVitals { entity, reply } => {
                let result = self.restore_vitals(entity);
                reply_or_log(reply, result, "RestoreVitals");
            }
            Command::Disconnect { entity, reply } => {
                self.disconnect(entity);
                reply_or_log(reply, (), "Disconnect");
            }
            Command::IsOnCooldown {
                entity,
                action,
                reply,
            } => {
                reply_or_log(reply, self.cooldowns.is_active(entity, action), "IsOnCooldown");
            }
            Command::CooldownRemaining {
                entity,
                action,
                reply,
            } => {
                reply_or_log(reply, self.cooldowns.remaining(entity, action), "CooldownRemaining");
            }
            Command::SetCooldown {
                entity,
                action,
                duration,
                reply,
            } => {
                self.cooldowns.set(entity, action, duration);
                reply_or_log(reply, (), "SetCooldown");
            }
            Command::ClearCooldowns { entity, reply } => {
                self.cooldowns.clear_all(entity);
                reply_or_log(reply, (), "ClearCooldowns");
            }
            Command::SweepCooldowns { reply } => {
                self.cooldowns.sweep();
                reply_or_log(reply, (), "SweepCooldowns");
            }
            Command::TeleportTick { entity, epoch } => {
                self.scheduler.handle_tick(entity, epoch);
            }
            Command::RequestExpired { sender, epoch } => {
                self.negotiator.handle_expiry(sender, epoch);
            }
            Command::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    /// Instantly pulls every summonable online entity to the sender.
    ///
    /// The online list is snapshotted before iterating; entities that
    /// disconnect mid-iteration are skipped at relocation time rather than
    /// mutating the set underneath the loop.
    fn summon_all(&mut self, sender: EntityId) -> Result<usize, RequestError> {
        let policy = self.collaborators.policies.policy(sender);
        if self.cooldowns.is_active(sender, ActionKey::Summon) && !policy.bypass_cooldown {
            return Err(RequestError::OnCooldown {
                remaining: self.cooldowns.remaining(sender, ActionKey::Summon),
            });
        }
        let Some(destination) = self.collaborators.directory.position(sender) else {
            return Err(RequestError::NotOnline);
        };

        let snapshot = self.collaborators.directory.online();
        let mut summoned = 0;
        for entity in snapshot {
            if entity == sender || self.collaborators.policies.policy(entity).summon_exempt {
                continue;
            }
            if !self.collaborators.directory.is_reachable(entity) {
                continue;
            }
            self.scheduler.relocate_instant(entity, destination);
            self.collaborators
                .notifier
                .tell(entity, Message::SummonedBy { sender });
            summoned += 1;
        }

        self.cooldowns.set(
            sender,
            ActionKey::Summon,
            Duration::from_secs(self.config.summon_cooldown_secs),
        );
        debug!(target: "runtime::worker", %sender, summoned, "Mass summon complete");
        Ok(summoned)
    }

    /// Relocates the entity to a searched safe position through the normal
    /// countdown rules.
    fn random_relocate(&mut self, entity: EntityId) -> Result<(), RequestError> {
        if !self.collaborators.directory.is_reachable(entity) {
            return Err(RequestError::NotOnline);
        }
        let policy = self.collaborators.policies.policy(entity);
        if self.cooldowns.is_active(entity, ActionKey::RandomRelocate) && !policy.bypass_cooldown {
            return Err(RequestError::OnCooldown {
                remaining: self.cooldowns.remaining(entity, ActionKey::RandomRelocate),
            });
        }
        let Some(destination) = self.collaborators.safety.find_safe_destination(entity) else {
            return Err(RequestError::NoSafeDestination);
        };

        self.cooldowns.set(
            entity,
            ActionKey::RandomRelocate,
            Duration::from_secs(self.config.random_relocate_cooldown_secs),
        );
        self.scheduler.schedule(entity, destination, None, None);
        Ok(())
    }

    fn restore_vitals(&mut self, entity: EntityId) -> Result<(), RequestError> {
        if !self.collaborators.directory.is_reachable(entity) {
            return Err(RequestError::NotOnline);
        }
        let policy = self.collaborators.policies.policy(entity);
        if self.cooldowns.is_active(entity, ActionKey::RestoreVitals) && !policy.bypass_cooldown {
            return Err(RequestError::OnCooldown {
                remaining: self.cooldowns.remaining(entity, ActionKey::RestoreVitals),
            });
        }

        self.collaborators.directory.restore_vitals(entity);
        self.collaborators.notifier.tell(entity, Message::VitalsRestored);
        self.cooldowns.set(
            entity,
            ActionKey::RestoreVitals,
            Duration::from_secs(self.config.restore_vitals_cooldown_secs),
        );
        Ok(())
    }

    /// Full cleanup when an entity leaves: pending teleport, requests in
    /// both directions, and every cooldown entry.
    fn disconnect(&mut self, entity: EntityId) {
        self.scheduler.cancel(entity);
        self.negotiator.cancel_all(entity);
        self.cooldowns.clear_all(entity);
        debug!(target: "runtime::worker", %entity, "Disconnected entity cleaned up");
    }
}

fn reply_or_log<T>(reply: oneshot::Sender<T>, value: T, context: &'static str) {
    if reply.send(value).is_err() {
        debug!(target: "runtime::worker", context, "Reply channel closed (caller dropped)");
    }
}
