//! Peer-to-peer teleport-request negotiation.
//!
//! At most one outstanding outgoing request per sender. A request is either
//! resolved synchronously by the target's auto-accept policy, or stored as
//! pending until the target accepts or denies, the expiry timer fires, or a
//! participant disconnects. Acceptance routes execution through the
//! [`TeleportScheduler`]; the send cooldown gates admission only, never
//! resolution.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use waystone_core::{
    ActionKey, CooldownRegistry, CoreConfig, EntityId, Message, RequestDirection, RequestError,
};

use crate::collaborators::CollaboratorSet;
use crate::scheduler::{Continuation, TeleportScheduler};
use crate::timer::{self, TimerHandle};
use crate::worker::Command;

/// How an admitted request left `send_request`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Stored as pending; the target must accept or deny before expiry.
    Sent,
    /// Resolved synchronously by the target's auto-accept policy.
    AutoAccepted,
}

/// One pending negotiation, keyed by sender in the registry.
///
/// The record exclusively owns its expiry timer; identity is the sender id
/// per the at-most-one-outgoing-request invariant.
struct PendingRequest {
    target: EntityId,
    direction: RequestDirection,
    epoch: u64,
    timer: TimerHandle,
}

/// Owns every pending teleport request.
pub struct RequestNegotiator {
    requests: HashMap<EntityId, PendingRequest>,
    next_epoch: u64,
    config: CoreConfig,
    collaborators: CollaboratorSet,
    tx: mpsc::Sender<Command>,
}

impl RequestNegotiator {
    pub fn new(config: CoreConfig, collaborators: CollaboratorSet, tx: mpsc::Sender<Command>) -> Self {
        Self {
            requests: HashMap::new(),
            next_epoch: 0,
            config,
            collaborators,
            tx,
        }
    }

    /// Admits, auto-resolves, or rejects a new request from `sender`.
    ///
    /// Validation runs synchronously and creates no partial state on
    /// rejection. Admission sets the sender's `request` cooldown before the
    /// auto-accept evaluation, so even an auto-accepted request is rate
    /// limited.
    pub fn send_request(
        &mut self,
        sender: EntityId,
        target: EntityId,
        direction: RequestDirection,
        cooldowns: &mut CooldownRegistry,
        scheduler: &mut TeleportScheduler,
    ) -> Result<RequestOutcome, RequestError> {
        if sender == target {
            return Err(RequestError::SelfTarget);
        }
        if !self.collaborators.directory.is_reachable(target) {
            return Err(RequestError::TargetUnreachable { target });
        }

        let target_policy = self.collaborators.policies.policy(target);
        if !target_policy.requests_enabled {
            return Err(RequestError::RequestsDisabled);
        }
        if self.requests.contains_key(&sender) {
            return Err(RequestError::AlreadyPending);
        }

        let sender_policy = self.collaborators.policies.policy(sender);
        if cooldowns.is_active(sender, ActionKey::Request) && !sender_policy.bypass_cooldown {
            return Err(RequestError::OnCooldown {
                remaining: cooldowns.remaining(sender, ActionKey::Request),
            });
        }

        cooldowns.set(
            sender,
            ActionKey::Request,
            Duration::from_secs(self.config.request_cooldown_secs),
        );

        let related = target_policy.relationship_auto_accept
            && self.collaborators.relationships.are_related(sender, target);
        if target_policy.auto_accept || related {
            debug!(target: "runtime::negotiator", %sender, %target, "Request auto-accepted");
            self.resolve(sender, target, direction, scheduler);
            return Ok(RequestOutcome::AutoAccepted);
        }

        let epoch = self.next_epoch;
        self.next_epoch += 1;
        let timer = timer::spawn_delayed(
            Duration::from_secs(self.config.request_expiry_secs),
            self.tx.clone(),
            Command::RequestExpired { sender, epoch },
        );

        self.requests.insert(
            sender,
            PendingRequest {
                target,
                direction,
                epoch,
                timer,
            },
        );

        self.collaborators
            .notifier
            .tell(target, Message::RequestReceived { sender, direction });
        self.collaborators
            .notifier
            .tell(sender, Message::RequestSent { target });
        debug!(target: "runtime::negotiator", %sender, %target, ?direction, "Request pending");

        Ok(RequestOutcome::Sent)
    }

    /// Target-initiated acceptance of the pending request addressed to
    /// `target`.
    ///
    /// A vanished sender degrades to cleanup plus a participant-unavailable
    /// notification rather than an error: the request was already admitted,
    /// so post-admission failures are reported through the notifier.
    pub fn accept(
        &mut self,
        target: EntityId,
        scheduler: &mut TeleportScheduler,
    ) -> Result<(), RequestError> {
        let sender = self
            .find_by_target(target)
            .ok_or(RequestError::NoPendingRequest)?;
        let Some(request) = self.requests.remove(&sender) else {
            return Err(RequestError::NoPendingRequest);
        };
        request.timer.cancel();

        if !self.collaborators.directory.is_reachable(sender) {
            self.collaborators
                .notifier
                .tell(target, Message::ParticipantUnavailable);
            debug!(target: "runtime::negotiator", %sender, %target, "Accept with offline sender");
            return Ok(());
        }

        self.resolve(sender, target, request.direction, scheduler);
        Ok(())
    }

    /// Target-initiated denial. Both participants are told; no teleport.
    pub fn deny(&mut self, target: EntityId) -> Result<(), RequestError> {
        let sender = self
            .find_by_target(target)
            .ok_or(RequestError::NoPendingRequest)?;
        let Some(request) = self.requests.remove(&sender) else {
            return Err(RequestError::NoPendingRequest);
        };
        request.timer.cancel();

        if self.collaborators.directory.is_reachable(sender) {
            self.collaborators
                .notifier
                .tell(sender, Message::RequestDenied { other: target });
        }
        self.collaborators
            .notifier
            .tell(target, Message::RequestDenied { other: sender });
        debug!(target: "runtime::negotiator", %sender, %target, "Request denied");

        Ok(())
    }

    /// Expiry-timer firing, epoch-guarded against resolved entries whose
    /// firing was already queued.
    pub fn handle_expiry(&mut self, sender: EntityId, epoch: u64) {
        let stale = !self
            .requests
            .get(&sender)
            .is_some_and(|request| request.epoch == epoch);
        if stale {
            return;
        }
        if let Some(request) = self.requests.remove(&sender) {
            if self.collaborators.directory.is_reachable(sender) {
                self.collaborators.notifier.tell(
                    sender,
                    Message::RequestExpired {
                        target: request.target,
                    },
                );
            }
            debug!(target: "runtime::negotiator", %sender, "Request expired unanswered");
        }
    }

    /// Removes the entity's outgoing request and every request targeting it,
    /// cancelling their timers. Safe when nothing references the entity.
    pub fn cancel_all(&mut self, entity: EntityId) {
        if let Some(request) = self.requests.remove(&entity) {
            request.timer.cancel();
        }
        self.requests.retain(|_, request| {
            if request.target == entity {
                request.timer.cancel();
                false
            } else {
                true
            }
        });
    }

    /// Shutdown hook: abandons every pending request and stops its timer.
    pub fn discard_all(&mut self) {
        let abandoned = self.requests.len();
        for request in self.requests.values() {
            request.timer.cancel();
        }
        self.requests.clear();
        if abandoned > 0 {
            debug!(target: "runtime::negotiator", abandoned, "Discarded pending requests on shutdown");
        }
    }

    /// Scan for the pending entry addressed to `target`. The key is
    /// collected before any mutation so removal never races the iteration.
    fn find_by_target(&self, target: EntityId) -> Option<EntityId> {
        self.requests
            .iter()
            .find(|(_, request)| request.target == target)
            .map(|(sender, _)| *sender)
    }

    /// Routes an accepted request into the scheduler.
    ///
    /// The moving entity and destination depend on the direction: the sender
    /// travels to the target for a come-to-me request, the target travels to
    /// the sender for a bring-to-me request. Positions are read at
    /// resolution time. A vanished participant degrades to a notification.
    fn resolve(
        &self,
        sender: EntityId,
        target: EntityId,
        direction: RequestDirection,
        scheduler: &mut TeleportScheduler,
    ) {
        let (moving, stationary) = match direction {
            RequestDirection::ToTarget => (sender, target),
            RequestDirection::ToSender => (target, sender),
        };

        if !self.collaborators.directory.is_reachable(moving) {
            if self.collaborators.directory.is_reachable(stationary) {
                self.collaborators
                    .notifier
                    .tell(stationary, Message::ParticipantUnavailable);
            }
            return;
        }
        let Some(destination) = self.collaborators.directory.position(stationary) else {
            self.collaborators
                .notifier
                .tell(moving, Message::ParticipantUnavailable);
            return;
        };

        let notifier = self.collaborators.notifier.clone();
        let on_complete: Continuation = Box::new(move || {
            notifier.tell(sender, Message::RequestAccepted { other: target });
            notifier.tell(target, Message::RequestAccepted { other: sender });
        });

        scheduler.schedule(moving, destination, Some(on_complete), None);
    }
}
