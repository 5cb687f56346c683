//! Cloneable client handle for the coordination worker.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use waystone_core::{
    ActionKey, EntityId, Position, RelocationCause, RequestDirection, RequestError,
};

use crate::error::{Result, RuntimeError};
use crate::negotiator::RequestOutcome;
use crate::scheduler::Continuation;
use crate::worker::Command;

/// Handle to a running [`Runtime`](crate::Runtime).
///
/// Cheap to clone; every clone talks to the same worker. All methods are
/// async because they round-trip through the worker's command channel, but
/// none of them block on game-time: a countdown started by
/// [`schedule_teleport`](Self::schedule_teleport) runs in the background.
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
}

impl RuntimeHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>) -> Self {
        Self { command_tx }
    }

    /// Sends a teleport request from `sender` to `target`.
    pub async fn send_request(
        &self,
        sender: EntityId,
        target: EntityId,
        direction: RequestDirection,
    ) -> Result<std::result::Result<RequestOutcome, RequestError>> {
        let (reply, reply_rx) = oneshot::channel();
        self.send(Command::SendRequest {
            sender,
            target,
            direction,
            reply,
        })
        .await?;
        self.recv(reply_rx).await
    }

    /// Accepts the pending request addressed to `target`.
    pub async fn accept(&self, target: EntityId) -> Result<std::result::Result<(), RequestError>> {
        let (reply, reply_rx) = oneshot::channel();
        self.send(Command::Accept { target, reply }).await?;
        self.recv(reply_rx).await
    }

    /// Denies the pending request addressed to `target`.
    pub async fn deny(&self, target: EntityId) -> Result<std::result::Result<(), RequestError>> {
        let (reply, reply_rx) = oneshot::channel();
        self.send(Command::Deny { target, reply }).await?;
        self.recv(reply_rx).await
    }

    /// Cancels the entity's outgoing request and any requests targeting it.
    pub async fn cancel_requests(&self, entity: EntityId) -> Result<()> {
        let (reply, reply_rx) = oneshot::channel();
        self.send(Command::CancelRequests { entity, reply }).await?;
        self.recv(reply_rx).await
    }

    /// Starts a delayed relocation, superseding any pending one.
    pub async fn schedule_teleport(
        &self,
        entity: EntityId,
        destination: Position,
        delay_override: Option<u32>,
    ) -> Result<()> {
        let (reply, reply_rx) = oneshot::channel();
        self.send(Command::Schedule {
            entity,
            destination,
            on_complete: None,
            delay_override,
            reply,
        })
        .await?;
        self.recv(reply_rx).await
    }

    /// Starts a delayed relocation with a completion callback. The callback
    /// runs on the worker when (and only when) the relocation happens.
    pub async fn schedule_teleport_with(
        &self,
        entity: EntityId,
        destination: Position,
        on_complete: Continuation,
        delay_override: Option<u32>,
    ) -> Result<()> {
        let (reply, reply_rx) = oneshot::channel();
        self.send(Command::Schedule {
            entity,
            destination,
            on_complete: Some(on_complete),
            delay_override,
            reply,
        })
        .await?;
        self.recv(reply_rx).await
    }

    /// Cancels the entity's pending relocation, if any.
    pub async fn cancel_teleport(&self, entity: EntityId) -> Result<()> {
        let (reply, reply_rx) = oneshot::channel();
        self.send(Command::CancelTeleport { entity, reply }).await?;
        self.recv(reply_rx).await
    }

    pub async fn has_pending_teleport(&self, entity: EntityId) -> Result<bool> {
        let (reply, reply_rx) = oneshot::channel();
        self.send(Command::HasPendingTeleport { entity, reply }).await?;
        self.recv(reply_rx).await
    }

    /// Listener hook: the entity changed position.
    pub async fn notify_moved(&self, entity: EntityId) -> Result<()> {
        let (reply, reply_rx) = oneshot::channel();
        self.send(Command::NotifyMoved { entity, reply }).await?;
        self.recv(reply_rx).await
    }

    /// Listener hook: the entity took damage.
    pub async fn notify_damaged(&self, entity: EntityId) -> Result<()> {
        let (reply, reply_rx) = oneshot::channel();
        self.send(Command::NotifyDamaged { entity, reply }).await?;
        self.recv(reply_rx).await
    }

    /// Listener hook: the entity was relocated by `cause`.
    pub async fn notify_relocated(&self, entity: EntityId, cause: RelocationCause) -> Result<()> {
        let (reply, reply_rx) = oneshot::channel();
        self.send(Command::NotifyRelocated {
            entity,
            cause,
            reply,
        })
        .await?;
        self.recv(reply_rx).await
    }

    /// Pulls every summonable online entity to the sender's position.
    /// Returns how many were relocated.
    pub async fn summon_all(
        &self,
        sender: EntityId,
    ) -> Result<std::result::Result<usize, RequestError>> {
        let (reply, reply_rx) = oneshot::channel();
        self.send(Command::SummonAll { sender, reply }).await?;
        self.recv(reply_rx).await
    }

    /// Relocates the entity to a searched safe position.
    pub async fn random_relocate(
        &self,
        entity: EntityId,
    ) -> Result<std::result::Result<(), RequestError>> {
        let (reply, reply_rx) = oneshot::channel();
        self.send(Command::RandomRelocate { entity, reply }).await?;
        self.recv(reply_rx).await
    }

    /// Restores the entity's vitals through the directory.
    pub async fn restore_vitals(
        &self,
        entity: EntityId,
    ) -> Result<std::result::Result<(), RequestError>> {
        let (reply, reply_rx) = oneshot::channel();
        self.send(Command::RestoreVitals { entity, reply }).await?;
        self.recv(reply_rx).await
    }

    /// Full cleanup when an entity leaves the server.
    pub async fn disconnect(&self, entity: EntityId) -> Result<()> {
        let (reply, reply_rx) = oneshot::channel();
        self.send(Command::Disconnect { entity, reply }).await?;
        self.recv(reply_rx).await
    }

    pub async fn is_on_cooldown(&self, entity: EntityId, action: ActionKey) -> Result<bool> {
        let (reply, reply_rx) = oneshot::channel();
        self.send(Command::IsOnCooldown {
            entity,
            action,
            reply,
        })
        .await?;
        self.recv(reply_rx).await
    }

    /// Remaining cooldown for the action; zero when none is active.
    pub async fn cooldown_remaining(&self, entity: EntityId, action: ActionKey) -> Result<Duration> {
        let (reply, reply_rx) = oneshot::channel();
        self.send(Command::CooldownRemaining {
            entity,
            action,
            reply,
        })
        .await?;
        self.recv(reply_rx).await
    }

    pub async fn set_cooldown(
        &self,
        entity: EntityId,
        action: ActionKey,
        duration: Duration,
    ) -> Result<()> {
        let (reply, reply_rx) = oneshot::channel();
        self.send(Command::SetCooldown {
            entity,
            action,
            duration,
            reply,
        })
        .await?;
        self.recv(reply_rx).await
    }

    pub async fn clear_cooldowns(&self, entity: EntityId) -> Result<()> {
        let (reply, reply_rx) = oneshot::channel();
        self.send(Command::ClearCooldowns { entity, reply }).await?;
        self.recv(reply_rx).await
    }

    /// Evicts every expired cooldown entry eagerly.
    pub async fn sweep_cooldowns(&self) -> Result<()> {
        let (reply, reply_rx) = oneshot::channel();
        self.send(Command::SweepCooldowns { reply }).await?;
        self.recv(reply_rx).await
    }

    pub(crate) async fn send_shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown).await
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)
    }

    async fn recv<T>(&self, reply_rx: oneshot::Receiver<T>) -> Result<T> {
        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }
}
