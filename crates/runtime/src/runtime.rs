//! Runtime assembly and lifecycle.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use waystone_core::{Clock, CooldownRegistry, CoreConfig};

use crate::collaborators::CollaboratorSet;
use crate::error::{Result, RuntimeError};
use crate::handle::RuntimeHandle;
use crate::worker::CoordinationWorker;

const DEFAULT_COMMAND_BUFFER: usize = 32;

/// Tunables for the runtime shell around [`CoreConfig`].
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    pub core: CoreConfig,
    pub command_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            core: CoreConfig::default(),
            command_buffer_size: DEFAULT_COMMAND_BUFFER,
        }
    }
}

/// Owns the coordination worker task.
///
/// Hand out clones of [`RuntimeHandle`] to command and listener layers; keep
/// the `Runtime` itself wherever the host manages its lifecycle so
/// [`shutdown`](Self::shutdown) can drain it on disable.
pub struct Runtime {
    handle: RuntimeHandle,
    worker: JoinHandle<()>,
}

impl Runtime {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::default()
    }

    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// Stops the worker and waits for it to drain. Live countdowns and
    /// pending requests are abandoned without notifications.
    ///
    /// An explicit command is required here: the scheduler and negotiator
    /// hold sender clones for their timers, so the channel never closes just
    /// because external handles were dropped.
    pub async fn shutdown(self) -> Result<()> {
        self.handle.send_shutdown().await?;
        self.worker.await.map_err(RuntimeError::WorkerJoin)?;
        info!(target: "runtime", "Runtime shut down");
        Ok(())
    }
}

/// Assembles a [`Runtime`] from its configuration and collaborators.
#[derive(Default)]
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    collaborators: Option<CollaboratorSet>,
    cooldown_clock: Option<Arc<dyn Clock>>,
}

impl RuntimeBuilder {
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn core_config(mut self, core: CoreConfig) -> Self {
        self.config.core = core;
        self
    }

    pub fn collaborators(mut self, collaborators: CollaboratorSet) -> Self {
        self.collaborators = Some(collaborators);
        self
    }

    /// Overrides the cooldown registry's time source. Defaults to the
    /// process-monotonic clock.
    pub fn cooldown_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.cooldown_clock = Some(clock);
        self
    }

    /// Spawns the coordination worker on the current tokio runtime.
    pub fn build(self) -> Result<Runtime> {
        let collaborators = self.collaborators.ok_or(RuntimeError::MissingCollaborators)?;
        let cooldowns = match self.cooldown_clock {
            Some(clock) => CooldownRegistry::with_clock(clock),
            None => CooldownRegistry::new(),
        };

        let (command_tx, command_rx) = mpsc::channel(self.config.command_buffer_size);
        let worker = CoordinationWorker::new(
            self.config.core,
            collaborators,
            cooldowns,
            command_rx,
            command_tx.clone(),
        );
        let worker = tokio::spawn(worker.run());
        info!(target: "runtime", "Runtime started");

        Ok(Runtime {
            handle: RuntimeHandle::new(command_tx),
            worker,
        })
    }
}
