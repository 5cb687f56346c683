//! Cancellable deferred and periodic timers.
//!
//! Timer tasks never touch coordination state. They only post commands back
//! onto the worker's channel, so every firing is serialized with the rest of
//! the event flow. Cancelling aborts the underlying task; a firing that was
//! already queued before cancellation is dropped by the epoch guard carried
//! inside the command.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;

/// Owning handle for a scheduled timer.
///
/// Stored inside the session or request record that the timer belongs to, so
/// ownership of "when to stop" is unambiguous. Cancellation is idempotent:
/// cancelling an already-fired or already-cancelled timer is a no-op. The
/// timer is also aborted when the handle is dropped.
#[derive(Debug)]
pub struct TimerHandle {
    abort: AbortHandle,
}

impl TimerHandle {
    pub fn cancel(&self) {
        self.abort.abort();
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.abort.abort();
    }
}

/// Posts `command` onto `tx` once, after `delay`.
pub(crate) fn spawn_delayed<T: Send + 'static>(
    delay: Duration,
    tx: mpsc::Sender<T>,
    command: T,
) -> TimerHandle {
    let task = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let _ = tx.send(command).await;
    });
    TimerHandle {
        abort: task.abort_handle(),
    }
}

/// Posts a fresh command onto `tx` every `period`, starting one period from
/// now, until cancelled or the channel closes.
pub(crate) fn spawn_repeating<T, F>(period: Duration, tx: mpsc::Sender<T>, mut make: F) -> TimerHandle
where
    T: Send + 'static,
    F: FnMut() -> T + Send + 'static,
{
    let task = tokio::spawn(async move {
        let start = tokio::time::Instant::now() + period;
        let mut interval = tokio::time::interval_at(start, period);
        loop {
            interval.tick().await;
            if tx.send(make()).await.is_err() {
                break;
            }
        }
    });
    TimerHandle {
        abort: task.abort_handle(),
    }
}
