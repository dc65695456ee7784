//! Host dispatch loop.
//!
//! Engine callbacks arrive on foreign threads that may have no tokio runtime
//! at all. They only enqueue; the loop spawned here on the host runtime is
//! the single place where events reach the [`EventBus`], one at a time and in
//! enqueue order.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::commbus::{Event, EventBus};
use crate::types::{ContextId, Error, Result};

/// Handle to a host context's dispatch loop.
#[derive(Debug)]
pub struct Dispatcher {
    tx: mpsc::UnboundedSender<Event>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Dispatcher {
    /// Spawn the dispatch loop on `runtime`.
    pub fn spawn(
        runtime: &Handle,
        context_id: ContextId,
        bus: Arc<EventBus>,
        drain_on_shutdown: bool,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let task = runtime.spawn(run(rx, bus, cancel.clone(), context_id, drain_on_shutdown));

        Self {
            tx,
            cancel,
            task: Mutex::new(Some(task)),
        }
    }

    /// Queue an event for publication. Never blocks.
    pub fn dispatch(&self, event: Event) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::emission("host dispatcher is shut down"));
        }
        self.tx
            .send(event)
            .map_err(|_| Error::emission("host dispatch loop has exited"))
    }

    /// Signal the loop to stop. Idempotent.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Whether `dispatch` can still succeed: shutdown has not been signalled
    /// and the loop task still holds its receiver. The receiver goes away
    /// when the host runtime shuts down.
    pub fn is_open(&self) -> bool {
        !self.tx.is_closed() && !self.cancel.is_cancelled()
    }

    /// Wait for the loop to finish after [`Dispatcher::shutdown`].
    ///
    /// Only the first caller waits on the task; later calls return at once.
    pub async fn join(&self, timeout: Duration) -> Result<()> {
        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(task) = task else {
            return Ok(());
        };

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(Error::internal(format!("dispatch loop failed: {err}"))),
            Err(_) => Err(Error::timeout(format!(
                "dispatch loop did not stop within {timeout:?}"
            ))),
        }
    }
}

async fn run(
    mut rx: mpsc::UnboundedReceiver<Event>,
    bus: Arc<EventBus>,
    cancel: CancellationToken,
    context_id: ContextId,
    drain_on_shutdown: bool,
) {
    tracing::debug!(context = %context_id, "dispatch loop started");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = rx.recv() => match next {
                Some(event) => deliver(&bus, event).await,
                None => break,
            },
        }
    }

    // Anything sent from here on fails at the sender.
    rx.close();

    if drain_on_shutdown {
        while let Some(event) = rx.recv().await {
            deliver(&bus, event).await;
        }
    } else {
        let mut dropped = 0usize;
        while rx.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            tracing::warn!(context = %context_id, dropped, "dropped queued events on shutdown");
        }
    }

    tracing::debug!(context = %context_id, "dispatch loop stopped");
}

async fn deliver(bus: &EventBus, event: Event) {
    let event_name = event.event_name.clone();
    if let Err(err) = bus.publish(event).await {
        tracing::error!(event_name = %event_name, error = %err, "event publish failed");
    }
}
