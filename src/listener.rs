//! Application-side consumer of relayed engine messages.
//!
//! [`MessageListener`] subscribes to `"UnityMessage"` on a host bus and hands
//! each message text to a callback, so application code never deals with
//! bus events or payload decoding.

use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::commbus::{EventBus, Subscription};
use crate::relay::{EventPayload, EVENT_NAME};
use crate::types::{Result, SubscriptionId};

/// Set of message callbacks registered on one bus.
#[derive(Debug)]
pub struct MessageListener {
    bus: Arc<EventBus>,
    listeners: Vec<(Subscription, JoinHandle<()>)>,
}

impl MessageListener {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            bus,
            listeners: Vec::new(),
        }
    }

    /// Call `callback` with the text of every `"UnityMessage"` event
    /// published from now on.
    ///
    /// Must be called from within a tokio runtime. Payloads that do not
    /// decode are logged and skipped.
    pub async fn on_message<F>(&mut self, mut callback: F) -> Result<SubscriptionId>
    where
        F: FnMut(String) + Send + 'static,
    {
        let (subscription, mut rx) = self
            .bus
            .subscribe(SubscriptionId::new(), vec![EVENT_NAME.to_string()])
            .await?;
        let id = subscription.id.clone();

        let task = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match serde_json::from_value::<EventPayload>(event.payload) {
                    Ok(payload) => callback(payload.message),
                    Err(err) => {
                        tracing::warn!(source = %event.source, error = %err, "skipping malformed message payload");
                    }
                }
            }
        });

        self.listeners.push((subscription, task));
        Ok(id)
    }

    /// Remove every callback registered through this listener.
    pub async fn remove_listeners(&mut self) -> Result<()> {
        for (subscription, task) in self.listeners.drain(..) {
            self.bus.unsubscribe(&subscription).await?;
            task.abort();
        }
        Ok(())
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Drop for MessageListener {
    fn drop(&mut self) {
        for (_, task) in &self.listeners {
            task.abort();
        }
    }
}
