//! Host event-emission channel.
//!
//! Name-keyed pub/sub used by the host application: any number of listeners
//! register interest in event names, and every publish fans out to the
//! listeners registered at that moment. Delivery to a listener is an
//! unbounded channel send, so publishing never waits on a slow consumer.

use crate::types::{Result, SubscriptionId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

// =============================================================================
// Message Types
// =============================================================================

/// Named event with a JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_name: String,
    pub payload: Value,
    pub timestamp_ms: i64,
    pub source: String, // Context ID that emitted the event
}

impl Event {
    pub fn new(event_name: impl Into<String>, payload: Value, source: impl Into<String>) -> Self {
        Self {
            event_name: event_name.into(),
            payload,
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
            source: source.into(),
        }
    }
}

// =============================================================================
// Subscriber Management
// =============================================================================

#[derive(Debug)]
struct Subscriber {
    id: SubscriptionId,
    tx: mpsc::UnboundedSender<Event>,
}

/// Subscription receipt for managing subscriptions.
#[derive(Debug, Clone)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub event_names: Vec<String>,
}

// =============================================================================
// EventBus
// =============================================================================

/// In-memory event bus owned by a host context.
#[derive(Debug)]
pub struct EventBus {
    /// Event listeners: event_name -> list of subscribers
    subscribers: Arc<RwLock<HashMap<String, Vec<Subscriber>>>>,

    /// Statistics
    stats: Arc<RwLock<BusStats>>,
}

/// Statistics about bus usage.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct BusStats {
    pub events_published: u64,
    pub events_delivered: u64,
    pub active_subscribers: usize,
}

impl EventBus {
    /// Create a new EventBus instance.
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(HashMap::new())),
            stats: Arc::new(RwLock::new(BusStats::default())),
        }
    }

    /// Publish an event to every listener of its name.
    ///
    /// Returns how many listeners received it. Listeners whose receiver has
    /// been dropped are skipped and pruned.
    pub async fn publish(&self, event: Event) -> Result<usize> {
        let mut delivered = 0;
        let mut saw_closed = false;
        {
            let subscribers = self.subscribers.read().await;
            let interested = subscribers
                .get(&event.event_name)
                .map(|subs| subs.as_slice())
                .unwrap_or(&[]);

            for subscriber in interested {
                if subscriber.tx.send(event.clone()).is_ok() {
                    delivered += 1;
                } else {
                    saw_closed = true;
                }
            }
        }

        if saw_closed {
            self.prune_closed().await;
        }

        let mut stats = self.stats.write().await;
        stats.events_published += 1;
        stats.events_delivered += delivered as u64;

        tracing::debug!(
            event_name = %event.event_name,
            source = %event.source,
            delivered,
            "published event"
        );

        Ok(delivered)
    }

    /// Subscribe to event names.
    ///
    /// Returns (subscription handle, receiver channel) for receiving events.
    pub async fn subscribe(
        &self,
        subscriber_id: SubscriptionId,
        event_names: Vec<String>,
    ) -> Result<(Subscription, mpsc::UnboundedReceiver<Event>)> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut subscribers = self.subscribers.write().await;
        for event_name in &event_names {
            subscribers
                .entry(event_name.clone())
                .or_default()
                .push(Subscriber {
                    id: subscriber_id.clone(),
                    tx: tx.clone(),
                });
        }

        let mut stats = self.stats.write().await;
        stats.active_subscribers = subscribers.values().map(|v| v.len()).sum();

        tracing::debug!(
            subscriber = %subscriber_id,
            ?event_names,
            "subscriber registered"
        );

        Ok((
            Subscription {
                id: subscriber_id,
                event_names,
            },
            rx,
        ))
    }

    /// Unsubscribe from events.
    pub async fn unsubscribe(&self, subscription: &Subscription) -> Result<()> {
        let mut subscribers = self.subscribers.write().await;

        for event_name in &subscription.event_names {
            if let Some(subs) = subscribers.get_mut(event_name) {
                subs.retain(|s| s.id != subscription.id);
                if subs.is_empty() {
                    subscribers.remove(event_name);
                }
            }
        }

        let mut stats = self.stats.write().await;
        stats.active_subscribers = subscribers.values().map(|v| v.len()).sum();

        tracing::debug!(subscriber = %subscription.id, "unsubscribed");

        Ok(())
    }

    /// Number of live listeners for an event name.
    pub async fn listener_count(&self, event_name: &str) -> usize {
        self.subscribers
            .read()
            .await
            .get(event_name)
            .map(|subs| subs.iter().filter(|s| !s.tx.is_closed()).count())
            .unwrap_or(0)
    }

    async fn prune_closed(&self) {
        let mut subscribers = self.subscribers.write().await;
        for subs in subscribers.values_mut() {
            subs.retain(|s| !s.tx.is_closed());
        }
        subscribers.retain(|_, subs| !subs.is_empty());

        let mut stats = self.stats.write().await;
        stats.active_subscribers = subscribers.values().map(|v| v.len()).sum();
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    /// Get current bus statistics.
    pub async fn get_stats(&self) -> BusStats {
        self.stats.read().await.clone()
    }

    /// Reset statistics counters.
    pub async fn reset_stats(&self) {
        let mut stats = self.stats.write().await;
        stats.events_published = 0;
        stats.events_delivered = 0;
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_event(name: &str) -> Event {
        Event::new(name, json!({}), "test-context")
    }

    #[tokio::test]
    async fn test_publish_to_zero_subscribers() {
        let bus = EventBus::new();

        let delivered = bus.publish(test_event("UnityMessage")).await.unwrap();
        assert_eq!(delivered, 0);

        let stats = bus.get_stats().await;
        assert_eq!(stats.events_published, 1);
        assert_eq!(stats.events_delivered, 0);
    }

    #[tokio::test]
    async fn test_subscribe_and_publish() {
        let bus = EventBus::new();

        let (subscription, mut rx) = bus
            .subscribe(SubscriptionId::new(), vec!["UnityMessage".to_string()])
            .await
            .unwrap();

        let event = Event::new("UnityMessage", json!({"message": "hello"}), "ctx-1");
        let delivered = bus.publish(event).await.unwrap();
        assert_eq!(delivered, 1);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.event_name, "UnityMessage");
        assert_eq!(received.payload["message"], "hello");
        assert_eq!(received.source, "ctx-1");

        bus.unsubscribe(&subscription).await.unwrap();
    }

    #[tokio::test]
    async fn test_multiple_subscribers_fan_out() {
        let bus = EventBus::new();

        let (_sub1, mut rx1) = bus
            .subscribe(SubscriptionId::new(), vec!["UnityMessage".to_string()])
            .await
            .unwrap();
        let (_sub2, mut rx2) = bus
            .subscribe(SubscriptionId::new(), vec!["UnityMessage".to_string()])
            .await
            .unwrap();

        let delivered = bus.publish(test_event("UnityMessage")).await.unwrap();
        assert_eq!(delivered, 2);

        assert!(rx1.recv().await.is_some());
        assert!(rx2.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_events_are_keyed_by_name() {
        let bus = EventBus::new();

        let (_sub, mut rx) = bus
            .subscribe(SubscriptionId::new(), vec!["UnityMessage".to_string()])
            .await
            .unwrap();

        assert_eq!(bus.publish(test_event("SomethingElse")).await.unwrap(), 0);
        assert_eq!(bus.publish(test_event("UnityMessage")).await.unwrap(), 1);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.event_name, "UnityMessage");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unsubscribe() {
        let bus = EventBus::new();

        let (subscription, _rx) = bus
            .subscribe(SubscriptionId::new(), vec!["UnityMessage".to_string()])
            .await
            .unwrap();
        assert_eq!(bus.get_stats().await.active_subscribers, 1);

        bus.unsubscribe(&subscription).await.unwrap();
        assert_eq!(bus.get_stats().await.active_subscribers, 0);

        let delivered = bus.publish(test_event("UnityMessage")).await.unwrap();
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn test_dropped_receiver_is_pruned() {
        let bus = EventBus::new();

        let (_sub, rx) = bus
            .subscribe(SubscriptionId::new(), vec!["UnityMessage".to_string()])
            .await
            .unwrap();
        drop(rx);
        assert_eq!(bus.listener_count("UnityMessage").await, 0);

        let delivered = bus.publish(test_event("UnityMessage")).await.unwrap();
        assert_eq!(delivered, 0);
        assert_eq!(bus.get_stats().await.active_subscribers, 0);
    }

    #[tokio::test]
    async fn test_reset_stats() {
        let bus = EventBus::new();

        for _ in 0..5 {
            bus.publish(test_event("UnityMessage")).await.unwrap();
        }
        assert_eq!(bus.get_stats().await.events_published, 5);

        bus.reset_stats().await;
        assert_eq!(bus.get_stats().await.events_published, 0);
    }
}
