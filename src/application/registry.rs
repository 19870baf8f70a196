use crate::domain::errors::BroadcastError;
use crate::domain::metric::MetricSample;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, warn};
use uuid::Uuid;

/// Opaque token identifying a connected consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ConsumerId(Uuid);

impl ConsumerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConsumerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConsumerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

struct ConsumerEntry {
    /// Metric name filters. Empty means "all metrics".
    filters: HashSet<String>,
    tx: mpsc::Sender<MetricSample>,
}

impl ConsumerEntry {
    fn matches(&self, metric: &str) -> bool {
        self.filters.is_empty() || self.filters.contains(metric)
    }
}

/// Registry of connected consumers and their metric filters.
///
/// All mutations and fan-out go through the same lock, so once `disconnect`
/// returns no later `broadcast` can deliver to that consumer. Delivery itself
/// is `try_send` on a bounded channel: a slow consumer drops samples instead
/// of stalling the tick for everyone else.
pub struct SubscriptionRegistry {
    consumers: Arc<RwLock<HashMap<ConsumerId, ConsumerEntry>>>,
    channel_capacity: usize,
}

impl SubscriptionRegistry {
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            consumers: Arc::new(RwLock::new(HashMap::new())),
            channel_capacity: channel_capacity.max(1),
        }
    }

    /// Register a consumer with an empty (all-metrics) filter set and hand
    /// back its delivery channel. Reconnecting an existing id replaces its
    /// channel; the old receiver closes.
    pub async fn connect(&self, id: ConsumerId) -> mpsc::Receiver<MetricSample> {
        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let mut consumers = self.consumers.write().await;
        consumers.insert(
            id,
            ConsumerEntry {
                filters: HashSet::new(),
                tx,
            },
        );
        debug!("Consumer {} connected ({} total)", id, consumers.len());
        rx
    }

    /// Remove a consumer. No-op when the id is unknown.
    pub async fn disconnect(&self, id: ConsumerId) {
        let mut consumers = self.consumers.write().await;
        if consumers.remove(&id).is_some() {
            debug!("Consumer {} disconnected ({} total)", id, consumers.len());
        }
    }

    /// Add a metric name filter for a consumer. A consumer with any filters
    /// only receives samples for those metrics. No-op for unknown consumers.
    pub async fn subscribe(&self, id: ConsumerId, metric: &str) {
        let mut consumers = self.consumers.write().await;
        if let Some(entry) = consumers.get_mut(&id) {
            entry.filters.insert(metric.to_string());
        }
    }

    /// Deliver a sample to every consumer whose filter set is empty or
    /// contains the sample's metric. Returns the number of deliveries.
    /// Consumers whose channel has closed are pruned.
    pub async fn broadcast(&self, sample: &MetricSample) -> usize {
        let mut delivered = 0;
        let mut closed: Vec<ConsumerId> = Vec::new();

        {
            let consumers = self.consumers.read().await;
            for (id, entry) in consumers.iter() {
                if !entry.matches(&sample.name) {
                    continue;
                }
                match entry.tx.try_send(sample.clone()) {
                    Ok(()) => delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        warn!(
                            "{}",
                            BroadcastError::ChannelFull {
                                consumer: id.to_string(),
                                metric: sample.name.clone(),
                            }
                        );
                    }
                    Err(TrySendError::Closed(_)) => {
                        debug!(
                            "{}",
                            BroadcastError::ChannelClosed {
                                consumer: id.to_string(),
                            }
                        );
                        closed.push(*id);
                    }
                }
            }
        }

        if !closed.is_empty() {
            let mut consumers = self.consumers.write().await;
            for id in closed {
                // Re-check under the write lock: the id may have reconnected.
                if consumers.get(&id).is_some_and(|e| e.tx.is_closed()) {
                    consumers.remove(&id);
                }
            }
        }

        delivered
    }

    /// Deliver a sample to a single consumer, honoring its filters. Used to
    /// bootstrap a freshly connected consumer with the latest snapshot.
    pub async fn send_to(&self, id: ConsumerId, sample: &MetricSample) -> bool {
        let consumers = self.consumers.read().await;
        match consumers.get(&id) {
            Some(entry) if entry.matches(&sample.name) => entry.tx.try_send(sample.clone()).is_ok(),
            _ => false,
        }
    }

    pub async fn consumer_count(&self) -> usize {
        self.consumers.read().await.len()
    }
}

impl Clone for SubscriptionRegistry {
    fn clone(&self) -> Self {
        Self {
            consumers: Arc::clone(&self.consumers),
            channel_capacity: self.channel_capacity,
        }
    }
}
