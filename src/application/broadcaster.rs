use crate::application::registry::SubscriptionRegistry;
use crate::domain::errors::StoreError;
use crate::domain::generator::MetricGenerator;
use crate::domain::metric::{HistoryRecord, MetricSample};
use crate::domain::repositories::HistoryRepository;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Periodic metric generation and fan-out.
///
/// A single timer task drives all generation, so the broadcaster is the only
/// writer of live-tick history. The loop is Idle while no consumers are
/// registered: it still wakes on the timer but performs no generation,
/// delivery, or storage.
pub struct Broadcaster {
    generator: MetricGenerator,
    registry: SubscriptionRegistry,
    history: Arc<dyn HistoryRepository>,
    metrics: Vec<String>,
    last_values: RwLock<HashMap<String, f64>>,
    last_tick: RwLock<Vec<MetricSample>>,
}

impl Broadcaster {
    pub fn new(
        generator: MetricGenerator,
        registry: SubscriptionRegistry,
        history: Arc<dyn HistoryRepository>,
        metrics: Vec<String>,
    ) -> Self {
        Self {
            generator,
            registry,
            history,
            metrics,
            last_values: RwLock::new(HashMap::new()),
            last_tick: RwLock::new(Vec::new()),
        }
    }

    /// Run one tick: generate a sample for each configured metric, fan it out
    /// and append it to history. Returns the total number of deliveries.
    ///
    /// Append failures are logged as a degraded tick and never block fan-out;
    /// nothing here is fatal to the loop.
    pub async fn tick(&self) -> usize {
        if self.registry.consumer_count().await == 0 {
            debug!("No consumers connected; skipping tick");
            return 0;
        }

        let mut snapshot = Vec::with_capacity(self.metrics.len());
        let mut delivered = 0;

        for name in &self.metrics {
            let previous = self.previous_value(name).await;
            let sample = self.generator.next(name, previous);

            delivered += self.registry.broadcast(&sample).await;

            if let Err(e) = self.history.append(&HistoryRecord::live(&sample)).await {
                warn!(
                    "Degraded tick: {}",
                    StoreError::AppendFailed {
                        metric: name.clone(),
                        reason: e.to_string(),
                    }
                );
            }

            self.last_values
                .write()
                .await
                .insert(name.clone(), sample.value);
            snapshot.push(sample);
        }

        *self.last_tick.write().await = snapshot;
        delivered
    }

    /// Most recent value for a metric: in-memory cache, then persisted
    /// history, then the generator's baseline.
    async fn previous_value(&self, name: &str) -> f64 {
        if let Some(value) = self.last_values.read().await.get(name).copied() {
            return value;
        }

        match self.history.latest(name).await {
            Ok(Some(record)) => record.value,
            Ok(None) => self.generator.baseline(name),
            Err(e) => {
                warn!("Failed to read latest value for {}: {}", name, e);
                self.generator.baseline(name)
            }
        }
    }

    /// Samples produced by the most recent non-idle tick.
    pub async fn latest_snapshot(&self) -> Vec<MetricSample> {
        self.last_tick.read().await.clone()
    }

    /// Spawn the periodic loop. The task stops when the shutdown watch flips
    /// to `true` or its sender is dropped.
    pub fn spawn(
        self: Arc<Self>,
        interval: Duration,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!("Broadcaster loop started (tick every {:?})", interval);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.tick().await;
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            info!("Broadcaster loop stopped");
                            break;
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::registry::ConsumerId;
    use crate::domain::generator::{VariationPolicy, VariationTable};
    use crate::infrastructure::repositories::InMemoryHistoryRepository;

    fn fixed_broadcaster(
        delta: f64,
        registry: SubscriptionRegistry,
        history: Arc<dyn HistoryRepository>,
        metrics: Vec<String>,
    ) -> Broadcaster {
        let generator = MetricGenerator::new(VariationTable::new(VariationPolicy::Fixed(delta)));
        Broadcaster::new(generator, registry, history, metrics)
    }

    #[tokio::test]
    async fn test_idle_tick_is_a_no_op() {
        let registry = SubscriptionRegistry::new(8);
        let history = Arc::new(InMemoryHistoryRepository::new());
        let broadcaster = fixed_broadcaster(
            10.0,
            registry,
            history.clone(),
            vec!["revenue".to_string()],
        );

        assert_eq!(broadcaster.tick().await, 0);
        assert_eq!(history.count().await.unwrap(), 0);
        assert!(broadcaster.latest_snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_tick_generates_delivers_and_stores() {
        let registry = SubscriptionRegistry::new(8);
        let history = Arc::new(InMemoryHistoryRepository::new());
        let broadcaster = fixed_broadcaster(
            10.0,
            registry.clone(),
            history.clone(),
            vec!["revenue".to_string(), "orders".to_string()],
        );

        let id = ConsumerId::new();
        let mut rx = registry.connect(id).await;

        let delivered = broadcaster.tick().await;
        assert_eq!(delivered, 2);

        let first = rx.recv().await.unwrap();
        assert_eq!(first.delta, 10.0);

        assert_eq!(history.count().await.unwrap(), 2);
        let latest = history.latest("revenue").await.unwrap().unwrap();
        assert_eq!(latest.category, "realtime");
        assert_eq!(latest.source, "live");
    }

    #[tokio::test]
    async fn test_previous_value_comes_from_history() {
        let registry = SubscriptionRegistry::new(8);
        let history = Arc::new(InMemoryHistoryRepository::new());
        history
            .append(&HistoryRecord {
                metric_name: "revenue".to_string(),
                value: 100.0,
                timestamp: chrono::Utc::now(),
                category: "realtime".to_string(),
                source: "live".to_string(),
            })
            .await
            .unwrap();

        let broadcaster = fixed_broadcaster(
            10.0,
            registry.clone(),
            history,
            vec!["revenue".to_string()],
        );
        let mut rx = registry.connect(ConsumerId::new()).await;

        broadcaster.tick().await;
        let sample = rx.recv().await.unwrap();
        assert_eq!(sample.value, 110.0);
        assert_eq!(sample.delta_percent, 10.0);
    }

    #[tokio::test]
    async fn test_consecutive_ticks_chain_values() {
        let registry = SubscriptionRegistry::new(8);
        let history = Arc::new(InMemoryHistoryRepository::new());
        history
            .append(&HistoryRecord {
                metric_name: "revenue".to_string(),
                value: 50.0,
                timestamp: chrono::Utc::now(),
                category: "realtime".to_string(),
                source: "live".to_string(),
            })
            .await
            .unwrap();

        let broadcaster = fixed_broadcaster(
            5.0,
            registry.clone(),
            history,
            vec!["revenue".to_string()],
        );
        let mut rx = registry.connect(ConsumerId::new()).await;

        broadcaster.tick().await;
        broadcaster.tick().await;

        assert_eq!(rx.recv().await.unwrap().value, 55.0);
        assert_eq!(rx.recv().await.unwrap().value, 60.0);
    }

    #[tokio::test]
    async fn test_spawned_loop_stops_on_shutdown() {
        let registry = SubscriptionRegistry::new(8);
        let history = Arc::new(InMemoryHistoryRepository::new());
        let broadcaster = Arc::new(fixed_broadcaster(
            1.0,
            registry,
            history,
            vec!["revenue".to_string()],
        ));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = broadcaster.spawn(Duration::from_millis(10), shutdown_rx);

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("loop did not stop")
            .unwrap();
    }
}
