use anyhow::Result;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::application::broadcaster::Broadcaster;
use crate::application::registry::{ConsumerId, SubscriptionRegistry};
use crate::config::{Config, Timeframe};
use crate::domain::generator::{MetricGenerator, VariationTable};
use crate::domain::metric::{HistoryRecord, MetricFormats, MetricSample};
use crate::domain::repositories::HistoryRepository;
use crate::infrastructure::persistence::{Database, SqliteHistoryRepository};
use crate::infrastructure::seed;

/// Live view of the running system, handed out by `Application::start`.
///
/// The request-handling layer talks to the registry and the history store
/// exclusively through this handle; the broadcaster task is owned here and
/// stopped on `shutdown`.
pub struct SystemHandle {
    registry: SubscriptionRegistry,
    broadcaster: Arc<Broadcaster>,
    history: Arc<dyn HistoryRepository>,
    formats: MetricFormats,
    range_limit: usize,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Point-in-time health report.
#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthSnapshot {
    pub consumers: usize,
    pub history_rows: u64,
    pub broadcaster_running: bool,
}

impl SystemHandle {
    /// Register a new consumer and return its id plus delivery channel.
    /// The consumer is bootstrapped with the latest tick's samples so it does
    /// not wait a full interval for its first data.
    pub async fn connect(&self) -> (ConsumerId, mpsc::Receiver<MetricSample>) {
        let id = ConsumerId::new();
        let rx = self.registry.connect(id).await;
        for sample in self.broadcaster.latest_snapshot().await {
            self.registry.send_to(id, &sample).await;
        }
        (id, rx)
    }

    pub async fn disconnect(&self, id: ConsumerId) {
        self.registry.disconnect(id).await;
    }

    pub async fn subscribe(&self, id: ConsumerId, metric: &str) {
        self.registry.subscribe(id, metric).await;
    }

    /// Historical records for a timeframe, newest first, capped at the
    /// configured range limit.
    pub async fn history(
        &self,
        metric: Option<&str>,
        timeframe: Timeframe,
    ) -> Result<Vec<HistoryRecord>> {
        let since = timeframe.since(chrono::Utc::now());
        self.history.range(metric, since, self.range_limit).await
    }

    /// Latest record for a metric with its display-formatted value.
    pub async fn latest(&self, metric: &str) -> Result<Option<(HistoryRecord, String)>> {
        let record = self.history.latest(metric).await?;
        Ok(record.map(|r| {
            let formatted = self.formats.format(&r.metric_name, r.value);
            (r, formatted)
        }))
    }

    pub async fn health(&self) -> HealthSnapshot {
        let history_rows = match self.history.count().await {
            Ok(n) => n,
            Err(e) => {
                warn!("Health check failed to count history rows: {}", e);
                0
            }
        };
        HealthSnapshot {
            consumers: self.registry.consumer_count().await,
            history_rows,
            broadcaster_running: !self.task.is_finished(),
        }
    }

    /// Stop the broadcaster task and wait for it to exit.
    pub async fn shutdown(self) {
        info!("Initiating shutdown sequence...");
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            warn!("Broadcaster task ended abnormally: {}", e);
        }
        info!("Shutdown complete.");
    }
}

/// Wires configuration, persistence, and the broadcaster together.
pub struct Application {
    config: Config,
    registry: SubscriptionRegistry,
    history: Arc<dyn HistoryRepository>,
    generator: MetricGenerator,
    formats: MetricFormats,
}

impl Application {
    /// Build against the configured SQLite database, seeding historical data
    /// on first start when enabled.
    pub async fn build(config: Config) -> Result<Self> {
        info!("Building Livemetrics application...");

        let database = Database::new(&config.database_url).await?;
        let history: Arc<dyn HistoryRepository> =
            Arc::new(SqliteHistoryRepository::new(database.pool.clone()));

        if config.seed_history {
            seed::seed_history(history.as_ref()).await?;
        }

        Ok(Self::assemble(config, history))
    }

    /// Build against a caller-supplied repository. Used by tests and any
    /// embedding that brings its own storage.
    pub fn with_repository(config: Config, history: Arc<dyn HistoryRepository>) -> Self {
        Self::assemble(config, history)
    }

    fn assemble(config: Config, history: Arc<dyn HistoryRepository>) -> Self {
        let registry = SubscriptionRegistry::new(config.channel_capacity);
        let generator = MetricGenerator::new(VariationTable::defaults());
        let formats = MetricFormats::defaults();
        Self {
            config,
            registry,
            history,
            generator,
            formats,
        }
    }

    /// Replace the default variation table, for deterministic configurations.
    pub fn with_generator(mut self, generator: MetricGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Spawn the broadcaster loop and hand back the system handle.
    pub fn start(self) -> SystemHandle {
        info!(
            "Starting broadcaster for metrics: {}",
            self.config.metrics.join(", ")
        );

        let broadcaster = Arc::new(Broadcaster::new(
            self.generator,
            self.registry.clone(),
            self.history.clone(),
            self.config.metrics.clone(),
        ));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = broadcaster
            .clone()
            .spawn(self.config.tick_interval, shutdown_rx);

        SystemHandle {
            registry: self.registry,
            broadcaster,
            history: self.history,
            formats: self.formats,
            range_limit: self.config.range_limit,
            shutdown_tx,
            task,
        }
    }
}
