//! Repository abstractions for metric history.
//!
//! The broadcaster and the query surface talk to history through this trait,
//! keeping storage concerns (SQLite, in-memory) out of the domain. The
//! `SqliteHistoryRepository` implementation lives in `infrastructure`, with an
//! in-memory twin for tests and wiring without a database file.

use crate::domain::metric::HistoryRecord;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Append-only store of (metric, value, timestamp) history.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Durably append one record. Fail-fast: a storage error is returned to
    /// the caller rather than retried here.
    async fn append(&self, record: &HistoryRecord) -> Result<()>;

    /// The record with the greatest timestamp for a metric, if any.
    async fn latest(&self, metric: &str) -> Result<Option<HistoryRecord>>;

    /// Records with `timestamp >= since`, newest first, capped at `limit`.
    /// `metric = None` matches every metric.
    async fn range(
        &self,
        metric: Option<&str>,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<HistoryRecord>>;

    /// Total number of stored records.
    async fn count(&self) -> Result<u64>;
}
