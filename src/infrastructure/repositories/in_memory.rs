use crate::domain::metric::HistoryRecord;
use crate::domain::repositories::HistoryRepository;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Thread-safe in-memory history store.
///
/// Mirrors the SQLite repository's contract without a database file; used for
/// tests and embeddings that do not need durability.
pub struct InMemoryHistoryRepository {
    records: Arc<RwLock<Vec<HistoryRecord>>>,
}

impl InMemoryHistoryRepository {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryHistoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryRepository for InMemoryHistoryRepository {
    async fn append(&self, record: &HistoryRecord) -> Result<()> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn latest(&self, metric: &str) -> Result<Option<HistoryRecord>> {
        let records = self.records.read().await;
        let mut best: Option<&HistoryRecord> = None;
        for record in records.iter().filter(|r| r.metric_name == metric) {
            // Later insertion wins on equal timestamps.
            if best.is_none_or(|b| record.timestamp >= b.timestamp) {
                best = Some(record);
            }
        }
        Ok(best.cloned())
    }

    async fn range(
        &self,
        metric: Option<&str>,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<HistoryRecord>> {
        let records = self.records.read().await;
        let mut matching: Vec<HistoryRecord> = records
            .iter()
            .filter(|r| r.timestamp >= since)
            .filter(|r| metric.is_none_or(|m| r.metric_name == m))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matching.truncate(limit);
        Ok(matching)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.records.read().await.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn record(metric: &str, value: f64, timestamp: DateTime<Utc>) -> HistoryRecord {
        HistoryRecord {
            metric_name: metric.to_string(),
            value,
            timestamp,
            category: "realtime".to_string(),
            source: "live".to_string(),
        }
    }

    #[tokio::test]
    async fn test_latest_tracks_greatest_timestamp() {
        let repo = InMemoryHistoryRepository::new();
        let base = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

        repo.append(&record("revenue", 1.0, base + Duration::seconds(2)))
            .await
            .unwrap();
        repo.append(&record("revenue", 2.0, base)).await.unwrap();

        let latest = repo.latest("revenue").await.unwrap().unwrap();
        assert_eq!(latest.value, 1.0);
        assert!(repo.latest("orders").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_range_matches_sqlite_contract() {
        let repo = InMemoryHistoryRepository::new();
        let base = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

        for i in 0..5 {
            repo.append(&record("revenue", i as f64, base + Duration::seconds(i)))
                .await
                .unwrap();
        }

        let rows = repo
            .range(Some("revenue"), base + Duration::seconds(2), 2)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].value, 4.0);
        assert_eq!(rows[1].value, 3.0);
    }
}
