use crate::domain::metric::HistoryRecord;
use crate::domain::repositories::HistoryRepository;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

pub struct SqliteHistoryRepository {
    pool: SqlitePool,
}

impl SqliteHistoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_record(row: &SqliteRow) -> Result<HistoryRecord> {
        Ok(HistoryRecord {
            metric_name: row.try_get("metric_name")?,
            value: row.try_get("value")?,
            timestamp: Utc.timestamp_opt(row.try_get("timestamp")?, 0).unwrap(),
            category: row.try_get("category")?,
            source: row.try_get("source")?,
        })
    }
}

#[async_trait]
impl HistoryRepository for SqliteHistoryRepository {
    async fn append(&self, record: &HistoryRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO analytics_history (metric_name, value, timestamp, category, source)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.metric_name)
        .bind(record.value)
        .bind(record.timestamp.timestamp())
        .bind(&record.category)
        .bind(&record.source)
        .execute(&self.pool)
        .await
        .context("Failed to append history record")?;

        Ok(())
    }

    async fn latest(&self, metric: &str) -> Result<Option<HistoryRecord>> {
        let row = sqlx::query(
            r#"
            SELECT metric_name, value, timestamp, category, source
            FROM analytics_history
            WHERE metric_name = ?
            ORDER BY timestamp DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(metric)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn range(
        &self,
        metric: Option<&str>,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<HistoryRecord>> {
        let rows = match metric {
            Some(name) => {
                sqlx::query(
                    r#"
                    SELECT metric_name, value, timestamp, category, source
                    FROM analytics_history
                    WHERE timestamp >= ? AND metric_name = ?
                    ORDER BY timestamp DESC, id DESC
                    LIMIT ?
                    "#,
                )
                .bind(since.timestamp())
                .bind(name)
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT metric_name, value, timestamp, category, source
                    FROM analytics_history
                    WHERE timestamp >= ?
                    ORDER BY timestamp DESC, id DESC
                    LIMIT ?
                    "#,
                )
                .bind(since.timestamp())
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter().map(Self::row_to_record).collect()
    }

    async fn count(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM analytics_history")
            .fetch_one(&self.pool)
            .await?;
        let n: i64 = row.try_get("n")?;
        Ok(n as u64)
    }
}
