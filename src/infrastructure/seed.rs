//! Historical sample-data seeding for first start.

use crate::domain::metric::HistoryRecord;
use crate::domain::repositories::HistoryRepository;
use anyhow::Result;
use chrono::{Duration, Utc};
use rand::Rng;
use tracing::info;

const SEED_DAYS: i64 = 7;

/// Metric catalog grouped by category.
const CATALOG: &[(&str, &[&str])] = &[
    ("sales", &["revenue", "orders", "average_order_value", "refunds"]),
    (
        "users",
        &["active_users", "new_signups", "user_retention", "churn_rate"],
    ),
    (
        "performance",
        &[
            "page_load_time",
            "bounce_rate",
            "session_duration",
            "error_rate",
        ],
    ),
    (
        "marketing",
        &[
            "conversion_rate",
            "click_through_rate",
            "cost_per_acquisition",
            "roi",
        ],
    ),
    (
        "geography",
        &["us_visitors", "eu_visitors", "asia_visitors", "other_visitors"],
    ),
];

/// Populate an empty store with hourly records for the past week.
/// No-op when the store already holds data.
pub async fn seed_history(repository: &dyn HistoryRepository) -> Result<()> {
    if repository.count().await? > 0 {
        return Ok(());
    }

    let base_time = Utc::now() - Duration::days(SEED_DAYS);
    let mut inserted = 0u64;

    for day in 0..SEED_DAYS {
        for hour in 0..24 {
            let timestamp = base_time + Duration::days(day) + Duration::hours(hour);
            for (category, metrics) in CATALOG {
                for metric in metrics.iter() {
                    let record = HistoryRecord {
                        metric_name: metric.to_string(),
                        value: seed_value(metric, day, hour),
                        timestamp,
                        category: category.to_string(),
                        source: "historical".to_string(),
                    };
                    repository.append(&record).await?;
                    inserted += 1;
                }
            }
        }
    }

    info!("Seeded {} historical records", inserted);
    Ok(())
}

/// Time-shaped pseudo-realistic value for a seeded metric.
fn seed_value(metric: &str, day: i64, hour: i64) -> f64 {
    let mut rng = rand::rng();
    let day = day as f64;
    let hour = hour as f64;

    let value = match metric {
        "revenue" => 1000.0 + day * 100.0 + hour * 50.0 + rng.random_range(-200.0..=300.0),
        "orders" => 15.0 + day * 2.0 + rng.random_range(-3..=8) as f64,
        "average_order_value" => 65.0 + rng.random_range(-10.0..=20.0),
        "refunds" => rng.random_range(0..=5) as f64,
        "active_users" => 200.0 + day * 10.0 + hour * 5.0 + rng.random_range(-20..=40) as f64,
        "new_signups" => 5.0 + rng.random_range(0..=15) as f64,
        "user_retention" => 75.0 + rng.random_range(-5.0..=10.0),
        "churn_rate" => 5.0 + rng.random_range(-2.0..=3.0),
        "page_load_time" => 1.2 + rng.random_range(-0.3..=0.8),
        "bounce_rate" => 45.0 + rng.random_range(-10.0..=15.0),
        "session_duration" => 180.0 + rng.random_range(-60..=120) as f64,
        "error_rate" => rng.random_range(0.0..=2.0),
        "conversion_rate" => 8.0 + rng.random_range(-2.0..=4.0),
        "click_through_rate" => 3.5 + rng.random_range(-1.0..=2.0),
        "cost_per_acquisition" => 25.0 + rng.random_range(-5.0..=15.0),
        "roi" => 150.0 + rng.random_range(-30.0..=50.0),
        "us_visitors" => 40.0 + rng.random_range(-5..=15) as f64,
        "eu_visitors" => 30.0 + rng.random_range(-5..=10) as f64,
        "asia_visitors" => 20.0 + rng.random_range(-3..=8) as f64,
        "other_visitors" => 10.0 + rng.random_range(-2..=5) as f64,
        _ => rng.random_range(1.0..=100.0),
    };

    value.max(0.0)
}
