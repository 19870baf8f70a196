use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single generated value for a named metric.
///
/// Immutable once created. On the wire the delta fields are exposed as
/// `change` / `change_percent` and the timestamp as an ISO-8601 string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub name: String,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "change")]
    pub delta: f64,
    #[serde(rename = "change_percent")]
    pub delta_percent: f64,
}

/// One row of persisted metric history. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub metric_name: String,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    pub category: String,
    pub source: String,
}

impl HistoryRecord {
    /// Build the history row for a live broadcast sample.
    pub fn live(sample: &MetricSample) -> Self {
        Self {
            metric_name: sample.name.clone(),
            value: sample.value,
            timestamp: sample.timestamp,
            category: "realtime".to_string(),
            source: "live".to_string(),
        }
    }
}

/// Display formatting class for a metric, resolved once at configuration
/// load instead of dispatching on the metric name per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricKind {
    Currency,
    Count,
    Percent,
    Seconds,
    Duration,
    Raw,
}

impl MetricKind {
    pub fn format(&self, value: f64) -> String {
        match self {
            MetricKind::Currency => format!("${value:.2}"),
            MetricKind::Count => format!("{}", value.round() as i64),
            MetricKind::Percent => format!("{value:.1}%"),
            MetricKind::Seconds => format!("{value:.2}s"),
            MetricKind::Duration => {
                let total = value.max(0.0).round() as i64;
                format!("{}m {}s", total / 60, total % 60)
            }
            MetricKind::Raw => format!("{value}"),
        }
    }
}

/// Lookup table mapping metric names to their display kind.
#[derive(Debug, Clone)]
pub struct MetricFormats {
    kinds: HashMap<String, MetricKind>,
}

impl MetricFormats {
    /// Default table covering the shipped metric catalog.
    pub fn defaults() -> Self {
        let mut kinds = HashMap::new();
        for name in ["revenue", "average_order_value", "cost_per_acquisition"] {
            kinds.insert(name.to_string(), MetricKind::Currency);
        }
        for name in [
            "orders",
            "active_users",
            "new_signups",
            "page_views",
            "refunds",
            "us_visitors",
            "eu_visitors",
            "asia_visitors",
            "other_visitors",
        ] {
            kinds.insert(name.to_string(), MetricKind::Count);
        }
        for name in [
            "conversion_rate",
            "bounce_rate",
            "user_retention",
            "churn_rate",
            "click_through_rate",
            "error_rate",
            "roi",
        ] {
            kinds.insert(name.to_string(), MetricKind::Percent);
        }
        kinds.insert("page_load_time".to_string(), MetricKind::Seconds);
        kinds.insert("session_duration".to_string(), MetricKind::Duration);
        Self { kinds }
    }

    pub fn kind(&self, name: &str) -> MetricKind {
        self.kinds.get(name).copied().unwrap_or(MetricKind::Raw)
    }

    pub fn format(&self, name: &str, value: f64) -> String {
        self.kind(name).format(value)
    }
}

impl Default for MetricFormats {
    fn default() -> Self {
        Self::defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_formatting() {
        assert_eq!(MetricKind::Currency.format(1234.5), "$1234.50");
        assert_eq!(MetricKind::Count.format(42.4), "42");
        assert_eq!(MetricKind::Percent.format(8.25), "8.2%");
        assert_eq!(MetricKind::Seconds.format(1.234), "1.23s");
        assert_eq!(MetricKind::Duration.format(195.0), "3m 15s");
    }

    #[test]
    fn test_format_table_lookup() {
        let formats = MetricFormats::defaults();
        assert_eq!(formats.kind("revenue"), MetricKind::Currency);
        assert_eq!(formats.kind("active_users"), MetricKind::Count);
        assert_eq!(formats.kind("conversion_rate"), MetricKind::Percent);
        assert_eq!(formats.kind("something_unknown"), MetricKind::Raw);
        assert_eq!(formats.format("revenue", 99.0), "$99.00");
    }

    #[test]
    fn test_sample_wire_format() {
        let sample = MetricSample {
            name: "revenue".to_string(),
            value: 110.0,
            timestamp: chrono::Utc::now(),
            delta: 10.0,
            delta_percent: 10.0,
        };

        let json = serde_json::to_value(&sample).unwrap();
        assert_eq!(json["value"], 110.0);
        assert_eq!(json["change"], 10.0);
        assert_eq!(json["change_percent"], 10.0);
        assert!(json["timestamp"].is_string());
    }
}
