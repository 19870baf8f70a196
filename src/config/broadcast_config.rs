//! Broadcast loop configuration parsing from environment variables.

use anyhow::Result;
use std::env;

const DEFAULT_METRICS: &str = "revenue,active_users,orders,conversion_rate,page_views";

/// Broadcast environment configuration
#[derive(Debug, Clone)]
pub struct BroadcastEnvConfig {
    pub tick_interval_secs: u64,
    pub metrics: Vec<String>,
    pub channel_capacity: usize,
}

impl Default for BroadcastEnvConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 5,
            metrics: parse_metric_list(DEFAULT_METRICS),
            channel_capacity: 64,
        }
    }
}

impl BroadcastEnvConfig {
    pub fn from_env() -> Result<Self> {
        let tick_interval_secs = env::var("TICK_INTERVAL_SECS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u64>()
            .unwrap_or(5);
        if tick_interval_secs == 0 {
            anyhow::bail!("TICK_INTERVAL_SECS must be at least 1");
        }

        let metrics = parse_metric_list(
            &env::var("BROADCAST_METRICS").unwrap_or_else(|_| DEFAULT_METRICS.to_string()),
        );
        if metrics.is_empty() {
            anyhow::bail!("BROADCAST_METRICS must name at least one metric");
        }

        let channel_capacity = env::var("CONSUMER_CHANNEL_CAPACITY")
            .unwrap_or_else(|_| "64".to_string())
            .parse::<usize>()
            .unwrap_or(64)
            .max(1);

        Ok(Self {
            tick_interval_secs,
            metrics,
            channel_capacity,
        })
    }
}

fn parse_metric_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_config_defaults() {
        let config = BroadcastEnvConfig::default();
        assert_eq!(config.tick_interval_secs, 5);
        assert_eq!(
            config.metrics,
            vec![
                "revenue",
                "active_users",
                "orders",
                "conversion_rate",
                "page_views"
            ]
        );
        assert_eq!(config.channel_capacity, 64);
    }

    #[test]
    fn test_metric_list_parsing() {
        assert_eq!(
            parse_metric_list("revenue, orders ,,page_views"),
            vec!["revenue", "orders", "page_views"]
        );
        assert!(parse_metric_list("  ,").is_empty());
    }
}
