//! Configuration module for Livemetrics.
//!
//! Structured configuration loading from environment variables, organized by
//! domain: Broadcast (tick interval, metric set) and Storage (database URL,
//! query limits, seeding).

mod broadcast_config;
mod storage_config;

pub use broadcast_config::BroadcastEnvConfig;
pub use storage_config::StorageEnvConfig;

use anyhow::Result;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::str::FromStr;
use std::time::Duration;

/// Query timeframe for historical lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    Hour,
    Day,
    Week,
    Month,
}

impl Timeframe {
    /// Start instant of this timeframe relative to `now`.
    pub fn since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Timeframe::Hour => now - ChronoDuration::hours(1),
            Timeframe::Day => now - ChronoDuration::hours(24),
            Timeframe::Week => now - ChronoDuration::days(7),
            Timeframe::Month => now - ChronoDuration::days(30),
        }
    }
}

impl FromStr for Timeframe {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1h" => Ok(Timeframe::Hour),
            "24h" => Ok(Timeframe::Day),
            "7d" => Ok(Timeframe::Week),
            "30d" => Ok(Timeframe::Month),
            _ => anyhow::bail!("Invalid timeframe: {}. Must be '1h', '24h', '7d', or '30d'", s),
        }
    }
}

/// Main application configuration.
///
/// Aggregates the sub-configs into a single struct handed to
/// `Application::build` at startup. There is no runtime reconfiguration.
#[derive(Debug, Clone)]
pub struct Config {
    // Broadcast
    pub tick_interval: Duration,
    pub metrics: Vec<String>,
    pub channel_capacity: usize,

    // Storage
    pub database_url: String,
    pub range_limit: usize,
    pub seed_history: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let broadcast = BroadcastEnvConfig::from_env()?;
        let storage = StorageEnvConfig::from_env();

        Ok(Self {
            tick_interval: Duration::from_secs(broadcast.tick_interval_secs),
            metrics: broadcast.metrics,
            channel_capacity: broadcast.channel_capacity,
            database_url: storage.database_url,
            range_limit: storage.range_limit,
            seed_history: storage.seed_history,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        let broadcast = BroadcastEnvConfig::default();
        let storage = StorageEnvConfig::default();
        Self {
            tick_interval: Duration::from_secs(broadcast.tick_interval_secs),
            metrics: broadcast.metrics,
            channel_capacity: broadcast.channel_capacity,
            database_url: storage.database_url,
            range_limit: storage.range_limit,
            seed_history: storage.seed_history,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.tick_interval, Duration::from_secs(5));
        assert_eq!(config.metrics.len(), 5);
        assert!(config.metrics.contains(&"revenue".to_string()));
        assert_eq!(config.range_limit, 1000);
    }

    #[test]
    fn test_timeframe_parsing() {
        assert_eq!(Timeframe::from_str("1h").unwrap(), Timeframe::Hour);
        assert_eq!(Timeframe::from_str("24H").unwrap(), Timeframe::Day);
        assert_eq!(Timeframe::from_str("7d").unwrap(), Timeframe::Week);
        assert_eq!(Timeframe::from_str("30d").unwrap(), Timeframe::Month);
        assert!(Timeframe::from_str("forever").is_err());
    }

    #[test]
    fn test_timeframe_since() {
        let now = Utc::now();
        assert_eq!(now - Timeframe::Hour.since(now), ChronoDuration::hours(1));
        assert_eq!(now - Timeframe::Month.since(now), ChronoDuration::days(30));
    }
}
