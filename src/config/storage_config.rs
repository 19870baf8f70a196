//! Storage configuration parsing from environment variables.

use std::env;

/// Storage environment configuration
#[derive(Debug, Clone)]
pub struct StorageEnvConfig {
    pub database_url: String,
    pub range_limit: usize,
    pub seed_history: bool,
}

impl Default for StorageEnvConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://data/analytics.db".to_string(),
            range_limit: 1000,
            seed_history: true,
        }
    }
}

impl StorageEnvConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://data/analytics.db".to_string()),
            range_limit: env::var("HISTORY_RANGE_LIMIT")
                .unwrap_or_else(|_| "1000".to_string())
                .parse::<usize>()
                .unwrap_or(1000)
                .max(1),
            seed_history: env::var("SEED_HISTORY")
                .unwrap_or_else(|_| "true".to_string())
                .parse::<bool>()
                .unwrap_or(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_defaults() {
        let config = StorageEnvConfig::default();
        assert_eq!(config.database_url, "sqlite://data/analytics.db");
        assert_eq!(config.range_limit, 1000);
        assert!(config.seed_history);
    }
}
