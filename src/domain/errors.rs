use thiserror::Error;

/// Errors surfaced by the history store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("history append failed for {metric}: {reason}")]
    AppendFailed { metric: String, reason: String },

    #[error("history query failed: {reason}")]
    QueryFailed { reason: String },
}

/// Per-consumer delivery failures during fan-out.
#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("consumer {consumer} channel is full, dropping sample for {metric}")]
    ChannelFull { consumer: String, metric: String },

    #[error("consumer {consumer} channel is closed")]
    ChannelClosed { consumer: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_formatting() {
        let err = StoreError::AppendFailed {
            metric: "revenue".to_string(),
            reason: "database is locked".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("revenue"));
        assert!(msg.contains("database is locked"));
    }

    #[test]
    fn test_broadcast_error_formatting() {
        let err = BroadcastError::ChannelFull {
            consumer: "c-1".to_string(),
            metric: "orders".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("c-1"));
        assert!(msg.contains("orders"));
    }
}
