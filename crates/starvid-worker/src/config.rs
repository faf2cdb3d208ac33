//! Worker configuration.

use std::time::Duration;

use tracing::warn;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum concurrent stage executions
    pub max_concurrent_jobs: usize,
    /// Graceful shutdown timeout for in-flight stages
    pub shutdown_timeout: Duration,
    /// How often to scan for messages abandoned by crashed consumers
    pub claim_interval: Duration,
    /// Minimum idle time before a pending message can be claimed.
    /// Running messages are refreshed every `claim_interval`, so this must
    /// stay above it.
    pub claim_min_idle: Duration,
    /// How long one consume call blocks waiting for messages
    pub consume_block: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 2,
            shutdown_timeout: Duration::from_secs(30),
            claim_interval: Duration::from_secs(30),
            claim_min_idle: Duration::from_secs(360),
            consume_block: Duration::from_millis(1000),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let config = Self {
            max_concurrent_jobs: std::env::var("WORKER_MAX_JOBS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_concurrent_jobs),
            shutdown_timeout: Duration::from_secs(
                std::env::var("WORKER_SHUTDOWN_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            claim_interval: Duration::from_secs(
                std::env::var("WORKER_CLAIM_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            claim_min_idle: Duration::from_secs(
                std::env::var("WORKER_CLAIM_MIN_IDLE_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(360),
            ),
            consume_block: defaults.consume_block,
        };
        config.with_claim_floor()
    }

    /// Raise `claim_min_idle` to two claim intervals when configured lower.
    fn with_claim_floor(mut self) -> Self {
        let floor = self.claim_interval * 2;
        if self.claim_min_idle < floor {
            warn!(
                "WORKER_CLAIM_MIN_IDLE_SECS ({:?}) is below twice the claim interval; using {:?}",
                self.claim_min_idle, floor
            );
            self.claim_min_idle = floor;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_zero_concurrency_falls_back() {
        std::env::set_var("WORKER_MAX_JOBS", "0");
        std::env::set_var("WORKER_CLAIM_MIN_IDLE_SECS", "60");
        let config = WorkerConfig::from_env();
        std::env::remove_var("WORKER_MAX_JOBS");
        std::env::remove_var("WORKER_CLAIM_MIN_IDLE_SECS");

        assert_eq!(config.max_concurrent_jobs, 2);
        assert_eq!(config.claim_min_idle, Duration::from_secs(60));
    }

    #[test]
    #[serial]
    fn test_claim_idle_stays_above_heartbeat() {
        std::env::set_var("WORKER_CLAIM_INTERVAL_SECS", "30");
        std::env::set_var("WORKER_CLAIM_MIN_IDLE_SECS", "30");
        let config = WorkerConfig::from_env();
        std::env::remove_var("WORKER_CLAIM_INTERVAL_SECS");
        std::env::remove_var("WORKER_CLAIM_MIN_IDLE_SECS");

        assert_eq!(config.claim_min_idle, Duration::from_secs(60));
    }
}
