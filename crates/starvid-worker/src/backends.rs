//! State store and queue backend selection.

use std::sync::Arc;

use starvid_queue::{JobQueue, MemoryJobQueue, QueueConfig, RedisJobQueue};
use starvid_store::{MemoryStore, RedisStore, StateStore};
use tracing::info;

use crate::error::{WorkerError, WorkerResult};

/// Which backend holds job state and stage messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateBackend {
    /// Process-local; the API must run the worker embedded.
    Memory,
    /// Redis keys for state, Redis Streams for the queue.
    Redis,
}

impl std::str::FromStr for StateBackend {
    type Err = WorkerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(StateBackend::Memory),
            "redis" => Ok(StateBackend::Redis),
            other => Err(WorkerError::config_error(format!(
                "Unknown STATE_BACKEND '{}', expected 'memory' or 'redis'",
                other
            ))),
        }
    }
}

/// Backend configuration.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub backend: StateBackend,
    /// Key prefix for state documents in Redis
    pub state_key_prefix: String,
    pub queue: QueueConfig,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            backend: StateBackend::Memory,
            state_key_prefix: "starvid:state".to_string(),
            queue: QueueConfig::default(),
        }
    }
}

impl BackendConfig {
    /// Create config from environment variables.
    pub fn from_env() -> WorkerResult<Self> {
        let backend = match std::env::var("STATE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => StateBackend::Memory,
        };
        Ok(Self {
            backend,
            state_key_prefix: std::env::var("STATE_KEY_PREFIX")
                .unwrap_or_else(|_| "starvid:state".to_string()),
            queue: QueueConfig::from_env(),
        })
    }

    /// Build the store and queue and initialise the queue.
    pub async fn connect(&self) -> WorkerResult<Backends> {
        let backends = match self.backend {
            StateBackend::Memory => Backends {
                store: Arc::new(MemoryStore::new()),
                queue: Arc::new(MemoryJobQueue::new(self.queue.dedup_ttl)),
            },
            StateBackend::Redis => Backends {
                store: Arc::new(RedisStore::new(
                    &self.queue.redis_url,
                    self.state_key_prefix.clone(),
                )?),
                queue: Arc::new(RedisJobQueue::new(self.queue.clone())?),
            },
        };
        backends.queue.init().await?;

        info!(
            store = backends.store.backend_name(),
            queue = backends.queue.backend_name(),
            "Connected state backends"
        );
        Ok(backends)
    }
}

/// Shared handles to the state store and the stage queue.
#[derive(Clone)]
pub struct Backends {
    pub store: Arc<dyn StateStore>,
    pub queue: Arc<dyn JobQueue>,
}

impl Backends {
    /// In-process backends.
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            queue: Arc::new(MemoryJobQueue::default()),
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.store.backend_name() == "memory"
    }
}
