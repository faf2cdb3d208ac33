//! Redis-backed state store.
//!
//! Documents live at `{prefix}:{namespace}:{id}` as JSON strings. Each
//! namespace keeps a companion set `{prefix}:{namespace}:__ids` so ids can be
//! listed without `KEYS`/`SCAN`.

use async_trait::async_trait;
use redis::AsyncCommands;
use serde_json::Value;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::metrics::{record_error, record_operation};
use crate::store::StateStore;

const BACKEND: &str = "redis";

/// State store backed by Redis.
pub struct RedisStore {
    client: redis::Client,
    prefix: String,
}

impl RedisStore {
    /// Create a new store. The connection is opened lazily per operation.
    pub fn new(redis_url: &str, prefix: impl Into<String>) -> StoreResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self {
            client,
            prefix: prefix.into(),
        })
    }

    fn document_key(&self, namespace: &str, id: &str) -> String {
        format!("{}:{}:{}", self.prefix, namespace, id)
    }

    fn index_key(&self, namespace: &str) -> String {
        format!("{}:{}:__ids", self.prefix, namespace)
    }

    async fn connection(&self) -> StoreResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::connection_failed(e.to_string()))
    }

    async fn track<T>(
        &self,
        operation: &'static str,
        namespace: &str,
        result: StoreResult<T>,
    ) -> StoreResult<T> {
        record_operation(BACKEND, operation, namespace);
        if result.is_err() {
            record_error(BACKEND, operation);
        }
        result
    }
}

#[async_trait]
impl StateStore for RedisStore {
    async fn get(&self, namespace: &str, id: &str) -> StoreResult<Option<Value>> {
        let result: StoreResult<_> = async {
            let mut conn = self.connection().await?;
            let raw: Option<String> = conn.get(self.document_key(namespace, id)).await?;
            match raw {
                Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
                None => Ok(None),
            }
        }
        .await;
        self.track("get", namespace, result).await
    }

    async fn set(&self, namespace: &str, id: &str, value: Value) -> StoreResult<()> {
        let result: StoreResult<_> = async {
            let mut conn = self.connection().await?;
            let payload = serde_json::to_string(&value)?;
            redis::pipe()
                .atomic()
                .set(self.document_key(namespace, id), payload)
                .ignore()
                .sadd(self.index_key(namespace), id)
                .ignore()
                .query_async::<()>(&mut conn)
                .await?;
            debug!(namespace, id, "Stored document");
            Ok(())
        }
        .await;
        self.track("set", namespace, result).await
    }

    async fn delete(&self, namespace: &str, id: &str) -> StoreResult<()> {
        let result: StoreResult<_> = async {
            let mut conn = self.connection().await?;
            redis::pipe()
                .atomic()
                .del(self.document_key(namespace, id))
                .ignore()
                .srem(self.index_key(namespace), id)
                .ignore()
                .query_async::<()>(&mut conn)
                .await?;
            Ok(())
        }
        .await;
        self.track("delete", namespace, result).await
    }

    async fn keys(&self, namespace: &str) -> StoreResult<Vec<String>> {
        let result: StoreResult<_> = async {
            let mut conn = self.connection().await?;
            let mut ids: Vec<String> = conn.smembers(self.index_key(namespace)).await?;
            ids.sort();
            Ok(ids)
        }
        .await;
        self.track("keys", namespace, result).await
    }

    fn backend_name(&self) -> &'static str {
        BACKEND
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let store = RedisStore::new("redis://localhost:6379", "starvid:state").unwrap();
        assert_eq!(store.document_key("job", "o-r-1"), "starvid:state:job:o-r-1");
        assert_eq!(store.index_key("stars"), "starvid:state:stars:__ids");
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(RedisStore::new("not a url", "p").is_err());
    }
}
