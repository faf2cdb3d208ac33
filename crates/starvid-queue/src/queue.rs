//! Job queue trait and the Redis Streams backend.

use std::time::Duration;

use async_trait::async_trait;
use redis::streams::{StreamClaimReply, StreamId, StreamPendingCountReply, StreamReadReply};
use redis::AsyncCommands;
use tracing::{debug, info, warn};

use crate::error::{QueueError, QueueResult};
use crate::job::QueueJob;

/// At-least-once queue of stage messages.
///
/// A consumed message stays pending until acknowledged; messages left pending
/// by a crashed consumer are handed out again by [`JobQueue::claim_pending`].
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Prepare backing structures. Safe to call repeatedly.
    async fn init(&self) -> QueueResult<()>;

    /// Enqueue a message. Fails with [`QueueError::Duplicate`] when the same
    /// idempotency key was enqueued recently.
    async fn enqueue(&self, job: QueueJob) -> QueueResult<String>;

    /// Receive up to `count` new messages, waiting at most `block_ms`.
    async fn consume(
        &self,
        consumer_name: &str,
        block_ms: u64,
        count: usize,
    ) -> QueueResult<Vec<(String, QueueJob)>>;

    /// Take over messages that have been pending longer than `min_idle_ms`.
    async fn claim_pending(
        &self,
        consumer_name: &str,
        min_idle_ms: u64,
        count: usize,
    ) -> QueueResult<Vec<(String, QueueJob)>>;

    /// Reset the idle time of messages this consumer is still running so
    /// [`JobQueue::claim_pending`] does not hand them out again.
    async fn touch(&self, consumer_name: &str, message_ids: &[String]) -> QueueResult<()>;

    /// Acknowledge and drop a message.
    async fn ack(&self, message_id: &str) -> QueueResult<()>;

    /// Number of messages not yet acknowledged.
    async fn len(&self) -> QueueResult<u64>;

    fn backend_name(&self) -> &'static str;
}

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Redis URL
    pub redis_url: String,
    /// Stream name for stage messages
    pub stream_name: String,
    /// Consumer group name
    pub consumer_group: String,
    /// How long an idempotency key blocks re-enqueueing
    pub dedup_ttl: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            stream_name: "starvid:jobs".to_string(),
            consumer_group: "starvid:workers".to_string(),
            dedup_ttl: Duration::from_secs(3600),
        }
    }
}

impl QueueConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: std::env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            stream_name: std::env::var("QUEUE_STREAM").unwrap_or(defaults.stream_name),
            consumer_group: std::env::var("QUEUE_CONSUMER_GROUP")
                .unwrap_or(defaults.consumer_group),
            dedup_ttl: std::env::var("QUEUE_DEDUP_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.dedup_ttl),
        }
    }
}

/// Claims the idempotency key and appends the stream entry in one atomic
/// step, so a key is never held without its message.
///
/// KEYS: dedup key, stream. ARGV: ttl secs, payload, idempotency key.
const ENQUEUE_SCRIPT: &str = r#"
if not redis.call('SET', KEYS[1], '1', 'NX', 'EX', ARGV[1]) then
    return false
end
return redis.call('XADD', KEYS[2], '*', 'job', ARGV[2], 'key', ARGV[3])
"#;

/// Redis Streams queue using a single consumer group.
pub struct RedisJobQueue {
    client: redis::Client,
    config: QueueConfig,
}

impl RedisJobQueue {
    pub fn new(config: QueueConfig) -> QueueResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> QueueResult<Self> {
        Self::new(QueueConfig::from_env())
    }

    async fn connection(&self) -> QueueResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| QueueError::connection_failed(e.to_string()))
    }

    fn dedup_key(&self, idempotency_key: &str) -> String {
        format!("{}:dedup:{}", self.config.stream_name, idempotency_key)
    }

    /// Decode stream entries; malformed ones are acknowledged and dropped.
    async fn decode_entries(&self, entries: Vec<StreamId>) -> Vec<(String, QueueJob)> {
        let mut jobs = Vec::with_capacity(entries.len());
        for entry in entries {
            match decode_entry(&entry) {
                Some(job) => jobs.push((entry.id, job)),
                None => {
                    warn!(message_id = %entry.id, "Dropping malformed queue message");
                    self.ack(&entry.id).await.ok();
                }
            }
        }
        jobs
    }
}

fn decode_entry(entry: &StreamId) -> Option<QueueJob> {
    match entry.map.get("job") {
        Some(redis::Value::BulkString(payload)) => serde_json::from_slice(payload)
            .map_err(|e| warn!("Failed to parse job payload: {}", e))
            .ok(),
        _ => None,
    }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn init(&self) -> QueueResult<()> {
        let mut conn = self.connection().await?;

        let result: Result<(), redis::RedisError> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg("0")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;

        match result {
            Ok(_) => info!("Created consumer group: {}", self.config.consumer_group),
            Err(e) if e.to_string().contains("BUSYGROUP") => {
                debug!("Consumer group already exists: {}", self.config.consumer_group);
            }
            Err(e) => return Err(QueueError::Redis(e)),
        }

        Ok(())
    }

    async fn enqueue(&self, job: QueueJob) -> QueueResult<String> {
        let mut conn = self.connection().await?;

        let payload = serde_json::to_string(&job)?;
        let idempotency_key = job.idempotency_key();

        let message_id: Option<String> = redis::Script::new(ENQUEUE_SCRIPT)
            .key(self.dedup_key(&idempotency_key))
            .key(&self.config.stream_name)
            .arg(self.config.dedup_ttl.as_secs().max(1))
            .arg(&payload)
            .arg(&idempotency_key)
            .invoke_async(&mut conn)
            .await?;
        let Some(message_id) = message_id else {
            warn!("Duplicate job rejected: {}", idempotency_key);
            return Err(QueueError::Duplicate(idempotency_key));
        };

        info!(
            job_id = %job.job_id(),
            stage = job.stage(),
            "Enqueued job with message ID {}",
            message_id
        );

        Ok(message_id)
    }

    async fn consume(
        &self,
        consumer_name: &str,
        block_ms: u64,
        count: usize,
    ) -> QueueResult<Vec<(String, QueueJob)>> {
        let mut conn = self.connection().await?;

        let reply: StreamReadReply = redis::cmd("XREADGROUP")
            .arg("GROUP")
            .arg(&self.config.consumer_group)
            .arg(consumer_name)
            .arg("COUNT")
            .arg(count)
            .arg("BLOCK")
            .arg(block_ms)
            .arg("STREAMS")
            .arg(&self.config.stream_name)
            .arg(">")
            .query_async(&mut conn)
            .await?;

        let entries = reply.keys.into_iter().flat_map(|k| k.ids).collect();
        Ok(self.decode_entries(entries).await)
    }

    async fn claim_pending(
        &self,
        consumer_name: &str,
        min_idle_ms: u64,
        count: usize,
    ) -> QueueResult<Vec<(String, QueueJob)>> {
        let mut conn = self.connection().await?;

        let pending: StreamPendingCountReply = redis::cmd("XPENDING")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg("IDLE")
            .arg(min_idle_ms)
            .arg("-")
            .arg("+")
            .arg(count)
            .query_async(&mut conn)
            .await?;

        if pending.ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut cmd = redis::cmd("XCLAIM");
        cmd.arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg(consumer_name)
            .arg(min_idle_ms);
        for entry in &pending.ids {
            cmd.arg(&entry.id);
        }
        let claimed: StreamClaimReply = cmd.query_async(&mut conn).await?;

        let jobs = self.decode_entries(claimed.ids).await;
        for (message_id, job) in &jobs {
            info!(job_id = %job.job_id(), stage = job.stage(), "Claimed pending message {}", message_id);
        }
        Ok(jobs)
    }

    async fn touch(&self, consumer_name: &str, message_ids: &[String]) -> QueueResult<()> {
        if message_ids.is_empty() {
            return Ok(());
        }
        let mut conn = self.connection().await?;

        // XCLAIM with min-idle 0 resets the idle clock; JUSTID skips the payload.
        let mut cmd = redis::cmd("XCLAIM");
        cmd.arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg(consumer_name)
            .arg(0);
        for id in message_ids {
            cmd.arg(id);
        }
        cmd.arg("JUSTID").query_async::<()>(&mut conn).await?;

        debug!("Refreshed {} in-flight messages", message_ids.len());
        Ok(())
    }

    async fn ack(&self, message_id: &str) -> QueueResult<()> {
        let mut conn = self.connection().await?;

        redis::cmd("XACK")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg(message_id)
            .query_async::<()>(&mut conn)
            .await?;

        redis::cmd("XDEL")
            .arg(&self.config.stream_name)
            .arg(message_id)
            .query_async::<()>(&mut conn)
            .await?;

        debug!("Acknowledged message: {}", message_id);
        Ok(())
    }

    async fn len(&self) -> QueueResult<u64> {
        let mut conn = self.connection().await?;
        let len: u64 = conn.xlen(&self.config.stream_name).await?;
        Ok(len)
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_config_from_env() {
        std::env::set_var("QUEUE_STREAM", "test:jobs");
        std::env::set_var("QUEUE_DEDUP_TTL_SECS", "60");
        let config = QueueConfig::from_env();
        std::env::remove_var("QUEUE_STREAM");
        std::env::remove_var("QUEUE_DEDUP_TTL_SECS");

        assert_eq!(config.stream_name, "test:jobs");
        assert_eq!(config.consumer_group, "starvid:workers");
        assert_eq!(config.dedup_ttl, Duration::from_secs(60));
    }

    #[test]
    fn test_enqueue_script_claims_key_before_append() {
        let set = ENQUEUE_SCRIPT.find("'SET'").unwrap();
        let add = ENQUEUE_SCRIPT.find("'XADD'").unwrap();
        assert!(set < add);
        assert!(ENQUEUE_SCRIPT.contains("'NX'"));
    }

    #[test]
    fn test_decode_entry_requires_job_field() {
        let entry = StreamId {
            id: "1-0".to_string(),
            map: Default::default(),
        };
        assert!(decode_entry(&entry).is_none());

        let mut map = std::collections::HashMap::new();
        map.insert(
            "job".to_string(),
            redis::Value::BulkString(b"{\"type\":\"nope\"}".to_vec()),
        );
        let entry = StreamId { id: "2-0".to_string(), map };
        assert!(decode_entry(&entry).is_none());
    }
}
