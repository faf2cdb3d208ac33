//! In-process queue for single-binary deployments and tests.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{QueueError, QueueResult};
use crate::job::QueueJob;
use crate::queue::JobQueue;

struct InFlight {
    job: QueueJob,
    delivered_at: Instant,
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    ready: VecDeque<(String, QueueJob)>,
    in_flight: HashMap<String, InFlight>,
    dedup: HashMap<String, Instant>,
}

impl Inner {
    fn take_ready(&mut self, count: usize) -> Vec<(String, QueueJob)> {
        let now = Instant::now();
        let n = count.min(self.ready.len());
        let batch: Vec<_> = self.ready.drain(..n).collect();
        for (id, job) in &batch {
            self.in_flight.insert(
                id.clone(),
                InFlight {
                    job: job.clone(),
                    delivered_at: now,
                },
            );
        }
        batch
    }
}

/// Process-local queue with the same delivery semantics as the Redis backend.
pub struct MemoryJobQueue {
    inner: Mutex<Inner>,
    notify: Notify,
    dedup_ttl: Duration,
}

impl Default for MemoryJobQueue {
    fn default() -> Self {
        Self::new(Duration::from_secs(3600))
    }
}

impl MemoryJobQueue {
    pub fn new(dedup_ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            notify: Notify::new(),
            dedup_ttl,
        }
    }
}

#[async_trait]
impl JobQueue for MemoryJobQueue {
    async fn init(&self) -> QueueResult<()> {
        Ok(())
    }

    async fn enqueue(&self, job: QueueJob) -> QueueResult<String> {
        let key = job.idempotency_key();
        let mut inner = self.inner.lock().await;

        let now = Instant::now();
        let ttl = self.dedup_ttl;
        inner.dedup.retain(|_, at| now.duration_since(*at) < ttl);
        if inner.dedup.contains_key(&key) {
            warn!("Duplicate job rejected: {}", key);
            return Err(QueueError::Duplicate(key));
        }
        inner.dedup.insert(key, now);

        inner.next_id += 1;
        let message_id = format!("{}-0", inner.next_id);
        info!(
            job_id = %job.job_id(),
            stage = job.stage(),
            "Enqueued job with message ID {}",
            message_id
        );
        inner.ready.push_back((message_id.clone(), job));
        drop(inner);

        self.notify.notify_one();
        Ok(message_id)
    }

    async fn consume(
        &self,
        _consumer_name: &str,
        block_ms: u64,
        count: usize,
    ) -> QueueResult<Vec<(String, QueueJob)>> {
        let deadline = Instant::now() + Duration::from_millis(block_ms);
        loop {
            {
                let mut inner = self.inner.lock().await;
                let batch = inner.take_ready(count);
                if !batch.is_empty() {
                    // Leftovers may still have a waiting consumer.
                    if !inner.ready.is_empty() {
                        self.notify.notify_one();
                    }
                    return Ok(batch);
                }
            }

            if tokio::time::timeout_at(deadline, self.notify.notified())
                .await
                .is_err()
            {
                return Ok(Vec::new());
            }
        }
    }

    async fn claim_pending(
        &self,
        _consumer_name: &str,
        min_idle_ms: u64,
        count: usize,
    ) -> QueueResult<Vec<(String, QueueJob)>> {
        let min_idle = Duration::from_millis(min_idle_ms);
        let now = Instant::now();
        let mut inner = self.inner.lock().await;

        let mut ids: Vec<String> = inner
            .in_flight
            .iter()
            .filter(|(_, f)| now.duration_since(f.delivered_at) >= min_idle)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids.truncate(count);

        let mut claimed = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(entry) = inner.in_flight.get_mut(&id) {
                entry.delivered_at = now;
                info!(job_id = %entry.job.job_id(), "Claimed pending message {}", id);
                claimed.push((id, entry.job.clone()));
            }
        }
        Ok(claimed)
    }

    async fn touch(&self, _consumer_name: &str, message_ids: &[String]) -> QueueResult<()> {
        let now = Instant::now();
        let mut inner = self.inner.lock().await;
        for id in message_ids {
            if let Some(entry) = inner.in_flight.get_mut(id) {
                entry.delivered_at = now;
            }
        }
        Ok(())
    }

    async fn ack(&self, message_id: &str) -> QueueResult<()> {
        let mut inner = self.inner.lock().await;
        inner.in_flight.remove(message_id);
        debug!("Acknowledged message: {}", message_id);
        Ok(())
    }

    async fn len(&self) -> QueueResult<u64> {
        let inner = self.inner.lock().await;
        Ok((inner.ready.len() + inner.in_flight.len()) as u64)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::ProcessStarsJob;
    use starvid_models::{JobId, Theme};
    use std::sync::Arc;

    fn job(id: &str) -> QueueJob {
        ProcessStarsJob::new(JobId::from_string(id), "o", "r", Theme::Dark).into()
    }

    #[tokio::test]
    async fn test_fifo_delivery_and_ack() {
        let queue = MemoryJobQueue::default();
        queue.enqueue(job("a")).await.unwrap();
        queue.enqueue(job("b")).await.unwrap();

        let batch = queue.consume("c1", 10, 10).await.unwrap();
        let ids: Vec<_> = batch.iter().map(|(_, j)| j.job_id().to_string()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(queue.len().await.unwrap(), 2);

        for (message_id, _) in &batch {
            queue.ack(message_id).await.unwrap();
        }
        assert_eq!(queue.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_rejected() {
        let queue = MemoryJobQueue::default();
        queue.enqueue(job("a")).await.unwrap();
        let err = queue.enqueue(job("a")).await.unwrap_err();
        assert!(err.is_duplicate());
    }

    #[tokio::test]
    async fn test_consume_times_out_empty() {
        let queue = MemoryJobQueue::default();
        let batch = queue.consume("c1", 20, 1).await.unwrap();
        assert!(batch.is_empty());
    }

    #[tokio::test]
    async fn test_consume_wakes_on_enqueue() {
        let queue = Arc::new(MemoryJobQueue::default());
        let consumer = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.consume("c1", 5_000, 1).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.enqueue(job("late")).await.unwrap();

        let batch = consumer.await.unwrap().unwrap();
        assert_eq!(batch.len(), 1);
    }

    #[tokio::test]
    async fn test_unacked_message_is_reclaimed() {
        let queue = MemoryJobQueue::default();
        queue.enqueue(job("a")).await.unwrap();
        let first = queue.consume("c1", 10, 1).await.unwrap();
        assert_eq!(first.len(), 1);

        assert!(queue.consume("c2", 10, 1).await.unwrap().is_empty());
        let claimed = queue.claim_pending("c2", 0, 10).await.unwrap();
        assert_eq!(claimed.len(), 1);
        assert_eq!(claimed[0].0, first[0].0);

        // Freshly claimed messages are not idle.
        assert!(queue.claim_pending("c3", 60_000, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_touched_message_is_not_reclaimed() {
        let queue = MemoryJobQueue::default();
        queue.enqueue(job("a")).await.unwrap();
        let first = queue.consume("c1", 10, 1).await.unwrap();
        let ids: Vec<String> = first.iter().map(|(id, _)| id.clone()).collect();

        tokio::time::sleep(Duration::from_millis(60)).await;
        queue.touch("c1", &ids).await.unwrap();
        assert!(queue.claim_pending("c2", 50, 10).await.unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(queue.claim_pending("c2", 50, 10).await.unwrap().len(), 1);
    }
}
