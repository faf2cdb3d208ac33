//! Redis Streams queue integration tests.

use std::time::Duration;

use starvid_models::{JobId, Theme};
use starvid_queue::{JobQueue, ProcessStarsJob, QueueConfig, RedisJobQueue};

fn test_queue() -> RedisJobQueue {
    let suffix = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let config = QueueConfig {
        stream_name: format!("starvid:test:{suffix}"),
        ..QueueConfig::from_env()
    };
    RedisJobQueue::new(config).expect("Failed to create queue")
}

fn job(id: &str) -> starvid_queue::QueueJob {
    ProcessStarsJob::new(JobId::from_string(id), "octocat", "Hello-World", Theme::Dark).into()
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_duplicate_enqueue_adds_nothing() {
    let queue = test_queue();
    queue.init().await.expect("Failed to initialize queue");

    queue.enqueue(job("dup")).await.expect("Failed to enqueue");
    let err = queue.enqueue(job("dup")).await.unwrap_err();
    assert!(err.is_duplicate());
    assert_eq!(queue.len().await.unwrap(), 1);

    let jobs = queue.consume("test-consumer", 1000, 10).await.unwrap();
    assert_eq!(jobs.len(), 1);
    queue.ack(&jobs[0].0).await.unwrap();
    assert_eq!(queue.len().await.unwrap(), 0);
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_touched_message_is_not_claimed() {
    let queue = test_queue();
    queue.init().await.expect("Failed to initialize queue");

    queue.enqueue(job("busy")).await.expect("Failed to enqueue");
    let jobs = queue.consume("c1", 1000, 1).await.unwrap();
    let ids: Vec<String> = jobs.iter().map(|(id, _)| id.clone()).collect();

    tokio::time::sleep(Duration::from_millis(300)).await;
    queue.touch("c1", &ids).await.unwrap();
    assert!(queue.claim_pending("c2", 200, 10).await.unwrap().is_empty());

    tokio::time::sleep(Duration::from_millis(300)).await;
    let claimed = queue.claim_pending("c2", 200, 10).await.unwrap();
    assert_eq!(claimed.len(), 1);
    queue.ack(&claimed[0].0).await.unwrap();
}
