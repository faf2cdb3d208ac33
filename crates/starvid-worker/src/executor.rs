//! Queue executor.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use starvid_queue::{JobQueue, QueueJob};
use tokio::sync::{watch, Mutex, OwnedSemaphorePermit, Semaphore};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::WorkerConfig;
use crate::context::ProcessingContext;
use crate::error::WorkerResult;
use crate::failure_tracker::FailureTracker;
use crate::metrics;
use crate::stages::{process_stars, render_video, StageOutcome};

/// Message ids this process is currently running.
type InFlight = Arc<Mutex<HashSet<String>>>;

/// Consumes stage messages and runs them with bounded concurrency.
pub struct JobExecutor {
    config: WorkerConfig,
    ctx: Arc<ProcessingContext>,
    queue: Arc<dyn JobQueue>,
    job_semaphore: Arc<Semaphore>,
    in_flight: InFlight,
    shutdown: watch::Sender<bool>,
    consumer_name: String,
}

impl JobExecutor {
    pub fn new(config: WorkerConfig, ctx: ProcessingContext) -> Self {
        let job_semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs));
        let (shutdown, _) = watch::channel(false);
        let consumer_name = format!("worker-{}", Uuid::new_v4());
        let queue = Arc::clone(&ctx.queue);

        Self {
            config,
            ctx: Arc::new(ctx),
            queue,
            job_semaphore,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            shutdown,
            consumer_name,
        }
    }

    pub fn consumer_name(&self) -> &str {
        &self.consumer_name
    }

    /// Run until [`JobExecutor::shutdown`] is called, then drain in-flight stages.
    pub async fn run(&self) -> WorkerResult<()> {
        info!(
            "Starting job executor '{}' with {} max concurrent jobs",
            self.consumer_name, self.config.max_concurrent_jobs
        );

        self.queue.init().await?;

        let claim_task = tokio::spawn(Self::claim_loop(
            Arc::clone(&self.ctx),
            Arc::clone(&self.queue),
            Arc::clone(&self.job_semaphore),
            Arc::clone(&self.in_flight),
            self.config.clone(),
            self.consumer_name.clone(),
            self.shutdown.subscribe(),
        ));

        let mut shutdown_rx = self.shutdown.subscribe();
        let mut failures = FailureTracker::new(5);

        loop {
            if *shutdown_rx.borrow() {
                break;
            }
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Shutdown signal received, stopping executor");
                        break;
                    }
                }
                result = self.consume_jobs() => {
                    match result {
                        Ok(()) => failures.record_success(),
                        Err(e) => {
                            if failures.record_failure() {
                                error!("Error consuming jobs: {}", e);
                            }
                            tokio::time::sleep(failures.backoff()).await;
                        }
                    }
                }
            }
        }

        claim_task.abort();

        info!("Waiting for in-flight jobs to complete...");
        if tokio::time::timeout(self.config.shutdown_timeout, self.wait_for_jobs())
            .await
            .is_err()
        {
            warn!(
                "In-flight jobs still running after {:?}; their messages stay pending",
                self.config.shutdown_timeout
            );
        }

        info!("Job executor stopped");
        Ok(())
    }

    /// Every tick, first refresh the idle time of messages still running
    /// here, then take over messages abandoned by other consumers.
    async fn claim_loop(
        ctx: Arc<ProcessingContext>,
        queue: Arc<dyn JobQueue>,
        semaphore: Arc<Semaphore>,
        in_flight: InFlight,
        config: WorkerConfig,
        consumer_name: String,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        let mut interval = tokio::time::interval(config.claim_interval);
        let min_idle_ms = config.claim_min_idle.as_millis() as u64;

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                }
                _ = interval.tick() => {
                    let running: Vec<String> = in_flight.lock().await.iter().cloned().collect();
                    if let Err(e) = queue.touch(&consumer_name, &running).await {
                        warn!("Failed to refresh {} in-flight messages: {}", running.len(), e);
                    }

                    let available = semaphore.available_permits();
                    if available == 0 {
                        continue;
                    }

                    let jobs = match queue.claim_pending(&consumer_name, min_idle_ms, available.min(5)).await {
                        Ok(jobs) => jobs,
                        Err(e) => {
                            warn!("Failed to claim pending jobs: {}", e);
                            continue;
                        }
                    };
                    if jobs.is_empty() {
                        continue;
                    }

                    info!("Claimed {} pending jobs", jobs.len());
                    for (message_id, job) in jobs {
                        if in_flight.lock().await.contains(&message_id) {
                            debug!("Message {} is still running here, not restarting it", message_id);
                            continue;
                        }
                        // Unstarted claims stay pending and are claimed again later.
                        let Ok(permit) = Arc::clone(&semaphore).try_acquire_owned() else {
                            break;
                        };
                        Self::spawn_job(&ctx, &queue, &in_flight, permit, message_id, job).await;
                    }
                }
            }
        }
    }

    /// Record the message as in flight and run it on its own task.
    async fn spawn_job(
        ctx: &Arc<ProcessingContext>,
        queue: &Arc<dyn JobQueue>,
        in_flight: &InFlight,
        permit: OwnedSemaphorePermit,
        message_id: String,
        job: QueueJob,
    ) {
        in_flight.lock().await.insert(message_id.clone());

        let ctx = Arc::clone(ctx);
        let queue = Arc::clone(queue);
        let in_flight = Arc::clone(in_flight);
        tokio::spawn(async move {
            let _permit = permit;
            Self::execute_job(ctx, queue, message_id.clone(), job).await;
            in_flight.lock().await.remove(&message_id);
        });
    }

    async fn consume_jobs(&self) -> WorkerResult<()> {
        let available = self.job_semaphore.available_permits();
        if available == 0 {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            return Ok(());
        }

        let jobs = self
            .queue
            .consume(
                &self.consumer_name,
                self.config.consume_block.as_millis() as u64,
                available.min(5),
            )
            .await?;

        if jobs.is_empty() {
            return Ok(());
        }

        debug!("Consumed {} jobs from queue", jobs.len());

        for (message_id, job) in jobs {
            let Ok(permit) = Arc::clone(&self.job_semaphore).acquire_owned().await else {
                break;
            };
            Self::spawn_job(&self.ctx, &self.queue, &self.in_flight, permit, message_id, job).await;
        }

        Ok(())
    }

    /// Run one message. Stage outcomes are acknowledged; infrastructure
    /// errors leave the message pending for the claim loop.
    async fn execute_job(
        ctx: Arc<ProcessingContext>,
        queue: Arc<dyn JobQueue>,
        message_id: String,
        job: QueueJob,
    ) {
        let stage = job.stage();
        let job_id = job.job_id().to_string();
        let started = Instant::now();

        let result = match &job {
            QueueJob::ProcessStars(j) => process_stars(&ctx, j).await,
            QueueJob::RenderVideo(j) => render_video(&ctx, j).await,
        };
        metrics::record_stage_duration(stage, started.elapsed().as_secs_f64());

        match result {
            Ok(outcome) => {
                match &outcome {
                    StageOutcome::Skipped(reason) => {
                        metrics::record_stage_skipped(stage);
                        info!(job_id = %job_id, stage, "Skipped message: {}", reason);
                    }
                    other => debug!(job_id = %job_id, stage, outcome = ?other, "Stage finished"),
                }
                if let Err(e) = queue.ack(&message_id).await {
                    error!(job_id = %job_id, stage, "Failed to ack message {}: {}", message_id, e);
                }
            }
            Err(e) => {
                error!(
                    job_id = %job_id,
                    stage,
                    "Stage could not record its result, leaving message {} pending: {}",
                    message_id,
                    e
                );
            }
        }
    }

    async fn wait_for_jobs(&self) {
        loop {
            if self.job_semaphore.available_permits() == self.config.max_concurrent_jobs {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }
    }

    /// Signal shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}
