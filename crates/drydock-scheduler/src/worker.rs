//! Worker pool - drains the job queue and drives the orchestrator.
//!
//! Exactly `pool_size` loops share the bounded queue; a job is handled
//! inline in its worker's own loop, so pool concurrency is exactly
//! `pool_size`. Each dequeued job gets a fresh deadline of `timeout`
//! measured from the dequeue instant.

use crate::orchestrator::BuildOrchestrator;
use crate::queue::JobQueue;
use crate::status::StatusPublisher;
use drydock_bus::{MessageBus, Subscription, subjects};
use drydock_config::EngineConfig;
use drydock_core::{BuildJob, Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info, warn};

pub struct WorkerPool {
    config: EngineConfig,
    queue: Arc<JobQueue>,
    orchestrator: Arc<BuildOrchestrator>,
    publisher: Arc<StatusPublisher>,
    bus: Arc<dyn MessageBus>,
    stop: watch::Sender<bool>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    intake: Mutex<Option<JoinHandle<()>>>,
}

impl WorkerPool {
    pub fn new(
        config: EngineConfig,
        bus: Arc<dyn MessageBus>,
        orchestrator: Arc<BuildOrchestrator>,
    ) -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            queue: Arc::new(JobQueue::new(config.queue_size)),
            publisher: Arc::new(StatusPublisher::new(bus.clone())),
            orchestrator,
            bus,
            stop,
            workers: Mutex::new(Vec::new()),
            intake: Mutex::new(None),
            config,
        }
    }

    /// Subscribe the intake path to the bus, then launch the worker loops.
    pub async fn start(&self) -> Result<()> {
        let subscription = self
            .bus
            .subscribe(subjects::INTAKE)
            .await
            .map_err(|err| Error::Bus(err.to_string()))?;

        let intake = tokio::spawn(intake_loop(
            subscription,
            self.queue.clone(),
            self.publisher.clone(),
        ));
        *self.intake.lock().await = Some(intake);

        let mut workers = self.workers.lock().await;
        for worker in 0..self.config.pool_size {
            workers.push(tokio::spawn(worker_loop(
                worker,
                self.queue.clone(),
                self.orchestrator.clone(),
                self.publisher.clone(),
                self.config.timeout,
                self.stop.subscribe(),
            )));
        }

        info!(
            pool_size = self.config.pool_size,
            queue_size = self.config.queue_size,
            "worker pool started"
        );
        Ok(())
    }

    /// Graceful shutdown: stop admissions, signal the workers, and wait up
    /// to `grace` for them to finish their current jobs. Workers still
    /// busy at the deadline are abandoned; their jobs stay bounded by the
    /// per-job deadline already in effect.
    pub async fn shutdown(&self, grace: Duration) {
        if let Some(intake) = self.intake.lock().await.take() {
            intake.abort();
            let _ = intake.await;
        }

        let _ = self.stop.send(true);

        let workers = std::mem::take(&mut *self.workers.lock().await);
        let drain = async {
            for handle in workers {
                let _ = handle.await;
            }
        };
        if tokio::time::timeout(grace, drain).await.is_err() {
            warn!("shutdown deadline elapsed with workers still busy");
        } else {
            info!("worker pool stopped");
        }
    }
}

/// Consume the intake subscription: deserialize, validate, admit.
async fn intake_loop(
    mut subscription: Subscription,
    queue: Arc<JobQueue>,
    publisher: Arc<StatusPublisher>,
) {
    while let Some(payload) = subscription.next().await {
        let job: BuildJob = match serde_json::from_slice(&payload) {
            Ok(job) => job,
            Err(err) => {
                // No confirmed job identity, so nothing is published.
                error!(error = %err, "dropping malformed intake payload");
                continue;
            }
        };
        if !job.is_valid() {
            error!(job_id = %job.id, "dropping invalid job");
            continue;
        }

        if let Err(mut job) = queue.try_enqueue(job) {
            warn!(job_id = %job.id, "queue is full, rejecting job");
            job.mark_failed("queue is full");
            publisher.publish_complete(&job).await;
        }
    }
}

async fn worker_loop(
    worker: usize,
    queue: Arc<JobQueue>,
    orchestrator: Arc<BuildOrchestrator>,
    publisher: Arc<StatusPublisher>,
    timeout: Duration,
    mut stop: watch::Receiver<bool>,
) {
    info!(worker, "worker started");
    loop {
        let job = tokio::select! {
            _ = stop.changed() => break,
            job = queue.dequeue() => match job {
                Some(job) => job,
                None => break,
            },
        };
        process_job(worker, job, &orchestrator, &publisher, timeout, &stop).await;
    }
    info!(worker, "worker stopped");
}

async fn process_job(
    worker: usize,
    mut job: BuildJob,
    orchestrator: &BuildOrchestrator,
    publisher: &StatusPublisher,
    timeout: Duration,
    stop: &watch::Receiver<bool>,
) {
    if *stop.borrow() {
        // Dequeued in the same instant the pool was told to stop.
        job.mark_cancelled();
        publisher.publish_complete(&job).await;
        return;
    }

    info!(
        worker,
        job_id = %job.id,
        repository = %job.repository.full_name(),
        commit = %job.commit_sha,
        "job started"
    );
    job.mark_started();
    publisher.publish_status(&job).await;

    let deadline = Instant::now() + timeout;
    match orchestrator.run(&mut job, deadline).await {
        Ok(()) => {
            job.mark_succeeded();
            info!(worker, job_id = %job.id, duration_ms = job.duration_ms, "job succeeded");
        }
        Err(err) => {
            job.mark_failed(err.to_string());
            error!(worker, job_id = %job.id, error = %err, "job failed");
        }
    }
    publisher.publish_complete(&job).await;
}
