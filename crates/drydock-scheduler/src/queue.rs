//! Bounded in-process job queue.
//!
//! Admission control for the engine: producers never block. When the
//! buffer is full the job comes straight back to the caller, which
//! rejects it instead of applying backpressure upstream.

use drydock_core::BuildJob;
use tokio::sync::Mutex;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

pub struct JobQueue {
    tx: mpsc::Sender<BuildJob>,
    rx: Mutex<mpsc::Receiver<BuildJob>>,
}

impl JobQueue {
    /// Create a queue holding at most `capacity` jobs.
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        Self {
            tx,
            rx: Mutex::new(rx),
        }
    }

    /// Non-blocking admission. On a full buffer the job is handed back
    /// unchanged so the caller can reject it.
    pub fn try_enqueue(&self, job: BuildJob) -> Result<(), BuildJob> {
        self.tx.try_send(job).map_err(|err| match err {
            TrySendError::Full(job) | TrySendError::Closed(job) => job,
        })
    }

    /// Wait for the next job. FIFO at the buffer; workers contend for the
    /// receiver, so cross-job ordering is not guaranteed to callers.
    pub async fn dequeue(&self) -> Option<BuildJob> {
        self.rx.lock().await.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drydock_core::RepositoryInfo;
    use std::sync::Arc;

    fn job(n: usize) -> BuildJob {
        BuildJob::new(
            RepositoryInfo::new("https://x/acme/svc.git", "acme", "svc", "main"),
            format!("sha-{}", n),
            "main",
        )
    }

    #[tokio::test]
    async fn admits_up_to_capacity() {
        let queue = JobQueue::new(3);
        for n in 0..3 {
            queue.try_enqueue(job(n)).unwrap();
        }

        let rejected = queue.try_enqueue(job(3)).unwrap_err();
        assert_eq!(rejected.commit_sha, "sha-3");
    }

    #[tokio::test]
    async fn concurrent_submissions_are_neither_lost_nor_duplicated() {
        let queue = Arc::new(JobQueue::new(32));

        let mut handles = Vec::new();
        for n in 0..32 {
            let queue = queue.clone();
            handles.push(tokio::spawn(async move {
                queue.try_enqueue(job(n)).is_ok()
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap());
        }

        let mut drained = Vec::new();
        while let Ok(Some(job)) =
            tokio::time::timeout(std::time::Duration::from_millis(100), queue.dequeue()).await
        {
            drained.push(job.commit_sha);
        }
        drained.sort();
        drained.dedup();
        assert_eq!(drained.len(), 32);
    }

    #[tokio::test]
    async fn dequeue_is_fifo_at_the_buffer() {
        let queue = JobQueue::new(4);
        for n in 0..4 {
            queue.try_enqueue(job(n)).unwrap();
        }

        for n in 0..4 {
            let job = queue.dequeue().await.unwrap();
            assert_eq!(job.commit_sha, format!("sha-{}", n));
        }
    }

    #[tokio::test]
    async fn rejection_frees_no_capacity() {
        let queue = JobQueue::new(1);
        queue.try_enqueue(job(0)).unwrap();
        assert!(queue.try_enqueue(job(1)).is_err());

        // Draining the buffer makes room again.
        queue.dequeue().await.unwrap();
        queue.try_enqueue(job(2)).unwrap();
    }
}
