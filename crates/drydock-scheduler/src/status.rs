//! Publishes job lifecycle snapshots to the message bus.

use drydock_bus::{MessageBus, subjects};
use drydock_core::BuildJob;
use std::sync::Arc;
use tracing::error;

/// Emits the full serialized job at defined lifecycle points: admission
/// rejection, start, and terminal transition. Publish failures are logged
/// and never fail the job itself.
pub struct StatusPublisher {
    bus: Arc<dyn MessageBus>,
}

impl StatusPublisher {
    pub fn new(bus: Arc<dyn MessageBus>) -> Self {
        Self { bus }
    }

    /// Snapshot on a non-terminal transition (job started).
    pub async fn publish_status(&self, job: &BuildJob) {
        self.publish(subjects::STATUS, job).await;
    }

    /// Terminal snapshot: a last `builds.status` update plus the one-shot
    /// `builds.complete`.
    pub async fn publish_complete(&self, job: &BuildJob) {
        self.publish(subjects::STATUS, job).await;
        self.publish(subjects::COMPLETE, job).await;
    }

    async fn publish(&self, subject: &str, job: &BuildJob) {
        let payload = match serde_json::to_vec(job) {
            Ok(payload) => payload,
            Err(err) => {
                error!(job_id = %job.id, error = %err, "failed to serialize job snapshot");
                return;
            }
        };
        if let Err(err) = self.bus.publish(subject, &payload).await {
            error!(job_id = %job.id, subject, error = %err, "status publish failed");
        }
    }
}
