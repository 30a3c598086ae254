//! Build job model and status state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{BuildPhase, RepositoryInfo};

/// Lifecycle status of a build job.
///
/// `Pending` and `Running` are the only non-terminal states. A terminal
/// status never changes once set; the transition methods on [`BuildJob`]
/// enforce this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Admitted, waiting for a worker.
    Pending,
    /// Owned by a worker, pipeline in progress.
    Running,
    /// All phases completed.
    Success,
    /// A phase failed, admission was rejected, or the deadline elapsed.
    Failed,
    /// Stopped by shutdown before the pipeline ran.
    Cancelled,
}

impl Default for JobStatus {
    fn default() -> Self {
        JobStatus::Pending
    }
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Success | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Success => "success",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timing record for one attempted phase.
///
/// A job accumulates these in execution order; the orchestrator appends
/// exactly one per attempted phase regardless of how many retries the
/// phase needed internally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseMetric {
    pub phase: BuildPhase,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Wall-clock duration, computed once both timestamps are set.
    pub duration_ms: u64,
    pub success: bool,
    pub error: Option<String>,
}

impl PhaseMetric {
    /// Open a metric for a phase that is starting now.
    pub fn started(phase: BuildPhase) -> Self {
        Self {
            phase,
            started_at: Utc::now(),
            finished_at: None,
            duration_ms: 0,
            success: false,
            error: None,
        }
    }

    /// Close the metric. `error` of `None` means the phase succeeded.
    pub fn finish(&mut self, error: Option<String>) {
        let now = Utc::now();
        self.finished_at = Some(now);
        self.duration_ms = (now - self.started_at).num_milliseconds().max(0) as u64;
        self.success = error.is_none();
        self.error = error;
    }
}

/// One build request flowing through the pipeline.
///
/// A job is mutated exclusively by the worker that dequeued it and becomes
/// immutable once it reaches a terminal status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildJob {
    pub id: String,
    pub repository: RepositoryInfo,
    pub commit_sha: String,
    #[serde(default)]
    pub commit_author: String,
    #[serde(default)]
    pub commit_message: String,
    /// Target branch of the build.
    pub branch: String,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Total wall-clock duration from start to completion.
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub error: Option<String>,
    /// Phase records in execution order.
    #[serde(default)]
    pub phases: Vec<PhaseMetric>,
}

impl BuildJob {
    /// Create a pending job with a generated identifier.
    pub fn new(
        repository: RepositoryInfo,
        commit_sha: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            repository,
            commit_sha: commit_sha.into(),
            commit_author: String::new(),
            commit_message: String::new(),
            branch: branch.into(),
            status: JobStatus::Pending,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            duration_ms: 0,
            error: None,
            phases: Vec::new(),
        }
    }

    /// Whether the job carries everything the pipeline needs.
    pub fn is_valid(&self) -> bool {
        !self.id.is_empty()
            && !self.repository.url.is_empty()
            && !self.repository.name.is_empty()
            && !self.repository.owner.is_empty()
            && !self.commit_sha.is_empty()
    }

    /// `pending -> running`, stamping the start time.
    pub fn mark_started(&mut self) {
        if self.status.is_terminal() {
            return;
        }
        self.status = JobStatus::Running;
        self.started_at = Some(Utc::now());
    }

    /// Terminal transition to `success`.
    pub fn mark_succeeded(&mut self) {
        self.complete(JobStatus::Success, None);
    }

    /// Terminal transition to `failed` with a human-readable error.
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.complete(JobStatus::Failed, Some(error.into()));
    }

    /// Terminal transition to `cancelled`.
    pub fn mark_cancelled(&mut self) {
        self.complete(JobStatus::Cancelled, None);
    }

    fn complete(&mut self, status: JobStatus, error: Option<String>) {
        if self.status.is_terminal() {
            return;
        }
        let now = Utc::now();
        self.status = status;
        self.error = error;
        self.completed_at = Some(now);
        let since = self.started_at.unwrap_or(self.created_at);
        self.duration_ms = (now - since).num_milliseconds().max(0) as u64;
    }

    /// Append a phase record. Phases arrive in execution order.
    pub fn record_phase(&mut self, metric: PhaseMetric) {
        self.phases.push(metric);
    }
}
