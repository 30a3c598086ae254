//! Build orchestrator - runs the three pipeline phases for one job.
//!
//! Phases are strictly sequential: source sync produces the working tree,
//! the project build produces the artifact, the image build packages it.
//! The first failing phase aborts the pipeline; later phases never run.

use crate::retry::{self, RetryPolicy};
use drydock_config::EngineConfig;
use drydock_core::services::{
    BuildConfig, DependencyCacheService, ImageBuildService, ImageSpec, ProjectBuildService,
    SourceSyncService,
};
use drydock_core::{BuildJob, BuildPhase, Error, PhaseMetric, Result, image};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{error, info, warn};

/// Retry budget for the project-build and image-build phases. Their
/// failures are mostly deterministic, unlike source sync which gets the
/// configured budget for transient network errors.
const BUILD_PHASE_ATTEMPTS: u32 = 2;

pub struct BuildOrchestrator {
    source_sync: Arc<dyn SourceSyncService>,
    project_build: Arc<dyn ProjectBuildService>,
    image_build: Arc<dyn ImageBuildService>,
    cache: Arc<dyn DependencyCacheService>,
    build_template: BuildConfig,
    sync_retry: RetryPolicy,
    build_retry: RetryPolicy,
}

impl BuildOrchestrator {
    pub fn new(
        config: &EngineConfig,
        source_sync: Arc<dyn SourceSyncService>,
        project_build: Arc<dyn ProjectBuildService>,
        image_build: Arc<dyn ImageBuildService>,
        cache: Arc<dyn DependencyCacheService>,
    ) -> Self {
        Self {
            source_sync,
            project_build,
            image_build,
            cache,
            build_template: BuildConfig {
                language: config.build.language.clone(),
                command: config.build.command.clone(),
                artifact: config.build.artifact.clone(),
                cache_path: None,
                env: HashMap::new(),
            },
            sync_retry: RetryPolicy::new(config.max_retries, config.retry_delay),
            build_retry: RetryPolicy::new(BUILD_PHASE_ATTEMPTS, config.retry_delay),
        }
    }

    /// Run all phases for one job, stopping at the first failure. The
    /// deadline bounds the whole pipeline, including retries and waits.
    pub async fn run(&self, job: &mut BuildJob, deadline: Instant) -> Result<()> {
        let repo = job.repository.clone();
        let sha = job.commit_sha.clone();

        let sync = Arc::clone(&self.source_sync);
        let sync_repo = repo.clone();
        let sync_sha = sha.clone();
        let working_tree = self
            .run_phase(job, BuildPhase::SourceSync, self.sync_retry, deadline, move || {
                let sync = Arc::clone(&sync);
                let repo = sync_repo.clone();
                let sha = sync_sha.clone();
                async move { sync.sync(&repo, &sha).await }
            })
            .await?;

        let mut build_config = self.build_template.clone();
        match self.cache.initialize(&build_config.language).await {
            Ok(()) => {
                build_config.cache_path = Some(self.cache.cache_path(&build_config.language));
            }
            Err(err) => {
                // Build without a cache rather than fail the job.
                warn!(job_id = %job.id, error = %err, "dependency cache unavailable");
            }
        }

        let builder = Arc::clone(&self.project_build);
        let build_tree = working_tree.clone();
        let build_result = self
            .run_phase(job, BuildPhase::ProjectBuild, self.build_retry, deadline, move || {
                let builder = Arc::clone(&builder);
                let tree = build_tree.clone();
                let config = build_config.clone();
                async move { builder.build(&tree, &config).await }
            })
            .await?;

        // Tag derivation is pure and has no retry semantics of its own.
        let tags = image::derive_tags(&repo.name, &sha, &job.branch);
        let mut build_args = HashMap::new();
        build_args.insert(
            "ARTIFACT".to_string(),
            build_result.artifact_path.display().to_string(),
        );
        let spec = ImageSpec {
            context_path: working_tree,
            tags,
            build_args,
        };

        let imager = Arc::clone(&self.image_build);
        self.run_phase(job, BuildPhase::ImageBuild, self.build_retry, deadline, move || {
            let imager = Arc::clone(&imager);
            let spec = spec.clone();
            async move { imager.build_image(&spec).await }
        })
        .await?;

        Ok(())
    }

    /// Run one phase through the retry policy, recording its metric
    /// whether it succeeds or not.
    async fn run_phase<T, F, Fut>(
        &self,
        job: &mut BuildJob,
        phase: BuildPhase,
        policy: RetryPolicy,
        deadline: Instant,
        op: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        info!(job_id = %job.id, phase = %phase, "phase started");
        let mut metric = PhaseMetric::started(phase);

        let result = retry::execute(policy, deadline, op).await;

        match &result {
            Ok(_) => {
                metric.finish(None);
                info!(
                    job_id = %job.id,
                    phase = %phase,
                    duration_ms = metric.duration_ms,
                    "phase completed"
                );
            }
            Err(err) => {
                metric.finish(Some(err.to_string()));
                error!(job_id = %job.id, phase = %phase, error = %err, "phase failed");
            }
        }
        job.record_phase(metric);

        result.map_err(|err| Error::PhaseFailed {
            phase,
            job_id: job.id.clone(),
            message: err.to_string(),
        })
    }
}
