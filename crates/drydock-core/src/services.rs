//! Collaborator traits for the pipeline phases.
//!
//! Each phase is carried out by an injected collaborator; the orchestrator
//! depends only on these traits, so tests substitute their own
//! implementations without touching the pipeline logic.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::{RepositoryInfo, Result};

/// Inputs for the project-build phase.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Language of the project, used to select a dependency cache.
    pub language: String,
    /// Build command and its arguments.
    pub command: Vec<String>,
    /// Path of the produced artifact, relative to the working tree.
    pub artifact: String,
    /// Dependency cache location, when one is available.
    pub cache_path: Option<PathBuf>,
    /// Extra environment for the build command.
    pub env: HashMap<String, String>,
}

/// Output of a completed project build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildResult {
    pub artifact_path: PathBuf,
}

/// Inputs for constructing a container image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSpec {
    /// Build context directory.
    pub context_path: PathBuf,
    /// Tags to apply, derived from the job.
    pub tags: Vec<String>,
    /// `--build-arg` style key/value pairs.
    pub build_args: HashMap<String, String>,
}

/// Output of a completed image build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageResult {
    pub image_id: String,
    pub tags: Vec<String>,
}

/// Materializes a repository working tree at a specific commit.
#[async_trait]
pub trait SourceSyncService: Send + Sync {
    async fn sync(&self, repo: &RepositoryInfo, commit_sha: &str) -> Result<PathBuf>;
}

/// Compiles the project inside a working tree.
#[async_trait]
pub trait ProjectBuildService: Send + Sync {
    async fn build(&self, working_tree: &Path, config: &BuildConfig) -> Result<BuildResult>;
}

/// Constructs a container image from a build context.
#[async_trait]
pub trait ImageBuildService: Send + Sync {
    async fn build_image(&self, spec: &ImageSpec) -> Result<ImageResult>;
}

/// Provides per-language dependency caches.
#[async_trait]
pub trait DependencyCacheService: Send + Sync {
    /// Directory holding the cache for a language.
    fn cache_path(&self, language: &str) -> PathBuf;

    /// Ensure the cache for a language exists.
    async fn initialize(&self, language: &str) -> Result<()>;
}
