//! Project build backed by a configured command.

use async_trait::async_trait;
use drydock_core::services::{BuildConfig, BuildResult, ProjectBuildService};
use drydock_core::{Error, Result};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::info;

/// How much of a failing build's stderr ends up in the job error.
const STDERR_TAIL_LINES: usize = 20;

/// Runs the configured build command inside the working tree.
#[derive(Default)]
pub struct CommandBuild;

impl CommandBuild {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProjectBuildService for CommandBuild {
    async fn build(&self, working_tree: &Path, config: &BuildConfig) -> Result<BuildResult> {
        let (program, args) = config
            .command
            .split_first()
            .ok_or_else(|| Error::BuildFailed("build command is empty".to_string()))?;

        info!(
            command = %config.command.join(" "),
            working_tree = %working_tree.display(),
            "running project build"
        );

        let mut command = Command::new(program);
        command
            .args(args)
            .current_dir(working_tree)
            .envs(&config.env)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cache) = &config.cache_path {
            command.env("DEPENDENCY_CACHE", cache);
        }

        let output = command.output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::BuildFailed(tail(&stderr, STDERR_TAIL_LINES)));
        }

        Ok(BuildResult {
            artifact_path: working_tree.join(&config.artifact),
        })
    }
}

/// Last `n` non-empty lines of command output.
fn tail(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}
