//! Image build backed by the `docker` CLI.

use async_trait::async_trait;
use drydock_core::services::{ImageBuildService, ImageResult, ImageSpec};
use drydock_core::{Error, Result};
use std::process::Stdio;
use tokio::process::Command;
use tracing::info;
use uuid::Uuid;

/// Builds images by shelling out to `docker build`.
pub struct DockerBuild {
    docker_bin: String,
}

impl Default for DockerBuild {
    fn default() -> Self {
        Self::new()
    }
}

impl DockerBuild {
    pub fn new() -> Self {
        Self {
            docker_bin: std::env::var("DRYDOCK_DOCKER_BIN").unwrap_or_else(|_| "docker".to_string()),
        }
    }
}

#[async_trait]
impl ImageBuildService for DockerBuild {
    async fn build_image(&self, spec: &ImageSpec) -> Result<ImageResult> {
        info!(
            context = %spec.context_path.display(),
            tags = ?spec.tags,
            "building image"
        );

        // The iidfile captures the image digest without parsing build output.
        let iidfile = std::env::temp_dir().join(format!("drydock-iid-{}", Uuid::now_v7()));

        let mut command = Command::new(&self.docker_bin);
        command.arg("build").arg("--iidfile").arg(&iidfile);
        for tag in &spec.tags {
            command.arg("-t").arg(tag);
        }
        for (key, value) in &spec.build_args {
            command.arg("--build-arg").arg(format!("{}={}", key, value));
        }
        command
            .arg(&spec.context_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = command.output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let _ = tokio::fs::remove_file(&iidfile).await;
            return Err(Error::ImageBuildFailed(stderr.trim().to_string()));
        }

        let image_id = tokio::fs::read_to_string(&iidfile)
            .await
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        let _ = tokio::fs::remove_file(&iidfile).await;

        Ok(ImageResult {
            image_id,
            tags: spec.tags.clone(),
        })
    }
}
