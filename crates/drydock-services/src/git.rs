//! Source sync backed by the `git` CLI.

use async_trait::async_trait;
use drydock_core::services::SourceSyncService;
use drydock_core::{Error, RepositoryInfo, Result};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::info;

/// Materializes working trees with `git clone` + `git checkout`.
pub struct GitSync {
    /// Base directory for checked-out working trees.
    work_dir: PathBuf,
}

impl GitSync {
    pub fn new(work_dir: PathBuf) -> Self {
        Self { work_dir }
    }

    fn checkout_path(&self, repo: &RepositoryInfo, commit_sha: &str) -> PathBuf {
        let short_sha: String = commit_sha.chars().take(12).collect();
        self.work_dir.join(format!("{}-{}", repo.name, short_sha))
    }
}

#[async_trait]
impl SourceSyncService for GitSync {
    async fn sync(&self, repo: &RepositoryInfo, commit_sha: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.work_dir).await?;

        let checkout = self.checkout_path(repo, commit_sha);
        if checkout.exists() {
            tokio::fs::remove_dir_all(&checkout).await?;
        }

        info!(
            repository = %repo.full_name(),
            commit = %commit_sha,
            path = %checkout.display(),
            "cloning repository"
        );

        let mut clone = Command::new("git");
        clone.arg("clone").arg("--single-branch");
        if !repo.branch.is_empty() {
            clone.arg("--branch").arg(&repo.branch);
        }
        clone
            .arg(&repo.url)
            .arg(&checkout)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = clone.output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::SyncFailed(stderr.trim().to_string()));
        }

        // Pin the working tree to the requested commit, not the branch head.
        let output = Command::new("git")
            .args(["checkout", "--detach", commit_sha])
            .current_dir(&checkout)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::SyncFailed(format!(
                "checkout of {} failed: {}",
                commit_sha,
                stderr.trim()
            )));
        }

        Ok(checkout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_paths_are_per_repo_and_commit() {
        let sync = GitSync::new(PathBuf::from("/work"));
        let repo = RepositoryInfo::new("https://x/acme/svc.git", "acme", "svc", "main");

        let path = sync.checkout_path(&repo, "0123456789abcdef0123456789abcdef01234567");
        assert_eq!(path, PathBuf::from("/work/svc-0123456789ab"));

        let other = sync.checkout_path(&repo, "fedcba9876543210fedcba9876543210fedcba98");
        assert_ne!(path, other);
    }
}
