//! On-disk per-language dependency caches.

use async_trait::async_trait;
use drydock_core::services::DependencyCacheService;
use drydock_core::{Error, Result};
use std::path::PathBuf;

/// Keeps one cache directory per language under a base directory, shared
/// by every build of that language on this node.
pub struct DiskCache {
    base_dir: PathBuf,
}

impl DiskCache {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }
}

#[async_trait]
impl DependencyCacheService for DiskCache {
    fn cache_path(&self, language: &str) -> PathBuf {
        self.base_dir.join(language)
    }

    async fn initialize(&self, language: &str) -> Result<()> {
        tokio::fs::create_dir_all(self.cache_path(language))
            .await
            .map_err(|err| Error::Cache(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn cache_paths_are_per_language() {
        let cache = DiskCache::new(PathBuf::from("/var/cache/drydock"));
        assert_eq!(cache.cache_path("go"), PathBuf::from("/var/cache/drydock/go"));
        assert_eq!(
            cache.cache_path("rust"),
            PathBuf::from("/var/cache/drydock/rust")
        );
    }

    #[tokio::test]
    async fn initialize_creates_the_directory() {
        let base = std::env::temp_dir().join(format!("drydock-cache-{}", Uuid::now_v7()));
        let cache = DiskCache::new(base.clone());

        cache.initialize("go").await.unwrap();
        assert!(base.join("go").is_dir());

        // Idempotent.
        cache.initialize("go").await.unwrap();

        let _ = tokio::fs::remove_dir_all(&base).await;
    }
}
