//! Repository descriptors for build jobs.

use serde::{Deserialize, Serialize};

/// A Git repository a build job checks out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    /// Clone URL.
    pub url: String,
    /// Repository name (e.g. "svc").
    pub name: String,
    /// Repository owner (e.g. "acme").
    pub owner: String,
    /// Branch the job builds from.
    #[serde(default)]
    pub branch: String,
}

impl RepositoryInfo {
    pub fn new(
        url: impl Into<String>,
        owner: impl Into<String>,
        name: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            owner: owner.into(),
            branch: branch.into(),
        }
    }

    /// `owner/name` when both parts are present, empty otherwise.
    pub fn full_name(&self) -> String {
        if self.owner.is_empty() || self.name.is_empty() {
            return String::new();
        }
        format!("{}/{}", self.owner, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_joins_owner_and_name() {
        let repo = RepositoryInfo::new("https://x/acme/svc.git", "acme", "svc", "main");
        assert_eq!(repo.full_name(), "acme/svc");
    }

    #[test]
    fn full_name_is_empty_when_a_part_is_missing() {
        let repo = RepositoryInfo::new("https://x/acme/svc.git", "", "svc", "main");
        assert_eq!(repo.full_name(), "");

        let repo = RepositoryInfo::new("https://x/acme/svc.git", "acme", "", "main");
        assert_eq!(repo.full_name(), "");
    }
}
