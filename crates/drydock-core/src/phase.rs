//! Pipeline phase identifiers.

use serde::{Deserialize, Serialize};

/// One of the three fixed pipeline phases.
///
/// Phases always execute in declaration order: source sync produces the
/// working tree the project build runs in, and the project build produces
/// the artifact the image build packages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildPhase {
    SourceSync,
    ProjectBuild,
    ImageBuild,
}

impl BuildPhase {
    /// All phases, in execution order.
    pub const ALL: [BuildPhase; 3] = [
        BuildPhase::SourceSync,
        BuildPhase::ProjectBuild,
        BuildPhase::ImageBuild,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildPhase::SourceSync => "source_sync",
            BuildPhase::ProjectBuild => "project_build",
            BuildPhase::ImageBuild => "image_build",
        }
    }
}

impl std::fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
