//! Local phase-service implementations for the Drydock build engine.
//!
//! These back the collaborator traits with CLI tools on the host:
//! `git` for source sync, a configured build command for the project
//! build, and `docker` for the image build. Suitable for a single-node
//! deployment; a distributed setup would swap in its own implementations.

pub mod build;
pub mod cache;
pub mod docker;
pub mod git;

pub use build::CommandBuild;
pub use cache::DiskCache;
pub use docker::DockerBuild;
pub use git::GitSync;
