//! Engine configuration parsing.

use crate::{ConfigError, ConfigResult};
use kdl::{KdlDocument, KdlNode};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Engine-wide configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of worker loops.
    pub pool_size: usize,
    /// Capacity of the bounded intake queue.
    pub queue_size: usize,
    /// Per-job deadline, measured from the moment a worker dequeues the job.
    pub timeout: Duration,
    /// Retry budget for the source-sync phase.
    pub max_retries: u32,
    /// Initial backoff delay between retry attempts.
    pub retry_delay: Duration,
    /// Project build settings.
    pub build: BuildSettings,
    /// Filesystem locations.
    pub paths: PathSettings,
}

/// How the project-build phase runs.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    /// Language of the projects this engine builds.
    pub language: String,
    /// Build command and arguments, run inside the working tree.
    pub command: Vec<String>,
    /// Artifact path the build produces, relative to the working tree.
    pub artifact: String,
}

/// Filesystem locations the engine uses.
#[derive(Debug, Clone)]
pub struct PathSettings {
    /// Base directory for checked-out working trees.
    pub work_dir: PathBuf,
    /// Base directory for per-language dependency caches.
    pub cache_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pool_size: 4,
            queue_size: 64,
            timeout: Duration::from_secs(900),
            max_retries: 3,
            retry_delay: Duration::from_secs(2),
            build: BuildSettings::default(),
            paths: PathSettings::default(),
        }
    }
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            language: "go".to_string(),
            command: vec!["make".to_string(), "build".to_string()],
            artifact: "out".to_string(),
        }
    }
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("/var/lib/drydock/work"),
            cache_dir: PathBuf::from("/var/lib/drydock/cache"),
        }
    }
}

impl EngineConfig {
    /// Read, parse, and validate a configuration file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = parse_engine_config(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.pool_size < 1 {
            return Err(invalid("pool-size", "must be at least 1"));
        }
        if self.queue_size < 1 {
            return Err(invalid("queue-size", "must be at least 1"));
        }
        if self.timeout.is_zero() {
            return Err(invalid("timeout", "must be greater than zero"));
        }
        if self.max_retries < 1 {
            return Err(invalid("max-retries", "must be at least 1"));
        }
        if self.build.command.is_empty() {
            return Err(invalid("build command", "must not be empty"));
        }
        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
}

/// Parse an engine configuration from KDL text. Unknown nodes are ignored;
/// omitted fields keep their defaults.
pub fn parse_engine_config(kdl: &str) -> ConfigResult<EngineConfig> {
    let doc: KdlDocument = kdl.parse()?;
    let mut config = EngineConfig::default();

    for node in doc.nodes() {
        match node.name().value() {
            "engine" => parse_engine_node(node, &mut config)?,
            "build" => parse_build_node(node, &mut config.build),
            "paths" => parse_paths_node(node, &mut config.paths),
            _ => {} // Ignore unknown nodes
        }
    }

    Ok(config)
}

fn parse_engine_node(node: &KdlNode, config: &mut EngineConfig) -> ConfigResult<()> {
    let Some(children) = node.children() else {
        return Ok(());
    };
    for child in children.nodes() {
        let name = child.name().value();
        match name {
            "pool-size" => {
                config.pool_size = get_first_int_arg(child, name)? as usize;
            }
            "queue-size" => {
                config.queue_size = get_first_int_arg(child, name)? as usize;
            }
            "timeout" => {
                config.timeout = Duration::from_secs(get_first_int_arg(child, name)? as u64);
            }
            "max-retries" => {
                config.max_retries = get_first_int_arg(child, name)? as u32;
            }
            "retry-delay" => {
                config.retry_delay = Duration::from_secs(get_first_int_arg(child, name)? as u64);
            }
            _ => {}
        }
    }
    Ok(())
}

fn parse_build_node(node: &KdlNode, build: &mut BuildSettings) {
    let Some(children) = node.children() else {
        return;
    };
    for child in children.nodes() {
        match child.name().value() {
            "language" => {
                if let Some(lang) = get_first_string_arg(child) {
                    build.language = lang;
                }
            }
            "command" => {
                let command = get_all_string_args(child);
                if !command.is_empty() {
                    build.command = command;
                }
            }
            "artifact" => {
                if let Some(artifact) = get_first_string_arg(child) {
                    build.artifact = artifact;
                }
            }
            _ => {}
        }
    }
}

fn parse_paths_node(node: &KdlNode, paths: &mut PathSettings) {
    let Some(children) = node.children() else {
        return;
    };
    for child in children.nodes() {
        match child.name().value() {
            "work-dir" => {
                if let Some(dir) = get_first_string_arg(child) {
                    paths.work_dir = PathBuf::from(dir);
                }
            }
            "cache-dir" => {
                if let Some(dir) = get_first_string_arg(child) {
                    paths.cache_dir = PathBuf::from(dir);
                }
            }
            _ => {}
        }
    }
}

// Helper functions for extracting values from KDL nodes

fn get_first_string_arg(node: &KdlNode) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

fn get_all_string_args(node: &KdlNode) -> Vec<String> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .filter_map(|e| e.value().as_string())
        .map(|s| s.to_string())
        .collect()
}

fn get_first_int_arg(node: &KdlNode, field: &str) -> ConfigResult<i128> {
    let value = node
        .entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_integer())
        .ok_or_else(|| ConfigError::MissingField(field.to_string()))?;
    if value < 0 {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            message: format!("must not be negative, got {}", value),
        });
    }
    Ok(value)
}
