//! KDL configuration parsing for the Drydock build engine.
//!
//! The engine reads a single KDL document at startup; the resulting
//! [`EngineConfig`] is immutable and passed by reference into each
//! component's constructor.

pub mod engine;
pub mod error;

pub use engine::{BuildSettings, EngineConfig, PathSettings, parse_engine_config};
pub use error::{ConfigError, ConfigResult};
