//! Drydock build engine daemon.

use clap::Parser;
use drydock_bus::{MemoryBus, MessageBus};
use drydock_config::EngineConfig;
use drydock_scheduler::{BuildOrchestrator, WorkerPool};
use drydock_services::{CommandBuild, DiskCache, DockerBuild, GitSync};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "drydock-server", about = "CI/CD build-orchestration engine")]
struct Args {
    /// Path to the KDL configuration file; defaults apply when omitted.
    #[arg(long, env = "DRYDOCK_CONFIG")]
    config: Option<PathBuf>,

    /// Seconds to wait for in-flight builds during shutdown.
    #[arg(long, default_value_t = 30)]
    shutdown_grace: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    info!(
        pool_size = config.pool_size,
        queue_size = config.queue_size,
        timeout_secs = config.timeout.as_secs(),
        "starting drydock"
    );

    let bus: Arc<dyn MessageBus> = Arc::new(MemoryBus::new());

    let orchestrator = Arc::new(BuildOrchestrator::new(
        &config,
        Arc::new(GitSync::new(config.paths.work_dir.clone())),
        Arc::new(CommandBuild::new()),
        Arc::new(DockerBuild::new()),
        Arc::new(DiskCache::new(config.paths.cache_dir.clone())),
    ));

    let pool = WorkerPool::new(config, bus.clone(), orchestrator);
    pool.start().await?;
    info!("drydock ready");

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    pool.shutdown(Duration::from_secs(args.shutdown_grace)).await;

    Ok(())
}
