//! Waitroom - Main Entry Point
//! JSON-RPC Server + Promotion Scheduler

mod config;

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Import workspace crates
use waitroom_api_rpc::{RpcHandler, RpcServer, RpcServerConfig};
use waitroom_core::application::{shutdown_channel, AdmissionQueue, PromotionScheduler};
use waitroom_core::domain::QueueKeyspace;
use waitroom_core::port::time_provider::SystemTimeProvider;
use waitroom_core::port::OrderedSetStore;
use waitroom_infra_sqlite::{create_pool, run_migrations, SqliteOrderedSetStore};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

fn init_logging() {
    let log_format = std::env::var("WAITROOM_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("waitroom=info"));

    match log_format.as_str() {
        "json" => {
            // Production: JSON structured logging
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            // Development: Pretty formatting with colors
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }
}

/// Make sure the directory of a file-backed SQLite store exists
fn ensure_store_dir(store_url: &str) -> Result<()> {
    let Some(path) = store_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if let Some(parent) = PathBuf::from(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create store directory {}", parent.display()))?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging
    init_logging();
    info!("Waitroom v{} starting...", VERSION);

    // 2. Load configuration
    let config_path = std::env::var("WAITROOM_CONFIG")
        .unwrap_or_else(|_| shellexpand::tilde(config::DEFAULT_CONFIG_PATH).into_owned());
    let cfg = config::load(&PathBuf::from(&config_path))
        .with_context(|| format!("Failed to load configuration ({})", config_path))?;

    // 3. Initialize store
    let store_url = cfg.expanded_store_url();
    info!(store_url = %store_url, "Initializing ordered set store...");
    ensure_store_dir(&store_url)?;

    let pool = create_pool(&store_url, cfg.store.max_connections)
        .await
        .context("Store pool creation failed")?;
    run_migrations(&pool).await.context("Migration failed")?;

    // 4. Setup dependencies (DI wiring)
    let store: Arc<dyn OrderedSetStore> = Arc::new(SqliteOrderedSetStore::new(pool));
    let admission = Arc::new(AdmissionQueue::new(
        store.clone(),
        QueueKeyspace::new(cfg.store.key_prefix.clone()),
        Arc::new(SystemTimeProvider),
    ));
    let scheduler = Arc::new(PromotionScheduler::new(
        admission.clone(),
        store,
        cfg.scheduler.to_scheduler_config(),
    ));

    // 5. Start JSON-RPC server
    let rpc_config = RpcServerConfig {
        host: cfg.rpc.host.clone(),
        port: cfg.rpc.port,
    };
    let rpc_server = RpcServer::new(rpc_config, RpcHandler::new(admission, scheduler.clone()));
    let (rpc_addr, rpc_handle) = rpc_server
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    // 6. Start promotion scheduler
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let scheduler_task = scheduler.clone();
    let scheduler_handle = tokio::spawn(async move {
        scheduler_task.run(shutdown_rx).await;
    });

    info!(rpc_addr = %rpc_addr, "System ready. Press Ctrl+C to shutdown");

    // 7. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Exiting gracefully...");

    // 8. Graceful shutdown (an in-flight tick finishes first)
    shutdown_tx.shutdown();
    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    if tokio::time::timeout(SHUTDOWN_TIMEOUT, scheduler_handle)
        .await
        .is_err()
    {
        tracing::warn!("Promotion scheduler did not stop within timeout");
    }

    info!("Shutdown complete.");
    Ok(())
}
