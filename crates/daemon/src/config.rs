//! Daemon configuration
//!
//! Layers, lowest precedence first: built-in defaults, optional TOML file,
//! `WAITROOM_*` environment variables (`__` separates nesting levels,
//! e.g. `WAITROOM_SCHEDULER__ENABLED=true`).

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use waitroom_core::application::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_INITIAL_DELAY, DEFAULT_INTERVAL, DEFAULT_SCAN_PAGE_SIZE,
};
use waitroom_core::application::SchedulerConfig;
use waitroom_core::error::{AppError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "~/.waitroom/waitroom.toml";
const DEFAULT_STORE_URL: &str = "sqlite://~/.waitroom/waitroom.db";
const DEFAULT_STORE_MAX_CONNECTIONS: i64 = 10;
const DEFAULT_KEY_PREFIX: &str = "users:queue";
const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: i64 = 9528;
const ENV_PREFIX: &str = "WAITROOM";

#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    pub store: StoreSettings,
    pub rpc: RpcSettings,
    pub scheduler: SchedulerSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    pub url: String,
    pub max_connections: u32,
    pub key_prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSettings {
    pub enabled: bool,
    pub initial_delay_ms: u64,
    pub interval_ms: u64,
    pub batch_size: u64,
    pub scan_page_size: usize,
}

impl SchedulerSettings {
    pub fn to_scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            enabled: self.enabled,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            interval: Duration::from_millis(self.interval_ms),
            batch_size: self.batch_size,
            scan_page_size: self.scan_page_size,
        }
    }
}

impl DaemonConfig {
    /// Store url with a leading `~` in the path expanded
    pub fn expanded_store_url(&self) -> String {
        match self.store.url.strip_prefix("sqlite://") {
            Some(path) => format!("sqlite://{}", shellexpand::tilde(path)),
            None => shellexpand::tilde(&self.store.url).into_owned(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.scheduler.interval_ms == 0 {
            return Err(AppError::Config(
                "scheduler.interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.scheduler.scan_page_size == 0 {
            return Err(AppError::Config(
                "scheduler.scan_page_size must be greater than 0".to_string(),
            ));
        }
        if self.store.key_prefix.is_empty() {
            return Err(AppError::Config("store.key_prefix must not be empty".to_string()));
        }
        Ok(())
    }
}

fn map_config_error(err: ConfigError) -> AppError {
    AppError::Config(err.to_string())
}

/// Load configuration from `path` (if it exists) and the process environment
pub fn load(path: &Path) -> Result<DaemonConfig> {
    load_with_env(path, None)
}

/// Same as [`load`], reading variables from `env` instead of the process when given
pub fn load_with_env(path: &Path, env: Option<HashMap<String, String>>) -> Result<DaemonConfig> {
    let defaults = Config::builder()
        .set_default("store.url", DEFAULT_STORE_URL)
        .and_then(|b| b.set_default("store.max_connections", DEFAULT_STORE_MAX_CONNECTIONS))
        .and_then(|b| b.set_default("store.key_prefix", DEFAULT_KEY_PREFIX))
        .and_then(|b| b.set_default("rpc.host", DEFAULT_RPC_HOST))
        .and_then(|b| b.set_default("rpc.port", DEFAULT_RPC_PORT))
        .and_then(|b| b.set_default("scheduler.enabled", false))
        .and_then(|b| {
            b.set_default(
                "scheduler.initial_delay_ms",
                DEFAULT_INITIAL_DELAY.as_millis() as i64,
            )
        })
        .and_then(|b| b.set_default("scheduler.interval_ms", DEFAULT_INTERVAL.as_millis() as i64))
        .and_then(|b| b.set_default("scheduler.batch_size", DEFAULT_BATCH_SIZE as i64))
        .and_then(|b| b.set_default("scheduler.scan_page_size", DEFAULT_SCAN_PAGE_SIZE as i64))
        .map_err(map_config_error)?;

    let environment = Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .source(env);

    let config: DaemonConfig = defaults
        .add_source(File::from(path).format(FileFormat::Toml).required(false))
        .add_source(environment)
        .build()
        .and_then(|c| c.try_deserialize())
        .map_err(map_config_error)?;

    config.validate()?;
    Ok(config)
}
