//! Runtime configuration for the exchange process: the exchange identity,
//! the backup journal location, the durable writer queue, and logging.
//!
//! Configuration is loaded from YAML with `${VAR}` / `$VAR` environment
//! substitution applied before parsing, then validated with all errors
//! accumulated rather than failing on the first one.

pub mod defaults;
pub mod parser;
pub mod substitution;
pub mod validator;

use serde::{Deserialize, Serialize};

pub use parser::{generate_default_config, load_config, save_config};
pub use validator::{ValidationError, validate};

/// Top-level runtime configuration for the exchange process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRuntimeConfig {
    pub exchange: ExchangeIdentity,
    #[serde(default)]
    pub backup: BackupConfig,
    #[serde(default)]
    pub durable_writer: DurableWriterConfig,
    #[serde(default)]
    pub broadcast: BroadcastConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Identifies the exchange instance in logs and metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeIdentity {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Where the append-only per-instrument backup journals are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    #[serde(default = "defaults::default_backup_directory")]
    pub directory: String,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            directory: defaults::default_backup_directory(),
        }
    }
}

/// Sizing and retry behavior of the queued durable writer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DurableWriterConfig {
    #[serde(default = "defaults::default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "defaults::default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "defaults::default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for DurableWriterConfig {
    fn default() -> Self {
        Self {
            queue_capacity: defaults::default_queue_capacity(),
            max_retries: defaults::default_max_retries(),
            retry_backoff_ms: defaults::default_retry_backoff_ms(),
        }
    }
}

/// Sizing of the lossy broadcast channel fanned out to subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastConfig {
    #[serde(default = "defaults::default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            channel_capacity: defaults::default_channel_capacity(),
        }
    }
}

/// Output format for structured logs, see [`observability::logging`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::default_log_format")]
    pub format: String,
    #[serde(default = "defaults::default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: defaults::default_log_format(),
            level: defaults::default_log_level(),
        }
    }
}
