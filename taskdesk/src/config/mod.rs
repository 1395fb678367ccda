//! Configuration for the `taskdesk` client.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/taskdesk/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::PathBuf;
use std::time::Duration;

use taskdesk_store::memory::DEFAULT_OWNER;

use crate::sync::SyncConfig;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    store: StoreFileConfig,
    sync: SyncFileConfig,
}

/// `[store]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct StoreFileConfig {
    owner_id: Option<String>,
    latency_ms: Option<u64>,
    seed_demo: Option<bool>,
}

/// `[sync]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct SyncFileConfig {
    store_timeout_ms: Option<u64>,
    event_buffer: Option<usize>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Owner stamped on tasks the store creates.
    pub owner_id: String,
    /// Artificial delay on every store call.
    pub store_latency: Duration,
    /// Whether the store starts with the demo tasks.
    pub seed_demo: bool,
    /// Synchronizer settings.
    pub sync: SyncConfig,
    /// Log level filter.
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            owner_id: DEFAULT_OWNER.to_string(),
            store_latency: Duration::ZERO,
            seed_demo: true,
            sync: SyncConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an
    /// error. Otherwise the default path is tried and silently ignored if
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a config file exists but cannot be read
    /// or parsed, or if an explicit `--config` path is missing.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Priority: CLI > file > default.
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        // A zero timeout in the file disables the bound.
        let store_timeout = match cli.store_timeout_ms.or(file.sync.store_timeout_ms) {
            Some(0) => None,
            Some(ms) => Some(Duration::from_millis(ms)),
            None => defaults.sync.store_timeout,
        };

        Self {
            owner_id: cli
                .owner
                .clone()
                .or_else(|| file.store.owner_id.clone())
                .unwrap_or(defaults.owner_id),
            store_latency: cli
                .latency_ms
                .or(file.store.latency_ms)
                .map_or(defaults.store_latency, Duration::from_millis),
            seed_demo: !cli.no_seed && file.store.seed_demo.unwrap_or(defaults.seed_demo),
            sync: SyncConfig {
                store_timeout,
                event_buffer: file
                    .sync
                    .event_buffer
                    .unwrap_or(defaults.sync.event_buffer),
            },
            log_level: if cli.log_level.is_empty() {
                defaults.log_level
            } else {
                cli.log_level.clone()
            },
        }
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Task tracking client")]
pub struct CliArgs {
    /// Path to config file (default: `~/.config/taskdesk/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Owner id stamped on created tasks.
    #[arg(long, env = "TASKDESK_OWNER")]
    pub owner: Option<String>,

    /// Artificial store latency in milliseconds.
    #[arg(long)]
    pub latency_ms: Option<u64>,

    /// Start with an empty store instead of the demo tasks.
    #[arg(long)]
    pub no_seed: bool,

    /// Store call timeout in milliseconds (0 disables it).
    #[arg(long)]
    pub store_timeout_ms: Option<u64>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TASKDESK_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/taskdesk.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist. Otherwise the default
/// path is tried and a missing file is treated as empty config.
fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ConfigFile, ConfigError> {
    if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    }

    let Some(config_dir) = dirs::config_dir() else {
        return Ok(ConfigFile::default());
    };
    let path = config_dir.join("taskdesk").join("config.toml");

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
