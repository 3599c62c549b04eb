//! Configuration file for the gatelink binary.
//!
//! One TOML file holds the supervisor tuning, the routing mode and the
//! list of controllers. It is layered defaults < file < `GATELINK_*`
//! environment and translated into `gatelink_core` types; the core
//! itself never reads files.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use gatelink_core::{DeviceConfig, DeviceKind, MemoryStore, Routing, SupervisorConfig};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// How configured controllers map to connections.
    #[serde(default)]
    pub routing: Routing,

    /// CLI defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Connection supervisor tuning.
    #[serde(default)]
    pub supervisor: SupervisorSection,

    /// Configured controllers, in priority order.
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// How often `gatelink run` checks the file for changes, in seconds.
    /// Zero disables polling.
    #[serde(default = "default_reload_interval")]
    pub reload_interval_secs: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            reload_interval_secs: default_reload_interval(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_reload_interval() -> u64 {
    5
}

/// `[supervisor]` section. Durations are plain integers so the file
/// stays hand-editable.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SupervisorSection {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_receive_timeout")]
    pub receive_timeout_ms: u64,

    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,

    #[serde(default = "default_read_chunk")]
    pub read_chunk: usize,
}

impl Default for SupervisorSection {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            receive_timeout_ms: default_receive_timeout(),
            retry_delay_secs: default_retry_delay(),
            read_chunk: default_read_chunk(),
        }
    }
}

fn default_connect_timeout() -> u64 {
    SupervisorConfig::default().connect_timeout.as_secs()
}
fn default_receive_timeout() -> u64 {
    u64::try_from(SupervisorConfig::default().receive_timeout.as_millis()).unwrap_or(1000)
}
fn default_retry_delay() -> u64 {
    SupervisorConfig::default().retry_delay.as_secs()
}
fn default_read_chunk() -> usize {
    SupervisorConfig::default().read_chunk
}

impl SupervisorSection {
    /// Validate and convert to the core tuning type.
    pub fn to_supervisor_config(&self) -> Result<SupervisorConfig, ConfigError> {
        if self.receive_timeout_ms == 0 {
            return Err(ConfigError::Validation {
                field: "supervisor.receive_timeout_ms".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if self.read_chunk == 0 {
            return Err(ConfigError::Validation {
                field: "supervisor.read_chunk".into(),
                reason: "must be greater than zero".into(),
            });
        }

        Ok(SupervisorConfig {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs.max(1)),
            receive_timeout: Duration::from_millis(self.receive_timeout_ms),
            retry_delay: Duration::from_secs(self.retry_delay_secs),
            read_chunk: self.read_chunk,
        })
    }
}

impl Config {
    /// Check the device list for mistakes the core would only log.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for device in &self.devices {
            if !seen.insert(device.id) {
                return Err(ConfigError::Validation {
                    field: "devices.id".into(),
                    reason: format!("duplicate id {} ('{}')", device.id, device.name),
                });
            }
            if device.port == 0 {
                return Err(ConfigError::Validation {
                    field: format!("devices.{}.port", device.name),
                    reason: "must be between 1 and 65535".into(),
                });
            }
        }
        self.supervisor.to_supervisor_config().map(|_| ())
    }

    /// A store pre-filled with the configured controllers.
    pub fn device_store(&self) -> MemoryStore {
        MemoryStore::with_devices(DeviceKind::CONTROLLER, self.devices.clone())
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "gatelink", "gatelink").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("gatelink");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from `path` + environment.
///
/// A missing file is not an error; defaults apply. Nested keys use a
/// double underscore: `GATELINK_SUPERVISOR__RETRY_DELAY_SECS=30`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("GATELINK_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if it can't be read.
pub fn load_config_or_default(path: &Path) -> Config {
    load_config(path).unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
