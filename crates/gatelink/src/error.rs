//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use gatelink_config::ConfigError;
use gatelink_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to controller at {addr}")]
    #[diagnostic(
        code(gatelink::connection_failed),
        help(
            "Check that the controller is powered and reachable.\n\
             Address: {addr}\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { addr: String, reason: String },

    #[error("Controller closed the connection")]
    #[diagnostic(code(gatelink::disconnected))]
    Disconnected,

    // ── Devices & actions ────────────────────────────────────────────
    #[error("Controller '{identifier}' not found")]
    #[diagnostic(
        code(gatelink::not_found),
        help("Run: gatelink devices to see configured controllers")
    )]
    DeviceNotFound { identifier: String },

    #[error("Controller '{name}' is disabled or has no address")]
    #[diagnostic(
        code(gatelink::inactive),
        help("Set enabled = true and an ip_address for it in the config file.")
    )]
    DeviceInactive { name: String },

    #[error("Unknown action '{id}'")]
    #[diagnostic(
        code(gatelink::unknown_action),
        help("Run: gatelink actions to see available actions")
    )]
    UnknownAction { id: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(gatelink::validation))]
    Validation { field: String, reason: String },

    #[error("Configuration file already exists")]
    #[diagnostic(
        code(gatelink::config_exists),
        help("Use --force to overwrite it.\nPath: {path}")
    )]
    ConfigExists { path: String },

    #[error(transparent)]
    #[diagnostic(code(gatelink::config))]
    Config(Box<ConfigError>),

    #[error("Could not render configuration: {message}")]
    #[diagnostic(code(gatelink::render))]
    Render { message: String },

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Disconnected => exit_code::CONNECTION,
            Self::DeviceNotFound { .. } | Self::UnknownAction { .. } => exit_code::NOT_FOUND,
            Self::ConfigExists { .. } => exit_code::CONFLICT,
            Self::DeviceInactive { .. } | Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config(Box::new(other)),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { addr, reason } => {
                CliError::ConnectionFailed { addr, reason }
            }
            CoreError::ControllerDisconnected => CliError::Disconnected,
            CoreError::DeviceNotFound { identifier } => CliError::DeviceNotFound { identifier },
            CoreError::DeviceInactive { name } => CliError::DeviceInactive { name },
            CoreError::UnknownAction { id } => CliError::UnknownAction { id },
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}
