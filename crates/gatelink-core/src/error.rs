// ── Core error types ──
//
// Errors surfaced by gatelink-core. Supervision itself never fails
// outward: connect and transport errors are retried inside the worker.
// What remains are lookups against the configuration store and the
// one-shot paths used by the CLI.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to controller at {addr}: {reason}")]
    ConnectionFailed { addr: String, reason: String },

    #[error("Controller disconnected")]
    ControllerDisconnected,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Device not found: {identifier}")]
    DeviceNotFound { identifier: String },

    #[error("Device '{name}' is not active (disabled or missing address)")]
    DeviceInactive { name: String },

    #[error("Unknown rule action: {id}")]
    UnknownAction { id: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<gatelink_api::Error> for CoreError {
    fn from(err: gatelink_api::Error) -> Self {
        match err {
            gatelink_api::Error::Connect { addr, reason } => {
                CoreError::ConnectionFailed { addr, reason }
            }
            gatelink_api::Error::InvalidAddress(addr) => CoreError::Config {
                message: format!("invalid controller address '{addr}'"),
            },
            gatelink_api::Error::Closed => CoreError::ControllerDisconnected,
            e @ (gatelink_api::Error::ReceiveTimeout(_) | gatelink_api::Error::Io(_)) => {
                CoreError::ConnectionFailed {
                    addr: String::new(),
                    reason: e.to_string(),
                }
            }
        }
    }
}
