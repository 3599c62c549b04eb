use std::io;
use std::time::Duration;

use thiserror::Error;

/// Top-level error type for the `gatelink-api` crate.
///
/// Covers every failure mode of a controller channel: connecting,
/// receiving, sending, and closing. `gatelink-core` decides which of
/// these are retried and which are merely logged.
#[derive(Debug, Error)]
pub enum Error {
    // ── Connection ──────────────────────────────────────────────────
    /// Host unreachable, connection refused, DNS failure, or connect timeout.
    #[error("Cannot connect to {addr}: {reason}")]
    Connect { addr: String, reason: String },

    /// The configured host/port pair could not be turned into an address.
    #[error("Invalid controller address '{0}'")]
    InvalidAddress(String),

    // ── Receive ─────────────────────────────────────────────────────
    /// No bytes arrived within the per-call receive timeout.
    ///
    /// This is the normal idle tick of a healthy channel, not a failure.
    #[error("Receive timed out after {}ms", .0.as_millis())]
    ReceiveTimeout(Duration),

    // ── Transport ───────────────────────────────────────────────────
    /// The peer closed the connection, or the channel was closed locally.
    #[error("Channel closed")]
    Closed,

    /// Reset, broken pipe, or any other socket-level failure.
    #[error("Transport error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Returns `true` for the receive-timeout tick.
    ///
    /// Callers must keep looping on a timeout; every other error
    /// invalidates the channel.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::ReceiveTimeout(_) => true,
            Self::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receive_timeout_is_timeout() {
        let err = Error::ReceiveTimeout(Duration::from_millis(1000));
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "Receive timed out after 1000ms");
    }

    #[test]
    fn io_timed_out_is_timeout() {
        let err = Error::from(io::Error::from(io::ErrorKind::TimedOut));
        assert!(err.is_timeout());
    }

    #[test]
    fn reset_and_eof_are_not_timeouts() {
        assert!(!Error::from(io::Error::from(io::ErrorKind::ConnectionReset)).is_timeout());
        assert!(!Error::Closed.is_timeout());
        assert!(
            !Error::Connect {
                addr: "10.0.0.5:4567".into(),
                reason: "refused".into(),
            }
            .is_timeout()
        );
    }
}
