// ── Runtime supervision configuration ──
//
// These types describe *how* controllers are supervised: timeouts, the
// reconnect delay, and how many controllers are kept connected. They
// never touch disk. The binary builds them from its config file and
// hands them in.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use gatelink_api::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_RECEIVE_TIMEOUT, READ_CHUNK_SIZE};

/// How configured devices map to supervised connections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Routing {
    /// Supervise only the first configured device. Commands go to its
    /// connection whatever device they target.
    #[default]
    FirstEnabled,
    /// Supervise every enabled device independently, keyed by identity.
    /// Commands go to the target's own connection.
    PerDevice,
}

/// Tuning for a connection supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// Upper bound on one connect attempt.
    pub connect_timeout: Duration,
    /// How long each receive waits before the worker's idle tick.
    pub receive_timeout: Duration,
    /// Wait between failed connect attempts. Interrupted by stop.
    pub retry_delay: Duration,
    /// Size of the receive buffer.
    pub read_chunk: usize,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            receive_timeout: DEFAULT_RECEIVE_TIMEOUT,
            retry_delay: Duration::from_secs(10),
            read_chunk: READ_CHUNK_SIZE,
        }
    }
}
