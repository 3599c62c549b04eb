//! Connection supervision and command dispatch for gate controllers.
//!
//! This crate owns the lifecycle of controller connections and the path
//! commands take to reach them:
//!
//! - **[`Supervisor`]** — Reconnect loop around one controller channel.
//!   [`start()`](Supervisor::start) joins any previous run before the next
//!   one connects; [`stop()`](Supervisor::stop) returns once the worker has
//!   exited and closed its socket.
//!
//! - **[`CommandDispatcher`]** — Forwards fire-and-forget commands to the
//!   live channel, or drops them silently when there is none.
//!
//! - **[`ConfigListener`]** — Re-reads the [`DeviceStore`] on every
//!   [`ConfigChanged`] notification and (re)starts supervisors per the
//!   configured [`Routing`].
//!
//! - **[`RuleActionBridge`]** — The "open gate" / "close gate" actions a
//!   rule engine can trigger.
//!
//! - **[`Monitor`]** — Facade wiring all of the above for a host process.

pub mod actions;
pub mod command;
pub mod config;
pub mod dispatcher;
pub mod error;
mod fleet;
pub mod listener;
pub mod model;
pub mod monitor;
pub mod store;
pub mod supervisor;

// ── Primary re-exports ──────────────────────────────────────────────
pub use actions::{ActionDefinition, ActionElement, GateAction, RuleActionBridge};
pub use command::Command;
pub use config::{Routing, SupervisorConfig};
pub use dispatcher::{CommandDispatcher, Delivery, send_once};
pub use error::CoreError;
pub use listener::{ConfigChanged, ConfigListener, Reconciliation};
pub use model::{DeviceConfig, DeviceId, DeviceKind, DeviceRef};
pub use monitor::{ConnectionStatus, Monitor};
pub use store::{DeviceStore, MemoryStore};
pub use supervisor::{ConnectionState, Supervisor};

// Transport types consumers need to build a monitor.
pub use gatelink_api::{Channel, Connector, Endpoint, TcpChannel, TcpConnector};
