// ── Device domain types ──

use serde::{Deserialize, Serialize};

use gatelink_api::{DEFAULT_PORT, Endpoint};

use super::entity_id::DeviceId;

/// Configuration of one controller, as kept by the host configuration store.
///
/// Read-only to the core: supervisors bind to a snapshot and restart
/// when a newer one arrives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub id: DeviceId,
    pub name: String,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl DeviceConfig {
    pub fn new(id: DeviceId, name: impl Into<String>, ip_address: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ip_address: ip_address.into(),
            enabled: true,
            port: DEFAULT_PORT,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Whether this entry should have a live connection: enabled and
    /// carrying a non-blank address.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.ip_address.trim().is_empty()
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.ip_address.trim(), self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> DeviceConfig {
        DeviceConfig::new(DeviceId::generate(), "Gate1", "10.0.0.5")
    }

    #[test]
    fn enabled_with_address_is_active() {
        assert!(gate().is_active());
    }

    #[test]
    fn disabled_is_not_active() {
        assert!(!gate().with_enabled(false).is_active());
    }

    #[test]
    fn blank_address_is_not_active() {
        let mut cfg = gate();
        cfg.ip_address = "   ".into();
        assert!(!cfg.is_active());
    }

    #[test]
    fn endpoint_uses_default_port_and_trims() {
        let mut cfg = gate();
        cfg.ip_address = " 10.0.0.5 ".into();
        assert_eq!(cfg.endpoint().to_string(), "10.0.0.5:4567");
        assert_eq!(cfg.with_port(9000).endpoint().port, 9000);
    }
}
