// ── Core identity types ──
//
// DeviceId and DeviceKind identify configuration items in the host
// store. DeviceRef pairs them into the target reference the rule
// engine hands us.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ── DeviceId ────────────────────────────────────────────────────────

/// Stable identity of a configured controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(Uuid);

impl DeviceId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// A fresh random identity, for items created outside a host store.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DeviceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

impl From<Uuid> for DeviceId {
    fn from(u: Uuid) -> Self {
        Self(u)
    }
}

// ── DeviceKind ──────────────────────────────────────────────────────

/// Kind tag scoping configuration items and change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceKind(Uuid);

impl DeviceKind {
    /// The kind under which gate controllers are registered.
    pub const CONTROLLER: Self = Self(Uuid::from_u128(0x6eae_aaf5_7d37_4f3c_a386_f578_1479_6d39));

    pub const fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DeviceKind {
    fn default() -> Self {
        Self::CONTROLLER
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── DeviceRef ───────────────────────────────────────────────────────

/// A reference to one configured device, as supplied by the rule engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceRef {
    pub kind: DeviceKind,
    pub id: DeviceId,
}

impl DeviceRef {
    pub fn new(kind: DeviceKind, id: DeviceId) -> Self {
        Self { kind, id }
    }

    /// A reference to a device of the controller kind.
    pub fn controller(id: DeviceId) -> Self {
        Self::new(DeviceKind::CONTROLLER, id)
    }
}

impl fmt::Display for DeviceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}
