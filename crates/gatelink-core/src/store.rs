// ── Device configuration store ──
//
// The host application owns device configuration; the core only reads
// it. `DeviceStore` is that read interface. `MemoryStore` is the
// in-process implementation the binary fills from its config file.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::error::CoreError;
use crate::model::{DeviceConfig, DeviceId, DeviceKind};

/// Read access to configured devices, scoped by kind.
///
/// Order matters: in [`Routing::FirstEnabled`](crate::Routing::FirstEnabled)
/// mode only the first listed device is supervised.
pub trait DeviceStore: Send + Sync + 'static {
    /// All configured devices of `kind`, in configuration order.
    fn list_devices(&self, kind: DeviceKind) -> Vec<DeviceConfig>;

    /// One device by identity.
    fn get_device(&self, kind: DeviceKind, id: DeviceId) -> Option<DeviceConfig> {
        self.list_devices(kind).into_iter().find(|d| d.id == id)
    }

    /// Resolve a device by id or case-insensitive name. With no
    /// identifier, the first active device is picked.
    fn resolve(&self, kind: DeviceKind, identifier: Option<&str>) -> Result<DeviceConfig, CoreError> {
        let devices = self.list_devices(kind);

        let Some(identifier) = identifier.map(str::trim) else {
            return devices
                .into_iter()
                .find(DeviceConfig::is_active)
                .ok_or_else(|| CoreError::DeviceNotFound {
                    identifier: "(any active controller)".into(),
                });
        };

        let by_id = identifier.parse::<DeviceId>().ok();
        let device = devices
            .into_iter()
            .find(|d| Some(d.id) == by_id || d.name.eq_ignore_ascii_case(identifier))
            .ok_or_else(|| CoreError::DeviceNotFound {
                identifier: identifier.into(),
            })?;

        if device.is_active() {
            Ok(device)
        } else {
            Err(CoreError::DeviceInactive { name: device.name })
        }
    }
}

impl<S: DeviceStore + ?Sized> DeviceStore for Arc<S> {
    fn list_devices(&self, kind: DeviceKind) -> Vec<DeviceConfig> {
        (**self).list_devices(kind)
    }

    fn get_device(&self, kind: DeviceKind, id: DeviceId) -> Option<DeviceConfig> {
        (**self).get_device(kind, id)
    }
}

/// Lock-free in-memory store for a single device kind.
///
/// Readers get a consistent snapshot; writers swap in a new list
/// atomically, so a reload never exposes a half-updated configuration.
pub struct MemoryStore {
    kind: DeviceKind,
    devices: ArcSwap<Vec<DeviceConfig>>,
}

impl MemoryStore {
    pub fn new(kind: DeviceKind) -> Self {
        Self {
            kind,
            devices: ArcSwap::from_pointee(Vec::new()),
        }
    }

    pub fn with_devices(kind: DeviceKind, devices: Vec<DeviceConfig>) -> Self {
        Self {
            kind,
            devices: ArcSwap::from_pointee(devices),
        }
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    /// Current snapshot (cheap `Arc` clone).
    pub fn snapshot(&self) -> Arc<Vec<DeviceConfig>> {
        self.devices.load_full()
    }

    /// Replace the whole device list. Returns `true` if it changed.
    pub fn replace(&self, devices: Vec<DeviceConfig>) -> bool {
        let next = Arc::new(devices);
        let previous = self.devices.swap(Arc::clone(&next));
        previous != next
    }

    /// Insert a device, or update it in place keeping its position.
    pub fn upsert(&self, device: DeviceConfig) {
        self.devices.rcu(|current| {
            let mut next = Vec::clone(current);
            match next.iter_mut().find(|d| d.id == device.id) {
                Some(slot) => *slot = device.clone(),
                None => next.push(device.clone()),
            }
            next
        });
    }

    /// Remove a device. Returns the removed entry if it existed.
    pub fn remove(&self, id: DeviceId) -> Option<DeviceConfig> {
        let found = self.devices.load().iter().find(|d| d.id == id).cloned();
        if found.is_some() {
            self.devices.rcu(|current| {
                current
                    .iter()
                    .filter(|d| d.id != id)
                    .cloned()
                    .collect::<Vec<_>>()
            });
        }
        found
    }
}

impl DeviceStore for MemoryStore {
    fn list_devices(&self, kind: DeviceKind) -> Vec<DeviceConfig> {
        if kind != self.kind {
            return Vec::new();
        }
        Vec::clone(&self.devices.load())
    }
}
