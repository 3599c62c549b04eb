// ── Domain model ──
//
// Identity types and device configuration shared by every component.

pub mod device;
pub mod entity_id;

pub use device::DeviceConfig;
pub use entity_id::{DeviceId, DeviceKind, DeviceRef};
