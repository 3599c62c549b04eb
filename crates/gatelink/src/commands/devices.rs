//! Device command handlers.

use serde::Serialize;
use tabled::Tabled;

use gatelink_core::{DeviceConfig, Routing};

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Enabled")]
    enabled: String,
    #[tabled(rename = "Supervised")]
    supervised: String,
}

/// A configured device plus whether `run` would keep it connected.
#[derive(Serialize)]
struct DeviceView {
    #[serde(flatten)]
    device: DeviceConfig,
    supervised: bool,
}

impl DeviceView {
    fn row(&self, color: bool) -> DeviceRow {
        let d = &self.device;
        DeviceRow {
            id: d.id.to_string(),
            name: d.name.clone(),
            address: if d.ip_address.trim().is_empty() {
                "-".into()
            } else {
                d.endpoint().to_string()
            },
            enabled: output::yes_no(d.enabled, color),
            supervised: output::yes_no(self.supervised, color),
        }
    }
}

fn views(devices: Vec<DeviceConfig>, routing: Routing) -> Vec<DeviceView> {
    devices
        .into_iter()
        .enumerate()
        .map(|(index, device)| {
            let supervised = match routing {
                Routing::FirstEnabled => index == 0 && device.is_active(),
                Routing::PerDevice => device.is_active(),
            };
            DeviceView { device, supervised }
        })
        .collect()
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let color = output::should_color(&global.color);
    let data = views(cfg.devices, cfg.routing);

    let out = output::render_list(
        &global.output,
        &data,
        |v| v.row(color),
        |v| v.device.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use gatelink_core::DeviceId;

    use super::*;

    fn gate(name: &str, enabled: bool) -> DeviceConfig {
        DeviceConfig::new(DeviceId::generate(), name, "10.0.0.5").with_enabled(enabled)
    }

    #[test]
    fn first_enabled_supervises_only_an_active_head() {
        let marks: Vec<_> = views(vec![gate("A", true), gate("B", true)], Routing::FirstEnabled)
            .iter()
            .map(|v| v.supervised)
            .collect();
        assert_eq!(marks, vec![true, false]);

        let marks: Vec<_> = views(vec![gate("A", false), gate("B", true)], Routing::FirstEnabled)
            .iter()
            .map(|v| v.supervised)
            .collect();
        assert_eq!(marks, vec![false, false]);
    }

    #[test]
    fn per_device_supervises_every_active_entry() {
        let marks: Vec<_> = views(vec![gate("A", false), gate("B", true)], Routing::PerDevice)
            .iter()
            .map(|v| v.supervised)
            .collect();
        assert_eq!(marks, vec![false, true]);
    }
}
