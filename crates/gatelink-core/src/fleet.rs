// ── Supervisor registry ──
//
// Maps configured devices to supervisors according to the routing
// mode. In `FirstEnabled` mode there is exactly one supervisor and
// every lookup resolves to it. In `PerDevice` mode supervisors are
// created on demand and keyed by device identity.

use std::sync::Arc;

use dashmap::DashMap;
use gatelink_api::Connector;

use crate::config::{Routing, SupervisorConfig};
use crate::model::{DeviceId, DeviceRef};
use crate::supervisor::Supervisor;

pub(crate) enum Fleet<C: Connector> {
    Single(Arc<Supervisor<C>>),
    PerDevice {
        connector: Arc<C>,
        tuning: SupervisorConfig,
        by_id: DashMap<DeviceId, Arc<Supervisor<C>>>,
    },
}

impl<C: Connector> Fleet<C> {
    pub(crate) fn new(routing: Routing, connector: Arc<C>, tuning: SupervisorConfig) -> Self {
        match routing {
            Routing::FirstEnabled => Self::Single(Arc::new(Supervisor::new(connector, tuning))),
            Routing::PerDevice => Self::PerDevice {
                connector,
                tuning,
                by_id: DashMap::new(),
            },
        }
    }

    pub(crate) fn routing(&self) -> Routing {
        match self {
            Self::Single(_) => Routing::FirstEnabled,
            Self::PerDevice { .. } => Routing::PerDevice,
        }
    }

    /// The supervisor that should carry commands for `target`.
    pub(crate) fn route(&self, target: &DeviceRef) -> Option<Arc<Supervisor<C>>> {
        match self {
            Self::Single(supervisor) => Some(Arc::clone(supervisor)),
            Self::PerDevice { by_id, .. } => by_id.get(&target.id).map(|r| Arc::clone(r.value())),
        }
    }

    /// Fetch the supervisor for `id`, creating it in `PerDevice` mode.
    pub(crate) fn get_or_insert(&self, id: DeviceId) -> Arc<Supervisor<C>> {
        match self {
            Self::Single(supervisor) => Arc::clone(supervisor),
            Self::PerDevice {
                connector,
                tuning,
                by_id,
            } => Arc::clone(
                by_id
                    .entry(id)
                    .or_insert_with(|| {
                        Arc::new(Supervisor::new(Arc::clone(connector), tuning.clone()))
                    })
                    .value(),
            ),
        }
    }

    /// Detach the supervisor for `id`. Always `None` in `Single` mode.
    pub(crate) fn remove(&self, id: DeviceId) -> Option<Arc<Supervisor<C>>> {
        match self {
            Self::Single(_) => None,
            Self::PerDevice { by_id, .. } => by_id.remove(&id).map(|(_, s)| s),
        }
    }

    /// Identities with a registered supervisor (`PerDevice` only).
    pub(crate) fn ids(&self) -> Vec<DeviceId> {
        match self {
            Self::Single(_) => Vec::new(),
            Self::PerDevice { by_id, .. } => by_id.iter().map(|r| *r.key()).collect(),
        }
    }

    /// Every supervisor, in no particular order.
    pub(crate) fn all(&self) -> Vec<Arc<Supervisor<C>>> {
        match self {
            Self::Single(supervisor) => vec![Arc::clone(supervisor)],
            Self::PerDevice { by_id, .. } => by_id.iter().map(|r| Arc::clone(r.value())).collect(),
        }
    }

    /// Stop every supervisor and wait for all workers to exit.
    pub(crate) async fn shutdown(&self) {
        // Collect first: DashMap guards must not live across an await.
        for supervisor in self.all() {
            supervisor.stop().await;
        }
        if let Self::PerDevice { by_id, .. } = self {
            by_id.clear();
        }
    }
}
