/*!
Change notifications for the presentation layer.

Every store mutation records one or more `TopologyEvent`s. A renderer drains them
after each command and redraws only what changed.
*/

use serde::{Deserialize, Serialize};

use crate::network::{device::{DeviceId, DeviceType, InterfaceState}, link::LinkId, router::AdjacencyState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TopologyEvent {
    DeviceAdded {
        device: DeviceId,
        device_type: DeviceType,
    },
    DeviceRemoved {
        device: DeviceId,
    },
    LinkAdded {
        link: LinkId,
        source: DeviceId,
        target: DeviceId,
    },
    LinkRemoved {
        link: LinkId,
        source: DeviceId,
        target: DeviceId,
    },
    LinkUpdated {
        link: LinkId,
    },
    InterfaceStateChanged {
        device: DeviceId,
        interface: String,
        state: InterfaceState,
    },
    /// A neighbor entry was created, changed state, or (with `state: None`) removed.
    NeighborStateChanged {
        router: DeviceId,
        peer: DeviceId,
        state: Option<AdjacencyState>,
    },
    LsdbChanged {
        router: DeviceId,
        entries: usize,
    },
    RoutesChanged {
        router: DeviceId,
        routes: usize,
    },
    AbrChanged {
        router: DeviceId,
        is_abr: bool,
    },
}

impl TopologyEvent {
    /// Device the event is about, when it concerns a single device.
    pub fn device(&self) -> Option<&DeviceId> {
        match self {
            TopologyEvent::DeviceAdded { device, .. }
            | TopologyEvent::DeviceRemoved { device }
            | TopologyEvent::InterfaceStateChanged { device, .. } => Some(device),
            TopologyEvent::NeighborStateChanged { router, .. }
            | TopologyEvent::LsdbChanged { router, .. }
            | TopologyEvent::RoutesChanged { router, .. }
            | TopologyEvent::AbrChanged { router, .. } => Some(router),
            TopologyEvent::LinkAdded { .. }
            | TopologyEvent::LinkRemoved { .. }
            | TopologyEvent::LinkUpdated { .. } => None,
        }
    }
}
