/*!
This module owns the simulated topology: devices, their interfaces, links, and
the OSPF neighbor entries implied by router-to-router OSPF links.

This module defines:
- `TopologyError`: structural violations and lookups of missing entities.
- `TopologyStore`: insertion-ordered device and link maps plus the pair index that
  enforces "at most one link per device pair".

Every mutation validates first and only then touches state, so a failed call
leaves the store exactly as it was. Iteration order of devices and links is
insertion order; the path finder and OSPF engine rely on it for tie-breaking.
*/

use std::{
    collections::{BTreeSet, HashMap},
    net::Ipv4Addr,
};

use indexmap::IndexMap;
use ipnetwork::Ipv4Network;
use rand::{Rng, SeedableRng, rngs::StdRng};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    network::{
        device::{Device, DeviceId, DeviceType, Interface, InterfaceState, Position},
        link::{Link, LinkId, LinkType, LinkUpdate, UndirectedPairKey},
        router::{Neighbor, OspfState},
    },
    topology::events::TopologyEvent,
};

/// Point-to-point link addresses are carved as /30 blocks out of this pool.
const LINK_POOL_BASE: Ipv4Addr = Ipv4Addr::new(172, 16, 0, 0);
const LINK_POOL_PREFIX: u8 = 16;
const LINK_SUBNETS: u32 = 1 << (32 - 16 - 2);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TopologyError {
    #[error("Unknown device: {0}")]
    UnknownDevice(DeviceId),
    #[error("Unknown link: {0}")]
    UnknownLink(LinkId),
    #[error("Unknown interface {interface} on {device}")]
    UnknownInterface { device: DeviceId, interface: String },
    #[error("Device already exists: {0}")]
    DuplicateDevice(DeviceId),
    #[error("A link already exists between {0} and {1} ({2})")]
    DuplicateLink(DeviceId, DeviceId, LinkId),
    #[error("Cannot link {0} to itself")]
    SelfLink(DeviceId),
    #[error("Link cost must be a positive integer")]
    InvalidCost,
    #[error("{0} is not a router")]
    NotARouter(DeviceId),
    #[error("Interfaces of {device} do not match link {link}")]
    InconsistentInterface { device: DeviceId, link: LinkId },
}

/// Ground truth for devices, interfaces and links.
#[derive(Debug, Clone)]
pub struct TopologyStore {
    devices: IndexMap<DeviceId, Device>,
    links: IndexMap<LinkId, Link>,
    pairs: HashMap<UndirectedPairKey, LinkId>,
    type_counters: HashMap<DeviceType, u32>,
    link_counter: u32,
    subnet_counter: u32,
    mac_rng: StdRng,
    events: Vec<TopologyEvent>,
}

impl Default for TopologyStore {
    fn default() -> Self {
        Self::with_mac_seed(0)
    }
}

impl TopologyStore {
    /// Creates an empty store whose generated MAC addresses are derived from `seed`.
    pub fn with_mac_seed(seed: u64) -> Self {
        Self {
            devices: IndexMap::new(),
            links: IndexMap::new(),
            pairs: HashMap::new(),
            type_counters: HashMap::new(),
            link_counter: 0,
            subnet_counter: 0,
            mac_rng: StdRng::seed_from_u64(seed),
            events: Vec::new(),
        }
    }

    /* ---------------------- Queries ---------------------- */

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    pub fn routers(&self) -> impl Iterator<Item = &Device> {
        self.devices.values().filter(|d| d.is_router())
    }

    pub fn device(&self, id: &str) -> Option<&Device> {
        self.devices.get(id)
    }

    pub fn link(&self, id: &str) -> Option<&Link> {
        self.links.get(id)
    }

    /// Insertion position of a device.
    pub fn device_position(&self, id: &str) -> Option<usize> {
        self.devices.get_index_of(id)
    }

    pub fn link_between(&self, a: &str, b: &str) -> Option<&Link> {
        self.pairs
            .get(&UndirectedPairKey::new(a, b))
            .and_then(|id| self.links.get(id))
    }

    pub fn require_device(&self, id: &str) -> Result<&Device, TopologyError> {
        self.devices
            .get(id)
            .ok_or_else(|| TopologyError::UnknownDevice(id.to_string()))
    }

    /// OSPF state of a router; fails for unknown ids and devices that do not run OSPF.
    pub fn ospf_state(&self, id: &str) -> Result<&OspfState, TopologyError> {
        self.require_device(id)?
            .ospf
            .as_ref()
            .ok_or_else(|| TopologyError::NotARouter(id.to_string()))
    }

    /// Distinct areas of the OSPF links touching `router`.
    pub fn ospf_link_areas(&self, router: &str) -> BTreeSet<u32> {
        self.links
            .values()
            .filter(|l| l.link_type == LinkType::Ospf && l.touches(router))
            .map(|l| l.area)
            .collect()
    }

    /// Links touching `device`, in link insertion order.
    pub fn links_of<'a>(&'a self, device: &'a str) -> impl Iterator<Item = &'a Link> + 'a {
        self.links.values().filter(move |l| l.touches(device))
    }

    /* ---------------------- Devices ---------------------- */

    /// Adds a device under a fresh, type-scoped sequential id (`router_1`, `pc_3`, ...).
    pub fn add_device(&mut self, device_type: DeviceType, position: Position) -> &Device {
        let mut n = self.type_counters.get(&device_type).copied().unwrap_or(0);
        let id = loop {
            n += 1;
            let candidate = format!("{}_{}", device_type.as_str(), n);
            if !self.devices.contains_key(&candidate) {
                break candidate;
            }
        };
        self.insert_device(id, device_type, position)
    }

    /// Adds a device under an explicit id.
    pub fn add_device_with_id(
        &mut self,
        id: &str,
        device_type: DeviceType,
        position: Position,
    ) -> Result<&Device, TopologyError> {
        if self.devices.contains_key(id) {
            return Err(TopologyError::DuplicateDevice(id.to_string()));
        }
        Ok(self.insert_device(id.to_string(), device_type, position))
    }

    fn insert_device(&mut self, id: DeviceId, device_type: DeviceType, position: Position) -> &Device {
        let seq = self.type_counters.entry(device_type).or_insert(0);
        *seq += 1;
        let [a, b, c] = device_type.address_base();
        let host = ((*seq - 1) % 254 + 1) as u8;
        let mac_address = self.generate_mac();

        let device = Device {
            id: id.clone(),
            device_type,
            label: id.clone(),
            position,
            ip_address: Ipv4Addr::new(a, b, c, host),
            mac_address,
            interfaces: Vec::new(),
            ospf: device_type.is_router().then(|| OspfState::new(0)),
        };
        info!(device = %id, kind = %device_type, "device added");
        self.events.push(TopologyEvent::DeviceAdded { device: id.clone(), device_type });
        self.devices.entry(id).or_insert(device)
    }

    /// Removes a device and every link touching it. Missing ids are a no-op.
    pub fn remove_device(&mut self, id: &str) -> Option<Device> {
        if !self.devices.contains_key(id) {
            debug!(device = id, "remove_device: not present");
            return None;
        }
        // Collect first, then delete.
        let doomed: Vec<LinkId> = self.links_of(id).map(|l| l.id.clone()).collect();
        for link_id in &doomed {
            self.remove_link(link_id);
        }
        let removed = self.devices.shift_remove(id);
        info!(device = id, links = doomed.len(), "device removed");
        self.events.push(TopologyEvent::DeviceRemoved { device: id.to_string() });
        removed
    }

    /// Sets the primary area and enabled flag of a router's OSPF process.
    pub fn configure_ospf(&mut self, id: &str, area: u32, enabled: bool) -> Result<(), TopologyError> {
        let device = self
            .devices
            .get_mut(id)
            .ok_or_else(|| TopologyError::UnknownDevice(id.to_string()))?;
        let ospf = device
            .ospf
            .as_mut()
            .ok_or_else(|| TopologyError::NotARouter(id.to_string()))?;
        ospf.area = area;
        ospf.enabled = enabled;
        debug!(router = id, area, enabled, "ospf configured");
        Ok(())
    }

    pub fn set_device_position(&mut self, id: &str, position: Position) -> Result<(), TopologyError> {
        let device = self
            .devices
            .get_mut(id)
            .ok_or_else(|| TopologyError::UnknownDevice(id.to_string()))?;
        device.position = position;
        Ok(())
    }

    pub fn set_interface_state(
        &mut self,
        device_id: &str,
        interface_id: &str,
        state: InterfaceState,
    ) -> Result<(), TopologyError> {
        let device = self
            .devices
            .get_mut(device_id)
            .ok_or_else(|| TopologyError::UnknownDevice(device_id.to_string()))?;
        let interface = device
            .interfaces
            .iter_mut()
            .find(|i| i.id == interface_id)
            .ok_or_else(|| TopologyError::UnknownInterface {
                device: device_id.to_string(),
                interface: interface_id.to_string(),
            })?;
        if interface.state != state {
            interface.state = state;
            info!(device = device_id, interface = interface_id, %state, "interface state changed");
            self.events.push(TopologyEvent::InterfaceStateChanged {
                device: device_id.to_string(),
                interface: interface_id.to_string(),
                state,
            });
        }
        Ok(())
    }

    /* ---------------------- Links ---------------------- */

    fn validate_new_link(&self, a: &str, b: &str, cost: u32) -> Result<(), TopologyError> {
        if a == b {
            return Err(TopologyError::SelfLink(a.to_string()));
        }
        self.require_device(a)?;
        self.require_device(b)?;
        if cost == 0 {
            return Err(TopologyError::InvalidCost);
        }
        if let Some(existing) = self.pairs.get(&UndirectedPairKey::new(a, b)) {
            return Err(TopologyError::DuplicateLink(a.to_string(), b.to_string(), existing.clone()));
        }
        Ok(())
    }

    /// Connects two devices. Cost defaults per link type, area defaults to 0.
    ///
    /// Creates one interface on each endpoint and, for OSPF links between two
    /// routers, a reciprocal pair of neighbor entries in state Init.
    pub fn add_link(
        &mut self,
        a: &str,
        b: &str,
        link_type: LinkType,
        cost: Option<u32>,
        area: Option<u32>,
    ) -> Result<&Link, TopologyError> {
        let cost = cost.unwrap_or_else(|| link_type.default_cost());
        let area = area.unwrap_or(0);
        self.validate_new_link(a, b, cost)?;

        // Validation done; nothing below can fail.
        let id = loop {
            self.link_counter += 1;
            let candidate = format!("link_{}", self.link_counter);
            if !self.links.contains_key(&candidate) {
                break candidate;
            }
        };
        let (ip_a, ip_b) = self.allocate_link_addresses();
        let link = Link::new(id.clone(), a.to_string(), b.to_string(), link_type, cost, area);

        let if_a = self.attach_interface(a, b, &id, link_type, ip_a);
        let if_b = self.attach_interface(b, a, &id, link_type, ip_b);
        if let (LinkType::Ospf, Some(if_a), Some(if_b)) = (link_type, &if_a, &if_b) {
            self.add_reciprocal_neighbors(a, if_a, b, if_b, area);
        }

        self.pairs.insert(link.key(), id.clone());
        info!(link = %id, a, b, %link_type, cost, area, "link added");
        self.events.push(TopologyEvent::LinkAdded {
            link: id.clone(),
            source: a.to_string(),
            target: b.to_string(),
        });
        Ok(&*self.links.entry(id).or_insert(link))
    }

    /// Removes a link, both of its interfaces and any neighbor entries it implied.
    /// Missing ids are a no-op.
    pub fn remove_link(&mut self, id: &str) -> Option<Link> {
        let link = self.links.shift_remove(id)?;
        for (local, peer) in [(&link.source, &link.target), (&link.target, &link.source)] {
            if let Some(device) = self.devices.get_mut(local) {
                device.interfaces.retain(|i| i.link_id != link.id);
                if link.link_type == LinkType::Ospf {
                    if let Some(ospf) = device.ospf.as_mut() {
                        if ospf.neighbor(peer).is_some() {
                            ospf.remove_neighbor(peer);
                            self.events.push(TopologyEvent::NeighborStateChanged {
                                router: local.clone(),
                                peer: peer.clone(),
                                state: None,
                            });
                        }
                    }
                }
            }
        }
        self.pairs.remove(&link.key());
        info!(link = %link.id, a = %link.source, b = %link.target, "link removed");
        self.events.push(TopologyEvent::LinkRemoved {
            link: link.id.clone(),
            source: link.source.clone(),
            target: link.target.clone(),
        });
        Some(link)
    }

    /// Edits cost, area and/or type of an existing link, keeping interfaces and
    /// neighbor entries consistent with the new type.
    pub fn update_link(&mut self, id: &str, update: LinkUpdate) -> Result<&Link, TopologyError> {
        if update.cost == Some(0) {
            return Err(TopologyError::InvalidCost);
        }
        let link = self
            .links
            .get_mut(id)
            .ok_or_else(|| TopologyError::UnknownLink(id.to_string()))?;

        let old_type = link.link_type;
        if let Some(cost) = update.cost {
            link.cost = cost;
        }
        if let Some(area) = update.area {
            link.area = area;
        }
        if let Some(link_type) = update.link_type {
            link.link_type = link_type;
        }
        link.refresh_label();
        let (a, b, new_type, area) = (link.source.clone(), link.target.clone(), link.link_type, link.area);

        for device_id in [&a, &b] {
            if let Some(interface) = self
                .devices
                .get_mut(device_id)
                .and_then(|d| d.interface_for_link_mut(id))
            {
                interface.link_type = new_type;
            }
        }

        match (old_type, new_type) {
            (LinkType::Ospf, LinkType::Access) => {
                for (local, peer) in [(&a, &b), (&b, &a)] {
                    let ospf = self.devices.get_mut(local).and_then(|d| d.ospf.as_mut());
                    if let Some(ospf) = ospf.filter(|o| o.neighbor(peer).is_some()) {
                        ospf.remove_neighbor(peer);
                        self.events.push(TopologyEvent::NeighborStateChanged {
                            router: local.clone(),
                            peer: peer.clone(),
                            state: None,
                        });
                    }
                }
            }
            (LinkType::Access, LinkType::Ospf) => {
                let if_a = self.interface_id_for(&a, id);
                let if_b = self.interface_id_for(&b, id);
                if let (Some(if_a), Some(if_b)) = (if_a, if_b) {
                    self.add_reciprocal_neighbors(&a, &if_a, &b, &if_b, area);
                }
            }
            (LinkType::Ospf, LinkType::Ospf) => {
                for (local, peer) in [(&a, &b), (&b, &a)] {
                    if let Some(neighbor) = self
                        .devices
                        .get_mut(local)
                        .and_then(|d| d.ospf.as_mut())
                        .and_then(|o| o.neighbor_mut(peer))
                    {
                        neighbor.area = area;
                    }
                }
            }
            (LinkType::Access, LinkType::Access) => {}
        }

        info!(link = id, %new_type, area, "link updated");
        self.events.push(TopologyEvent::LinkUpdated { link: id.to_string() });
        self.links
            .get(id)
            .ok_or_else(|| TopologyError::UnknownLink(id.to_string()))
    }

    fn interface_id_for(&self, device: &str, link_id: &str) -> Option<String> {
        self.devices
            .get(device)
            .and_then(|d| d.interface_for_link(link_id))
            .map(|i| i.id.clone())
    }

    fn attach_interface(
        &mut self,
        device_id: &str,
        peer: &str,
        link_id: &str,
        link_type: LinkType,
        ip_address: Ipv4Addr,
    ) -> Option<String> {
        let device = self.devices.get_mut(device_id)?;
        let interface = Interface {
            id: device.next_interface_id(),
            peer_device_id: peer.to_string(),
            link_id: link_id.to_string(),
            link_type,
            ip_address,
            state: InterfaceState::Up,
        };
        let id = interface.id.clone();
        device.interfaces.push(interface);
        Some(id)
    }

    /// Adds Init neighbor entries on both sides when both endpoints are routers.
    fn add_reciprocal_neighbors(&mut self, a: &str, if_a: &str, b: &str, if_b: &str, area: u32) {
        let both_routers = [a, b]
            .iter()
            .all(|id| self.devices.get(*id).is_some_and(|d| d.is_router()));
        if !both_routers {
            return;
        }
        for (local, peer, interface) in [(a, b, if_a), (b, a, if_b)] {
            if let Some(device) = self.devices.get_mut(local) {
                let ospf = device.ospf.get_or_insert_with(|| OspfState::new(area));
                if ospf.neighbor(peer).is_none() {
                    ospf.neighbors.push(Neighbor::new(peer.to_string(), area, interface.to_string()));
                    self.events.push(TopologyEvent::NeighborStateChanged {
                        router: local.to_string(),
                        peer: peer.to_string(),
                        state: Some(Default::default()),
                    });
                }
            }
        }
    }

    fn allocate_link_addresses(&mut self) -> (Ipv4Addr, Ipv4Addr) {
        let block = self.subnet_counter % LINK_SUBNETS;
        self.subnet_counter += 1;
        let subnet = Ipv4Network::new(LINK_POOL_BASE, LINK_POOL_PREFIX)
            .ok()
            .and_then(|pool| pool.nth(block * 4))
            .and_then(|base| Ipv4Network::new(base, 30).ok());
        match subnet {
            Some(net) => (
                net.nth(1).unwrap_or(net.network()),
                net.nth(2).unwrap_or(net.network()),
            ),
            None => (Ipv4Addr::UNSPECIFIED, Ipv4Addr::UNSPECIFIED),
        }
    }

    fn generate_mac(&mut self) -> String {
        let mut bytes = [0u8; 6];
        self.mac_rng.fill(&mut bytes);
        // Locally administered, unicast.
        bytes[0] = (bytes[0] | 0x02) & 0xfe;
        bytes
            .iter()
            .map(|b| hex::encode_upper([*b]))
            .collect::<Vec<_>>()
            .join(":")
    }

    /* ---------------------- OSPF runtime ---------------------- */

    /// Replaces a router's OSPF state, recording what changed.
    pub fn install_ospf_state(&mut self, id: &str, state: OspfState) {
        let Some(current) = self.devices.get_mut(id).and_then(|d| d.ospf.as_mut()) else {
            return;
        };
        for neighbor in &state.neighbors {
            let before = current.neighbor(&neighbor.peer_router_id).map(|n| n.adjacency_state);
            if before != Some(neighbor.adjacency_state) {
                self.events.push(TopologyEvent::NeighborStateChanged {
                    router: id.to_string(),
                    peer: neighbor.peer_router_id.clone(),
                    state: Some(neighbor.adjacency_state),
                });
            }
        }
        for neighbor in &current.neighbors {
            if state.neighbor(&neighbor.peer_router_id).is_none() {
                self.events.push(TopologyEvent::NeighborStateChanged {
                    router: id.to_string(),
                    peer: neighbor.peer_router_id.clone(),
                    state: None,
                });
            }
        }
        if current.lsdb != state.lsdb {
            self.events.push(TopologyEvent::LsdbChanged { router: id.to_string(), entries: state.lsdb.len() });
        }
        if current.routing_table != state.routing_table {
            self.events.push(TopologyEvent::RoutesChanged {
                router: id.to_string(),
                routes: state.routing_table.len(),
            });
        }
        if current.is_abr != state.is_abr {
            self.events.push(TopologyEvent::AbrChanged { router: id.to_string(), is_abr: state.is_abr });
        }
        *current = state;
    }

    /// Clears every router's derived OSPF state (neighbors back to Init).
    pub fn reset_ospf_runtime(&mut self) {
        let ids: Vec<DeviceId> = self.routers().map(|d| d.id.clone()).collect();
        for id in ids {
            if let Some(mut state) = self.devices.get(&id).and_then(|d| d.ospf.clone()) {
                state.reset_runtime();
                self.install_ospf_state(&id, state);
            }
        }
    }

    /// Takes the notifications recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<TopologyEvent> {
        std::mem::take(&mut self.events)
    }

    /* ---------------------- Restore ---------------------- */

    /// Rebuilds a store from persisted devices and links.
    ///
    /// Every link endpoint and interface reference is checked before the store is
    /// returned. OSPF runtime state is not trusted: neighbor entries are rebuilt
    /// from the links in state Init and LSDBs/routes start empty.
    pub fn restore(devices: Vec<Device>, links: Vec<Link>, mac_seed: u64) -> Result<Self, TopologyError> {
        let mut store = Self::with_mac_seed(mac_seed);

        for mut device in devices {
            if store.devices.contains_key(&device.id) {
                return Err(TopologyError::DuplicateDevice(device.id));
            }
            device.ospf = if device.is_router() {
                let mut ospf = device.ospf.take().unwrap_or_default();
                ospf.neighbors.clear();
                ospf.reset_runtime();
                Some(ospf)
            } else {
                None
            };
            *store.type_counters.entry(device.device_type).or_insert(0) += 1;
            store.events.push(TopologyEvent::DeviceAdded {
                device: device.id.clone(),
                device_type: device.device_type,
            });
            store.devices.insert(device.id.clone(), device);
        }

        for mut link in links {
            store.validate_new_link(&link.source, &link.target, link.cost)?;
            if store.links.contains_key(&link.id) {
                return Err(TopologyError::DuplicateLink(link.source, link.target, link.id));
            }
            link.refresh_label();
            store.pairs.insert(link.key(), link.id.clone());
            store.events.push(TopologyEvent::LinkAdded {
                link: link.id.clone(),
                source: link.source.clone(),
                target: link.target.clone(),
            });
            store.links.insert(link.id.clone(), link);
        }

        store.check_interfaces()?;

        let ospf_links: Vec<(DeviceId, DeviceId, LinkId, u32)> = store
            .links
            .values()
            .filter(|l| l.link_type == LinkType::Ospf)
            .map(|l| (l.source.clone(), l.target.clone(), l.id.clone(), l.area))
            .collect();
        for (a, b, link_id, area) in ospf_links {
            let if_a = store.interface_id_for(&a, &link_id);
            let if_b = store.interface_id_for(&b, &link_id);
            if let (Some(if_a), Some(if_b)) = (if_a, if_b) {
                store.add_reciprocal_neighbors(&a, &if_a, &b, &if_b, area);
            }
        }

        store.link_counter = store.links.len() as u32;
        store.subnet_counter = store.links.len() as u32;
        Ok(store)
    }

    /// Every interface names an existing link it is an endpoint of, and every link
    /// has exactly one interface on each endpoint. Interface types follow their link.
    fn check_interfaces(&mut self) -> Result<(), TopologyError> {
        for device in self.devices.values_mut() {
            for interface in &mut device.interfaces {
                let link = self.links.get(&interface.link_id).ok_or_else(|| {
                    TopologyError::InconsistentInterface {
                        device: device.id.clone(),
                        link: interface.link_id.clone(),
                    }
                })?;
                if link.peer_of(&device.id) != Some(&interface.peer_device_id) {
                    return Err(TopologyError::InconsistentInterface {
                        device: device.id.clone(),
                        link: link.id.clone(),
                    });
                }
                interface.link_type = link.link_type;
            }
        }
        for link in self.links.values() {
            for endpoint in [&link.source, &link.target] {
                let count = self
                    .devices
                    .get(endpoint)
                    .map(|d| d.interfaces.iter().filter(|i| i.link_id == link.id).count())
                    .unwrap_or(0);
                if count != 1 {
                    return Err(TopologyError::InconsistentInterface {
                        device: endpoint.clone(),
                        link: link.id.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::router::AdjacencyState;

    fn routers(store: &mut TopologyStore, ids: &[&str]) {
        for id in ids {
            store.add_device_with_id(id, DeviceType::Router, Position::default()).unwrap();
        }
    }

    fn neighbor_ids(store: &TopologyStore, router: &str) -> Vec<String> {
        store
            .ospf_state(router)
            .unwrap()
            .neighbors
            .iter()
            .map(|n| n.peer_router_id.clone())
            .collect()
    }

    #[test]
    fn generated_ids_are_type_scoped_and_sequential() {
        let mut store = TopologyStore::default();
        let r1 = store.add_device(DeviceType::Router, Position::new(1.0, 2.0)).id.clone();
        let pc1 = store.add_device(DeviceType::Pc, Position::default()).id.clone();
        let r2 = store.add_device(DeviceType::Router, Position::default()).id.clone();
        assert_eq!((r1.as_str(), pc1.as_str(), r2.as_str()), ("router_1", "pc_1", "router_2"));

        let r2_dev = store.device("router_2").unwrap();
        assert_eq!(r2_dev.ip_address, Ipv4Addr::new(10, 0, 0, 2));
        assert!(r2_dev.interfaces.is_empty());
        assert!(r2_dev.ospf.is_some());
        assert!(store.device("pc_1").unwrap().ospf.is_none());
        assert_eq!(store.device("router_1").unwrap().position, Position::new(1.0, 2.0));
    }

    #[test]
    fn mac_addresses_are_seeded_and_well_formed() {
        let mut a = TopologyStore::with_mac_seed(7);
        let mut b = TopologyStore::with_mac_seed(7);
        let mac_a = a.add_device(DeviceType::Pc, Position::default()).mac_address.clone();
        let mac_b = b.add_device(DeviceType::Pc, Position::default()).mac_address.clone();
        assert_eq!(mac_a, mac_b);
        assert_eq!(mac_a.len(), 17);
        assert_eq!(mac_a.split(':').count(), 6);
    }

    #[test]
    fn ospf_link_creates_interfaces_and_init_neighbors() {
        let mut store = TopologyStore::default();
        routers(&mut store, &["R1", "R2"]);
        let link = store.add_link("R1", "R2", LinkType::Ospf, None, Some(1)).unwrap().clone();
        assert_eq!(link.cost, 10);
        assert_eq!(link.area, 1);

        let r1 = store.device("R1").unwrap();
        assert_eq!(r1.interfaces.len(), 1);
        assert_eq!(r1.interfaces[0].id, "eth0");
        assert_eq!(r1.interfaces[0].link_id, link.id);
        assert_eq!(r1.interfaces[0].ip_address, Ipv4Addr::new(172, 16, 0, 1));
        assert_eq!(store.device("R2").unwrap().interfaces[0].ip_address, Ipv4Addr::new(172, 16, 0, 2));

        let n = store.ospf_state("R2").unwrap().neighbor("R1").unwrap();
        assert_eq!(n.adjacency_state, AdjacencyState::Init);
        assert_eq!(n.area, 1);
        assert_eq!(n.local_interface_id, "eth0");
    }

    #[test]
    fn access_link_defaults_and_no_neighbors() {
        let mut store = TopologyStore::default();
        routers(&mut store, &["R1"]);
        store.add_device_with_id("PC1", DeviceType::Pc, Position::default()).unwrap();
        let link = store.add_link("R1", "PC1", LinkType::Access, None, None).unwrap();
        assert_eq!(link.cost, 1);
        assert!(store.ospf_state("R1").unwrap().neighbors.is_empty());
        assert_eq!(store.device("PC1").unwrap().interfaces.len(), 1);
    }

    #[test]
    fn duplicate_link_is_rejected_without_side_effects() {
        let mut store = TopologyStore::default();
        routers(&mut store, &["R1", "R2"]);
        store.add_link("R1", "R2", LinkType::Ospf, Some(10), None).unwrap();
        let before_r1 = store.device("R1").unwrap().clone();
        let before_r2 = store.device("R2").unwrap().clone();
        let before_link = store.link("link_1").unwrap().clone();

        let err = store.add_link("R2", "R1", LinkType::Access, Some(5), None).unwrap_err();
        assert!(matches!(err, TopologyError::DuplicateLink(_, _, ref id) if id == "link_1"));
        assert_eq!(store.link_count(), 1);
        assert_eq!(store.link("link_1").unwrap(), &before_link);
        assert_eq!(store.device("R1").unwrap(), &before_r1);
        assert_eq!(store.device("R2").unwrap(), &before_r2);
    }

    #[test]
    fn invalid_links_fail_before_mutation() {
        let mut store = TopologyStore::default();
        routers(&mut store, &["R1", "R2"]);
        assert_eq!(
            store.add_link("R1", "R9", LinkType::Ospf, None, None).unwrap_err(),
            TopologyError::UnknownDevice("R9".into())
        );
        assert_eq!(
            store.add_link("R1", "R1", LinkType::Ospf, None, None).unwrap_err(),
            TopologyError::SelfLink("R1".into())
        );
        assert_eq!(
            store.add_link("R1", "R2", LinkType::Ospf, Some(0), None).unwrap_err(),
            TopologyError::InvalidCost
        );
        assert_eq!(store.link_count(), 0);
        assert!(store.device("R1").unwrap().interfaces.is_empty());
        assert!(store.ospf_state("R1").unwrap().neighbors.is_empty());
    }

    #[test]
    fn removing_link_drops_interfaces_and_neighbors() {
        let mut store = TopologyStore::default();
        routers(&mut store, &["R1", "R2", "R3"]);
        store.add_link("R1", "R2", LinkType::Ospf, None, None).unwrap();
        let id = store.add_link("R1", "R3", LinkType::Ospf, None, None).unwrap().id.clone();
        store.drain_events();

        let removed = store.remove_link(&id).unwrap();
        assert_eq!(removed.target, "R3");
        assert_eq!(neighbor_ids(&store, "R1"), vec!["R2"]);
        assert!(neighbor_ids(&store, "R3").is_empty());
        assert!(store.device("R3").unwrap().interfaces.is_empty());
        assert_eq!(store.device("R1").unwrap().interfaces.len(), 1);
        assert!(store.link_between("R1", "R3").is_none());

        let events = store.drain_events();
        assert!(events.contains(&TopologyEvent::LinkRemoved {
            link: id.clone(),
            source: "R1".into(),
            target: "R3".into()
        }));
        assert!(store.remove_link(&id).is_none());
    }

    #[test]
    fn removing_device_cascades_and_is_idempotent() {
        let mut store = TopologyStore::default();
        routers(&mut store, &["R1", "R2", "R3"]);
        store.add_link("R1", "R2", LinkType::Ospf, None, None).unwrap();
        store.add_link("R2", "R3", LinkType::Ospf, None, None).unwrap();

        assert!(store.remove_device("R2").is_some());
        assert_eq!(store.link_count(), 0);
        assert!(neighbor_ids(&store, "R1").is_empty());
        assert!(store.device("R3").unwrap().interfaces.is_empty());
        assert!(store.remove_device("R2").is_none());
        assert_eq!(store.device_count(), 2);
    }

    #[test]
    fn interface_names_reuse_freed_slots() {
        let mut store = TopologyStore::default();
        routers(&mut store, &["R1", "R2", "R3", "R4"]);
        let first = store.add_link("R1", "R2", LinkType::Ospf, None, None).unwrap().id.clone();
        store.add_link("R1", "R3", LinkType::Ospf, None, None).unwrap();
        store.remove_link(&first);
        store.add_link("R1", "R4", LinkType::Ospf, None, None).unwrap();
        let names: Vec<_> = store.device("R1").unwrap().interfaces.iter().map(|i| i.id.clone()).collect();
        assert_eq!(names, vec!["eth1", "eth0"]);
    }

    #[test]
    fn update_link_switches_neighbor_entries() {
        let mut store = TopologyStore::default();
        routers(&mut store, &["R1", "R2"]);
        let id = store.add_link("R1", "R2", LinkType::Ospf, None, None).unwrap().id.clone();

        let link = store
            .update_link(&id, LinkUpdate { link_type: Some(LinkType::Access), ..Default::default() })
            .unwrap();
        assert_eq!(link.label, "Access");
        assert!(neighbor_ids(&store, "R1").is_empty());
        assert_eq!(store.device("R2").unwrap().interfaces[0].link_type, LinkType::Access);

        store
            .update_link(&id, LinkUpdate { link_type: Some(LinkType::Ospf), area: Some(3), cost: Some(7) })
            .unwrap();
        let n = store.ospf_state("R1").unwrap().neighbor("R2").unwrap();
        assert_eq!((n.area, n.adjacency_state), (3, AdjacencyState::Init));
        assert_eq!(store.link(&id).unwrap().cost, 7);

        store.update_link(&id, LinkUpdate { area: Some(4), ..Default::default() }).unwrap();
        assert_eq!(store.ospf_state("R2").unwrap().neighbor("R1").unwrap().area, 4);

        assert_eq!(
            store.update_link(&id, LinkUpdate { cost: Some(0), ..Default::default() }).unwrap_err(),
            TopologyError::InvalidCost
        );
        assert!(matches!(
            store.update_link("nope", LinkUpdate::default()),
            Err(TopologyError::UnknownLink(_))
        ));
    }

    #[test]
    fn neighbors_need_interfaces_on_both_ends() {
        let mut store = TopologyStore::default();
        routers(&mut store, &["R1", "R2"]);
        let id = store.add_link("R1", "R2", LinkType::Access, None, None).unwrap().id.clone();
        assert_eq!(store.interface_id_for("R1", &id).as_deref(), Some("eth0"));
        assert_eq!(store.interface_id_for("R9", &id), None);
        assert_eq!(store.attach_interface("R9", "R1", &id, LinkType::Ospf, Ipv4Addr::LOCALHOST), None);

        store.devices.get_mut("R2").unwrap().interfaces.clear();
        store
            .update_link(&id, LinkUpdate { link_type: Some(LinkType::Ospf), ..Default::default() })
            .unwrap();
        assert!(neighbor_ids(&store, "R1").is_empty());
        assert!(neighbor_ids(&store, "R2").is_empty());
    }

    #[test]
    fn configure_and_interface_state() {
        let mut store = TopologyStore::default();
        routers(&mut store, &["R1", "R2"]);
        store.add_device_with_id("PC1", DeviceType::Pc, Position::default()).unwrap();
        store.add_link("R1", "R2", LinkType::Ospf, None, None).unwrap();

        store.configure_ospf("R1", 5, false).unwrap();
        let ospf = store.ospf_state("R1").unwrap();
        assert_eq!((ospf.area, ospf.enabled), (5, false));
        assert_eq!(store.configure_ospf("PC1", 0, true), Err(TopologyError::NotARouter("PC1".into())));

        store.drain_events();
        store.set_interface_state("R1", "eth0", InterfaceState::Down).unwrap();
        assert!(!store.device("R1").unwrap().interfaces[0].is_up());
        assert_eq!(store.drain_events().len(), 1);
        assert!(matches!(
            store.set_interface_state("R1", "eth9", InterfaceState::Down),
            Err(TopologyError::UnknownInterface { .. })
        ));
    }

    #[test]
    fn abr_areas_come_from_ospf_links_only() {
        let mut store = TopologyStore::default();
        routers(&mut store, &["R1", "R2", "R3"]);
        store.add_device_with_id("PC1", DeviceType::Pc, Position::default()).unwrap();
        store.add_link("R1", "R2", LinkType::Ospf, None, Some(0)).unwrap();
        store.add_link("R1", "R3", LinkType::Ospf, None, Some(1)).unwrap();
        store.add_link("R2", "PC1", LinkType::Access, None, Some(2)).unwrap();
        assert_eq!(store.ospf_link_areas("R1").into_iter().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(store.ospf_link_areas("R2").len(), 1);
    }

    #[test]
    fn restore_rejects_dangling_interfaces() {
        let mut store = TopologyStore::default();
        routers(&mut store, &["R1", "R2"]);
        store.add_link("R1", "R2", LinkType::Ospf, None, None).unwrap();
        let devices: Vec<Device> = store.devices().cloned().collect();

        // Links dropped but interfaces still point at link_1.
        let err = TopologyStore::restore(devices.clone(), vec![], 0).unwrap_err();
        assert!(matches!(err, TopologyError::InconsistentInterface { ref link, .. } if link == "link_1"));

        let links: Vec<Link> = store.links().cloned().collect();
        let restored = TopologyStore::restore(devices, links, 0).unwrap();
        assert_eq!(restored.link_count(), 1);
        assert_eq!(neighbor_ids(&restored, "R1"), vec!["R2"]);
    }
}
