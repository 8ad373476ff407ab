/*!
Persisted topology layout: `{ devices, links, timestamp }`.

The same document is the `topology` member of a solver request. OSPF runtime
state is written out for inspection but ignored on load; it is regenerated by
re-running the engine.
*/

use std::{fs, path::Path, time::SystemTime};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::{
    network::{device::Device, link::Link},
    topology::store::{TopologyError, TopologyStore},
};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed topology document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid timestamp {0:?}")]
    Timestamp(String),
    #[error("Inconsistent topology: {0}")]
    Topology(#[from] TopologyError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologySnapshot {
    pub devices: Vec<Device>,
    pub links: Vec<Link>,
    /// RFC 3339, UTC.
    #[serde(default)]
    pub timestamp: String,
}

impl TopologySnapshot {
    /// Captures the store as it is now, stamped with the current time.
    pub fn capture(store: &TopologyStore) -> Self {
        Self::capture_at(store, SystemTime::now())
    }

    pub fn capture_at(store: &TopologyStore, at: SystemTime) -> Self {
        TopologySnapshot {
            devices: store.devices().cloned().collect(),
            links: store.links().cloned().collect(),
            timestamp: humantime::format_rfc3339_seconds(at).to_string(),
        }
    }

    /// Parses `timestamp`, if one was recorded.
    pub fn taken_at(&self) -> Result<Option<SystemTime>, SnapshotError> {
        if self.timestamp.is_empty() {
            return Ok(None);
        }
        humantime::parse_rfc3339_weak(&self.timestamp)
            .map(Some)
            .map_err(|_| SnapshotError::Timestamp(self.timestamp.clone()))
    }

    /// Validates the document and builds a store from it.
    pub fn into_store(self, mac_seed: u64) -> Result<TopologyStore, SnapshotError> {
        self.taken_at()?;
        Ok(TopologyStore::restore(self.devices, self.links, mac_seed)?)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)?;
        info!(path = %path.display(), devices = self.devices.len(), links = self.links.len(), "topology saved");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let snapshot = Self::from_json(&fs::read_to_string(path)?)?;
        info!(path = %path.display(), devices = snapshot.devices.len(), links = snapshot.links.len(), "topology loaded");
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{
        device::{DeviceType, InterfaceState, Position},
        link::LinkType,
        router::AdjacencyState,
    };

    #[test]
    fn fixture_loads_into_consistent_store() {
        let json = include_str!("../../test_data/test_topology.json");
        let snapshot = TopologySnapshot::from_json(json).unwrap();
        assert!(snapshot.taken_at().unwrap().is_some());

        let store = snapshot.into_store(0).unwrap();
        assert_eq!(store.device_count(), 4);
        assert_eq!(store.link_count(), 3);

        // Runtime state in the file is discarded.
        let r1 = store.ospf_state("R1").unwrap();
        assert!(r1.lsdb.is_empty());
        assert!(r1.routing_table.is_empty());
        assert_eq!(r1.neighbor("R2").unwrap().adjacency_state, AdjacencyState::Init);
        assert_eq!(store.ospf_state("R3").unwrap().area, 1);
        assert!(store.device("PC1").unwrap().ospf.is_none());
        assert_eq!(store.device("R2").unwrap().interfaces[1].state, InterfaceState::Down);
    }

    #[test]
    fn save_then_load_reproduces_store() {
        let mut store = TopologyStore::with_mac_seed(3);
        store.add_device_with_id("R1", DeviceType::Router, Position::new(10.0, 20.0)).unwrap();
        store.add_device_with_id("R2", DeviceType::Router, Position::new(30.0, 20.0)).unwrap();
        store.add_device_with_id("PC1", DeviceType::Pc, Position::default()).unwrap();
        store.add_link("R1", "R2", LinkType::Ospf, Some(25), Some(2)).unwrap();
        store.add_link("R2", "PC1", LinkType::Access, None, None).unwrap();
        store.set_interface_state("R2", "eth1", InterfaceState::Down).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("topology.json");
        TopologySnapshot::capture(&store).save(&path).unwrap();
        let restored = TopologySnapshot::load(&path).unwrap().into_store(3).unwrap();

        assert_eq!(restored.devices().collect::<Vec<_>>(), store.devices().collect::<Vec<_>>());
        assert_eq!(restored.links().collect::<Vec<_>>(), store.links().collect::<Vec<_>>());
    }

    #[test]
    fn dangling_link_endpoint_is_rejected() {
        let json = r#"{
            "devices": [],
            "links": [{"id": "link_1", "source": "R1", "target": "R2", "type": "ospf", "cost": 10}],
            "timestamp": ""
        }"#;
        let err = TopologySnapshot::from_json(json).unwrap().into_store(0).unwrap_err();
        assert!(matches!(err, SnapshotError::Topology(TopologyError::UnknownDevice(id)) if id == "R1"));
    }

    #[test]
    fn bad_timestamp_is_rejected() {
        let snapshot = TopologySnapshot { devices: vec![], links: vec![], timestamp: "yesterday".into() };
        assert!(matches!(snapshot.into_store(0), Err(SnapshotError::Timestamp(_))));
    }
}
