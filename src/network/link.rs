use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::network::device::DeviceId;

pub type LinkId = String;

/// Default cost of an access link (host or switch attachment).
pub const DEFAULT_ACCESS_COST: u32 = 1;
/// Default cost of an OSPF link between routers.
pub const DEFAULT_OSPF_COST: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    Ospf,
    Access,
}

impl LinkType {
    pub fn default_cost(&self) -> u32 {
        match self {
            LinkType::Ospf => DEFAULT_OSPF_COST,
            LinkType::Access => DEFAULT_ACCESS_COST,
        }
    }
}

impl Display for LinkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkType::Ospf => write!(f, "ospf"),
            LinkType::Access => write!(f, "access"),
        }
    }
}

/// A point-to-point connection between two devices.
///
/// Endpoints are stored as `source`/`target` to match the persisted layout,
/// but the pair is unordered: at most one link may exist between two devices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub source: DeviceId,
    pub target: DeviceId,
    #[serde(rename = "type")]
    pub link_type: LinkType,
    pub cost: u32,
    #[serde(default)]
    pub area: u32,
    #[serde(default)]
    pub label: String,
}

impl Link {
    pub fn new(id: LinkId, source: DeviceId, target: DeviceId, link_type: LinkType, cost: u32, area: u32) -> Self {
        let label = Self::make_label(link_type, cost, area);
        Self { id, source, target, link_type, cost, area, label }
    }

    pub fn key(&self) -> UndirectedPairKey {
        UndirectedPairKey::new(&self.source, &self.target)
    }

    pub fn touches(&self, device: &str) -> bool {
        self.source == device || self.target == device
    }

    /// Returns the endpoint opposite to `device`, if `device` is an endpoint.
    pub fn peer_of(&self, device: &str) -> Option<&DeviceId> {
        if self.source == device {
            Some(&self.target)
        } else if self.target == device {
            Some(&self.source)
        } else {
            None
        }
    }

    pub(crate) fn refresh_label(&mut self) {
        self.label = Self::make_label(self.link_type, self.cost, self.area);
    }

    fn make_label(link_type: LinkType, cost: u32, area: u32) -> String {
        match link_type {
            LinkType::Ospf => format!("Cost: {cost}, Area: {area}"),
            LinkType::Access => "Access".to_string(),
        }
    }
}

/// Order-independent key for a device pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UndirectedPairKey {
    pub a: DeviceId,
    pub b: DeviceId,
}

impl UndirectedPairKey {
    pub fn new(a: &str, b: &str) -> Self {
        let (a, b) = if a < b { (a, b) } else { (b, a) };
        UndirectedPairKey { a: a.to_string(), b: b.to_string() }
    }

    pub fn endpoints(&self) -> (&str, &str) {
        (&self.a, &self.b)
    }
}

/// Partial update applied by `TopologyStore::update_link`.
#[derive(Debug, Clone, Default)]
pub struct LinkUpdate {
    pub cost: Option<u32>,
    pub area: Option<u32>,
    pub link_type: Option<LinkType>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_key_ignores_endpoint_order() {
        assert_eq!(UndirectedPairKey::new("R1", "R2"), UndirectedPairKey::new("R2", "R1"));
        assert_ne!(UndirectedPairKey::new("R1", "R2"), UndirectedPairKey::new("R1", "R3"));
    }

    #[test]
    fn link_labels_follow_type() {
        let mut link = Link::new("link_1".into(), "R1".into(), "R2".into(), LinkType::Ospf, 10, 0);
        assert_eq!(link.label, "Cost: 10, Area: 0");
        link.link_type = LinkType::Access;
        link.refresh_label();
        assert_eq!(link.label, "Access");
        assert_eq!(link.peer_of("R2"), Some(&"R1".to_string()));
        assert_eq!(link.peer_of("R9"), None);
    }

    #[test]
    fn link_deserializes_from_persisted_layout() {
        let json = r#"{"id":"link1","source":"R1","target":"R2","type":"ospf","cost":10,"area":0,"label":"Cost: 10, Area: 0"}"#;
        let link: Link = serde_json::from_str(json).unwrap();
        assert_eq!(link.link_type, LinkType::Ospf);
        assert_eq!(link.key(), UndirectedPairKey::new("R2", "R1"));
    }
}
