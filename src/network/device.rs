use std::{fmt::Display, net::Ipv4Addr, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::network::{
    link::{LinkId, LinkType},
    router::OspfState,
};

pub type DeviceId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Router,
    Switch,
    Pc,
    Laptop,
    Phone,
    Server,
}

impl DeviceType {
    pub const ALL: [DeviceType; 6] = [
        DeviceType::Router,
        DeviceType::Switch,
        DeviceType::Pc,
        DeviceType::Laptop,
        DeviceType::Phone,
        DeviceType::Server,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Router => "router",
            DeviceType::Switch => "switch",
            DeviceType::Pc => "pc",
            DeviceType::Laptop => "laptop",
            DeviceType::Phone => "phone",
            DeviceType::Server => "server",
        }
    }

    /// Management address prefix; the host octet is the per-type sequence number.
    pub fn address_base(&self) -> [u8; 3] {
        match self {
            DeviceType::Router => [10, 0, 0],
            DeviceType::Switch => [192, 168, 1],
            DeviceType::Pc => [192, 168, 10],
            DeviceType::Laptop => [192, 168, 20],
            DeviceType::Phone => [192, 168, 30],
            DeviceType::Server => [192, 168, 100],
        }
    }

    pub fn is_router(&self) -> bool {
        matches!(self, DeviceType::Router)
    }
}

impl Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DeviceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeviceType::ALL
            .iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| format!("unknown device type: {s}"))
    }
}

/// Diagram coordinates. Opaque to the engine, carried through for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceState {
    #[default]
    Up,
    Down,
}

impl Display for InterfaceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterfaceState::Up => write!(f, "up"),
            InterfaceState::Down => write!(f, "down"),
        }
    }
}

/// One device-side endpoint of a link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    pub id: String,
    #[serde(rename = "connectedTo")]
    pub peer_device_id: DeviceId,
    #[serde(rename = "linkId")]
    pub link_id: LinkId,
    #[serde(rename = "type")]
    pub link_type: LinkType,
    #[serde(rename = "ip")]
    pub ip_address: Ipv4Addr,
    #[serde(default)]
    pub state: InterfaceState,
}

impl Interface {
    pub fn is_up(&self) -> bool {
        self.state == InterfaceState::Up
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    pub label: String,
    #[serde(default)]
    pub position: Position,
    #[serde(rename = "ip")]
    pub ip_address: Ipv4Addr,
    #[serde(rename = "mac")]
    pub mac_address: String,
    #[serde(default)]
    pub interfaces: Vec<Interface>,
    #[serde(default)]
    pub ospf: Option<OspfState>,
}

impl Device {
    pub fn is_router(&self) -> bool {
        self.device_type.is_router()
    }

    pub fn interface(&self, id: &str) -> Option<&Interface> {
        self.interfaces.iter().find(|i| i.id == id)
    }

    pub fn interface_for_link(&self, link_id: &str) -> Option<&Interface> {
        self.interfaces.iter().find(|i| i.link_id == link_id)
    }

    pub(crate) fn interface_for_link_mut(&mut self, link_id: &str) -> Option<&mut Interface> {
        self.interfaces.iter_mut().find(|i| i.link_id == link_id)
    }

    /// Lowest `ethN` name not already taken on this device.
    pub(crate) fn next_interface_id(&self) -> String {
        (0..)
            .map(|n| format!("eth{n}"))
            .find(|candidate| self.interface(candidate).is_none())
            .unwrap_or_default()
    }

    pub fn ospf_enabled(&self) -> bool {
        self.ospf.as_ref().is_some_and(|o| o.enabled)
    }
}

impl Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}) ip={} mac={}", self.id, self.device_type, self.ip_address, self.mac_address)?;
        write!(
            f,
            "\nInterfaces: {}",
            self.interfaces
                .iter()
                .map(|i| format!("{}->{}", i.id, i.peer_device_id))
                .collect::<Vec<_>>()
                .join(", ")
        )?;
        if let Some(ospf) = &self.ospf {
            write!(f, "\nOSPF: area {} ({} neighbors)", ospf.area, ospf.neighbors.len())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_type_parses_case_insensitively() {
        assert_eq!("Router".parse::<DeviceType>(), Ok(DeviceType::Router));
        assert_eq!("server".parse::<DeviceType>(), Ok(DeviceType::Server));
        assert!("toaster".parse::<DeviceType>().is_err());
    }

    #[test]
    fn next_interface_id_fills_gaps() {
        let json = r#"{
            "id": "R1", "type": "router", "label": "R1",
            "position": {"x": 0.0, "y": 0.0},
            "ip": "10.0.0.1", "mac": "02:00:00:00:00:01",
            "interfaces": [
                {"id": "eth1", "connectedTo": "R2", "linkId": "link_2", "type": "ospf", "ip": "172.16.0.1"}
            ]
        }"#;
        let device: Device = serde_json::from_str(json).unwrap();
        assert_eq!(device.next_interface_id(), "eth0");
        assert!(device.interfaces[0].is_up());
        assert!(device.ospf.is_none());
    }
}
