/*!
Ready-made example topologies.

- `single_area`: four routers in a partial mesh in area 0, one end host per router.
- `multi_area`: an area 0 backbone of three ABRs, each fronting two routers of its own area.
- `complex`: a core triangle, distribution routers in areas 1..3, access switches and hosts.
*/

use std::{fmt::Display, str::FromStr};

use tracing::info;

use crate::{
    network::{
        device::{DeviceType, Position},
        link::LinkType,
    },
    topology::store::{TopologyError, TopologyStore},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    SingleArea,
    MultiArea,
    Complex,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::SingleArea, Preset::MultiArea, Preset::Complex];

    pub fn name(&self) -> &'static str {
        match self {
            Preset::SingleArea => "single_area",
            Preset::MultiArea => "multi_area",
            Preset::Complex => "complex",
        }
    }

    /// Builds the preset into a fresh store.
    pub fn build(&self, mac_seed: u64) -> Result<TopologyStore, TopologyError> {
        let mut store = TopologyStore::with_mac_seed(mac_seed);
        let layout = match self {
            Preset::SingleArea => &SINGLE_AREA,
            Preset::MultiArea => &MULTI_AREA,
            Preset::Complex => &COMPLEX,
        };
        layout.apply(&mut store)?;
        info!(preset = self.name(), devices = store.device_count(), links = store.link_count(), "preset loaded");
        Ok(store)
    }
}

impl Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.replace('-', "_");
        Preset::ALL
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(&normalized))
            .copied()
            .ok_or_else(|| {
                let names: Vec<_> = Preset::ALL.iter().map(|p| p.name()).collect();
                format!("unknown preset {s:?} (expected one of: {})", names.join(", "))
            })
    }
}

// (id, type, ospf area, x, y)
type DeviceRow = (&'static str, DeviceType, u32, f64, f64);
// (a, b, type, cost, area)
type LinkRow = (&'static str, &'static str, LinkType, u32, u32);

struct Layout {
    devices: &'static [DeviceRow],
    links: &'static [LinkRow],
}

impl Layout {
    fn apply(&self, store: &mut TopologyStore) -> Result<(), TopologyError> {
        for &(id, device_type, area, x, y) in self.devices {
            store.add_device_with_id(id, device_type, Position::new(x, y))?;
            if device_type.is_router() {
                store.configure_ospf(id, area, true)?;
            }
        }
        for &(a, b, link_type, cost, area) in self.links {
            store.add_link(a, b, link_type, Some(cost), Some(area))?;
        }
        Ok(())
    }
}

use DeviceType::{Laptop, Pc, Phone, Router, Server, Switch};
use LinkType::{Access, Ospf};

static SINGLE_AREA: Layout = Layout {
    devices: &[
        ("R1", Router, 0, 150.0, 200.0),
        ("R2", Router, 0, 300.0, 200.0),
        ("R3", Router, 0, 450.0, 200.0),
        ("R4", Router, 0, 600.0, 200.0),
        ("PC1", Pc, 0, 150.0, 350.0),
        ("Server1", Server, 0, 300.0, 350.0),
        ("Laptop1", Laptop, 0, 450.0, 350.0),
        ("Phone1", Phone, 0, 600.0, 350.0),
    ],
    links: &[
        ("R1", "R2", Ospf, 10, 0),
        ("R2", "R3", Ospf, 20, 0),
        ("R3", "R4", Ospf, 10, 0),
        ("R1", "R4", Ospf, 30, 0),
        ("R2", "R4", Ospf, 15, 0),
        ("R1", "PC1", Access, 1, 0),
        ("R2", "Server1", Access, 1, 0),
        ("R3", "Laptop1", Access, 1, 0),
        ("R4", "Phone1", Access, 1, 0),
    ],
};

static MULTI_AREA: Layout = Layout {
    devices: &[
        ("ABR1", Router, 0, 200.0, 200.0),
        ("ABR2", Router, 0, 400.0, 200.0),
        ("ABR3", Router, 0, 600.0, 200.0),
        ("R1-A1", Router, 1, 100.0, 100.0),
        ("R2-A1", Router, 1, 200.0, 100.0),
        ("R1-A2", Router, 2, 400.0, 100.0),
        ("R2-A2", Router, 2, 500.0, 100.0),
        ("R1-A3", Router, 3, 600.0, 100.0),
        ("R2-A3", Router, 3, 700.0, 100.0),
        ("PC-A1", Pc, 0, 50.0, 50.0),
        ("Server-A1", Server, 0, 250.0, 50.0),
        ("Laptop-A2", Laptop, 0, 350.0, 50.0),
        ("Phone-A2", Phone, 0, 550.0, 50.0),
        ("PC-A3", Pc, 0, 550.0, 50.0),
        ("Server-A3", Server, 0, 750.0, 50.0),
    ],
    links: &[
        ("ABR1", "ABR2", Ospf, 10, 0),
        ("ABR2", "ABR3", Ospf, 15, 0),
        ("R1-A1", "ABR1", Ospf, 5, 1),
        ("R2-A1", "ABR1", Ospf, 5, 1),
        ("R1-A2", "ABR2", Ospf, 5, 2),
        ("R2-A2", "ABR2", Ospf, 5, 2),
        ("R1-A3", "ABR3", Ospf, 5, 3),
        ("R2-A3", "ABR3", Ospf, 5, 3),
        ("R1-A1", "R2-A1", Ospf, 10, 1),
        ("R1-A2", "R2-A2", Ospf, 15, 2),
        ("R1-A3", "R2-A3", Ospf, 20, 3),
        ("R1-A1", "PC-A1", Access, 1, 1),
        ("R2-A1", "Server-A1", Access, 1, 1),
        ("R1-A2", "Laptop-A2", Access, 1, 2),
        ("R2-A2", "Phone-A2", Access, 1, 2),
        ("R1-A3", "PC-A3", Access, 1, 3),
        ("R2-A3", "Server-A3", Access, 1, 3),
    ],
};

static COMPLEX: Layout = Layout {
    devices: &[
        ("Core1", Router, 0, 300.0, 300.0),
        ("Core2", Router, 0, 500.0, 300.0),
        ("Core3", Router, 0, 400.0, 200.0),
        ("Dist1-A1", Router, 1, 200.0, 200.0),
        ("Dist2-A1", Router, 1, 200.0, 400.0),
        ("Dist1-A2", Router, 2, 600.0, 200.0),
        ("Dist2-A2", Router, 2, 600.0, 400.0),
        ("Dist1-A3", Router, 3, 400.0, 50.0),
        ("SW1-A1", Switch, 0, 100.0, 150.0),
        ("SW2-A1", Switch, 0, 100.0, 450.0),
        ("SW1-A2", Switch, 0, 700.0, 150.0),
        ("SW2-A2", Switch, 0, 700.0, 450.0),
        ("SW1-A3", Switch, 0, 400.0, 0.0),
        ("PC1-A1", Pc, 0, 50.0, 100.0),
        ("PC2-A1", Pc, 0, 50.0, 200.0),
        ("Server-A1", Server, 0, 50.0, 400.0),
        ("Laptop-A1", Laptop, 0, 50.0, 500.0),
        ("PC1-A2", Pc, 0, 750.0, 100.0),
        ("PC2-A2", Pc, 0, 750.0, 200.0),
        ("Server-A2", Server, 0, 750.0, 400.0),
        ("Phone-A2", Phone, 0, 750.0, 500.0),
        ("Admin-PC", Pc, 0, 350.0, -50.0),
        ("NAS", Server, 0, 450.0, -50.0),
    ],
    links: &[
        ("Core1", "Core2", Ospf, 5, 0),
        ("Core2", "Core3", Ospf, 5, 0),
        ("Core3", "Core1", Ospf, 5, 0),
        ("Dist1-A1", "Core1", Ospf, 10, 1),
        ("Dist2-A1", "Core1", Ospf, 10, 1),
        ("Dist1-A2", "Core2", Ospf, 10, 2),
        ("Dist2-A2", "Core2", Ospf, 10, 2),
        ("Dist1-A3", "Core3", Ospf, 10, 3),
        ("Dist1-A1", "SW1-A1", Access, 1, 1),
        ("Dist2-A1", "SW2-A1", Access, 1, 1),
        ("Dist1-A2", "SW1-A2", Access, 1, 2),
        ("Dist2-A2", "SW2-A2", Access, 1, 2),
        ("Dist1-A3", "SW1-A3", Access, 1, 3),
        ("SW1-A1", "PC1-A1", Access, 1, 0),
        ("SW1-A1", "PC2-A1", Access, 1, 0),
        ("SW2-A1", "Server-A1", Access, 1, 0),
        ("SW2-A1", "Laptop-A1", Access, 1, 0),
        ("SW1-A2", "PC1-A2", Access, 1, 0),
        ("SW1-A2", "PC2-A2", Access, 1, 0),
        ("SW2-A2", "Server-A2", Access, 1, 0),
        ("SW2-A2", "Phone-A2", Access, 1, 0),
        ("SW1-A3", "Admin-PC", Access, 1, 0),
        ("SW1-A3", "NAS", Access, 1, 0),
    ],
};
