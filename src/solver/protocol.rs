/*!
Wire format of the external OSPF solver (`POST {endpoint}/ospf`).
*/

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    network::{
        device::DeviceId,
        router::{Lsdb, Neighbor, Route},
    },
    ospf::step::Step,
    topology::snapshot::TopologySnapshot,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverRequest {
    pub topology: TopologySnapshot,
    /// Ask for the full step log, not only final state.
    pub step_by_step: bool,
}

/// Final state the solver computed for one router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingTableReport {
    pub router: DeviceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<u32>,
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub lsdb: Lsdb,
    #[serde(default)]
    pub neighbors: Vec<Neighbor>,
    #[serde(default)]
    pub is_abr: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverResponse {
    pub success: bool,
    /// Area id (as a string key) to the routers in it.
    #[serde(default)]
    pub areas: BTreeMap<String, Vec<DeviceId>>,
    #[serde(default)]
    pub abrs: Vec<DeviceId>,
    #[serde(default)]
    pub steps: Option<Vec<Step>>,
    #[serde(default)]
    pub routing_tables: Vec<RoutingTableReport>,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_accepts_minimal_failure() {
        let response: SolverResponse =
            serde_json::from_str(r#"{"success": false, "error": "bad topology"}"#).unwrap();
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("bad topology"));
        assert!(response.steps.is_none());
    }

    #[test]
    fn routing_table_ignores_extra_lsa_fields() {
        let json = r#"{
            "router": "R1",
            "area": 0,
            "routes": [{"destination": "R2", "next_hop": "R2", "cost": 10, "path": ["R1", "R2"]}],
            "lsdb": {"R1": {"id": "LSA-R1", "router_id": "R1", "sequence": 1, "age": 0, "area": 0,
                            "type": "Router", "links": [{"neighbor": "R2", "cost": 10, "interface": "eth0"}]}},
            "neighbors": [{"routerId": "R2", "state": "Full", "area": 0, "interface": "eth0"}]
        }"#;
        let report: RoutingTableReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.routes[0].next_hop.as_deref(), Some("R2"));
        assert_eq!(report.lsdb["R1"].links[0].neighbor_id, "R2");
        assert!(!report.is_abr);
    }
}
