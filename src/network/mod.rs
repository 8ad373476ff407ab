/*
 * This module defines the simulated network's data model: devices with their
 * interfaces, links, and the per-router OSPF state.
 * It also provides pathfinding over the link graph.
 */

pub mod device;
pub mod link;
pub mod path;
pub mod router;
