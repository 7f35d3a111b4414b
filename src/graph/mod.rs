//! The weighted cost graph over drone origins and delivery points.

mod delivery_graph;
mod node;

pub use delivery_graph::{DeliveryGraph, MASS_COST_FACTOR, NO_FLY_PENALTY, PRIORITY_COST_FACTOR};
pub use node::{Node, NodeId, NodeKind};
