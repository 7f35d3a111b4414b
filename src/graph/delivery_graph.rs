//! Complete weighted cost graph over drone origins and delivery points.

use std::collections::HashMap;

use crate::geometry::{NoFlyZone, Point};
use crate::graph::{Node, NodeId, NodeKind};
use crate::models::{Delivery, Drone};

/// Cost added per unit of destination package mass.
pub const MASS_COST_FACTOR: f64 = 100.0;

/// Cost added per inverted priority step of the destination.
pub const PRIORITY_COST_FACTOR: f64 = 100.0;

/// Cost added per active no-fly zone a straight edge crosses.
pub const NO_FLY_PENALTY: f64 = 2000.0;

/// Highest priority rank; lower ranks pay `(MAX_PRIORITY + 1 - rank)` steps.
const MAX_PRIORITY: u8 = 5;

/// The shared cost model: a complete directed graph with one node per drone
/// origin and one per delivery point.
///
/// Edge cost is Euclidean distance plus, for delivery destinations, a mass
/// term and an inverted-priority term, plus a flat penalty per active
/// no-fly zone the straight segment crosses. Zone activity is evaluated at
/// the build timestamp; rebuild to price zones at another time. The graph
/// is immutable after construction.
///
/// # Examples
///
/// ```
/// use skyfleet::geometry::Point;
/// use skyfleet::graph::{DeliveryGraph, NodeId};
/// use skyfleet::models::{Delivery, Drone, TimeWindow};
///
/// let drones = vec![Drone::new(0, 5.0, 10_000.0, 10.0, Point::new(0.0, 0.0))];
/// let deliveries = vec![Delivery::new(
///     1,
///     Point::new(10.0, 0.0),
///     2.0,
///     3,
///     TimeWindow::new(0.0, 60.0).unwrap(),
/// )];
/// let graph = DeliveryGraph::build(&drones, &deliveries, &[], 0.0);
///
/// // 10 distance + 2*100 mass + (6-3)*100 priority.
/// let cost = graph.edge_cost(NodeId::Origin(0), NodeId::Delivery(1));
/// assert!((cost - 510.0).abs() < 1e-10);
///
/// // Reverse direction targets an origin: distance only.
/// let back = graph.edge_cost(NodeId::Delivery(1), NodeId::Origin(0));
/// assert!((back - 10.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone)]
pub struct DeliveryGraph {
    nodes: Vec<Node>,
    index: HashMap<NodeId, usize>,
    edges: HashMap<(NodeId, NodeId), f64>,
    zones: Vec<NoFlyZone>,
    built_at: f64,
}

impl DeliveryGraph {
    /// Builds the complete graph, pricing zone crossings at `at_time`.
    pub fn build(
        drones: &[Drone],
        deliveries: &[Delivery],
        zones: &[NoFlyZone],
        at_time: f64,
    ) -> Self {
        let mut nodes = Vec::with_capacity(drones.len() + deliveries.len());
        for drone in drones {
            nodes.push(Node::new(
                NodeId::Origin(drone.id()),
                drone.origin(),
                NodeKind::Origin,
            ));
        }
        for delivery in deliveries {
            nodes.push(Node::new(
                NodeId::Delivery(delivery.id()),
                delivery.pos(),
                NodeKind::Delivery {
                    mass: delivery.mass(),
                    priority: delivery.priority(),
                    window: delivery.window(),
                },
            ));
        }

        let index = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id(), i))
            .collect();

        let mut graph = Self {
            nodes,
            index,
            edges: HashMap::new(),
            zones: zones.to_vec(),
            built_at: at_time,
        };

        let mut edges = HashMap::with_capacity(graph.nodes.len() * graph.nodes.len());
        for from in &graph.nodes {
            for to in &graph.nodes {
                if from.id() == to.id() {
                    continue;
                }
                edges.insert((from.id(), to.id()), graph.compute_edge_cost(from, to));
            }
        }
        graph.edges = edges;
        graph
    }

    /// Builds the graph with zones priced at the scenario start (t = 0).
    pub fn build_at_start(drones: &[Drone], deliveries: &[Delivery], zones: &[NoFlyZone]) -> Self {
        Self::build(drones, deliveries, zones, 0.0)
    }

    fn compute_edge_cost(&self, from: &Node, to: &Node) -> f64 {
        let distance = from.pos().distance_to(to.pos());
        let mut cost = distance;
        if let NodeKind::Delivery { mass, priority, .. } = *to.kind() {
            cost += mass * MASS_COST_FACTOR;
            cost += f64::from(MAX_PRIORITY + 1 - priority.min(MAX_PRIORITY)) * PRIORITY_COST_FACTOR;
        }
        cost + NO_FLY_PENALTY * self.active_zone_crossings(from.pos(), to.pos(), self.built_at) as f64
    }

    /// Number of zones active at `time` whose boundary the straight segment
    /// `a→b` crosses (or contains an endpoint of).
    pub fn active_zone_crossings(&self, a: Point, b: Point, time: f64) -> usize {
        self.zones
            .iter()
            .filter(|z| z.is_active(time) && z.segment_crosses(a, b))
            .count()
    }

    /// All nodes, drone origins first, then deliveries, in input order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Looks up a node by identity.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.index.get(&id).map(|&i| &self.nodes[i])
    }

    /// Edge cost from `a` to `b`; infinite for any absent pair.
    pub fn edge_cost(&self, a: NodeId, b: NodeId) -> f64 {
        self.edges.get(&(a, b)).copied().unwrap_or(f64::INFINITY)
    }

    /// Travel time between two nodes at the drone's cruise speed, minutes.
    pub fn travel_time(&self, a: NodeId, b: NodeId, drone: &Drone) -> f64 {
        match (self.node(a), self.node(b)) {
            (Some(from), Some(to)) => from.pos().distance_to(to.pos()) / drone.speed(),
            _ => f64::INFINITY,
        }
    }

    /// The zones this graph was built against.
    pub fn zones(&self) -> &[NoFlyZone] {
        &self.zones
    }

    /// Timestamp zone activity was priced at.
    pub fn built_at(&self) -> f64 {
        self.built_at
    }

    /// Delivery nodes within `max_distance` of the drone's current position
    /// whose package the drone could also carry.
    pub fn deliveries_in_range(&self, drone: &Drone, max_distance: f64) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.id().is_delivery())
            .filter(|n| drone.pos().distance_to(n.pos()) <= max_distance)
            .filter(|n| drone.can_carry(n.mass()))
            .map(|n| n.id())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimeWindow;

    fn window() -> TimeWindow {
        TimeWindow::new(0.0, 60.0).expect("valid")
    }

    fn sample_drones() -> Vec<Drone> {
        vec![Drone::new(0, 5.0, 10_000.0, 10.0, Point::new(0.0, 0.0))]
    }

    fn sample_deliveries() -> Vec<Delivery> {
        vec![
            Delivery::new(1, Point::new(10.0, 0.0), 2.0, 3, window()),
            Delivery::new(2, Point::new(20.0, 0.0), 2.0, 3, window()),
        ]
    }

    fn blocking_zone() -> NoFlyZone {
        // A rectangle straddling the segment from (0,0) to (10,0).
        NoFlyZone::new(
            0,
            vec![
                Point::new(4.0, -2.0),
                Point::new(6.0, -2.0),
                Point::new(6.0, 2.0),
                Point::new(4.0, 2.0),
            ],
            0.0,
            100.0,
        )
        .expect("valid zone")
    }

    #[test]
    fn test_build_node_count() {
        let graph = DeliveryGraph::build_at_start(&sample_drones(), &sample_deliveries(), &[]);
        assert_eq!(graph.nodes().len(), 3);
        // Complete directed graph: n*(n-1) edges.
        assert_eq!(graph.edges.len(), 6);
    }

    #[test]
    fn test_edge_cost_terms() {
        let graph = DeliveryGraph::build_at_start(&sample_drones(), &sample_deliveries(), &[]);
        // distance 10 + mass 2*100 + priority (6-3)*100.
        let cost = graph.edge_cost(NodeId::Origin(0), NodeId::Delivery(1));
        assert!((cost - 510.0).abs() < 1e-10);
        // Origin destination: no mass/priority terms.
        let back = graph.edge_cost(NodeId::Delivery(1), NodeId::Origin(0));
        assert!((back - 10.0).abs() < 1e-10);
    }

    #[test]
    fn test_edge_cost_missing_pair_is_infinite() {
        let graph = DeliveryGraph::build_at_start(&sample_drones(), &sample_deliveries(), &[]);
        assert!(graph
            .edge_cost(NodeId::Delivery(99), NodeId::Origin(0))
            .is_infinite());
        assert!(graph
            .edge_cost(NodeId::Origin(0), NodeId::Origin(0))
            .is_infinite());
    }

    #[test]
    fn test_zone_penalty_applied_while_active() {
        let zone = blocking_zone();
        let graph = DeliveryGraph::build(&sample_drones(), &sample_deliveries(), &[zone], 50.0);
        let cost = graph.edge_cost(NodeId::Origin(0), NodeId::Delivery(1));
        assert!((cost - (510.0 + NO_FLY_PENALTY)).abs() < 1e-10);
    }

    #[test]
    fn test_zone_penalty_dropped_after_expiry() {
        let zone = blocking_zone();
        let graph = DeliveryGraph::build(&sample_drones(), &sample_deliveries(), &[zone], 150.0);
        let cost = graph.edge_cost(NodeId::Origin(0), NodeId::Delivery(1));
        assert!((cost - 510.0).abs() < 1e-10);
    }

    #[test]
    fn test_travel_time() {
        let graph = DeliveryGraph::build_at_start(&sample_drones(), &sample_deliveries(), &[]);
        let drone = &sample_drones()[0];
        let t = graph.travel_time(NodeId::Origin(0), NodeId::Delivery(1), drone);
        assert!((t - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_deliveries_in_range() {
        let graph = DeliveryGraph::build_at_start(&sample_drones(), &sample_deliveries(), &[]);
        let drone = &sample_drones()[0];
        let near = graph.deliveries_in_range(drone, 15.0);
        assert_eq!(near, vec![NodeId::Delivery(1)]);
        let all = graph.deliveries_in_range(drone, 100.0);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_deliveries_in_range_respects_capacity() {
        let drones = sample_drones();
        let heavy = vec![Delivery::new(1, Point::new(5.0, 0.0), 6.0, 3, window())];
        let graph = DeliveryGraph::build_at_start(&drones, &heavy, &[]);
        assert!(graph.deliveries_in_range(&drones[0], 100.0).is_empty());
    }
}
