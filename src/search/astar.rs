//! A*-style route construction with capacity and time-window pruning.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use log::debug;

use crate::graph::{DeliveryGraph, NodeId, NodeKind};
use crate::models::Drone;
use crate::search::RouteStats;

/// Heuristic penalty per active zone on the straight line to a goal.
///
/// Kept below the edge penalty so the estimate stays optimistic.
const HEURISTIC_NO_FLY_PENALTY: f64 = 1000.0;

/// A frontier entry. Ordered so the binary max-heap pops the lowest `f`
/// first, with equal-`f` ties broken by insertion order (FIFO).
struct SearchState {
    f: f64,
    seq: u64,
    g: f64,
    node: NodeId,
    path: Vec<NodeId>,
    time: f64,
    mass: f64,
}

impl PartialEq for SearchState {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SearchState {}

impl PartialOrd for SearchState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SearchState {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Informed route search over a [`DeliveryGraph`].
///
/// Routes honor the drone's payload capacity and every delivery's time
/// window as hard pruning rules; infeasibility is reported through the
/// return value, never as an error.
///
/// # Examples
///
/// ```
/// use std::collections::HashSet;
///
/// use skyfleet::geometry::Point;
/// use skyfleet::graph::{DeliveryGraph, NodeId};
/// use skyfleet::models::{Delivery, Drone, TimeWindow};
/// use skyfleet::search::RoutePlanner;
///
/// let drones = vec![Drone::new(0, 5.0, 1_000_000.0, 10.0, Point::new(0.0, 0.0))];
/// let deliveries = vec![Delivery::new(
///     1,
///     Point::new(10.0, 0.0),
///     2.0,
///     3,
///     TimeWindow::new(0.0, 60.0).unwrap(),
/// )];
/// let graph = DeliveryGraph::build_at_start(&drones, &deliveries, &[]);
/// let planner = RoutePlanner::new(&graph);
///
/// let path = planner
///     .find_path(
///         NodeId::Origin(0),
///         &[NodeId::Delivery(1)],
///         &drones[0],
///         0.0,
///         &HashSet::new(),
///     )
///     .unwrap();
/// assert_eq!(path, vec![NodeId::Origin(0), NodeId::Delivery(1)]);
/// ```
pub struct RoutePlanner<'a> {
    graph: &'a DeliveryGraph,
}

impl<'a> RoutePlanner<'a> {
    /// Creates a planner over the given graph.
    pub fn new(graph: &'a DeliveryGraph) -> Self {
        Self { graph }
    }

    /// Admissible-in-practice estimate from `from` to `to`: straight-line
    /// distance plus a reduced penalty per zone active at `time` on that
    /// line. Capacity and window feasibility are deliberately not part of
    /// the estimate; they prune hard during expansion instead.
    fn heuristic(&self, from: NodeId, to: NodeId, time: f64) -> f64 {
        let (from, to) = match (self.graph.node(from), self.graph.node(to)) {
            (Some(a), Some(b)) => (a, b),
            _ => return f64::INFINITY,
        };
        let distance = from.pos().distance_to(to.pos());
        let crossings = self
            .graph
            .active_zone_crossings(from.pos(), to.pos(), time) as f64;
        distance + crossings * HEURISTIC_NO_FLY_PENALTY
    }

    /// A* search from `start` to any node in `goals`.
    ///
    /// Expands frontier entries in `f = g + h` order. Delivery neighbors
    /// are pruned when the accumulated path mass would exceed the drone's
    /// payload, or the projected arrival time falls outside their window;
    /// nodes in `avoid` are never expanded. Returns the node sequence of
    /// the first goal reached, or `None` when the frontier empties.
    pub fn find_path(
        &self,
        start: NodeId,
        goals: &[NodeId],
        drone: &Drone,
        start_time: f64,
        avoid: &HashSet<NodeId>,
    ) -> Option<Vec<NodeId>> {
        let mut open = BinaryHeap::new();
        let mut seq = 0u64;
        open.push(SearchState {
            f: 0.0,
            seq,
            g: 0.0,
            node: start,
            path: vec![start],
            time: start_time,
            mass: 0.0,
        });

        let mut closed: HashSet<NodeId> = HashSet::new();
        let mut g_scores: HashMap<NodeId, f64> = HashMap::from([(start, 0.0)]);

        while let Some(state) = open.pop() {
            if goals.contains(&state.node) {
                debug!(
                    "path to {} found, cost {:.1}, {} hops",
                    state.node,
                    state.g,
                    state.path.len() - 1
                );
                return Some(state.path);
            }
            if !closed.insert(state.node) {
                continue;
            }

            for neighbor in self.graph.nodes() {
                let id = neighbor.id();
                if id == state.node || avoid.contains(&id) {
                    continue;
                }

                let mut mass = state.mass;
                if let NodeKind::Delivery { mass: m, .. } = *neighbor.kind() {
                    mass += m;
                    if mass > drone.max_payload() {
                        continue;
                    }
                }

                let arrival = state.time + self.graph.travel_time(state.node, id, drone);
                if let Some(window) = neighbor.window() {
                    if !window.contains(arrival) {
                        continue;
                    }
                }

                let tentative = state.g + self.graph.edge_cost(state.node, id);
                if g_scores.get(&id).is_none_or(|&g| tentative < g) {
                    g_scores.insert(id, tentative);
                    let h = goals
                        .iter()
                        .map(|&goal| self.heuristic(id, goal, arrival))
                        .fold(f64::INFINITY, f64::min);
                    let mut path = state.path.clone();
                    path.push(id);
                    seq += 1;
                    open.push(SearchState {
                        f: tentative + h,
                        seq,
                        g: tentative,
                        node: id,
                        path,
                        time: arrival,
                        mass,
                    });
                }
            }
        }

        debug!("no path from {start} to any of {} goals", goals.len());
        None
    }

    /// Runs an independent [`find_path`](Self::find_path) from the drone's
    /// origin to each candidate delivery and keeps the cheapest result.
    ///
    /// Returns `None` when no candidate is reachable. Deliberately not a
    /// joint optimization over the candidate set.
    pub fn find_optimal_single_delivery_route(
        &self,
        drone: &Drone,
        candidates: &[usize],
        time: f64,
    ) -> Option<(Vec<NodeId>, f64)> {
        let start = NodeId::Origin(drone.id());
        let avoid = HashSet::new();
        let mut best: Option<(Vec<NodeId>, f64)> = None;

        for &id in candidates {
            let goal = NodeId::Delivery(id);
            if let Some(path) = self.find_path(start, &[goal], drone, time, &avoid) {
                let cost = self.route_cost(&path);
                if best.as_ref().is_none_or(|(_, c)| cost < *c) {
                    best = Some((path, cost));
                }
            }
        }
        best
    }

    /// Greedy multi-stop route: starting at the drone's origin, repeatedly
    /// appends the cheapest-edge candidate that still fits the payload and
    /// whose window contains the projected arrival, advancing simulated
    /// position, time and mass, until no candidate qualifies or `max_stops`
    /// is reached.
    ///
    /// Cheaper than per-candidate A* and the strategy of choice for larger
    /// candidate sets. Returns just the origin when nothing fits.
    pub fn find_multi_delivery_route(
        &self,
        drone: &Drone,
        candidates: &[usize],
        time: f64,
        max_stops: usize,
    ) -> Vec<NodeId> {
        let start = NodeId::Origin(drone.id());
        let mut route = vec![start];
        let mut remaining: Vec<usize> = candidates.to_vec();
        let mut current = start;
        let mut mass = 0.0;
        let mut now = time;

        while !remaining.is_empty() && route.len() - 1 < max_stops {
            let mut best: Option<(usize, f64)> = None;

            for (i, &id) in remaining.iter().enumerate() {
                let node_id = NodeId::Delivery(id);
                let node = match self.graph.node(node_id) {
                    Some(n) => n,
                    None => continue,
                };
                if mass + node.mass() > drone.max_payload() {
                    continue;
                }
                let arrival = now + self.graph.travel_time(current, node_id, drone);
                if !node.window().is_some_and(|w| w.contains(arrival)) {
                    continue;
                }
                let cost = self.graph.edge_cost(current, node_id);
                if best.is_none_or(|(_, c)| cost < c) {
                    best = Some((i, cost));
                }
            }

            let Some((i, _)) = best else { break };
            let id = remaining.remove(i);
            let node_id = NodeId::Delivery(id);
            now += self.graph.travel_time(current, node_id, drone);
            mass += self.graph.node(node_id).map_or(0.0, |n| n.mass());
            route.push(node_id);
            current = node_id;
        }

        route
    }

    /// Sum of consecutive edge costs along `path`.
    pub fn route_cost(&self, path: &[NodeId]) -> f64 {
        path.windows(2)
            .map(|pair| self.graph.edge_cost(pair[0], pair[1]))
            .sum()
    }

    /// Replays `path`, accumulating mass, elapsed time and energy draw.
    ///
    /// Fails closed: returns `false` at the first capacity, time-window, or
    /// negative-energy violation. Pure with respect to its inputs, so
    /// repeated calls agree.
    pub fn is_route_feasible(&self, path: &[NodeId], drone: &Drone, start_time: f64) -> bool {
        let mut mass = 0.0;
        let mut now = start_time;
        let mut energy = drone.energy();

        for pair in path.windows(2) {
            let (from, to) = match (self.graph.node(pair[0]), self.graph.node(pair[1])) {
                (Some(a), Some(b)) => (a, b),
                _ => return false,
            };
            let distance = from.pos().distance_to(to.pos());
            now += distance / drone.speed();

            if let NodeKind::Delivery { mass: m, window, .. } = *to.kind() {
                mass += m;
                if mass > drone.max_payload() {
                    return false;
                }
                if !window.contains(now) {
                    return false;
                }
            }

            energy -= drone.energy_consumption(distance, mass);
            if energy < 0.0 {
                return false;
            }
        }
        true
    }

    /// Read-only aggregate over `path`: distance, time, energy, delivery
    /// count and summed edge cost.
    pub fn route_statistics(&self, path: &[NodeId], drone: &Drone, _start_time: f64) -> RouteStats {
        let mut stats = RouteStats::default();
        let mut mass = 0.0;

        for pair in path.windows(2) {
            let (from, to) = match (self.graph.node(pair[0]), self.graph.node(pair[1])) {
                (Some(a), Some(b)) => (a, b),
                _ => continue,
            };
            let distance = from.pos().distance_to(to.pos());
            stats.distance += distance;
            stats.time += distance / drone.speed();

            if to.id().is_delivery() {
                mass += to.mass();
                stats.deliveries += 1;
            }
            stats.energy += drone.energy_consumption(distance, mass);
        }

        stats.cost = self.route_cost(path);
        stats
    }
}
