//! Backtracking assignment solver with optional forward checking.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::csp::build_domains;
use crate::geometry::NoFlyZone;
use crate::models::{Delivery, Drone};

/// A complete assignment: every drone mapped to its committed delivery set.
pub type Assignment = BTreeMap<usize, BTreeSet<usize>>;

type Domains = BTreeMap<usize, Vec<BTreeSet<usize>>>;

/// Zones are tested against the scenario start; the multi-trip scheduler
/// re-checks them at simulated time per leg. The two notions are
/// deliberately independent.
const ZONE_REFERENCE_TIME: f64 = 0.0;

/// Quality metrics for a committed assignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolutionQuality {
    /// Distinct deliveries covered.
    pub covered: usize,
    /// Total deliveries in the scenario.
    pub total: usize,
    /// `covered / total` (zero when there are no deliveries).
    pub coverage_rate: f64,
    /// Drones with a non-empty committed set.
    pub active_drones: usize,
    /// `active_drones / fleet size` (zero for an empty fleet).
    pub utilization: f64,
}

/// Partitions deliveries across the fleet by depth-first backtracking over
/// precomputed per-drone domains.
///
/// Four global constraints gate every tentative assignment: no delivery
/// committed twice, no straight origin→delivery segment through an active
/// zone, arrival times inside windows for multi-delivery sets, and payload
/// capacity. Exhausting the search space yields `None` — an expected
/// outcome, not an error.
///
/// # Examples
///
/// ```
/// use skyfleet::csp::CspSolver;
/// use skyfleet::geometry::Point;
/// use skyfleet::models::{Delivery, Drone, TimeWindow};
///
/// let drones = vec![Drone::new(0, 5.0, 100_000.0, 10.0, Point::new(0.0, 0.0))];
/// let deliveries = vec![Delivery::new(
///     1,
///     Point::new(10.0, 0.0),
///     2.0,
///     3,
///     TimeWindow::new(0.0, 60.0).unwrap(),
/// )];
///
/// let solver = CspSolver::new(&drones, &deliveries, &[]);
/// let solution = solver.solve().unwrap();
/// assert!(solution[&0].contains(&1));
/// ```
pub struct CspSolver<'a> {
    drones: &'a [Drone],
    deliveries: &'a [Delivery],
    zones: &'a [NoFlyZone],
    domains: Domains,
}

impl<'a> CspSolver<'a> {
    /// Builds the solver and enumerates every drone's domain.
    pub fn new(drones: &'a [Drone], deliveries: &'a [Delivery], zones: &'a [NoFlyZone]) -> Self {
        Self {
            drones,
            deliveries,
            zones,
            domains: build_domains(drones, deliveries),
        }
    }

    /// The precomputed per-drone domains.
    pub fn domains(&self) -> &Domains {
        &self.domains
    }

    /// Plain depth-first backtracking in fleet order.
    pub fn solve(&self) -> Option<Assignment> {
        let mut assignment = Assignment::new();
        if self.backtrack(&mut assignment) {
            debug!("backtracking found a full assignment");
            Some(assignment)
        } else {
            debug!("backtracking exhausted the search space");
            None
        }
    }

    fn backtrack(&self, assignment: &mut Assignment) -> bool {
        let Some(drone_id) = self.next_unassigned(assignment) else {
            return true;
        };
        let Some(domain) = self.domains.get(&drone_id) else {
            return false;
        };

        for value in domain {
            assignment.insert(drone_id, value.clone());
            if self.is_consistent(assignment) && self.backtrack(assignment) {
                return true;
            }
            assignment.remove(&drone_id);
        }
        false
    }

    /// Backtracking with most-constrained-variable ordering and forward
    /// checking.
    ///
    /// After each tentative assignment, every unassigned drone's domain is
    /// pruned of subsets overlapping already-committed deliveries; a branch
    /// dies immediately when any live domain empties. Each branch carries
    /// its own domain copy, so there is no restore step on backtrack.
    pub fn solve_with_forward_checking(&self) -> Option<Assignment> {
        let mut assignment = Assignment::new();
        if self.backtrack_with_fc(&mut assignment, self.domains.clone()) {
            debug!("forward-checking search found a full assignment");
            Some(assignment)
        } else {
            debug!("forward-checking search exhausted the search space");
            None
        }
    }

    fn backtrack_with_fc(&self, assignment: &mut Assignment, domains: Domains) -> bool {
        // Most-constrained variable: smallest live domain first.
        let Some(drone_id) = self
            .drones
            .iter()
            .map(|d| d.id())
            .filter(|id| !assignment.contains_key(id))
            .min_by_key(|id| domains.get(id).map_or(usize::MAX, Vec::len))
        else {
            return true;
        };
        let Some(domain) = domains.get(&drone_id) else {
            return false;
        };

        for value in domain {
            assignment.insert(drone_id, value.clone());
            if self.is_consistent(assignment) {
                if let Some(pruned) = self.prune_domains(&domains, assignment) {
                    if self.backtrack_with_fc(assignment, pruned) {
                        return true;
                    }
                }
            }
            assignment.remove(&drone_id);
        }
        false
    }

    /// Removes subsets overlapping committed deliveries from every
    /// unassigned drone's domain; `None` when a live domain empties.
    fn prune_domains(&self, domains: &Domains, assignment: &Assignment) -> Option<Domains> {
        let used: BTreeSet<usize> = assignment.values().flatten().copied().collect();
        let mut next = Domains::new();

        for drone in self.drones {
            let id = drone.id();
            if assignment.contains_key(&id) {
                continue;
            }
            let live: Vec<BTreeSet<usize>> = domains
                .get(&id)
                .map(|sets| {
                    sets.iter()
                        .filter(|s| s.is_disjoint(&used))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            if live.is_empty() {
                return None;
            }
            next.insert(id, live);
        }
        Some(next)
    }

    fn next_unassigned(&self, assignment: &Assignment) -> Option<usize> {
        self.drones
            .iter()
            .map(|d| d.id())
            .find(|id| !assignment.contains_key(id))
    }

    /// Tests the four global constraints over a (possibly partial)
    /// assignment.
    pub fn is_consistent(&self, assignment: &Assignment) -> bool {
        self.unique_constraint(assignment)
            && self.zone_constraint(assignment)
            && self.time_window_constraint(assignment)
            && self.capacity_constraint(assignment)
    }

    /// No delivery committed to more than one drone.
    fn unique_constraint(&self, assignment: &Assignment) -> bool {
        let mut seen = BTreeSet::new();
        for set in assignment.values() {
            for id in set {
                if !seen.insert(*id) {
                    return false;
                }
            }
        }
        true
    }

    /// No straight origin→delivery segment through a zone active at the
    /// reference time.
    fn zone_constraint(&self, assignment: &Assignment) -> bool {
        for (&drone_id, set) in assignment {
            let Some(drone) = self.drone(drone_id) else {
                return false;
            };
            for &delivery_id in set {
                let Some(delivery) = self.delivery(delivery_id) else {
                    return false;
                };
                for zone in self.zones {
                    if zone.is_active(ZONE_REFERENCE_TIME)
                        && zone.segment_crosses(drone.origin(), delivery.pos())
                    {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Drones with two or more deliveries must keep every arrival inside
    /// its window along a priority-descending greedy walk.
    fn time_window_constraint(&self, assignment: &Assignment) -> bool {
        for (&drone_id, set) in assignment {
            if set.len() < 2 {
                continue;
            }
            let Some(drone) = self.drone(drone_id) else {
                return false;
            };
            let mut ordered: Vec<&Delivery> =
                set.iter().filter_map(|&id| self.delivery(id)).collect();
            ordered.sort_by(|a, b| b.priority().cmp(&a.priority()));

            let mut now = 0.0;
            let mut pos = drone.origin();
            for d in ordered {
                now += pos.distance_to(d.pos()) / drone.speed();
                if !d.window().contains(now) {
                    return false;
                }
                pos = d.pos();
            }
        }
        true
    }

    /// Committed mass stays within each drone's payload limit.
    fn capacity_constraint(&self, assignment: &Assignment) -> bool {
        for (&drone_id, set) in assignment {
            let Some(drone) = self.drone(drone_id) else {
                return false;
            };
            let total: f64 = set
                .iter()
                .filter_map(|&id| self.delivery(id))
                .map(|d| d.mass())
                .sum();
            if total > drone.max_payload() {
                return false;
            }
        }
        true
    }

    /// Coverage and fleet-utilization metrics for a solution.
    pub fn solution_quality(&self, solution: &Assignment) -> SolutionQuality {
        let covered: BTreeSet<usize> = solution.values().flatten().copied().collect();
        let active = solution.values().filter(|s| !s.is_empty()).count();
        let total = self.deliveries.len();

        SolutionQuality {
            covered: covered.len(),
            total,
            coverage_rate: if total == 0 {
                0.0
            } else {
                covered.len() as f64 / total as f64
            },
            active_drones: active,
            utilization: if self.drones.is_empty() {
                0.0
            } else {
                active as f64 / self.drones.len() as f64
            },
        }
    }

    fn drone(&self, id: usize) -> Option<&Drone> {
        self.drones.iter().find(|d| d.id() == id)
    }

    fn delivery(&self, id: usize) -> Option<&Delivery> {
        self.deliveries.iter().find(|d| d.id() == id)
    }
}
