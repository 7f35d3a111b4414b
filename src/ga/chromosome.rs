//! Partition chromosome for the genetic optimizer.

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;

use crate::geometry::NoFlyZone;
use crate::models::{Delivery, Drone};

/// Fitness reward per completed delivery.
const DELIVERY_REWARD: f64 = 500.0;

/// Fitness cost per unit of energy spent.
const ENERGY_WEIGHT: f64 = 0.1;

/// Fitness cost per constraint violation.
const VIOLATION_PENALTY: f64 = 1000.0;

/// A candidate solution: each drone mapped to an (order-irrelevant) list of
/// delivery IDs, covering a subset of all deliveries with no delivery under
/// more than one drone.
///
/// Carries a cached fitness score and a feasibility flag, both refreshed by
/// [`evaluate`](Chromosome::evaluate).
///
/// # Examples
///
/// ```
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
/// use skyfleet::ga::Chromosome;
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
/// let mut rng = StdRng::seed_from_u64(42);
/// let mut c = Chromosome::new(&drones);
/// c.randomize(&mut rng, &drones, &deliveries);
/// c.evaluate(&drones, &deliveries, &[]);
/// assert!(c.fitness() > 0.0);
/// assert!(c.is_feasible_cached());
/// ```
#[derive(Debug, Clone)]
pub struct Chromosome {
    genes: BTreeMap<usize, Vec<usize>>,
    fitness: f64,
    feasible: bool,
}

impl Chromosome {
    /// Creates an empty chromosome covering no deliveries.
    pub fn new(drones: &[Drone]) -> Self {
        Self {
            genes: drones.iter().map(|d| (d.id(), Vec::new())).collect(),
            fitness: f64::NEG_INFINITY,
            feasible: true,
        }
    }

    /// The drone→delivery-list mapping.
    pub fn genes(&self) -> &BTreeMap<usize, Vec<usize>> {
        &self.genes
    }

    /// Mutable access for the genetic operators.
    pub fn genes_mut(&mut self) -> &mut BTreeMap<usize, Vec<usize>> {
        &mut self.genes
    }

    /// Cached fitness from the last [`evaluate`](Chromosome::evaluate).
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    /// Cached feasibility from the last [`evaluate`](Chromosome::evaluate).
    pub fn is_feasible_cached(&self) -> bool {
        self.feasible
    }

    /// Every delivery ID assigned to some drone.
    pub fn assigned(&self) -> BTreeSet<usize> {
        self.genes.values().flatten().copied().collect()
    }

    /// Number of deliveries covered.
    pub fn delivered_count(&self) -> usize {
        self.genes.values().map(Vec::len).sum()
    }

    /// Fills the chromosome randomly: deliveries are visited in shuffled
    /// order and each is appended to a uniformly chosen drone whose running
    /// mass still fits; deliveries with no eligible drone stay unassigned.
    pub fn randomize<R: Rng>(&mut self, rng: &mut R, drones: &[Drone], deliveries: &[Delivery]) {
        let mut order: Vec<usize> = deliveries.iter().map(|d| d.id()).collect();
        // Fisher-Yates shuffle
        for i in (1..order.len()).rev() {
            let j = rng.random_range(0..=i);
            order.swap(i, j);
        }

        for id in order {
            let Some(mass) = delivery_mass(deliveries, id) else {
                continue;
            };
            let eligible: Vec<usize> = drones
                .iter()
                .filter(|drone| self.load_of(drone.id(), deliveries) + mass <= drone.max_payload())
                .map(|drone| drone.id())
                .collect();
            if !eligible.is_empty() {
                let chosen = eligible[rng.random_range(0..eligible.len())];
                if let Some(list) = self.genes.get_mut(&chosen) {
                    list.push(id);
                }
            }
        }
    }

    /// Total assigned mass for one drone.
    fn load_of(&self, drone_id: usize, deliveries: &[Delivery]) -> f64 {
        self.genes
            .get(&drone_id)
            .map(|list| {
                list.iter()
                    .filter_map(|&id| delivery_mass(deliveries, id))
                    .sum()
            })
            .unwrap_or(0.0)
    }

    /// Recomputes and caches fitness:
    /// `500·delivered − 0.1·energy − 1000·violations`.
    ///
    /// Per-drone metrics come from a priority-descending greedy walk from
    /// the origin: running mass over capacity, an arrival outside a window,
    /// and a leg crossing a zone active at the simulated arrival time each
    /// count one violation; energy follows the shared consumption formula
    /// including the empty return leg.
    pub fn evaluate(
        &mut self,
        drones: &[Drone],
        deliveries: &[Delivery],
        zones: &[NoFlyZone],
    ) -> f64 {
        let mut delivered = 0usize;
        let mut energy = 0.0;
        let mut violations = 0usize;

        for drone in drones {
            let Some(list) = self.genes.get(&drone.id()) else {
                continue;
            };
            if list.is_empty() {
                continue;
            }
            delivered += list.len();
            let (e, v) = drone_metrics(drone, list, deliveries, zones);
            energy += e;
            violations += v;
        }

        self.fitness = delivered as f64 * DELIVERY_REWARD
            - energy * ENERGY_WEIGHT
            - violations as f64 * VIOLATION_PENALTY;
        self.feasible = self.is_feasible(drones, deliveries);
        self.fitness
    }

    /// Returns `true` when every drone's assigned mass fits its payload.
    pub fn is_feasible(&self, drones: &[Drone], deliveries: &[Delivery]) -> bool {
        drones
            .iter()
            .all(|d| self.load_of(d.id(), deliveries) <= d.max_payload())
    }

    /// Capacity repair: walks each drone's list in order, keeping a
    /// delivery only while the running mass stays within capacity and
    /// dropping everything after the first breach.
    ///
    /// The truncation point depends solely on list order; the fitness
    /// function is tuned against exactly this rule.
    pub fn repair(&mut self, drones: &[Drone], deliveries: &[Delivery]) {
        for drone in drones {
            let Some(list) = self.genes.get_mut(&drone.id()) else {
                continue;
            };
            let mut running = 0.0;
            list.retain(|&id| match delivery_mass(deliveries, id) {
                Some(mass) if running + mass <= drone.max_payload() => {
                    running += mass;
                    true
                }
                _ => false,
            });
        }
    }
}

fn delivery_mass(deliveries: &[Delivery], id: usize) -> Option<f64> {
    deliveries.iter().find(|d| d.id() == id).map(|d| d.mass())
}

/// Energy spent and violations incurred by one drone serving its list via a
/// priority-descending greedy walk.
fn drone_metrics(
    drone: &Drone,
    list: &[usize],
    deliveries: &[Delivery],
    zones: &[NoFlyZone],
) -> (f64, usize) {
    let mut ordered: Vec<&Delivery> = list
        .iter()
        .filter_map(|&id| deliveries.iter().find(|d| d.id() == id))
        .collect();
    ordered.sort_by(|a, b| b.priority().cmp(&a.priority()));

    let mut energy = 0.0;
    let mut violations = 0usize;
    let mut pos = drone.origin();
    let mut mass = 0.0;
    let mut now = 0.0;

    for d in ordered {
        let distance = pos.distance_to(d.pos());
        mass += d.mass();
        if mass > drone.max_payload() {
            violations += 1;
        }
        energy += drone.energy_consumption(distance, mass);
        now += distance / drone.speed();
        if !d.window().contains(now) {
            violations += 1;
        }
        for zone in zones {
            if zone.is_active(now) && zone.segment_crosses(pos, d.pos()) {
                violations += 1;
            }
        }
        pos = d.pos();
    }

    energy += drone.energy_consumption(pos.distance_to(drone.origin()), 0.0);
    (energy, violations)
}
