//! Per-drone domain enumeration.
//!
//! A drone's domain is every singleton, pair, and triple of deliveries it
//! could physically complete from its origin and back — checked against
//! payload capacity and energy via a greedy priority-ordered walk, but not
//! against time windows, which the solver's constraints handle — plus the
//! empty set.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{Delivery, Drone};

/// Builds the domain of candidate delivery subsets for every drone.
///
/// Values are deterministic: singles in input order, then pairs, then
/// triples (each in lexicographic index order), then the empty set.
pub fn build_domains(
    drones: &[Drone],
    deliveries: &[Delivery],
) -> BTreeMap<usize, Vec<BTreeSet<usize>>> {
    let mut domains = BTreeMap::new();
    for drone in drones {
        domains.insert(drone.id(), possible_sets(drone, deliveries));
    }
    domains
}

fn possible_sets(drone: &Drone, deliveries: &[Delivery]) -> Vec<BTreeSet<usize>> {
    let mut sets = Vec::new();
    let n = deliveries.len();

    for d in deliveries {
        if can_handle_single(drone, d) {
            sets.push(BTreeSet::from([d.id()]));
        }
    }

    for i in 0..n {
        for j in (i + 1)..n {
            let combo = [&deliveries[i], &deliveries[j]];
            if can_handle_set(drone, &combo) {
                sets.push(combo.iter().map(|d| d.id()).collect());
            }
        }
    }

    for i in 0..n {
        for j in (i + 1)..n {
            for k in (j + 1)..n {
                let combo = [&deliveries[i], &deliveries[j], &deliveries[k]];
                if can_handle_set(drone, &combo) {
                    sets.push(combo.iter().map(|d| d.id()).collect());
                }
            }
        }
    }

    sets.push(BTreeSet::new());
    sets
}

/// Single delivery: package fits and the loaded round trip stays within the
/// energy reserve.
fn can_handle_single(drone: &Drone, delivery: &Delivery) -> bool {
    if delivery.mass() > drone.max_payload() {
        return false;
    }
    let round_trip = 2.0 * drone.origin().distance_to(delivery.pos());
    drone.energy_consumption(round_trip, delivery.mass()) <= drone.energy()
}

/// Multiple deliveries: total mass fits and a greedy priority-descending
/// walk (loading everything up front, returning empty) stays within the
/// energy reserve.
fn can_handle_set(drone: &Drone, deliveries: &[&Delivery]) -> bool {
    let total_mass: f64 = deliveries.iter().map(|d| d.mass()).sum();
    if total_mass > drone.max_payload() {
        return false;
    }

    let mut ordered: Vec<&Delivery> = deliveries.to_vec();
    ordered.sort_by(|a, b| b.priority().cmp(&a.priority()));

    let mut pos = drone.origin();
    let mut mass = 0.0;
    let mut energy = 0.0;
    for d in &ordered {
        let distance = pos.distance_to(d.pos());
        mass += d.mass();
        energy += drone.energy_consumption(distance, mass);
        pos = d.pos();
    }
    energy += drone.energy_consumption(pos.distance_to(drone.origin()), 0.0);

    energy <= drone.energy()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::models::TimeWindow;

    fn window() -> TimeWindow {
        TimeWindow::new(0.0, 100.0).expect("valid")
    }

    fn drone() -> Drone {
        Drone::new(0, 5.0, 100_000.0, 10.0, Point::new(0.0, 0.0))
    }

    #[test]
    fn test_domains_include_all_feasible_sizes() {
        let drones = vec![drone()];
        let deliveries = vec![
            Delivery::new(1, Point::new(10.0, 0.0), 1.0, 3, window()),
            Delivery::new(2, Point::new(0.0, 10.0), 1.0, 3, window()),
            Delivery::new(3, Point::new(-10.0, 0.0), 1.0, 3, window()),
        ];
        let domains = build_domains(&drones, &deliveries);
        let sets = &domains[&0];
        // 3 singles + 3 pairs + 1 triple + empty.
        assert_eq!(sets.len(), 8);
        assert_eq!(sets.last(), Some(&BTreeSet::new()));
    }

    #[test]
    fn test_overweight_delivery_excluded() {
        let drones = vec![drone()];
        let deliveries = vec![
            Delivery::new(1, Point::new(10.0, 0.0), 6.0, 3, window()),
            Delivery::new(2, Point::new(0.0, 10.0), 1.0, 3, window()),
        ];
        let domains = build_domains(&drones, &deliveries);
        let sets = &domains[&0];
        // Only the light single and the empty set survive.
        assert_eq!(sets.len(), 2);
        assert!(sets.contains(&BTreeSet::from([2])));
    }

    #[test]
    fn test_pair_over_capacity_excluded() {
        let drones = vec![drone()];
        let deliveries = vec![
            Delivery::new(1, Point::new(10.0, 0.0), 3.0, 3, window()),
            Delivery::new(2, Point::new(0.0, 10.0), 3.0, 3, window()),
        ];
        let domains = build_domains(&drones, &deliveries);
        let sets = &domains[&0];
        // Two singles + empty, no pair (6 > 5).
        assert_eq!(sets.len(), 3);
        assert!(!sets.iter().any(|s| s.len() == 2));
    }

    #[test]
    fn test_energy_limited_drone() {
        // Round trip of 200 units at mass 1 needs 10*200*1.1 = 2200.
        let drones = vec![Drone::new(0, 5.0, 2_000.0, 10.0, Point::new(0.0, 0.0))];
        let deliveries = vec![Delivery::new(1, Point::new(100.0, 0.0), 1.0, 3, window())];
        let domains = build_domains(&drones, &deliveries);
        assert_eq!(domains[&0], vec![BTreeSet::new()]);
    }
}
