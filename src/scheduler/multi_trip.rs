//! The multi-trip delivery loop.

use std::collections::BTreeMap;

use log::{debug, info, warn};

use crate::graph::NodeId;
use crate::models::{Delivery, Drone};
use crate::scheduler::{DroneReport, TripRecord};

/// Assumed distance of one delivery leg in the pre-flight energy estimate.
const AVG_LEG_DISTANCE: f64 = 50.0;

/// Flat distance added to every pre-flight energy estimate.
const PRE_FLIGHT_BASE_DISTANCE: f64 = 100.0;

/// Fraction of the reserve a trip's estimated energy may claim.
const ENERGY_SAFETY_MARGIN: f64 = 0.7;

/// Tunable parameters of the multi-trip scheduler.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// Simulation horizon in minutes.
    pub horizon: f64,
    /// Minutes spent per recharge cycle.
    pub charge_duration: f64,
    /// Energy fraction below which a drone recharges before planning.
    pub battery_threshold: f64,
    /// Minutes past a window close within which a delivery is still taken.
    pub late_grace: f64,
    /// Minutes spent at each delivery stop.
    pub service_time: f64,
    /// Maximum deliveries per trip.
    pub max_per_trip: usize,
    /// Minutes force-advanced when a full pass makes no progress.
    pub stuck_advance: f64,
    /// Consecutive no-progress passes before the run aborts.
    pub stuck_limit: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            horizon: 480.0,
            charge_duration: 30.0,
            battery_threshold: 0.3,
            late_grace: 120.0,
            service_time: 2.0,
            max_per_trip: 8,
            stuck_advance: 30.0,
            stuck_limit: 10,
        }
    }
}

impl SchedulerConfig {
    /// Sets the simulation horizon.
    pub fn with_horizon(mut self, minutes: f64) -> Self {
        self.horizon = minutes;
        self
    }

    /// Sets the per-trip delivery cap.
    pub fn with_max_per_trip(mut self, max: usize) -> Self {
        self.max_per_trip = max;
        self
    }

    /// Sets the stuck-counter limit.
    pub fn with_stuck_limit(mut self, limit: usize) -> Self {
        self.stuck_limit = limit;
        self
    }
}

/// Run states of the scheduler loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Selecting and executing trips.
    Planning,
    /// A drone is recharging at its origin.
    Charging,
    /// The stuck-counter circuit breaker fired; the run was aborted.
    Stuck,
    /// The run finished: no pending deliveries or horizon reached.
    Done,
}

/// Outcome of a scheduler run.
#[derive(Debug, Clone)]
pub struct ScheduleResult {
    /// Final state: [`RunState::Done`], or [`RunState::Stuck`] when the
    /// circuit breaker aborted the run.
    pub state: RunState,
    /// IDs of committed deliveries, in commit order.
    pub completed: Vec<usize>,
    /// Trip logs per drone.
    pub trips: BTreeMap<usize, Vec<TripRecord>>,
    /// Derived per-drone reports.
    pub reports: BTreeMap<usize, DroneReport>,
    /// Reconstructed full routes per drone with at least one trip:
    /// origin, first trip's visits, origin, next trip's visits, origin, …
    pub routes: BTreeMap<usize, Vec<NodeId>>,
    /// Total trips flown across the fleet.
    pub total_trips: usize,
    /// Committed deliveries over the scenario total, `0..=1`.
    pub delivery_rate: f64,
    /// Simulated time when the loop ended.
    pub end_time: f64,
}

/// Drives repeated single-trip planning, simulated execution and recharge
/// cycles across a bounded time horizon.
///
/// Each pass visits every drone in fleet order: a drone below the energy
/// threshold flies home and recharges; otherwise it greedily assembles a
/// trip from the pending pool ((priority desc, mass asc), capacity, a late
/// grace period and an approximate pre-flight energy budget) and executes
/// it, advancing simulated time. A stuck counter force-advances time when a
/// full pass commits nothing and aborts the run after repeated strikes, so
/// the loop always terminates.
///
/// # Examples
///
/// ```
/// use skyfleet::geometry::Point;
/// use skyfleet::models::{Delivery, Drone, TimeWindow};
/// use skyfleet::scheduler::{MultiTripScheduler, RunState, SchedulerConfig};
///
/// let mut drones = vec![Drone::new(0, 5.0, 100_000.0, 10.0, Point::new(0.0, 0.0))];
/// let mut deliveries = vec![Delivery::new(
///     1,
///     Point::new(10.0, 0.0),
///     2.0,
///     3,
///     TimeWindow::new(0.0, 60.0).unwrap(),
/// )];
///
/// let scheduler = MultiTripScheduler::new(SchedulerConfig::default());
/// let result = scheduler.run(&mut drones, &mut deliveries);
/// assert_eq!(result.state, RunState::Done);
/// assert_eq!(result.completed, vec![1]);
/// assert!(deliveries[0].is_delivered());
/// ```
pub struct MultiTripScheduler {
    config: SchedulerConfig,
}

impl MultiTripScheduler {
    /// Creates a scheduler with the given configuration.
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Runs the full loop. Drones are reset first; deliveries are marked
    /// delivered in place as trips commit them.
    pub fn run(&self, drones: &mut [Drone], deliveries: &mut [Delivery]) -> ScheduleResult {
        for drone in drones.iter_mut() {
            drone.reset();
        }

        let mut pending: Vec<usize> = deliveries.iter().map(|d| d.id()).collect();
        let mut completed: Vec<usize> = Vec::new();
        let mut trips: BTreeMap<usize, Vec<TripRecord>> =
            drones.iter().map(|d| (d.id(), Vec::new())).collect();

        let mut now = 0.0;
        let mut stuck = 0usize;
        let mut total_trips = 0usize;
        let mut state = RunState::Planning;

        info!(
            "multi-trip run: {} drones, {} deliveries, horizon {} min",
            drones.len(),
            deliveries.len(),
            self.config.horizon
        );

        while !pending.is_empty() && now < self.config.horizon {
            debug!("t={now:.0} min, {} pending", pending.len());
            let mut progress = false;

            for drone in drones.iter_mut() {
                if now >= self.config.horizon {
                    break;
                }

                if drone.energy() < drone.max_energy() * self.config.battery_threshold {
                    state = RunState::Charging;
                    let (elapsed, charged) = self.charge_cycle(drone);
                    now += elapsed;
                    if charged {
                        progress = true;
                    }
                    continue;
                }

                state = RunState::Planning;
                let trip = self.plan_single_trip(drone, &pending, deliveries, now);
                if trip.is_empty() {
                    continue;
                }

                let record = self.execute_trip(drone, &trip, deliveries, now);
                if record.deliveries.is_empty() {
                    continue;
                }

                now = record.end_time;
                total_trips += 1;
                progress = true;
                pending.retain(|id| !record.deliveries.contains(id));
                completed.extend(&record.deliveries);
                if let Some(log) = trips.get_mut(&drone.id()) {
                    let mut record = record;
                    record.number = log.len() + 1;
                    log.push(record);
                }
            }

            if !progress && !pending.is_empty() {
                stuck += 1;
                warn!(
                    "no progress at t={now:.0}, advancing {} min ({stuck}/{})",
                    self.config.stuck_advance, self.config.stuck_limit
                );
                now += self.config.stuck_advance;
                if stuck >= self.config.stuck_limit {
                    warn!("stuck limit reached, aborting run");
                    state = RunState::Stuck;
                    break;
                }
            } else {
                stuck = 0;
            }
        }

        let final_state = if state == RunState::Stuck {
            RunState::Stuck
        } else {
            RunState::Done
        };

        let reports = self.build_reports(drones, &trips);
        let routes = build_routes(&trips);
        let delivery_rate = if deliveries.is_empty() {
            0.0
        } else {
            completed.len() as f64 / deliveries.len() as f64
        };

        info!(
            "multi-trip done: {}/{} deliveries in {total_trips} trips, t={now:.0}",
            completed.len(),
            deliveries.len()
        );

        ScheduleResult {
            state: final_state,
            completed,
            trips,
            reports,
            routes,
            total_trips,
            delivery_rate,
            end_time: now,
        }
    }

    /// Greedy single-trip selection from the pending pool.
    ///
    /// Candidates are ranked (priority desc, mass asc) and accepted while
    /// the running mass fits, the window is not past its late grace, the
    /// approximate pre-flight energy estimate stays inside the safety
    /// margin, and the per-trip cap is not hit. The estimate prices
    /// `AVG_LEG_DISTANCE` per already-selected stop plus a flat base rather
    /// than the true route, trading accuracy for speed.
    fn plan_single_trip(
        &self,
        drone: &Drone,
        pending: &[usize],
        deliveries: &[Delivery],
        now: f64,
    ) -> Vec<usize> {
        let mut ranked: Vec<&Delivery> = pending
            .iter()
            .filter_map(|&id| deliveries.iter().find(|d| d.id() == id))
            .collect();
        ranked.sort_by(|a, b| {
            b.priority()
                .cmp(&a.priority())
                .then(a.mass().total_cmp(&b.mass()))
        });

        let mut selected = Vec::new();
        let mut mass = 0.0;

        for d in ranked {
            if mass + d.mass() > drone.max_payload() {
                continue;
            }
            if now > d.window().close() + self.config.late_grace {
                debug!(
                    "delivery {} past grace (t={now:.0} > close {:.0} + {:.0})",
                    d.id(),
                    d.window().close(),
                    self.config.late_grace
                );
                continue;
            }

            let est_distance =
                AVG_LEG_DISTANCE * selected.len() as f64 + PRE_FLIGHT_BASE_DISTANCE;
            let est_energy = drone.energy_consumption(est_distance, mass + d.mass());
            if est_energy > drone.energy() * ENERGY_SAFETY_MARGIN {
                debug!("delivery {} dropped by energy estimate", d.id());
                continue;
            }

            selected.push(d.id());
            mass += d.mass();
            if selected.len() >= self.config.max_per_trip {
                break;
            }
        }

        selected
    }

    /// Simulates one trip: loads everything at the origin, visits the
    /// deliveries in selection order deducting mass and energy per leg,
    /// then returns empty.
    ///
    /// A leg the drone lacks the energy to fly ends the trip early; the
    /// record lists only the deliveries actually committed.
    fn execute_trip(
        &self,
        drone: &mut Drone,
        trip: &[usize],
        deliveries: &mut [Delivery],
        start_time: f64,
    ) -> TripRecord {
        let total_mass: f64 = trip
            .iter()
            .filter_map(|&id| deliveries.iter().find(|d| d.id() == id))
            .map(|d| d.mass())
            .sum();
        drone.load(total_mass);

        let mut elapsed = 0.0;
        let mut committed = Vec::new();

        for &id in trip {
            let Some(delivery) = deliveries.iter_mut().find(|d| d.id() == id) else {
                continue;
            };
            let distance = drone.pos().distance_to(delivery.pos());
            if !drone.move_to(delivery.pos(), 0.0) {
                warn!("drone {} out of energy mid-trip", drone.id());
                break;
            }
            elapsed += distance / drone.speed() + self.config.service_time;
            drone.deliver(delivery.mass(), id);
            delivery.mark_delivered(start_time + elapsed, drone.id());
            committed.push(id);
        }

        // Undelivered packages ride back; the trip ends empty either way.
        drone.unload();
        let return_distance = drone.pos().distance_to(drone.origin());
        if drone.return_to_origin() {
            elapsed += return_distance / drone.speed();
        }

        debug!(
            "drone {} trip: {}/{} deliveries, {elapsed:.1} min",
            drone.id(),
            committed.len(),
            trip.len()
        );

        TripRecord {
            // The caller renumbers this from its log position.
            number: 0,
            deliveries: committed,
            start_time,
            end_time: start_time + elapsed,
            duration: elapsed,
            total_mass,
        }
    }

    /// Sends the drone home (when away) and runs one recharge cycle.
    ///
    /// Returns the minutes consumed and whether any charge was taken; a
    /// drone stranded without the energy to get home takes none.
    fn charge_cycle(&self, drone: &mut Drone) -> (f64, bool) {
        let mut elapsed = 0.0;
        if drone.pos() != drone.origin() {
            let distance = drone.pos().distance_to(drone.origin());
            if drone.return_to_origin() {
                elapsed += distance / drone.speed();
            }
        }
        let charged = drone.charge(self.config.charge_duration);
        if charged {
            elapsed += self.config.charge_duration;
            debug!(
                "drone {} recharged to {:.0}/{:.0}",
                drone.id(),
                drone.energy(),
                drone.max_energy()
            );
        }
        (elapsed, charged)
    }

    fn build_reports(
        &self,
        drones: &[Drone],
        trips: &BTreeMap<usize, Vec<TripRecord>>,
    ) -> BTreeMap<usize, DroneReport> {
        drones
            .iter()
            .map(|drone| {
                let log = trips.get(&drone.id()).map(Vec::as_slice).unwrap_or(&[]);
                let delivered: usize = log.iter().map(|t| t.deliveries.len()).sum();
                let consumed = drone.max_energy() - drone.energy();
                let report = DroneReport {
                    drone_id: drone.id(),
                    trips: log.len(),
                    deliveries: delivered,
                    total_distance: drone.total_distance(),
                    total_time: drone.total_time(),
                    charge_cycles: drone.charge_cycles(),
                    final_energy: drone.energy(),
                    energy_efficiency: delivered as f64 / (consumed + 1.0),
                    utilization: if self.config.horizon > 0.0 {
                        drone.total_time() / self.config.horizon
                    } else {
                        0.0
                    },
                    avg_deliveries_per_trip: if log.is_empty() {
                        0.0
                    } else {
                        delivered as f64 / log.len() as f64
                    },
                };
                (drone.id(), report)
            })
            .collect()
    }
}

/// Rebuilds each active drone's full route: the origin marker, then every
/// trip's visits followed by a return to the origin marker.
fn build_routes(trips: &BTreeMap<usize, Vec<TripRecord>>) -> BTreeMap<usize, Vec<NodeId>> {
    let mut routes = BTreeMap::new();
    for (&drone_id, log) in trips {
        if log.is_empty() {
            continue;
        }
        let mut route = vec![NodeId::Origin(drone_id)];
        for trip in log {
            route.extend(trip.deliveries.iter().map(|&id| NodeId::Delivery(id)));
            route.push(NodeId::Origin(drone_id));
        }
        routes.insert(drone_id, route);
    }
    routes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::models::TimeWindow;

    fn window() -> TimeWindow {
        TimeWindow::new(0.0, 400.0).expect("valid")
    }

    fn fleet() -> Vec<Drone> {
        vec![Drone::new(0, 5.0, 100_000.0, 10.0, Point::new(0.0, 0.0))]
    }

    #[test]
    fn test_run_completes_all_deliveries() {
        let mut drones = fleet();
        let mut deliveries = vec![
            Delivery::new(1, Point::new(10.0, 0.0), 2.0, 5, window()),
            Delivery::new(2, Point::new(20.0, 0.0), 2.0, 3, window()),
        ];
        let scheduler = MultiTripScheduler::new(SchedulerConfig::default());
        let result = scheduler.run(&mut drones, &mut deliveries);

        assert_eq!(result.state, RunState::Done);
        assert_eq!(result.completed.len(), 2);
        assert!((result.delivery_rate - 1.0).abs() < 1e-10);
        assert!(deliveries.iter().all(Delivery::is_delivered));
        assert_eq!(deliveries[0].assigned_drone(), Some(0));
    }

    #[test]
    fn test_priority_ordering_in_trip() {
        let mut drones = fleet();
        // Higher priority goes first even though it is farther.
        let mut deliveries = vec![
            Delivery::new(1, Point::new(10.0, 0.0), 2.0, 1, window()),
            Delivery::new(2, Point::new(30.0, 0.0), 2.0, 5, window()),
        ];
        let scheduler = MultiTripScheduler::new(SchedulerConfig::default());
        let result = scheduler.run(&mut drones, &mut deliveries);

        assert_eq!(result.completed, vec![2, 1]);
    }

    #[test]
    fn test_multiple_trips_when_over_capacity() {
        let mut drones = fleet();
        // 3 + 3 > payload 5: two trips needed.
        let mut deliveries = vec![
            Delivery::new(1, Point::new(10.0, 0.0), 3.0, 3, window()),
            Delivery::new(2, Point::new(15.0, 0.0), 3.0, 3, window()),
        ];
        let scheduler = MultiTripScheduler::new(SchedulerConfig::default());
        let result = scheduler.run(&mut drones, &mut deliveries);

        assert_eq!(result.completed.len(), 2);
        assert_eq!(result.total_trips, 2);
        assert_eq!(result.trips[&0].len(), 2);
    }

    #[test]
    fn test_route_reconstruction() {
        let mut drones = fleet();
        let mut deliveries = vec![
            Delivery::new(1, Point::new(10.0, 0.0), 3.0, 3, window()),
            Delivery::new(2, Point::new(15.0, 0.0), 3.0, 3, window()),
        ];
        let scheduler = MultiTripScheduler::new(SchedulerConfig::default());
        let result = scheduler.run(&mut drones, &mut deliveries);

        let route = &result.routes[&0];
        // origin, d1, origin, d2, origin.
        assert_eq!(route.len(), 5);
        assert_eq!(route.first(), Some(&NodeId::Origin(0)));
        assert_eq!(route.last(), Some(&NodeId::Origin(0)));
        assert_eq!(route.iter().filter(|n| n.is_delivery()).count(), 2);
    }

    #[test]
    fn test_terminates_with_zero_drones() {
        let mut drones: Vec<Drone> = Vec::new();
        let mut deliveries = vec![Delivery::new(1, Point::new(10.0, 0.0), 2.0, 3, window())];
        let scheduler = MultiTripScheduler::new(SchedulerConfig::default());
        let result = scheduler.run(&mut drones, &mut deliveries);

        assert_eq!(result.state, RunState::Stuck);
        assert!(result.completed.is_empty());
    }

    #[test]
    fn test_terminates_with_zero_deliveries() {
        let mut drones = fleet();
        let mut deliveries: Vec<Delivery> = Vec::new();
        let scheduler = MultiTripScheduler::new(SchedulerConfig::default());
        let result = scheduler.run(&mut drones, &mut deliveries);

        assert_eq!(result.state, RunState::Done);
        assert_eq!(result.end_time, 0.0);
        assert_eq!(result.delivery_rate, 0.0);
    }

    #[test]
    fn test_late_grace_gates_trip_planning() {
        let scheduler = MultiTripScheduler::new(SchedulerConfig::default());
        let drone = Drone::new(0, 5.0, 100_000.0, 10.0, Point::new(0.0, 0.0));
        let tight = TimeWindow::new(0.0, 10.0).expect("valid");
        let deliveries = vec![Delivery::new(1, Point::new(10.0, 0.0), 2.0, 3, tight)];

        // Inside the 120-minute grace: still accepted, no hard penalty.
        let trip = scheduler.plan_single_trip(&drone, &[1], &deliveries, 100.0);
        assert_eq!(trip, vec![1]);

        // Past close + grace: rejected.
        let trip = scheduler.plan_single_trip(&drone, &[1], &deliveries, 131.0);
        assert!(trip.is_empty());
    }

    #[test]
    fn test_stuck_counter_aborts() {
        // A drone whose payload can never carry the only delivery: every
        // pass plans an empty trip, so the stuck counter must fire.
        let mut drones = vec![Drone::new(0, 1.0, 100_000.0, 10.0, Point::new(0.0, 0.0))];
        let mut deliveries = vec![Delivery::new(1, Point::new(10.0, 0.0), 5.0, 3, window())];
        let scheduler = MultiTripScheduler::new(SchedulerConfig::default().with_stuck_limit(3));
        let result = scheduler.run(&mut drones, &mut deliveries);

        assert_eq!(result.state, RunState::Stuck);
        assert!(result.completed.is_empty());
        // Three force-advances of 30 minutes.
        assert!((result.end_time - 90.0).abs() < 1e-10);
    }

    #[test]
    fn test_recharge_cycle_runs() {
        // Payload forces one delivery per trip, and each loaded round trip
        // burns 23*78 = 1794 of the 2000 reserve, dropping the drone below
        // the 30% threshold before the second trip.
        let mut drones = vec![Drone::new(0, 5.0, 2_000.0, 10.0, Point::new(0.0, 0.0))];
        let mut deliveries = vec![
            Delivery::new(1, Point::new(78.0, 0.0), 3.0, 3, window()),
            Delivery::new(2, Point::new(0.0, 78.0), 3.0, 3, window()),
        ];
        let scheduler = MultiTripScheduler::new(SchedulerConfig::default());
        let result = scheduler.run(&mut drones, &mut deliveries);

        assert_eq!(result.completed.len(), 2);
        assert!(drones[0].charge_cycles() >= 1);
        let report = &result.reports[&0];
        assert_eq!(report.charge_cycles, drones[0].charge_cycles());
    }

    #[test]
    fn test_report_metrics() {
        let mut drones = fleet();
        let mut deliveries = vec![Delivery::new(1, Point::new(10.0, 0.0), 2.0, 3, window())];
        let scheduler = MultiTripScheduler::new(SchedulerConfig::default());
        let result = scheduler.run(&mut drones, &mut deliveries);

        let report = &result.reports[&0];
        assert_eq!(report.trips, 1);
        assert_eq!(report.deliveries, 1);
        assert!((report.total_distance - 20.0).abs() < 1e-10);
        let consumed = drones[0].max_energy() - drones[0].energy();
        assert!((report.energy_efficiency - 1.0 / (consumed + 1.0)).abs() < 1e-10);
        assert!(report.utilization > 0.0 && report.utilization < 1.0);
        assert!((report.avg_deliveries_per_trip - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_trip_cap_respected() {
        let mut drones = vec![Drone::new(0, 50.0, 1_000_000.0, 10.0, Point::new(0.0, 0.0))];
        let mut deliveries: Vec<Delivery> = (1..=10)
            .map(|i| Delivery::new(i, Point::new(i as f64, 1.0), 1.0, 3, window()))
            .collect();
        let scheduler = MultiTripScheduler::new(SchedulerConfig::default());
        let result = scheduler.run(&mut drones, &mut deliveries);

        assert_eq!(result.completed.len(), 10);
        for trip in &result.trips[&0] {
            assert!(trip.deliveries.len() <= scheduler.config().max_per_trip);
        }
        assert!(result.total_trips >= 2);
    }
}
