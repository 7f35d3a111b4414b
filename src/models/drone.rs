//! Drone entity with physical limits and mutable flight state.

use crate::geometry::Point;

/// Fraction of maximum energy below which a drone asks to recharge.
pub const CHARGE_THRESHOLD: f64 = 0.3;

/// Fraction of maximum energy restored per minute while charging.
const CHARGE_RATE: f64 = 0.1;

/// Base energy draw per unit of distance at zero payload.
const BASE_CONSUMPTION: f64 = 10.0;

/// A delivery drone.
///
/// The physical limits (`max_payload`, `max_energy`, `speed`, `origin`) are
/// fixed at construction. Position, carried mass, energy and the travel
/// counters are run-time state mutated only by the component executing a
/// move, load, delivery or charge action; [`reset`](Drone::reset) returns
/// the drone to its origin state for a fresh planning pass.
///
/// Carried mass stays in `[0, max_payload]` and energy in `[0, max_energy]`
/// after every mutation. Speed is in map units per minute, so all travel
/// times are minutes.
///
/// # Examples
///
/// ```
/// use skyfleet::geometry::Point;
/// use skyfleet::models::Drone;
///
/// let mut drone = Drone::new(0, 5.0, 10_000.0, 10.0, Point::new(0.0, 0.0));
/// assert!(drone.can_carry(4.0));
/// assert!(!drone.can_carry(6.0));
///
/// assert!(drone.move_to(Point::new(30.0, 40.0), 0.0));
/// assert_eq!(drone.pos(), Point::new(30.0, 40.0));
/// assert!((drone.total_distance() - 50.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone)]
pub struct Drone {
    id: usize,
    max_payload: f64,
    max_energy: f64,
    speed: f64,
    origin: Point,
    pos: Point,
    carried_mass: f64,
    energy: f64,
    total_distance: f64,
    total_time: f64,
    completed: Vec<usize>,
    charge_cycles: usize,
}

impl Drone {
    /// Creates a fully charged drone at its origin.
    pub fn new(id: usize, max_payload: f64, max_energy: f64, speed: f64, origin: Point) -> Self {
        Self {
            id,
            max_payload,
            max_energy,
            speed,
            origin,
            pos: origin,
            carried_mass: 0.0,
            energy: max_energy,
            total_distance: 0.0,
            total_time: 0.0,
            completed: Vec::new(),
            charge_cycles: 0,
        }
    }

    /// Drone ID.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Maximum payload mass.
    pub fn max_payload(&self) -> f64 {
        self.max_payload
    }

    /// Maximum energy reserve.
    pub fn max_energy(&self) -> f64 {
        self.max_energy
    }

    /// Cruise speed in map units per minute.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Fixed origin (launch and recharge) position.
    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Current position.
    pub fn pos(&self) -> Point {
        self.pos
    }

    /// Currently carried mass.
    pub fn carried_mass(&self) -> f64 {
        self.carried_mass
    }

    /// Remaining energy.
    pub fn energy(&self) -> f64 {
        self.energy
    }

    /// Cumulative distance flown.
    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }

    /// Cumulative flight time in minutes.
    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    /// Ordered log of completed delivery IDs.
    pub fn completed(&self) -> &[usize] {
        &self.completed
    }

    /// Number of recharge cycles taken.
    pub fn charge_cycles(&self) -> usize {
        self.charge_cycles
    }

    /// Returns the drone to its origin state for a fresh planning pass.
    pub fn reset(&mut self) {
        self.pos = self.origin;
        self.carried_mass = 0.0;
        self.energy = self.max_energy;
        self.total_distance = 0.0;
        self.total_time = 0.0;
        self.completed.clear();
        self.charge_cycles = 0;
    }

    /// Returns `true` if `mass` more can be carried without exceeding the
    /// payload limit.
    pub fn can_carry(&self, mass: f64) -> bool {
        self.carried_mass + mass <= self.max_payload
    }

    /// Energy drawn by flying `distance` while carrying `carried_mass`.
    ///
    /// Consumption grows linearly with the payload fraction. Every
    /// component that budgets or deducts energy goes through this method,
    /// so their numbers are always comparable.
    pub fn energy_consumption(&self, distance: f64, carried_mass: f64) -> f64 {
        BASE_CONSUMPTION * distance * (1.0 + 0.5 * carried_mass / self.max_payload)
    }

    /// Returns `true` if the drone has the energy to reach `dest` carrying
    /// its current load plus `extra_mass`.
    pub fn can_reach(&self, dest: Point, extra_mass: f64) -> bool {
        let distance = self.pos.distance_to(dest);
        let needed = self.energy_consumption(distance, self.carried_mass + extra_mass);
        self.energy >= needed
    }

    /// Flies to `dest`, drawing energy and advancing the travel counters.
    ///
    /// Fails closed (no state change) when the energy would go negative.
    pub fn move_to(&mut self, dest: Point, extra_mass: f64) -> bool {
        if !self.can_reach(dest, extra_mass) {
            return false;
        }
        let distance = self.pos.distance_to(dest);
        let consumed = self.energy_consumption(distance, self.carried_mass + extra_mass);
        self.pos = dest;
        self.energy = (self.energy - consumed).max(0.0);
        self.total_distance += distance;
        self.total_time += distance / self.speed;
        true
    }

    /// Loads `mass` onto the drone if capacity allows.
    pub fn load(&mut self, mass: f64) -> bool {
        if self.can_carry(mass) {
            self.carried_mass += mass;
            true
        } else {
            false
        }
    }

    /// Drops `mass` and records `delivery_id` as completed.
    ///
    /// Fails when the drone is not carrying that much.
    pub fn deliver(&mut self, mass: f64, delivery_id: usize) -> bool {
        if self.carried_mass >= mass {
            self.carried_mass -= mass;
            self.completed.push(delivery_id);
            true
        } else {
            false
        }
    }

    /// Drops the entire carried load, returning the mass released.
    ///
    /// Used when a trip ends early and undelivered packages come back to
    /// the origin.
    pub fn unload(&mut self) -> f64 {
        let dropped = self.carried_mass;
        self.carried_mass = 0.0;
        dropped
    }

    /// Returns `true` when the reserve has dropped below the charge
    /// threshold fraction of maximum.
    pub fn needs_charging(&self) -> bool {
        self.energy < self.max_energy * CHARGE_THRESHOLD
    }

    /// Recharges for `minutes` at the origin, clamped to the maximum.
    ///
    /// Counts one charge cycle. Fails when the drone is away from its
    /// origin.
    pub fn charge(&mut self, minutes: f64) -> bool {
        if self.pos != self.origin {
            return false;
        }
        let refill = self.max_energy * CHARGE_RATE * minutes;
        self.energy = (self.energy + refill).min(self.max_energy);
        self.charge_cycles += 1;
        true
    }

    /// Flies back to the origin if the remaining energy suffices.
    pub fn return_to_origin(&mut self) -> bool {
        self.move_to(self.origin, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample() -> Drone {
        Drone::new(0, 5.0, 10_000.0, 10.0, Point::new(0.0, 0.0))
    }

    #[test]
    fn test_new_starts_full_at_origin() {
        let d = sample();
        assert_eq!(d.pos(), d.origin());
        assert_eq!(d.energy(), d.max_energy());
        assert_eq!(d.carried_mass(), 0.0);
        assert_eq!(d.charge_cycles(), 0);
        assert!(d.completed().is_empty());
    }

    #[test]
    fn test_energy_consumption_formula() {
        let d = sample();
        // Empty: 10 * distance.
        assert!((d.energy_consumption(10.0, 0.0) - 100.0).abs() < 1e-10);
        // Full payload: 1.5x multiplier.
        assert!((d.energy_consumption(10.0, 5.0) - 150.0).abs() < 1e-10);
        // Half payload: 1.25x multiplier.
        assert!((d.energy_consumption(10.0, 2.5) - 125.0).abs() < 1e-10);
    }

    #[test]
    fn test_move_to_updates_state() {
        let mut d = sample();
        assert!(d.move_to(Point::new(3.0, 4.0), 0.0));
        assert_eq!(d.pos(), Point::new(3.0, 4.0));
        assert!((d.total_distance() - 5.0).abs() < 1e-10);
        assert!((d.total_time() - 0.5).abs() < 1e-10);
        assert!((d.energy() - (10_000.0 - 50.0)).abs() < 1e-10);
    }

    #[test]
    fn test_move_to_fails_closed_on_energy() {
        let mut d = Drone::new(0, 5.0, 10.0, 10.0, Point::new(0.0, 0.0));
        // 100 units away needs 1000 energy, only 10 available.
        assert!(!d.move_to(Point::new(100.0, 0.0), 0.0));
        assert_eq!(d.pos(), Point::new(0.0, 0.0));
        assert_eq!(d.energy(), 10.0);
    }

    #[test]
    fn test_load_and_deliver() {
        let mut d = sample();
        assert!(d.load(3.0));
        assert!(d.load(2.0));
        assert!(!d.load(0.5));
        assert_eq!(d.carried_mass(), 5.0);

        assert!(d.deliver(3.0, 11));
        assert_eq!(d.carried_mass(), 2.0);
        assert_eq!(d.completed(), &[11]);
        assert!(!d.deliver(4.0, 12));
    }

    #[test]
    fn test_unload_clears_mass() {
        let mut d = sample();
        d.load(4.0);
        assert!((d.unload() - 4.0).abs() < 1e-10);
        assert_eq!(d.carried_mass(), 0.0);
    }

    #[test]
    fn test_needs_charging_threshold() {
        let mut d = sample();
        assert!(!d.needs_charging());
        // Burn down below 30%.
        d.energy = 2_999.0;
        assert!(d.needs_charging());
        d.energy = 3_000.0;
        assert!(!d.needs_charging());
    }

    #[test]
    fn test_charge_only_at_origin() {
        let mut d = sample();
        d.energy = 1_000.0;
        assert!(d.charge(30.0));
        assert_eq!(d.energy(), 10_000.0); // clamped to max
        assert_eq!(d.charge_cycles(), 1);

        d.move_to(Point::new(10.0, 0.0), 0.0);
        assert!(!d.charge(30.0));
        assert_eq!(d.charge_cycles(), 1);
    }

    #[test]
    fn test_charge_partial() {
        let mut d = sample();
        d.energy = 1_000.0;
        // 5 minutes at 10%/min restores 5000.
        assert!(d.charge(5.0));
        assert!((d.energy() - 6_000.0).abs() < 1e-10);
    }

    #[test]
    fn test_reset() {
        let mut d = sample();
        d.move_to(Point::new(10.0, 0.0), 0.0);
        d.load(2.0);
        d.deliver(2.0, 3);
        d.reset();
        assert_eq!(d.pos(), d.origin());
        assert_eq!(d.energy(), d.max_energy());
        assert_eq!(d.carried_mass(), 0.0);
        assert!(d.completed().is_empty());
        assert_eq!(d.total_distance(), 0.0);
    }

    #[test]
    fn test_return_to_origin() {
        let mut d = sample();
        d.move_to(Point::new(10.0, 0.0), 0.0);
        assert!(d.return_to_origin());
        assert_eq!(d.pos(), d.origin());
    }

    proptest! {
        #[test]
        fn prop_state_stays_clamped(
            legs in proptest::collection::vec((0.0f64..50.0, 0.0f64..50.0, 0.0f64..3.0), 1..10)
        ) {
            let mut d = Drone::new(0, 5.0, 2_000.0, 10.0, Point::new(0.0, 0.0));
            for (x, y, mass) in legs {
                if d.can_carry(mass) {
                    d.load(mass);
                }
                d.move_to(Point::new(x, y), 0.0);
                prop_assert!(d.carried_mass() >= 0.0);
                prop_assert!(d.carried_mass() <= d.max_payload() + 1e-9);
                prop_assert!(d.energy() >= 0.0);
                prop_assert!(d.energy() <= d.max_energy());
            }
        }
    }
}
