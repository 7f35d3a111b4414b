//! Domain model types for drone delivery planning.
//!
//! Provides the core entities: drones with payload/energy/speed limits and
//! mutable flight state, deliveries with priorities and time windows, and
//! the serde-backed scenario records supplied by loaders.

mod delivery;
mod drone;
mod scenario;

pub use delivery::{Delivery, TimeWindow};
pub use drone::{Drone, CHARGE_THRESHOLD};
pub use scenario::{DeliveryRecord, DroneRecord, Scenario, ZoneRecord};
