//! Scenario input records — the loader contract.
//!
//! External collaborators (file loaders, generators) supply plain records;
//! [`Scenario::build`] validates them and constructs the entity vectors the
//! solvers consume. The records derive serde traits so any serde format can
//! carry them.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::InputError;
use crate::geometry::{NoFlyZone, Point};
use crate::models::{Delivery, Drone, TimeWindow};

/// A drone input record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DroneRecord {
    /// Drone ID, unique among drones.
    pub id: usize,
    /// Maximum payload mass.
    pub max_payload: f64,
    /// Maximum energy reserve.
    pub max_energy: f64,
    /// Cruise speed in map units per minute.
    pub speed: f64,
    /// Origin X-coordinate.
    pub origin_x: f64,
    /// Origin Y-coordinate.
    pub origin_y: f64,
}

/// A delivery input record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRecord {
    /// Delivery ID, unique among deliveries.
    pub id: usize,
    /// Target X-coordinate.
    pub x: f64,
    /// Target Y-coordinate.
    pub y: f64,
    /// Package mass.
    pub mass: f64,
    /// Priority rank, 1..=5, higher is more urgent.
    pub priority: u8,
    /// Window open time in minutes.
    pub window_open: f64,
    /// Window close time in minutes.
    pub window_close: f64,
}

/// A no-fly zone input record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneRecord {
    /// Zone ID, unique among zones.
    pub id: usize,
    /// Polygon vertices, at least 3, implicitly closed.
    pub vertices: Vec<(f64, f64)>,
    /// Activation interval start in minutes.
    pub active_start: f64,
    /// Activation interval end in minutes.
    pub active_end: f64,
}

/// A complete scenario: the fleet, the delivery set, and the zones.
///
/// # Examples
///
/// ```
/// use skyfleet::models::{DeliveryRecord, DroneRecord, Scenario};
///
/// let scenario = Scenario {
///     drones: vec![DroneRecord {
///         id: 0,
///         max_payload: 5.0,
///         max_energy: 10_000.0,
///         speed: 10.0,
///         origin_x: 0.0,
///         origin_y: 0.0,
///     }],
///     deliveries: vec![DeliveryRecord {
///         id: 1,
///         x: 10.0,
///         y: 0.0,
///         mass: 2.0,
///         priority: 3,
///         window_open: 0.0,
///         window_close: 60.0,
///     }],
///     zones: vec![],
/// };
///
/// let (drones, deliveries, zones) = scenario.build().unwrap();
/// assert_eq!(drones.len(), 1);
/// assert_eq!(deliveries.len(), 1);
/// assert!(zones.is_empty());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    /// Drone records.
    pub drones: Vec<DroneRecord>,
    /// Delivery records.
    pub deliveries: Vec<DeliveryRecord>,
    /// No-fly zone records.
    pub zones: Vec<ZoneRecord>,
}

impl Scenario {
    /// Validates the records and constructs the scenario entities.
    pub fn build(&self) -> Result<(Vec<Drone>, Vec<Delivery>, Vec<NoFlyZone>), InputError> {
        let mut seen = HashSet::new();
        let mut drones = Vec::with_capacity(self.drones.len());
        for r in &self.drones {
            if !seen.insert(r.id) {
                return Err(InputError::DuplicateId {
                    kind: "drone",
                    id: r.id,
                });
            }
            if r.speed <= 0.0 {
                return Err(InputError::NonPositiveSpeed {
                    id: r.id,
                    speed: r.speed,
                });
            }
            drones.push(Drone::new(
                r.id,
                r.max_payload,
                r.max_energy,
                r.speed,
                Point::new(r.origin_x, r.origin_y),
            ));
        }

        seen.clear();
        let mut deliveries = Vec::with_capacity(self.deliveries.len());
        for r in &self.deliveries {
            if !seen.insert(r.id) {
                return Err(InputError::DuplicateId {
                    kind: "delivery",
                    id: r.id,
                });
            }
            let window = TimeWindow::new(r.window_open, r.window_close)?;
            deliveries.push(Delivery::new(
                r.id,
                Point::new(r.x, r.y),
                r.mass,
                r.priority,
                window,
            ));
        }

        seen.clear();
        let mut zones = Vec::with_capacity(self.zones.len());
        for r in &self.zones {
            if !seen.insert(r.id) {
                return Err(InputError::DuplicateId {
                    kind: "zone",
                    id: r.id,
                });
            }
            let vertices = r.vertices.iter().map(|&v| Point::from(v)).collect();
            zones.push(NoFlyZone::new(r.id, vertices, r.active_start, r.active_end)?);
        }

        Ok((drones, deliveries, zones))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Scenario {
        Scenario {
            drones: vec![DroneRecord {
                id: 0,
                max_payload: 5.0,
                max_energy: 10_000.0,
                speed: 10.0,
                origin_x: 0.0,
                origin_y: 0.0,
            }],
            deliveries: vec![DeliveryRecord {
                id: 1,
                x: 10.0,
                y: 0.0,
                mass: 2.0,
                priority: 3,
                window_open: 0.0,
                window_close: 60.0,
            }],
            zones: vec![ZoneRecord {
                id: 0,
                vertices: vec![(2.0, -1.0), (4.0, -1.0), (4.0, 1.0), (2.0, 1.0)],
                active_start: 0.0,
                active_end: 100.0,
            }],
        }
    }

    #[test]
    fn test_build_valid() {
        let (drones, deliveries, zones) = sample().build().expect("valid scenario");
        assert_eq!(drones.len(), 1);
        assert_eq!(deliveries.len(), 1);
        assert_eq!(zones.len(), 1);
        assert_eq!(deliveries[0].priority(), 3);
    }

    #[test]
    fn test_build_rejects_duplicate_drone_id() {
        let mut s = sample();
        s.drones.push(s.drones[0].clone());
        assert!(matches!(
            s.build(),
            Err(InputError::DuplicateId { kind: "drone", id: 0 })
        ));
    }

    #[test]
    fn test_build_rejects_zero_speed() {
        let mut s = sample();
        s.drones[0].speed = 0.0;
        assert!(matches!(s.build(), Err(InputError::NonPositiveSpeed { .. })));
    }

    #[test]
    fn test_build_rejects_inverted_window() {
        let mut s = sample();
        s.deliveries[0].window_open = 90.0;
        assert!(matches!(s.build(), Err(InputError::InvalidInterval { .. })));
    }

    #[test]
    fn test_build_rejects_degenerate_zone() {
        let mut s = sample();
        s.zones[0].vertices.truncate(2);
        assert!(matches!(s.build(), Err(InputError::DegeneratePolygon { .. })));
    }

    #[test]
    fn test_serde_round_trip() {
        let s = sample();
        let json = serde_json::to_string(&s).expect("serialize");
        let back: Scenario = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.drones.len(), 1);
        assert_eq!(back.deliveries[0].id, 1);
        assert_eq!(back.zones[0].vertices.len(), 4);
    }
}
