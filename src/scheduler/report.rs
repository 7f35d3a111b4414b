//! Trip logs and per-drone performance reports.

/// One completed excursion: origin → deliveries → origin.
#[derive(Debug, Clone, PartialEq)]
pub struct TripRecord {
    /// 1-based trip number for its drone.
    pub number: usize,
    /// Delivery IDs committed during the trip, in visit order.
    pub deliveries: Vec<usize>,
    /// Simulated start time in minutes.
    pub start_time: f64,
    /// Simulated end time in minutes.
    pub end_time: f64,
    /// Trip duration in minutes.
    pub duration: f64,
    /// Mass loaded at the origin for this trip.
    pub total_mass: f64,
}

/// Per-drone summary derived from its trip log after a scheduler run.
#[derive(Debug, Clone, PartialEq)]
pub struct DroneReport {
    /// Drone ID.
    pub drone_id: usize,
    /// Number of trips flown.
    pub trips: usize,
    /// Total deliveries committed.
    pub deliveries: usize,
    /// Total distance flown.
    pub total_distance: f64,
    /// Total flight time in minutes.
    pub total_time: f64,
    /// Recharge cycles taken.
    pub charge_cycles: usize,
    /// Energy remaining at the end of the run.
    pub final_energy: f64,
    /// `deliveries / (energy consumed + 1)`.
    pub energy_efficiency: f64,
    /// Active flight time over the horizon, `0..=1`.
    pub utilization: f64,
    /// Mean deliveries per trip (zero without trips).
    pub avg_deliveries_per_trip: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trip_record_fields() {
        let trip = TripRecord {
            number: 1,
            deliveries: vec![3, 5],
            start_time: 0.0,
            end_time: 12.0,
            duration: 12.0,
            total_mass: 4.0,
        };
        assert_eq!(trip.deliveries.len(), 2);
        assert!((trip.end_time - trip.start_time - trip.duration).abs() < 1e-10);
    }
}
