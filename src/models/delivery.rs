//! Delivery point and time window types.

use crate::error::InputError;
use crate::geometry::Point;

/// The acceptance interval for a delivery, closed on both ends.
///
/// # Examples
///
/// ```
/// use skyfleet::models::TimeWindow;
///
/// let tw = TimeWindow::new(10.0, 60.0).unwrap();
/// assert!(tw.contains(10.0));
/// assert!(tw.contains(60.0));
/// assert!(!tw.contains(60.1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    open: f64,
    close: f64,
}

impl TimeWindow {
    /// Creates a new time window.
    ///
    /// Fails when `open > close` or either bound is non-finite.
    pub fn new(open: f64, close: f64) -> Result<Self, InputError> {
        if !open.is_finite() || !close.is_finite() {
            return Err(InputError::NonFiniteWindow { open, close });
        }
        if open > close {
            return Err(InputError::InvalidInterval {
                start: open,
                end: close,
            });
        }
        Ok(Self { open, close })
    }

    /// Earliest acceptable arrival time.
    pub fn open(&self) -> f64 {
        self.open
    }

    /// Latest acceptable arrival time.
    pub fn close(&self) -> f64 {
        self.close
    }

    /// Returns `true` if `time` falls within the window.
    pub fn contains(&self, time: f64) -> bool {
        self.open <= time && time <= self.close
    }
}

/// A delivery request: a position, a package mass, a priority rank, and an
/// acceptance time window.
///
/// Priorities run 1..=5 with 5 the most urgent. The delivered flag,
/// timestamp and assigned drone are run-time state mutated by whichever
/// solver commits the delivery, and cleared by [`reset`](Delivery::reset)
/// between independent solver runs.
///
/// # Examples
///
/// ```
/// use skyfleet::geometry::Point;
/// use skyfleet::models::{Delivery, TimeWindow};
///
/// let tw = TimeWindow::new(0.0, 60.0).unwrap();
/// let mut d = Delivery::new(1, Point::new(10.0, 0.0), 2.0, 3, tw);
/// assert!(!d.is_delivered());
///
/// d.mark_delivered(12.5, 0);
/// assert!(d.is_delivered());
/// assert_eq!(d.delivered_at(), Some(12.5));
/// assert_eq!(d.assigned_drone(), Some(0));
/// ```
#[derive(Debug, Clone)]
pub struct Delivery {
    id: usize,
    pos: Point,
    mass: f64,
    priority: u8,
    window: TimeWindow,
    delivered: bool,
    delivered_at: Option<f64>,
    assigned_drone: Option<usize>,
}

impl Delivery {
    /// Creates a pending delivery.
    pub fn new(id: usize, pos: Point, mass: f64, priority: u8, window: TimeWindow) -> Self {
        Self {
            id,
            pos,
            mass,
            priority,
            window,
            delivered: false,
            delivered_at: None,
            assigned_drone: None,
        }
    }

    /// Delivery ID.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Target position.
    pub fn pos(&self) -> Point {
        self.pos
    }

    /// Package mass.
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Priority rank, 1..=5, higher is more urgent.
    pub fn priority(&self) -> u8 {
        self.priority
    }

    /// Acceptance time window.
    pub fn window(&self) -> TimeWindow {
        self.window
    }

    /// Returns `true` if this delivery has been committed.
    pub fn is_delivered(&self) -> bool {
        self.delivered
    }

    /// Timestamp of the committed delivery, if any.
    pub fn delivered_at(&self) -> Option<f64> {
        self.delivered_at
    }

    /// The drone that committed this delivery, if any.
    pub fn assigned_drone(&self) -> Option<usize> {
        self.assigned_drone
    }

    /// Soft lateness/earliness penalty at the given time, for reporting.
    ///
    /// Zero inside the window, `50` per minute early, `100` per minute late.
    pub fn time_penalty(&self, time: f64) -> f64 {
        if self.window.contains(time) {
            0.0
        } else if time < self.window.open() {
            (self.window.open() - time) * 50.0
        } else {
            (time - self.window.close()) * 100.0
        }
    }

    /// Marks the delivery as committed by `drone_id` at `time`.
    pub fn mark_delivered(&mut self, time: f64, drone_id: usize) {
        self.delivered = true;
        self.delivered_at = Some(time);
        self.assigned_drone = Some(drone_id);
    }

    /// Clears the delivered state for a fresh solver run.
    pub fn reset(&mut self) {
        self.delivered = false;
        self.delivered_at = None;
        self.assigned_drone = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InputError;

    fn sample() -> Delivery {
        let tw = TimeWindow::new(10.0, 60.0).expect("valid");
        Delivery::new(1, Point::new(5.0, 5.0), 2.5, 4, tw)
    }

    #[test]
    fn test_time_window_valid() {
        let tw = TimeWindow::new(0.0, 30.0).expect("valid");
        assert_eq!(tw.open(), 0.0);
        assert_eq!(tw.close(), 30.0);
    }

    #[test]
    fn test_time_window_invalid() {
        assert!(matches!(
            TimeWindow::new(30.0, 0.0),
            Err(InputError::InvalidInterval { .. })
        ));
        assert!(matches!(
            TimeWindow::new(f64::NAN, 10.0),
            Err(InputError::NonFiniteWindow { .. })
        ));
        assert!(matches!(
            TimeWindow::new(0.0, f64::INFINITY),
            Err(InputError::NonFiniteWindow { .. })
        ));
    }

    #[test]
    fn test_time_window_contains_bounds() {
        let tw = TimeWindow::new(10.0, 20.0).expect("valid");
        assert!(tw.contains(10.0));
        assert!(tw.contains(20.0));
        assert!(!tw.contains(9.9));
        assert!(!tw.contains(20.1));
    }

    #[test]
    fn test_delivery_lifecycle() {
        let mut d = sample();
        assert!(!d.is_delivered());
        assert!(d.delivered_at().is_none());

        d.mark_delivered(42.0, 7);
        assert!(d.is_delivered());
        assert_eq!(d.delivered_at(), Some(42.0));
        assert_eq!(d.assigned_drone(), Some(7));

        d.reset();
        assert!(!d.is_delivered());
        assert!(d.delivered_at().is_none());
        assert!(d.assigned_drone().is_none());
    }

    #[test]
    fn test_time_penalty() {
        let d = sample();
        assert_eq!(d.time_penalty(30.0), 0.0);
        // 5 minutes early at 50/min.
        assert!((d.time_penalty(5.0) - 250.0).abs() < 1e-10);
        // 10 minutes late at 100/min.
        assert!((d.time_penalty(70.0) - 1000.0).abs() < 1e-10);
    }
}
