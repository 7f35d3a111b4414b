//! Construction-time input validation errors.
//!
//! These cover malformed input only. A search that finds no route or no
//! assignment is an expected outcome and is reported through the return
//! type (`Option`, empty collections), never through this error.

use thiserror::Error;

/// A malformed-input failure raised when constructing scenario entities.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    /// A no-fly zone polygon needs at least 3 vertices.
    #[error("zone {id}: polygon has {count} vertices, at least 3 required")]
    DegeneratePolygon {
        /// Zone ID.
        id: usize,
        /// Number of vertices supplied.
        count: usize,
    },

    /// A time window or activation interval with start after end.
    #[error("interval start {start} exceeds end {end}")]
    InvalidInterval {
        /// Interval start.
        start: f64,
        /// Interval end.
        end: f64,
    },

    /// A time window endpoint was NaN or infinite.
    #[error("time window bounds must be finite, got [{open}, {close}]")]
    NonFiniteWindow {
        /// Window open time.
        open: f64,
        /// Window close time.
        close: f64,
    },

    /// A drone with zero or negative speed can never move.
    #[error("drone {id}: speed must be positive, got {speed}")]
    NonPositiveSpeed {
        /// Drone ID.
        id: usize,
        /// Offending speed.
        speed: f64,
    },

    /// Two records in the same collection share an ID.
    #[error("duplicate {kind} id {id}")]
    DuplicateId {
        /// Record kind ("drone", "delivery" or "zone").
        kind: &'static str,
        /// The repeated ID.
        id: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = InputError::DegeneratePolygon { id: 3, count: 2 };
        assert_eq!(
            e.to_string(),
            "zone 3: polygon has 2 vertices, at least 3 required"
        );

        let e = InputError::InvalidInterval {
            start: 10.0,
            end: 5.0,
        };
        assert_eq!(e.to_string(), "interval start 10 exceeds end 5");
    }
}
