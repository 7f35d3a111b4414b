//! Route aggregates for reporting collaborators.

/// Read-only statistics for a planned route.
///
/// Produced by
/// [`RoutePlanner::route_statistics`](crate::search::RoutePlanner::route_statistics);
/// downstream reporters and plotters consume these numbers without
/// re-deriving any solver logic.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RouteStats {
    /// Total Euclidean distance flown.
    pub distance: f64,
    /// Total elapsed flight time in minutes.
    pub time: f64,
    /// Total energy drawn.
    pub energy: f64,
    /// Number of delivery stops.
    pub deliveries: usize,
    /// Sum of graph edge costs along the route.
    pub cost: f64,
}
