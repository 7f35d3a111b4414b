//! Time-activated no-fly zones.

use crate::error::InputError;
use crate::geometry::Point;

/// A polygonal region drones must not cross while it is active.
///
/// The vertex ring is implicitly closed (the last vertex connects back to
/// the first). The activation interval is closed on both ends. Zones are
/// read-only after construction.
///
/// # Examples
///
/// ```
/// use skyfleet::geometry::{NoFlyZone, Point};
///
/// let zone = NoFlyZone::new(
///     0,
///     vec![
///         Point::new(2.0, -1.0),
///         Point::new(4.0, -1.0),
///         Point::new(4.0, 1.0),
///         Point::new(2.0, 1.0),
///     ],
///     0.0,
///     100.0,
/// )
/// .unwrap();
///
/// assert!(zone.is_active(50.0));
/// assert!(!zone.is_active(150.0));
/// assert!(zone.contains(Point::new(3.0, 0.0)));
/// assert!(zone.segment_crosses(Point::new(0.0, 0.0), Point::new(6.0, 0.0)));
/// ```
#[derive(Debug, Clone)]
pub struct NoFlyZone {
    id: usize,
    vertices: Vec<Point>,
    active_start: f64,
    active_end: f64,
}

impl NoFlyZone {
    /// Creates a zone from a polygon and an activation interval.
    ///
    /// Fails on fewer than 3 vertices or an inverted interval.
    pub fn new(
        id: usize,
        vertices: Vec<Point>,
        active_start: f64,
        active_end: f64,
    ) -> Result<Self, InputError> {
        if vertices.len() < 3 {
            return Err(InputError::DegeneratePolygon {
                id,
                count: vertices.len(),
            });
        }
        if active_start > active_end {
            return Err(InputError::InvalidInterval {
                start: active_start,
                end: active_end,
            });
        }
        Ok(Self {
            id,
            vertices,
            active_start,
            active_end,
        })
    }

    /// Zone ID.
    pub fn id(&self) -> usize {
        self.id
    }

    /// The polygon vertex ring.
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Start of the activation interval.
    pub fn active_start(&self) -> f64 {
        self.active_start
    }

    /// End of the activation interval.
    pub fn active_end(&self) -> f64 {
        self.active_end
    }

    /// Returns `true` if the zone is active at the given time.
    pub fn is_active(&self, time: f64) -> bool {
        self.active_start <= time && time <= self.active_end
    }

    /// Ray-casting point-in-polygon test.
    pub fn contains(&self, point: Point) -> bool {
        let n = self.vertices.len();
        let mut inside = false;
        let mut p1 = self.vertices[0];
        for i in 1..=n {
            let p2 = self.vertices[i % n];
            if point.y > p1.y.min(p2.y)
                && point.y <= p1.y.max(p2.y)
                && point.x <= p1.x.max(p2.x)
            {
                // The y-range test excludes horizontal edges, so the
                // division is safe.
                let x_intersect = (point.y - p1.y) * (p2.x - p1.x) / (p2.y - p1.y) + p1.x;
                if p1.x == p2.x || point.x <= x_intersect {
                    inside = !inside;
                }
            }
            p1 = p2;
        }
        inside
    }

    /// Returns `true` if the straight segment `a→b` enters this zone:
    /// either endpoint lies inside the polygon, or the segment intersects
    /// one of its edges.
    pub fn segment_crosses(&self, a: Point, b: Point) -> bool {
        if self.contains(a) || self.contains(b) {
            return true;
        }
        let n = self.vertices.len();
        for i in 0..n {
            let p = self.vertices[i];
            let q = self.vertices[(i + 1) % n];
            if segments_intersect(a, b, p, q) {
                return true;
            }
        }
        false
    }

    /// Vertex centroid of the polygon.
    pub fn center(&self) -> Point {
        let n = self.vertices.len() as f64;
        let sum_x: f64 = self.vertices.iter().map(|v| v.x).sum();
        let sum_y: f64 = self.vertices.iter().map(|v| v.y).sum();
        Point::new(sum_x / n, sum_y / n)
    }

    /// Axis-aligned bounding box as `(min, max)` corners.
    pub fn bounding_box(&self) -> (Point, Point) {
        let min_x = self.vertices.iter().map(|v| v.x).fold(f64::INFINITY, f64::min);
        let max_x = self
            .vertices
            .iter()
            .map(|v| v.x)
            .fold(f64::NEG_INFINITY, f64::max);
        let min_y = self.vertices.iter().map(|v| v.y).fold(f64::INFINITY, f64::min);
        let max_y = self
            .vertices
            .iter()
            .map(|v| v.y)
            .fold(f64::NEG_INFINITY, f64::max);
        (Point::new(min_x, min_y), Point::new(max_x, max_y))
    }
}

/// Orientation of the ordered triple `(p, q, r)`.
fn orientation(p: Point, q: Point, r: Point) -> i8 {
    let val = (q.y - p.y) * (r.x - q.x) - (q.x - p.x) * (r.y - q.y);
    if val == 0.0 {
        0
    } else if val > 0.0 {
        1
    } else {
        2
    }
}

/// Whether collinear `q` lies on the segment `p..r`.
fn on_segment(p: Point, q: Point, r: Point) -> bool {
    q.x <= p.x.max(r.x) && q.x >= p.x.min(r.x) && q.y <= p.y.max(r.y) && q.y >= p.y.min(r.y)
}

/// Segment intersection test for `p1..q1` against `p2..q2`, including the
/// collinear-overlap special cases.
fn segments_intersect(p1: Point, q1: Point, p2: Point, q2: Point) -> bool {
    let o1 = orientation(p1, q1, p2);
    let o2 = orientation(p1, q1, q2);
    let o3 = orientation(p2, q2, p1);
    let o4 = orientation(p2, q2, q1);

    if o1 != o2 && o3 != o4 {
        return true;
    }

    (o1 == 0 && on_segment(p1, p2, q1))
        || (o2 == 0 && on_segment(p1, q2, q1))
        || (o3 == 0 && on_segment(p2, p1, q2))
        || (o4 == 0 && on_segment(p2, q1, q2))
}
