//! Graph node identities and payloads.

use std::fmt;

use crate::geometry::Point;
use crate::models::TimeWindow;

/// Identity of a graph node: a drone origin or a delivery point.
///
/// # Examples
///
/// ```
/// use skyfleet::graph::NodeId;
///
/// assert_eq!(NodeId::Origin(2).to_string(), "drone_2");
/// assert_eq!(NodeId::Delivery(7).to_string(), "delivery_7");
/// assert!(NodeId::Origin(2).is_origin());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeId {
    /// The origin of the drone with this ID.
    Origin(usize),
    /// The delivery point with this ID.
    Delivery(usize),
}

impl NodeId {
    /// Returns `true` for drone-origin nodes.
    pub fn is_origin(&self) -> bool {
        matches!(self, NodeId::Origin(_))
    }

    /// Returns `true` for delivery nodes.
    pub fn is_delivery(&self) -> bool {
        matches!(self, NodeId::Delivery(_))
    }

    /// The delivery ID, when this is a delivery node.
    pub fn delivery_id(&self) -> Option<usize> {
        match self {
            NodeId::Delivery(id) => Some(*id),
            NodeId::Origin(_) => None,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Origin(id) => write!(f, "drone_{id}"),
            NodeId::Delivery(id) => write!(f, "delivery_{id}"),
        }
    }
}

/// Node payload: origin nodes carry nothing; delivery nodes carry copies of
/// the delivery attributes for fast lookup during search.
#[derive(Debug, Clone, Copy)]
pub enum NodeKind {
    /// A drone origin.
    Origin,
    /// A delivery point.
    Delivery {
        /// Package mass.
        mass: f64,
        /// Priority rank, higher is more urgent.
        priority: u8,
        /// Acceptance time window.
        window: TimeWindow,
    },
}

/// A node of the cost graph.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    pos: Point,
    kind: NodeKind,
}

impl Node {
    /// Creates a node.
    pub fn new(id: NodeId, pos: Point, kind: NodeKind) -> Self {
        Self { id, pos, kind }
    }

    /// Node identity.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Node position.
    pub fn pos(&self) -> Point {
        self.pos
    }

    /// Node payload.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Package mass for delivery nodes, zero for origins.
    pub fn mass(&self) -> f64 {
        match self.kind {
            NodeKind::Delivery { mass, .. } => mass,
            NodeKind::Origin => 0.0,
        }
    }

    /// Time window for delivery nodes.
    pub fn window(&self) -> Option<TimeWindow> {
        match self.kind {
            NodeKind::Delivery { window, .. } => Some(window),
            NodeKind::Origin => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_display() {
        assert_eq!(NodeId::Origin(0).to_string(), "drone_0");
        assert_eq!(NodeId::Delivery(12).to_string(), "delivery_12");
    }

    #[test]
    fn test_node_id_predicates() {
        assert!(NodeId::Origin(1).is_origin());
        assert!(!NodeId::Origin(1).is_delivery());
        assert_eq!(NodeId::Delivery(4).delivery_id(), Some(4));
        assert_eq!(NodeId::Origin(4).delivery_id(), None);
    }

    #[test]
    fn test_node_mass_and_window() {
        let origin = Node::new(NodeId::Origin(0), Point::new(0.0, 0.0), NodeKind::Origin);
        assert_eq!(origin.mass(), 0.0);
        assert!(origin.window().is_none());

        let window = TimeWindow::new(0.0, 60.0).expect("valid");
        let delivery = Node::new(
            NodeId::Delivery(1),
            Point::new(5.0, 5.0),
            NodeKind::Delivery {
                mass: 2.0,
                priority: 3,
                window,
            },
        );
        assert_eq!(delivery.mass(), 2.0);
        assert!(delivery.window().is_some());
    }
}
