//! Constraint-satisfaction assignment of deliveries to drones.

mod domain;
mod solver;

pub use domain::build_domains;
pub use solver::{Assignment, CspSolver, SolutionQuality};
