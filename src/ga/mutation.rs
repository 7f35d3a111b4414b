//! Partition-editing mutation operators.

use rand::Rng;

use crate::ga::Chromosome;
use crate::models::{Delivery, Drone};

/// The four mutation operators, drawn uniformly at random.
///
/// Each is a pure edit of the partition; the optimizer follows every
/// mutation with a capacity repair pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// Exchange one delivery between two non-empty drones.
    Swap,
    /// Move one delivery from a non-empty drone to any drone.
    Move,
    /// Assign one currently-unassigned delivery to a random drone.
    Add,
    /// Drop one delivery from a non-empty drone.
    Remove,
}

impl Mutation {
    /// Draws one of the four operators uniformly.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        match rng.random_range(0..4u32) {
            0 => Mutation::Swap,
            1 => Mutation::Move,
            2 => Mutation::Add,
            _ => Mutation::Remove,
        }
    }

    /// Applies this operator to the chromosome.
    ///
    /// Operators that find no applicable genes (e.g. a swap with fewer
    /// than two loaded drones) leave the chromosome unchanged.
    pub fn apply<R: Rng>(
        self,
        chromosome: &mut Chromosome,
        rng: &mut R,
        drones: &[Drone],
        deliveries: &[Delivery],
    ) {
        match self {
            Mutation::Swap => swap(chromosome, rng),
            Mutation::Move => move_one(chromosome, rng, drones),
            Mutation::Add => add_one(chromosome, rng, drones, deliveries),
            Mutation::Remove => remove_one(chromosome, rng),
        }
    }
}

fn loaded_drones(chromosome: &Chromosome) -> Vec<usize> {
    chromosome
        .genes()
        .iter()
        .filter(|(_, list)| !list.is_empty())
        .map(|(&id, _)| id)
        .collect()
}

fn swap<R: Rng>(chromosome: &mut Chromosome, rng: &mut R) {
    let loaded = loaded_drones(chromosome);
    if loaded.len() < 2 {
        return;
    }
    // Two distinct drones, uniformly.
    let a = rng.random_range(0..loaded.len());
    let mut b = rng.random_range(0..loaded.len() - 1);
    if b >= a {
        b += 1;
    }
    let (drone_a, drone_b) = (loaded[a], loaded[b]);

    let genes = chromosome.genes_mut();
    let ia = rng.random_range(0..genes[&drone_a].len());
    let ib = rng.random_range(0..genes[&drone_b].len());

    let va = genes.get_mut(&drone_a).map(|l| l.remove(ia));
    let vb = genes.get_mut(&drone_b).map(|l| l.remove(ib));
    if let (Some(va), Some(vb)) = (va, vb) {
        if let Some(list) = genes.get_mut(&drone_a) {
            list.push(vb);
        }
        if let Some(list) = genes.get_mut(&drone_b) {
            list.push(va);
        }
    }
}

fn move_one<R: Rng>(chromosome: &mut Chromosome, rng: &mut R, drones: &[Drone]) {
    let loaded = loaded_drones(chromosome);
    if loaded.is_empty() || drones.is_empty() {
        return;
    }
    let source = loaded[rng.random_range(0..loaded.len())];
    let target = drones[rng.random_range(0..drones.len())].id();

    let genes = chromosome.genes_mut();
    let Some(list) = genes.get_mut(&source) else {
        return;
    };
    let value = list.remove(rng.random_range(0..list.len()));
    if let Some(list) = genes.get_mut(&target) {
        list.push(value);
    }
}

fn add_one<R: Rng>(
    chromosome: &mut Chromosome,
    rng: &mut R,
    drones: &[Drone],
    deliveries: &[Delivery],
) {
    if drones.is_empty() {
        return;
    }
    let assigned = chromosome.assigned();
    let unassigned: Vec<usize> = deliveries
        .iter()
        .map(|d| d.id())
        .filter(|id| !assigned.contains(id))
        .collect();
    if unassigned.is_empty() {
        return;
    }

    let value = unassigned[rng.random_range(0..unassigned.len())];
    let target = drones[rng.random_range(0..drones.len())].id();
    if let Some(list) = chromosome.genes_mut().get_mut(&target) {
        list.push(value);
    }
}

fn remove_one<R: Rng>(chromosome: &mut Chromosome, rng: &mut R) {
    let loaded = loaded_drones(chromosome);
    if loaded.is_empty() {
        return;
    }
    let source = loaded[rng.random_range(0..loaded.len())];
    if let Some(list) = chromosome.genes_mut().get_mut(&source) {
        list.remove(rng.random_range(0..list.len()));
    }
}
