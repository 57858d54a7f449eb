mod coefficient;
mod link;

use crate::graph::Node;

pub use coefficient::{DEFAULT_DISTANCE, Distance, LinkFn, Strength};
pub use link::{IdFn, LinkForce};

/// A force the host runs once per tick. Forces mutate node velocities in
/// place and must be applied one after another, never concurrently.
pub trait Force<N> {
    /// Called whenever the node set changes.
    fn initialize(&mut self, nodes: &mut [Node<N>]) -> anyhow::Result<()>;

    fn apply(&mut self, alpha: f64, nodes: &mut [Node<N>]);
}
