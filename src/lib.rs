//! Signed link force for 2-D force-directed layouts.
//!
//! [`LinkForce`] treats each link as a spring when its strength is
//! non-negative and as an inverse-displacement repulsor when it is negative.
//! Hosts call [`LinkForce::initialize`] whenever the node set changes and
//! [`LinkForce::apply`] once per tick.

mod error;
pub mod force;
mod graph;
pub mod similarity;
pub mod simulation;

pub use error::LinkForceError;
pub use force::{Distance, Force, LinkForce, Strength};
pub use graph::{Endpoint, Link, Node};
pub use simulation::{Simulation, SimulationConfig};
