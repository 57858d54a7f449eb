use std::f64::consts::PI;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::force::Force;
use crate::graph::Node;

const INITIAL_RADIUS: f64 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationConfig {
    pub alpha_min: f64,
    pub alpha_decay: f64,
    pub alpha_target: f64,
    /// Fraction of velocity removed after each tick.
    pub velocity_decay: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let alpha_min = 0.001;
        Self {
            alpha_min,
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
            alpha_target: 0.0,
            velocity_decay: 0.4,
        }
    }
}

/// Minimal tick driver: decays alpha, runs registered forces in order, then
/// integrates velocities into positions.
pub struct Simulation<N> {
    nodes: Vec<Node<N>>,
    forces: Vec<(String, Box<dyn Force<N>>)>,
    alpha: f64,
    config: SimulationConfig,
}

impl<N> Simulation<N> {
    pub fn new(mut nodes: Vec<Node<N>>, config: SimulationConfig) -> Self {
        place_nodes(&mut nodes);
        Self {
            nodes,
            forces: Vec::new(),
            alpha: 1.0,
            config,
        }
    }

    /// Registers `force` under `name`, replacing any force with that name.
    pub fn add_force(
        &mut self,
        name: &str,
        mut force: impl Force<N> + 'static,
    ) -> Result<&mut Self> {
        force
            .initialize(&mut self.nodes)
            .with_context(|| format!("failed to initialize force {name:?}"))?;

        let force: Box<dyn Force<N>> = Box::new(force);
        match self.forces.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, slot)) => *slot = force,
            None => self.forces.push((name.to_string(), force)),
        }
        Ok(self)
    }

    pub fn remove_force(&mut self, name: &str) -> bool {
        let before = self.forces.len();
        self.forces.retain(|(existing, _)| existing != name);
        self.forces.len() != before
    }

    /// Replaces the node set and re-initializes every force against it. If a
    /// force rejects the new nodes, the forces before it are initialized
    /// against the current nodes again and the node set is kept.
    pub fn set_nodes(&mut self, mut nodes: Vec<Node<N>>) -> Result<()> {
        place_nodes(&mut nodes);
        let failure = self
            .forces
            .iter_mut()
            .enumerate()
            .find_map(|(position, (name, force))| {
                force
                    .initialize(&mut nodes)
                    .with_context(|| format!("failed to initialize force {name:?}"))
                    .err()
                    .map(|err| (position, err))
            });

        if let Some((failed, err)) = failure {
            for (name, force) in &mut self.forces[..failed] {
                if let Err(restore) = force.initialize(&mut self.nodes) {
                    warn!(force = name.as_str(), error = %restore, "force restore failed");
                }
            }
            return Err(err);
        }

        self.nodes = nodes;
        Ok(())
    }

    pub fn tick(&mut self) {
        self.alpha += (self.config.alpha_target - self.alpha) * self.config.alpha_decay;

        for (_, force) in &mut self.forces {
            force.apply(self.alpha, &mut self.nodes);
        }

        let retain = 1.0 - self.config.velocity_decay;
        for node in &mut self.nodes {
            node.vx *= retain;
            node.vy *= retain;
            node.x += node.vx;
            node.y += node.vy;
        }
    }

    /// Ticks until alpha drops below `alpha_min` or `max_ticks` is reached.
    /// Returns the number of ticks run.
    pub fn run(&mut self, max_ticks: usize) -> usize {
        let mut ticks = 0;
        while ticks < max_ticks && self.alpha >= self.config.alpha_min {
            self.tick();
            ticks += 1;
        }
        debug!(ticks, alpha = self.alpha, "simulation stopped");
        ticks
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn set_alpha(&mut self, alpha: f64) {
        self.alpha = alpha;
    }

    pub fn nodes(&self) -> &[Node<N>] {
        &self.nodes
    }

    pub fn into_nodes(self) -> Vec<Node<N>> {
        self.nodes
    }
}

/// Assigns indices, places unplaced nodes on a phyllotaxis spiral and zeroes
/// undefined velocities.
fn place_nodes<N>(nodes: &mut [Node<N>]) {
    let initial_angle = PI * (3.0 - 5.0_f64.sqrt());
    for (index, node) in nodes.iter_mut().enumerate() {
        node.index = index;
        if !node.is_placed() {
            let radius = INITIAL_RADIUS * (0.5 + index as f64).sqrt();
            let angle = index as f64 * initial_angle;
            node.x = radius * angle.cos();
            node.y = radius * angle.sin();
        }
        if node.vx.is_nan() || node.vy.is_nan() {
            node.vx = 0.0;
            node.vy = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unplaced_nodes_land_on_distinct_spiral_points() {
        let sim = Simulation::new(
            vec![Node::new(()), Node::new(()), Node::at((), 5.0, 5.0)],
            SimulationConfig::default(),
        );
        let nodes = sim.nodes();
        assert!(nodes.iter().all(Node::is_placed));
        assert_ne!((nodes[0].x, nodes[0].y), (nodes[1].x, nodes[1].y));
        assert_eq!((nodes[2].x, nodes[2].y), (5.0, 5.0));
        assert_eq!(nodes[2].index, 2);
    }

    #[test]
    fn run_stops_once_alpha_falls_below_minimum() {
        let mut sim = Simulation::<()>::new(Vec::new(), SimulationConfig::default());
        let ticks = sim.run(10_000);
        assert!(ticks > 0 && ticks < 10_000);
        assert!(sim.alpha() < SimulationConfig::default().alpha_min);
        assert_eq!(sim.run(10), 0);
    }

    #[test]
    fn set_nodes_reinitializes_forces() {
        use crate::{Link, LinkForce};

        let mut sim = Simulation::new(vec![Node::new(()); 2], SimulationConfig::default());
        sim.add_force("link", LinkForce::new(vec![Link::new(0, 1, ())])).unwrap();

        assert!(sim.set_nodes(vec![Node::new(())]).is_err());
        assert_eq!(sim.nodes().len(), 2);
        assert!(sim.set_nodes(vec![Node::new(()); 3]).is_ok());
        assert_eq!(sim.nodes()[2].index, 2);
    }

    #[test]
    fn rejected_node_set_keeps_earlier_forces_on_current_nodes() {
        use crate::{Link, LinkForce};

        let mut sim = Simulation::new(vec![Node::new(()); 3], SimulationConfig::default());
        sim.add_force("near", LinkForce::new(vec![Link::new(0, 1, ())]))
            .unwrap()
            .add_force("far", LinkForce::new(vec![Link::new(0, 2, ())]))
            .unwrap();

        let err = sim.set_nodes(vec![Node::new(()); 2]).unwrap_err();
        assert!(format!("{err:#}").contains("\"far\""));
        assert_eq!(sim.nodes().len(), 3);

        // Only "near" moves node 1; it would skip the tick if left on two nodes.
        sim.tick();
        assert!(sim.nodes()[1].vx != 0.0);
    }

    #[test]
    fn velocity_is_integrated_with_decay() {
        let mut node = Node::at((), 0.0, 0.0);
        node.vx = 10.0;
        let mut sim = Simulation::new(vec![node], SimulationConfig::default());
        sim.tick();
        assert!((sim.nodes()[0].vx - 6.0).abs() < 1e-12);
        assert!((sim.nodes()[0].x - 6.0).abs() < 1e-12);
    }
}
