use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::hash::Hash;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace, warn};

use super::Force;
use super::coefficient::{Distance, Strength, degree_strength};
use crate::error::LinkForceError;
use crate::graph::{Endpoint, Link, Node};

pub type IdFn<N, K> = Box<dyn Fn(&Node<N>, usize, &[Node<N>]) -> K>;

const JITTER_SCALE: f64 = 1e-6;
const DEFAULT_SEED: u64 = 0x5eed;

/// Key table built from the node set of the last successful `initialize`.
struct NodeLookup<K> {
    by_key: HashMap<K, usize>,
    count: usize,
}

impl<K: Hash + Eq + Clone + Debug> NodeLookup<K> {
    fn build<N>(nodes: &[Node<N>], id: &IdFn<N, K>) -> Self {
        // Duplicate keys: the last node wins.
        let by_key = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (id(node, index, nodes), index))
            .collect();
        Self {
            by_key,
            count: nodes.len(),
        }
    }

    fn resolve(&self, endpoint: &Endpoint<K>) -> Result<usize, LinkForceError<K>> {
        match endpoint {
            Endpoint::Node(index) if *index < self.count => Ok(*index),
            Endpoint::Node(index) => Err(LinkForceError::IndexOutOfRange {
                index: *index,
                count: self.count,
            }),
            Endpoint::Key(key) => self
                .by_key
                .get(key)
                .copied()
                .ok_or_else(|| LinkForceError::NodeNotFound(key.clone())),
        }
    }

    fn resolve_all<L>(
        &self,
        links: &[Link<K, L>],
    ) -> Result<Vec<(usize, usize)>, LinkForceError<K>> {
        links
            .iter()
            .map(|link| Ok((self.resolve(&link.source)?, self.resolve(&link.target)?)))
            .collect()
    }
}

/// Link force with signed strengths: non-negative links act as springs,
/// negative links push their endpoints apart with an inverse-displacement law.
pub struct LinkForce<N, L, K = usize> {
    links: Vec<Link<K, L>>,
    id: IdFn<N, K>,
    strength: Strength<K, L>,
    distance: Distance<K, L>,
    iterations: usize,
    lookup: Option<NodeLookup<K>>,
    /// Set when `id` changed after the lookup was built.
    lookup_stale: bool,
    endpoints: Vec<(usize, usize)>,
    degrees: Vec<usize>,
    strengths: Vec<f64>,
    distances: Vec<f64>,
    rng: StdRng,
}

impl<N, L> LinkForce<N, L, usize> {
    /// Links keyed by each node's ordinal position.
    pub fn new(links: Vec<Link<usize, L>>) -> Self {
        Self::with_id(links, |_, index, _| index)
    }
}

impl<N, L, K> LinkForce<N, L, K>
where
    K: Hash + Eq + Clone + Debug,
{
    pub fn with_id(
        links: Vec<Link<K, L>>,
        id: impl Fn(&Node<N>, usize, &[Node<N>]) -> K + 'static,
    ) -> Self {
        Self {
            links,
            id: Box::new(id),
            strength: Strength::default(),
            distance: Distance::default(),
            iterations: 1,
            lookup: None,
            lookup_stale: false,
            endpoints: Vec::new(),
            degrees: Vec::new(),
            strengths: Vec::new(),
            distances: Vec::new(),
            rng: StdRng::seed_from_u64(DEFAULT_SEED),
        }
    }

    /// Keys already resolved stay resolved. Links set after this call are
    /// resolved with the new keys at the next `initialize`.
    pub fn set_id(
        &mut self,
        id: impl Fn(&Node<N>, usize, &[Node<N>]) -> K + 'static,
    ) -> &mut Self {
        self.id = Box::new(id);
        self.lookup_stale = self.lookup.is_some();
        self
    }

    pub fn id(&self) -> &dyn Fn(&Node<N>, usize, &[Node<N>]) -> K {
        &*self.id
    }

    pub fn set_strength(&mut self, strength: impl Into<Strength<K, L>>) -> &mut Self {
        self.strength = strength.into();
        self.rebuild_strengths();
        self
    }

    pub fn set_strength_with(
        &mut self,
        f: impl Fn(&Link<K, L>, usize, &[Link<K, L>]) -> f64 + 'static,
    ) -> &mut Self {
        self.set_strength(Strength::function(f))
    }

    pub fn strength(&self) -> &Strength<K, L> {
        &self.strength
    }

    pub fn set_distance(&mut self, distance: impl Into<Distance<K, L>>) -> &mut Self {
        self.distance = distance.into();
        self.rebuild_distances();
        self
    }

    pub fn set_distance_with(
        &mut self,
        f: impl Fn(&Link<K, L>, usize, &[Link<K, L>]) -> f64 + 'static,
    ) -> &mut Self {
        self.set_distance(Distance::function(f))
    }

    pub fn distance(&self) -> &Distance<K, L> {
        &self.distance
    }

    pub fn set_iterations(&mut self, iterations: usize) -> &mut Self {
        self.iterations = iterations;
        self
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Reseeds the generator behind the coincident-point jitter.
    pub fn set_seed(&mut self, seed: u64) -> &mut Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Replaces the link set and re-initializes against the current node set.
    /// On error the previous links and caches are kept. After `set_id` the
    /// key table no longer matches, so the links wait for `initialize` and the
    /// force is inert until then.
    pub fn set_links(
        &mut self,
        links: Vec<Link<K, L>>,
    ) -> Result<&mut Self, LinkForceError<K>> {
        if self.lookup_stale {
            debug!(links = links.len(), "id changed; deferring link resolution");
            self.links = links;
            self.reset();
            return Ok(self);
        }

        match self.lookup.take() {
            Some(lookup) => {
                let resolved = match lookup.resolve_all(&links) {
                    Ok(resolved) => resolved,
                    Err(err) => {
                        warn!(error = ?err, "rejected link set");
                        self.lookup = Some(lookup);
                        return Err(err);
                    }
                };
                self.links = links;
                self.commit(lookup, resolved);
            }
            None => self.links = links,
        }
        Ok(self)
    }

    pub fn links(&self) -> &[Link<K, L>] {
        &self.links
    }

    pub fn strengths(&self) -> &[f64] {
        &self.strengths
    }

    /// Cached per-link distances. The velocity update does not read them.
    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    pub fn degrees(&self) -> &[usize] {
        &self.degrees
    }

    pub fn is_initialized(&self) -> bool {
        self.lookup.is_some()
    }

    /// Resolves every link against `nodes` and rebuilds the degree table and
    /// coefficient caches. Nothing is changed unless every endpoint resolves.
    pub fn initialize(&mut self, nodes: &mut [Node<N>]) -> Result<(), LinkForceError<K>> {
        if nodes.is_empty() {
            return Ok(());
        }

        let lookup = NodeLookup::build(nodes, &self.id);
        let resolved = lookup.resolve_all(&self.links).inspect_err(|err| {
            warn!(error = ?err, "link force initialization failed");
        })?;

        for (index, node) in nodes.iter_mut().enumerate() {
            node.index = index;
        }
        self.commit(lookup, resolved);

        debug!(
            nodes = nodes.len(),
            links = self.links.len(),
            "link force initialized"
        );
        Ok(())
    }

    fn reset(&mut self) {
        self.lookup = None;
        self.lookup_stale = false;
        self.endpoints.clear();
        self.degrees.clear();
        self.strengths.clear();
        self.distances.clear();
    }

    fn commit(&mut self, lookup: NodeLookup<K>, resolved: Vec<(usize, usize)>) {
        let mut degrees = vec![0; lookup.count];
        let pairs = self.links.iter_mut().zip(&resolved).enumerate();
        for (index, (link, &(source, target))) in pairs {
            link.index = index;
            link.source = Endpoint::Node(source);
            link.target = Endpoint::Node(target);
            degrees[source] += 1;
            degrees[target] += 1;
        }

        self.degrees = degrees;
        self.endpoints = resolved;
        self.lookup = Some(lookup);
        self.lookup_stale = false;
        self.rebuild_strengths();
        self.rebuild_distances();
    }

    fn rebuild_strengths(&mut self) {
        if self.lookup.is_none() {
            return;
        }

        let links = &self.links;
        self.strengths = match &self.strength {
            Strength::Degree => self
                .endpoints
                .iter()
                .map(|&(source, target)| degree_strength(&self.degrees, source, target))
                .collect(),
            Strength::Constant(value) => vec![*value; links.len()],
            Strength::Function(f) => links
                .iter()
                .enumerate()
                .map(|(index, link)| f(link, index, links))
                .collect(),
        };
    }

    fn rebuild_distances(&mut self) {
        if self.lookup.is_none() {
            return;
        }

        let links = &self.links;
        self.distances = links
            .iter()
            .enumerate()
            .map(|(index, link)| self.distance.eval(link, index, links))
            .collect();
    }

    /// Runs `iterations` passes over every link, updating `vx`/`vy` of the
    /// nodes passed to the last successful `initialize`.
    pub fn apply(&mut self, alpha: f64, nodes: &mut [Node<N>]) {
        let Some(lookup) = &self.lookup else {
            return;
        };
        if lookup.count != nodes.len() {
            warn!(
                expected = lookup.count,
                actual = nodes.len(),
                "node count changed since initialize; skipping link force"
            );
            return;
        }

        for _ in 0..self.iterations {
            for (&(source, target), &strength) in self.endpoints.iter().zip(&self.strengths) {
                let (s, t) = (&nodes[source], &nodes[target]);
                let dx = nonzero_or_jiggle(t.x + t.vx - s.x - s.vx, &mut self.rng);
                let dy = nonzero_or_jiggle(t.y + t.vy - s.y - s.vy, &mut self.rng);

                let k = alpha * strength;
                let (delta_x, delta_y) = if strength >= 0.0 {
                    (2.0 * k * dx, 2.0 * k * dy)
                } else {
                    (k / dx, k / dy)
                };

                nodes[target].vx -= delta_x;
                nodes[target].vy -= delta_y;
                nodes[source].vx += delta_x;
                nodes[source].vy += delta_y;
            }
        }
    }
}

impl<N, L, K> Force<N> for LinkForce<N, L, K>
where
    K: Hash + Eq + Clone + Debug + Display + Send + Sync + 'static,
{
    fn initialize(&mut self, nodes: &mut [Node<N>]) -> anyhow::Result<()> {
        LinkForce::initialize(self, nodes)?;
        Ok(())
    }

    fn apply(&mut self, alpha: f64, nodes: &mut [Node<N>]) {
        LinkForce::apply(self, alpha, nodes);
    }
}

fn jiggle(rng: &mut StdRng) -> f64 {
    loop {
        let value = (rng.random::<f64>() - 0.5) * JITTER_SCALE;
        if value != 0.0 {
            return value;
        }
    }
}

/// Zero, subnormal and NaN displacements are replaced; dividing by a subnormal
/// overflows to infinity.
fn nonzero_or_jiggle(value: f64, rng: &mut StdRng) -> f64 {
    if value.is_nan() || value.abs() < f64::MIN_POSITIVE {
        trace!(value, "degenerate displacement; substituting jitter");
        jiggle(rng)
    } else {
        value
    }
}
