#[derive(Clone, Debug, PartialEq)]
pub struct Node<N> {
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub data: N,
}

impl<N> Node<N> {
    /// Unplaced node; the simulation assigns an initial position.
    pub fn new(data: N) -> Self {
        Self {
            index: 0,
            x: f64::NAN,
            y: f64::NAN,
            vx: 0.0,
            vy: 0.0,
            data,
        }
    }

    pub fn at(data: N, x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Self::new(data)
        }
    }

    pub fn is_placed(&self) -> bool {
        !self.x.is_nan() && !self.y.is_nan()
    }
}

/// A link endpoint: a lookup key until `initialize` resolves it to the index
/// of a node in the slice the force was initialized with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Endpoint<K> {
    Key(K),
    Node(usize),
}

impl<K> Endpoint<K> {
    pub fn node(&self) -> Option<usize> {
        match self {
            Self::Node(index) => Some(*index),
            Self::Key(_) => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Node(_))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Link<K, L> {
    pub index: usize,
    pub source: Endpoint<K>,
    pub target: Endpoint<K>,
    pub data: L,
}

impl<K, L> Link<K, L> {
    pub fn new(source: K, target: K, data: L) -> Self {
        Self {
            index: 0,
            source: Endpoint::Key(source),
            target: Endpoint::Key(target),
            data,
        }
    }

    pub fn between(source: usize, target: usize, data: L) -> Self {
        Self {
            index: 0,
            source: Endpoint::Node(source),
            target: Endpoint::Node(target),
            data,
        }
    }

    /// Resolved `(source, target)` node indices, once initialized.
    pub fn endpoints(&self) -> Option<(usize, usize)> {
        Some((self.source.node()?, self.target.node()?))
    }
}
