use std::fmt;

use crate::graph::Link;

pub type LinkFn<K, L> = Box<dyn Fn(&Link<K, L>, usize, &[Link<K, L>]) -> f64>;

pub const DEFAULT_DISTANCE: f64 = 30.0;

/// Per-link strength source. Negative values switch a link into repulsion.
pub enum Strength<K, L> {
    /// `1 / min(degree(source), degree(target))`.
    Degree,
    Constant(f64),
    Function(LinkFn<K, L>),
}

impl<K, L> Strength<K, L> {
    pub fn function(f: impl Fn(&Link<K, L>, usize, &[Link<K, L>]) -> f64 + 'static) -> Self {
        Self::Function(Box::new(f))
    }
}

impl<K, L> Default for Strength<K, L> {
    fn default() -> Self {
        Self::Degree
    }
}

impl<K, L> From<f64> for Strength<K, L> {
    fn from(value: f64) -> Self {
        Self::Constant(value)
    }
}

impl<K, L> fmt::Debug for Strength<K, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Degree => f.write_str("Degree"),
            Self::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
        }
    }
}

pub enum Distance<K, L> {
    Constant(f64),
    Function(LinkFn<K, L>),
}

impl<K, L> Distance<K, L> {
    pub fn function(f: impl Fn(&Link<K, L>, usize, &[Link<K, L>]) -> f64 + 'static) -> Self {
        Self::Function(Box::new(f))
    }

    pub(super) fn eval(&self, link: &Link<K, L>, index: usize, links: &[Link<K, L>]) -> f64 {
        match self {
            Self::Constant(value) => *value,
            Self::Function(f) => f(link, index, links),
        }
    }
}

impl<K, L> Default for Distance<K, L> {
    fn default() -> Self {
        Self::Constant(DEFAULT_DISTANCE)
    }
}

impl<K, L> From<f64> for Distance<K, L> {
    fn from(value: f64) -> Self {
        Self::Constant(value)
    }
}

impl<K, L> fmt::Debug for Distance<K, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
        }
    }
}

pub(super) fn degree_strength(degrees: &[usize], source: usize, target: usize) -> f64 {
    let degree = degrees[source].min(degrees[target]);
    1.0 / degree as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_strength_uses_smaller_degree() {
        let degrees = [1, 3, 4];
        assert_eq!(degree_strength(&degrees, 0, 1), 1.0);
        assert_eq!(degree_strength(&degrees, 1, 2), 1.0 / 3.0);
        assert_eq!(degree_strength(&degrees, 2, 1), 1.0 / 3.0);
    }

    #[test]
    fn constants_convert_from_numbers() {
        let strength: Strength<usize, ()> = 0.25.into();
        assert!(matches!(strength, Strength::Constant(value) if value == 0.25));

        let distance: Distance<usize, ()> = Distance::default();
        assert_eq!(distance.eval(&Link::between(0, 1, ()), 0, &[]), DEFAULT_DISTANCE);
    }
}
