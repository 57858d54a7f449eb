use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkForceError<K> {
    #[error("node not found: {0}")]
    NodeNotFound(K),
    #[error("node index out of range: {index} (node count {count})")]
    IndexOutOfRange { index: usize, count: usize },
}
