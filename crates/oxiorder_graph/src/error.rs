use thiserror::Error;

use oxiorder_core::DiscoveryError;

pub type Result<T> = std::result::Result<T, OrderError>;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("no node with key '{key}'")]
    MissingNode { key: String },
}

#[derive(Debug, Error)]
pub enum OrderError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl OrderError {
    /// Whether this failure names a broken reference in the analysed project.
    pub fn is_configuration(&self) -> bool {
        match self {
            OrderError::Discovery(e) => e.is_configuration(),
            OrderError::Graph(_) => false,
        }
    }
}
