//! Traits for the connection pooling collaborator.
//!
//! Connection pools live outside this crate; the runtime services facade
//! only reads their statistics and asks for resets. Implement
//! [`ConnectionPoolProvider`] for whatever owns the pools.

/// Statistics of one connection pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolInfo {
    /// Minimum number of connections the pool keeps open.
    pub min_connections: usize,
    /// Maximum number of connections the pool may open.
    pub max_connections: usize,
}

/// The seam to the connection pooling infrastructure.
pub trait ConnectionPoolProvider: Send + Sync {
    /// The names of all available pools.
    fn pool_names(&self) -> Vec<String>;

    /// Statistics for one pool, or `None` when no such pool exists.
    fn pool_info(&self, name: &str) -> Option<PoolInfo>;

    /// Shuts down and restarts every pool.
    fn reset_all(&self);
}
