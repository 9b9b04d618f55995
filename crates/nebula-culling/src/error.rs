//! Culling error types.

use thiserror::Error;

/// Errors surfaced by the registry, the culling group and the volume keeper.
///
/// Nothing here is retried internally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CullingError {
    /// Registration or a count write would exceed the preallocated capacity.
    #[error("culling registry is full (capacity {capacity})")]
    OutOfCapacity { capacity: usize },

    /// LOD thresholds were rejected. The previous thresholds stay in effect.
    #[error("invalid LOD thresholds: {0}")]
    InvalidThresholds(String),

    /// A slot outside `[0, count)` was used for removal or a bounds write.
    #[error("invalid slot {slot} (count {count})")]
    InvalidSlot { slot: usize, count: usize },

    /// A volume handle that was never registered or has been unregistered.
    #[error("volume handle is not registered")]
    InvalidHandle,

    /// The parallel worker pool could not start its threads.
    #[error("failed to build worker pool: {0}")]
    WorkerPool(String),
}
