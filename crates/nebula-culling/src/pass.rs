//! The per-frame culling pass: frustum test plus viewport height for every
//! live slot, run sequentially or chunked across a [`WorkerPool`].

use glam::Mat4;

use crate::bounds::Aabb;
use crate::diff;
use crate::frustum::Frustum;
use crate::lod::LodThresholds;
use crate::state::{ChangeEvent, FrameState};
use crate::worker_pool::WorkerPool;

/// How the culling pass and the state diff are executed.
///
/// Both strategies produce identical results for identical inputs; only
/// latency differs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ExecutionStrategy {
    /// Single loop on the calling thread.
    #[default]
    Sequential,
    /// Fixed-size chunks spread over a persistent pool, joined before returning.
    Parallel(WorkerPool),
}

impl ExecutionStrategy {
    /// Compute `out[i]` for every `bounds[i]`.
    ///
    /// `out` must be exactly as long as `bounds`.
    pub fn cull(&self, bounds: &[Aabb], view_projection: &Mat4, frustum: &Frustum, out: &mut [FrameState]) {
        debug_assert_eq!(bounds.len(), out.len());
        match self {
            Self::Sequential => cull_sequential(bounds, view_projection, frustum, out),
            Self::Parallel(pool) => cull_parallel(pool, bounds, view_projection, frustum, out),
        }
    }

    /// Append one event per slot whose packed state differs between
    /// `previous` and `current`.
    pub fn diff(
        &self,
        previous: &[FrameState],
        current: &[FrameState],
        thresholds: &LodThresholds,
        events: &mut Vec<ChangeEvent>,
    ) {
        match self {
            Self::Sequential => diff::diff_sequential(previous, current, thresholds, events),
            Self::Parallel(pool) => diff::diff_parallel(pool, previous, current, thresholds, events),
        }
    }

    pub fn is_parallel(&self) -> bool {
        matches!(self, Self::Parallel(_))
    }
}

/// Culling result for a single box.
#[inline]
pub fn cull_slot(aabb: &Aabb, view_projection: &Mat4, frustum: &Frustum) -> FrameState {
    FrameState {
        viewport_height: crate::viewport::viewport_height(view_projection, aabb),
        visible: frustum.intersects_aabb(aabb),
    }
}

/// Reference implementation: one loop over all slots.
pub fn cull_sequential(bounds: &[Aabb], view_projection: &Mat4, frustum: &Frustum, out: &mut [FrameState]) {
    for (state, aabb) in out.iter_mut().zip(bounds) {
        *state = cull_slot(aabb, view_projection, frustum);
    }
}

/// Chunked variant. Reads `bounds` concurrently, each chunk writes its own
/// slice of `out`.
pub fn cull_parallel(
    pool: &WorkerPool,
    bounds: &[Aabb],
    view_projection: &Mat4,
    frustum: &Frustum,
    out: &mut [FrameState],
) {
    pool.for_each_chunk_mut(out, |start, chunk| {
        let inputs = &bounds[start..start + chunk.len()];
        cull_sequential(inputs, view_projection, frustum, chunk);
    });
}
