//! Bounded data-parallel executor for the culling pass and the state diff.
//!
//! Backed by a dedicated rayon pool that is built once and reused every frame.
//! Work is split into fixed-size chunks; each call blocks until every chunk is
//! done, which is the single join point per pass. Inputs are shared read-only
//! and every chunk writes a disjoint output slice.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::error::CullingError;

/// Chunk size used when none is configured.
pub const DEFAULT_CHUNK_SIZE: usize = 64;

/// Parallel-for executor with a fixed worker bound and chunk size.
///
/// Clones share the same threads.
#[derive(Clone)]
pub struct WorkerPool {
    pool: Arc<ThreadPool>,
    workers: usize,
    chunk_size: usize,
}

impl WorkerPool {
    /// Start `workers` threads. Both values are clamped to at least 1.
    pub fn new(workers: usize, chunk_size: usize) -> Result<Self, CullingError> {
        let workers = workers.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("cull-worker-{i}"))
            .build()
            .map_err(|err| CullingError::WorkerPool(err.to_string()))?;
        debug!(workers, chunk_size, "culling worker pool started");
        Ok(Self {
            pool: Arc::new(pool),
            workers,
            chunk_size: chunk_size.max(1),
        })
    }

    /// One worker per logical CPU, [`DEFAULT_CHUNK_SIZE`] items per chunk.
    pub fn with_defaults() -> Result<Self, CullingError> {
        Self::new(num_cpus::get(), DEFAULT_CHUNK_SIZE)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of chunks `len` items split into.
    pub fn chunk_count(&self, len: usize) -> usize {
        len.div_ceil(self.chunk_size)
    }

    /// Run `job(first_index, chunk)` over disjoint chunks of `output`. Blocks
    /// until every chunk is done.
    pub fn for_each_chunk_mut<T, F>(&self, output: &mut [T], job: F)
    where
        T: Send,
        F: Fn(usize, &mut [T]) + Sync,
    {
        let size = self.chunk_size;
        self.pool.install(|| {
            output
                .par_chunks_mut(size)
                .enumerate()
                .for_each(|(i, chunk)| job(i * size, chunk));
        });
    }

    /// Run `job` once per chunk range of `0..len` and return the results in
    /// chunk order. Blocks until every chunk is done.
    pub fn map_chunks<R, F>(&self, len: usize, job: F) -> Vec<R>
    where
        R: Send,
        F: Fn(Range<usize>) -> R + Sync,
    {
        let size = self.chunk_size;
        let chunks = self.chunk_count(len);
        self.pool.install(|| {
            (0..chunks)
                .into_par_iter()
                .map(|i| job(i * size..((i + 1) * size).min(len)))
                .collect()
        })
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers)
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

/// Pools compare by configuration, not by thread identity.
impl PartialEq for WorkerPool {
    fn eq(&self, other: &Self) -> bool {
        self.workers == other.workers && self.chunk_size == other.chunk_size
    }
}

impl Eq for WorkerPool {}
