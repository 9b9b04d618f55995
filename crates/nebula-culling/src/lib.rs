//! CPU frustum culling and LOD tracking for large sets of axis-aligned boxes, with per-frame change events.

pub mod bounds;
pub mod diff;
pub mod error;
pub mod frame_buffers;
pub mod frustum;
pub mod group;
pub mod lod;
pub mod pass;
pub mod registry;
pub mod state;
pub mod viewport;
pub mod volume;
pub mod worker_pool;

#[cfg(test)]
mod scenario_tests;

pub use bounds::Aabb;
pub use error::CullingError;
pub use frame_buffers::FrameBuffers;
pub use frustum::{ClipDepth, Frustum, PLANE_EPSILON};
pub use group::{CullingGroup, GroupState, ReferenceCamera, StateChangedCallback};
pub use lod::{LodThresholds, MAX_LOD_THRESHOLDS, bucket};
pub use pass::ExecutionStrategy;
pub use registry::{BoundingVolumeRegistry, Relocation};
pub use state::{ChangeEvent, FrameState, PackedState};
pub use viewport::viewport_height;
pub use volume::{VolumeEvent, VolumeEventKind, VolumeHandle, VolumeKeeper};
pub use worker_pool::{DEFAULT_CHUNK_SIZE, WorkerPool};
