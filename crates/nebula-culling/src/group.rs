//! The culling group: one object that owns the registry, the camera matrices
//! and the LOD configuration, and turns each frame into change events.
//!
//! Single-writer discipline: `update`, `check_event` and every registry
//! mutation must come from the thread driving the frame loop, never
//! concurrently. Parallelism only happens inside a single `update` call.

use glam::Mat4;
use tracing::{debug, trace, warn};

use crate::bounds::Aabb;
use crate::error::CullingError;
use crate::frustum::{ClipDepth, Frustum};
use crate::lod::LodThresholds;
use crate::pass::ExecutionStrategy;
use crate::registry::{BoundingVolumeRegistry, Relocation};
use crate::state::{ChangeEvent, FrameState};

/// Callback invoked synchronously once per emitted event.
pub type StateChangedCallback = Box<dyn FnMut(&ChangeEvent) + Send>;

/// Camera matrices the group culls against.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReferenceCamera {
    /// World-to-camera matrix.
    pub view: Mat4,
    /// Camera-to-clip matrix.
    pub projection: Mat4,
    /// Clip-space depth convention of `projection`.
    pub clip_depth: ClipDepth,
}

impl ReferenceCamera {
    /// A camera whose projection maps depth to `[0, 1]`.
    pub fn new(view: Mat4, projection: Mat4) -> Self {
        Self {
            view,
            projection,
            clip_depth: ClipDepth::ZeroToOne,
        }
    }

    pub fn with_clip_depth(mut self, clip_depth: ClipDepth) -> Self {
        self.clip_depth = clip_depth;
        self
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

/// Lifecycle of a [`CullingGroup`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupState {
    /// No storage allocated yet.
    Uninitialized,
    /// Storage allocated, no frame computed since setup.
    Configured,
    /// At least one frame computed.
    Running,
}

/// Per-frame visibility and LOD tracker for a fixed-capacity set of AABBs.
pub struct CullingGroup {
    state: GroupState,
    registry: BoundingVolumeRegistry,
    camera: Option<ReferenceCamera>,
    view_projection: Mat4,
    frustum: Frustum,
    thresholds: LodThresholds,
    execution: ExecutionStrategy,
    /// Events of the last `update`/`check_event`, reused across frames.
    events: Vec<ChangeEvent>,
    on_state_changed: Option<StateChangedCallback>,
}

impl CullingGroup {
    /// An uninitialized group. Call [`setup`](Self::setup) before use.
    pub fn new() -> Self {
        Self {
            state: GroupState::Uninitialized,
            registry: BoundingVolumeRegistry::default(),
            camera: None,
            view_projection: Mat4::IDENTITY,
            frustum: Frustum::from_view_projection(&Mat4::IDENTITY, ClipDepth::ZeroToOne),
            thresholds: LodThresholds::single(),
            execution: ExecutionStrategy::Sequential,
            events: Vec::new(),
            on_state_changed: None,
        }
    }

    /// A configured group with room for `capacity` volumes.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut group = Self::new();
        group.setup(capacity);
        group
    }

    /// Allocate storage for `capacity` volumes. Drops any registered volumes.
    pub fn setup(&mut self, capacity: usize) {
        self.registry.setup(capacity);
        self.events = Vec::with_capacity(capacity.min(1024));
        self.state = GroupState::Configured;
        debug!(capacity, "culling group configured");
    }

    pub fn state(&self) -> GroupState {
        self.state
    }

    pub fn registry(&self) -> &BoundingVolumeRegistry {
        &self.registry
    }

    pub fn capacity(&self) -> usize {
        self.registry.capacity()
    }

    pub fn count(&self) -> usize {
        self.registry.count()
    }

    /// See [`BoundingVolumeRegistry::set_count`].
    pub fn set_count(&mut self, count: usize) -> Result<(), CullingError> {
        self.registry.set_count(count)
    }

    /// See [`BoundingVolumeRegistry::init_internal_buffers`].
    pub fn init_internal_buffers(&mut self, count: usize) -> Result<(), CullingError> {
        self.registry.init_internal_buffers(count)
    }

    /// Drop every registered volume and any unconsumed events.
    pub fn clear(&mut self) {
        self.registry.clear();
        self.events.clear();
    }

    /// Register a volume and return its slot.
    pub fn add(&mut self, bounds: Aabb) -> Result<usize, CullingError> {
        self.registry.add(bounds)
    }

    /// Swap-remove a slot. The returned relocation must be forwarded to the
    /// owner of the moved volume.
    pub fn remove_at(&mut self, slot: usize) -> Result<Option<Relocation>, CullingError> {
        self.registry.remove_at(slot)
    }

    pub fn bounds(&self, slot: usize) -> Option<&Aabb> {
        self.registry.bounds(slot)
    }

    /// Replace the bounds of a slot. Takes effect on the next `update`.
    pub fn set_bounds(&mut self, slot: usize, bounds: Aabb) -> Result<(), CullingError> {
        self.registry.set_bounds(slot, bounds)
    }

    /// Bulk access to the live bounds, for callers that rewrite many at once.
    pub fn live_bounds_mut(&mut self) -> &mut [Aabb] {
        self.registry.live_bounds_mut()
    }

    /// Set or clear the camera. Matrices are recomputed immediately when a
    /// camera is given. With no camera, `update` keeps culling against the
    /// last matrices it had.
    pub fn set_reference_camera(&mut self, camera: Option<ReferenceCamera>) {
        self.camera = camera;
        self.refresh_view_projection();
    }

    pub fn reference_camera(&self) -> Option<&ReferenceCamera> {
        self.camera.as_ref()
    }

    /// Mutable access for moving the camera between frames.
    pub fn reference_camera_mut(&mut self) -> Option<&mut ReferenceCamera> {
        self.camera.as_mut()
    }

    pub fn view_projection(&self) -> &Mat4 {
        &self.view_projection
    }

    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    /// Replace the LOD thresholds; `None` means a single bucket.
    ///
    /// # Errors
    ///
    /// [`CullingError::InvalidThresholds`] if the list is not non-increasing
    /// or too long. The previous thresholds stay in effect.
    pub fn set_lod_thresholds(&mut self, thresholds: Option<&[f32]>) -> Result<(), CullingError> {
        let parsed = match thresholds {
            Some(list) => LodThresholds::new(list),
            None => Ok(LodThresholds::single()),
        };
        match parsed {
            Ok(thresholds) => {
                debug!(buckets = thresholds.bucket_count(), "LOD thresholds updated");
                self.thresholds = thresholds;
                Ok(())
            }
            Err(err) => {
                warn!(%err, "LOD thresholds rejected, keeping previous configuration");
                Err(err)
            }
        }
    }

    pub fn lod_thresholds(&self) -> &LodThresholds {
        &self.thresholds
    }

    pub fn set_execution(&mut self, execution: ExecutionStrategy) {
        self.execution = execution;
    }

    pub fn execution(&self) -> &ExecutionStrategy {
        &self.execution
    }

    pub fn set_state_changed_callback(&mut self, callback: impl FnMut(&ChangeEvent) + Send + 'static) {
        self.on_state_changed = Some(Box::new(callback));
    }

    pub fn clear_state_changed_callback(&mut self) {
        self.on_state_changed = None;
    }

    /// Latest result of a live slot, `None` for slots outside `[0, count)`.
    pub fn get_state(&self, slot: usize) -> Option<FrameState> {
        self.registry.current_state(slot)
    }

    /// Frames computed since setup or the last buffer reset.
    pub fn frame_count(&self) -> u64 {
        self.registry.buffers().frame()
    }

    /// Events produced by the last `update` or `check_event`.
    pub fn last_events(&self) -> &[ChangeEvent] {
        &self.events
    }

    /// Run one frame: refresh the camera matrices, cull every live slot into
    /// the spare buffer, diff it against the current one, flip the buffers and
    /// invoke the callback for each change. Returns the events.
    pub fn update(&mut self) -> &[ChangeEvent] {
        self.events.clear();
        if self.state == GroupState::Uninitialized {
            warn!("update called on an uninitialized culling group");
            return &self.events;
        }
        self.refresh_view_projection();

        let (bounds, buffers) = self.registry.pass_parts();
        let count = bounds.len();
        {
            let (current, next) = buffers.split_for_pass();
            let next = &mut next[..count];
            self.execution
                .cull(bounds, &self.view_projection, &self.frustum, next);
            // The pass above has fully completed before any slot is diffed.
            self.execution
                .diff(&current[..count], next, &self.thresholds, &mut self.events);
        }
        buffers.flip();
        self.state = GroupState::Running;

        trace!(
            frame = self.registry.buffers().frame(),
            count,
            events = self.events.len(),
            "culling pass complete"
        );
        self.dispatch();
        &self.events
    }

    /// Diff the two most recent frames again without culling, emit the
    /// changes, then mark them as seen so an immediate second call is silent.
    pub fn check_event(&mut self) -> &[ChangeEvent] {
        self.events.clear();
        if self.state == GroupState::Uninitialized {
            return &self.events;
        }
        let count = self.registry.count();
        {
            let buffers = self.registry.buffers();
            self.execution.diff(
                &buffers.previous()[..count],
                &buffers.current()[..count],
                &self.thresholds,
                &mut self.events,
            );
        }
        let buffers = self.registry.buffers_mut();
        for event in &self.events {
            buffers.acknowledge(event.slot);
        }
        self.dispatch();
        &self.events
    }

    fn refresh_view_projection(&mut self) {
        if let Some(camera) = &self.camera {
            self.view_projection = camera.view_projection();
            self.frustum = Frustum::from_view_projection(&self.view_projection, camera.clip_depth);
        }
    }

    fn dispatch(&mut self) {
        if let Some(callback) = self.on_state_changed.as_mut() {
            for event in &self.events {
                callback(event);
            }
        }
    }
}

impl Default for CullingGroup {
    fn default() -> Self {
        Self::new()
    }
}
