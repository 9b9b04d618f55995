//! Handle-based registration layer on top of [`CullingGroup`].
//!
//! Scene code registers a local-space box plus a local-to-world matrix and
//! gets back a [`VolumeHandle`]. The keeper keeps world bounds in the registry
//! up to date, follows slots through swap-removals, and turns slot events into
//! per-handle [`VolumeEvent`]s.

use glam::Mat4;
use slotmap::{SlotMap, new_key_type};
use tracing::{trace, warn};

use crate::bounds::Aabb;
use crate::error::CullingError;
use crate::group::{CullingGroup, ReferenceCamera};
use crate::pass::ExecutionStrategy;
use crate::state::{ChangeEvent, FrameState};

new_key_type! {
    /// Stable handle to a registered volume. Stays unique after unregistering,
    /// so a stale handle never aliases a newer volume.
    pub struct VolumeHandle;
}

/// What happened to a volume this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VolumeEventKind {
    BecameVisible,
    BecameInvisible,
    /// New LOD bucket. Only reported while visible; a volume becoming visible
    /// at a different LOD than last reported gets one right after.
    LodChanged(u8),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VolumeEvent {
    pub handle: VolumeHandle,
    pub kind: VolumeEventKind,
}

#[derive(Clone, Debug)]
struct Volume {
    local_bounds: Aabb,
    local_to_world: Mat4,
    slot: usize,
    /// World bounds need re-uploading before the next pass.
    dirty: bool,
    /// LOD the owner was last told about, or the seed LOD before any event.
    reported_lod: u8,
}

impl Volume {
    fn world_bounds(&self) -> Aabb {
        self.local_bounds.transformed(&self.local_to_world)
    }
}

/// Owns a [`CullingGroup`] and maps its slots to [`VolumeHandle`]s.
pub struct VolumeKeeper {
    group: CullingGroup,
    volumes: SlotMap<VolumeHandle, Volume>,
    /// `owners[slot]` is the volume living in `slot`. Same length as the
    /// group's live count.
    owners: Vec<VolumeHandle>,
    events: Vec<VolumeEvent>,
    /// LOD corrections queued by a threshold change, delivered on the next
    /// `update` or `check_event`.
    pending: Vec<VolumeEvent>,
}

impl VolumeKeeper {
    /// A keeper over a new group with room for `capacity` volumes.
    pub fn new(capacity: usize) -> Self {
        Self::with_group(CullingGroup::with_capacity(capacity))
    }

    /// Take over a configured group. Any slots it already has are dropped.
    pub fn with_group(mut group: CullingGroup) -> Self {
        if group.count() > 0 {
            warn!(count = group.count(), "dropping unowned slots from culling group");
        }
        group.clear();
        let capacity = group.capacity();
        Self {
            group,
            volumes: SlotMap::with_capacity_and_key(capacity),
            owners: Vec::with_capacity(capacity),
            events: Vec::new(),
            pending: Vec::new(),
        }
    }

    pub fn group(&self) -> &CullingGroup {
        &self.group
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.group.capacity()
    }

    pub fn set_reference_camera(&mut self, camera: Option<ReferenceCamera>) {
        self.group.set_reference_camera(camera);
    }

    pub fn reference_camera_mut(&mut self) -> Option<&mut ReferenceCamera> {
        self.group.reference_camera_mut()
    }

    /// Replace the LOD thresholds. Visible volumes whose bucket moves under
    /// the new table get a `LodChanged` on the next `update`.
    pub fn set_lod_thresholds(&mut self, thresholds: Option<&[f32]>) -> Result<(), CullingError> {
        self.group.set_lod_thresholds(thresholds)?;
        let table = self.group.lod_thresholds();
        for (handle, volume) in &mut self.volumes {
            let Some(state) = self.group.get_state(volume.slot) else {
                continue;
            };
            let lod = table.bucket(state.viewport_height);
            if state.visible && lod != volume.reported_lod {
                volume.reported_lod = lod;
                self.pending.push(VolumeEvent {
                    handle,
                    kind: VolumeEventKind::LodChanged(lod),
                });
            }
        }
        trace!(queued = self.pending.len(), "LOD thresholds replaced");
        Ok(())
    }

    pub fn set_execution(&mut self, execution: ExecutionStrategy) {
        self.group.set_execution(execution);
    }

    /// Register a volume placed at the origin.
    pub fn register(&mut self, local_bounds: Aabb) -> Result<VolumeHandle, CullingError> {
        self.register_with_transform(local_bounds, Mat4::IDENTITY)
    }

    /// Register a volume with its current local-to-world matrix.
    pub fn register_with_transform(
        &mut self,
        local_bounds: Aabb,
        local_to_world: Mat4,
    ) -> Result<VolumeHandle, CullingError> {
        let mut volume = Volume {
            local_bounds,
            local_to_world,
            slot: 0,
            dirty: false,
            reported_lod: self.seed_lod(),
        };
        volume.slot = self.group.add(volume.world_bounds())?;
        let handle = self.volumes.insert(volume);
        self.owners.push(handle);
        Ok(handle)
    }

    /// Remove a volume. The volume that fills its slot is re-pointed at once.
    pub fn unregister(&mut self, handle: VolumeHandle) -> Result<(), CullingError> {
        let slot = self.volumes.get(handle).ok_or(CullingError::InvalidHandle)?.slot;
        let relocation = self.group.remove_at(slot)?;
        self.volumes.remove(handle);
        self.owners.swap_remove(slot);
        self.pending.retain(|event| event.handle != handle);
        if let Some(relocation) = relocation {
            let moved = self.owners[relocation.to];
            if let Some(volume) = self.volumes.get_mut(moved) {
                volume.slot = relocation.to;
            }
            trace!(from = relocation.from, to = relocation.to, "volume relocated");
        }
        Ok(())
    }

    /// Replace the local bounds. Only a bitwise change marks the volume dirty.
    pub fn set_local_bounds(&mut self, handle: VolumeHandle, bounds: Aabb) -> Result<(), CullingError> {
        let volume = self.volume_mut(handle)?;
        if !volume.local_bounds.bitwise_eq(&bounds) {
            volume.local_bounds = bounds;
            volume.dirty = true;
        }
        Ok(())
    }

    /// Replace the local-to-world matrix. Marks the volume dirty if it changed.
    pub fn set_local_to_world(&mut self, handle: VolumeHandle, local_to_world: Mat4) -> Result<(), CullingError> {
        let volume = self.volume_mut(handle)?;
        if volume.local_to_world != local_to_world {
            volume.local_to_world = local_to_world;
            volume.dirty = true;
        }
        Ok(())
    }

    /// Force the world bounds to be re-uploaded before the next pass.
    pub fn mark_dirty(&mut self, handle: VolumeHandle) -> Result<(), CullingError> {
        self.volume_mut(handle)?.dirty = true;
        Ok(())
    }

    pub fn is_valid(&self, handle: VolumeHandle) -> bool {
        self.volumes.contains_key(handle)
    }

    /// Current slot, `None` once unregistered.
    pub fn slot(&self, handle: VolumeHandle) -> Option<usize> {
        self.volumes.get(handle).map(|v| v.slot)
    }

    /// Volume living in `slot`.
    pub fn handle_at(&self, slot: usize) -> Option<VolumeHandle> {
        self.owners.get(slot).copied()
    }

    pub fn local_bounds(&self, handle: VolumeHandle) -> Option<Aabb> {
        self.volumes.get(handle).map(|v| v.local_bounds)
    }

    pub fn local_to_world(&self, handle: VolumeHandle) -> Option<Mat4> {
        self.volumes.get(handle).map(|v| v.local_to_world)
    }

    /// Local bounds under the current local-to-world matrix.
    pub fn world_bounds(&self, handle: VolumeHandle) -> Option<Aabb> {
        self.volumes.get(handle).map(Volume::world_bounds)
    }

    /// LOD the owner of `handle` should currently be drawing at, as carried by
    /// the events delivered so far.
    pub fn reported_lod(&self, handle: VolumeHandle) -> Option<u8> {
        self.volumes.get(handle).map(|v| v.reported_lod)
    }

    /// LOD a freshly registered volume is assumed to have.
    pub fn seed_lod(&self) -> u8 {
        self.group.lod_thresholds().bucket(FrameState::SEED.viewport_height)
    }

    /// Latest culling result, for inspection outside the event stream.
    pub fn get_state(&self, handle: VolumeHandle) -> Option<FrameState> {
        let slot = self.slot(handle)?;
        self.group.get_state(slot)
    }

    /// Upload dirty world bounds, run one culling frame and return the
    /// resulting per-volume events.
    pub fn update(&mut self) -> &[VolumeEvent] {
        self.sync_dirty();
        self.group.update();
        self.relay();
        &self.events
    }

    /// Re-emit pending changes without culling. See
    /// [`CullingGroup::check_event`].
    pub fn check_event(&mut self) -> &[VolumeEvent] {
        self.group.check_event();
        self.relay();
        &self.events
    }

    fn relay(&mut self) {
        self.events.clear();
        self.events.append(&mut self.pending);
        translate(self.group.last_events(), &self.owners, &mut self.volumes, &mut self.events);
    }

    fn sync_dirty(&mut self) {
        for volume in self.volumes.values_mut().filter(|v| v.dirty) {
            volume.dirty = false;
            if let Err(err) = self.group.set_bounds(volume.slot, volume.world_bounds()) {
                warn!(%err, "volume slot out of sync with culling group");
            }
        }
    }

    fn volume_mut(&mut self, handle: VolumeHandle) -> Result<&mut Volume, CullingError> {
        self.volumes.get_mut(handle).ok_or(CullingError::InvalidHandle)
    }
}

/// Turn slot events into handle events. A visible volume gets `LodChanged`
/// when its bucket moved this frame or differs from the last one reported.
fn translate(
    changes: &[ChangeEvent],
    owners: &[VolumeHandle],
    volumes: &mut SlotMap<VolumeHandle, Volume>,
    out: &mut Vec<VolumeEvent>,
) {
    for change in changes {
        let Some(&handle) = owners.get(change.slot) else {
            continue;
        };
        let Some(volume) = volumes.get_mut(handle) else {
            continue;
        };
        if change.became_visible() {
            out.push(VolumeEvent {
                handle,
                kind: VolumeEventKind::BecameVisible,
            });
        } else if change.became_invisible() {
            out.push(VolumeEvent {
                handle,
                kind: VolumeEventKind::BecameInvisible,
            });
        }
        let lod = change.current_lod();
        if change.is_visible() && (change.lod_changed() || lod != volume.reported_lod) {
            volume.reported_lod = lod;
            out.push(VolumeEvent {
                handle,
                kind: VolumeEventKind::LodChanged(lod),
            });
        }
    }
}
