//! Dense bounding-volume storage with stable slots and O(1) swap-remove.
//!
//! Slots `[0, count)` are always live. Removing a slot moves the last live
//! volume (and its frame results) into the hole, so whoever owns that volume
//! must be told its new slot via the returned [`Relocation`].

use tracing::debug;

use crate::bounds::Aabb;
use crate::error::CullingError;
use crate::frame_buffers::FrameBuffers;
use crate::state::FrameState;

/// Reports that the occupant of slot `from` now lives in slot `to`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Relocation {
    pub from: usize,
    pub to: usize,
}

/// Owns the packed AABB array and the per-slot frame results aligned with it.
///
/// Not internally synchronized: mutate only between frames, from the thread
/// that drives [`CullingGroup::update`](crate::CullingGroup::update).
#[derive(Clone, Debug, Default)]
pub struct BoundingVolumeRegistry {
    /// Sized to capacity, live in `[0, count)`.
    bounds: Vec<Aabb>,
    count: usize,
    buffers: FrameBuffers,
}

impl BoundingVolumeRegistry {
    /// A registry with fixed capacity and no live slots.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut registry = Self::default();
        registry.setup(capacity);
        registry
    }

    /// (Re)allocate backing storage for `capacity` slots. Drops all live
    /// volumes.
    pub fn setup(&mut self, capacity: usize) {
        self.bounds = vec![Aabb::ZERO; capacity];
        self.buffers = FrameBuffers::with_capacity(capacity);
        self.count = 0;
        debug!(capacity, "bounding volume registry allocated");
    }

    pub fn capacity(&self) -> usize {
        self.bounds.len()
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Overwrite the live count for bulk (re)population. Slot contents are
    /// left untouched.
    ///
    /// # Errors
    ///
    /// [`CullingError::OutOfCapacity`] if `count` exceeds the capacity.
    pub fn set_count(&mut self, count: usize) -> Result<(), CullingError> {
        if count > self.capacity() {
            return Err(CullingError::OutOfCapacity {
                capacity: self.capacity(),
            });
        }
        self.count = count;
        Ok(())
    }

    /// Set the live count to `count` and reseed every frame result.
    pub fn init_internal_buffers(&mut self, count: usize) -> Result<(), CullingError> {
        self.set_count(count)?;
        self.buffers.reset();
        debug!(count, "frame buffers reseeded");
        Ok(())
    }

    /// Drop every live volume and reseed the frame results. Capacity is kept.
    pub fn clear(&mut self) {
        self.count = 0;
        self.buffers.reset();
        debug!("culling registry cleared");
    }

    /// Append a volume and return its slot. Its frame results are seeded as
    /// fully visible so an object already in view does not report entering it.
    pub fn add(&mut self, bounds: Aabb) -> Result<usize, CullingError> {
        if self.count == self.capacity() {
            return Err(CullingError::OutOfCapacity {
                capacity: self.capacity(),
            });
        }
        let slot = self.count;
        self.bounds[slot] = bounds;
        self.buffers.seed(slot);
        self.count += 1;
        Ok(slot)
    }

    /// Remove the volume at `slot` by moving the last live volume into it.
    ///
    /// Returns the relocation of the moved volume, or `None` if `slot` was the
    /// last live slot and nothing moved.
    pub fn remove_at(&mut self, slot: usize) -> Result<Option<Relocation>, CullingError> {
        self.check_slot(slot)?;
        let last = self.count - 1;
        self.count = last;
        if slot == last {
            return Ok(None);
        }
        self.bounds[slot] = self.bounds[last];
        self.buffers.move_slot(last, slot);
        Ok(Some(Relocation {
            from: last,
            to: slot,
        }))
    }

    pub fn bounds(&self, slot: usize) -> Option<&Aabb> {
        self.live_bounds().get(slot)
    }

    /// Replace the bounds of a live slot. Picked up by the next pass.
    pub fn set_bounds(&mut self, slot: usize, bounds: Aabb) -> Result<(), CullingError> {
        self.check_slot(slot)?;
        self.bounds[slot] = bounds;
        Ok(())
    }

    /// Bounds of all live slots.
    pub fn live_bounds(&self) -> &[Aabb] {
        &self.bounds[..self.count]
    }

    /// Mutable bounds of all live slots, for bulk writes.
    pub fn live_bounds_mut(&mut self) -> &mut [Aabb] {
        &mut self.bounds[..self.count]
    }

    /// Latest frame result of a live slot.
    pub fn current_state(&self, slot: usize) -> Option<FrameState> {
        if slot < self.count {
            Some(self.buffers.current()[slot])
        } else {
            None
        }
    }

    pub(crate) fn buffers(&self) -> &FrameBuffers {
        &self.buffers
    }

    /// Split borrow used by a pass: live bounds plus the frame buffers.
    pub(crate) fn pass_parts(&mut self) -> (&[Aabb], &mut FrameBuffers) {
        (&self.bounds[..self.count], &mut self.buffers)
    }

    pub(crate) fn buffers_mut(&mut self) -> &mut FrameBuffers {
        &mut self.buffers
    }

    fn check_slot(&self, slot: usize) -> Result<(), CullingError> {
        if slot < self.count {
            Ok(())
        } else {
            Err(CullingError::InvalidSlot {
                slot,
                count: self.count,
            })
        }
    }
}
