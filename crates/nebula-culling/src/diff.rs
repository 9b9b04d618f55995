//! Frame-to-frame state diffing: pack each slot's visibility and LOD bucket
//! into a byte and report the slots whose byte changed.

use std::ops::Range;

use crate::lod::LodThresholds;
use crate::state::{ChangeEvent, FrameState, PackedState};
use crate::worker_pool::WorkerPool;

/// The change event for `slot`, if its packed state differs.
#[inline]
pub fn diff_slot(
    slot: usize,
    previous: &FrameState,
    current: &FrameState,
    thresholds: &LodThresholds,
) -> Option<ChangeEvent> {
    let prev = PackedState::from_frame(previous, thresholds);
    let curr = PackedState::from_frame(current, thresholds);
    (prev != curr).then_some(ChangeEvent {
        slot,
        previous: prev,
        current: curr,
    })
}

fn diff_range(
    range: Range<usize>,
    previous: &[FrameState],
    current: &[FrameState],
    thresholds: &LodThresholds,
    events: &mut Vec<ChangeEvent>,
) {
    for slot in range {
        if let Some(event) = diff_slot(slot, &previous[slot], &current[slot], thresholds) {
            events.push(event);
        }
    }
}

/// Reference implementation. Events come out in slot order.
pub fn diff_sequential(
    previous: &[FrameState],
    current: &[FrameState],
    thresholds: &LodThresholds,
    events: &mut Vec<ChangeEvent>,
) {
    debug_assert_eq!(previous.len(), current.len());
    diff_range(0..current.len(), previous, current, thresholds, events);
}

/// Chunked variant. Each chunk collects its own events; the lists are
/// appended in chunk order after the join, so the output matches
/// [`diff_sequential`] exactly.
pub fn diff_parallel(
    pool: &WorkerPool,
    previous: &[FrameState],
    current: &[FrameState],
    thresholds: &LodThresholds,
    events: &mut Vec<ChangeEvent>,
) {
    debug_assert_eq!(previous.len(), current.len());
    let per_chunk = pool.map_chunks(current.len(), |range| {
        let mut local = Vec::new();
        diff_range(range, previous, current, thresholds, &mut local);
        local
    });
    for chunk in per_chunk {
        events.extend(chunk);
    }
}
