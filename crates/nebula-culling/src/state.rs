//! Per-slot culling results and the packed state change events built from them.

use crate::lod::LodThresholds;

/// Culling result for one slot in one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameState {
    /// Fraction of the viewport height covered by the projected box, in `[0, 1]`
    /// for boxes inside the frustum.
    pub viewport_height: f32,
    /// Whether the box intersects the view frustum.
    pub visible: bool,
}

impl FrameState {
    /// Seed value for freshly registered or reset slots: fully visible,
    /// covering the whole viewport.
    pub const SEED: Self = Self {
        viewport_height: 1.0,
        visible: true,
    };

    /// Not visible, zero height.
    pub const HIDDEN: Self = Self {
        viewport_height: 0.0,
        visible: false,
    };

    /// Bitwise equality, used to check sequential and parallel passes agree.
    pub fn bitwise_eq(&self, other: &FrameState) -> bool {
        self.visible == other.visible
            && self.viewport_height.to_bits() == other.viewport_height.to_bits()
    }
}

/// Visibility bit and LOD bucket packed into one byte:
/// `(visible << 7) | (lod & 0x7F)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PackedState(pub u8);

impl PackedState {
    pub const VISIBLE_MASK: u8 = 0b1000_0000;
    pub const LOD_MASK: u8 = 0b0111_1111;

    pub fn new(visible: bool, lod: u8) -> Self {
        let vis = if visible { Self::VISIBLE_MASK } else { 0 };
        Self(vis | (lod & Self::LOD_MASK))
    }

    /// Pack a frame result using the given thresholds.
    pub fn from_frame(state: &FrameState, thresholds: &LodThresholds) -> Self {
        Self::new(state.visible, thresholds.bucket(state.viewport_height))
    }

    pub fn is_visible(self) -> bool {
        self.0 & Self::VISIBLE_MASK != 0
    }

    /// LOD bucket bits. Meaningless when not visible.
    pub fn lod(self) -> u8 {
        self.0 & Self::LOD_MASK
    }
}

/// Emitted once per slot whose packed state changed between the two most
/// recently computed frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    pub slot: usize,
    pub previous: PackedState,
    pub current: PackedState,
}

impl ChangeEvent {
    pub fn is_visible(&self) -> bool {
        self.current.is_visible()
    }

    pub fn was_visible(&self) -> bool {
        self.previous.is_visible()
    }

    pub fn became_visible(&self) -> bool {
        self.is_visible() && !self.was_visible()
    }

    pub fn became_invisible(&self) -> bool {
        !self.is_visible() && self.was_visible()
    }

    /// Check visibility before trusting this.
    pub fn previous_lod(&self) -> u8 {
        self.previous.lod()
    }

    /// Check visibility before trusting this.
    pub fn current_lod(&self) -> u8 {
        self.current.lod()
    }

    pub fn lod_changed(&self) -> bool {
        self.previous_lod() != self.current_lod()
    }
}
