//! Ping-pong storage for per-slot frame results.
//!
//! Two arrays of [`FrameState`] are allocated once at capacity. A frame counter
//! decides which one is "current"; advancing a frame re-interprets the other
//! array as current instead of copying anything.

use crate::state::FrameState;

/// Double-buffered per-slot culling results.
#[derive(Clone, Debug, Default)]
pub struct FrameBuffers {
    buffers: [Vec<FrameState>; 2],
    /// Number of flips since the last reset. Its parity selects `current`.
    frame: u64,
}

impl FrameBuffers {
    /// Allocate both buffers at `capacity`, all slots seeded.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffers: [
                vec![FrameState::SEED; capacity],
                vec![FrameState::SEED; capacity],
            ],
            frame: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffers[0].len()
    }

    /// Flips since the last reset.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    fn current_index(&self) -> usize {
        (self.frame & 1) as usize
    }

    /// Results of the most recently computed frame.
    pub fn current(&self) -> &[FrameState] {
        &self.buffers[self.current_index()]
    }

    /// Results of the frame before that.
    pub fn previous(&self) -> &[FrameState] {
        &self.buffers[1 - self.current_index()]
    }

    /// Borrow the current buffer for reading and the other one as the write
    /// target of the next pass. Call [`flip`](Self::flip) once it is filled.
    pub fn split_for_pass(&mut self) -> (&[FrameState], &mut [FrameState]) {
        let [a, b] = &mut self.buffers;
        if self.frame & 1 == 0 {
            (a.as_slice(), b.as_mut_slice())
        } else {
            (b.as_slice(), a.as_mut_slice())
        }
    }

    /// Make the buffer written by the last pass current.
    pub fn flip(&mut self) {
        self.frame = self.frame.wrapping_add(1);
    }

    /// Seed one slot in both buffers, so it reports no change until a real
    /// result differs from the seed.
    pub fn seed(&mut self, slot: usize) {
        for buffer in &mut self.buffers {
            buffer[slot] = FrameState::SEED;
        }
    }

    /// Reset every slot of both buffers to the seed and the frame counter to 0.
    pub fn reset(&mut self) {
        for buffer in &mut self.buffers {
            buffer.fill(FrameState::SEED);
        }
        self.frame = 0;
    }

    /// Move the entries at `from` into `to` in both buffers.
    pub fn move_slot(&mut self, from: usize, to: usize) {
        for buffer in &mut self.buffers {
            buffer[to] = buffer[from];
        }
    }

    /// Make the previous result of `slot` equal to its current one.
    pub fn acknowledge(&mut self, slot: usize) {
        let cur = self.current_index();
        let value = self.buffers[cur][slot];
        self.buffers[1 - cur][slot] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visible(h: f32) -> FrameState {
        FrameState {
            viewport_height: h,
            visible: true,
        }
    }

    #[test]
    fn test_new_buffers_are_seeded() {
        let buffers = FrameBuffers::with_capacity(3);
        assert_eq!(buffers.capacity(), 3);
        assert!(buffers.current().iter().all(|s| *s == FrameState::SEED));
        assert!(buffers.previous().iter().all(|s| *s == FrameState::SEED));
    }

    /// Writing the next buffer and flipping turns it into `current` and the
    /// old current into `previous`, without copying.
    #[test]
    fn test_flip_reinterprets_buffers() {
        let mut buffers = FrameBuffers::with_capacity(2);
        {
            let (current, next) = buffers.split_for_pass();
            assert_eq!(current[0], FrameState::SEED);
            next[0] = visible(0.3);
            next[1] = FrameState::HIDDEN;
        }
        buffers.flip();
        assert_eq!(buffers.frame(), 1);
        assert_eq!(buffers.current()[0], visible(0.3));
        assert_eq!(buffers.current()[1], FrameState::HIDDEN);
        assert_eq!(buffers.previous()[0], FrameState::SEED);

        {
            let (current, next) = buffers.split_for_pass();
            assert_eq!(current[0], visible(0.3));
            next[0] = visible(0.1);
        }
        buffers.flip();
        assert_eq!(buffers.current()[0], visible(0.1));
        assert_eq!(buffers.previous()[0], visible(0.3));
    }

    #[test]
    fn test_move_slot_moves_both_buffers() {
        let mut buffers = FrameBuffers::with_capacity(3);
        buffers.split_for_pass().1[2] = visible(0.7);
        buffers.flip();
        buffers.split_for_pass().1[2] = FrameState::HIDDEN;
        buffers.flip();

        buffers.move_slot(2, 0);
        assert_eq!(buffers.current()[0], FrameState::HIDDEN);
        assert_eq!(buffers.previous()[0], visible(0.7));
    }

    #[test]
    fn test_reset_restores_seed_and_parity() {
        let mut buffers = FrameBuffers::with_capacity(2);
        buffers.split_for_pass().1[1] = FrameState::HIDDEN;
        buffers.flip();
        buffers.reset();
        assert_eq!(buffers.frame(), 0);
        assert!(buffers.current().iter().all(|s| *s == FrameState::SEED));
        assert!(buffers.previous().iter().all(|s| *s == FrameState::SEED));
    }

    #[test]
    fn test_acknowledge_copies_current_into_previous() {
        let mut buffers = FrameBuffers::with_capacity(1);
        buffers.split_for_pass().1[0] = FrameState::HIDDEN;
        buffers.flip();
        assert_ne!(buffers.previous()[0], buffers.current()[0]);
        buffers.acknowledge(0);
        assert_eq!(buffers.previous()[0], FrameState::HIDDEN);
    }
}
