//! Frame buffer ring shared with display consumers.
//!
//! The emulation side writes into exactly one working buffer. At the end
//! of a frame the ring advances and the finished buffer becomes the newest
//! stable one. The hand-over is a single index update under the lock, so
//! readers never see a buffer that is still being written.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::buffers::HPIXELS;
use crate::error::ConfigError;

/// Output pixels per line: two per hires pixel (one per SHRES pixel).
pub const FB_WIDTH: usize = 2 * HPIXELS;
/// Lines per buffer (long PAL frame).
pub const FB_HEIGHT: usize = 313;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    /// ARGB32 pixels, `FB_WIDTH` per row.
    pub pixels: Vec<u32>,
    /// Frame number the buffer was completed in.
    pub nr: i64,
    /// Long frame flag of that frame.
    pub lof: bool,
    /// Long frame flag of the frame before.
    pub prev_lof: bool,
}

impl FrameBuffer {
    fn new() -> Self {
        Self {
            pixels: vec![0xFF00_0000; FB_WIDTH * FB_HEIGHT],
            nr: 0,
            lof: false,
            prev_lof: false,
        }
    }

    #[must_use]
    pub fn row(&self, vpos: usize) -> Option<&[u32]> {
        self.pixels.get(vpos * FB_WIDTH..(vpos + 1) * FB_WIDTH)
    }

    /// Whether the buffer holds one field of an interlaced picture.
    #[must_use]
    pub fn is_interlaced(&self) -> bool {
        self.lof != self.prev_lof
    }
}

#[derive(Debug)]
struct RingState {
    buffers: Vec<FrameBuffer>,
    active: usize,
}

#[derive(Debug)]
pub struct FrameBufferRing {
    state: Mutex<RingState>,
}

impl FrameBufferRing {
    /// # Errors
    ///
    /// [`ConfigError::TooFewFrameBuffers`] for fewer than two buffers.
    pub fn new(count: usize) -> Result<Self, ConfigError> {
        if count < 2 {
            return Err(ConfigError::TooFewFrameBuffers(count));
        }
        Ok(Self {
            state: Mutex::new(RingState {
                buffers: (0..count).map(|_| FrameBuffer::new()).collect(),
                active: 0,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, RingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().buffers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().buffers.is_empty()
    }

    /// Index of the buffer currently being written.
    #[must_use]
    pub fn active_index(&self) -> usize {
        self.lock().active
    }

    /// Copy one finished scanline into the working buffer.
    pub fn write_line(&self, vpos: usize, row: &[u32]) {
        let mut state = self.lock();
        let active = state.active;
        let start = vpos * FB_WIDTH;
        let len = row.len().min(FB_WIDTH);
        match state.buffers[active].pixels.get_mut(start..start + len) {
            Some(dst) => dst.copy_from_slice(&row[..len]),
            None => log::warn!("scanline {vpos} is outside the frame buffer"),
        }
    }

    /// Finish the working buffer and advance the ring.
    pub fn swap(&self, frame: i64, lof: bool) {
        let mut state = self.lock();
        let count = state.buffers.len();
        let active = state.active;
        let prev_lof = state.buffers[(active + count - 1) % count].lof;

        let done = &mut state.buffers[active];
        done.nr = frame;
        done.lof = lof;
        done.prev_lof = prev_lof;

        state.active = (active + 1) % count;
        log::debug!("frame {frame} complete, writing into buffer {}", state.active);
    }

    /// Run `f` on a stable buffer. Offset 0 is the most recently finished
    /// frame, 1 the one before, and so on. A ring of `n` buffers keeps
    /// `n - 1` stable frames; larger offsets would reach the working buffer
    /// and yield `None`.
    pub fn with_stable<R>(&self, offset: usize, f: impl FnOnce(&FrameBuffer) -> R) -> Option<R> {
        let state = self.lock();
        let count = state.buffers.len();
        if offset + 1 >= count {
            return None;
        }
        let nr = (state.active + count - 1 - offset) % count;
        Some(f(&state.buffers[nr]))
    }

    /// Snapshot of a stable buffer, or `None` past the oldest one.
    #[must_use]
    pub fn stable(&self, offset: usize) -> Option<FrameBuffer> {
        self.with_stable(offset, FrameBuffer::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn needs_two_buffers() {
        assert_eq!(
            FrameBufferRing::new(1).err(),
            Some(ConfigError::TooFewFrameBuffers(1))
        );
    }

    #[test]
    fn finished_buffer_becomes_stable() {
        let ring = FrameBufferRing::new(2).unwrap();
        ring.write_line(10, &[0xFF12_3456; FB_WIDTH]);
        ring.swap(7, true);

        assert_eq!(ring.active_index(), 1);
        let stable = ring.stable(0).unwrap();
        assert_eq!(stable.nr, 7);
        assert!(stable.lof);
        assert_eq!(stable.row(10).unwrap()[5], 0xFF12_3456);
    }

    #[test]
    fn stable_offsets_walk_back_in_time() {
        let ring = FrameBufferRing::new(3).unwrap();
        ring.swap(1, false);
        ring.swap(2, true);
        assert_eq!(ring.with_stable(0, |fb| fb.nr), Some(2));
        assert_eq!(ring.with_stable(1, |fb| fb.nr), Some(1));
        assert_eq!(ring.with_stable(0, FrameBuffer::is_interlaced), Some(true));
        assert_eq!(ring.with_stable(2, |fb| fb.nr), None);
    }

    #[test]
    fn out_of_range_lines_are_dropped() {
        let ring = FrameBufferRing::new(2).unwrap();
        ring.write_line(FB_HEIGHT, &[1; FB_WIDTH]);
        ring.swap(0, false);
        assert!(ring.stable(0).unwrap().pixels.iter().all(|&p| p == 0xFF00_0000));
    }

    #[test]
    fn working_buffer_is_never_exposed() {
        for count in [2, 3, 4] {
            let ring = FrameBufferRing::new(count).unwrap();
            for frame in 0..count as i64 {
                ring.swap(frame, false);
            }
            ring.write_line(0, &[0xFFAB_CDEF; FB_WIDTH]);

            for offset in 0..count + 2 {
                let leaked = ring.with_stable(offset, |fb| fb.row(0).unwrap()[0] == 0xFFAB_CDEF);
                assert_ne!(leaked, Some(true), "ring of {count}, offset {offset}");
            }
            assert!(ring.stable(count - 2).is_some());
            assert!(ring.stable(count - 1).is_none());

            // Once finished, the buffer is the newest stable one
            ring.swap(count as i64, false);
            assert_eq!(ring.with_stable(0, |fb| fb.row(0).unwrap()[0]), Some(0xFFAB_CDEF));
        }
    }
}
