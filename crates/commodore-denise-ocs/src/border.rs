//! Horizontal display window and border mask.
//!
//! Denise runs its own horizontal counter and compares it against the
//! DIWSTRT/DIWSTOP positions. A flip-flop set at the start and cleared at
//! the stop position decides whether a pixel belongs to the border.

use crate::buffers::NO_BORDER;
use crate::error::DeniseError;
use crate::reg_change::{RegisterChangeKind, RegisterChangeQueue};

/// Palette entry used for blanked (black) borders.
pub const BORDER_BLACK: u8 = 64;

#[derive(Debug, Clone)]
pub struct Border {
    hstrt: u16,
    hstop: u16,
    /// Flip-flop value at the start of the next line.
    hflop: bool,
    color: u8,
    changes: RegisterChangeQueue,
}

impl Default for Border {
    fn default() -> Self {
        Self::new()
    }
}

impl Border {
    #[must_use]
    pub fn new() -> Self {
        Self {
            hstrt: 0,
            hstop: 0x1FF,
            hflop: true,
            color: 0,
            changes: RegisterChangeQueue::new("diw"),
        }
    }

    #[must_use]
    pub fn hstrt(&self) -> u16 {
        self.hstrt
    }

    #[must_use]
    pub fn hstop(&self) -> u16 {
        self.hstop
    }

    #[must_use]
    pub fn color(&self) -> u8 {
        self.color
    }

    pub(crate) fn queue(&self) -> &RegisterChangeQueue {
        &self.changes
    }

    /// Border is COLOR00, or black when ECS BRDRBLNK is in effect.
    pub fn set_blank(&mut self, blank: bool) {
        self.color = if blank { BORDER_BLACK } else { 0 };
    }

    /// Record a new horizontal start position (in counter units).
    ///
    /// # Errors
    ///
    /// [`DeniseError::QueueOverflow`] if too many DIW writes hit one line.
    pub fn record_start(&mut self, pixel: isize, hstrt: u16) -> Result<(), DeniseError> {
        self.changes.insert(pixel, RegisterChangeKind::DiwStrt, hstrt)
    }

    /// Record a new horizontal stop position (in counter units).
    ///
    /// # Errors
    ///
    /// [`DeniseError::QueueOverflow`] if too many DIW writes hit one line.
    pub fn record_stop(&mut self, pixel: isize, hstop: u16) -> Result<(), DeniseError> {
        self.changes.insert(pixel, RegisterChangeKind::DiwStop, hstop)
    }

    pub fn begin_of_frame(&mut self) {
        self.hflop = true;
    }

    /// Build the border mask of the line and drain the DIW changes.
    ///
    /// # Errors
    ///
    /// [`DeniseError::UnexpectedChange`] for non-DIW entries in the queue.
    pub fn fill(&mut self, border: &mut [u8]) -> Result<(), DeniseError> {
        let replay: Vec<_> = self.changes.drain().collect();
        let mut pending = replay.iter().peekable();

        let mut hf = self.hflop;
        let mut counter: u16 = 0;

        for (i, slot) in border.iter_mut().enumerate() {
            while let Some(change) = pending.next_if(|c| c.pixel <= i as isize) {
                self.apply(change.kind, change.value)?;
            }

            if counter == self.hstrt {
                hf = true;
            }
            if counter == self.hstop {
                hf = false;
            }
            if i % 2 == 1 {
                counter = (counter + 1) & 0x1FF;
            }

            *slot = if hf { NO_BORDER } else { self.color };
        }

        // Writes that land beyond the line still update the registers.
        for change in pending {
            self.apply(change.kind, change.value)?;
        }

        self.hflop = hf;
        Ok(())
    }

    fn apply(&mut self, kind: RegisterChangeKind, value: u16) -> Result<(), DeniseError> {
        match kind {
            RegisterChangeKind::DiwStrt => self.hstrt = value,
            RegisterChangeKind::DiwStop => self.hstop = value,
            other => return Err(self.changes.unexpected(other)),
        }
        log::trace!("diw h {:#05x}..{:#05x}", self.hstrt, self.hstop);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffers::LINE_LEN;

    #[test]
    fn default_window_has_no_border() {
        let mut border = Border::new();
        let mut mask = vec![0u8; LINE_LEN];
        border.fill(&mut mask).unwrap();
        assert!(mask.iter().all(|&b| b == NO_BORDER));
    }

    #[test]
    fn window_opens_and_closes_at_counter_positions() {
        let mut border = Border::new();
        let mut mask = vec![0u8; LINE_LEN];
        border.record_start(0, 0x81).unwrap();
        border.record_stop(0, 0x1C1).unwrap();
        border.begin_of_frame();
        border.fill(&mut mask).unwrap();

        // The flip-flop is still set from the previous frame until hstop.
        assert_eq!(mask[0], NO_BORDER);
        assert_eq!(mask[2 * 0x1C1 - 1], NO_BORDER);
        assert_eq!(mask[2 * 0x1C1], 0);

        border.fill(&mut mask).unwrap();
        assert_eq!(mask[0], 0);
        assert_eq!(mask[2 * 0x81 - 1], 0);
        assert_eq!(mask[2 * 0x81], NO_BORDER);
        assert_eq!(mask[2 * 0x1C1], 0);
        assert!(border.queue().is_empty());
    }

    #[test]
    fn blanked_border_uses_black() {
        let mut border = Border::new();
        let mut mask = vec![0u8; LINE_LEN];
        border.set_blank(true);
        border.record_stop(0, 0x100).unwrap();
        border.fill(&mut mask).unwrap();
        assert_eq!(mask[2 * 0x100 + 4], BORDER_BLACK);
    }

    #[test]
    fn mid_line_change_applies_from_its_pixel() {
        let mut border = Border::new();
        let mut mask = vec![0u8; LINE_LEN];
        border.record_stop(0, 0x20).unwrap();
        border.record_stop(10, 0x1FF).unwrap();
        border.fill(&mut mask).unwrap();
        assert!(mask.iter().all(|&b| b == NO_BORDER));
        assert_eq!(border.hstop(), 0x1FF);
    }
}
