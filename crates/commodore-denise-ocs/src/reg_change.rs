//! Pixel-tagged register change queues.
//!
//! Register writes that affect how a line is composed do not take effect
//! immediately. They are recorded with the pixel position they become
//! visible at, and the end-of-line passes replay them in pixel order
//! while walking the line buffers.

use crate::error::DeniseError;

/// Maximum number of changes one queue accepts per line.
pub const QUEUE_CAPACITY: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegisterChangeKind {
    /// Terminal marker; carries no register.
    #[default]
    None,
    Bplcon0,
    Bplcon2,
    /// Switch between normal, HAM and SHRES colorization.
    ColorMode,
    Color(u8),
    SprPos(u8),
    SprCtl(u8),
    SprData(u8),
    SprDatb(u8),
    DiwStrt,
    DiwStop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterChange {
    pub pixel: isize,
    pub kind: RegisterChangeKind,
    pub value: u16,
}

#[derive(Debug, Clone)]
pub struct RegisterChangeQueue {
    name: &'static str,
    changes: Vec<RegisterChange>,
}

impl RegisterChangeQueue {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            changes: Vec::with_capacity(QUEUE_CAPACITY + 1),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Record a change. Changes at equal pixels keep their insertion order.
    ///
    /// # Errors
    ///
    /// [`DeniseError::QueueOverflow`] when the line already holds
    /// [`QUEUE_CAPACITY`] changes.
    pub fn insert(
        &mut self,
        pixel: isize,
        kind: RegisterChangeKind,
        value: u16,
    ) -> Result<(), DeniseError> {
        if self.changes.len() >= QUEUE_CAPACITY {
            return Err(DeniseError::QueueOverflow {
                queue: self.name,
                capacity: QUEUE_CAPACITY,
            });
        }
        self.insert_sorted(RegisterChange { pixel, kind, value });
        Ok(())
    }

    /// Append the terminal marker a replay pass stops at. Not subject to
    /// the capacity limit.
    pub fn terminate(&mut self, pixel: isize) {
        self.insert_sorted(RegisterChange {
            pixel,
            kind: RegisterChangeKind::None,
            value: 0,
        });
    }

    fn insert_sorted(&mut self, change: RegisterChange) {
        let pos = self.changes.partition_point(|c| c.pixel <= change.pixel);
        self.changes.insert(pos, change);
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisterChange> {
        self.changes.iter()
    }

    pub fn clear(&mut self) {
        self.changes.clear();
    }

    /// Take the recorded changes out for replay, leaving the queue empty.
    pub fn drain(&mut self) -> std::vec::Drain<'_, RegisterChange> {
        self.changes.drain(..)
    }

    /// Check the end-of-line postcondition.
    ///
    /// # Errors
    ///
    /// [`DeniseError::UndrainedQueue`] if any change is still pending.
    pub fn expect_drained(&self) -> Result<(), DeniseError> {
        if self.changes.is_empty() {
            Ok(())
        } else {
            Err(DeniseError::UndrainedQueue {
                queue: self.name,
                pending: self.changes.len(),
            })
        }
    }

    pub(crate) fn unexpected(&self, kind: RegisterChangeKind) -> DeniseError {
        DeniseError::UnexpectedChange {
            queue: self.name,
            kind,
        }
    }
}
