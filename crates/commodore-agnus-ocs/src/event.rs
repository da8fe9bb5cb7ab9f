//! Event slots and event identifiers.
//!
//! The primary table has one slot per state machine that runs alongside the
//! others. When two slots are due in the same cycle, the one declared first
//! is serviced first. The last primary slot stands in for the whole secondary
//! table, which holds events that fire rarely (mostly interrupts).

use std::fmt;

/// Sentinel trigger cycle for "not scheduled".
pub const NEVER: i64 = i64::MAX;

/// Master cycles per CIA cycle. CIA events must land on this grid.
pub const CIA_CYCLE: i64 = 40;

/// Slots of the primary event table, in servicing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimarySlot {
    /// CIA A execution.
    CiaA,
    /// CIA B execution.
    CiaB,
    /// Disk, audio, sprite and bitplane DMA.
    Dma,
    /// Copper.
    Cop,
    /// Blitter.
    Blt,
    /// Raster line events.
    Ras,
    /// The secondary table.
    Sec,
}

impl PrimarySlot {
    pub const COUNT: usize = 7;

    pub const ALL: [Self; Self::COUNT] = [
        Self::CiaA,
        Self::CiaB,
        Self::Dma,
        Self::Cop,
        Self::Blt,
        Self::Ras,
        Self::Sec,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CiaA => "CIA A",
            Self::CiaB => "CIA B",
            Self::Dma => "DMA",
            Self::Cop => "Copper",
            Self::Blt => "Blitter",
            Self::Ras => "Raster",
            Self::Sec => "Secondary",
        }
    }

    /// Whether `id` may be scheduled in this slot.
    #[must_use]
    pub fn accepts(self, id: EventId) -> bool {
        use EventId as E;

        match self {
            Self::CiaA | Self::CiaB => matches!(id, E::CiaExecute | E::CiaWakeup),
            Self::Dma => id.dma_channel().is_some(),
            Self::Cop => matches!(
                id,
                E::CopRequestDma
                    | E::CopFetch
                    | E::CopMove
                    | E::CopWaitOrSkip
                    | E::CopWait
                    | E::CopSkip
                    | E::CopJmp1
                    | E::CopJmp2
            ),
            Self::Blt => matches!(id, E::BltInit | E::BltExecute),
            Self::Ras => id == E::RasHsync,
            Self::Sec => id == E::SecTrigger,
        }
    }

    #[must_use]
    pub const fn is_cia(self) -> bool {
        matches!(self, Self::CiaA | Self::CiaB)
    }
}

impl fmt::Display for PrimarySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Slots of the secondary event table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecondarySlot {
    /// End-of-line housekeeping.
    Hsync,
    /// Source 0: serial port transmit buffer empty.
    IrqTbe,
    /// Source 1: disk block finished.
    IrqDskblk,
    /// Source 2: software interrupt.
    IrqSoft,
    /// Source 3: I/O ports and CIA A.
    IrqPorts,
    /// Source 4: Copper.
    IrqCopr,
    /// Source 5: start of vertical blank.
    IrqVertb,
    /// Source 6: blitter finished.
    IrqBlit,
    /// Source 7: audio channel 0 block finished.
    IrqAud0,
    /// Source 8: audio channel 1 block finished.
    IrqAud1,
    /// Source 9: audio channel 2 block finished.
    IrqAud2,
    /// Source 10: audio channel 3 block finished.
    IrqAud3,
    /// Source 11: serial port receive buffer full.
    IrqRbf,
    /// Source 12: disk sync word matched.
    IrqDsksyn,
    /// Source 13: I/O ports and CIA B.
    IrqExter,
}

impl SecondarySlot {
    pub const COUNT: usize = 15;

    pub const ALL: [Self; Self::COUNT] = [
        Self::Hsync,
        Self::IrqTbe,
        Self::IrqDskblk,
        Self::IrqSoft,
        Self::IrqPorts,
        Self::IrqCopr,
        Self::IrqVertb,
        Self::IrqBlit,
        Self::IrqAud0,
        Self::IrqAud1,
        Self::IrqAud2,
        Self::IrqAud3,
        Self::IrqRbf,
        Self::IrqDsksyn,
        Self::IrqExter,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// INTREQ bit driven by this slot, if it is an interrupt slot.
    #[must_use]
    pub const fn irq_bit(self) -> Option<u8> {
        match self {
            Self::Hsync => None,
            other => Some(other as u8 - 1),
        }
    }

    /// The interrupt slot for INTREQ source `bit` (0..=13).
    #[must_use]
    pub fn for_irq_bit(bit: u8) -> Option<Self> {
        Self::ALL.get(usize::from(bit) + 1).copied()
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Hsync => "HSYNC",
            Self::IrqTbe => "Serial Out IRQ",
            Self::IrqDskblk => "Disk DMA IRQ",
            Self::IrqSoft => "Software IRQ",
            Self::IrqPorts => "CIA A IRQ",
            Self::IrqCopr => "Copper IRQ",
            Self::IrqVertb => "VBlank IRQ",
            Self::IrqBlit => "Blitter IRQ",
            Self::IrqAud0 => "Audio 0 IRQ",
            Self::IrqAud1 => "Audio 1 IRQ",
            Self::IrqAud2 => "Audio 2 IRQ",
            Self::IrqAud3 => "Audio 3 IRQ",
            Self::IrqRbf => "Serial In IRQ",
            Self::IrqDsksyn => "Disk Sync IRQ",
            Self::IrqExter => "CIA B IRQ",
        }
    }

    #[must_use]
    pub fn accepts(self, id: EventId) -> bool {
        match self {
            Self::Hsync => id == EventId::HsyncEol,
            _ => matches!(id, EventId::IrqSet | EventId::IrqClear),
        }
    }
}

impl fmt::Display for SecondarySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything that can sit in an event slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EventId {
    #[default]
    None,

    CiaExecute,
    CiaWakeup,

    DmaDisk,
    DmaA0,
    DmaA1,
    DmaA2,
    DmaA3,
    DmaS0,
    DmaS1,
    DmaS2,
    DmaS3,
    DmaS4,
    DmaS5,
    DmaS6,
    DmaS7,
    DmaL1,
    DmaL2,
    DmaL3,
    DmaL4,
    DmaL5,
    DmaL6,
    DmaH1,
    DmaH2,
    DmaH3,
    DmaH4,

    CopRequestDma,
    CopFetch,
    CopMove,
    CopWaitOrSkip,
    CopWait,
    CopSkip,
    CopJmp1,
    CopJmp2,

    BltInit,
    BltExecute,

    RasHsync,

    SecTrigger,

    IrqSet,
    IrqClear,

    HsyncEol,
}

/// DMA channel serviced by a DMA-slot event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmaChannel {
    Disk,
    Audio(u8),
    Sprite(u8),
    /// Lores bitplane fetch, plane 1..=6.
    Lores(u8),
    /// Hires bitplane fetch, plane 1..=4.
    Hires(u8),
}

impl EventId {
    /// Decode a DMA-slot event into the channel it services.
    #[must_use]
    pub const fn dma_channel(self) -> Option<DmaChannel> {
        use DmaChannel as C;

        Some(match self {
            Self::DmaDisk => C::Disk,
            Self::DmaA0 => C::Audio(0),
            Self::DmaA1 => C::Audio(1),
            Self::DmaA2 => C::Audio(2),
            Self::DmaA3 => C::Audio(3),
            Self::DmaS0 => C::Sprite(0),
            Self::DmaS1 => C::Sprite(1),
            Self::DmaS2 => C::Sprite(2),
            Self::DmaS3 => C::Sprite(3),
            Self::DmaS4 => C::Sprite(4),
            Self::DmaS5 => C::Sprite(5),
            Self::DmaS6 => C::Sprite(6),
            Self::DmaS7 => C::Sprite(7),
            Self::DmaL1 => C::Lores(1),
            Self::DmaL2 => C::Lores(2),
            Self::DmaL3 => C::Lores(3),
            Self::DmaL4 => C::Lores(4),
            Self::DmaL5 => C::Lores(5),
            Self::DmaL6 => C::Lores(6),
            Self::DmaH1 => C::Hires(1),
            Self::DmaH2 => C::Hires(2),
            Self::DmaH3 => C::Hires(3),
            Self::DmaH4 => C::Hires(4),
            _ => return None,
        })
    }

    #[must_use]
    pub fn name(self) -> String {
        match self {
            Self::None => "none".to_string(),
            other => {
                let debug = format!("{other:?}");
                // CamelCase -> SCREAMING_SNAKE_CASE
                let mut out = String::with_capacity(debug.len() + 4);
                for (i, c) in debug.chars().enumerate() {
                    if c.is_ascii_uppercase() && i > 0 {
                        out.push('_');
                    }
                    out.push(c.to_ascii_uppercase());
                }
                out
            }
        }
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// A beam position recorded when an event is scheduled by beam coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerBeam {
    pub vpos: u16,
    pub hpos: u16,
}

/// One entry of an event table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    /// Cycle at which the event is due, or [`NEVER`].
    pub trigger: i64,
    /// Set by the beam-position scheduling calls and verified at fire time.
    pub trigger_beam: Option<TriggerBeam>,
    pub id: EventId,
    /// Optional payload handed to the service routine.
    pub data: i64,
}

impl Event {
    pub const EMPTY: Self = Self {
        trigger: NEVER,
        trigger_beam: None,
        id: EventId::None,
        data: 0,
    };

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.trigger != NEVER
    }

    #[must_use]
    pub const fn is_due(&self, cycle: i64) -> bool {
        cycle >= self.trigger
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::EMPTY
    }
}
