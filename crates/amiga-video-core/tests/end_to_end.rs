//! A bitplane fetch serviced by a collaborator reaches the line buffers and
//! the frame buffer.

use amiga_video_core::agnus::{Event, EventId, PrimarySlot};
use amiga_video_core::denise::{DeniseConfig, HPIXELS};
use amiga_video_core::{
    BPLCON0, CLXDAT, COLOR00, Chips, Collaborators, CoreConfig, CoreError, DENISEID, VideoCore,
};

const W1: u16 = 0b1010_0000_1111_0011;
const W2: u16 = 0b0110_1100_0101_1010;

/// Stands in for the bitplane DMA: delivers one word per plane at the
/// column the event was scheduled for.
#[derive(Default)]
struct Fetcher {
    fetched: Vec<u16>,
    intreq: Vec<u16>,
}

impl Collaborators for Fetcher {
    fn service_event(
        &mut self,
        slot: PrimarySlot,
        event: Event,
        chips: &mut Chips<'_>,
    ) -> Result<(), CoreError> {
        assert_eq!(slot, PrimarySlot::Dma);
        assert_eq!(event.id, EventId::DmaL1);

        let hpos = chips.scheduler.map().cycle_to_beam(event.trigger).hpos;
        self.fetched.push(hpos);

        // Plane 2 first: writing BPL1DAT loads the shift registers
        chips.denise.poke_bpl_dat(1, hpos, W2);
        chips.denise.poke_bpl_dat(0, hpos, W1);
        chips.denise.draw(hpos);
        chips.scheduler.cancel(slot);
        Ok(())
    }

    fn write_intreq(&mut self, value: u16) {
        self.intreq.push(value);
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn core() -> VideoCore {
    let config = CoreConfig {
        denise: DeniseConfig {
            vblank_lines: 0,
            ..DeniseConfig::default()
        },
        ..CoreConfig::default()
    };
    VideoCore::new(config).expect("default configuration is valid")
}

fn bit(word: u16, i: usize) -> u8 {
    ((word >> (15 - i)) & 1) as u8
}

#[test]
fn two_plane_lores_fetch_lands_in_color_index() {
    init_logging();
    let mut core = core();
    let mut fetcher = Fetcher::default();

    core.poke_custom(BPLCON0, 0x2000).unwrap();
    core.scheduler_mut()
        .schedule_abs(PrimarySlot::Dma, 100, EventId::DmaL1)
        .unwrap();

    core.run_until(1808, &mut fetcher).unwrap();

    assert_eq!(fetcher.fetched, vec![12]);
    assert_eq!(fetcher.intreq, vec![0x8020], "VERTB at the start of the frame");

    let line = core.denise().buffers();
    for i in 0..16 {
        let expected = bit(W1, i) | bit(W2, i) << 1;
        assert_eq!(line.color_index[50 + 2 * i], expected, "pixel {i}");
        assert_eq!(line.color_index[51 + 2 * i], expected, "pixel {i} (lores double)");
    }
    assert_eq!(line.color_index[49], 0);
    assert_eq!(line.color_index[82], 0);
}

#[test]
fn colours_written_on_the_line_reach_the_frame_buffer() {
    init_logging();
    let mut core = core();
    let mut fetcher = Fetcher::default();

    core.poke_custom(BPLCON0, 0x2000).unwrap();
    // COLOR00..COLOR03
    for (reg, rgb) in [0x000u16, 0xF00, 0x0F0, 0x00F].into_iter().enumerate() {
        core.poke_custom(COLOR00 + 2 * reg as u16, rgb).unwrap();
    }
    core.scheduler_mut()
        .schedule_abs(PrimarySlot::Dma, 100, EventId::DmaL1)
        .unwrap();

    core.run_frame(&mut fetcher).unwrap();

    let ring = core.frame_buffers();
    let palette = *core.denise().pixel_engine().palette();
    ring.with_stable(0, |frame| {
        let row = frame.row(0).expect("line 0 is inside the frame");
        assert_eq!(row.len(), 2 * HPIXELS);
        for i in 0..16 {
            let index = usize::from(bit(W1, i) | bit(W2, i) << 1);
            // Frame buffer texels are twice as wide as line buffer pixels
            let x = 2 * (50 + 2 * i);
            assert_eq!(row[x], palette[index], "pixel {i}");
        }
    })
    .expect("one finished frame is stable");
}

#[test]
fn clxdat_and_deniseid_are_readable() {
    init_logging();
    let mut core = core();
    assert_eq!(core.peek_custom(DENISEID), 0xFFFF);
    assert_eq!(core.peek_custom(CLXDAT) & 0x8000, 0x8000);
}
