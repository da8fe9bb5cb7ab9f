//! Commodore Denise OCS/ECS: bitplane shifter, playfield translator,
//! sprite engine, and colour pipeline.
//!
//! Denise works one raster line at a time. Register writes arriving during
//! a line are tagged with the pixel they take effect at and queued. When
//! the line ends, the queued changes are replayed while the line buffers
//! are turned into colour indices, depth tags, sprite pixels and finally
//! ARGB texels in the working frame buffer.

mod bitplane;
mod border;
mod buffers;
mod collision;
mod color;
mod config;
mod denise;
mod depth;
mod error;
mod frame_buffer;
mod pixel_engine;
mod reg_change;
mod sprite;
mod translator;

pub use bitplane::{
    BitplaneShifter, Resolution, bpu, is_dual_playfield, is_ham, is_interlaced, raw_bpu,
};
pub use border::{BORDER_BLACK, Border};
pub use buffers::{HPIXELS, LINE_LEN, LineBuffers, NO_BORDER};
pub use collision::Collisions;
pub use color::{AmigaColor, adjust_rgb, argb, color_space};
pub use config::{DeniseConfig, DeniseVariant, MonitorConfig, Palette};
pub use denise::{Denise, pixel};
pub use depth::{
    Z_0, Z_1, Z_2, Z_3, Z_4, Z_DPF, Z_PF1, Z_PF2, Z_SP, Z_SP_ALL, is_sprite_pixel,
    is_sprite_pixel_of, upper_playfield, z_pf,
};
pub use error::{ConfigError, DeniseError};
pub use frame_buffer::{FB_HEIGHT, FB_WIDTH, FrameBuffer, FrameBufferRing};
pub use pixel_engine::{DEBUG_COLORS, PALETTE_LEN, PixelEngine};
pub use reg_change::{QUEUE_CAPACITY, RegisterChange, RegisterChangeKind, RegisterChangeQueue};
pub use sprite::{Sprite, SpriteEngine};
