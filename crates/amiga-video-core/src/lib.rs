//! Amiga video core: the Agnus event scheduler driving the Denise line
//! pipeline.
//!
//! The raster slot belongs to the core. It closes every line in Denise,
//! rotates the frame buffers at the end of a frame and raises VERTB. Every
//! other event is handed to the surrounding emulator through
//! [`Collaborators`].

mod config;
mod error;
mod registers;
mod video_core;

pub use config::CoreConfig;
pub use error::CoreError;
pub use registers::{
    BPL1DAT, BPLCON0, BPLCON1, BPLCON2, BPLCON3, CLXCON, CLXDAT, COLOR00, DENISEID, DIWHIGH,
    DIWSTOP, DIWSTRT, SPR0POS,
};
pub use video_core::{Chips, Collaborators, RAS_HPOS, VideoCore};

pub use commodore_agnus_ocs as agnus;
pub use commodore_denise_ocs as denise;
