#![doc = include_str!("../README.md")]
//! vgmreplay: replay core for retro sound-chip register-write logs
//!
//! `vgmreplay` turns a decompressed VGM image into a stream of 44.1 kHz
//! stereo frames. It does not emulate any chip itself beyond a small
//! SN76489 core: every synthesis engine is reached through the
//! [`chip::ChipEngine`] trait and created by an [`chip::EngineFactory`], so
//! real emulators can be plugged in without touching the decoder.
//!
//! Layers, bottom up:
//! - [`binutil`]: bounds-checked little-endian reads.
//! - [`chip`]: engines, the resampling [`chip::ChipAdapter`], dual-chip
//!   pairs and the [`chip::ChipRack`] mixer.
//! - [`meta`]: GD3 tag parsing.
//! - [`vgm`]: header detection, the command parser, the PCM pool, the
//!   [`vgm::CommandDecoder`] and the [`VgmPlayer`] facade.
//!
//! Example: render a file to memory, looping once
//!
//! ```no_run
//! use vgmreplay::{DecodeStep, VgmPlayer};
//!
//! let bytes = std::fs::read("song.vgm").unwrap();
//! let mut player = VgmPlayer::load(bytes).unwrap();
//! if let Ok(Some(tag)) = player.tag() {
//!     println!("{}", tag.track_name_en);
//! }
//!
//! let mut frames = Vec::new();
//! let mut loops_left = 1;
//! loop {
//!     match player.decode_step().unwrap() {
//!         DecodeStep::Wait(n) => player.render(n, |f| frames.push(f)),
//!         DecodeStep::EndOfStream => match player.loop_offset() {
//!             Some(offset) if loops_left > 0 => {
//!                 loops_left -= 1;
//!                 player.seek_loop(offset);
//!             }
//!             _ => break,
//!         },
//!     }
//! }
//! ```
//!
//! Example: plug in a custom engine factory
//!
//! ```
//! use vgmreplay::chip::{ChipEngine, ChipKind, SilentEngine, Sn76489};
//!
//! let factory = |kind: ChipKind| -> Box<dyn ChipEngine> {
//!     match kind {
//!         ChipKind::Sn76489 => Box::new(Sn76489::new()),
//!         other => Box::new(SilentEngine::new(other)),
//!     }
//! };
//! # let _ = factory;
//! ```
pub mod binutil;
pub mod chip;
pub mod error;
pub mod meta;
pub mod vgm;

pub use error::{ReplayError, Result};
pub use meta::{Gd3, Gd3Text};
pub use vgm::{DecodeStep, VgmHeader, VgmPlayer};
