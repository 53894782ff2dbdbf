//! Sound-chip side of the replayer.
//!
//! The decoder never talks to a synthesis core directly. Every core is
//! reached through the [`ChipEngine`] capability trait, wrapped in a
//! [`ChipAdapter`] that owns rate conversion, and paired into a
//! [`DualChipAdapter`] because the VGM header can declare two instances of a
//! chip behind a single clock field. [`ChipRack`] holds one dual adapter per
//! [`ChipKind`] and produces the mixed output frame.
pub mod adapter;
pub mod engine;
mod kind;
pub mod rack;
pub mod sn76489;

pub use adapter::{ChipAdapter, DualChipAdapter, OUTPUT_SAMPLE_RATE, RawFrame, StereoFrame};
pub use engine::{BuiltinEngines, ChipEngine, EngineFactory, RomKind, SilentEngine};
pub use kind::{ChipKind, ClockTier};
pub use rack::ChipRack;
pub use sn76489::Sn76489;

/// Bits of a header clock field that carry the actual clock in Hz.
pub const CLOCK_MASK: u32 = 0x3FFF_FFFF;

/// Header clock-field flag declaring a second instance of the chip.
pub const DUAL_CHIP_FLAG: u32 = 1 << 30;

/// Selects one of the two chips a dual-capable header field can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Instance {
    #[default]
    Primary = 0x0,
    Secondary = 0x1,
}

impl Instance {
    /// Map a "second chip" flag (an address high bit, a data-block size bit)
    /// to an instance.
    pub fn from_flag(second: bool) -> Self {
        if second {
            Instance::Secondary
        } else {
            Instance::Primary
        }
    }
}

impl From<Instance> for usize {
    fn from(i: Instance) -> Self {
        i as usize
    }
}

impl From<usize> for Instance {
    fn from(v: usize) -> Self {
        match v {
            0 => Instance::Primary,
            _ => Instance::Secondary,
        }
    }
}
