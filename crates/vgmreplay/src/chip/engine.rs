//! Capability trait for synthesis cores.
//!
//! A `ChipEngine` is an opaque emulator of one physical chip. The replayer
//! only needs a handful of operations from it: a native output rate, a way to
//! push bytes onto the chip's I/O ports, a single-sample clock, and the last
//! stereo sample. ROM and RAM uploads are optional and default to no-ops.
//!
//! Engines are created on demand through an [`EngineFactory`], so a chip that
//! is never declared in a file never gets an engine.
use crate::chip::adapter::RawFrame;
use crate::chip::kind::ChipKind;
use crate::chip::sn76489::Sn76489;

/// Which memory region a ROM upload targets.
///
/// Most chips have a single sample ROM. Chips with an additional Delta-T
/// ADPCM unit (YM2610, Y8950) receive that unit's ROM as `DeltaT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RomKind {
    Pcm,
    DeltaT,
}

/// Uniform surface of one synthesis core.
pub trait ChipEngine: Send {
    /// Native output rate in Hz for the given master clock.
    fn sample_rate(&self, clock: u32) -> u32;

    /// Reset the core for a master clock (bits 30/31 already masked off).
    fn init(&mut self, clock: u32);

    /// Chip-specific configuration word taken from the VGM header.
    fn configure(&mut self, _flags: u32) {}

    /// Write one byte to an I/O port of the chip.
    ///
    /// For address/data chips even ports latch an address and odd ports
    /// carry data; other chips define their own port map.
    fn write_io(&mut self, port: u8, data: u8);

    /// Advance the core by one native output sample.
    fn clock(&mut self);

    /// The sample produced by the last [`ChipEngine::clock`].
    fn sample(&self) -> RawFrame;

    /// Load part of a ROM image. `rom_size` is the full size of the ROM the
    /// image belongs to; `start` is where `data` is placed inside it.
    fn write_rom(&mut self, _kind: RomKind, _rom_size: usize, _start: usize, _data: &[u8]) {}

    /// Load bytes into the chip's sample RAM starting at `start`.
    fn write_ram(&mut self, _start: usize, _data: &[u8]) {}
}

/// Creates engines for chips as the header (or a lazily detected opcode)
/// activates them.
pub trait EngineFactory: Send {
    fn create(&self, kind: ChipKind) -> Box<dyn ChipEngine>;
}

impl<F> EngineFactory for F
where
    F: Fn(ChipKind) -> Box<dyn ChipEngine> + Send,
{
    fn create(&self, kind: ChipKind) -> Box<dyn ChipEngine> {
        self(kind)
    }
}

/// Default factory: the bundled SN76489 core, silence for everything else.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinEngines;

impl EngineFactory for BuiltinEngines {
    fn create(&self, kind: ChipKind) -> Box<dyn ChipEngine> {
        match kind {
            ChipKind::Sn76489 => Box::new(Sn76489::new()),
            other => Box::new(SilentEngine::new(other)),
        }
    }
}

/// Placeholder core that accepts every write and outputs silence at the
/// chip's native rate.
#[derive(Debug, Clone)]
pub struct SilentEngine {
    divider: u32,
}

impl SilentEngine {
    pub fn new(kind: ChipKind) -> Self {
        SilentEngine {
            divider: kind.native_divider(),
        }
    }
}

impl ChipEngine for SilentEngine {
    fn sample_rate(&self, clock: u32) -> u32 {
        clock / self.divider.max(1)
    }

    fn init(&mut self, _clock: u32) {}

    fn write_io(&mut self, _port: u8, _data: u8) {}

    fn clock(&mut self) {}

    fn sample(&self) -> RawFrame {
        [0, 0]
    }
}
