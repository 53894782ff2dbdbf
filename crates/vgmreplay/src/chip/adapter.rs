//! Rate conversion and mixing around a single synthesis core.
//!
//! Each engine runs at its own native rate (`clock / divider`), while the
//! replayer produces frames at [`OUTPUT_SAMPLE_RATE`]. [`ChipAdapter`]
//! bridges the two with an integer accumulator: for every output frame it
//! clocks the engine until `accumulator >= output_step`, adding
//! `input_step` per tick, then subtracts `output_step`. The remainder is
//! carried into the next frame so the phase error never exceeds one engine
//! tick, however long the song runs.
//!
//! No filtering is done; the engine's most recent sample is taken as is.
use std::fmt;

use tracing::debug;

use crate::chip::engine::{ChipEngine, RomKind};
use crate::chip::{CLOCK_MASK, DUAL_CHIP_FLAG, Instance};

/// Rate of every frame the replayer produces, in Hz. VGM wait counts are
/// expressed in samples at this rate.
pub const OUTPUT_SAMPLE_RATE: u32 = 44_100;

/// Stereo sample as produced by an engine, before clamping.
pub type RawFrame = [i32; 2];

/// Final mixed stereo sample.
pub type StereoFrame = [i16; 2];

/// Add `sample` to a running mix total, clamping both the incoming sample
/// and the sum to the signed 16-bit range.
pub fn mix_sample(total: i32, sample: i32) -> i32 {
    let sample = sample.clamp(i16::MIN as i32, i16::MAX as i32);
    total
        .saturating_add(sample)
        .clamp(i16::MIN as i32, i16::MAX as i32)
}

/// One synthesis core plus its resampling state.
///
/// An adapter starts disabled, with no engine. [`ChipAdapter::init`] hands
/// it an engine and a clock; from then on it stays enabled for the rest of
/// the session. A disabled adapter ignores every write and contributes
/// silence without ticking anything.
pub struct ChipAdapter {
    engine: Option<Box<dyn ChipEngine>>,
    clock: u32,
    output_enabled: bool,
    output_step: u64,
    input_step: u64,
    accumulator: u64,
}

impl fmt::Debug for ChipAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChipAdapter")
            .field("enabled", &self.is_enabled())
            .field("clock", &self.clock)
            .field("output_enabled", &self.output_enabled)
            .field("output_step", &self.output_step)
            .field("input_step", &self.input_step)
            .field("accumulator", &self.accumulator)
            .finish()
    }
}

impl Default for ChipAdapter {
    fn default() -> Self {
        ChipAdapter::new()
    }
}

impl ChipAdapter {
    pub fn new() -> Self {
        ChipAdapter {
            engine: None,
            clock: 0,
            output_enabled: true,
            output_step: 0,
            input_step: u64::from(OUTPUT_SAMPLE_RATE),
            accumulator: 0,
        }
    }

    /// Activate the adapter with `engine` running at `clock` Hz.
    ///
    /// The two flag bits of a header clock field are masked off before the
    /// engine sees the value. Returns `false` (and drops `engine`) if the
    /// adapter was already active.
    pub fn init(&mut self, clock: u32, mut engine: Box<dyn ChipEngine>) -> bool {
        if self.engine.is_some() {
            debug!("chip already active, ignoring second init");
            return false;
        }
        let clock = clock & CLOCK_MASK;
        engine.init(clock);
        self.clock = clock;
        self.output_step = u64::from(engine.sample_rate(clock));
        self.input_step = u64::from(OUTPUT_SAMPLE_RATE);
        self.accumulator = 0;
        self.engine = Some(engine);
        true
    }

    pub fn is_enabled(&self) -> bool {
        self.engine.is_some()
    }

    /// Master clock in Hz (0 while disabled).
    pub fn clock(&self) -> u32 {
        self.clock
    }

    /// Native engine rate used as the accumulator's output step.
    pub fn output_step(&self) -> u64 {
        self.output_step
    }

    pub fn is_output_enabled(&self) -> bool {
        self.output_enabled
    }

    /// Mute or unmute the adapter. A muted adapter keeps clocking its engine
    /// so it stays in time, it just stops contributing to the mix.
    pub fn set_output_enabled(&mut self, enabled: bool) {
        self.output_enabled = enabled;
    }

    pub fn configure(&mut self, flags: u32) {
        if let Some(engine) = self.engine.as_mut() {
            engine.configure(flags);
        }
    }

    pub fn write_io(&mut self, port: u8, data: u8) {
        if let Some(engine) = self.engine.as_mut() {
            engine.write_io(port, data);
        }
    }

    /// Address strobe on I/O `port * 2`, then data strobe on `port * 2 + 1`.
    pub fn write_register(&mut self, port: u8, register: u8, value: u8) {
        let base = port << 1;
        self.write_io(base, register);
        self.write_io(base | 1, value);
    }

    /// Memory-mapped write used by the PCM chips: address high byte on I/O
    /// 0, low byte on I/O 1, data on I/O 2.
    pub fn write_memory(&mut self, address: u16, data: u8) {
        let [lo, hi] = address.to_le_bytes();
        self.write_io(0, hi);
        self.write_io(1, lo);
        self.write_io(2, data);
    }

    /// Indexed register write on I/O 3 (register) and I/O 4 (value).
    pub fn write_indexed(&mut self, register: u8, value: u8) {
        self.write_io(3, register);
        self.write_io(4, value);
    }

    /// MultiPCM bank select: channel on I/O 3, offset high/low on I/O 4/5.
    pub fn write_bank(&mut self, channel: u8, offset: u16) {
        let [lo, hi] = offset.to_le_bytes();
        self.write_io(3, channel);
        self.write_io(4, hi);
        self.write_io(5, lo);
    }

    pub fn write_rom(&mut self, kind: RomKind, rom_size: usize, start: usize, data: &[u8]) {
        if let Some(engine) = self.engine.as_mut() {
            engine.write_rom(kind, rom_size, start, data);
        }
    }

    pub fn write_ram(&mut self, start: usize, data: &[u8]) {
        if let Some(engine) = self.engine.as_mut() {
            engine.write_ram(start, data);
        }
    }

    /// Produce the engine's contribution to one output frame.
    ///
    /// Returns silence without clocking anything while disabled, and
    /// silence after clocking while muted.
    pub fn tick(&mut self) -> RawFrame {
        let Some(engine) = self.engine.as_mut() else {
            return [0, 0];
        };
        while self.accumulator < self.output_step {
            engine.clock();
            self.accumulator += self.input_step;
        }
        self.accumulator -= self.output_step;
        if self.output_enabled {
            engine.sample()
        } else {
            [0, 0]
        }
    }

    /// Tick once and add the result into `total` with saturation.
    pub fn mix_into(&mut self, total: &mut RawFrame) {
        if !self.is_enabled() {
            return;
        }
        let frame = self.tick();
        for (acc, s) in total.iter_mut().zip(frame) {
            *acc = mix_sample(*acc, s);
        }
    }
}

/// Two adapters behind one header clock field.
///
/// Bit 30 of the clock field decides whether the secondary instance is
/// activated alongside the primary one. Every operation names the instance
/// it targets.
#[derive(Debug, Default)]
pub struct DualChipAdapter {
    chips: [ChipAdapter; 2],
}

impl DualChipAdapter {
    pub fn new() -> Self {
        DualChipAdapter::default()
    }

    /// Activate the primary instance, and the secondary one when the dual
    /// flag is set in `raw_clock`. `make_engine` is called once per
    /// activated instance. Returns the number of instances activated.
    pub fn init<F>(&mut self, raw_clock: u32, mut make_engine: F) -> usize
    where
        F: FnMut() -> Box<dyn ChipEngine>,
    {
        let clock = raw_clock & CLOCK_MASK;
        let mut activated = 0;
        if !self.chips[0].is_enabled() && self.chips[0].init(clock, make_engine()) {
            activated += 1;
        }
        if raw_clock & DUAL_CHIP_FLAG != 0
            && !self.chips[1].is_enabled()
            && self.chips[1].init(clock, make_engine())
        {
            activated += 1;
        }
        activated
    }

    pub fn is_dual(&self) -> bool {
        self.chips[1].is_enabled()
    }

    pub fn chip(&self, instance: Instance) -> &ChipAdapter {
        &self.chips[usize::from(instance)]
    }

    pub fn chip_mut(&mut self, instance: Instance) -> &mut ChipAdapter {
        &mut self.chips[usize::from(instance)]
    }

    pub fn write_register(&mut self, instance: Instance, port: u8, register: u8, value: u8) {
        self.chip_mut(instance).write_register(port, register, value);
    }

    pub fn write_io(&mut self, instance: Instance, port: u8, data: u8) {
        self.chip_mut(instance).write_io(port, data);
    }

    /// Mix both instances into `total`.
    pub fn mix_into(&mut self, total: &mut RawFrame) {
        for chip in self.chips.iter_mut() {
            chip.mix_into(total);
        }
    }

    /// Tick both instances and return their saturated sum.
    pub fn tick(&mut self) -> RawFrame {
        let mut total = [0, 0];
        self.mix_into(&mut total);
        total
    }
}
