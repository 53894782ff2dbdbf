//! Compact SN76489 PSG core.
//!
//! This is the one synthesis core bundled with the crate so that files for
//! the Master System / Game Gear / Mega Drive PSG can be rendered without
//! pulling in an external emulator. It models three square-wave tone
//! channels, one LFSR noise channel, 2 dB attenuation steps and the Game
//! Gear stereo register. It does not try to reproduce analogue output
//! filtering.
//!
//! # Register interface
//!
//! The chip is written one byte at a time (I/O port 0):
//! - Latch byte (bit 7 = 1): bits 6-5 select the channel, bit 4 selects
//!   attenuation (1) or tone/noise (0), bits 3-0 are the low data bits.
//! - Data byte (bit 7 = 0): bits 5-0 become the high six bits of the latched
//!   tone period, or replace the latched attenuation / noise value.
//!
//! I/O port 1 is the Game Gear stereo mask: bits 7-4 enable channels 3-0 on
//! the left output, bits 3-0 on the right.
use crate::chip::adapter::RawFrame;
use crate::chip::engine::ChipEngine;

const CHANNELS: usize = 4;
const NOISE: usize = 3;

/// Output level per attenuation step (2 dB each, 15 = off).
const VOLUME_TABLE: [i32; 16] = [
    8191, 6506, 5168, 4105, 3261, 2590, 2057, 1634, 1298, 1031, 819, 650, 516, 410, 326, 0,
];

const DEFAULT_FEEDBACK: u32 = 0x0009;
const DEFAULT_SHIFT_WIDTH: u32 = 16;

#[derive(Debug, Clone)]
pub struct Sn76489 {
    /// 10-bit tone periods for channels 0-2.
    periods: [u16; 3],
    /// Noise control register (bits 1-0 rate, bit 2 white noise).
    noise_control: u8,
    attenuation: [u8; CHANNELS],
    latched_channel: usize,
    latched_volume: bool,
    counters: [u16; CHANNELS],
    polarity: [bool; CHANNELS],
    lfsr: u32,
    feedback: u32,
    shift_width: u32,
    stereo: u8,
    output: RawFrame,
}

impl Default for Sn76489 {
    fn default() -> Self {
        Sn76489::new()
    }
}

impl Sn76489 {
    pub fn new() -> Self {
        let mut chip = Sn76489 {
            periods: [0; 3],
            noise_control: 0,
            attenuation: [0x0F; CHANNELS],
            latched_channel: 0,
            latched_volume: false,
            counters: [0; CHANNELS],
            polarity: [true; CHANNELS],
            lfsr: 0,
            feedback: DEFAULT_FEEDBACK,
            shift_width: DEFAULT_SHIFT_WIDTH,
            stereo: 0xFF,
            output: [0, 0],
        };
        chip.reset_lfsr();
        chip
    }

    fn reset_lfsr(&mut self) {
        self.lfsr = 1 << (self.shift_width - 1);
    }

    /// Tone period in clock/16 ticks; 0 behaves like 1 on this chip family.
    fn tone_period(&self, channel: usize) -> u16 {
        self.periods[channel].max(1)
    }

    fn noise_period(&self) -> u16 {
        match self.noise_control & 0x03 {
            0 => 0x10,
            1 => 0x20,
            2 => 0x40,
            _ => self.tone_period(2),
        }
    }

    fn write_data(&mut self, data: u8) {
        if data & 0x80 != 0 {
            self.latched_channel = usize::from((data >> 5) & 0x03);
            self.latched_volume = data & 0x10 != 0;
            let low = data & 0x0F;
            if self.latched_volume {
                self.attenuation[self.latched_channel] = low;
            } else if self.latched_channel == NOISE {
                self.set_noise(low);
            } else {
                let p = &mut self.periods[self.latched_channel];
                *p = (*p & 0x3F0) | u16::from(low);
            }
            return;
        }

        if self.latched_volume {
            self.attenuation[self.latched_channel] = data & 0x0F;
        } else if self.latched_channel == NOISE {
            self.set_noise(data & 0x0F);
        } else {
            let p = &mut self.periods[self.latched_channel];
            *p = (*p & 0x00F) | (u16::from(data & 0x3F) << 4);
        }
    }

    fn set_noise(&mut self, value: u8) {
        self.noise_control = value & 0x07;
        self.reset_lfsr();
    }

    fn step_noise(&mut self) {
        let white = self.noise_control & 0x04 != 0;
        let bit = if white {
            (self.lfsr & self.feedback).count_ones() & 1
        } else {
            self.lfsr & 1
        };
        self.lfsr = (self.lfsr >> 1) | (bit << (self.shift_width - 1));
    }

    fn channel_level(&self, channel: usize) -> i32 {
        let volume = VOLUME_TABLE[usize::from(self.attenuation[channel] & 0x0F)];
        let high = if channel == NOISE {
            self.lfsr & 1 != 0
        } else {
            // periods 0 and 1 hold the output high, which is how PCM is
            // played back through the volume register
            self.periods[channel] <= 1 || self.polarity[channel]
        };
        if high { volume } else { -volume }
    }
}

impl ChipEngine for Sn76489 {
    fn sample_rate(&self, clock: u32) -> u32 {
        clock / 16
    }

    fn init(&mut self, _clock: u32) {
        let feedback = self.feedback;
        let shift_width = self.shift_width;
        *self = Sn76489::new();
        self.feedback = feedback;
        self.shift_width = shift_width;
        self.reset_lfsr();
    }

    /// `flags = (noise_feedback << 16) | (shift_register_width << 8)`.
    fn configure(&mut self, flags: u32) {
        let feedback = (flags >> 16) & 0xFFFF;
        let width = (flags >> 8) & 0xFF;
        self.feedback = if feedback == 0 { DEFAULT_FEEDBACK } else { feedback };
        self.shift_width = if (1..=32).contains(&width) {
            width
        } else {
            DEFAULT_SHIFT_WIDTH
        };
        self.reset_lfsr();
    }

    fn write_io(&mut self, port: u8, data: u8) {
        if port & 1 == 0 {
            self.write_data(data);
        } else {
            self.stereo = data;
        }
    }

    fn clock(&mut self) {
        for ch in 0..3 {
            if self.counters[ch] > 0 {
                self.counters[ch] -= 1;
            }
            if self.counters[ch] == 0 {
                self.counters[ch] = self.tone_period(ch);
                self.polarity[ch] = !self.polarity[ch];
            }
        }

        if self.counters[NOISE] > 0 {
            self.counters[NOISE] -= 1;
        }
        if self.counters[NOISE] == 0 {
            self.counters[NOISE] = self.noise_period();
            self.polarity[NOISE] = !self.polarity[NOISE];
            if self.polarity[NOISE] {
                self.step_noise();
            }
        }

        let mut left = 0;
        let mut right = 0;
        for ch in 0..CHANNELS {
            let level = self.channel_level(ch);
            if self.stereo & (0x10 << ch) != 0 {
                left += level;
            }
            if self.stereo & (0x01 << ch) != 0 {
                right += level;
            }
        }
        self.output = [left, right];
    }

    fn sample(&self) -> RawFrame {
        self.output
    }
}
