//! Typed VGM commands.
//!
//! [`VgmCommand`] is what [`crate::vgm::parser::parse_command`] produces
//! for one opcode of the command stream. Variable-length payloads (data
//! blocks) borrow from the source image instead of copying it.
use crate::chip::{ChipKind, Instance};

/// One decoded command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VgmCommand<'a> {
    /// 0x50 / 0x30: SN76489 data byte.
    PsgWrite { instance: Instance, value: u8 },
    /// 0x4F / 0x3F: Game Gear stereo mask.
    GameGearStereo { instance: Instance, value: u8 },
    /// Address/data register write to an FM/OPL style chip (0x51-0x5F and
    /// their 0xA1-0xAF second-instance forms).
    RegisterWrite {
        chip: ChipKind,
        instance: Instance,
        port: u8,
        register: u8,
        value: u8,
    },
    /// 0x61 nnnn
    WaitSamples(u16),
    /// 0x62
    Wait735Samples,
    /// 0x63
    Wait882Samples,
    /// 0x70-0x7F: wait `n + 1` samples; holds `n` (0-15).
    WaitNSample(u8),
    /// 0x66
    EndOfData,
    /// 0x67
    DataBlock(DataBlock<'a>),
    /// 0x68
    PcmRamCopy(PcmRamCopy),
    /// 0x80-0x8F: YM2612 DAC write from the PCM pool, then wait `wait`.
    Ym2612DacWrite { wait: u8 },
    /// 0xB0: RF5C68 indexed register write.
    Rf5c68Register { register: u8, value: u8 },
    /// 0xB2: PWM register (12-bit data).
    PwmWrite { register: u8, value: u16 },
    /// 0xB5
    MultiPcmWrite {
        instance: Instance,
        register: u8,
        value: u8,
    },
    /// 0xC0: SegaPCM memory write, bit 15 of the address selects the
    /// instance and is stripped here.
    SegaPcmMemory {
        instance: Instance,
        address: u16,
        value: u8,
    },
    /// 0xC1: RF5C68 memory write.
    Rf5c68Memory { address: u16, value: u8 },
    /// 0xC3: MultiPCM bank offset for a channel.
    MultiPcmBank {
        instance: Instance,
        channel: u8,
        offset: u16,
    },
    /// 0xD0
    Ymf278bWrite { port: u8, register: u8, value: u8 },
    /// 0xD1
    Ymf271Write { port: u8, register: u8, value: u8 },
    /// 0xE0: set the DAC read cursor into PCM pool 0x00.
    PcmSeek(u32),
}

impl VgmCommand<'_> {
    /// Samples to wait after this command, if it is a wait.
    pub fn wait_samples(&self) -> Option<u32> {
        match self {
            VgmCommand::WaitSamples(n) => Some(u32::from(*n)),
            VgmCommand::Wait735Samples => Some(735),
            VgmCommand::Wait882Samples => Some(882),
            VgmCommand::WaitNSample(n) => Some(u32::from(*n) + 1),
            VgmCommand::Ym2612DacWrite { wait } => Some(u32::from(*wait)),
            _ => None,
        }
    }
}

/// Category encoded in the top two bits of a data-block type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataBlockCategory {
    /// 0x00-0x3F: uncompressed stream appended to a PCM pool.
    Stream,
    /// 0x40-0x7F: compressed stream.
    Compressed,
    /// 0x80-0xBF: ROM image.
    Rom,
    /// 0xC0-0xFF: RAM write.
    Ram,
}

/// Raw 0x67 data block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataBlock<'a> {
    pub data_type: u8,
    /// Taken from bit 31 of the size field.
    pub instance: Instance,
    /// Payload size with the instance bit cleared.
    pub size: u32,
    pub payload: &'a [u8],
}

impl DataBlock<'_> {
    /// Low six bits of the type: the PCM pool index for stream blocks.
    pub fn id(&self) -> u8 {
        self.data_type & 0x3F
    }

    pub fn category(&self) -> DataBlockCategory {
        match self.data_type & 0xC0 {
            0x00 => DataBlockCategory::Stream,
            0x40 => DataBlockCategory::Compressed,
            0x80 => DataBlockCategory::Rom,
            _ => DataBlockCategory::Ram,
        }
    }
}

/// 0x68 PCM RAM copy operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmRamCopy {
    /// Pool index (type byte masked to six bits).
    pub pool: u8,
    pub read_offset: u32,
    pub write_offset: u32,
    /// Byte count, with 0 already expanded to 0x1000000.
    pub length: u32,
}
