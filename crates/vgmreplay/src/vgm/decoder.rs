//! The command interpreter.
//!
//! [`CommandDecoder`] executes one command per [`CommandDecoder::step`]:
//! it parses the opcode at the command cursor, applies it to the chip rack
//! or the PCM pool, and reports how long the caller should render before
//! the next step. It never renders audio itself.
//!
//! Session state lives in [`PlaybackState`]:
//! - `end_of_stream` is raised by 0x66 and only cleared by a loop seek to
//!   an earlier position;
//! - `terminated` is raised by the first fatal error; every later step
//!   returns [`ReplayError::Terminated`];
//! - `fm_autodetect` is the one-shot legacy FM detection flag;
//! - `pcm_pos` is the DAC read cursor into PCM bank 0x00.
use tracing::{debug, error, info, warn};

use crate::chip::{CLOCK_MASK, ChipKind, ChipRack, EngineFactory, Instance};
use crate::error::{ReplayError, Result};
use crate::vgm::command::{DataBlock, PcmRamCopy, VgmCommand};
use crate::vgm::detail::{DataBlockContents, RamChipType, parse_data_block};
use crate::vgm::header::VgmHeader;
use crate::vgm::parser::parse_command;
use crate::vgm::pcm::{PcmPool, YM2612_DAC_BANK};

/// YM2612 register fed by the DAC opcodes.
const YM2612_DAC_REGISTER: u8 = 0x2A;

/// PCM RAM copy target handled by the RF5C68.
const RF5C68_RAM_POOL: u8 = 0x01;

/// Outcome of one decoder step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStep {
    /// Render this many output frames before the next step (may be 0).
    Wait(u32),
    /// The stream has ended; render nothing more unless looping.
    EndOfStream,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackState {
    pub end_of_stream: bool,
    pub terminated: bool,
    pub fm_autodetect: bool,
    pub pcm_pos: usize,
}

#[derive(Debug)]
pub struct CommandDecoder {
    rack: ChipRack,
    pool: PcmPool,
    state: PlaybackState,
    pos: usize,
    fm_autodetect_clock: u32,
}

impl CommandDecoder {
    /// Build a decoder for `header`, activating every chip it declares.
    pub fn new(header: &VgmHeader, factory: Box<dyn EngineFactory>) -> Self {
        let mut rack = ChipRack::new(factory);
        for (kind, clock) in header.chip_clocks() {
            rack.activate(kind, clock);
        }

        if rack.is_active(ChipKind::Sn76489) {
            rack.slot_mut(ChipKind::Sn76489)
                .chip_mut(Instance::Primary)
                .configure(header.sn76489_flags);
            rack.slot_mut(ChipKind::Sn76489)
                .chip_mut(Instance::Secondary)
                .configure(header.sn76489_flags);
        }
        if rack.is_active(ChipKind::SegaPcm) {
            info!(
                "SegaPCM interface register 0x{:08X}",
                header.segapcm_interface
            );
            rack.slot_mut(ChipKind::SegaPcm)
                .chip_mut(Instance::Primary)
                .configure(header.segapcm_interface);
        }

        let fm_autodetect = header.has_fm_autodetect();
        if fm_autodetect {
            debug!(
                "pre-1.10 FM clock {} Hz, chip decided by first FM command",
                header.fm_autodetect_clock & CLOCK_MASK
            );
        }

        CommandDecoder {
            rack,
            pool: PcmPool::new(),
            state: PlaybackState {
                fm_autodetect,
                ..PlaybackState::default()
            },
            pos: header.data_start,
            fm_autodetect_clock: header.fm_autodetect_clock,
        }
    }

    /// Absolute offset of the next command.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn is_end_of_stream(&self) -> bool {
        self.state.end_of_stream
    }

    pub fn rack(&self) -> &ChipRack {
        &self.rack
    }

    pub fn rack_mut(&mut self) -> &mut ChipRack {
        &mut self.rack
    }

    pub fn pool(&self) -> &PcmPool {
        &self.pool
    }

    /// Move the command cursor to `offset`.
    ///
    /// End-of-stream is cleared only when the target lies before the
    /// current position (a backwards loop jump).
    pub fn seek_loop(&mut self, offset: usize) {
        let prev = self.pos;
        self.pos = offset;
        if self.state.end_of_stream && offset < prev {
            self.state.end_of_stream = false;
        }
    }

    /// Execute one command from `bytes`, the whole VGM image.
    pub fn step(&mut self, bytes: &[u8]) -> Result<DecodeStep> {
        if self.state.terminated {
            return Err(ReplayError::Terminated);
        }
        if self.state.end_of_stream {
            return Ok(DecodeStep::EndOfStream);
        }
        match self.execute(bytes) {
            Ok(step) => Ok(step),
            Err(e) => {
                error!("stopping playback: {}", e);
                self.state.terminated = true;
                Err(e)
            }
        }
    }

    fn execute(&mut self, bytes: &[u8]) -> Result<DecodeStep> {
        let (cmd, len) = parse_command(bytes, self.pos)?;
        self.pos += len;
        let wait = cmd.wait_samples().unwrap_or(0);

        match cmd {
            VgmCommand::PsgWrite { instance, value } => {
                self.rack
                    .slot_mut(ChipKind::Sn76489)
                    .write_io(instance, 0, value);
            }
            VgmCommand::GameGearStereo { instance, value } => {
                self.rack
                    .slot_mut(ChipKind::Sn76489)
                    .write_io(instance, 1, value);
            }
            VgmCommand::RegisterWrite {
                chip,
                instance,
                port,
                register,
                value,
            } => {
                if instance == Instance::Primary {
                    self.autodetect_fm(chip);
                }
                self.rack
                    .slot_mut(chip)
                    .write_register(instance, port, register, value);
            }
            VgmCommand::EndOfData => {
                debug!("end of stream at 0x{:X}", self.pos - len);
                self.state.end_of_stream = true;
                return Ok(DecodeStep::EndOfStream);
            }
            VgmCommand::DataBlock(block) => self.load_data_block(&block),
            VgmCommand::PcmRamCopy(copy) => self.copy_pcm_ram(&copy),
            VgmCommand::Ym2612DacWrite { .. } => self.write_dac(),
            VgmCommand::Rf5c68Register { register, value } => {
                self.rack
                    .adapter_mut(ChipKind::Rf5c68, Instance::Primary)
                    .write_indexed(register, value);
            }
            VgmCommand::PwmWrite { register, value } => {
                debug!("PWM register {} <- 0x{:03X} (no PWM support)", register, value);
            }
            VgmCommand::MultiPcmWrite {
                instance,
                register,
                value,
            } => {
                self.rack
                    .slot_mut(ChipKind::MultiPcm)
                    .write_io(instance, register, value);
            }
            VgmCommand::SegaPcmMemory {
                instance,
                address,
                value,
            } => {
                self.rack
                    .adapter_mut(ChipKind::SegaPcm, instance)
                    .write_memory(address, value);
            }
            VgmCommand::Rf5c68Memory { address, value } => {
                self.rack
                    .adapter_mut(ChipKind::Rf5c68, Instance::Primary)
                    .write_memory(address, value);
            }
            VgmCommand::MultiPcmBank {
                instance,
                channel,
                offset,
            } => {
                self.rack
                    .adapter_mut(ChipKind::MultiPcm, instance)
                    .write_bank(channel, offset);
            }
            VgmCommand::Ymf278bWrite {
                port,
                register,
                value,
            } => {
                debug!(
                    "YMF278B #{} port {} reg 0x{:02X} <- 0x{:02X} (no YMF278B support)",
                    port >> 7,
                    port & 0x7F,
                    register,
                    value
                );
            }
            VgmCommand::Ymf271Write {
                port,
                register,
                value,
            } => {
                debug!(
                    "YMF271 #{} port {} reg 0x{:02X} <- 0x{:02X} (no YMF271 support)",
                    port >> 7,
                    port & 0x7F,
                    register,
                    value
                );
            }
            VgmCommand::PcmSeek(offset) => self.state.pcm_pos = offset as usize,
            VgmCommand::WaitSamples(_)
            | VgmCommand::Wait735Samples
            | VgmCommand::Wait882Samples
            | VgmCommand::WaitNSample(_) => {}
        }

        Ok(DecodeStep::Wait(wait))
    }

    /// Resolve a pending legacy FM clock on the first matching FM command.
    fn autodetect_fm(&mut self, chip: ChipKind) {
        if !self.state.fm_autodetect {
            return;
        }
        if !matches!(chip, ChipKind::Ym2413 | ChipKind::Ym2612 | ChipKind::Ym2151) {
            return;
        }
        self.rack.activate(chip, self.fm_autodetect_clock);
        self.state.fm_autodetect = false;
    }

    fn write_dac(&mut self) {
        self.autodetect_fm(ChipKind::Ym2612);
        let dac = self.rack.adapter_mut(ChipKind::Ym2612, Instance::Primary);
        if !dac.is_enabled() {
            return;
        }
        match self.pool.byte_at(YM2612_DAC_BANK, self.state.pcm_pos) {
            Some(sample) => {
                self.state.pcm_pos += 1;
                dac.write_register(0, YM2612_DAC_REGISTER, sample);
            }
            None => debug!(
                "DAC read at 0x{:X} past end of PCM bank ({} bytes)",
                self.state.pcm_pos,
                self.pool.len(YM2612_DAC_BANK)
            ),
        }
    }

    fn load_data_block(&mut self, block: &DataBlock<'_>) {
        let contents = match parse_data_block(block) {
            Ok(c) => c,
            Err(e) => {
                warn!(
                    "skipping malformed data block type 0x{:02X}: {}",
                    block.data_type, e
                );
                return;
            }
        };
        match contents {
            DataBlockContents::Stream { pool, data } => self.pool.append(pool, data),
            DataBlockContents::Compressed {
                pool,
                compression,
                uncompressed_size,
            } => {
                warn!(
                    "skipping compressed data block for bank 0x{:02X} ({:?}, {} bytes unpacked)",
                    pool, compression, uncompressed_size
                );
            }
            DataBlockContents::Rom {
                chip_type,
                rom_size,
                start,
                data,
            } => match chip_type.target() {
                Some((kind, rom)) => {
                    debug!(
                        "{} {:?} ROM: {} bytes at 0x{:X} of 0x{:X}",
                        kind,
                        rom,
                        data.len(),
                        start,
                        rom_size
                    );
                    self.rack.adapter_mut(kind, block.instance).write_rom(
                        rom,
                        rom_size as usize,
                        start as usize,
                        data,
                    );
                }
                None => warn!("skipping unrecognized ROM type 0x{:02X}", block.data_type),
            },
            DataBlockContents::Ram {
                chip_type,
                start,
                data,
            } => match chip_type {
                RamChipType::Rf5c68 => {
                    self.rack
                        .adapter_mut(ChipKind::Rf5c68, block.instance)
                        .write_ram(usize::from(start), data);
                }
                RamChipType::Unknown(t) => warn!("skipping unrecognized RAM type 0x{:02X}", t),
            },
        }
    }

    fn copy_pcm_ram(&mut self, copy: &PcmRamCopy) {
        let Some((data, clamped)) = self.pool.copy_range(
            copy.pool,
            copy.read_offset as usize,
            copy.length as usize,
        ) else {
            debug!(
                "PCM RAM copy from 0x{:X} past end of bank 0x{:02X}",
                copy.read_offset, copy.pool
            );
            return;
        };
        if clamped {
            warn!(
                "PCM RAM copy of {} bytes clamped to {} at end of bank 0x{:02X}",
                copy.length,
                data.len(),
                copy.pool
            );
        }
        match copy.pool {
            RF5C68_RAM_POOL => self
                .rack
                .adapter_mut(ChipKind::Rf5c68, Instance::Primary)
                .write_ram(copy.write_offset as usize, data),
            other => warn!("skipping PCM RAM copy for unrecognized type 0x{:02X}", other),
        }
    }
}
