//! Command-stream parser.
//!
//! [`parse_command`] decodes the opcode at an absolute offset together with
//! its operands and reports the number of bytes consumed (opcode included).
//! It never touches chip state; applying a command is the decoder's job.
//!
//! An opcode whose operand layout is unknown cannot be skipped safely, so it
//! fails with [`ReplayError::UnknownOpcode`]. A command whose operands run
//! past the end of the image fails with [`ReplayError::OffsetOutOfRange`].
use crate::binutil::Cursor;
use crate::chip::{ChipKind, Instance};
use crate::error::{ReplayError, Result};
use crate::vgm::command::{DataBlock, PcmRamCopy, VgmCommand};

/// Largest PCM RAM copy; a zero length field means this many bytes.
pub const PCM_COPY_MAX_LEN: u32 = 0x100_0000;

const DATA_BLOCK_SECOND_CHIP: u32 = 0x8000_0000;

/// Chip, instance and port addressed by an `aa dd` register-write opcode.
fn register_target(opcode: u8) -> Option<(ChipKind, Instance, u8)> {
    let instance = Instance::from_flag(opcode & 0xF0 == 0xA0);
    let (chip, port) = match opcode & 0x0F {
        0x01 => (ChipKind::Ym2413, 0),
        0x02 => (ChipKind::Ym2612, 0),
        0x03 => (ChipKind::Ym2612, 1),
        0x04 => (ChipKind::Ym2151, 0),
        0x05 => (ChipKind::Ym2203, 0),
        0x08 => (ChipKind::Ym2610, 0),
        0x09 => (ChipKind::Ym2610, 1),
        0x0A => (ChipKind::Ym3812, 0),
        0x0B => (ChipKind::Ym3526, 0),
        0x0C => (ChipKind::Y8950, 0),
        0x0D => (ChipKind::Ymz280b, 0),
        0x0E => (ChipKind::Ymf262, 0),
        0x0F => (ChipKind::Ymf262, 1),
        _ => return None,
    };
    Some((chip, instance, port))
}

fn parse_data_block<'a>(cur: &mut Cursor<'a>) -> Result<DataBlock<'a>> {
    // 0x66 compatibility byte
    cur.skip(1);
    let data_type = cur.imm_u8()?;
    let raw_size = cur.imm_u32()?;
    let size = raw_size & !DATA_BLOCK_SECOND_CHIP;
    let payload = cur
        .imm_slice(size as usize)
        .map_err(|e| e.with_context("data block payload"))?;
    Ok(DataBlock {
        data_type,
        instance: Instance::from_flag(raw_size & DATA_BLOCK_SECOND_CHIP != 0),
        size,
        payload,
    })
}

fn parse_pcm_ram_copy(cur: &mut Cursor<'_>) -> Result<PcmRamCopy> {
    cur.skip(1);
    let pool = cur.imm_u8()? & 0x3F;
    let read_offset = cur.imm_u24()?;
    let write_offset = cur.imm_u24()?;
    let length = match cur.imm_u24()? {
        0 => PCM_COPY_MAX_LEN,
        n => n,
    };
    Ok(PcmRamCopy {
        pool,
        read_offset,
        write_offset,
        length,
    })
}

/// Parse one command at `off`. Returns the command and the bytes consumed.
pub fn parse_command(bytes: &[u8], off: usize) -> Result<(VgmCommand<'_>, usize)> {
    let mut cur = Cursor::new(bytes, off);
    let opcode = cur.imm_u8()?;
    let cmd = match opcode {
        0x30 | 0x50 => VgmCommand::PsgWrite {
            instance: Instance::from_flag(opcode == 0x30),
            value: cur.imm_u8()?,
        },
        0x3F | 0x4F => VgmCommand::GameGearStereo {
            instance: Instance::from_flag(opcode == 0x3F),
            value: cur.imm_u8()?,
        },
        0x51..=0x5F | 0xA1..=0xAF => {
            let Some((chip, instance, port)) = register_target(opcode) else {
                return Err(ReplayError::UnknownOpcode {
                    opcode,
                    offset: off,
                });
            };
            VgmCommand::RegisterWrite {
                chip,
                instance,
                port,
                register: cur.imm_u8()?,
                value: cur.imm_u8()?,
            }
        }
        0x61 => VgmCommand::WaitSamples(cur.imm_u16()?),
        0x62 => VgmCommand::Wait735Samples,
        0x63 => VgmCommand::Wait882Samples,
        0x66 => VgmCommand::EndOfData,
        0x67 => VgmCommand::DataBlock(parse_data_block(&mut cur)?),
        0x68 => VgmCommand::PcmRamCopy(parse_pcm_ram_copy(&mut cur)?),
        0x70..=0x7F => VgmCommand::WaitNSample(opcode & 0x0F),
        0x80..=0x8F => VgmCommand::Ym2612DacWrite {
            wait: opcode & 0x0F,
        },
        0xB0 => VgmCommand::Rf5c68Register {
            register: cur.imm_u8()?,
            value: cur.imm_u8()?,
        },
        0xB2 => {
            let hi = cur.imm_u8()?;
            let lo = cur.imm_u8()?;
            VgmCommand::PwmWrite {
                register: hi >> 4,
                value: (u16::from(hi & 0x0F) << 8) | u16::from(lo),
            }
        }
        0xB5 => {
            let register = cur.imm_u8()?;
            VgmCommand::MultiPcmWrite {
                instance: Instance::from_flag(register & 0x80 != 0),
                register: register & 0x7F,
                value: cur.imm_u8()?,
            }
        }
        0xC0 => {
            let address = cur.imm_u16()?;
            VgmCommand::SegaPcmMemory {
                instance: Instance::from_flag(address & 0x8000 != 0),
                address: address & 0x7FFF,
                value: cur.imm_u8()?,
            }
        }
        0xC1 => VgmCommand::Rf5c68Memory {
            address: cur.imm_u16()?,
            value: cur.imm_u8()?,
        },
        0xC3 => {
            let channel = cur.imm_u8()?;
            VgmCommand::MultiPcmBank {
                instance: Instance::from_flag(channel & 0x80 != 0),
                channel: channel & 0x7F,
                offset: cur.imm_u16()?,
            }
        }
        0xD0 => VgmCommand::Ymf278bWrite {
            port: cur.imm_u8()?,
            register: cur.imm_u8()?,
            value: cur.imm_u8()?,
        },
        0xD1 => VgmCommand::Ymf271Write {
            port: cur.imm_u8()?,
            register: cur.imm_u8()?,
            value: cur.imm_u8()?,
        },
        0xE0 => VgmCommand::PcmSeek(cur.imm_u32()?),
        _ => {
            return Err(ReplayError::UnknownOpcode {
                opcode,
                offset: off,
            });
        }
    };
    Ok((cmd, cur.position() - off))
}
