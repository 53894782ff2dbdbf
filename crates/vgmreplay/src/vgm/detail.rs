//! Detailed interpretation of 0x67 data blocks.
//!
//! A data block's type byte selects one of four layouts:
//!
//! - `0x00-0x3F` uncompressed stream: the payload is appended to the PCM
//!   pool named by the low six bits.
//! - `0x40-0x7F` compressed stream: a compression type and the uncompressed
//!   size precede the packed data. Recognized but not decompressed.
//! - `0x80-0xBF` ROM image: ROM size (u32) and start address (u32) precede
//!   the image bytes.
//! - `0xC0-0xFF` RAM write: start address (u16) precedes the bytes.
//!
//! # Examples
//!
//! ```
//! use vgmreplay::chip::{ChipKind, Instance, RomKind};
//! use vgmreplay::vgm::command::DataBlock;
//! use vgmreplay::vgm::detail::{parse_data_block, DataBlockContents};
//!
//! let payload = [
//!     0x00, 0x00, 0x01, 0x00, // ROM size: 0x10000
//!     0x00, 0x10, 0x00, 0x00, // start: 0x1000
//!     0xAA, 0xBB,
//! ];
//! let block = DataBlock {
//!     data_type: 0x83,
//!     instance: Instance::Primary,
//!     size: payload.len() as u32,
//!     payload: &payload,
//! };
//! match parse_data_block(&block).unwrap() {
//!     DataBlockContents::Rom { chip_type, rom_size, start, data } => {
//!         assert_eq!(chip_type.target(), Some((ChipKind::Ym2610, RomKind::DeltaT)));
//!         assert_eq!((rom_size, start), (0x10000, 0x1000));
//!         assert_eq!(data, &[0xAA, 0xBB]);
//!     }
//!     other => panic!("expected ROM block, got {:?}", other),
//! }
//! ```
use crate::binutil::{read_slice, read_u8_at, read_u16_le_at, read_u32_le_at};
use crate::chip::{ChipKind, RomKind};
use crate::error::Result;
use crate::vgm::command::{DataBlock, DataBlockCategory};

/// ROM image targets (data block types 0x80-0xBF).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RomChipType {
    /// 0x80
    SegaPcm,
    /// 0x82
    Ym2610Adpcm,
    /// 0x83
    Ym2610DeltaT,
    /// 0x86
    Ymz280b,
    /// 0x88
    Y8950DeltaT,
    /// 0x89
    MultiPcm,
    Unknown(u8),
}

impl From<u8> for RomChipType {
    fn from(value: u8) -> Self {
        match value {
            0x80 => RomChipType::SegaPcm,
            0x82 => RomChipType::Ym2610Adpcm,
            0x83 => RomChipType::Ym2610DeltaT,
            0x86 => RomChipType::Ymz280b,
            0x88 => RomChipType::Y8950DeltaT,
            0x89 => RomChipType::MultiPcm,
            _ => RomChipType::Unknown(value),
        }
    }
}

impl RomChipType {
    /// Chip and ROM region an image of this type is loaded into.
    pub fn target(self) -> Option<(ChipKind, RomKind)> {
        match self {
            RomChipType::SegaPcm => Some((ChipKind::SegaPcm, RomKind::Pcm)),
            RomChipType::Ym2610Adpcm => Some((ChipKind::Ym2610, RomKind::Pcm)),
            RomChipType::Ym2610DeltaT => Some((ChipKind::Ym2610, RomKind::DeltaT)),
            RomChipType::Ymz280b => Some((ChipKind::Ymz280b, RomKind::Pcm)),
            RomChipType::Y8950DeltaT => Some((ChipKind::Y8950, RomKind::DeltaT)),
            RomChipType::MultiPcm => Some((ChipKind::MultiPcm, RomKind::Pcm)),
            RomChipType::Unknown(_) => None,
        }
    }
}

/// RAM write targets (data block types 0xC0-0xFF).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RamChipType {
    /// 0xC0
    Rf5c68,
    Unknown(u8),
}

impl From<u8> for RamChipType {
    fn from(value: u8) -> Self {
        match value {
            0xC0 => RamChipType::Rf5c68,
            _ => RamChipType::Unknown(value),
        }
    }
}

impl RamChipType {
    pub fn target(self) -> Option<ChipKind> {
        match self {
            RamChipType::Rf5c68 => Some(ChipKind::Rf5c68),
            RamChipType::Unknown(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    BitPacking,
    Dpcm,
    Unknown(u8),
}

impl From<u8> for CompressionType {
    fn from(value: u8) -> Self {
        match value {
            0x00 => CompressionType::BitPacking,
            0x01 => CompressionType::Dpcm,
            _ => CompressionType::Unknown(value),
        }
    }
}

/// Interpreted data block, borrowing its bytes from the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataBlockContents<'a> {
    Stream {
        pool: u8,
        data: &'a [u8],
    },
    Compressed {
        pool: u8,
        compression: CompressionType,
        uncompressed_size: u32,
    },
    Rom {
        chip_type: RomChipType,
        rom_size: u32,
        start: u32,
        data: &'a [u8],
    },
    Ram {
        chip_type: RamChipType,
        start: u16,
        data: &'a [u8],
    },
}

/// Split a data block's payload according to its type.
///
/// Fails with [`crate::ReplayError::OffsetOutOfRange`] when the payload is
/// too short for the sub-header its type requires.
pub fn parse_data_block<'a>(block: &DataBlock<'a>) -> Result<DataBlockContents<'a>> {
    let p = block.payload;
    match block.category() {
        DataBlockCategory::Stream => Ok(DataBlockContents::Stream {
            pool: block.id(),
            data: p,
        }),
        DataBlockCategory::Compressed => {
            let compression = CompressionType::from(read_u8_at(p, 0)?);
            let uncompressed_size = read_u32_le_at(p, 1)?;
            Ok(DataBlockContents::Compressed {
                pool: block.id(),
                compression,
                uncompressed_size,
            })
        }
        DataBlockCategory::Rom => {
            let rom_size = read_u32_le_at(p, 0)?;
            let start = read_u32_le_at(p, 4)?;
            Ok(DataBlockContents::Rom {
                chip_type: RomChipType::from(block.data_type),
                rom_size,
                start,
                data: read_slice(p, 8, p.len() - 8)?,
            })
        }
        DataBlockCategory::Ram => {
            let start = read_u16_le_at(p, 0)?;
            Ok(DataBlockContents::Ram {
                chip_type: RamChipType::from(block.data_type),
                start,
                data: read_slice(p, 2, p.len() - 2)?,
            })
        }
    }
}
