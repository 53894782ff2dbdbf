//! VGM header reading and feature detection.
//!
//! This module turns the fixed-offset fields at the start of a VGM image
//! into a [`VgmHeader`]: the BCD version, the command-stream start, loop and
//! GD3 positions, and one raw clock value per [`ChipKind`].
//!
//! Notes:
//! - Clock fields are version-gated by [`ClockTier`]. A field newer than the
//!   file's version reads as 0.
//! - Fields from VGM 1.51 on must also lie entirely before the command
//!   stream. Short headers are common in 1.51+ files and the bytes after the
//!   header belong to commands, not to clock fields.
//! - Pre-1.10 files store a single "FM" clock at 0x10 that may belong to a
//!   YM2413, YM2612 or YM2151. The chip is identified later from the first
//!   FM opcode; see [`VgmHeader::fm_autodetect_clock`].
use std::fmt;

use tracing::{info, warn};

use crate::binutil::{read_slice, read_u8_at, read_u16_le_at, read_u32_le_at};
use crate::chip::{ChipKind, ClockTier};
use crate::error::{ReplayError, Result};

pub const VGM_IDENT: &[u8; 4] = b"Vgm ";

/// Smallest image that still holds the legacy header.
pub const VGM_MIN_HEADER_SIZE: usize = 0x40;

/// Command-stream start for files before 1.50 (and for a zero data offset).
pub const VGM_LEGACY_DATA_START: usize = 0x40;

/// Non-clock header fields and their on-disk offsets.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VgmHeaderField {
    Ident,
    EofOffset,
    Version,
    Gd3Offset,
    TotalSamples,
    LoopOffset,
    LoopSamples,
    SampleRate,
    SnFeedback,
    SnShiftWidth,
    DataOffset,
    SegaPcmInterface,
}

impl VgmHeaderField {
    pub const fn offset(self) -> usize {
        match self {
            VgmHeaderField::Ident => 0x00,
            VgmHeaderField::EofOffset => 0x04,
            VgmHeaderField::Version => 0x08,
            VgmHeaderField::Gd3Offset => 0x14,
            VgmHeaderField::TotalSamples => 0x18,
            VgmHeaderField::LoopOffset => 0x1C,
            VgmHeaderField::LoopSamples => 0x20,
            VgmHeaderField::SampleRate => 0x24,
            VgmHeaderField::SnFeedback => 0x28,
            VgmHeaderField::SnShiftWidth => 0x2A,
            VgmHeaderField::DataOffset => 0x34,
            VgmHeaderField::SegaPcmInterface => 0x3C,
        }
    }
}

fn to_bcd(v: u8) -> u16 {
    (u16::from(v / 10) << 4) | u16::from(v % 10)
}

/// BCD-coded file version; `0x0171` is "1.71".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VgmVersion(u16);

impl VgmVersion {
    /// Keep the low 16 bits of the 32-bit header field.
    pub fn from_raw(raw: u32) -> Self {
        VgmVersion((raw & 0xFFFF) as u16)
    }

    pub fn raw(self) -> u16 {
        self.0
    }

    /// BCD-aware `>=` against a decimal `major.minor`.
    pub fn at_least(self, major: u8, minor: u8) -> bool {
        self.0 >= (to_bcd(major) << 8) | to_bcd(minor)
    }

    pub fn major(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn minor(self) -> u8 {
        (self.0 & 0xFF) as u8
    }
}

impl fmt::Display for VgmVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}.{:02x}", self.major(), self.minor())
    }
}

/// Decoded VGM header.
///
/// All offsets are absolute positions in the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VgmHeader {
    pub version: VgmVersion,
    pub eof_offset: u32,
    pub total_samples: u32,
    pub loop_samples: u32,
    pub rate: u32,
    /// First byte of the command stream.
    pub data_start: usize,
    pub loop_offset: Option<usize>,
    pub gd3_offset: Option<usize>,
    /// Raw clock field per chip (flag bits included), 0 when absent or gated.
    clocks: [u32; ChipKind::COUNT],
    /// Raw 0x10 value of a pre-1.10 file, waiting for an FM opcode to
    /// identify its chip. 0 when not applicable.
    pub fm_autodetect_clock: u32,
    /// `(noise_feedback << 16) | (shift_register_width << 8)`.
    pub sn76489_flags: u32,
    pub segapcm_interface: u32,
}

impl VgmHeader {
    /// Raw clock field for `kind` (0 = not present).
    pub fn clock(&self, kind: ChipKind) -> u32 {
        self.clocks[kind.index()]
    }

    /// Chips with a non-zero clock field, in slot order.
    pub fn chip_clocks(&self) -> impl Iterator<Item = (ChipKind, u32)> + '_ {
        ChipKind::ALL
            .into_iter()
            .map(|k| (k, self.clock(k)))
            .filter(|(_, c)| *c != 0)
    }

    pub fn has_fm_autodetect(&self) -> bool {
        self.fm_autodetect_clock != 0
    }
}

/// Command-stream start for `version`.
fn data_start(bytes: &[u8], version: VgmVersion) -> Result<usize> {
    if !version.at_least(1, 50) {
        return Ok(VGM_LEGACY_DATA_START);
    }
    let off = VgmHeaderField::DataOffset.offset();
    let rel = read_u32_le_at(bytes, off).map_err(|e| e.with_context("data offset"))?;
    if rel == 0 {
        return Ok(VGM_LEGACY_DATA_START);
    }
    Ok(off + rel as usize)
}

/// Resolve a header-relative pointer; 0 means "none".
fn relative_offset(bytes: &[u8], field: VgmHeaderField) -> Result<Option<usize>> {
    let off = field.offset();
    let rel = read_u32_le_at(bytes, off)?;
    Ok((rel != 0).then(|| off + rel as usize))
}

/// Whether a 32-bit field of `tier` at `offset` may be read at all.
fn should_read(version: VgmVersion, data_start: usize, tier: ClockTier, offset: usize) -> bool {
    let (major, minor) = tier.min_version();
    if !version.at_least(major, minor) {
        return false;
    }
    !tier.requires_header_space() || offset + 4 <= data_start
}

fn read_gated(
    bytes: &[u8],
    version: VgmVersion,
    data_start: usize,
    tier: ClockTier,
    offset: usize,
) -> u32 {
    if !should_read(version, data_start, tier, offset) {
        return 0;
    }
    // a header shorter than its own data offset claims reads as absent
    read_u32_le_at(bytes, offset).unwrap_or(0)
}

/// Parse and validate the header of a complete VGM image.
///
/// Fails with [`ReplayError::HeaderTooShort`] below 64 bytes and with
/// [`ReplayError::InvalidIdent`] when the image does not start with `"Vgm "`.
pub fn parse_header(bytes: &[u8]) -> Result<VgmHeader> {
    if bytes.len() < VGM_MIN_HEADER_SIZE {
        return Err(ReplayError::HeaderTooShort { len: bytes.len() });
    }
    let ident = read_slice(bytes, 0, 4)?;
    if ident != VGM_IDENT {
        let mut id = [0u8; 4];
        id.copy_from_slice(ident);
        return Err(ReplayError::InvalidIdent(id));
    }

    let version = VgmVersion::from_raw(read_u32_le_at(bytes, VgmHeaderField::Version.offset())?);
    if version.at_least(1, 70) {
        warn!("VGM version {} is newer than supported, playing anyway", version);
    } else {
        info!("VGM version {}", version);
    }

    let data_start = data_start(bytes, version)?;
    let loop_offset = relative_offset(bytes, VgmHeaderField::LoopOffset)?;
    let gd3_offset = relative_offset(bytes, VgmHeaderField::Gd3Offset)?;

    let mut clocks = [0u32; ChipKind::COUNT];
    for kind in ChipKind::ALL {
        clocks[kind.index()] = read_gated(
            bytes,
            version,
            data_start,
            kind.tier(),
            kind.clock_offset(),
        );
    }

    let mut fm_autodetect_clock = 0;
    if !version.at_least(1, 10) {
        fm_autodetect_clock = read_u32_le_at(bytes, ChipKind::Ym2413.clock_offset())?;
    }

    let sn76489_flags = if version.at_least(1, 10) {
        let feedback = u32::from(read_u16_le_at(bytes, VgmHeaderField::SnFeedback.offset())?);
        let width = u32::from(read_u8_at(bytes, VgmHeaderField::SnShiftWidth.offset())?);
        (feedback << 16) | (width << 8)
    } else {
        (0x0009 << 16) | (16 << 8)
    };

    let segapcm_interface = read_gated(
        bytes,
        version,
        data_start,
        ClockTier::V151,
        VgmHeaderField::SegaPcmInterface.offset(),
    );

    Ok(VgmHeader {
        version,
        eof_offset: read_u32_le_at(bytes, VgmHeaderField::EofOffset.offset())?,
        total_samples: read_u32_le_at(bytes, VgmHeaderField::TotalSamples.offset())?,
        loop_samples: read_u32_le_at(bytes, VgmHeaderField::LoopSamples.offset())?,
        rate: read_u32_le_at(bytes, VgmHeaderField::SampleRate.offset())?,
        data_start,
        loop_offset,
        gd3_offset,
        clocks,
        fm_autodetect_clock,
        sn76489_flags,
        segapcm_interface,
    })
}
