//! GD3 metadata parsing.
//!
//! The GD3 chunk consists of a four-byte identifier (`"Gd3 "`), a 32-bit
//! little-endian version (only 1.00, `0x00000100`, is accepted), a 32-bit
//! little-endian data length, and eleven zero-terminated UTF-16LE strings in
//! a fixed order.
//!
//! A missing chunk, a wrong identifier or an unknown version are not errors:
//! the tag is simply reported as absent. Only a chunk that runs off the end
//! of the file fails, with [`ReplayError::OffsetOutOfRange`].
use std::cell::OnceCell;
use std::fmt;

use tracing::warn;

use crate::binutil::{read_slice, read_u16_le_at, read_u32_le_at};
use crate::error::{ReplayError, Result};

pub const GD3_IDENT: &[u8; 4] = b"Gd3 ";
pub const GD3_VERSION: u32 = 0x0000_0100;

/// Number of text fields in a GD3 chunk.
pub const GD3_FIELD_COUNT: usize = 11;

/// One GD3 text field as stored: UTF-16 code units including the
/// terminating zero unit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Gd3Text(Vec<u16>);

impl Gd3Text {
    pub fn from_units(units: Vec<u16>) -> Self {
        Gd3Text(units)
    }

    /// Code units exactly as read, terminator included.
    pub fn units(&self) -> &[u16] {
        &self.0
    }

    /// Code units without the terminator.
    pub fn text_units(&self) -> &[u16] {
        match self.0.split_last() {
            Some((0, rest)) => rest,
            _ => &self.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text_units().is_empty()
    }

    /// Decode for display, replacing unpaired surrogates.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf16_lossy(self.text_units())
    }
}

impl fmt::Display for Gd3Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Gd3 {
    pub track_name_en: Gd3Text,
    pub track_name_jp: Gd3Text,
    pub game_name_en: Gd3Text,
    pub game_name_jp: Gd3Text,
    pub system_name_en: Gd3Text,
    pub system_name_jp: Gd3Text,
    pub author_name_en: Gd3Text,
    pub author_name_jp: Gd3Text,
    pub release_date: Gd3Text,
    pub converter: Gd3Text,
    pub notes: Gd3Text,
    /// Data length as declared by the chunk. Strings are scanned by their
    /// terminators, not bounded by this value.
    pub data_len: u32,
}

impl Gd3 {
    /// Fields paired with a stable key, in on-disk order.
    pub fn fields(&self) -> [(&'static str, &Gd3Text); GD3_FIELD_COUNT] {
        [
            ("track_name_en", &self.track_name_en),
            ("track_name_jp", &self.track_name_jp),
            ("game_name_en", &self.game_name_en),
            ("game_name_jp", &self.game_name_jp),
            ("system_name_en", &self.system_name_en),
            ("system_name_jp", &self.system_name_jp),
            ("author_name_en", &self.author_name_en),
            ("author_name_jp", &self.author_name_jp),
            ("release_date", &self.release_date),
            ("converter", &self.converter),
            ("notes", &self.notes),
        ]
    }
}

/// Read one zero-terminated UTF-16LE run starting at `*off`.
fn read_text(bytes: &[u8], off: &mut usize) -> Result<Gd3Text> {
    let mut units = Vec::new();
    loop {
        let unit = read_u16_le_at(bytes, *off)?;
        *off += 2;
        units.push(unit);
        if unit == 0 {
            return Ok(Gd3Text(units));
        }
    }
}

/// Parse the GD3 chunk at absolute offset `offset` of a whole VGM image.
///
/// Returns `Ok(None)` when `offset` is `None` or the identifier/version do
/// not match.
pub fn parse_gd3(bytes: &[u8], offset: Option<usize>) -> Result<Option<Gd3>> {
    let Some(start) = offset else {
        return Ok(None);
    };

    let ident = read_slice(bytes, start, 4).map_err(|e| e.with_context("gd3 ident"))?;
    if ident != GD3_IDENT {
        warn!("GD3 ident mismatch at 0x{:X}: {:02X?}", start, ident);
        return Ok(None);
    }
    let version = read_u32_le_at(bytes, start + 4).map_err(|e| e.with_context("gd3 version"))?;
    if version != GD3_VERSION {
        warn!("GD3 version mismatch: 0x{:08X}", version);
        return Ok(None);
    }
    let data_len = read_u32_le_at(bytes, start + 8).map_err(|e| e.with_context("gd3 length"))?;

    let mut off = start + 12;
    let mut next = || read_text(bytes, &mut off).map_err(|e| e.with_context("gd3 text"));
    Ok(Some(Gd3 {
        track_name_en: next()?,
        track_name_jp: next()?,
        game_name_en: next()?,
        game_name_jp: next()?,
        system_name_en: next()?,
        system_name_jp: next()?,
        author_name_en: next()?,
        author_name_jp: next()?,
        release_date: next()?,
        converter: next()?,
        notes: next()?,
        data_len,
    }))
}

/// Parse-once cache for a file's GD3 tag.
///
/// The first successful lookup, including a "not found" outcome, is
/// memoized. A lookup that fails with an error is not cached.
#[derive(Debug, Default)]
pub struct Gd3Cache {
    cell: OnceCell<Option<Gd3>>,
}

impl Gd3Cache {
    pub fn new() -> Self {
        Gd3Cache::default()
    }

    pub fn is_parsed(&self) -> bool {
        self.cell.get().is_some()
    }

    pub fn get_or_parse(&self, bytes: &[u8], offset: Option<usize>) -> Result<Option<&Gd3>> {
        if let Some(tag) = self.cell.get() {
            return Ok(tag.as_ref());
        }
        let parsed = parse_gd3(bytes, offset)?;
        Ok(self.cell.get_or_init(|| parsed).as_ref())
    }
}

impl TryFrom<&[u8]> for Gd3 {
    type Error = ReplayError;

    /// Parse a standalone GD3 chunk starting at offset 0. A chunk with the
    /// wrong identifier or version is reported as `InvalidIdent`.
    fn try_from(bytes: &[u8]) -> Result<Self> {
        match parse_gd3(bytes, Some(0))? {
            Some(tag) => Ok(tag),
            None => {
                let mut id = [0u8; 4];
                id.copy_from_slice(read_slice(bytes, 0, 4)?);
                Err(ReplayError::InvalidIdent(id))
            }
        }
    }
}
