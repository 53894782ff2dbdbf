//! Little-endian byte readers used by the header detector and the command
//! decoder.
//!
//! Two flavours are provided:
//! - free functions (`read_u32_le_at` and friends) for random access at an
//!   absolute offset, used for header fields;
//! - [`Cursor`], a sequential reader whose `imm_*` methods read the operand
//!   at the current position and advance past it, used for the command
//!   stream.
//!
//! Every read is bounds-checked and fails with
//! [`ReplayError::OffsetOutOfRange`] rather than panicking.
use crate::error::{ReplayError, Result};

fn out_of_range(bytes: &[u8], off: usize, needed: usize) -> ReplayError {
    ReplayError::OffsetOutOfRange {
        offset: off,
        needed,
        available: bytes.len(),
        context: None,
    }
}

/// Return a borrowed slice of length `len` starting at `off`.
pub fn read_slice(bytes: &[u8], off: usize, len: usize) -> Result<&[u8]> {
    match off.checked_add(len) {
        Some(end) if end <= bytes.len() => Ok(&bytes[off..end]),
        _ => Err(out_of_range(bytes, off, len)),
    }
}

/// Read a single byte at `off`.
pub fn read_u8_at(bytes: &[u8], off: usize) -> Result<u8> {
    bytes
        .get(off)
        .copied()
        .ok_or_else(|| out_of_range(bytes, off, 1))
}

/// Read a 16-bit little-endian value at `off`.
pub fn read_u16_le_at(bytes: &[u8], off: usize) -> Result<u16> {
    let s = read_slice(bytes, off, 2)?;
    Ok(u16::from_le_bytes([s[0], s[1]]))
}

/// Read a 24-bit little-endian value at `off`, returned in the low bits of
/// a `u32`.
///
/// VGM stores the offsets and lengths of the PCM RAM copy command (0x68) in
/// this width.
pub fn read_u24_le_at(bytes: &[u8], off: usize) -> Result<u32> {
    let s = read_slice(bytes, off, 3)?;
    Ok(u32::from(s[0]) | (u32::from(s[1]) << 8) | (u32::from(s[2]) << 16))
}

/// Read a 32-bit little-endian value at `off`.
pub fn read_u32_le_at(bytes: &[u8], off: usize) -> Result<u32> {
    let s = read_slice(bytes, off, 4)?;
    Ok(u32::from_le_bytes([s[0], s[1], s[2], s[3]]))
}

/// Sequential reader over an immutable byte image.
///
/// The position only moves forward through the `imm_*`/`skip` methods;
/// [`Cursor::seek`] is the single way to move it elsewhere (loop seeks).
/// A failed read leaves the position where it was.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(bytes: &'a [u8], pos: usize) -> Self {
        Cursor { bytes, pos }
    }

    /// Current read position (absolute offset into the image).
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Advance the position by `n` bytes without reading them.
    ///
    /// Skipping past the end of the image is allowed; the next read will
    /// report the overrun.
    pub fn skip(&mut self, n: usize) {
        self.pos = self.pos.saturating_add(n);
    }

    pub fn imm_u8(&mut self) -> Result<u8> {
        let v = read_u8_at(self.bytes, self.pos)?;
        self.pos += 1;
        Ok(v)
    }

    pub fn imm_u16(&mut self) -> Result<u16> {
        let v = read_u16_le_at(self.bytes, self.pos)?;
        self.pos += 2;
        Ok(v)
    }

    pub fn imm_u24(&mut self) -> Result<u32> {
        let v = read_u24_le_at(self.bytes, self.pos)?;
        self.pos += 3;
        Ok(v)
    }

    pub fn imm_u32(&mut self) -> Result<u32> {
        let v = read_u32_le_at(self.bytes, self.pos)?;
        self.pos += 4;
        Ok(v)
    }

    /// Borrow the next `len` bytes and advance past them.
    pub fn imm_slice(&mut self, len: usize) -> Result<&'a [u8]> {
        let s = read_slice(self.bytes, self.pos, len)?;
        self.pos += len;
        Ok(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_are_little_endian() {
        let bytes = [0x78, 0x56, 0x34, 0x12];
        assert_eq!(read_u16_le_at(&bytes, 0).unwrap(), 0x5678);
        assert_eq!(read_u24_le_at(&bytes, 1).unwrap(), 0x123456);
        assert_eq!(read_u32_le_at(&bytes, 0).unwrap(), 0x1234_5678);
    }

    #[test]
    fn overrun_reports_offset_and_width() {
        let bytes = [0u8; 3];
        match read_u32_le_at(&bytes, 1) {
            Err(ReplayError::OffsetOutOfRange {
                offset,
                needed,
                available,
                ..
            }) => {
                assert_eq!((offset, needed, available), (1, 4, 3));
            }
            other => panic!("expected OffsetOutOfRange, got {:?}", other),
        }
        // offset arithmetic must not wrap
        assert!(read_slice(&bytes, usize::MAX, 2).is_err());
    }

    #[test]
    fn cursor_does_not_move_on_failed_read() {
        let bytes = [0x01, 0x02, 0x03];
        let mut c = Cursor::new(&bytes, 0);
        assert_eq!(c.imm_u8().unwrap(), 0x01);
        assert_eq!(c.imm_u16().unwrap(), 0x0302);
        assert!(c.imm_u8().is_err());
        assert_eq!(c.position(), 3);
    }
}
