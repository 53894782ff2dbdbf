//! PCM data pool filled by uncompressed-stream data blocks.
use tracing::debug;

/// Number of banks; a bank is addressed by the low six bits of a type byte.
pub const PCM_BANK_COUNT: usize = 64;

/// Bank read by the YM2612 DAC opcodes (0x80-0x8F).
pub const YM2612_DAC_BANK: u8 = 0x00;

/// 64 independently growable byte banks.
///
/// Banks only grow: a data block appends to the end of its bank and nothing
/// ever shrinks one during a session.
#[derive(Debug, Clone)]
pub struct PcmPool {
    banks: [Vec<u8>; PCM_BANK_COUNT],
}

impl Default for PcmPool {
    fn default() -> Self {
        PcmPool::new()
    }
}

impl PcmPool {
    pub fn new() -> Self {
        PcmPool {
            banks: std::array::from_fn(|_| Vec::new()),
        }
    }

    fn bank_index(bank: u8) -> usize {
        usize::from(bank) % PCM_BANK_COUNT
    }

    /// Bytes of `bank`, masked to a valid index.
    pub fn bank(&self, bank: u8) -> &[u8] {
        &self.banks[Self::bank_index(bank)]
    }

    pub fn append(&mut self, bank: u8, data: &[u8]) {
        let b = &mut self.banks[Self::bank_index(bank)];
        b.extend_from_slice(data);
        debug!("PCM bank 0x{:02X}: +{} bytes, now {}", bank, data.len(), b.len());
    }

    pub fn byte_at(&self, bank: u8, pos: usize) -> Option<u8> {
        self.bank(bank).get(pos).copied()
    }

    /// Up to `len` bytes of `bank` starting at `start`.
    ///
    /// Returns `None` when `start` is at or past the end of the bank. A range
    /// that runs past the end is clamped; the second value tells whether that
    /// happened.
    pub fn copy_range(&self, bank: u8, start: usize, len: usize) -> Option<(&[u8], bool)> {
        let data = self.bank(bank);
        if start >= data.len() {
            return None;
        }
        let available = data.len() - start;
        let clamped = len > available;
        let end = start + len.min(available);
        Some((&data[start..end], clamped))
    }

    pub fn len(&self, bank: u8) -> usize {
        self.bank(bank).len()
    }

    pub fn is_empty(&self) -> bool {
        self.banks.iter().all(Vec::is_empty)
    }
}
