use std::fmt;

/// Header version tier a clock field belongs to.
///
/// A field of a given tier is only meaningful when the file declares at
/// least that version. Fields from tier `V151` on also have to lie inside the
/// physical header (before the command stream starts) to be read at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ClockTier {
    /// Present in every VGM file.
    Legacy,
    /// VGM 1.10 and later.
    V110,
    /// VGM 1.51 and later.
    V151,
    /// VGM 1.61 and later.
    V161,
}

impl ClockTier {
    /// Minimum `(major, minor)` version that defines fields of this tier.
    pub fn min_version(self) -> (u8, u8) {
        match self {
            ClockTier::Legacy => (1, 0),
            ClockTier::V110 => (1, 10),
            ClockTier::V151 => (1, 51),
            ClockTier::V161 => (1, 61),
        }
    }

    /// Whether fields of this tier must fit before the command stream.
    pub fn requires_header_space(self) -> bool {
        self >= ClockTier::V151
    }
}

/// Sound chips the replayer can drive.
///
/// The discriminant is the slot index inside [`crate::chip::ChipRack`]; the
/// order is also the order in which chips are mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChipKind {
    Sn76489 = 0,
    Ym2413,
    Ym2612,
    Ym2151,
    SegaPcm,
    Ym2203,
    Ym2610,
    Ym3812,
    Ym3526,
    Y8950,
    Ymz280b,
    Rf5c68,
    Ymf262,
    MultiPcm,
}

impl ChipKind {
    pub const COUNT: usize = 14;

    pub const ALL: [ChipKind; ChipKind::COUNT] = [
        ChipKind::Sn76489,
        ChipKind::Ym2413,
        ChipKind::Ym2612,
        ChipKind::Ym2151,
        ChipKind::SegaPcm,
        ChipKind::Ym2203,
        ChipKind::Ym2610,
        ChipKind::Ym3812,
        ChipKind::Ym3526,
        ChipKind::Y8950,
        ChipKind::Ymz280b,
        ChipKind::Rf5c68,
        ChipKind::Ymf262,
        ChipKind::MultiPcm,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Offset of this chip's clock field in the VGM header.
    pub fn clock_offset(self) -> usize {
        match self {
            ChipKind::Sn76489 => 0x0C,
            ChipKind::Ym2413 => 0x10,
            ChipKind::Ym2612 => 0x2C,
            ChipKind::Ym2151 => 0x30,
            ChipKind::SegaPcm => 0x38,
            ChipKind::Rf5c68 => 0x40,
            ChipKind::Ym2203 => 0x44,
            ChipKind::Ym2610 => 0x4C,
            ChipKind::Ym3812 => 0x50,
            ChipKind::Ym3526 => 0x54,
            ChipKind::Y8950 => 0x58,
            ChipKind::Ymf262 => 0x5C,
            ChipKind::Ymz280b => 0x68,
            ChipKind::MultiPcm => 0x88,
        }
    }

    pub fn tier(self) -> ClockTier {
        match self {
            ChipKind::Sn76489 => ClockTier::Legacy,
            ChipKind::Ym2413 | ChipKind::Ym2612 | ChipKind::Ym2151 => ClockTier::V110,
            ChipKind::MultiPcm => ClockTier::V161,
            _ => ClockTier::V151,
        }
    }

    /// Master-clock divider giving the chip's native output rate.
    ///
    /// Used by [`crate::chip::SilentEngine`] to keep a placeholder engine
    /// ticking at a realistic rate.
    pub fn native_divider(self) -> u32 {
        match self {
            ChipKind::Sn76489 => 16,
            ChipKind::Ym2413 => 72,
            ChipKind::Ym2612 => 144,
            ChipKind::Ym2151 => 64,
            ChipKind::SegaPcm => 128,
            ChipKind::Ym2203 => 72,
            ChipKind::Ym2610 => 144,
            ChipKind::Ym3812 => 72,
            ChipKind::Ym3526 => 72,
            ChipKind::Y8950 => 72,
            ChipKind::Ymz280b => 384,
            ChipKind::Rf5c68 => 384,
            ChipKind::Ymf262 => 288,
            ChipKind::MultiPcm => 224,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ChipKind::Sn76489 => "SN76489",
            ChipKind::Ym2413 => "YM2413",
            ChipKind::Ym2612 => "YM2612",
            ChipKind::Ym2151 => "YM2151",
            ChipKind::SegaPcm => "SegaPCM",
            ChipKind::Ym2203 => "YM2203",
            ChipKind::Ym2610 => "YM2610",
            ChipKind::Ym3812 => "YM3812",
            ChipKind::Ym3526 => "YM3526",
            ChipKind::Y8950 => "Y8950",
            ChipKind::Ymz280b => "YMZ280B",
            ChipKind::Rf5c68 => "RF5C68",
            ChipKind::Ymf262 => "YMF262",
            ChipKind::MultiPcm => "MultiPCM",
        }
    }

    /// Case-insensitive lookup by [`ChipKind::name`].
    pub fn from_name(name: &str) -> Option<ChipKind> {
        ChipKind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for ChipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_index_matches_table_order() {
        for (i, k) in ChipKind::ALL.iter().enumerate() {
            assert_eq!(k.index(), i);
        }
    }

    #[test]
    fn from_name_ignores_case() {
        assert_eq!(ChipKind::from_name("ym2612"), Some(ChipKind::Ym2612));
        assert_eq!(ChipKind::from_name("multipcm"), Some(ChipKind::MultiPcm));
        assert_eq!(ChipKind::from_name("OPN9"), None);
    }
}
