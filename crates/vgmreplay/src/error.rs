//! Error type shared by the header detector, the command decoder and the
//! GD3 parser.
//!
//! Only conditions that end a session are errors. Forward-compatible
//! oddities in a file (unknown data-block types, compressed blocks, a GD3
//! block with the wrong magic, PCM reads past the end of a bank) are logged
//! and skipped by the decoder instead.

/// Errors produced while loading or replaying a VGM image.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    /// The image is shorter than the 64-byte minimum header.
    #[error("header too short: {len} bytes (need at least 64)")]
    HeaderTooShort { len: usize },

    /// The four-byte identifier at offset 0 is not `"Vgm "`.
    #[error("invalid ident: {0:02X?}")]
    InvalidIdent([u8; 4]),

    /// A read touched bytes outside the image.
    ///
    /// - `offset` is the first byte that was requested.
    /// - `needed` is the number of bytes the read required.
    /// - `available` is the image length.
    /// - `context` names the logical field being read, when known.
    #[error(
        "offset out of range{}: 0x{offset:X} (needed {needed} bytes, available {available})",
        context_suffix(.context)
    )]
    OffsetOutOfRange {
        offset: usize,
        needed: usize,
        available: usize,
        context: Option<&'static str>,
    },

    /// The command stream contains an opcode whose operand width is unknown.
    #[error("unknown opcode 0x{opcode:02X} at offset 0x{offset:X}")]
    UnknownOpcode { opcode: u8, offset: usize },

    /// A previous fatal error already ended this session.
    #[error("session terminated by an earlier fatal error")]
    Terminated,
}

impl ReplayError {
    /// True for errors raised while validating the header (`load` failures).
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            ReplayError::HeaderTooShort { .. } | ReplayError::InvalidIdent(_)
        )
    }

    pub(crate) fn with_context(self, ctx: &'static str) -> Self {
        match self {
            ReplayError::OffsetOutOfRange {
                offset,
                needed,
                available,
                ..
            } => ReplayError::OffsetOutOfRange {
                offset,
                needed,
                available,
                context: Some(ctx),
            },
            other => other,
        }
    }
}

fn context_suffix(context: &Option<&'static str>) -> String {
    match context {
        Some(c) => format!(" at {c}"),
        None => String::new(),
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ReplayError>;
