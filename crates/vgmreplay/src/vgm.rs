//! VGM file handling: header detection, command parsing and the replay
//! session built on top of them.
pub mod command;
pub mod decoder;
pub mod detail;
pub mod header;
pub mod parser;
pub mod pcm;
mod player;

pub use decoder::{CommandDecoder, DecodeStep, PlaybackState};
pub use header::{VgmHeader, VgmHeaderField, VgmVersion, parse_header};
pub use player::VgmPlayer;
