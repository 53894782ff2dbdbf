//! Session facade over a loaded VGM image.
//!
//! A [`VgmPlayer`] owns the decompressed image, its parsed header, the
//! command decoder (with the chip rack and PCM pool behind it) and the
//! lazily parsed GD3 tag. The caller drives it:
//!
//! ```no_run
//! use vgmreplay::{DecodeStep, VgmPlayer};
//!
//! # fn run(bytes: Vec<u8>) -> vgmreplay::Result<()> {
//! let mut player = VgmPlayer::load(bytes)?;
//! let mut pcm = Vec::new();
//! loop {
//!     match player.decode_step()? {
//!         DecodeStep::Wait(n) => player.render(n, |frame| pcm.push(frame)),
//!         DecodeStep::EndOfStream => break,
//!     }
//! }
//! # Ok(())
//! # }
//! ```
use crate::chip::{BuiltinEngines, ChipKind, EngineFactory, Instance, StereoFrame};
use crate::error::Result;
use crate::meta::{Gd3, Gd3Cache};
use crate::vgm::decoder::{CommandDecoder, DecodeStep};
use crate::vgm::header::{VgmHeader, VgmVersion, parse_header};

#[derive(Debug)]
pub struct VgmPlayer {
    data: Vec<u8>,
    header: VgmHeader,
    decoder: CommandDecoder,
    gd3: Gd3Cache,
}

impl VgmPlayer {
    /// Load an image with the bundled engines.
    pub fn load(data: Vec<u8>) -> Result<Self> {
        Self::load_with(data, BuiltinEngines)
    }

    /// Load an image, creating chip engines through `factory`.
    ///
    /// Fails with a format error when the header is too short or the
    /// identifier is wrong; no player is created in that case.
    pub fn load_with<F>(data: Vec<u8>, factory: F) -> Result<Self>
    where
        F: EngineFactory + 'static,
    {
        let header = parse_header(&data)?;
        let decoder = CommandDecoder::new(&header, Box::new(factory));
        Ok(VgmPlayer {
            data,
            header,
            decoder,
            gd3: Gd3Cache::new(),
        })
    }

    /// Execute one command.
    pub fn decode_step(&mut self) -> Result<DecodeStep> {
        self.decoder.step(&self.data)
    }

    /// Produce one mixed output frame.
    pub fn tick(&mut self) -> StereoFrame {
        self.decoder.rack_mut().mix()
    }

    /// Produce `frames` output frames, handing each to `sink`.
    pub fn render<S>(&mut self, frames: u32, mut sink: S)
    where
        S: FnMut(StereoFrame),
    {
        for _ in 0..frames {
            sink(self.tick());
        }
    }

    pub fn is_end_of_stream(&self) -> bool {
        self.decoder.is_end_of_stream()
    }

    pub fn is_terminated(&self) -> bool {
        self.decoder.state().terminated
    }

    /// Absolute loop target, if the file loops.
    pub fn loop_offset(&self) -> Option<usize> {
        self.header.loop_offset
    }

    pub fn seek_loop(&mut self, offset: usize) {
        self.decoder.seek_loop(offset);
    }

    /// GD3 tag, parsed on first use and cached afterwards.
    pub fn tag(&self) -> Result<Option<&Gd3>> {
        self.gd3.get_or_parse(&self.data, self.header.gd3_offset)
    }

    pub fn header(&self) -> &VgmHeader {
        &self.header
    }

    pub fn version(&self) -> VgmVersion {
        self.header.version
    }

    /// Offset of the next command.
    pub fn position(&self) -> usize {
        self.decoder.position()
    }

    /// Every active chip instance with its clock in Hz.
    pub fn chips(&self) -> Vec<(ChipKind, Instance, u32)> {
        self.decoder.rack().active_chips()
    }

    /// Mute or unmute one chip instance.
    pub fn set_output_enabled(&mut self, kind: ChipKind, instance: Instance, enabled: bool) {
        self.decoder
            .rack_mut()
            .adapter_mut(kind, instance)
            .set_output_enabled(enabled);
    }

    pub fn decoder(&self) -> &CommandDecoder {
        &self.decoder
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}
