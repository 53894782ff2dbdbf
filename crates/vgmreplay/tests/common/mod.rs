#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use vgmreplay::chip::{ChipEngine, ChipKind, RawFrame, RomKind};

/// Assembles VGM images byte by byte for tests.
pub struct ImageBuilder {
    version: u32,
    header: Vec<u8>,
    commands: Vec<u8>,
    loop_at: Option<usize>,
    gd3: Option<Vec<u8>>,
}

impl ImageBuilder {
    /// Header of 0x40 bytes before 1.50, 0x100 bytes from 1.50 on.
    pub fn new(version: u32) -> Self {
        let size = if version >= 0x150 { 0x100 } else { 0x40 };
        Self::with_header_size(version, size)
    }

    pub fn with_header_size(version: u32, size: usize) -> Self {
        let mut header = vec![0u8; size.max(0x40)];
        header[0..4].copy_from_slice(b"Vgm ");
        header[0x08..0x0C].copy_from_slice(&version.to_le_bytes());
        ImageBuilder {
            version,
            header,
            commands: Vec::new(),
            loop_at: None,
            gd3: None,
        }
    }

    pub fn header_u32(mut self, offset: usize, value: u32) -> Self {
        self.header[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        self
    }

    pub fn header_u16(mut self, offset: usize, value: u16) -> Self {
        self.header[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
        self
    }

    pub fn header_u8(mut self, offset: usize, value: u8) -> Self {
        self.header[offset] = value;
        self
    }

    pub fn clock(self, kind: ChipKind, value: u32) -> Self {
        self.header_u32(kind.clock_offset(), value)
    }

    pub fn cmd(mut self, bytes: &[u8]) -> Self {
        self.commands.extend_from_slice(bytes);
        self
    }

    /// Mark the current end of the command stream as the loop point.
    pub fn loop_here(mut self) -> Self {
        self.loop_at = Some(self.commands.len());
        self
    }

    /// Append a 0x67 data block.
    pub fn data_block(self, data_type: u8, size_field: u32, payload: &[u8]) -> Self {
        let mut bytes = vec![0x67, 0x66, data_type];
        bytes.extend_from_slice(&size_field.to_le_bytes());
        bytes.extend_from_slice(payload);
        self.cmd(&bytes)
    }

    pub fn gd3(mut self, fields: &[&str; 11]) -> Self {
        self.gd3 = Some(gd3_chunk(b"Gd3 ", 0x100, fields));
        self
    }

    pub fn raw_gd3(mut self, chunk: Vec<u8>) -> Self {
        self.gd3 = Some(chunk);
        self
    }

    pub fn data_start(&self) -> usize {
        self.header.len()
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = self.header;
        let start = out.len();
        if self.version >= 0x150 {
            let rel = (start - 0x34) as u32;
            out[0x34..0x38].copy_from_slice(&rel.to_le_bytes());
        }
        if let Some(at) = self.loop_at {
            let rel = (start + at - 0x1C) as u32;
            out[0x1C..0x20].copy_from_slice(&rel.to_le_bytes());
        }
        out.extend_from_slice(&self.commands);
        if let Some(gd3) = self.gd3 {
            let rel = (out.len() - 0x14) as u32;
            out[0x14..0x18].copy_from_slice(&rel.to_le_bytes());
            out.extend_from_slice(&gd3);
        }
        let eof = (out.len() - 4) as u32;
        out[0x04..0x08].copy_from_slice(&eof.to_le_bytes());
        out
    }
}

pub fn gd3_chunk(ident: &[u8; 4], version: u32, fields: &[&str; 11]) -> Vec<u8> {
    let mut body = Vec::new();
    for f in fields {
        for unit in f.encode_utf16().chain(std::iter::once(0)) {
            body.extend_from_slice(&unit.to_le_bytes());
        }
    }
    let mut chunk = Vec::new();
    chunk.extend_from_slice(ident);
    chunk.extend_from_slice(&version.to_le_bytes());
    chunk.extend_from_slice(&(body.len() as u32).to_le_bytes());
    chunk.extend_from_slice(&body);
    chunk
}

/// Everything a [`RecordingEngine`] observed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EngineLog {
    pub clock: Option<u32>,
    pub flags: Option<u32>,
    pub io: Vec<(u8, u8)>,
    pub rom: Vec<(RomKind, usize, usize, Vec<u8>)>,
    pub ram: Vec<(usize, Vec<u8>)>,
    pub ticks: u64,
}

pub type SharedLog = Arc<Mutex<EngineLog>>;

/// Engine that records every call and outputs a constant sample.
pub struct RecordingEngine {
    rate: u32,
    output: RawFrame,
    log: SharedLog,
}

impl RecordingEngine {
    pub fn new(rate: u32, output: RawFrame, log: SharedLog) -> Self {
        RecordingEngine { rate, output, log }
    }
}

impl ChipEngine for RecordingEngine {
    fn sample_rate(&self, _clock: u32) -> u32 {
        self.rate
    }

    fn init(&mut self, clock: u32) {
        self.log.lock().unwrap().clock = Some(clock);
    }

    fn configure(&mut self, flags: u32) {
        self.log.lock().unwrap().flags = Some(flags);
    }

    fn write_io(&mut self, port: u8, data: u8) {
        self.log.lock().unwrap().io.push((port, data));
    }

    fn clock(&mut self) {
        self.log.lock().unwrap().ticks += 1;
    }

    fn sample(&self) -> RawFrame {
        self.output
    }

    fn write_rom(&mut self, kind: RomKind, rom_size: usize, start: usize, data: &[u8]) {
        self.log
            .lock()
            .unwrap()
            .rom
            .push((kind, rom_size, start, data.to_vec()));
    }

    fn write_ram(&mut self, start: usize, data: &[u8]) {
        self.log.lock().unwrap().ram.push((start, data.to_vec()));
    }
}

/// One log per chip slot and instance, filled by [`recording_factory`].
#[derive(Clone, Default)]
pub struct Recorder {
    logs: Arc<Mutex<Vec<(ChipKind, SharedLog)>>>,
}

impl Recorder {
    /// Logs of every engine created for `kind`, in creation order
    /// (primary first).
    pub fn logs(&self, kind: ChipKind) -> Vec<EngineLog> {
        self.logs
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, l)| l.lock().unwrap().clone())
            .collect()
    }

    pub fn primary(&self, kind: ChipKind) -> EngineLog {
        self.logs(kind).into_iter().next().unwrap_or_default()
    }

    pub fn created(&self, kind: ChipKind) -> usize {
        self.logs(kind).len()
    }
}

/// Factory giving every chip a silent [`RecordingEngine`] running at the
/// output rate.
pub fn recording_factory(
    recorder: &Recorder,
) -> impl Fn(ChipKind) -> Box<dyn ChipEngine> + Send + 'static {
    let logs = recorder.logs.clone();
    move |kind: ChipKind| -> Box<dyn ChipEngine> {
        let log: SharedLog = Arc::default();
        logs.lock().unwrap().push((kind, log.clone()));
        Box::new(RecordingEngine::new(44_100, [0, 0], log))
    }
}
