use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use comfy_table::{Cell, ContentArrangement, Table, presets::NOTHING};
use flate2::read::GzDecoder;
use tracing::{info, warn};
use unicode_width::UnicodeWidthStr;
use vgmreplay::chip::{CLOCK_MASK, ChipKind, Instance, OUTPUT_SAMPLE_RATE};
use vgmreplay::{DecodeStep, VgmPlayer};

/// Pad a &str to a target display width (columns) using unicode-width so
/// fullwidth GD3 text (e.g. Japanese titles) lines up.
fn pad_to_width(s: &str, width: usize) -> String {
    let w = UnicodeWidthStr::width(s);
    if w >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - w))
    }
}

/// Read a VGM file, or stdin for `-`, inflating gzip (.vgz) input.
pub fn read_vgm_as_vec(path: &PathBuf) -> Result<Vec<u8>> {
    let data = if path.as_os_str() == "-" {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        fs::read(path).with_context(|| format!("failed to read file: {}", path.display()))?
    };

    // Detect gzip by extension or by header (0x1f 0x8b)
    let is_gzip = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.eq_ignore_ascii_case("vgz") || s.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
        || (data.len() >= 2 && data[0] == 0x1f && data[1] == 0x8b);

    if is_gzip {
        let mut decoder = GzDecoder::new(Cursor::new(data));
        let mut out = Vec::new();
        decoder
            .read_to_end(&mut out)
            .context("gzip decompression failed")?;
        Ok(out)
    } else {
        Ok(data)
    }
}

fn format_duration(samples: u32) -> String {
    let secs = samples / OUTPUT_SAMPLE_RATE;
    let frac = (samples % OUTPUT_SAMPLE_RATE) * 100 / OUTPUT_SAMPLE_RATE;
    format!("{}:{:02}.{:02}", secs / 60, secs % 60, frac)
}

/// Print header, chip and GD3 summary.
pub fn info(path: &Path, bytes: Vec<u8>) -> Result<()> {
    let size = bytes.len();
    let player = VgmPlayer::load(bytes)
        .with_context(|| format!("failed to load VGM: {}", path.display()))?;
    let header = player.header();

    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![Cell::new("Field"), Cell::new("Value")]);
    table.add_row(vec![
        Cell::new("File"),
        Cell::new(format!("{} ({} bytes)", path.display(), size)),
    ]);
    table.add_row(vec![
        Cell::new("Version"),
        Cell::new(header.version.to_string()),
    ]);
    table.add_row(vec![
        Cell::new("Data start"),
        Cell::new(format!("0x{:X}", header.data_start)),
    ]);
    table.add_row(vec![
        Cell::new("Length"),
        Cell::new(format_duration(header.total_samples)),
    ]);
    let looping = match header.loop_offset {
        Some(off) => format!("0x{:X}, {}", off, format_duration(header.loop_samples)),
        None => "none".to_string(),
    };
    table.add_row(vec![Cell::new("Loop"), Cell::new(looping)]);
    if header.rate != 0 {
        table.add_row(vec![
            Cell::new("Rate"),
            Cell::new(format!("{} Hz", header.rate)),
        ]);
    }
    for (kind, instance, clock) in player.chips() {
        let name = match instance {
            Instance::Primary => kind.to_string(),
            Instance::Secondary => format!("{} #2", kind),
        };
        table.add_row(vec![Cell::new(name), Cell::new(format!("{} Hz", clock))]);
    }
    if header.has_fm_autodetect() {
        table.add_row(vec![
            Cell::new("FM (pre-1.10)"),
            Cell::new(format!("{} Hz", header.fm_autodetect_clock & CLOCK_MASK)),
        ]);
    }
    println!("{table}");

    match player.tag() {
        Ok(Some(tag)) => {
            println!();
            let fields: Vec<(&str, String)> = tag
                .fields()
                .iter()
                .filter(|(_, t)| !t.is_empty())
                .map(|(k, t)| (*k, t.to_string_lossy()))
                .collect();
            let col0 = fields
                .iter()
                .map(|(k, _)| UnicodeWidthStr::width(*k))
                .max()
                .unwrap_or(0);
            for (key, text) in fields {
                for (i, line) in text.lines().enumerate() {
                    let label = if i == 0 { key } else { "" };
                    println!("{}  {}", pad_to_width(label, col0), line);
                }
            }
        }
        Ok(None) => println!("\nno GD3 tag"),
        Err(e) => warn!("GD3 tag unreadable: {}", e),
    }
    Ok(())
}

pub struct RenderOptions {
    pub loops: u32,
    pub mute: Vec<String>,
    pub max_seconds: Option<u32>,
}

/// Parse `NAME` or `NAME:2` into a chip instance.
fn parse_mute(arg: &str) -> Result<(ChipKind, Instance)> {
    let (name, instance) = match arg.split_once(':') {
        Some((name, "1")) => (name, Instance::Primary),
        Some((name, "2")) => (name, Instance::Secondary),
        Some((_, other)) => bail!("invalid chip instance '{}' (use 1 or 2)", other),
        None => (arg, Instance::Primary),
    };
    let kind = ChipKind::from_name(name).ok_or_else(|| {
        let known: Vec<&str> = ChipKind::ALL.iter().map(|k| k.name()).collect();
        anyhow!("unknown chip '{}' (known: {})", name, known.join(", "))
    })?;
    Ok((kind, instance))
}

/// Render to a WAV file, jumping back to the loop point `options.loops`
/// times.
pub fn render(bytes: Vec<u8>, output: &Path, options: &RenderOptions) -> Result<()> {
    let mut player = VgmPlayer::load(bytes).context("failed to load VGM")?;
    for arg in &options.mute {
        let (kind, instance) = parse_mute(arg)?;
        player.set_output_enabled(kind, instance, false);
        info!("muted {} {:?}", kind, instance);
    }

    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: OUTPUT_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(output, spec)
        .with_context(|| format!("failed to create WAV file: {}", output.display()))?;

    let limit = options
        .max_seconds
        .map(|s| u64::from(s) * u64::from(OUTPUT_SAMPLE_RATE));
    let mut frames: u64 = 0;
    let mut loops_left = options.loops;
    let mut write_err = None;

    'play: loop {
        match player.decode_step().context("playback stopped")? {
            DecodeStep::Wait(n) => {
                let n = match limit {
                    Some(max) => u64::from(n).min(max.saturating_sub(frames)) as u32,
                    None => n,
                };
                player.render(n, |[l, r]| {
                    if write_err.is_none() {
                        if let Err(e) = writer.write_sample(l).and_then(|_| writer.write_sample(r))
                        {
                            write_err = Some(e);
                        }
                    }
                });
                if let Some(e) = write_err.take() {
                    return Err(e).context("failed to write sample");
                }
                frames += u64::from(n);
                if limit.is_some_and(|max| frames >= max) {
                    info!("reached time limit");
                    break 'play;
                }
            }
            DecodeStep::EndOfStream => match player.loop_offset() {
                Some(offset) if loops_left > 0 => {
                    loops_left -= 1;
                    player.seek_loop(offset);
                }
                _ => break 'play,
            },
        }
    }

    writer.finalize().context("failed to finalize WAV file")?;
    info!(
        "wrote {} ({} frames, {})",
        output.display(),
        frames,
        format_duration(frames.min(u64::from(u32::MAX)) as u32)
    );
    Ok(())
}
