//! Build a tiny SN76489 VGM image in memory and render it.
//!
//! Plays a two-note square wave on tone channel 0, then prints the frame
//! count and peak level of the rendered audio.

use vgmreplay::{DecodeStep, VgmPlayer};

fn build_image() -> Vec<u8> {
    let mut image = vec![0u8; 0x40];
    image[0..4].copy_from_slice(b"Vgm ");
    image[0x08..0x0C].copy_from_slice(&0x0150u32.to_le_bytes());
    // NTSC Master System clock
    image[0x0C..0x10].copy_from_slice(&3_579_545u32.to_le_bytes());
    // data starts right after the 0x40-byte header
    image[0x34..0x38].copy_from_slice(&0x0Cu32.to_le_bytes());

    let notes: [u16; 2] = [0x1AC, 0x17D];
    for period in notes {
        // latch channel 0 tone low nibble, then the high six bits
        image.extend([0x50, 0x80 | (period & 0x0F) as u8]);
        image.extend([0x50, (period >> 4) as u8 & 0x3F]);
        // channel 0 at full volume
        image.extend([0x50, 0x90]);
        // wait 0x2B11 samples (about a quarter second)
        image.extend([0x61, 0x11, 0x2B]);
    }
    // silence
    image.extend([0x50, 0x9F, 0x66]);

    let eof = (image.len() - 4) as u32;
    image[0x04..0x08].copy_from_slice(&eof.to_le_bytes());
    image
}

fn main() {
    let mut player = match VgmPlayer::load(build_image()) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("load failed: {}", e);
            return;
        }
    };
    println!("VGM {} with {:?}", player.version(), player.chips());

    let mut frames = 0u64;
    let mut peak = 0i32;
    loop {
        match player.decode_step() {
            Ok(DecodeStep::Wait(n)) => player.render(n, |[l, r]| {
                frames += 1;
                peak = peak.max(i32::from(l).abs()).max(i32::from(r).abs());
            }),
            Ok(DecodeStep::EndOfStream) => break,
            Err(e) => {
                eprintln!("playback stopped: {}", e);
                break;
            }
        }
    }
    println!("rendered {} frames, peak {}", frames, peak);
}
