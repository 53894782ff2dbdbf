mod common;

use common::ImageBuilder;
use vgmreplay::chip::{ChipKind, Instance};
use vgmreplay::{DecodeStep, ReplayError, VgmPlayer};

const PSG_CLOCK: u32 = 3_579_545;

/// Channel 0 tone at full volume, then `wait` samples.
fn psg_tone(wait: u16) -> ImageBuilder {
    let [lo, hi] = wait.to_le_bytes();
    ImageBuilder::new(0x0150)
        .clock(ChipKind::Sn76489, PSG_CLOCK)
        .cmd(&[0x50, 0x8E, 0x50, 0x0F, 0x50, 0x90])
        .cmd(&[0x61, lo, hi])
}

/// Decode and render until the end of the stream, looping `loops` times.
fn render_all(player: &mut VgmPlayer, mut loops: u32) -> Vec<[i16; 2]> {
    let mut out = Vec::new();
    loop {
        match player.decode_step().unwrap() {
            DecodeStep::Wait(n) => player.render(n, |f| out.push(f)),
            DecodeStep::EndOfStream => match player.loop_offset() {
                Some(offset) if loops > 0 => {
                    loops -= 1;
                    player.seek_loop(offset);
                }
                _ => break,
            },
        }
    }
    out
}

#[test]
fn builtin_psg_produces_audio() {
    let bytes = psg_tone(4_410).cmd(&[0x66]).build();
    let mut player = VgmPlayer::load(bytes).unwrap();
    assert_eq!(
        player.chips(),
        vec![(ChipKind::Sn76489, Instance::Primary, PSG_CLOCK)]
    );

    let frames = render_all(&mut player, 0);
    assert_eq!(frames.len(), 4_410);
    assert!(frames.iter().any(|f| f[0] > 0));
    assert!(frames.iter().any(|f| f[0] < 0));
    assert!(player.is_end_of_stream());
    assert!(!player.is_terminated());
}

#[test]
fn muted_chip_renders_silence() {
    let bytes = psg_tone(1_000).cmd(&[0x66]).build();
    let mut player = VgmPlayer::load(bytes).unwrap();
    player.set_output_enabled(ChipKind::Sn76489, Instance::Primary, false);
    let frames = render_all(&mut player, 0);
    assert_eq!(frames.len(), 1_000);
    assert!(frames.iter().all(|f| *f == [0, 0]));
}

#[test]
fn loop_replays_the_loop_section() {
    let bytes = psg_tone(100)
        .loop_here()
        .cmd(&[0x62, 0x66])
        .build();
    let mut player = VgmPlayer::load(bytes).unwrap();
    let frames = render_all(&mut player, 2);
    assert_eq!(frames.len(), 100 + 735 * 3);
}

#[test]
fn steps_after_fatal_error_report_terminated() {
    let bytes = psg_tone(10).cmd(&[0x00]).build();
    let mut player = VgmPlayer::load(bytes).unwrap();
    assert_eq!(player.decode_step().unwrap(), DecodeStep::Wait(0));
    assert_eq!(player.decode_step().unwrap(), DecodeStep::Wait(0));
    assert_eq!(player.decode_step().unwrap(), DecodeStep::Wait(0));
    assert_eq!(player.decode_step().unwrap(), DecodeStep::Wait(10));
    assert!(matches!(
        player.decode_step(),
        Err(ReplayError::UnknownOpcode { opcode: 0x00, .. })
    ));
    assert!(player.is_terminated());
    assert!(matches!(player.decode_step(), Err(ReplayError::Terminated)));
    // the mixer still runs and stays silent-safe
    let _ = player.tick();
}

#[test]
fn load_rejects_bad_images() {
    assert!(matches!(
        VgmPlayer::load(vec![0u8; 0x20]),
        Err(ReplayError::HeaderTooShort { len: 0x20 })
    ));
    let mut bytes = psg_tone(1).build();
    bytes[0] = b'X';
    assert!(matches!(
        VgmPlayer::load(bytes),
        Err(ReplayError::InvalidIdent(_))
    ));
}
