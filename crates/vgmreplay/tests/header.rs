mod common;

use common::{ImageBuilder, Recorder, recording_factory};
use vgmreplay::chip::{ChipKind, Instance};
use vgmreplay::vgm::{VgmVersion, parse_header};
use vgmreplay::{ReplayError, VgmPlayer};

#[test]
fn version_compare_is_bcd() {
    let v160 = VgmVersion::from_raw(0x0160);
    assert!(v160.at_least(1, 60));
    assert!(!v160.at_least(1, 61));

    let v161 = VgmVersion::from_raw(0x0161);
    assert!(v161.at_least(1, 60));
    assert!(v161.at_least(1, 61));
    assert!(!v161.at_least(1, 70));

    // 0x0110 is 1.10, not 1.16
    let v110 = VgmVersion::from_raw(0x0110);
    assert!(v110.at_least(1, 10));
    assert!(!v110.at_least(1, 11));
    assert_eq!(v110.to_string(), "1.10");
}

#[test]
fn legacy_version_ignores_data_offset_field() {
    let bytes = ImageBuilder::new(0x0101)
        .header_u32(0x34, 0x0000_00CC)
        .cmd(&[0x66])
        .build();
    let header = parse_header(&bytes).unwrap();
    assert_eq!(header.data_start, 0x40);

    let player = VgmPlayer::load(bytes).unwrap();
    assert_eq!(player.position(), 0x40);
}

#[test]
fn data_offset_is_header_relative_from_150() {
    let bytes = ImageBuilder::with_header_size(0x0150, 0x80)
        .cmd(&[0x66])
        .build();
    assert_eq!(parse_header(&bytes).unwrap().data_start, 0x80);
}

#[test]
fn zero_data_offset_falls_back_to_legacy_start() {
    let mut bytes = ImageBuilder::with_header_size(0x0151, 0x40)
        .cmd(&[0x66])
        .build();
    bytes[0x34..0x38].copy_from_slice(&[0, 0, 0, 0]);
    assert_eq!(parse_header(&bytes).unwrap().data_start, 0x40);
}

#[test]
fn tier3_field_past_command_start_reads_zero() {
    // command bytes overlap the RF5C68 (0x40) and YM2610 (0x4C) fields
    let mut cmds = vec![0x61, 0x44, 0xAC];
    cmds.extend_from_slice(&[0x62; 16]);
    cmds.push(0x66);
    let bytes = ImageBuilder::with_header_size(0x0151, 0x40)
        .cmd(&cmds)
        .build();
    let header = parse_header(&bytes).unwrap();
    assert_eq!(header.data_start, 0x40);
    assert_eq!(header.clock(ChipKind::Rf5c68), 0);
    assert_eq!(header.clock(ChipKind::Ym2610), 0);
    assert_eq!(header.clock(ChipKind::Ymz280b), 0);
}

#[test]
fn tier3_field_inside_header_is_read() {
    let bytes = ImageBuilder::with_header_size(0x0151, 0x80)
        .clock(ChipKind::Ym2203, 3_993_600)
        .clock(ChipKind::Ymz280b, 16_934_400)
        .cmd(&[0x66])
        .build();
    let header = parse_header(&bytes).unwrap();
    assert_eq!(header.clock(ChipKind::Ym2203), 3_993_600);
    assert_eq!(header.clock(ChipKind::Ymz280b), 16_934_400);
}

#[test]
fn clock_fields_are_version_gated() {
    let bytes = ImageBuilder::new(0x0150)
        .clock(ChipKind::SegaPcm, 4_000_000)
        .clock(ChipKind::Ym2612, 7_670_453)
        .clock(ChipKind::MultiPcm, 8_053_975)
        .cmd(&[0x66])
        .build();
    let header = parse_header(&bytes).unwrap();
    assert_eq!(header.clock(ChipKind::SegaPcm), 0);
    assert_eq!(header.clock(ChipKind::Ym2612), 7_670_453);
    assert_eq!(header.clock(ChipKind::MultiPcm), 0);

    let bytes = ImageBuilder::new(0x0161)
        .clock(ChipKind::MultiPcm, 8_053_975)
        .cmd(&[0x66])
        .build();
    assert_eq!(
        parse_header(&bytes).unwrap().clock(ChipKind::MultiPcm),
        8_053_975
    );
}

#[test]
fn legacy_fm_clock_waits_for_autodetect() {
    let bytes = ImageBuilder::new(0x0101)
        .clock(ChipKind::Sn76489, 3_579_545)
        .header_u32(0x10, 7_670_453)
        .cmd(&[0x66])
        .build();
    let header = parse_header(&bytes).unwrap();
    assert_eq!(header.clock(ChipKind::Sn76489), 3_579_545);
    assert_eq!(header.clock(ChipKind::Ym2413), 0);
    assert!(header.has_fm_autodetect());
    assert_eq!(header.fm_autodetect_clock, 7_670_453);

    let player = VgmPlayer::load(bytes).unwrap();
    assert!(player.decoder().state().fm_autodetect);
    assert_eq!(
        player.chips(),
        vec![(ChipKind::Sn76489, Instance::Primary, 3_579_545)]
    );
}

#[test]
fn sn76489_flags_follow_version() {
    let old = ImageBuilder::new(0x0101)
        .header_u16(0x28, 0x0003)
        .header_u8(0x2A, 15)
        .cmd(&[0x66])
        .build();
    assert_eq!(parse_header(&old).unwrap().sn76489_flags, (0x0009 << 16) | (16 << 8));

    let new = ImageBuilder::new(0x0110)
        .header_u16(0x28, 0x0003)
        .header_u8(0x2A, 15)
        .cmd(&[0x66])
        .build();
    assert_eq!(parse_header(&new).unwrap().sn76489_flags, (0x0003 << 16) | (15 << 8));
}

#[test]
fn chips_are_configured_from_header() {
    let recorder = Recorder::default();
    let bytes = ImageBuilder::new(0x0151)
        .clock(ChipKind::Sn76489, 3_579_545)
        .header_u16(0x28, 0x0006)
        .header_u8(0x2A, 16)
        .clock(ChipKind::SegaPcm, 4_000_000)
        .header_u32(0x3C, 0x0000_F80D)
        .cmd(&[0x66])
        .build();
    let _player = VgmPlayer::load_with(bytes, recording_factory(&recorder)).unwrap();

    let sn = recorder.primary(ChipKind::Sn76489);
    assert_eq!(sn.clock, Some(3_579_545));
    assert_eq!(sn.flags, Some((0x0006 << 16) | (16 << 8)));
    let spcm = recorder.primary(ChipKind::SegaPcm);
    assert_eq!(spcm.flags, Some(0x0000_F80D));
}

#[test]
fn dual_flag_activates_second_instance_with_masked_clock() {
    let recorder = Recorder::default();
    let bytes = ImageBuilder::new(0x0151)
        .clock(ChipKind::Ym2612, 7_670_453 | 0x4000_0000)
        .clock(ChipKind::Ym2151, 3_579_545 | 0x8000_0000)
        .cmd(&[0x66])
        .build();
    let player = VgmPlayer::load_with(bytes, recording_factory(&recorder)).unwrap();

    let opn2 = recorder.logs(ChipKind::Ym2612);
    assert_eq!(opn2.len(), 2);
    assert!(opn2.iter().all(|l| l.clock == Some(7_670_453)));

    // bit 31 is not the dual flag
    let opm = recorder.logs(ChipKind::Ym2151);
    assert_eq!(opm.len(), 1);
    assert_eq!(opm[0].clock, Some(3_579_545));

    assert_eq!(
        player.chips(),
        vec![
            (ChipKind::Ym2612, Instance::Primary, 7_670_453),
            (ChipKind::Ym2612, Instance::Secondary, 7_670_453),
            (ChipKind::Ym2151, Instance::Primary, 3_579_545),
        ]
    );
}

#[test]
fn optional_offsets_are_absent_when_zero() {
    let bytes = ImageBuilder::new(0x0150).cmd(&[0x66]).build();
    let header = parse_header(&bytes).unwrap();
    assert_eq!(header.loop_offset, None);
    assert_eq!(header.gd3_offset, None);

    let bytes = ImageBuilder::new(0x0150)
        .cmd(&[0x62])
        .loop_here()
        .cmd(&[0x63, 0x66])
        .build();
    assert_eq!(parse_header(&bytes).unwrap().loop_offset, Some(0x101));
}

#[test]
fn short_or_foreign_images_are_rejected() {
    match VgmPlayer::load(vec![0u8; 63]) {
        Err(e @ ReplayError::HeaderTooShort { len: 63 }) => assert!(e.is_format_error()),
        other => panic!("expected HeaderTooShort, got {:?}", other.map(|_| ())),
    }

    let mut bytes = ImageBuilder::new(0x0150).cmd(&[0x66]).build();
    bytes[0..4].copy_from_slice(b"RIFF");
    match VgmPlayer::load(bytes) {
        Err(ReplayError::InvalidIdent(id)) => assert_eq!(&id, b"RIFF"),
        other => panic!("expected InvalidIdent, got {:?}", other.map(|_| ())),
    }
}
