mod common;

use common::{ImageBuilder, gd3_chunk};
use vgmreplay::meta::{Gd3, parse_gd3};
use vgmreplay::{ReplayError, VgmPlayer};

const FIELDS: [&str; 11] = [
    "Green Hill Zone",
    "グリーンヒルゾーン",
    "Sonic the Hedgehog",
    "ソニック・ザ・ヘッジホッグ",
    "Sega Mega Drive",
    "メガドライブ",
    "Masato Nakamura",
    "中村正人",
    "1991/07/26",
    "",
    "𝄞 notes with a surrogate pair",
];

fn utf16z(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

#[test]
fn fields_are_reproduced_in_order() {
    let bytes = ImageBuilder::new(0x0150)
        .cmd(&[0x66])
        .gd3(&FIELDS)
        .build();
    let player = VgmPlayer::load(bytes).unwrap();
    let tag = player.tag().unwrap().expect("GD3 should be found");

    for ((key, text), expected) in tag.fields().iter().zip(FIELDS) {
        assert_eq!(text.units(), utf16z(expected).as_slice(), "field {}", key);
        assert_eq!(text.to_string_lossy(), expected);
    }
    assert!(tag.converter.is_empty());
    assert_eq!(tag.track_name_en.to_string(), "Green Hill Zone");
}

#[test]
fn declared_length_is_recorded() {
    let chunk = gd3_chunk(b"Gd3 ", 0x100, &FIELDS);
    let declared = u32::from_le_bytes([chunk[8], chunk[9], chunk[10], chunk[11]]);
    let tag = Gd3::try_from(chunk.as_slice()).unwrap();
    assert_eq!(tag.data_len, declared);
    assert_eq!(tag.game_name_en.to_string_lossy(), "Sonic the Hedgehog");
}

#[test]
fn wrong_magic_or_version_is_not_found() {
    let bytes = ImageBuilder::new(0x0150)
        .cmd(&[0x66])
        .raw_gd3(gd3_chunk(b"GD3 ", 0x100, &FIELDS))
        .build();
    let player = VgmPlayer::load(bytes).unwrap();
    assert_eq!(player.tag().unwrap(), None);

    let bytes = ImageBuilder::new(0x0150)
        .cmd(&[0x66])
        .raw_gd3(gd3_chunk(b"Gd3 ", 0x200, &FIELDS))
        .build();
    let player = VgmPlayer::load(bytes).unwrap();
    assert_eq!(player.tag().unwrap(), None);

    match Gd3::try_from(gd3_chunk(b"XXXX", 0x100, &FIELDS).as_slice()) {
        Err(ReplayError::InvalidIdent(id)) => assert_eq!(&id, b"XXXX"),
        other => panic!("expected InvalidIdent, got {:?}", other),
    }
}

#[test]
fn missing_tag_is_not_found() {
    let bytes = ImageBuilder::new(0x0150).cmd(&[0x66]).build();
    let player = VgmPlayer::load(bytes).unwrap();
    assert_eq!(player.tag().unwrap(), None);
    assert_eq!(parse_gd3(player.data(), None).unwrap(), None);
}

#[test]
fn tag_is_parsed_once() {
    let bytes = ImageBuilder::new(0x0150)
        .cmd(&[0x66])
        .gd3(&FIELDS)
        .build();
    let player = VgmPlayer::load(bytes).unwrap();
    let first = player.tag().unwrap().unwrap() as *const Gd3;
    let second = player.tag().unwrap().unwrap() as *const Gd3;
    assert_eq!(first, second);
}

#[test]
fn unterminated_tag_is_out_of_range() {
    let mut chunk = gd3_chunk(b"Gd3 ", 0x100, &FIELDS);
    // drop the final terminator of "notes"
    chunk.truncate(chunk.len() - 2);
    let bytes = ImageBuilder::new(0x0150)
        .cmd(&[0x66])
        .raw_gd3(chunk)
        .build();
    let player = VgmPlayer::load(bytes).unwrap();
    assert!(matches!(
        player.tag(),
        Err(ReplayError::OffsetOutOfRange {
            context: Some("gd3 text"),
            ..
        })
    ));
    // a failed parse is not cached
    assert!(player.tag().is_err());
}
