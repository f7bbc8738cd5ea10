use bzn::{BznFormat, FieldType, TokenStream};
use quickcheck_macros::quickcheck;

mod common;
use common::{BinBzn, TextBzn};

fn long_fixture() -> Vec<u8> {
    let mut file = TextBzn::bz1().field("version", FieldType::Long, "1022");
    for i in 0..24 {
        file = file.field("field", FieldType::Long, &i.to_string());
    }
    file.build()
}

#[quickcheck]
fn test_bookmark_restore_law(k: u8) -> bool {
    // push, any number of reads (even past the end), pop: the cursor and
    // the line tallies are exactly where they started
    let data = long_fixture();
    let mut stream = TokenStream::new(&data).unwrap();
    stream.read_token().unwrap();

    let pos = stream.position();
    let counts = stream.line_endings();
    stream.push_bookmark();
    for _ in 0..(k % 32) {
        let _ = stream.read_token();
    }
    stream.pop_bookmark();
    stream.position() == pos && stream.line_endings() == counts
}

#[test]
fn test_nested_bookmarks_restore_in_order() {
    let data = long_fixture();
    let mut stream = TokenStream::new(&data).unwrap();
    stream.read_token().unwrap();
    let outer = stream.position();

    stream.push_bookmark();
    stream.read_token().unwrap();
    let inner = stream.position();

    stream.push_bookmark();
    stream.read_token().unwrap();
    stream.read_token().unwrap();
    stream.pop_bookmark();
    assert_eq!(stream.position(), inner);

    stream.pop_bookmark();
    assert_eq!(stream.position(), outer);
}

#[test]
fn test_eof_tolerates_trailing_blank_lines() {
    let mut data = TextBzn::bz1().field("version", FieldType::Long, "1022").build();
    data.extend_from_slice(b"\r\n   \r\n\r\n");
    let mut stream = TokenStream::new(&data).unwrap();
    stream.read_token().unwrap();
    assert!(stream.is_eof());
}

#[test]
fn test_text_sized_string_truncates() {
    let data = TextBzn::bz2()
        .field("version", FieldType::Long, "1145")
        .field("msn_filename", FieldType::Char, "\"averylongmissionfilename\"")
        .build();
    let mut stream = TokenStream::new(&data).unwrap();
    stream.read_token().unwrap();
    let s = stream.read_sized_string("msn_filename", 16).unwrap();
    assert_eq!(s.as_deref(), Some("averylongmission"));
}

#[test]
fn test_bz2_binary_framing() {
    let data = BinBzn::bz2()
        .long("version", 1192)
        .boolean("binarySave", true)
        .ptr("path", 0x00c0_ffee)
        .build();
    let mut stream = TokenStream::new(&data).unwrap();
    assert_eq!(stream.format(), BznFormat::Battlezone2);
    assert_eq!(stream.version(), 1192);

    let tok = stream.read_token().unwrap();
    assert_eq!(tok.name(), Some("version"));
    let tok = stream.read_token().unwrap();
    assert!(tok.get_bool().unwrap());
    let tok = stream.read_token().unwrap();
    assert!(tok.validate(Some("path"), FieldType::Ptr));
    assert_eq!(tok.get_u32().unwrap(), 0x00c0_ffee);
    assert!(stream.is_eof());
}
