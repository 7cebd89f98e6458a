//! Tests for adaptive string encoding.

use flexbit::codec::string::string_encoder;
use flexbit::codec::BitSerializer;
use flexbit::error::EncodeError;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

const LIMERICK: &str = "There was a young lady of Peru\n\
                        Who dreamt she was eating her shoe.\n\
                        She awoke in the night\n\
                        With a terrible fright\n\
                        And found it was perfectly true!";

fn round_trip(s: &str) -> (String, usize) {
    let mut writer = BitSerializer::new();
    writer.write_string(s).unwrap();
    let bits = writer.position();
    let mut reader = BitSerializer::from_bytes(writer.into_bytes());
    (reader.read_string().unwrap(), bits)
}

// =============================================================================
// Round trips
// =============================================================================

#[test]
fn test_short_word() {
    let (decoded, bits) = round_trip("hello");
    assert_eq!(decoded, "hello");
    assert_eq!(string_encoder().select("hello").unwrap().selector(), 1);
    assert_eq!(bits, 3 + 8 + 5 * 4);
}

#[test]
fn test_multi_line_prose() {
    let (decoded, bits) = round_trip(LIMERICK);
    assert_eq!(decoded, LIMERICK);
    // Line breaks are only in the full ASCII table.
    assert_eq!(string_encoder().select(LIMERICK).unwrap().selector(), 7);
    assert_eq!(bits, 3 + 16 + LIMERICK.len() * 7);

    let one_line = LIMERICK.replace('\n', " ");
    assert_eq!(string_encoder().select(&one_line).unwrap().selector(), 3);
    assert_eq!(round_trip(&one_line).0, one_line);
}

#[test]
fn test_empty_string() {
    let (decoded, bits) = round_trip("");
    assert_eq!(decoded, "");
    assert_eq!(bits, 3 + 8);
}

#[test]
fn test_non_ascii_falls_back_to_utf8() {
    let s = "9SD)=js5adf09ü'*df0ß";
    assert!(string_encoder().select(s).is_none());

    let (decoded, bits) = round_trip(s);
    assert_eq!(decoded, s);
    assert_eq!(bits, 3 + 8 + s.len() * 8);
}

#[test]
fn test_long_string_uses_wide_length() {
    let s = "ab".repeat(100);
    let (decoded, bits) = round_trip(&s);
    assert_eq!(decoded, s);
    let set = string_encoder().select(&s).unwrap();
    assert_eq!(bits, 3 + 16 + s.len() * set.bits() as usize);
}

#[test]
fn test_control_characters_use_full_ascii() {
    let s = "tab\there\u{7}";
    let set = string_encoder().select(s).unwrap();
    assert_eq!(set.selector(), 7);
    assert_eq!(round_trip(s).0, s);
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_too_long_string_writes_nothing() {
    let s = "x".repeat(40_000);
    let mut writer = BitSerializer::new();
    let err = writer.write_string(&s).unwrap_err();
    assert!(matches!(
        err,
        EncodeError::StringTooLong {
            len: 40_000,
            max: 32767
        }
    ));
    assert_eq!(writer.position(), 0);
}

#[test]
fn test_invalid_utf8_is_rejected() {
    let mut writer = BitSerializer::new();
    writer.write_bits(0, 3).unwrap();
    writer.write_bits(0, 1).unwrap();
    writer.write_bits(2, 7).unwrap();
    writer.write_byte(0xC3).unwrap();
    writer.write_byte(0x28).unwrap();

    let mut reader = BitSerializer::from_bytes(writer.into_bytes());
    assert!(reader.read_string().is_err());
}

// =============================================================================
// Property tests
// =============================================================================

proptest! {
    #[test]
    fn prop_any_string_round_trips(s in "\\PC{0,64}") {
        prop_assert_eq!(round_trip(&s).0, s);
    }

    #[test]
    fn prop_ascii_never_costs_more_than_utf8(s in "[ -~]{1,64}") {
        let (_, bits) = round_trip(&s);
        prop_assert!(bits <= 3 + 8 + s.len() * 8);
    }
}
