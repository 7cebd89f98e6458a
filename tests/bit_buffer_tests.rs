//! Tests for the raw bit buffer.

use flexbit::codec::{BitBuffer, Mode};
use flexbit::error::BufferError;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

// =============================================================================
// Round trips
// =============================================================================

#[test]
fn test_write_read_mixed_widths() {
    let values: [(u64, u32); 5] = [
        (123, 7),
        (1337, 13),
        (69, 9),
        (21, 6),
        (123456789876543210, 59),
    ];

    let mut writer = BitBuffer::new();
    for (value, bits) in values {
        writer.write(value, bits).unwrap();
    }
    // 94 bits round up to 12 bytes.
    let bytes = writer.into_bytes();
    assert_eq!(bytes.len(), 12);

    let mut reader = BitBuffer::from_bytes(bytes);
    for (value, bits) in values {
        assert_eq!(reader.read(bits).unwrap(), value);
    }
}

#[test]
fn test_msb_first_layout() {
    let mut writer = BitBuffer::new();
    writer.write(0b101, 3).unwrap();
    writer.write(0b1, 1).unwrap();
    assert_eq!(writer.bytes(), &[0b1011_0000]);
}

#[test]
fn test_byte_aligned_output_keeps_trailing_zero() {
    let mut writer = BitBuffer::new();
    writer.write(0xAB, 8).unwrap();
    assert_eq!(writer.into_bytes(), vec![0xAB, 0x00]);
}

#[test]
fn test_write_skip_reserves_zeros() {
    let mut writer = BitBuffer::new();
    writer.write(1, 1).unwrap();
    writer.skip(70).unwrap();
    writer.write(1, 1).unwrap();
    assert_eq!(writer.position(), 72);

    let mut reader = BitBuffer::from_bytes(writer.into_bytes());
    assert_eq!(reader.read(1).unwrap(), 1);
    reader.skip(70).unwrap();
    assert_eq!(reader.read(1).unwrap(), 1);
}

#[test]
fn test_remaining_bits_and_last_byte() {
    let mut reader = BitBuffer::from_bytes(vec![0xFF, 0x0F]);
    assert_eq!(reader.mode(), Mode::Read);
    assert_eq!(reader.remaining_bits(), 16);
    assert!(!reader.last_byte());
    reader.read(8).unwrap();
    assert!(reader.last_byte());
    assert_eq!(reader.read(4).unwrap(), 0);
    assert_eq!(reader.remaining_bits(), 4);
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_errors_are_distinct() {
    let mut reader = BitBuffer::from_bytes(vec![0u8]);
    assert_eq!(
        reader.write(1, 1).unwrap_err(),
        BufferError::WrongMode {
            expected: Mode::Write,
            actual: Mode::Read
        }
    );
    assert!(matches!(
        reader.read(9).unwrap_err(),
        BufferError::OutOfBounds { .. }
    ));
    assert_eq!(reader.read(65).unwrap_err(), BufferError::WidthTooLarge(65));

    let mut writer = BitBuffer::new();
    writer.write(3, 2).unwrap();
    let _ = writer.bytes();
    assert!(writer.is_closed());
    assert_eq!(writer.write(1, 1).unwrap_err(), BufferError::Closed);
    assert_eq!(
        writer.read(1).unwrap_err(),
        BufferError::WrongMode {
            expected: Mode::Read,
            actual: Mode::Write
        }
    );
}

#[test]
fn test_failed_read_does_not_move_cursor() {
    let mut reader = BitBuffer::from_bytes(vec![0xA5]);
    reader.read(3).unwrap();
    assert!(reader.read(6).is_err());
    assert_eq!(reader.position(), 3);
    assert_eq!(reader.read(5).unwrap(), 0b00101);
}

// =============================================================================
// Property tests
// =============================================================================

proptest! {
    #[test]
    fn prop_any_width_round_trips(
        entries in prop::collection::vec((any::<u64>(), 1u32..=64), 1..40)
    ) {
        let mut writer = BitBuffer::new();
        for &(value, bits) in &entries {
            writer.write(value, bits).unwrap();
        }
        let mut reader = BitBuffer::from_bytes(writer.into_bytes());
        for &(value, bits) in &entries {
            let mask = if bits == 64 { u64::MAX } else { (1u64 << bits) - 1 };
            prop_assert_eq!(reader.read(bits).unwrap(), value & mask);
        }
    }
}
