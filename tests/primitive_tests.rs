//! Tests for the scalar encodings of the bit serializer.

use flexbit::codec::BitSerializer;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn reader(writer: BitSerializer) -> BitSerializer {
    BitSerializer::from_bytes(writer.into_bytes())
}

// =============================================================================
// Fixed-width integers
// =============================================================================

#[test]
fn test_signed_ints_with_explicit_widths() {
    let values: [(i64, u32); 3] = [(1891, 12), (-18151826, 30), (-15, 6)];

    let mut writer = BitSerializer::new();
    for (value, bits) in values {
        writer.write_int(value, bits).unwrap();
    }
    let mut reader = reader(writer);
    for (value, bits) in values {
        assert_eq!(reader.read_int(bits).unwrap(), value);
    }
}

#[test]
fn test_signed_int_extremes_fit_their_width() {
    let mut writer = BitSerializer::new();
    writer.write_int(i8::MIN as i64, 8).unwrap();
    writer.write_int(i8::MAX as i64, 8).unwrap();
    writer.write_int(i64::MIN, 64).unwrap();
    writer.write_int(i64::MAX, 64).unwrap();

    let mut reader = reader(writer);
    assert_eq!(reader.read_int(8).unwrap(), -128);
    assert_eq!(reader.read_int(8).unwrap(), 127);
    assert_eq!(reader.read_int(64).unwrap(), i64::MIN);
    assert_eq!(reader.read_int(64).unwrap(), i64::MAX);
}

#[test]
fn test_negative_one_is_sign_bit_only() {
    let mut writer = BitSerializer::new();
    writer.write_int(-1, 4).unwrap();
    // Sign bit set, magnitude !(-1) == 0.
    assert_eq!(writer.into_bytes(), vec![0b1000_0000]);
}

#[test]
fn test_bool_and_byte() {
    let mut writer = BitSerializer::new();
    writer.write_bool(true).unwrap();
    writer.write_byte(0xC3).unwrap();
    writer.write_bool(false).unwrap();

    let mut reader = reader(writer);
    assert!(reader.read_bool().unwrap());
    assert_eq!(reader.read_byte().unwrap(), 0xC3);
    assert!(!reader.read_bool().unwrap());
}

// =============================================================================
// Variable-width integers
// =============================================================================

#[test]
fn test_var_int_tiers() {
    let values = [17, 2896, -37899644, i32::MIN, i32::MAX, 0, -1];

    let mut writer = BitSerializer::new();
    for value in values {
        writer.write_var_int(value).unwrap();
    }
    let mut reader = reader(writer);
    for value in values {
        assert_eq!(reader.read_var_int().unwrap(), value);
    }
}

#[test]
fn test_var_int_small_values_take_ten_bits() {
    let mut writer = BitSerializer::new();
    writer.write_var_int(17).unwrap();
    assert_eq!(writer.position(), 10);
    writer.write_var_int(2896).unwrap();
    assert_eq!(writer.position(), 10 + 17);
}

#[test]
fn test_var_long_extremes() {
    let values = [0, 1, -1, 127, 128, i64::MIN, i64::MAX, -9876543210123];

    let mut writer = BitSerializer::new();
    for value in values {
        writer.write_var_long(value).unwrap();
    }
    let mut reader = reader(writer);
    for value in values {
        assert_eq!(reader.read_var_long().unwrap(), value);
    }
}

#[test]
fn test_var_long_rejects_endless_continuation() {
    let mut reader = BitSerializer::from_bytes(vec![0xFF; 16]);
    assert!(reader.read_var_long().is_err());
}

#[test]
fn test_enum_int_tiers() {
    let mut writer = BitSerializer::new();
    writer.write_enum_int(3).unwrap();
    assert_eq!(writer.position(), 5);
    writer.write_enum_int(700).unwrap();
    assert_eq!(writer.position(), 5 + 12);
    writer.write_enum_int(u32::MAX).unwrap();
    assert_eq!(writer.position(), 5 + 12 + 34);

    let mut reader = reader(writer);
    assert_eq!(reader.read_enum_int().unwrap(), 3);
    assert_eq!(reader.read_enum_int().unwrap(), 700);
    assert_eq!(reader.read_enum_int().unwrap(), u32::MAX);
}

// =============================================================================
// Floats
// =============================================================================

#[test]
fn test_lossless_floats_are_exact() {
    let mut writer = BitSerializer::new();
    writer.write_bool(true).unwrap();
    writer.write_float(-1586.123).unwrap();
    writer.write_double(std::f64::consts::PI).unwrap();
    writer.write_float(f32::NAN).unwrap();

    let mut reader = reader(writer);
    assert!(reader.read_bool().unwrap());
    assert_eq!(reader.read_float().unwrap(), -1586.123);
    assert_eq!(reader.read_double().unwrap(), std::f64::consts::PI);
    assert!(reader.read_float().unwrap().is_nan());
}

#[test]
fn test_float_bytes_are_little_endian() {
    let mut writer = BitSerializer::new();
    writer.write_float(1.0).unwrap();
    assert_eq!(&writer.into_bytes()[..4], &1.0f32.to_le_bytes());
}

#[test]
fn test_lossy_floats() {
    let cases: [(f32, f32); 5] = [
        (1.795, 1e-4),
        (0.00000145, 1e-5),
        (0.0125, 1e-5),
        (-1586.123, 0.0),
        (-3.5, 1e-3),
    ];

    let mut writer = BitSerializer::new();
    for (value, _) in cases {
        writer.write_lossy_float(value).unwrap();
    }
    let mut reader = reader(writer);
    for (value, tolerance) in cases {
        let decoded = reader.read_lossy_float().unwrap();
        assert!(
            (decoded - value).abs() <= tolerance,
            "{} decoded as {}",
            value,
            decoded
        );
    }
}

#[test]
fn test_lossy_float_out_of_range_is_lossless() {
    let mut writer = BitSerializer::new();
    writer.write_lossy_float(0.00000145).unwrap();
    // Selector plus the full 32-bit pattern.
    assert_eq!(writer.position(), 3 + 32);

    let mut reader = reader(writer);
    assert_eq!(reader.read_lossy_float().unwrap(), 0.00000145);
}

#[test]
fn test_lossy_float_nan_survives() {
    let mut writer = BitSerializer::new();
    writer.write_lossy_float(f32::NAN).unwrap();
    let mut reader = reader(writer);
    assert!(reader.read_lossy_float().unwrap().is_nan());
}

// =============================================================================
// Raw bytes
// =============================================================================

#[test]
fn test_raw_bytes_follow_the_bit_cursor() {
    let mut writer = BitSerializer::new();
    writer.write_bool(true).unwrap();
    writer.write_bytes(&[0xAB, 0x01]).unwrap();

    let bytes = writer.into_bytes();
    assert_eq!(bytes, vec![0b1101_0101, 0b1000_0000, 0b1000_0000]);

    let mut reader = BitSerializer::from_bytes(bytes);
    assert!(reader.read_bool().unwrap());
    assert_eq!(reader.read_bytes(2).unwrap(), vec![0xAB, 0x01]);
    assert!(reader.read_bytes(2).is_err());
}

// =============================================================================
// Property tests
// =============================================================================

proptest! {
    #[test]
    fn prop_var_int_round_trips(value in any::<i32>()) {
        let mut writer = BitSerializer::new();
        writer.write_var_int(value).unwrap();
        prop_assert_eq!(reader(writer).read_var_int().unwrap(), value);
    }

    #[test]
    fn prop_int_round_trips_at_minimal_width(value in any::<i32>()) {
        let magnitude = (if value < 0 { !value } else { value }) as u32;
        let bits = 1 + (32 - magnitude.leading_zeros()).max(1);
        let mut writer = BitSerializer::new();
        writer.write_int(value as i64, bits).unwrap();
        prop_assert_eq!(reader(writer).read_int(bits).unwrap(), value as i64);
    }

    #[test]
    fn prop_lossy_float_error_is_bounded(value in -1000.0f32..1000.0) {
        let mut writer = BitSerializer::new();
        writer.write_lossy_float(value).unwrap();
        let decoded = reader(writer).read_lossy_float().unwrap();
        prop_assert!((decoded - value).abs() <= 1.0 / 256.0 + f32::EPSILON * value.abs());
    }
}
