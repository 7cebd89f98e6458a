//! Tests for object framing: member ids, type ids, type indexes and
//! array lengths.

use flexbit::codec::FlexSerializer;
use flexbit::error::EncodeError;
use pretty_assertions::assert_eq;

fn reader(writer: FlexSerializer) -> FlexSerializer {
    FlexSerializer::from_bytes(writer.into_bytes())
}

// =============================================================================
// Member ids
// =============================================================================

#[test]
fn test_member_ids() {
    let ids = [0u16, 1, 2, 31, 32, 100, 511];

    let mut writer = FlexSerializer::new();
    for id in ids {
        writer.write_member_id(id).unwrap();
    }
    // Four short ids, three long ones.
    assert_eq!(writer.position(), 4 * 6 + 3 * 10);

    let mut reader = reader(writer);
    for id in ids {
        assert_eq!(reader.read_member_id().unwrap(), id);
    }
}

#[test]
fn test_member_id_out_of_range() {
    let mut writer = FlexSerializer::new();
    assert!(matches!(
        writer.write_member_id(512).unwrap_err(),
        EncodeError::OutOfRange { value: 512, max: 511, .. }
    ));
    assert_eq!(writer.position(), 0);
}

// =============================================================================
// Type ids and indexes
// =============================================================================

#[test]
fn test_type_ids() {
    let ids = [0u16, 127, 128, 32767];

    let mut writer = FlexSerializer::new();
    for id in ids {
        writer.write_type_id(id).unwrap();
    }
    assert_eq!(writer.position(), 2 * 8 + 2 * 16);
    assert!(writer.write_type_id(32768).is_err());

    let mut reader = reader(writer);
    for id in ids {
        assert_eq!(reader.read_type_id().unwrap(), id);
    }
}

#[test]
fn test_type_indexes() {
    let mut writer = FlexSerializer::new();
    writer.write_type_index(0).unwrap();
    writer.write_type_index(7).unwrap();
    writer.write_type_index(8).unwrap();
    writer.write_type_index(127).unwrap();
    assert_eq!(writer.position(), 4 + 4 + 8 + 8);
    assert!(writer.write_type_index(128).is_err());

    let mut reader = reader(writer);
    assert_eq!(reader.read_type_index().unwrap(), 0);
    assert_eq!(reader.read_type_index().unwrap(), 7);
    assert_eq!(reader.read_type_index().unwrap(), 8);
    assert_eq!(reader.read_type_index().unwrap(), 127);
}

// =============================================================================
// Array lengths
// =============================================================================

#[test]
fn test_array_lengths() {
    let lengths = [0usize, 15, 16, 255, 256, (1 << 20) - 1];

    let mut writer = FlexSerializer::new();
    for len in lengths {
        writer.write_array_length(Some(len)).unwrap();
    }
    assert_eq!(writer.position(), 2 * 5 + 2 * 10 + 2 * 22);

    let mut reader = reader(writer);
    for len in lengths {
        assert_eq!(reader.read_array_length().unwrap(), Some(len));
    }
}

#[test]
fn test_null_array_is_distinct_from_empty() {
    let mut writer = FlexSerializer::new();
    writer.write_array_length(None).unwrap();
    writer.write_array_length(Some(0)).unwrap();
    assert_eq!(writer.position(), 10 + 5);

    let mut reader = reader(writer);
    assert_eq!(reader.read_array_length().unwrap(), None);
    assert_eq!(reader.read_array_length().unwrap(), Some(0));
}

#[test]
fn test_array_length_out_of_range() {
    let mut writer = FlexSerializer::new();
    assert!(writer.write_array_length(Some(1 << 20)).is_err());
}

#[test]
fn test_framing_mixes_with_scalars() {
    let mut writer = FlexSerializer::new();
    writer.write_member_id(3).unwrap();
    writer.write_var_int(-5).unwrap();
    writer.write_member_id(0).unwrap();

    let mut reader = reader(writer);
    assert_eq!(reader.read_member_id().unwrap(), 3);
    assert_eq!(reader.read_var_int().unwrap(), -5);
    assert_eq!(reader.read_member_id().unwrap(), 0);
}
