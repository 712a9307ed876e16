//! Locating fields by number without decoding the rest of a message.

use alloc::vec::Vec;

use crate::slice_reader::SliceReader;
use crate::wire::{read_header, read_len_prefixed, skip_field};
use crate::{DecodeError, WireType};

/// Scans `buf` field by field until the first field with number `field_number`.
///
/// Returns the bytes directly after the field's tag (i.e. the still encoded value, including
/// its length prefix if it has one, followed by the rest of the message) and the wire type
/// of the field. Only the first occurrence is found.
///
/// ## Example
///
/// ```
/// use bufpath::{extract_field, WireType};
/// use bufpath::wire::{decode_by_wire_type, parse_string};
///
/// // name = "John" (field 1), age = 123 (field 2)
/// let data = [0x0a, 0x04, 0x4a, 0x6f, 0x68, 0x6e, 0x10, 0x7b];
///
/// let (value, wire_type) = extract_field(&data, 2).unwrap();
/// assert_eq!(wire_type, WireType::Varint);
/// assert_eq!(decode_by_wire_type(wire_type, value).unwrap(), (123, 1));
///
/// let (value, _) = extract_field(&data, 1).unwrap();
/// assert_eq!(parse_string(value).unwrap(), "John");
///
/// assert!(extract_field(&data, 3).is_err());
/// ```
pub fn extract_field(buf: &[u8], field_number: u32) -> Result<(&[u8], WireType), DecodeError> {
    let mut reader = SliceReader::new(buf);
    while !reader.is_empty() {
        let start = reader.rest();
        let header = read_header(&mut reader)?;
        if header.field_number == field_number {
            return Ok((reader.rest(), header.wire_type));
        }
        reader = SliceReader::new(start);
        reader.skip(skip_field(start)?)?;
    }
    Err(DecodeError::FieldNotFound(field_number))
}

/// Follows a path of field numbers into nested messages.
///
/// `path[0]` is looked up in `buf`. Every further number is looked up inside the embedded
/// message found at the previous step, which must be length-prefixed. The result is the same
/// as [`extract_field`] returns for the last step.
///
/// ## Example
///
/// ```
/// use bufpath::{extract_path, parse_string};
///
/// // title = "COO" (field 1), person = { name = "Mr. Marmot" (field 1) } (field 2)
/// let data = [
///     0x0a, 0x03, 0x43, 0x4f, 0x4f,
///     0x12, 0x0c, 0x0a, 0x0a, 0x4d, 0x72, 0x2e, 0x20, 0x4d, 0x61, 0x72, 0x6d, 0x6f, 0x74,
/// ];
/// let (value, _) = extract_path(&data, &[2, 1]).unwrap();
/// assert_eq!(parse_string(value).unwrap(), "Mr. Marmot");
/// ```
pub fn extract_path<'a>(buf: &'a [u8], path: &[u32]) -> Result<(&'a [u8], WireType), DecodeError> {
    let Some((&first, rest)) = path.split_first() else {
        return Err(DecodeError::EmptyPath);
    };

    let mut found = extract_field(buf, first)?;
    for &field_number in rest {
        let (raw, wire_type) = found;
        if wire_type != WireType::LengthPrefixed {
            return Err(DecodeError::UnexpectedWireType {
                expected: WireType::LengthPrefixed,
                found: wire_type,
            });
        }
        let embedded = read_len_prefixed(&mut SliceReader::new(raw))?;
        found = extract_field(embedded, field_number)?;
    }
    Ok(found)
}

/// Finds the first field in wire order whose number is one of `candidates`.
///
/// This models `oneof` groups: at most one member is expected to be set. If several are
/// present, the one encoded first wins regardless of its position in `candidates`.
///
/// Returns the encoded value as [`extract_field`] does, its wire type and the matched
/// field number.
///
/// ## Example
///
/// ```
/// use bufpath::one_of;
///
/// // field 3 = 1, then field 2 = 1
/// let data = [0x18, 0x01, 0x10, 0x01];
/// let (_, _, field_number) = one_of(&data, &[2, 3, 4]).unwrap();
/// assert_eq!(field_number, 3);
/// ```
pub fn one_of<'a>(
    buf: &'a [u8],
    candidates: &[u32],
) -> Result<(&'a [u8], WireType, u32), DecodeError> {
    let mut reader = SliceReader::new(buf);
    while !reader.is_empty() {
        let start = reader.rest();
        let header = read_header(&mut reader)?;
        if candidates.contains(&header.field_number) {
            return Ok((reader.rest(), header.wire_type, header.field_number));
        }
        reader = SliceReader::new(start);
        reader.skip(skip_field(start)?)?;
    }
    Err(DecodeError::NoneFound(Vec::from(candidates)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::Writer;
    use crate::TagError;
    use crate::wire::{decode_by_wire_type, parse_bytes_field, parse_string, unzigzag};
    use alloc::vec;
    use hex_literal::hex;
    use proptest::prelude::*;

    fn person_john() -> Writer {
        Writer::new()
            .append_string(1, "John")
            .append_int32(2, 123)
            .append_string(3, "john@doe.com")
    }

    #[test]
    fn extract_field_works() {
        let data = person_john().into_vec();

        let (value, wire_type) = extract_field(&data, 1).unwrap();
        assert_eq!(wire_type, WireType::LengthPrefixed);
        assert_eq!(parse_string(value).unwrap(), "John");

        let (value, wire_type) = extract_field(&data, 2).unwrap();
        assert_eq!(wire_type, WireType::Varint);
        assert_eq!(decode_by_wire_type(wire_type, value).unwrap().0 as i32, 123);

        let (value, _) = extract_field(&data, 3).unwrap();
        assert_eq!(parse_string(value).unwrap(), "john@doe.com");
        // the view reaches to the end of the buffer
        assert_eq!(value.len(), 13);

        assert_eq!(
            extract_field(&data, 4).unwrap_err(),
            DecodeError::FieldNotFound(4)
        );
        assert_eq!(
            extract_field(&[], 1).unwrap_err(),
            DecodeError::FieldNotFound(1)
        );
    }

    #[test]
    fn extract_field_returns_first_occurrence() {
        let data = Writer::new()
            .append_uint64(7, 42)
            .append_uint64(7, 150)
            .into_vec();
        let (value, wire_type) = extract_field(&data, 7).unwrap();
        assert_eq!(decode_by_wire_type(wire_type, value).unwrap(), (42, 1));
    }

    #[test]
    fn extract_field_skips_every_wire_type() {
        let data = Writer::new()
            .append_uint64(1, u64::MAX)
            .append_fixed64(2, 17)
            .append_bytes(3, [0xF0, 0x00])
            .append_group(4, &Writer::new().append_uint64(1, 9).append_fixed32(2, 3))
            .append_fixed32(5, 77)
            .append_string(6, "target")
            .into_vec();
        let (value, _) = extract_field(&data, 6).unwrap();
        assert_eq!(parse_string(value).unwrap(), "target");

        // field 1 inside the group is not confused with the top level field 1
        let (value, wire_type) = extract_field(&data, 5).unwrap();
        assert_eq!(decode_by_wire_type(wire_type, value).unwrap(), (77, 4));
    }

    #[test]
    fn extract_field_handles_errors() {
        // malformed field before the target
        let data = hex!("0a 05 7472 1001");
        assert_eq!(
            extract_field(&data, 2).unwrap_err(),
            DecodeError::UnexpectedEndOfBuffer
        );

        // field number 0
        assert_eq!(
            extract_field(&hex!("00 01"), 1).unwrap_err(),
            DecodeError::MalformedTag(TagError::FieldNumber {
                field_number: 0,
                wire_type: 0
            })
        );
    }

    #[test]
    fn extract_field_sees_fields_after_an_inner_group_end() {
        // group 1 { group 5 { 6 = 1 } 7 = 2 } 4 = 1
        let nested = Writer::new()
            .append_group(5, &Writer::new().append_uint64(6, 1))
            .append_uint64(7, 2);
        let data = Writer::new()
            .append_group(1, &nested)
            .append_uint64(4, 1)
            .into_vec();

        // the first end marker closes the group, so field 7 is at the top level
        let (value, wire_type) = extract_field(&data, 7).unwrap();
        assert_eq!(decode_by_wire_type(wire_type, value).unwrap(), (2, 1));
        let (value, wire_type) = extract_field(&data, 4).unwrap();
        assert_eq!(decode_by_wire_type(wire_type, value).unwrap(), (1, 1));
        assert_eq!(
            extract_field(&data, 6).unwrap_err(),
            DecodeError::FieldNotFound(6)
        );
    }

    #[test]
    fn extract_path_works() {
        let data = Writer::new()
            .append_string(1, "COO")
            .append_message(
                2,
                &Writer::new()
                    .append_string(1, "Mr. Marmot")
                    .append_int32(2, -37),
            )
            .into_vec();

        let (value, _) = extract_path(&data, &[1]).unwrap();
        assert_eq!(parse_string(value).unwrap(), "COO");

        let (value, _) = extract_path(&data, &[2, 1]).unwrap();
        assert_eq!(parse_string(value).unwrap(), "Mr. Marmot");

        let (value, wire_type) = extract_path(&data, &[2, 2]).unwrap();
        assert_eq!(decode_by_wire_type(wire_type, value).unwrap().0 as i32, -37);

        assert_eq!(
            extract_path(&data, &[2, 3]).unwrap_err(),
            DecodeError::FieldNotFound(3)
        );
        assert_eq!(
            extract_path(&data, &[3, 1]).unwrap_err(),
            DecodeError::FieldNotFound(3)
        );
        assert_eq!(extract_path(&data, &[]).unwrap_err(), DecodeError::EmptyPath);
    }

    #[test]
    fn extract_path_only_descends_into_length_prefixed_fields() {
        let data = person_john().into_vec();
        assert_eq!(
            extract_path(&data, &[2, 1]).unwrap_err(),
            DecodeError::UnexpectedWireType {
                expected: WireType::LengthPrefixed,
                found: WireType::Varint
            }
        );

        let data = Writer::new().append_fixed64(1, 0x0a).into_vec();
        assert_eq!(
            extract_path(&data, &[1, 1]).unwrap_err(),
            DecodeError::UnexpectedWireType {
                expected: WireType::LengthPrefixed,
                found: WireType::Fixed64
            }
        );
    }

    #[test]
    fn extract_path_stays_inside_the_embedded_message() {
        // field 5 exists at the top level but not in the embedded message
        let data = Writer::new()
            .append_message(1, &Writer::new().append_uint64(2, 1))
            .append_uint64(5, 3)
            .into_vec();
        assert_eq!(
            extract_path(&data, &[1, 5]).unwrap_err(),
            DecodeError::FieldNotFound(5)
        );
    }

    #[test]
    fn extract_path_works_three_levels_deep() {
        let data = Writer::new()
            .append_message(
                1,
                &Writer::new().append_message(
                    2,
                    &Writer::new().append_sint64(3, -835).append_bytes(4, b"deep"),
                ),
            )
            .into_vec();

        let (value, wire_type) = extract_path(&data, &[1, 2, 3]).unwrap();
        let (raw, _) = decode_by_wire_type(wire_type, value).unwrap();
        assert_eq!(unzigzag(raw), -835);

        let (value, _) = extract_path(&data, &[1, 2, 4]).unwrap();
        assert_eq!(parse_bytes_field(value).unwrap(), b"deep");
    }

    #[test]
    fn one_of_uses_wire_order() {
        let data = Writer::new()
            .append_uint64(1, 5)
            .append_string(3, "three")
            .append_string(2, "two")
            .into_vec();

        let (value, wire_type, field_number) = one_of(&data, &[2, 3, 4]).unwrap();
        assert_eq!(field_number, 3);
        assert_eq!(wire_type, WireType::LengthPrefixed);
        assert_eq!(parse_string(value).unwrap(), "three");

        let (_, _, field_number) = one_of(&data, &[4, 2]).unwrap();
        assert_eq!(field_number, 2);

        assert_eq!(
            one_of(&data, &[6, 7]).unwrap_err(),
            DecodeError::NoneFound(vec![6, 7])
        );
    }

    proptest! {
        #[test]
        fn extract_field_is_repeatable(
            values in proptest::collection::vec((1u32..20, any::<u64>(), ".{0,8}"), 1..10),
            target in 1u32..20,
        ) {
            let mut writer = Writer::new();
            for (field_number, number, text) in &values {
                writer = if number % 2 == 0 {
                    writer.append_uint64(*field_number, *number)
                } else {
                    writer.append_string(*field_number, text)
                };
            }
            let data = writer.into_vec();
            let copy = data.clone();

            let first = extract_field(&data, target);
            let second = extract_field(&data, target);
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(&data, &copy);

            let expected = values.iter().any(|(field_number, _, _)| *field_number == target);
            prop_assert_eq!(first.is_ok(), expected);
        }
    }
}
