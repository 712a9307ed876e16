//! Stateless decoding of the protobuf wire format.
//!
//! Every function here takes the bytes to read from and returns the decoded value together
//! with the number of bytes it consumed, so callers can advance a cursor without parsing twice.
//! Nothing is retained between calls.
//!
//! See <https://protobuf.dev/programming-guides/encoding/> for the format.

use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;

use crate::slice_reader::SliceReader;
use crate::varint::{from_zigzag64, read_unsigned_varint};
use crate::{DecodeError, TagError, WireType};

/// The largest valid field number (2^29 - 1).
pub const MAX_FIELD_NUMBER: u32 = 536_870_911;

/// A parsed field tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldHeader {
    /// Field number between 1 and [`MAX_FIELD_NUMBER`]
    pub field_number: u32,
    pub wire_type: WireType,
    /// Length of the encoded tag in bytes
    pub len: usize,
}

/// Parses the tag at the start of `buf`.
///
/// ## Example
///
/// ```
/// use bufpath::wire::parse_field_header;
/// use bufpath::WireType;
///
/// let header = parse_field_header(&[0x12, 0x02, 0x68, 0x69]).unwrap();
/// assert_eq!(header.field_number, 2);
/// assert_eq!(header.wire_type, WireType::LengthPrefixed);
/// assert_eq!(header.len, 1);
/// ```
pub fn parse_field_header(buf: &[u8]) -> Result<FieldHeader, DecodeError> {
    let mut reader = SliceReader::new(buf);
    read_header(&mut reader)
}

/// Reads an unsigned varint from the start of `buf`.
pub fn read_varint(buf: &[u8]) -> Result<(u64, usize), DecodeError> {
    let mut reader = SliceReader::new(buf);
    let value = read_unsigned_varint(&mut reader)?;
    Ok((value, reader.pos()))
}

/// Reads a little endian 64 bit value (fixed64, sfixed64, double).
pub fn decode_fixed64(buf: &[u8]) -> Result<(u64, usize), DecodeError> {
    let mut reader = SliceReader::new(buf);
    Ok((u64::from_le_bytes(reader.read_array()?), 8))
}

/// Reads a little endian 32 bit value (fixed32, sfixed32, float).
pub fn decode_fixed32(buf: &[u8]) -> Result<(u32, usize), DecodeError> {
    let mut reader = SliceReader::new(buf);
    Ok((u32::from_le_bytes(reader.read_array()?), 4))
}

/// Decodes a numeric value of the given wire type into a raw 64 bit word.
///
/// 32 bit values are zero-extended. Length-prefixed values and group markers are rejected with
/// [`DecodeError::NotScalar`].
pub fn decode_by_wire_type(wire_type: WireType, buf: &[u8]) -> Result<(u64, usize), DecodeError> {
    let mut reader = SliceReader::new(buf);
    let value = read_scalar(&mut reader, wire_type)?;
    Ok((value, reader.pos()))
}

/// Reads a length-prefixed value and returns the payload and the total bytes consumed
/// (length prefix plus payload).
pub fn read_length_prefixed(buf: &[u8]) -> Result<(&[u8], usize), DecodeError> {
    let mut reader = SliceReader::new(buf);
    let payload = read_len_prefixed(&mut reader)?;
    Ok((payload, reader.pos()))
}

/// Returns the number of bytes taken by the field starting at `buf`, header included.
///
/// A group is skipped up to its first end marker, which is not part of the count. Groups are
/// flat: a nested start marker does not open a new level, so the first end marker seen ends
/// the outer group. The end marker left in the data is skipped later as a field of its own.
///
/// ## Example
///
/// ```
/// use bufpath::wire::skip_field;
///
/// // field 1 = 150 (varint), followed by field 2
/// let data = [0x08, 0x96, 0x01, 0x10, 0x01];
/// assert_eq!(skip_field(&data).unwrap(), 3);
///
/// // group 1 { field 2 = 5 }, the end marker 0x0c is not counted
/// let group = [0x0b, 0x10, 0x05, 0x0c];
/// assert_eq!(skip_field(&group).unwrap(), 3);
/// ```
pub fn skip_field(buf: &[u8]) -> Result<usize, DecodeError> {
    let mut reader = SliceReader::new(buf);
    let header = read_header(&mut reader)?;
    match header.wire_type {
        WireType::StartGroup => loop {
            let mut next = reader;
            let inner = read_header(&mut next)?;
            match inner.wire_type {
                WireType::EndGroup => break,
                WireType::StartGroup => reader = next,
                other => {
                    reader = next;
                    skip_value(&mut reader, other)?;
                }
            }
        },
        other => skip_value(&mut reader, other)?,
    }
    Ok(reader.pos())
}

/// Undoes zig-zag encoding for values of type `sint32` and `sint64`.
///
/// The decoder cannot tell a zig-zag value from a plain varint, so this is only correct
/// when the caller knows the field type.
///
/// ## Example
///
/// ```
/// use bufpath::unpack_sint;
///
/// assert_eq!(unpack_sint(0), 0);
/// assert_eq!(unpack_sint(1), -1);
/// assert_eq!(unpack_sint(2), 1);
/// assert_eq!(unpack_sint(4294967295), -2147483648);
/// ```
#[inline]
pub fn unzigzag(raw: u64) -> i64 {
    from_zigzag64(raw)
}

/// Decodes a packed repeated field of numbers.
///
/// `buf` starts at the length prefix of the field. On the wire a packed field is always
/// length-prefixed, so the encoding of the elements (`Varint`, `Fixed64` or `Fixed32`) must be
/// supplied by the caller.
///
/// ## Example
///
/// ```
/// use bufpath::{parse_packed_repeated, WireType};
///
/// // 3 bytes of varints: 3, 270
/// let data = [0x03, 0x03, 0x8e, 0x02];
/// assert_eq!(parse_packed_repeated(WireType::Varint, &data).unwrap(), vec![3, 270]);
/// ```
pub fn decode_packed_repeated(wire_type: WireType, buf: &[u8]) -> Result<Vec<u64>, DecodeError> {
    let min_width = match wire_type {
        WireType::Varint => 1,
        WireType::Fixed64 => 8,
        WireType::Fixed32 => 4,
        other => return Err(DecodeError::NotScalar(other)),
    };
    let (payload, _) = read_length_prefixed(buf)?;

    let mut out = Vec::with_capacity(payload.len() / min_width);
    let mut reader = SliceReader::new(payload);
    while !reader.is_empty() {
        out.push(read_scalar(&mut reader, wire_type)?);
    }
    Ok(out)
}

/// Returns the payload of a length-prefixed value. `buf` starts at the length prefix.
pub fn parse_bytes_field(buf: &[u8]) -> Result<&[u8], DecodeError> {
    read_length_prefixed(buf).map(|(payload, _)| payload)
}

/// Returns the payload of a length-prefixed value as text.
///
/// Invalid UTF-8 sequences are replaced, valid text is borrowed without copying.
pub fn parse_string(buf: &[u8]) -> Result<Cow<'_, str>, DecodeError> {
    parse_bytes_field(buf).map(String::from_utf8_lossy)
}

/// Decodes a `double` stored as fixed64.
pub fn parse_float64(wire_type: WireType, buf: &[u8]) -> Result<f64, DecodeError> {
    expect_wire_type(WireType::Fixed64, wire_type)?;
    let (bits, _) = decode_fixed64(buf)?;
    Ok(f64::from_bits(bits))
}

/// Decodes a `float` stored as fixed32.
pub fn parse_float32(wire_type: WireType, buf: &[u8]) -> Result<f32, DecodeError> {
    expect_wire_type(WireType::Fixed32, wire_type)?;
    let (bits, _) = decode_fixed32(buf)?;
    Ok(f32::from_bits(bits))
}

fn expect_wire_type(expected: WireType, found: WireType) -> Result<(), DecodeError> {
    if expected != found {
        return Err(DecodeError::UnexpectedWireType { expected, found });
    }
    Ok(())
}

pub(crate) fn read_header(reader: &mut SliceReader) -> Result<FieldHeader, DecodeError> {
    let start = reader.pos();
    let tag = read_unsigned_varint(reader).map_err(|err| match err {
        DecodeError::IntegerOverflow => DecodeError::MalformedTag(TagError::Overflow),
        other => other,
    })?;

    let field_number = tag >> 3;
    let wire_type = (tag & 0x07) as u8;
    let field_number = match u32::try_from(field_number) {
        Ok(n) if (1..=MAX_FIELD_NUMBER).contains(&n) => n,
        _ => {
            return Err(DecodeError::MalformedTag(TagError::FieldNumber {
                field_number,
                wire_type,
            }))
        }
    };
    let wire_type = WireType::try_from(wire_type)?;

    Ok(FieldHeader {
        field_number,
        wire_type,
        len: reader.pos() - start,
    })
}

pub(crate) fn read_scalar(reader: &mut SliceReader, wire_type: WireType) -> Result<u64, DecodeError> {
    match wire_type {
        WireType::Varint => read_unsigned_varint(reader),
        WireType::Fixed64 => Ok(u64::from_le_bytes(reader.read_array()?)),
        WireType::Fixed32 => Ok(u32::from_le_bytes(reader.read_array()?).into()),
        other => Err(DecodeError::NotScalar(other)),
    }
}

pub(crate) fn read_len_prefixed<'a>(reader: &mut SliceReader<'a>) -> Result<&'a [u8], DecodeError> {
    let length = read_unsigned_varint(reader)?;
    if length > isize::MAX as u64 {
        return Err(DecodeError::NegativeLength(length));
    }
    reader.read(length as usize)
}

/// Skips the payload of a value whose header was already read. Groups are handled by the caller.
fn skip_value(reader: &mut SliceReader, wire_type: WireType) -> Result<(), DecodeError> {
    match wire_type {
        WireType::Varint => read_unsigned_varint(reader).map(|_| ()),
        WireType::Fixed64 => reader.skip(8),
        WireType::Fixed32 => reader.skip(4),
        WireType::LengthPrefixed => read_len_prefixed(reader).map(|_| ()),
        WireType::StartGroup | WireType::EndGroup => Ok(()),
    }
}
