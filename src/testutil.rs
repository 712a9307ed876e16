//! A minimal protobuf encoder to build test inputs.
//!
//! Unlike a real encoder it writes every value, including defaults, and can produce
//! structures that are invalid or deprecated (raw tags, groups).

use alloc::vec::Vec;

use crate::varint::to_zigzag64;
use crate::WireType;

#[derive(Default, Clone)]
pub struct Writer {
    output: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a tag with any wire type value, including the invalid 6 and 7.
    pub fn append_raw_tag(mut self, field_number: u32, wire_type: u8) -> Self {
        let tag = (u64::from(field_number) << 3) | u64::from(wire_type);
        unsigned_varint_encode(tag, &mut self.output);
        self
    }

    pub fn append_bytes(mut self, field_number: u32, data: impl AsRef<[u8]>) -> Self {
        let data = data.as_ref();
        self.append_tag(field_number, WireType::LengthPrefixed);
        unsigned_varint_encode(data.len() as u64, &mut self.output);
        self.output.extend_from_slice(data);
        self
    }

    pub fn append_string(self, field_number: u32, data: impl AsRef<str>) -> Self {
        self.append_bytes(field_number, data.as_ref().as_bytes())
    }

    pub fn append_uint64(mut self, field_number: u32, value: u64) -> Self {
        self.append_tag(field_number, WireType::Varint);
        unsigned_varint_encode(value, &mut self.output);
        self
    }

    /// Negative values are sign extended to 64 bits.
    pub fn append_int64(self, field_number: u32, value: i64) -> Self {
        self.append_uint64(field_number, value as u64)
    }

    pub fn append_int32(self, field_number: u32, value: i32) -> Self {
        self.append_int64(field_number, value.into())
    }

    pub fn append_sint64(self, field_number: u32, value: i64) -> Self {
        self.append_uint64(field_number, to_zigzag64(value))
    }

    pub fn append_sint32(self, field_number: u32, value: i32) -> Self {
        self.append_sint64(field_number, value.into())
    }

    pub fn append_fixed64(mut self, field_number: u32, value: u64) -> Self {
        self.append_tag(field_number, WireType::Fixed64);
        self.output.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn append_fixed32(mut self, field_number: u32, value: u32) -> Self {
        self.append_tag(field_number, WireType::Fixed32);
        self.output.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn append_message(self, field_number: u32, msg: &Writer) -> Self {
        self.append_bytes(field_number, msg.as_bytes())
    }

    /// Writes the fields of `group` between a start and an end group tag.
    pub fn append_group(mut self, field_number: u32, group: &Writer) -> Self {
        self.append_tag(field_number, WireType::StartGroup);
        self.output.extend_from_slice(group.as_bytes());
        self.append_tag(field_number, WireType::EndGroup);
        self
    }

    pub fn append_packed_sint64(self, field_number: u32, values: &[i64]) -> Self {
        let mut payload = Vec::new();
        for value in values {
            unsigned_varint_encode(to_zigzag64(*value), &mut payload);
        }
        self.append_bytes(field_number, payload)
    }

    pub fn append_packed_fixed32(self, field_number: u32, values: &[u32]) -> Self {
        let payload: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.append_bytes(field_number, payload)
    }

    pub fn append_packed_fixed64(self, field_number: u32, values: &[u64]) -> Self {
        let payload: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.append_bytes(field_number, payload)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.output
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.output
    }

    fn append_tag(&mut self, field_number: u32, wire_type: WireType) {
        let tag = (u64::from(field_number) << 3) | wire_type as u64;
        unsigned_varint_encode(tag, &mut self.output);
    }
}

/// Encodes `n` as an unsigned varint and appends it to `dest`.
pub fn unsigned_varint_encode(mut n: u64, dest: &mut Vec<u8>) {
    loop {
        let mut b = (n & 0b0111_1111) as u8;
        n >>= 7;
        if n != 0 {
            b |= 0b1000_0000;
        }
        dest.push(b);
        if n == 0 {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn writer_matches_known_encodings() {
        let data = Writer::new()
            .append_string(1, "John")
            .append_int32(2, 123)
            .into_vec();
        assert_eq!(data, hex!("0a044a6f686e107b"));

        assert_eq!(
            Writer::new().append_int32(1, -1).into_vec(),
            hex!("08ffffffffffffffffff01")
        );
        assert_eq!(Writer::new().append_sint32(1, -1).into_vec(), hex!("0801"));
        assert_eq!(
            Writer::new().append_fixed32(1, 1).into_vec(),
            hex!("0d01000000")
        );
        assert_eq!(
            Writer::new().append_group(2, &Writer::new()).into_vec(),
            hex!("1314")
        );
    }
}
