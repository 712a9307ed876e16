use crate::slice_reader::SliceReader;
use crate::DecodeError;

/// The longest varint encoding of a 64 bit value.
pub const MAX_VARINT_LEN: usize = 10;

/// Reads an unsigned base 128 varint and advances the reader past it.
///
/// Bits beyond 64 in the tenth byte are discarded. The reader is left untouched on error.
pub fn read_unsigned_varint(data: &mut SliceReader) -> Result<u64, DecodeError> {
    let mut probe = *data;
    let mut out = 0u64;
    for byte_counter in 0..MAX_VARINT_LEN {
        let byte = probe.read_one()?;
        out |= ((byte & 0x7f) as u64) << (byte_counter * 7);
        if byte & 0x80 == 0 {
            *data = probe;
            return Ok(out);
        }
    }
    Err(DecodeError::IntegerOverflow)
}

#[cfg(test)]
#[inline]
pub fn to_zigzag64(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

/// Undoes the zig-zag encoding used by `sint32` and `sint64`.
#[inline]
pub fn from_zigzag64(n: u64) -> i64 {
    ((n >> 1) as i64) ^ (-((n & 1) as i64))
}
