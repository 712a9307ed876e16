use crate::varint::from_zigzag64;

/// The raw bits of a numeric field.
///
/// The wire format does not say which protobuf type a number has, so the caller picks the
/// interpretation. None of the accessors check that the interpretation matches how the value
/// was encoded.
///
/// Varints hold the decoded value, fixed64 values the 8 bytes and fixed32 values the 4 bytes
/// in the lower half.
///
/// ## Example
///
/// ```
/// use bufpath::Number;
///
/// let n = Number::from(0xffff_ffff_ffff_fffe);
/// assert_eq!(n.as_int64(), -2);
/// assert_eq!(n.as_int32(), -2);
/// assert_eq!(n.as_uint32(), 0xffff_fffe);
/// assert_eq!(n.as_sint64(), i64::MAX);
/// assert!(n.as_bool());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Number(u64);

impl Number {
    /// The raw 64 bit word.
    #[inline]
    pub fn as_uint64(self) -> u64 {
        self.0
    }

    /// Truncates to the lower 32 bits.
    #[inline]
    pub fn as_uint32(self) -> u32 {
        self.0 as u32
    }

    /// For `int64` and `sfixed64`.
    #[inline]
    pub fn as_int64(self) -> i64 {
        self.0 as i64
    }

    /// For `int32`, `sfixed32` and enums. Negative int32 values are sign extended to 10 bytes
    /// on the wire, so truncating gives the right result.
    #[inline]
    pub fn as_int32(self) -> i32 {
        self.0 as i32
    }

    #[inline]
    pub fn as_bool(self) -> bool {
        self.0 != 0
    }

    /// For `sint64` (zig-zag encoded).
    #[inline]
    pub fn as_sint64(self) -> i64 {
        from_zigzag64(self.0)
    }

    /// For `sint32` (zig-zag encoded).
    #[inline]
    pub fn as_sint32(self) -> i32 {
        from_zigzag64(self.0) as i32
    }

    /// For `double`, which is encoded as fixed64.
    #[inline]
    pub fn as_float64(self) -> f64 {
        f64::from_bits(self.0)
    }

    /// For `float`, which is encoded as fixed32.
    #[inline]
    pub fn as_float32(self) -> f32 {
        f32::from_bits(self.0 as u32)
    }
}

impl From<u64> for Number {
    fn from(raw: u64) -> Self {
        Number(raw)
    }
}

impl From<Number> for u64 {
    fn from(number: Number) -> Self {
        number.0
    }
}
