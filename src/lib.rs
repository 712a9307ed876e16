//! Extract single fields from protobuf encoded bytes, knowing nothing but field numbers.
//!
//! bufpath needs no `.proto` file and never decodes a whole message. You ask for a field
//! (or a path of fields into nested messages) and everything else is skipped over. All values
//! are borrowed from the input, nothing is copied unless you ask for it.
//!
//! Due to its low level design, bufpath cannot know how a number was encoded (int32 vs. sint32,
//! fixed64 vs. double) and you should have an understanding of how protobuf encoding works in
//! general to pick the right interpretation.
//!
//! The crate is split in two layers:
//!
//! - Free functions ([`extract_field`], [`extract_path`], [`one_of`],
//!   [`parse_packed_repeated`], [`unpack_sint`] and the [`wire`] module) that are stateless and
//!   return the first error they encounter.
//! - [`Message`], a wrapper around a buffer that collects errors instead of returning them, so
//!   a series of field accesses can be checked once at the end with [`Message::close`].
//!
//! ## Example
//!
//! ```
//! use bufpath::Message;
//!
//! // fee = { amount = 500, denom = "PHO" } (field 1), memo = "hi" (field 3)
//! let data = [
//!     0x0a, 0x08, 0x08, 0xf4, 0x03, 0x12, 0x03, 0x50, 0x48, 0x4f,
//!     0x1a, 0x02, 0x68, 0x69,
//! ];
//!
//! let mut msg = Message::parse(&data);
//! let mut fee = msg.message(1);
//! let amount = fee.number(1).as_int64();
//! let denom = fee.string(2);
//! assert!(fee.close().is_ok());
//! assert_eq!(amount, 500);
//! assert_eq!(denom, "PHO");
//!
//! assert_eq!(msg.string(3), "hi");
//! assert!(msg.close().is_ok());
//! ```
//!
//! ## Non goals
//! - Encoding
//! - Schema validation
//! - Decoding groups (deprecated, see <https://protobuf.dev/programming-guides/proto2/#groups>).
//!   They are only skipped.

#![cfg_attr(not(any(feature = "std", test)), no_std)]

extern crate alloc;

mod error;
mod message;
mod number;
mod occupancy;
mod path;
mod repeated;
mod slice_reader;
#[cfg(test)]
mod testutil;
mod varint;
pub mod wire;

pub use error::{DecodeError, Error, TagError, ValidationError};
pub use message::Message;
pub use number::Number;
pub use occupancy::{FieldState, Occupancy, TRACKED_FIELDS};
pub use path::{extract_field, extract_path, one_of};
pub use repeated::{Repeated, RepeatedMessages, RepeatedNumbers};
pub use varint::MAX_VARINT_LEN;
pub use wire::{
    decode_packed_repeated as parse_packed_repeated, parse_bytes_field, parse_float32,
    parse_float64, parse_string, unzigzag as unpack_sint, FieldHeader, MAX_FIELD_NUMBER,
};

/// The protobuf wire types
///
/// <https://protobuf.dev/programming-guides/encoding/#structure>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireType {
    /// Variable length integer (int32, int64, uint32, uint64, sint32, sint64, bool, enum)
    Varint = 0,
    /// 8 bytes little endian (fixed64, sfixed64, double)
    Fixed64 = 1,
    /// Length prefixed field (string, bytes, embedded messages, packed repeated fields)
    LengthPrefixed = 2,
    /// Group start (deprecated)
    StartGroup = 3,
    /// Group end (deprecated)
    EndGroup = 4,
    /// 4 bytes little endian (fixed32, sfixed32, float)
    Fixed32 = 5,
}

impl TryFrom<u8> for WireType {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => WireType::Varint,
            1 => WireType::Fixed64,
            2 => WireType::LengthPrefixed,
            3 => WireType::StartGroup,
            4 => WireType::EndGroup,
            5 => WireType::Fixed32,
            other => return Err(DecodeError::UnknownWireType(other)),
        })
    }
}
