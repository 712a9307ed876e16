use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;

use crate::occupancy::{slot, FieldState};
use crate::repeated::{RepeatedMessages, RepeatedNumbers};
use crate::slice_reader::SliceReader;
use crate::wire::{self, skip_field};
use crate::{extract_field, DecodeError, Error, Number, Occupancy, ValidationError, WireType};

/// A protobuf message that is decoded on demand, one field at a time.
///
/// Getters never fail. If a field is missing or malformed, the getter returns an empty value
/// and the error is recorded in the message. Check the recorded errors once at the end with
/// [`Message::close`] (or peek at them with [`Message::error`]).
///
/// A message derived from a missing field (e.g. `msg.message(99)` when field 99 does not
/// exist) is *absent*. Getters on an absent message return empty values and record nothing,
/// so only the first missing link of a chain is reported.
///
/// Every getter also records that the field was read. [`Message::close`] uses this to detect
/// fields that occur several times on the wire but were read as single values, and repeated
/// fields whose iteration was never finished.
///
/// ## Example
///
/// ```
/// use bufpath::Message;
///
/// // name = "John" (field 1), age = 123 (field 2)
/// let data = [0x0a, 0x04, 0x4a, 0x6f, 0x68, 0x6e, 0x10, 0x7b];
///
/// let mut msg = Message::parse(&data);
/// assert_eq!(msg.string(1), "John");
/// assert_eq!(msg.number(2).as_int32(), 123);
/// assert_eq!(msg.message(7).string(1), "");
///
/// let err = msg.close().unwrap_err();
/// assert_eq!(err.to_string(), "field 7 not found");
/// ```
#[derive(Debug, Default)]
pub struct Message<'a> {
    data: Option<&'a [u8]>,
    errors: Vec<Error>,
    occupancy: Occupancy,
    /// Fields read through a single value getter, bit `n - 1` for field `n`
    singles: u32,
}

impl<'a> Message<'a> {
    /// Wraps the encoded message. This never fails and does not look at the data yet.
    pub fn parse(data: &'a [u8]) -> Self {
        Self {
            data: Some(data),
            ..Default::default()
        }
    }

    /// A message for a field that does not exist.
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn is_present(&self) -> bool {
        self.data.is_some()
    }

    /// The encoded message. Empty if absent.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data.unwrap_or_default()
    }

    /// Gets the content of a bytes field (or any other length-prefixed field).
    pub fn bytes(&mut self, field_number: u32) -> &'a [u8] {
        self.payload(field_number).unwrap_or_default()
    }

    /// Gets a string field.
    ///
    /// The text is not validated. Invalid UTF-8 sequences are replaced with
    /// `U+FFFD REPLACEMENT CHARACTER`, valid text is borrowed.
    pub fn string(&mut self, field_number: u32) -> Cow<'a, str> {
        String::from_utf8_lossy(self.bytes(field_number))
    }

    /// Gets a numeric field, decoded according to the wire type found in the data.
    ///
    /// Returns `Number(0)` if the field is missing or not numeric.
    pub fn number(&mut self, field_number: u32) -> Number {
        let Some((raw, wire_type)) = self.field(field_number) else {
            return Number::default();
        };
        match wire::decode_by_wire_type(wire_type, raw) {
            Ok((value, _)) => Number::from(value),
            Err(err) => {
                self.add_error(err);
                Number::default()
            }
        }
    }

    /// Gets a `float` field. The field must be encoded as fixed32.
    pub fn float32(&mut self, field_number: u32) -> f32 {
        let Some((raw, wire_type)) = self.field(field_number) else {
            return 0.0;
        };
        wire::parse_float32(wire_type, raw).unwrap_or_else(|err| {
            self.add_error(err);
            0.0
        })
    }

    /// Gets a `double` field. The field must be encoded as fixed64.
    pub fn float64(&mut self, field_number: u32) -> f64 {
        let Some((raw, wire_type)) = self.field(field_number) else {
            return 0.0;
        };
        wire::parse_float64(wire_type, raw).unwrap_or_else(|err| {
            self.add_error(err);
            0.0
        })
    }

    /// Gets an embedded message. The result is absent if the field is missing or malformed.
    ///
    /// Errors found while reading the embedded message are recorded in the embedded message,
    /// not in this one.
    pub fn message(&mut self, field_number: u32) -> Message<'a> {
        match self.payload(field_number) {
            Some(payload) => Message::parse(payload),
            None => Message::absent(),
        }
    }

    /// Gets the embedded message of whichever of `candidates` comes first on the wire,
    /// along with its field number.
    ///
    /// Returns `None` if none of them is set.
    ///
    /// ## Example
    ///
    /// ```
    /// use bufpath::Message;
    ///
    /// // field 3 = { field 1 = 5 }
    /// let data = [0x1a, 0x02, 0x08, 0x05];
    /// let mut msg = Message::parse(&data);
    ///
    /// let (field_number, mut variant) = msg.one_of(&[2, 3]).unwrap();
    /// assert_eq!(field_number, 3);
    /// assert_eq!(variant.number(1).as_uint32(), 5);
    /// ```
    pub fn one_of(&mut self, candidates: &[u32]) -> Option<(u32, Message<'a>)> {
        let data = self.data?;
        let (raw, wire_type, field_number) = match crate::one_of(data, candidates) {
            Ok(found) => found,
            Err(err) => {
                self.add_error(err);
                return None;
            }
        };
        self.track_single(field_number);
        let payload = self.open_length_prefixed(raw, wire_type)?;
        Some((field_number, Message::parse(payload)))
    }

    /// Gets a packed repeated numeric field. `element` is the wire type of the elements
    /// (`Varint`, `Fixed64` or `Fixed32`).
    ///
    /// ## Example
    ///
    /// ```
    /// use bufpath::{Message, WireType};
    ///
    /// // field 4 = [123, 4567] packed
    /// let data = [0x22, 0x03, 0x7b, 0xd7, 0x23];
    /// let mut msg = Message::parse(&data);
    /// let codes: Vec<u32> = msg
    ///     .packed(4, WireType::Varint)
    ///     .into_iter()
    ///     .map(|n| n.as_uint32())
    ///     .collect();
    /// assert_eq!(codes, [123, 4567]);
    /// ```
    pub fn packed(&mut self, field_number: u32, element: WireType) -> Vec<Number> {
        let Some((raw, wire_type)) = self.field(field_number) else {
            return Vec::new();
        };
        if wire_type != WireType::LengthPrefixed {
            self.add_error(DecodeError::UnexpectedWireType {
                expected: WireType::LengthPrefixed,
                found: wire_type,
            });
            return Vec::new();
        }
        match wire::decode_packed_repeated(element, raw) {
            Ok(values) => values.into_iter().map(Number::from).collect(),
            Err(err) => {
                self.add_error(err);
                Vec::new()
            }
        }
    }

    /// Iterates over all occurrences of a non-packed repeated numeric field.
    ///
    /// See [`RepeatedNumbers`].
    pub fn repeated_number(&mut self, field_number: u32) -> RepeatedNumbers<'_, 'a> {
        RepeatedNumbers::new(self, field_number)
    }

    /// Iterates over all occurrences of a repeated message field.
    ///
    /// See [`RepeatedMessages`].
    pub fn repeated_message(&mut self, field_number: u32) -> RepeatedMessages<'_, 'a> {
        RepeatedMessages::new(self, field_number)
    }

    /// Records an error. It will be reported by [`Message::error`] and [`Message::close`].
    pub fn add_error(&mut self, err: impl Into<Error>) {
        let err = err.into();
        log::trace!("recording error: {err}");
        self.errors.push(err);
    }

    /// The errors recorded so far, oldest first.
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    pub fn occupancy(&self) -> &Occupancy {
        &self.occupancy
    }

    /// Returns nothing if no error was recorded, the error if there is exactly one and
    /// [`Error::Multiple`] otherwise.
    pub fn error(&self) -> Option<Error> {
        Error::resolve(self.errors.clone())
    }

    /// Finishes reading the message.
    ///
    /// This scans the whole message once more and adds a [`ValidationError`] for
    ///
    /// - every field that was read as a single value but occurs more than once, and
    /// - every repeated field whose iteration was started but not finished.
    ///
    /// Malformed data found during the scan is reported too. The result has the same shape
    /// as [`Message::error`].
    pub fn close(mut self) -> Result<(), Error> {
        if let Some(data) = self.data {
            self.validate(data);
        }
        match Error::resolve(self.errors) {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }

    fn validate(&mut self, data: &'a [u8]) {
        let mut counts = [0usize; crate::TRACKED_FIELDS as usize];
        let mut reader = SliceReader::new(data);
        while !reader.is_empty() {
            let rest = reader.rest();
            let step = wire::parse_field_header(rest)
                .and_then(|header| skip_field(rest).map(|len| (header, len)));
            let (header, len) = match step {
                Ok(step) => step,
                Err(err) => {
                    self.add_error(err);
                    break;
                }
            };
            // an end group marker belongs to the group counted at its start
            if header.wire_type != WireType::EndGroup {
                let count = slot(header.field_number).and_then(|i| counts.get_mut(i as usize));
                if let Some(count) = count {
                    *count += 1;
                }
                if self.occupancy.state(header.field_number) == FieldState::Unseen {
                    log::debug!(
                        "field {} ({:?}) was not read",
                        header.field_number,
                        header.wire_type
                    );
                }
            }
            if let Err(err) = reader.skip(len) {
                self.add_error(err);
                break;
            }
        }

        for field_number in self.occupancy.fields_in(FieldState::SeenOnce).collect::<Vec<_>>() {
            let Some(i) = slot(field_number) else {
                continue;
            };
            let count = counts.get(i as usize).copied().unwrap_or_default();
            if self.singles & (1 << i) != 0 && count > 1 {
                log::debug!("field {field_number} read once but found {count} times");
                self.add_error(ValidationError::DuplicateField {
                    field_number,
                    count,
                });
            }
        }
        for field_number in self
            .occupancy
            .fields_in(FieldState::ExpectingRepeats)
            .collect::<Vec<_>>()
        {
            log::debug!("repeated field {field_number} was never closed");
            self.add_error(ValidationError::UnfinishedRepeats(field_number));
        }
    }

    /// Records a single value access and finds the first occurrence of the field.
    fn field(&mut self, field_number: u32) -> Option<(&'a [u8], WireType)> {
        let data = self.data?;
        self.track_single(field_number);
        match extract_field(data, field_number) {
            Ok(found) => Some(found),
            Err(err) => {
                self.add_error(err);
                None
            }
        }
    }

    fn payload(&mut self, field_number: u32) -> Option<&'a [u8]> {
        let (raw, wire_type) = self.field(field_number)?;
        self.open_length_prefixed(raw, wire_type)
    }

    fn open_length_prefixed(&mut self, raw: &'a [u8], wire_type: WireType) -> Option<&'a [u8]> {
        if wire_type != WireType::LengthPrefixed {
            self.add_error(DecodeError::UnexpectedWireType {
                expected: WireType::LengthPrefixed,
                found: wire_type,
            });
            return None;
        }
        match wire::parse_bytes_field(raw) {
            Ok(payload) => Some(payload),
            Err(err) => {
                self.add_error(err);
                None
            }
        }
    }

    fn track_single(&mut self, field_number: u32) {
        match (self.occupancy.seen(field_number), slot(field_number)) {
            (Ok(()), Some(i)) => self.singles |= 1 << i,
            (Ok(()), None) => {}
            (Err(err), _) => self.add_error(err),
        }
    }

    pub(crate) fn track_repeat(&mut self, field_number: u32) -> bool {
        match self.occupancy.repeat(field_number) {
            Ok(()) => true,
            Err(err) => {
                self.add_error(err);
                false
            }
        }
    }

    pub(crate) fn finish_repeat(&mut self, field_number: u32) {
        if let Err(err) = self.occupancy.close(field_number) {
            self.add_error(err);
        }
    }
}
