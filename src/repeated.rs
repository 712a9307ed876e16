//! Iterators over the occurrences of repeated fields.

use core::iter::FusedIterator;
use core::marker::PhantomData;

use crate::wire;
use crate::{extract_field, DecodeError, Message, Number, WireType};

/// The shared cursor of the repeated iterators.
///
/// Each step searches the data after the previous occurrence, never from the start.
struct Cursor<'m, 'a> {
    parent: &'m mut Message<'a>,
    rest: &'a [u8],
    field_number: u32,
    /// The field was marked as repeated and must be closed out again
    tracked: bool,
    ended: bool,
    closed: bool,
    error: Option<DecodeError>,
}

impl<'m, 'a> Cursor<'m, 'a> {
    fn new(parent: &'m mut Message<'a>, field_number: u32) -> Self {
        let rest = parent.as_bytes();
        let (tracked, ended) = if parent.is_present() {
            (parent.track_repeat(field_number), false)
        } else {
            (false, true)
        };
        Self {
            parent,
            rest,
            field_number,
            tracked,
            ended,
            closed: false,
            error: None,
        }
    }

    /// Finds the next occurrence and decodes it with `decode`, which returns the value and
    /// the number of bytes it consumed.
    fn advance<T>(
        &mut self,
        decode: impl FnOnce(WireType, &'a [u8]) -> Result<(T, usize), DecodeError>,
    ) -> Option<T> {
        if self.ended {
            return None;
        }
        let step = extract_field(self.rest, self.field_number).and_then(|(raw, wire_type)| {
            let (value, consumed) = decode(wire_type, raw)?;
            Ok((value, raw.get(consumed..).unwrap_or_default()))
        });
        match step {
            Ok((value, rest)) => {
                self.rest = rest;
                Some(value)
            }
            Err(DecodeError::FieldNotFound(_)) => {
                self.ended = true;
                None
            }
            Err(err) => {
                self.error = Some(err);
                self.ended = true;
                None
            }
        }
    }
}

impl Drop for Cursor<'_, '_> {
    fn drop(&mut self) {
        if let Some(err) = self.error.take() {
            self.parent.add_error(err);
        }
        if self.tracked && (self.ended || self.closed) {
            self.parent.finish_repeat(self.field_number);
        } else if self.tracked {
            log::debug!(
                "iteration over field {} dropped before the end",
                self.field_number
            );
        }
    }
}

/// Lazy iterator over the occurrences of a repeated field, see [`RepeatedNumbers`] and
/// [`RepeatedMessages`].
///
/// The iterator ends at the end of the message or at the first malformed value. Errors are
/// added to the parent message when the iterator is dropped.
///
/// Running the iterator to the end, or calling [`Repeated::close`], finishes the repeated
/// field. Dropping it halfway leaves the field unfinished, which [`Message::close`] reports.
pub struct Repeated<'m, 'a, T> {
    cursor: Cursor<'m, 'a>,
    item: PhantomData<fn() -> T>,
}

impl<'m, 'a, T> Repeated<'m, 'a, T> {
    pub(crate) fn new(parent: &'m mut Message<'a>, field_number: u32) -> Self {
        Self {
            cursor: Cursor::new(parent, field_number),
            item: PhantomData,
        }
    }

    /// The error that ended the iteration, if any.
    pub fn error(&self) -> Option<&DecodeError> {
        self.cursor.error.as_ref()
    }

    /// Stops iterating and finishes the repeated field, even if not all values were read.
    pub fn close(mut self) {
        self.cursor.closed = true;
    }
}

/// All values of a non-packed repeated numeric field, in wire order.
///
/// Created by [`Message::repeated_number`]. For packed fields use [`Message::packed`].
///
/// ## Example
///
/// ```
/// use bufpath::Message;
///
/// // field 3 = 7, field 1 = 1, field 3 = 8, field 3 = 9
/// let data = [0x18, 0x07, 0x08, 0x01, 0x18, 0x08, 0x18, 0x09];
/// let mut msg = Message::parse(&data);
///
/// let sum: i32 = msg.repeated_number(3).map(|n| n.as_int32()).sum();
/// assert_eq!(sum, 24);
/// assert!(msg.close().is_ok());
/// ```
pub type RepeatedNumbers<'m, 'a> = Repeated<'m, 'a, Number>;

impl Iterator for Repeated<'_, '_, Number> {
    type Item = Number;

    fn next(&mut self) -> Option<Number> {
        self.cursor.advance(|wire_type, raw| {
            wire::decode_by_wire_type(wire_type, raw).map(|(value, len)| (Number::from(value), len))
        })
    }
}

impl FusedIterator for Repeated<'_, '_, Number> {}

/// All embedded messages of a repeated message field, in wire order.
///
/// Created by [`Message::repeated_message`].
///
/// ## Example
///
/// ```
/// use bufpath::Message;
///
/// // numbers = [{ name = "Jo" }, { name = "Al" }] (field 5)
/// let data = [
///     0x2a, 0x04, 0x0a, 0x02, 0x4a, 0x6f,
///     0x2a, 0x04, 0x0a, 0x02, 0x41, 0x6c,
/// ];
/// let mut msg = Message::parse(&data);
///
/// let mut names = Vec::new();
/// for mut entry in msg.repeated_message(5) {
///     names.push(entry.string(1).into_owned());
///     entry.close().unwrap();
/// }
/// assert_eq!(names, ["Jo", "Al"]);
/// assert!(msg.close().is_ok());
/// ```
pub type RepeatedMessages<'m, 'a> = Repeated<'m, 'a, Message<'a>>;

impl<'a> Iterator for Repeated<'_, 'a, Message<'a>> {
    type Item = Message<'a>;

    fn next(&mut self) -> Option<Message<'a>> {
        self.cursor.advance(|wire_type, raw| {
            if wire_type != WireType::LengthPrefixed {
                return Err(DecodeError::UnexpectedWireType {
                    expected: WireType::LengthPrefixed,
                    found: wire_type,
                });
            }
            wire::read_length_prefixed(raw).map(|(payload, len)| (Message::parse(payload), len))
        })
    }
}

impl<'a> FusedIterator for Repeated<'_, 'a, Message<'a>> {}
