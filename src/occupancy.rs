use crate::ValidationError;

/// Number of field numbers (1 to 32) the tracker has room for.
pub const TRACKED_FIELDS: u32 = 32;

const STATE_BITS: u32 = 2;
const STATE_MASK: u64 = 0b11;

/// What is known about a field number of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FieldState {
    /// Never accessed
    Unseen = 0,
    /// Accessed once as a single value, or a repeated iteration finished
    SeenOnce = 1,
    /// Iteration over a repeated field started and did not finish yet
    ExpectingRepeats = 2,
}

/// Access bookkeeping for the fields 1 to 32 of one message, 2 bits per field.
///
/// Valid transitions are:
///
/// - `Unseen` -> {seen, close} -> `SeenOnce`
/// - `Unseen` -> {repeat} -> `ExpectingRepeats`
/// - `ExpectingRepeats` -> {repeat} -> `ExpectingRepeats`
/// - `ExpectingRepeats` -> {close} -> `SeenOnce`
///
/// All others are errors and leave the state unchanged. Field numbers above 32 are not
/// tracked and every transition on them succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Occupancy(u64);

impl Occupancy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, field_number: u32) -> FieldState {
        let Some(shift) = shift(field_number) else {
            return FieldState::Unseen;
        };
        match (self.0 >> shift) & STATE_MASK {
            1 => FieldState::SeenOnce,
            2 => FieldState::ExpectingRepeats,
            _ => FieldState::Unseen,
        }
    }

    /// Records an access through a single value getter.
    pub fn seen(&mut self, field_number: u32) -> Result<(), ValidationError> {
        match self.state(field_number) {
            FieldState::Unseen => self.set(field_number, FieldState::SeenOnce),
            FieldState::SeenOnce => Err(ValidationError::DuplicateAccess(field_number)),
            FieldState::ExpectingRepeats => Err(ValidationError::MixedAccess(field_number)),
        }
    }

    /// Records an access through a repeated getter.
    pub fn repeat(&mut self, field_number: u32) -> Result<(), ValidationError> {
        match self.state(field_number) {
            FieldState::Unseen | FieldState::ExpectingRepeats => {
                self.set(field_number, FieldState::ExpectingRepeats)
            }
            FieldState::SeenOnce => Err(ValidationError::MixedAccess(field_number)),
        }
    }

    /// Marks the field as done.
    pub fn close(&mut self, field_number: u32) -> Result<(), ValidationError> {
        match self.state(field_number) {
            FieldState::Unseen | FieldState::ExpectingRepeats => {
                self.set(field_number, FieldState::SeenOnce)
            }
            FieldState::SeenOnce => Err(ValidationError::DuplicateAccess(field_number)),
        }
    }

    /// Field numbers currently in the given state, in ascending order.
    pub fn fields_in(&self, state: FieldState) -> impl Iterator<Item = u32> + '_ {
        (1..=TRACKED_FIELDS).filter(move |n| self.state(*n) == state)
    }

    fn set(&mut self, field_number: u32, state: FieldState) -> Result<(), ValidationError> {
        if let Some(shift) = shift(field_number) {
            self.0 = (self.0 & !(STATE_MASK << shift)) | ((state as u64) << shift);
        }
        Ok(())
    }
}

/// Zero based index of a tracked field number. `None` for 0 and numbers above 32.
pub(crate) fn slot(field_number: u32) -> Option<u32> {
    match field_number {
        1..=TRACKED_FIELDS => Some(field_number - 1),
        _ => None,
    }
}

fn shift(field_number: u32) -> Option<u32> {
    slot(field_number).map(|slot| slot * STATE_BITS)
}
