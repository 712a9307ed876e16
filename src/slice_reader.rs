use crate::DecodeError;

/// A cursor over an immutable buffer.
///
/// Every read checks the bounds first and leaves the position untouched on failure.
#[derive(Debug, Clone, Copy)]
pub struct SliceReader<'x> {
    data: &'x [u8],
    pos: usize,
}

impl<'x> SliceReader<'x> {
    pub fn new(data: &'x [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.pos == self.data.len()
    }

    /// Remaining data to read
    pub fn len(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Number of bytes consumed so far
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// The unread part of the data
    pub fn rest(&self) -> &'x [u8] {
        &self.data[self.pos..]
    }

    /// Advances the position by `n` without looking at the bytes.
    pub fn skip(&mut self, n: usize) -> Result<(), DecodeError> {
        if self.len() < n {
            return Err(DecodeError::UnexpectedEndOfBuffer);
        }
        self.pos += n;
        Ok(())
    }

    /// Reads `n` bytes and advances the reader by `n`
    pub fn read(&mut self, n: usize) -> Result<&'x [u8], DecodeError> {
        if self.len() < n {
            return Err(DecodeError::UnexpectedEndOfBuffer);
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    /// Reads one byte and advances the reader by 1
    pub fn read_one(&mut self) -> Result<u8, DecodeError> {
        let out = *self
            .data
            .get(self.pos)
            .ok_or(DecodeError::UnexpectedEndOfBuffer)?;
        self.pos += 1;
        Ok(out)
    }

    /// Reads `N` bytes and advances the reader by `N`.
    /// The result is copied into an array. Fails with [`DecodeError::TooShort`].
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let remaining = self.len();
        let Some(Ok(out)) = self.rest().get(..N).map(<[u8; N]>::try_from) else {
            return Err(DecodeError::TooShort {
                needed: N,
                remaining,
            });
        };
        self.pos += N;
        Ok(out)
    }
}
