//! Sequential, bounds-checked reader over an in-memory byte buffer.

use fmd_common::{Error, Result};

/// A fixed-width little-endian value that can be read from a [`ByteCursor`].
pub trait FixedValue: Sized {
    const SIZE: usize;

    fn from_le_slice(bytes: &[u8]) -> Self;
}

macro_rules! impl_fixed_value {
    ($($t:ty),*) => {
        $(
            impl FixedValue for $t {
                const SIZE: usize = std::mem::size_of::<$t>();

                #[inline]
                fn from_le_slice(bytes: &[u8]) -> Self {
                    let mut buf = [0u8; std::mem::size_of::<$t>()];
                    buf.copy_from_slice(bytes);
                    <$t>::from_le_bytes(buf)
                }
            }
        )*
    };
}

impl_fixed_value!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

/// Reads values from a borrowed byte buffer front to back.
///
/// Every read consumes exactly the requested number of bytes or fails with
/// `OutOfBounds`, leaving the cursor where it was. The `element` name is
/// attached to errors so a failure points at the structure being decoded.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
    element: &'static str,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8], element: &'static str) -> ByteCursor<'a> {
        ByteCursor {
            data,
            pos: 0,
            element,
        }
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Reads a little-endian fixed-width value.
    pub fn read_fixed<T: FixedValue>(&mut self) -> Result<T> {
        let bytes = self.take(T::SIZE as u64)?;
        Ok(T::from_le_slice(bytes))
    }

    /// Returns the next `len` bytes without copying and advances past them.
    pub fn borrow_bytes(&mut self, len: u64) -> Result<&'a [u8]> {
        self.take(len)
    }

    /// Copies the next `len` bytes into a new buffer.
    pub fn read_bytes(&mut self, len: u64) -> Result<Vec<u8>> {
        Ok(self.take(len)?.to_vec())
    }

    /// Advances past `len` bytes without interpreting them.
    pub fn skip(&mut self, len: u64) -> Result<()> {
        self.take(len).map(|_| ())
    }

    /// Reads `count` consecutive little-endian `u64` values.
    pub fn read_u64_vec(&mut self, count: u64) -> Result<Vec<u64>> {
        let len = count
            .checked_mul(8)
            .ok_or_else(|| self.out_of_bounds(u64::MAX))?;
        let bytes = self.take(len)?;
        Ok(bytes.chunks_exact(8).map(u64::from_le_slice).collect())
    }

    /// Reads a UTF-8 string of `len` bytes.
    pub fn read_string(&mut self, len: u64) -> Result<String> {
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::invalid_format(self.element, format!("invalid utf-8 string: {e}")))
    }

    fn take(&mut self, len: u64) -> Result<&'a [u8]> {
        if len > self.remaining() as u64 {
            return Err(self.out_of_bounds(len));
        }
        let start = self.pos;
        self.pos += len as usize;
        Ok(&self.data[start..self.pos])
    }

    #[cold]
    fn out_of_bounds(&self, requested: u64) -> Error {
        Error::out_of_bounds(
            self.element,
            self.pos as u64,
            requested,
            self.remaining() as u64,
        )
    }
}
