//! Range-checked access to the bytes of a fragment metadata object.

use std::{ops::Range, sync::Arc};

use bytes::Bytes;
use fmd_common::{Error, ErrorKind, Result, verify_arg};
use fmd_io::{ReadAt, StorageProfile};

/// Wraps a `ReadAt` source, validating every requested range against the
/// object size before issuing the read.
///
/// Reads either return exactly the requested number of bytes or fail: a range
/// past the end of the object is `OutOfBounds` and a short result from the
/// source is `ShortRead`.
#[derive(Clone)]
pub struct FragmentReader {
    inner: Arc<dyn ReadAt>,
    size: u64,
}

impl FragmentReader {
    /// Creates a new `FragmentReader`, querying the object size once.
    pub fn new(inner: Arc<dyn ReadAt>) -> Result<FragmentReader> {
        let size = inner
            .size()
            .map_err(|e| Error::io("fragment metadata size", e))?;
        Ok(FragmentReader { inner, size })
    }

    /// Returns the size of the underlying object.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn inner(&self) -> &Arc<dyn ReadAt> {
        &self.inner
    }

    pub fn into_inner(self) -> Arc<dyn ReadAt> {
        self.inner
    }

    pub fn storage_profile(&self) -> StorageProfile {
        self.inner.storage_profile()
    }

    /// Reads exactly `range` from the object. `element` names what is being
    /// read for error reporting.
    pub fn read_range(&self, range: Range<u64>, element: &str) -> Result<Bytes> {
        verify_arg!(range, range.start <= range.end);
        let len = range.end - range.start;
        if range.end > self.size {
            return Err(Error::out_of_bounds(
                element,
                range.start,
                len,
                self.size.saturating_sub(range.start),
            ));
        }
        if len == 0 {
            return Ok(Bytes::new());
        }

        let offset = range.start;
        let bytes = self
            .inner
            .read_at(range)
            .map_err(|e| Error::io(element, e))?;
        if bytes.len() as u64 != len {
            return Err(ErrorKind::ShortRead {
                offset,
                expected: len,
                actual: bytes.len() as u64,
            }
            .into());
        }
        Ok(bytes)
    }

    /// Reads `len` bytes starting at `pos`.
    pub fn read_at(&self, pos: u64, len: u64, element: &str) -> Result<Bytes> {
        let end = pos
            .checked_add(len)
            .ok_or_else(|| Error::out_of_bounds(element, pos, len, self.size.saturating_sub(pos)))?;
        self.read_range(pos..end, element)
    }

    /// Reads a little-endian `u64` at `pos`.
    pub fn read_u64(&self, pos: u64, element: &str) -> Result<u64> {
        let bytes = self.read_at(pos, 8, element)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&bytes);
        Ok(u64::from_le_bytes(buf))
    }
}

impl std::fmt::Debug for FragmentReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FragmentReader")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}
