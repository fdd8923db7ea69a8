//! A reader that maintains a pre-cached region of data from an underlying reader.

use std::ops::Range;

use bytes::Bytes;

use crate::{ReadAt, StorageProfile};

/// Alignment applied to the start of a pre-cached suffix.
const CACHE_ALIGNMENT: u64 = 64;

/// A reader that maintains a pre-cached region of data from an underlying reader.
///
/// Reads that are entirely within the cached region are served from memory, while
/// other reads are forwarded to the underlying reader.
///
/// Fragment metadata files keep their footer (and its 8-byte size trailer) at the
/// very end, so opening a fragment pre-caches a fixed-size suffix: the footer and
/// frequently the trailing generic tiles are then decoded without extra requests.
pub struct PrecachedReadAt<R> {
    inner: R,
    size: u64,
    cached_buffer: Bytes,
    /// Start of `cached_buffer` within the source, a multiple of `CACHE_ALIGNMENT`.
    cached_offset: u64,
}

impl<R> PrecachedReadAt<R> {
    /// Returns the pre-cached buffer range.
    pub fn precached_range(&self) -> Range<u64> {
        self.cached_offset..self.cached_offset + self.cached_buffer.len() as u64
    }
}

impl<R: ReadAt> PrecachedReadAt<R> {
    /// Creates a new `PrecachedReadAt` that caches the last `suffix_size` bytes of the reader.
    ///
    /// If `suffix_size` is larger than the reader's size, the entire reader will be cached.
    /// The start of the cached region is aligned down to a 64-byte boundary.
    pub fn from_suffix(inner: R, suffix_size: u64) -> std::io::Result<Self> {
        let size = inner.size()?;
        let cache_size = suffix_size.min(size);
        let start = size - cache_size;
        let cached_offset = start - start % CACHE_ALIGNMENT;
        let cached_buffer = inner.read_at(cached_offset..size)?;

        Ok(Self {
            inner,
            size,
            cached_buffer,
            cached_offset,
        })
    }
}

impl<R: ReadAt> ReadAt for PrecachedReadAt<R> {
    fn size(&self) -> std::io::Result<u64> {
        Ok(self.size)
    }

    fn read_at(&self, range: Range<u64>) -> std::io::Result<Bytes> {
        if range.start >= self.size {
            return Ok(Bytes::new());
        }
        let range = range.start..range.end.min(self.size);

        let cached_end = self.cached_offset + self.cached_buffer.len() as u64;
        if range.start >= self.cached_offset && range.end <= cached_end {
            let buffer_start = (range.start - self.cached_offset) as usize;
            let buffer_end = (range.end - self.cached_offset) as usize;
            return Ok(self.cached_buffer.slice(buffer_start..buffer_end));
        }

        self.inner.read_at(range)
    }

    fn storage_profile(&self) -> StorageProfile {
        if self.cached_offset == 0 && self.cached_buffer.len() as u64 == self.size {
            // The entire object is in memory.
            StorageProfile {
                min_io_size: 1,
                ..Default::default()
            }
        } else {
            self.inner.storage_profile()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{io, sync::Arc};

    use crate::TrackedReadAt;

    fn create_test_data(size: usize) -> Vec<u8> {
        (0..size).map(|i| i as u8).collect()
    }

    #[test]
    fn test_suffix_cache_full_hit() -> io::Result<()> {
        let data = create_test_data(1000);
        let tracked = Arc::new(TrackedReadAt::new(data.clone()));

        let cached = PrecachedReadAt::from_suffix(tracked.clone(), 100)?;
        assert_eq!(cached.precached_range(), 896..1000);
        let reads_after_open = tracked.read_count();

        let result = cached.read_at(960..992)?;
        assert_eq!(&result[..], &data[960..992]);
        assert_eq!(tracked.read_count(), reads_after_open);
        Ok(())
    }

    #[test]
    fn test_suffix_cache_miss() -> io::Result<()> {
        let data = create_test_data(1000);
        let tracked = Arc::new(TrackedReadAt::new(data.clone()));

        let cached = PrecachedReadAt::from_suffix(tracked.clone(), 100)?;
        let reads_after_open = tracked.read_count();

        let result = cached.read_at(10..30)?;
        assert_eq!(&result[..], &data[10..30]);
        assert_eq!(tracked.read_count(), reads_after_open + 1);
        Ok(())
    }

    #[test]
    fn test_out_of_bounds_read() -> io::Result<()> {
        let cached = PrecachedReadAt::from_suffix(create_test_data(100), 50)?;
        assert!(cached.read_at(150..200)?.is_empty());
        assert!(cached.read_at(10..10)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_cache_larger_than_object() -> io::Result<()> {
        let data = create_test_data(50);
        let cached = PrecachedReadAt::from_suffix(data.clone(), 4096)?;
        assert_eq!(cached.precached_range(), 0..50);
        assert_eq!(cached.storage_profile().min_io_size, 1);

        let result = cached.read_at(0..50)?;
        assert_eq!(&result[..], &data[..]);
        Ok(())
    }

    #[test]
    fn test_partial_read_at_end() -> io::Result<()> {
        let data = create_test_data(100);
        let cached = PrecachedReadAt::from_suffix(data.clone(), 0)?;
        let result = cached.read_at(90..150)?;
        assert_eq!(&result[..], &data[90..100]);
        Ok(())
    }
}
