//! I/O abstractions for reading fragment metadata objects:
//! - `ReadAt`: positional reader with the ability to fetch a specified byte range
//!   from a file or blob.
//! - `PrecachedReadAt`: serves reads of a pre-fetched region (typically the file
//!   suffix holding the footer) from memory.
//! - `TrackedReadAt`: records which byte ranges were read, for coverage reports.
//!
//! Provides memory-based and file-based implementations of `ReadAt`.

use std::{ops::Range, sync::Arc};

use bytes::Bytes;

pub mod file;
pub mod memory;
pub mod precached_read;
pub mod tracked_read;
pub mod utils;

pub use file::FileReader;
pub use precached_read::PrecachedReadAt;
pub use tracked_read::TrackedReadAt;

/// A trait representing a conceptual file or buffer that supports reading from arbitrary
/// positions.
pub trait ReadAt: Send + Sync + 'static {
    /// Returns the size of the underlying object.
    fn size(&self) -> std::io::Result<u64>;

    /// Reads a specified range of bytes from the object.
    ///
    /// **NOTE**: `read_at` should not return with a short read, unless end-of-object
    /// is encountered.
    ///
    /// # Arguments
    ///
    /// * `range` - A `Range<u64>` that specifies the start and end positions for reading.
    ///   The function may return fewer bytes than requested if the range extends beyond
    ///   the end of the object.
    fn read_at(&self, range: Range<u64>) -> std::io::Result<Bytes>;

    /// Retrieves the storage profile associated with this reader.
    fn storage_profile(&self) -> StorageProfile;
}

/// Characterizes the performance aspects of the underlying storage implementation.
#[derive(Debug, Clone)]
pub struct StorageProfile {
    /// Suggested minimum size for an effective I/O request.
    /// Using buffers smaller than this size may be inefficient, as the round-trip time
    /// could dominate the overall I/O operation time.
    pub min_io_size: usize,

    /// Suggested maximum size for a single I/O request.
    pub max_io_size: usize,
}

impl StorageProfile {
    /// Clamps a given I/O size to the recommended range defined by this profile.
    ///
    /// The minimum size is guaranteed to be at least 1, and the maximum size is
    /// guaranteed to be at least the minimum size.
    pub fn clamp_io_size(&self, size: usize) -> usize {
        let min = self.min_io_size.max(1).min(self.max_io_size);
        let max = self.max_io_size.max(1).max(min);
        size.clamp(min, max)
    }
}

impl Default for StorageProfile {
    fn default() -> StorageProfile {
        Self {
            min_io_size: 4 * 1024,
            max_io_size: 4 * 1024 * 1024,
        }
    }
}

impl<T> ReadAt for Arc<T>
where
    T: ReadAt + ?Sized,
{
    fn size(&self) -> std::io::Result<u64> {
        self.as_ref().size()
    }

    fn read_at(&self, range: Range<u64>) -> std::io::Result<Bytes> {
        self.as_ref().read_at(range)
    }

    fn storage_profile(&self) -> StorageProfile {
        self.as_ref().storage_profile()
    }
}
