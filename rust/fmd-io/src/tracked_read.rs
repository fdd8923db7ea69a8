//! Read-coverage tracking: a `ReadAt` wrapper that remembers every byte range
//! it has served, so that callers can report the regions of an object that
//! were never touched by a decoder.

use std::{ops::Range, sync::Mutex};

use bytes::Bytes;
use itertools::Itertools;

use crate::{ReadAt, StorageProfile};

/// A `ReadAt` wrapper recording the ranges served by the inner reader.
pub struct TrackedReadAt<R> {
    inner: R,
    reads: Mutex<Vec<Range<u64>>>,
}

impl<R> TrackedReadAt<R> {
    pub fn new(inner: R) -> TrackedReadAt<R> {
        TrackedReadAt {
            inner,
            reads: Mutex::new(Vec::new()),
        }
    }

    /// Returns the underlying reader.
    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Number of non-empty reads served so far.
    pub fn read_count(&self) -> usize {
        self.lock_reads().len()
    }

    /// Returns the sorted, coalesced list of byte ranges that were read at
    /// least once.
    pub fn read_ranges(&self) -> Vec<Range<u64>> {
        let mut reads = self.lock_reads().clone();
        reads.sort_by_key(|r| r.start);
        reads
            .into_iter()
            .coalesce(|a, b| {
                if b.start <= a.end {
                    Ok(a.start..a.end.max(b.end))
                } else {
                    Err((a, b))
                }
            })
            .collect()
    }

    fn lock_reads(&self) -> std::sync::MutexGuard<'_, Vec<Range<u64>>> {
        // Recorded ranges stay valid across a poisoned lock.
        self.reads
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<R: ReadAt> TrackedReadAt<R> {
    /// Returns the byte ranges of the underlying object that were never read.
    pub fn unread_ranges(&self) -> std::io::Result<Vec<Range<u64>>> {
        let size = self.inner.size()?;
        let mut holes = Vec::new();
        let mut pos = 0u64;
        for range in self.read_ranges() {
            if range.start > pos {
                holes.push(pos..range.start.min(size));
            }
            pos = pos.max(range.end);
        }
        if pos < size {
            holes.push(pos..size);
        }
        Ok(holes)
    }

    /// Returns `true` if every byte of the underlying object was read.
    pub fn is_fully_read(&self) -> std::io::Result<bool> {
        Ok(self.unread_ranges()?.is_empty())
    }
}

impl<R: ReadAt> ReadAt for TrackedReadAt<R> {
    fn size(&self) -> std::io::Result<u64> {
        self.inner.size()
    }

    fn read_at(&self, range: Range<u64>) -> std::io::Result<Bytes> {
        let start = range.start;
        let bytes = self.inner.read_at(range)?;
        if !bytes.is_empty() {
            self.lock_reads()
                .push(start..start + bytes.len() as u64);
        }
        Ok(bytes)
    }

    fn storage_profile(&self) -> StorageProfile {
        self.inner.storage_profile()
    }
}

#[cfg(test)]
mod tests {
    use crate::ReadAt;

    use super::TrackedReadAt;

    #[test]
    fn test_unread_ranges() {
        let tracked = TrackedReadAt::new(vec![0u8; 100]);
        assert_eq!(tracked.unread_ranges().unwrap(), vec![0..100]);

        tracked.read_at(10..20).unwrap();
        tracked.read_at(15..30).unwrap();
        tracked.read_at(50..60).unwrap();
        tracked.read_at(90..200).unwrap();

        assert_eq!(tracked.read_ranges(), vec![10..30, 50..60, 90..100]);
        assert_eq!(
            tracked.unread_ranges().unwrap(),
            vec![0..10, 30..50, 60..90]
        );
        assert!(!tracked.is_fully_read().unwrap());
    }

    #[test]
    fn test_fully_read() {
        let tracked = TrackedReadAt::new(vec![1u8; 16]);
        tracked.read_at(8..16).unwrap();
        tracked.read_at(0..8).unwrap();
        assert!(tracked.is_fully_read().unwrap());
        assert_eq!(tracked.read_count(), 2);
    }

    #[test]
    fn test_adjacent_ranges_coalesce() {
        let tracked = TrackedReadAt::new(vec![0u8; 10]);
        tracked.read_at(0..4).unwrap();
        tracked.read_at(4..6).unwrap();
        tracked.read_at(20..30).unwrap();
        assert_eq!(tracked.read_ranges(), vec![0..6]);
        assert_eq!(tracked.read_count(), 2);
    }
}
