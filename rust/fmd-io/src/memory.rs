//! In-memory fragment metadata objects, mostly used by tests and by callers
//! that already hold the whole file.

use std::ops::Range;

use bytes::Bytes;

use crate::{ReadAt, StorageProfile, utils::clamp_read_range};

fn memory_profile(len: usize) -> StorageProfile {
    StorageProfile {
        min_io_size: 1,
        max_io_size: len.min(StorageProfile::default().max_io_size),
    }
}

/// Slices without copying.
impl ReadAt for Bytes {
    fn size(&self) -> std::io::Result<u64> {
        Ok(self.len() as u64)
    }

    fn read_at(&self, range: Range<u64>) -> std::io::Result<Bytes> {
        let range = clamp_read_range(range, self.len() as u64)?;
        Ok(self.slice(range.start as usize..range.end as usize))
    }

    fn storage_profile(&self) -> StorageProfile {
        memory_profile(self.len())
    }
}

/// Copies the requested range out of the vector.
impl ReadAt for Vec<u8> {
    fn size(&self) -> std::io::Result<u64> {
        Ok(self.len() as u64)
    }

    fn read_at(&self, range: Range<u64>) -> std::io::Result<Bytes> {
        let range = clamp_read_range(range, self.len() as u64)?;
        Ok(Bytes::copy_from_slice(
            &self[range.start as usize..range.end as usize],
        ))
    }

    fn storage_profile(&self) -> StorageProfile {
        memory_profile(self.len())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;

    use crate::ReadAt;

    #[test]
    fn test_vec_reader() {
        let footer = b"\x10\x00\x00\x00\x00\x00\x00\x00".to_vec();
        assert_eq!(footer.size().unwrap(), 8);
        assert_eq!(footer.read_at(0..1).unwrap().as_ref(), b"\x10");
        assert_eq!(footer.read_at(6..64).unwrap().as_ref(), b"\x00\x00");
        assert!(footer.read_at(9..12).unwrap().is_empty());

        let shared = Arc::new(footer) as Arc<dyn ReadAt>;
        assert_eq!(shared.read_at(0..1).unwrap().as_ref(), b"\x10");
        assert_eq!(shared.storage_profile().max_io_size, 8);
    }

    #[test]
    fn test_bytes_reader() {
        let blob = Bytes::from_static(b"fragment");
        assert_eq!(blob.size().unwrap(), 8);
        assert_eq!(blob.read_at(4..8).unwrap().as_ref(), b"ment");
        #[allow(clippy::reversed_empty_ranges)]
        let reversed = blob.read_at(5..2);
        assert!(reversed.is_err());
    }
}
