//! Fragment metadata files on local disk.

use std::{fs::File, ops::Range, path::Path};

use bytes::{Bytes, BytesMut};

use crate::{ReadAt, StorageProfile, utils::clamp_read_range};

/// Serves positional reads from a local fragment metadata file.
///
/// Metadata files are written once, so the length is taken when the reader is
/// created and never refreshed.
pub struct FileReader {
    file: File,
    len: u64,
}

impl FileReader {
    pub fn new(file: File) -> std::io::Result<FileReader> {
        let len = file.metadata()?.len();
        Ok(FileReader { file, len })
    }

    pub fn open(path: impl AsRef<Path>) -> std::io::Result<FileReader> {
        FileReader::new(File::open(path)?)
    }
}

impl ReadAt for FileReader {
    fn size(&self) -> std::io::Result<u64> {
        Ok(self.len)
    }

    fn read_at(&self, range: Range<u64>) -> std::io::Result<Bytes> {
        let range = clamp_read_range(range, self.len)?;
        if range.is_empty() {
            return Ok(Bytes::new());
        }
        let mut buf = BytesMut::zeroed((range.end - range.start) as usize);
        read_exact_at(&self.file, &mut buf, range.start)?;
        Ok(buf.freeze())
    }

    fn storage_profile(&self) -> StorageProfile {
        StorageProfile {
            min_io_size: 16 * 1024,
            max_io_size: 1024 * 1024,
        }
    }
}

#[cfg(unix)]
fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> std::io::Result<()> {
    std::os::unix::fs::FileExt::read_exact_at(file, buf, offset)
}

#[cfg(windows)]
fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> std::io::Result<()> {
    use std::os::windows::fs::FileExt;

    let mut filled = 0;
    while filled < buf.len() {
        let n = file.seek_read(&mut buf[filled..], offset + filled as u64)?;
        if n == 0 {
            return Err(std::io::ErrorKind::UnexpectedEof.into());
        }
        filled += n;
    }
    Ok(())
}
