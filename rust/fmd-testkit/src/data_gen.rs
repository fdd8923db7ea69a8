//! Random payloads and temporary files for tests.

use std::path::PathBuf;

use tempfile::TempDir;

/// Returns `len` random bytes drawn from `rng`.
pub fn random_bytes(rng: &mut fastrand::Rng, len: usize) -> Vec<u8> {
    std::iter::repeat_with(|| rng.u8(..)).take(len).collect()
}

/// Returns `len` bytes of low-entropy text, which compresses well.
pub fn compressible_bytes(rng: &mut fastrand::Rng, len: usize) -> Vec<u8> {
    std::iter::repeat_with(|| rng.alphabetic() as u8)
        .take(len)
        .map(|b| b & 0xF3)
        .collect()
}

/// Returns `count` sorted, strictly increasing offsets.
pub fn ascending_offsets(rng: &mut fastrand::Rng, count: usize) -> Vec<u64> {
    let mut pos = 0u64;
    (0..count)
        .map(|_| {
            let current = pos;
            pos += rng.u64(1..4096);
            current
        })
        .collect()
}

/// A temporary directory holding a single file, removed on drop.
pub struct TempFile {
    dir: TempDir,
    path: PathBuf,
}

impl TempFile {
    /// Writes `data` to `name` inside a fresh temporary directory.
    pub fn with_contents(name: &str, data: &[u8]) -> std::io::Result<TempFile> {
        let dir = TempDir::new()?;
        let path = dir.path().join(name);
        std::fs::write(&path, data)?;
        Ok(TempFile { dir, path })
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    pub fn dir(&self) -> &std::path::Path {
        self.dir.path()
    }
}
