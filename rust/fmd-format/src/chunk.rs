//! Chunk framing of a tile's filtered payload.
//!
//! ```text
//! chunk_count: u64
//! repeated chunk_count times:
//!     unfiltered_size: u32
//!     filtered_size: u32
//!     filtered_metadata_size: u32
//!     filtered_metadata: [u8; filtered_metadata_size]
//!     filtered_data: [u8; filtered_size]
//! ```
//!
//! The filtered metadata of a chunk compressed by the terminal filter stage is
//! itself a small record:
//!
//! ```text
//! metadata_part_count: u32     (always 0)
//! data_part_count: u32
//! repeated data_part_count times:
//!     uncompressed_size: u32
//!     compressed_size: u32
//! ```

use fmd_common::{Error, ErrorKind, Result};

use crate::cursor::ByteCursor;

/// Minimal encoded size of a chunk record (the three size fields).
const CHUNK_RECORD_MIN_SIZE: usize = 12;

/// Upper bound on the deflate expansion ratio. A part declaring more
/// uncompressed bytes than this times its compressed size cannot be valid.
const MAX_DEFLATE_RATIO: u64 = 1032;

/// One chunk of a tile payload, borrowed from the payload buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkLayout<'a> {
    /// Size of the chunk once decompressed.
    pub unfiltered_size: u32,
    /// Position of the decompressed chunk within the tile.
    pub unfiltered_offset: u64,
    pub filtered_metadata: &'a [u8],
    pub filtered_data: &'a [u8],
}

/// Parsed chunk table of a tile payload.
#[derive(Debug, Clone)]
pub struct ChunkTable<'a> {
    chunks: Vec<ChunkLayout<'a>>,
    unfiltered_size: u64,
}

impl ChunkLayout<'_> {
    /// Parses the chunk's filtered metadata and checks the part sizes against
    /// the chunk: uncompressed sizes must add up to `unfiltered_size`, and
    /// compressed sizes must fit in `filtered_data`.
    pub fn parts(&self) -> Result<Vec<PartDescriptor>> {
        let parts = parse_filtered_metadata(self.filtered_metadata)?;
        let (uncompressed, compressed) = parts.iter().try_fold(
            (0u64, 0u64),
            |(uncompressed, compressed), part| -> Result<(u64, u64)> {
                let part_compressed = part.compressed_size as u64;
                let part_uncompressed = part.uncompressed_size as u64;
                if part_uncompressed > part_compressed * MAX_DEFLATE_RATIO + 16 {
                    return Err(Error::invalid_format(
                        "chunk part",
                        format!(
                            "{part_compressed} compressed bytes cannot expand to \
                             {part_uncompressed} bytes"
                        ),
                    ));
                }
                Ok((uncompressed + part_uncompressed, compressed + part_compressed))
            },
        )?;
        if uncompressed != self.unfiltered_size as u64 {
            return Err(Error::size_mismatch(
                "chunk parts",
                self.unfiltered_size as u64,
                uncompressed,
            ));
        }
        if compressed > self.filtered_data.len() as u64 {
            return Err(Error::out_of_bounds(
                "chunk filtered data",
                0,
                compressed,
                self.filtered_data.len() as u64,
            ));
        }
        Ok(parts)
    }
}

impl<'a> ChunkTable<'a> {
    /// Parses the chunk table at the start of `payload`.
    ///
    /// Each chunk's `unfiltered_offset` is the running sum of the unfiltered
    /// sizes of the chunks before it.
    pub fn parse(payload: &'a [u8]) -> Result<ChunkTable<'a>> {
        let mut cursor = ByteCursor::new(payload, "chunk table");
        let count = cursor.read_fixed::<u64>()?;
        let capacity = (count as usize).min(cursor.remaining() / CHUNK_RECORD_MIN_SIZE);
        let mut chunks = Vec::with_capacity(capacity);

        let mut offset = 0u64;
        for _ in 0..count {
            let unfiltered_size = cursor.read_fixed::<u32>()?;
            let filtered_size = cursor.read_fixed::<u32>()?;
            let metadata_size = cursor.read_fixed::<u32>()?;
            let filtered_metadata = cursor.borrow_bytes(metadata_size as u64)?;
            let filtered_data = cursor.borrow_bytes(filtered_size as u64)?;
            log::trace!(
                "chunk {}: unfiltered {unfiltered_size} at {offset}, filtered {filtered_size}, \
                 metadata {metadata_size}",
                chunks.len()
            );
            chunks.push(ChunkLayout {
                unfiltered_size,
                unfiltered_offset: offset,
                filtered_metadata,
                filtered_data,
            });
            offset += unfiltered_size as u64;
        }

        if !cursor.is_empty() {
            log::warn!(
                "{} unparsed bytes after {count} chunks in tile payload",
                cursor.remaining()
            );
        }

        Ok(ChunkTable {
            chunks,
            unfiltered_size: offset,
        })
    }

    pub fn chunks(&self) -> &[ChunkLayout<'a>] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Sum of the unfiltered sizes of all chunks.
    pub fn unfiltered_size(&self) -> u64 {
        self.unfiltered_size
    }

    /// Checks the part sizes of every chunk (see [`ChunkLayout::parts`]), so
    /// that `unfiltered_size` is backed by actual compressed data.
    pub fn validate_parts(&self) -> Result<()> {
        self.chunks.iter().enumerate().try_for_each(|(i, chunk)| {
            chunk
                .parts()
                .map(|_| ())
                .map_err(|e| e.context(format!("chunk {i}")))
        })
    }
}

/// Sizes of one independently compressed part of a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartDescriptor {
    pub uncompressed_size: u32,
    pub compressed_size: u32,
}

/// Parses a chunk's filtered-metadata record into its data part descriptors.
///
/// A non-zero metadata part count means an earlier filter stage left its own
/// metadata behind, which this decoder cannot undo.
pub fn parse_filtered_metadata(metadata: &[u8]) -> Result<Vec<PartDescriptor>> {
    let mut cursor = ByteCursor::new(metadata, "chunk filtered metadata");
    let metadata_parts = cursor.read_fixed::<u32>()?;
    if metadata_parts != 0 {
        return Err(ErrorKind::UnsupportedFilterStage { metadata_parts }.into());
    }
    let data_parts = cursor.read_fixed::<u32>()?;
    (0..data_parts)
        .map(|_| -> Result<PartDescriptor> {
            Ok(PartDescriptor {
                uncompressed_size: cursor.read_fixed::<u32>()?,
                compressed_size: cursor.read_fixed::<u32>()?,
            })
        })
        .collect()
}
