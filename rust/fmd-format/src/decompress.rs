//! Expansion of a tile's chunk table into its unfiltered bytes.

use flate2::{Decompress, FlushDecompress, Status};
use fmd_common::{Error, Result};

use crate::chunk::{ChunkLayout, ChunkTable, parse_filtered_metadata};

/// Decompresses every chunk of `table` into `dst`.
///
/// `dst` must be exactly as long as the tile's declared size, and the chunks
/// must fill it completely: chunk `i` lands at its running unfiltered offset.
pub fn decompress_chunks(table: &ChunkTable, dst: &mut [u8]) -> Result<()> {
    if table.unfiltered_size() != dst.len() as u64 {
        return Err(Error::size_mismatch(
            "tile chunks",
            dst.len() as u64,
            table.unfiltered_size(),
        ));
    }

    let written = table
        .chunks()
        .iter()
        .enumerate()
        .try_fold(0u64, |written, (i, chunk)| {
            let start = chunk.unfiltered_offset as usize;
            let len = chunk.unfiltered_size as usize;
            let remaining = dst.len().saturating_sub(start);
            let region = dst.get_mut(start..start + len).ok_or_else(|| {
                Error::out_of_bounds(
                    "tile unfiltered data",
                    start as u64,
                    len as u64,
                    remaining as u64,
                )
            })?;
            log::trace!("decompressing chunk {i}: {len} bytes at {start}");
            decompress_chunk(chunk, region).map_err(|e| e.context(format!("chunk {i}")))?;
            Ok::<_, Error>(written + len as u64)
        })?;

    if written != dst.len() as u64 {
        return Err(Error::size_mismatch("tile", dst.len() as u64, written));
    }
    Ok(())
}

/// Decompresses the data parts of one chunk into `dst`, which covers exactly
/// the chunk's unfiltered region.
///
/// Parts are laid out back to back in both the filtered data and `dst`.
pub fn decompress_chunk(chunk: &ChunkLayout, dst: &mut [u8]) -> Result<()> {
    let parts = parse_filtered_metadata(chunk.filtered_metadata)?;
    let src = chunk.filtered_data;

    let (src_pos, dst_pos) = parts.iter().enumerate().try_fold(
        (0usize, 0usize),
        |(src_pos, dst_pos), (j, part)| {
            let compressed = part.compressed_size as usize;
            let uncompressed = part.uncompressed_size as usize;
            let input = src.get(src_pos..src_pos + compressed).ok_or_else(|| {
                Error::out_of_bounds(
                    "chunk filtered data",
                    src_pos as u64,
                    compressed as u64,
                    (src.len() - src_pos) as u64,
                )
            })?;
            let dst_len = dst.len();
            let output = dst
                .get_mut(dst_pos..dst_pos + uncompressed)
                .ok_or_else(|| {
                    Error::out_of_bounds(
                        "chunk unfiltered data",
                        dst_pos as u64,
                        uncompressed as u64,
                        (dst_len - dst_pos) as u64,
                    )
                })?;
            log::trace!(
                "part {j}: {compressed} bytes at {src_pos} -> {uncompressed} bytes at {dst_pos}"
            );
            decompress_part(input, output).map_err(|e| e.context(format!("part {j}")))?;
            Ok::<_, Error>((src_pos + compressed, dst_pos + uncompressed))
        },
    )?;

    if dst_pos != dst.len() {
        return Err(Error::size_mismatch(
            "chunk",
            dst.len() as u64,
            dst_pos as u64,
        ));
    }
    if src_pos != src.len() {
        log::warn!(
            "{} filtered bytes of a chunk were not covered by its parts",
            src.len() - src_pos
        );
    }
    Ok(())
}

/// Inflates a complete zlib stream from `src` into `dst` in a single call.
///
/// The stream must end exactly at the end of `src` and produce exactly
/// `dst.len()` bytes.
pub fn decompress_part(src: &[u8], dst: &mut [u8]) -> Result<()> {
    let mut inflater = Decompress::new(true);
    let status = inflater
        .decompress(src, dst, FlushDecompress::Finish)
        .map_err(|e| Error::decompression_failed("chunk part", e.to_string()))?;

    if status != Status::StreamEnd {
        return Err(Error::decompression_failed(
            "chunk part",
            format!(
                "stream incomplete after producing {} of {} bytes",
                inflater.total_out(),
                dst.len()
            ),
        ));
    }
    if inflater.total_out() != dst.len() as u64 {
        return Err(Error::decompression_failed(
            "chunk part",
            format!(
                "produced {} bytes, expected {}",
                inflater.total_out(),
                dst.len()
            ),
        ));
    }
    if inflater.total_in() != src.len() as u64 {
        return Err(Error::decompression_failed(
            "chunk part",
            format!(
                "consumed {} of {} compressed bytes",
                inflater.total_in(),
                src.len()
            ),
        ));
    }
    Ok(())
}
