use std::ops::Range;

/// Clips a requested read range to an object of `size` bytes.
///
/// A reversed range is an error. A range starting at or past the end of the
/// object clips to an empty range.
pub fn clamp_read_range(range: Range<u64>, size: u64) -> std::io::Result<Range<u64>> {
    if range.end < range.start {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("reversed read range {}..{}", range.start, range.end),
        ));
    }
    let start = range.start.min(size);
    Ok(start..range.end.min(size))
}
