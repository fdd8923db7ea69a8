//! Interpretation of decoded generic tile contents.
//!
//! An empty tile yields an empty result for every kind.

use fmd_common::Result;

use crate::{cursor::ByteCursor, field_table::FieldTable};

/// Fixed-size and variable-size parts of a per-tile min or max table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileValues {
    pub fixed: Vec<u8>,
    pub var: Vec<u8>,
}

impl TileValues {
    pub fn is_empty(&self) -> bool {
        self.fixed.is_empty() && self.var.is_empty()
    }
}

/// Fragment-level statistics of one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSummary {
    pub min: Vec<u8>,
    pub max: Vec<u8>,
    pub sum: u64,
    pub null_count: u64,
}

/// `count: u64` followed by `count` values. A zero count ends the tile.
pub(crate) fn decode_offsets(data: &[u8]) -> Result<Vec<u64>> {
    if data.is_empty() {
        return Ok(Vec::new());
    }
    let mut cursor = ByteCursor::new(data, "offsets tile");
    let count = cursor.read_fixed::<u64>()?;
    if count == 0 {
        return Ok(Vec::new());
    }
    cursor.read_u64_vec(count)
}

/// `fixed_size: u64`, `var_size: u64`, fixed bytes, then var bytes when
/// `var_size` is non-zero.
pub(crate) fn decode_values(data: &[u8]) -> Result<TileValues> {
    if data.is_empty() {
        return Ok(TileValues::default());
    }
    let mut cursor = ByteCursor::new(data, "values tile");
    let fixed_size = cursor.read_fixed::<u64>()?;
    let var_size = cursor.read_fixed::<u64>()?;
    let fixed = cursor.read_bytes(fixed_size)?;
    let var = if var_size != 0 {
        cursor.read_bytes(var_size)?
    } else {
        Vec::new()
    };
    Ok(TileValues { fixed, var })
}

/// `size: u64` followed by `size` bytes.
pub(crate) fn decode_sums(data: &[u8]) -> Result<Vec<u8>> {
    if data.is_empty() {
        return Ok(Vec::new());
    }
    let mut cursor = ByteCursor::new(data, "sums tile");
    let size = cursor.read_fixed::<u64>()?;
    cursor.read_bytes(size)
}

/// `count: u64` followed by `count` null counts.
pub(crate) fn decode_null_counts(data: &[u8]) -> Result<Vec<u64>> {
    if data.is_empty() {
        return Ok(Vec::new());
    }
    let mut cursor = ByteCursor::new(data, "null counts tile");
    let count = cursor.read_fixed::<u64>()?;
    cursor.read_u64_vec(count)
}

/// One record per field, in field order: length-prefixed min and max, then
/// sum and null count.
pub(crate) fn decode_fragment_summary(
    data: &[u8],
    field_count: usize,
) -> Result<FieldTable<FieldSummary>> {
    if data.is_empty() {
        return FieldTable::new(vec![FieldSummary::default(); field_count], field_count);
    }
    let mut cursor = ByteCursor::new(data, "fragment summary tile");
    FieldTable::try_from_fn(field_count, |_| {
        let min_len = cursor.read_fixed::<u64>()?;
        let min = cursor.read_bytes(min_len)?;
        let max_len = cursor.read_fixed::<u64>()?;
        let max = cursor.read_bytes(max_len)?;
        Ok(FieldSummary {
            min,
            max,
            sum: cursor.read_fixed()?,
            null_count: cursor.read_fixed()?,
        })
    })
}
