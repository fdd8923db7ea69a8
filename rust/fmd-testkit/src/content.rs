//! Encoders for the unfiltered content of fragment metadata generic tiles.

/// Offsets tile: `count: u64` followed by `count` offsets.
pub fn offsets(values: &[u64]) -> Vec<u8> {
    let mut buf = (values.len() as u64).to_le_bytes().to_vec();
    for v in values {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    buf
}

/// Min/max values tile: both sizes up front, then the fixed and var parts.
pub fn values(fixed: &[u8], var: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(16 + fixed.len() + var.len());
    buf.extend_from_slice(&(fixed.len() as u64).to_le_bytes());
    buf.extend_from_slice(&(var.len() as u64).to_le_bytes());
    buf.extend_from_slice(fixed);
    buf.extend_from_slice(var);
    buf
}

/// Sums tile: `size: u64` followed by `size` bytes.
pub fn sums(data: &[u8]) -> Vec<u8> {
    let mut buf = (data.len() as u64).to_le_bytes().to_vec();
    buf.extend_from_slice(data);
    buf
}

/// Null-count tile; same layout as an offsets tile.
pub fn null_counts(counts: &[u64]) -> Vec<u8> {
    offsets(counts)
}

/// Per-field fragment-level statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSummary {
    pub min: Vec<u8>,
    pub max: Vec<u8>,
    pub sum: u64,
    pub null_count: u64,
}

/// Fragment summary tile: for each field, length-prefixed min and max, then
/// the sum and null count.
pub fn fragment_summary(fields: &[FieldSummary]) -> Vec<u8> {
    let mut buf = Vec::new();
    for field in fields {
        buf.extend_from_slice(&(field.min.len() as u64).to_le_bytes());
        buf.extend_from_slice(&field.min);
        buf.extend_from_slice(&(field.max.len() as u64).to_le_bytes());
        buf.extend_from_slice(&field.max);
        buf.extend_from_slice(&field.sum.to_le_bytes());
        buf.extend_from_slice(&field.null_count.to_le_bytes());
    }
    buf
}
