//! Builder for complete fragment metadata files.
//!
//! Generic tiles are written back to back from offset 0 (R-tree first), then
//! the footer, then the footer size as a trailing `u64`.

use crate::{
    content::{self, FieldSummary},
    tile::TileBuilder,
};

/// Fixed and variable parts of a min or max values tile.
#[derive(Debug, Clone, Default)]
struct Values {
    fixed: Vec<u8>,
    var: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct FragmentBuilder {
    field_count: usize,
    version: u32,
    schema_name: String,
    fragment_type: u8,
    non_empty_domain: Option<[f64; 4]>,
    sparse_tile_num: u64,
    last_tile_cell_num: u64,
    has_timestamps: bool,
    has_delete_meta: bool,
    file_sizes: Vec<u64>,
    file_var_sizes: Vec<u64>,
    file_validity_sizes: Vec<u64>,
    rtree: Vec<u8>,
    tile_offsets: Vec<Vec<u64>>,
    tile_var_offsets: Vec<Vec<u64>>,
    tile_var_sizes: Vec<Vec<u64>>,
    tile_validity_offsets: Vec<Vec<u64>>,
    tile_min: Vec<Values>,
    tile_max: Vec<Values>,
    tile_sums: Vec<Vec<u8>>,
    tile_null_counts: Vec<Vec<u64>>,
    summaries: Vec<FieldSummary>,
    processed_conditions: Vec<u8>,
    chunk_size: usize,
    footer_padding: Vec<u8>,
}

impl FragmentBuilder {
    pub fn new(field_count: usize) -> FragmentBuilder {
        FragmentBuilder {
            field_count,
            version: crate::tile::DEFAULT_TILE_VERSION,
            schema_name: "__schema_1".to_string(),
            fragment_type: 0,
            non_empty_domain: None,
            sparse_tile_num: 0,
            last_tile_cell_num: 0,
            has_timestamps: false,
            has_delete_meta: false,
            file_sizes: vec![0; field_count],
            file_var_sizes: vec![0; field_count],
            file_validity_sizes: vec![0; field_count],
            rtree: Vec::new(),
            tile_offsets: vec![Vec::new(); field_count],
            tile_var_offsets: vec![Vec::new(); field_count],
            tile_var_sizes: vec![Vec::new(); field_count],
            tile_validity_offsets: vec![Vec::new(); field_count],
            tile_min: vec![Values::default(); field_count],
            tile_max: vec![Values::default(); field_count],
            tile_sums: vec![Vec::new(); field_count],
            tile_null_counts: vec![Vec::new(); field_count],
            summaries: vec![FieldSummary::default(); field_count],
            processed_conditions: Vec::new(),
            chunk_size: usize::MAX,
            footer_padding: Vec::new(),
        }
    }

    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn schema_name(mut self, name: &str) -> Self {
        self.schema_name = name.to_string();
        self
    }

    /// `0` for sparse, `1` for dense.
    pub fn fragment_type(mut self, fragment_type: u8) -> Self {
        self.fragment_type = fragment_type;
        self
    }

    pub fn non_empty_domain(mut self, domain: Option<[f64; 4]>) -> Self {
        self.non_empty_domain = domain;
        self
    }

    pub fn sparse_tile_num(mut self, n: u64) -> Self {
        self.sparse_tile_num = n;
        self
    }

    pub fn last_tile_cell_num(mut self, n: u64) -> Self {
        self.last_tile_cell_num = n;
        self
    }

    pub fn has_timestamps(mut self, value: bool) -> Self {
        self.has_timestamps = value;
        self
    }

    pub fn has_delete_meta(mut self, value: bool) -> Self {
        self.has_delete_meta = value;
        self
    }

    pub fn file_sizes(mut self, fixed: Vec<u64>, var: Vec<u64>, validity: Vec<u64>) -> Self {
        self.file_sizes = fixed;
        self.file_var_sizes = var;
        self.file_validity_sizes = validity;
        self
    }

    pub fn rtree(mut self, data: Vec<u8>) -> Self {
        self.rtree = data;
        self
    }

    pub fn processed_conditions(mut self, data: Vec<u8>) -> Self {
        self.processed_conditions = data;
        self
    }

    pub fn tile_offsets(mut self, field: usize, offsets: Vec<u64>) -> Self {
        self.tile_offsets[field] = offsets;
        self
    }

    pub fn tile_var_offsets(mut self, field: usize, offsets: Vec<u64>) -> Self {
        self.tile_var_offsets[field] = offsets;
        self
    }

    pub fn tile_var_sizes(mut self, field: usize, sizes: Vec<u64>) -> Self {
        self.tile_var_sizes[field] = sizes;
        self
    }

    pub fn tile_validity_offsets(mut self, field: usize, offsets: Vec<u64>) -> Self {
        self.tile_validity_offsets[field] = offsets;
        self
    }

    pub fn tile_min(mut self, field: usize, fixed: Vec<u8>, var: Vec<u8>) -> Self {
        self.tile_min[field] = Values { fixed, var };
        self
    }

    pub fn tile_max(mut self, field: usize, fixed: Vec<u8>, var: Vec<u8>) -> Self {
        self.tile_max[field] = Values { fixed, var };
        self
    }

    pub fn tile_sums(mut self, field: usize, sums: Vec<u8>) -> Self {
        self.tile_sums[field] = sums;
        self
    }

    pub fn tile_null_counts(mut self, field: usize, counts: Vec<u64>) -> Self {
        self.tile_null_counts[field] = counts;
        self
    }

    pub fn field_summary(mut self, field: usize, summary: FieldSummary) -> Self {
        self.summaries[field] = summary;
        self
    }

    /// Splits every generic tile into chunks of at most `chunk_size` bytes.
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Extra bytes appended to the footer record, inside the declared size.
    pub fn footer_padding(mut self, bytes: Vec<u8>) -> Self {
        self.footer_padding = bytes;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut file = Vec::new();
        let mut write_tile = |content: &[u8]| -> u64 {
            let offset = file.len() as u64;
            file.extend(TileBuilder::with_content(content, self.chunk_size).build());
            offset
        };

        let rtree = write_tile(&self.rtree);
        let tile_offsets = self
            .tile_offsets
            .iter()
            .map(|v| write_tile(&content::offsets(v)))
            .collect::<Vec<_>>();
        let tile_var_offsets = self
            .tile_var_offsets
            .iter()
            .map(|v| write_tile(&content::offsets(v)))
            .collect::<Vec<_>>();
        let tile_var_sizes = self
            .tile_var_sizes
            .iter()
            .map(|v| write_tile(&content::offsets(v)))
            .collect::<Vec<_>>();
        let tile_validity_offsets = self
            .tile_validity_offsets
            .iter()
            .map(|v| write_tile(&content::offsets(v)))
            .collect::<Vec<_>>();
        let tile_min = self
            .tile_min
            .iter()
            .map(|v| write_tile(&content::values(&v.fixed, &v.var)))
            .collect::<Vec<_>>();
        let tile_max = self
            .tile_max
            .iter()
            .map(|v| write_tile(&content::values(&v.fixed, &v.var)))
            .collect::<Vec<_>>();
        let tile_sums = self
            .tile_sums
            .iter()
            .map(|v| write_tile(&content::sums(v)))
            .collect::<Vec<_>>();
        let tile_null_counts = self
            .tile_null_counts
            .iter()
            .map(|v| write_tile(&content::null_counts(v)))
            .collect::<Vec<_>>();
        let summary = write_tile(&content::fragment_summary(&self.summaries));
        let processed_conditions = write_tile(&self.processed_conditions);

        let mut footer = Vec::new();
        put_u32(&mut footer, self.version);
        put_u64(&mut footer, self.schema_name.len() as u64);
        footer.extend_from_slice(self.schema_name.as_bytes());
        footer.push(self.fragment_type);
        match &self.non_empty_domain {
            Some(bounds) => {
                footer.push(0);
                for b in bounds {
                    footer.extend_from_slice(&b.to_le_bytes());
                }
            }
            None => footer.push(1),
        }
        put_u64(&mut footer, self.sparse_tile_num);
        put_u64(&mut footer, self.last_tile_cell_num);
        footer.push(self.has_timestamps as u8);
        footer.push(self.has_delete_meta as u8);
        put_u64s(&mut footer, &self.file_sizes);
        put_u64s(&mut footer, &self.file_var_sizes);
        put_u64s(&mut footer, &self.file_validity_sizes);
        put_u64(&mut footer, rtree);
        for table in [
            &tile_offsets,
            &tile_var_offsets,
            &tile_var_sizes,
            &tile_validity_offsets,
            &tile_min,
            &tile_max,
            &tile_sums,
            &tile_null_counts,
        ] {
            put_u64s(&mut footer, table);
        }
        put_u64(&mut footer, summary);
        put_u64(&mut footer, processed_conditions);
        footer.extend_from_slice(&self.footer_padding);

        file.extend_from_slice(&footer);
        put_u64(&mut file, footer.len() as u64);
        file
    }

    pub fn field_count(&self) -> usize {
        self.field_count
    }
}

fn put_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_u64(buf: &mut Vec<u8>, v: u64) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_u64s(buf: &mut Vec<u8>, values: &[u64]) {
    for v in values {
        put_u64(buf, *v);
    }
}

#[cfg(test)]
mod tests {
    use super::FragmentBuilder;

    #[test]
    fn test_footer_trailer() {
        let file = FragmentBuilder::new(3).build();
        let footer_size = u64::from_le_bytes(file[file.len() - 8..].try_into().unwrap());
        // version, name, type, null flag, two counts, two flags,
        // 3 size tables, rtree, 8 offset tables, 2 scalar offsets
        let expected = 4 + 8 + 10 + 1 + 1 + 16 + 2 + 3 * 3 * 8 + 8 + 8 * 3 * 8 + 16;
        assert_eq!(footer_size, expected);
    }

    #[test]
    fn test_domain_adds_bounds() {
        let without = FragmentBuilder::new(1).build();
        let with = FragmentBuilder::new(1)
            .non_empty_domain(Some([0.0, 1.0, 2.0, 3.0]))
            .build();
        assert_eq!(with.len(), without.len() + 32);
    }
}
