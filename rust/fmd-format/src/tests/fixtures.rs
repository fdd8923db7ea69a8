//! A small but complete fragment used across the scenario tests.

use std::sync::Arc;

use fmd_io::ReadAt;
use fmd_testkit::{content::FieldSummary, fragment::FragmentBuilder};

use crate::{
    FragmentMetadata, FragmentMetadataOptions,
    datatype::Datatype,
    schema::{Attribute, Dimension, Schema, VAR_NUM},
};

/// Attributes `a: INT32`, `b: STRING_UTF8 (var, nullable)`, dimension
/// `rows: INT64`. Fields: `a`, `b`, coordinates, `rows`.
pub fn sample_schema() -> Schema {
    Schema {
        dimensions: vec![Dimension {
            name: "rows".to_string(),
            datatype: Datatype::Int64,
        }],
        attributes: vec![
            Attribute {
                name: "a".to_string(),
                datatype: Datatype::Int32,
                cell_val_num: 1,
                nullable: false,
            },
            Attribute {
                name: "b".to_string(),
                datatype: Datatype::StringUtf8,
                cell_val_num: VAR_NUM,
                nullable: true,
            },
        ],
        capacity: 1000,
        sparse: true,
        ..Default::default()
    }
}

pub const SAMPLE_FIELD_COUNT: usize = 4;
pub const SAMPLE_TILE_NUM: usize = 3;

fn le_u64s(values: &[u64]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn le_i32s(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Builder for the sample fragment; tests tweak it before calling `build`.
pub fn sample_fragment() -> FragmentBuilder {
    FragmentBuilder::new(SAMPLE_FIELD_COUNT)
        .schema_name("__1700000000000_1700000000000_sample")
        .fragment_type(0)
        .non_empty_domain(Some([0.0, 2999.0, 0.0, 0.0]))
        .sparse_tile_num(3)
        .last_tile_cell_num(1000)
        .file_sizes(
            vec![12000, 24000, 0, 24000],
            vec![0, 51234, 0, 0],
            vec![0, 3000, 0, 0],
        )
        .rtree(b"rtree: 3 mbrs, dim rows".repeat(4))
        // a
        .tile_offsets(0, vec![0, 4000, 8000])
        .tile_min(0, le_i32s(&[-10, 5, 77]), vec![])
        .tile_max(0, le_i32s(&[100, 500, 770]), vec![])
        .tile_sums(0, le_u64s(&[1000, 20000, 300000]))
        .tile_null_counts(0, vec![0, 0, 0])
        .field_summary(
            0,
            FieldSummary {
                min: (-10i32).to_le_bytes().to_vec(),
                max: 770i32.to_le_bytes().to_vec(),
                sum: 321000,
                null_count: 0,
            },
        )
        // b
        .tile_offsets(1, vec![0, 8000, 16000])
        .tile_var_offsets(1, vec![0, 17000, 34000])
        .tile_var_sizes(1, vec![17000, 17000, 17234])
        .tile_validity_offsets(1, vec![0, 1000, 2000])
        .tile_min(1, le_u64s(&[0, 3, 8]), b"aaabbbbbccc".to_vec())
        .tile_max(1, le_u64s(&[0, 4, 9]), b"zzzzyyyyyxxxx".to_vec())
        .tile_null_counts(1, vec![12, 0, 7])
        .field_summary(
            1,
            FieldSummary {
                min: b"aaa".to_vec(),
                max: b"zzzz".to_vec(),
                sum: 0,
                null_count: 19,
            },
        )
        // rows
        .tile_offsets(3, vec![0, 8000, 16000])
        .tile_min(3, le_u64s(&[0, 1000, 2000]), vec![])
        .tile_max(3, le_u64s(&[999, 1999, 2999]), vec![])
        .tile_sums(3, le_u64s(&[499500, 1499500, 2499500]))
        .field_summary(
            3,
            FieldSummary {
                min: 0u64.to_le_bytes().to_vec(),
                max: 2999u64.to_le_bytes().to_vec(),
                sum: 4498500,
                null_count: 0,
            },
        )
        .processed_conditions(b"cond-1\0cond-2\0".to_vec())
}

pub fn open_bytes(options: &FragmentMetadataOptions, data: Vec<u8>) -> FragmentMetadata {
    let source: Arc<dyn ReadAt> = Arc::new(data);
    options.open(source).unwrap()
}
