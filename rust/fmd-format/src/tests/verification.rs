use fmd_common::ErrorKind;

use crate::{
    FragmentMetadataOptions,
    schema::Schema,
    tests::fixtures::{SAMPLE_FIELD_COUNT, open_bytes, sample_fragment, sample_schema},
};

fn options() -> FragmentMetadataOptions {
    FragmentMetadataOptions::new(SAMPLE_FIELD_COUNT)
}

fn size_mismatch_element(err: &fmd_common::Error) -> String {
    match err.kind() {
        ErrorKind::SizeMismatch { element, .. } => element.clone(),
        _ => panic!("unexpected error {err}"),
    }
}

#[test]
fn test_sample_fragment_verifies() {
    let schema = sample_schema();
    assert_eq!(schema.field_count(), SAMPLE_FIELD_COUNT);
    let fmd = open_bytes(&options(), sample_fragment().build());
    fmd.verify(&schema).unwrap();
}

#[test]
fn test_schema_field_count_mismatch() {
    let fmd = open_bytes(&options(), sample_fragment().build());
    let mut schema = sample_schema();
    schema.has_timestamps = true;
    let err = fmd.verify(&schema).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
}

#[test]
fn test_fixed_min_size_mismatch() {
    let data = sample_fragment()
        .tile_min(0, vec![0u8; 8], vec![])
        .build();
    let fmd = open_bytes(&options(), data);
    let err = fmd.verify(&sample_schema()).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::SizeMismatch {
            expected: 12,
            actual: 8,
            ..
        }
    ));
    assert_eq!(size_mismatch_element(&err), "field 0 'a' tile min");
}

#[test]
fn test_var_field_min_uses_offsets() {
    // Var-sized attributes store one 8-byte offset per tile in the fixed part.
    let data = sample_fragment()
        .tile_max(1, vec![0u8; 12], b"zz".to_vec())
        .build();
    let fmd = open_bytes(&options(), data);
    let err = fmd.verify(&sample_schema()).unwrap_err();
    assert_eq!(size_mismatch_element(&err), "field 1 'b' tile max");
}

#[test]
fn test_table_counts_must_agree() {
    let data = sample_fragment()
        .tile_var_sizes(1, vec![1, 2])
        .build();
    let fmd = open_bytes(&options(), data);
    let err = fmd.verify(&sample_schema()).unwrap_err();
    assert_eq!(size_mismatch_element(&err), "field 1 'b' tile var sizes");

    let data = sample_fragment()
        .tile_null_counts(0, vec![0, 0, 0, 0])
        .build();
    let fmd = open_bytes(&options(), data);
    let err = fmd.verify(&sample_schema()).unwrap_err();
    assert_eq!(size_mismatch_element(&err), "field 0 'a' tile null counts");
}

#[test]
fn test_sums_and_fragment_summary() {
    let data = sample_fragment().tile_sums(3, vec![0u8; 16]).build();
    let fmd = open_bytes(&options(), data);
    let err = fmd.verify(&sample_schema()).unwrap_err();
    assert_eq!(size_mismatch_element(&err), "field 3 'rows' tile sums");

    let data = sample_fragment()
        .field_summary(
            3,
            fmd_testkit::content::FieldSummary {
                min: vec![0u8; 4],
                ..Default::default()
            },
        )
        .build();
    let fmd = open_bytes(&options(), data);
    let err = fmd.verify(&sample_schema()).unwrap_err();
    assert_eq!(size_mismatch_element(&err), "field 3 'rows' fragment min");
}

#[test]
fn test_fields_without_tiles_are_skipped() {
    let data = sample_fragment()
        .tile_offsets(0, vec![])
        .tile_min(0, vec![1, 2, 3], vec![])
        .build();
    let fmd = open_bytes(&options(), data);
    fmd.verify(&sample_schema()).unwrap();
}

#[test]
fn test_schema_from_json_verifies() {
    let schema = Schema::from_json(
        r#"{
            "dimensions": [{"name": "rows", "datatype": "INT64"}],
            "attributes": [
                {"name": "a", "datatype": "INT32"},
                {"name": "b", "datatype": "STRING_UTF8", "cell_val_num": 4294967295, "nullable": true}
            ],
            "sparse": true
        }"#,
    )
    .unwrap();
    assert_eq!(schema, sample_schema_without_capacity());
    let fmd = open_bytes(&options(), sample_fragment().build());
    fmd.verify(&schema).unwrap();
}

fn sample_schema_without_capacity() -> Schema {
    Schema {
        capacity: 0,
        ..sample_schema()
    }
}
