//! Format-level scenarios: tiles framed and compressed the way writers
//! produce them, and the ways such files go wrong.

use std::sync::Arc;

use fmd_common::ErrorKind;
use fmd_io::{ReadAt, TrackedReadAt};
use fmd_testkit::{
    content,
    tile::{RawChunk, TileBuilder, zlib_compress},
};

use crate::{
    FragmentMetadataOptions, FragmentReader,
    read::generic_tiles::decode_offsets,
    tests::fixtures::{SAMPLE_FIELD_COUNT, open_bytes, sample_fragment},
    tile::{TILE_HEADER_SIZE, read_tile},
};

fn reader(data: Vec<u8>) -> FragmentReader {
    FragmentReader::new(Arc::new(data)).unwrap()
}

#[test]
fn test_single_chunk_single_part_round_trip() {
    let mut rng = fastrand::Rng::with_seed(100);
    let original = fmd_testkit::data_gen::compressible_bytes(&mut rng, 100);
    let compressed = zlib_compress(&original);
    let c = compressed.len() as u32;

    let tile = TileBuilder::new()
        .raw_chunk(RawChunk::new(100).part(100, c).data(&compressed))
        .build();
    assert_eq!(
        u64::from_le_bytes(tile[12..20].try_into().unwrap()),
        100,
        "declared tile size"
    );

    let decoded = read_tile(&reader(tile), 0).unwrap();
    assert_eq!(decoded.data, original);
}

#[test]
fn test_multi_chunk_tile_places_chunks_in_order() {
    let mut rng = fastrand::Rng::with_seed(7);
    let content = fmd_testkit::data_gen::random_bytes(&mut rng, 10_000);
    let tile = TileBuilder::with_content(&content, 1024).build();
    let decoded = read_tile(&reader(tile), 0).unwrap();
    assert_eq!(decoded.data.len(), content.len());
    assert_eq!(decoded.data, content);
}

#[test]
fn test_multi_part_chunks() {
    let tile = TileBuilder::new()
        .chunk_parts(&[b"first-", b"second-", b"third"])
        .chunk_parts(&[&[1u8; 500], &[2u8; 300]])
        .build();
    let decoded = read_tile(&reader(tile), 0).unwrap();
    assert_eq!(&decoded.data[..18], b"first-second-third");
    assert!(decoded.data[18..518].iter().all(|&b| b == 1));
    assert!(decoded.data[518..].iter().all(|&b| b == 2));
}

#[test]
fn test_chunk_sizes_must_add_up_to_tile_size() {
    let tile = TileBuilder::new()
        .chunk(&[0u8; 60])
        .chunk(&[1u8; 40])
        .tile_size(120)
        .build();
    let err = read_tile(&reader(tile), 0).unwrap_err();
    assert!(matches!(
        err.root_kind(),
        ErrorKind::SizeMismatch {
            expected: 120,
            actual: 100,
            ..
        }
    ));
}

#[test]
fn test_parts_must_fill_their_chunk() {
    let compressed = zlib_compress(b"0123456789");
    let tile = TileBuilder::new()
        .raw_chunk(
            RawChunk::new(16)
                .part(10, compressed.len() as u32)
                .data(&compressed),
        )
        .build();
    let err = read_tile(&reader(tile), 0).unwrap_err();
    assert!(matches!(
        err.root_kind(),
        ErrorKind::SizeMismatch {
            expected: 16,
            actual: 10,
            ..
        }
    ));
}

#[test]
fn test_metadata_parts_always_rejected() {
    for parts in [1u32, 2, u32::MAX] {
        let tile = TileBuilder::new()
            .chunk(b"fine")
            .raw_chunk(RawChunk::new(8).metadata_parts(parts))
            .build();
        let err = read_tile(&reader(tile), 0).unwrap_err();
        assert!(
            matches!(err.root_kind(), ErrorKind::UnsupportedFilterStage { metadata_parts } if *metadata_parts == parts)
        );
    }
}

#[test]
fn test_corrupt_part_stream() {
    let mut compressed = zlib_compress(&[9u8; 200]);
    let mid = compressed.len() / 2;
    compressed[mid] ^= 0xFF;
    compressed[mid + 1] ^= 0x55;
    let tile = TileBuilder::new()
        .raw_chunk(
            RawChunk::new(200)
                .part(200, compressed.len() as u32)
                .data(&compressed),
        )
        .build();
    let err = read_tile(&reader(tile), 0).unwrap_err();
    assert!(matches!(
        err.root_kind(),
        ErrorKind::DecompressionFailed { .. }
    ));
}

#[test]
fn test_oversized_declared_chunks_fail_without_allocating() {
    let tile = (0..64)
        .fold(TileBuilder::new(), |builder, _| {
            builder.raw_chunk(RawChunk::new(u32::MAX))
        })
        .build();
    assert!(tile.len() < 2048);

    let err = read_tile(&reader(tile), 0).unwrap_err();
    assert!(matches!(
        err.root_kind(),
        ErrorKind::SizeMismatch {
            expected: 4294967295,
            actual: 0,
            ..
        }
    ));
    assert!(err.to_string().starts_with("tile at offset 0: chunk 0: "));
}

#[test]
fn test_part_expansion_beyond_deflate_limit() {
    let tile = TileBuilder::new()
        .raw_chunk(
            RawChunk::new(u32::MAX)
                .part(u32::MAX, 16)
                .data(&[0u8; 16]),
        )
        .build();
    let err = read_tile(&reader(tile), 0).unwrap_err();
    assert!(matches!(err.root_kind(), ErrorKind::InvalidFormat { .. }));
}

#[test]
fn test_errors_name_the_tile_offset() {
    let mut compressed = zlib_compress(&[9u8; 200]);
    let mid = compressed.len() / 2;
    compressed[mid] ^= 0xFF;
    compressed[mid + 1] ^= 0x55;
    let corrupt = TileBuilder::new()
        .chunk(b"intact")
        .raw_chunk(
            RawChunk::new(200)
                .part(200, compressed.len() as u32)
                .data(&compressed),
        )
        .build();
    let mut file = vec![0u8; 4321];
    file.extend(corrupt);
    let err = read_tile(&reader(file), 4321).unwrap_err();
    assert!(matches!(
        err.root_kind(),
        ErrorKind::DecompressionFailed { .. }
    ));
    let message = err.to_string();
    assert!(message.contains("tile at offset 4321"), "{message}");
    assert!(message.contains("chunk 1: part 0: "), "{message}");

    let mut file = vec![0u8; 4321];
    file.extend(
        TileBuilder::new()
            .raw_chunk(RawChunk::new(8).metadata_parts(1))
            .build(),
    );
    let err = read_tile(&reader(file), 4321).unwrap_err();
    assert!(
        err.to_string()
            .starts_with("tile at offset 4321: chunk 0: unsupported filter stage")
    );
}

#[test]
fn test_errors_name_the_table_and_field() {
    let data = sample_fragment().build();
    let len = data.len();
    // tile_offsets[1] sits after the rtree offset, before the other
    // per-field tables and the two trailing tile offsets.
    let pos = len - 8 - 8 * (2 + 8 * SAMPLE_FIELD_COUNT) + 8;
    let mut patched = data.clone();
    patched[pos..pos + 8].copy_from_slice(&(len as u64 * 2).to_le_bytes());

    for parallel in [false, true] {
        let source: Arc<dyn ReadAt> = Arc::new(patched.clone());
        let err = FragmentMetadataOptions::new(SAMPLE_FIELD_COUNT)
            .parallel(parallel)
            .open(source)
            .unwrap_err();
        assert!(err.is_out_of_bounds());
        let message = err.to_string();
        assert!(
            message.starts_with(&format!("tile offsets of field 1: tile at offset {}", len * 2)),
            "{message}"
        );
    }
}

#[test]
fn test_zero_count_offset_tile_is_empty() {
    // An offsets tile declaring zero entries, followed by bytes that would be
    // misread as offsets if decoding continued past the count.
    let mut tile_content = content::offsets(&[]);
    tile_content.extend_from_slice(&[0xFF; 16]);

    let tile = TileBuilder::new().chunk(&tile_content).build();
    let decoded = read_tile(&reader(tile), 0).unwrap();
    assert_eq!(decoded.data.len(), 24);
    assert!(decode_offsets(&decoded.data).unwrap().is_empty());

    let fmd = open_bytes(
        &FragmentMetadataOptions::new(SAMPLE_FIELD_COUNT),
        sample_fragment().build(),
    );
    assert!(fmd.tile_offsets()[2].is_empty());
    assert!(fmd.tile_validity_offsets()[0].is_empty());
}

#[test]
fn test_read_beyond_source_fails_before_parsing() {
    let tile = TileBuilder::new().chunk(b"abc").build();
    let len = tile.len() as u64;
    let tracked = Arc::new(TrackedReadAt::new(tile));
    let reader = FragmentReader::new(tracked.clone()).unwrap();

    let err = read_tile(&reader, len - TILE_HEADER_SIZE + 1).unwrap_err();
    assert!(err.is_out_of_bounds());
    assert_eq!(tracked.read_count(), 0);
}

#[test]
fn test_tile_offset_past_end_of_file() {
    let data = sample_fragment().build();
    let len = data.len();
    // Point the processed-conditions tile past the end of the object.
    let mut patched = data.clone();
    let pos = len - 8 - 8;
    patched[pos..pos + 8].copy_from_slice(&(len as u64 * 2).to_le_bytes());

    let source: Arc<dyn ReadAt> = Arc::new(patched);
    let err = FragmentMetadataOptions::new(SAMPLE_FIELD_COUNT)
        .open(source)
        .unwrap_err();
    assert!(err.is_out_of_bounds());
}

#[test]
fn test_truncated_file() {
    let data = sample_fragment().build();
    let truncated = [
        data[1..].to_vec(),
        data[..data.len() - 1].to_vec(),
        data[..data.len() - 5].to_vec(),
        data[..4].to_vec(),
    ];
    for bytes in truncated {
        let source: Arc<dyn ReadAt> = Arc::new(bytes);
        assert!(
            FragmentMetadataOptions::new(SAMPLE_FIELD_COUNT)
                .open(source)
                .is_err()
        );
    }
}

#[test]
fn test_null_domain_shifts_following_fields() {
    let with_domain = sample_fragment().build();
    let without_domain = sample_fragment().non_empty_domain(None).build();
    assert_eq!(with_domain.len(), without_domain.len() + 32);

    let options = FragmentMetadataOptions::new(SAMPLE_FIELD_COUNT);
    let a = open_bytes(&options, with_domain);
    let b = open_bytes(&options, without_domain);
    assert_eq!(b.footer().non_empty_domain, None);
    assert_eq!(b.footer().sparse_tile_num, a.footer().sparse_tile_num);
    assert_eq!(b.footer().last_tile_cell_num, 1000);
    assert_eq!(b.tile_offsets(), a.tile_offsets());
}
