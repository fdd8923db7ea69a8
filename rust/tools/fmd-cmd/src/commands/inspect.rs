use anyhow::Result;
use fmd_format::{FragmentMetadata, FragmentType, GenericTileOffsets, Schema};
use serde::Serialize;

use super::{FieldSource, open_metadata, print_reports, resolve_metadata_urls};

#[derive(Serialize)]
struct InspectSummary {
    url: String,
    footer: FooterInfo,
    rtree_size: usize,
    processed_conditions_size: usize,
    fields: Vec<FieldInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generic_tile_offsets: Option<GenericTileOffsetsInfo>,
}

#[derive(Serialize)]
struct FooterInfo {
    file_size: u64,
    footer_size: u64,
    footer_offset: u64,
    version: u32,
    array_schema_name: String,
    fragment_type: FragmentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    non_empty_domain: Option<[f64; 4]>,
    sparse_tile_num: u64,
    last_tile_cell_num: u64,
    has_timestamps: bool,
    has_delete_meta: bool,
}

#[derive(Serialize)]
struct FieldInfo {
    index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    file_size: u64,
    file_var_size: u64,
    file_validity_size: u64,
    tile_count: usize,
    var_tile_count: usize,
    validity_tile_count: usize,
    tile_min_size: usize,
    tile_max_size: usize,
    tile_sums_size: usize,
    null_count_tiles: usize,
    fragment_min_size: usize,
    fragment_max_size: usize,
    fragment_sum: u64,
    fragment_null_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    tiles: Option<TilesInfo>,
}

#[derive(Serialize)]
struct TilesInfo {
    offsets: Vec<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    var_offsets: Vec<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    var_sizes: Vec<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    validity_offsets: Vec<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    null_counts: Vec<u64>,
}

#[derive(Serialize)]
struct GenericTileOffsetsInfo {
    rtree: u64,
    tile_offsets: Vec<u64>,
    tile_var_offsets: Vec<u64>,
    tile_var_sizes: Vec<u64>,
    tile_validity_offsets: Vec<u64>,
    tile_min: Vec<u64>,
    tile_max: Vec<u64>,
    tile_sums: Vec<u64>,
    tile_null_counts: Vec<u64>,
    fragment_summary: u64,
    processed_conditions: u64,
}

pub fn run(verbose: u8, fields: FieldSource, path: String) -> Result<()> {
    let schema = fields.load_schema()?;
    let field_count = fields.field_count(schema.as_ref())?;
    let targets = resolve_metadata_urls(&path)?;

    let summaries = targets
        .urls
        .iter()
        .map(|url| {
            log::info!("Inspecting fragment metadata: {}", url.as_str());
            let metadata = open_metadata(targets.store.as_ref(), url, field_count)?;
            Ok(create_summary(url.as_str(), &metadata, schema.as_ref(), verbose))
        })
        .collect::<Result<Vec<_>>>()?;
    print_reports(&summaries)
}

fn create_summary(
    url: &str,
    metadata: &FragmentMetadata,
    schema: Option<&Schema>,
    verbose: u8,
) -> InspectSummary {
    let footer = metadata.footer();
    let names = schema.map(|schema| {
        schema
            .fields()
            .into_iter()
            .map(|field| field.name)
            .collect::<Vec<_>>()
    });

    let fields = (0..metadata.field_count())
        .map(|index| {
            let name = names.as_ref().and_then(|names| names.get(index).cloned());
            create_field_info(metadata, index, name, verbose)
        })
        .collect();

    InspectSummary {
        url: url.to_string(),
        footer: FooterInfo {
            file_size: footer.file_size,
            footer_size: footer.footer_size,
            footer_offset: footer.footer_offset,
            version: footer.version,
            array_schema_name: footer.array_schema_name.clone(),
            fragment_type: footer.fragment_type,
            non_empty_domain: footer.non_empty_domain,
            sparse_tile_num: footer.sparse_tile_num,
            last_tile_cell_num: footer.last_tile_cell_num,
            has_timestamps: footer.has_timestamps,
            has_delete_meta: footer.has_delete_meta,
        },
        rtree_size: metadata.rtree().len(),
        processed_conditions_size: metadata.processed_conditions().len(),
        fields,
        generic_tile_offsets: (verbose > 0)
            .then(|| create_generic_tile_offsets_info(&footer.generic_tile_offsets)),
    }
}

fn create_field_info(
    metadata: &FragmentMetadata,
    index: usize,
    name: Option<String>,
    verbose: u8,
) -> FieldInfo {
    let footer = metadata.footer();
    let tile_min = &metadata.tile_min()[index];
    let tile_max = &metadata.tile_max()[index];
    let summary = &metadata.fragment_summary()[index];

    FieldInfo {
        index,
        name,
        file_size: footer.file_sizes[index],
        file_var_size: footer.file_var_sizes[index],
        file_validity_size: footer.file_validity_sizes[index],
        tile_count: metadata.tile_num(index),
        var_tile_count: metadata.tile_var_offsets()[index].len(),
        validity_tile_count: metadata.tile_validity_offsets()[index].len(),
        tile_min_size: tile_min.fixed.len() + tile_min.var.len(),
        tile_max_size: tile_max.fixed.len() + tile_max.var.len(),
        tile_sums_size: metadata.tile_sums()[index].len(),
        null_count_tiles: metadata.tile_null_counts()[index].len(),
        fragment_min_size: summary.min.len(),
        fragment_max_size: summary.max.len(),
        fragment_sum: summary.sum,
        fragment_null_count: summary.null_count,
        tiles: (verbose > 0).then(|| TilesInfo {
            offsets: metadata.tile_offsets()[index].clone(),
            var_offsets: metadata.tile_var_offsets()[index].clone(),
            var_sizes: metadata.tile_var_sizes()[index].clone(),
            validity_offsets: metadata.tile_validity_offsets()[index].clone(),
            null_counts: metadata.tile_null_counts()[index].clone(),
        }),
    }
}

fn create_generic_tile_offsets_info(offsets: &GenericTileOffsets) -> GenericTileOffsetsInfo {
    GenericTileOffsetsInfo {
        rtree: offsets.rtree,
        tile_offsets: offsets.tile_offsets.as_slice().to_vec(),
        tile_var_offsets: offsets.tile_var_offsets.as_slice().to_vec(),
        tile_var_sizes: offsets.tile_var_sizes.as_slice().to_vec(),
        tile_validity_offsets: offsets.tile_validity_offsets.as_slice().to_vec(),
        tile_min: offsets.tile_min_offsets.as_slice().to_vec(),
        tile_max: offsets.tile_max_offsets.as_slice().to_vec(),
        tile_sums: offsets.tile_sum_offsets.as_slice().to_vec(),
        tile_null_counts: offsets.tile_null_count_offsets.as_slice().to_vec(),
        fragment_summary: offsets.fragment_min_max_sum_null_count,
        processed_conditions: offsets.processed_conditions,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use fmd_format::FragmentMetadataOptions;
    use fmd_testkit::fragment::FragmentBuilder;

    use super::create_summary;

    #[test]
    fn test_create_summary() {
        let data = FragmentBuilder::new(2)
            .schema_name("frag")
            .tile_offsets(0, vec![0, 100])
            .tile_offsets(1, vec![0, 40])
            .build();
        let metadata = FragmentMetadataOptions::new(2)
            .open(Arc::new(data))
            .unwrap();

        let summary = create_summary("file:///frag.tdb", &metadata, None, 0);
        assert_eq!(summary.fields.len(), 2);
        assert_eq!(summary.fields[0].tile_count, 2);
        assert!(summary.fields[0].tiles.is_none());
        assert!(summary.generic_tile_offsets.is_none());

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["footer"]["array_schema_name"], "frag");

        let verbose = create_summary("file:///frag.tdb", &metadata, None, 1);
        assert_eq!(verbose.fields[1].tiles.as_ref().unwrap().offsets, vec![0, 40]);
        assert!(verbose.generic_tile_offsets.is_some());
    }
}
