//! Reports the parts of a fragment metadata object that decoding never reads.
//!
//! Unread ranges are informational: padding between tiles is legal, so holes
//! do not make the command fail.

use std::{ops::Range, sync::Arc};

use anyhow::{Context, Result};
use fmd_format::FragmentMetadataOptions;
use fmd_io::{ReadAt, tracked_read::TrackedReadAt};
use serde::Serialize;

use super::{FieldSource, print_reports, resolve_metadata_urls};
use crate::utils::format_size;

#[derive(Serialize)]
struct CoverageReport {
    url: String,
    file_size: u64,
    read_count: usize,
    read_bytes: u64,
    unread_bytes: u64,
    unread_size: String,
    fully_read: bool,
    unread_ranges: Vec<RangeInfo>,
}

#[derive(Serialize)]
struct RangeInfo {
    start: u64,
    end: u64,
    len: u64,
}

pub fn run(fields: FieldSource, path: String) -> Result<()> {
    let schema = fields.load_schema()?;
    let field_count = fields.field_count(schema.as_ref())?;
    let targets = resolve_metadata_urls(&path)?;

    let reports = targets
        .urls
        .iter()
        .map(|url| {
            log::info!("Checking read coverage of: {}", url.as_str());
            let source = targets
                .store
                .open(url)
                .with_context(|| format!("Failed to open {}", url.as_str()))?;
            measure(url.as_str(), source, field_count)
        })
        .collect::<Result<Vec<_>>>()?;
    print_reports(&reports)
}

fn measure(url: &str, source: Arc<dyn ReadAt>, field_count: usize) -> Result<CoverageReport> {
    let tracked = Arc::new(TrackedReadAt::new(source));
    // Suffix precaching would mark the whole footer region as read.
    FragmentMetadataOptions::new(field_count)
        .precached_suffix_size(0)
        .open(tracked.clone())
        .with_context(|| format!("Failed to decode fragment metadata: {url}"))?;

    let file_size = tracked.size()?;
    let read_bytes = range_bytes(&tracked.read_ranges());
    let unread = tracked.unread_ranges()?;
    let unread_bytes = range_bytes(&unread);
    Ok(CoverageReport {
        url: url.to_string(),
        file_size,
        read_count: tracked.read_count(),
        read_bytes,
        unread_bytes,
        unread_size: format_size(unread_bytes),
        fully_read: unread.is_empty(),
        unread_ranges: unread
            .into_iter()
            .map(|r| RangeInfo {
                start: r.start,
                end: r.end,
                len: r.end - r.start,
            })
            .collect(),
    })
}

fn range_bytes(ranges: &[Range<u64>]) -> u64 {
    ranges.iter().map(|r| r.end - r.start).sum()
}
