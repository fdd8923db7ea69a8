//! Fragment metadata assembly: the footer plus every generic tile it references.

use std::sync::Arc;

use fmd_common::{Error, Result, verify_arg};
use fmd_io::{PrecachedReadAt, ReadAt};
use fmd_objectstore::{ObjectStore, fragment_metadata_url, url::ObjectUrl};
use rayon::prelude::*;

use crate::{
    field_table::FieldTable,
    footer::Footer,
    tile::{Tile, read_tile},
};

use super::{
    fragment_reader::FragmentReader,
    generic_tiles::{
        FieldSummary, TileValues, decode_fragment_summary, decode_null_counts, decode_offsets,
        decode_sums, decode_values,
    },
};

/// Fully decoded fragment metadata. Read-only once constructed.
#[derive(Debug, Clone)]
pub struct FragmentMetadata {
    footer: Footer,
    rtree: Tile,
    tile_offsets: FieldTable<Vec<u64>>,
    tile_var_offsets: FieldTable<Vec<u64>>,
    tile_var_sizes: FieldTable<Vec<u64>>,
    tile_validity_offsets: FieldTable<Vec<u64>>,
    tile_min: FieldTable<TileValues>,
    tile_max: FieldTable<TileValues>,
    tile_sums: FieldTable<Vec<u8>>,
    tile_null_counts: FieldTable<Vec<u64>>,
    fragment_summary: FieldTable<FieldSummary>,
    processed_conditions: Tile,
}

impl FragmentMetadata {
    pub fn footer(&self) -> &Footer {
        &self.footer
    }

    pub fn field_count(&self) -> usize {
        self.footer.field_count()
    }

    /// The R-tree tile, kept undecoded.
    pub fn rtree(&self) -> &Tile {
        &self.rtree
    }

    /// Per-field offsets of the fixed-size data tiles.
    pub fn tile_offsets(&self) -> &FieldTable<Vec<u64>> {
        &self.tile_offsets
    }

    pub fn tile_var_offsets(&self) -> &FieldTable<Vec<u64>> {
        &self.tile_var_offsets
    }

    pub fn tile_var_sizes(&self) -> &FieldTable<Vec<u64>> {
        &self.tile_var_sizes
    }

    pub fn tile_validity_offsets(&self) -> &FieldTable<Vec<u64>> {
        &self.tile_validity_offsets
    }

    pub fn tile_min(&self) -> &FieldTable<TileValues> {
        &self.tile_min
    }

    pub fn tile_max(&self) -> &FieldTable<TileValues> {
        &self.tile_max
    }

    pub fn tile_sums(&self) -> &FieldTable<Vec<u8>> {
        &self.tile_sums
    }

    pub fn tile_null_counts(&self) -> &FieldTable<Vec<u64>> {
        &self.tile_null_counts
    }

    /// Fragment-wide min, max, sum and null count of every field.
    pub fn fragment_summary(&self) -> &FieldTable<FieldSummary> {
        &self.fragment_summary
    }

    /// The processed delete conditions tile, kept undecoded.
    pub fn processed_conditions(&self) -> &Tile {
        &self.processed_conditions
    }

    /// Number of tiles of `field`, taken from its fixed-data offsets.
    pub fn tile_num(&self, field: usize) -> usize {
        self.tile_offsets.get(field).map_or(0, |t| t.len())
    }
}

/// Options for opening fragment metadata.
#[derive(Debug, Clone)]
pub struct FragmentMetadataOptions {
    field_count: usize,
    precached_suffix_size: u64,
    parallel: bool,
}

impl FragmentMetadataOptions {
    /// The size of the pre-cached suffix read when opening fragment metadata.
    /// The footer and the tiles written last are usually served from this
    /// single request.
    pub const PRECACHED_SUFFIX_SIZE: u64 = 64 * 1024;

    /// Creates options for a fragment with `field_count` fields.
    ///
    /// The field count is not recorded in the metadata; it comes from the
    /// array schema (see `Schema::field_count`).
    pub fn new(field_count: usize) -> FragmentMetadataOptions {
        FragmentMetadataOptions {
            field_count,
            precached_suffix_size: Self::PRECACHED_SUFFIX_SIZE,
            parallel: false,
        }
    }

    /// Sets the size of the pre-cached suffix. `0` disables pre-caching; any
    /// other size is clamped to the source's storage profile.
    pub fn precached_suffix_size(mut self, size: u64) -> Self {
        self.precached_suffix_size = size;
        self
    }

    /// Decodes independent per-field tiles on the rayon thread pool.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn field_count(&self) -> usize {
        self.field_count
    }

    /// Decodes the fragment metadata stored in `source`.
    pub fn open(&self, source: Arc<dyn ReadAt>) -> Result<FragmentMetadata> {
        verify_arg!(field_count, self.field_count > 0);
        let source: Arc<dyn ReadAt> = if self.precached_suffix_size > 0 {
            let suffix_size = source
                .storage_profile()
                .clamp_io_size(self.precached_suffix_size as usize) as u64;
            let precached = PrecachedReadAt::from_suffix(source, suffix_size)
                .map_err(|e| Error::io("fragment metadata suffix", e))?;
            Arc::new(precached)
        } else {
            source
        };
        let reader = FragmentReader::new(source)?;
        Assembler {
            reader: &reader,
            field_count: self.field_count,
            parallel: self.parallel,
        }
        .assemble()
    }

    /// Opens the fragment metadata object at `url`.
    ///
    /// A container URL refers to a fragment directory and is resolved to its
    /// `__fragment_metadata.tdb` object.
    pub fn open_url(
        &self,
        object_store: &dyn ObjectStore,
        url: &ObjectUrl,
    ) -> Result<FragmentMetadata> {
        let url = fragment_metadata_url(url)?;
        let source = object_store
            .open(&url)
            .map_err(|e| Error::io(url.as_str(), e))?;
        self.open(source)
    }
}

struct Assembler<'a> {
    reader: &'a FragmentReader,
    field_count: usize,
    parallel: bool,
}

impl Assembler<'_> {
    fn assemble(&self) -> Result<FragmentMetadata> {
        let footer = Footer::read(self.reader, self.field_count)?;
        let gt = &footer.generic_tile_offsets;

        let rtree = read_tile(self.reader, gt.rtree).map_err(|e| e.context("rtree"))?;
        let tile_offsets =
            self.load_per_field("tile offsets", &gt.tile_offsets, decode_offsets)?;
        let tile_var_offsets =
            self.load_per_field("tile var offsets", &gt.tile_var_offsets, decode_offsets)?;
        let tile_var_sizes =
            self.load_per_field("tile var sizes", &gt.tile_var_sizes, decode_offsets)?;
        let tile_validity_offsets = self.load_per_field(
            "tile validity offsets",
            &gt.tile_validity_offsets,
            decode_offsets,
        )?;
        let tile_min = self.load_per_field("tile min", &gt.tile_min_offsets, decode_values)?;
        let tile_max = self.load_per_field("tile max", &gt.tile_max_offsets, decode_values)?;
        let tile_sums = self.load_per_field("tile sums", &gt.tile_sum_offsets, decode_sums)?;
        let tile_null_counts = self.load_per_field(
            "tile null counts",
            &gt.tile_null_count_offsets,
            decode_null_counts,
        )?;

        let fragment_summary = read_tile(self.reader, gt.fragment_min_max_sum_null_count)
            .and_then(|tile| decode_fragment_summary(&tile.data, self.field_count))
            .map_err(|e| e.context("fragment summary"))?;
        let processed_conditions = read_tile(self.reader, gt.processed_conditions)
            .map_err(|e| e.context("processed conditions"))?;

        Ok(FragmentMetadata {
            footer,
            rtree,
            tile_offsets,
            tile_var_offsets,
            tile_var_sizes,
            tile_validity_offsets,
            tile_min,
            tile_max,
            tile_sums,
            tile_null_counts,
            fragment_summary,
            processed_conditions,
        })
    }

    /// Reads the tile at each field's offset and decodes its content with
    /// `decode`. Results stay in field order; errors name `table` and the field.
    fn load_per_field<T, F>(
        &self,
        table: &str,
        offsets: &FieldTable<u64>,
        decode: F,
    ) -> Result<FieldTable<T>>
    where
        T: Send,
        F: Fn(&[u8]) -> Result<T> + Sync,
    {
        let load = |(field, &offset): (usize, &u64)| -> Result<T> {
            read_tile(self.reader, offset)
                .and_then(|tile| decode(&tile.data))
                .map_err(|e| e.context(format!("{table} of field {field}")))
        };
        let values = if self.parallel {
            offsets
                .as_slice()
                .par_iter()
                .enumerate()
                .map(load)
                .collect::<Result<Vec<_>>>()?
        } else {
            offsets.iter().enumerate().map(load).collect::<Result<Vec<_>>>()?
        };
        FieldTable::new(values, self.field_count)
    }
}
