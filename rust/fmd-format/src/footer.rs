//! Fragment metadata footer.
//!
//! The footer sits at the end of the object, followed only by its own size:
//!
//! ```text
//! ... generic tiles ...
//! footer: [u8; footer_size]
//! footer_size: u64
//! ```
//!
//! The footer record itself:
//!
//! ```text
//! version: u32
//! array_schema_name: u64 length + bytes
//! fragment_type: u8
//! null_non_empty_domain: u8
//! non_empty_domain: [f64; 4]            (only if null_non_empty_domain == 0)
//! sparse_tile_num: u64
//! last_tile_cell_num: u64
//! has_timestamps: u8
//! has_delete_meta: u8
//! file_sizes: [u64; field_count]
//! file_var_sizes: [u64; field_count]
//! file_validity_sizes: [u64; field_count]
//! rtree_offset: u64
//! tile_offsets_offsets: [u64; field_count]
//! tile_var_offsets_offsets: [u64; field_count]
//! tile_var_sizes_offsets: [u64; field_count]
//! tile_validity_offsets_offsets: [u64; field_count]
//! tile_min_offsets: [u64; field_count]
//! tile_max_offsets: [u64; field_count]
//! tile_sum_offsets: [u64; field_count]
//! tile_null_count_offsets: [u64; field_count]
//! fragment_min_max_sum_null_count_offset: u64
//! processed_conditions_offset: u64
//! ```

use fmd_common::{ErrorKind, Result};

use crate::{
    cursor::ByteCursor, datatype::FragmentType, field_table::FieldTable,
    read::fragment_reader::FragmentReader,
};

/// Size of the trailing footer-size field.
pub const FOOTER_SIZE_FIELD_LEN: u64 = 8;

/// File offsets of every generic tile referenced by the footer.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericTileOffsets {
    pub rtree: u64,
    pub tile_offsets: FieldTable<u64>,
    pub tile_var_offsets: FieldTable<u64>,
    pub tile_var_sizes: FieldTable<u64>,
    pub tile_validity_offsets: FieldTable<u64>,
    pub tile_min_offsets: FieldTable<u64>,
    pub tile_max_offsets: FieldTable<u64>,
    pub tile_sum_offsets: FieldTable<u64>,
    pub tile_null_count_offsets: FieldTable<u64>,
    pub fragment_min_max_sum_null_count: u64,
    pub processed_conditions: u64,
}

/// Decoded fragment metadata footer.
#[derive(Debug, Clone, PartialEq)]
pub struct Footer {
    pub file_size: u64,
    pub footer_size: u64,
    pub footer_offset: u64,
    pub version: u32,
    pub array_schema_name: String,
    pub fragment_type: FragmentType,
    /// `None` when the footer marks the non-empty domain as null.
    pub non_empty_domain: Option<[f64; 4]>,
    pub sparse_tile_num: u64,
    pub last_tile_cell_num: u64,
    pub has_timestamps: bool,
    pub has_delete_meta: bool,
    pub file_sizes: FieldTable<u64>,
    pub file_var_sizes: FieldTable<u64>,
    pub file_validity_sizes: FieldTable<u64>,
    pub generic_tile_offsets: GenericTileOffsets,
}

impl Footer {
    /// Locates and decodes the footer of a fragment metadata object.
    pub fn read(reader: &FragmentReader, field_count: usize) -> Result<Footer> {
        let file_size = reader.size();
        let size_pos = file_size
            .checked_sub(FOOTER_SIZE_FIELD_LEN)
            .ok_or(ErrorKind::CorruptFooter {
                file_size,
                footer_size: 0,
            })?;
        let footer_size = reader.read_u64(size_pos, "footer size")?;
        let footer_offset = size_pos
            .checked_sub(footer_size)
            .ok_or(ErrorKind::CorruptFooter {
                file_size,
                footer_size,
            })?;
        log::debug!(
            "footer: {footer_size} bytes at {footer_offset}, file size {file_size}, \
             {field_count} fields"
        );

        let blob = reader.read_range(footer_offset..size_pos, "footer")?;
        let mut footer = Self::parse(&blob, field_count)?;
        footer.file_size = file_size;
        footer.footer_size = footer_size;
        footer.footer_offset = footer_offset;
        Ok(footer)
    }

    /// Decodes a footer record. The location fields are left zeroed.
    pub fn parse(blob: &[u8], field_count: usize) -> Result<Footer> {
        let mut cursor = ByteCursor::new(blob, "footer");
        let version = cursor.read_fixed::<u32>()?;
        let name_len = cursor.read_fixed::<u64>()?;
        let array_schema_name = cursor.read_string(name_len)?;
        let fragment_type = FragmentType::try_from(cursor.read_fixed::<u8>()?)?;
        let non_empty_domain = read_non_empty_domain(&mut cursor)?;
        let sparse_tile_num = cursor.read_fixed::<u64>()?;
        let last_tile_cell_num = cursor.read_fixed::<u64>()?;
        let has_timestamps = cursor.read_fixed::<u8>()? != 0;
        let has_delete_meta = cursor.read_fixed::<u8>()? != 0;

        let file_sizes = read_field_table(&mut cursor, field_count)?;
        let file_var_sizes = read_field_table(&mut cursor, field_count)?;
        let file_validity_sizes = read_field_table(&mut cursor, field_count)?;

        let generic_tile_offsets = GenericTileOffsets {
            rtree: cursor.read_fixed()?,
            tile_offsets: read_field_table(&mut cursor, field_count)?,
            tile_var_offsets: read_field_table(&mut cursor, field_count)?,
            tile_var_sizes: read_field_table(&mut cursor, field_count)?,
            tile_validity_offsets: read_field_table(&mut cursor, field_count)?,
            tile_min_offsets: read_field_table(&mut cursor, field_count)?,
            tile_max_offsets: read_field_table(&mut cursor, field_count)?,
            tile_sum_offsets: read_field_table(&mut cursor, field_count)?,
            tile_null_count_offsets: read_field_table(&mut cursor, field_count)?,
            fragment_min_max_sum_null_count: cursor.read_fixed()?,
            processed_conditions: cursor.read_fixed()?,
        };

        if !cursor.is_empty() {
            log::warn!(
                "{} unparsed bytes at the end of the footer (field count {field_count})",
                cursor.remaining()
            );
        }

        Ok(Footer {
            file_size: 0,
            footer_size: 0,
            footer_offset: 0,
            version,
            array_schema_name,
            fragment_type,
            non_empty_domain,
            sparse_tile_num,
            last_tile_cell_num,
            has_timestamps,
            has_delete_meta,
            file_sizes,
            file_var_sizes,
            file_validity_sizes,
            generic_tile_offsets,
        })
    }

    pub fn field_count(&self) -> usize {
        self.file_sizes.len()
    }
}

/// Reads the null flag and, only when it is zero, the four domain bounds.
pub(crate) fn read_non_empty_domain(cursor: &mut ByteCursor) -> Result<Option<[f64; 4]>> {
    let null_domain = cursor.read_fixed::<u8>()?;
    if null_domain != 0 {
        return Ok(None);
    }
    let mut bounds = [0f64; 4];
    for bound in bounds.iter_mut() {
        *bound = cursor.read_fixed()?;
    }
    Ok(Some(bounds))
}

fn read_field_table(cursor: &mut ByteCursor, field_count: usize) -> Result<FieldTable<u64>> {
    let values = cursor.read_u64_vec(field_count as u64)?;
    FieldTable::new(values, field_count)
}
