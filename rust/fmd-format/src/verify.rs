//! Consistency checks of decoded fragment metadata against an array schema.

use fmd_common::{Error, Result};

use crate::{
    read::fragment_metadata::FragmentMetadata,
    schema::{FieldInfo, Schema},
};

/// Width of an offset stored in the fixed part of a var-sized min/max table.
const VAR_OFFSET_SIZE: u64 = 8;

/// Width of a per-tile sum.
const SUM_SIZE: u64 = 8;

impl FragmentMetadata {
    /// Checks that the decoded tables have the sizes the schema implies.
    ///
    /// The number of tiles of a field is the length of its fixed-data offset
    /// table; fields without tiles are skipped, as are empty tables.
    pub fn verify(&self, schema: &Schema) -> Result<()> {
        if schema.field_count() != self.field_count() {
            return Err(Error::invalid_arg(
                "schema",
                format!(
                    "schema describes {} fields, fragment metadata was decoded with {}",
                    schema.field_count(),
                    self.field_count()
                ),
            ));
        }
        for field in schema.fields() {
            self.verify_field(&field)?;
        }
        Ok(())
    }

    fn verify_field(&self, field: &FieldInfo) -> Result<()> {
        let i = field.index;
        let tile_num = self.tile_num(i) as u64;
        if tile_num == 0 {
            log::debug!("field {i} '{}': no tiles", field.name);
            return Ok(());
        }
        let element = |what: &str| format!("field {i} '{}' {what}", field.name);

        check_len(element("tile var offsets"), &self.tile_var_offsets()[i], tile_num)?;
        check_len(element("tile var sizes"), &self.tile_var_sizes()[i], tile_num)?;
        check_len(
            element("tile validity offsets"),
            &self.tile_validity_offsets()[i],
            tile_num,
        )?;
        check_len(element("tile null counts"), &self.tile_null_counts()[i], tile_num)?;
        check_len(element("tile sums"), &self.tile_sums()[i], tile_num * SUM_SIZE)?;

        let min_max_width = if field.var_sized {
            Some(VAR_OFFSET_SIZE)
        } else {
            field.cell_size
        };
        if let Some(width) = min_max_width {
            check_len(
                element("tile min"),
                &self.tile_min()[i].fixed,
                tile_num * width,
            )?;
            check_len(
                element("tile max"),
                &self.tile_max()[i].fixed,
                tile_num * width,
            )?;
        }

        if let (false, Some(cell_size)) = (field.var_sized, field.cell_size) {
            let summary = &self.fragment_summary()[i];
            check_len(element("fragment min"), &summary.min, cell_size)?;
            check_len(element("fragment max"), &summary.max, cell_size)?;
        }

        log::debug!("field {i} '{}': {tile_num} tiles verified", field.name);
        Ok(())
    }
}

/// Empty tables are accepted; otherwise the length must match exactly.
fn check_len<T>(element: String, values: &[T], expected: u64) -> Result<()> {
    let actual = values.len() as u64;
    if actual != 0 && actual != expected {
        return Err(Error::size_mismatch(element, expected, actual));
    }
    Ok(())
}
