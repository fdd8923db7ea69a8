//! Array schema description, used to derive the field count and to check
//! decoded sizes. Decoding itself never consults the schema.
//!
//! Field positions in fragment metadata tables:
//!
//! ```text
//! attributes...        0 .. A
//! coordinates          A
//! dimensions...        A + 1 .. A + 1 + D
//! timestamps           (if has_timestamps)
//! delete timestamps    (if has_delete_metadata)
//! delete condition idx (if has_delete_metadata)
//! ```

use fmd_common::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::datatype::Datatype;

/// `cell_val_num` marking a variable-sized attribute.
pub const VAR_NUM: u32 = u32::MAX;

/// Size of a timestamp or delete condition index value.
const TIMESTAMP_SIZE: u64 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Attribute,
    Coords,
    Dimension,
    Timestamps,
    DeleteTimestamps,
    DeleteConditionIndex,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    pub datatype: Datatype,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub datatype: Datatype,
    #[serde(default = "default_cell_val_num")]
    pub cell_val_num: u32,
    #[serde(default)]
    pub nullable: bool,
}

fn default_cell_val_num() -> u32 {
    1
}

impl Attribute {
    pub fn is_var_sized(&self) -> bool {
        self.cell_val_num == VAR_NUM
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub dimensions: Vec<Dimension>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub capacity: u64,
    #[serde(default)]
    pub sparse: bool,
    #[serde(default)]
    pub allow_dups: bool,
    #[serde(default)]
    pub has_timestamps: bool,
    #[serde(default)]
    pub has_delete_metadata: bool,
}

/// One field of the metadata tables, as described by the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldInfo {
    /// Position in the fragment metadata tables.
    pub index: usize,
    pub name: String,
    pub field_type: FieldType,
    pub var_sized: bool,
    pub nullable: bool,
    /// Size of a fixed-size cell; `None` for var-sized attributes and for
    /// the coordinates field.
    pub cell_size: Option<u64>,
}

impl Schema {
    pub fn from_json(json: &str) -> Result<Schema> {
        serde_json::from_str(json)
            .map_err(|e| Error::invalid_arg("schema", format!("invalid schema json: {e}")))
    }

    /// Number of fields stored in fragment metadata for this schema.
    pub fn field_count(&self) -> usize {
        let mut count = self.attributes.len() + 1 + self.dimensions.len();
        if self.has_timestamps {
            count += 1;
        }
        if self.has_delete_metadata {
            count += 2;
        }
        count
    }

    /// Position of a field in the fragment metadata tables. `idx` selects the
    /// attribute or dimension and is ignored for the other field types.
    pub fn field_index(&self, field_type: FieldType, idx: usize) -> Result<usize> {
        let attrs = self.attributes.len();
        let dims = self.dimensions.len();
        let timestamps = self.has_timestamps as usize;
        match field_type {
            FieldType::Attribute if idx < attrs => Ok(idx),
            FieldType::Coords => Ok(attrs),
            FieldType::Dimension if idx < dims => Ok(attrs + 1 + idx),
            FieldType::Timestamps if self.has_timestamps => Ok(attrs + 1 + dims),
            FieldType::DeleteTimestamps if self.has_delete_metadata => {
                Ok(attrs + 1 + dims + timestamps)
            }
            FieldType::DeleteConditionIndex if self.has_delete_metadata => {
                Ok(attrs + 1 + dims + timestamps + 1)
            }
            _ => Err(Error::invalid_arg(
                "field",
                format!("schema has no {field_type:?} field {idx}"),
            )),
        }
    }

    pub fn is_var_sized(&self, field_type: FieldType, idx: usize) -> bool {
        field_type == FieldType::Attribute
            && self
                .attributes
                .get(idx)
                .is_some_and(|attr| attr.is_var_sized())
    }

    /// Size in bytes of one cell of a fixed-size field.
    pub fn cell_size(&self, field_type: FieldType, idx: usize) -> Result<u64> {
        match field_type {
            FieldType::Attribute => {
                let attr = self.attributes.get(idx).ok_or_else(|| {
                    Error::invalid_arg("field", format!("schema has no attribute {idx}"))
                })?;
                if attr.is_var_sized() {
                    return Err(Error::invalid_arg(
                        "field",
                        format!("attribute '{}' is var-sized", attr.name),
                    ));
                }
                Ok(attr.cell_val_num as u64 * attr.datatype.size())
            }
            FieldType::Dimension => self
                .dimensions
                .get(idx)
                .map(|dim| dim.datatype.size())
                .ok_or_else(|| {
                    Error::invalid_arg("field", format!("schema has no dimension {idx}"))
                }),
            FieldType::Timestamps
            | FieldType::DeleteTimestamps
            | FieldType::DeleteConditionIndex => Ok(TIMESTAMP_SIZE),
            FieldType::Coords => Err(Error::invalid_arg(
                "field",
                "coordinates field has no cell size",
            )),
        }
    }

    /// All fields in metadata table order.
    pub fn fields(&self) -> Vec<FieldInfo> {
        let mut fields = Vec::with_capacity(self.field_count());
        for (i, attr) in self.attributes.iter().enumerate() {
            fields.push(FieldInfo {
                index: fields.len(),
                name: attr.name.clone(),
                field_type: FieldType::Attribute,
                var_sized: attr.is_var_sized(),
                nullable: attr.nullable,
                cell_size: self.cell_size(FieldType::Attribute, i).ok(),
            });
        }
        fields.push(FieldInfo {
            index: fields.len(),
            name: "__coords".to_string(),
            field_type: FieldType::Coords,
            var_sized: false,
            nullable: false,
            cell_size: None,
        });
        for dim in &self.dimensions {
            fields.push(FieldInfo {
                index: fields.len(),
                name: dim.name.clone(),
                field_type: FieldType::Dimension,
                var_sized: false,
                nullable: false,
                cell_size: Some(dim.datatype.size()),
            });
        }
        let mut push_u64 = |name: &str, field_type: FieldType| {
            let index = fields.len();
            fields.push(FieldInfo {
                index,
                name: name.to_string(),
                field_type,
                var_sized: false,
                nullable: false,
                cell_size: Some(TIMESTAMP_SIZE),
            })
        };
        if self.has_timestamps {
            push_u64("__timestamps", FieldType::Timestamps);
        }
        if self.has_delete_metadata {
            push_u64("__delete_timestamps", FieldType::DeleteTimestamps);
            push_u64("__delete_condition_index", FieldType::DeleteConditionIndex);
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use crate::datatype::Datatype;

    use super::{FieldType, Schema, VAR_NUM};

    const SCHEMA_JSON: &str = r#"{
        "dimensions": [
            {"name": "rows", "datatype": "INT64"},
            {"name": "cols", "datatype": "FLOAT32"}
        ],
        "attributes": [
            {"name": "a", "datatype": "INT32"},
            {"name": "b", "datatype": "STRING_UTF8", "cell_val_num": 4294967295, "nullable": true},
            {"name": "c", "datatype": "FLOAT64", "cell_val_num": 3}
        ],
        "capacity": 10000,
        "sparse": true,
        "has_timestamps": true,
        "has_delete_metadata": true
    }"#;

    #[test]
    fn test_parse_schema() {
        let schema = Schema::from_json(SCHEMA_JSON).unwrap();
        assert_eq!(schema.dimensions.len(), 2);
        assert_eq!(schema.attributes[0].cell_val_num, 1);
        assert_eq!(schema.attributes[1].cell_val_num, VAR_NUM);
        assert!(schema.attributes[1].nullable);
        assert_eq!(schema.dimensions[1].datatype, Datatype::Float32);
        assert!(!schema.allow_dups);
        assert!(Schema::from_json("{\"attributes\": 1}").is_err());
    }

    #[test]
    fn test_field_positions() {
        let schema = Schema::from_json(SCHEMA_JSON).unwrap();
        assert_eq!(schema.field_count(), 3 + 1 + 2 + 1 + 2);
        assert_eq!(schema.field_index(FieldType::Attribute, 2).unwrap(), 2);
        assert_eq!(schema.field_index(FieldType::Coords, 0).unwrap(), 3);
        assert_eq!(schema.field_index(FieldType::Dimension, 1).unwrap(), 5);
        assert_eq!(schema.field_index(FieldType::Timestamps, 0).unwrap(), 6);
        assert_eq!(schema.field_index(FieldType::DeleteTimestamps, 0).unwrap(), 7);
        assert_eq!(
            schema.field_index(FieldType::DeleteConditionIndex, 0).unwrap(),
            8
        );
        assert!(schema.field_index(FieldType::Attribute, 3).is_err());

        let fields = schema.fields();
        assert_eq!(fields.len(), schema.field_count());
        assert!(fields.iter().enumerate().all(|(i, f)| f.index == i));
        assert_eq!(fields[5].name, "cols");
        assert_eq!(fields[8].field_type, FieldType::DeleteConditionIndex);
    }

    #[test]
    fn test_field_index_without_optional_fields() {
        let mut schema = Schema::from_json(SCHEMA_JSON).unwrap();
        schema.has_timestamps = false;
        assert_eq!(schema.field_count(), 8);
        assert!(schema.field_index(FieldType::Timestamps, 0).is_err());
        assert_eq!(schema.field_index(FieldType::DeleteTimestamps, 0).unwrap(), 6);
    }

    #[test]
    fn test_cell_sizes() {
        let schema = Schema::from_json(SCHEMA_JSON).unwrap();
        assert_eq!(schema.cell_size(FieldType::Attribute, 0).unwrap(), 4);
        assert!(schema.cell_size(FieldType::Attribute, 1).is_err());
        assert_eq!(schema.cell_size(FieldType::Attribute, 2).unwrap(), 24);
        assert_eq!(schema.cell_size(FieldType::Dimension, 1).unwrap(), 4);
        assert_eq!(schema.cell_size(FieldType::Timestamps, 0).unwrap(), 8);
        assert!(schema.cell_size(FieldType::Coords, 0).is_err());
        assert!(schema.is_var_sized(FieldType::Attribute, 1));
        assert!(!schema.is_var_sized(FieldType::Dimension, 0));
    }
}
