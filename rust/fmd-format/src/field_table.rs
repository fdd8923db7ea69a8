use std::ops::Index;

use fmd_common::{Error, Result};

/// A table holding exactly one value per field, indexed by field position.
///
/// The number of fields is not stored in the fragment metadata itself, so
/// every table is built against an externally supplied field count.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldTable<T>(Vec<T>);

impl<T> FieldTable<T> {
    /// Wraps `values`, failing unless there is exactly one value per field.
    pub fn new(values: Vec<T>, field_count: usize) -> Result<FieldTable<T>> {
        if values.len() != field_count {
            return Err(Error::invalid_arg(
                "field_count",
                format!(
                    "field table has {} entries, expected {field_count}",
                    values.len()
                ),
            ));
        }
        Ok(FieldTable(values))
    }

    /// Builds a table by invoking `f` for every field index in order.
    pub fn try_from_fn<F>(field_count: usize, f: F) -> Result<FieldTable<T>>
    where
        F: FnMut(usize) -> Result<T>,
    {
        let values = (0..field_count).map(f).collect::<Result<Vec<_>>>()?;
        Ok(FieldTable(values))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: usize) -> Option<&T> {
        self.0.get(field)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<T> {
        self.0
    }
}

impl<T> Index<usize> for FieldTable<T> {
    type Output = T;

    fn index(&self, field: usize) -> &T {
        &self.0[field]
    }
}

impl<'a, T> IntoIterator for &'a FieldTable<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
