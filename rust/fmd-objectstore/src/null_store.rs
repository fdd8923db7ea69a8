//! "null" object store: a no-op implementation of the `ObjectStore` trait.

use std::sync::Arc;

use fmd_io::ReadAt;

use crate::{ObjectStore, url::ObjectUrl};

/// An `ObjectStore` whose every object is empty.
pub struct NullObjectStore;

impl ObjectStore for NullObjectStore {
    fn open(&self, _url: &ObjectUrl) -> std::io::Result<Arc<dyn ReadAt>> {
        Ok(Arc::new(Vec::<u8>::new()))
    }

    fn list(&self, _url: &ObjectUrl) -> std::io::Result<Vec<ObjectUrl>> {
        Ok(Vec::new())
    }
}
