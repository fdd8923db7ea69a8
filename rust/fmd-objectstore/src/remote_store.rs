//! Read-only access to fragment metadata stored in cloud object stores
//! (`s3://`, `gs://`, `az://`, `http(s)://`, `memory://`).
//!
//! The `object_store` client is asynchronous; each read blocks on a shared
//! Tokio runtime so the rest of the decoder stays synchronous.

use std::{
    ops::Range,
    sync::{Arc, OnceLock},
};

use bytes::Bytes;
use fmd_io::{ReadAt, StorageProfile};
use object_store::path::Path;
use tokio::runtime::Runtime;

use crate::{
    ObjectStore,
    url::{ObjectUrl, RelativePath},
};

/// An `ObjectStore` that resolves URLs through `object_store::parse_url_opts`.
///
/// Store options are taken from the process environment (`AWS_*`, `AZURE_*`,
/// `GOOGLE_*` variables), lowercased as `object_store` expects.
pub struct RemoteObjectStore {
    runtime: Arc<Runtime>,
    options: Vec<(String, String)>,
}

impl RemoteObjectStore {
    pub fn new() -> std::io::Result<RemoteObjectStore> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;
        Ok(Self::with_runtime(Arc::new(runtime)))
    }

    pub fn with_runtime(runtime: Arc<Runtime>) -> RemoteObjectStore {
        let options = std::env::vars()
            .filter(|(key, _)| {
                key.starts_with("AWS_") || key.starts_with("AZURE_") || key.starts_with("GOOGLE_")
            })
            .map(|(key, value)| (key.to_ascii_lowercase(), value))
            .collect();
        RemoteObjectStore { runtime, options }
    }
}

impl ObjectStore for RemoteObjectStore {
    fn open(&self, url: &ObjectUrl) -> std::io::Result<Arc<dyn ReadAt>> {
        let (store, path) = object_store::parse_url_opts(url, self.options.iter().cloned())
            .map_err(to_io_error)?;
        log::debug!("opening remote object {}", url.as_str());
        Ok(Arc::new(RemoteObject::new(
            self.runtime.clone(),
            Arc::from(store),
            path,
        )))
    }

    fn list(&self, url: &ObjectUrl) -> std::io::Result<Vec<ObjectUrl>> {
        let (store, prefix) = object_store::parse_url_opts(url, self.options.iter().cloned())
            .map_err(to_io_error)?;
        log::debug!("listing remote container {}", url.as_str());
        list_container(&self.runtime, store.as_ref(), url, &prefix)
    }
}

/// Lists the immediate children of the container `url`, stored under `prefix`
/// in `store`.
pub fn list_container(
    runtime: &Runtime,
    store: &dyn object_store::ObjectStore,
    url: &ObjectUrl,
    prefix: &Path,
) -> std::io::Result<Vec<ObjectUrl>> {
    if !url.is_container() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("list: '{}' is not a container url", url.as_str()),
        ));
    }
    let listing = runtime
        .block_on(store.list_with_delimiter(Some(prefix)))
        .map_err(to_io_error)?;

    let containers = listing
        .common_prefixes
        .iter()
        .filter_map(|p| p.filename().map(|name| format!("{name}/")));
    let objects = listing
        .objects
        .iter()
        .filter_map(|meta| meta.location.filename().map(str::to_string));
    containers
        .chain(objects)
        .map(|name| {
            RelativePath::new(&name)
                .and_then(|rel| url.resolve_relative(rel))
                .map_err(std::io::Error::other)
        })
        .collect()
}

/// A single remote object. The size is fetched on first use and cached.
pub struct RemoteObject {
    runtime: Arc<Runtime>,
    store: Arc<dyn object_store::ObjectStore>,
    path: Path,
    size: OnceLock<u64>,
}

impl RemoteObject {
    pub fn new(
        runtime: Arc<Runtime>,
        store: Arc<dyn object_store::ObjectStore>,
        path: Path,
    ) -> RemoteObject {
        RemoteObject {
            runtime,
            store,
            path,
            size: OnceLock::new(),
        }
    }
}

impl ReadAt for RemoteObject {
    fn size(&self) -> std::io::Result<u64> {
        if let Some(&size) = self.size.get() {
            return Ok(size);
        }
        let meta = self
            .runtime
            .block_on(self.store.head(&self.path))
            .map_err(to_io_error)?;
        Ok(*self.size.get_or_init(|| meta.size))
    }

    fn read_at(&self, range: Range<u64>) -> std::io::Result<Bytes> {
        let size = self.size()?;
        let end = range.end.min(size);
        if range.start >= end {
            return Ok(Bytes::new());
        }
        self.runtime
            .block_on(self.store.get_range(&self.path, range.start..end))
            .map_err(to_io_error)
    }

    fn storage_profile(&self) -> StorageProfile {
        StorageProfile {
            min_io_size: 64 * 1024,
            max_io_size: 16 * 1024 * 1024,
        }
    }
}

fn to_io_error(e: object_store::Error) -> std::io::Error {
    match e {
        object_store::Error::NotFound { .. } => {
            std::io::Error::new(std::io::ErrorKind::NotFound, e)
        }
        e => std::io::Error::other(e),
    }
}
