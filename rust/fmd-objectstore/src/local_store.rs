use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use fmd_common::Error;
use fmd_io::{FileReader, ReadAt};
use url::Url;

use crate::{
    ObjectStore,
    url::{ObjectUrl, RelativePath},
};

/// An `ObjectStore` serving objects from the local filesystem, confined to a
/// container directory.
///
/// In `Passthrough` mode, object URLs are absolute `file://` URLs on the host
/// filesystem (e.g. `file:///home/user/frag/__fragment_metadata.tdb`), and
/// access outside the container is refused. In `VirtualRoot` mode, URL paths
/// are interpreted relative to the container directory.
pub struct LocalFsObjectStore {
    /// The top-level directory for this object store.
    container_path: PathBuf,
    /// The URL representing the top-level directory of this object store.
    container_url: ObjectUrl,
    mode: LocalFsMode,
}

impl LocalFsObjectStore {
    /// Creates a new `LocalFsObjectStore` rooted at `container_path`.
    pub fn new(container_path: &Path, mode: LocalFsMode) -> fmd_common::Result<LocalFsObjectStore> {
        let url = Url::from_directory_path(container_path).map_err(|()| {
            Error::invalid_arg(
                "container",
                format!("invalid path {container_path:?} for local object store"),
            )
        })?;
        Ok(LocalFsObjectStore {
            container_path: container_path.to_path_buf(),
            container_url: ObjectUrl::new(url)?,
            mode,
        })
    }

    /// Creates a store that accepts any `file:///` URL on the host.
    pub fn new_unscoped() -> LocalFsObjectStore {
        LocalFsObjectStore {
            container_path: PathBuf::from("/"),
            container_url: ObjectUrl::parse("file:///").expect("parse unscoped"),
            mode: LocalFsMode::Passthrough,
        }
    }

    pub fn container_path(&self) -> &Path {
        &self.container_path
    }

    pub fn container_url(&self) -> &ObjectUrl {
        &self.container_url
    }

    /// Converts an [`ObjectUrl`] within this store's container to a local path.
    pub fn url_to_path(&self, url: &ObjectUrl) -> fmd_common::Result<PathBuf> {
        let relative_path = match self.mode {
            LocalFsMode::Passthrough => self.container_url.make_relative(url).ok_or_else(|| {
                Error::invalid_arg(
                    "url",
                    format!(
                        "object url '{}' is outside of the local fs container",
                        url.as_str()
                    ),
                )
            })?,
            LocalFsMode::VirtualRoot => url.path().trim_start_matches('/').to_string(),
        };
        if relative_path.is_empty() {
            return Err(Error::invalid_arg("url", "object url has an empty path"));
        }
        Ok(self.container_path.join(relative_path))
    }

    /// Converts a container [`ObjectUrl`] within this store to a local directory.
    pub fn container_url_to_path(&self, url: &ObjectUrl) -> fmd_common::Result<PathBuf> {
        if !url.is_container() {
            return Err(Error::invalid_arg(
                "url",
                format!("'{}' is not a container url", url.as_str()),
            ));
        }
        match self.mode {
            LocalFsMode::Passthrough => {
                if !url.as_str().starts_with(self.container_url.as_str()) {
                    return Err(Error::invalid_arg(
                        "url",
                        format!(
                            "container url '{}' is outside of the local fs container",
                            url.as_str()
                        ),
                    ));
                }
                url.to_file_path().map_err(|()| {
                    Error::invalid_arg("url", format!("'{}' is not a local path", url.as_str()))
                })
            }
            LocalFsMode::VirtualRoot => Ok(self
                .container_path
                .join(url.path().trim_start_matches('/'))),
        }
    }
}

impl ObjectStore for LocalFsObjectStore {
    fn open(&self, url: &ObjectUrl) -> std::io::Result<Arc<dyn ReadAt>> {
        let path = self.url_to_path(url).map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("open: invalid url: {e}"),
            )
        })?;
        log::debug!("opening local object {}", path.display());
        Ok(Arc::new(FileReader::open(path)?))
    }

    fn list(&self, url: &ObjectUrl) -> std::io::Result<Vec<ObjectUrl>> {
        let path = self.container_url_to_path(url).map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("list: invalid url: {e}"),
            )
        })?;
        log::debug!("listing local container {}", path.display());

        let mut children = Vec::new();
        for entry in std::fs::read_dir(&path)? {
            let entry = entry?;
            let Ok(mut name) = entry.file_name().into_string() else {
                log::warn!("skipping non-UTF-8 entry in {}", path.display());
                continue;
            };
            if entry.file_type()?.is_dir() {
                name.push('/');
            }
            match RelativePath::new(&name).and_then(|rel| url.resolve_relative(rel)) {
                Ok(child) => children.push(child),
                Err(e) => log::warn!("skipping entry {name:?} in {}: {e}", path.display()),
            }
        }
        Ok(children)
    }
}

/// Defines how `LocalFsObjectStore` maps object URLs to filesystem paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalFsMode {
    /// URLs are full host paths that must reside within the container folder.
    Passthrough,
    /// The container acts as a virtual root; URL paths are relative to it.
    VirtualRoot,
}
