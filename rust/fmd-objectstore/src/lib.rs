//! *Object Store* abstraction: a "storage service" client capable of issuing
//! positional readers (`ReadAt`) for a given object URL.
//!
//! Fragment metadata files are read either from the local filesystem or from a
//! remote object store (S3 and friends, behind the `remote` feature).

pub mod local_store;
pub mod null_store;
#[cfg(feature = "remote")]
pub mod remote_store;
pub mod url;

use std::sync::Arc;

use fmd_io::ReadAt;
use url::{ObjectUrl, RelativePath};

/// Name of the fragment metadata object inside a fragment container.
pub const FRAGMENT_METADATA_FILE_NAME: &str = "__fragment_metadata.tdb";

/// Name of the container holding the fragments of an array.
pub const FRAGMENTS_DIR_NAME: &str = "__fragments";

/// The `ObjectStore` trait represents a "storage service" abstraction.
pub trait ObjectStore: Send + Sync + 'static {
    /// Opens a reader for an existing object specified by the given URL.
    fn open(&self, url: &ObjectUrl) -> std::io::Result<Arc<dyn ReadAt>>;

    /// Lists the immediate children of the container `url`.
    ///
    /// Nested containers are returned as container URLs (ending in `/`).
    /// The order of the result is unspecified.
    fn list(&self, url: &ObjectUrl) -> std::io::Result<Vec<ObjectUrl>>;
}

/// Returns the URL of the fragment metadata object for `url`.
///
/// A container URL (ending in `/`) denotes a fragment directory and resolves to
/// its `__fragment_metadata.tdb` object; any other URL is returned as is.
pub fn fragment_metadata_url(url: &ObjectUrl) -> fmd_common::Result<ObjectUrl> {
    if url.is_container() {
        url.resolve_relative(RelativePath::new(FRAGMENT_METADATA_FILE_NAME)?)
    } else {
        Ok(url.clone())
    }
}

/// Resolves `url` to every fragment metadata object it denotes.
///
/// - an object URL is returned as is;
/// - a fragment container yields its `__fragment_metadata.tdb` object;
/// - an array container, or its `__fragments/` container, yields the metadata
///   object of each fragment container found under `__fragments/`.
///
/// The result is sorted by URL. A container matching none of these layouts is
/// reported as `NotFound`.
pub fn fragment_metadata_urls(
    store: &dyn ObjectStore,
    url: &ObjectUrl,
) -> std::io::Result<Vec<ObjectUrl>> {
    if !url.is_container() {
        return Ok(vec![url.clone()]);
    }

    let children = store.list(url)?;
    if let Some(metadata) = children
        .iter()
        .find(|child| last_segment(child) == Some(FRAGMENT_METADATA_FILE_NAME))
    {
        return Ok(vec![metadata.clone()]);
    }

    let fragments_dir = if last_segment(url) == Some(FRAGMENTS_DIR_NAME) {
        Some(url.clone())
    } else {
        children
            .into_iter()
            .find(|child| child.is_container() && last_segment(child) == Some(FRAGMENTS_DIR_NAME))
    };
    let Some(fragments_dir) = fragments_dir else {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no fragment metadata found under '{}'", url.as_str()),
        ));
    };

    let mut urls = store
        .list(&fragments_dir)?
        .iter()
        .filter(|child| child.is_container())
        .map(fragment_metadata_url)
        .collect::<fmd_common::Result<Vec<_>>>()
        .map_err(std::io::Error::other)?;
    urls.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    log::debug!(
        "found {} fragments under {}",
        urls.len(),
        fragments_dir.as_str()
    );
    Ok(urls)
}

/// Returns the last non-empty path segment of `url`.
fn last_segment(url: &ObjectUrl) -> Option<&str> {
    url.path_segments()?.filter(|s| !s.is_empty()).next_back()
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;
    use url::Url;

    use crate::{
        fragment_metadata_url, fragment_metadata_urls, local_store::LocalFsObjectStore,
        url::ObjectUrl,
    };

    fn dir_url(path: &std::path::Path) -> ObjectUrl {
        ObjectUrl::new(Url::from_directory_path(path).unwrap()).unwrap()
    }

    /// Lays out `array/__fragments/{names}/__fragment_metadata.tdb`.
    fn array_dir(names: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for name in names {
            let fragment = dir.path().join("array").join("__fragments").join(name);
            std::fs::create_dir_all(&fragment).unwrap();
            std::fs::write(fragment.join("__fragment_metadata.tdb"), b"fmd").unwrap();
        }
        std::fs::create_dir_all(dir.path().join("array").join("__schema")).unwrap();
        std::fs::write(dir.path().join("array").join("__fragments").join("stray.tdb"), b"").unwrap();
        dir
    }

    #[test]
    fn test_fragment_metadata_urls() {
        let dir = array_dir(&["__2_2_b_22", "__1_1_a_22"]);
        let store = LocalFsObjectStore::new_unscoped();
        let array = dir.path().join("array");

        let expected = ["__1_1_a_22", "__2_2_b_22"]
            .map(|name| {
                dir_url(&array.join("__fragments").join(name))
                    .as_str()
                    .to_string()
                    + "__fragment_metadata.tdb"
            })
            .to_vec();
        let as_strings = |urls: Vec<ObjectUrl>| {
            urls.iter()
                .map(|url| url.as_str().to_string())
                .collect::<Vec<_>>()
        };

        let from_array = fragment_metadata_urls(&store, &dir_url(&array)).unwrap();
        assert_eq!(as_strings(from_array), expected);

        let from_fragments =
            fragment_metadata_urls(&store, &dir_url(&array.join("__fragments"))).unwrap();
        assert_eq!(as_strings(from_fragments), expected);

        let fragment = dir_url(&array.join("__fragments").join("__1_1_a_22"));
        let single = fragment_metadata_urls(&store, &fragment).unwrap();
        assert_eq!(as_strings(single), expected[..1].to_vec());

        let object = ObjectUrl::parse(&expected[1]).unwrap();
        assert_eq!(fragment_metadata_urls(&store, &object).unwrap(), vec![object]);
    }

    #[test]
    fn test_fragment_metadata_urls_outside_an_array() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("other.tdb"), b"").unwrap();
        let store = LocalFsObjectStore::new_unscoped();
        let err = fragment_metadata_urls(&store, &dir_url(dir.path())).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);

        let empty = TempDir::new().unwrap();
        std::fs::create_dir(empty.path().join("__fragments")).unwrap();
        let urls = fragment_metadata_urls(&store, &dir_url(empty.path())).unwrap();
        assert!(urls.is_empty());
    }

    #[test]
    fn test_fragment_metadata_url() {
        let dir = ObjectUrl::parse("s3://bucket/arr/__fragments/__1_1_x_22/").unwrap();
        assert_eq!(
            fragment_metadata_url(&dir).unwrap().as_str(),
            "s3://bucket/arr/__fragments/__1_1_x_22/__fragment_metadata.tdb"
        );

        let file = ObjectUrl::parse("file:///tmp/frag/meta.tdb").unwrap();
        assert_eq!(fragment_metadata_url(&file).unwrap(), file);
    }
}
