//! Command implementations for fmd-cmd

use anyhow::{Context, Result};
use clap::Args;
use fmd_format::{FragmentMetadata, FragmentMetadataOptions, Schema};
use fmd_objectstore::{
    ObjectStore, fragment_metadata_urls, local_store::LocalFsObjectStore,
    remote_store::RemoteObjectStore, url::ObjectUrl,
};
use serde::Serialize;
use std::env;
use std::path::Path;
use std::sync::Arc;
use url::Url;

use crate::utils::load_schema;

pub mod coverage;
pub mod inspect;
pub mod verify;

/// Where the number of metadata fields comes from.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct FieldSource {
    /// Number of fields (attributes, coordinates, dimensions and timestamp fields)
    #[arg(long)]
    pub field_count: Option<usize>,

    /// Path to the JSON array schema
    #[arg(long)]
    pub schema: Option<String>,
}

impl FieldSource {
    /// Loads the schema if one was given.
    pub fn load_schema(&self) -> Result<Option<Schema>> {
        self.schema.as_deref().map(load_schema).transpose()
    }

    /// Resolves the field count, taking it from `schema` when present.
    pub fn field_count(&self, schema: Option<&Schema>) -> Result<usize> {
        match (schema, self.field_count) {
            (Some(schema), _) => Ok(schema.field_count()),
            (None, Some(count)) if count > 0 => Ok(count),
            (None, Some(_)) => anyhow::bail!("--field-count must be greater than zero"),
            (None, None) => anyhow::bail!("Either --field-count or --schema is required"),
        }
    }
}

/// Converts a file path string to an `ObjectUrl`.
///
/// If the input string is already a URL, it validates and returns it.
/// If the input is a file path (absolute or relative), it converts it to a file:// URL.
/// An existing directory becomes a container URL.
pub fn file_path_to_object_url(path_or_url: &str) -> Result<ObjectUrl> {
    if let Ok(object_url) = ObjectUrl::parse(path_or_url) {
        return Ok(object_url);
    }

    let path = Path::new(path_or_url);
    let absolute_path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .with_context(|| "Failed to get current directory")?
            .join(path)
    };

    let file_url = if absolute_path.is_dir() {
        Url::from_directory_path(&absolute_path)
    } else {
        Url::from_file_path(&absolute_path)
    }
    .map_err(|()| anyhow::anyhow!("Failed to convert path to URL: {}", absolute_path.display()))?;

    ObjectUrl::new(file_url)
        .with_context(|| format!("Invalid file URL for path: {}", absolute_path.display()))
}

/// Returns a store able to open `url`: the local filesystem for `file://`
/// URLs, a remote object store client otherwise.
pub fn get_object_store(url: &ObjectUrl) -> Result<Arc<dyn ObjectStore>> {
    if url.scheme() == "file" {
        Ok(Arc::new(LocalFsObjectStore::new_unscoped()))
    } else {
        let store = RemoteObjectStore::new().with_context(|| {
            format!("Failed to create object store client for {}", url.as_str())
        })?;
        Ok(Arc::new(store))
    }
}

/// Fragment metadata objects named by a command-line path, with the store
/// that serves them.
pub struct MetadataTargets {
    pub store: Arc<dyn ObjectStore>,
    pub urls: Vec<ObjectUrl>,
}

/// Resolves `path` to the fragment metadata objects it names.
///
/// `path` may be a metadata object, a fragment directory, an array directory
/// or its `__fragments/` directory; the latter two expand to every fragment.
pub fn resolve_metadata_urls(path: &str) -> Result<MetadataTargets> {
    let url = file_path_to_object_url(path)?;
    let store = get_object_store(&url)?;
    let urls = fragment_metadata_urls(store.as_ref(), &url)
        .with_context(|| format!("Failed to resolve {}", url.as_str()))?;
    if urls.is_empty() {
        anyhow::bail!("No fragments found under {}", url.as_str());
    }
    log::info!("Resolved {} fragment(s) under {}", urls.len(), url.as_str());
    Ok(MetadataTargets { store, urls })
}

/// Opens and decodes the fragment metadata at `url`.
pub fn open_metadata(
    store: &dyn ObjectStore,
    url: &ObjectUrl,
    field_count: usize,
) -> Result<FragmentMetadata> {
    FragmentMetadataOptions::new(field_count)
        .open_url(store, url)
        .with_context(|| format!("Failed to decode fragment metadata: {}", url.as_str()))
}

/// Prints a single report as a JSON object, several as a JSON array.
pub fn print_reports<T: Serialize>(reports: &[T]) -> Result<()> {
    let json = match reports {
        [report] => serde_json::to_string_pretty(report)?,
        reports => serde_json::to_string_pretty(reports)?,
    };
    println!("{json}");
    Ok(())
}
