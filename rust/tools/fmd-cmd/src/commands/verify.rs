use anyhow::{Context, Result};
use fmd_format::{FragmentMetadata, Schema};

use super::{open_metadata, resolve_metadata_urls};
use crate::utils::load_schema;

pub fn run(schema_path: String, path: String) -> Result<()> {
    let schema = load_schema(&schema_path)?;
    let targets = resolve_metadata_urls(&path)?;

    let mut failed = 0;
    for url in &targets.urls {
        log::info!("Verifying fragment metadata: {}", url.as_str());
        let result = open_metadata(targets.store.as_ref(), url, schema.field_count())
            .and_then(|metadata| verify(&metadata, &schema).map(|()| metadata));
        match result {
            Ok(metadata) => println!("{}: OK ({} fields)", url.as_str(), metadata.field_count()),
            Err(e) => {
                println!("{}: FAILED: {e:#}", url.as_str());
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!(
            "{failed} of {} fragment(s) failed verification",
            targets.urls.len()
        );
    }
    Ok(())
}

fn verify(metadata: &FragmentMetadata, schema: &Schema) -> Result<()> {
    metadata
        .verify(schema)
        .context("Fragment metadata does not match the schema")
}
