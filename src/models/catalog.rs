//! Category catalog files.
//!
//! A catalog is a JSON array of `{ "name": ..., "coverUrl": ... }` objects.
//! Relative cover paths are resolved against the directory holding the
//! catalog so a catalog can ship next to its cover images.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use super::CategoryRecord;
use crate::covers::CoverSource;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Load the categories listed in the catalog file at `path`.
pub fn load_catalog(path: &Path) -> Result<Vec<CategoryRecord>, CatalogError> {
    let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let records: Vec<CategoryRecord> =
        serde_json::from_str(&text).map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    let records: Vec<CategoryRecord> = records
        .into_iter()
        .map(|record| resolve_cover(record, base))
        .collect();

    debug!(?path, count = records.len(), "Loaded category catalog");
    Ok(records)
}

fn resolve_cover(record: CategoryRecord, base: &Path) -> CategoryRecord {
    let url = record.cover_url();
    if url.contains("://") {
        return record;
    }
    match CoverSource::parse(url) {
        Ok(CoverSource::File(path)) if path.is_relative() => {
            let resolved = base.join(path).to_string_lossy().into_owned();
            record.with_cover_url(resolved)
        }
        _ => record,
    }
}
