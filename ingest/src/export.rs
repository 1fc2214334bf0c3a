//! Export marker tree consumed by the storage node's serving layer.
//!
//! The serving layer scans one directory per logical table and treats each
//! zero-byte file, named by chunk id, as "this chunk can be served". The
//! placeholder chunk gets a marker too, so queries that touch only empty
//! cells still have a table to run against.

use std::path::{Path, PathBuf};

use common::chunk::{ChunkId, PLACEHOLDER_CHUNK_ID};
use fs_err as fs;

use crate::{error::Error, fsutil};

/// Recreate the table's export directory and write one marker per
/// non-empty chunk, plus the placeholder chunk.
pub fn provision(
    export_root: &Path,
    table: &str,
    non_empty: &[ChunkId],
) -> Result<PathBuf, Error> {
    let table_dir = export_root.join(table);
    fsutil::recreate_dir(&table_dir)?;

    for chunk in non_empty
        .iter()
        .copied()
        .chain(std::iter::once(PLACEHOLDER_CHUNK_ID))
    {
        fs::File::create(table_dir.join(chunk.to_string()))?;
    }

    tracing::info!(
        table,
        markers = non_empty.len() + 1,
        dir = %table_dir.display(),
        "export directory provisioned"
    );
    Ok(table_dir)
}

/// Recreate the shared result staging directory next to the export tree.
pub fn reset_result_dir(export_root: &Path) -> Result<PathBuf, Error> {
    let result_dir = export_root.join("result");
    fsutil::recreate_dir(&result_dir)?;
    Ok(result_dir)
}
