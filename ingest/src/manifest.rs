//! The empty-chunk manifest: every chunk id of the domain that received no
//! data, written one per line in ascending order. The query router reads it
//! to exclude those cells from fan-out.

use std::{collections::BTreeSet, path::Path};

use common::chunk::{ChunkDomain, ChunkId};
use fs_err as fs;

use crate::error::Error;

/// The ascending complement of `non_empty` within `domain`.
///
/// A non-empty id outside the domain means the store and the configuration
/// disagree about the deployment; that is reported, never dropped.
pub fn empty_chunks(domain: ChunkDomain, non_empty: &[ChunkId]) -> Result<Vec<ChunkId>, Error> {
    let populated: BTreeSet<ChunkId> = non_empty.iter().copied().collect();
    if let Some(&stray) = populated.iter().find(|chunk| !domain.contains(**chunk)) {
        return Err(Error::ChunkOutOfDomain {
            chunk: stray,
            total_chunks: domain.total_chunks(),
        });
    }
    Ok(domain
        .iter()
        .filter(|chunk| !populated.contains(chunk))
        .collect())
}

/// Write the manifest file: one id per line, newline-terminated, no header.
pub fn write(path: &Path, empty: &[ChunkId]) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut contents = String::with_capacity(empty.len() * 6);
    for chunk in empty {
        contents.push_str(&chunk.to_string());
        contents.push('\n');
    }
    fs::write(path, contents)?;
    tracing::info!(path = %path.display(), entries = empty.len(), "empty-chunk manifest written");
    Ok(())
}
