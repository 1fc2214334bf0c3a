//! Enforcement of parent/dependent chunk co-location.
//!
//! A dependent table never computes its own chunk assignment: every row
//! takes the chunk of the parent row it references, which is what makes
//! chunk-local joins possible. The enforcer works on plain values so it can
//! be exercised without a store; the pipeline feeds it from the queries in
//! `catalog_db::copartition`.

use std::collections::BTreeMap;

use common::chunk::{ChunkId, MetaRow, SubChunkId};

use crate::error::Error;

/// A parent table's key → (chunk, sub-chunk) assignment.
#[derive(Debug, Clone, Default)]
pub struct ParentAssignment(BTreeMap<i64, (ChunkId, SubChunkId)>);

impl ParentAssignment {
    pub fn insert(&mut self, key: i64, chunk: ChunkId, sub_chunk: SubChunkId) {
        self.0.insert(key, (chunk, sub_chunk));
    }

    pub fn get(&self, key: i64) -> Option<(ChunkId, SubChunkId)> {
        self.0.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(i64, ChunkId, SubChunkId)> for ParentAssignment {
    fn from_iter<I: IntoIterator<Item = (i64, ChunkId, SubChunkId)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, chunk, sub_chunk)| (key, (chunk, sub_chunk)))
                .collect(),
        )
    }
}

/// One dependent row as found in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependentRow {
    pub key: i64,
    pub parent_key: i64,
    /// Chunk table the row was found resident in.
    pub resident_chunk: ChunkId,
}

/// Assign every dependent row its parent's chunk and sub-chunk, never a
/// recomputed one. Rows referencing an unloaded parent, or resident in a
/// chunk that contradicts the parent's assignment, abort the run — the
/// corrective action is a reset and a re-partition on the parent's
/// coordinates, not a silent move.
///
/// The result is sorted by key, so identical inputs produce identical
/// metadata regardless of discovery order.
pub fn enforce(
    table: &str,
    parent: &ParentAssignment,
    rows: impl IntoIterator<Item = DependentRow>,
) -> Result<Vec<MetaRow>, Error> {
    let mut out = Vec::new();
    for row in rows {
        let Some((chunk, sub_chunk)) = parent.get(row.parent_key) else {
            return Err(Error::DanglingParent {
                table: table.to_owned(),
                key: row.key,
                parent_key: row.parent_key,
            });
        };
        if row.resident_chunk != chunk {
            return Err(Error::MisplacedRow {
                table: table.to_owned(),
                key: row.key,
                parent_key: row.parent_key,
                resident: row.resident_chunk,
                expected: chunk,
            });
        }
        out.push(MetaRow {
            key: row.key,
            chunk,
            sub_chunk,
        });
    }
    out.sort_by_key(|row| row.key);
    Ok(out)
}
