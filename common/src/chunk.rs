//! Chunk-domain types shared across the loading pipeline.
//!
//! A chunk is one spatial cell of the sharded catalog, identified by an
//! integer in the deployment's fixed domain `[0, total_chunks)`. Chunk ids
//! are assigned by the external spatial partitioner and embedded in the
//! names of the per-chunk tables.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Reserved id for the placeholder chunk table every partitioned table
/// carries. The serving layer answers queries that touch only empty cells
/// against this table; it never holds rows and lies outside any realistic
/// domain.
pub const PLACEHOLDER_CHUNK_ID: ChunkId = ChunkId(1_234_567_890);

/// Identifier of one spatial cell.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct ChunkId(i32);

impl ChunkId {
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    pub fn get(self) -> i32 {
        self.0
    }
}

impl From<i32> for ChunkId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a sub-cell within a chunk, used for chunk-local joins.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct SubChunkId(i32);

impl SubChunkId {
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    pub fn get(self) -> i32 {
        self.0
    }
}

impl From<i32> for SubChunkId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl fmt::Display for SubChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The deployment's chunk-id domain `[0, total_chunks)`.
///
/// The domain size is a deployment parameter, not a universal constant. For a
/// spherical partitioning with `n` stripes the partitioner can emit at most
/// `2 * n^2` chunk ids, which is the default when no explicit size is
/// configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkDomain {
    total_chunks: u32,
}

impl ChunkDomain {
    pub fn new(total_chunks: u32) -> Self {
        Self { total_chunks }
    }

    /// Largest possible domain for a given stripe count: `2 * stripes^2`.
    pub fn from_stripes(stripes: u32) -> Self {
        Self {
            total_chunks: 2 * stripes * stripes,
        }
    }

    pub fn total_chunks(&self) -> u32 {
        self.total_chunks
    }

    pub fn contains(&self, chunk: ChunkId) -> bool {
        chunk.0 >= 0 && (chunk.0 as u32) < self.total_chunks
    }

    /// All chunk ids of the domain, ascending.
    pub fn iter(&self) -> impl Iterator<Item = ChunkId> {
        (0..self.total_chunks as i32).map(ChunkId)
    }
}

/// One row of the global metadata table: the location of a single catalog
/// row in the sharded layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetaRow {
    /// Primary key of the catalog row.
    pub key: i64,
    pub chunk: ChunkId,
    pub sub_chunk: SubChunkId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_from_stripes_is_twice_the_square() {
        assert_eq!(ChunkDomain::from_stripes(60).total_chunks(), 7200);
        assert_eq!(ChunkDomain::from_stripes(0).total_chunks(), 0);
    }

    #[test]
    fn domain_membership() {
        let domain = ChunkDomain::new(10);
        assert!(domain.contains(ChunkId::new(0)));
        assert!(domain.contains(ChunkId::new(9)));
        assert!(!domain.contains(ChunkId::new(10)));
        assert!(!domain.contains(ChunkId::new(-1)));
        assert!(!domain.contains(PLACEHOLDER_CHUNK_ID));
    }

    #[test]
    fn domain_iteration_is_ascending_and_complete() {
        let ids: Vec<i32> = ChunkDomain::new(4).iter().map(ChunkId::get).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert_eq!(ChunkDomain::new(0).iter().count(), 0);
    }

    #[test]
    fn chunk_ids_order_numerically() {
        let mut ids = vec![ChunkId::new(12), ChunkId::new(3), ChunkId::new(7)];
        ids.sort();
        assert_eq!(ids, vec![ChunkId::new(3), ChunkId::new(7), ChunkId::new(12)]);
    }
}
