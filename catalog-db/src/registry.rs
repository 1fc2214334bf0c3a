//! Discovery of loaded chunk tables.

use std::collections::BTreeSet;

use common::chunk::ChunkId;
use indoc::indoc;
use sqlx::PgPool;

use crate::{ident, Error};

/// The sorted, deduplicated set of chunk ids for which a populated chunk
/// table of `table` exists in the catalog schema.
///
/// Chunk tables holding no rows (the placeholder chunk among them) are not
/// part of the result. No chunk tables at all is an empty result, not an
/// error.
#[tracing::instrument(skip(pool), err)]
pub async fn non_empty_chunks(
    pool: &PgPool,
    catalog: &str,
    table: &str,
) -> Result<Vec<ChunkId>, Error> {
    let catalog = ident::check(catalog)?;
    let table = ident::check(table)?;

    let pattern = format!("{table}\\_%");
    let names: Vec<String> = sqlx::query_scalar(indoc! {"
        SELECT table_name
        FROM information_schema.tables
        WHERE table_schema = $1 AND table_name LIKE $2
        ORDER BY table_name
    "})
    .bind(catalog)
    .bind(&pattern)
    .fetch_all(pool)
    .await?;

    let mut chunks = BTreeSet::new();
    for name in names {
        let Some(chunk) = chunk_id_from_table_name(&name, table) else {
            continue;
        };
        tracing::debug!(%name, %chunk, "chunk table found");
        let populated: bool =
            sqlx::query_scalar(&format!("SELECT EXISTS (SELECT 1 FROM {catalog}.{name})"))
                .fetch_one(pool)
                .await?;
        if populated {
            chunks.insert(chunk);
        }
    }

    let chunks: Vec<ChunkId> = chunks.into_iter().collect();
    tracing::info!(table, count = chunks.len(), "non-empty chunks discovered");
    Ok(chunks)
}

/// Parse the chunk id out of a chunk table name: `{table}_<digits>`.
/// Anything else (overlap tables, unrelated tables) is `None`.
pub fn chunk_id_from_table_name(name: &str, table: &str) -> Option<ChunkId> {
    let suffix = name.strip_prefix(table)?.strip_prefix('_')?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse::<i32>().ok().map(ChunkId::new)
}
