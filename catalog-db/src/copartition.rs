//! Store-side queries backing dependent-table chunk reconciliation.
//!
//! A dependent table must share its parent's chunk assignment. These
//! functions materialise both sides of that check from the loaded chunk
//! tables: the parent's key → (chunk, sub-chunk) assignment, and the
//! dependent rows together with the chunk each one was found resident in.

use common::chunk::ChunkId;
use sqlx::PgPool;

use crate::{ident, schema_ops, Error};

/// Scan the parent's chunk tables for `(key, chunk_id, sub_chunk_id)`.
#[tracing::instrument(skip(pool, chunks), err)]
pub async fn parent_assignment(
    pool: &PgPool,
    catalog: &str,
    table: &str,
    key_column: &str,
    chunks: &[ChunkId],
) -> Result<Vec<(i64, i32, i32)>, Error> {
    let catalog = ident::check(catalog)?;
    let table = ident::check(table)?;
    let key_column = ident::check(key_column)?;

    let mut rows = Vec::new();
    for &chunk in chunks {
        let chunk_table = schema_ops::chunk_table_name(table, chunk);
        let sql = format!(
            "SELECT {key_column}, chunk_id, sub_chunk_id FROM {catalog}.{chunk_table}"
        );
        rows.extend(
            sqlx::query_as::<_, (i64, i32, i32)>(&sql)
                .fetch_all(pool)
                .await?,
        );
    }
    Ok(rows)
}

/// Scan the dependent table's chunk tables for `(key, parent_key)` pairs,
/// tagging each row with the chunk it is resident in.
#[tracing::instrument(skip(pool, chunks), err)]
pub async fn dependent_rows(
    pool: &PgPool,
    catalog: &str,
    table: &str,
    key_column: &str,
    parent_key_column: &str,
    chunks: &[ChunkId],
) -> Result<Vec<(i64, i64, ChunkId)>, Error> {
    let catalog = ident::check(catalog)?;
    let table = ident::check(table)?;
    let key_column = ident::check(key_column)?;
    let parent_key_column = ident::check(parent_key_column)?;

    let mut rows = Vec::new();
    for &chunk in chunks {
        let chunk_table = schema_ops::chunk_table_name(table, chunk);
        let sql = format!(
            "SELECT {key_column}, {parent_key_column} FROM {catalog}.{chunk_table}"
        );
        let resident: Vec<(i64, i64)> = sqlx::query_as(&sql).fetch_all(pool).await?;
        rows.extend(resident.into_iter().map(|(key, parent)| (key, parent, chunk)));
    }
    Ok(rows)
}
