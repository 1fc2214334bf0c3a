//! DDL helpers for base tables and their per-chunk clones.

use std::collections::HashSet;

use common::chunk::{ChunkId, PLACEHOLDER_CHUNK_ID};
use indoc::indoc;
use sqlx::PgPool;

use crate::{ident, Error};

/// Staging column names the partitioner input schema may carry.
const STAGED_COLUMNS: [&str; 2] = ["_chunk_id", "_sub_chunk_id"];

/// Column names every partitioned table must end up with.
const CHUNK_COLUMNS: [&str; 2] = ["chunk_id", "sub_chunk_id"];

/// Physical name of the per-chunk clone of `table`.
pub fn chunk_table_name(table: &str, chunk: ChunkId) -> String {
    format!("{table}_{chunk}")
}

/// Execute a table's DDL inside the catalog schema.
#[tracing::instrument(skip(pool, ddl), err)]
pub async fn apply_ddl(pool: &PgPool, catalog: &str, ddl: &str) -> Result<(), Error> {
    let catalog = ident::check(catalog)?;
    let mut conn = pool.acquire().await?;

    let sql = format!("SET search_path TO {catalog};\n{ddl}");
    let applied = sqlx::raw_sql(&sql).execute(&mut *conn).await;
    // The pooled connection outlives this call; never leak the search_path.
    sqlx::raw_sql("RESET search_path").execute(&mut *conn).await?;
    applied?;
    Ok(())
}

/// Bring a freshly created base table to the partitioned layout: drop the
/// staging `_chunk_id`/`_sub_chunk_id` columns if the DDL carried them and
/// add `chunk_id`/`sub_chunk_id` if they are missing.
#[tracing::instrument(skip(pool), err)]
pub async fn align_partition_columns(
    pool: &PgPool,
    catalog: &str,
    table: &str,
) -> Result<(), Error> {
    let catalog = ident::check(catalog)?;
    let table = ident::check(table)?;

    let columns: Vec<String> = sqlx::query_scalar(indoc! {"
        SELECT column_name
        FROM information_schema.columns
        WHERE table_schema = $1 AND table_name = $2
    "})
    .bind(catalog)
    .bind(table)
    .fetch_all(pool)
    .await?;
    let present: HashSet<&str> = columns.iter().map(String::as_str).collect();

    let mut mods: Vec<String> = STAGED_COLUMNS
        .iter()
        .filter(|col| present.contains(**col))
        .map(|col| format!("DROP COLUMN {col}"))
        .collect();
    mods.extend(
        CHUNK_COLUMNS
            .iter()
            .filter(|col| !present.contains(**col))
            .map(|col| format!("ADD COLUMN {col} INT NOT NULL")),
    );

    if !mods.is_empty() {
        tracing::info!(table, mods = mods.len(), "aligning partition columns");
        let sql = format!("ALTER TABLE {catalog}.{table} {}", mods.join(", "));
        sqlx::raw_sql(&sql).execute(pool).await?;
    }
    Ok(())
}

/// Clone the base table's layout into a chunk table.
///
/// Deliberately not `IF NOT EXISTS`: an already-present chunk table means
/// data was loaded twice without a reset, which must surface as
/// [`Error::DuplicateLoad`].
#[tracing::instrument(skip(pool), err)]
pub async fn create_chunk_table(
    pool: &PgPool,
    catalog: &str,
    table: &str,
    chunk: ChunkId,
) -> Result<String, Error> {
    let catalog = ident::check(catalog)?;
    let table = ident::check(table)?;
    let chunk_table = chunk_table_name(table, chunk);

    let sql = format!(
        "CREATE TABLE {catalog}.{chunk_table} (LIKE {catalog}.{table} INCLUDING ALL)"
    );
    sqlx::raw_sql(&sql).execute(pool).await?;
    Ok(chunk_table)
}

/// Create the empty placeholder chunk table the serving layer answers
/// empty-cell queries against.
pub async fn create_placeholder_chunk(
    pool: &PgPool,
    catalog: &str,
    table: &str,
) -> Result<String, Error> {
    create_chunk_table(pool, catalog, table, PLACEHOLDER_CHUNK_ID).await
}
