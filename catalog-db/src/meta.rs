//! Global metadata table: primary key → (chunk, sub-chunk) for every row of
//! a partitioned table, used by the query router for cross-node joins.
//!
//! The metadata build for a table is all-or-nothing: the stale table is
//! dropped, recreated and populated inside one transaction, so a failing
//! statement leaves no partial table behind.

use common::chunk::{ChunkId, MetaRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use crate::{ident, schema_ops, Error, META_SCHEMA};

/// Bind-parameter limits make unbounded multi-row inserts fragile; 1000 rows
/// stays well under Postgres' 65535-parameter ceiling at 3 binds per row.
const INSERT_BATCH: usize = 1000;

/// Physical name of the metadata table for `table` in [`META_SCHEMA`].
pub fn meta_table_name(catalog: &str, table: &str) -> String {
    format!("{catalog}__{table}")
}

/// Recreate the metadata table and fill it by scanning every discovered
/// chunk table of `table`. Returns the number of rows recorded.
#[tracing::instrument(skip(pool, chunks), err)]
pub async fn rebuild_from_chunks(
    pool: &PgPool,
    catalog: &str,
    table: &str,
    key_column: &str,
    chunks: &[ChunkId],
) -> Result<u64, Error> {
    let catalog = ident::check(catalog)?;
    let table = ident::check(table)?;
    let key_column = ident::check(key_column)?;
    let meta_table = meta_table_name(catalog, table);

    let mut tx = pool.begin().await?;
    recreate_meta_table(&mut tx, &meta_table, key_column).await?;

    let mut rows = 0u64;
    for &chunk in chunks {
        let chunk_table = schema_ops::chunk_table_name(table, chunk);
        let sql = format!(
            "INSERT INTO {META_SCHEMA}.{meta_table} \
             SELECT {key_column}, chunk_id, sub_chunk_id FROM {catalog}.{chunk_table}"
        );
        rows += sqlx::raw_sql(&sql).execute(&mut *tx).await?.rows_affected();
    }
    tx.commit().await?;

    tracing::info!(table, rows, "metadata table rebuilt from chunk scan");
    Ok(rows)
}

/// Recreate the metadata table and fill it with externally computed rows.
/// Used for dependent tables, whose assignment is inherited from the parent
/// rather than read back from their own chunk tables.
#[tracing::instrument(skip(pool, rows), err)]
pub async fn rebuild_from_rows(
    pool: &PgPool,
    catalog: &str,
    table: &str,
    key_column: &str,
    rows: &[MetaRow],
) -> Result<u64, Error> {
    let catalog = ident::check(catalog)?;
    let table = ident::check(table)?;
    let key_column = ident::check(key_column)?;
    let meta_table = meta_table_name(catalog, table);

    let mut tx = pool.begin().await?;
    recreate_meta_table(&mut tx, &meta_table, key_column).await?;

    for batch in rows.chunks(INSERT_BATCH) {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "INSERT INTO {META_SCHEMA}.{meta_table} ({key_column}, chunk_id, sub_chunk_id) "
        ));
        builder.push_values(batch, |mut b, row| {
            b.push_bind(row.key)
                .push_bind(row.chunk.get())
                .push_bind(row.sub_chunk.get());
        });
        builder.build().execute(&mut *tx).await.map_err(Error::from)?;
    }
    tx.commit().await?;

    tracing::info!(table, rows = rows.len(), "metadata table rebuilt from enforced rows");
    Ok(rows.len() as u64)
}

async fn recreate_meta_table(
    tx: &mut Transaction<'_, Postgres>,
    meta_table: &str,
    key_column: &str,
) -> Result<(), Error> {
    let sql = format!(
        "DROP TABLE IF EXISTS {META_SCHEMA}.{meta_table};\n\
         CREATE TABLE {META_SCHEMA}.{meta_table} (\
         {key_column} BIGINT NOT NULL PRIMARY KEY, \
         chunk_id INT NOT NULL, \
         sub_chunk_id INT NOT NULL)"
    );
    sqlx::raw_sql(&sql).execute(&mut **tx).await?;
    Ok(())
}
