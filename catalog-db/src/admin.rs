//! Catalog and metadata schema administration.
//!
//! Resetting is an explicit operator action and the precondition for any
//! (re)load; the pipeline never drops anything on its own.

use sqlx::PgPool;

use crate::{ident, Error, META_SCHEMA};

/// Drop and recreate the catalog schema, then open it up to the accounts the
/// serving layer connects with.
#[tracing::instrument(skip(pool), err)]
pub async fn reset_catalog(pool: &PgPool, catalog: &str) -> Result<(), Error> {
    let catalog = ident::check(catalog)?;
    tracing::info!(catalog, "resetting catalog schema");
    reset_schema(pool, catalog).await
}

/// Drop and recreate the metadata schema shared by all catalogs.
#[tracing::instrument(skip(pool), err)]
pub async fn reset_meta(pool: &PgPool) -> Result<(), Error> {
    tracing::info!(schema = META_SCHEMA, "resetting metadata schema");
    reset_schema(pool, META_SCHEMA).await
}

async fn reset_schema(pool: &PgPool, schema: &str) -> Result<(), Error> {
    let sql = format!(
        "DROP SCHEMA IF EXISTS {schema} CASCADE;\n\
         CREATE SCHEMA {schema};\n\
         GRANT USAGE, CREATE ON SCHEMA {schema} TO PUBLIC;"
    );
    sqlx::raw_sql(&sql).execute(pool).await?;
    Ok(())
}
