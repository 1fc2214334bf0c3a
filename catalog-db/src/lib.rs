//! Store layer of the chunk-loading pipeline.
//!
//! All DDL/DML the pipeline issues against the relational store lives here:
//! catalog and metadata schema administration, chunk-table cloning, chunk
//! discovery, and metadata-table population. Operations are free async
//! functions over a shared connection pool; nothing in this crate retries —
//! every failure is surfaced to the pipeline, which treats it as fatal.

use std::sync::Arc;

use sqlx::PgPool;

pub mod admin;
mod conn;
pub mod copartition;
mod ident;
pub mod meta;
pub mod registry;
pub mod schema_ops;
#[cfg(feature = "temp-db")]
pub mod temp;

use self::conn::DbConnPool;
#[cfg(feature = "temp-db")]
pub use self::temp::{TempCatalogDb, KEEP_TEMP_DIRS};

/// Schema holding the per-table global metadata tables.
pub const META_SCHEMA: &str = "shard_meta";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("error connecting to catalog store: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("error executing catalog statement: {0}")]
    Query(#[source] sqlx::Error),

    /// The store rejected a statement because the target object already
    /// exists or a key is already present. This is the signature of a second
    /// load run without an explicit reset in between.
    #[error("duplicate load detected, reset the catalog before reloading: {0}")]
    DuplicateLoad(String),

    #[error("invalid identifier {0:?}")]
    InvalidIdentifier(String),
}

// 42P07: duplicate_table, 23505: unique_violation.
impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if matches!(db_err.code().as_deref(), Some("42P07") | Some("23505")) {
                return Error::DuplicateLoad(db_err.message().to_owned());
            }
        }
        Error::Query(err)
    }
}

/// Handle to the catalog store. Clones share the same pool.
#[derive(Clone, Debug)]
pub struct CatalogDb {
    pool: DbConnPool,
    url: Arc<str>,
}

impl CatalogDb {
    /// Set up a connection pool to the catalog store.
    #[tracing::instrument(skip_all, err)]
    pub async fn connect(url: &str) -> Result<Self, Error> {
        let pool = DbConnPool::connect(url).await.map_err(Error::Connection)?;
        Ok(Self {
            pool,
            url: url.into(),
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}
