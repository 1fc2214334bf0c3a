//! Internal connection pool implementation

use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

/// A connection pool to the catalog store.
#[derive(Debug, Clone)]
pub struct DbConnPool(Pool<Postgres>);

impl DbConnPool {
    /// Set up a connection pool to the catalog store.
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        PgPoolOptions::new()
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await
            .map(Self)
    }
}

impl std::ops::Deref for DbConnPool {
    type Target = Pool<Postgres>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::ops::DerefMut for DbConnPool {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
