//! Temporary catalog store for tests, backed by a throwaway Postgres
//! cluster. The cluster and its data directory are deleted on drop.

use std::sync::LazyLock;

use pgtemp::{PgTempDB, PgTempDBBuilder};

use crate::CatalogDb;

/// Whether to keep the temporary data directory after the store is dropped.
///
/// `false` by default, overridden by the `KEEP_TEMP_DIRS` environment
/// variable.
pub static KEEP_TEMP_DIRS: LazyLock<bool> = LazyLock::new(|| {
    std::env::var("KEEP_TEMP_DIRS")
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(false)
});

/// Temporary catalog store.
pub struct TempCatalogDb {
    inner: CatalogDb,

    /// On drop, the cluster is shut down and deleted.
    _temp_db: PgTempDB,
}

impl TempCatalogDb {
    pub async fn new() -> Self {
        let builder = PgTempDBBuilder::new().persist_data(*KEEP_TEMP_DIRS);
        let temp_db = PgTempDB::from_builder(builder);

        let uri = temp_db.connection_uri();
        tracing::info!("connecting to temp catalog store at: {uri}");
        let inner = CatalogDb::connect(&uri)
            .await
            .expect("failed to connect to temp catalog store");

        TempCatalogDb {
            inner,
            _temp_db: temp_db,
        }
    }

    pub fn url(&self) -> &str {
        self.inner.url()
    }
}

impl std::ops::Deref for TempCatalogDb {
    type Target = CatalogDb;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
