//! Invocation of the external chunk loader.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use common::config::StoreEndpoint;
use tokio::process::Command;

use crate::{error::Error, subprocess};

/// Capability of loading a directory of per-chunk files into the store.
#[async_trait]
pub trait Loader: Send + Sync {
    /// Load the partitioner output under `partition_dir` into per-chunk
    /// tables of `{catalog}.{table}`.
    async fn load(&self, partition_dir: &Path, catalog: &str, table: &str) -> Result<(), Error>;
}

/// The external loader binary.
#[derive(Debug, Clone)]
pub struct CmdLoader {
    bin: PathBuf,
    endpoint: StoreEndpoint,
}

impl CmdLoader {
    pub fn new(bin: PathBuf, endpoint: StoreEndpoint) -> Self {
        Self { bin, endpoint }
    }
}

#[async_trait]
impl Loader for CmdLoader {
    #[tracing::instrument(skip(self), err)]
    async fn load(&self, partition_dir: &Path, catalog: &str, table: &str) -> Result<(), Error> {
        let endpoint = &self.endpoint;
        let mut cmd = Command::new(&self.bin);
        cmd.arg(format!("--user={}", endpoint.user))
            .arg(format!("--password={}", endpoint.password))
            .arg(format!("--database={}", endpoint.database))
            .arg(format!("{}:{}", endpoint.host, endpoint.port))
            .arg(partition_dir)
            .arg(format!("{catalog}.{table}"));

        subprocess::run_checked("loader", &mut cmd).await?;
        tracing::info!(table, "partitioned data loaded");
        Ok(())
    }
}
