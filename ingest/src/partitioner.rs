//! Invocation of the external spatial partitioner.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;

use crate::{error::Error, spec::PartitionSpec, subprocess};

/// Capability of partitioning an input file into per-chunk files.
///
/// Tests substitute deterministic fakes; production uses [`SphPartition`].
#[async_trait]
pub trait Partitioner: Send + Sync {
    /// Partition `input` into per-chunk files named `{table}_<chunk>` under
    /// `out_dir`. The caller guarantees `out_dir` exists and is empty.
    async fn partition(
        &self,
        table: &str,
        spec: &PartitionSpec,
        input: &Path,
        out_dir: &Path,
    ) -> Result<(), Error>;
}

/// The external spherical partitioner binary.
#[derive(Debug, Clone)]
pub struct SphPartition {
    bin: PathBuf,
    delimiter: String,
}

impl SphPartition {
    pub fn new(bin: PathBuf, delimiter: String) -> Self {
        Self { bin, delimiter }
    }
}

#[async_trait]
impl Partitioner for SphPartition {
    #[tracing::instrument(skip(self, spec), err)]
    async fn partition(
        &self,
        table: &str,
        spec: &PartitionSpec,
        input: &Path,
        out_dir: &Path,
    ) -> Result<(), Error> {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("--output-dir")
            .arg(out_dir)
            .arg("--chunk-prefix")
            .arg(table)
            .arg("--theta-column")
            .arg(spec.lon_column.to_string())
            .arg("--phi-column")
            .arg(spec.lat_column.to_string())
            .arg("--num-stripes")
            .arg(spec.stripes.to_string())
            .arg("--num-sub-stripes")
            .arg(spec.sub_stripes.to_string())
            .arg("--delimiter")
            .arg(&self.delimiter);
        if let Some(chunk_column) = spec.chunk_column {
            cmd.arg("--chunk-column").arg(chunk_column.to_string());
        }
        cmd.arg(input);

        subprocess::run_checked("partitioner", &mut cmd).await?;
        tracing::info!(table, out_dir = %out_dir.display(), "input partitioned");
        Ok(())
    }
}
