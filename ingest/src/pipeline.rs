//! Phase-ordered driver for one table's load.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use catalog_db::{admin, copartition as store_copartition, meta, registry, schema_ops, CatalogDb};
use common::{
    chunk::{ChunkId, SubChunkId},
    config::{Config, ParentLink, TableConfig},
};
use fs_err as fs;

use crate::{
    copartition::{self, DependentRow, ParentAssignment},
    error::Error,
    export, fsutil,
    loader::{CmdLoader, Loader},
    manifest,
    partitioner::{Partitioner, SphPartition},
    schema::TableSchema,
    spec,
};

/// The phases of one table's load, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    PrepareSchema,
    Partition,
    Load,
    Discover,
    BuildMeta,
    ProvisionExport,
    WriteManifest,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::PrepareSchema => "prepare-schema",
            Phase::Partition => "partition",
            Phase::Load => "load",
            Phase::Discover => "discover",
            Phase::BuildMeta => "build-meta",
            Phase::ProvisionExport => "provision-export",
            Phase::WriteManifest => "write-manifest",
        };
        f.write_str(name)
    }
}

/// Caller-supplied hook consulted before each phase. Returning `false`
/// aborts the run. The core never blocks on an operator by itself; an
/// interactive prompt, if any, lives in the hook.
pub type PhaseGate = Arc<dyn Fn(Phase) -> bool + Send + Sync>;

/// What a completed load published.
#[derive(Debug)]
pub struct LoadOutcome {
    pub table: String,
    pub non_empty: Vec<ChunkId>,
    pub meta_rows: u64,
    pub manifest_path: PathBuf,
}

/// Drives the load of one catalog deployment, table by table.
///
/// Tables are processed strictly sequentially; a dependent table's load must
/// be started only after its parent's load completed, since enforcement
/// reads the parent's assignment back from the store.
pub struct Pipeline {
    db: CatalogDb,
    config: Arc<Config>,
    partitioner: Arc<dyn Partitioner>,
    loader: Arc<dyn Loader>,
    gate: Option<PhaseGate>,
}

impl Pipeline {
    pub fn new(db: CatalogDb, config: Arc<Config>) -> Self {
        let partitioner = Arc::new(SphPartition::new(
            config.partitioner_bin.clone(),
            config.delimiter.clone(),
        ));
        let loader = Arc::new(CmdLoader::new(
            config.loader_bin.clone(),
            config.store_endpoint.clone(),
        ));
        Self {
            db,
            config,
            partitioner,
            loader,
            gate: None,
        }
    }

    /// Substitute the partitioner implementation (used by tests).
    pub fn with_partitioner(mut self, partitioner: Arc<dyn Partitioner>) -> Self {
        self.partitioner = partitioner;
        self
    }

    /// Substitute the loader implementation (used by tests).
    pub fn with_loader(mut self, loader: Arc<dyn Loader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_phase_gate(mut self, gate: PhaseGate) -> Self {
        self.gate = Some(gate);
        self
    }

    fn gate(&self, phase: Phase) -> Result<(), Error> {
        if let Some(gate) = &self.gate {
            if !gate(phase) {
                return Err(Error::Aborted(phase));
            }
        }
        Ok(())
    }

    /// Drop and recreate the catalog and metadata schemas. This is the
    /// explicit reset that must precede any (re)load.
    pub async fn reset(&self) -> Result<(), Error> {
        admin::reset_catalog(self.db.pool(), &self.config.catalog).await?;
        admin::reset_meta(self.db.pool()).await?;
        Ok(())
    }

    /// Partition, load and publish one table.
    #[tracing::instrument(skip(self, schema_file, data_file), err)]
    pub async fn load_table(
        &self,
        table: &str,
        schema_file: &Path,
        data_file: &Path,
    ) -> Result<LoadOutcome, Error> {
        let table_config = self.config.table(table)?.clone();
        let catalog = self.config.catalog.as_str();

        self.gate(Phase::PrepareSchema)?;
        let ddl = fs::read_to_string(schema_file)?;
        let table_schema = TableSchema::parse(&ddl)?;
        if !table_schema.name.eq_ignore_ascii_case(table) {
            return Err(Error::Ddl(format!(
                "definition file declares table {}, expected {table}",
                table_schema.name
            )));
        }
        schema_ops::apply_ddl(self.db.pool(), catalog, &ddl).await?;
        schema_ops::align_partition_columns(self.db.pool(), catalog, table).await?;
        let partition_spec = spec::resolve(
            &table_config,
            &table_schema,
            self.config.stripes,
            self.config.sub_stripes,
        )?;

        self.gate(Phase::Partition)?;
        let partition_dir = self.config.staging_dir.join(format!("{table}_partition"));
        fsutil::recreate_dir(&partition_dir)?;
        self.partitioner
            .partition(table, &partition_spec, data_file, &partition_dir)
            .await?;

        self.gate(Phase::Load)?;
        self.loader.load(&partition_dir, catalog, table).await?;
        schema_ops::create_placeholder_chunk(self.db.pool(), catalog, table).await?;

        self.gate(Phase::Discover)?;
        let non_empty = registry::non_empty_chunks(self.db.pool(), catalog, table).await?;

        self.gate(Phase::BuildMeta)?;
        let meta_rows = match &table_config.parent {
            None => {
                meta::rebuild_from_chunks(
                    self.db.pool(),
                    catalog,
                    table,
                    &table_config.key_column,
                    &non_empty,
                )
                .await?
            }
            Some(link) => {
                self.build_dependent_meta(&table_config, link, &non_empty)
                    .await?
            }
        };

        self.gate(Phase::ProvisionExport)?;
        export::provision(&self.config.export_root, table, &non_empty)?;
        export::reset_result_dir(&self.config.export_root)?;

        self.gate(Phase::WriteManifest)?;
        let empty = manifest::empty_chunks(self.config.domain, &non_empty)?;
        manifest::write(&self.config.empty_chunks_path, &empty)?;

        tracing::info!(
            table,
            non_empty = non_empty.len(),
            meta_rows,
            "table loaded and published"
        );
        Ok(LoadOutcome {
            table: table.to_owned(),
            non_empty,
            meta_rows,
            manifest_path: self.config.empty_chunks_path.clone(),
        })
    }

    /// Build a dependent table's metadata from its parent's assignment.
    /// Runs strictly after the parent's load: the assignment is read back
    /// from the parent's chunk tables, never recomputed.
    async fn build_dependent_meta(
        &self,
        table_config: &TableConfig,
        link: &ParentLink,
        non_empty: &[ChunkId],
    ) -> Result<u64, Error> {
        let catalog = self.config.catalog.as_str();
        let parent_config = self.config.table(&link.table)?;

        let parent_chunks =
            registry::non_empty_chunks(self.db.pool(), catalog, &link.table).await?;
        if parent_chunks.is_empty() {
            return Err(Error::ParentNotLoaded {
                parent: link.table.clone(),
                table: table_config.name.clone(),
            });
        }

        let assignment: ParentAssignment = store_copartition::parent_assignment(
            self.db.pool(),
            catalog,
            &link.table,
            &parent_config.key_column,
            &parent_chunks,
        )
        .await?
        .into_iter()
        .map(|(key, chunk, sub_chunk)| (key, ChunkId::new(chunk), SubChunkId::new(sub_chunk)))
        .collect();

        let resident = store_copartition::dependent_rows(
            self.db.pool(),
            catalog,
            &table_config.name,
            &table_config.key_column,
            &link.key_column,
            non_empty,
        )
        .await?;
        let rows = resident
            .into_iter()
            .map(|(key, parent_key, resident_chunk)| DependentRow {
                key,
                parent_key,
                resident_chunk,
            });

        let meta_rows = copartition::enforce(&table_config.name, &assignment, rows)?;
        tracing::info!(
            table = %table_config.name,
            parent = %link.table,
            rows = meta_rows.len(),
            "chunk assignment inherited from parent"
        );
        meta::rebuild_from_rows(
            self.db.pool(),
            catalog,
            &table_config.name,
            &table_config.key_column,
            &meta_rows,
        )
        .await
        .map_err(Error::from)
    }
}
