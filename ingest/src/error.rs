use common::chunk::ChunkId;

use crate::pipeline::Phase;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] common::config::ConfigError),

    #[error("table {table}: column {column:?} not found in the table definition")]
    MissingColumn { table: String, column: String },

    #[error("invalid table definition: {0}")]
    Ddl(String),

    #[error("{tool} {}: {stderr}", exit_label(.code))]
    Subprocess {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error(transparent)]
    Db(#[from] catalog_db::Error),

    #[error("chunk {chunk} lies outside the configured domain of {total_chunks} chunks")]
    ChunkOutOfDomain { chunk: ChunkId, total_chunks: u32 },

    #[error("table {table}: row {key} references parent key {parent_key} which is not loaded")]
    DanglingParent {
        table: String,
        key: i64,
        parent_key: i64,
    },

    #[error(
        "table {table}: row {key} is resident in chunk {resident} but its parent \
         {parent_key} is assigned chunk {expected}"
    )]
    MisplacedRow {
        table: String,
        key: i64,
        parent_key: i64,
        resident: ChunkId,
        expected: ChunkId,
    },

    #[error("parent table {parent} has no loaded chunks, load it before {table}")]
    ParentNotLoaded { parent: String, table: String },

    #[error("run aborted before the {0} phase")]
    Aborted(Phase),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with code {code}"),
        None => "was terminated by a signal".to_owned(),
    }
}

/// Coarse classification of pipeline failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Subprocess,
    Sql,
    StateInconsistency,
    Io,
    Aborted,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) | Error::MissingColumn { .. } | Error::Ddl(_) => {
                ErrorKind::Configuration
            }
            Error::Subprocess { .. } => ErrorKind::Subprocess,
            Error::Db(catalog_db::Error::DuplicateLoad(_)) => ErrorKind::StateInconsistency,
            Error::Db(_) => ErrorKind::Sql,
            Error::ChunkOutOfDomain { .. }
            | Error::DanglingParent { .. }
            | Error::MisplacedRow { .. }
            | Error::ParentNotLoaded { .. } => ErrorKind::StateInconsistency,
            Error::Aborted(_) => ErrorKind::Aborted,
            Error::Io(_) => ErrorKind::Io,
        }
    }
}
