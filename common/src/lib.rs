pub mod chunk;
pub mod config;
pub mod logging;

pub use self::{
    chunk::{ChunkDomain, ChunkId, MetaRow, SubChunkId, PLACEHOLDER_CHUNK_ID},
    config::{Config, ConfigError, StoreEndpoint, TableConfig},
};
