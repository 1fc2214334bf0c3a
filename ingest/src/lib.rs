//! Pipeline core for preparing a spatially sharded catalog.
//!
//! One table's load is a fixed sequence of phases: prepare the schema,
//! partition the input through the external partitioner, load the chunk
//! files through the external loader, discover which chunks received data,
//! enforce parent/dependent co-location, rebuild the global metadata table,
//! provision the export marker tree and write the empty-chunk manifest.
//! Every phase failure aborts the run; the corrective action is an explicit
//! reset followed by a retry, never an automatic rollback.

pub mod copartition;
mod error;
pub mod export;
mod fsutil;
pub mod loader;
pub mod manifest;
pub mod partitioner;
pub mod pipeline;
pub mod schema;
pub mod spec;
mod subprocess;

pub use self::{
    error::{Error, ErrorKind},
    pipeline::{LoadOutcome, Phase, PhaseGate, Pipeline},
};
