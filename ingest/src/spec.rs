//! Resolution of a table's partitioning wiring to concrete column indices.

use common::config::TableConfig;

use crate::{error::Error, schema::TableSchema};

/// Everything the external partitioner needs for one table.
///
/// Column values are zero-based indices into the table's ordered column
/// list. `chunk_column` is present only when the input data already carries
/// a chunk assignment; a dependent table never has one — it inherits its
/// parent's assignment instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionSpec {
    pub stripes: u32,
    pub sub_stripes: u32,
    pub lon_column: usize,
    pub lat_column: usize,
    pub chunk_column: Option<usize>,
}

/// Resolve the configured column names of `table` against its definition.
pub fn resolve(
    table: &TableConfig,
    schema: &TableSchema,
    stripes: u32,
    sub_stripes: u32,
) -> Result<PartitionSpec, Error> {
    let index_of = |column: &str| {
        schema
            .column_index(column)
            .ok_or_else(|| Error::MissingColumn {
                table: table.name.clone(),
                column: column.to_owned(),
            })
    };

    // The key column is not handed to the partitioner, but a missing one
    // would only surface much later, in the metadata build.
    index_of(&table.key_column)?;
    if let Some(parent) = &table.parent {
        index_of(&parent.key_column)?;
    }

    let chunk_column = table
        .chunk_column
        .as_deref()
        .map(index_of)
        .transpose()?;

    Ok(PartitionSpec {
        stripes,
        sub_stripes,
        lon_column: index_of(&table.lon_column)?,
        lat_column: index_of(&table.lat_column)?,
        chunk_column,
    })
}
