//! Store-layer tests against a throwaway Postgres cluster.
//!
//! Run with `cargo test -p catalog-db --features temp-db`; requires local
//! PostgreSQL binaries.

#![cfg(feature = "temp-db")]

use catalog_db::{admin, copartition, meta, registry, schema_ops, Error, TempCatalogDb};
use common::chunk::{ChunkId, MetaRow, SubChunkId};

const CATALOG: &str = "sky_test";

const STAR_DDL: &str = "CREATE TABLE star (
    star_id BIGINT NOT NULL,
    ra DOUBLE PRECISION NOT NULL,
    decl DOUBLE PRECISION NOT NULL,
    _chunk_id INT,
    _sub_chunk_id INT
)";

const DETECTION_DDL: &str = "CREATE TABLE detection (
    detection_id BIGINT NOT NULL,
    star_id BIGINT NOT NULL,
    ra_star DOUBLE PRECISION NOT NULL,
    decl_star DOUBLE PRECISION NOT NULL
)";

async fn fresh_store() -> TempCatalogDb {
    let db = TempCatalogDb::new().await;
    admin::reset_catalog(db.pool(), CATALOG)
        .await
        .expect("failed to reset catalog schema");
    admin::reset_meta(db.pool())
        .await
        .expect("failed to reset meta schema");
    db
}

async fn create_base_table(db: &TempCatalogDb, ddl: &str, table: &str) {
    schema_ops::apply_ddl(db.pool(), CATALOG, ddl)
        .await
        .expect("failed to apply ddl");
    schema_ops::align_partition_columns(db.pool(), CATALOG, table)
        .await
        .expect("failed to align partition columns");
}

/// Create a chunk table of `star` and fill it with `(star_id, sub_chunk)` rows.
async fn load_star_chunk(db: &TempCatalogDb, chunk: i32, rows: &[(i64, i32)]) {
    let chunk = ChunkId::new(chunk);
    schema_ops::create_chunk_table(db.pool(), CATALOG, "star", chunk)
        .await
        .expect("failed to create chunk table");
    for (star_id, sub_chunk) in rows {
        sqlx::query(&format!(
            "INSERT INTO {CATALOG}.star_{chunk} (star_id, ra, decl, chunk_id, sub_chunk_id) \
             VALUES ($1, 10.5, -3.25, $2, $3)"
        ))
        .bind(star_id)
        .bind(chunk.get())
        .bind(sub_chunk)
        .execute(db.pool())
        .await
        .expect("failed to insert star row");
    }
}

async fn load_detection_chunk(db: &TempCatalogDb, chunk: i32, rows: &[(i64, i64, i32)]) {
    let chunk = ChunkId::new(chunk);
    schema_ops::create_chunk_table(db.pool(), CATALOG, "detection", chunk)
        .await
        .expect("failed to create chunk table");
    for (detection_id, star_id, sub_chunk) in rows {
        sqlx::query(&format!(
            "INSERT INTO {CATALOG}.detection_{chunk} \
             (detection_id, star_id, ra_star, decl_star, chunk_id, sub_chunk_id) \
             VALUES ($1, $2, 10.5, -3.25, $3, $4)"
        ))
        .bind(detection_id)
        .bind(star_id)
        .bind(chunk.get())
        .bind(sub_chunk)
        .execute(db.pool())
        .await
        .expect("failed to insert detection row");
    }
}

#[tokio::test]
async fn registry_reports_only_populated_chunks_in_order() {
    //* Given
    let db = fresh_store().await;
    create_base_table(&db, STAR_DDL, "star").await;
    load_star_chunk(&db, 7, &[(1, 0)]).await;
    load_star_chunk(&db, 2, &[(2, 0), (3, 1)]).await;
    load_star_chunk(&db, 5, &[(4, 0)]).await;
    // An empty chunk table and the placeholder must not count.
    load_star_chunk(&db, 3, &[]).await;
    schema_ops::create_placeholder_chunk(db.pool(), CATALOG, "star")
        .await
        .expect("failed to create placeholder chunk");

    //* When
    let chunks = registry::non_empty_chunks(db.pool(), CATALOG, "star")
        .await
        .expect("discovery failed");

    //* Then
    let ids: Vec<i32> = chunks.iter().map(|c| c.get()).collect();
    assert_eq!(ids, vec![2, 5, 7]);
}

#[tokio::test]
async fn registry_is_empty_before_any_load() {
    //* Given
    let db = fresh_store().await;
    create_base_table(&db, STAR_DDL, "star").await;

    //* When
    let chunks = registry::non_empty_chunks(db.pool(), CATALOG, "star")
        .await
        .expect("discovery failed");

    //* Then
    assert!(chunks.is_empty());
}

#[tokio::test]
async fn second_load_without_reset_is_a_duplicate() {
    //* Given
    let db = fresh_store().await;
    create_base_table(&db, STAR_DDL, "star").await;
    load_star_chunk(&db, 4, &[(1, 0)]).await;

    //* When
    let err = schema_ops::create_chunk_table(db.pool(), CATALOG, "star", ChunkId::new(4))
        .await
        .expect_err("recreating a chunk table must fail");

    //* Then
    assert!(matches!(err, Error::DuplicateLoad(_)), "got {err:?}");
}

#[tokio::test]
async fn align_partition_columns_replaces_staging_columns() {
    //* Given
    let db = fresh_store().await;
    schema_ops::apply_ddl(db.pool(), CATALOG, STAR_DDL)
        .await
        .expect("failed to apply ddl");

    //* When
    schema_ops::align_partition_columns(db.pool(), CATALOG, "star")
        .await
        .expect("failed to align partition columns");

    //* Then
    let columns: Vec<String> = sqlx::query_scalar(
        "SELECT column_name FROM information_schema.columns \
         WHERE table_schema = $1 AND table_name = 'star' ORDER BY column_name",
    )
    .bind(CATALOG)
    .fetch_all(db.pool())
    .await
    .expect("failed to query columns");
    assert!(columns.contains(&"chunk_id".to_owned()));
    assert!(columns.contains(&"sub_chunk_id".to_owned()));
    assert!(!columns.contains(&"_chunk_id".to_owned()));
    assert!(!columns.contains(&"_sub_chunk_id".to_owned()));

    // Aligning an already aligned table is a no-op.
    schema_ops::align_partition_columns(db.pool(), CATALOG, "star")
        .await
        .expect("re-aligning must not fail");
}

#[tokio::test]
async fn meta_rebuild_scans_every_discovered_chunk() {
    //* Given
    let db = fresh_store().await;
    create_base_table(&db, STAR_DDL, "star").await;
    load_star_chunk(&db, 2, &[(10, 0), (11, 1)]).await;
    load_star_chunk(&db, 9, &[(12, 0)]).await;
    let chunks = vec![ChunkId::new(2), ChunkId::new(9)];

    //* When
    let rows = meta::rebuild_from_chunks(db.pool(), CATALOG, "star", "star_id", &chunks)
        .await
        .expect("meta rebuild failed");

    //* Then
    assert_eq!(rows, 3);
    let recorded: Vec<(i64, i32, i32)> = sqlx::query_as(
        "SELECT star_id, chunk_id, sub_chunk_id FROM shard_meta.sky_test__star ORDER BY star_id",
    )
    .fetch_all(db.pool())
    .await
    .expect("failed to read meta table");
    assert_eq!(recorded, vec![(10, 2, 0), (11, 2, 1), (12, 9, 0)]);
}

#[tokio::test]
async fn meta_rebuild_replaces_a_stale_table() {
    //* Given
    let db = fresh_store().await;
    create_base_table(&db, STAR_DDL, "star").await;
    load_star_chunk(&db, 2, &[(10, 0)]).await;
    let chunks = vec![ChunkId::new(2)];
    meta::rebuild_from_chunks(db.pool(), CATALOG, "star", "star_id", &chunks)
        .await
        .expect("first rebuild failed");

    //* When: a second build must replace, not append.
    let rows = meta::rebuild_from_chunks(db.pool(), CATALOG, "star", "star_id", &chunks)
        .await
        .expect("second rebuild failed");

    //* Then
    assert_eq!(rows, 1);
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shard_meta.sky_test__star")
        .fetch_one(db.pool())
        .await
        .expect("failed to count meta rows");
    assert_eq!(count, 1);
}

#[tokio::test]
async fn meta_rebuild_from_rows_records_enforced_assignment() {
    //* Given
    let db = fresh_store().await;
    let rows = vec![
        MetaRow {
            key: 100,
            chunk: ChunkId::new(3),
            sub_chunk: SubChunkId::new(1),
        },
        MetaRow {
            key: 101,
            chunk: ChunkId::new(3),
            sub_chunk: SubChunkId::new(2),
        },
    ];

    //* When
    let written = meta::rebuild_from_rows(db.pool(), CATALOG, "detection", "detection_id", &rows)
        .await
        .expect("meta rebuild failed");

    //* Then
    assert_eq!(written, 2);
    let recorded: Vec<(i64, i32, i32)> = sqlx::query_as(
        "SELECT detection_id, chunk_id, sub_chunk_id FROM shard_meta.sky_test__detection \
         ORDER BY detection_id",
    )
    .fetch_all(db.pool())
    .await
    .expect("failed to read meta table");
    assert_eq!(recorded, vec![(100, 3, 1), (101, 3, 2)]);
}

#[tokio::test]
async fn copartition_queries_expose_assignment_and_residency() {
    //* Given
    let db = fresh_store().await;
    create_base_table(&db, STAR_DDL, "star").await;
    create_base_table(&db, DETECTION_DDL, "detection").await;
    load_star_chunk(&db, 3, &[(1, 7)]).await;
    load_star_chunk(&db, 9, &[(2, 0)]).await;
    load_detection_chunk(&db, 3, &[(100, 1, 7), (101, 1, 7)]).await;

    //* When
    let star_chunks = vec![ChunkId::new(3), ChunkId::new(9)];
    let assignment =
        copartition::parent_assignment(db.pool(), CATALOG, "star", "star_id", &star_chunks)
            .await
            .expect("parent assignment query failed");
    let resident = copartition::dependent_rows(
        db.pool(),
        CATALOG,
        "detection",
        "detection_id",
        "star_id",
        &[ChunkId::new(3)],
    )
    .await
    .expect("dependent rows query failed");

    //* Then
    let mut assignment = assignment;
    assignment.sort();
    assert_eq!(assignment, vec![(1, 3, 7), (2, 9, 0)]);
    assert_eq!(
        resident,
        vec![(100, 1, ChunkId::new(3)), (101, 1, ChunkId::new(3))]
    );
}

#[tokio::test]
async fn reset_clears_all_chunk_tables() {
    //* Given
    let db = fresh_store().await;
    create_base_table(&db, STAR_DDL, "star").await;
    load_star_chunk(&db, 5, &[(1, 0)]).await;

    //* When
    admin::reset_catalog(db.pool(), CATALOG)
        .await
        .expect("failed to reset catalog");
    create_base_table(&db, STAR_DDL, "star").await;

    //* Then
    let chunks = registry::non_empty_chunks(db.pool(), CATALOG, "star")
        .await
        .expect("discovery failed");
    assert!(chunks.is_empty());
    // And the placeholder can be created again without a duplicate error.
    schema_ops::create_placeholder_chunk(db.pool(), CATALOG, "star")
        .await
        .expect("placeholder creation after reset must succeed");
}
