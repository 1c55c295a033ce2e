//! # Index Schema
//!
//! Two tables back the event index:
//! 1. `records` - one row per saved event file, unique by file location
//! 2. `chunks` - embedded text segments of a record, tagged with the same
//!    location so lookups never need a join
//!
//! The embedding column width is fixed when the schema is created and must
//! match the embedding model in use.

use crate::index::error::DbError;
use libsql::{Connection, params};
use tracing::warn;

/// Create tables and indexes if they do not exist
pub async fn initialize_schema(conn: &Connection, dimensions: usize) -> Result<(), DbError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            location TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            source TEXT NOT NULL,
            indexed_at INTEGER NOT NULL
        )",
        params![],
    )
    .await
    .map_err(|e| DbError::Schema(format!("Failed to create records table: {}", e)))?;

    conn.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS chunks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                record_id INTEGER NOT NULL,
                location TEXT NOT NULL,
                kind TEXT NOT NULL,
                position INTEGER NOT NULL,
                text TEXT NOT NULL,
                embedding F32_BLOB({}) NOT NULL,
                FOREIGN KEY (record_id) REFERENCES records(id) ON DELETE CASCADE
            )",
            dimensions
        ),
        params![],
    )
    .await
    .map_err(|e| DbError::Schema(format!("Failed to create chunks table: {}", e)))?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_chunks_location ON chunks(location)",
        params![],
    )
    .await
    .map_err(|e| DbError::Schema(format!("Failed to create index on chunks: {}", e)))?;

    // Only available when libSQL is built with vector support
    let vector_index_result = conn
        .execute(
            "CREATE INDEX IF NOT EXISTS chunks_embedding_idx ON chunks (libsql_vector_idx(embedding))",
            params![],
        )
        .await;

    if let Err(e) = vector_index_result {
        warn!(
            "Failed to create vector index: {}. Similarity lookups will fall back to a full scan.",
            e
        );
    }

    Ok(())
}
