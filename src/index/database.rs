//! Database operations for the index module

use crate::index::error::DbError;
use crate::index::schema;
use crate::index::{ChunkKind, IndexedChunk, IndexedRecord, NewChunk};
use crate::model::EmbeddingConversion;
use libsql::{Connection, Row, params};
use rig::embeddings::Embedding;
use tracing::{debug, info, instrument};

/// Handle to the libSQL event index
#[derive(Clone)]
pub struct Database {
    conn: Connection,
    dimensions: usize,
}

impl Database {
    /// Wrap an open connection, creating the schema if needed
    #[instrument(skip(conn))]
    pub async fn new(conn: Connection, dimensions: usize) -> Result<Self, DbError> {
        schema::initialize_schema(&conn, dimensions).await?;
        Ok(Self { conn, dimensions })
    }

    /// Open (or create) a local database file
    pub async fn new_from_path(path: &str, dimensions: usize) -> Result<Self, DbError> {
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DbError::Connection(format!("Failed to open database: {}", e)))?;

        let conn = db
            .connect()
            .map_err(|e| DbError::Connection(format!("Failed to connect to database: {}", e)))?;

        Self::new(conn, dimensions).await
    }

    /// Width of the embedding column
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Remove every record and chunk
    #[instrument(skip(self))]
    pub async fn reset(&self) -> Result<(), DbError> {
        let tx = self
            .conn
            .transaction()
            .await
            .map_err(|e| DbError::Transaction(format!("Failed to start transaction: {}", e)))?;

        tx.execute("DELETE FROM chunks", params![])
            .await
            .map_err(|e| DbError::Query(format!("Failed to clear chunks: {}", e)))?;
        tx.execute("DELETE FROM records", params![])
            .await
            .map_err(|e| DbError::Query(format!("Failed to clear records: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| DbError::Transaction(format!("Failed to commit transaction: {}", e)))?;

        info!("Index reset");
        Ok(())
    }

    /// Store a record and its chunks, replacing anything at the same location
    ///
    /// Returns the id of the stored record.
    #[instrument(skip(self, chunks), fields(chunks = chunks.len()))]
    pub async fn store_record(
        &self,
        location: &str,
        title: &str,
        source: &str,
        chunks: &[NewChunk],
    ) -> Result<i64, DbError> {
        for chunk in chunks {
            if chunk.embedding.vec.len() != self.dimensions {
                return Err(DbError::Data(format!(
                    "Embedding has {} dimensions, index expects {}",
                    chunk.embedding.vec.len(),
                    self.dimensions
                )));
            }
        }

        let tx = self
            .conn
            .transaction()
            .await
            .map_err(|e| DbError::Transaction(format!("Failed to start transaction: {}", e)))?;

        tx.execute("DELETE FROM chunks WHERE location = ?", params![location])
            .await
            .map_err(|e| DbError::Query(format!("Failed to delete chunks: {}", e)))?;
        tx.execute("DELETE FROM records WHERE location = ?", params![location])
            .await
            .map_err(|e| DbError::Query(format!("Failed to delete record: {}", e)))?;

        let now = chrono::Utc::now().timestamp();
        tx.execute(
            "INSERT INTO records (location, title, source, indexed_at) VALUES (?, ?, ?, ?)",
            params![location, title, source, now],
        )
        .await
        .map_err(|e| DbError::Query(format!("Failed to add record: {}", e)))?;

        let mut rows = tx
            .query("SELECT last_insert_rowid()", params![])
            .await
            .map_err(|e| DbError::Query(format!("Failed to get last insert ID: {}", e)))?;

        let record_id: i64 = match rows.next().await {
            Ok(Some(row)) => row
                .get(0)
                .map_err(|e| DbError::Data(format!("Failed to get ID: {}", e)))?,
            Ok(None) => {
                return Err(DbError::Data(
                    "No ID returned from last_insert_rowid()".to_string(),
                ));
            }
            Err(e) => return Err(DbError::Data(format!("Failed to get ID: {}", e))),
        };

        for chunk in chunks {
            tx.execute(
                "INSERT INTO chunks (record_id, location, kind, position, text, embedding)
                 VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    record_id,
                    location,
                    chunk.kind.as_str(),
                    chunk.position as i64,
                    chunk.text.as_str(),
                    libsql::Value::Blob(chunk.embedding.to_binary()),
                ],
            )
            .await
            .map_err(|e| DbError::Query(format!("Failed to add chunk: {}", e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::Transaction(format!("Failed to commit transaction: {}", e)))?;

        debug!("Stored {} chunks for {}", chunks.len(), location);
        Ok(record_id)
    }

    /// Every record in the index, ordered by title
    pub async fn list_records(&self) -> Result<Vec<IndexedRecord>, DbError> {
        let mut rows = self
            .conn
            .query(
                "SELECT r.id, r.location, r.title, r.source, r.indexed_at,
                        (SELECT COUNT(*) FROM chunks c WHERE c.record_id = r.id)
                 FROM records r
                 ORDER BY r.title, r.location",
                params![],
            )
            .await
            .map_err(|e| DbError::Query(format!("Failed to query records: {}", e)))?;

        let mut records = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            records.push(self.row_to_record(&row)?);
        }

        Ok(records)
    }

    /// Chunks stored for one record file, in position order per kind
    pub async fn chunks_for_location(&self, location: &str) -> Result<Vec<IndexedChunk>, DbError> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, record_id, location, kind, position, text, embedding
                 FROM chunks WHERE location = ?
                 ORDER BY kind, position",
                params![location],
            )
            .await
            .map_err(|e| DbError::Query(format!("Failed to query chunks: {}", e)))?;

        let mut chunks = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            chunks.push(self.row_to_chunk(&row)?);
        }

        Ok(chunks)
    }

    /// Total number of chunks in the index
    pub async fn count_chunks(&self) -> Result<i64, DbError> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM chunks", params![])
            .await
            .map_err(|e| DbError::Query(format!("Failed to count chunks: {}", e)))?;

        match rows.next().await {
            Ok(Some(row)) => row
                .get(0)
                .map_err(|e| DbError::Data(format!("Failed to get count: {}", e))),
            Ok(None) => Ok(0),
            Err(e) => Err(DbError::Data(format!("Failed to count chunks: {}", e))),
        }
    }

    fn row_to_record(&self, row: &Row) -> Result<IndexedRecord, DbError> {
        Ok(IndexedRecord {
            id: row
                .get(0)
                .map_err(|e| DbError::Data(format!("Failed to get id: {}", e)))?,
            location: row
                .get(1)
                .map_err(|e| DbError::Data(format!("Failed to get location: {}", e)))?,
            title: row
                .get(2)
                .map_err(|e| DbError::Data(format!("Failed to get title: {}", e)))?,
            source: row
                .get(3)
                .map_err(|e| DbError::Data(format!("Failed to get source: {}", e)))?,
            indexed_at: row
                .get(4)
                .map_err(|e| DbError::Data(format!("Failed to get indexed_at: {}", e)))?,
            chunk_count: row
                .get(5)
                .map_err(|e| DbError::Data(format!("Failed to get chunk count: {}", e)))?,
        })
    }

    fn row_to_chunk(&self, row: &Row) -> Result<IndexedChunk, DbError> {
        let embedding_blob: Vec<u8> = row
            .get(6)
            .map_err(|e| DbError::Data(format!("Failed to get embedding: {}", e)))?;
        let embedding: Embedding = EmbeddingConversion::from_binary(&embedding_blob);

        let kind: String = row
            .get(3)
            .map_err(|e| DbError::Data(format!("Failed to get kind: {}", e)))?;

        Ok(IndexedChunk {
            id: row
                .get(0)
                .map_err(|e| DbError::Data(format!("Failed to get id: {}", e)))?,
            record_id: row
                .get(1)
                .map_err(|e| DbError::Data(format!("Failed to get record_id: {}", e)))?,
            location: row
                .get(2)
                .map_err(|e| DbError::Data(format!("Failed to get location: {}", e)))?,
            kind: kind.parse()?,
            position: row
                .get(4)
                .map_err(|e| DbError::Data(format!("Failed to get position: {}", e)))?,
            text: row
                .get(5)
                .map_err(|e| DbError::Data(format!("Failed to get text: {}", e)))?,
            embedding,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const DIMS: usize = 4;

    async fn setup_test_db() -> Result<(Database, tempfile::TempDir), DbError> {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();

        let db = Database::new_from_path(&db_path, DIMS).await?;
        Ok((db, temp_dir))
    }

    fn chunk(kind: ChunkKind, position: usize, text: &str, seed: f32) -> NewChunk {
        NewChunk {
            kind,
            position,
            text: text.to_string(),
            embedding: Embedding::from_vec(vec![seed, seed + 1.0, seed + 2.0, seed + 3.0]),
        }
    }

    #[tokio::test]
    async fn test_database_initialization() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();

        let mut result = db
            .conn
            .query(
                "SELECT name FROM sqlite_master WHERE type='table' AND name IN ('records', 'chunks')",
                params![],
            )
            .await
            .unwrap();

        let mut tables = Vec::new();
        while let Ok(Some(row)) = result.next().await {
            let table_name: String = row.get(0).unwrap();
            tables.push(table_name);
        }

        assert_eq!(tables.len(), 2);
        assert_eq!(db.dimensions(), DIMS);
    }

    #[tokio::test]
    async fn test_store_and_read_back() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();

        let chunks = vec![
            chunk(ChunkKind::Description, 0, "first window", 0.0),
            chunk(ChunkKind::Description, 1, "second window", 1.0),
            chunk(ChunkKind::Fields, 2, r#"{"title":"RustConf"}"#, 2.0),
        ];
        let id = db
            .store_record("out/RustConf.json", "RustConf", "https://crossweb.pl/e/1", &chunks)
            .await
            .unwrap();
        assert!(id > 0);

        let records = db.list_records().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "RustConf");
        assert_eq!(records[0].chunk_count, 3);

        let stored = db.chunks_for_location("out/RustConf.json").await.unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[0].kind, ChunkKind::Description);
        assert_eq!(stored[0].text, "first window");
        assert_eq!(stored[2].kind, ChunkKind::Fields);
        assert_eq!(stored[2].embedding.to_vec(), vec![2.0, 3.0, 4.0, 5.0]);
        assert!(stored.iter().all(|c| c.record_id == id));
    }

    #[tokio::test]
    async fn test_store_replaces_same_location() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();

        db.store_record("out/a.json", "A", "https://x/1", &[chunk(ChunkKind::Fields, 0, "a", 0.0)])
            .await
            .unwrap();
        db.store_record(
            "out/a.json",
            "A v2",
            "https://x/1",
            &[
                chunk(ChunkKind::Description, 0, "b", 0.0),
                chunk(ChunkKind::Fields, 1, "c", 0.0),
            ],
        )
        .await
        .unwrap();

        let records = db.list_records().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "A v2");
        assert_eq!(db.count_chunks().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_wrong_dimensions_rejected() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let bad = NewChunk {
            kind: ChunkKind::Fields,
            position: 0,
            text: "x".to_string(),
            embedding: Embedding::from_vec(vec![1.0, 2.0]),
        };

        let result = db.store_record("out/x.json", "X", "https://x", &[bad]).await;
        assert!(matches!(result, Err(DbError::Data(_))));
        assert_eq!(db.count_chunks().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reset() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        db.store_record("out/a.json", "A", "https://x/1", &[chunk(ChunkKind::Fields, 0, "a", 0.0)])
            .await
            .unwrap();

        db.reset().await.unwrap();

        assert!(db.list_records().await.unwrap().is_empty());
        assert_eq!(db.count_chunks().await.unwrap(), 0);
    }
}
