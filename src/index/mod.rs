//! Vector index for harvested events
//!
//! Stores every saved record with its embedded chunks in libSQL, keyed by the
//! location of the record's JSON file.

mod database;
pub mod error;
mod schema;

pub use database::Database;
pub use error::DbError;

use rig::embeddings::Embedding;
use std::fmt;
use std::str::FromStr;

/// What part of a record a chunk was cut from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    /// A window of the free-text description
    Description,
    /// The serialized title, fields and source
    Fields,
}

impl ChunkKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChunkKind::Description => "description",
            ChunkKind::Fields => "fields",
        }
    }
}

impl fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChunkKind {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "description" => Ok(ChunkKind::Description),
            "fields" => Ok(ChunkKind::Fields),
            other => Err(DbError::Data(format!("Unknown chunk kind: {}", other))),
        }
    }
}

/// A record as stored in the index
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedRecord {
    pub id: i64,

    /// Path of the record's JSON file
    pub location: String,

    pub title: String,

    /// URL the record was harvested from
    pub source: String,

    /// Unix timestamp of indexing
    pub indexed_at: i64,

    pub chunk_count: i64,
}

/// A chunk to be written alongside its record
#[derive(Debug, Clone)]
pub struct NewChunk {
    pub kind: ChunkKind,
    pub position: usize,
    pub text: String,
    pub embedding: Embedding,
}

/// A chunk as stored in the index
#[derive(Debug, Clone)]
pub struct IndexedChunk {
    pub id: i64,
    pub record_id: i64,
    pub location: String,
    pub kind: ChunkKind,
    pub position: i64,
    pub text: String,
    pub embedding: Embedding,
}
