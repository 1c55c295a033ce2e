//! # Record Sink Module
//!
//! Persists each harvested record as one pretty-printed JSON file named after
//! its title, then hands the record to an [`Ingester`].
//!
//! Records without a title are never written. Indexing failures are logged
//! and reported in the [`SaveOutcome`] but never fail the save itself.

mod error;

pub use error::SinkError;

use crate::ingest::Ingester;
use crate::record::EventRecord;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info, instrument};

/// Characters that may not appear in a record file name
const RESERVED: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Longest file stem produced by [`sanitize_title`], in bytes
const MAX_STEM_BYTES: usize = 200;

/// What happened to a record handed to the sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The record had no title and was dropped
    Skipped,

    /// The record was written to `path`; `indexed` is false if ingestion failed
    Saved { path: PathBuf, indexed: bool },
}

/// Derive a file stem from an event title
///
/// Whitespace and reserved characters become `_`, control characters are
/// removed, and very long titles are cut at a character boundary.
pub fn sanitize_title(title: &str) -> String {
    let mut stem = String::with_capacity(title.len());
    for c in title.chars() {
        let mapped = if c.is_whitespace() || RESERVED.contains(&c) {
            '_'
        } else if c.is_control() {
            continue;
        } else {
            c
        };
        if stem.len() + mapped.len_utf8() > MAX_STEM_BYTES {
            break;
        }
        stem.push(mapped);
    }
    stem
}

/// Remove `dir` if present and create it empty
pub async fn prepare_output_dir(dir: &Path) -> Result<(), SinkError> {
    if fs::try_exists(dir).await? {
        info!("Removing existing output directory {}", dir.display());
        fs::remove_dir_all(dir).await?;
    }
    fs::create_dir_all(dir).await?;
    Ok(())
}

/// Serialize a record with four-space indentation, keeping non-ASCII as is
pub fn to_pretty_json(record: &EventRecord) -> Result<Vec<u8>, SinkError> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
    record.serialize(&mut serializer)?;
    Ok(buffer)
}

/// Writes records as JSON files and forwards them to an ingester
#[derive(Debug)]
pub struct JsonFileSink<I: Ingester> {
    output_dir: PathBuf,
    ingester: I,
}

impl<I: Ingester> JsonFileSink<I> {
    pub fn new(output_dir: impl Into<PathBuf>, ingester: I) -> Self {
        Self {
            output_dir: output_dir.into(),
            ingester,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn ingester(&self) -> &I {
        &self.ingester
    }

    /// Path a record with `title` is written to
    pub fn path_for(&self, title: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}.json", sanitize_title(title)))
    }

    /// Persist one record and hand it to the ingester
    #[instrument(skip(self, record), fields(source = %record.source))]
    pub async fn save(&self, record: &EventRecord) -> Result<SaveOutcome, SinkError> {
        if !record.has_title() {
            info!("Skipping record without title from {}", record.source);
            return Ok(SaveOutcome::Skipped);
        }

        let path = self.path_for(&record.title);
        fs::write(&path, to_pretty_json(record)?).await?;
        debug!("Saved event '{}' to {}", record.title, path.display());

        let location = path.to_string_lossy();
        let indexed = match self
            .ingester
            .ingest(&record.main_information(), &record.description, &location)
            .await
        {
            Ok(chunks) => {
                debug!("Indexed '{}' as {} chunks", record.title, chunks);
                true
            }
            Err(e) => {
                error!("Failed to index '{}' ({}): {}", record.title, location, e);
                false
            }
        };

        Ok(SaveOutcome::Saved { path, indexed })
    }
}
