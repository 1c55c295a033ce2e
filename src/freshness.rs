//! # Freshness Gate
//!
//! Decides whether a harvest is due from a timestamp file written after the
//! last completed run. The stamp is one line in `%d-%m-%Y %H:%M` local time.

use chrono::{DateTime, Local, NaiveDateTime, TimeDelta};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Format of the stamp file
pub const STAMP_FORMAT: &str = "%d-%m-%Y %H:%M";

/// Runs older than this are stale by default
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(12 * 60 * 60);

#[derive(Debug, Clone)]
pub struct FreshnessGate {
    stamp_path: PathBuf,
    stale_after: Duration,
}

impl FreshnessGate {
    pub fn new(stamp_path: impl Into<PathBuf>) -> Self {
        Self {
            stamp_path: stamp_path.into(),
            stale_after: DEFAULT_STALE_AFTER,
        }
    }

    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    pub fn stamp_path(&self) -> &Path {
        &self.stamp_path
    }

    pub fn stale_after(&self) -> Duration {
        self.stale_after
    }

    /// Time of the last completed run, if one was recorded
    pub async fn last_run(&self) -> Option<DateTime<Local>> {
        let contents = match tokio::fs::read_to_string(&self.stamp_path).await {
            Ok(contents) => contents,
            Err(e) => {
                debug!("No stamp at {}: {}", self.stamp_path.display(), e);
                return None;
            }
        };

        let parsed = NaiveDateTime::parse_from_str(contents.trim(), STAMP_FORMAT)
            .ok()
            .and_then(|naive| naive.and_local_timezone(Local).earliest());
        if parsed.is_none() {
            warn!(
                "Ignoring unparseable stamp {:?} in {}",
                contents.trim(),
                self.stamp_path.display()
            );
        }
        parsed
    }

    /// True when no run was recorded or the last one is older than `stale_after`
    pub async fn is_due(&self, now: DateTime<Local>) -> bool {
        let Some(last) = self.last_run().await else {
            return true;
        };
        let stale_after = TimeDelta::from_std(self.stale_after).unwrap_or(TimeDelta::MAX);
        now.signed_duration_since(last) > stale_after
    }

    /// Record `now` as the last completed run
    pub async fn mark_completed(&self, now: DateTime<Local>) -> std::io::Result<()> {
        if let Some(parent) = self.stamp_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.stamp_path, now.format(STAMP_FORMAT).to_string()).await
    }
}
