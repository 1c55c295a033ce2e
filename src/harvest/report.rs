//! Counts and timing of one harvest run

use crate::adapter::SourceKind;
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

/// Outcome of one listing URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub listing_url: String,
    pub kind: SourceKind,

    /// Detail URLs found by discovery
    pub discovered: usize,

    /// Detail URLs already claimed earlier in the run
    pub duplicates: usize,

    /// Records written to the output directory
    pub written: usize,

    /// Records dropped for lack of a title
    pub skipped: usize,

    /// Detail pages that could not be fetched, parsed or saved
    pub failures: usize,

    /// Set when discovery itself failed
    pub error: Option<String>,
}

impl SourceReport {
    pub fn new(listing_url: impl Into<String>, kind: SourceKind) -> Self {
        Self {
            listing_url: listing_url.into(),
            kind,
            discovered: 0,
            duplicates: 0,
            written: 0,
            skipped: 0,
            failures: 0,
            error: None,
        }
    }

    pub fn failed(listing_url: impl Into<String>, kind: SourceKind, error: impl fmt::Display) -> Self {
        let mut report = Self::new(listing_url, kind);
        report.error = Some(error.to_string());
        report
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Aggregate of a whole run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestReport {
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub sources: Vec<SourceReport>,

    /// Listing URLs that matched no adapter
    pub unrecognized: Vec<String>,
}

impl HarvestReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            elapsed: Duration::ZERO,
            sources: Vec::new(),
            unrecognized: Vec::new(),
        }
    }

    fn total(&self, count: impl Fn(&SourceReport) -> usize) -> usize {
        self.sources.iter().map(count).sum()
    }

    pub fn discovered(&self) -> usize {
        self.total(|s| s.discovered)
    }

    pub fn duplicates(&self) -> usize {
        self.total(|s| s.duplicates)
    }

    pub fn written(&self) -> usize {
        self.total(|s| s.written)
    }

    pub fn skipped(&self) -> usize {
        self.total(|s| s.skipped)
    }

    pub fn failures(&self) -> usize {
        self.total(|s| s.failures)
    }

    pub fn failed_sources(&self) -> usize {
        self.sources.iter().filter(|s| s.is_failed()).count()
    }
}

impl fmt::Display for HarvestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} sources ({} failed, {} unrecognized): {} discovered, {} duplicates, \
             {} written, {} skipped, {} failed in {:.2}s",
            self.sources.len(),
            self.failed_sources(),
            self.unrecognized.len(),
            self.discovered(),
            self.duplicates(),
            self.written(),
            self.skipped(),
            self.failures(),
            self.elapsed.as_secs_f64()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals() {
        let mut report = HarvestReport::new(Utc::now());
        let mut a = SourceReport::new("https://crossweb.pl/wydarzenia/", SourceKind::Crossweb);
        a.discovered = 5;
        a.duplicates = 1;
        a.written = 3;
        a.failures = 1;
        let b = SourceReport::failed(
            "https://unikonferencje.pl/x",
            SourceKind::Unikonferencje,
            "HTTP status 404",
        );
        report.sources = vec![a, b];
        report.elapsed = Duration::from_millis(1500);

        assert_eq!(report.discovered(), 5);
        assert_eq!(report.written(), 3);
        assert_eq!(report.failed_sources(), 1);
        assert_eq!(
            report.to_string(),
            "2 sources (1 failed, 0 unrecognized): 5 discovered, 1 duplicates, \
             3 written, 0 skipped, 1 failed in 1.50s"
        );
    }
}
