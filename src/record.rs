//! Canonical event record produced by every source adapter

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Marker for a field that exists in the schema but has no value
pub const NOT_AVAILABLE: &str = "N/A";

/// A single harvested event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Title of the event, or [`NOT_AVAILABLE`]
    pub title: String,

    /// Named attributes (date, fee, city, ...), each populated or [`NOT_AVAILABLE`]
    pub fields: BTreeMap<String, String>,

    /// Long free-text description, or [`NOT_AVAILABLE`]
    pub description: String,

    /// URL the record was extracted from
    pub source: String,
}

/// The part of a record handed to the ingester alongside the description
#[derive(Debug, Clone, Serialize)]
pub struct MainInformation<'a> {
    pub title: &'a str,
    pub fields: &'a BTreeMap<String, String>,
    pub source: &'a str,
}

impl EventRecord {
    /// Create an empty record for `source` with every value unavailable
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            title: NOT_AVAILABLE.to_string(),
            fields: BTreeMap::new(),
            description: NOT_AVAILABLE.to_string(),
            source: source.into(),
        }
    }

    /// Whether the record has a usable title
    pub fn has_title(&self) -> bool {
        self.title != NOT_AVAILABLE && !self.title.is_empty()
    }

    /// Set a field, falling back to the sentinel when `value` is missing or blank
    pub fn set_field(&mut self, name: &str, value: Option<String>) {
        self.fields.insert(name.to_string(), or_not_available(value));
    }

    /// Look up a field value
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Everything except the description
    pub fn main_information(&self) -> MainInformation<'_> {
        MainInformation {
            title: &self.title,
            fields: &self.fields,
            source: &self.source,
        }
    }
}

/// Map a missing or blank value to [`NOT_AVAILABLE`]
pub fn or_not_available(value: Option<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => NOT_AVAILABLE.to_string(),
    }
}
