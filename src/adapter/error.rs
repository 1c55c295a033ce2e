//! Error types for the adapter module

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for listing and detail page extraction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// The detail page has no usable title; the record is dropped
    #[error("no title found on {0}")]
    MissingTitle(String),

    /// A CSS selector failed to parse
    #[error("invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// A listing or page URL could not be built
    #[error("URL error: {0}")]
    Url(String),
}

impl From<url::ParseError> for ExtractionError {
    fn from(err: url::ParseError) -> Self {
        ExtractionError::Url(err.to_string())
    }
}

impl From<ExtractionError> for CrateError {
    fn from(err: ExtractionError) -> Self {
        CrateError::Extraction(err.to_string())
    }
}
