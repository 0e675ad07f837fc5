//! Error types for Syndicate operations.
//!
//! Each stage of reading a feed has its own error type:
//!
//! - [`ConfigError`] is raised while building a [`Registry`](crate::Registry),
//!   never during extraction.
//! - [`ExtractionError`] aborts a single extraction when the document cannot be
//!   parsed or a selector is malformed.
//! - [`CoercionError`] aborts a single extraction when a fixed date field holds
//!   something that is not a date.
//! - [`ReadError`] is what [`FeedReader`](crate::FeedReader) surfaces: transport
//!   failures plus the two extraction errors above.
//!
//! # Example
//!
//! ```rust
//! use syndicate_core::{ConfigError, Dialect, Registry};
//!
//! let custom = Dialect::new("Custom", "custom/item").field("title", "string(x:title)");
//! match Registry::build([custom]) {
//!     Err(ConfigError::UnboundPrefix { prefix, .. }) => assert_eq!(prefix, "x"),
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Invalid dialect specification, detected when the registry is built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A dialect introducing a new item root has no name.
    #[error("Dialect for item root '{item_root}' has no name")]
    MissingName { item_root: String },

    /// A dialect has an empty item root.
    #[error("Dialect '{name}' has an empty item root")]
    EmptyItemRoot { name: String },

    /// The item root is not a plain element path.
    #[error("Dialect '{name}' has an invalid item root '{item_root}': {reason}")]
    InvalidItemRoot { name: String, item_root: String, reason: String },

    /// A selector or item root step references a prefix the dialect never binds.
    ///
    /// `location` is either the field name or `item_root`.
    #[error("Dialect '{dialect}' uses unbound namespace prefix '{prefix}' in {location}")]
    UnboundPrefix { dialect: String, location: String, prefix: String },

    /// A dialect file could not be read or deserialized.
    #[error("Failed to load dialect file {path}: {reason}")]
    Load { path: PathBuf, reason: String },
}

/// A fixed date field whose raw value is not a recognizable date.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Field '{field}' is not a valid date: '{value}'")]
pub struct CoercionError {
    pub field: String,
    pub value: String,
}

/// Failure while parsing a document or evaluating selectors against it.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The document is not well-formed XML.
    #[error("Failed to parse XML: {0}")]
    Parse(String),

    /// The bytes could not be decoded as text.
    #[error("Invalid character encoding")]
    InvalidEncoding,

    /// The document exceeds the configured size limit.
    #[error("Document is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    /// A selector expression is syntactically invalid.
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// A selector failed while being evaluated.
    #[error("Failed to evaluate selector '{selector}': {reason}")]
    Evaluation { selector: String, reason: String },

    /// A fixed date field could not be coerced.
    #[error(transparent)]
    Coercion(#[from] CoercionError),
}

/// Error surfaced by [`FeedReader::read`](crate::FeedReader::read).
#[derive(Error, Debug)]
pub enum ReadError {
    /// The input looked like a URL but could not be used as one.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Reading a file or stream failed.
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),

    /// Network, DNS or protocol failure reported by the HTTP client.
    #[error("HTTP request failed: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The server answered with a non-success status.
    #[error("HTTP request to {url} returned status {status}")]
    Status { url: String, status: u16 },

    /// Request timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// The fetched or supplied content could not be extracted.
    #[error("Extraction failed: {0}")]
    Extraction(#[source] ExtractionError),

    /// A fixed date field could not be coerced.
    #[error("Coercion failed: {0}")]
    Coercion(#[source] CoercionError),
}

impl From<ExtractionError> for ReadError {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::Coercion(e) => ReadError::Coercion(e),
            other => ReadError::Extraction(other),
        }
    }
}

impl From<CoercionError> for ReadError {
    fn from(err: CoercionError) -> Self {
        ReadError::Coercion(err)
    }
}

/// Result type alias defaulting to [`ReadError`].
pub type Result<T, E = ReadError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReadError::InvalidUrl("not a url".to_string());
        assert!(err.to_string().contains("Invalid URL"));
    }

    #[test]
    fn test_unbound_prefix_display() {
        let err = ConfigError::UnboundPrefix {
            dialect: "Custom".to_string(),
            location: "title".to_string(),
            prefix: "x".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("'x'"));
        assert!(message.contains("title"));
    }

    #[test]
    fn test_coercion_lifts_out_of_extraction() {
        let err = ExtractionError::Coercion(CoercionError {
            field: "published".to_string(),
            value: "yesterday".to_string(),
        });
        let read: ReadError = err.into();
        assert!(matches!(read, ReadError::Coercion(ref e) if e.field == "published"));
    }

    #[test]
    fn test_extraction_wraps_parse_failure() {
        let read: ReadError = ExtractionError::Parse("unexpected end".to_string()).into();
        assert!(matches!(read, ReadError::Extraction(ExtractionError::Parse(_))));
    }

    #[test]
    fn test_status_error_message() {
        let err = ReadError::Status { url: "http://example.test/feed.xml".to_string(), status: 404 };
        assert!(err.to_string().contains("404"));
    }
}
