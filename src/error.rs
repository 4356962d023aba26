//! Error types for PlugScan
//!
//! This module defines the error types used throughout the crate. Uses
//! `thiserror` for ergonomic error handling with automatic `Display` and
//! `Error` trait implementations.
//!
//! Discovery and loading failures (`UnreadableArchive`,
//! `UnreadableDirectory`, [`ResolutionError`]) are logged and swallowed by
//! the scan pipeline. Lookup and construction failures (`NotFound`,
//! `Construction`) are returned to the caller.

use thiserror::Error;

/// The primary error type for PlugScan operations.
#[derive(Error, Debug)]
pub enum PlugError {
    /// Configuration-related errors (invalid config file, bad values, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Archive format errors reported by the zip reader
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// No cataloged type matches the requested name or tag
    #[error("Not found: {0}")]
    NotFound(String),

    /// No matching constructor, arity mismatch, or the constructor failed
    #[error("Construction error: {0}")]
    Construction(String),

    /// An archive could not be opened or its entries could not be read
    #[error("Unreadable archive: {0}")]
    UnreadableArchive(String),

    /// A directory in the plugin tree could not be traversed
    #[error("Unreadable directory: {0}")]
    UnreadableDirectory(String),
}

/// Why a single candidate type name could not be resolved.
///
/// Always handled per candidate; one failure never aborts a batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// No type definition is registered under this qualified name.
    #[error("unknown type '{0}'")]
    Unknown(String),

    /// The entry name is not a valid qualified type name.
    #[error("malformed type name '{0}'")]
    Malformed(String),

    /// The name is not declared by the archive being loaded.
    #[error("type '{name}' is not declared in {archive}")]
    OutOfScope { name: String, archive: String },
}

/// A specialized `Result` type for PlugScan operations.
pub type Result<T> = std::result::Result<T, PlugError>;
