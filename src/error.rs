//! # Error Handling
//!
//! This module defines the centralized error type for the metadata updater.
//! It uses the `thiserror` library to create an `Error` enum that covers the
//! failure modes of a run, from configuration loading through to the final
//! publish request.
//!
//! ## Propagation
//!
//! Errors fall into two groups:
//!
//! - **Fatal**: `Configuration` errors stop the process before any layer is
//!   touched.
//! - **Per-layer**: `RemoteServer`, `MetadataUnavailable`, `DraftConflict`
//!   and document errors (`Xml`, `Namespace`, `ElementPath`, `Io`) are
//!   caught by the run orchestrator, logged, counted in the run tally, and
//!   cause only the affected layer to be skipped.
//!
//! The `Result` type alias is used throughout the library.

use thiserror::Error;

/// Main error type for metadata updater operations
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid configuration. Always fatal.
    ///
    /// Includes an optional hint about how to fix the configuration file.
    #[error("Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Configuration {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// A call to the remote data service failed.
    ///
    /// `status` is the HTTP status when the server answered, `None` for
    /// transport failures (connection refused, timeout, bad body).
    #[error("Remote server error during {operation}{}: {message}", status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
    RemoteServer {
        operation: String,
        status: Option<u16>,
        message: String,
    },

    /// The layer has no metadata document to download.
    #[error("No metadata available for layer {layer_id}")]
    MetadataUnavailable { layer_id: u64 },

    /// The layer's existing draft is already part of an active publish group.
    #[error("A draft already exists for layer {layer_id} and is in a publish group")]
    DraftConflict { layer_id: u64 },

    /// The metadata document could not be parsed or serialized.
    #[error("XML error: {message}")]
    Xml { message: String },

    /// The document's namespace declarations are incompatible with the
    /// expected ISO-19139 set, or were not preserved by an edit.
    #[error("Namespace error: {message}")]
    Namespace { message: String },

    /// A target element path could not be parsed or resolved.
    #[error("Element path error in '{path}': {message}")]
    ElementPath { path: String, message: String },

    /// A summary report could not be written.
    #[error("Report error: {message}")]
    Report { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl Error {
    /// Shorthand for a remote failure that carries no HTTP status.
    pub fn remote(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Error::RemoteServer {
            operation: operation.into(),
            status: None,
            message: message.into(),
        }
    }

    /// Shorthand for a configuration error without a hint.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
            hint: None,
        }
    }

    /// Whether retrying the same remote call could plausibly succeed.
    ///
    /// Transport failures, 5xx responses and 429 are transient. Everything
    /// else (including 404 for an unknown layer id) is not.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::RemoteServer { status: None, .. } => true,
            Error::RemoteServer {
                status: Some(code), ..
            } => *code >= 500 || *code == 429,
            _ => false,
        }
    }

    /// Whether the error must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Configuration { .. })
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
