// this_file: src/error.rs
//! Error types for the flipbook library.

use thiserror::Error;

/// Main error type for flipbook operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO operation error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error (input document or override document).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Override document failed validation (§4.2).
    #[error("invalid override: {0}")]
    InvalidOverride(String),

    /// C1 locator could not find a required substructure.
    #[error("locator failed: {0}")]
    LocatorFailed(String),

    /// C5 mutator could not apply a text/size/position substitution.
    #[error("mutation failed: {0}")]
    MutationFailed(String),

    /// Rendering a frame failed (§7.3, frame-local).
    #[error("render failed: {0}")]
    RenderFailed(String),

    /// Encoding a frame to PNG/WebP failed (§7.3, frame-local).
    #[error("encode failed: {0}")]
    EncodeFailed(String),

    /// Invalid CLI/config parameter (§7.1, setup-fatal).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type alias for flipbook operations.
pub type Result<T> = std::result::Result<T, Error>;
