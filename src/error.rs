//! Error types for the frame renderer

use thiserror::Error;

/// Result type alias for rendering operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while turning a payload into an image
///
/// Missing fonts or emoji icons are not errors: the resolver logs them and
/// hands the renderer an empty asset instead.
#[derive(Error, Debug)]
pub enum Error {
    /// Inbound payload is structurally inconsistent
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Invalid configuration (size envelopes, bar steps, ...)
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// The renderer failed to produce an image
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// Filesystem error while reading a payload or config file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
