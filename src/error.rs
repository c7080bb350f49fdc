//! Error types for `msgweave`

use thiserror::Error;

/// The error type for `msgweave` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== Message Parse Errors ====================
    /// The block is not a well-formed `DEFINE_MESSAGE(...)` call.
    #[error("malformed DEFINE_MESSAGE: {reason}")]
    MalformedDefine {
        /// What was wrong with the call.
        reason: String,
    },

    /// The message body has no `HEADER(...)` sub-call.
    #[error("missing HEADER()")]
    MissingHeader,

    /// The `HEADER(...)` sub-call has too few arguments.
    #[error("malformed HEADER(): {args} arguments (need at least 6)")]
    MalformedHeader {
        /// The number of arguments found.
        args: usize,
    },

    // ==================== Translator Errors ====================
    /// The translation backend could not be reached or its response could
    /// not be parsed into text fragments.
    #[error("translation unavailable: {reason}")]
    TranslationUnavailable {
        /// Network, timeout, or parse failure description.
        reason: String,
    },

    /// The translator returned a different number of fragments than
    /// requested. Recorded for diagnostics; the response is repaired by
    /// merging or padding, not rejected.
    #[error("fragment count mismatch: expected {expected}, got {got}")]
    FragmentCountMismatch {
        /// The number of fragments sent.
        expected: usize,
        /// The number of fragments returned.
        got: usize,
    },

    // ==================== Serialization Errors ====================
    /// JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for `msgweave` operations.
pub type Result<T> = std::result::Result<T, Error>;
