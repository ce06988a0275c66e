//! Error types for the Forgetful core engine.

/// Result type alias used throughout the core crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds produced by the core engine.
///
/// Repository-layer errors propagate upward unchanged; only the outermost
/// boundary (an HTTP handler or the meta-tool dispatcher) translates these
/// into a caller-visible shape. The sole exception is the auto-linker, which
/// catches and logs everything internally so memory creation always
/// succeeds when the primary insert does.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed input, schema violation, or out-of-range parameter.
    #[error("validation error: {0}")]
    Validation(String),

    /// Target row missing or not owned by the requesting user.
    #[error("not found: {0}")]
    NotFound(String),

    /// Link unique-constraint violation. Internal signal: batch callers
    /// downgrade this to a silent skip; single-link endpoints surface it.
    #[error("memories {source_id} and {target_id} are already linked")]
    AlreadyLinked {
        /// Canonicalized source memory id.
        source_id: i64,
        /// Canonicalized target memory id.
        target_id: i64,
    },

    /// Tool invocation outside the caller's effective scope.
    #[error("permission denied: requires scope '{required_scope}'")]
    PermissionDenied {
        /// Scope token (e.g. `write:memories`) that would have permitted the call.
        required_scope: String,
    },

    /// Deadline exceeded before the operation completed.
    #[error("operation timed out")]
    Timeout,

    /// Caller-provided cancellation signal fired before completion.
    #[error("operation cancelled")]
    Cancelled,

    /// Adapter failure, dimension mismatch, or storage invariant violation.
    #[error("internal error: {0}")]
    Internal(String),

    /// Serialization failure, generally a storage-layer bug rather than bad input.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O failure (backup/restore, config loading).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Construct a [`Error::Validation`] naming the offending field.
    pub fn validation(field: impl std::fmt::Display, reason: impl std::fmt::Display) -> Self {
        Error::Validation(format!("{field}: {reason}"))
    }

    /// Construct a [`Error::NotFound`] for the given entity kind and id.
    pub fn not_found(kind: impl std::fmt::Display, id: impl std::fmt::Display) -> Self {
        Error::NotFound(format!("{kind} {id} not found"))
    }

    /// Whether retrying this operation with the same inputs could plausibly
    /// succeed (used by callers that wrap adapter calls in backoff logic).
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Timeout => true,
            Error::Internal(_) => true,
            Error::Io(_) => true,
            Error::Validation(_)
            | Error::NotFound(_)
            | Error::AlreadyLinked { .. }
            | Error::PermissionDenied { .. }
            | Error::Cancelled
            | Error::Serialization(_) => false,
        }
    }

    /// Maps this error onto an HTTP-equivalent status code, without leaking
    /// internals. Callers in `forgetful-http` use this directly; the MCP
    /// dispatcher uses [`Error::tool_error_code`] instead.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::NotFound(_) => 404,
            Error::AlreadyLinked { .. } => 409,
            Error::PermissionDenied { .. } => 403,
            Error::Timeout => 504,
            Error::Cancelled => 499,
            Error::Internal(_) | Error::Serialization(_) | Error::Io(_) => 500,
        }
    }

    /// Maps this error onto the structured MCP tool-error `code` field.
    #[must_use]
    pub fn tool_error_code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::NotFound(_) => "NOT_FOUND",
            Error::PermissionDenied { .. } => "PERMISSION_DENIED",
            Error::AlreadyLinked { .. } => "VALIDATION_ERROR",
            Error::Timeout | Error::Cancelled => "INTERNAL_ERROR",
            Error::Internal(_) | Error::Serialization(_) | Error::Io(_) => "INTERNAL_ERROR",
        }
    }
}
