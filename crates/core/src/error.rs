//! Error types for the Ain Bondhu domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! One error enum per bounded context; the entry-point binaries box
//! whichever family reaches them.
//!
//! The split matters operationally: `KnowledgeError` is the only family
//! allowed to abort startup. Everything else is converted to data at the
//! component boundary so a single chat turn can degrade instead of dying.

use thiserror::Error;

/// Failures loading the legal knowledge corpus. Any of these during startup
/// means the process must not begin serving.
#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("Required artifact missing: {0}")]
    ArtifactMissing(String),

    #[error("Failed to read artifact {path}: {reason}")]
    ReadFailed { path: String, reason: String },

    #[error("Failed to parse artifact {path}: {reason}")]
    ParseFailed { path: String, reason: String },
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    NotFound(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}
