use thiserror::Error;

use crate::domain::QueryKey;

/// Failure of one aggregation. Every variant is terminal for the whole submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The subject does not resolve to an existing page.
    #[error("Page not found")]
    NotFound,

    /// One of the targets answered with a non-success status.
    #[error("API error: {status} ({key})")]
    Source { key: QueryKey, status: u16 },

    /// A decoded payload lacks the minimum expected shape.
    #[error("Malformed API response: {0}")]
    Malformed(String),

    /// The request never produced a usable response (connect, TLS, body read).
    #[error("Request failed ({key}): {message}")]
    Transport { key: QueryKey, message: String },

    /// The fan-out did not settle within the configured deadline.
    #[error("Timed out after {0}s waiting for the API")]
    Timeout(u64),
}

impl FetchError {
    /// Process exit code used by the binary for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            FetchError::NotFound => 3,
            FetchError::Source { .. } | FetchError::Transport { .. } | FetchError::Timeout(_) => 4,
            FetchError::Malformed(_) => 5,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        AppError::new(err.exit_code(), format!("Error: {err}"))
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
