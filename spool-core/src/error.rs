use thiserror::Error;

/// Unified error type for Spool.
///
/// Handler errors (`NotFound`, `MethodNotAllowed`, `Http`, `Internal`) travel
/// through the gas chain to the host error handler. `InvalidFormat` and
/// `ConfigError` are startup errors; `Render` never leaves the logger.
#[derive(Error, Debug)]
pub enum SpoolError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("Invalid log format at byte {offset}: {reason}")]
    InvalidFormat { offset: usize, reason: String },

    #[error("Render error: {0}")]
    Render(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Internal: {0}")]
    Internal(String),
}

impl SpoolError {
    /// Handler-style error with an explicit status.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        SpoolError::Http {
            status,
            message: message.into(),
        }
    }

    /// Map to HTTP status code.
    pub fn status_code(&self) -> u16 {
        match self {
            SpoolError::NotFound(_) => 404,
            SpoolError::MethodNotAllowed(_) => 405,
            SpoolError::Http { status, .. } => *status,
            _ => 500,
        }
    }

    /// JSON error body.
    pub fn to_json_body(&self) -> Vec<u8> {
        serde_json::json!({
            "error": self.to_string(),
            "status": self.status_code(),
        })
        .to_string()
        .into_bytes()
    }
}
