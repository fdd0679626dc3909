//! Error types for the craftwatch service

/// Errors that can occur in the craftwatch service
#[derive(Debug, thiserror::Error)]
pub enum CraftwatchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Server unreachable: {0}")]
    ProbeUnreachable(String),

    #[error("Admin query failed: {0}")]
    AdminQueryFailed(String),

    #[error("Surface write failed: {0}")]
    SurfaceWriteFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Boxed because `serenity::Error` is large
    #[error("Discord error: {0}")]
    Discord(Box<serenity::Error>),
}

impl From<serenity::Error> for CraftwatchError {
    fn from(err: serenity::Error) -> Self {
        CraftwatchError::Discord(Box::new(err))
    }
}

/// Result type alias for craftwatch operations
pub type Result<T> = std::result::Result<T, CraftwatchError>;
