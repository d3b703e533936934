//! Error handling for the confedit system

use thiserror::Error;

/// Result type alias for confedit operations
pub type Result<T> = std::result::Result<T, ConfEditError>;

/// Main error type for the confedit system
#[derive(Error, Debug)]
pub enum ConfEditError {
    /// Settings-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// State store errors
    #[error("State error: {0}")]
    State(String),

    /// Editor session errors raised by the editor plugin
    #[error("Editor error: {0}")]
    Editor(String),

    /// Resource lookup errors
    #[error("Lookup error: {0}")]
    Lookup(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfEditError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new state error
    pub fn state<S: Into<String>>(msg: S) -> Self {
        Self::State(msg.into())
    }

    /// Create a new editor error
    pub fn editor<S: Into<String>>(msg: S) -> Self {
        Self::Editor(msg.into())
    }

    /// Create a new lookup error
    pub fn lookup<S: Into<String>>(msg: S) -> Self {
        Self::Lookup(msg.into())
    }

    /// Check if this is a recoverable error
    pub fn is_recoverable(&self) -> bool {
        match self {
            ConfEditError::Config(_) => false,
            ConfEditError::State(_) => true,
            ConfEditError::Editor(_) => true,
            ConfEditError::Lookup(_) => true,
            ConfEditError::Io(_) => true,
            ConfEditError::Json(_) => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ConfEditError::Config(_) => ErrorSeverity::High,
            ConfEditError::State(_) => ErrorSeverity::Medium,
            ConfEditError::Editor(_) => ErrorSeverity::Medium,
            ConfEditError::Lookup(_) => ErrorSeverity::Low,
            ConfEditError::Io(_) => ErrorSeverity::Medium,
            ConfEditError::Json(_) => ErrorSeverity::Low,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Low => write!(f, "LOW"),
            ErrorSeverity::Medium => write!(f, "MEDIUM"),
            ErrorSeverity::High => write!(f, "HIGH"),
        }
    }
}
