//! Error types for the alert engine.

/// Top-level error type for the alert engine.
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    /// Alert feed fetch or decode error.
    #[error("feed error: {0}")]
    Feed(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Engine state persistence error.
    #[error("state error: {0}")]
    State(String),

    /// Audio buffer or WAV codec error.
    #[error("audio error: {0}")]
    Audio(String),

    /// Audio clip lookup error (missing or unreadable clip file).
    #[error("clip error: {0}")]
    Clip(String),

    /// Courtesy tone / identifier asset switch error.
    #[error("switch error: {0}")]
    Switch(String),

    /// External command execution error.
    #[error("exec error: {0}")]
    Exec(String),

    /// Notification delivery error.
    #[error("notify error: {0}")]
    Notify(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, AlertError>;
