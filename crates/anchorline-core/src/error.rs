//! Error types for Anchorline

/// Result type alias using Anchorline's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for Anchorline operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Classifier construction or execution errors
    #[error("classifier error: {0}")]
    Classifier(String),

    /// Errors from an external generation step (claim extraction, counterpoints)
    #[error("generation error: {0}")]
    Generation(String),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a new classifier error
    pub fn classifier(msg: impl Into<String>) -> Self {
        Self::Classifier(msg.into())
    }

    /// Create a new generation error
    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }
}
