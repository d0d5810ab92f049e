use thiserror::Error;

/// Top-level error type for the counselor workspace.
///
/// Covers the ambient failures (configuration, I/O, serialization). The chat
/// crate defines its own `ChatError` and converts from this type so that `?`
/// works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CounselorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),
}

impl From<toml::de::Error> for CounselorError {
    fn from(err: toml::de::Error) -> Self {
        CounselorError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for CounselorError {
    fn from(err: toml::ser::Error) -> Self {
        CounselorError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for CounselorError {
    fn from(err: serde_json::Error) -> Self {
        CounselorError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for counselor operations.
pub type Result<T> = std::result::Result<T, CounselorError>;
