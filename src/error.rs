//! Error types for Lectern.

use thiserror::Error;

/// Library-level error type for Lectern operations.
#[derive(Error, Debug)]
pub enum LecternError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse course document {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Tool '{0}' not found")]
    ToolNotFound(String),

    #[error("Invalid tool arguments: {0}")]
    ToolArguments(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Course not found: {0}")]
    CourseNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl LecternError {
    /// Build a parse error for the given document path.
    pub fn parse(path: impl AsRef<std::path::Path>, reason: impl Into<String>) -> Self {
        LecternError::Parse {
            path: path.as_ref().display().to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for Lectern operations.
pub type Result<T> = std::result::Result<T, LecternError>;
