//! Pre-flight checks before operations that call the model provider.

use crate::config::Settings;
use crate::error::{LecternError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Serving, asking and chatting call the chat and embedding APIs.
    Query,
    /// Ingestion calls the embedding API.
    Ingest,
    /// Listing courses only reads the local store.
    Browse,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    settings.validate()?;
    match operation {
        Operation::Query | Operation::Ingest => check_api_key(settings),
        Operation::Browse => Ok(()),
    }
}

/// Check that an API key is configured, either in settings or the environment.
fn check_api_key(settings: &Settings) -> Result<()> {
    if settings.llm.api_key.as_deref().is_some_and(|k| !k.is_empty()) {
        return Ok(());
    }
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(LecternError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...' or in .env"
                .to_string(),
        )),
        Err(_) => Err(LecternError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...' or in .env"
                .to_string(),
        )),
    }
}
