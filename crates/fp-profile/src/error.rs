//! Error types for fp-profile

use fp_core::CoreError;
use fp_db::DbError;
use std::error::Error as StdError;
use thiserror::Error;

/// Profiling errors
#[derive(Error, Debug)]
pub enum ProfileError {
    /// Invalid invocation or configuration (P001)
    #[error("[P001] Configuration error: {0}")]
    Config(#[from] CoreError),

    /// Database error inside a profiling phase (P002)
    #[error("[P002] Database error: {0}")]
    Db(#[from] DbError),

    /// An aggregate query returned something other than expected (P003)
    #[error("[P003] Unexpected aggregate result for {context}: {message}")]
    UnexpectedResult { context: String, message: String },

    /// Result serialization failed (P004)
    #[error("[P004] Failed to serialize {field}: {source}")]
    Serialization {
        field: &'static str,
        source: serde_json::Error,
    },
}

/// Result type alias for [`ProfileError`].
pub type ProfileResult<T> = Result<T, ProfileError>;

impl ProfileError {
    pub(crate) fn unexpected(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnexpectedResult {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Full diagnostic text: this error followed by its source chain.
    pub fn diagnostic(&self) -> String {
        let mut text = self.to_string();
        let mut source = self.source();
        while let Some(err) = source {
            let next = err.to_string();
            if !text.contains(&next) {
                text.push_str("\ncaused by: ");
                text.push_str(&next);
            }
            source = err.source();
        }
        text
    }
}
