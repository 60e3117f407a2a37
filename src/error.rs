//! Error types for the ingestion pipeline and the tracking store.

use thiserror::Error;

/// The generic message shown to the user when a submission fails.
pub const ANALYSIS_FAILED_MESSAGE: &str =
    "Sorry, I had trouble analyzing that. Please try pasting the text again.";

pub const NOT_FOUND_MESSAGE: &str = "I couldn't find that opportunity. It may have been removed.";

pub const SAVE_FAILED_MESSAGE: &str = "Sorry, I couldn't save that change. Please try again.";

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The external-service credential is missing or unusable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Network failure, non-success response, or a response that violates the output contract.
    #[error("external service error: {message}")]
    ExternalService {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl PipelineError {
    pub fn external(message: impl Into<String>) -> Self {
        PipelineError::ExternalService {
            message: message.into(),
            source: None,
        }
    }

    pub fn external_with(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        PipelineError::ExternalService {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// What the end user sees. Detail stays in the logs.
    pub fn user_message(&self) -> &'static str {
        match self {
            PipelineError::Configuration(_) | PipelineError::ExternalService { .. } => {
                ANALYSIS_FAILED_MESSAGE
            }
            PipelineError::Store(StoreError::NotFound(_)) => NOT_FOUND_MESSAGE,
            PipelineError::Store(StoreError::DuplicateId(_)) | PipelineError::Storage(_) => {
                SAVE_FAILED_MESSAGE
            }
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("opportunity '{0}' not found")]
    NotFound(String),

    #[error("opportunity id '{0}' already exists")]
    DuplicateId(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(#[from] rusqlite::Error),

    #[error("failed to serialize document '{key}': {source}")]
    Serialize {
        key: String,
        source: serde_json::Error,
    },

    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage lock poisoned")]
    Poisoned,

    #[error("storage write task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Violation of the Analysis or Matching output contract.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("response is not valid for the {contract} contract: {source}")]
    Malformed {
        contract: &'static str,
        source: serde_json::Error,
    },

    #[error("{contract} contract: required field '{field}' is empty")]
    EmptyField {
        contract: &'static str,
        field: &'static str,
    },
}
