//! Application-level errors (wraps domain errors)

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::{DomainError, FieldErrors};

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("malformed tree document: {0}")]
    Document(#[from] serde_json::Error),

    #[error("unknown sample '{name}', available: {available}")]
    UnknownSample { name: String, available: String },

    #[error("tree file not found: {0}")]
    TreeFileNotFound(PathBuf),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ApplicationError {
    /// Field violations carried by this error, if it is a validation failure.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ApplicationError::Domain(DomainError::InvalidFields(errors)) => Some(errors),
            _ => None,
        }
    }

    /// True for rejections that left the tree untouched because of bad input.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ApplicationError::Domain(_) | ApplicationError::Document(_)
        )
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
