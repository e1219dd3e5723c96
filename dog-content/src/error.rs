use thiserror::Error;

use crate::BlobRef;

/// Result type for content operations
pub type ContentResult<T> = Result<T, ContentError>;

/// Errors that can occur while attaching, reading or deleting asset content
#[derive(Error, Debug)]
pub enum ContentError {
    /// A policy check refused the operation, or the content type was rejected
    #[error("Precondition violated: {message}")]
    PreconditionViolation { message: String },

    /// The asset is not in a state that allows the operation
    #[error("Inconsistent state: {message}")]
    StateInconsistency { message: String },

    /// Metadata points at a physical blob the store no longer has
    #[error("Missing blob: {blob_ref}")]
    MissingBlob { blob_ref: BlobRef },

    /// A metadata record for this reference already exists
    #[error("Asset blob already exists: {blob_ref}")]
    Conflict { blob_ref: BlobRef },

    #[error("Storage backend error: {source}")]
    Backend {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

impl ContentError {
    /// Create a backend error from any error type
    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            source: Box::new(error),
        }
    }

    /// Create a precondition violation
    pub fn precondition<S: Into<String>>(message: S) -> Self {
        Self::PreconditionViolation {
            message: message.into(),
        }
    }

    /// Create a state inconsistency error
    pub fn inconsistent<S: Into<String>>(message: S) -> Self {
        Self::StateInconsistency {
            message: message.into(),
        }
    }

    pub fn missing_blob(blob_ref: BlobRef) -> Self {
        Self::MissingBlob { blob_ref }
    }

    pub fn conflict(blob_ref: BlobRef) -> Self {
        Self::Conflict { blob_ref }
    }

    /// True for errors raised by a policy check
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::PreconditionViolation { .. })
    }
}
