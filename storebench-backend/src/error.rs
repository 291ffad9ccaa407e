use thiserror::Error;

/// Errors returned by [`Backend`](crate::Backend) operations and backend setup.
#[derive(Debug, Error)]
pub enum BackendError {
    /// IO errors related to file operations or reading response bodies.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The requested object does not exist in the backend.
    #[error("object `{name}` not found")]
    NotFound {
        /// Name of the missing object.
        name: String,
    },

    /// Errors stemming from the S3 client, including network errors and error responses.
    #[error("s3 error: {context}")]
    S3 {
        context: String,
        #[source]
        cause: s3::error::S3Error,
    },

    /// The store answered with a status code that does not indicate success.
    #[error("{context}: unexpected status {status}")]
    Status { context: String, status: u16 },

    /// Any other error stemming from one of the storage backends, which might be specific to that
    /// backend or to a certain operation.
    #[error("storage backend error: {context}")]
    Generic {
        context: String,
        #[source]
        cause: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl BackendError {
    pub(crate) fn s3(context: impl Into<String>, cause: s3::error::S3Error) -> Self {
        Self::S3 {
            context: context.into(),
            cause,
        }
    }
}

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;
