//! Error types of the benchmark driver.

use std::time::Duration;

use storebench_backend::{BackendError, ObjectName};
use thiserror::Error;

/// An invalid benchmark configuration, detected before any work starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The object name prefix is empty.
    #[error("object name prefix must not be empty")]
    EmptyPrefix,

    /// Objects of zero bytes cannot be measured.
    #[error("object size must be greater than zero")]
    ZeroObjectSize,

    /// The object size does not fit into memory on this platform.
    #[error("object size of {0} bytes cannot be buffered on this platform")]
    ObjectSizeTooLarge(u64),

    /// Workers must perform at least one operation.
    #[error("object count must be greater than zero")]
    ZeroObjectCount,

    /// At least one worker must run.
    #[error("worker count must be greater than zero")]
    ZeroWorkers,

    /// A required field of the S3-compatible storage is empty.
    #[error("s3compatible storage requires a non-empty `{0}`")]
    MissingS3Field(&'static str),
}

/// The system entropy source could not seed the payload generator.
#[derive(Debug, Error)]
#[error("failed to seed the payload generator from the system entropy source")]
pub struct PayloadError {
    #[source]
    pub(crate) cause: Box<dyn std::error::Error + Send + Sync>,
}

/// Fatal errors that abort a run before any worker starts.
#[derive(Debug, Error)]
pub enum RunError {
    /// The backend could not be set up.
    #[error("failed to set up the storage backend")]
    Setup(#[source] BackendError),

    /// The payload could not be generated.
    #[error(transparent)]
    Payload(#[from] PayloadError),
}

/// The reason a single benchmark operation failed.
#[derive(Debug, Error)]
pub enum OperationError {
    /// The backend reported an error.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The backend did not answer within the configured operation timeout.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// Strict read validation found an object of the wrong size.
    #[error("read {actual} bytes, expected {expected}")]
    ShortRead {
        /// The configured object size.
        expected: usize,
        /// The number of bytes the backend returned.
        actual: usize,
    },
}

/// A failed operation that aborted one worker's loop.
#[derive(Debug, Error)]
#[error("worker {worker} failed on `{object}`")]
pub struct WorkerError {
    /// Index of the failed worker.
    pub worker: usize,
    /// The object the failing operation addressed.
    pub object: ObjectName,
    /// The underlying failure.
    #[source]
    pub cause: OperationError,
}
