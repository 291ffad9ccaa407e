//! The resolved, immutable settings of a single benchmark run.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use storebench_backend::{BackendConfig, BackendKind, S3CompatibleConfig};

use crate::error::ConfigError;

/// The operation every worker of a run performs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Store objects.
    Write,
    /// Read back objects stored by an earlier write run with the same prefix.
    #[default]
    Read,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Write => "write",
            Self::Read => "read",
        })
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            s if s.eq_ignore_ascii_case("write") => Ok(Self::Write),
            s if s.eq_ignore_ascii_case("read") => Ok(Self::Read),
            s => Err(format!(
                r#"error parsing "{s}" as operation: expected "write" or "read""#
            )),
        }
    }
}

/// How reads that return fewer or more bytes than the object size are treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadValidation {
    /// Log a warning and keep going.
    #[default]
    Relaxed,
    /// Fail the worker on the first mismatch.
    Strict,
}

/// The storage target of a run.
#[derive(Debug)]
pub enum StorageTarget {
    /// A directory on a local or mounted filesystem.
    FileSystem {
        /// The directory that holds the objects.
        path: PathBuf,
    },
    /// A bucket of an S3-compatible store.
    S3Compatible {
        /// Region name used for request signing.
        region: String,
        /// Store endpoint.
        endpoint: String,
        /// Bucket holding the objects.
        bucket: String,
        /// Static access key.
        access_key: String,
        /// Static secret key.
        secret_key: SecretString,
    },
}

/// Immutable settings of one benchmark run.
///
/// Construct it with [`RunConfig::builder`], which validates all values.
#[derive(Debug)]
pub struct RunConfig {
    storage: StorageTarget,
    operation: Operation,
    object_size: usize,
    object_count: usize,
    workers: usize,
    prefix: Arc<str>,
    read_validation: ReadValidation,
    operation_timeout: Option<Duration>,
}

impl RunConfig {
    /// Starts building a run against `storage` using the object name `prefix`.
    pub fn builder(storage: StorageTarget, prefix: impl Into<String>) -> RunConfigBuilder {
        RunConfigBuilder {
            storage,
            prefix: prefix.into(),
            operation: Operation::default(),
            object_size: 4 * 1024,
            object_count: 3000,
            workers: 2,
            read_validation: ReadValidation::default(),
            operation_timeout: None,
        }
    }

    /// The kind of backend this run targets.
    pub fn backend_kind(&self) -> BackendKind {
        match self.storage {
            StorageTarget::FileSystem { .. } => BackendKind::FileSystem,
            StorageTarget::S3Compatible { .. } => BackendKind::S3Compatible,
        }
    }

    /// The directory path or bucket name of the storage target.
    pub fn location(&self) -> String {
        match &self.storage {
            StorageTarget::FileSystem { path } => path.display().to_string(),
            StorageTarget::S3Compatible { bucket, .. } => bucket.clone(),
        }
    }

    /// Describes the backend for [`storebench_backend::create_backend`].
    pub fn backend_config(&self) -> BackendConfig<'_> {
        match &self.storage {
            StorageTarget::FileSystem { path } => BackendConfig::FileSystem { path },
            StorageTarget::S3Compatible {
                region,
                endpoint,
                bucket,
                access_key,
                secret_key,
            } => BackendConfig::S3Compatible(S3CompatibleConfig {
                region,
                endpoint,
                bucket,
                access_key,
                secret_key: secret_key.expose_secret(),
            }),
        }
    }

    /// The storage target.
    pub fn storage(&self) -> &StorageTarget {
        &self.storage
    }

    /// The operation every worker performs.
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// The size of every object in bytes.
    pub fn object_size(&self) -> usize {
        self.object_size
    }

    /// The number of objects every worker writes or reads.
    pub fn object_count(&self) -> usize {
        self.object_count
    }

    /// The number of concurrent workers.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// The object name prefix shared by all workers.
    pub fn prefix(&self) -> &Arc<str> {
        &self.prefix
    }

    /// The policy for size mismatches on read.
    pub fn read_validation(&self) -> ReadValidation {
        self.read_validation
    }

    /// The deadline of each individual backend call, if any.
    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout
    }
}

/// A builder for creating a [`RunConfig`].
#[derive(Debug)]
pub struct RunConfigBuilder {
    storage: StorageTarget,
    prefix: String,
    operation: Operation,
    object_size: usize,
    object_count: usize,
    workers: usize,
    read_validation: ReadValidation,
    operation_timeout: Option<Duration>,
}

impl RunConfigBuilder {
    /// The operation every worker performs.
    pub fn operation(mut self, operation: Operation) -> Self {
        self.operation = operation;
        self
    }

    /// The size of every object in bytes.
    pub fn object_size(mut self, object_size: usize) -> Self {
        self.object_size = object_size;
        self
    }

    /// The number of objects per worker.
    pub fn object_count(mut self, object_count: usize) -> Self {
        self.object_count = object_count;
        self
    }

    /// The number of concurrent workers.
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// The policy for size mismatches on read.
    pub fn read_validation(mut self, read_validation: ReadValidation) -> Self {
        self.read_validation = read_validation;
        self
    }

    /// An optional deadline for each individual backend call.
    pub fn operation_timeout(mut self, operation_timeout: Option<Duration>) -> Self {
        self.operation_timeout = operation_timeout;
        self
    }

    /// Validates the settings and creates the run configuration.
    pub fn build(self) -> Result<RunConfig, ConfigError> {
        if self.prefix.is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }
        if self.object_size == 0 {
            return Err(ConfigError::ZeroObjectSize);
        }
        if self.object_count == 0 {
            return Err(ConfigError::ZeroObjectCount);
        }
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }

        if let StorageTarget::S3Compatible {
            endpoint,
            bucket,
            access_key,
            secret_key,
            ..
        } = &self.storage
        {
            let required: [(&'static str, &str); 4] = [
                ("endpoint", endpoint.as_str()),
                ("bucket", bucket.as_str()),
                ("access_key", access_key.as_str()),
                ("secret_key", secret_key.expose_secret()),
            ];
            if let Some((field, _)) = required.iter().find(|(_, value)| value.is_empty()) {
                return Err(ConfigError::MissingS3Field(*field));
            }
        }

        Ok(RunConfig {
            storage: self.storage,
            operation: self.operation,
            object_size: self.object_size,
            object_count: self.object_count,
            workers: self.workers,
            prefix: self.prefix.into(),
            read_validation: self.read_validation,
            operation_timeout: self.operation_timeout,
        })
    }
}
