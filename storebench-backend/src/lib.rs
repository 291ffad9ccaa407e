//! The backend layer provides the storage abstraction the benchmark runs against.
//!
//! Every storage target implements [`Backend`], which exposes exactly two operations: storing a
//! complete object under an [`ObjectName`], and reading a complete object back into a
//! caller-supplied buffer. Two production backends exist:
//!
//! - [`LocalFs`] writes one file per object into a directory on a local or mounted filesystem.
//! - [`S3Compatible`] talks to an S3-compatible object store using path-style addressing.
//!
//! Backends are constructed through [`create_backend`], which also performs all one-time setup
//! (such as creating the target directory). Setup failures surface there, before any benchmark
//! worker is started.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

mod backend;
mod error;
mod name;

pub use backend::{
    Backend, BoxedBackend, InMemoryBackend, LocalFs, S3Compatible, S3CompatibleConfig,
};
pub use error::{BackendError, BackendResult};
pub use name::ObjectName;

use std::path::Path;

/// Discriminates the available storage backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    /// A directory on a local or mounted filesystem.
    FileSystem,
    /// A bucket of an S3-compatible object store.
    S3Compatible,
}

/// Configuration to initialize a [`Backend`] through [`create_backend`].
#[derive(Debug, Clone)]
pub enum BackendConfig<'a> {
    /// Use a local filesystem directory as the storage backend.
    FileSystem {
        /// The directory in which objects are stored as files.
        path: &'a Path,
    },
    /// Use a bucket of an S3-compatible store as the storage backend.
    S3Compatible(S3CompatibleConfig<'a>),
}

impl BackendConfig<'_> {
    /// Returns the kind of backend this configuration creates.
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::FileSystem { .. } => BackendKind::FileSystem,
            Self::S3Compatible(_) => BackendKind::S3Compatible,
        }
    }
}

/// Creates the backend described by `config`.
///
/// This performs the backend's one-time setup. For the filesystem, the directory including all
/// missing parents is created here and never again during the run.
pub async fn create_backend(config: BackendConfig<'_>) -> BackendResult<BoxedBackend> {
    Ok(match config {
        BackendConfig::FileSystem { path } => Box::new(LocalFs::create(path).await?),
        BackendConfig::S3Compatible(config) => Box::new(S3Compatible::new(config)?),
    })
}
