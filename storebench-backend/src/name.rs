use std::fmt;
use std::sync::Arc;

/// The name of a single benchmark object.
///
/// Names render as `{prefix}_{worker}_{sequence}`. Every worker only ever creates names with its
/// own index, so the name spaces of two workers never overlap and backends need no per-object
/// locking.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectName {
    prefix: Arc<str>,
    worker: usize,
    sequence: usize,
}

impl ObjectName {
    /// Creates the name of object `sequence` written by `worker`.
    pub fn new(prefix: impl Into<Arc<str>>, worker: usize, sequence: usize) -> Self {
        Self {
            prefix: prefix.into(),
            worker,
            sequence,
        }
    }

    /// The run-wide name prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Index of the worker owning this object.
    pub fn worker(&self) -> usize {
        self.worker
    }

    /// Position of this object in its worker's operation loop.
    pub fn sequence(&self) -> usize {
        self.sequence
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.prefix, self.worker, self.sequence)
    }
}
