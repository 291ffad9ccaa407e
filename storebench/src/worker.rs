//! A single benchmark worker and its sequential operation loops.

use std::sync::Arc;
use std::time::Duration;

use bytesize::ByteSize;
use storebench_backend::{Backend, BackendResult, ObjectName};
use tokio::time::Instant;

use crate::error::{OperationError, WorkerError};
use crate::run_config::{Operation, ReadValidation};
use crate::workload::Payload;

/// Lower bound for the elapsed time of a loop, keeping rates finite.
const MIN_ELAPSED_SECS: f64 = 1e-9;

/// The measurement of one worker that completed its whole loop.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkerResult {
    /// Index of the worker.
    pub worker: usize,
    /// The operation performed.
    pub operation: Operation,
    /// Number of completed operations.
    pub objects: usize,
    /// Bytes transferred, assuming every object has the configured size.
    pub bytes: u64,
    /// Wall-clock time of the whole loop.
    pub elapsed: Duration,
    /// Throughput over the whole loop.
    pub bytes_per_second: f64,
    /// Reads that returned a different number of bytes than expected.
    pub short_reads: usize,
}

/// Computes the throughput of a loop that transferred `bytes` in `elapsed`.
pub fn rate(bytes: u64, elapsed: Duration) -> f64 {
    bytes as f64 / elapsed.as_secs_f64().max(MIN_ELAPSED_SECS)
}

/// One concurrent execution unit of a run.
///
/// A worker only addresses objects named `{prefix}_{index}_{sequence}`, so no two workers ever
/// touch the same object.
#[derive(Debug)]
pub struct Worker {
    index: usize,
    backend: Arc<dyn Backend>,
    prefix: Arc<str>,
    timeout: Option<Duration>,
}

impl Worker {
    /// Creates worker `index` operating against `backend`.
    pub fn new(index: usize, backend: Arc<dyn Backend>, prefix: Arc<str>) -> Self {
        Self {
            index,
            backend,
            prefix,
            timeout: None,
        }
    }

    /// Bounds every individual backend call by `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The index of this worker.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The name of object `sequence` of this worker.
    pub fn object_name(&self, sequence: usize) -> ObjectName {
        ObjectName::new(self.prefix.clone(), self.index, sequence)
    }

    /// Writes `count` objects with the shared payload, one after another.
    ///
    /// Aborts on the first failing write.
    pub async fn run_write_loop(
        &self,
        payload: &Payload,
        count: usize,
    ) -> Result<WorkerResult, WorkerError> {
        let start = Instant::now();
        for sequence in 0..count {
            let name = self.object_name(sequence);
            let put = self.backend.put_object(&name, payload.as_ref());
            self.call(&name, put).await?;
        }
        let elapsed = start.elapsed();

        Ok(self.finish(Operation::Write, payload.len(), count, elapsed, 0))
    }

    /// Reads `count` objects of `size` bytes into a single reused buffer, one after another.
    ///
    /// Aborts on the first failing read. Size mismatches abort only under
    /// [`ReadValidation::Strict`]; otherwise they are logged and counted.
    pub async fn run_read_loop(
        &self,
        size: usize,
        validation: ReadValidation,
        count: usize,
    ) -> Result<WorkerResult, WorkerError> {
        let mut buffer = vec![0; size];
        let mut short_reads = 0;

        let start = Instant::now();
        for sequence in 0..count {
            let name = self.object_name(sequence);
            let get = self.backend.get_object(&name, &mut buffer);
            let read = self.call(&name, get).await?;

            if read != size {
                match validation {
                    ReadValidation::Relaxed => {
                        tracing::warn!(
                            worker = self.index,
                            object = %name,
                            expected = size,
                            actual = read,
                            "Object size does not match"
                        );
                        short_reads += 1;
                    }
                    ReadValidation::Strict => {
                        return Err(WorkerError {
                            worker: self.index,
                            object: name,
                            cause: OperationError::ShortRead {
                                expected: size,
                                actual: read,
                            },
                        });
                    }
                }
            }
        }
        let elapsed = start.elapsed();

        Ok(self.finish(Operation::Read, size, count, elapsed, short_reads))
    }

    async fn call<T>(
        &self,
        name: &ObjectName,
        operation: impl Future<Output = BackendResult<T>>,
    ) -> Result<T, WorkerError> {
        let result = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, operation).await {
                Ok(result) => result.map_err(OperationError::from),
                Err(_) => Err(OperationError::Timeout(timeout)),
            },
            None => operation.await.map_err(OperationError::from),
        };

        result.map_err(|cause| WorkerError {
            worker: self.index,
            object: name.clone(),
            cause,
        })
    }

    fn finish(
        &self,
        operation: Operation,
        size: usize,
        count: usize,
        elapsed: Duration,
        short_reads: usize,
    ) -> WorkerResult {
        let bytes = (size as u64) * (count as u64);
        let bytes_per_second = rate(bytes, elapsed);

        tracing::info!(
            worker = self.index,
            object_size = %ByteSize::b(size as u64),
            object_count = count,
            ?elapsed,
            "{operation} rate: {:.2} KiB/s",
            bytes_per_second / 1024.0,
        );

        WorkerResult {
            worker: self.index,
            operation,
            objects: count,
            bytes,
            elapsed,
            bytes_per_second,
            short_reads,
        }
    }
}
