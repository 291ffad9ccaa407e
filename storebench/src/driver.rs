//! Fans a run out to concurrent workers and aggregates their rates.

use std::error::Error;
use std::sync::Arc;

use storebench_backend::{Backend, create_backend};
use tokio::sync::mpsc;

use crate::error::RunError;
use crate::report::RunReport;
use crate::run_config::{Operation, RunConfig};
use crate::worker::Worker;
use crate::workload::Payload;

/// Creates the configured backend and runs the benchmark against it.
///
/// Backend setup errors are fatal and returned before any worker starts.
pub async fn run(config: &RunConfig) -> Result<RunReport, RunError> {
    let backend = create_backend(config.backend_config())
        .await
        .map_err(RunError::Setup)?;

    tracing::info!(
        backend = backend.name(),
        location = %config.location(),
        "Storage backend ready"
    );

    run_with_backend(config, Arc::from(backend)).await
}

/// Runs the benchmark against an existing backend.
///
/// Spawns exactly [`RunConfig::workers`] tasks. Worker `i` owns the name space
/// `{prefix}_{i}_*` and runs its whole share of operations sequentially. Every worker sends
/// exactly one outcome message; the report is assembled only after all of them arrived and all
/// tasks were joined. Failed workers are logged and excluded from the mean rate.
pub async fn run_with_backend(
    config: &RunConfig,
    backend: Arc<dyn Backend>,
) -> Result<RunReport, RunError> {
    let operation = config.operation();
    let payload = match operation {
        Operation::Write => Some(Payload::generate(config.object_size())?),
        Operation::Read => None,
    };

    let workers = config.workers();
    let (tx, mut rx) = mpsc::channel(workers);

    tracing::info!(
        %operation,
        workers,
        object_size = config.object_size(),
        object_count = config.object_count(),
        "Starting benchmark"
    );

    let tasks: Vec<_> = (0..workers)
        .map(|index| {
            let worker = Worker::new(index, Arc::clone(&backend), Arc::clone(config.prefix()))
                .with_timeout(config.operation_timeout());
            let payload = payload.clone();
            let size = config.object_size();
            let count = config.object_count();
            let validation = config.read_validation();
            let tx = tx.clone();

            tokio::spawn(async move {
                let outcome = match payload {
                    Some(payload) => worker.run_write_loop(&payload, count).await,
                    None => worker.run_read_loop(size, validation, count).await,
                };
                // The receiver outlives all workers.
                tx.send(outcome).await.ok();
            })
        })
        .collect();
    drop(tx);

    let mut results = Vec::with_capacity(workers);
    let mut failures = Vec::new();
    while let Some(outcome) = rx.recv().await {
        match outcome {
            Ok(result) => results.push(result),
            Err(err) => {
                tracing::error!(
                    error = &err as &dyn Error,
                    worker = err.worker,
                    object = %err.object,
                    "Worker aborted"
                );
                failures.push(err);
            }
        }
    }

    let mut lost = 0;
    for joined in futures::future::join_all(tasks).await {
        if let Err(err) = joined {
            tracing::error!(error = &err as &dyn Error, "Worker task panicked");
            lost += 1;
        }
    }

    results.sort_by_key(|result| result.worker);
    failures.sort_by_key(|failure| failure.worker);

    let report = RunReport {
        operation,
        object_size: config.object_size(),
        object_count: config.object_count(),
        workers,
        results,
        failures,
        lost,
    };

    match report.mean_bytes_per_second() {
        Some(mean) => tracing::info!(
            succeeded = report.results.len(),
            failed = report.failures.len() + report.lost,
            "average {operation} rate: {:.2} KiB/s",
            mean / 1024.0
        ),
        None => tracing::error!("No worker completed its {operation} loop"),
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use storebench_backend::{BackendError, BackendResult, InMemoryBackend, ObjectName};

    use super::*;
    use crate::error::OperationError;
    use crate::run_config::{ReadValidation, StorageTarget};

    fn config(operation: Operation, workers: usize, size: usize, count: usize) -> RunConfig {
        RunConfig::builder(
            StorageTarget::FileSystem {
                path: "/nonexistent".into(),
            },
            "bench",
        )
        .operation(operation)
        .workers(workers)
        .object_size(size)
        .object_count(count)
        .build()
        .unwrap()
    }

    /// Sleeps for a per-worker delay on every call and records the peak number of calls in
    /// flight. Workers listed in `failing` fail every call.
    #[derive(Debug, Default)]
    struct Scripted {
        delays: HashMap<usize, Duration>,
        failing: Vec<usize>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: Mutex<Vec<String>>,
    }

    impl Scripted {
        async fn call(&self, name: &ObjectName) -> BackendResult<()> {
            self.calls.lock().unwrap().push(name.to_string());
            if self.failing.contains(&name.worker()) {
                return Err(BackendError::Io(std::io::Error::other("permission denied")));
            }

            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(current, Ordering::SeqCst);
            if let Some(delay) = self.delays.get(&name.worker()) {
                tokio::time::sleep(*delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl Backend for Scripted {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn put_object(&self, name: &ObjectName, _payload: &[u8]) -> BackendResult<()> {
            self.call(name).await
        }

        async fn get_object(&self, name: &ObjectName, buffer: &mut [u8]) -> BackendResult<usize> {
            self.call(name).await?;
            Ok(buffer.len())
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= expected * 1e-2,
            "{actual} is not close to {expected}"
        );
    }

    #[tokio::test]
    async fn writes_every_object_once() {
        let backend = InMemoryBackend::new();
        let config = config(Operation::Write, 3, 512, 7);

        let report = run_with_backend(&config, Arc::new(backend.clone()))
            .await
            .unwrap();

        assert_eq!(report.results.len(), 3);
        assert!(report.failures.is_empty());
        assert_eq!(report.total_bytes(), 3 * 7 * 512);
        assert_eq!(backend.len(), 21);
        for name in backend.names() {
            assert_eq!(backend.get_stored(&name).unwrap().len(), 512);
        }
    }

    #[tokio::test]
    async fn reads_back_written_objects() {
        let backend = InMemoryBackend::new();
        let written = run_with_backend(
            &config(Operation::Write, 2, 256, 5),
            Arc::new(backend.clone()),
        )
        .await
        .unwrap();
        assert_eq!(written.results.len(), 2);

        let read = run_with_backend(
            &config(Operation::Read, 2, 256, 5),
            Arc::new(backend.clone()),
        )
        .await
        .unwrap();

        assert_eq!(read.operation, Operation::Read);
        assert_eq!(read.results.len(), 2);
        assert!(read.results.iter().all(|r| r.short_reads == 0));
    }

    #[tokio::test]
    async fn reads_without_writes_fail_every_worker() {
        let report = run_with_backend(
            &config(Operation::Read, 2, 256, 5),
            Arc::new(InMemoryBackend::new()),
        )
        .await
        .unwrap();

        assert!(report.results.is_empty());
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.mean_bytes_per_second(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn reports_mean_of_worker_rates() {
        // 6 KiB objects: 60ms, 30ms and 20ms per call are 100, 200 and 300 KiB/s.
        let backend = Scripted {
            delays: [
                (0, Duration::from_millis(60)),
                (1, Duration::from_millis(30)),
                (2, Duration::from_millis(20)),
            ]
            .into(),
            ..Default::default()
        };
        let config = config(Operation::Write, 3, 6 * 1024, 5);

        let report = run_with_backend(&config, Arc::new(backend)).await.unwrap();

        let rates: Vec<_> = report.results.iter().map(|r| r.bytes_per_second).collect();
        assert_eq!(rates.len(), 3);
        assert_close(rates[0], 100.0 * 1024.0);
        assert_close(rates[1], 200.0 * 1024.0);
        assert_close(rates[2], 300.0 * 1024.0);
        assert_close(report.mean_bytes_per_second().unwrap(), 200.0 * 1024.0);
    }

    #[tokio::test(start_paused = true)]
    async fn tolerates_failing_worker() {
        let backend = Arc::new(Scripted {
            delays: [
                (0, Duration::from_millis(10)),
                (1, Duration::from_millis(10)),
                (2, Duration::from_millis(40)),
            ]
            .into(),
            failing: vec![1],
            ..Default::default()
        });
        let config = config(Operation::Write, 3, 1024, 4);

        let report = run_with_backend(&config, backend.clone()).await.unwrap();

        assert_eq!(report.results.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.lost, 0);

        let failure = &report.failures[0];
        assert_eq!(failure.worker, 1);
        assert_eq!(failure.object.to_string(), "bench_1_0");
        assert!(matches!(failure.cause, OperationError::Backend(_)));

        // The failing worker gave up after its first call.
        let calls = backend.calls.lock().unwrap();
        assert_eq!(calls.iter().filter(|c| c.starts_with("bench_1_")).count(), 1);

        let expected =
            (report.results[0].bytes_per_second + report.results[1].bytes_per_second) / 2.0;
        assert_close(report.mean_bytes_per_second().unwrap(), expected);
        assert_close(expected, (100.0 * 1024.0 + 25.0 * 1024.0) / 2.0);
    }

    #[tokio::test(start_paused = true)]
    async fn runs_workers_concurrently() {
        let workers = 8;
        let backend = Arc::new(Scripted {
            delays: (0..workers)
                .map(|worker| (worker, Duration::from_millis(5)))
                .collect(),
            ..Default::default()
        });
        let config = config(Operation::Read, workers, 128, 3);

        let report = run_with_backend(&config, backend.clone()).await.unwrap();

        assert_eq!(report.results.len(), workers);
        assert_eq!(backend.peak.load(Ordering::SeqCst), workers);
    }

    #[tokio::test]
    async fn name_spaces_are_disjoint() {
        let backend = Arc::new(Scripted::default());
        let config = config(Operation::Write, 4, 64, 25);

        run_with_backend(&config, backend.clone()).await.unwrap();

        let calls = backend.calls.lock().unwrap();
        assert_eq!(calls.len(), 100);
        for worker in 0..4 {
            let own = calls
                .iter()
                .filter(|c| c.starts_with(&format!("bench_{worker}_")))
                .count();
            assert_eq!(own, 25);
        }
        let mut unique = calls.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 100);
    }

    #[tokio::test]
    async fn strict_reads_fail_on_size_mismatch() {
        let backend = InMemoryBackend::new();
        for sequence in 0..3 {
            backend.insert(&format!("bench_0_{sequence}"), vec![b'a'; 100]);
        }
        let config = RunConfig::builder(
            StorageTarget::FileSystem {
                path: "/nonexistent".into(),
            },
            "bench",
        )
        .operation(Operation::Read)
        .workers(1)
        .object_size(128)
        .object_count(3)
        .read_validation(ReadValidation::Strict)
        .build()
        .unwrap();

        let report = run_with_backend(&config, Arc::new(backend)).await.unwrap();

        assert!(report.results.is_empty());
        assert!(matches!(
            report.failures[0].cause,
            OperationError::ShortRead {
                expected: 128,
                actual: 100
            }
        ));
    }
}
