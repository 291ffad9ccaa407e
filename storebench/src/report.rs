//! The outcome of a run and its human-readable summary.

use bytesize::ByteSize;
use yansi::Paint;

use crate::error::WorkerError;
use crate::run_config::Operation;
use crate::worker::WorkerResult;

/// Results of all workers of one run.
#[derive(Debug)]
pub struct RunReport {
    /// The operation performed by all workers.
    pub operation: Operation,
    /// The size of every object in bytes.
    pub object_size: usize,
    /// The number of objects per worker.
    pub object_count: usize,
    /// The number of workers that were started.
    pub workers: usize,
    /// Results of the workers that completed their loop, ordered by worker index.
    pub results: Vec<WorkerResult>,
    /// Errors of the workers that aborted their loop, ordered by worker index.
    pub failures: Vec<WorkerError>,
    /// Number of workers that panicked and produced no outcome at all.
    pub lost: usize,
}

impl RunReport {
    /// The unweighted arithmetic mean of the rates of all successful workers.
    ///
    /// Returns `None` if no worker completed its loop.
    pub fn mean_bytes_per_second(&self) -> Option<f64> {
        if self.results.is_empty() {
            return None;
        }

        let total: f64 = self.results.iter().map(|r| r.bytes_per_second).sum();
        Some(total / self.results.len() as f64)
    }

    /// The number of bytes transferred by all successful workers.
    pub fn total_bytes(&self) -> u64 {
        self.results.iter().map(|r| r.bytes).sum()
    }

    /// Prints the summary of this run to stdout.
    pub fn print(&self) {
        println!();
        println!(
            "{} {} (object size: {}, objects per worker: {}, workers: {})",
            "## Benchmark".bold(),
            self.operation.bold().blue(),
            ByteSize::b(self.object_size as u64),
            self.object_count,
            self.workers.bold()
        );

        for result in &self.results {
            print!(
                "  worker {}: {} objects in {:.2?}, {}/s",
                result.worker,
                result.objects,
                result.elapsed,
                ByteSize::b(result.bytes_per_second as u64).bold()
            );
            if result.short_reads > 0 {
                print!(
                    ", {}",
                    format!("{} SIZE MISMATCHES", result.short_reads)
                        .bold()
                        .yellow()
                );
            }
            println!();
        }

        for failure in &self.failures {
            println!(
                "  worker {}: {} on `{}`: {}",
                failure.worker,
                "FAILED".bold().red(),
                failure.object,
                failure.cause
            );
        }
        if self.lost > 0 {
            println!("  {}", format!("{} WORKERS LOST", self.lost).bold().red());
        }

        match self.mean_bytes_per_second() {
            Some(mean) => println!(
                "{} {}/s ({} of {} workers, {} total)",
                "AVERAGE:".bold().green(),
                ByteSize::b(mean as u64).bold(),
                self.results.len(),
                self.workers,
                ByteSize::b(self.total_bytes())
            ),
            None => println!("{}", "NO WORKER COMPLETED".bold().red()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn result(worker: usize, bytes_per_second: f64) -> WorkerResult {
        WorkerResult {
            worker,
            operation: Operation::Write,
            objects: 10,
            bytes: 40960,
            elapsed: Duration::from_millis(100),
            bytes_per_second,
            short_reads: 0,
        }
    }

    fn report(results: Vec<WorkerResult>) -> RunReport {
        RunReport {
            operation: Operation::Write,
            object_size: 4096,
            object_count: 10,
            workers: 3,
            results,
            failures: vec![],
            lost: 0,
        }
    }

    #[test]
    fn mean_is_unweighted() {
        let report = report(vec![result(0, 100.0), result(1, 200.0), result(2, 600.0)]);

        assert_eq!(report.mean_bytes_per_second(), Some(300.0));
        assert_eq!(report.total_bytes(), 3 * 40960);
    }

    #[test]
    fn mean_requires_a_successful_worker() {
        let report = report(vec![]);

        assert_eq!(report.mean_bytes_per_second(), None);
        assert_eq!(report.total_bytes(), 0);
        report.print();
    }
}
