//! This is a throughput benchmark for storage backends.
//!
//! A run spawns a fixed number of concurrent workers. Every worker writes or reads its own
//! share of equally sized objects against a [`Backend`](storebench_backend::Backend), timing its
//! whole loop. The driver waits for all workers, then reports every worker's rate and the
//! unweighted mean of all successful workers.
//!
//! Writes reuse a single [`Payload`] generated once per run, so generating content never shows
//! up in the measurement. Reads expect the objects of an earlier write run with the same prefix.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod observability;
pub mod report;
pub mod run_config;
pub mod worker;
pub mod workload;

pub use crate::driver::{run, run_with_backend};
pub use crate::report::RunReport;
pub use crate::run_config::{Operation, ReadValidation, RunConfig, StorageTarget};
pub use crate::workload::Payload;
