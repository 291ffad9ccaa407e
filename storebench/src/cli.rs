//! Command line entry point of the benchmark binary.

use std::path::PathBuf;

use anyhow::{Context, Result};
use argh::FromArgs;
use bytesize::ByteSize;

use crate::config::{Config, Overrides, StorageOverrides};
use crate::run_config::Operation;
use crate::{driver, observability};

/// Measures sustained write or read throughput of a filesystem or an S3-compatible store.
///
/// Flags override values from the configuration file and `SB__` environment variables.
#[derive(Debug, FromArgs)]
struct Args {
    /// path to the YAML configuration file
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// operation to benchmark: `write` or `read`
    #[argh(option)]
    operation: Option<Operation>,

    /// size of every object, e.g. `4KiB`
    #[argh(option)]
    object_size: Option<ByteSize>,

    /// number of objects per worker
    #[argh(option)]
    object_count: Option<usize>,

    /// number of concurrent workers
    #[argh(option)]
    workers: Option<usize>,

    /// prefix of all object names
    #[argh(option)]
    prefix: Option<String>,

    /// directory of the filesystem storage
    #[argh(option)]
    path: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            operation: self.operation,
            object_size: self.object_size,
            object_count: self.object_count,
            workers: self.workers,
            prefix: self.prefix.clone(),
            storage: self
                .path
                .clone()
                .map(|path| StorageOverrides { path }),
        }
    }
}

/// Bootstrap the runtime and run the benchmark.
pub fn execute() -> Result<()> {
    let args: Args = argh::from_env();

    let config = Config::load(args.config.as_deref(), &args.overrides())?;
    let run_config = config
        .run_config()
        .context("invalid benchmark configuration")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("bench-rt")
        .enable_all()
        .worker_threads(config.worker_threads())
        .build()?;
    let _runtime_guard = runtime.enter();

    observability::init_tracing(&config.logging);
    tracing::debug!(?config);

    let report = runtime
        .block_on(driver::run(&run_config))
        .context("benchmark aborted")?;
    report.print();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags_into_overrides() {
        let args = Args::from_args(
            &["storebench"],
            &[
                "--operation",
                "write",
                "--object-size",
                "4KiB",
                "--workers",
                "4",
                "--path",
                "/mnt/juicefs-rados",
            ],
        )
        .unwrap();

        let overrides = args.overrides();
        assert_eq!(overrides.operation, Some(Operation::Write));
        assert_eq!(overrides.object_size, Some(ByteSize::kib(4)));
        assert_eq!(overrides.workers, Some(4));
        assert_eq!(overrides.object_count, None);
        assert_eq!(
            overrides.storage.unwrap().path,
            PathBuf::from("/mnt/juicefs-rados")
        );
    }

    #[test]
    fn rejects_unknown_operation() {
        let result = Args::from_args(&["storebench"], &["--operation", "delete"]);
        assert!(result.is_err());
    }
}
