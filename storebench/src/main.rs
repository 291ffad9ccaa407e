//! This is a throughput benchmark binary for filesystems and S3-compatible stores.
//!
//! See the [`storebench`] library for how runs are executed and measured.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

fn main() -> anyhow::Result<()> {
    storebench::cli::execute()
}
