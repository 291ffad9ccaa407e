//! Configuration for the benchmark binary.
//!
//! Configuration can be loaded from multiple sources with the following precedence (highest to
//! lowest):
//!
//! 1. Command line flags
//! 2. Environment variables (prefixed with `SB__`)
//! 3. YAML configuration file (specified via `-c` or `--config` flag)
//! 4. Defaults
//!
//! # Environment Variables
//!
//! Environment variables use `SB__` as a prefix and double underscores (`__`) to denote nested
//! configuration structures. For example:
//!
//! - `SB__OPERATION=write` benchmarks writes
//! - `SB__STORAGE__TYPE=s3compatible` selects the S3-compatible backend
//! - `SB__STORAGE__BUCKET=bench` sets the bucket name
//!
//! # YAML Configuration File
//!
//! ```yaml
//! operation: write
//! object_size: 4KiB
//! object_count: 2000
//! workers: 4
//! prefix: juicefs-test-4thread-4KB
//!
//! storage:
//!   type: filesystem
//!   path: /mnt/juicefs-rados
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use bytesize::ByteSize;
use figment::providers::{Env, Format, Serialized, Yaml};
use secrecy::{CloneableSecret, ExposeSecret, SecretBox, SerializableSecret, zeroize::Zeroize};
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

use crate::error::ConfigError;
use crate::run_config::{Operation, ReadValidation, RunConfig, StorageTarget};

/// Environment variable prefix for all configuration options.
const ENV_PREFIX: &str = "SB__";

/// Newtype around `String` that may protect against accidental logging of secrets in our
/// configuration struct. Use with [`secrecy::SecretBox`].
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConfigSecret(String);

impl ConfigSecret {
    /// Returns the secret value.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for ConfigSecret {
    fn from(str: &str) -> Self {
        ConfigSecret(str.to_string())
    }
}

impl fmt::Debug for ConfigSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "[redacted]")
    }
}

impl CloneableSecret for ConfigSecret {}
impl SerializableSecret for ConfigSecret {}
impl Zeroize for ConfigSecret {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

fn default_region() -> String {
    "us-east-1".to_owned()
}

/// Storage backend configuration.
///
/// The `type` field in YAML or `__TYPE` in environment variables determines which variant is used.
#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Storage {
    /// Local or mounted filesystem (type `"filesystem"`).
    ///
    /// ```yaml
    /// storage:
    ///   type: filesystem
    ///   path: /tmp/bench
    /// ```
    FileSystem {
        /// Directory holding the objects. Created including missing parents.
        path: PathBuf,
    },

    /// S3-compatible object store (type `"s3compatible"`).
    ///
    /// The bucket must exist. Endpoints without a scheme are contacted over plain HTTP.
    ///
    /// ```yaml
    /// storage:
    ///   type: s3compatible
    ///   endpoint: ceph-rgw:7480
    ///   bucket: mlpipeline-test
    ///   access_key: ...
    ///   secret_key: ...
    /// ```
    S3Compatible {
        /// Region name used for request signing. Defaults to `us-east-1`.
        #[serde(default = "default_region")]
        region: String,
        /// Store endpoint, e.g. `http://localhost:9000`.
        endpoint: String,
        /// Name of the bucket.
        bucket: String,
        /// Static access key.
        access_key: String,
        /// Static secret key.
        secret_key: SecretBox<ConfigSecret>,
    },
}

/// Runtime configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Runtime {
    /// Number of runtime worker threads.
    ///
    /// Defaults to the number of benchmark workers, giving every worker its own thread.
    ///
    /// # Environment Variable
    ///
    /// `SB__RUNTIME__WORKER_THREADS`
    pub worker_threads: Option<usize>,
}

/// The log format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Pretty printing for terminals, simplified output otherwise.
    #[default]
    Auto,
    /// Multi-line, colored output.
    Pretty,
    /// Single-line output without colors.
    Simplified,
    /// JSON lines.
    Json,
}

/// Logging configuration.
///
/// Logs are always written to stderr.
#[derive(Debug, Deserialize, Serialize)]
pub struct Logging {
    /// Minimum log level. The `RUST_LOG` environment variable takes precedence if set.
    ///
    /// # Environment Variable
    ///
    /// `SB__LOGGING__LEVEL`
    #[serde(with = "display_fromstr")]
    pub level: LevelFilter,

    /// Log output format.
    ///
    /// # Environment Variable
    ///
    /// `SB__LOGGING__FORMAT`
    pub format: LogFormat,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
            format: LogFormat::Auto,
        }
    }
}

mod display_fromstr {
    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
        T: std::fmt::Display,
    {
        serializer.collect_str(&value)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        D: serde::Deserializer<'de>,
        T: std::str::FromStr,
        <T as std::str::FromStr>::Err: std::fmt::Display,
    {
        use serde::Deserialize;
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Main configuration of the benchmark.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// The storage backend to benchmark.
    ///
    /// # Default
    ///
    /// Filesystem storage in `/tmp`
    pub storage: Storage,

    /// The operation to benchmark, `write` or `read`.
    ///
    /// A read run expects the objects of an earlier write run with the same prefix, object count
    /// and worker count.
    ///
    /// # Default
    ///
    /// `read`
    pub operation: Operation,

    /// The size of every object.
    ///
    /// # Default
    ///
    /// `4 KiB`
    pub object_size: ByteSize,

    /// Number of objects each worker writes or reads.
    ///
    /// # Default
    ///
    /// `3000`
    pub object_count: usize,

    /// Number of concurrent workers.
    ///
    /// # Default
    ///
    /// `2`
    pub workers: usize,

    /// Prefix of all object names. Required.
    pub prefix: String,

    /// Treatment of reads returning an unexpected number of bytes.
    ///
    /// # Default
    ///
    /// `relaxed`
    pub read_validation: ReadValidation,

    /// Deadline for every individual backend call, e.g. `30s`.
    ///
    /// # Default
    ///
    /// No deadline
    #[serde(default, with = "humantime_serde")]
    pub operation_timeout: Option<Duration>,

    /// Configuration of the async runtime.
    pub runtime: Runtime,

    /// Logging configuration.
    pub logging: Logging,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: Storage::FileSystem {
                path: PathBuf::from("/tmp"),
            },
            operation: Operation::Read,
            object_size: ByteSize::kib(4),
            object_count: 3000,
            workers: 2,
            prefix: String::new(),
            read_validation: ReadValidation::Relaxed,
            operation_timeout: None,
            runtime: Runtime::default(),
            logging: Logging::default(),
        }
    }
}

/// Values passed on the command line, overriding every other source.
#[derive(Debug, Default, Serialize)]
pub struct Overrides {
    /// Overrides [`Config::operation`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<Operation>,
    /// Overrides [`Config::object_size`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_size: Option<ByteSize>,
    /// Overrides [`Config::object_count`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_count: Option<usize>,
    /// Overrides [`Config::workers`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    /// Overrides [`Config::prefix`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    /// Overrides the directory of the filesystem storage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageOverrides>,
}

/// Storage values passed on the command line.
#[derive(Debug, Serialize)]
pub struct StorageOverrides {
    /// Directory of the filesystem storage.
    pub path: PathBuf,
}

impl Config {
    /// Loads configuration from all sources.
    ///
    /// Configuration is merged in the following order (later sources override earlier ones):
    /// 1. Default values
    /// 2. YAML configuration file (if `path` is given)
    /// 3. Environment variables (prefixed with `SB__`)
    /// 4. Command line `overrides`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The YAML configuration file cannot be read or parsed
    /// - Environment variables contain invalid values
    /// - Required fields are missing or invalid
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let mut figment = figment::Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(Serialized::defaults(overrides))
            .extract()?;

        Ok(config)
    }

    /// Validates the configuration and resolves it into the settings of one run.
    pub fn run_config(&self) -> Result<RunConfig, ConfigError> {
        let storage = match &self.storage {
            Storage::FileSystem { path } => StorageTarget::FileSystem { path: path.clone() },
            Storage::S3Compatible {
                region,
                endpoint,
                bucket,
                access_key,
                secret_key,
            } => StorageTarget::S3Compatible {
                region: region.clone(),
                endpoint: endpoint.clone(),
                bucket: bucket.clone(),
                access_key: access_key.clone(),
                secret_key: secret_key.expose_secret().as_str().into(),
            },
        };

        let object_size = usize::try_from(self.object_size.as_u64())
            .map_err(|_| ConfigError::ObjectSizeTooLarge(self.object_size.as_u64()))?;

        RunConfig::builder(storage, self.prefix.as_str())
            .operation(self.operation)
            .object_size(object_size)
            .object_count(self.object_count)
            .workers(self.workers)
            .read_validation(self.read_validation)
            .operation_timeout(self.operation_timeout)
            .build()
    }

    /// The number of runtime worker threads to start.
    pub fn worker_threads(&self) -> usize {
        self.runtime
            .worker_threads
            .unwrap_or(self.workers)
            .max(1)
    }
}
