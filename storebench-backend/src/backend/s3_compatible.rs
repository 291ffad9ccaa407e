use std::fmt;

use futures_util::StreamExt;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::{Bucket, Region};

use super::common::Backend;
use crate::error::{BackendError, BackendResult};
use crate::name::ObjectName;

const NOT_FOUND: u16 = 404;

/// Connection settings for [`S3Compatible`].
#[derive(Clone)]
pub struct S3CompatibleConfig<'a> {
    /// Region name sent in request signatures.
    pub region: &'a str,
    /// Store endpoint. Endpoints without a scheme are contacted over plain `http://`.
    pub endpoint: &'a str,
    /// Name of the bucket holding the benchmark objects.
    pub bucket: &'a str,
    /// Static access key.
    pub access_key: &'a str,
    /// Static secret key.
    pub secret_key: &'a str,
}

impl fmt::Debug for S3CompatibleConfig<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3CompatibleConfig")
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .field("access_key", &self.access_key)
            .finish_non_exhaustive()
    }
}

/// Stores every object as one key of an S3-compatible bucket.
///
/// The client uses path-style addressing and static credentials. It is tuned for benchmarking:
/// endpoints default to plain HTTP, and uploads are sent without an `Expect: 100-continue`
/// handshake. Do not reuse this client setup for anything else.
pub struct S3Compatible {
    bucket: Box<Bucket>,
}

impl S3Compatible {
    /// Creates a new backend bound to the configured bucket.
    ///
    /// This only builds the client. The bucket is not contacted until the first operation.
    pub fn new(config: S3CompatibleConfig<'_>) -> BackendResult<Self> {
        let credentials = Credentials::new(
            Some(config.access_key),
            Some(config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|cause| BackendError::Generic {
            context: "invalid S3 credentials".to_owned(),
            cause: Box::new(cause),
        })?;

        let region = Region::Custom {
            region: config.region.to_owned(),
            endpoint: plain_http_endpoint(config.endpoint),
        };

        let bucket = Bucket::new(config.bucket, region, credentials)
            .map_err(|cause| BackendError::s3("failed to create S3 client", cause))?
            .with_path_style();

        Ok(Self { bucket })
    }
}

impl fmt::Debug for S3Compatible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Compatible")
            .field("bucket", &self.bucket.name())
            .field("endpoint", &self.bucket.host())
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl Backend for S3Compatible {
    fn name(&self) -> &'static str {
        "s3-compatible"
    }

    #[tracing::instrument(level = "trace", fields(%name), skip_all)]
    async fn put_object(&self, name: &ObjectName, payload: &[u8]) -> BackendResult<()> {
        let response = self
            .bucket
            .put_object(name.to_string(), payload)
            .await
            .map_err(|cause| BackendError::s3(format!("failed to put `{name}`"), cause))?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            return Err(BackendError::Status {
                context: format!("failed to put `{name}`"),
                status,
            });
        }

        Ok(())
    }

    #[tracing::instrument(level = "trace", fields(%name), skip_all)]
    async fn get_object(&self, name: &ObjectName, buffer: &mut [u8]) -> BackendResult<usize> {
        let mut response = match self.bucket.get_object_stream(name.to_string()).await {
            Ok(response) => response,
            Err(S3Error::HttpFailWithBody(NOT_FOUND, _)) => {
                return Err(BackendError::NotFound {
                    name: name.to_string(),
                });
            }
            Err(cause) => {
                return Err(BackendError::s3(format!("failed to get `{name}`"), cause));
            }
        };

        match response.status_code {
            NOT_FOUND => {
                return Err(BackendError::NotFound {
                    name: name.to_string(),
                });
            }
            200..300 => (),
            status => {
                return Err(BackendError::Status {
                    context: format!("failed to get `{name}`"),
                    status,
                });
            }
        }

        let mut total = 0;
        let stream = response.bytes();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|cause| {
                BackendError::s3(format!("failed to read body of `{name}`"), cause)
            })?;
            total += drain_into(buffer, total, &chunk);
        }

        Ok(total)
    }
}

/// Prefixes scheme-less endpoints with `http://`, since the benchmark runs without TLS.
fn plain_http_endpoint(endpoint: &str) -> String {
    if endpoint.contains("://") {
        endpoint.to_owned()
    } else {
        format!("http://{endpoint}")
    }
}

/// Copies `chunk` into `buffer` at `offset`, returning the length of the chunk.
///
/// Bytes past the end of the buffer are dropped but still counted, so oversized objects show up
/// as a size mismatch.
fn drain_into(buffer: &mut [u8], offset: usize, chunk: &[u8]) -> usize {
    if offset < buffer.len() {
        let copy = chunk.len().min(buffer.len() - offset);
        buffer[offset..offset + copy].copy_from_slice(&chunk[..copy]);
    }
    chunk.len()
}
