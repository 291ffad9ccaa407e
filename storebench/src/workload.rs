//! The synthetic payload written by every worker of a run.

use bytes::Bytes;
use rand::distr::Alphanumeric;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::error::PayloadError;

/// Randomized, immutable contents of every object written in a run.
///
/// The payload is generated once and shared read-only by all workers. Cloning only bumps a
/// reference count. The content consists of ASCII alphanumerics, which is enough to defeat
/// trivial compression and deduplication in the storage layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    bytes: Bytes,
}

impl Payload {
    /// Generates a payload of `size` bytes from an RNG seeded by the operating system.
    ///
    /// Fails only if the system entropy source cannot be read.
    pub fn generate(size: usize) -> Result<Self, PayloadError> {
        let mut rng = SmallRng::try_from_os_rng().map_err(|cause| PayloadError {
            cause: Box::new(cause),
        })?;
        Ok(Self::from_rng(size, &mut rng))
    }

    /// Generates a payload of `size` bytes from the given RNG.
    pub fn from_rng<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Self {
        let bytes: Vec<u8> = rng.sample_iter(Alphanumeric).take(size).collect();
        Self {
            bytes: bytes.into(),
        }
    }

    /// The length of the payload in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl AsRef<[u8]> for Payload {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}
