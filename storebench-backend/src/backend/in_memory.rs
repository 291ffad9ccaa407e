//! In-memory backend for tests.
//!
//! This provides a [`Backend`] backed by a `HashMap`, standing in for an object store in tests of
//! the layers above. The backend is [`Clone`] so tests can hold a handle for direct inspection
//! while the driver owns another copy.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bytes::Bytes;

use super::common::Backend;
use crate::error::{BackendError, BackendResult};
use crate::name::ObjectName;

type Store = HashMap<String, Bytes>;

/// A [`Backend`] keeping all objects in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    store: Arc<Mutex<Store>>,
}

impl InMemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a clone of the stored bytes, if present.
    pub fn get_stored(&self, name: &str) -> Option<Bytes> {
        self.store.lock().unwrap().get(name).cloned()
    }

    /// Stores an object directly, bypassing the `Backend` trait.
    pub fn insert(&self, name: &str, contents: impl Into<Bytes>) {
        self.store
            .lock()
            .unwrap()
            .insert(name.to_owned(), contents.into());
    }

    /// Returns the names of all stored objects, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.store.lock().unwrap().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of stored objects.
    pub fn len(&self) -> usize {
        self.store.lock().unwrap().len()
    }

    /// Returns `true` if the backend has no stored objects.
    pub fn is_empty(&self) -> bool {
        self.store.lock().unwrap().is_empty()
    }
}

#[async_trait::async_trait]
impl Backend for InMemoryBackend {
    fn name(&self) -> &'static str {
        "in-memory"
    }

    async fn put_object(&self, name: &ObjectName, payload: &[u8]) -> BackendResult<()> {
        self.insert(&name.to_string(), Bytes::copy_from_slice(payload));
        Ok(())
    }

    async fn get_object(&self, name: &ObjectName, buffer: &mut [u8]) -> BackendResult<usize> {
        let key = name.to_string();
        let Some(contents) = self.get_stored(&key) else {
            return Err(BackendError::NotFound { name: key });
        };

        let copy = contents.len().min(buffer.len());
        buffer[..copy].copy_from_slice(&contents[..copy]);
        Ok(contents.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_and_counts_full_object() {
        let backend = InMemoryBackend::new();
        let name = ObjectName::new("mem", 0, 0);
        backend.put_object(&name, b"0123456789").await.unwrap();
        assert_eq!(backend.names(), ["mem_0_0"]);

        let mut exact = [0; 10];
        assert_eq!(backend.get_object(&name, &mut exact).await.unwrap(), 10);
        assert_eq!(&exact, b"0123456789");

        let mut small = [0; 4];
        assert_eq!(backend.get_object(&name, &mut small).await.unwrap(), 10);
        assert_eq!(&small, b"0123");
    }
}
