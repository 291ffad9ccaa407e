use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs::OpenOptions;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::common::Backend;
use crate::error::{BackendError, BackendResult};
use crate::name::ObjectName;

/// Stores every object as a file directly inside one directory.
#[derive(Debug)]
pub struct LocalFs {
    path: PathBuf,
}

impl LocalFs {
    /// Creates the backend, creating `path` and all of its missing parents.
    pub async fn create(path: &Path) -> BackendResult<Self> {
        tokio::fs::create_dir_all(path).await?;
        tracing::debug!(path = %path.display(), "Prepared benchmark directory");
        Ok(Self { path: path.into() })
    }

    /// The directory holding the objects.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn object_path(&self, name: &ObjectName) -> PathBuf {
        self.path.join(name.to_string())
    }
}

#[async_trait::async_trait]
impl Backend for LocalFs {
    fn name(&self) -> &'static str {
        "local-fs"
    }

    #[tracing::instrument(level = "trace", fields(%name), skip_all)]
    async fn put_object(&self, name: &ObjectName, payload: &[u8]) -> BackendResult<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.object_path(name))
            .await?;

        file.write_all(payload).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        Ok(())
    }

    #[tracing::instrument(level = "trace", fields(%name), skip_all)]
    async fn get_object(&self, name: &ObjectName, buffer: &mut [u8]) -> BackendResult<usize> {
        let mut file = match OpenOptions::new()
            .read(true)
            .open(self.object_path(name))
            .await
        {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(BackendError::NotFound {
                    name: name.to_string(),
                });
            }
            Err(err) => return Err(err.into()),
        };

        let mut filled = 0;
        while filled < buffer.len() {
            let read = file.read(&mut buffer[filled..]).await?;
            if read == 0 {
                break;
            }
            filled += read;
        }

        Ok(filled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_payload() {
        let tempdir = tempfile::tempdir().unwrap();
        let backend = LocalFs::create(tempdir.path()).await.unwrap();
        let name = ObjectName::new("roundtrip", 0, 0);

        backend.put_object(&name, b"oh hai!").await.unwrap();
        assert_eq!(
            std::fs::read(tempdir.path().join("roundtrip_0_0")).unwrap(),
            b"oh hai!"
        );

        let mut buffer = [0; 7];
        let read = backend.get_object(&name, &mut buffer).await.unwrap();
        assert_eq!(read, 7);
        assert_eq!(&buffer, b"oh hai!");
    }

    #[tokio::test]
    async fn truncates_existing_objects() {
        let tempdir = tempfile::tempdir().unwrap();
        let backend = LocalFs::create(tempdir.path()).await.unwrap();
        let name = ObjectName::new("overwrite", 1, 2);

        backend.put_object(&name, b"a much longer payload").await.unwrap();
        backend.put_object(&name, b"short").await.unwrap();

        let contents = std::fs::read(tempdir.path().join("overwrite_1_2")).unwrap();
        assert_eq!(contents, b"short");
    }

    #[tokio::test]
    async fn reports_short_objects_by_count() {
        let tempdir = tempfile::tempdir().unwrap();
        let backend = LocalFs::create(tempdir.path()).await.unwrap();
        let name = ObjectName::new("short", 0, 0);
        backend.put_object(&name, b"1234").await.unwrap();

        let mut buffer = [0; 16];
        let read = backend.get_object(&name, &mut buffer).await.unwrap();
        assert_eq!(read, 4);
        assert_eq!(&buffer[..4], b"1234");
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let tempdir = tempfile::tempdir().unwrap();
        let backend = LocalFs::create(tempdir.path()).await.unwrap();

        let mut buffer = [0; 4];
        let err = backend
            .get_object(&ObjectName::new("missing", 0, 0), &mut buffer)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::NotFound { name } if name == "missing_0_0"));
    }
}
