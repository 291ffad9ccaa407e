use std::fmt::Debug;

use crate::error::BackendResult;
use crate::name::ObjectName;

/// A type-erased [`Backend`] instance.
pub type BoxedBackend = Box<dyn Backend>;

/// A storage target that can store and read back complete objects.
#[async_trait::async_trait]
pub trait Backend: Debug + Send + Sync + 'static {
    /// The backend name, used for diagnostics.
    fn name(&self) -> &'static str;

    /// Stores `payload` as the full contents of the object `name`.
    ///
    /// Returns only after the payload has been durably persisted. An existing object with the
    /// same name is replaced.
    async fn put_object(&self, name: &ObjectName, payload: &[u8]) -> BackendResult<()>;

    /// Reads the object `name` into `buffer`, returning the number of bytes read.
    ///
    /// The buffer is sized to the expected object length. A count different from the buffer
    /// length indicates a size mismatch, which is not an error at this layer.
    async fn get_object(&self, name: &ObjectName, buffer: &mut [u8]) -> BackendResult<usize>;
}
