mod common;
mod in_memory;
mod local_fs;
mod s3_compatible;

pub use common::{Backend, BoxedBackend};
pub use in_memory::InMemoryBackend;
pub use local_fs::LocalFs;
pub use s3_compatible::{S3Compatible, S3CompatibleConfig};
