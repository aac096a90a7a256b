pub mod error;
mod path;
pub mod provider;

pub use crate::path::validate as validate_path;
pub use crate::provider::{FileStorage, StoredFile};
#[cfg(feature = "mock")]
pub use crate::provider::MockProvider;
#[cfg(feature = "s3")]
pub use crate::provider::S3Provider;
pub use crate::provider::LocalProvider;
use std::sync::Arc;

pub type ProviderHandle = Arc<dyn FileStorage + Send + Sync>;
