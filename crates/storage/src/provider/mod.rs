//! File-storage provider trait and implementations.
//!
//! This module defines the `FileStorage` trait, the unified interface to
//! the external services that hold uploaded images (a CDN copy and a
//! mirror copy, in production). Providers identify files by an opaque,
//! provider-issued **file id** which is recorded in the database alongside
//! the public URL.

mod local;
#[cfg(feature = "mock")]
mod mock;
#[cfg(feature = "s3")]
mod s3;

pub use self::local::LocalProvider;
#[cfg(feature = "mock")]
pub use self::mock::MockProvider;
#[cfg(feature = "s3")]
pub use self::s3::S3Provider;
use crate::error::Result;
use async_trait::async_trait;

/// What a provider hands back after a successful upload: the public URL to
/// serve the file from, and the provider's own id for later deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub url: String,
    pub file_id: String,
}

/// Unified interface for external file-storage providers.
///
/// All operations are asynchronous since every real provider is on the
/// other side of a network. The contract is deliberately small: the
/// archive only ever uploads a processed image and, much later, deletes it
/// by the file id it recorded.
///
/// # Examples
///
/// ```
/// use arsip_storage::{FileStorage, error::Result};
///
/// async fn replace_photo(provider: &dyn FileStorage, old_id: &str, data: &[u8]) -> Result<String> {
///     provider.delete(old_id).await?;
///     let stored = provider.upload(data, "photo.webp", "gallery/webp").await?;
///     Ok(stored.url)
/// }
/// ```
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Name of the configured provider (used for logging only; nothing in
    /// this crate requires names to be unique).
    fn name(&self) -> &str;

    /// Store a file and return its public URL plus the provider file id.
    ///
    /// `folder` is a provider-side grouping hint (a key prefix, a
    /// directory); implementations create it as needed.
    async fn upload(&self, data: &[u8], file_name: &str, folder: &str) -> Result<StoredFile>;

    /// Delete a file by its provider file id.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if no such
    /// file exists. Callers running best-effort cleanup are expected to
    /// log-and-swallow whatever this returns; the provider itself never
    /// pre-judges which failures matter.
    async fn delete(&self, file_id: &str) -> Result<()>;
}
