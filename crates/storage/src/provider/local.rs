//! Local filesystem provider.
//!
//! Stores uploads under a root directory using `tokio::fs`. The file id is
//! the root-relative path, so ids surviving in the database stay meaningful
//! across restarts. Mostly useful for development and self-hosted setups
//! without a CDN.

use crate::error::{ErrorKind, Result};
use crate::path::validate as validate_path;
use crate::provider::{FileStorage, StoredFile};
use async_trait::async_trait;
use exn::ResultExt;
use std::fs::create_dir_all as sync_create_dir;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Local filesystem provider.
///
/// # Examples
///
/// ```no_run
/// use arsip_storage::LocalProvider;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = LocalProvider::new("local", "/var/lib/arsip/uploads")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LocalProvider {
    name: String,
    /// Root directory for uploads
    root: PathBuf,
    /// Base URL that `root` is served under (e.g. `https://arsip.example/files`).
    base_url: String,
}

impl LocalProvider {
    /// Create a new local filesystem provider rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not absolute, or exists but is not
    /// a directory.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        if root.exists() {
            if !root.is_dir() {
                exn::bail!(ErrorKind::InvalidPath(root));
            }
        } else {
            // Non-async on purpose; this happens once at startup and isn't
            // worth an async constructor.
            sync_create_dir(&root).or_raise(|| ErrorKind::InvalidPath(root.clone()))?;
        }
        Ok(Self { name: name.into(), base_url: format!("file://{}", root.display()), root })
    }

    /// Override the base URL uploads are reported under.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn absolute_path(&self, file_id: &str) -> Result<(PathBuf, PathBuf)> {
        let relative = validate_path(file_id)?;
        let absolute = self.root.join(&relative);
        Ok((relative, absolute))
    }
}

#[async_trait]
impl FileStorage for LocalProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn upload(&self, data: &[u8], file_name: &str, folder: &str) -> Result<StoredFile> {
        let relative = validate_path(Path::new(folder).join(file_name))?;
        let absolute = self.root.join(&relative);
        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent).await.or_raise(|| ErrorKind::InvalidPath(parent.to_path_buf()))?;
        }
        fs::write(&absolute, data).await.map_err(|e| exn::Exn::from(ErrorKind::from(e)))?;
        // The file id doubles as the URL path below base_url.
        let file_id = relative.to_string_lossy().replace('\\', "/");
        Ok(StoredFile { url: format!("{}/{}", self.base_url, file_id), file_id })
    }

    async fn delete(&self, file_id: &str) -> Result<()> {
        let (_, absolute) = self.absolute_path(file_id)?;
        match fs::remove_file(&absolute).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                exn::bail!(ErrorKind::NotFound(file_id.to_string()))
            },
            Err(e) => Err(exn::Exn::from(ErrorKind::from(e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> (tempfile::TempDir, LocalProvider) {
        let dir = tempfile::tempdir().unwrap();
        let provider = LocalProvider::new("local", dir.path()).unwrap();
        (dir, provider)
    }

    #[tokio::test]
    async fn test_upload_and_delete() {
        let (dir, provider) = provider();
        let stored = provider.upload(b"webp bytes", "photo.webp", "gallery/webp").await.unwrap();
        assert_eq!(stored.file_id, "gallery/webp/photo.webp");
        assert!(dir.path().join("gallery/webp/photo.webp").exists());
        provider.delete(&stored.file_id).await.unwrap();
        assert!(!dir.path().join("gallery/webp/photo.webp").exists());
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let (_dir, provider) = provider();
        let err = provider.delete("gallery/nope.webp").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let (_dir, provider) = provider();
        assert!(provider.delete("../../etc/passwd").await.is_err());
        assert!(provider.upload(b"x", "f.webp", "../escape").await.is_err());
    }

    #[test]
    fn test_relative_root_rejected() {
        assert!(LocalProvider::new("local", "relative/path").is_err());
    }

    #[tokio::test]
    async fn test_base_url_override() {
        let (_dir, provider) = provider();
        let provider = provider.with_base_url("https://arsip.example/files/");
        let stored = provider.upload(b"x", "a.webp", "gallery").await.unwrap();
        assert_eq!(stored.url, "https://arsip.example/files/gallery/a.webp");
    }
}
