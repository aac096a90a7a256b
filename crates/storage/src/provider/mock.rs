//! In-memory provider for testing.

use crate::error::{ErrorKind, Result};
use crate::provider::{FileStorage, StoredFile};
use async_trait::async_trait;
use exn::OptionExt;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// In-memory file-storage provider for testing.
///
/// Files live in a `HashMap` behind a [`RwLock`], so all trait methods
/// operate on `&self` without external synchronisation. Every delete
/// attempt is recorded (successful or not), which is what the cascading
/// delete tests care about.
///
/// # Examples
///
/// ```
/// use arsip_storage::{FileStorage, MockProvider};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = MockProvider::with_files(["ik-1", "ik-2"]);
/// provider.delete("ik-1").await?;
/// assert!(!provider.contains("ik-1").await);
/// assert!(provider.contains("ik-2").await);
/// # Ok(())
/// # }
/// ```
pub struct MockProvider {
    name: String,
    /// Every delete always fails with a provider error when set.
    fail_deletes: bool,
    counter: AtomicU64,
    storage: RwLock<HashMap<String, Vec<u8>>>,
    delete_attempts: RwLock<Vec<String>>,
}

impl MockProvider {
    /// Create a mock provider pre-populated with file ids (empty contents).
    pub fn with_files(ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let storage = ids.into_iter().map(|id| (id.into(), Vec::new())).collect();
        Self {
            name: "mock".to_string(),
            fail_deletes: false,
            counter: AtomicU64::new(0),
            storage: RwLock::new(storage),
            delete_attempts: RwLock::new(Vec::new()),
        }
    }

    /// Change the name of the mock provider.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Make every delete fail with a provider error. The attempt is still
    /// recorded, so tests can assert the call happened.
    pub fn failing(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    /// Whether a file with the given id currently exists.
    pub async fn contains(&self, file_id: &str) -> bool {
        self.storage.read().await.contains_key(file_id)
    }

    /// Every file id a delete was attempted for, in call order.
    pub async fn delete_attempts(&self) -> Vec<String> {
        self.delete_attempts.read().await.clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        let ids: [&str; 0] = [];
        Self::with_files(ids)
    }
}

#[async_trait]
impl FileStorage for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn upload(&self, data: &[u8], file_name: &str, _folder: &str) -> Result<StoredFile> {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let file_id = format!("{}-{n}", self.name);
        self.storage.write().await.insert(file_id.clone(), data.to_vec());
        Ok(StoredFile { url: format!("https://{}.invalid/{file_id}/{file_name}", self.name), file_id })
    }

    async fn delete(&self, file_id: &str) -> Result<()> {
        self.delete_attempts.write().await.push(file_id.to_string());
        if self.fail_deletes {
            exn::bail!(ErrorKind::Provider(format!("{} is set to fail deletes", self.name)));
        }
        self.storage
            .write()
            .await
            .remove(file_id)
            .map(|_| ())
            .ok_or_raise(|| ErrorKind::NotFound(file_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_issues_sequential_ids() {
        let provider = MockProvider::default().with_name("cdn");
        let a = provider.upload(b"a", "a.webp", "gallery").await.unwrap();
        let b = provider.upload(b"b", "b.webp", "gallery").await.unwrap();
        assert_eq!(a.file_id, "cdn-0");
        assert_eq!(b.file_id, "cdn-1");
        assert!(provider.contains("cdn-0").await);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let provider = MockProvider::default();
        let err = provider.delete("nope").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
        // The failed attempt is still on record.
        assert_eq!(provider.delete_attempts().await, ["nope"]);
    }

    #[tokio::test]
    async fn test_failing_mode_records_attempts() {
        let provider = MockProvider::with_files(["ik-1"]).failing();
        let err = provider.delete("ik-1").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Provider(_)));
        // Nothing was actually removed.
        assert!(provider.contains("ik-1").await);
        assert_eq!(provider.delete_attempts().await, ["ik-1"]);
    }
}
