//! S3-compatible storage provider.
//!
//! Works against AWS S3 and S3-compatible services (Backblaze B2, Tigris,
//! MinIO). Credentials are provided explicitly via configuration; each
//! provider entry carries its own `key_id` and `key_secret`.

use crate::error::{ErrorKind, Result};
use crate::provider::{FileStorage, StoredFile};
use async_trait::async_trait;
use aws_sdk_s3::{
    Client,
    config::{BehaviorVersion, Credentials, Region, retry::RetryConfig},
    primitives::ByteStream,
};
use exn::ResultExt;

/// S3-compatible file-storage provider.
///
/// Uploads land under `{prefix}/{folder}/{file_name}` in the configured
/// bucket, and the object key doubles as the file id handed back to the
/// database. Public URLs are built from `public_base_url` when one is
/// configured, falling back to the virtual-hosted AWS form.
///
/// # Examples
///
/// ```no_run
/// use arsip_storage::S3Provider;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = S3Provider::new(
///     "cdn",
///     "arsip-media",
///     Some("uploads".to_string()),
///     "us-west-004",
///     Some("https://s3.us-west-004.backblazeb2.com".to_string()),
///     "access_key_id",
///     "secret_access_key",
/// )?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct S3Provider {
    name: String,
    client: Client,
    bucket: String,
    prefix: Option<String>,
    region: String,
    public_base_url: Option<String>,
}

impl S3Provider {
    /// Create a new S3 provider.
    ///
    /// # Arguments
    /// * `name` - A name for this provider (used in display/logging)
    /// * `bucket` - S3 bucket name
    /// * `prefix` - Optional key prefix (acts as virtual directory)
    /// * `region` - AWS region or provider-specific region (e.g. "us-west-004" for Backblaze)
    /// * `endpoint` - Custom endpoint URL for S3-compatible services
    /// * `key_id` - AWS/provider access key ID
    /// * `key_secret` - AWS/provider secret access key
    pub fn new(
        name: impl Into<String>,
        bucket: impl Into<String>,
        prefix: Option<String>,
        region: impl Into<String>,
        endpoint: Option<impl Into<String>>,
        key_id: impl Into<String>,
        key_secret: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        let bucket = bucket.into();
        let region = region.into();
        let credentials = Credentials::new(key_id, key_secret, None, None, "arsip-config");
        let mut config_builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new(region.clone()))
            .retry_config(RetryConfig::standard().with_max_attempts(4))
            // Path-style addressing for compatibility with Backblaze, MinIO, etc.
            .force_path_style(true);
        if let Some(endpoint_url) = endpoint {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }
        let client = Client::from_conf(config_builder.build());
        Ok(Self {
            name,
            client,
            bucket,
            prefix: prefix.map(|p| p.trim_matches('/').to_string()).filter(|p| !p.is_empty()),
            region,
            public_base_url: None,
        })
    }

    /// Serve uploaded files from a custom domain (CDN or bucket website)
    /// instead of the default S3 endpoint URL.
    pub fn with_public_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.public_base_url = Some(base_url.into().trim_end_matches('/').to_string());
        self
    }

    /// Construct the full object key for an upload.
    fn object_key(&self, file_name: &str, folder: &str) -> String {
        let folder = folder.trim_matches('/');
        match (&self.prefix, folder.is_empty()) {
            (Some(prefix), false) => format!("{prefix}/{folder}/{file_name}"),
            (Some(prefix), true) => format!("{prefix}/{file_name}"),
            (None, false) => format!("{folder}/{file_name}"),
            (None, true) => file_name.to_string(),
        }
    }

    /// Public URL for an object key.
    fn public_url(&self, key: &str) -> String {
        match &self.public_base_url {
            Some(base) => format!("{base}/{key}"),
            None => format!("https://{}.s3.{}.amazonaws.com/{key}", self.bucket, self.region),
        }
    }
}

#[async_trait]
impl FileStorage for S3Provider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn upload(&self, data: &[u8], file_name: &str, folder: &str) -> Result<StoredFile> {
        let key = self.object_key(file_name, folder);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(data.to_vec()))
            .send()
            .await
            .or_raise(|| ErrorKind::Network(format!("S3 put_object failed for {key}")))?;
        Ok(StoredFile {
            url: self.public_url(&key),
            file_id: key,
        })
    }

    async fn delete(&self, file_id: &str) -> Result<()> {
        // S3 delete_object is idempotent and reports success for keys that
        // do not exist, so a missing file never surfaces as NotFound here.
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(file_id)
            .send()
            .await
            .or_raise(|| ErrorKind::Network(format!("S3 delete_object failed for {file_id}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(prefix: Option<&str>) -> S3Provider {
        S3Provider::new(
            "cdn",
            "arsip-media",
            prefix.map(String::from),
            "us-east-1",
            None::<String>,
            "key",
            "secret",
        )
        .unwrap()
    }

    #[test]
    fn test_object_key_without_prefix() {
        let s3 = provider(None);
        assert_eq!(s3.object_key("hero.webp", "gallery"), "gallery/hero.webp");
        assert_eq!(s3.object_key("hero.webp", ""), "hero.webp");
    }

    #[test]
    fn test_object_key_with_prefix() {
        let s3 = provider(Some("uploads/"));
        assert_eq!(s3.object_key("hero.webp", "gallery"), "uploads/gallery/hero.webp");
        assert_eq!(s3.object_key("hero.webp", "/"), "uploads/hero.webp");
    }

    #[test]
    fn test_public_url_default_and_custom() {
        let s3 = provider(None);
        assert_eq!(
            s3.public_url("gallery/hero.webp"),
            "https://arsip-media.s3.us-east-1.amazonaws.com/gallery/hero.webp"
        );
        let s3 = provider(None).with_public_base_url("https://media.example.org/");
        assert_eq!(s3.public_url("gallery/hero.webp"), "https://media.example.org/gallery/hero.webp");
    }
}
