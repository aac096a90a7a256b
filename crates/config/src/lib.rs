//! Configuration loading for the archive.
//!
//! Settings merge three layers, weakest first: built-in defaults derived
//! from the platform project directories, an optional TOML file, and
//! `ARSIP_`-prefixed environment variables (`__` separates nesting, e.g.
//! `ARSIP_CACHE__TTL_SECS=60`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::{OptionExt, ResultExt};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PREFIX: &str = "ARSIP_";
const DEFAULT_CACHE_TTL_SECS: u64 = 5 * 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file; created on first connect.
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long a built archive tree stays fresh, in seconds.
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// The two external file providers every upload is pushed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub cdn: ProviderConfig,
    pub mirror: ProviderConfig,
}

/// Settings for one file-storage provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Files on the local filesystem, served by something else.
    Local {
        root: PathBuf,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base_url: Option<String>,
    },
    /// An S3-compatible bucket (AWS, Backblaze, Tigris, MinIO).
    S3 {
        bucket: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        prefix: Option<String>,
        region: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        endpoint: Option<String>,
        key_id: String,
        key_secret: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        public_base_url: Option<String>,
    },
}

impl AppConfig {
    /// Load configuration from the default file location, the environment,
    /// and built-in defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_config_file()?)
    }

    /// Load configuration with an explicit TOML file path. The file is
    /// optional; a missing file just means defaults plus environment.
    pub fn load_from(config_file: impl AsRef<Path>) -> Result<Self> {
        tracing::debug!(path = %config_file.as_ref().display(), "Loading configuration");
        Figment::from(Serialized::defaults(Self::defaults()?))
            .merge(Toml::file(config_file.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .or_raise(|| ErrorKind::Invalid)
    }

    /// Built-in defaults: everything under the platform data directory,
    /// local storage for both providers.
    fn defaults() -> Result<Self> {
        let dirs = project_dirs()?;
        let data = dirs.data_dir();
        Ok(Self {
            database: DatabaseConfig { path: data.join("arsip.db") },
            cache: CacheConfig { ttl_secs: DEFAULT_CACHE_TTL_SECS },
            storage: StorageConfig {
                cdn: ProviderConfig::Local { root: data.join("uploads"), base_url: None },
                mirror: ProviderConfig::Local { root: data.join("mirror"), base_url: None },
            },
        })
    }

    fn default_config_file() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("arsip.toml"))
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("id", "arsip", "arsip").ok_or_raise(|| ErrorKind::NoProjectDirs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_alone_are_valid() {
        figment::Jail::expect_with(|_jail| {
            let config = AppConfig::load_from("does-not-exist.toml").expect("defaults must load");
            assert_eq!(config.cache.ttl_secs, 300);
            assert_eq!(config.cache.ttl(), Duration::from_secs(300));
            assert!(matches!(config.storage.cdn, ProviderConfig::Local { .. }));
            Ok(())
        });
    }

    #[test]
    fn test_file_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "arsip.toml",
                r#"
                    [database]
                    path = "/srv/arsip/arsip.db"

                    [cache]
                    ttl_secs = 60

                    [storage.cdn]
                    kind = "s3"
                    bucket = "arsip-media"
                    region = "us-west-004"
                    endpoint = "https://s3.us-west-004.backblazeb2.com"
                    key_id = "id"
                    key_secret = "secret"

                    [storage.mirror]
                    kind = "local"
                    root = "/srv/arsip/mirror"
                "#,
            )?;
            let config = AppConfig::load_from("arsip.toml").expect("file must load");
            assert_eq!(config.database.path, PathBuf::from("/srv/arsip/arsip.db"));
            assert_eq!(config.cache.ttl_secs, 60);
            assert!(matches!(
                config.storage.cdn,
                ProviderConfig::S3 { ref bucket, .. } if bucket == "arsip-media"
            ));
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("arsip.toml", "[cache]\nttl_secs = 60\n")?;
            jail.set_env("ARSIP_CACHE__TTL_SECS", "15");
            let config = AppConfig::load_from("arsip.toml").expect("env must load");
            assert_eq!(config.cache.ttl_secs, 15);
            Ok(())
        });
    }

    #[test]
    fn test_invalid_provider_kind_is_rejected() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("arsip.toml", "[storage.cdn]\nkind = \"ftp\"\nroot = \"/tmp\"\n")?;
            let result = AppConfig::load_from("arsip.toml");
            assert!(result.is_err());
            Ok(())
        });
    }
}
