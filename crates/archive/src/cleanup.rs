//! Best-effort release of externally stored files.
//!
//! Deleting a course, lab, or item has to release the files its subtree
//! pushed to the external providers before the relational rows go away,
//! or the cascade silently orphans them. An image can be backed by the
//! CDN provider, the mirror provider, both, or neither; every delete is
//! attempted independently and a failure is logged and recorded, never
//! propagated. The relational delete always proceeds.

use arsip_store::models::{ContentBlock, ImageRefs};
use arsip_storage::ProviderHandle;

/// Outcome of one cleanup pass: how many provider deletes were attempted
/// and which of them failed, as `provider/file_id` strings.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub attempted: usize,
    pub failed: Vec<String>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn merge(&mut self, other: CleanupReport) {
        self.attempted += other.attempted;
        self.failed.extend(other.failed);
    }
}

/// Delete one image's files from whichever providers hold a copy.
///
/// The two provider calls are sequential but fully independent: a CDN
/// failure never skips the mirror delete, and vice versa.
pub async fn release_image(
    cdn: &ProviderHandle,
    mirror: &ProviderHandle,
    image: &ImageRefs,
) -> CleanupReport {
    let mut report = CleanupReport::default();
    for (provider, file_id) in [(cdn, &image.cdn_id), (mirror, &image.mirror_id)] {
        let Some(file_id) = file_id else { continue };
        report.attempted += 1;
        if let Err(err) = provider.delete(file_id).await {
            tracing::warn!(provider = provider.name(), file_id = %file_id, error = ?err, "External file delete failed");
            report.failed.push(format!("{}/{file_id}", provider.name()));
        }
    }
    report
}

/// Release an item's hero image plus every image block's file.
pub async fn release_item_files(
    cdn: &ProviderHandle,
    mirror: &ProviderHandle,
    hero: &ImageRefs,
    blocks: &[ContentBlock],
) -> CleanupReport {
    let mut report = release_image(cdn, mirror, hero).await;
    for block in blocks {
        report.merge(release_image(cdn, mirror, &block.image).await);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use arsip_storage::MockProvider;
    use std::sync::Arc;

    fn refs(cdn_id: Option<&str>, mirror_id: Option<&str>) -> ImageRefs {
        ImageRefs {
            cdn_id: cdn_id.map(String::from),
            mirror_id: mirror_id.map(String::from),
            ..ImageRefs::default()
        }
    }

    #[tokio::test]
    async fn test_unstored_image_attempts_nothing() {
        let cdn: ProviderHandle = Arc::new(MockProvider::default().with_name("cdn"));
        let mirror: ProviderHandle = Arc::new(MockProvider::default().with_name("mirror"));
        let report = release_image(&cdn, &mirror, &refs(None, None)).await;
        assert_eq!(report.attempted, 0);
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn test_failing_provider_does_not_block_the_other() {
        let cdn = Arc::new(MockProvider::with_files(["ik-1"]).with_name("cdn").failing());
        let mirror = Arc::new(MockProvider::with_files(["gd-1"]).with_name("mirror"));
        let report = release_image(
            &(cdn.clone() as ProviderHandle),
            &(mirror.clone() as ProviderHandle),
            &refs(Some("ik-1"), Some("gd-1")),
        )
        .await;
        assert_eq!(report.attempted, 2);
        assert_eq!(report.failed, ["cdn/ik-1"]);
        // Both providers saw their delete.
        assert_eq!(cdn.delete_attempts().await, ["ik-1"]);
        assert_eq!(mirror.delete_attempts().await, ["gd-1"]);
        assert!(!mirror.contains("gd-1").await);
    }
}
