//! Coordinates the store, the external providers, and the cache.
//!
//! Every admin write funnels through here so that cache invalidation and
//! external file cleanup cannot be forgotten at a call site. Reads of the
//! archive tree go through the TTL cache; gallery reads hit the store
//! directly since the gallery is not part of the tree.

use crate::cache::ArchiveCache;
use crate::cleanup::{CleanupReport, release_image, release_item_files};
use crate::error::{ErrorKind, Result};
use crate::tree::{ArchiveNode, build_tree};
use arsip_storage::ProviderHandle;
use arsip_store::Repository;
use arsip_store::models::{
    GalleryGroup, GalleryItem, ImageRefs, NewBlock, NewCourse, NewGalleryGroup, NewGalleryItem,
    NewItem, NewLab, NewLink, NewSemester,
};
use exn::ResultExt;
use std::sync::Arc;
use std::time::Duration;

/// Outcome of a delete that releases external files first.
///
/// `deleted` reports whether the relational row existed; the report covers
/// the best-effort provider deletes that preceded it. Cleanup failures do
/// not make the operation a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub deleted: bool,
    pub cleanup: CleanupReport,
}

/// The archive application service.
///
/// Owns the repository, the two external file providers (a CDN copy and a
/// mirror copy of every upload), and the process-wide tree cache.
/// Construct one per process and share it across request handlers.
pub struct ArchiveService {
    repo: Repository,
    cdn: ProviderHandle,
    mirror: ProviderHandle,
    cache: ArchiveCache,
}

impl ArchiveService {
    pub fn new(repo: Repository, cdn: ProviderHandle, mirror: ProviderHandle) -> Self {
        Self { repo, cdn, mirror, cache: ArchiveCache::new() }
    }

    /// Override the tree cache TTL (tests mostly).
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = ArchiveCache::with_ttl(ttl);
        self
    }

    // =====================================================================
    // Read path
    // =====================================================================

    /// The navigable archive tree, served from cache while fresh.
    pub async fn archive_tree(&self) -> Result<Arc<Vec<ArchiveNode>>> {
        self.cache
            .get_or_build(|| async {
                let semesters = self.repo.archive_overview().await.or_raise(|| ErrorKind::Store)?;
                Ok(build_tree(semesters))
            })
            .await
    }

    // =====================================================================
    // Semester
    // =====================================================================

    pub async fn create_semester(&self, semester: &NewSemester) -> Result<i64> {
        let id = self.repo.create_semester(semester).await.or_raise(|| ErrorKind::Store);
        self.cache.invalidate().await;
        id
    }

    pub async fn update_semester(&self, id: i64, semester: &NewSemester) -> Result<bool> {
        let updated = self.repo.update_semester(id, semester).await.or_raise(|| ErrorKind::Store);
        self.cache.invalidate().await;
        updated
    }

    /// Courses under the semester cascade away with it; their external
    /// files are released first, exactly as for a direct course delete.
    pub async fn delete_semester(&self, id: i64) -> Result<DeleteOutcome> {
        let mut cleanup = CleanupReport::default();
        for course in self.repo.archive_overview().await.or_raise(|| ErrorKind::Store)?
            .into_iter()
            .filter(|s| s.id == id)
            .flat_map(|s| s.courses)
        {
            cleanup.merge(self.release_course_files(course.id).await?);
        }
        let deleted = self.repo.delete_semester(id).await.or_raise(|| ErrorKind::Store);
        self.cache.invalidate().await;
        Ok(DeleteOutcome { deleted: deleted?, cleanup })
    }

    // =====================================================================
    // Course
    // =====================================================================

    pub async fn create_course(&self, course: &NewCourse) -> Result<i64> {
        let id = self.repo.create_course(course).await.or_raise(|| ErrorKind::Store);
        self.cache.invalidate().await;
        id
    }

    pub async fn update_course(&self, id: i64, course: &NewCourse) -> Result<bool> {
        let updated = self.repo.update_course(id, course).await.or_raise(|| ErrorKind::Store);
        self.cache.invalidate().await;
        updated
    }

    /// Release every file under the course (academic items and lab items
    /// alike), then delete the row; the store cascades to everything
    /// beneath it.
    pub async fn delete_course(&self, id: i64) -> Result<DeleteOutcome> {
        let cleanup = self.release_course_files(id).await?;
        let deleted = self.repo.delete_course(id).await.or_raise(|| ErrorKind::Store);
        self.cache.invalidate().await;
        Ok(DeleteOutcome { deleted: deleted?, cleanup })
    }

    async fn release_course_files(&self, course_id: i64) -> Result<CleanupReport> {
        let (items, labs) = self.repo.course_contents(course_id).await.or_raise(|| ErrorKind::Store)?;
        let mut report = CleanupReport::default();
        for item in &items {
            report.merge(release_item_files(&self.cdn, &self.mirror, &item.hero, &item.blocks).await);
        }
        for item in labs.iter().flat_map(|lab| &lab.items) {
            report.merge(release_item_files(&self.cdn, &self.mirror, &item.hero, &item.blocks).await);
        }
        Ok(report)
    }

    // =====================================================================
    // Items
    // =====================================================================

    pub async fn create_academic_item(&self, course_id: i64, item: &NewItem) -> Result<i64> {
        let id = self.repo.create_academic_item(course_id, item).await.or_raise(|| ErrorKind::Store);
        self.cache.invalidate().await;
        id
    }

    pub async fn update_academic_item(&self, id: i64, item: &NewItem) -> Result<bool> {
        let updated = self.repo.update_academic_item(id, item).await.or_raise(|| ErrorKind::Store);
        self.cache.invalidate().await;
        updated
    }

    pub async fn delete_academic_item(&self, id: i64) -> Result<DeleteOutcome> {
        let mut cleanup = CleanupReport::default();
        if let Some(item) = self.repo.academic_item(id).await.or_raise(|| ErrorKind::Store)? {
            cleanup = release_item_files(&self.cdn, &self.mirror, &item.hero, &item.blocks).await;
        }
        let deleted = self.repo.delete_academic_item(id).await.or_raise(|| ErrorKind::Store);
        self.cache.invalidate().await;
        Ok(DeleteOutcome { deleted: deleted?, cleanup })
    }

    pub async fn create_lab_item(&self, lab_id: i64, item: &NewItem) -> Result<i64> {
        let id = self.repo.create_lab_item(lab_id, item).await.or_raise(|| ErrorKind::Store);
        self.cache.invalidate().await;
        id
    }

    pub async fn update_lab_item(&self, id: i64, item: &NewItem) -> Result<bool> {
        let updated = self.repo.update_lab_item(id, item).await.or_raise(|| ErrorKind::Store);
        self.cache.invalidate().await;
        updated
    }

    pub async fn delete_lab_item(&self, id: i64) -> Result<DeleteOutcome> {
        let mut cleanup = CleanupReport::default();
        if let Some(item) = self.repo.lab_item(id).await.or_raise(|| ErrorKind::Store)? {
            cleanup = release_item_files(&self.cdn, &self.mirror, &item.hero, &item.blocks).await;
        }
        let deleted = self.repo.delete_lab_item(id).await.or_raise(|| ErrorKind::Store);
        self.cache.invalidate().await;
        Ok(DeleteOutcome { deleted: deleted?, cleanup })
    }

    pub async fn replace_item_blocks(&self, item_id: i64, blocks: &[NewBlock]) -> Result<()> {
        let result = self.repo.replace_item_blocks(item_id, blocks).await.or_raise(|| ErrorKind::Store);
        self.cache.invalidate().await;
        result
    }

    pub async fn replace_lab_item_blocks(&self, item_id: i64, blocks: &[NewBlock]) -> Result<()> {
        let result = self.repo.replace_lab_item_blocks(item_id, blocks).await.or_raise(|| ErrorKind::Store);
        self.cache.invalidate().await;
        result
    }

    pub async fn replace_item_links(&self, item_id: i64, links: &[NewLink]) -> Result<()> {
        let result = self.repo.replace_item_links(item_id, links).await.or_raise(|| ErrorKind::Store);
        self.cache.invalidate().await;
        result
    }

    pub async fn replace_lab_item_links(&self, item_id: i64, links: &[NewLink]) -> Result<()> {
        let result = self.repo.replace_lab_item_links(item_id, links).await.or_raise(|| ErrorKind::Store);
        self.cache.invalidate().await;
        result
    }

    // =====================================================================
    // Labs and assistants
    // =====================================================================

    pub async fn create_lab(&self, lab: &NewLab) -> Result<i64> {
        let id = self.repo.create_lab(lab).await.or_raise(|| ErrorKind::Store);
        self.cache.invalidate().await;
        id
    }

    pub async fn update_lab(&self, id: i64, lab: &NewLab) -> Result<bool> {
        let updated = self.repo.update_lab(id, lab).await.or_raise(|| ErrorKind::Store);
        self.cache.invalidate().await;
        updated
    }

    pub async fn delete_lab(&self, id: i64) -> Result<DeleteOutcome> {
        let mut cleanup = CleanupReport::default();
        if let Some(lab) = self.repo.lab(id).await.or_raise(|| ErrorKind::Store)? {
            for item in &lab.items {
                cleanup.merge(release_item_files(&self.cdn, &self.mirror, &item.hero, &item.blocks).await);
            }
        }
        let deleted = self.repo.delete_lab(id).await.or_raise(|| ErrorKind::Store);
        self.cache.invalidate().await;
        Ok(DeleteOutcome { deleted: deleted?, cleanup })
    }

    pub async fn set_assistants(&self, course_id: i64, names: &[String]) -> Result<()> {
        let result = self.repo.set_assistants(course_id, names).await.or_raise(|| ErrorKind::Store);
        self.cache.invalidate().await;
        result
    }

    // =====================================================================
    // Gallery
    //
    // The gallery shares the store and the providers but is not part of
    // the archive tree, so its writes never touch the cache.
    // =====================================================================

    pub async fn gallery_groups(&self) -> Result<Vec<GalleryGroup>> {
        self.repo.gallery_groups().await.or_raise(|| ErrorKind::Store)
    }

    pub async fn uncategorised_gallery_items(&self) -> Result<Vec<GalleryItem>> {
        self.repo.uncategorised_gallery_items().await.or_raise(|| ErrorKind::Store)
    }

    pub async fn create_gallery_group(&self, group: &NewGalleryGroup) -> Result<i64> {
        self.repo.create_gallery_group(group).await.or_raise(|| ErrorKind::Store)
    }

    pub async fn update_gallery_group(&self, id: i64, group: &NewGalleryGroup) -> Result<bool> {
        self.repo.update_gallery_group(id, group).await.or_raise(|| ErrorKind::Store)
    }

    /// Items in the group survive with a null group reference; no files
    /// are released.
    pub async fn delete_gallery_group(&self, id: i64) -> Result<bool> {
        self.repo.delete_gallery_group(id).await.or_raise(|| ErrorKind::Store)
    }

    pub async fn create_gallery_item(&self, item: &NewGalleryItem) -> Result<i64> {
        self.repo.create_gallery_item(item).await.or_raise(|| ErrorKind::Store)
    }

    pub async fn update_gallery_item(&self, id: i64, item: &NewGalleryItem) -> Result<bool> {
        self.repo.update_gallery_item(id, item).await.or_raise(|| ErrorKind::Store)
    }

    pub async fn delete_gallery_item(&self, id: i64) -> Result<DeleteOutcome> {
        let mut cleanup = CleanupReport::default();
        if let Some(item) = self.repo.gallery_item(id).await.or_raise(|| ErrorKind::Store)? {
            let image = ImageRefs { cdn_id: item.cdn_id, mirror_id: item.mirror_id, ..ImageRefs::default() };
            cleanup = release_image(&self.cdn, &self.mirror, &image).await;
        }
        let deleted = self.repo.delete_gallery_item(id).await.or_raise(|| ErrorKind::Store)?;
        Ok(DeleteOutcome { deleted, cleanup })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arsip_storage::MockProvider;
    use arsip_store::Database;
    use arsip_store::models::{BlockKind, ItemKind};

    struct Harness {
        service: ArchiveService,
        cdn: Arc<MockProvider>,
        mirror: Arc<MockProvider>,
    }

    async fn harness(cdn: MockProvider, mirror: MockProvider) -> Harness {
        let db = Database::connect_in_memory().await.unwrap();
        let cdn = Arc::new(cdn.with_name("cdn"));
        let mirror = Arc::new(mirror.with_name("mirror"));
        let service = ArchiveService::new(Repository::from(&db), cdn.clone(), mirror.clone());
        Harness { service, cdn, mirror }
    }

    async fn seed_course(service: &ArchiveService) -> i64 {
        let semester_id = service
            .create_semester(&NewSemester { name: "Semester 1".to_string(), start_year: 2023, end_year: 2024 })
            .await
            .unwrap();
        service
            .create_course(&NewCourse {
                semester_id,
                name: "Algoritma".to_string(),
                code: None,
                lecturer: "Dr. Budi".to_string(),
                schedule: "Senin 08:00".to_string(),
            })
            .await
            .unwrap()
    }

    fn stored_hero(cdn_id: &str, mirror_id: &str) -> ImageRefs {
        ImageRefs {
            webp_url: Some("https://cdn.invalid/hero.webp".to_string()),
            original_url: None,
            cdn_id: Some(cdn_id.to_string()),
            mirror_id: Some(mirror_id.to_string()),
        }
    }

    #[tokio::test]
    async fn test_item_delete_attempts_both_providers_even_when_one_fails() {
        let h = harness(MockProvider::with_files(["ik-1", "ik-2"]).failing(), MockProvider::with_files(["gd-1"]))
            .await;
        let course_id = seed_course(&h.service).await;
        let item_id = h
            .service
            .create_academic_item(
                course_id,
                &NewItem { kind: ItemKind::Tugas, title: "Tugas 1".to_string(), hero: stored_hero("ik-1", "gd-1") },
            )
            .await
            .unwrap();
        h.service
            .replace_item_blocks(
                item_id,
                &[NewBlock {
                    kind: BlockKind::Image,
                    content: None,
                    image: ImageRefs { cdn_id: Some("ik-2".to_string()), ..ImageRefs::default() },
                    caption: None,
                    width: None,
                    ord: 0,
                }],
            )
            .await
            .unwrap();

        let outcome = h.service.delete_academic_item(item_id).await.unwrap();
        assert!(outcome.deleted);
        // Hero on both providers plus one block on the CDN.
        assert_eq!(outcome.cleanup.attempted, 3);
        assert_eq!(outcome.cleanup.failed, ["cdn/ik-1", "cdn/ik-2"]);
        assert_eq!(h.cdn.delete_attempts().await, ["ik-1", "ik-2"]);
        assert_eq!(h.mirror.delete_attempts().await, ["gd-1"]);
        assert!(h.service.repo.academic_item(item_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_course_delete_releases_lab_item_files_too() {
        let h = harness(MockProvider::with_files(["ik-9"]), MockProvider::default()).await;
        let course_id = seed_course(&h.service).await;
        let lab_id = h
            .service
            .create_lab(&NewLab { course_id, title: "Praktikum 1".to_string(), assistant: None })
            .await
            .unwrap();
        let item_id = h
            .service
            .create_lab_item(
                lab_id,
                &NewItem {
                    kind: ItemKind::TugasPraktikum,
                    title: "TP1".to_string(),
                    hero: ImageRefs { cdn_id: Some("ik-9".to_string()), ..ImageRefs::default() },
                },
            )
            .await
            .unwrap();

        let outcome = h.service.delete_course(course_id).await.unwrap();
        assert!(outcome.deleted);
        assert!(outcome.cleanup.is_clean());
        assert!(!h.cdn.contains("ik-9").await);
        assert!(h.service.repo.lab_item(item_id).await.unwrap().is_none());
        assert!(h.service.repo.lab(lab_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_tree_is_cached_until_a_write_invalidates() {
        let h = harness(MockProvider::default(), MockProvider::default()).await;
        seed_course(&h.service).await;

        let first = h.service.archive_tree().await.unwrap();
        let second = h.service.archive_tree().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 1);

        h.service
            .create_semester(&NewSemester { name: "Semester 2".to_string(), start_year: 2024, end_year: 2025 })
            .await
            .unwrap();
        let third = h.service.archive_tree().await.unwrap();
        assert!(!Arc::ptr_eq(&second, &third));
        assert_eq!(third.len(), 2);
    }

    #[tokio::test]
    async fn test_gallery_writes_leave_the_tree_cache_alone() {
        let h = harness(MockProvider::with_files(["ik-g"]), MockProvider::default()).await;
        seed_course(&h.service).await;
        let cached = h.service.archive_tree().await.unwrap();

        let item_id = h
            .service
            .create_gallery_item(&NewGalleryItem {
                group_id: None,
                title: "Wisuda".to_string(),
                description: None,
                image_webp_url: "https://cdn.invalid/w.webp".to_string(),
                image_original_url: "https://cdn.invalid/w.jpg".to_string(),
                cdn_id: Some("ik-g".to_string()),
                mirror_id: None,
                shown_on: "2024-06-01".to_string(),
            })
            .await
            .unwrap();
        let outcome = h.service.delete_gallery_item(item_id).await.unwrap();
        assert!(outcome.deleted);
        assert_eq!(outcome.cleanup.attempted, 1);
        assert!(!h.cdn.contains("ik-g").await);

        let after = h.service.archive_tree().await.unwrap();
        assert!(Arc::ptr_eq(&cached, &after));
    }

    #[tokio::test]
    async fn test_delete_missing_item_reports_false_and_attempts_nothing() {
        let h = harness(MockProvider::default(), MockProvider::default()).await;
        let outcome = h.service.delete_academic_item(4242).await.unwrap();
        assert!(!outcome.deleted);
        assert_eq!(outcome.cleanup, CleanupReport::default());
        assert!(h.cdn.delete_attempts().await.is_empty());
    }

    #[tokio::test]
    async fn test_semester_delete_releases_course_files() {
        let h = harness(MockProvider::with_files(["ik-s"]), MockProvider::default()).await;
        let course_id = seed_course(&h.service).await;
        h.service
            .create_academic_item(
                course_id,
                &NewItem {
                    kind: ItemKind::Materi,
                    title: "M1".to_string(),
                    hero: ImageRefs { cdn_id: Some("ik-s".to_string()), ..ImageRefs::default() },
                },
            )
            .await
            .unwrap();

        let tree = h.service.archive_tree().await.unwrap();
        let semester_id: i64 = tree[0].id.parse().unwrap();
        let outcome = h.service.delete_semester(semester_id).await.unwrap();
        assert!(outcome.deleted);
        assert_eq!(outcome.cleanup.attempted, 1);
        assert!(!h.cdn.contains("ik-s").await);
        assert!(h.service.archive_tree().await.unwrap().is_empty());
    }
}
