//! Repository over the archive store.
//!
//! One repository covers both halves of the database (academic archive and
//! gallery); they share a pool and a migration history, and splitting them
//! would only create two structs holding the same pool. The academic
//! methods live in [`academic`], the gallery methods in [`gallery`].

mod academic;
mod gallery;

use crate::Database;
use sqlx::SqlitePool;

/// Repository for the academic archive and gallery tables.
///
/// # Relationships
///
/// - Deleting a semester, course, lab, or item cascades to everything
///   beneath it (rows only; external file cleanup is the caller's job).
/// - Deleting a gallery group does NOT delete its items; their `group_id`
///   becomes `NULL` and they show up as uncategorised.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        BlockKind, ImageRefs, ItemKind, NewBlock, NewCourse, NewGalleryGroup, NewGalleryItem, NewItem, NewLab,
        NewLink, NewSemester,
    };

    fn new_item(kind: ItemKind, title: &str) -> NewItem {
        NewItem { kind, title: title.to_string(), hero: ImageRefs::default() }
    }

    fn text_block(content: &str, ord: i64) -> NewBlock {
        NewBlock {
            kind: BlockKind::Text,
            content: Some(content.to_string()),
            image: ImageRefs::default(),
            caption: None,
            width: None,
            ord,
        }
    }

    fn image_block(url: &str, ord: i64) -> NewBlock {
        NewBlock {
            kind: BlockKind::Image,
            content: None,
            image: ImageRefs { webp_url: Some(url.to_string()), ..ImageRefs::default() },
            caption: None,
            width: None,
            ord,
        }
    }

    async fn seed_course(repo: &Repository) -> (i64, i64) {
        let semester_id = repo
            .create_semester(&NewSemester { name: "Semester 3".to_string(), start_year: 2024, end_year: 2025 })
            .await
            .unwrap();
        let course_id = repo
            .create_course(&NewCourse {
                semester_id,
                name: "Algoritma".to_string(),
                code: Some("IF-201".to_string()),
                lecturer: "Bu Ratna".to_string(),
                schedule: "Senin 13:00-15:30".to_string(),
            })
            .await
            .unwrap();
        (semester_id, course_id)
    }

    #[tokio::test]
    async fn test_overview_nesting() {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = Repository::from(&db);
        let (semester_id, course_id) = seed_course(&repo).await;
        let item_id = repo.create_academic_item(course_id, &new_item(ItemKind::Tugas, "Tugas 1")).await.unwrap();
        repo.replace_item_blocks(item_id, &[text_block("deskripsi", 0), image_block("https://c/x.webp", 1)])
            .await
            .unwrap();
        let lab_id = repo
            .create_lab(&NewLab { course_id, title: "Praktikum Algoritma".to_string(), assistant: None })
            .await
            .unwrap();
        repo.create_lab_item(lab_id, &new_item(ItemKind::TugasPraktikum, "TP1")).await.unwrap();
        repo.set_assistants(course_id, &["Andi".to_string(), "Budi".to_string()]).await.unwrap();

        let semesters = repo.archive_overview().await.unwrap();
        assert_eq!(semesters.len(), 1);
        assert_eq!(semesters[0].id, semester_id);
        let course = &semesters[0].courses[0];
        assert_eq!(course.id, course_id);
        assert_eq!(course.items.len(), 1);
        assert_eq!(course.items[0].blocks.len(), 2);
        assert_eq!(course.items[0].blocks[0].kind, BlockKind::Text);
        assert_eq!(course.labs.len(), 1);
        assert_eq!(course.labs[0].items[0].kind, ItemKind::TugasPraktikum);
        assert_eq!(course.assistants.len(), 2);
        assert_eq!(course.assistants[0].name, "Andi");
    }

    #[tokio::test]
    async fn test_block_order_ties_break_by_id() {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = Repository::from(&db);
        let (_, course_id) = seed_course(&repo).await;
        let item_id = repo.create_academic_item(course_id, &new_item(ItemKind::Materi, "Materi 1")).await.unwrap();
        // Same `ord` for all three: insertion order must win.
        repo.replace_item_blocks(item_id, &[text_block("first", 5), text_block("second", 5), text_block("third", 5)])
            .await
            .unwrap();
        let item = repo.academic_item(item_id).await.unwrap().unwrap();
        let contents: Vec<_> = item.blocks.iter().map(|b| b.content.as_deref().unwrap()).collect();
        assert_eq!(contents, ["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_course_delete_cascades() {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = Repository::from(&db);
        let (_, course_id) = seed_course(&repo).await;
        let item_id = repo.create_academic_item(course_id, &new_item(ItemKind::Tugas, "Tugas 1")).await.unwrap();
        repo.replace_item_blocks(item_id, &[text_block("x", 0)]).await.unwrap();
        repo.replace_item_links(
            item_id,
            &[NewLink { title: "Modul".to_string(), url: "https://x".to_string(), platform: None, ord: 0 }],
        )
        .await
        .unwrap();
        let lab_id = repo.create_lab(&NewLab { course_id, title: "Prak".to_string(), assistant: None }).await.unwrap();
        let lab_item_id = repo.create_lab_item(lab_id, &new_item(ItemKind::Materi, "Modul 1")).await.unwrap();

        assert!(repo.delete_course(course_id).await.unwrap());
        assert!(repo.academic_item(item_id).await.unwrap().is_none());
        assert!(repo.lab(lab_id).await.unwrap().is_none());
        assert!(repo.lab_item(lab_item_id).await.unwrap().is_none());
        let (items, labs) = repo.course_contents(course_id).await.unwrap();
        assert!(items.is_empty() && labs.is_empty());
        db.close().await;
    }

    #[tokio::test]
    async fn test_gallery_group_delete_unfiles_items() {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = Repository::from(&db);
        let group_id = repo
            .create_gallery_group(&NewGalleryGroup { title: "Wisuda".to_string(), description: None })
            .await
            .unwrap();
        let item_id = repo
            .create_gallery_item(&NewGalleryItem {
                group_id: Some(group_id),
                title: "Foto 1".to_string(),
                description: None,
                image_webp_url: "https://c/1.webp".to_string(),
                image_original_url: "https://c/1.jpg".to_string(),
                cdn_id: None,
                mirror_id: None,
                shown_on: "2024-07-12".to_string(),
            })
            .await
            .unwrap();

        assert!(repo.delete_gallery_group(group_id).await.unwrap());
        // The item survives, just uncategorised now.
        let item = repo.gallery_item(item_id).await.unwrap().unwrap();
        assert_eq!(item.group_id, None);
        let uncategorised = repo.uncategorised_gallery_items().await.unwrap();
        assert_eq!(uncategorised.len(), 1);
        assert!(repo.gallery_groups().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_blocks_is_wholesale() {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = Repository::from(&db);
        let (_, course_id) = seed_course(&repo).await;
        let item_id = repo.create_academic_item(course_id, &new_item(ItemKind::Tugas, "T1")).await.unwrap();
        repo.replace_item_blocks(item_id, &[text_block("old", 0), text_block("older", 1)]).await.unwrap();
        repo.replace_item_blocks(item_id, &[text_block("new", 0)]).await.unwrap();
        let item = repo.academic_item(item_id).await.unwrap().unwrap();
        assert_eq!(item.blocks.len(), 1);
        assert_eq!(item.blocks[0].content.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_update_missing_rows_report_false() {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = Repository::from(&db);
        let missing = repo
            .update_semester(404, &NewSemester { name: "x".to_string(), start_year: 2024, end_year: 2025 })
            .await
            .unwrap();
        assert!(!missing);
        assert!(!repo.delete_course(404).await.unwrap());
        assert!(!repo.delete_gallery_item(404).await.unwrap());
    }
}
