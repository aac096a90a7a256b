//! Domain models for the academic side of the archive, plus the private
//! row structs they are hydrated from.
//!
//! The nested `Semester -> Course -> (AcademicItem, Lab -> LabItem) ->
//! (ContentBlock, ItemLink)` shape mirrors the overview query: rows come
//! back flat, get validated once here at the boundary, and are stitched
//! together by the overview assembler.

use crate::error::{Error, ErrorKind, Result};
use crate::models::{BlockKind, ItemKind};
use exn::ResultExt;
use serde::Serialize;

/// URLs and provider file ids for one stored image.
///
/// An image can be backed by zero, one, or two external providers (a CDN
/// copy and a mirror copy); the two file ids are fully independent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImageRefs {
    pub webp_url: Option<String>,
    pub original_url: Option<String>,
    pub cdn_id: Option<String>,
    pub mirror_id: Option<String>,
}

impl ImageRefs {
    /// Whether any external provider holds a file for this image.
    pub fn has_stored_file(&self) -> bool {
        self.cdn_id.is_some() || self.mirror_id.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Semester {
    pub id: i64,
    pub name: String,
    pub start_year: i64,
    pub end_year: i64,
    pub courses: Vec<Course>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Course {
    pub id: i64,
    pub semester_id: i64,
    pub name: String,
    pub code: Option<String>,
    pub lecturer: String,
    pub schedule: String,
    pub items: Vec<AcademicItem>,
    pub labs: Vec<Lab>,
    pub assistants: Vec<Assistant>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcademicItem {
    pub id: i64,
    pub course_id: i64,
    pub kind: ItemKind,
    pub title: String,
    pub hero: ImageRefs,
    pub blocks: Vec<ContentBlock>,
    pub links: Vec<ItemLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lab {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub assistant: Option<String>,
    pub items: Vec<LabItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabItem {
    pub id: i64,
    pub lab_id: i64,
    pub kind: ItemKind,
    pub title: String,
    pub hero: ImageRefs,
    pub blocks: Vec<ContentBlock>,
    pub links: Vec<ItemLink>,
}

/// One ordered fragment of an item's body: a text paragraph or an image.
///
/// Blocks sort ascending by `ord` with ties broken by `id` (stable by
/// insertion); the ordering is applied in SQL, not here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentBlock {
    pub id: i64,
    pub item_id: i64,
    pub kind: BlockKind,
    pub content: Option<String>,
    pub image: ImageRefs,
    pub caption: Option<String>,
    /// Layout hint for the frontend ("full" | "half"); opaque to this crate.
    pub width: Option<String>,
    pub ord: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemLink {
    pub id: i64,
    pub item_id: i64,
    pub title: String,
    pub url: String,
    pub platform: Option<String>,
    pub ord: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assistant {
    pub id: i64,
    pub course_id: i64,
    pub name: String,
}

// =========================================================================
// Write-path parameter structs
// =========================================================================

#[derive(Debug, Clone)]
pub struct NewSemester {
    pub name: String,
    pub start_year: i64,
    pub end_year: i64,
}

#[derive(Debug, Clone)]
pub struct NewCourse {
    pub semester_id: i64,
    pub name: String,
    pub code: Option<String>,
    pub lecturer: String,
    pub schedule: String,
}

/// Shared shape for new academic and lab items; the parent id is passed
/// separately since it targets a different table per item flavour.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub kind: ItemKind,
    pub title: String,
    pub hero: ImageRefs,
}

#[derive(Debug, Clone)]
pub struct NewLab {
    pub course_id: i64,
    pub title: String,
    pub assistant: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewBlock {
    pub kind: BlockKind,
    pub content: Option<String>,
    pub image: ImageRefs,
    pub caption: Option<String>,
    pub width: Option<String>,
    pub ord: i64,
}

#[derive(Debug, Clone)]
pub struct NewLink {
    pub title: String,
    pub url: String,
    pub platform: Option<String>,
    pub ord: i64,
}

// =========================================================================
// Rows
// =========================================================================

#[derive(sqlx::FromRow)]
pub(crate) struct SemesterRow {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) start_year: i64,
    pub(crate) end_year: i64,
}

impl From<SemesterRow> for Semester {
    fn from(row: SemesterRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            start_year: row.start_year,
            end_year: row.end_year,
            courses: Vec::new(),
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct CourseRow {
    pub(crate) id: i64,
    pub(crate) semester_id: i64,
    pub(crate) name: String,
    pub(crate) code: Option<String>,
    pub(crate) lecturer: String,
    pub(crate) schedule: String,
}

impl From<CourseRow> for Course {
    fn from(row: CourseRow) -> Self {
        Self {
            id: row.id,
            semester_id: row.semester_id,
            name: row.name,
            code: row.code,
            lecturer: row.lecturer,
            schedule: row.schedule,
            items: Vec::new(),
            labs: Vec::new(),
            assistants: Vec::new(),
        }
    }
}

/// Shared row shape for `academic_item` and `lab_item`; queries alias the
/// parent foreign key to `parent_id` so both tables deserialise identically.
#[derive(sqlx::FromRow)]
pub(crate) struct ItemRow {
    pub(crate) id: i64,
    pub(crate) parent_id: i64,
    pub(crate) kind: String,
    pub(crate) title: String,
    pub(crate) hero_image_webp_url: Option<String>,
    pub(crate) hero_image_original_url: Option<String>,
    pub(crate) hero_image_cdn_id: Option<String>,
    pub(crate) hero_image_mirror_id: Option<String>,
}

impl ItemRow {
    fn hero(&mut self) -> ImageRefs {
        ImageRefs {
            webp_url: self.hero_image_webp_url.take(),
            original_url: self.hero_image_original_url.take(),
            cdn_id: self.hero_image_cdn_id.take(),
            mirror_id: self.hero_image_mirror_id.take(),
        }
    }

    pub(crate) fn into_academic(mut self) -> Result<AcademicItem> {
        Ok(AcademicItem {
            hero: self.hero(),
            kind: self.kind.parse()?,
            id: self.id,
            course_id: self.parent_id,
            title: self.title,
            blocks: Vec::new(),
            links: Vec::new(),
        })
    }

    pub(crate) fn into_lab_item(mut self) -> Result<LabItem> {
        Ok(LabItem {
            hero: self.hero(),
            kind: self.kind.parse()?,
            id: self.id,
            lab_id: self.parent_id,
            title: self.title,
            blocks: Vec::new(),
            links: Vec::new(),
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct LabRow {
    pub(crate) id: i64,
    pub(crate) course_id: i64,
    pub(crate) title: String,
    pub(crate) assistant: Option<String>,
}

impl From<LabRow> for Lab {
    fn from(row: LabRow) -> Self {
        Self {
            id: row.id,
            course_id: row.course_id,
            title: row.title,
            assistant: row.assistant,
            items: Vec::new(),
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct BlockRow {
    pub(crate) id: i64,
    pub(crate) item_id: i64,
    pub(crate) kind: String,
    pub(crate) content: Option<String>,
    pub(crate) image_webp_url: Option<String>,
    pub(crate) image_original_url: Option<String>,
    pub(crate) image_cdn_id: Option<String>,
    pub(crate) image_mirror_id: Option<String>,
    pub(crate) caption: Option<String>,
    pub(crate) width: Option<String>,
    pub(crate) ord: i64,
}

impl TryFrom<BlockRow> for ContentBlock {
    type Error = Error;
    fn try_from(row: BlockRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            item_id: row.item_id,
            kind: row.kind.parse::<BlockKind>().or_raise(|| ErrorKind::InvalidData("block kind"))?,
            content: row.content,
            image: ImageRefs {
                webp_url: row.image_webp_url,
                original_url: row.image_original_url,
                cdn_id: row.image_cdn_id,
                mirror_id: row.image_mirror_id,
            },
            caption: row.caption,
            width: row.width,
            ord: row.ord,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct LinkRow {
    pub(crate) id: i64,
    pub(crate) item_id: i64,
    pub(crate) title: String,
    pub(crate) url: String,
    pub(crate) platform: Option<String>,
    pub(crate) ord: i64,
}

impl From<LinkRow> for ItemLink {
    fn from(row: LinkRow) -> Self {
        Self {
            id: row.id,
            item_id: row.item_id,
            title: row.title,
            url: row.url,
            platform: row.platform,
            ord: row.ord,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct AssistantRow {
    pub(crate) id: i64,
    pub(crate) course_id: i64,
    pub(crate) name: String,
}

impl From<AssistantRow> for Assistant {
    fn from(row: AssistantRow) -> Self {
        Self { id: row.id, course_id: row.course_id, name: row.name }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_row(kind: &str) -> ItemRow {
        ItemRow {
            id: 7,
            parent_id: 3,
            kind: kind.to_string(),
            title: "Tugas 1".to_string(),
            hero_image_webp_url: Some("https://cdn.example/7.webp".to_string()),
            hero_image_original_url: None,
            hero_image_cdn_id: Some("ik-7".to_string()),
            hero_image_mirror_id: None,
        }
    }

    #[test]
    fn test_item_row_to_model() {
        let item = item_row("tugas").into_academic().unwrap();
        assert_eq!(item.kind, ItemKind::Tugas);
        assert_eq!(item.course_id, 3);
        assert!(item.hero.has_stored_file());
        assert!(item.blocks.is_empty());
    }

    #[test]
    fn test_item_row_unknown_kind_rejected() {
        assert!(item_row("quiz").into_academic().is_err());
        assert!(item_row("quiz").into_lab_item().is_err());
    }

    #[test]
    fn test_image_refs_stored_file() {
        assert!(!ImageRefs::default().has_stored_file());
        let refs = ImageRefs { mirror_id: Some("gd-1".to_string()), ..ImageRefs::default() };
        assert!(refs.has_stored_file());
    }
}
