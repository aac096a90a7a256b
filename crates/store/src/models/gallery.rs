//! Gallery domain models and their row structs.
//!
//! The gallery shares the store (and the external providers) with the
//! academic archive but is not part of the archive tree; deleting a group
//! un-files its items instead of deleting them.

use crate::error::{Error, ErrorKind, Result};
use exn::ResultExt;
use serde::Serialize;
use time::UtcDateTime;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GalleryGroup {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub items: Vec<GalleryItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GalleryItem {
    pub id: i64,
    /// `None` means uncategorised (either never filed, or its group was
    /// deleted out from under it).
    pub group_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub image_webp_url: String,
    pub image_original_url: String,
    pub cdn_id: Option<String>,
    pub mirror_id: Option<String>,
    /// Display date as entered by the admin; free-form, not parsed.
    pub shown_on: String,
    pub created_at: UtcDateTime,
    pub updated_at: UtcDateTime,
}

#[derive(Debug, Clone)]
pub struct NewGalleryGroup {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewGalleryItem {
    pub group_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub image_webp_url: String,
    pub image_original_url: String,
    pub cdn_id: Option<String>,
    pub mirror_id: Option<String>,
    pub shown_on: String,
}

#[derive(sqlx::FromRow)]
pub(crate) struct GalleryGroupRow {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
}

impl From<GalleryGroupRow> for GalleryGroup {
    fn from(row: GalleryGroupRow) -> Self {
        Self { id: row.id, title: row.title, description: row.description, items: Vec::new() }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct GalleryItemRow {
    pub(crate) id: i64,
    pub(crate) group_id: Option<i64>,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) image_webp_url: String,
    pub(crate) image_original_url: String,
    pub(crate) image_cdn_id: Option<String>,
    pub(crate) image_mirror_id: Option<String>,
    pub(crate) shown_on: String,
    pub(crate) created_at: i64,
    pub(crate) updated_at: i64,
}

impl TryFrom<GalleryItemRow> for GalleryItem {
    type Error = Error;
    fn try_from(row: GalleryItemRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            group_id: row.group_id,
            title: row.title,
            description: row.description,
            image_webp_url: row.image_webp_url,
            image_original_url: row.image_original_url,
            cdn_id: row.image_cdn_id,
            mirror_id: row.image_mirror_id,
            shown_on: row.shown_on,
            created_at: UtcDateTime::from_unix_timestamp(row.created_at)
                .or_raise(|| ErrorKind::InvalidData("creation date"))?,
            updated_at: UtcDateTime::from_unix_timestamp(row.updated_at)
                .or_raise(|| ErrorKind::InvalidData("update date"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_to_model() {
        let created = UtcDateTime::now();
        let row = GalleryItemRow {
            id: 1,
            group_id: None,
            title: "Wisuda 2024".to_string(),
            description: None,
            image_webp_url: "https://cdn.example/wisuda.webp".to_string(),
            image_original_url: "https://cdn.example/wisuda.jpg".to_string(),
            image_cdn_id: Some("ik-abc".to_string()),
            image_mirror_id: None,
            shown_on: "12 Juli 2024".to_string(),
            created_at: created.unix_timestamp(),
            updated_at: created.unix_timestamp(),
        };
        let model = GalleryItem::try_from(row).unwrap();
        assert_eq!(model.group_id, None);
        // Unix timestamps are measured in seconds; nanoseconds don't survive.
        assert_eq!(model.created_at, created.replace_nanosecond(0).unwrap());
    }
}
