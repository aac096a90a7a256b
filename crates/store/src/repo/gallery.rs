//! Gallery queries: albums with their photos, the uncategorised pool, and
//! the admin write paths.

use super::Repository;
use crate::error::{ErrorKind, Result};
use crate::models::{GalleryGroup, GalleryGroupRow, GalleryItem, GalleryItemRow, NewGalleryGroup, NewGalleryItem};
use exn::ResultExt;
use std::collections::HashMap;
use time::UtcDateTime;

impl Repository {
    /// All gallery groups with their items, in creation order.
    pub async fn gallery_groups(&self) -> Result<Vec<GalleryGroup>> {
        let group_rows: Vec<GalleryGroupRow> = sqlx::query_as(include_str!("../../queries/gallery_groups.sql"))
            .fetch_all(self.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        let item_rows: Vec<GalleryItemRow> = sqlx::query_as(include_str!("../../queries/gallery_items_grouped.sql"))
            .fetch_all(self.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;

        let mut items_by_group: HashMap<i64, Vec<GalleryItem>> = HashMap::new();
        for row in item_rows {
            let item = GalleryItem::try_from(row)?;
            // The query filters on `group_id IS NOT NULL`.
            if let Some(group_id) = item.group_id {
                items_by_group.entry(group_id).or_default().push(item);
            }
        }
        Ok(group_rows
            .into_iter()
            .map(|row| {
                let mut group = GalleryGroup::from(row);
                group.items = items_by_group.remove(&group.id).unwrap_or_default();
                group
            })
            .collect())
    }

    /// Items whose group reference is `NULL` (never filed, or orphaned by a
    /// group delete).
    pub async fn uncategorised_gallery_items(&self) -> Result<Vec<GalleryItem>> {
        let rows: Vec<GalleryItemRow> = sqlx::query_as(include_str!("../../queries/gallery_items_uncategorised.sql"))
            .fetch_all(self.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(GalleryItem::try_from).collect()
    }

    pub async fn gallery_item(&self, id: i64) -> Result<Option<GalleryItem>> {
        let row: Option<GalleryItemRow> = sqlx::query_as(include_str!("../../queries/get_gallery_item.sql"))
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(GalleryItem::try_from).transpose()
    }

    pub async fn create_gallery_group(&self, group: &NewGalleryGroup) -> Result<i64> {
        let result = sqlx::query("INSERT INTO gallery_group (title, description) VALUES (?, ?)")
            .bind(&group.title)
            .bind(&group.description)
            .execute(self.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.last_insert_rowid())
    }

    pub async fn update_gallery_group(&self, id: i64, group: &NewGalleryGroup) -> Result<bool> {
        let result = sqlx::query("UPDATE gallery_group SET title = ?, description = ? WHERE id = ?")
            .bind(&group.title)
            .bind(&group.description)
            .bind(id)
            .execute(self.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    /// Deletes the group row only; member items survive with their
    /// `group_id` set to `NULL` by the store (`ON DELETE SET NULL`).
    pub async fn delete_gallery_group(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM gallery_group WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn create_gallery_item(&self, item: &NewGalleryItem) -> Result<i64> {
        let now = UtcDateTime::now().unix_timestamp();
        let result = sqlx::query(
            r#"
            INSERT INTO gallery_item (group_id, title, description,
                image_webp_url, image_original_url, image_cdn_id, image_mirror_id,
                shown_on, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(item.group_id)
        .bind(&item.title)
        .bind(&item.description)
        .bind(&item.image_webp_url)
        .bind(&item.image_original_url)
        .bind(&item.cdn_id)
        .bind(&item.mirror_id)
        .bind(&item.shown_on)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await
        .or_raise(|| ErrorKind::Database)?;
        Ok(result.last_insert_rowid())
    }

    pub async fn update_gallery_item(&self, id: i64, item: &NewGalleryItem) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE gallery_item SET group_id = ?, title = ?, description = ?,
                image_webp_url = ?, image_original_url = ?,
                image_cdn_id = ?, image_mirror_id = ?,
                shown_on = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(item.group_id)
        .bind(&item.title)
        .bind(&item.description)
        .bind(&item.image_webp_url)
        .bind(&item.image_original_url)
        .bind(&item.cdn_id)
        .bind(&item.mirror_id)
        .bind(&item.shown_on)
        .bind(UtcDateTime::now().unix_timestamp())
        .bind(id)
        .execute(self.pool())
        .await
        .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_gallery_item(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM gallery_item WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }
}
