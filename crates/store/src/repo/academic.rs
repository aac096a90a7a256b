//! Academic-archive queries: the nested overview load, per-entity detail
//! loaders, subtree loaders for file cleanup, and the admin write paths.

use super::Repository;
use crate::error::{ErrorKind, Result};
use crate::models::{
    AcademicItem, AssistantRow, BlockRow, ContentBlock, CourseRow, ItemLink, ItemRow, Lab, LabItem, LabRow, LinkRow,
    NewBlock, NewCourse, NewItem, NewLab, NewLink, NewSemester, Semester, SemesterRow,
};
use crate::overview::{self, OverviewRows};
use exn::ResultExt;
use tracing::instrument;

const INSERT_ACADEMIC_ITEM: &str = r#"
    INSERT INTO academic_item (course_id, kind, title,
        hero_image_webp_url, hero_image_original_url, hero_image_cdn_id, hero_image_mirror_id)
    VALUES (?, ?, ?, ?, ?, ?, ?)
"#;
const INSERT_LAB_ITEM: &str = r#"
    INSERT INTO lab_item (lab_id, kind, title,
        hero_image_webp_url, hero_image_original_url, hero_image_cdn_id, hero_image_mirror_id)
    VALUES (?, ?, ?, ?, ?, ?, ?)
"#;
const UPDATE_ACADEMIC_ITEM: &str = r#"
    UPDATE academic_item SET kind = ?, title = ?,
        hero_image_webp_url = ?, hero_image_original_url = ?,
        hero_image_cdn_id = ?, hero_image_mirror_id = ?
    WHERE id = ?
"#;
const UPDATE_LAB_ITEM: &str = r#"
    UPDATE lab_item SET kind = ?, title = ?,
        hero_image_webp_url = ?, hero_image_original_url = ?,
        hero_image_cdn_id = ?, hero_image_mirror_id = ?
    WHERE id = ?
"#;

impl Repository {
    // =========================================================================
    // Overview (archive tree source)
    // =========================================================================

    /// Load the full nested archive overview in one round of queries.
    ///
    /// Ten flat selects (one per table), stitched into the nested
    /// `Semester -> Course -> (AcademicItem, Lab -> LabItem)` graph by the
    /// overview assembler. This is the single source the archive tree is
    /// built from; the archive cache sits in front of it.
    #[instrument(skip(self))]
    pub async fn archive_overview(&self) -> Result<Vec<Semester>> {
        let rows = OverviewRows {
            semesters: self.fetch_all::<SemesterRow>(include_str!("../../queries/overview_semesters.sql")).await?,
            courses: self.fetch_all::<CourseRow>(include_str!("../../queries/overview_courses.sql")).await?,
            items: self.fetch_all::<ItemRow>(include_str!("../../queries/overview_items.sql")).await?,
            labs: self.fetch_all::<LabRow>(include_str!("../../queries/overview_labs.sql")).await?,
            lab_items: self.fetch_all::<ItemRow>(include_str!("../../queries/overview_lab_items.sql")).await?,
            item_blocks: self.fetch_all::<BlockRow>(include_str!("../../queries/overview_item_blocks.sql")).await?,
            lab_item_blocks: self
                .fetch_all::<BlockRow>(include_str!("../../queries/overview_lab_item_blocks.sql"))
                .await?,
            item_links: self.fetch_all::<LinkRow>(include_str!("../../queries/overview_item_links.sql")).await?,
            lab_item_links: self
                .fetch_all::<LinkRow>(include_str!("../../queries/overview_lab_item_links.sql"))
                .await?,
            assistants: self.fetch_all::<AssistantRow>(include_str!("../../queries/overview_assistants.sql")).await?,
        };
        overview::assemble(rows)
    }

    async fn fetch_all<R>(&self, sql: &str) -> Result<Vec<R>>
    where
        R: for<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow> + Send + Unpin,
    {
        sqlx::query_as(sql).fetch_all(&self.pool).await.or_raise(|| ErrorKind::Database)
    }

    // =========================================================================
    // Detail loaders
    // =========================================================================

    /// Get one academic item with its ordered blocks and links.
    pub async fn academic_item(&self, id: i64) -> Result<Option<AcademicItem>> {
        let row: Option<ItemRow> = sqlx::query_as(include_str!("../../queries/get_academic_item.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let Some(row) = row else { return Ok(None) };
        let mut item = row.into_academic()?;
        item.blocks = self.item_blocks(id, false).await?;
        item.links = self.item_links(id, false).await?;
        Ok(Some(item))
    }

    /// Get one lab item with its ordered blocks and links.
    pub async fn lab_item(&self, id: i64) -> Result<Option<LabItem>> {
        let row: Option<ItemRow> = sqlx::query_as(include_str!("../../queries/get_lab_item.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let Some(row) = row else { return Ok(None) };
        let mut item = row.into_lab_item()?;
        item.blocks = self.item_blocks(id, true).await?;
        item.links = self.item_links(id, true).await?;
        Ok(Some(item))
    }

    async fn item_blocks(&self, item_id: i64, lab: bool) -> Result<Vec<ContentBlock>> {
        let sql = if lab {
            include_str!("../../queries/blocks_for_lab_item.sql")
        } else {
            include_str!("../../queries/blocks_for_item.sql")
        };
        let rows: Vec<BlockRow> =
            sqlx::query_as(sql).bind(item_id).fetch_all(&self.pool).await.or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(ContentBlock::try_from).collect()
    }

    async fn item_links(&self, item_id: i64, lab: bool) -> Result<Vec<ItemLink>> {
        let sql = if lab {
            include_str!("../../queries/links_for_lab_item.sql")
        } else {
            include_str!("../../queries/links_for_item.sql")
        };
        let rows: Vec<LinkRow> =
            sqlx::query_as(sql).bind(item_id).fetch_all(&self.pool).await.or_raise(|| ErrorKind::Database)?;
        Ok(rows.into_iter().map(ItemLink::from).collect())
    }

    /// Get one lab with all its items (blocks and links included).
    pub async fn lab(&self, id: i64) -> Result<Option<Lab>> {
        let row: Option<LabRow> = sqlx::query_as(include_str!("../../queries/get_lab.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let Some(row) = row else { return Ok(None) };
        let items: Vec<ItemRow> = sqlx::query_as(include_str!("../../queries/lab_items_for_lab.sql"))
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let blocks: Vec<BlockRow> = sqlx::query_as(include_str!("../../queries/lab_blocks_for_lab.sql"))
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let links: Vec<LinkRow> = sqlx::query_as(include_str!("../../queries/lab_links_for_lab.sql"))
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let mut lab = Lab::from(row);
        lab.items = overview::hydrate_lab_items(items, blocks, links)?;
        Ok(Some(lab))
    }

    /// Everything under a course that can carry externally stored files:
    /// its academic items and its labs (items hydrated with blocks, links
    /// left empty since cleanup doesn't need them).
    pub async fn course_contents(&self, course_id: i64) -> Result<(Vec<AcademicItem>, Vec<Lab>)> {
        let item_rows: Vec<ItemRow> = sqlx::query_as(include_str!("../../queries/items_for_course.sql"))
            .bind(course_id)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let block_rows: Vec<BlockRow> = sqlx::query_as(include_str!("../../queries/blocks_for_course.sql"))
            .bind(course_id)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let items = overview::hydrate_academic_items(item_rows, block_rows, Vec::new())?;

        let lab_rows: Vec<LabRow> = sqlx::query_as(include_str!("../../queries/labs_for_course.sql"))
            .bind(course_id)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let lab_item_rows: Vec<ItemRow> = sqlx::query_as(include_str!("../../queries/lab_items_for_course.sql"))
            .bind(course_id)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let lab_block_rows: Vec<BlockRow> = sqlx::query_as(include_str!("../../queries/lab_blocks_for_course.sql"))
            .bind(course_id)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let lab_items = overview::hydrate_lab_items(lab_item_rows, lab_block_rows, Vec::new())?;
        let labs = overview::hydrate_labs(lab_rows, lab_items);

        Ok((items, labs))
    }

    // =========================================================================
    // Semester / Course writes
    // =========================================================================

    pub async fn create_semester(&self, semester: &NewSemester) -> Result<i64> {
        let result = sqlx::query("INSERT INTO semester (name, start_year, end_year) VALUES (?, ?, ?)")
            .bind(&semester.name)
            .bind(semester.start_year)
            .bind(semester.end_year)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.last_insert_rowid())
    }

    /// Returns `false` if no semester with that id exists.
    pub async fn update_semester(&self, id: i64, semester: &NewSemester) -> Result<bool> {
        let result = sqlx::query("UPDATE semester SET name = ?, start_year = ?, end_year = ? WHERE id = ?")
            .bind(&semester.name)
            .bind(semester.start_year)
            .bind(semester.end_year)
            .bind(id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    /// Cascades to courses and everything beneath them.
    pub async fn delete_semester(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM semester WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn create_course(&self, course: &NewCourse) -> Result<i64> {
        let result =
            sqlx::query("INSERT INTO course (semester_id, name, code, lecturer, schedule) VALUES (?, ?, ?, ?, ?)")
                .bind(course.semester_id)
                .bind(&course.name)
                .bind(&course.code)
                .bind(&course.lecturer)
                .bind(&course.schedule)
                .execute(&self.pool)
                .await
                .or_raise(|| ErrorKind::Database)?;
        Ok(result.last_insert_rowid())
    }

    pub async fn update_course(&self, id: i64, course: &NewCourse) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE course SET semester_id = ?, name = ?, code = ?, lecturer = ?, schedule = ? WHERE id = ?",
        )
        .bind(course.semester_id)
        .bind(&course.name)
        .bind(&course.code)
        .bind(&course.lecturer)
        .bind(&course.schedule)
        .bind(id)
        .execute(&self.pool)
        .await
        .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    /// Row delete only; external file cleanup for the course subtree is the
    /// caller's responsibility and must happen BEFORE this (the cascade
    /// erases the file ids).
    pub async fn delete_course(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM course WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Item writes
    // =========================================================================

    pub async fn create_academic_item(&self, course_id: i64, item: &NewItem) -> Result<i64> {
        self.insert_item(INSERT_ACADEMIC_ITEM, course_id, item).await
    }

    pub async fn create_lab_item(&self, lab_id: i64, item: &NewItem) -> Result<i64> {
        self.insert_item(INSERT_LAB_ITEM, lab_id, item).await
    }

    async fn insert_item(&self, sql: &str, parent_id: i64, item: &NewItem) -> Result<i64> {
        let result = sqlx::query(sql)
            .bind(parent_id)
            .bind(item.kind.code())
            .bind(&item.title)
            .bind(&item.hero.webp_url)
            .bind(&item.hero.original_url)
            .bind(&item.hero.cdn_id)
            .bind(&item.hero.mirror_id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.last_insert_rowid())
    }

    pub async fn update_academic_item(&self, id: i64, item: &NewItem) -> Result<bool> {
        self.update_item(UPDATE_ACADEMIC_ITEM, id, item).await
    }

    pub async fn update_lab_item(&self, id: i64, item: &NewItem) -> Result<bool> {
        self.update_item(UPDATE_LAB_ITEM, id, item).await
    }

    async fn update_item(&self, sql: &str, id: i64, item: &NewItem) -> Result<bool> {
        let result = sqlx::query(sql)
            .bind(item.kind.code())
            .bind(&item.title)
            .bind(&item.hero.webp_url)
            .bind(&item.hero.original_url)
            .bind(&item.hero.cdn_id)
            .bind(&item.hero.mirror_id)
            .bind(id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    /// Cascades to the item's blocks and links.
    pub async fn delete_academic_item(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM academic_item WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    /// Cascades to the item's blocks and links.
    pub async fn delete_lab_item(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM lab_item WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Lab writes
    // =========================================================================

    pub async fn create_lab(&self, lab: &NewLab) -> Result<i64> {
        let result = sqlx::query("INSERT INTO lab (course_id, title, assistant) VALUES (?, ?, ?)")
            .bind(lab.course_id)
            .bind(&lab.title)
            .bind(&lab.assistant)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.last_insert_rowid())
    }

    pub async fn update_lab(&self, id: i64, lab: &NewLab) -> Result<bool> {
        let result = sqlx::query("UPDATE lab SET course_id = ?, title = ?, assistant = ? WHERE id = ?")
            .bind(lab.course_id)
            .bind(&lab.title)
            .bind(&lab.assistant)
            .bind(id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    /// Cascades to lab items and their blocks/links.
    pub async fn delete_lab(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM lab WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Block / link / assistant writes
    // =========================================================================

    /// Replace an item's blocks wholesale (delete + insert in one
    /// transaction). The admin editor always submits the full block list,
    /// so there's no point diffing.
    pub async fn replace_item_blocks(&self, item_id: i64, blocks: &[NewBlock]) -> Result<()> {
        self.replace_blocks("item_block", item_id, blocks).await
    }

    pub async fn replace_lab_item_blocks(&self, item_id: i64, blocks: &[NewBlock]) -> Result<()> {
        self.replace_blocks("lab_item_block", item_id, blocks).await
    }

    async fn replace_blocks(&self, table: &str, item_id: i64, blocks: &[NewBlock]) -> Result<()> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        sqlx::query(&format!("DELETE FROM {table} WHERE item_id = ?"))
            .bind(item_id)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        for block in blocks {
            sqlx::query(&format!(
                r#"
                INSERT INTO {table} (item_id, kind, content,
                    image_webp_url, image_original_url, image_cdn_id, image_mirror_id,
                    caption, width, ord)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#
            ))
            .bind(item_id)
            .bind(block.kind.code())
            .bind(&block.content)
            .bind(&block.image.webp_url)
            .bind(&block.image.original_url)
            .bind(&block.image.cdn_id)
            .bind(&block.image.mirror_id)
            .bind(&block.caption)
            .bind(&block.width)
            .bind(block.ord)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)
    }

    pub async fn replace_item_links(&self, item_id: i64, links: &[NewLink]) -> Result<()> {
        self.replace_links("item_link", item_id, links).await
    }

    pub async fn replace_lab_item_links(&self, item_id: i64, links: &[NewLink]) -> Result<()> {
        self.replace_links("lab_item_link", item_id, links).await
    }

    async fn replace_links(&self, table: &str, item_id: i64, links: &[NewLink]) -> Result<()> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        sqlx::query(&format!("DELETE FROM {table} WHERE item_id = ?"))
            .bind(item_id)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        for link in links {
            sqlx::query(&format!("INSERT INTO {table} (item_id, title, url, platform, ord) VALUES (?, ?, ?, ?, ?)"))
                .bind(item_id)
                .bind(&link.title)
                .bind(&link.url)
                .bind(&link.platform)
                .bind(link.ord)
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)
    }

    /// Replace a course's assistant roster wholesale.
    pub async fn set_assistants(&self, course_id: i64, names: &[String]) -> Result<()> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        sqlx::query("DELETE FROM assistant WHERE course_id = ?")
            .bind(course_id)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        for name in names {
            sqlx::query("INSERT INTO assistant (course_id, name) VALUES (?, ?)")
                .bind(course_id)
                .bind(name)
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)
    }
}
