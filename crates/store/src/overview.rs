//! Assembly of the flat overview query results into the nested
//! `Semester -> Course -> (AcademicItem, Lab -> LabItem)` graph.
//!
//! SQLite returns each table as a flat, ordered list; this module stitches
//! those lists back together by parent id. Per-parent ordering is whatever
//! the queries specified (`id` for siblings, `ord, id` for blocks and
//! links), since pushing into per-parent buckets preserves row order.

use crate::error::Result;
use crate::models::{
    AcademicItem, AssistantRow, BlockRow, ContentBlock, Course, CourseRow, ItemLink, ItemRow, Lab, LabItem, LabRow,
    LinkRow, Semester, SemesterRow,
};
use std::collections::HashMap;

/// Everything the overview queries return, one field per table.
pub(crate) struct OverviewRows {
    pub(crate) semesters: Vec<SemesterRow>,
    pub(crate) courses: Vec<CourseRow>,
    pub(crate) items: Vec<ItemRow>,
    pub(crate) labs: Vec<LabRow>,
    pub(crate) lab_items: Vec<ItemRow>,
    pub(crate) item_blocks: Vec<BlockRow>,
    pub(crate) lab_item_blocks: Vec<BlockRow>,
    pub(crate) item_links: Vec<LinkRow>,
    pub(crate) lab_item_links: Vec<LinkRow>,
    pub(crate) assistants: Vec<AssistantRow>,
}

fn group_by<T>(rows: Vec<T>, key: impl Fn(&T) -> i64) -> HashMap<i64, Vec<T>> {
    let mut map: HashMap<i64, Vec<T>> = HashMap::new();
    for row in rows {
        map.entry(key(&row)).or_default().push(row);
    }
    map
}

pub(crate) fn hydrate_academic_items(
    rows: Vec<ItemRow>,
    blocks: Vec<BlockRow>,
    links: Vec<LinkRow>,
) -> Result<Vec<AcademicItem>> {
    let mut blocks_by_item = group_by(blocks, |b| b.item_id);
    let mut links_by_item = group_by(links, |l| l.item_id);
    rows.into_iter()
        .map(|row| {
            let mut item = row.into_academic()?;
            item.blocks = blocks_by_item
                .remove(&item.id)
                .unwrap_or_default()
                .into_iter()
                .map(ContentBlock::try_from)
                .collect::<Result<_>>()?;
            item.links = links_by_item.remove(&item.id).unwrap_or_default().into_iter().map(ItemLink::from).collect();
            Ok(item)
        })
        .collect()
}

pub(crate) fn hydrate_lab_items(rows: Vec<ItemRow>, blocks: Vec<BlockRow>, links: Vec<LinkRow>) -> Result<Vec<LabItem>> {
    let mut blocks_by_item = group_by(blocks, |b| b.item_id);
    let mut links_by_item = group_by(links, |l| l.item_id);
    rows.into_iter()
        .map(|row| {
            let mut item = row.into_lab_item()?;
            item.blocks = blocks_by_item
                .remove(&item.id)
                .unwrap_or_default()
                .into_iter()
                .map(ContentBlock::try_from)
                .collect::<Result<_>>()?;
            item.links = links_by_item.remove(&item.id).unwrap_or_default().into_iter().map(ItemLink::from).collect();
            Ok(item)
        })
        .collect()
}

pub(crate) fn hydrate_labs(rows: Vec<LabRow>, items: Vec<LabItem>) -> Vec<Lab> {
    let mut items_by_lab = group_by(items, |i| i.lab_id);
    rows.into_iter()
        .map(|row| {
            let mut lab = Lab::from(row);
            lab.items = items_by_lab.remove(&lab.id).unwrap_or_default();
            lab
        })
        .collect()
}

pub(crate) fn assemble(rows: OverviewRows) -> Result<Vec<Semester>> {
    let items = hydrate_academic_items(rows.items, rows.item_blocks, rows.item_links)?;
    let lab_items = hydrate_lab_items(rows.lab_items, rows.lab_item_blocks, rows.lab_item_links)?;
    let labs = hydrate_labs(rows.labs, lab_items);

    let mut items_by_course = group_by(items, |i| i.course_id);
    let mut labs_by_course = group_by(labs, |l| l.course_id);
    let mut assistants_by_course = group_by(rows.assistants, |a| a.course_id);

    let mut courses_by_semester: HashMap<i64, Vec<Course>> = HashMap::new();
    for row in rows.courses {
        let mut course = Course::from(row);
        course.items = items_by_course.remove(&course.id).unwrap_or_default();
        course.labs = labs_by_course.remove(&course.id).unwrap_or_default();
        course.assistants =
            assistants_by_course.remove(&course.id).unwrap_or_default().into_iter().map(Into::into).collect();
        courses_by_semester.entry(course.semester_id).or_default().push(course);
    }

    Ok(rows
        .semesters
        .into_iter()
        .map(|row| {
            let mut semester = Semester::from(row);
            semester.courses = courses_by_semester.remove(&semester.id).unwrap_or_default();
            semester
        })
        .collect())
}
