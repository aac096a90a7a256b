//! Builds the navigable display tree from the nested relational overview.
//!
//! The tree has four levels: semester nodes, course nodes, category group
//! nodes, and leaf nodes for the individual items. Lab items across all of
//! a course's labs are pooled and nested one level deeper under a single
//! synthetic "Praktikum" group. Grouping is by formatted category label,
//! in first-seen order; within a group, items keep their load order.

use crate::format::format_label;
use arsip_store::models::{BlockKind, ContentBlock, Course, ImageRefs, ItemLink, Semester};
use serde::Serialize;

/// Fallback title for an item saved without one.
pub const UNTITLED: &str = "Tanpa Judul";

/// One node of the archive display tree.
///
/// A single struct covers all four levels; fields that only apply to one
/// level are optional and omitted from the serialised form when absent.
/// Leaf nodes always carry a `documentation` list (possibly empty) and
/// never have children.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ArchiveNode {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<Vec<DocumentationImage>>,
    /// Omitted entirely (not an empty list) when the item has no links.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<NodeLink>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lecturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assistants: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_year: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_year: Option<i64>,
    pub children: Vec<ArchiveNode>,
}

/// One image pulled from an item's content blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentationImage {
    pub image: String,
    pub caption: String,
    pub subtitle: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeLink {
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

/// Build the full archive tree from the nested overview, semesters in
/// load order.
pub fn build_tree(semesters: Vec<Semester>) -> Vec<ArchiveNode> {
    semesters.into_iter().map(semester_node).collect()
}

fn semester_node(semester: Semester) -> ArchiveNode {
    ArchiveNode {
        id: semester.id.to_string(),
        title: semester.name,
        start_year: Some(semester.start_year),
        end_year: Some(semester.end_year),
        children: semester.courses.into_iter().map(course_node).collect(),
        ..ArchiveNode::default()
    }
}

fn course_node(course: Course) -> ArchiveNode {
    let assistants = course.assistants.into_iter().map(|a| a.name).collect();

    let item_pairs = course
        .items
        .into_iter()
        .map(|item| {
            (format_label(Some(item.kind.code())), leaf_node(item.id, item.title, item.blocks, item.links))
        })
        .collect();
    let mut children: Vec<ArchiveNode> = group_by_label(item_pairs)
        .into_iter()
        .map(|(label, members)| group_node(format!("{}-type-{}", course.id, label.to_lowercase()), label, members))
        .collect();

    // Lab items across all of the course's labs merge into one pool.
    let lab_pairs: Vec<(String, ArchiveNode)> = course
        .labs
        .into_iter()
        .flat_map(|lab| lab.items)
        .map(|item| {
            (format_label(Some(item.kind.code())), leaf_node(item.id, item.title, item.blocks, item.links))
        })
        .collect();
    if !lab_pairs.is_empty() {
        let sub_groups = group_by_label(lab_pairs)
            .into_iter()
            .map(|(label, members)| {
                let slug = label.to_lowercase().replace(' ', "-");
                group_node(format!("{}-praktikum-type-{slug}", course.id), label, members)
            })
            .collect();
        children.push(group_node(
            format!("{}-type-praktikum", course.id),
            "Praktikum".to_string(),
            sub_groups,
        ));
    }

    ArchiveNode {
        id: course.id.to_string(),
        title: course.name,
        lecturer: Some(course.lecturer),
        schedule: Some(course.schedule),
        assistants: Some(assistants),
        children,
        ..ArchiveNode::default()
    }
}

fn group_node(id: String, title: String, children: Vec<ArchiveNode>) -> ArchiveNode {
    ArchiveNode { id, title, children, ..ArchiveNode::default() }
}

/// Bucket `(label, leaf)` pairs by label equality, labels in first-seen
/// order, members in their original order. The label sets are tiny (one
/// entry per item category), so a linear scan beats a map here.
fn group_by_label(pairs: Vec<(String, ArchiveNode)>) -> Vec<(String, Vec<ArchiveNode>)> {
    let mut groups: Vec<(String, Vec<ArchiveNode>)> = Vec::new();
    for (label, node) in pairs {
        match groups.iter_mut().find(|(existing, _)| *existing == label) {
            Some((_, members)) => members.push(node),
            None => groups.push((label, vec![node])),
        }
    }
    groups
}

/// Turn one terminal item into a leaf display node.
///
/// The description is the first text block with non-empty content; the
/// documentation list collects every image block that actually has a URL,
/// in block order. Malformed blocks are skipped, never an error.
fn leaf_node(id: i64, title: String, blocks: Vec<ContentBlock>, links: Vec<ItemLink>) -> ArchiveNode {
    let description = blocks
        .iter()
        .find(|block| {
            block.kind == BlockKind::Text && block.content.as_deref().is_some_and(|c| !c.is_empty())
        })
        .and_then(|block| block.content.clone());
    let documentation = blocks
        .iter()
        .filter(|block| block.kind == BlockKind::Image)
        .filter_map(|block| {
            Some(DocumentationImage {
                image: display_url(&block.image)?.to_string(),
                caption: block.caption.clone().unwrap_or_default(),
                subtitle: String::new(),
            })
        })
        .collect();
    let links = if links.is_empty() {
        None
    } else {
        Some(
            links
                .into_iter()
                .map(|link| NodeLink { title: link.title, url: link.url, platform: link.platform })
                .collect(),
        )
    };
    ArchiveNode {
        id: id.to_string(),
        title: if title.is_empty() { UNTITLED.to_string() } else { title },
        description,
        documentation: Some(documentation),
        links,
        ..ArchiveNode::default()
    }
}

/// The URL an image is served from: the processed copy when present,
/// otherwise the original upload.
fn display_url(image: &ImageRefs) -> Option<&str> {
    image
        .webp_url
        .as_deref()
        .filter(|url| !url.is_empty())
        .or_else(|| image.original_url.as_deref().filter(|url| !url.is_empty()))
}
