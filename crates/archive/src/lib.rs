pub mod cache;
mod cleanup;
pub mod error;
mod format;
mod service;
mod tree;

pub use crate::cache::{ArchiveCache, DEFAULT_TTL};
pub use crate::cleanup::CleanupReport;
pub use crate::format::{UNKNOWN_LABEL, format_label};
pub use crate::service::{ArchiveService, DeleteOutcome};
pub use crate::tree::{ArchiveNode, DocumentationImage, NodeLink, UNTITLED, build_tree};
