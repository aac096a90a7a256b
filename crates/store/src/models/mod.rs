mod academic;
mod gallery;
mod kind;

pub use self::academic::{
    AcademicItem, Assistant, ContentBlock, Course, ImageRefs, ItemLink, Lab, LabItem, NewBlock, NewCourse, NewItem,
    NewLab, NewLink, NewSemester, Semester,
};
pub use self::gallery::{GalleryGroup, GalleryItem, NewGalleryGroup, NewGalleryItem};
pub use self::kind::{BlockKind, ItemKind};

pub(crate) use self::academic::{AssistantRow, BlockRow, CourseRow, ItemRow, LabRow, LinkRow, SemesterRow};
pub(crate) use self::gallery::{GalleryGroupRow, GalleryItemRow};
