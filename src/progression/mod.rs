//! Course progression
//!
//! A course forest where each course tracks one target skill. Progress is
//! that skill's mastery; a child unlocks once its parent's target skill is
//! fully mastered.

pub mod catalog;
pub mod graph;
pub mod types;

pub use catalog::{AssignmentTemplate, CatalogError, CourseCatalog, CourseNode};
pub use graph::{ProgressionGraph, ProgressionReport};
pub use types::{Assignment, CourseProgress, Enrollment, EnrollmentStatus};
