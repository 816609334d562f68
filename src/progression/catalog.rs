use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const BUILTIN_CATALOG: &str = include_str!("../../config/course_catalog.json");

pub const DEFAULT_PROBLEM_COUNT: u32 = 10;
pub const DEFAULT_ASSIGNMENT_TYPE: &str = "Practice";

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid catalog json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("course id must not be empty")]
    EmptyId,
    #[error("duplicate course id: {0}")]
    DuplicateCourse(String),
    #[error("course {course} names unknown parent {parent}")]
    UnknownParent { course: String, parent: String },
    #[error("course {0} is part of a dependency cycle")]
    Cycle(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentTemplate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub assignment_type: Option<String>,
    #[serde(default)]
    pub problem_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseNode {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub target_skill: Option<String>,
    #[serde(default)]
    pub sequence: Option<i32>,
    /// Seeds the course as assigned even though it has a parent.
    #[serde(default)]
    pub unlocked: bool,
    #[serde(default)]
    pub assignment: AssignmentTemplate,
}

impl CourseNode {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn starts_unlocked(&self) -> bool {
        self.is_root() || self.unlocked
    }

    pub fn assignment_name(&self) -> String {
        self.assignment
            .name
            .clone()
            .unwrap_or_else(|| format!("{} Practice", self.title))
    }

    pub fn assignment_type(&self) -> String {
        self.assignment
            .assignment_type
            .clone()
            .unwrap_or_else(|| DEFAULT_ASSIGNMENT_TYPE.to_string())
    }

    pub fn problem_count(&self) -> u32 {
        self.assignment.problem_count.unwrap_or(DEFAULT_PROBLEM_COUNT)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    courses: Vec<CourseNode>,
}

/// Immutable course forest, held in display order.
#[derive(Debug, Clone)]
pub struct CourseCatalog {
    courses: Vec<CourseNode>,
    index: HashMap<String, usize>,
}

impl CourseCatalog {
    pub fn new(mut courses: Vec<CourseNode>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for course in &courses {
            if course.id.trim().is_empty() {
                return Err(CatalogError::EmptyId);
            }
            if !seen.insert(course.id.as_str()) {
                return Err(CatalogError::DuplicateCourse(course.id.clone()));
            }
        }
        for course in &courses {
            if let Some(parent) = &course.parent_id {
                if !seen.contains(parent.as_str()) {
                    return Err(CatalogError::UnknownParent {
                        course: course.id.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }

        // sequence ascending with missing sequences last, then title
        courses.sort_by(|a, b| {
            let seq = match (a.sequence, b.sequence) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            };
            seq.then_with(|| a.title.cmp(&b.title))
        });

        let index = courses
            .iter()
            .enumerate()
            .map(|(i, course)| (course.id.clone(), i))
            .collect();
        let catalog = Self { courses, index };
        catalog.check_acyclic()?;
        Ok(catalog)
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::new(file.courses)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json_str(BUILTIN_CATALOG)
    }

    fn check_acyclic(&self) -> Result<(), CatalogError> {
        for course in &self.courses {
            let mut current = course;
            let mut steps = 0;
            while let Some(parent) = self.parent_of(current) {
                steps += 1;
                if parent.id == course.id || steps > self.courses.len() {
                    return Err(CatalogError::Cycle(course.id.clone()));
                }
                current = parent;
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&CourseNode> {
        self.index.get(id).map(|&i| &self.courses[i])
    }

    pub fn parent_of(&self, course: &CourseNode) -> Option<&CourseNode> {
        course.parent_id.as_deref().and_then(|id| self.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &CourseNode> {
        self.courses.iter()
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }
}
