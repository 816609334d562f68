use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnrollmentStatus {
    Locked,
    Assigned,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Locked => "Locked",
            EnrollmentStatus::Assigned => "Assigned",
            EnrollmentStatus::InProgress => "In Progress",
            EnrollmentStatus::Completed => "Completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Locked" => Some(EnrollmentStatus::Locked),
            "Assigned" => Some(EnrollmentStatus::Assigned),
            "In Progress" | "InProgress" => Some(EnrollmentStatus::InProgress),
            "Completed" => Some(EnrollmentStatus::Completed),
            _ => None,
        }
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, EnrollmentStatus::Locked)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub course_id: String,
    pub progress: f64,
    pub status: EnrollmentStatus,
}

/// Enrollment joined with the catalog fields a caller displays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
    pub id: String,
    pub title: String,
    pub module: Option<String>,
    pub progress: f64,
    pub status: EnrollmentStatus,
    pub target_skill: Option<String>,
    pub parent_id: Option<String>,
    pub sequence: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: String,
    pub course_id: String,
    pub name: String,
    pub assignment_type: String,
    pub skills: Vec<String>,
    pub problem_count: u32,
    pub completion_rate: f64,
    pub status: EnrollmentStatus,
}
