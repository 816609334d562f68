use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde::Serialize;

use crate::mastery::locks::KeyedLocks;
use crate::mastery::{EngineError, MasteryEngine};
use crate::progression::catalog::{CourseCatalog, CourseNode};
use crate::progression::types::{Assignment, CourseProgress, Enrollment, EnrollmentStatus};

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionReport {
    pub enrollments: Vec<CourseProgress>,
    /// Courses that left `Locked` during this pass.
    pub unlocked: BTreeSet<String>,
    /// Courses that reached `Completed` during this pass.
    pub completed: BTreeSet<String>,
}

/// Derives enrollments from target-skill mastery over an immutable catalog.
/// Unlocks are persisted so a course never returns to `Locked`.
pub struct ProgressionGraph {
    catalog: Arc<CourseCatalog>,
    engine: Arc<MasteryEngine>,
    locks: KeyedLocks<String>,
}

impl ProgressionGraph {
    pub fn new(catalog: Arc<CourseCatalog>, engine: Arc<MasteryEngine>) -> Self {
        Self {
            catalog,
            engine,
            locks: KeyedLocks::new(),
        }
    }

    pub fn catalog(&self) -> &CourseCatalog {
        &self.catalog
    }

    fn unlock_threshold(&self) -> f64 {
        self.engine.config().course_unlock_mastery
    }

    async fn skill_mastery(
        &self,
        student_id: &str,
        skill_id: Option<&str>,
        cache: &mut HashMap<String, f64>,
    ) -> Result<f64, EngineError> {
        // A course without a target skill never progresses through mastery.
        let Some(skill_id) = skill_id else {
            return Ok(0.0);
        };
        if let Some(&mastery) = cache.get(skill_id) {
            return Ok(mastery);
        }
        let mastery = self.engine.current_mastery(student_id, skill_id).await?;
        cache.insert(skill_id.to_string(), mastery);
        Ok(mastery)
    }

    fn derive_status(&self, progress: f64) -> EnrollmentStatus {
        if progress >= self.unlock_threshold() {
            EnrollmentStatus::Completed
        } else if progress > 0.0 {
            EnrollmentStatus::InProgress
        } else {
            EnrollmentStatus::Assigned
        }
    }

    pub async fn sync(&self, student_id: &str) -> Result<ProgressionReport, EngineError> {
        let student_id = student_id.trim();
        if student_id.is_empty() {
            return Err(EngineError::Validation("studentId is required".into()));
        }
        let _guard = self.locks.lock(&student_id.to_string()).await;

        let store = self.engine.store();
        let stored: HashMap<String, Enrollment> = store
            .get_enrollments(student_id)
            .await?
            .into_iter()
            .map(|enrollment| (enrollment.course_id.clone(), enrollment))
            .collect();

        let mut cache = HashMap::new();
        let mut report = ProgressionReport::default();
        let mut changed = Vec::new();

        for course in self.catalog.iter() {
            let previous = stored.get(&course.id);
            let was_locked = !course.starts_unlocked()
                && previous.map_or(true, |enrollment| enrollment.status.is_locked());

            let mut locked = was_locked;
            if was_locked {
                let parent_skill = self
                    .catalog
                    .parent_of(course)
                    .and_then(|parent| parent.target_skill.as_deref());
                let parent_mastery = self.skill_mastery(student_id, parent_skill, &mut cache).await?;
                if parent_mastery >= self.unlock_threshold() {
                    locked = false;
                    report.unlocked.insert(course.id.clone());
                }
            }

            let enrollment = if locked {
                Enrollment {
                    course_id: course.id.clone(),
                    progress: 0.0,
                    status: EnrollmentStatus::Locked,
                }
            } else {
                let progress = self
                    .skill_mastery(student_id, course.target_skill.as_deref(), &mut cache)
                    .await?;
                let status = self.derive_status(progress);
                let was_completed = previous
                    .is_some_and(|enrollment| enrollment.status == EnrollmentStatus::Completed);
                if status == EnrollmentStatus::Completed && !was_completed {
                    report.completed.insert(course.id.clone());
                }
                Enrollment {
                    course_id: course.id.clone(),
                    progress,
                    status,
                }
            };

            report.enrollments.push(course_progress(course, &enrollment));
            if previous != Some(&enrollment) {
                changed.push(enrollment);
            }
        }

        // One write per pass: an unlock is either stored and reported, or neither.
        if !changed.is_empty() {
            store.commit_enrollments(student_id, &changed).await?;
        }
        for course_id in &report.unlocked {
            tracing::info!(student_id, course_id = %course_id, "course unlocked");
        }
        for course_id in &report.completed {
            tracing::info!(student_id, course_id = %course_id, "course completed");
        }

        Ok(report)
    }

    pub async fn compute_enrollments(
        &self,
        student_id: &str,
    ) -> Result<Vec<CourseProgress>, EngineError> {
        Ok(self.sync(student_id).await?.enrollments)
    }

    /// Courses unlocked by this evaluation; already-unlocked courses are not repeated.
    pub async fn compute_unlocks(&self, student_id: &str) -> Result<BTreeSet<String>, EngineError> {
        Ok(self.sync(student_id).await?.unlocked)
    }

    pub async fn compute_assignments(
        &self,
        student_id: &str,
    ) -> Result<Vec<Assignment>, EngineError> {
        let enrollments = self.compute_enrollments(student_id).await?;
        Ok(enrollments
            .iter()
            .filter_map(|progress| {
                self.catalog
                    .get(&progress.id)
                    .map(|course| assignment_for(student_id.trim(), course, progress))
            })
            .collect())
    }
}

fn course_progress(course: &CourseNode, enrollment: &Enrollment) -> CourseProgress {
    CourseProgress {
        id: course.id.clone(),
        title: course.title.clone(),
        module: course.module.clone(),
        progress: enrollment.progress,
        status: enrollment.status,
        target_skill: course.target_skill.clone(),
        parent_id: course.parent_id.clone(),
        sequence: course.sequence,
    }
}

fn assignment_for(student_id: &str, course: &CourseNode, progress: &CourseProgress) -> Assignment {
    Assignment {
        id: format!("{}:{}", student_id, course.id),
        course_id: course.id.clone(),
        name: course.assignment_name(),
        assignment_type: course.assignment_type(),
        skills: course.target_skill.iter().cloned().collect(),
        problem_count: course.problem_count(),
        completion_rate: progress.progress,
        status: progress.status,
    }
}
