//! Per-(student, skill) state storage
//!
//! The engine owns the algorithms; a `StateStore` only keeps values.
//! Absent reads mean "not created yet" and the first write creates the
//! record. Implementations never retry internally.

mod memory;
mod sqlite;

use async_trait::async_trait;

use crate::mastery::types::{InterventionState, SkillKey, SkillMasteryState};
use crate::progression::types::Enrollment;

pub use memory::InMemoryStateStore;
pub use sqlite::SqliteStateStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("state store unavailable: {0}")]
    Unavailable(String),
    #[error("corrupt stored value in {field}: {detail}")]
    Corrupt { field: &'static str, detail: String },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[async_trait]
pub trait StateStore: Send + Sync {
    fn backend(&self) -> &'static str;

    async fn get_mastery_state(&self, key: &SkillKey)
        -> Result<Option<SkillMasteryState>, StoreError>;

    async fn put_mastery_state(
        &self,
        key: &SkillKey,
        state: &SkillMasteryState,
    ) -> Result<(), StoreError>;

    async fn get_intervention_state(
        &self,
        key: &SkillKey,
    ) -> Result<Option<InterventionState>, StoreError>;

    async fn put_intervention_state(
        &self,
        key: &SkillKey,
        state: &InterventionState,
    ) -> Result<(), StoreError>;

    async fn get_skill_prior(&self, skill_id: &str) -> Result<Option<f64>, StoreError>;

    async fn put_skill_prior(&self, skill_id: &str, prior: f64) -> Result<(), StoreError>;

    async fn get_enrollments(&self, student_id: &str) -> Result<Vec<Enrollment>, StoreError>;

    async fn put_enrollment(
        &self,
        student_id: &str,
        enrollment: &Enrollment,
    ) -> Result<(), StoreError>;

    /// Writes both halves of one attempt's outcome. Backends that can make
    /// this atomic should override it.
    async fn commit_attempt(
        &self,
        key: &SkillKey,
        mastery: &SkillMasteryState,
        intervention: &InterventionState,
    ) -> Result<(), StoreError> {
        self.put_mastery_state(key, mastery).await?;
        self.put_intervention_state(key, intervention).await
    }

    /// Writes every enrollment change from one progression pass. Backends
    /// that can make this atomic should override it.
    async fn commit_enrollments(
        &self,
        student_id: &str,
        enrollments: &[Enrollment],
    ) -> Result<(), StoreError> {
        for enrollment in enrollments {
            self.put_enrollment(student_id, enrollment).await?;
        }
        Ok(())
    }
}
