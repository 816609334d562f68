#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use parking_lot::Mutex;

use mastery_engine::mastery::{
    AttemptEvent, EngineConfig, InterventionState, MasteryEngine, SkillKey, SkillMasteryState,
};
use mastery_engine::progression::Enrollment;
use mastery_engine::store::{InMemoryStateStore, StateStore, StoreError};

pub fn attempt(student: &str, skill: &str, correct: bool, attempt_count: i64) -> AttemptEvent {
    AttemptEvent {
        student_id: student.to_string(),
        skill_id: skill.to_string(),
        correct,
        attempt_count,
        hints_used: Some(0),
        time_on_task: None,
    }
}

pub fn memory_engine() -> Arc<MasteryEngine> {
    memory_engine_with(EngineConfig::default())
}

pub fn memory_engine_with(config: EngineConfig) -> Arc<MasteryEngine> {
    Arc::new(MasteryEngine::new(config, Arc::new(InMemoryStateStore::new())))
}

pub fn create_test_app() -> Router {
    mastery_engine::create_app().expect("bundled catalog is valid")
}

/// In-memory store whose reads or writes can be switched off.
#[derive(Default)]
pub struct FlakyStore {
    inner: InMemoryStateStore,
    pub fail_writes: AtomicBool,
    pub fail_priors: AtomicBool,
    /// Enrollment records that may still be written; `None` is unlimited.
    pub enrollment_budget: Mutex<Option<usize>>,
}

impl FlakyStore {
    fn check(flag: &AtomicBool) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("connection refused".into()))
        } else {
            Ok(())
        }
    }

    fn spend_enrollment_writes(&self, count: usize) -> Result<(), StoreError> {
        let mut budget = self.enrollment_budget.lock();
        match budget.as_mut() {
            Some(left) if *left < count => {
                Err(StoreError::Unavailable("enrollment write rejected".into()))
            }
            Some(left) => {
                *left -= count;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl StateStore for FlakyStore {
    fn backend(&self) -> &'static str {
        "flaky"
    }

    async fn get_mastery_state(
        &self,
        key: &SkillKey,
    ) -> Result<Option<SkillMasteryState>, StoreError> {
        self.inner.get_mastery_state(key).await
    }

    async fn put_mastery_state(
        &self,
        key: &SkillKey,
        state: &SkillMasteryState,
    ) -> Result<(), StoreError> {
        Self::check(&self.fail_writes)?;
        self.inner.put_mastery_state(key, state).await
    }

    async fn get_intervention_state(
        &self,
        key: &SkillKey,
    ) -> Result<Option<InterventionState>, StoreError> {
        self.inner.get_intervention_state(key).await
    }

    async fn put_intervention_state(
        &self,
        key: &SkillKey,
        state: &InterventionState,
    ) -> Result<(), StoreError> {
        Self::check(&self.fail_writes)?;
        self.inner.put_intervention_state(key, state).await
    }

    async fn get_skill_prior(&self, skill_id: &str) -> Result<Option<f64>, StoreError> {
        Self::check(&self.fail_priors)?;
        self.inner.get_skill_prior(skill_id).await
    }

    async fn put_skill_prior(&self, skill_id: &str, prior: f64) -> Result<(), StoreError> {
        self.inner.put_skill_prior(skill_id, prior).await
    }

    async fn get_enrollments(&self, student_id: &str) -> Result<Vec<Enrollment>, StoreError> {
        self.inner.get_enrollments(student_id).await
    }

    async fn put_enrollment(
        &self,
        student_id: &str,
        enrollment: &Enrollment,
    ) -> Result<(), StoreError> {
        Self::check(&self.fail_writes)?;
        self.spend_enrollment_writes(1)?;
        self.inner.put_enrollment(student_id, enrollment).await
    }

    async fn commit_enrollments(
        &self,
        student_id: &str,
        enrollments: &[Enrollment],
    ) -> Result<(), StoreError> {
        Self::check(&self.fail_writes)?;
        self.spend_enrollment_writes(enrollments.len())?;
        self.inner.commit_enrollments(student_id, enrollments).await
    }
}
