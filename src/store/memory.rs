use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::mastery::types::{InterventionState, SkillKey, SkillMasteryState};
use crate::progression::types::Enrollment;
use crate::store::{StateStore, StoreError};

/// Process-local store. Lives as long as the process; cleared only by `reset`.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    mastery: RwLock<HashMap<SkillKey, SkillMasteryState>>,
    intervention: RwLock<HashMap<SkillKey, InterventionState>>,
    priors: RwLock<HashMap<String, f64>>,
    enrollments: RwLock<HashMap<String, BTreeMap<String, Enrollment>>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_priors<I, S>(priors: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let store = Self::default();
        {
            let mut map = store.priors.write();
            for (skill, prior) in priors {
                map.insert(skill.into(), prior);
            }
        }
        store
    }

    /// Drops all student state. Priors are catalog data and survive.
    pub fn reset(&self) {
        self.mastery.write().clear();
        self.intervention.write().clear();
        self.enrollments.write().clear();
    }

    pub fn tracked_keys(&self) -> usize {
        self.mastery.read().len()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get_mastery_state(
        &self,
        key: &SkillKey,
    ) -> Result<Option<SkillMasteryState>, StoreError> {
        Ok(self.mastery.read().get(key).copied())
    }

    async fn put_mastery_state(
        &self,
        key: &SkillKey,
        state: &SkillMasteryState,
    ) -> Result<(), StoreError> {
        self.mastery.write().insert(key.clone(), *state);
        Ok(())
    }

    async fn get_intervention_state(
        &self,
        key: &SkillKey,
    ) -> Result<Option<InterventionState>, StoreError> {
        Ok(self.intervention.read().get(key).copied())
    }

    async fn put_intervention_state(
        &self,
        key: &SkillKey,
        state: &InterventionState,
    ) -> Result<(), StoreError> {
        self.intervention.write().insert(key.clone(), *state);
        Ok(())
    }

    async fn get_skill_prior(&self, skill_id: &str) -> Result<Option<f64>, StoreError> {
        Ok(self.priors.read().get(skill_id).copied())
    }

    async fn put_skill_prior(&self, skill_id: &str, prior: f64) -> Result<(), StoreError> {
        self.priors.write().insert(skill_id.to_string(), prior);
        Ok(())
    }

    async fn get_enrollments(&self, student_id: &str) -> Result<Vec<Enrollment>, StoreError> {
        Ok(self
            .enrollments
            .read()
            .get(student_id)
            .map(|courses| courses.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn put_enrollment(
        &self,
        student_id: &str,
        enrollment: &Enrollment,
    ) -> Result<(), StoreError> {
        self.enrollments
            .write()
            .entry(student_id.to_string())
            .or_default()
            .insert(enrollment.course_id.clone(), enrollment.clone());
        Ok(())
    }

    async fn commit_attempt(
        &self,
        key: &SkillKey,
        mastery: &SkillMasteryState,
        intervention: &InterventionState,
    ) -> Result<(), StoreError> {
        let mut mastery_map = self.mastery.write();
        let mut intervention_map = self.intervention.write();
        mastery_map.insert(key.clone(), *mastery);
        intervention_map.insert(key.clone(), *intervention);
        Ok(())
    }

    async fn commit_enrollments(
        &self,
        student_id: &str,
        enrollments: &[Enrollment],
    ) -> Result<(), StoreError> {
        let mut map = self.enrollments.write();
        let courses = map.entry(student_id.to_string()).or_default();
        for enrollment in enrollments {
            courses.insert(enrollment.course_id.clone(), enrollment.clone());
        }
        Ok(())
    }
}
