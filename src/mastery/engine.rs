use std::sync::Arc;

use serde::Serialize;

use crate::mastery::bkt::{clamp_probability, MasteryEstimator};
use crate::mastery::config::EngineConfig;
use crate::mastery::error::EngineError;
use crate::mastery::intervention::{InterventionStateMachine, TransitionKind};
use crate::mastery::locks::KeyedLocks;
use crate::mastery::types::{
    AttemptEvent, InterventionState, MasterySnapshot, SkillKey, SkillMasteryState,
};
use crate::mastery::zpd::{ZpdBand, ZpdClassifier};
use crate::store::{StateStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultySelection {
    pub mastery: f64,
    pub zpd_status: ZpdBand,
    pub intervention_active: bool,
}

/// Applies attempts to per-(student, skill) state. Calls for the same key
/// are serialized; calls for different keys run independently.
pub struct MasteryEngine {
    config: EngineConfig,
    estimator: MasteryEstimator,
    intervention: InterventionStateMachine,
    classifier: ZpdClassifier,
    store: Arc<dyn StateStore>,
    locks: KeyedLocks<SkillKey>,
}

impl MasteryEngine {
    pub fn new(config: EngineConfig, store: Arc<dyn StateStore>) -> Self {
        let estimator = MasteryEstimator::new(config.bkt);
        let intervention = InterventionStateMachine::new(config.intervention.clone());
        let classifier = ZpdClassifier::new(config.zpd.clone(), config.default_prior);
        Self {
            config,
            estimator,
            intervention,
            classifier,
            store,
            locks: KeyedLocks::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn StateStore> {
        Arc::clone(&self.store)
    }

    async fn lookup_prior(&self, skill_id: &str) -> Result<f64, StoreError> {
        Ok(match self.store.get_skill_prior(skill_id).await? {
            Some(prior) => checked_probability(prior, "skill_prior", skill_id),
            None => self.config.default_prior,
        })
    }

    /// Priors are non-critical: a failing store degrades to the default prior.
    pub async fn skill_prior(&self, skill_id: &str) -> f64 {
        self.lookup_prior(skill_id).await.unwrap_or_else(|err| {
            tracing::warn!(skill_id, error = %err, "skill prior unavailable, using default prior");
            self.config.default_prior
        })
    }

    pub async fn seed_priors<I>(&self, priors: I) -> Result<usize, EngineError>
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        let mut seeded = 0;
        for (skill_id, prior) in priors {
            let prior = checked_probability(prior, "skill_prior", &skill_id);
            self.store.put_skill_prior(&skill_id, prior).await?;
            seeded += 1;
        }
        tracing::info!(count = seeded, "skill priors seeded");
        Ok(seeded)
    }

    async fn stored_state(&self, key: &SkillKey) -> Result<Option<SkillMasteryState>, EngineError> {
        let state = self.store.get_mastery_state(key).await?;
        Ok(state.map(|mut state| {
            state.mastery = checked_probability(state.mastery, "mastery", &key.to_string());
            state
        }))
    }

    async fn intervention_state(&self, key: &SkillKey) -> Result<InterventionState, EngineError> {
        Ok(self
            .store
            .get_intervention_state(key)
            .await?
            .unwrap_or_default())
    }

    /// Current mastery without creating state: the stored value, else the prior.
    pub async fn current_mastery(&self, student_id: &str, skill_id: &str) -> Result<f64, EngineError> {
        let key = SkillKey::new(student_id, skill_id);
        match self.stored_state(&key).await? {
            Some(state) => Ok(state.mastery),
            None => Ok(self.skill_prior(skill_id).await),
        }
    }

    pub async fn snapshot(&self, student_id: &str, skill_id: &str) -> Result<MasterySnapshot, EngineError> {
        if student_id.trim().is_empty() || skill_id.trim().is_empty() {
            return Err(EngineError::Validation(
                "studentId and skillId are required".into(),
            ));
        }
        let key = SkillKey::new(student_id.trim(), skill_id.trim());
        let _guard = self.locks.lock(&key).await;

        let state = match self.stored_state(&key).await? {
            Some(state) => state,
            None => match self.lookup_prior(&key.skill_id).await {
                Ok(prior) => {
                    let initial = SkillMasteryState::initial(prior);
                    self.store.put_mastery_state(&key, &initial).await?;
                    tracing::debug!(student_id = %key.student_id, skill_id = %key.skill_id, mastery = initial.mastery, "mastery state created");
                    initial
                }
                // The stand-in default only answers this read; it is never stored.
                Err(err) => {
                    tracing::warn!(student_id = %key.student_id, skill_id = %key.skill_id, error = %err, "skill prior unavailable, snapshot not persisted");
                    SkillMasteryState::initial(self.config.default_prior)
                }
            },
        };
        let intervention = self.intervention_state(&key).await?;
        Ok(MasterySnapshot::combine(&state, &intervention))
    }

    pub async fn submit_attempt(&self, event: &AttemptEvent) -> Result<MasterySnapshot, EngineError> {
        let attempt = event.validate()?;
        let key = attempt.key;
        let _guard = self.locks.lock(&key).await;

        let prior = match self.stored_state(&key).await? {
            Some(state) => state.mastery,
            None => self.skill_prior(&key.skill_id).await,
        };
        let intervention = self.intervention_state(&key).await?;

        let transition = self.intervention.step(
            intervention,
            attempt.correct,
            attempt.attempt_count,
            attempt.hints_used,
        );

        let next = if transition.freeze {
            prior
        } else {
            let updated = self.estimator.update(prior, attempt.correct);
            if updated >= self.config.snap_threshold {
                tracing::debug!(student_id = %key.student_id, skill_id = %key.skill_id, updated, "mastery snapped to 1.0");
                1.0
            } else {
                updated
            }
        };
        let next = checked_probability(next, "mastery", &key.to_string());

        let mastery_state = SkillMasteryState {
            mastery: next,
            velocity: next - prior,
            attempt_count: attempt.attempt_count,
        };

        if let Err(err) = self
            .store
            .commit_attempt(&key, &mastery_state, &transition.next)
            .await
        {
            tracing::error!(student_id = %key.student_id, skill_id = %key.skill_id, error = %err, "attempt not applied");
            return Err(err.into());
        }

        match transition.kind {
            TransitionKind::Entered => tracing::info!(
                student_id = %key.student_id,
                skill_id = %key.skill_id,
                attempt_count = attempt.attempt_count,
                frozen_mastery = next,
                "remediation entered"
            ),
            TransitionKind::Exited => tracing::info!(
                student_id = %key.student_id,
                skill_id = %key.skill_id,
                "remediation exited"
            ),
            _ => {}
        }
        tracing::debug!(
            student_id = %key.student_id,
            skill_id = %key.skill_id,
            correct = attempt.correct,
            hints_used = ?attempt.hints_used,
            time_on_task_ms = ?attempt.time_on_task,
            prior,
            mastery = next,
            "attempt applied"
        );

        Ok(MasterySnapshot::combine(&mastery_state, &transition.next))
    }

    pub async fn select_difficulty(
        &self,
        student_id: Option<&str>,
        skill_id: &str,
        explicit_override: Option<ZpdBand>,
    ) -> Result<DifficultySelection, EngineError> {
        let (mastery, intervention_active) = match student_id.filter(|s| !s.trim().is_empty()) {
            Some(student_id) => {
                let snapshot = self.snapshot(student_id, skill_id).await?;
                (Some(snapshot.mastery), snapshot.intervention_active)
            }
            None => (None, false),
        };

        let zpd_status = self
            .classifier
            .classify(mastery, explicit_override, intervention_active);
        Ok(DifficultySelection {
            mastery: mastery.unwrap_or(self.config.default_prior),
            zpd_status,
            intervention_active,
        })
    }
}

fn checked_probability(value: f64, what: &'static str, subject: &str) -> f64 {
    if (0.0..=1.0).contains(&value) {
        return value;
    }
    let clamped = clamp_probability(value);
    tracing::warn!(what, subject, value, clamped, "probability outside [0, 1] clamped");
    clamped
}
