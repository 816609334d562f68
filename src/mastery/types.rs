use serde::{Deserialize, Serialize};

use crate::mastery::error::EngineError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillKey {
    pub student_id: String,
    pub skill_id: String,
}

impl SkillKey {
    pub fn new(student_id: impl Into<String>, skill_id: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            skill_id: skill_id.into(),
        }
    }
}

impl std::fmt::Display for SkillKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.student_id, self.skill_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillMasteryState {
    pub mastery: f64,
    /// Signed change produced by the last update.
    pub velocity: f64,
    pub attempt_count: u32,
}

impl SkillMasteryState {
    pub fn initial(prior: f64) -> Self {
        Self {
            mastery: prior,
            velocity: 0.0,
            attempt_count: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterventionState {
    pub active: bool,
    pub recovery_streak: u32,
}

/// One practice submission as received from a caller, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptEvent {
    pub student_id: String,
    pub skill_id: String,
    pub correct: bool,
    pub attempt_count: i64,
    #[serde(default)]
    pub hints_used: Option<i64>,
    #[serde(default)]
    pub time_on_task: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedAttempt {
    pub key: SkillKey,
    pub correct: bool,
    pub attempt_count: u32,
    pub hints_used: Option<u32>,
    pub time_on_task: Option<u64>,
}

impl AttemptEvent {
    pub fn validate(&self) -> Result<ValidatedAttempt, EngineError> {
        if self.student_id.trim().is_empty() {
            return Err(EngineError::Validation("studentId must not be empty".into()));
        }
        if self.skill_id.trim().is_empty() {
            return Err(EngineError::Validation("skillId must not be empty".into()));
        }
        let attempt_count = u32::try_from(self.attempt_count).map_err(|_| {
            EngineError::Validation(format!(
                "attemptCount out of range: {}",
                self.attempt_count
            ))
        })?;
        let hints_used = self
            .hints_used
            .map(|hints| {
                u32::try_from(hints).map_err(|_| {
                    EngineError::Validation(format!("hintsUsed out of range: {hints}"))
                })
            })
            .transpose()?;
        let time_on_task = self
            .time_on_task
            .map(|ms| {
                u64::try_from(ms).map_err(|_| {
                    EngineError::Validation(format!("timeOnTask out of range: {ms}"))
                })
            })
            .transpose()?;

        Ok(ValidatedAttempt {
            key: SkillKey::new(self.student_id.trim(), self.skill_id.trim()),
            correct: self.correct,
            attempt_count,
            hints_used,
            time_on_task,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterySnapshot {
    pub mastery: f64,
    pub velocity: f64,
    pub attempt_count: u32,
    pub intervention_active: bool,
    pub recovery_streak: u32,
}

impl MasterySnapshot {
    pub fn combine(state: &SkillMasteryState, intervention: &InterventionState) -> Self {
        Self {
            mastery: state.mastery,
            velocity: state.velocity,
            attempt_count: state.attempt_count,
            intervention_active: intervention.active,
            recovery_streak: intervention.recovery_streak,
        }
    }
}
