use serde::{Deserialize, Serialize};

use crate::mastery::bkt::{clamp_probability, BktParams};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterventionParams {
    /// Remediation triggers once an attempt count exceeds this.
    pub struggle_attempt_threshold: u32,
    pub max_hints_per_question: u32,
    pub recovery_streak_target: u32,
}

impl Default for InterventionParams {
    fn default() -> Self {
        Self {
            struggle_attempt_threshold: 3,
            max_hints_per_question: 3,
            recovery_streak_target: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZpdThresholds {
    pub challenge_floor: f64,
    pub stretch_floor: f64,
}

impl Default for ZpdThresholds {
    fn default() -> Self {
        Self {
            challenge_floor: 0.6,
            stretch_floor: 0.85,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub bkt: BktParams,
    pub default_prior: f64,
    pub snap_threshold: f64,
    pub intervention: InterventionParams,
    pub zpd: ZpdThresholds,
    pub course_unlock_mastery: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bkt: BktParams::default(),
            default_prior: 0.3,
            snap_threshold: 0.99,
            intervention: InterventionParams::default(),
            zpd: ZpdThresholds::default(),
            course_unlock_mastery: 1.0,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(val) = env_probability("DEFAULT_SKILL_PRIOR") {
            config.default_prior = val;
        }
        if let Some(val) = env_probability("BKT_GUESS") {
            config.bkt.guess = val;
        }
        if let Some(val) = env_probability("BKT_SLIP") {
            config.bkt.slip = val;
        }
        if let Some(val) = env_probability("BKT_TRANSIT") {
            config.bkt.transit = val;
        }
        if let Some(val) = env_probability("MASTERY_SNAP_THRESHOLD") {
            config.snap_threshold = val;
        }
        if let Some(val) = env_parse::<u32>("STRUGGLE_ATTEMPT_THRESHOLD") {
            config.intervention.struggle_attempt_threshold = val;
        }
        if let Some(val) = env_parse::<u32>("MAX_HINTS_PER_QUESTION") {
            config.intervention.max_hints_per_question = val;
        }
        if let Some(val) = env_parse::<u32>("RECOVERY_STREAK_TARGET") {
            config.intervention.recovery_streak_target = val.max(1);
        }
        if let Some(val) = env_probability("ZPD_CHALLENGE_FLOOR") {
            config.zpd.challenge_floor = val;
        }
        if let Some(val) = env_probability("ZPD_STRETCH_FLOOR") {
            config.zpd.stretch_floor = val;
        }
        if let Some(val) = env_probability("COURSE_UNLOCK_MASTERY") {
            config.course_unlock_mastery = val;
        }

        config
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_probability(key: &str) -> Option<f64> {
    env_parse::<f64>(key)
        .filter(|v| v.is_finite())
        .map(clamp_probability)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_shipped_parameters() {
        let config = EngineConfig::default();
        assert_eq!(config.bkt.guess, 0.20);
        assert_eq!(config.bkt.slip, 0.10);
        assert_eq!(config.bkt.transit, 0.15);
        assert_eq!(config.default_prior, 0.3);
        assert_eq!(config.snap_threshold, 0.99);
        assert_eq!(config.intervention.struggle_attempt_threshold, 3);
        assert_eq!(config.course_unlock_mastery, 1.0);
    }
}
