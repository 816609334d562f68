use serde::{Deserialize, Serialize};

use crate::mastery::config::ZpdThresholds;

/// Difficulty band for the next practice problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZpdBand {
    Support,
    Challenge,
    Stretch,
}

impl ZpdBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZpdBand::Support => "support",
            ZpdBand::Challenge => "challenge",
            ZpdBand::Stretch => "stretch",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "support" => Some(ZpdBand::Support),
            "challenge" => Some(ZpdBand::Challenge),
            "stretch" => Some(ZpdBand::Stretch),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ZpdClassifier {
    thresholds: ZpdThresholds,
    default_prior: f64,
}

impl ZpdClassifier {
    pub fn new(thresholds: ZpdThresholds, default_prior: f64) -> Self {
        Self {
            thresholds,
            default_prior,
        }
    }

    pub fn band_for(&self, mastery: f64) -> ZpdBand {
        if mastery < self.thresholds.challenge_floor {
            ZpdBand::Support
        } else if mastery < self.thresholds.stretch_floor {
            ZpdBand::Challenge
        } else {
            ZpdBand::Stretch
        }
    }

    /// An explicit band wins over mastery; remediation overrides both.
    pub fn classify(
        &self,
        mastery: Option<f64>,
        explicit_override: Option<ZpdBand>,
        intervention_active: bool,
    ) -> ZpdBand {
        if intervention_active {
            return ZpdBand::Support;
        }
        explicit_override
            .unwrap_or_else(|| self.band_for(mastery.unwrap_or(self.default_prior)))
    }
}
