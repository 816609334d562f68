//! Bayesian Knowledge Tracing
//!
//! Two-state model: a skill is either known or not. One observed attempt
//! revises the probability it is known (guess/slip likelihoods), then a
//! learning transition moves the posterior toward 1 by `transit`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BktParams {
    pub guess: f64,
    pub slip: f64,
    pub transit: f64,
}

impl Default for BktParams {
    fn default() -> Self {
        Self {
            guess: 0.20,
            slip: 0.10,
            transit: 0.15,
        }
    }
}

impl BktParams {
    pub fn clamped(self) -> Self {
        Self {
            guess: clamp_probability(self.guess),
            slip: clamp_probability(self.slip),
            transit: clamp_probability(self.transit),
        }
    }
}

/// NaN counts as an absent value and maps to 0.
pub fn clamp_probability(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

pub fn update_mastery(prior: f64, correct: bool, guess: f64, slip: f64, transit: f64) -> f64 {
    let prior = clamp_probability(prior);
    let guess = clamp_probability(guess);
    let slip = clamp_probability(slip);
    let transit = clamp_probability(transit);

    let (numerator, denominator) = if correct {
        let numerator = prior * (1.0 - slip);
        (numerator, numerator + (1.0 - prior) * guess)
    } else {
        let numerator = prior * slip;
        (numerator, numerator + (1.0 - prior) * (1.0 - guess))
    };

    let posterior = if denominator == 0.0 {
        prior
    } else {
        numerator / denominator
    };

    clamp_probability(posterior + (1.0 - posterior) * transit)
}

/// Stateless estimator bound to one parameter set.
#[derive(Debug, Clone, Copy, Default)]
pub struct MasteryEstimator {
    params: BktParams,
}

impl MasteryEstimator {
    pub fn new(params: BktParams) -> Self {
        Self {
            params: params.clamped(),
        }
    }

    pub fn update(&self, prior: f64, correct: bool) -> f64 {
        update_mastery(
            prior,
            correct,
            self.params.guess,
            self.params.slip,
            self.params.transit,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn correct_answer_with_defaults() {
        // posterior = 0.27 / (0.27 + 0.14) ; next = posterior + (1 - posterior) * 0.15
        let posterior = 0.27 / 0.41;
        let expected = posterior + (1.0 - posterior) * 0.15;
        let next = MasteryEstimator::default().update(0.3, true);
        assert!((next - expected).abs() < EPS, "got {next}, expected {expected}");
    }

    #[test]
    fn incorrect_answer_with_defaults() {
        let posterior = 0.03 / (0.03 + 0.7 * 0.8);
        let expected = posterior + (1.0 - posterior) * 0.15;
        let next = MasteryEstimator::default().update(0.3, false);
        assert!((next - expected).abs() < EPS);
        assert!(next < 0.3);
    }

    #[test]
    fn zero_prior_lands_on_transit() {
        assert!((update_mastery(0.0, true, 0.2, 0.1, 0.15) - 0.15).abs() < EPS);
        assert!((update_mastery(0.0, false, 0.2, 0.1, 0.15) - 0.15).abs() < EPS);
    }

    #[test]
    fn zero_denominator_keeps_prior() {
        // prior 0 and guess 0: nothing can explain a correct answer
        assert_eq!(update_mastery(0.0, true, 0.0, 0.1, 0.0), 0.0);
        // prior 1 and slip 1 on a correct answer
        assert_eq!(update_mastery(1.0, true, 0.2, 1.0, 0.0), 1.0);
    }

    #[test]
    fn full_mastery_is_absorbing() {
        assert_eq!(update_mastery(1.0, false, 0.2, 0.1, 0.15), 1.0);
        assert_eq!(update_mastery(1.0, true, 0.2, 0.1, 0.15), 1.0);
    }

    #[test]
    fn out_of_range_inputs_are_clamped() {
        let wild = update_mastery(1.7, true, -0.4, 2.0, f64::NAN);
        let tame = update_mastery(1.0, true, 0.0, 1.0, 0.0);
        assert_eq!(wild, tame);
        assert_eq!(clamp_probability(f64::NAN), 0.0);
        assert_eq!(clamp_probability(-3.0), 0.0);
        assert_eq!(clamp_probability(3.0), 1.0);
    }

    #[test]
    fn estimator_clamps_its_params() {
        let estimator = MasteryEstimator::new(BktParams {
            guess: 1.5,
            slip: -0.1,
            transit: 0.15,
        });
        assert_eq!(
            estimator.update(0.4, true),
            update_mastery(0.4, true, 1.0, 0.0, 0.15)
        );
    }
}
