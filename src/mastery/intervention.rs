//! Remediation hysteresis
//!
//! A student enters remediation on a skill the moment an attempt count
//! exceeds the struggle threshold, and leaves only after a streak of
//! correct, low-hint attempts. Mastery is frozen while remediation is
//! in force or being entered.

use crate::mastery::config::InterventionParams;
use crate::mastery::types::InterventionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Unchanged,
    Entered,
    StreakAdvanced,
    StreakReset,
    Exited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterventionTransition {
    /// Whether the mastery update must be skipped for this attempt.
    pub freeze: bool,
    pub next: InterventionState,
    pub kind: TransitionKind,
}

#[derive(Debug, Clone, Default)]
pub struct InterventionStateMachine {
    params: InterventionParams,
}

impl InterventionStateMachine {
    pub fn new(params: InterventionParams) -> Self {
        Self { params }
    }

    pub fn is_struggling(&self, attempt_count: u32) -> bool {
        attempt_count > self.params.struggle_attempt_threshold
    }

    pub fn step(
        &self,
        current: InterventionState,
        correct: bool,
        attempt_count: u32,
        hints_used: Option<u32>,
    ) -> InterventionTransition {
        let active_before = current.active;
        let trigger_now = self.is_struggling(attempt_count);
        let freeze = active_before || trigger_now;

        if trigger_now && !active_before {
            return InterventionTransition {
                freeze,
                next: InterventionState {
                    active: true,
                    recovery_streak: 0,
                },
                kind: TransitionKind::Entered,
            };
        }

        if !active_before {
            return InterventionTransition {
                freeze,
                next: current,
                kind: TransitionKind::Unchanged,
            };
        }

        // Already remediating: the current attempt feeds the streak even when
        // it would itself count as struggling.
        let used_max_hints =
            hints_used.is_some_and(|hints| hints >= self.params.max_hints_per_question);
        if !correct || used_max_hints {
            return InterventionTransition {
                freeze,
                next: InterventionState {
                    active: true,
                    recovery_streak: 0,
                },
                kind: TransitionKind::StreakReset,
            };
        }

        let streak = current.recovery_streak.saturating_add(1);
        if streak >= self.params.recovery_streak_target {
            InterventionTransition {
                freeze,
                next: InterventionState::default(),
                kind: TransitionKind::Exited,
            }
        } else {
            InterventionTransition {
                freeze,
                next: InterventionState {
                    active: true,
                    recovery_streak: streak,
                },
                kind: TransitionKind::StreakAdvanced,
            }
        }
    }
}
