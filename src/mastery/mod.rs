//! Mastery estimation core
//!
//! - BKT estimator: one posterior update plus a learning transition
//! - Intervention state machine: remediation entry/exit with hysteresis
//! - ZPD classifier: difficulty band from mastery
//! - MasteryEngine: applies attempts through a `StateStore` under per-key locks

pub mod bkt;
pub mod config;
pub mod engine;
pub mod error;
pub mod intervention;
pub mod locks;
pub mod types;
pub mod zpd;

pub use bkt::{update_mastery, BktParams, MasteryEstimator};
pub use config::EngineConfig;
pub use engine::{DifficultySelection, MasteryEngine};
pub use error::EngineError;
pub use intervention::{InterventionStateMachine, InterventionTransition, TransitionKind};
pub use types::*;
pub use zpd::{ZpdBand, ZpdClassifier};
