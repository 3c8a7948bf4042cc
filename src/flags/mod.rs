//! Feature flag evaluation.

pub mod evaluator;
pub mod types;

pub use evaluator::{evaluate, evaluate_at};
pub use types::{FeatureFlags, FlagRequest};
