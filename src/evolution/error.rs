//! Errors surfaced by the evolution engine.

use crate::schema::EvolutionConfigError;

/// Failure reported by a fitness evaluator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FitnessError {
    #[error("Evaluator returned a non-finite score: {0}")]
    NonFinite(f64),
    #[error("Evaluator failed: {0}")]
    Failed(String),
}

/// Errors returned from an optimization run.
#[derive(Debug, thiserror::Error)]
pub enum EvolutionError {
    #[error("Invalid configuration: {0}")]
    Configuration(#[from] EvolutionConfigError),
    #[error("Fitness evaluation failed for genes {genes:?}: {source}")]
    FitnessEvaluation {
        genes: Vec<f64>,
        #[source]
        source: FitnessError,
    },
    #[error("Invalid engine state: {0}")]
    InvalidState(String),
}

impl EvolutionError {
    pub(crate) fn invalid_state(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        log::warn!("Invalid engine state: {msg}");
        Self::InvalidState(msg)
    }
}
