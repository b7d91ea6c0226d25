//! Fitness evaluation for candidate power allocations.
//!
//! Evaluators are pure: the same gene vector always yields the same score and
//! the input is never mutated. Higher scores are better.

use crate::schema::{DispatchProblem, ProblemConfigError};

use super::error::FitnessError;

/// Guard added to denominators in the dispatch objective.
pub const EPSILON: f64 = 1e-6;

/// Maps a gene vector to a scalar fitness score (maximized).
pub trait FitnessEvaluator: Send + Sync {
    /// Score one candidate.
    fn evaluate(&self, genes: &[f64]) -> Result<f64, FitnessError>;

    /// Number of genes this evaluator expects, if it is fixed.
    ///
    /// Checked against the gene space when the engine is configured.
    fn gene_count(&self) -> Option<usize> {
        None
    }
}

impl<E: FitnessEvaluator + ?Sized> FitnessEvaluator for &E {
    fn evaluate(&self, genes: &[f64]) -> Result<f64, FitnessError> {
        (**self).evaluate(genes)
    }

    fn gene_count(&self) -> Option<usize> {
        (**self).gene_count()
    }
}

impl<E: FitnessEvaluator + ?Sized> FitnessEvaluator for Box<E> {
    fn evaluate(&self, genes: &[f64]) -> Result<f64, FitnessError> {
        (**self).evaluate(genes)
    }

    fn gene_count(&self) -> Option<usize> {
        (**self).gene_count()
    }
}

/// Adapts a plain `Fn(&[f64]) -> f64` into a [`FitnessEvaluator`].
pub struct FnEvaluator<F> {
    func: F,
    gene_count: Option<usize>,
}

impl<F> FnEvaluator<F>
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self {
            func,
            gene_count: None,
        }
    }

    /// Declare the expected gene count so mismatches fail at configuration time.
    pub fn with_gene_count(mut self, count: usize) -> Self {
        self.gene_count = Some(count);
        self
    }
}

impl<F> FitnessEvaluator for FnEvaluator<F>
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    fn evaluate(&self, genes: &[f64]) -> Result<f64, FitnessError> {
        Ok((self.func)(genes))
    }

    fn gene_count(&self) -> Option<usize> {
        self.gene_count
    }
}

/// Intermediate terms of the dispatch objective.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatchBreakdown {
    /// Sum of all allocated power (W).
    pub total_power: f64,
    /// Cost-weighted sum of allocated power.
    pub total_cost: f64,
    /// Power produced beyond the load demand (W).
    pub energy_loss: f64,
    /// `load_demand / (total_power + EPSILON)`.
    pub efficiency: f64,
    /// Combined fitness score.
    pub score: f64,
}

/// Objective for the hybrid energy dispatch problem.
///
/// Rewards low cost and low over-production, scaled by supply efficiency:
/// `score = efficiency / (total_cost + energy_loss + EPSILON)`.
///
/// An all-zero allocation scores `load_demand / EPSILON^2`, far above any
/// realistic dispatch. The objective does not special-case it.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchObjective {
    load_demand: f64,
    unit_costs: Vec<f64>,
}

impl DispatchObjective {
    pub fn new(problem: &DispatchProblem) -> Result<Self, ProblemConfigError> {
        problem.validate()?;
        Ok(Self {
            load_demand: problem.load_demand,
            unit_costs: problem.sources.iter().map(|s| s.unit_cost).collect(),
        })
    }

    pub fn load_demand(&self) -> f64 {
        self.load_demand
    }

    pub fn unit_costs(&self) -> &[f64] {
        &self.unit_costs
    }

    /// Compute every term of the objective for one allocation.
    pub fn breakdown(&self, genes: &[f64]) -> Result<DispatchBreakdown, FitnessError> {
        if genes.len() != self.unit_costs.len() {
            return Err(FitnessError::Failed(format!(
                "expected {} genes, got {}",
                self.unit_costs.len(),
                genes.len()
            )));
        }

        let total_power: f64 = genes.iter().sum();
        let total_cost: f64 = genes
            .iter()
            .zip(&self.unit_costs)
            .map(|(power, cost)| power * cost)
            .sum();
        let energy_loss = (total_power - self.load_demand).max(0.0);
        let efficiency = self.load_demand / (total_power + EPSILON);
        let score = (1.0 / (total_cost + energy_loss + EPSILON)) * efficiency;

        Ok(DispatchBreakdown {
            total_power,
            total_cost,
            energy_loss,
            efficiency,
            score,
        })
    }
}

impl FitnessEvaluator for DispatchObjective {
    fn evaluate(&self, genes: &[f64]) -> Result<f64, FitnessError> {
        self.breakdown(genes).map(|b| b.score)
    }

    fn gene_count(&self) -> Option<usize> {
        Some(self.unit_costs.len())
    }
}
