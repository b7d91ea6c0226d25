//! Population storage and fitness bookkeeping.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::error::{EvolutionError, FitnessError};
use super::fitness::FitnessEvaluator;
use super::gene_space::GeneSpace;
use super::genome::{GenomeRng, Individual, genome_distance};

/// The individuals of one generation. Size is fixed for a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Population {
    members: Vec<Individual>,
}

impl Population {
    /// Draw `size` random individuals within the gene space.
    pub fn initialize(
        size: usize,
        space: &GeneSpace,
        rng: &mut GenomeRng,
    ) -> Result<Self, EvolutionError> {
        if size == 0 {
            return Err(EvolutionError::invalid_state(
                "cannot initialize an empty population",
            ));
        }
        let members = (0..size).map(|_| rng.random_individual(space)).collect();
        Ok(Self { members })
    }

    pub fn from_members(members: Vec<Individual>) -> Self {
        Self { members }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[Individual] {
        &self.members
    }

    pub fn get(&self, index: usize) -> Option<&Individual> {
        self.members.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Individual> {
        self.members.iter()
    }

    /// Swap in the next generation. The size must not change.
    pub fn replace(&mut self, next: Population) -> Result<(), EvolutionError> {
        if next.len() != self.len() {
            return Err(EvolutionError::invalid_state(format!(
                "next generation has {} members, expected {}",
                next.len(),
                self.len()
            )));
        }
        self.members = next.members;
        Ok(())
    }

    /// Score every member. Scores are returned in member order.
    ///
    /// The first failing member (in member order) aborts evaluation.
    pub fn evaluate<E: FitnessEvaluator + ?Sized>(
        &self,
        evaluator: &E,
        parallel: bool,
    ) -> Result<Vec<f64>, EvolutionError> {
        #[cfg(feature = "parallel")]
        {
            if parallel {
                return self
                    .members
                    .par_iter()
                    .map(|ind| score(evaluator, ind))
                    .collect::<Vec<_>>()
                    .into_iter()
                    .collect();
            }
        }
        #[cfg(not(feature = "parallel"))]
        let _ = parallel;

        self.members.iter().map(|ind| score(evaluator, ind)).collect()
    }

    /// Mean pairwise distance between members (0 for fewer than two).
    pub fn diversity(&self, space: &GeneSpace) -> f64 {
        if self.members.len() < 2 {
            return 0.0;
        }

        let mut total_distance = 0.0;
        let mut count = 0;

        for i in 0..self.members.len() {
            for j in (i + 1)..self.members.len() {
                total_distance += genome_distance(&self.members[i], &self.members[j], space);
                count += 1;
            }
        }

        total_distance / count as f64
    }
}

/// Evaluate one individual, rejecting evaluator errors and non-finite scores.
fn score<E: FitnessEvaluator + ?Sized>(
    evaluator: &E,
    individual: &Individual,
) -> Result<f64, EvolutionError> {
    let result = evaluator.evaluate(individual.genes()).and_then(|s| {
        if s.is_finite() {
            Ok(s)
        } else {
            Err(FitnessError::NonFinite(s))
        }
    });

    result.map_err(|source| {
        log::warn!(
            "Fitness evaluation failed for {:?}: {source}",
            individual.genes()
        );
        EvolutionError::FitnessEvaluation {
            genes: individual.genes().to_vec(),
            source,
        }
    })
}

/// Index, member and score of the highest-scoring individual.
///
/// Ties go to the lowest index.
pub fn best<'a>(
    population: &'a Population,
    scores: &[f64],
) -> Result<(usize, &'a Individual, f64), EvolutionError> {
    if population.is_empty() {
        return Err(EvolutionError::invalid_state(
            "cannot pick the best of an empty population",
        ));
    }
    if scores.len() != population.len() {
        return Err(EvolutionError::invalid_state(format!(
            "{} scores for {} members",
            scores.len(),
            population.len()
        )));
    }

    let mut best_idx = 0;
    for (i, s) in scores.iter().enumerate().skip(1) {
        if *s > scores[best_idx] {
            best_idx = i;
        }
    }
    Ok((best_idx, &population.members[best_idx], scores[best_idx]))
}

/// Mean and standard deviation of a score list.
pub fn score_stats(scores: &[f64]) -> (f64, f64) {
    if scores.is_empty() {
        return (0.0, 0.0);
    }
    let n = scores.len() as f64;
    let mean = scores.iter().sum::<f64>() / n;
    let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}
