//! Genome manipulation utilities for the genetic algorithm.
//!
//! Provides random generation, crossover, mutation and reproduction. All
//! operators keep every gene inside its [`GeneSpace`] bound; out-of-range
//! values are clamped.

use rand::prelude::*;
use serde::Serialize;

use crate::schema::{CrossoverMethod, GeneticAlgorithmConfig, MutationMethod};

use super::error::EvolutionError;
use super::gene_space::{GeneBounds, GeneSpace};

/// One candidate solution: a gene per decision variable.
///
/// Genes cannot be changed after construction; operators build new individuals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Individual {
    genes: Vec<f64>,
}

impl Individual {
    /// Create an individual, checking it against the gene space.
    pub fn new(genes: Vec<f64>, space: &GeneSpace) -> Result<Self, EvolutionError> {
        if !space.contains(&genes) {
            return Err(EvolutionError::invalid_state(format!(
                "genes {genes:?} do not conform to a gene space of {} genes",
                space.gene_count()
            )));
        }
        Ok(Self { genes })
    }

    /// Wrap genes already known to be in bounds.
    fn in_bounds(genes: Vec<f64>, space: &GeneSpace) -> Self {
        debug_assert!(space.contains(&genes));
        Self { genes }
    }

    #[inline]
    pub fn genes(&self) -> &[f64] {
        &self.genes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }
}

/// Random number generator wrapper for genome operations.
///
/// A run owns exactly one of these; every random decision (initialization,
/// parent sampling, crossover, mutation) draws from it in a fixed order.
#[derive(Debug, Clone)]
pub struct GenomeRng {
    rng: StdRng,
}

impl GenomeRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Access the underlying generator.
    pub(crate) fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Generate a random individual, each gene uniform within its bound.
    pub fn random_individual(&mut self, space: &GeneSpace) -> Individual {
        let genes = space.iter().map(|b| self.uniform(*b)).collect();
        Individual::in_bounds(genes, space)
    }

    /// Uniform random in bounds.
    fn uniform(&mut self, bounds: GeneBounds) -> f64 {
        self.rng.gen_range(bounds.low..=bounds.high)
    }

    /// Gaussian mutation: add noise to a value.
    pub fn gaussian_mutate(&mut self, value: f64, strength: f64, bounds: GeneBounds) -> f64 {
        let noise: f64 = self.rng.sample(rand_distr::StandardNormal);
        let mutated = value + noise * strength * bounds.width();
        bounds.clamp(mutated)
    }

    /// Combine two parents' genes into a child gene vector.
    pub fn crossover(
        &mut self,
        parent1: &[f64],
        parent2: &[f64],
        method: CrossoverMethod,
    ) -> Vec<f64> {
        match method {
            CrossoverMethod::SinglePoint => {
                if parent1.len() < 2 {
                    return parent1.to_vec();
                }
                let point = self.rng.gen_range(1..parent1.len());
                parent1[..point]
                    .iter()
                    .chain(&parent2[point..])
                    .copied()
                    .collect()
            }
            CrossoverMethod::Uniform => parent1
                .iter()
                .zip(parent2)
                .map(|(a, b)| if self.rng.gen_bool(0.5) { *a } else { *b })
                .collect(),
            CrossoverMethod::Blend => {
                let t = self.rng.r#gen::<f64>();
                parent1
                    .iter()
                    .zip(parent2)
                    .map(|(a, b)| blend(*a, *b, t))
                    .collect()
            }
        }
    }

    /// Mutate genes in place, each with probability `rate`.
    pub fn mutate(
        &mut self,
        genes: &mut [f64],
        method: MutationMethod,
        rate: f64,
        space: &GeneSpace,
    ) {
        if rate <= 0.0 {
            return;
        }
        for (gene, bounds) in genes.iter_mut().zip(space.iter()) {
            if self.rng.r#gen::<f64>() < rate {
                *gene = match method {
                    MutationMethod::RandomReset => self.uniform(*bounds),
                    MutationMethod::Gaussian { strength } => {
                        self.gaussian_mutate(*gene, strength, *bounds)
                    }
                };
            }
        }
    }

    /// Produce one child from two parents: crossover, clamp, mutate, clamp.
    pub fn reproduce(
        &mut self,
        parent1: &Individual,
        parent2: &Individual,
        space: &GeneSpace,
        config: &GeneticAlgorithmConfig,
    ) -> Result<Individual, EvolutionError> {
        let gene_count = space.gene_count();
        if parent1.len() != gene_count || parent2.len() != gene_count {
            return Err(EvolutionError::invalid_state(format!(
                "parents have {} and {} genes, gene space has {gene_count}",
                parent1.len(),
                parent2.len()
            )));
        }

        let do_crossover = self.rng.r#gen::<f64>() < config.crossover_rate;
        let mut genes = if do_crossover {
            self.crossover(parent1.genes(), parent2.genes(), config.crossover)
        } else {
            parent1.genes().to_vec()
        };
        space.clamp_all(&mut genes);

        self.mutate(&mut genes, config.mutation, config.mutation_rate, space);
        space.clamp_all(&mut genes);

        Ok(Individual::in_bounds(genes, space))
    }
}

/// Linear blend between two values.
fn blend(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

/// Mean per-gene distance between two individuals, normalized by bound width.
pub fn genome_distance(a: &Individual, b: &Individual, space: &GeneSpace) -> f64 {
    let mut distance = 0.0;
    let mut count = 0;

    for ((x, y), bounds) in a.genes().iter().zip(b.genes()).zip(space.iter()) {
        let width = bounds.width();
        if width > 0.0 {
            distance += (x - y).abs() / width;
        }
        count += 1;
    }

    if count > 0 {
        distance / count as f64
    } else {
        0.0
    }
}
