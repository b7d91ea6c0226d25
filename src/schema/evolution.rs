//! Evolution configuration types for the dispatch optimizer.
//!
//! This module provides types for configuring the genetic algorithm that
//! searches for power allocations, plus the progress and result types the
//! engine reports back.

use serde::{Deserialize, Serialize};

/// Top-level configuration for a genetic algorithm run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Operator settings (selection, crossover, mutation).
    #[serde(default)]
    pub algorithm: GeneticAlgorithmConfig,
    /// Population and generation settings.
    #[serde(default)]
    pub population: PopulationConfig,
    /// Evaluation settings.
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

/// Genetic Algorithm configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneticAlgorithmConfig {
    /// Selection method.
    #[serde(default)]
    pub selection: SelectionMethod,
    /// Number of parents selected for mating each generation.
    #[serde(default = "default_num_parents")]
    pub num_parents: usize,
    /// Crossover method.
    #[serde(default)]
    pub crossover: CrossoverMethod,
    /// Crossover probability (0.0-1.0). Without crossover the child copies its first parent.
    #[serde(default = "default_crossover_rate")]
    pub crossover_rate: f64,
    /// Mutation method.
    #[serde(default)]
    pub mutation: MutationMethod,
    /// Mutation probability per gene (0.0-1.0).
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
    /// Elitism: number of best individuals to preserve unchanged.
    #[serde(default = "default_elitism")]
    pub elitism: usize,
}

impl Default for GeneticAlgorithmConfig {
    fn default() -> Self {
        Self {
            selection: SelectionMethod::default(),
            num_parents: default_num_parents(),
            crossover: CrossoverMethod::default(),
            crossover_rate: default_crossover_rate(),
            mutation: MutationMethod::default(),
            mutation_rate: default_mutation_rate(),
            elitism: default_elitism(),
        }
    }
}

fn default_num_parents() -> usize {
    10
}
fn default_crossover_rate() -> f64 {
    1.0
}
fn default_mutation_rate() -> f64 {
    0.1
}
fn default_elitism() -> usize {
    1
}

/// Selection method for genetic algorithm.
///
/// Every method draws from the upper half of the ranked population, so no
/// selected parent scores below the population median.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum SelectionMethod {
    /// Steady-state: the top-ranked individuals become parents.
    #[default]
    SteadyState,
    /// Tournament selection with configurable size.
    Tournament {
        #[serde(default = "default_tournament_size")]
        size: usize,
    },
    /// Rank-based selection (linear rank weights).
    RankBased,
}

fn default_tournament_size() -> usize {
    3
}

/// Crossover method for combining two parents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum CrossoverMethod {
    /// Genes before a random cut point come from the first parent, the rest from the second.
    #[default]
    SinglePoint,
    /// Each gene comes from either parent with equal probability.
    Uniform,
    /// Arithmetic blend with one random weight per child.
    Blend,
}

/// Mutation method applied per gene after crossover.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum MutationMethod {
    /// Replace the gene with a uniform draw from its bound.
    #[default]
    RandomReset,
    /// Add Gaussian noise scaled by the bound width, then clamp.
    Gaussian {
        #[serde(default = "default_mutation_strength")]
        strength: f64,
    },
}

fn default_mutation_strength() -> f64 {
    0.1
}

/// Population and generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of individuals in population.
    #[serde(default = "default_population_size")]
    pub size: usize,
    /// Maximum number of generations.
    #[serde(default = "default_max_generations")]
    pub max_generations: usize,
    /// Target fitness to stop early.
    #[serde(default)]
    pub target_fitness: Option<f64>,
    /// Stagnation limit: stop if no improvement for N generations.
    #[serde(default)]
    pub stagnation_limit: Option<usize>,
    /// Wall-clock limit for the whole run, in seconds.
    #[serde(default)]
    pub time_limit_secs: Option<f64>,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: default_population_size(),
            max_generations: default_max_generations(),
            target_fitness: None,
            stagnation_limit: None,
            time_limit_secs: None,
        }
    }
}

fn default_population_size() -> usize {
    20
}
fn default_max_generations() -> usize {
    100
}

/// Evaluation settings for fitness computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Evaluate individuals of a generation in parallel.
    /// Ignored when the crate is built without the `parallel` feature.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            parallel: default_parallel(),
        }
    }
}

fn default_parallel() -> bool {
    true
}

// ============================================================================
// Progress and results
// ============================================================================

/// Best individual seen so far, with the generation it appeared in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestSnapshot {
    /// Gene values (one per power source, in watts).
    pub genes: Vec<f64>,
    /// Fitness score.
    pub fitness: f64,
    /// Generation the individual was first scored in.
    pub generation: usize,
}

/// Per-generation statistics. Index 0 is the initial population.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvolutionHistory {
    /// Best-ever fitness after each generation.
    pub best_fitness: Vec<f64>,
    /// Best fitness within each generation.
    pub generation_best: Vec<f64>,
    /// Average fitness per generation.
    pub avg_fitness: Vec<f64>,
    /// Fitness standard deviation per generation.
    pub fitness_std: Vec<f64>,
    /// Diversity metric per generation.
    pub diversity: Vec<f64>,
}

/// Current phase of evolution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum EvolutionPhase {
    /// Initial population created and scored.
    #[default]
    Initializing,
    /// Generations are being produced.
    Evolving,
    /// Evolution complete.
    Complete,
    /// Evolution stopped early.
    Stopped,
}

/// Snapshot passed to progress callbacks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionProgress {
    /// Current generation (0 = initial population).
    pub generation: usize,
    /// Configured generation limit.
    pub total_generations: usize,
    /// Best-ever fitness.
    pub best_fitness: f64,
    /// Best fitness in the current generation.
    pub generation_best: f64,
    /// Average fitness of the current generation.
    pub avg_fitness: f64,
    /// Generations since the best-ever record last improved.
    pub stagnation_count: usize,
    /// Best-ever individual.
    pub best: BestSnapshot,
    /// Current phase.
    pub phase: EvolutionPhase,
}

/// Final result of evolution run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionResult {
    /// Best individual found.
    pub best: BestSnapshot,
    /// Statistics from the run.
    pub stats: EvolutionStats,
    /// Full history for analysis.
    pub history: EvolutionHistory,
}

/// Statistics from evolution run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionStats {
    /// Total generations run.
    pub generations: usize,
    /// Total evaluations performed.
    pub total_evaluations: u64,
    /// Best fitness achieved.
    pub best_fitness: f64,
    /// Average fitness of final population.
    pub final_avg_fitness: f64,
    /// Time taken (in seconds).
    pub elapsed_seconds: f64,
    /// Evaluations per second.
    pub evaluations_per_second: f64,
    /// Seed the run's RNG was created from.
    pub random_seed: u64,
    /// Reason for stopping.
    pub stop_reason: StopReason,
}

/// Reason evolution stopped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// Reached maximum generations.
    MaxGenerations,
    /// Reached target fitness.
    TargetReached,
    /// Stagnation limit hit.
    Stagnation,
    /// Wall-clock limit hit.
    TimeLimit,
    /// User cancelled.
    Cancelled,
}

// ============================================================================
// Validation
// ============================================================================

/// Evolution configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum EvolutionConfigError {
    #[error("Population size must be at least 1")]
    PopulationTooSmall,
    #[error("Generation count must be at least 1")]
    InvalidGenerations,
    #[error("Parent count {parents} must be between 1 and the population size {population}")]
    InvalidParentCount { parents: usize, population: usize },
    #[error("Elitism {elitism} exceeds population size {population}")]
    InvalidElitism { elitism: usize, population: usize },
    #[error("{name} must be within [0, 1], got {value}")]
    InvalidRate { name: &'static str, value: f64 },
    #[error("Tournament size must be at least 1")]
    InvalidTournamentSize,
    #[error("Mutation strength must be positive, got {0}")]
    InvalidMutationStrength(f64),
    #[error("Time limit must be positive, got {0}")]
    InvalidTimeLimit(f64),
    #[error("Gene space must contain at least one gene")]
    EmptyGeneSpace,
    #[error("Invalid bounds for gene {index}: low ({low}) > high ({high}) or not finite")]
    InvalidBounds { index: usize, low: f64, high: f64 },
    #[error("Evaluator expects {expected} genes but gene space has {actual}")]
    GeneCountMismatch { expected: usize, actual: usize },
    #[error("Problem config validation failed: {0}")]
    ProblemConfig(#[from] super::ProblemConfigError),
}

impl EvolutionConfig {
    /// Validate evolution configuration.
    pub fn validate(&self) -> Result<(), EvolutionConfigError> {
        let population = self.population.size;
        if population == 0 {
            return Err(EvolutionConfigError::PopulationTooSmall);
        }
        if self.population.max_generations == 0 {
            return Err(EvolutionConfigError::InvalidGenerations);
        }

        let ga = &self.algorithm;
        if ga.num_parents == 0 || ga.num_parents > population {
            return Err(EvolutionConfigError::InvalidParentCount {
                parents: ga.num_parents,
                population,
            });
        }
        if ga.elitism > population {
            return Err(EvolutionConfigError::InvalidElitism {
                elitism: ga.elitism,
                population,
            });
        }

        let check_rate = |value: f64, name: &'static str| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(EvolutionConfigError::InvalidRate { name, value })
            }
        };
        check_rate(ga.crossover_rate, "crossover_rate")?;
        check_rate(ga.mutation_rate, "mutation_rate")?;

        if let SelectionMethod::Tournament { size } = ga.selection
            && size == 0
        {
            return Err(EvolutionConfigError::InvalidTournamentSize);
        }
        if let MutationMethod::Gaussian { strength } = ga.mutation
            && !(strength.is_finite() && strength > 0.0)
        {
            return Err(EvolutionConfigError::InvalidMutationStrength(strength));
        }
        if let Some(limit) = self.population.time_limit_secs
            && !(limit.is_finite() && limit > 0.0)
        {
            return Err(EvolutionConfigError::InvalidTimeLimit(limit));
        }

        Ok(())
    }
}
