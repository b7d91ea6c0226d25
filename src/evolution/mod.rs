//! Genetic algorithm engine for continuous, bounded allocation problems.
//!
//! # Overview
//!
//! The engine consists of:
//!
//! - **Gene Space** (`gene_space`): per-gene `[low, high]` bounds
//! - **Fitness Evaluation** (`fitness`): the [`FitnessEvaluator`] trait and the
//!   hybrid energy [`DispatchObjective`]
//! - **Genome Operations** (`genome`): random generation, crossover and mutation
//! - **Population** (`population`): generation storage and scoring
//! - **Selection** (`selection`): steady-state, tournament and rank-based parents
//! - **Search** (`search`): the generational loop and its run state
//!
//! # Example
//!
//! ```rust,no_run
//! use hybrid_dispatch::evolution::{DispatchObjective, EvolutionEngine};
//! use hybrid_dispatch::schema::{DispatchProblem, EvolutionConfig};
//!
//! let problem = DispatchProblem::default();
//! let objective = DispatchObjective::new(&problem).unwrap();
//! let config = EvolutionConfig {
//!     random_seed: Some(42),
//!     ..Default::default()
//! };
//!
//! let engine = EvolutionEngine::new(config, problem.gene_space().unwrap(), objective).unwrap();
//! let result = engine
//!     .run_with_callback(|progress| {
//!         println!("Generation {}: best fitness = {:.3e}",
//!             progress.generation, progress.best_fitness);
//!     })
//!     .unwrap();
//!
//! println!("Best allocation: {:?}", result.best.genes);
//! ```

mod error;
mod fitness;
mod gene_space;
mod genome;
mod population;
mod search;
mod selection;

pub use error::{EvolutionError, FitnessError};
pub use fitness::{DispatchBreakdown, DispatchObjective, EPSILON, FitnessEvaluator, FnEvaluator};
pub use gene_space::{GeneBounds, GeneSpace};
pub use genome::{GenomeRng, Individual, genome_distance};
pub use population::{Population, best, score_stats};
pub use search::{EvolutionEngine, RunState, optimize};
pub use selection::{breeding_pool_size, rank, select_parents};
