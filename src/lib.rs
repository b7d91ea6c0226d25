//! Hybrid Dispatch - Genetic algorithm power allocation for hybrid energy systems.
//!
//! This crate distributes a fixed load demand across several generation
//! sources (solar, wind, battery, hydrogen by default), trading off cost,
//! over-production and supply efficiency with a real-coded genetic algorithm.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Problem, evolution configuration and result types
//! - `evolution`: The genetic algorithm engine (gene space, fitness,
//!   selection, reproduction, generational loop)
//!
//! # Example
//!
//! ```rust,no_run
//! use hybrid_dispatch::{DispatchObjective, DispatchProblem, EvolutionConfig, optimize};
//!
//! let problem = DispatchProblem::default();
//! let objective = DispatchObjective::new(&problem).unwrap();
//! let result = optimize(EvolutionConfig::default(), problem.gene_space().unwrap(), objective)
//!     .unwrap();
//!
//! for (name, watts) in problem.labels().zip(&result.best.genes) {
//!     println!("{name} Power: {watts} W");
//! }
//! ```

pub mod evolution;
pub mod schema;

// Re-export commonly used types
pub use evolution::{
    DispatchObjective, EvolutionEngine, EvolutionError, FitnessEvaluator, GeneSpace, optimize,
};
pub use schema::{DispatchConfig, DispatchProblem, EvolutionConfig, EvolutionResult};
