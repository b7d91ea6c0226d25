//! Compare selection methods on the default dispatch problem.

use hybrid_dispatch::{
    evolution::{DispatchObjective, optimize},
    schema::{
        DispatchProblem, EvolutionConfig, GeneticAlgorithmConfig, PopulationConfig,
        SelectionMethod,
    },
};
use std::time::Instant;

fn main() {
    println!("=== Selection Method Comparison ===\n");

    let problem = DispatchProblem::default();

    for selection in [
        SelectionMethod::SteadyState,
        SelectionMethod::Tournament { size: 3 },
        SelectionMethod::RankBased,
    ] {
        println!("Selection: {:?}", selection);

        for seed in [1, 2, 3] {
            let config = EvolutionConfig {
                population: PopulationConfig {
                    size: 20,
                    max_generations: 100,
                    ..Default::default()
                },
                algorithm: GeneticAlgorithmConfig {
                    selection: selection.clone(),
                    ..Default::default()
                },
                random_seed: Some(seed),
                ..Default::default()
            };

            let objective = DispatchObjective::new(&problem).unwrap();
            let start = Instant::now();
            let result = optimize(config, problem.gene_space().unwrap(), objective).unwrap();
            let elapsed = start.elapsed();

            let total_power: f64 = result.best.genes.iter().sum();
            println!(
                "  seed {}: best fitness {:.4e} at generation {}, total power {:.1} W ({:.2}ms)",
                seed,
                result.best.fitness,
                result.best.generation,
                total_power,
                elapsed.as_secs_f64() * 1000.0
            );
        }
        println!();
    }
}
