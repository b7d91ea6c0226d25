//! Hybrid Dispatch CLI - Optimize a power allocation from JSON configuration.

use std::path::PathBuf;
use std::time::Instant;

use hybrid_dispatch::{
    evolution::{DispatchObjective, EvolutionEngine},
    schema::{DispatchConfig, DispatchProblem},
};

const BAR_WIDTH: usize = 40;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.get(1).map(String::as_str) == Some("--example") {
        print_example_config();
        return;
    }

    if args.get(1).is_some_and(|a| a == "--help" || a == "-h") {
        eprintln!("Usage: {} [config.json]", args[0]);
        eprintln!();
        eprintln!("Optimize power allocation across hybrid energy sources.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to configuration file (default: built-in problem)");
        eprintln!();
        eprintln!("Example configuration is printed with --example flag.");
        std::process::exit(1);
    }

    // Load configuration
    let config = match args.get(1) {
        Some(path) => DispatchConfig::from_json_file(PathBuf::from(path)).unwrap_or_else(|e| {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }),
        None => DispatchConfig::default(),
    };

    let objective = DispatchObjective::new(&config.problem).unwrap_or_else(|e| {
        eprintln!("Invalid problem: {}", e);
        std::process::exit(1);
    });
    let gene_space = config.problem.gene_space().unwrap_or_else(|e| {
        eprintln!("Invalid power ranges: {}", e);
        std::process::exit(1);
    });

    let engine = EvolutionEngine::new(config.evolution.clone(), gene_space, objective)
        .unwrap_or_else(|e| {
            eprintln!("Error configuring optimizer: {}", e);
            std::process::exit(1);
        });

    println!("Hybrid Energy Dispatch");
    println!("======================");
    println!("Load demand: {} W", config.problem.load_demand);
    println!("Sources: {}", config.problem.sources.len());
    println!("Population: {}", config.evolution.population.size);
    println!("Generations: {}", config.evolution.population.max_generations);
    println!();

    let start = Instant::now();
    let generations = config.evolution.population.max_generations;
    let result = engine
        .run_with_callback(|progress| {
            // Print progress every 10%
            if progress.generation > 0 && progress.generation % (generations / 10).max(1) == 0 {
                println!(
                    "  Generation {}/{}: best={:.6e}, avg={:.6e}",
                    progress.generation,
                    progress.total_generations,
                    progress.best_fitness,
                    progress.avg_fitness
                );
            }
        })
        .unwrap_or_else(|e| {
            eprintln!("Optimization failed: {}", e);
            std::process::exit(1);
        });

    println!();
    println!("Optimal power allocation for each energy source:");
    for (name, watts) in config.problem.labels().zip(&result.best.genes) {
        println!("{} Power: {} W", name, watts);
    }
    println!(
        "Highest objective function value (efficiency): {}",
        result.best.fitness
    );

    if let Ok(breakdown) = engine.evaluator().breakdown(&result.best.genes) {
        println!();
        println!("  Total power:  {:.3} W", breakdown.total_power);
        println!("  Total cost:   {:.4}", breakdown.total_cost);
        println!("  Energy loss:  {:.3} W", breakdown.energy_loss);
        println!("  Efficiency:   {:.6e}", breakdown.efficiency);
    }

    println!();
    print_allocation_chart(&config.problem, &result.best.genes);

    println!();
    println!(
        "Stopped after {} generations ({:?}), seed {}",
        result.stats.generations, result.stats.stop_reason, result.stats.random_seed
    );
    println!(
        "Time: {:.2}s ({:.1} evaluations/s)",
        start.elapsed().as_secs_f32(),
        result.stats.evaluations_per_second
    );
}

/// Text bar chart of allocated power per source, scaled to each source's maximum.
fn print_allocation_chart(problem: &DispatchProblem, genes: &[f64]) {
    println!("Optimal Power Allocation in Hybrid Energy System");
    let label_width = problem.labels().map(str::len).max().unwrap_or(0);

    for (source, watts) in problem.sources.iter().zip(genes) {
        let fraction = if source.bounds.high > 0.0 {
            (watts / source.bounds.high).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let filled = (fraction * BAR_WIDTH as f64).round() as usize;
        println!(
            "  {:>width$} |{}{}| {:.1} W",
            source.name,
            "#".repeat(filled),
            " ".repeat(BAR_WIDTH - filled),
            watts,
            width = label_width
        );
    }
}

fn print_example_config() {
    let config = DispatchConfig::default();

    println!("Example configuration (config.json):");
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|e| format!("<error: {e}>"))
    );
}
