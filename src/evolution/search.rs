//! Generational loop for the genetic algorithm.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::schema::{
    BestSnapshot, EvolutionConfig, EvolutionConfigError, EvolutionHistory, EvolutionPhase,
    EvolutionProgress, EvolutionResult, EvolutionStats, StopReason,
};

use super::error::EvolutionError;
use super::fitness::FitnessEvaluator;
use super::gene_space::GeneSpace;
use super::genome::GenomeRng;
use super::population::{Population, best, score_stats};
use super::selection::select_parents;

/// Mutable state of one optimization run.
///
/// Created by [`EvolutionEngine::initialize`], advanced by
/// [`EvolutionEngine::step`]. Owns the run's only RNG.
#[derive(Debug, Clone)]
pub struct RunState {
    generation: usize,
    population: Population,
    scores: Vec<f64>,
    best: BestSnapshot,
    rng: GenomeRng,
    seed: u64,
    stagnation_count: usize,
    evaluations: u64,
    history: EvolutionHistory,
}

impl RunState {
    /// Current generation (0 = initial population).
    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Scores of the current population, in member order.
    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    /// Best individual seen so far.
    pub fn best(&self) -> &BestSnapshot {
        &self.best
    }

    pub fn history(&self) -> &EvolutionHistory {
        &self.history
    }

    /// Seed the run's RNG was created from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Append statistics for the current generation and update the best-ever record.
    fn record_generation(&mut self, space: &GeneSpace) -> Result<(), EvolutionError> {
        let (_, gen_best_ind, gen_best) = best(&self.population, &self.scores)?;

        if gen_best > self.best.fitness {
            log::debug!(
                "Generation {}: new best {:.6e} at {:?}",
                self.generation,
                gen_best,
                gen_best_ind.genes()
            );
            self.best = BestSnapshot {
                genes: gen_best_ind.genes().to_vec(),
                fitness: gen_best,
                generation: self.generation,
            };
            self.stagnation_count = 0;
        } else if self.generation > 0 {
            self.stagnation_count += 1;
        }

        let (avg, std) = score_stats(&self.scores);
        self.history.best_fitness.push(self.best.fitness);
        self.history.generation_best.push(gen_best);
        self.history.avg_fitness.push(avg);
        self.history.fitness_std.push(std);
        self.history.diversity.push(self.population.diversity(space));
        Ok(())
    }
}

/// Evolution engine that runs the search.
pub struct EvolutionEngine<E> {
    config: EvolutionConfig,
    gene_space: GeneSpace,
    evaluator: E,
    cancelled: Arc<AtomicBool>,
}

impl<E: FitnessEvaluator> EvolutionEngine<E> {
    /// Create a new evolution engine. All configuration is checked here.
    pub fn new(
        config: EvolutionConfig,
        gene_space: GeneSpace,
        evaluator: E,
    ) -> Result<Self, EvolutionError> {
        config.validate()?;
        gene_space.validate()?;
        if let Some(expected) = evaluator.gene_count()
            && expected != gene_space.gene_count()
        {
            return Err(EvolutionConfigError::GeneCountMismatch {
                expected,
                actual: gene_space.gene_count(),
            }
            .into());
        }

        Ok(Self {
            config,
            gene_space,
            evaluator,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    pub fn gene_space(&self) -> &GeneSpace {
        &self.gene_space
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Get cancellation handle.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Create and score the initial population.
    pub fn initialize(&self) -> Result<RunState, EvolutionError> {
        let seed = self.config.random_seed.unwrap_or_else(rand::random);
        let mut rng = GenomeRng::new(seed);

        let population =
            Population::initialize(self.config.population.size, &self.gene_space, &mut rng)?;
        let scores = population.evaluate(&self.evaluator, self.config.evaluation.parallel)?;

        let mut state = RunState {
            generation: 0,
            evaluations: population.len() as u64,
            population,
            scores,
            best: BestSnapshot {
                genes: Vec::new(),
                fitness: f64::NEG_INFINITY,
                generation: 0,
            },
            rng,
            seed,
            stagnation_count: 0,
            history: EvolutionHistory::default(),
        };
        state.record_generation(&self.gene_space)?;
        Ok(state)
    }

    /// Produce, score and record the next generation.
    pub fn step(&self, state: &mut RunState) -> Result<(), EvolutionError> {
        let ga = &self.config.algorithm;
        let size = self.config.population.size;

        if state.population.len() != size || state.scores.len() != size {
            return Err(EvolutionError::invalid_state(format!(
                "run state holds {} members and {} scores, expected {size}",
                state.population.len(),
                state.scores.len()
            )));
        }

        let parents = select_parents(
            &state.population,
            &state.scores,
            ga.num_parents,
            &ga.selection,
            &mut state.rng,
        )?;
        if parents.is_empty() {
            return Err(EvolutionError::invalid_state("no parents selected"));
        }

        // Elites keep their order by score, ties by index.
        let mut order: Vec<usize> = (0..size).collect();
        order.sort_by(|&a, &b| state.scores[b].total_cmp(&state.scores[a]));

        let mut next = Vec::with_capacity(size);
        for &idx in order.iter().take(ga.elitism) {
            if let Some(elite) = state.population.get(idx) {
                next.push(elite.clone());
            }
        }

        let mut k = 0;
        while next.len() < size {
            let p1 = &parents[k % parents.len()];
            let p2 = &parents[(k + 1) % parents.len()];
            next.push(state.rng.reproduce(p1, p2, &self.gene_space, ga)?);
            k += 1;
        }

        state.population.replace(Population::from_members(next))?;
        state.scores = state
            .population
            .evaluate(&self.evaluator, self.config.evaluation.parallel)?;
        state.evaluations += size as u64;
        state.generation += 1;
        state.record_generation(&self.gene_space)?;

        log::debug!(
            "Generation {}/{}: best={:.6e} generation_best={:.6e} avg={:.6e}",
            state.generation,
            self.config.population.max_generations,
            state.best.fitness,
            state.history.generation_best.last().copied().unwrap_or(f64::NAN),
            state.history.avg_fitness.last().copied().unwrap_or(f64::NAN),
        );
        Ok(())
    }

    /// Get current progress.
    pub fn progress(&self, state: &RunState, phase: EvolutionPhase) -> EvolutionProgress {
        let (avg_fitness, _) = score_stats(&state.scores);
        let generation_best = state
            .scores
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);

        EvolutionProgress {
            generation: state.generation,
            total_generations: self.config.population.max_generations,
            best_fitness: state.best.fitness,
            generation_best,
            avg_fitness,
            stagnation_count: state.stagnation_count,
            best: state.best.clone(),
            phase,
        }
    }

    /// Check if evolution should stop.
    fn should_stop(&self, state: &RunState, start: Instant) -> Option<StopReason> {
        let limits = &self.config.population;

        if self.cancelled.load(Ordering::Relaxed) {
            return Some(StopReason::Cancelled);
        }

        if state.generation >= limits.max_generations {
            return Some(StopReason::MaxGenerations);
        }

        if let Some(target) = limits.target_fitness
            && state.best.fitness >= target
        {
            return Some(StopReason::TargetReached);
        }

        if let Some(limit) = limits.stagnation_limit
            && state.stagnation_count >= limit
        {
            return Some(StopReason::Stagnation);
        }

        if let Some(secs) = limits.time_limit_secs
            && start.elapsed().as_secs_f64() >= secs
        {
            return Some(StopReason::TimeLimit);
        }

        None
    }

    /// Run evolution with progress callback.
    pub fn run_with_callback<F>(&self, mut callback: F) -> Result<EvolutionResult, EvolutionError>
    where
        F: FnMut(&EvolutionProgress),
    {
        let start_time = Instant::now();

        let mut state = self.initialize()?;
        log::info!(
            "Starting evolution: seed={}, population={}, generations={}, genes={}",
            state.seed,
            self.config.population.size,
            self.config.population.max_generations,
            self.gene_space.gene_count()
        );
        callback(&self.progress(&state, EvolutionPhase::Initializing));

        let stop_reason = loop {
            if let Some(reason) = self.should_stop(&state, start_time) {
                break reason;
            }

            self.step(&mut state)?;
            callback(&self.progress(&state, EvolutionPhase::Evolving));
        };

        let phase = if stop_reason == StopReason::MaxGenerations {
            EvolutionPhase::Complete
        } else {
            log::info!(
                "Stopping early at generation {}: {:?}",
                state.generation,
                stop_reason
            );
            EvolutionPhase::Stopped
        };
        callback(&self.progress(&state, phase));

        let elapsed = start_time.elapsed().as_secs_f64();
        let (final_avg_fitness, _) = score_stats(&state.scores);
        let evaluations_per_second = if elapsed > 0.0 {
            state.evaluations as f64 / elapsed
        } else {
            0.0
        };

        log::info!(
            "Evolution finished after {} generations ({} evaluations, {:.3}s): best fitness {:.6e}",
            state.generation,
            state.evaluations,
            elapsed,
            state.best.fitness
        );

        Ok(EvolutionResult {
            stats: EvolutionStats {
                generations: state.generation,
                total_evaluations: state.evaluations,
                best_fitness: state.best.fitness,
                final_avg_fitness,
                elapsed_seconds: elapsed,
                evaluations_per_second,
                random_seed: state.seed,
                stop_reason,
            },
            best: state.best,
            history: state.history,
        })
    }

    /// Run evolution (blocking).
    pub fn run(&self) -> Result<EvolutionResult, EvolutionError> {
        self.run_with_callback(|_| {})
    }
}

/// Configure an engine and run it to completion.
pub fn optimize<E: FitnessEvaluator>(
    config: EvolutionConfig,
    gene_space: GeneSpace,
    evaluator: E,
) -> Result<EvolutionResult, EvolutionError> {
    EvolutionEngine::new(config, gene_space, evaluator)?.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evolution::{DispatchObjective, FitnessError, FnEvaluator};
    use crate::schema::{
        CrossoverMethod, DispatchProblem, GeneticAlgorithmConfig, MutationMethod,
        PopulationConfig, SelectionMethod,
    };

    fn dispatch_space() -> GeneSpace {
        DispatchProblem::default().gene_space().unwrap()
    }

    fn objective() -> DispatchObjective {
        DispatchObjective::new(&DispatchProblem::default()).unwrap()
    }

    fn seeded_config(seed: u64) -> EvolutionConfig {
        EvolutionConfig {
            random_seed: Some(seed),
            ..Default::default()
        }
    }

    #[test]
    fn test_inverted_bounds_fail_before_init() {
        let space: GeneSpace = serde_json::from_str(
            r#"[{"low": 0, "high": 500}, {"low": 500, "high": 0},
                {"low": 0, "high": 300}, {"low": 0, "high": 300}]"#,
        )
        .unwrap();

        let result = EvolutionEngine::new(seeded_config(1), space, objective());
        assert!(matches!(
            result,
            Err(EvolutionError::Configuration(
                EvolutionConfigError::InvalidBounds { index: 1, .. }
            ))
        ));
    }

    #[test]
    fn test_overflowing_bound_width_is_configuration_error() {
        let space: GeneSpace =
            serde_json::from_str(r#"[{"low": -1.0e308, "high": 1.0e308}]"#).unwrap();
        let eval = FnEvaluator::new(|g: &[f64]| g[0]);

        let result = optimize(seeded_config(1), space, eval);
        assert!(matches!(
            result,
            Err(EvolutionError::Configuration(
                EvolutionConfigError::InvalidBounds { index: 0, .. }
            ))
        ));
    }

    #[test]
    fn test_gene_count_mismatch() {
        let space = GeneSpace::new([(0.0, 1.0), (0.0, 1.0)]).unwrap();
        let result = EvolutionEngine::new(seeded_config(1), space, objective());
        assert!(matches!(
            result,
            Err(EvolutionError::Configuration(
                EvolutionConfigError::GeneCountMismatch {
                    expected: 4,
                    actual: 2
                }
            ))
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = seeded_config(1);
        config.algorithm.num_parents = 50;
        assert!(matches!(
            EvolutionEngine::new(config, dispatch_space(), objective()),
            Err(EvolutionError::Configuration(
                EvolutionConfigError::InvalidParentCount { .. }
            ))
        ));
    }

    #[test]
    fn test_single_individual_single_generation() {
        let config = EvolutionConfig {
            population: PopulationConfig {
                size: 1,
                max_generations: 1,
                ..Default::default()
            },
            algorithm: GeneticAlgorithmConfig {
                num_parents: 1,
                ..Default::default()
            },
            random_seed: Some(2024),
            ..Default::default()
        };
        let engine = EvolutionEngine::new(config, dispatch_space(), objective()).unwrap();
        let state = engine.initialize().unwrap();

        let genes = state.population().members()[0].genes().to_vec();
        let total_power: f64 = genes.iter().sum();
        let total_cost =
            genes[0] * 0.05 + genes[1] * 0.06 + genes[2] * 0.08 + genes[3] * 0.10;
        let energy_loss = (total_power - 1000.0).max(0.0);
        let efficiency = 1000.0 / (total_power + 1e-6);
        let expected = (1.0 / (total_cost + energy_loss + 1e-6)) * efficiency;
        assert_eq!(state.scores()[0], expected);

        let result = engine.run().unwrap();
        assert_eq!(result.stats.generations, 1);
        assert_eq!(
            result.best.fitness,
            objective().evaluate(&result.best.genes).unwrap()
        );
    }

    #[test]
    fn test_population_size_and_bounds_invariant() {
        let mut config = seeded_config(11);
        config.population.max_generations = 25;
        config.algorithm.mutation = MutationMethod::Gaussian { strength: 0.5 };
        config.algorithm.mutation_rate = 0.5;
        config.algorithm.crossover = CrossoverMethod::Blend;

        let space = dispatch_space();
        let engine = EvolutionEngine::new(config, space.clone(), objective()).unwrap();
        let mut state = engine.initialize().unwrap();

        for _ in 0..25 {
            assert_eq!(state.population().len(), 20);
            assert_eq!(state.scores().len(), 20);
            assert!(state.population().iter().all(|i| space.contains(i.genes())));
            engine.step(&mut state).unwrap();
        }
        assert_eq!(state.generation(), 25);
        assert_eq!(state.population().len(), 20);
        assert_eq!(state.seed(), 11);
        assert_eq!(state.history().best_fitness.len(), 26);
        assert_eq!(state.history().diversity.len(), 26);
    }

    #[test]
    fn test_best_fitness_monotonic() {
        for selection in [
            SelectionMethod::SteadyState,
            SelectionMethod::Tournament { size: 3 },
            SelectionMethod::RankBased,
        ] {
            let mut config = seeded_config(7);
            config.population.max_generations = 40;
            config.algorithm.selection = selection;
            config.algorithm.elitism = 0;

            let result = optimize(config, dispatch_space(), objective()).unwrap();
            let history = &result.history.best_fitness;
            assert_eq!(history.len(), 41);
            assert!(history.windows(2).all(|w| w[1] >= w[0]));
            assert_eq!(*history.last().unwrap(), result.best.fitness);
        }
    }

    #[test]
    fn test_elitism_keeps_generation_best() {
        let mut config = seeded_config(3);
        config.population.max_generations = 30;
        config.algorithm.elitism = 1;

        let result = optimize(config, dispatch_space(), objective()).unwrap();
        let gen_best = &result.history.generation_best;
        assert!(gen_best.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn test_deterministic_with_seed() {
        let a = optimize(seeded_config(99), dispatch_space(), objective()).unwrap();
        let b = optimize(seeded_config(99), dispatch_space(), objective()).unwrap();

        assert_eq!(a.best.fitness.to_bits(), b.best.fitness.to_bits());
        let bits = |g: &[f64]| g.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&a.best.genes), bits(&b.best.genes));
        assert_eq!(a.stats.random_seed, 99);
    }

    #[test]
    fn test_parallel_and_sequential_runs_agree() {
        let mut sequential = seeded_config(5);
        sequential.evaluation.parallel = false;
        let mut parallel = seeded_config(5);
        parallel.evaluation.parallel = true;

        let a = optimize(sequential, dispatch_space(), objective()).unwrap();
        let b = optimize(parallel, dispatch_space(), objective()).unwrap();
        assert_eq!(a.best, b.best);
        assert_eq!(a.history.avg_fitness, b.history.avg_fitness);
    }

    #[test]
    fn test_search_improves_on_initial_population() {
        let mut config = seeded_config(21);
        config.population.max_generations = 100;

        let result = optimize(config, dispatch_space(), objective()).unwrap();
        assert_eq!(result.stats.stop_reason, StopReason::MaxGenerations);
        assert_eq!(result.stats.total_evaluations, 20 * 101);
        assert!(result.best.fitness > result.history.generation_best[0]);
        assert!(dispatch_space().contains(&result.best.genes));
    }

    #[test]
    fn test_non_finite_fitness_aborts_run() {
        let eval = FnEvaluator::new(|_: &[f64]| f64::NAN);
        let result = optimize(seeded_config(1), dispatch_space(), eval);
        match result {
            Err(EvolutionError::FitnessEvaluation { genes, source }) => {
                assert_eq!(genes.len(), 4);
                assert!(matches!(source, FitnessError::NonFinite(_)));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    struct FailingEvaluator;

    impl FitnessEvaluator for FailingEvaluator {
        fn evaluate(&self, genes: &[f64]) -> Result<f64, FitnessError> {
            if genes[0] > 490.0 {
                Err(FitnessError::Failed("solar output out of model range".into()))
            } else {
                Ok(genes[0])
            }
        }
    }

    #[test]
    fn test_evaluator_error_surfaces_genes() {
        let mut config = seeded_config(4);
        config.algorithm.mutation_rate = 1.0;
        config.population.max_generations = 500;

        match optimize(config, dispatch_space(), FailingEvaluator) {
            Err(EvolutionError::FitnessEvaluation { genes, source }) => {
                assert!(genes[0] > 490.0);
                assert!(matches!(source, FitnessError::Failed(_)));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_target_fitness_stops_early() {
        let mut config = seeded_config(8);
        config.population.target_fitness = Some(f64::MIN);

        let result = optimize(config, dispatch_space(), objective()).unwrap();
        assert_eq!(result.stats.stop_reason, StopReason::TargetReached);
        assert_eq!(result.stats.generations, 0);
        assert!(result.best.fitness.is_finite());
    }

    #[test]
    fn test_stagnation_limit() {
        let mut config = seeded_config(8);
        config.population.stagnation_limit = Some(5);
        let flat = FnEvaluator::new(|_: &[f64]| 1.0);

        let result = optimize(config, dispatch_space(), flat).unwrap();
        assert_eq!(result.stats.stop_reason, StopReason::Stagnation);
        assert_eq!(result.stats.generations, 5);
        assert_eq!(result.best.generation, 0);
    }

    #[test]
    fn test_cancellation_returns_best() {
        let engine = EvolutionEngine::new(seeded_config(6), dispatch_space(), objective()).unwrap();
        let cancel = engine.cancel_handle();

        // Cancel immediately
        cancel.store(true, Ordering::Relaxed);

        let result = engine.run().unwrap();
        assert_eq!(result.stats.stop_reason, StopReason::Cancelled);
        assert_eq!(result.best.genes.len(), 4);
    }

    #[test]
    fn test_time_limit_returns_best() {
        let mut config = seeded_config(6);
        config.population.time_limit_secs = Some(1e-9);

        let result = optimize(config, dispatch_space(), objective()).unwrap();
        assert_eq!(result.stats.stop_reason, StopReason::TimeLimit);
        assert!(result.best.fitness.is_finite());
    }

    #[test]
    fn test_progress_callback() {
        let mut config = seeded_config(12);
        config.population.max_generations = 10;
        let engine = EvolutionEngine::new(config, dispatch_space(), objective()).unwrap();

        let mut phases = Vec::new();
        let result = engine
            .run_with_callback(|p| phases.push((p.generation, p.phase)))
            .unwrap();

        assert_eq!(phases.len(), 12);
        assert_eq!(phases[0], (0, EvolutionPhase::Initializing));
        assert_eq!(phases[1], (1, EvolutionPhase::Evolving));
        assert_eq!(phases[11], (10, EvolutionPhase::Complete));
        assert_eq!(result.stats.generations, 10);
    }
}
