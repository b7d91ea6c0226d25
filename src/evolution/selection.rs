//! Parent selection.
//!
//! Parents are drawn from the breeding pool: the upper half (rounded up) of
//! the population by fitness. Every parent therefore scores at least the
//! population median.

use rand::prelude::*;

use crate::schema::SelectionMethod;

use super::error::EvolutionError;
use super::genome::{GenomeRng, Individual};
use super::population::Population;

/// Member indices ordered best-first.
///
/// Equal scores are ordered by a random permutation, so an all-equal
/// population ranks uniformly at random.
pub fn rank(scores: &[f64], rng: &mut GenomeRng) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.shuffle(rng.rng());
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    order
}

/// Number of top-ranked members eligible to become parents.
#[inline]
pub fn breeding_pool_size(population_size: usize) -> usize {
    population_size.div_ceil(2)
}

/// Select `count` parents (cloned) from the population.
pub fn select_parents(
    population: &Population,
    scores: &[f64],
    count: usize,
    method: &SelectionMethod,
    rng: &mut GenomeRng,
) -> Result<Vec<Individual>, EvolutionError> {
    if population.is_empty() {
        return Err(EvolutionError::invalid_state(
            "cannot select parents from an empty population",
        ));
    }
    if scores.len() != population.len() {
        return Err(EvolutionError::invalid_state(format!(
            "{} scores for {} members",
            scores.len(),
            population.len()
        )));
    }

    let ranking = rank(scores, rng);
    let pool = &ranking[..breeding_pool_size(ranking.len())];

    let picks: Vec<usize> = match method {
        SelectionMethod::SteadyState => (0..count).map(|i| pool[i % pool.len()]).collect(),
        SelectionMethod::Tournament { size } => (0..count)
            .map(|_| {
                // Lower pool position means higher fitness.
                let winner = (0..(*size).max(1))
                    .map(|_| rng.rng().gen_range(0..pool.len()))
                    .min()
                    .unwrap_or(0);
                pool[winner]
            })
            .collect(),
        SelectionMethod::RankBased => {
            let total_rank: usize = (1..=pool.len()).sum();
            (0..count)
                .map(|_| {
                    let mut target = rng.rng().gen_range(0..total_rank);
                    for (pos, &idx) in pool.iter().enumerate() {
                        let weight = pool.len() - pos;
                        if target < weight {
                            return idx;
                        }
                        target -= weight;
                    }
                    pool[0]
                })
                .collect()
        }
    };

    picks
        .into_iter()
        .map(|idx| {
            population.get(idx).cloned().ok_or_else(|| {
                EvolutionError::invalid_state(format!("selected index {idx} out of range"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evolution::GeneSpace;

    fn population(values: &[f64]) -> Population {
        let space = GeneSpace::new([(0.0, 100.0)]).unwrap();
        Population::from_members(
            values
                .iter()
                .map(|v| Individual::new(vec![*v], &space).unwrap())
                .collect(),
        )
    }

    fn median(scores: &[f64]) -> f64 {
        let mut sorted = scores.to_vec();
        sorted.sort_by(f64::total_cmp);
        let n = sorted.len();
        if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        }
    }

    fn all_methods() -> [SelectionMethod; 3] {
        [
            SelectionMethod::SteadyState,
            SelectionMethod::Tournament { size: 3 },
            SelectionMethod::RankBased,
        ]
    }

    #[test]
    fn test_rank_orders_best_first() {
        let mut rng = GenomeRng::new(0);
        assert_eq!(rank(&[0.1, 0.9, 0.5], &mut rng), vec![1, 2, 0]);
    }

    #[test]
    fn test_steady_state_picks_top() {
        // Gene value equals score so parents can be identified by their gene.
        let values = [5.0, 50.0, 20.0, 80.0, 10.0, 60.0];
        let pop = population(&values);
        let mut rng = GenomeRng::new(42);

        let parents =
            select_parents(&pop, &values, 3, &SelectionMethod::SteadyState, &mut rng).unwrap();
        let genes: Vec<f64> = parents.iter().map(|p| p.genes()[0]).collect();
        assert_eq!(genes, vec![80.0, 60.0, 50.0]);
    }

    #[test]
    fn test_steady_state_cycles_pool() {
        let values = [1.0, 2.0, 3.0, 4.0];
        let pop = population(&values);
        let mut rng = GenomeRng::new(42);

        let parents =
            select_parents(&pop, &values, 4, &SelectionMethod::SteadyState, &mut rng).unwrap();
        let genes: Vec<f64> = parents.iter().map(|p| p.genes()[0]).collect();
        assert_eq!(genes, vec![4.0, 3.0, 4.0, 3.0]);
    }

    #[test]
    fn test_parents_at_or_above_median() {
        for n in [1usize, 2, 5, 10, 21] {
            let values: Vec<f64> = (0..n).map(|i| ((i * 37) % 97) as f64).collect();
            let pop = population(&values);
            let med = median(&values);

            for method in all_methods() {
                let mut rng = GenomeRng::new(n as u64);
                let parents = select_parents(&pop, &values, n, &method, &mut rng).unwrap();
                assert_eq!(parents.len(), n);
                for p in &parents {
                    assert!(
                        p.genes()[0] >= med,
                        "{method:?} picked {} below median {med}",
                        p.genes()[0]
                    );
                }
            }
        }
    }

    #[test]
    fn test_all_equal_scores_uniform() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let pop = population(&values);
        let scores = [1.0; 8];

        let mut seen = [false; 8];
        for seed in 0..64 {
            let mut rng = GenomeRng::new(seed);
            for method in all_methods() {
                let parents = select_parents(&pop, &scores, 2, &method, &mut rng).unwrap();
                for p in parents {
                    seen[p.genes()[0] as usize] = true;
                }
            }
        }
        assert!(seen.iter().all(|s| *s), "not every member was selectable: {seen:?}");
    }

    #[test]
    fn test_empty_population_rejected() {
        let mut rng = GenomeRng::new(1);
        for method in all_methods() {
            let result = select_parents(&Population::default(), &[], 2, &method, &mut rng);
            assert!(matches!(result, Err(EvolutionError::InvalidState(_))));
        }
    }

    #[test]
    fn test_score_count_mismatch_rejected() {
        let pop = population(&[1.0, 2.0]);
        let mut rng = GenomeRng::new(1);
        let result = select_parents(&pop, &[1.0], 1, &SelectionMethod::SteadyState, &mut rng);
        assert!(matches!(result, Err(EvolutionError::InvalidState(_))));
    }
}
