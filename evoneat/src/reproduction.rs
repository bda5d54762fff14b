//! Reproduction refills the population from the survivors of selection.
use crate::fitness::FitnessLedger;
use crate::genomics::{GeneticConfig, Organism};
use crate::innovations::InnovationSource;
use crate::speciation::Specie;

use log::debug;
use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, RngCore};

/// Something that produces the next population.
pub trait Reproducer {
    /// Returns exactly `required` organisms: the survivors first,
    /// followed by offspring of the surviving species.
    ///
    /// # Panics
    ///
    /// Implementations may panic if offspring are needed
    /// but `species` is empty.
    #[allow(clippy::too_many_arguments)]
    fn reproduce(
        &mut self,
        innovations: &mut dyn InnovationSource,
        scores: &FitnessLedger,
        required: usize,
        species: &[&Specie],
        survivors: &[&Organism],
        generation: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<Organism>;
}

/// The default reproducer.
///
/// Every offspring is produced within a single specie, chosen by
/// roulette over the mean fitness of its survivors. Parents are
/// chosen within the specie by roulette over their own fitness.
/// Should no specie have survivors, the species' representatives
/// act as parents, every specie being equally likely.
#[derive(Clone, Debug)]
pub struct SpeciesReproducer {
    config: GeneticConfig,
}

/// The candidate parents of a single specie.
struct ParentPool<'a> {
    parents: Vec<&'a Organism>,
    fitness: Vec<f32>,
}

impl<'a> ParentPool<'a> {
    fn weight(&self) -> f32 {
        self.fitness.iter().sum::<f32>() / self.fitness.len() as f32
    }
}

impl SpeciesReproducer {
    pub fn new(config: GeneticConfig) -> SpeciesReproducer {
        SpeciesReproducer { config }
    }

    pub fn config(&self) -> &GeneticConfig {
        &self.config
    }

    fn parent_pools<'a>(
        species: &[&'a Specie],
        survivors: &[&'a Organism],
        scores: &FitnessLedger,
    ) -> Vec<ParentPool<'a>> {
        let pools: Vec<ParentPool<'a>> = species
            .iter()
            .filter_map(|specie| {
                let parents: Vec<&'a Organism> = survivors
                    .iter()
                    .copied()
                    .filter(|o| o.specie() == Some(specie.id()))
                    .collect();
                if parents.is_empty() {
                    return None;
                }
                let fitness = parents
                    .iter()
                    .map(|o| scores.fitness(o.id()))
                    .collect();
                Some(ParentPool { parents, fitness })
            })
            .collect();

        if !pools.is_empty() {
            return pools;
        }
        species
            .iter()
            .map(|specie| ParentPool {
                parents: vec![specie.representative()],
                fitness: vec![0.0],
            })
            .collect()
    }

    fn offspring(
        &self,
        pool: &ParentPool<'_>,
        innovations: &mut dyn InnovationSource,
        rng: &mut dyn RngCore,
    ) -> Organism {
        let first = roulette(&pool.fitness, rng);

        if pool.parents.len() >= 2 && rng.gen::<f32>() < self.config.crossover_chance {
            let remaining: Vec<usize> = (0..pool.parents.len()).filter(|i| *i != first).collect();
            let weights: Vec<f32> = remaining.iter().map(|i| pool.fitness[*i]).collect();
            let second = remaining[roulette(&weights, rng)];

            let (fitter, other) = if pool.fitness[second] > pool.fitness[first] {
                (pool.parents[second], pool.parents[first])
            } else {
                (pool.parents[first], pool.parents[second])
            };
            let mut child = Organism::crossover(fitter, other, &self.config, rng);
            if rng.gen::<f32>() < self.config.child_mutation_chance {
                child.mutate(innovations, &self.config, rng);
            }
            child
        } else {
            let mut child = pool.parents[first].copy();
            child.mutate(innovations, &self.config, rng);
            child
        }
    }
}

impl Reproducer for SpeciesReproducer {
    fn reproduce(
        &mut self,
        innovations: &mut dyn InnovationSource,
        scores: &FitnessLedger,
        required: usize,
        species: &[&Specie],
        survivors: &[&Organism],
        generation: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<Organism> {
        let mut population: Vec<Organism> = survivors.iter().take(required).map(|o| o.copy()).collect();
        let offspring_count = required - population.len();
        if offspring_count == 0 {
            return population;
        }

        let pools = Self::parent_pools(species, survivors, scores);
        assert!(
            !pools.is_empty(),
            "generation {}: no parents available for {} offspring",
            generation,
            offspring_count
        );
        let weights: Vec<f32> = pools.iter().map(ParentPool::weight).collect();

        for _ in 0..offspring_count {
            let pool = &pools[roulette(&weights, rng)];
            population.push(self.offspring(pool, innovations, rng));
        }
        debug!(
            "generation {}: {} survivor(s) and {} offspring from {} specie(s)",
            generation,
            required - offspring_count,
            offspring_count,
            pools.len()
        );

        population
    }
}

/// Draws an index with probability proportional to its weight,
/// after shifting weights so the lowest keeps a non-zero share.
/// Equal weights give a uniform draw.
fn roulette(weights: &[f32], rng: &mut dyn RngCore) -> usize {
    if weights.len() <= 1 {
        return 0;
    }
    let min = weights.iter().copied().fold(f32::INFINITY, f32::min);
    let max = weights.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let range = max - min;
    let offset = if range > 0.0 {
        range / weights.len() as f32
    } else {
        1.0
    };
    let shifted: Vec<f32> = weights.iter().map(|w| w - min + offset).collect();

    match WeightedIndex::new(&shifted) {
        Ok(distribution) => distribution.sample(rng),
        Err(_) => rng.gen_range(0..weights.len()),
    }
}
