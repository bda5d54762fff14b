//! Selection decides which species and organisms
//! survive into the reproduction phase.
use crate::config::EvolutionConfig;
use crate::fitness::FitnessLedger;
use crate::genomics::{Organism, OrganismId};
use crate::speciation::{Specie, SpecieId};

use ahash::RandomState;
use log::{debug, warn};
use rand::seq::SliceRandom;
use rand::RngCore;

use std::collections::{HashMap, HashSet};

/// Something that prunes species and organisms after speciation.
pub trait Selector {
    /// Returns the species allowed to take part in reproduction,
    /// in their original order.
    fn select_species<'s>(
        &mut self,
        species: &'s [Specie],
        scores: &FitnessLedger,
        generation: usize,
    ) -> Vec<&'s Specie>;

    /// Returns the organisms surviving into the next generation,
    /// drawn from `organisms`.
    fn select_organisms<'a>(
        &mut self,
        species: &[&Specie],
        scores: &FitnessLedger,
        organisms: &'a [Organism],
        generation: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<&'a Organism>;

    /// Forgets all state accumulated during a run.
    fn reset(&mut self);
}

/// A specie's best fitness so far, and the generation it was reached.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StagnationRecord {
    pub best_fitness: f32,
    pub last_improved: usize,
}

/// The default selector.
///
/// Species that fail to improve their best fitness for more than
/// [`stagnation_limit`] generations are removed, if
/// [`kill_stagnant_species`] is set.
///
/// Organisms survive by elitism (the fittest member of every
/// surviving specie) and by a uniform draw among the rest of the
/// population, sized by [`survival_ratio`].
///
/// [`stagnation_limit`]: EvolutionConfig::stagnation_limit
/// [`kill_stagnant_species`]: EvolutionConfig::kill_stagnant_species
/// [`survival_ratio`]: EvolutionConfig::survival_ratio
#[derive(Clone, Debug)]
pub struct SurvivalSelector {
    population_size: usize,
    survival_ratio: f32,
    elitism: bool,
    kill_stagnant_species: bool,
    stagnation_limit: usize,
    records: HashMap<SpecieId, StagnationRecord, RandomState>,
}

impl SurvivalSelector {
    pub fn new(config: &EvolutionConfig) -> SurvivalSelector {
        SurvivalSelector {
            population_size: config.population_size.get(),
            survival_ratio: config.survival_ratio.clamp(0.0, 1.0),
            elitism: config.elitism,
            kill_stagnant_species: config.kill_stagnant_species,
            stagnation_limit: config.stagnation_limit,
            records: HashMap::default(),
        }
    }

    /// Returns the stagnation record of a specie, if it is tracked.
    pub fn record(&self, specie: SpecieId) -> Option<&StagnationRecord> {
        self.records.get(&specie)
    }

    /// Updates the record of `specie`, and returns whether it stagnated.
    /// Empty species are never considered stagnant.
    fn stagnated(&mut self, specie: &Specie, scores: &FitnessLedger, generation: usize) -> bool {
        let best = match specie.best_fitness(scores) {
            Some(best) => best,
            None => return false,
        };
        let record = self.records.entry(specie.id()).or_insert(StagnationRecord {
            best_fitness: f32::NEG_INFINITY,
            last_improved: generation,
        });
        if best > record.best_fitness {
            record.best_fitness = best;
            record.last_improved = generation;
            false
        } else {
            generation.saturating_sub(record.last_improved) > self.stagnation_limit
        }
    }
}

impl Selector for SurvivalSelector {
    fn select_species<'s>(
        &mut self,
        species: &'s [Specie],
        scores: &FitnessLedger,
        generation: usize,
    ) -> Vec<&'s Specie> {
        if !self.kill_stagnant_species {
            return species.iter().collect();
        }

        let mut selected = vec![];
        for specie in species {
            if !self.stagnated(specie, scores, generation) {
                selected.push(specie);
            } else {
                warn!(
                    "specie {} culled after {} generations without improvement",
                    specie.id(),
                    self.stagnation_limit
                );
                self.records.remove(&specie.id());
            }
        }
        selected
    }

    fn select_organisms<'a>(
        &mut self,
        species: &[&Specie],
        scores: &FitnessLedger,
        organisms: &'a [Organism],
        _generation: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<&'a Organism> {
        let by_id: HashMap<OrganismId, &'a Organism, RandomState> =
            organisms.iter().map(|o| (o.id(), o)).collect();
        let mut chosen: HashSet<OrganismId, RandomState> = HashSet::default();
        let mut selected: Vec<&'a Organism> = vec![];

        if self.elitism {
            for specie in species {
                if let Some(organism) = specie.fittest_member(scores).and_then(|id| by_id.get(&id).copied()) {
                    if chosen.insert(organism.id()) {
                        selected.push(organism);
                    }
                }
            }
        }
        let elite_count = selected.len();

        if self.survival_ratio > 0.0 {
            let extras = (self.survival_ratio
                * self.population_size.saturating_sub(elite_count) as f32)
                .round() as usize;
            let pool: Vec<&'a Organism> = organisms
                .iter()
                .filter(|o| !chosen.contains(&o.id()))
                .collect();
            selected.extend(pool.choose_multiple(rng, extras).copied());
        }

        selected.truncate(self.population_size);
        debug!(
            "{} survivor(s), {} by elitism",
            selected.len(),
            elite_count.min(selected.len())
        );
        selected
    }

    fn reset(&mut self) {
        self.records.clear();
    }
}
