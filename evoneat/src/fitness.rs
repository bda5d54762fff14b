//! Fitness bookkeeping and the evaluation boundary.
//!
//! Each generation, the evolver hands an [`EvaluationBatch`] to a
//! [`FitnessObjective`], which must score every entry. The scores
//! are then frozen into a [`FitnessLedger`].
mod parallel;

pub use parallel::ParallelObjective;

use crate::genomics::{Organism, OrganismId};

use ahash::RandomState;

use std::collections::hash_map::{Entry, HashMap};
use std::time::Instant;

/// Fitness of every organism of a single generation.
///
/// Every organism is scored exactly once. Recording a second score
/// for the same organism, recording a non-finite score, or asking for
/// the fitness of an unscored organism are programmer errors, and panic.
#[derive(Clone, Debug, Default)]
pub struct FitnessLedger {
    scores: HashMap<OrganismId, f32, RandomState>,
}

/// The ledger of a generation, under its glossary name.
pub type FitnessScores = FitnessLedger;

impl FitnessLedger {
    pub fn new() -> FitnessLedger {
        FitnessLedger::default()
    }

    /// Records the fitness of an organism.
    ///
    /// # Panics
    ///
    /// Panics if the organism was already scored,
    /// or if `fitness` is NaN or infinite.
    ///
    /// # Examples
    /// ```
    /// use evoneat::fitness::FitnessLedger;
    /// use evoneat::genomics::{GeneticConfig, Organism};
    ///
    /// let organism = Organism::bare(&GeneticConfig::zero());
    /// let mut ledger = FitnessLedger::new();
    ///
    /// ledger.record(organism.id(), 3.5);
    ///
    /// assert_eq!(ledger.fitness(organism.id()), 3.5);
    /// ```
    pub fn record(&mut self, id: OrganismId, fitness: f32) {
        assert!(
            fitness.is_finite(),
            "non-finite fitness {} recorded for organism {}",
            fitness,
            id
        );
        match self.scores.entry(id) {
            Entry::Occupied(_) => panic!("organism {} was already scored", id),
            Entry::Vacant(entry) => {
                entry.insert(fitness);
            }
        }
    }

    /// Returns the fitness of an organism.
    ///
    /// # Panics
    ///
    /// Panics if the organism was never scored.
    pub fn fitness(&self, id: OrganismId) -> f32 {
        match self.scores.get(&id) {
            Some(fitness) => *fitness,
            None => panic!("organism {} has no recorded fitness", id),
        }
    }

    /// Returns the fitness of an organism, if it was scored.
    pub fn get(&self, id: OrganismId) -> Option<f32> {
        self.scores.get(&id).copied()
    }

    /// Returns the organism with the highest fitness, or `None` if
    /// `organisms` is empty. Ties are resolved in favour of the first
    /// one encountered.
    ///
    /// # Panics
    ///
    /// Panics if any of `organisms` is unscored.
    ///
    /// # Examples
    /// ```
    /// use evoneat::fitness::FitnessLedger;
    /// use evoneat::genomics::{GeneticConfig, Organism};
    ///
    /// let config = GeneticConfig::zero();
    /// let organisms: Vec<Organism> = (0..3).map(|_| Organism::bare(&config)).collect();
    /// let mut ledger = FitnessLedger::new();
    /// ledger.record(organisms[0].id(), 1.0);
    /// ledger.record(organisms[1].id(), 2.0);
    /// ledger.record(organisms[2].id(), 2.0);
    ///
    /// assert_eq!(ledger.fittest(&organisms).unwrap().id(), organisms[1].id());
    /// ```
    pub fn fittest<'a>(&self, organisms: impl IntoIterator<Item = &'a Organism>) -> Option<&'a Organism> {
        organisms
            .into_iter()
            .map(|o| (o, self.fitness(o.id())))
            .fold(None::<(&'a Organism, f32)>, |best, (o, f)| match best {
                Some((_, best_fitness)) if best_fitness >= f => best,
                _ => Some((o, f)),
            })
            .map(|(o, _)| o)
    }

    /// Returns the highest recorded fitness.
    pub fn best(&self) -> Option<f32> {
        self.scores.values().copied().reduce(f32::max)
    }

    /// Returns the mean recorded fitness.
    pub fn mean(&self) -> Option<f32> {
        if self.scores.is_empty() {
            None
        } else {
            Some(self.scores.values().sum::<f32>() / self.scores.len() as f32)
        }
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Returns an iterator over every recorded score.
    /// No ordering is guaranteed.
    pub fn iter(&self) -> impl Iterator<Item = (OrganismId, f32)> + '_ {
        self.scores.iter().map(|(id, f)| (*id, *f))
    }
}

/// An organism awaiting evaluation, along with its phenotype.
#[derive(Debug)]
pub struct Evaluation<'a, P> {
    organism: &'a Organism,
    phenotype: P,
    fitness: Option<f32>,
}

impl<'a, P> Evaluation<'a, P> {
    pub fn new(organism: &'a Organism, phenotype: P) -> Evaluation<'a, P> {
        Evaluation {
            organism,
            phenotype,
            fitness: None,
        }
    }

    pub fn organism(&self) -> &'a Organism {
        self.organism
    }

    pub fn phenotype(&self) -> &P {
        &self.phenotype
    }

    pub fn phenotype_mut(&mut self) -> &mut P {
        &mut self.phenotype
    }

    /// Both the organism and its phenotype, the latter mutably.
    pub fn parts(&mut self) -> (&'a Organism, &mut P) {
        (self.organism, &mut self.phenotype)
    }

    pub fn fitness(&self) -> Option<f32> {
        self.fitness
    }

    /// Scores the organism. Scoring an entry again overwrites
    /// the previous value.
    ///
    /// # Panics
    ///
    /// Panics if `fitness` is NaN or infinite.
    pub fn set_fitness(&mut self, fitness: f32) {
        assert!(
            fitness.is_finite(),
            "non-finite fitness {} for organism {}",
            fitness,
            self.organism.id()
        );
        self.fitness = Some(fitness);
    }
}

/// The organisms of a generation, handed to a [`FitnessObjective`]
/// to be scored before an optional deadline.
#[derive(Debug)]
pub struct EvaluationBatch<'a, P> {
    entries: Vec<Evaluation<'a, P>>,
    deadline: Option<Instant>,
}

impl<'a, P> EvaluationBatch<'a, P> {
    pub fn new(entries: Vec<Evaluation<'a, P>>, deadline: Option<Instant>) -> EvaluationBatch<'a, P> {
        EvaluationBatch { entries, deadline }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns `true` if the deadline has passed.
    /// Objectives should not start new evaluations once it has.
    pub fn expired(&self) -> bool {
        self.deadline.map_or(false, |d| Instant::now() >= d)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Evaluation<'a, P>> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Evaluation<'a, P>> {
        self.entries.iter_mut()
    }

    pub fn entries_mut(&mut self) -> &mut [Evaluation<'a, P>] {
        &mut self.entries
    }

    /// Freezes the batch's scores into a ledger.
    ///
    /// # Errors
    ///
    /// Returns the identities of the organisms left unscored.
    pub fn into_ledger(self) -> Result<FitnessLedger, Vec<OrganismId>> {
        let mut ledger = FitnessLedger::new();
        let mut missing = vec![];
        for entry in self.entries {
            match entry.fitness {
                Some(fitness) => ledger.record(entry.organism.id(), fitness),
                None => missing.push(entry.organism.id()),
            }
        }
        if missing.is_empty() {
            Ok(ledger)
        } else {
            Err(missing)
        }
    }
}

/// Something that assigns fitness to the organisms of a generation.
///
/// `evaluate` is called once per generation and must score every
/// entry of the batch. It may parallelize internally, and should
/// stop starting new evaluations once the batch has [expired].
///
/// Any `Fn(&Organism, &mut P) -> f32` is an objective that scores
/// the batch sequentially. Use [`ParallelObjective`] to spread the
/// work over a thread pool.
///
/// [expired]: EvaluationBatch::expired
pub trait FitnessObjective<P> {
    fn evaluate(&self, batch: &mut EvaluationBatch<'_, P>);
}

impl<P, F> FitnessObjective<P> for F
where
    F: Fn(&Organism, &mut P) -> f32,
{
    fn evaluate(&self, batch: &mut EvaluationBatch<'_, P>) {
        for i in 0..batch.len() {
            if batch.expired() {
                break;
            }
            let entry = &mut batch.entries[i];
            let fitness = self(entry.organism, &mut entry.phenotype);
            entry.set_fitness(fitness);
        }
    }
}
