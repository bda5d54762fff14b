//! The generational loop.
//!
//! An [`Evolver`] owns the population and drives it through
//! evaluation, speciation, selection and reproduction, one
//! generation per [`step`](Evolver::step).
mod generation;
mod logging;

pub use generation::Generation;
pub use logging::{GenerationReport, Stats};

use crate::config::EvolutionConfig;
use crate::errors::EvolutionError;
use crate::fitness::{Evaluation, EvaluationBatch, FitnessLedger, FitnessObjective};
use crate::genomics::{GeneticConfig, Organism};
use crate::innovations::Innovations;
use crate::persistence::{Checkpointer, GenerationSelector};
use crate::phenotype::PhenotypeBuilder;
use crate::reproduction::{Reproducer, SpeciesReproducer};
use crate::selection::{Selector, SurvivalSelector};
use crate::speciation::{speciator_from, Specie, SpecieIdAllocator, Speciator};

use log::{debug, info};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use std::mem;
use std::time::Instant;

/// The phase an evolver is in, or last went through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvolverState {
    /// No generation was stepped through yet.
    Initialized,
    Evaluating,
    Speciating,
    Selecting,
    Reproducing,
    /// A termination criterion was met. Further steps do nothing.
    Terminated,
}

/// Drives an evolutionary run.
///
/// Each [`step`](Evolver::step):
/// 1. builds a phenotype per organism, and has the objective score them,
/// 2. partitions the population into species,
/// 3. selects surviving species and organisms,
/// 4. refills the population from the survivors,
/// 5. checkpoints the evaluated generation, if configured to,
/// 6. checks the termination criteria.
///
/// # Examples
/// ```
/// use evoneat::config::EvolutionConfig;
/// use evoneat::evolution::{Evolver, EvolverState};
/// use evoneat::genomics::{GeneticConfig, Organism};
/// use std::num::NonZeroUsize;
///
/// let config = EvolutionConfig {
///     population_size: NonZeroUsize::new(20).unwrap(),
///     maximum_generations: 5,
///     elitism: true,
///     survival_ratio: 0.3,
///     ..EvolutionConfig::zero()
/// };
/// let genetic_config = GeneticConfig {
///     initial_expression_chance: 1.0,
///     weight_bound: 1.0,
///     weight_nudge_chance: 0.8,
///     weight_mutation_power: 0.2,
///     ..GeneticConfig::zero()
/// };
///
/// // Phenotypes are the organisms' total weight; the closer to 1, the better.
/// let builder = |o: &Organism, _: &GeneticConfig| -> f32 { o.enabled_connections().map(|c| c.weight()).sum() };
/// let objective = |_: &Organism, total: &mut f32| 1.0 / (1.0 + (*total - 1.0).abs());
///
/// let mut evolver = Evolver::new(config, genetic_config, builder, objective)?;
/// let champion = evolver.run()?;
///
/// assert_eq!(evolver.state(), EvolverState::Terminated);
/// assert_eq!(evolver.generation(), 5);
/// assert!(champion.connection_count() > 0);
/// # Ok::<(), evoneat::errors::EvolutionError>(())
/// ```
pub struct Evolver<B, O>
where
    B: PhenotypeBuilder,
    O: FitnessObjective<B::Phenotype>,
{
    config: EvolutionConfig,
    genetic_config: GeneticConfig,
    builder: B,
    objective: O,
    innovations: Innovations,
    speciator: Box<dyn Speciator>,
    selector: Box<dyn Selector>,
    reproducer: Box<dyn Reproducer>,
    checkpointer: Option<Box<dyn Checkpointer>>,
    specie_ids: SpecieIdAllocator,
    population: Vec<Organism>,
    generation: usize,
    state: EvolverState,
    rng: ChaCha8Rng,
    last: Option<(Generation, FitnessLedger)>,
    reports: Vec<GenerationReport>,
}

impl<B, O> Evolver<B, O>
where
    B: PhenotypeBuilder,
    O: FitnessObjective<B::Phenotype>,
{
    /// Creates an evolver with a random initial population,
    /// and the default speciator, selector and reproducer.
    ///
    /// # Errors
    ///
    /// Returns [`EvolutionError::InvalidConfig`] if `config`
    /// is unusable once sanitized.
    pub fn new(
        config: EvolutionConfig,
        genetic_config: GeneticConfig,
        builder: B,
        objective: O,
    ) -> Result<Evolver<B, O>, EvolutionError> {
        let mut evolver = Self::assemble(config, genetic_config, builder, objective)?;
        let population: Vec<Organism> = (0..evolver.config.population_size.get())
            .map(|_| Organism::new(&evolver.genetic_config, &mut evolver.innovations, &mut evolver.rng))
            .collect();
        evolver.population = population;
        Ok(evolver)
    }

    /// Continues a run from a checkpoint.
    ///
    /// The checkpointed generation goes through selection and
    /// reproduction again, so the first step evaluates the generation
    /// following it. Stagnation records start over, and the random
    /// number generator is reseeded from the configured seed and the
    /// generation number. `checkpointer` is kept for further saves.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is unusable, or
    /// the checkpoint could not be loaded.
    pub fn resume(
        config: EvolutionConfig,
        genetic_config: GeneticConfig,
        builder: B,
        objective: O,
        mut checkpointer: impl Checkpointer + 'static,
        selector: GenerationSelector,
    ) -> Result<Evolver<B, O>, EvolutionError> {
        let checkpoint = checkpointer.load(selector)?;
        let generation = checkpoint.generation;
        let number = generation.number();
        info!("resuming from generation {}", number);

        let mut evolver = Self::assemble(config, genetic_config, builder, objective)?;
        evolver.rng = ChaCha8Rng::seed_from_u64(evolver.config.seed.wrapping_add(number as u64));
        evolver.innovations = checkpoint.innovations;
        evolver.speciator.restore_threshold(generation.threshold());
        evolver.specie_ids = SpecieIdAllocator::starting_at(generation.next_specie_id());
        evolver.checkpointer = Some(Box::new(checkpointer));

        evolver.population = evolver.breed(&generation, &checkpoint.scores)?;
        evolver.generation = number + 1;
        evolver.last = Some((generation, checkpoint.scores));
        Ok(evolver)
    }

    fn assemble(
        config: EvolutionConfig,
        genetic_config: GeneticConfig,
        builder: B,
        objective: O,
    ) -> Result<Evolver<B, O>, EvolutionError> {
        let config = config.sanitized();
        config.validate()?;
        genetic_config.validate()?;

        let mut selector = SurvivalSelector::new(&config);
        selector.reset();
        Ok(Evolver {
            innovations: Innovations::new(&genetic_config),
            speciator: speciator_from(&config),
            selector: Box::new(selector),
            reproducer: Box::new(SpeciesReproducer::new(genetic_config.clone())),
            checkpointer: None,
            specie_ids: SpecieIdAllocator::new(),
            population: vec![],
            generation: 1,
            state: EvolverState::Initialized,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            last: None,
            reports: vec![],
            config,
            genetic_config,
            builder,
            objective,
        })
    }

    /// Replaces the speciator.
    pub fn with_speciator(mut self, speciator: Box<dyn Speciator>) -> Evolver<B, O> {
        self.speciator = speciator;
        self
    }

    /// Replaces the selector.
    pub fn with_selector(mut self, mut selector: Box<dyn Selector>) -> Evolver<B, O> {
        selector.reset();
        self.selector = selector;
        self
    }

    /// Replaces the reproducer.
    pub fn with_reproducer(mut self, reproducer: Box<dyn Reproducer>) -> Evolver<B, O> {
        self.reproducer = reproducer;
        self
    }

    /// Checkpoints generations through `checkpointer`, every
    /// [`checkpoint_interval`] generations and upon termination.
    ///
    /// [`checkpoint_interval`]: EvolutionConfig::checkpoint_interval
    pub fn with_checkpointer(mut self, checkpointer: impl Checkpointer + 'static) -> Evolver<B, O> {
        self.checkpointer = Some(Box::new(checkpointer));
        self
    }

    /// Runs a single generation, returning the resulting state.
    ///
    /// Does nothing once the evolver has terminated.
    ///
    /// # Errors
    ///
    /// Returns an error if some organism was left unscored, if
    /// evaluation overran the configured timeout, if every specie
    /// was culled, or if a checkpoint could not be saved. A failed
    /// evaluation leaves the population untouched.
    pub fn step(&mut self) -> Result<EvolverState, EvolutionError> {
        if self.state == EvolverState::Terminated {
            return Ok(self.state);
        }
        if self.population.is_empty() {
            return Err(EvolutionError::EmptyPopulation);
        }
        let number = self.generation;

        self.state = EvolverState::Evaluating;
        let scores = self.evaluate()?;

        self.state = EvolverState::Speciating;
        let previous: &[Specie] = match &self.last {
            Some((generation, _)) => generation.species(),
            None => &[],
        };
        let species = self
            .speciator
            .speciate(previous, &mut self.population, &mut self.specie_ids);
        debug!("generation {}: {} species", number, species.len());
        let generation = Generation::new(
            number,
            mem::take(&mut self.population),
            species,
            self.specie_ids.peek(),
            self.speciator.threshold(),
        );

        let report = GenerationReport::new(&generation, &scores, &self.innovations);
        info!("{}", report);
        self.reports.push(report);

        let next = self.breed(&generation, &scores);
        let terminated = self.terminated(number, &scores);
        let interval = self.config.checkpoint_interval;
        if let Some(checkpointer) = &mut self.checkpointer {
            if terminated || next.is_err() || (interval > 0 && number % interval == 0) {
                checkpointer.save(&self.innovations, &generation, &scores)?;
            }
        }
        self.last = Some((generation, scores));

        if terminated {
            info!("run terminated after generation {}", number);
            self.population = next.unwrap_or_default();
            self.state = EvolverState::Terminated;
        } else {
            self.population = next?;
            self.generation += 1;
        }
        Ok(self.state)
    }

    /// Steps until a termination criterion is met, and returns
    /// a copy of the fittest organism of the final generation.
    ///
    /// Runs with neither `maximum_generations` nor
    /// `maximum_fitness` set never return.
    pub fn run(&mut self) -> Result<Organism, EvolutionError> {
        while self.step()? != EvolverState::Terminated {}
        self.champion()
            .map(Organism::copy)
            .ok_or(EvolutionError::EmptyPopulation)
    }

    fn evaluate(&self) -> Result<FitnessLedger, EvolutionError> {
        let entries = self
            .population
            .iter()
            .map(|o| Evaluation::new(o, self.builder.build(o, &self.genetic_config)))
            .collect();
        let started = Instant::now();
        let deadline = self.config.evaluation_timeout.map(|limit| started + limit);
        let mut batch = EvaluationBatch::new(entries, deadline);

        self.objective.evaluate(&mut batch);

        let elapsed = started.elapsed();
        let generation = self.generation;
        if let Some(limit) = self.config.evaluation_timeout {
            if elapsed > limit {
                return Err(EvolutionError::EvaluationTimeout {
                    generation,
                    elapsed,
                    limit,
                });
            }
        }
        batch
            .into_ledger()
            .map_err(|missing| EvolutionError::IncompleteEvaluation {
                generation,
                missing: missing.len(),
            })
    }

    /// Selects the survivors of `generation`, and
    /// reproduces them into a full population.
    fn breed(
        &mut self,
        generation: &Generation,
        scores: &FitnessLedger,
    ) -> Result<Vec<Organism>, EvolutionError> {
        let number = generation.number();

        self.state = EvolverState::Selecting;
        let surviving = self
            .selector
            .select_species(generation.species(), scores, number);
        if surviving.is_empty() {
            return Err(EvolutionError::DegeneratePopulation { generation: number });
        }
        let survivors = self.selector.select_organisms(
            &surviving,
            scores,
            generation.organisms(),
            number,
            &mut self.rng,
        );

        self.state = EvolverState::Reproducing;
        Ok(self.reproducer.reproduce(
            &mut self.innovations,
            scores,
            self.config.population_size.get(),
            &surviving,
            &survivors,
            number,
            &mut self.rng,
        ))
    }

    fn terminated(&self, number: usize, scores: &FitnessLedger) -> bool {
        let maximum_generations = self.config.maximum_generations;
        if maximum_generations > 0 && number >= maximum_generations {
            return true;
        }
        match (self.config.maximum_fitness, scores.best()) {
            (Some(maximum), Some(best)) => best >= maximum,
            _ => false,
        }
    }

    /// The number of the generation being, or last, evaluated.
    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn state(&self) -> EvolverState {
        self.state
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    pub fn genetic_config(&self) -> &GeneticConfig {
        &self.genetic_config
    }

    pub fn innovations(&self) -> &Innovations {
        &self.innovations
    }

    /// The population awaiting evaluation.
    pub fn population(&self) -> &[Organism] {
        &self.population
    }

    /// The last evaluated generation.
    pub fn last_generation(&self) -> Option<&Generation> {
        self.last.as_ref().map(|(generation, _)| generation)
    }

    /// The fitness scores of the last evaluated generation.
    pub fn last_scores(&self) -> Option<&FitnessLedger> {
        self.last.as_ref().map(|(_, scores)| scores)
    }

    /// The fittest organism of the last evaluated generation.
    pub fn champion(&self) -> Option<&Organism> {
        self.last
            .as_ref()
            .and_then(|(generation, scores)| generation.champion(scores))
    }

    /// The reports of every generation stepped through.
    pub fn reports(&self) -> &[GenerationReport] {
        &self.reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CompatibilityCoefficients, SpeciationConfig};
    use crate::persistence::{DirectoryCheckpointer, RonCodec};
    use std::num::NonZeroUsize;
    use std::time::Duration;

    fn config() -> EvolutionConfig {
        EvolutionConfig {
            population_size: NonZeroUsize::new(30).unwrap(),
            maximum_generations: 6,
            survival_ratio: 0.4,
            elitism: true,
            kill_stagnant_species: true,
            stagnation_limit: 10,
            compatibility: CompatibilityCoefficients {
                excess: 1.0,
                disjoint: 1.0,
                weight: 0.4,
            },
            speciation: SpeciationConfig::Dynamic {
                initial_threshold: 1.0,
                target_species: 4,
                step: 0.1,
                min_threshold: 0.2,
            },
            seed: 17,
            ..EvolutionConfig::zero()
        }
    }

    fn genetic_config() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(2).unwrap(),
            initial_expression_chance: 0.7,
            weight_bound: 2.0,
            weight_reset_chance: 0.1,
            weight_nudge_chance: 0.8,
            weight_mutation_power: 0.3,
            neuron_addition_chance: 0.1,
            connection_addition_chance: 0.2,
            max_connection_addition_attempts: 10,
            crossover_chance: 0.75,
            child_mutation_chance: 0.5,
            mate_by_averaging_chance: 0.4,
            disabled_inheritance_chance: 0.75,
            ..GeneticConfig::zero()
        }
    }

    fn connection_count(organism: &Organism, _: &GeneticConfig) -> usize {
        organism.enabled_connections().count()
    }

    fn score(_: &Organism, connections: &mut usize) -> f32 {
        *connections as f32
    }

    #[test]
    fn population_size_is_preserved() {
        let mut evolver = Evolver::new(config(), genetic_config(), connection_count, score).unwrap();
        assert_eq!(evolver.state(), EvolverState::Initialized);
        for _ in 0..3 {
            evolver.step().unwrap();
            assert_eq!(evolver.population().len(), 30);
            let generation = evolver.last_generation().unwrap();
            let assigned: usize = generation.species().iter().map(|s| s.len()).sum();
            assert_eq!(assigned, 30);
        }
        assert_eq!(evolver.generation(), 4);
        assert_eq!(evolver.reports().len(), 3);
    }

    #[test]
    fn runs_until_maximum_generations() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut evolver = Evolver::new(config(), genetic_config(), connection_count, score).unwrap();
        evolver.run().unwrap();
        assert_eq!(evolver.state(), EvolverState::Terminated);
        assert_eq!(evolver.generation(), 6);
        assert_eq!(evolver.last_generation().unwrap().number(), 6);
        assert_eq!(evolver.step().unwrap(), EvolverState::Terminated);
        assert_eq!(evolver.reports().len(), 6);
    }

    #[test]
    fn runs_until_maximum_fitness() {
        let config = EvolutionConfig {
            maximum_generations: 0,
            maximum_fitness: Some(0.0),
            ..config()
        };
        let mut evolver = Evolver::new(config, genetic_config(), connection_count, score).unwrap();
        evolver.run().unwrap();
        assert_eq!(evolver.generation(), 1);
    }

    #[test]
    fn same_seed_same_run() {
        let mut first = Evolver::new(config(), genetic_config(), connection_count, score).unwrap();
        let mut second = Evolver::new(config(), genetic_config(), connection_count, score).unwrap();
        first.run().unwrap();
        second.run().unwrap();
        assert_eq!(first.reports(), second.reports());
        for (a, b) in first.population().iter().zip(second.population()) {
            assert!(a.genes_eq(b));
        }
    }

    #[test]
    fn unscored_organisms_abort_the_step() {
        struct FirstOnly;
        impl FitnessObjective<usize> for FirstOnly {
            fn evaluate(&self, batch: &mut EvaluationBatch<'_, usize>) {
                if let Some(entry) = batch.iter_mut().next() {
                    entry.set_fitness(1.0);
                }
            }
        }

        let mut evolver = Evolver::new(config(), genetic_config(), connection_count, FirstOnly).unwrap();
        match evolver.step() {
            Err(EvolutionError::IncompleteEvaluation { generation, missing }) => {
                assert_eq!(generation, 1);
                assert_eq!(missing, 29);
            }
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(evolver.population().len(), 30);
        assert!(evolver.last_generation().is_none());
    }

    #[test]
    fn late_evaluations_time_out() {
        let config = EvolutionConfig {
            evaluation_timeout: Some(Duration::from_millis(5)),
            ..config()
        };
        let slow = |_: &Organism, _: &mut usize| {
            std::thread::sleep(Duration::from_millis(2));
            1.0
        };
        let mut evolver = Evolver::new(config, genetic_config(), connection_count, slow).unwrap();
        assert!(matches!(
            evolver.step(),
            Err(EvolutionError::EvaluationTimeout { generation: 1, .. })
        ));
    }

    #[test]
    fn overrunning_evaluations_abort_even_when_complete() {
        let config = EvolutionConfig {
            population_size: NonZeroUsize::new(1).unwrap(),
            evaluation_timeout: Some(Duration::from_millis(5)),
            ..config()
        };
        let slow = |_: &Organism, _: &mut usize| {
            std::thread::sleep(Duration::from_millis(50));
            1.0
        };
        let mut evolver = Evolver::new(config, genetic_config(), connection_count, slow).unwrap();
        match evolver.step() {
            Err(EvolutionError::EvaluationTimeout { generation, elapsed, limit }) => {
                assert_eq!(generation, 1);
                assert!(elapsed > limit);
            }
            other => panic!("unexpected result {:?}", other),
        }
        assert!(evolver.last_generation().is_none());
    }

    #[test]
    fn culling_every_specie_is_fatal() {
        let config = EvolutionConfig {
            stagnation_limit: 0,
            speciation: SpeciationConfig::Fixed { threshold: 1000.0 },
            ..config()
        };
        let constant = |_: &Organism, _: &mut usize| 1.0;
        let mut evolver = Evolver::new(config, genetic_config(), connection_count, constant).unwrap();
        assert_eq!(evolver.step().unwrap(), EvolverState::Reproducing);
        assert!(matches!(
            evolver.step(),
            Err(EvolutionError::DegeneratePopulation { generation: 2 })
        ));
        assert_eq!(evolver.last_generation().unwrap().number(), 2);
        assert!(matches!(evolver.step(), Err(EvolutionError::EmptyPopulation)));
    }

    #[test]
    fn invalid_genetic_configurations_are_rejected() {
        let genetic_config = GeneticConfig {
            weight_bound: -1.0,
            ..genetic_config()
        };
        assert!(matches!(
            Evolver::new(config(), genetic_config, connection_count, score),
            Err(EvolutionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn invalid_configurations_are_rejected() {
        let config = EvolutionConfig {
            compatibility: CompatibilityCoefficients {
                excess: -1.0,
                ..CompatibilityCoefficients::zero()
            },
            ..config()
        };
        assert!(matches!(
            Evolver::new(config, genetic_config(), connection_count, score),
            Err(EvolutionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn checkpoints_and_resumes() {
        let directory = tempfile::tempdir().unwrap();
        let config = EvolutionConfig {
            checkpoint_interval: 2,
            ..config()
        };
        let checkpointer = DirectoryCheckpointer::<RonCodec>::new(directory.path()).unwrap();
        let mut evolver = Evolver::new(config.clone(), genetic_config(), connection_count, score)
            .unwrap()
            .with_checkpointer(checkpointer);
        for _ in 0..3 {
            evolver.step().unwrap();
        }

        let checkpointer = DirectoryCheckpointer::<RonCodec>::new(directory.path()).unwrap();
        assert_eq!(checkpointer.generations().unwrap(), vec![2]);

        let mut resumed = Evolver::resume(
            config,
            genetic_config(),
            connection_count,
            score,
            checkpointer,
            GenerationSelector::Latest,
        )
        .unwrap();
        assert_eq!(resumed.generation(), 3);
        assert_eq!(resumed.population().len(), 30);
        assert_eq!(resumed.last_generation().unwrap().number(), 2);
        assert!(resumed.innovations().next_innovation() > 0);

        resumed.run().unwrap();
        assert_eq!(resumed.generation(), 6);
        let saved = DirectoryCheckpointer::<RonCodec>::new(directory.path())
            .unwrap()
            .generations()
            .unwrap();
        assert_eq!(saved, vec![2, 4, 6]);
    }
}
