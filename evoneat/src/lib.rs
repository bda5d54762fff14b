//! An implementation of NeuroEvolution of Augmenting Topologies,
//! following the 2002 paper: <http://nn.cs.utexas.edu/keyword?stanley:ec02>
//!
//! Populations of variable-topology genomes ([`Organism`]s) are evolved
//! generation by generation by an [`Evolver`], against a user-supplied
//! [`FitnessObjective`]. Organisms are turned into whatever the objective
//! scores (usually a neural network) by a [`PhenotypeBuilder`]; the
//! `evoneat-nn` crate supplies neural network phenotypes.
//!
//! Speciation, selection and reproduction are pluggable through the
//! [`Speciator`], [`Selector`] and [`Reproducer`] traits, and runs can
//! be checkpointed and resumed through a [`Checkpointer`].
//!
//! [`Organism`]: genomics::Organism
//! [`Evolver`]: evolution::Evolver
//! [`FitnessObjective`]: fitness::FitnessObjective
//! [`PhenotypeBuilder`]: phenotype::PhenotypeBuilder
//! [`Speciator`]: speciation::Speciator
//! [`Selector`]: selection::Selector
//! [`Reproducer`]: reproduction::Reproducer
//! [`Checkpointer`]: persistence::Checkpointer
//!
//! # Example usage: evolving a weight sum
//! ```
//! use evoneat::config::{CompatibilityCoefficients, EvolutionConfig, SpeciationConfig};
//! use evoneat::evolution::Evolver;
//! use evoneat::genomics::{ActivationType, GeneticConfig, Organism};
//! use std::num::NonZeroUsize;
//!
//! // The phenotype: the sum of every enabled connection weight.
//! fn weight_sum(organism: &Organism, _: &GeneticConfig) -> f32 {
//!     organism.enabled_connections().map(|c| c.weight()).sum()
//! }
//!
//! // Fitness peaks when the weights sum up to 3.
//! fn evaluate(_: &Organism, sum: &mut f32) -> f32 {
//!     1.0 / (1.0 + (*sum - 3.0).abs())
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let genetic_config = GeneticConfig {
//!         input_count: NonZeroUsize::new(2).unwrap(),
//!         output_count: NonZeroUsize::new(1).unwrap(),
//!         activation_types: vec![ActivationType::Sigmoid],
//!         output_activation_types: vec![ActivationType::Sigmoid],
//!         initial_expression_chance: 1.0,
//!         weight_bound: 5.0,
//!         weight_reset_chance: 0.1,
//!         weight_nudge_chance: 0.9,
//!         weight_mutation_power: 0.5,
//!         neuron_addition_chance: 0.03,
//!         connection_addition_chance: 0.05,
//!         max_connection_addition_attempts: 20,
//!         crossover_chance: 0.75,
//!         child_mutation_chance: 0.65,
//!         mate_by_averaging_chance: 0.4,
//!         disabled_inheritance_chance: 0.75,
//!         ..GeneticConfig::zero()
//!     };
//!
//!     let config = EvolutionConfig {
//!         population_size: NonZeroUsize::new(50).unwrap(),
//!         maximum_generations: 30,
//!         maximum_fitness: Some(0.99),
//!         survival_ratio: 0.2,
//!         elitism: true,
//!         kill_stagnant_species: true,
//!         stagnation_limit: 30,
//!         compatibility: CompatibilityCoefficients {
//!             excess: 1.0,
//!             disjoint: 1.0,
//!             weight: 0.4,
//!         },
//!         speciation: SpeciationConfig::Fixed { threshold: 3.0 },
//!         seed: 42,
//!         ..EvolutionConfig::zero()
//!     };
//!
//!     let mut evolver = Evolver::new(config, genetic_config, weight_sum, evaluate)?;
//!     let champion = evolver.run()?;
//!     println!("champion: {}", champion);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod errors;
pub mod evolution;
pub mod fitness;
pub mod genomics;
pub mod innovations;
pub mod persistence;
pub mod phenotype;
pub mod reproduction;
pub mod selection;
pub mod speciation;

pub use config::{EvolutionConfig, GeneticConfig};
pub use errors::EvolutionError;
pub use evolution::{Evolver, EvolverState, Generation};
pub use fitness::{FitnessLedger, FitnessObjective, ParallelObjective};
pub use genomics::{Organism, OrganismId};
pub use innovations::{InnovationSource, Innovations};
pub use phenotype::PhenotypeBuilder;

/// Identifier type used to designate historically
/// identical mutations for the purposes of
/// genome comparison and genetic tracking.
pub type Innovation = usize;
