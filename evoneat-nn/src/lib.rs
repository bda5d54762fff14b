//! # evoneat-nn
//! Neural network phenotypes for [`evoneat`] organisms.
//!
//! Two network implementations can be generated from an [`Organism`]:
//! - [`RealTimeNetwork`]: best suited for real-time control tasks, with new inputs set for each activation, and multiple time-steps involved.
//! - [`FunctionApproximatorNetwork`]: best suited for more instantaneous single-output-per-input function approximation tasks.
//!
//! The [`builders`] module plugs either of them into an [`Evolver`].
//!
//! [`Organism`]: evoneat::genomics::Organism
//! [`Evolver`]: evoneat::evolution::Evolver
//! [`RealTimeNetwork`]: crate::networks::RealTimeNetwork
//! [`FunctionApproximatorNetwork`]: crate::networks::FunctionApproximatorNetwork
//!
//! # Example usage: Evolution of XOR function approximator
//! ```
//! use evoneat::config::{CompatibilityCoefficients, EvolutionConfig, SpeciationConfig};
//! use evoneat::evolution::Evolver;
//! use evoneat::genomics::{ActivationType, GeneticConfig, Organism};
//! use evoneat_nn::builders::FunctionApproximatorBuilder;
//! use evoneat_nn::networks::FunctionApproximatorNetwork;
//! use std::num::NonZeroUsize;
//!
//! // Allowed error margin for neural net answers.
//! const ERROR_MARGIN: f32 = 0.3;
//!
//! fn evaluate_xor(_: &Organism, network: &mut FunctionApproximatorNetwork<1>) -> f32 {
//!     let values = [
//!         ([0.0, 0.0], 0.0),
//!         ([0.0, 1.0], 1.0),
//!         ([1.0, 0.0], 1.0),
//!         ([1.0, 1.0], 0.0),
//!     ];
//!
//!     let mut errors = [0.0, 0.0, 0.0, 0.0];
//!     for (i, (input, output)) in values.iter().enumerate() {
//!         errors[i] = (network.evaluate_at(input)[0] - output).abs();
//!         if errors[i] < ERROR_MARGIN {
//!             errors[i] = 0.0;
//!         }
//!     }
//!
//!     (4.0 - errors.iter().copied().sum::<f32>()).powf(2.0)
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let genetic_config = GeneticConfig {
//!         input_count: NonZeroUsize::new(2).unwrap(),
//!         output_count: NonZeroUsize::new(1).unwrap(),
//!         activation_types: vec![ActivationType::Sigmoid],
//!         output_activation_types: vec![ActivationType::Sigmoid],
//!         child_mutation_chance: 0.65,
//!         mate_by_averaging_chance: 0.4,
//!         disabled_inheritance_chance: 0.75,
//!         crossover_chance: 0.75,
//!         initial_expression_chance: 1.0,
//!         weight_bound: 5.0,
//!         weight_reset_chance: 0.2,
//!         weight_nudge_chance: 0.9,
//!         weight_mutation_power: 2.5,
//!         neuron_addition_chance: 0.03,
//!         connection_addition_chance: 0.05,
//!         max_connection_addition_attempts: 20,
//!         ..GeneticConfig::zero()
//!     };
//!
//!     let config = EvolutionConfig {
//!         population_size: NonZeroUsize::new(150).unwrap(),
//!         maximum_generations: 20,
//!         maximum_fitness: Some(16.0),
//!         survival_ratio: 0.2,
//!         elitism: true,
//!         kill_stagnant_species: true,
//!         stagnation_limit: 20,
//!         compatibility: CompatibilityCoefficients {
//!             excess: 1.0,
//!             disjoint: 1.0,
//!             weight: 0.4,
//!         },
//!         speciation: SpeciationConfig::Fixed { threshold: 3.0 },
//!         ..EvolutionConfig::zero()
//!     };
//!
//!     let mut evolver = Evolver::new(
//!         config,
//!         genetic_config,
//!         FunctionApproximatorBuilder::<1>,
//!         evaluate_xor,
//!     )?;
//!     let champion = evolver.run()?;
//!     println!("champion: {}", champion);
//!     Ok(())
//! }
//! ```

pub mod builders;
pub mod networks;

pub use builders::{FunctionApproximatorBuilder, NetworkBuilder};
pub use networks::{FunctionApproximatorNetwork, RealTimeNetwork};
