use crate::errors::EvolutionError;
use crate::genomics::ActivationType;
use crate::Innovation;

use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;
use std::ops::Range;

/// Configuration data for organism generation,
/// mutation and crossover.
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0]. Using
/// values that are not in this bound may result
/// in odd behaviours and/or incorrect programs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneticConfig {
    /// Number of inputs in an organism.
    pub input_count: NonZeroUsize,
    /// Number of outputs in an organism.
    pub output_count: NonZeroUsize,
    /// Possible activation types for hidden neurons.
    /// If an empty vector is given, neurons will default
    /// to [`Sigmoid`].
    ///
    /// [`Sigmoid`]: crate::genomics::ActivationType
    pub activation_types: Vec<ActivationType>,
    /// Activation types of output neurons.
    /// If fewer than [`output_count`] are specified,
    /// the default is [`Sigmoid`].
    ///
    /// [`output_count`]: GeneticConfig::output_count
    /// [`Sigmoid`]: crate::genomics::ActivationType
    pub output_activation_types: Vec<ActivationType>,
    /// Chance that a connection between an input (or the bias)
    /// and an output is created in a fresh organism.
    pub initial_expression_chance: f32,
    /// Maximum magnitude of a connection's weight.
    pub weight_bound: f32,
    /// Chance of a connection weight being reset during mutation.
    pub weight_reset_chance: f32,
    /// Chance of a connection weight being nudged during mutation, if not reset.
    pub weight_nudge_chance: f32,
    /// Magnitude of bound on weight nudge uniform distribution.
    /// It is assumed to be lesser than [`weight_bound`]
    ///
    /// [`weight_bound`]: GeneticConfig::weight_bound
    pub weight_mutation_power: f32,
    /// Chance of a neuron addition mutation taking place.
    pub neuron_addition_chance: f32,
    /// Chance of a connection addition mutation taking place.
    pub connection_addition_chance: f32,
    /// Maximum number of source neurons tried before
    /// connection addition gives up.
    pub max_connection_addition_attempts: usize,
    /// Chance that connection addition creates a self-loop,
    /// if the chosen source allows it.
    pub recursion_chance: f32,
    /// Chance that a random connection has its enabled flag flipped.
    pub toggle_enabled_chance: f32,
    /// Chance that an offspring is the result of crossover
    /// (as opposed to a mutated copy of a single parent).
    pub crossover_chance: f32,
    /// Chance of mutating an offspring produced by crossover.
    /// Asexual offspring are always mutated.
    pub child_mutation_chance: f32,
    /// Chance that matching connection weights are averaged during
    /// crossover, instead of copied from a randomly chosen parent.
    pub mate_by_averaging_chance: f32,
    /// Chance that a matching connection disabled in either parent
    /// is also disabled in the offspring.
    pub disabled_inheritance_chance: f32,
}

impl GeneticConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, empty, or in the case of
    /// `NonZeroUsize`s, 1.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to fill in unused values during
    /// configuration instantiation.
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::GeneticConfig;
    ///
    /// let cfg1 = GeneticConfig::zero();
    ///
    /// let cfg2 = GeneticConfig {
    ///     // Specify some values here...
    ///     recursion_chance: 1.0,
    ///     child_mutation_chance: 1.0,
    ///     // Default the rest...
    ///     ..GeneticConfig::zero()
    /// };
    /// ```
    pub const fn zero() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::MIN,
            output_count: NonZeroUsize::MIN,
            activation_types: vec![],
            output_activation_types: vec![],
            initial_expression_chance: 0.0,
            weight_bound: 0.0,
            weight_reset_chance: 0.0,
            weight_nudge_chance: 0.0,
            weight_mutation_power: 0.0,
            neuron_addition_chance: 0.0,
            connection_addition_chance: 0.0,
            max_connection_addition_attempts: 0,
            recursion_chance: 0.0,
            toggle_enabled_chance: 0.0,
            crossover_chance: 0.0,
            child_mutation_chance: 0.0,
            mate_by_averaging_chance: 0.0,
            disabled_inheritance_chance: 0.0,
        }
    }

    /// Innovation numbers of the input neurons.
    pub fn input_neurons(&self) -> Range<Innovation> {
        0..self.input_count.get()
    }

    /// Innovation number of the bias neuron.
    pub fn bias_neuron(&self) -> Innovation {
        self.input_count.get()
    }

    /// Innovation numbers of the output neurons.
    pub fn output_neurons(&self) -> Range<Innovation> {
        let start = self.input_count.get() + 1;
        start..start + self.output_count.get()
    }

    /// Number of innovation numbers taken by the neurons
    /// every organism is created with.
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::GeneticConfig;
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(2).unwrap(),
    ///     output_count: NonZeroUsize::new(1).unwrap(),
    ///     ..GeneticConfig::zero()
    /// };
    ///
    /// assert_eq!(config.input_neurons(), 0..2);
    /// assert_eq!(config.bias_neuron(), 2);
    /// assert_eq!(config.output_neurons(), 3..4);
    /// assert_eq!(config.reserved_neuron_count(), 4);
    /// ```
    pub fn reserved_neuron_count(&self) -> usize {
        self.input_count.get() + 1 + self.output_count.get()
    }

    /// Checks that magnitudes are finite and non-negative,
    /// and that chances lie within [0, 1].
    ///
    /// # Errors
    ///
    /// Returns [`EvolutionError::InvalidConfig`] naming the
    /// first offending field.
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::GeneticConfig;
    ///
    /// assert!(GeneticConfig::zero().validate().is_ok());
    /// assert!(GeneticConfig {
    ///     weight_bound: -1.0,
    ///     ..GeneticConfig::zero()
    /// }
    /// .validate()
    /// .is_err());
    /// ```
    pub fn validate(&self) -> Result<(), EvolutionError> {
        for (name, value) in [
            ("weight_bound", self.weight_bound),
            ("weight_mutation_power", self.weight_mutation_power),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(EvolutionError::InvalidConfig(format!(
                    "{} must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }
        for (name, value) in [
            ("initial_expression_chance", self.initial_expression_chance),
            ("weight_reset_chance", self.weight_reset_chance),
            ("weight_nudge_chance", self.weight_nudge_chance),
            ("neuron_addition_chance", self.neuron_addition_chance),
            ("connection_addition_chance", self.connection_addition_chance),
            ("recursion_chance", self.recursion_chance),
            ("toggle_enabled_chance", self.toggle_enabled_chance),
            ("crossover_chance", self.crossover_chance),
            ("child_mutation_chance", self.child_mutation_chance),
            ("mate_by_averaging_chance", self.mate_by_averaging_chance),
            ("disabled_inheritance_chance", self.disabled_inheritance_chance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(EvolutionError::InvalidConfig(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_unusable_magnitudes() {
        for weight_bound in [-1.0, f32::NAN, f32::INFINITY] {
            let config = GeneticConfig {
                weight_bound,
                weight_nudge_chance: 1.0,
                ..GeneticConfig::zero()
            };
            assert!(matches!(config.validate(), Err(EvolutionError::InvalidConfig(_))));
        }
        let config = GeneticConfig {
            weight_bound: 1.0,
            weight_mutation_power: f32::INFINITY,
            ..GeneticConfig::zero()
        };
        assert!(matches!(config.validate(), Err(EvolutionError::InvalidConfig(_))));
    }

    #[test]
    fn validate_rejects_chances_outside_unit_range() {
        let config = GeneticConfig {
            crossover_chance: 1.5,
            ..GeneticConfig::zero()
        };
        assert!(matches!(config.validate(), Err(EvolutionError::InvalidConfig(_))));
        let config = GeneticConfig {
            toggle_enabled_chance: f32::NAN,
            ..GeneticConfig::zero()
        };
        assert!(matches!(config.validate(), Err(EvolutionError::InvalidConfig(_))));
    }
}
