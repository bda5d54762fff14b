//! Configuration surface of an evolutionary run.
//!
//! Runs are configured by two plain structs: an [`EvolutionConfig`]
//! for population-level behaviour, and a [`GeneticConfig`] for
//! organism generation, mutation and crossover. Both derive serde's
//! traits, so they can be read from configuration files.
use crate::errors::EvolutionError;
pub use crate::genomics::GeneticConfig;

use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;
use std::time::Duration;

/// Weights of each term of the compatibility distance
/// between two organisms.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityCoefficients {
    /// Weight of the excess connection count.
    pub excess: f32,
    /// Weight of the disjoint connection count.
    pub disjoint: f32,
    /// Weight of the mean weight difference of matching connections.
    pub weight: f32,
}

impl CompatibilityCoefficients {
    pub const fn zero() -> CompatibilityCoefficients {
        CompatibilityCoefficients {
            excess: 0.0,
            disjoint: 0.0,
            weight: 0.0,
        }
    }
}

/// How the compatibility threshold of speciation behaves over a run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum SpeciationConfig {
    /// The threshold never changes.
    Fixed { threshold: f32 },
    /// The threshold is raised when there are more species than
    /// `target_species`, and lowered when there are fewer, by `step`
    /// after every speciation pass. It never drops below `min_threshold`.
    Dynamic {
        initial_threshold: f32,
        target_species: usize,
        step: f32,
        min_threshold: f32,
    },
}

impl SpeciationConfig {
    /// The threshold used by the first speciation pass.
    pub fn initial_threshold(&self) -> f32 {
        match *self {
            SpeciationConfig::Fixed { threshold } => threshold,
            SpeciationConfig::Dynamic {
                initial_threshold, ..
            } => initial_threshold,
        }
    }
}

/// Which organism represents a specie during the next speciation pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepresentativePolicy {
    /// The organism that founded the specie.
    Founder,
    /// The first organism assigned to the specie in the latest pass.
    FirstMember,
}

/// Configuration data for population evolution.
///
/// # Note
/// All quantities expressing probabilities or ratios
/// should be in the range [0.0, 1.0].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Number of organisms in every generation.
    pub population_size: NonZeroUsize,
    /// Generation after which the run terminates.
    /// If zero, the run is unbounded.
    pub maximum_generations: usize,
    /// Fitness at or above which the run terminates.
    pub maximum_fitness: Option<f32>,
    /// Portion of the non-elite population that survives
    /// selection and takes part in reproduction.
    pub survival_ratio: f32,
    /// Whether the fittest organism of every specie survives selection.
    pub elitism: bool,
    /// Whether species that stop improving are removed.
    /// Evolution fails once every specie has been removed.
    pub kill_stagnant_species: bool,
    /// Number of generations a specie may go without
    /// improving before it is considered stagnant.
    pub stagnation_limit: usize,
    /// Weights of the compatibility distance terms.
    pub compatibility: CompatibilityCoefficients,
    /// Compatibility threshold behaviour.
    pub speciation: SpeciationConfig,
    /// Which organism represents each specie.
    pub representative_policy: RepresentativePolicy,
    /// Seed of the run's random number generator.
    pub seed: u64,
    /// Maximum wall-clock duration of a generation's evaluation.
    pub evaluation_timeout: Option<Duration>,
    /// Generations between checkpoints. If zero, only
    /// the final generation is checkpointed.
    pub checkpoint_interval: usize,
}

impl EvolutionConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, `false`, `None`, or in the case
    /// of `NonZeroUsize`s, 1. Species keep their founder
    /// as representative, with a fixed threshold of 0.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to abbreviate configuration
    /// instantiation, or to fill in unused values.
    ///
    /// # Examples
    /// ```
    /// use evoneat::config::EvolutionConfig;
    /// use std::num::NonZeroUsize;
    ///
    /// let config = EvolutionConfig {
    ///     population_size: NonZeroUsize::new(150).unwrap(),
    ///     elitism: true,
    ///     ..EvolutionConfig::zero()
    /// };
    /// ```
    pub const fn zero() -> EvolutionConfig {
        EvolutionConfig {
            population_size: NonZeroUsize::MIN,
            maximum_generations: 0,
            maximum_fitness: None,
            survival_ratio: 0.0,
            elitism: false,
            kill_stagnant_species: false,
            stagnation_limit: 0,
            compatibility: CompatibilityCoefficients::zero(),
            speciation: SpeciationConfig::Fixed { threshold: 0.0 },
            representative_policy: RepresentativePolicy::Founder,
            seed: 0,
            evaluation_timeout: None,
            checkpoint_interval: 0,
        }
    }

    /// Returns the configuration with `survival_ratio`
    /// clamped into [0.0, 1.0]. A NaN ratio becomes 0.
    ///
    /// # Examples
    /// ```
    /// use evoneat::config::EvolutionConfig;
    ///
    /// let config = EvolutionConfig {
    ///     survival_ratio: 1.5,
    ///     ..EvolutionConfig::zero()
    /// };
    ///
    /// assert_eq!(config.sanitized().survival_ratio, 1.0);
    /// ```
    pub fn sanitized(mut self) -> EvolutionConfig {
        self.survival_ratio = if self.survival_ratio.is_nan() {
            0.0
        } else {
            self.survival_ratio.clamp(0.0, 1.0)
        };
        self
    }

    /// Checks that every quantity is usable.
    ///
    /// # Errors
    ///
    /// Returns [`EvolutionError::InvalidConfig`] naming the
    /// first offending field.
    pub fn validate(&self) -> Result<(), EvolutionError> {
        fn non_negative(name: &str, value: f32) -> Result<(), EvolutionError> {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(EvolutionError::InvalidConfig(format!(
                    "{} must be finite and non-negative, got {}",
                    name, value
                )))
            }
        }

        non_negative("compatibility.excess", self.compatibility.excess)?;
        non_negative("compatibility.disjoint", self.compatibility.disjoint)?;
        non_negative("compatibility.weight", self.compatibility.weight)?;
        match self.speciation {
            SpeciationConfig::Fixed { threshold } => non_negative("speciation.threshold", threshold)?,
            SpeciationConfig::Dynamic {
                initial_threshold,
                target_species,
                step,
                min_threshold,
            } => {
                non_negative("speciation.initial_threshold", initial_threshold)?;
                non_negative("speciation.step", step)?;
                non_negative("speciation.min_threshold", min_threshold)?;
                if target_species == 0 {
                    return Err(EvolutionError::InvalidConfig(
                        "speciation.target_species must be positive".into(),
                    ));
                }
            }
        }
        if let Some(fitness) = self.maximum_fitness {
            if !fitness.is_finite() {
                return Err(EvolutionError::InvalidConfig(format!(
                    "maximum_fitness must be finite, got {}",
                    fitness
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.survival_ratio) {
            return Err(EvolutionError::InvalidConfig(format!(
                "survival_ratio must be within [0, 1], got {}",
                self.survival_ratio
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_valid() {
        assert!(EvolutionConfig::zero().validate().is_ok());
    }

    #[test]
    fn sanitized_clamps_survival_ratio() {
        let mut config = EvolutionConfig::zero();
        config.survival_ratio = -0.5;
        assert_eq!(config.clone().sanitized().survival_ratio, 0.0);
        config.survival_ratio = f32::NAN;
        assert_eq!(config.sanitized().survival_ratio, 0.0);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let config = EvolutionConfig {
            compatibility: CompatibilityCoefficients {
                excess: -1.0,
                ..CompatibilityCoefficients::zero()
            },
            ..EvolutionConfig::zero()
        };
        assert!(matches!(
            config.validate(),
            Err(EvolutionError::InvalidConfig(_))
        ));

        let config = EvolutionConfig {
            speciation: SpeciationConfig::Dynamic {
                initial_threshold: 3.0,
                target_species: 0,
                step: 0.3,
                min_threshold: 0.3,
            },
            ..EvolutionConfig::zero()
        };
        assert!(config.validate().is_err());

        let config = EvolutionConfig {
            survival_ratio: 2.0,
            ..EvolutionConfig::zero()
        };
        assert!(config.validate().is_err());
        assert!(config.sanitized().validate().is_ok());
    }

    #[test]
    fn ron_round_trip() {
        let config = EvolutionConfig {
            population_size: NonZeroUsize::new(150).unwrap(),
            maximum_fitness: Some(4.0),
            speciation: SpeciationConfig::Dynamic {
                initial_threshold: 3.0,
                target_species: 10,
                step: 0.3,
                min_threshold: 0.3,
            },
            evaluation_timeout: Some(Duration::from_secs(30)),
            ..EvolutionConfig::zero()
        };
        let text = ron::to_string(&config).unwrap();
        assert_eq!(ron::from_str::<EvolutionConfig>(&text).unwrap(), config);
    }
}
