//! Error types of the engine.
//!
//! Recoverable failures are reported through these enums.
//! Misuse of the fitness ledger (double recording, lookups of
//! unscored organisms, non-finite fitness) is a programmer
//! error and panics instead.
pub use crate::genomics::{GeneError, MutationError};
pub use crate::persistence::PersistenceError;

use thiserror::Error;

use std::time::Duration;

/// An error interrupting an evolutionary run.
#[derive(Debug, Error)]
pub enum EvolutionError {
    /// The objective returned without scoring every organism.
    #[error("generation {generation}: {missing} organism(s) left without fitness")]
    IncompleteEvaluation { generation: usize, missing: usize },
    /// Evaluation took longer than the configured limit.
    #[error("generation {generation}: evaluation took {elapsed:?}, exceeding the limit of {limit:?}")]
    EvaluationTimeout {
        generation: usize,
        elapsed: Duration,
        limit: Duration,
    },
    /// Every specie was culled, leaving no parents for the next generation.
    #[error("generation {generation}: every specie was culled")]
    DegeneratePopulation { generation: usize },
    /// A checkpoint could not be written or read.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    /// A configuration value is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// There are no organisms to evolve.
    #[error("population is empty")]
    EmptyPopulation,
}
