//! Checkpointing of evolutionary runs.
//!
//! A checkpoint holds an evaluated [`Generation`], its fitness scores
//! and the innovation registry: everything needed to resume a run.
//! Checkpoints are stored through a [`Checkpointer`], in the versioned
//! format described in [`schema`], encoded by a [`Codec`].
mod codec;
mod directory;
mod errors;
pub mod schema;

pub use codec::{Codec, JsonCodec, RonCodec};
pub use directory::DirectoryCheckpointer;
pub use errors::PersistenceError;
pub use schema::CheckpointRecord;

use crate::evolution::Generation;
use crate::fitness::FitnessLedger;
use crate::innovations::Innovations;

/// The state of a run after a generation was evaluated.
#[derive(Debug)]
pub struct Checkpoint {
    pub innovations: Innovations,
    pub generation: Generation,
    pub scores: FitnessLedger,
}

/// Which checkpoint to load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenerationSelector {
    /// The checkpoint of a specific generation.
    Number(usize),
    /// The checkpoint of the highest-numbered generation.
    Latest,
}

/// Storage for checkpoints.
pub trait Checkpointer {
    /// Stores the state of a run. Saving a generation
    /// twice replaces the earlier checkpoint.
    fn save(
        &mut self,
        innovations: &Innovations,
        generation: &Generation,
        scores: &FitnessLedger,
    ) -> Result<(), PersistenceError>;

    /// Loads a previously saved checkpoint.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::MissingGeneration`] if the
    /// requested generation was never saved, and
    /// [`PersistenceError::Empty`] if nothing was.
    fn load(&mut self, selector: GenerationSelector) -> Result<Checkpoint, PersistenceError>;

    /// Returns the number of stored checkpoints.
    fn generation_count(&self) -> Result<usize, PersistenceError>;
}
