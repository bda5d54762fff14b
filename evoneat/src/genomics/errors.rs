use crate::Innovation;

use thiserror::Error;

/// An error type indicating the gene being added
/// to an organism is invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeneError {
    /// The connection's innovation number is a duplicate.
    #[error("duplicate connection insertion with id {0}")]
    DuplicateConnection(Innovation),
    /// The neuron's innovation number is a duplicate.
    #[error("duplicate neuron insertion with id {0}")]
    DuplicateNeuron(Innovation),
    /// The connection's endpoints do not exist.
    #[error("connection insertion between nonexistant endpoint(s) {0} -> {1}")]
    MissingEndpoints(Innovation, Innovation),
    /// The connection has the same endpoints as another with a different id.
    #[error("connection insertion with id {0} shadows connection with same endpoints {1:?}")]
    DuplicateEndpoints(Innovation, (Innovation, Innovation)),
    /// The connection targets an input or bias neuron, which is not allowed.
    #[error("connection insertion targeting input or bias neuron {0}")]
    SensorTarget(Innovation),
}

/// An error type indicating a failure
/// to carry out a structural mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    /// Every neuron already connects to every possible target.
    #[error("connection mutation on fully-connected organism")]
    FullyConnected,
    /// No pair of neurons was found to connect within the allowed attempts.
    #[error("no viable source-target pair found for connection mutation")]
    NoPairFound,
    /// The organism has no enabled connection to split.
    #[error("neuron mutation on organism without enabled connections")]
    NothingToSplit,
    /// The organism already contains the neuron that would split this connection.
    #[error("connection {0} was already split in this organism")]
    AlreadySplit(Innovation),
}
