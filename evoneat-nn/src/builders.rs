//! Phenotype builders turning organisms into networks,
//! for use with an [`Evolver`].
//!
//! [`Evolver`]: evoneat::evolution::Evolver
use crate::networks::{FunctionApproximatorNetwork, RealTimeNetwork};
use evoneat::genomics::{GeneticConfig, Organism};
use evoneat::phenotype::PhenotypeBuilder;

/// Builds a [`RealTimeNetwork`] from every organism.
///
/// # Examples
/// ```
/// use evoneat::genomics::{GeneticConfig, Organism};
/// use evoneat::phenotype::PhenotypeBuilder;
/// use evoneat_nn::builders::NetworkBuilder;
///
/// let config = GeneticConfig::zero();
/// let network = NetworkBuilder.build(&Organism::bare(&config), &config);
///
/// assert_eq!(network.input_count(), 1);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct NetworkBuilder;

impl PhenotypeBuilder for NetworkBuilder {
    type Phenotype = RealTimeNetwork;

    fn build(&self, organism: &Organism, _: &GeneticConfig) -> RealTimeNetwork {
        RealTimeNetwork::new(organism)
    }
}

/// Builds a [`FunctionApproximatorNetwork`] from every organism.
///
/// See [`FunctionApproximatorNetwork`] for the meaning
/// of `MAX_NODE_VISITS`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FunctionApproximatorBuilder<const MAX_NODE_VISITS: u8>;

impl<const MAX_NODE_VISITS: u8> PhenotypeBuilder for FunctionApproximatorBuilder<MAX_NODE_VISITS> {
    type Phenotype = FunctionApproximatorNetwork<MAX_NODE_VISITS>;

    fn build(
        &self,
        organism: &Organism,
        _: &GeneticConfig,
    ) -> FunctionApproximatorNetwork<MAX_NODE_VISITS> {
        FunctionApproximatorNetwork::from(organism)
    }
}
