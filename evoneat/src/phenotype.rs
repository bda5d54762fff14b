//! The bridge between organisms and whatever is evaluated in their place.
use crate::genomics::{GeneticConfig, Organism};

/// Builds the phenotype of an organism, e.g. a neural network.
///
/// Phenotypes are built once per organism and generation, on the
/// evolver's thread, and handed to the fitness objective, which may
/// move them across threads.
///
/// Any `Fn(&Organism, &GeneticConfig) -> P` is a builder.
///
/// # Examples
/// ```
/// use evoneat::genomics::{GeneticConfig, Organism};
/// use evoneat::phenotype::PhenotypeBuilder;
///
/// fn enabled_connections(organism: &Organism, _: &GeneticConfig) -> usize {
///     organism.enabled_connections().count()
/// }
///
/// let config = GeneticConfig::zero();
/// let organism = Organism::bare(&config);
///
/// assert_eq!(enabled_connections.build(&organism, &config), 0);
/// ```
pub trait PhenotypeBuilder {
    type Phenotype: Send;

    fn build(&self, organism: &Organism, config: &GeneticConfig) -> Self::Phenotype;
}

impl<F, P> PhenotypeBuilder for F
where
    F: Fn(&Organism, &GeneticConfig) -> P,
    P: Send,
{
    type Phenotype = P;

    fn build(&self, organism: &Organism, config: &GeneticConfig) -> P {
        self(organism, config)
    }
}
