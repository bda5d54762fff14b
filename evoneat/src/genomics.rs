//! Organisms are the focus of evolution in NEAT.
//! They are a collection of neuron and connection genes that can
//! be instantiated as a phenotype (usually a neural network).
//! Organisms can be progressively mutated, thus adding complexity
//! and functionality.

mod config;
mod errors;
mod genes;

pub use config::GeneticConfig;
pub use errors::{GeneError, MutationError};
pub use genes::{ActivationType, ConnectionGene, Gene, NeuronGene, NeuronRole};

use crate::innovations::InnovationSource;
use crate::speciation::SpecieId;
use crate::Innovation;

use ahash::RandomState;
use log::debug;
use rand::prelude::{IteratorRandom, Rng, SliceRandom};
use serde::{Deserialize, Serialize};

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ORGANISM_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique identity of an [`Organism`].
///
/// Identities are never reused, not even by copies
/// of the same organism.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrganismId(u64);

impl OrganismId {
    fn next() -> OrganismId {
        OrganismId(NEXT_ORGANISM_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for OrganismId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single genotype: a mutable collection of neuron and connection genes.
///
/// Genes are kept ordered by innovation number, so iteration
/// is deterministic. Organisms do not implement `Clone`; use
/// [`Organism::copy`] to obtain an independent duplicate with
/// a new identity.
#[derive(Debug)]
pub struct Organism {
    id: OrganismId,
    neurons: BTreeMap<Innovation, NeuronGene>,
    connections: BTreeMap<Innovation, ConnectionGene>,
    endpoints: HashSet<(Innovation, Innovation), RandomState>,
    specie: Option<SpecieId>,
}

impl Organism {
    /// Create a new organism with the specified configuration.
    ///
    /// The organism receives an input neuron per configured input,
    /// the bias neuron and an output neuron per configured output.
    /// Each connection from an input or the bias to an output is
    /// expressed with probability [`initial_expression_chance`],
    /// and is numbered by `innovations`.
    ///
    /// [`initial_expression_chance`]: GeneticConfig::initial_expression_chance
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::{GeneticConfig, NeuronRole, Organism};
    /// use evoneat::innovations::Innovations;
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     initial_expression_chance: 1.0,
    ///     weight_bound: 5.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut innovations = Innovations::new(&config);
    /// let mut rng = ChaCha8Rng::seed_from_u64(42);
    ///
    /// let organism = Organism::new(&config, &mut innovations, &mut rng);
    ///
    /// // 3 inputs + 1 bias + 2 outputs.
    /// assert_eq!(organism.neurons().count(), 3 + 1 + 2);
    /// assert_eq!(organism.neurons().filter(|n| n.role() == NeuronRole::Output).count(), 2);
    ///
    /// // With an initial_expression_chance of 1, every sensor connects to every output.
    /// assert_eq!(organism.connections().count(), (3 + 1) * 2);
    /// assert!(organism.connections().all(|c| c.weight().abs() <= config.weight_bound));
    /// ```
    pub fn new<R: Rng + ?Sized>(
        config: &GeneticConfig,
        innovations: &mut dyn InnovationSource,
        rng: &mut R,
    ) -> Organism {
        let mut organism = Organism::bare(config);

        if config.initial_expression_chance > 0.0 {
            let sensors = config.input_neurons().chain(Some(config.bias_neuron()));
            for source in sensors {
                for target in config.output_neurons() {
                    if rng.gen::<f32>() < config.initial_expression_chance {
                        let id = innovations.connection_innovation(source, target);
                        let weight = ConnectionGene::random_weight(config, rng);
                        organism.insert_connection(ConnectionGene::new(id, source, target, weight));
                    }
                }
            }
        }

        organism
    }

    /// Create an organism with input, bias and output neurons,
    /// but no connections.
    pub fn bare(config: &GeneticConfig) -> Organism {
        let mut neurons = BTreeMap::new();

        for i in config.input_neurons() {
            neurons.insert(i, NeuronGene::new(i, NeuronRole::Input, ActivationType::Identity));
        }

        let bias = config.bias_neuron();
        neurons.insert(bias, NeuronGene::new(bias, NeuronRole::Bias, ActivationType::Identity));

        for (o, id) in config.output_neurons().enumerate() {
            let activation = config
                .output_activation_types
                .get(o)
                .copied()
                .unwrap_or(ActivationType::Sigmoid);
            neurons.insert(id, NeuronGene::new(id, NeuronRole::Output, activation));
        }

        Organism {
            id: OrganismId::next(),
            neurons,
            connections: BTreeMap::new(),
            endpoints: HashSet::default(),
            specie: None,
        }
    }

    /// Rebuilds an organism from its genes, checking every
    /// connection's viability.
    ///
    /// # Errors
    ///
    /// Returns an error on duplicate neurons, or on the first
    /// connection that could not be added through [`add_connection`].
    ///
    /// [`add_connection`]: Organism::add_connection
    pub fn from_parts(
        neurons: impl IntoIterator<Item = NeuronGene>,
        connections: impl IntoIterator<Item = ConnectionGene>,
    ) -> Result<Organism, GeneError> {
        let mut organism = Organism {
            id: OrganismId::next(),
            neurons: BTreeMap::new(),
            connections: BTreeMap::new(),
            endpoints: HashSet::default(),
            specie: None,
        };

        for neuron in neurons {
            if organism.neurons.insert(neuron.innovation(), neuron).is_some() {
                return Err(GeneError::DuplicateNeuron(neuron.innovation()));
            }
        }

        for connection in connections {
            organism.check_connection_viability(
                connection.innovation(),
                connection.source(),
                connection.target(),
            )?;
            organism.insert_connection(connection);
        }

        Ok(organism)
    }

    /// Returns a deep, independent copy of the organism
    /// with a new identity.
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::{GeneticConfig, Organism};
    ///
    /// let organism = Organism::bare(&GeneticConfig::zero());
    /// let copy = organism.copy();
    ///
    /// assert_ne!(organism.id(), copy.id());
    /// assert!(organism.genes_eq(&copy));
    /// ```
    pub fn copy(&self) -> Organism {
        Organism {
            id: OrganismId::next(),
            neurons: self.neurons.clone(),
            connections: self.connections.clone(),
            endpoints: self.endpoints.clone(),
            specie: self.specie,
        }
    }

    pub fn id(&self) -> OrganismId {
        self.id
    }

    /// Returns the specie the organism was last assigned to, if any.
    pub fn specie(&self) -> Option<SpecieId> {
        self.specie
    }

    pub(crate) fn assign_specie(&mut self, specie: Option<SpecieId>) {
        self.specie = specie;
    }

    /// Add a new hidden neuron to the organism.
    /// Returns a reference to the newly created neuron.
    ///
    /// # Errors
    ///
    /// Returns an error if a neuron of the
    /// same innovation number already exists.
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::{ActivationType, GeneticConfig, GeneError, NeuronRole, Organism};
    ///
    /// let mut organism = Organism::bare(&GeneticConfig::zero());
    ///
    /// let neuron = *organism.add_neuron(42, ActivationType::Tanh).unwrap();
    /// assert_eq!(neuron.role(), NeuronRole::Hidden);
    ///
    /// assert_eq!(
    ///     organism.add_neuron(42, ActivationType::Sigmoid),
    ///     Err(GeneError::DuplicateNeuron(42))
    /// );
    /// ```
    pub fn add_neuron(
        &mut self,
        id: Innovation,
        activation: ActivationType,
    ) -> Result<&NeuronGene, GeneError> {
        if self.neurons.contains_key(&id) {
            return Err(GeneError::DuplicateNeuron(id));
        }
        Ok(self
            .neurons
            .entry(id)
            .or_insert_with(|| NeuronGene::new(id, NeuronRole::Hidden, activation)))
    }

    /// Add a new enabled connection to the organism.
    /// Returns a reference to the new connection.
    ///
    /// # Errors
    ///
    /// Returns an error if a connection with the same
    /// `id` already exists, if either endpoint does not
    /// correspond to a neuron of the organism, if another
    /// connection already joins the same endpoints, or if
    /// `target` is an input or the bias neuron.
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::{GeneticConfig, GeneError, Organism};
    ///
    /// // Neurons: input 0, bias 1, output 2.
    /// let mut organism = Organism::bare(&GeneticConfig::zero());
    ///
    /// organism.add_connection(10, 0, 2, 0.5).unwrap();
    /// // Recurrent connection.
    /// organism.add_connection(11, 2, 2, -1.0).unwrap();
    ///
    /// assert_eq!(organism.add_connection(10, 1, 2, 0.5), Err(GeneError::DuplicateConnection(10)));
    /// assert_eq!(organism.add_connection(12, 0, 7, 0.5), Err(GeneError::MissingEndpoints(0, 7)));
    /// assert_eq!(organism.add_connection(13, 2, 1, 0.5), Err(GeneError::SensorTarget(1)));
    /// ```
    pub fn add_connection(
        &mut self,
        id: Innovation,
        source: Innovation,
        target: Innovation,
        weight: f32,
    ) -> Result<&mut ConnectionGene, GeneError> {
        self.check_connection_viability(id, source, target)?;
        Ok(self.insert_connection(ConnectionGene::new(id, source, target, weight)))
    }

    fn check_connection_viability(
        &self,
        id: Innovation,
        source: Innovation,
        target: Innovation,
    ) -> Result<(), GeneError> {
        if self.connections.contains_key(&id) {
            Err(GeneError::DuplicateConnection(id))
        } else if !(self.neurons.contains_key(&source) && self.neurons.contains_key(&target)) {
            Err(GeneError::MissingEndpoints(source, target))
        } else if self.endpoints.contains(&(source, target)) {
            Err(GeneError::DuplicateEndpoints(id, (source, target)))
        } else if self.neurons[&target].role().is_sensor() {
            Err(GeneError::SensorTarget(target))
        } else {
            Ok(())
        }
    }

    /// Assumes the connection is viable.
    fn insert_connection(&mut self, connection: ConnectionGene) -> &mut ConnectionGene {
        self.endpoints.insert(connection.endpoints());
        self.connections
            .entry(connection.innovation())
            .or_insert(connection)
    }

    /// Returns the neuron with the given innovation number.
    pub fn neuron(&self, id: Innovation) -> Option<&NeuronGene> {
        self.neurons.get(&id)
    }

    /// Returns the connection with the given innovation number.
    pub fn connection(&self, id: Innovation) -> Option<&ConnectionGene> {
        self.connections.get(&id)
    }

    /// Returns an iterator over the organism's neurons,
    /// in ascending innovation order.
    pub fn neurons(&self) -> impl Iterator<Item = &NeuronGene> {
        self.neurons.values()
    }

    /// Returns an iterator over the organism's connections,
    /// in ascending innovation order.
    pub fn connections(&self) -> impl Iterator<Item = &ConnectionGene> {
        self.connections.values()
    }

    /// Returns an iterator over the organism's enabled connections,
    /// in ascending innovation order.
    pub fn enabled_connections(&self) -> impl Iterator<Item = &ConnectionGene> {
        self.connections.values().filter(|c| c.enabled())
    }

    /// Returns every gene of the organism, neurons first.
    pub fn genes(&self) -> impl Iterator<Item = Gene> + '_ {
        self.neurons
            .values()
            .copied()
            .map(Gene::from)
            .chain(self.connections.values().copied().map(Gene::from))
    }

    pub fn neuron_count(&self) -> usize {
        self.neurons.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Returns the highest connection innovation number in the organism.
    pub fn max_connection_innovation(&self) -> Option<Innovation> {
        self.connections.keys().next_back().copied()
    }

    /// Returns `true` if both organisms carry exactly the same genes,
    /// regardless of identity.
    pub fn genes_eq(&self, other: &Organism) -> bool {
        self.neurons == other.neurons && self.connections == other.connections
    }

    /// Induces a _weight mutation_ in the organism.
    ///
    /// Each connection's weight is reset to a random value in
    /// `[-weight_bound, weight_bound]` with probability [`weight_reset_chance`].
    /// Otherwise, with probability [`weight_nudge_chance`], a random
    /// value from `[-weight_mutation_power, weight_mutation_power]` is added
    /// to it, and the result is clamped to `[-weight_bound, weight_bound]`.
    ///
    /// [`weight_reset_chance`]: GeneticConfig::weight_reset_chance
    /// [`weight_nudge_chance`]: GeneticConfig::weight_nudge_chance
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::{GeneticConfig, Organism};
    /// use evoneat::innovations::Innovations;
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GeneticConfig {
    ///     initial_expression_chance: 1.0,
    ///     weight_bound: 5.0,
    ///     weight_mutation_power: 2.5,
    ///     weight_nudge_chance: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut rng = ChaCha8Rng::seed_from_u64(1);
    /// let mut organism = Organism::new(&config, &mut Innovations::new(&config), &mut rng);
    /// let before: Vec<f32> = organism.connections().map(|c| c.weight()).collect();
    ///
    /// organism.mutate_weights(&config, &mut rng);
    ///
    /// for (old, new) in before.iter().zip(organism.connections().map(|c| c.weight())) {
    ///     assert!(new.abs() <= config.weight_bound);
    ///     assert!((new - old).abs() <= config.weight_mutation_power);
    /// }
    /// ```
    pub fn mutate_weights<R: Rng + ?Sized>(&mut self, config: &GeneticConfig, rng: &mut R) {
        for connection in self.connections.values_mut() {
            if rng.gen::<f32>() < config.weight_reset_chance {
                connection.randomize_weight(config, rng);
            } else if rng.gen::<f32>() < config.weight_nudge_chance {
                connection.nudge_weight(config, rng);
            }
        }
    }

    /// Induces a _connection mutation_ in the organism.
    /// If successful, returns the newly added connection.
    ///
    /// Up to [`max_connection_addition_attempts`] source neurons
    /// with free targets are tried, in random order. A non-sensor
    /// source connects to itself with probability [`recursion_chance`],
    /// and to a random unconnected non-sensor neuron otherwise.
    ///
    /// [`max_connection_addition_attempts`]: GeneticConfig::max_connection_addition_attempts
    /// [`recursion_chance`]: GeneticConfig::recursion_chance
    ///
    /// # Errors
    ///
    /// Returns an error if no viable pair of neurons
    /// exists or [too many] attempts have failed.
    ///
    /// [too many]: GeneticConfig::max_connection_addition_attempts
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::{GeneticConfig, Organism};
    /// use evoneat::innovations::Innovations;
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GeneticConfig {
    ///     weight_bound: 5.0,
    ///     max_connection_addition_attempts: 1,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut innovations = Innovations::new(&config);
    /// let mut rng = ChaCha8Rng::seed_from_u64(1);
    /// let mut organism = Organism::bare(&config);
    ///
    /// organism.mutate_add_connection(&mut innovations, &config, &mut rng).unwrap();
    ///
    /// assert_eq!(organism.connections().count(), 1);
    /// ```
    pub fn mutate_add_connection<R: Rng + ?Sized>(
        &mut self,
        innovations: &mut dyn InnovationSource,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Result<&ConnectionGene, MutationError> {
        let targets: Vec<Innovation> = self
            .neurons
            .values()
            .filter(|n| !n.role().is_sensor())
            .map(|n| n.innovation())
            .collect();

        let mut sources: Vec<Innovation> = self
            .neurons
            .keys()
            .copied()
            .filter(|id| self.outgoing_count(*id) < targets.len())
            .collect();

        if sources.is_empty() {
            return Err(MutationError::FullyConnected);
        }

        sources.shuffle(rng);

        let pair = sources
            .iter()
            .take(config.max_connection_addition_attempts)
            .find_map(|source| {
                self.choose_target_for(*source, &targets, config, rng)
                    .map(|target| (*source, target))
            });

        match pair {
            Some((source, target)) => {
                let id = innovations.connection_innovation(source, target);
                let weight = ConnectionGene::random_weight(config, rng);
                self.add_connection(id, source, target, weight)
                    .map(|c| &*c)
                    .map_err(|e| {
                        debug!("connection mutation rejected: {}", e);
                        MutationError::NoPairFound
                    })
            }
            None => Err(MutationError::NoPairFound),
        }
    }

    fn outgoing_count(&self, source: Innovation) -> usize {
        self.connections
            .values()
            .filter(|c| c.source() == source)
            .count()
    }

    fn choose_target_for<R: Rng + ?Sized>(
        &self,
        source: Innovation,
        targets: &[Innovation],
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Option<Innovation> {
        let source_is_sensor = self.neurons[&source].role().is_sensor();
        if !source_is_sensor
            && !self.endpoints.contains(&(source, source))
            && rng.gen::<f32>() < config.recursion_chance
        {
            Some(source)
        } else {
            targets
                .iter()
                .copied()
                .filter(|target| *target != source && !self.endpoints.contains(&(source, *target)))
                .choose(rng)
        }
    }

    /// Induces a _neuron mutation_ in the organism.
    ///
    /// A random enabled connection is split: it is disabled, and
    /// replaced by a new hidden neuron with an incoming connection
    /// of weight 1.0 and an outgoing connection carrying the old weight.
    /// If succesful, returns the triplet (_incoming connection_,
    /// _new neuron_, _outgoing connection_).
    ///
    /// # Errors
    ///
    /// This function returns an error if there are no enabled
    /// connections in the organism, or if the chosen connection's
    /// split neuron is already part of the organism.
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::{ActivationType, GeneticConfig, NeuronRole, Organism};
    /// use evoneat::innovations::Innovations;
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GeneticConfig {
    ///     weight_bound: 5.0,
    ///     activation_types: vec![ActivationType::Tanh],
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut innovations = Innovations::new(&config);
    /// let mut rng = ChaCha8Rng::seed_from_u64(1);
    ///
    /// let mut organism = Organism::bare(&config);
    /// organism.add_connection(3, 0, 2, 0.75).unwrap();
    ///
    /// let (incoming, neuron, outgoing) = organism
    ///     .mutate_add_neuron(&mut innovations, &config, &mut rng)
    ///     .unwrap();
    ///
    /// assert_eq!(incoming.endpoints(), (0, neuron.innovation()));
    /// assert_eq!(incoming.weight(), 1.0);
    /// assert_eq!(outgoing.endpoints(), (neuron.innovation(), 2));
    /// assert_eq!(outgoing.weight(), 0.75);
    /// assert_eq!(neuron.role(), NeuronRole::Hidden);
    /// assert_eq!(neuron.activation(), ActivationType::Tanh);
    ///
    /// // The split connection is disabled.
    /// assert!(!organism.connection(3).unwrap().enabled());
    /// ```
    pub fn mutate_add_neuron<R: Rng + ?Sized>(
        &mut self,
        innovations: &mut dyn InnovationSource,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Result<(ConnectionGene, NeuronGene, ConnectionGene), MutationError> {
        let split = match self.enabled_connections().choose(rng) {
            Some(connection) => *connection,
            None => return Err(MutationError::NothingToSplit),
        };

        let neuron_id = innovations.neuron_innovation(split.innovation());
        if self.neurons.contains_key(&neuron_id) {
            return Err(MutationError::AlreadySplit(split.innovation()));
        }
        let (source, target) = split.endpoints();
        let incoming_id = innovations.connection_innovation(source, neuron_id);
        let outgoing_id = innovations.connection_innovation(neuron_id, target);

        if let Some(connection) = self.connections.get_mut(&split.innovation()) {
            connection.set_enabled(false);
        }

        let activation = config
            .activation_types
            .choose(rng)
            .copied()
            .unwrap_or(ActivationType::Sigmoid);
        let neuron = NeuronGene::new(neuron_id, NeuronRole::Hidden, activation);
        self.neurons.insert(neuron_id, neuron);

        let incoming = *self.insert_connection(ConnectionGene::new(incoming_id, source, neuron_id, 1.0));
        let outgoing = *self.insert_connection(ConnectionGene::new(
            outgoing_id,
            neuron_id,
            target,
            split.weight(),
        ));

        Ok((incoming, neuron, outgoing))
    }

    /// Flips the enabled flag of a randomly-chosen connection.
    ///
    /// Returns the innovation number of the toggled connection,
    /// or `None` if the organism has no connections.
    pub fn mutate_toggle_enabled<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Innovation> {
        let connection = self.connections.values_mut().choose(rng)?;
        connection.set_enabled(!connection.enabled());
        Some(connection.innovation())
    }

    /// Performs every mutation on the organism, each
    /// with its configured probability.
    pub fn mutate<R: Rng + ?Sized>(
        &mut self,
        innovations: &mut dyn InnovationSource,
        config: &GeneticConfig,
        rng: &mut R,
    ) {
        self.mutate_weights(config, rng);
        if rng.gen::<f32>() < config.neuron_addition_chance {
            if let Err(e) = self.mutate_add_neuron(innovations, config, rng) {
                debug!("organism {}: {}", self.id, e);
            }
        }
        if rng.gen::<f32>() < config.connection_addition_chance {
            if let Err(e) = self.mutate_add_connection(innovations, config, rng) {
                debug!("organism {}: {}", self.id, e);
            }
        }
        if rng.gen::<f32>() < config.toggle_enabled_chance {
            self.mutate_toggle_enabled(rng);
        }
    }

    /// Combines two parents and returns their _child_ organism.
    ///
    /// Genes are aligned by innovation number. Matching connections
    /// inherit the weight of a random parent, or the average of both
    /// with probability [`mate_by_averaging_chance`]. A matching connection
    /// disabled in either parent is disabled in the child with probability
    /// [`disabled_inheritance_chance`]. Disjoint and excess connections,
    /// and all neurons, are inherited from `fitter` only.
    ///
    /// [`mate_by_averaging_chance`]: GeneticConfig::mate_by_averaging_chance
    /// [`disabled_inheritance_chance`]: GeneticConfig::disabled_inheritance_chance
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::{GeneticConfig, Organism};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GeneticConfig {
    ///     mate_by_averaging_chance: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut rng = ChaCha8Rng::seed_from_u64(0);
    ///
    /// let mut fitter = Organism::bare(&config);
    /// fitter.add_connection(3, 0, 2, 1.0).unwrap();
    /// fitter.add_connection(5, 2, 2, 0.5).unwrap();
    ///
    /// let mut other = Organism::bare(&config);
    /// other.add_connection(3, 0, 2, -1.0).unwrap();
    /// other.add_connection(4, 1, 2, 2.0).unwrap();
    ///
    /// let child = Organism::crossover(&fitter, &other, &config, &mut rng);
    ///
    /// // Matching connection, averaged.
    /// assert_eq!(child.connection(3).unwrap().weight(), 0.0);
    /// // Excess connection of the fitter parent.
    /// assert!(child.connection(5).is_some());
    /// // Disjoint connection of the other parent is left out.
    /// assert!(child.connection(4).is_none());
    /// ```
    pub fn crossover<R: Rng + ?Sized>(
        fitter: &Organism,
        other: &Organism,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Organism {
        let mut child = Organism {
            id: OrganismId::next(),
            neurons: fitter.neurons.clone(),
            connections: BTreeMap::new(),
            endpoints: HashSet::default(),
            specie: None,
        };

        for (id, own) in &fitter.connections {
            let mut inherited = *own;
            if let Some(others) = other.connections.get(id) {
                if rng.gen::<f32>() < config.mate_by_averaging_chance {
                    inherited.set_weight((own.weight() + others.weight()) / 2.0);
                } else if rng.gen::<bool>() {
                    inherited.set_weight(others.weight());
                }
                if !own.enabled() || !others.enabled() {
                    inherited.set_enabled(rng.gen::<f32>() >= config.disabled_inheritance_chance);
                }
            }
            child.insert_connection(inherited);
        }

        child
    }
}

impl fmt::Display for Organism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let neurons: Vec<String> = self.neurons.values().map(|n| n.to_string()).collect();
        let connections: Vec<String> = self.connections.values().map(|c| c.to_string()).collect();
        f.debug_struct("Organism")
            .field("id", &self.id)
            .field("neurons", &neurons)
            .field("connections", &connections)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::innovations::Innovations;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::num::NonZeroUsize;

    fn config(input_count: usize, output_count: usize) -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(input_count).unwrap(),
            output_count: NonZeroUsize::new(output_count).unwrap(),
            weight_bound: 5.0,
            ..GeneticConfig::zero()
        }
    }

    #[test]
    fn new_fully_connected() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        for input_count in 1..6 {
            for output_count in 1..6 {
                let mut config = config(input_count, output_count);
                config.initial_expression_chance = 1.0;
                config.output_activation_types = vec![
                    ActivationType::Sigmoid,
                    ActivationType::Gaussian,
                    ActivationType::Identity,
                ];
                let mut innovations = Innovations::new(&config);

                let organism = Organism::new(&config, &mut innovations, &mut rng);

                assert_eq!(organism.connection_count(), (input_count + 1) * output_count);
                assert_eq!(
                    organism
                        .neurons()
                        .filter(|n| n.role() == NeuronRole::Input
                            && n.activation() == ActivationType::Identity)
                        .count(),
                    input_count
                );
                assert_eq!(organism.neuron(input_count).unwrap().role(), NeuronRole::Bias);
                for (o, id) in config.output_neurons().enumerate() {
                    let neuron = organism.neuron(id).unwrap();
                    assert_eq!(neuron.role(), NeuronRole::Output);
                    assert_eq!(
                        neuron.activation(),
                        config
                            .output_activation_types
                            .get(o)
                            .copied()
                            .unwrap_or(ActivationType::Sigmoid)
                    );
                }
                // Initial connections are numbered after the reserved neurons.
                assert!(organism
                    .connections()
                    .all(|c| c.innovation() >= config.reserved_neuron_count()));
            }
        }
    }

    #[test]
    fn same_structure_same_innovations() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut config = config(2, 2);
        config.initial_expression_chance = 1.0;
        let mut innovations = Innovations::new(&config);

        let first = Organism::new(&config, &mut innovations, &mut rng);
        let second = Organism::new(&config, &mut innovations, &mut rng);

        let first_ids: Vec<_> = first.connections().map(|c| c.innovation()).collect();
        let second_ids: Vec<_> = second.connections().map(|c| c.innovation()).collect();
        assert_eq!(first_ids, second_ids);
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn no_expression_means_no_connections() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let config = config(3, 2);
        let organism = Organism::new(&config, &mut Innovations::new(&config), &mut rng);
        assert_eq!(organism.connection_count(), 0);
        assert_eq!(organism.neuron_count(), 3 + 1 + 2);
    }

    #[test]
    fn add_connection_rejects_duplicate_endpoints() {
        let mut organism = Organism::bare(&config(1, 1));
        organism.add_connection(3, 0, 2, 1.0).unwrap();
        assert_eq!(
            organism.add_connection(4, 0, 2, 1.0),
            Err(GeneError::DuplicateEndpoints(4, (0, 2)))
        );
        assert_eq!(organism.connection_count(), 1);
    }

    #[test]
    fn add_connection_until_fully_connected() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut config = config(2, 2);
        config.max_connection_addition_attempts = 10;
        config.recursion_chance = 1.0;
        let mut innovations = Innovations::new(&config);
        let mut organism = Organism::bare(&config);

        // 5 sources (2 inputs, bias, 2 outputs), 2 possible targets each.
        for _ in 0..5 * 2 {
            organism
                .mutate_add_connection(&mut innovations, &config, &mut rng)
                .unwrap();
        }
        assert_eq!(
            organism
                .mutate_add_connection(&mut innovations, &config, &mut rng)
                .map(|c| c.innovation()),
            Err(MutationError::FullyConnected)
        );
        assert!(organism
            .connections()
            .all(|c| !organism.neuron(c.target()).unwrap().role().is_sensor()));
    }

    #[test]
    fn add_neuron_without_connections_fails() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let config = config(1, 1);
        let mut organism = Organism::bare(&config);
        assert_eq!(
            organism
                .mutate_add_neuron(&mut Innovations::new(&config), &config, &mut rng)
                .map(|(_, n, _)| n.innovation()),
            Err(MutationError::NothingToSplit)
        );
    }

    #[test]
    fn add_neuron_twice_on_same_connection() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let config = config(1, 1);
        let mut innovations = Innovations::new(&config);
        let mut organism = Organism::bare(&config);
        let id = innovations.connection_innovation(0, 2);
        organism.add_connection(id, 0, 2, 1.0).unwrap();

        organism
            .mutate_add_neuron(&mut innovations, &config, &mut rng)
            .unwrap();
        // Re-enable the split connection, so it is the only candidate
        // other than the two new connections.
        organism.connections.get_mut(&id).unwrap().set_enabled(true);
        organism.connections.retain(|k, _| *k == id);

        assert_eq!(
            organism
                .mutate_add_neuron(&mut innovations, &config, &mut rng)
                .map(|(_, n, _)| n.innovation()),
            Err(MutationError::AlreadySplit(id))
        );
    }

    #[test]
    fn independent_splits_share_innovations() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut config = config(1, 1);
        config.initial_expression_chance = 1.0;
        let mut innovations = Innovations::new(&config);
        let mut first = Organism::new(&config, &mut innovations, &mut rng);
        let mut second = Organism::new(&config, &mut innovations, &mut rng);

        // Both organisms have input->output and bias->output.
        // Disable all but the input connection so both split the same one.
        for organism in [&mut first, &mut second] {
            for connection in organism.connections.values_mut() {
                connection.set_enabled(connection.source() == 0);
            }
        }

        let a = first.mutate_add_neuron(&mut innovations, &config, &mut rng).unwrap();
        let b = second.mutate_add_neuron(&mut innovations, &config, &mut rng).unwrap();
        assert_eq!(a.0.innovation(), b.0.innovation());
        assert_eq!(a.1.innovation(), b.1.innovation());
        assert_eq!(a.2.innovation(), b.2.innovation());
    }

    #[test]
    fn toggle_flips_enabled() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut organism = Organism::bare(&config(1, 1));
        assert_eq!(organism.mutate_toggle_enabled(&mut rng), None);
        organism.add_connection(3, 0, 2, 1.0).unwrap();
        assert_eq!(organism.mutate_toggle_enabled(&mut rng), Some(3));
        assert!(!organism.connection(3).unwrap().enabled());
        organism.mutate_toggle_enabled(&mut rng);
        assert!(organism.connection(3).unwrap().enabled());
    }

    #[test]
    fn crossover_with_self_preserves_genes() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut config = config(3, 2);
        config.initial_expression_chance = 1.0;
        config.mate_by_averaging_chance = 0.5;
        let parent = Organism::new(&config, &mut Innovations::new(&config), &mut rng);

        let child = Organism::crossover(&parent, &parent, &config, &mut rng);
        assert!(child.genes_eq(&parent));
        assert_eq!(child.specie(), None);
    }

    #[test]
    fn crossover_disabled_inheritance() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut config = config(1, 1);
        let mut fitter = Organism::bare(&config);
        fitter.add_connection(3, 0, 2, 1.0).unwrap();
        let mut other = Organism::bare(&config);
        other.add_connection(3, 0, 2, 1.0).unwrap().set_enabled(false);

        config.disabled_inheritance_chance = 1.0;
        let child = Organism::crossover(&fitter, &other, &config, &mut rng);
        assert!(!child.connection(3).unwrap().enabled());

        config.disabled_inheritance_chance = 0.0;
        let child = Organism::crossover(&fitter, &other, &config, &mut rng);
        assert!(child.connection(3).unwrap().enabled());
    }

    #[test]
    fn crossover_inherits_fitter_neurons() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let config = config(1, 1);
        let mut fitter = Organism::bare(&config);
        fitter.add_neuron(10, ActivationType::ReLU).unwrap();
        fitter.add_connection(11, 0, 10, 1.0).unwrap();
        let mut other = Organism::bare(&config);
        other.add_neuron(20, ActivationType::ReLU).unwrap();
        other.add_connection(21, 0, 20, 1.0).unwrap();

        let child = Organism::crossover(&fitter, &other, &config, &mut rng);
        assert!(child.neuron(10).is_some());
        assert!(child.neuron(20).is_none());
        assert!(child.connection(21).is_none());
    }

    #[test]
    fn from_parts_checks_viability() {
        let config = config(1, 1);
        let organism = Organism::bare(&config);
        let neurons: Vec<NeuronGene> = organism.neurons().copied().collect();

        let rebuilt = Organism::from_parts(
            neurons.iter().copied(),
            vec![ConnectionGene::new(3, 0, 2, 1.0)],
        )
        .unwrap();
        assert_eq!(rebuilt.connection_count(), 1);

        assert_eq!(
            Organism::from_parts(
                neurons.iter().copied(),
                vec![ConnectionGene::new(3, 0, 9, 1.0)],
            )
            .map(|o| o.connection_count()),
            Err(GeneError::MissingEndpoints(0, 9))
        );
        assert_eq!(
            Organism::from_parts(neurons.iter().copied().chain(Some(neurons[0])), vec![])
                .map(|o| o.connection_count()),
            Err(GeneError::DuplicateNeuron(0))
        );
    }
}
