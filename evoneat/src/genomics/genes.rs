use crate::genomics::GeneticConfig;
use crate::Innovation;

use rand::Rng;
use serde::{Deserialize, Serialize};

use std::fmt;

/// An ActivationType represents the type
/// of activation function the neuron's network
/// equivalent will use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivationType {
    // 1 / (1 + exp(-4.9x))
    Sigmoid,
    // tanh(x)
    Tanh,
    // x
    Identity,
    // 0   if x < 0
    // x   if x ≥ 0
    ReLU,
    // exp(-x²)
    Gaussian,
    // sin(πx)
    Sinusoidal,
}

/// A NeuronRole indicates the function of
/// the neuron's network equivalent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NeuronRole {
    /// Input neurons.
    Input,
    /// Output neurons.
    Output,
    /// Neurons created by splitting connections.
    Hidden,
    /// The constant-valued bias neuron.
    Bias,
}

impl NeuronRole {
    /// Returns `true` for roles that never receive connections.
    pub fn is_sensor(self) -> bool {
        matches!(self, NeuronRole::Input | NeuronRole::Bias)
    }
}

/// A neuron of an organism, between which connections are created.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NeuronGene {
    id: Innovation,
    role: NeuronRole,
    activation: ActivationType,
}

impl NeuronGene {
    /// Returns a new neuron with the specified parameters.
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::{ActivationType, NeuronGene, NeuronRole};
    ///
    /// let neuron = NeuronGene::new(5, NeuronRole::Hidden, ActivationType::Tanh);
    ///
    /// assert_eq!(neuron.innovation(), 5);
    /// assert_eq!(neuron.role(), NeuronRole::Hidden);
    /// assert_eq!(neuron.activation(), ActivationType::Tanh);
    /// ```
    pub fn new(id: Innovation, role: NeuronRole, activation: ActivationType) -> NeuronGene {
        NeuronGene {
            id,
            role,
            activation,
        }
    }

    pub fn innovation(&self) -> Innovation {
        self.id
    }

    pub fn role(&self) -> NeuronRole {
        self.role
    }

    pub fn activation(&self) -> ActivationType {
        self.activation
    }
}

impl fmt::Display for NeuronGene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{:?}, {:?}]", self.id, self.role, self.activation)
    }
}

/// Connection genes become weighted edges
/// in an organism's phenotype.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConnectionGene {
    id: Innovation,
    source: Innovation,
    target: Innovation,
    weight: f32,
    enabled: bool,
}

impl ConnectionGene {
    /// Returns a new _enabled_ connection with the specified parameters.
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::ConnectionGene;
    ///
    /// let connection = ConnectionGene::new(42, 3, 9, 2.0);
    ///
    /// assert_eq!(connection.endpoints(), (3, 9));
    /// assert!(connection.enabled());
    /// ```
    pub fn new(id: Innovation, source: Innovation, target: Innovation, weight: f32) -> ConnectionGene {
        ConnectionGene {
            id,
            source,
            target,
            weight,
            enabled: true,
        }
    }

    /// Returns a random weight. Uses a uniform distribution
    /// over the range ±[`weight_bound`].
    ///
    /// [`weight_bound`]: crate::genomics::GeneticConfig::weight_bound
    pub fn random_weight<R: Rng + ?Sized>(config: &GeneticConfig, rng: &mut R) -> f32 {
        if config.weight_bound > 0.0 {
            rng.gen_range(-config.weight_bound..=config.weight_bound)
        } else {
            0.0
        }
    }

    /// Sets the connection's weight to a random value
    /// within ±[`weight_bound`].
    ///
    /// [`weight_bound`]: crate::genomics::GeneticConfig::weight_bound
    pub fn randomize_weight<R: Rng + ?Sized>(&mut self, config: &GeneticConfig, rng: &mut R) {
        self.weight = Self::random_weight(config, rng);
    }

    /// Nudges the connection's weight by a random amount. Uses
    /// a uniform distribution over the range ±[`weight_mutation_power`].
    /// If the weight's magnitude would exceed the [`weight_bound`],
    /// the weight is set to the maximum magnitude with the same
    /// sign.
    ///
    /// [`weight_mutation_power`]: crate::genomics::GeneticConfig::weight_mutation_power
    /// [`weight_bound`]: crate::genomics::GeneticConfig::weight_bound
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::{ConnectionGene, GeneticConfig};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let mut rng = ChaCha8Rng::seed_from_u64(7);
    /// let mut connection = ConnectionGene::new(42, 3, 9, 4.0);
    ///
    /// connection.nudge_weight(
    ///     &GeneticConfig {
    ///         weight_mutation_power: 2.5,
    ///         weight_bound: 5.0,
    ///         ..GeneticConfig::zero()
    ///     },
    ///     &mut rng,
    /// );
    ///
    /// assert!((connection.weight() - 4.0).abs() <= 2.5);
    /// assert!(connection.weight().abs() <= 5.0);
    /// ```
    pub fn nudge_weight<R: Rng + ?Sized>(&mut self, config: &GeneticConfig, rng: &mut R) {
        if config.weight_mutation_power > 0.0 {
            self.weight +=
                rng.gen_range(-config.weight_mutation_power..=config.weight_mutation_power);
        }
        self.weight = self.weight.clamp(-config.weight_bound, config.weight_bound);
    }

    pub fn innovation(&self) -> Innovation {
        self.id
    }

    pub fn source(&self) -> Innovation {
        self.source
    }

    pub fn target(&self) -> Innovation {
        self.target
    }

    /// Returns the connection's source and target neurons' innovation numbers.
    pub fn endpoints(&self) -> (Innovation, Innovation) {
        (self.source, self.target)
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: f32) {
        self.weight = weight;
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl fmt::Display for ConnectionGene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:?}[{:?}->{:?}, {:.3}]{}",
            if self.enabled { "" } else { "(" },
            self.id,
            self.source,
            self.target,
            self.weight,
            if self.enabled { "" } else { ")" },
        )
    }
}

/// Any gene of an organism.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Gene {
    Neuron(NeuronGene),
    Connection(ConnectionGene),
}

impl Gene {
    pub fn innovation(&self) -> Innovation {
        match self {
            Gene::Neuron(n) => n.innovation(),
            Gene::Connection(c) => c.innovation(),
        }
    }
}

impl From<NeuronGene> for Gene {
    fn from(neuron: NeuronGene) -> Gene {
        Gene::Neuron(neuron)
    }
}

impl From<ConnectionGene> for Gene {
    fn from(connection: ConnectionGene) -> Gene {
        Gene::Connection(connection)
    }
}
