//! A network is the phenotype of an organism: every neuron
//! gene becomes a node, and every enabled connection gene
//! a weighted connection. Disabled connections are ignored.
//!
//! Nodes are laid out as inputs, bias, outputs, then hidden
//! neurons, each group ordered by innovation number. The bias
//! node always emits 1.
//!
//! The `RealTimeNetwork` type is best suited for real-time
//! control tasks, with new inputs set for each activation,
//! and multiple time-steps involved.
//!
//! For a more instantaneous input-result use-case, the
//! `FunctionApproximatorNetwork` type is more appropiate.
mod connection;
mod function_approximator;

pub use function_approximator::FunctionApproximatorNetwork;

use connection::Connection;
use evoneat::genomics::{ActivationType, NeuronRole, Organism};
use evoneat::Innovation;

use ahash::RandomState;

use std::collections::HashMap;
use std::fmt;

const BIAS_ACTIVATION: f32 = 1.0;

/// An arbitrarily-structured, possibly recurrent, neural network.
#[derive(Clone, Debug)]
pub struct RealTimeNetwork {
    input_count: usize,
    sensor_count: usize,
    output_count: usize,
    node_ids: Box<[Innovation]>,
    input_sums: Box<[f32]>,
    activation_levels: Box<[f32]>,
    activation_functions: Box<[ActivationType]>,
    connections: Box<[Box<[Connection]>]>,
}

impl RealTimeNetwork {
    /// Generates a new network from the passed organism.
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::{GeneticConfig, Organism};
    /// use evoneat::innovations::Innovations;
    /// use evoneat_nn::networks::RealTimeNetwork;
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
    /// let mut rng = ChaCha8Rng::seed_from_u64(0);
    /// let organism = Organism::new(&config, &mut Innovations::new(&config), &mut rng);
    ///
    /// let network = RealTimeNetwork::new(&organism);
    ///
    /// assert_eq!(network.input_count(), 3);
    /// assert_eq!(network.output_count(), 2);
    /// ```
    pub fn new(organism: &Organism) -> RealTimeNetwork {
        let mut input_nodes = vec![];
        let mut bias_nodes = vec![];
        let mut output_nodes = vec![];
        let mut hidden_nodes = vec![];

        // Neurons are iterated by innovation number,
        // so every group is already ordered.
        for neuron in organism.neurons() {
            match neuron.role() {
                NeuronRole::Input => &mut input_nodes,
                NeuronRole::Bias => &mut bias_nodes,
                NeuronRole::Output => &mut output_nodes,
                NeuronRole::Hidden => &mut hidden_nodes,
            }
            .push((neuron.innovation(), neuron.activation()));
        }
        let sensor_count = input_nodes.len() + bias_nodes.len();
        let (node_ids, activation_functions): (Vec<_>, Vec<_>) = input_nodes
            .iter()
            .chain(&bias_nodes)
            .chain(&output_nodes)
            .chain(&hidden_nodes)
            .copied()
            .unzip();
        let total_node_count = node_ids.len();

        let node_index_from_id: HashMap<_, _, RandomState> = node_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, i))
            .collect();
        let mut connections = vec![vec![]; total_node_count];

        for gene in organism.enabled_connections() {
            let source = node_index_from_id.get(&gene.source());
            let target = node_index_from_id.get(&gene.target());
            // Organisms only hold connections between their own neurons.
            if let (Some(source), Some(target)) = (source, target) {
                connections[*source].push(Connection::new(*target, gene.weight()));
            }
        }

        let mut activation_levels = vec![0.0; total_node_count];
        for level in &mut activation_levels[input_nodes.len()..sensor_count] {
            *level = BIAS_ACTIVATION;
        }

        RealTimeNetwork {
            input_count: input_nodes.len(),
            sensor_count,
            output_count: output_nodes.len(),
            node_ids: node_ids.into(),
            input_sums: vec![0.0; total_node_count].into(),
            activation_levels: activation_levels.into(),
            activation_functions: activation_functions.into(),
            connections: connections.into_iter().map(|v| v.into()).collect(),
        }
    }

    pub fn input_count(&self) -> usize {
        self.input_count
    }

    pub fn output_count(&self) -> usize {
        self.output_count
    }

    /// Innovation numbers of the network's nodes,
    /// in activation-level order.
    pub fn node_ids(&self) -> &[Innovation] {
        &self.node_ids
    }

    /// Fires all nodes, propagating all activations
    /// (including set inputs), and then computing
    /// new activation levels.
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::{ActivationType, GeneticConfig, Organism};
    /// use evoneat_nn::networks::RealTimeNetwork;
    /// use std::num::NonZeroUsize;
    ///
    /// let mut organism = Organism::bare(&GeneticConfig {
    ///     input_count: NonZeroUsize::new(2).unwrap(),
    ///     output_count: NonZeroUsize::new(1).unwrap(),
    ///     output_activation_types: vec![ActivationType::ReLU],
    ///     ..GeneticConfig::zero()
    /// });
    /// organism.add_connection(4, 0, 3, 2.5).unwrap();
    /// organism.add_connection(5, 1, 3, -2.5).unwrap();
    ///
    /// let mut network = RealTimeNetwork::new(&organism);
    /// network.set_inputs(&[0.5, 1.0]);
    ///
    /// network.activate();
    ///
    /// assert_eq!(network.outputs()[0], ((0.5 * 2.5 + 1.0 * (-2.5)) as f32).max(0.0));
    /// ```
    pub fn activate(&mut self) {
        self.fire_nodes();
        self.compute_activations();
    }

    /// Propagates each node's signal through all its
    /// outgoing connections.
    fn fire_nodes(&mut self) {
        for (activation, outgoing) in self
            .activation_levels
            .iter()
            .zip(self.connections.iter())
        {
            for connection in outgoing.iter() {
                self.input_sums[connection.target] += *activation * connection.weight;
            }
        }
    }

    /// Computes each non-sensor node's activation
    /// level, based on its input sum.
    fn compute_activations(&mut self) {
        let sensors = self.sensor_count;
        for ((input_sum, activation_level), activation_function) in self.input_sums[sensors..]
            .iter_mut()
            .zip(&mut self.activation_levels[sensors..])
            .zip(&self.activation_functions[sensors..])
        {
            *activation_level = compute_activation(*input_sum, *activation_function);
            *input_sum = 0.0;
        }
        // Sensor nodes have no incoming connections,
        // but their sums are cleared all the same.
        for input_sum in &mut self.input_sums[..sensors] {
            *input_sum = 0.0;
        }
    }

    /// Clears the activation state of all nodes.
    /// The bias node keeps emitting 1.
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::{GeneticConfig, Organism};
    /// use evoneat_nn::networks::RealTimeNetwork;
    ///
    /// let mut organism = Organism::bare(&GeneticConfig::zero());
    /// organism.add_connection(3, 0, 2, 1.0).unwrap();
    ///
    /// let mut network = RealTimeNetwork::new(&organism);
    /// network.set_inputs(&[1.0]);
    /// network.activate();
    /// assert_ne!(network.outputs()[0], 0.0);
    ///
    /// network.clear_state();
    ///
    /// assert_eq!(network.outputs()[0], 0.0);
    /// ```
    pub fn clear_state(&mut self) {
        let sensors = self.sensor_count;
        for (i, (input_sum, activation)) in self
            .input_sums
            .iter_mut()
            .zip(self.activation_levels.iter_mut())
            .enumerate()
        {
            *input_sum = 0.0;
            *activation = if (self.input_count..sensors).contains(&i) {
                BIAS_ACTIVATION
            } else {
                0.0
            };
        }
    }

    /// Sets the activation level of each input node
    /// to the corresponding value in the passed slice.
    ///
    /// # Panics
    /// This function panics if the length of the passed
    /// slice is not equal to the number of inputs in the network.
    pub fn set_inputs(&mut self, values: &[f32]) {
        self.activation_levels[..self.input_count].copy_from_slice(values);
    }

    /// Returns the current output node activation levels
    /// as a vector.
    pub fn outputs(&self) -> Vec<f32> {
        let start = self.sensor_count;
        self.activation_levels[start..start + self.output_count].to_vec()
    }
}

impl From<&Organism> for RealTimeNetwork {
    fn from(organism: &Organism) -> RealTimeNetwork {
        RealTimeNetwork::new(organism)
    }
}

// Applies one of the available functions to the input and returns the output as the result
fn compute_activation(input_sum: f32, activation_function: ActivationType) -> f32 {
    match activation_function {
        ActivationType::Sigmoid => 1.0 / (1.0 + (-4.9 * input_sum).exp()),
        ActivationType::Tanh => input_sum.tanh(),
        ActivationType::Identity => input_sum,
        ActivationType::ReLU => input_sum.max(0.0),
        ActivationType::Gaussian => (-input_sum.powf(2.0)).exp(),
        ActivationType::Sinusoidal => (input_sum * std::f32::consts::PI).sin(),
    }
}

impl fmt::Display for RealTimeNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self as &dyn fmt::Debug).fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evoneat::genomics::GeneticConfig;
    use std::num::NonZeroUsize;

    fn sigmoid(x: f32) -> f32 {
        1.0 / (1.0 + (-4.9 * x).exp())
    }

    #[test]
    fn from() {
        let config = GeneticConfig {
            input_count: NonZeroUsize::new(2).unwrap(),
            output_count: NonZeroUsize::new(2).unwrap(),
            output_activation_types: vec![ActivationType::Sigmoid, ActivationType::Gaussian],
            ..GeneticConfig::zero()
        };
        // Inputs 0 and 1, bias 2, outputs 3 and 4.
        let mut organism = Organism::bare(&config);
        organism.add_neuron(5, ActivationType::Tanh).unwrap();

        let ids = [6, 7, 8, 9, 10, 11];
        let sources = [0, 1, 2, 5, 5, 3];
        let targets = [5, 3, 5, 3, 4, 5];
        let weights = [1.0, 1.0, 2.5, -2.0, -1.0, 3.2];
        for i in 0..6 {
            organism
                .add_connection(ids[i], sources[i], targets[i], weights[i])
                .unwrap();
        }
        // Disabled connections are not expressed in the network.
        organism.add_connection(12, 0, 4, -1.0).unwrap().set_enabled(false);

        let network = RealTimeNetwork::new(&organism);
        assert_eq!(network.input_count(), 2);
        assert_eq!(network.output_count(), 2);
        assert_eq!(network.node_ids(), &[0, 1, 2, 3, 4, 5]);
        assert_eq!(network.activation_functions[3], ActivationType::Sigmoid);
        assert_eq!(network.activation_functions[4], ActivationType::Gaussian);
        assert_eq!(network.activation_functions[5], ActivationType::Tanh);
        assert!(!network.connections[0].contains(&Connection::new(4, -1.0)));
        for (node_idx, node_id) in network.node_ids().iter().enumerate() {
            let outgoing = &network.connections[node_idx];
            let expected = (0..6).filter(|i| sources[*i] == *node_id);
            assert_eq!(outgoing.len(), expected.clone().count());
            for idx in expected {
                let target = network.node_ids().iter().position(|id| *id == targets[idx]).unwrap();
                assert!(outgoing.contains(&Connection::new(target, weights[idx])));
            }
        }
    }

    #[test]
    fn activate_empty() {
        let organism = Organism::bare(&GeneticConfig::zero());
        let mut network = RealTimeNetwork::new(&organism);
        assert!((0..100).all(|_| {
            network.activate();
            network.outputs()[0] == sigmoid(0.0)
        }));
    }

    #[test]
    fn activate_single() {
        let mut organism = Organism::bare(&GeneticConfig::zero());
        organism.add_connection(3, 0, 2, 1.0).unwrap();
        let mut network = RealTimeNetwork::new(&organism);
        for input in -20..=20 {
            let input = input as f32 / 10.0;
            network.clear_state();
            network.set_inputs(&[input]);
            network.activate();
            assert_eq!(network.outputs()[0], sigmoid(input))
        }
    }

    #[test]
    fn bias_emits_one() {
        let mut organism = Organism::bare(&GeneticConfig::zero());
        organism.add_connection(3, 1, 2, 0.5).unwrap();
        let mut network = RealTimeNetwork::new(&organism);
        for _ in 0..3 {
            network.clear_state();
            network.set_inputs(&[7.0]);
            network.activate();
            assert_eq!(network.outputs()[0], sigmoid(0.5));
        }
    }

    #[test]
    fn activate_single_recursive() {
        let mut organism = Organism::bare(&GeneticConfig::zero());
        organism.add_connection(3, 0, 2, 1.0).unwrap();
        organism.add_connection(4, 2, 2, -1.0).unwrap();
        let mut network = RealTimeNetwork::new(&organism);
        let mut prev_output = 0.0;
        for input in -20..=20 {
            let input = input as f32 / 10.0;
            network.set_inputs(&[input]);
            network.activate();
            assert_eq!(network.outputs()[0], sigmoid(input - prev_output));
            prev_output = network.outputs()[0];
        }
    }

    #[test]
    fn activate_double() {
        let mut organism = Organism::bare(&GeneticConfig::zero());
        organism.add_neuron(3, ActivationType::Sigmoid).unwrap();
        organism.add_connection(4, 0, 3, 1.0).unwrap();
        organism.add_connection(5, 3, 2, 1.0).unwrap();
        let mut network = RealTimeNetwork::new(&organism);
        for input in -20..=20 {
            let input = input as f32 / 10.0;
            network.clear_state();
            network.set_inputs(&[input]);
            network.activate();
            network.activate();
            assert_eq!(network.outputs()[0], sigmoid(sigmoid(input)))
        }
    }

    #[test]
    fn activate_multiple_inputs() {
        let config = GeneticConfig {
            input_count: NonZeroUsize::new(3).unwrap(),
            output_activation_types: vec![ActivationType::Tanh],
            ..GeneticConfig::zero()
        };
        // Inputs 0 to 2, bias 3, output 4.
        let mut organism = Organism::bare(&config);
        organism.add_connection(5, 0, 4, -1.0).unwrap();
        organism.add_connection(6, 1, 4, 1.0).unwrap();
        organism.add_connection(7, 2, 4, 0.5).unwrap();
        let mut network = RealTimeNetwork::new(&organism);
        for ((x, y), z) in (-20..=20).zip(-20..=20).zip(-20..=20) {
            let (x, y, z) = (x as f32 / 10.0, y as f32 / 10.0, z as f32 / 10.0);
            network.clear_state();
            network.set_inputs(&[x, y, z]);
            network.activate();
            assert_eq!(
                network.outputs()[0],
                (-x + y + 0.5 * z).tanh(),
                "{} {} {}",
                x,
                y,
                z
            );
        }
    }

    #[test]
    #[should_panic]
    fn wrong_input_count_panics() {
        let organism = Organism::bare(&GeneticConfig::zero());
        RealTimeNetwork::new(&organism).set_inputs(&[1.0, 2.0]);
    }
}
