use crate::networks::RealTimeNetwork;
use evoneat::genomics::Organism;

/// A neural network best suited for function
/// approximation.
///
/// Each evaluation starts from a cleared state, and activates
/// the network as many times as the longest path from a sensor
/// to an output is long, so every output sees every input.
///
/// # Generic parameters
/// `MAX_NODE_VISITS`: the maximum number of times a node
/// can be visited in a path through the network before
/// the network's activation freezes. Setting it to 0 will
/// effectively disable the entire network, 1 will dissallow
/// any cycles, 2 will allow single pass through the longest
/// cycle in the network, etc.
#[derive(Clone, Debug)]
pub struct FunctionApproximatorNetwork<const MAX_NODE_VISITS: u8> {
    network: RealTimeNetwork,
    depth: usize,
}

impl<const MAX_NODE_VISITS: u8> From<&Organism> for FunctionApproximatorNetwork<MAX_NODE_VISITS> {
    /// Generates a new network from the passed organism.
    ///
    /// # Complexity
    /// This function has `O(d^(n × MAX_NODE_VISITS))` time complexity,
    /// and `O(n × MAX_NODE_VISITS)` space complexity,
    /// where `d` is the highest output count in the organism's neurons.
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::{GeneticConfig, Organism};
    /// use evoneat_nn::networks::FunctionApproximatorNetwork;
    ///
    /// let organism = Organism::bare(&GeneticConfig::zero());
    /// let network = FunctionApproximatorNetwork::<1>::from(&organism);
    ///
    /// assert_eq!(network.depth(), 0);
    /// ```
    fn from(organism: &Organism) -> FunctionApproximatorNetwork<MAX_NODE_VISITS> {
        let network = RealTimeNetwork::new(organism);
        let depth = (0..network.sensor_count)
            .map(|root| {
                Self::calculate_depth(
                    &network,
                    root,
                    &mut vec![0; network.connections.len()],
                    0,
                )
            })
            .max()
            .unwrap_or(0);

        FunctionApproximatorNetwork { network, depth }
    }
}

impl<const MAX_NODE_VISITS: u8> FunctionApproximatorNetwork<MAX_NODE_VISITS> {
    /// Calculates the length of the longest path
    /// from the `root` node that doesn't pass through
    /// any node more than `MAX_NODE_VISITS` times.
    ///
    /// # Complexity
    /// This function has `O(d^(n × MAX_NODE_VISITS))` time complexity,
    /// and `O(n × MAX_NODE_VISITS)` space complexity,
    /// where `d` is the highest output count in the organism's neurons.
    fn calculate_depth(
        network: &RealTimeNetwork,
        root: usize,
        visited: &mut [u8],
        current_depth: usize,
    ) -> usize {
        let mut max_depth = 0;

        for c in network.connections[root].iter() {
            if visited[c.target] < MAX_NODE_VISITS {
                visited[c.target] += 1;
                max_depth = max_depth.max(Self::calculate_depth(
                    network,
                    c.target,
                    visited,
                    current_depth + 1,
                ));
                visited[c.target] -= 1;
            }
        }

        let outputs = network.sensor_count..network.sensor_count + network.output_count;
        if max_depth == 0 && outputs.contains(&root) {
            current_depth
        } else {
            max_depth
        }
    }

    /// The number of activations per evaluation.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn input_count(&self) -> usize {
        self.network.input_count()
    }

    pub fn output_count(&self) -> usize {
        self.network.output_count()
    }

    /// Returns the approximated function's value
    /// at the N-dimensional point given by `inputs`.
    ///
    /// # Panics
    /// Panics if `inputs` does not hold exactly one
    /// value per network input.
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::{ActivationType, GeneticConfig, Organism};
    /// use evoneat_nn::networks::FunctionApproximatorNetwork;
    ///
    /// fn sigmoid(x: f32) -> f32 {
    ///     1.0 / (1.0 + (-4.9 * x).exp())
    /// }
    ///
    /// // Create a network with a two sigmoid neurons in sequence.
    /// let mut organism = Organism::bare(&GeneticConfig::zero());
    /// organism.add_neuron(3, ActivationType::Sigmoid).unwrap();
    /// organism.add_connection(4, 0, 3, 1.0).unwrap();
    /// organism.add_connection(5, 3, 2, 1.0).unwrap();
    /// let mut network = FunctionApproximatorNetwork::<1>::from(&organism);
    ///
    /// // The result is identical to double application of a sigmoid function.
    /// for input in -20..=20 {
    ///     let input = input as f32 / 10.0;
    ///     assert_eq!(network.evaluate_at(&[input])[0], sigmoid(sigmoid(input)));
    /// }
    /// ```
    pub fn evaluate_at(&mut self, inputs: &[f32]) -> Vec<f32> {
        self.network.clear_state();
        self.network.set_inputs(inputs);
        for _ in 0..self.depth {
            self.network.activate();
        }
        self.network.outputs()
    }
}
