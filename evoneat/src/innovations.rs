//! Innovation numbers identify structural mutations, so that
//! the same mutation arising independently in different organisms
//! is recognized as the same gene during crossover and speciation.
use crate::genomics::GeneticConfig;
use crate::Innovation;

use ahash::RandomState;

use std::collections::hash_map::{Entry, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

/// The structural signature of a mutation.
///
/// New connections are identified by their endpoints, and new
/// neurons by the connection they were created by splitting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Signature {
    /// A connection from the first neuron to the second.
    Connection(Innovation, Innovation),
    /// A neuron splitting the given connection.
    Neuron(Innovation),
}

/// Anything structural mutations can request innovation numbers from.
///
/// Every producer of new structure must go through an `InnovationSource`,
/// so that a whole run shares a single numbering space. Both methods
/// either return the number previously assigned to the signature or
/// allocate the next one; they never fail.
pub trait InnovationSource {
    /// Returns the innovation number of a connection between `from` and `to`.
    fn connection_innovation(&mut self, from: Innovation, to: Innovation) -> Innovation;

    /// Returns the innovation number of a neuron splitting `split_connection`.
    fn neuron_innovation(&mut self, split_connection: Innovation) -> Innovation;
}

/// The innovation registry of an evolutionary run.
///
/// A single counter is shared by connections and neurons, so
/// innovation numbers are unique across gene kinds and strictly
/// increase in allocation order. The first numbers are reserved for
/// the input, bias and output neurons every organism starts with
/// (see [`GeneticConfig::reserved_neuron_count`]).
///
/// [`GeneticConfig::reserved_neuron_count`]: crate::genomics::GeneticConfig::reserved_neuron_count
#[derive(Debug, Clone)]
pub struct Innovations {
    next_innovation: Innovation,
    records: HashMap<Signature, Innovation, RandomState>,
}

impl Innovations {
    /// Creates a new registry for organisms built with the
    /// specified configuration.
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::GeneticConfig;
    /// use evoneat::innovations::{InnovationSource, Innovations};
    ///
    /// let config = GeneticConfig::zero();
    /// let mut innovations = Innovations::new(&config);
    ///
    /// // One input, one bias and one output neuron are reserved.
    /// assert_eq!(innovations.next_innovation(), 3);
    ///
    /// let first = innovations.connection_innovation(0, 2);
    /// let second = innovations.connection_innovation(1, 2);
    /// assert_eq!(innovations.connection_innovation(0, 2), first);
    /// assert!(second > first);
    /// ```
    pub fn new(config: &GeneticConfig) -> Innovations {
        Innovations {
            next_innovation: config.reserved_neuron_count(),
            records: HashMap::default(),
        }
    }

    /// Rebuilds a registry from previously recorded signatures.
    ///
    /// Returns `None` if any record is inconsistent with `next_innovation`,
    /// or if two signatures share an innovation number.
    pub fn from_records(
        next_innovation: Innovation,
        records: impl IntoIterator<Item = (Signature, Innovation)>,
    ) -> Option<Innovations> {
        let mut seen = std::collections::HashSet::<Innovation, RandomState>::default();
        let mut map = HashMap::default();
        for (signature, innovation) in records {
            if innovation >= next_innovation || !seen.insert(innovation) {
                return None;
            }
            if map.insert(signature, innovation).is_some() {
                return None;
            }
        }
        Some(Innovations {
            next_innovation,
            records: map,
        })
    }

    /// Returns the innovation number of `signature`, if it
    /// has been registered.
    pub fn lookup(&self, signature: Signature) -> Option<Innovation> {
        self.records.get(&signature).copied()
    }

    fn lookup_or_allocate(&mut self, signature: Signature) -> Innovation {
        match self.records.entry(signature) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let innovation = self.next_innovation;
                self.next_innovation += 1;
                *entry.insert(innovation)
            }
        }
    }

    /// Returns the innovation number the next new mutation will receive.
    pub fn next_innovation(&self) -> Innovation {
        self.next_innovation
    }

    /// Returns the highest innovation number allocated so far,
    /// counting reserved neurons.
    ///
    /// # Examples
    /// ```
    /// use evoneat::genomics::GeneticConfig;
    /// use evoneat::innovations::Innovations;
    ///
    /// let innovations = Innovations::new(&GeneticConfig::zero());
    ///
    /// assert_eq!(innovations.max_innovation(), Some(2));
    /// ```
    pub fn max_innovation(&self) -> Option<Innovation> {
        self.next_innovation.checked_sub(1)
    }

    /// Returns the number of registered mutations.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no mutation has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns an iterator over every registered mutation.
    /// No ordering is guaranteed.
    pub fn records(&self) -> impl Iterator<Item = (Signature, Innovation)> + '_ {
        self.records.iter().map(|(s, i)| (*s, *i))
    }

    /// Returns an iterator over the connection mutations, in the
    /// format `((source, target), connection innovation)`.
    /// No ordering is guaranteed.
    pub fn connection_innovations(
        &self,
    ) -> impl Iterator<Item = ((Innovation, Innovation), Innovation)> + '_ {
        self.records().filter_map(|(s, i)| match s {
            Signature::Connection(from, to) => Some(((from, to), i)),
            Signature::Neuron(_) => None,
        })
    }

    /// Returns an iterator over the neuron mutations, in the
    /// format `(split connection, neuron innovation)`.
    /// No ordering is guaranteed.
    pub fn neuron_innovations(&self) -> impl Iterator<Item = (Innovation, Innovation)> + '_ {
        self.records().filter_map(|(s, i)| match s {
            Signature::Neuron(split) => Some((split, i)),
            Signature::Connection(..) => None,
        })
    }
}

impl InnovationSource for Innovations {
    fn connection_innovation(&mut self, from: Innovation, to: Innovation) -> Innovation {
        self.lookup_or_allocate(Signature::Connection(from, to))
    }

    fn neuron_innovation(&mut self, split_connection: Innovation) -> Innovation {
        self.lookup_or_allocate(Signature::Neuron(split_connection))
    }
}

/// A registry handle that serializes access through a mutex,
/// for producers of structure running on several threads.
///
/// # Examples
/// ```
/// use evoneat::genomics::GeneticConfig;
/// use evoneat::innovations::{InnovationSource, Innovations, SharedInnovations};
///
/// let shared = SharedInnovations::new(Innovations::new(&GeneticConfig::zero()));
/// let id = {
///     let mut handle = shared.clone();
///     handle.connection_innovation(0, 2)
/// };
///
/// assert_eq!(shared.into_inner().unwrap().connection_innovation(0, 2), id);
/// ```
#[derive(Debug, Clone)]
pub struct SharedInnovations(Arc<Mutex<Innovations>>);

impl SharedInnovations {
    pub fn new(innovations: Innovations) -> SharedInnovations {
        SharedInnovations(Arc::new(Mutex::new(innovations)))
    }

    /// Returns a snapshot of the shared registry.
    pub fn snapshot(&self) -> Innovations {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Unwraps the registry, if this is the last handle to it.
    pub fn into_inner(self) -> Option<Innovations> {
        Arc::try_unwrap(self.0)
            .ok()
            .map(|m| m.into_inner().unwrap_or_else(PoisonError::into_inner))
    }
}

// A poisoned lock still guards a consistent registry: every
// operation is a single map insertion plus a counter bump.
impl InnovationSource for SharedInnovations {
    fn connection_innovation(&mut self, from: Innovation, to: Innovation) -> Innovation {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .connection_innovation(from, to)
    }

    fn neuron_innovation(&mut self, split_connection: Innovation) -> Innovation {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .neuron_innovation(split_connection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroUsize;

    fn config() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(2).unwrap(),
            output_count: NonZeroUsize::new(1).unwrap(),
            ..GeneticConfig::zero()
        }
    }

    #[test]
    fn reserves_io_neurons() {
        let innovations = Innovations::new(&config());
        // 2 inputs + bias + 1 output.
        assert_eq!(innovations.next_innovation(), 4);
        assert!(innovations.is_empty());
    }

    #[test]
    fn same_signature_same_innovation() {
        let mut innovations = Innovations::new(&config());
        let connection = innovations.connection_innovation(0, 3);
        let neuron = innovations.neuron_innovation(connection);
        assert_eq!(innovations.connection_innovation(0, 3), connection);
        assert_eq!(innovations.neuron_innovation(connection), neuron);
        assert_eq!(innovations.len(), 2);
    }

    #[test]
    fn distinct_signatures_strictly_increase() {
        let mut innovations = Innovations::new(&config());
        let ids = [
            innovations.connection_innovation(0, 3),
            innovations.connection_innovation(1, 3),
            innovations.neuron_innovation(4),
            innovations.connection_innovation(3, 0),
            innovations.neuron_innovation(5),
        ];
        assert!(ids.windows(2).all(|w| w[0] < w[1]), "{:?}", ids);
        assert_eq!(innovations.max_innovation(), Some(ids[4]));
    }

    #[test]
    fn connection_direction_matters() {
        let mut innovations = Innovations::new(&config());
        assert_ne!(
            innovations.connection_innovation(0, 3),
            innovations.connection_innovation(3, 0)
        );
    }

    #[test]
    fn from_records_round_trip() {
        let mut innovations = Innovations::new(&config());
        innovations.connection_innovation(0, 3);
        innovations.neuron_innovation(4);
        let mut restored =
            Innovations::from_records(innovations.next_innovation(), innovations.records())
                .unwrap();
        assert_eq!(restored.connection_innovation(0, 3), 4);
        assert_eq!(restored.neuron_innovation(4), 5);
        assert_eq!(restored.connection_innovation(1, 3), 6);
    }

    #[test]
    fn from_records_rejects_inconsistencies() {
        assert!(Innovations::from_records(4, vec![(Signature::Neuron(0), 4)]).is_none());
        assert!(Innovations::from_records(
            6,
            vec![
                (Signature::Neuron(0), 4),
                (Signature::Connection(0, 3), 4)
            ]
        )
        .is_none());
    }

    #[test]
    fn shared_innovations_agree_across_threads() {
        let shared = SharedInnovations::new(Innovations::new(&config()));
        let ids: Vec<Innovation> = (0..4)
            .map(|_| {
                let mut handle = shared.clone();
                std::thread::spawn(move || handle.connection_innovation(2, 3))
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect();
        assert!(ids.iter().all(|id| *id == ids[0]));
        assert_eq!(shared.snapshot().len(), 1);
    }
}
