use crate::fitness::FitnessLedger;
use crate::genomics::{Organism, OrganismId};

use serde::{Deserialize, Serialize};

use std::fmt;

/// Specie identifier. Identifiers are allocated
/// in increasing order over a whole run, and never
/// reused after a specie goes extinct.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpecieId(pub usize);

impl fmt::Display for SpecieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

/// Allocates [`SpecieId`]s.
///
/// # Examples
/// ```
/// use evoneat::speciation::{SpecieId, SpecieIdAllocator};
///
/// let mut ids = SpecieIdAllocator::new();
///
/// assert_eq!(ids.allocate(), SpecieId(0));
/// assert_eq!(ids.allocate(), SpecieId(1));
/// assert_eq!(ids.peek(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecieIdAllocator {
    next: usize,
}

impl SpecieIdAllocator {
    pub fn new() -> SpecieIdAllocator {
        SpecieIdAllocator::default()
    }

    /// Resumes allocation from `next`.
    pub fn starting_at(next: usize) -> SpecieIdAllocator {
        SpecieIdAllocator { next }
    }

    pub fn allocate(&mut self) -> SpecieId {
        let id = SpecieId(self.next);
        self.next += 1;
        id
    }

    /// Returns the value of the next identifier to be allocated.
    pub fn peek(&self) -> usize {
        self.next
    }
}

/// Species are collections of reproductively
/// compatible (within a certain compatibility
/// distance) organisms. Membership is determined
/// by comparing organisms against a _representative_.
///
/// Species own their membership, as an ordered list
/// of organism identities. Organisms point back to
/// their specie by id.
#[derive(Debug)]
pub struct Specie {
    id: SpecieId,
    representative: Organism,
    members: Vec<OrganismId>,
}

impl Specie {
    /// Creates a new, memberless specie.
    pub fn new(id: SpecieId, representative: Organism) -> Specie {
        Specie {
            id,
            representative,
            members: vec![],
        }
    }

    pub(crate) fn from_parts(id: SpecieId, representative: Organism, members: Vec<OrganismId>) -> Specie {
        Specie {
            id,
            representative,
            members,
        }
    }

    pub fn id(&self) -> SpecieId {
        self.id
    }

    pub fn representative(&self) -> &Organism {
        &self.representative
    }

    pub(crate) fn set_representative(&mut self, representative: Organism) {
        self.representative = representative;
    }

    /// Returns the specie's members, in order of assignment.
    pub fn members(&self) -> &[OrganismId] {
        &self.members
    }

    pub(crate) fn add_member(&mut self, id: OrganismId) {
        self.members.push(id);
    }

    pub fn contains(&self, id: OrganismId) -> bool {
        self.members.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns the highest fitness among the members,
    /// or `None` if the specie is empty.
    ///
    /// # Panics
    ///
    /// Panics if a member is unscored.
    pub fn best_fitness(&self, scores: &FitnessLedger) -> Option<f32> {
        self.members
            .iter()
            .map(|id| scores.fitness(*id))
            .reduce(f32::max)
    }

    /// Returns the mean fitness of the members,
    /// or `None` if the specie is empty.
    pub fn mean_fitness(&self, scores: &FitnessLedger) -> Option<f32> {
        if self.members.is_empty() {
            return None;
        }
        let sum: f32 = self.members.iter().map(|id| scores.fitness(*id)).sum();
        Some(sum / self.members.len() as f32)
    }

    /// Returns the member with the highest fitness.
    /// Ties are resolved in favour of the earliest member.
    pub fn fittest_member(&self, scores: &FitnessLedger) -> Option<OrganismId> {
        self.members
            .iter()
            .map(|id| (*id, scores.fitness(*id)))
            .fold(None::<(OrganismId, f32)>, |best, (id, f)| match best {
                Some((_, best_fitness)) if best_fitness >= f => best,
                _ => Some((id, f)),
            })
            .map(|(id, _)| id)
    }
}
