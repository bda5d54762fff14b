use crate::fitness::FitnessLedger;
use crate::genomics::{Organism, OrganismId};
use crate::speciation::Specie;

/// An evaluated and speciated generation.
///
/// Snapshots are immutable once produced by the evolver.
/// They hold everything needed to resume a run from them,
/// together with the generation's fitness scores and the
/// innovation registry.
#[derive(Debug)]
pub struct Generation {
    number: usize,
    organisms: Vec<Organism>,
    species: Vec<Specie>,
    next_specie_id: usize,
    threshold: f32,
}

impl Generation {
    pub(crate) fn new(
        number: usize,
        organisms: Vec<Organism>,
        species: Vec<Specie>,
        next_specie_id: usize,
        threshold: f32,
    ) -> Generation {
        Generation {
            number,
            organisms,
            species,
            next_specie_id,
            threshold,
        }
    }

    /// The generation's number, starting at 1.
    pub fn number(&self) -> usize {
        self.number
    }

    /// The evaluated organisms, in population order.
    pub fn organisms(&self) -> &[Organism] {
        &self.organisms
    }

    pub fn organism(&self, id: OrganismId) -> Option<&Organism> {
        self.organisms.iter().find(|o| o.id() == id)
    }

    /// The species partition of the organisms.
    pub fn species(&self) -> &[Specie] {
        &self.species
    }

    /// The identifier the next new specie will receive.
    pub fn next_specie_id(&self) -> usize {
        self.next_specie_id
    }

    /// The compatibility threshold the next speciation pass will use.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Returns the fittest organism of the generation.
    pub fn champion(&self, scores: &FitnessLedger) -> Option<&Organism> {
        scores.fittest(&self.organisms)
    }
}
