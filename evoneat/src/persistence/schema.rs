//! The versioned on-disk representation of checkpoints.
//!
//! Records mirror the engine's types without depending on their
//! layout, so the in-memory model may change without breaking
//! existing checkpoints. Organism identities are process-local and
//! are not stored: species refer to their members by position in
//! the generation's organism list, and restored organisms receive
//! fresh identities.
use super::{Checkpoint, PersistenceError};
use crate::evolution::Generation;
use crate::fitness::FitnessLedger;
use crate::genomics::{ActivationType, ConnectionGene, NeuronGene, NeuronRole, Organism, OrganismId};
use crate::innovations::{Innovations, Signature};
use crate::speciation::{Specie, SpecieId};
use crate::Innovation;

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use std::collections::HashMap;

/// The only schema version this build reads and writes.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub version: u32,
    pub innovations: InnovationsRecord,
    pub generation: GenerationRecord,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InnovationsRecord {
    pub next_innovation: Innovation,
    /// `(source, target, innovation)`, by innovation.
    pub connections: Vec<(Innovation, Innovation, Innovation)>,
    /// `(split connection, innovation)`, by innovation.
    pub neurons: Vec<(Innovation, Innovation)>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub number: usize,
    pub next_specie_id: usize,
    pub threshold: f32,
    pub organisms: Vec<OrganismRecord>,
    pub species: Vec<SpecieRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrganismRecord {
    pub fitness: Option<f32>,
    pub specie: Option<usize>,
    pub neurons: Vec<NeuronRecord>,
    pub connections: Vec<ConnectionRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpecieRecord {
    pub id: usize,
    pub representative: OrganismRecord,
    /// Positions of the members in [`GenerationRecord::organisms`].
    pub members: Vec<usize>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NeuronRecord {
    pub innovation: Innovation,
    pub role: RoleRecord,
    pub activation: ActivationRecord,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub innovation: Innovation,
    pub source: Innovation,
    pub target: Innovation,
    pub weight: f32,
    pub enabled: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoleRecord {
    Input,
    Bias,
    Output,
    Hidden,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivationRecord {
    Sigmoid,
    Tanh,
    Identity,
    ReLU,
    Gaussian,
    Sinusoidal,
}

impl From<NeuronRole> for RoleRecord {
    fn from(role: NeuronRole) -> RoleRecord {
        match role {
            NeuronRole::Input => RoleRecord::Input,
            NeuronRole::Bias => RoleRecord::Bias,
            NeuronRole::Output => RoleRecord::Output,
            NeuronRole::Hidden => RoleRecord::Hidden,
        }
    }
}

impl From<RoleRecord> for NeuronRole {
    fn from(role: RoleRecord) -> NeuronRole {
        match role {
            RoleRecord::Input => NeuronRole::Input,
            RoleRecord::Bias => NeuronRole::Bias,
            RoleRecord::Output => NeuronRole::Output,
            RoleRecord::Hidden => NeuronRole::Hidden,
        }
    }
}

impl From<ActivationType> for ActivationRecord {
    fn from(activation: ActivationType) -> ActivationRecord {
        match activation {
            ActivationType::Sigmoid => ActivationRecord::Sigmoid,
            ActivationType::Tanh => ActivationRecord::Tanh,
            ActivationType::Identity => ActivationRecord::Identity,
            ActivationType::ReLU => ActivationRecord::ReLU,
            ActivationType::Gaussian => ActivationRecord::Gaussian,
            ActivationType::Sinusoidal => ActivationRecord::Sinusoidal,
        }
    }
}

impl From<ActivationRecord> for ActivationType {
    fn from(activation: ActivationRecord) -> ActivationType {
        match activation {
            ActivationRecord::Sigmoid => ActivationType::Sigmoid,
            ActivationRecord::Tanh => ActivationType::Tanh,
            ActivationRecord::Identity => ActivationType::Identity,
            ActivationRecord::ReLU => ActivationType::ReLU,
            ActivationRecord::Gaussian => ActivationType::Gaussian,
            ActivationRecord::Sinusoidal => ActivationType::Sinusoidal,
        }
    }
}

impl OrganismRecord {
    fn capture(organism: &Organism, fitness: Option<f32>) -> OrganismRecord {
        OrganismRecord {
            fitness,
            specie: organism.specie().map(|s| s.0),
            neurons: organism
                .neurons()
                .map(|n| NeuronRecord {
                    innovation: n.innovation(),
                    role: n.role().into(),
                    activation: n.activation().into(),
                })
                .collect(),
            connections: organism
                .connections()
                .map(|c| ConnectionRecord {
                    innovation: c.innovation(),
                    source: c.source(),
                    target: c.target(),
                    weight: c.weight(),
                    enabled: c.enabled(),
                })
                .collect(),
        }
    }

    fn restore(&self) -> Result<Organism, PersistenceError> {
        let neurons = self
            .neurons
            .iter()
            .map(|n| NeuronGene::new(n.innovation, n.role.into(), n.activation.into()));
        let connections = self.connections.iter().map(|c| {
            let mut connection = ConnectionGene::new(c.innovation, c.source, c.target, c.weight);
            connection.set_enabled(c.enabled);
            connection
        });
        let mut organism = Organism::from_parts(neurons, connections)
            .map_err(|e| PersistenceError::Schema(e.to_string()))?;
        organism.assign_specie(self.specie.map(SpecieId));
        Ok(organism)
    }
}

impl CheckpointRecord {
    /// Captures the state of a run after `generation` was evaluated.
    pub fn capture(
        innovations: &Innovations,
        generation: &Generation,
        scores: &FitnessLedger,
    ) -> CheckpointRecord {
        let mut connections: Vec<(Innovation, Innovation, Innovation)> = innovations
            .connection_innovations()
            .map(|((from, to), id)| (from, to, id))
            .collect();
        connections.sort_unstable_by_key(|(_, _, id)| *id);
        let mut neurons: Vec<(Innovation, Innovation)> = innovations.neuron_innovations().collect();
        neurons.sort_unstable_by_key(|(_, id)| *id);

        let positions: HashMap<OrganismId, usize, RandomState> = generation
            .organisms()
            .iter()
            .enumerate()
            .map(|(i, o)| (o.id(), i))
            .collect();

        CheckpointRecord {
            version: SCHEMA_VERSION,
            innovations: InnovationsRecord {
                next_innovation: innovations.next_innovation(),
                connections,
                neurons,
            },
            generation: GenerationRecord {
                number: generation.number(),
                next_specie_id: generation.next_specie_id(),
                threshold: generation.threshold(),
                organisms: generation
                    .organisms()
                    .iter()
                    .map(|o| OrganismRecord::capture(o, scores.get(o.id())))
                    .collect(),
                species: generation
                    .species()
                    .iter()
                    .map(|s| SpecieRecord {
                        id: s.id().0,
                        representative: OrganismRecord::capture(s.representative(), None),
                        members: s
                            .members()
                            .iter()
                            .filter_map(|id| positions.get(id).copied())
                            .collect(),
                    })
                    .collect(),
            },
        }
    }

    /// Rebuilds the run state held by the record.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Schema`] if the record is of
    /// another version, or is internally inconsistent.
    pub fn restore(&self) -> Result<Checkpoint, PersistenceError> {
        if self.version != SCHEMA_VERSION {
            return Err(PersistenceError::Schema(format!(
                "unsupported version {}, expected {}",
                self.version, SCHEMA_VERSION
            )));
        }

        let records = self
            .innovations
            .connections
            .iter()
            .map(|(from, to, id)| (Signature::Connection(*from, *to), *id))
            .chain(
                self.innovations
                    .neurons
                    .iter()
                    .map(|(split, id)| (Signature::Neuron(*split), *id)),
            );
        let innovations = Innovations::from_records(self.innovations.next_innovation, records)
            .ok_or_else(|| PersistenceError::Schema("inconsistent innovation records".into()))?;

        let record = &self.generation;
        if !record.threshold.is_finite() {
            return Err(PersistenceError::Schema(format!(
                "non-finite compatibility threshold {}",
                record.threshold
            )));
        }

        let mut scores = FitnessLedger::new();
        let mut organisms = Vec::with_capacity(record.organisms.len());
        for organism_record in &record.organisms {
            let organism = organism_record.restore()?;
            match organism_record.fitness {
                Some(fitness) if fitness.is_finite() => scores.record(organism.id(), fitness),
                Some(fitness) => {
                    return Err(PersistenceError::Schema(format!("non-finite fitness {}", fitness)))
                }
                None => return Err(PersistenceError::Schema("unscored organism".into())),
            }
            organisms.push(organism);
        }

        let mut species = Vec::with_capacity(record.species.len());
        for specie_record in &record.species {
            if specie_record.id >= record.next_specie_id {
                return Err(PersistenceError::Schema(format!(
                    "specie id {} is not below the next specie id {}",
                    specie_record.id, record.next_specie_id
                )));
            }
            let members = specie_record
                .members
                .iter()
                .map(|i| {
                    organisms.get(*i).map(|o| o.id()).ok_or_else(|| {
                        PersistenceError::Schema(format!("specie member {} out of range", i))
                    })
                })
                .collect::<Result<Vec<OrganismId>, PersistenceError>>()?;
            species.push(Specie::from_parts(
                SpecieId(specie_record.id),
                specie_record.representative.restore()?,
                members,
            ));
        }

        Ok(Checkpoint {
            innovations,
            generation: Generation::new(
                record.number,
                organisms,
                species,
                record.next_specie_id,
                record.threshold,
            ),
            scores,
        })
    }
}
