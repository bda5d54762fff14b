//! Speciation partitions a population into groups of
//! structurally similar organisms, which then compete
//! mostly among themselves.
mod species;

pub use species::{Specie, SpecieId, SpecieIdAllocator};

use crate::config::{CompatibilityCoefficients, EvolutionConfig, RepresentativePolicy, SpeciationConfig};
use crate::genomics::{Organism, OrganismId};
use crate::Innovation;

use ahash::RandomState;
use log::debug;

use std::cmp::Ordering;
use std::collections::HashMap;

/// Computes the compatibility distance between two organisms.
///
/// Connections are aligned by innovation number. With `N` the
/// connection count of the larger organism (or 1, if both are
/// empty), `E` the number of _excess_ connections (beyond the
/// other organism's highest innovation number), `D` the number
/// of _disjoint_ connections (other non-matching ones), and `W`
/// the mean absolute weight difference of matching connections:
///
/// `distance = excess·E/N + disjoint·D/N + weight·W`
///
/// # Examples
/// ```
/// use evoneat::config::CompatibilityCoefficients;
/// use evoneat::genomics::{ActivationType, GeneticConfig, Organism};
/// use evoneat::speciation::compare;
/// use std::num::NonZeroUsize;
///
/// let coefficients = CompatibilityCoefficients {
///     excess: 1.5,
///     disjoint: 0.5,
///     weight: 0.25,
/// };
/// // Neurons: inputs 0 and 1, bias 2, output 3.
/// let config = GeneticConfig {
///     input_count: NonZeroUsize::new(2).unwrap(),
///     ..GeneticConfig::zero()
/// };
///
/// let mut first = Organism::bare(&config);
/// let mut second = Organism::bare(&config);
///
/// // Matching connection, weight difference of 2.0.
/// first.add_connection(10, 0, 3, 1.0).unwrap();
/// second.add_connection(10, 0, 3, -1.0).unwrap();
/// // Disjoint connections.
/// first.add_connection(11, 1, 3, 3.0).unwrap();
/// second.add_connection(12, 2, 3, 1.0).unwrap();
/// // Matching connection, weight difference of 0.0.
/// first.add_connection(13, 3, 3, 1.0).unwrap();
/// second.add_connection(13, 3, 3, 1.0).unwrap();
/// // Excess connection.
/// first.add_neuron(20, ActivationType::Sigmoid).unwrap();
/// first.add_connection(21, 0, 20, 1.0).unwrap();
///
/// // N = 4, E = 1, D = 2, W = (2.0 + 0.0) / 2.
/// assert_eq!(
///     compare(&first, &second, &coefficients),
///     1.5 * 1.0 / 4.0 + 0.5 * 2.0 / 4.0 + 0.25 * 1.0
/// );
/// assert_eq!(compare(&first, &first, &coefficients), 0.0);
/// ```
pub fn compare(first: &Organism, second: &Organism, coefficients: &CompatibilityCoefficients) -> f32 {
    let first_max = first.max_connection_innovation();
    let second_max = second.max_connection_innovation();

    let mut excess = 0usize;
    let mut disjoint = 0usize;
    let mut matching = 0usize;
    let mut weight_difference = 0.0;

    let mut classify = |id: Innovation, other_max: Option<Innovation>| {
        if other_max.map_or(true, |max| id > max) {
            excess += 1;
        } else {
            disjoint += 1;
        }
    };

    let mut a = first.connections().peekable();
    let mut b = second.connections().peekable();
    loop {
        match (a.peek(), b.peek()) {
            (Some(x), Some(y)) => match x.innovation().cmp(&y.innovation()) {
                Ordering::Equal => {
                    matching += 1;
                    weight_difference += (x.weight() - y.weight()).abs();
                    a.next();
                    b.next();
                }
                Ordering::Less => {
                    classify(x.innovation(), second_max);
                    a.next();
                }
                Ordering::Greater => {
                    classify(y.innovation(), first_max);
                    b.next();
                }
            },
            (Some(x), None) => {
                classify(x.innovation(), second_max);
                a.next();
            }
            (None, Some(y)) => {
                classify(y.innovation(), first_max);
                b.next();
            }
            (None, None) => break,
        }
    }

    let n = first.connection_count().max(second.connection_count()).max(1) as f32;
    let mean_weight_difference = if matching > 0 {
        weight_difference / matching as f32
    } else {
        0.0
    };

    coefficients.excess * excess as f32 / n
        + coefficients.disjoint * disjoint as f32 / n
        + coefficients.weight * mean_weight_difference
}

/// Something that partitions a population into species.
pub trait Speciator {
    /// Assigns every organism to exactly one specie.
    ///
    /// `previous` are the species of the last pass; their identity
    /// and representatives carry over, their membership does not.
    /// Organisms are tested in population order against each
    /// specie's representative, in specie order. Organisms fitting
    /// no specie found new ones, allocated from `ids` and appended.
    /// Species left without members are dropped.
    fn speciate(
        &mut self,
        previous: &[Specie],
        organisms: &mut [Organism],
        ids: &mut SpecieIdAllocator,
    ) -> Vec<Specie>;

    /// The compatibility threshold the next pass will use.
    fn threshold(&self) -> f32;

    /// Restores a threshold saved from an earlier run.
    fn restore_threshold(&mut self, threshold: f32);
}

/// Builds the speciator selected by a configuration.
pub fn speciator_from(config: &EvolutionConfig) -> Box<dyn Speciator> {
    match config.speciation {
        SpeciationConfig::Fixed { threshold } => Box::new(FixedThresholdSpeciator {
            threshold,
            coefficients: config.compatibility,
            policy: config.representative_policy,
        }),
        SpeciationConfig::Dynamic {
            initial_threshold,
            target_species,
            step,
            min_threshold,
        } => Box::new(DynamicThresholdSpeciator {
            threshold: initial_threshold.max(min_threshold),
            target_species,
            step,
            min_threshold,
            coefficients: config.compatibility,
            policy: config.representative_policy,
        }),
    }
}

/// A speciator using the same compatibility threshold every pass.
#[derive(Clone, Debug)]
pub struct FixedThresholdSpeciator {
    pub threshold: f32,
    pub coefficients: CompatibilityCoefficients,
    pub policy: RepresentativePolicy,
}

impl Speciator for FixedThresholdSpeciator {
    fn speciate(
        &mut self,
        previous: &[Specie],
        organisms: &mut [Organism],
        ids: &mut SpecieIdAllocator,
    ) -> Vec<Specie> {
        partition(
            previous,
            organisms,
            ids,
            self.threshold,
            &self.coefficients,
            self.policy,
        )
    }

    fn threshold(&self) -> f32 {
        self.threshold
    }

    fn restore_threshold(&mut self, threshold: f32) {
        self.threshold = threshold;
    }
}

/// A speciator steering the number of species towards a target,
/// by adjusting its compatibility threshold after every pass.
#[derive(Clone, Debug)]
pub struct DynamicThresholdSpeciator {
    pub threshold: f32,
    pub target_species: usize,
    pub step: f32,
    pub min_threshold: f32,
    pub coefficients: CompatibilityCoefficients,
    pub policy: RepresentativePolicy,
}

impl Speciator for DynamicThresholdSpeciator {
    fn speciate(
        &mut self,
        previous: &[Specie],
        organisms: &mut [Organism],
        ids: &mut SpecieIdAllocator,
    ) -> Vec<Specie> {
        let species = partition(
            previous,
            organisms,
            ids,
            self.threshold,
            &self.coefficients,
            self.policy,
        );

        match species.len().cmp(&self.target_species) {
            Ordering::Greater => self.threshold += self.step,
            Ordering::Less => self.threshold -= self.step,
            Ordering::Equal => {}
        }
        self.threshold = self.threshold.max(self.min_threshold);
        debug!(
            "{} species for a target of {}, threshold now {:.3}",
            species.len(),
            self.target_species,
            self.threshold
        );

        species
    }

    fn threshold(&self) -> f32 {
        self.threshold
    }

    fn restore_threshold(&mut self, threshold: f32) {
        self.threshold = threshold.max(self.min_threshold);
    }
}

fn partition(
    previous: &[Specie],
    organisms: &mut [Organism],
    ids: &mut SpecieIdAllocator,
    threshold: f32,
    coefficients: &CompatibilityCoefficients,
    policy: RepresentativePolicy,
) -> Vec<Specie> {
    let mut species: Vec<Specie> = previous
        .iter()
        .map(|s| Specie::new(s.id(), s.representative().copy()))
        .collect();

    for organism in organisms.iter_mut() {
        let compatible = species
            .iter()
            .position(|s| compare(s.representative(), organism, coefficients) <= threshold);
        let index = match compatible {
            Some(index) => index,
            None => {
                let id = ids.allocate();
                debug!("organism {} founds specie {}", organism.id(), id);
                species.push(Specie::new(id, organism.copy()));
                species.len() - 1
            }
        };
        let specie = &mut species[index];
        specie.add_member(organism.id());
        organism.assign_specie(Some(specie.id()));
    }

    let before = species.len();
    species.retain(|s| !s.is_empty());
    if species.len() < before {
        debug!("{} specie(s) went extinct", before - species.len());
    }

    if policy == RepresentativePolicy::FirstMember {
        let positions: HashMap<OrganismId, usize, RandomState> = organisms
            .iter()
            .enumerate()
            .map(|(i, o)| (o.id(), i))
            .collect();
        for specie in &mut species {
            if let Some(first) = specie.members().first().and_then(|id| positions.get(id)) {
                specie.set_representative(organisms[*first].copy());
            }
        }
    }

    species
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::GeneticConfig;
    use crate::innovations::Innovations;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;
    use std::num::NonZeroUsize;

    fn coefficients() -> CompatibilityCoefficients {
        CompatibilityCoefficients {
            excess: 1.0,
            disjoint: 1.0,
            weight: 0.4,
        }
    }

    fn genetic_config() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(3).unwrap(),
            output_count: NonZeroUsize::new(2).unwrap(),
            initial_expression_chance: 0.5,
            weight_bound: 3.0,
            ..GeneticConfig::zero()
        }
    }

    fn population(count: usize, seed: u64) -> Vec<Organism> {
        let config = genetic_config();
        let mut innovations = Innovations::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..count)
            .map(|_| Organism::new(&config, &mut innovations, &mut rng))
            .collect()
    }

    fn fixed(threshold: f32, policy: RepresentativePolicy) -> FixedThresholdSpeciator {
        FixedThresholdSpeciator {
            threshold,
            coefficients: coefficients(),
            policy,
        }
    }

    #[test]
    fn identical_organisms_are_at_distance_zero() {
        let organisms = population(5, 0);
        for organism in &organisms {
            assert_eq!(compare(organism, &organism.copy(), &coefficients()), 0.0);
        }
    }

    #[test]
    fn empty_organisms_compare_to_zero() {
        let config = GeneticConfig::zero();
        assert_eq!(
            compare(&Organism::bare(&config), &Organism::bare(&config), &coefficients()),
            0.0
        );
    }

    #[test]
    fn compare_is_symmetric() {
        let organisms = population(10, 1);
        for a in &organisms {
            for b in &organisms {
                assert!((compare(a, b, &coefficients()) - compare(b, a, &coefficients())).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn every_organism_assigned_exactly_once() {
        let mut organisms = population(60, 2);
        let mut ids = SpecieIdAllocator::new();
        let mut speciator = fixed(0.8, RepresentativePolicy::Founder);

        let species = speciator.speciate(&[], &mut organisms, &mut ids);

        let mut seen = HashSet::new();
        for specie in &species {
            assert!(!specie.is_empty());
            for member in specie.members() {
                assert!(seen.insert(*member), "{} assigned twice", member);
            }
        }
        assert_eq!(seen.len(), organisms.len());
        for organism in &organisms {
            let specie = species
                .iter()
                .find(|s| Some(s.id()) == organism.specie())
                .unwrap();
            assert!(specie.contains(organism.id()));
        }
    }

    #[test]
    fn zero_threshold_separates_distinct_structures() {
        let config = GeneticConfig::zero();
        let mut first = Organism::bare(&config);
        first.add_connection(3, 0, 2, 1.0).unwrap();
        let mut second = Organism::bare(&config);
        second.add_connection(4, 1, 2, 1.0).unwrap();
        let third = first.copy();
        let mut organisms = vec![first, second, third];

        let species = fixed(0.0, RepresentativePolicy::Founder).speciate(
            &[],
            &mut organisms,
            &mut SpecieIdAllocator::new(),
        );

        assert_eq!(species.len(), 2);
        assert_eq!(species[0].members(), &[organisms[0].id(), organisms[2].id()]);
        assert_eq!(species[1].members(), &[organisms[1].id()]);
        assert_eq!(species[0].id(), SpecieId(0));
        assert_eq!(species[1].id(), SpecieId(1));
    }

    #[test]
    fn species_persist_and_go_extinct() {
        let config = GeneticConfig::zero();
        let mut first = Organism::bare(&config);
        first.add_connection(3, 0, 2, 1.0).unwrap();
        let mut second = Organism::bare(&config);
        second.add_connection(4, 1, 2, 1.0).unwrap();
        let mut organisms = vec![first, second];
        let mut ids = SpecieIdAllocator::new();
        let mut speciator = fixed(0.0, RepresentativePolicy::Founder);

        let species = speciator.speciate(&[], &mut organisms, &mut ids);
        assert_eq!(species.len(), 2);

        // Only copies of the first organism remain.
        let mut next = vec![organisms[0].copy(), organisms[0].copy()];
        let species = speciator.speciate(&species, &mut next, &mut ids);
        assert_eq!(species.len(), 1);
        assert_eq!(species[0].id(), SpecieId(0));
        assert_eq!(species[0].len(), 2);
        assert_eq!(ids.peek(), 2);
    }

    #[test]
    fn first_member_policy_replaces_representative() {
        let config = GeneticConfig::zero();
        let mut founder = Organism::bare(&config);
        founder.add_connection(3, 0, 2, 1.0).unwrap();
        let mut organisms = vec![founder];
        let mut ids = SpecieIdAllocator::new();
        let mut speciator = fixed(10.0, RepresentativePolicy::FirstMember);
        let species = speciator.speciate(&[], &mut organisms, &mut ids);

        let mut successor = Organism::bare(&config);
        successor.add_connection(3, 0, 2, -1.0).unwrap();
        let mut next = vec![successor];
        let species = speciator.speciate(&species, &mut next, &mut ids);

        assert_eq!(species[0].id(), SpecieId(0));
        assert!(species[0].representative().genes_eq(&next[0]));

        let mut founder_speciator = fixed(10.0, RepresentativePolicy::Founder);
        let species = founder_speciator.speciate(&species, &mut next, &mut ids);
        assert!(species[0].representative().genes_eq(&next[0]));
    }

    #[test]
    fn dynamic_threshold_tracks_target() {
        let mut speciator = DynamicThresholdSpeciator {
            threshold: 0.0,
            target_species: 100,
            step: 0.5,
            min_threshold: 0.25,
            coefficients: coefficients(),
            policy: RepresentativePolicy::Founder,
        };
        let mut organisms = population(10, 3);
        let mut ids = SpecieIdAllocator::new();

        // Fewer species than targeted: the threshold drops to its minimum.
        speciator.speciate(&[], &mut organisms, &mut ids);
        assert_eq!(speciator.threshold(), 0.25);

        // More species than targeted: the threshold rises.
        speciator.target_species = 1;
        speciator.restore_threshold(0.0);
        let species = speciator.speciate(&[], &mut organisms, &mut ids);
        assert!(species.len() > 1);
        assert_eq!(speciator.threshold(), 0.75);
    }

    #[test]
    fn speciator_from_config() {
        let config = EvolutionConfig {
            speciation: SpeciationConfig::Dynamic {
                initial_threshold: 3.0,
                target_species: 10,
                step: 0.3,
                min_threshold: 0.5,
            },
            ..EvolutionConfig::zero()
        };
        assert_eq!(speciator_from(&config).threshold(), 3.0);

        let config = EvolutionConfig {
            speciation: SpeciationConfig::Fixed { threshold: 1.5 },
            ..EvolutionConfig::zero()
        };
        assert_eq!(speciator_from(&config).threshold(), 1.5);
    }
}
