use super::Generation;
use crate::fitness::FitnessLedger;
use crate::innovations::Innovations;
use crate::Innovation;

use serde::{Deserialize, Serialize};

use std::fmt;

/// A summary of an evaluated generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub generation: usize,
    pub species_count: usize,
    pub threshold: f32,
    pub fitness: Stats,
    pub connection_count: Stats,
    pub neuron_count: Stats,
    pub max_innovation: Option<Innovation>,
}

impl GenerationReport {
    pub fn new(generation: &Generation, scores: &FitnessLedger, innovations: &Innovations) -> GenerationReport {
        let organisms = generation.organisms();
        GenerationReport {
            generation: generation.number(),
            species_count: generation.species().len(),
            threshold: generation.threshold(),
            fitness: Stats::from(organisms.iter().filter_map(|o| scores.get(o.id()))),
            connection_count: Stats::from(organisms.iter().map(|o| o.connection_count() as f32)),
            neuron_count: Stats::from(organisms.iter().map(|o| o.neuron_count() as f32)),
            max_innovation: innovations.max_innovation(),
        }
    }
}

impl fmt::Display for GenerationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "generation {}: {} species (threshold {:.3}), fitness {}, connections {}, neurons {}, max innovation {:?}",
            self.generation,
            self.species_count,
            self.threshold,
            self.fitness,
            self.connection_count,
            self.neuron_count,
            self.max_innovation
        )
    }
}

/// A struct for reporting basic statistical data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub maximum: f32,
    pub minimum: f32,
    pub mean: f32,
    pub median: f32,
}

impl Stats {
    /// Returns statistics about numbers in a sequence.
    /// An empty sequence yields all zeroes.
    ///
    /// # Examples
    /// ```
    /// use evoneat::evolution::Stats;
    ///
    /// let stats = Stats::from([-2.0, -1.0, 0.5, 1.0, 1.5].iter().copied());
    /// assert_eq!(stats.maximum, 1.5);
    /// assert_eq!(stats.minimum, -2.0);
    /// assert_eq!(stats.mean, 0.0);
    /// assert_eq!(stats.median, 0.5);
    /// ```
    pub fn from(data: impl Iterator<Item = f32>) -> Stats {
        let mut data: Vec<f32> = data.collect();
        if data.is_empty() {
            return Stats::default();
        }
        data.sort_unstable_by(f32::total_cmp);

        let mid = data.len() / 2;
        let median = if data.len() % 2 == 0 {
            (data[mid - 1] + data[mid]) / 2.0
        } else {
            data[mid]
        };
        Stats {
            maximum: data[data.len() - 1],
            minimum: data[0],
            mean: data.iter().sum::<f32>() / data.len() as f32,
            median,
        }
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[max {:.3}, min {:.3}, mean {:.3}, median {:.3}]",
            self.maximum, self.minimum, self.mean, self.median
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn even_median() {
        let stats = Stats::from([4.0, 1.0, 3.0, 2.0].iter().copied());
        assert_eq!(stats.median, 2.5);
        assert_eq!(stats.mean, 2.5);
        assert_eq!(stats.maximum, 4.0);
        assert_eq!(stats.minimum, 1.0);
    }

    #[test]
    fn empty_data() {
        assert_eq!(Stats::from(std::iter::empty()), Stats::default());
    }

    #[test]
    fn report_of_a_generation() {
        let (innovations, generation, scores) = crate::persistence::schema::tests::sample_run();
        let report = GenerationReport::new(&generation, &scores, &innovations);
        assert_eq!(report.generation, 7);
        assert_eq!(report.species_count, 2);
        assert_eq!(report.fitness.maximum, 1.5);
        assert_eq!(report.fitness.minimum, 0.0);
        assert_eq!(report.max_innovation, innovations.max_innovation());
        assert!(report.to_string().starts_with("generation 7: 2 species"));
    }
}
