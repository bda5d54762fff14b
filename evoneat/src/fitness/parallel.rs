use super::{EvaluationBatch, FitnessObjective};
use crate::genomics::Organism;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

use std::thread;
use std::time::Instant;

/// An objective that scores organisms independently
/// on a dedicated rayon thread pool.
///
/// Each organism is only started if the batch deadline
/// has not passed; organisms already running are never
/// interrupted.
///
/// # Examples
/// ```
/// use evoneat::fitness::{Evaluation, EvaluationBatch, FitnessObjective, ParallelObjective};
/// use evoneat::genomics::{GeneticConfig, Organism};
///
/// fn neuron_count(organism: &Organism, _: &mut ()) -> f32 {
///     organism.neuron_count() as f32
/// }
///
/// let organisms: Vec<Organism> = (0..8).map(|_| Organism::bare(&GeneticConfig::zero())).collect();
/// let objective = ParallelObjective::with_threads(neuron_count, 2).unwrap();
///
/// let mut batch = EvaluationBatch::new(
///     organisms.iter().map(|o| Evaluation::new(o, ())).collect(),
///     None,
/// );
/// objective.evaluate(&mut batch);
///
/// assert!(batch.iter().all(|e| e.fitness() == Some(3.0)));
/// ```
pub struct ParallelObjective<F> {
    function: F,
    pool: ThreadPool,
}

impl<F> ParallelObjective<F> {
    /// Creates an objective running on one thread less than
    /// the available parallelism, and at least one.
    pub fn new(function: F) -> Result<ParallelObjective<F>, ThreadPoolBuildError> {
        let threads = thread::available_parallelism()
            .map(|n| n.get().saturating_sub(1))
            .unwrap_or(1)
            .max(1);
        Self::with_threads(function, threads)
    }

    /// Creates an objective running on exactly `threads` threads.
    pub fn with_threads(
        function: F,
        threads: usize,
    ) -> Result<ParallelObjective<F>, ThreadPoolBuildError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("evoneat-eval-{}", i))
            .build()?;
        Ok(ParallelObjective { function, pool })
    }

    pub fn thread_count(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl<P, F> FitnessObjective<P> for ParallelObjective<F>
where
    P: Send,
    F: Fn(&Organism, &mut P) -> f32 + Sync,
{
    fn evaluate(&self, batch: &mut EvaluationBatch<'_, P>) {
        let deadline = batch.deadline();
        let function = &self.function;
        self.pool.install(|| {
            batch.entries_mut().par_iter_mut().for_each(|entry| {
                if deadline.map_or(false, |d| Instant::now() >= d) {
                    return;
                }
                let (organism, phenotype) = entry.parts();
                let fitness = function(organism, phenotype);
                entry.set_fitness(fitness);
            })
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitness::Evaluation;
    use crate::genomics::GeneticConfig;
    use std::time::Duration;

    fn scaled_neuron_count(organism: &Organism, scale: &mut f32) -> f32 {
        organism.neuron_count() as f32 * *scale
    }

    #[test]
    fn scores_every_entry() {
        let organisms: Vec<Organism> = (0..32)
            .map(|_| Organism::bare(&GeneticConfig::zero()))
            .collect();
        let objective = ParallelObjective::with_threads(scaled_neuron_count, 3).unwrap();
        assert_eq!(objective.thread_count(), 3);

        let mut batch = EvaluationBatch::new(
            organisms.iter().map(|o| Evaluation::new(o, 2.0f32)).collect(),
            None,
        );
        objective.evaluate(&mut batch);

        let ledger = batch.into_ledger().unwrap();
        assert!(organisms.iter().all(|o| ledger.fitness(o.id()) == 6.0));
    }

    #[test]
    fn nothing_starts_after_the_deadline() {
        let organisms: Vec<Organism> = (0..4)
            .map(|_| Organism::bare(&GeneticConfig::zero()))
            .collect();
        let objective = ParallelObjective::new(scaled_neuron_count).unwrap();

        let mut batch = EvaluationBatch::new(
            organisms.iter().map(|o| Evaluation::new(o, 1.0f32)).collect(),
            Some(Instant::now() - Duration::from_millis(1)),
        );
        objective.evaluate(&mut batch);

        assert_eq!(batch.into_ledger().unwrap_err().len(), 4);
    }
}
