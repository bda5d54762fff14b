use evoneat::evolution::Evolver;
use evoneat::fitness::ParallelObjective;
use evoneat::genomics::Organism;
use evoneat::persistence::{Checkpointer, DirectoryCheckpointer, GenerationSelector, RonCodec};
use evoneat::{EvolutionConfig, GeneticConfig};
use evoneat_nn::builders::FunctionApproximatorBuilder;
use evoneat_nn::networks::FunctionApproximatorNetwork;

use log::info;
use serde::Deserialize;

use std::env;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

/// Everything a run of the experiment is configured by.
#[derive(Debug, Deserialize)]
struct Experiment {
    /// Where generations are checkpointed, if anywhere.
    checkpoint_directory: Option<PathBuf>,
    /// Evaluation threads. 0 picks one per spare core.
    threads: usize,
    evolution: EvolutionConfig,
    genetic: GeneticConfig,
}

const SAMPLES_PER_AXIS: usize = 21;

/// Sample points evenly spread over [-1, 1]².
fn samples() -> impl Iterator<Item = (f32, f32)> {
    let step = 2.0 / (SAMPLES_PER_AXIS - 1) as f32;
    (0..SAMPLES_PER_AXIS).flat_map(move |i| {
        (0..SAMPLES_PER_AXIS).map(move |j| (-1.0 + i as f32 * step, -1.0 + j as f32 * step))
    })
}

fn evaluate_multiplication(_: &Organism, network: &mut FunctionApproximatorNetwork<1>) -> f32 {
    // The output neuron is a sigmoid, so products are scaled into [0, 1].
    let error: f32 = samples()
        .map(|(x, y)| (network.evaluate_at(&[x, y])[0] - (x * y + 1.0) / 2.0).abs())
        .sum();
    let count = (SAMPLES_PER_AXIS * SAMPLES_PER_AXIS) as f32;
    (count - error).powi(2) / count
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config.ron"));
    let resume = args.any(|a| a == "--resume");

    let experiment: Experiment = ron::from_str(&fs::read_to_string(&path)?)?;
    info!("loaded experiment from {}", path.display());

    let builder = FunctionApproximatorBuilder::<1>;
    let objective = if experiment.threads == 0 {
        ParallelObjective::new(evaluate_multiplication)?
    } else {
        ParallelObjective::with_threads(evaluate_multiplication, experiment.threads)?
    };
    info!("evaluating on {} threads", objective.thread_count());

    let mut evolver = match experiment.checkpoint_directory {
        Some(directory) => {
            let checkpointer = DirectoryCheckpointer::<RonCodec>::new(directory)?;
            if resume && checkpointer.generation_count()? > 0 {
                Evolver::resume(
                    experiment.evolution,
                    experiment.genetic,
                    builder,
                    objective,
                    checkpointer,
                    GenerationSelector::Latest,
                )?
            } else {
                Evolver::new(experiment.evolution, experiment.genetic, builder, objective)?
                    .with_checkpointer(checkpointer)
            }
        }
        None => Evolver::new(experiment.evolution, experiment.genetic, builder, objective)?,
    };

    let champion = evolver.run()?;
    if let Some(report) = evolver.reports().last() {
        println!("{}", report);
    }
    println!("champion: {}", champion);

    let mut network = FunctionApproximatorNetwork::<1>::from(&champion);
    for (x, y) in [(-1.0, -1.0), (-0.5, 0.5), (0.25, 0.75), (1.0, 1.0)] {
        let product = network.evaluate_at(&[x, y])[0] * 2.0 - 1.0;
        println!("{} × {} ≈ {:.3} (expected {:.3})", x, y, product, x * y);
    }
    Ok(())
}
