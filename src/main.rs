use anyhow::{bail, Context};
use boolfit::config::ConfigManager;
use boolfit::data::{read_model_file, ModelOutputs, Topology, TrainingData};
use boolfit::engines::evaluation::{BddStableStateOracle, FitnessContext};
use boolfit::engines::generation::Genome;
use boolfit::engines::simulation::SimulationRunner;
use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "boolfit")]
#[command(about = "Fit Boolean regulatory network models to perturbation data")]
struct Args {
    /// Network topology in SIF form (`A -> B`, `A -| B`)
    #[arg(long, value_name = "FILE", conflicts_with = "model", required_unless_present = "model")]
    network: Option<PathBuf>,

    /// Previously saved model to start from
    #[arg(long, value_name = "FILE")]
    model: Option<PathBuf>,

    #[arg(long, value_name = "FILE")]
    training_data: PathBuf,

    /// Output node weights, required for `globaloutput` responses
    #[arg(long, value_name = "FILE")]
    model_outputs: Option<PathBuf>,

    /// TOML configuration with `[general]` and `[evolution]` sections
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long, value_name = "DIR")]
    output: Option<PathBuf>,

    #[arg(long)]
    simulations: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    /// Logging verbosity (`-v` for debug, or `-v=LEVEL`); info when omitted
    #[arg(long, short = 'v', value_name = "LEVEL", num_args = 0..=1, default_missing_value = "debug", require_equals = true)]
    verbose: Option<LogLevel>,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
}

impl From<LogLevel> for LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = args.verbose.map_or(LevelFilter::Info, LevelFilter::from);
    Builder::from_default_env().filter_level(log_level).init();

    let manager = ConfigManager::new();
    if let Some(path) = &args.config {
        manager
            .load_from_file(path)
            .with_context(|| format!("loading configuration {}", path.display()))?;
    }
    manager.update(|c| {
        if let Some(simulations) = args.simulations {
            c.general.simulations = simulations;
        }
        if let Some(seed) = args.seed {
            c.general.seed = seed;
        }
        if let Some(output) = &args.output {
            c.general.output_directory = output.clone();
        }
    })?;
    let config = manager.get();

    let base = match (&args.network, &args.model) {
        (Some(network), None) => {
            let topology = Topology::load(network)?;
            Genome::from_topology(config.general.model_name.clone(), &topology)?
        }
        (None, Some(model)) => read_model_file(model)?,
        _ => bail!("exactly one of --network or --model is required"),
    };

    let training_data = TrainingData::load(&args.training_data)?;
    let model_outputs = match &args.model_outputs {
        Some(path) => ModelOutputs::load(path)?,
        None if training_data.has_global_output() => {
            bail!("training data has a globaloutput response but no --model-outputs was given")
        }
        None => ModelOutputs::default(),
    };

    let oracle = Arc::new(BddStableStateOracle::new(config.general.max_attractors));
    let context = Arc::new(FitnessContext::new(training_data, model_outputs, oracle));
    let output_directory = config.general.output_directory.clone();

    let runner = SimulationRunner::new(config, context);
    let results = runner.run(&base)?;
    let summary = results.write_summary(&output_directory)?;

    println!("Saved {} models, summary at {}", results.models().len(), summary.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(args: &[&str]) -> LevelFilter {
        let mut argv = vec!["boolfit", "--network", "net.sif", "--training-data", "data.txt"];
        argv.extend_from_slice(args);
        Args::try_parse_from(argv).unwrap().verbose.map_or(LevelFilter::Info, LevelFilter::from)
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level(&[]), LevelFilter::Info);
        assert_eq!(level(&["-v"]), LevelFilter::Debug);
        assert_eq!(level(&["-v=trace"]), LevelFilter::Trace);
        assert_eq!(level(&["--verbose=warn"]), LevelFilter::Warn);
    }

    #[test]
    fn test_network_and_model_are_exclusive() {
        assert!(Args::try_parse_from(["boolfit", "--training-data", "d"]).is_err());
        assert!(Args::try_parse_from(["boolfit", "--network", "n", "--model", "m", "--training-data", "d"]).is_err());
    }
}
