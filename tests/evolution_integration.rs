use boolfit::config::{AppConfig, EvolutionConfig};
use boolfit::data::{read_model_file, ModelOutputs, OutputWeight, Topology, TrainingData};
use boolfit::engines::evaluation::{AttractorOracle, BddStableStateOracle, FitnessContext};
use boolfit::engines::generation::{Equation, EvolutionEngine, Genome, Phase, ProgressCallback};
use boolfit::engines::simulation::{SimulationResults, SimulationRunner};
use std::sync::Arc;

/// Records the phases reported by the engine.
#[derive(Default)]
struct TestProgressCallback {
    phases: Vec<Phase>,
    evaluated: usize,
}

impl ProgressCallback for TestProgressCallback {
    fn on_generation_start(&mut self, _generation: usize) {}

    fn on_generation_complete(&mut self, generation: usize, best_fitness: f64, worst_elite: f64, phase: Phase) {
        println!(
            "Generation {}: best {:.4}, worst elite {:.4}, {:?}",
            generation + 1,
            best_fitness,
            worst_elite,
            phase
        );
        self.phases.push(phase);
    }

    fn on_model_evaluated(&mut self, _model_num: usize, _total: usize) {
        self.evaluated += 1;
    }
}

/// A toggle switch between A and B with S driving A.
fn toggle_switch() -> Genome {
    let topology = Topology::parse("S -> A\nB -| A\nA -| B\n").unwrap();
    Genome::from_topology("switch", &topology).unwrap()
}

fn switch_context() -> Arc<FitnessContext> {
    let data = TrainingData::parse(
        "Condition\nS:1\nResponse\nA:1\tB:0\nWeight:1\n\
         Condition\nS:0\nResponse\nB:1\nWeight:1\n",
    )
    .unwrap();
    let oracle: Arc<dyn AttractorOracle> = Arc::new(BddStableStateOracle::default());
    Arc::new(FitnessContext::new(data, ModelOutputs::default(), oracle))
}

fn test_evolution_config() -> EvolutionConfig {
    EvolutionConfig {
        population: 12,
        generations: 6,
        selection: 3,
        crossovers: 1,
        bootstrap_mutations_factor: 3,
        ..Default::default()
    }
}

#[test]
fn test_base_model_fitness_with_bdd_oracle() {
    let mut genome = toggle_switch();
    assert_eq!(genome.equations()[1].to_string(), "A *= ( S ) and not ( ( B ) )");

    switch_context().evaluate(&mut genome).unwrap();
    // S:1 leaves the switch bistable: (1 + 1) / 3 / 2. S:0 forces B on: (1 + 1) / 2.
    let expected = 0.5 * (1.0 / 3.0) + 0.5 * 1.0;
    assert!((genome.fitness().unwrap() - expected).abs() < 1e-9);
}

#[test]
fn test_evolution_run() {
    let base = toggle_switch();
    let results = SimulationResults::new();
    let mut callback = TestProgressCallback::default();

    let mut engine = EvolutionEngine::new(test_evolution_config(), switch_context(), 42);
    let outcome = engine.run(&base, &results, &mut callback).unwrap();

    assert!(outcome.generations_run >= 1 && outcome.generations_run <= 6);
    assert_eq!(callback.phases.len(), outcome.generations_run);
    assert_eq!(callback.evaluated, 12 * outcome.generations_run);
    assert_eq!(outcome.elites.len(), 3);

    // Once steady state is reached it is never left.
    if let Some(first) = callback.phases.iter().position(|p| *p == Phase::SteadyState) {
        assert!(callback.phases[first..].iter().all(|p| *p == Phase::SteadyState));
    }

    // Elites are the top of the last generation and never worse than a discarded child.
    let rows = results.generation_fitness();
    let mut last = rows.last().unwrap().fitness.clone();
    last.sort_by(|a, b| b.partial_cmp(a).unwrap());
    let elite_fitness: Vec<f64> = outcome.elites.iter().map(|g| g.fitness().unwrap()).collect();
    assert_eq!(elite_fitness, last[..3].to_vec());
    assert!(elite_fitness.iter().all(|f| (0.0..=1.0 + 1e-9).contains(f)));

    // The base genome is never mutated by its children.
    assert_eq!(base.equations(), toggle_switch().equations());
}

#[test]
fn test_fixed_seed_is_reproducible() {
    let config = AppConfig {
        general: boolfit::config::GeneralConfig {
            simulations: 3,
            seed: 11,
            threads: 2,
            models_saved: 2,
            ..Default::default()
        },
        evolution: test_evolution_config(),
    };

    let first = SimulationRunner::new(config.clone(), switch_context()).run(&toggle_switch()).unwrap();
    let second = SimulationRunner::new(config, switch_context()).run(&toggle_switch()).unwrap();

    assert_eq!(first.generation_fitness(), second.generation_fitness());
    assert_eq!(first.runs(), second.runs());
    let names = |r: &SimulationResults| r.models().iter().map(|m| m.genome.name().to_string()).collect::<Vec<_>>();
    assert_eq!(names(&first), names(&second));
    for model in first.models() {
        assert!(model.genome.fitness().unwrap() > 0.0);
    }
}

#[test]
fn test_runner_rejects_unknown_condition_node() {
    let data = TrainingData::parse("Condition\nZ:1\nResponse\nA:1\nWeight:1\n").unwrap();
    let oracle: Arc<dyn AttractorOracle> = Arc::new(BddStableStateOracle::default());
    let context = Arc::new(FitnessContext::new(data, ModelOutputs::default(), oracle));
    let runner = SimulationRunner::new(AppConfig::default(), context);
    assert!(runner.run(&toggle_switch()).is_err());
}

#[test]
fn test_saved_models_seed_a_new_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        general: boolfit::config::GeneralConfig {
            simulations: 1,
            model_name: "switch".to_string(),
            ..Default::default()
        },
        evolution: test_evolution_config(),
    };
    let results = SimulationRunner::new(config.clone(), switch_context()).run(&toggle_switch()).unwrap();
    results.write_summary(dir.path()).unwrap();
    assert!(dir.path().join("summary.json").exists());

    let saved = results.models();
    assert!(!saved.is_empty());
    let reloaded = read_model_file(dir.path().join(format!("{}.model", saved[0].genome.name()))).unwrap();
    assert_eq!(reloaded.equations(), saved[0].genome.equations());
    assert_eq!(reloaded.fitness(), saved[0].genome.fitness());

    // Saved models carry the stable states of the unperturbed model.
    assert!(!reloaded.attractors().is_empty());
    assert_eq!(reloaded.attractors(), saved[0].genome.attractors());
    assert!(reloaded.attractors().iter().all(|a| a.len() == 3));

    let rerun = SimulationRunner::new(config, switch_context()).run(&reloaded).unwrap();
    assert_eq!(rerun.runs().len(), 1);
}

#[test]
fn test_global_output_observation() {
    let topology = Topology::parse("X -> X\n").unwrap();
    let mut genome = Genome::from_topology("single", &topology).unwrap();
    let data = TrainingData::parse("Condition\n-\nResponse\nglobaloutput:1\nWeight:1\n").unwrap();
    let outputs = ModelOutputs::new(vec![OutputWeight {
        node: "X".to_string(),
        weight: 1,
    }]);
    let oracle = |_: &Genome| -> boolfit::Result<Vec<String>> { Ok(vec!["1".to_string()]) };
    let context = FitnessContext::new(data, outputs, Arc::new(oracle));

    context.evaluate(&mut genome).unwrap();
    assert_eq!(genome.fitness(), Some(1.0));
}

#[test]
fn test_canonical_equation_round_trip() {
    let text = "A *=  (  (  B )  or C ) and not  (  ( D )  ) ";
    let equation = Equation::parse(text).unwrap();
    assert_eq!(equation.target(), "A");
    let reparsed = Equation::parse(&equation.render()).unwrap();
    assert_eq!(reparsed, equation);
    assert_eq!(
        equation.render().split_whitespace().collect::<Vec<_>>(),
        text.split_whitespace().collect::<Vec<_>>()
    );
}
