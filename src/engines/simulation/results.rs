use crate::data::model_file::write_model_file;
use crate::engines::generation::{Genome, Phase};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Fitness of every child bred in one generation of one simulation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationFitness {
    pub simulation: usize,
    pub generation: usize,
    pub fitness: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub simulation: usize,
    pub seed: u64,
    pub generations_run: usize,
    pub converged: bool,
    pub final_phase: Phase,
    pub best_fitness: f64,
}

#[derive(Debug, Clone)]
pub struct SavedModel {
    pub simulation: usize,
    pub genome: Genome,
}

#[derive(Debug, Serialize)]
struct ModelEntry<'a> {
    name: &'a str,
    simulation: usize,
    fitness: Option<f64>,
    file: String,
}

#[derive(Debug, Serialize)]
struct Summary<'a> {
    created_at: DateTime<Utc>,
    runs: &'a [RunSummary],
    models: Vec<ModelEntry<'a>>,
    generations: &'a [GenerationFitness],
}

#[derive(Debug, Default)]
struct Collected {
    runs: Vec<RunSummary>,
    models: Vec<SavedModel>,
    generations: Vec<GenerationFitness>,
}

/// Append-only collector shared by concurrently running simulations.
#[derive(Debug, Default)]
pub struct SimulationResults {
    inner: Mutex<Collected>,
}

impl SimulationResults {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Collected> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_model(&self, simulation: usize, genome: Genome) {
        self.lock().models.push(SavedModel { simulation, genome });
    }

    pub fn add_generation_fitness(&self, simulation: usize, generation: usize, fitness: Vec<f64>) {
        self.lock().generations.push(GenerationFitness {
            simulation,
            generation,
            fitness,
        });
    }

    pub fn add_run(&self, run: RunSummary) {
        self.lock().runs.push(run);
    }

    /// Saved models ordered by simulation, then by insertion.
    pub fn models(&self) -> Vec<SavedModel> {
        let mut models = self.lock().models.clone();
        models.sort_by_key(|m| m.simulation);
        models
    }

    pub fn generation_fitness(&self) -> Vec<GenerationFitness> {
        let mut rows = self.lock().generations.clone();
        rows.sort_by_key(|r| (r.simulation, r.generation));
        rows
    }

    pub fn runs(&self) -> Vec<RunSummary> {
        let mut runs = self.lock().runs.clone();
        runs.sort_by_key(|r| r.simulation);
        runs
    }

    /// Write one `.model` file per saved model and a `summary.json` into `dir`.
    /// Returns the path of the summary.
    pub fn write_summary<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let runs = self.runs();
        let models = self.models();
        let generations = self.generation_fitness();

        let mut entries = Vec::with_capacity(models.len());
        for model in &models {
            let file = format!("{}.model", model.genome.name());
            write_model_file(&model.genome, dir.join(&file))?;
            entries.push(ModelEntry {
                name: model.genome.name(),
                simulation: model.simulation,
                fitness: model.genome.fitness(),
                file,
            });
        }

        let summary = Summary {
            created_at: Utc::now(),
            runs: &runs,
            models: entries,
            generations: &generations,
        };
        let path = dir.join("summary.json");
        std::fs::write(&path, serde_json::to_string_pretty(&summary)?)?;

        log::info!("Wrote {} models and summary to {}", models.len(), dir.display());
        Ok(path)
    }
}
